pub mod classifier;
pub mod client;

use crate::error::{PostError, PostResult};
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "yeetpost/0.2";

/// HTTP запрос в виде данных
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// HTTP ответ. `body == None` означает, что тело не удалось прочитать
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<Vec<u8>>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Абстрактный HTTP транспорт. Один вызов `send` = один запрос, без повторов
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> PostResult<HttpResponse>;
}

/// Транспорт поверх reqwest, пул соединений остаётся внутри `Client`
pub struct ReqwestTransport {
    http_client: Client,
}

impl ReqwestTransport {
    /// Без `timeout` запрос ждёт ответа сколько угодно
    pub fn new(timeout: Option<Duration>) -> PostResult<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(ReqwestTransport {
            http_client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> PostResult<HttpResponse> {
        debug!("Sending {} {}", request.method, request.url);

        let mut builder = self.http_client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.body(request.body).send().await.map_err(|e| {
            debug!("Failed to send request: {}", e);
            if e.is_timeout() {
                PostError::Timeout
            } else {
                PostError::Transport(e)
            }
        })?;

        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                debug!("Failed to read response body (status {}): {}", status, e);
                None
            }
        };

        Ok(HttpResponse { status, body })
    }
}

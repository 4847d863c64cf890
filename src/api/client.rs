use crate::api::{classifier, HttpRequest, ReqwestTransport, Transport};
use crate::config::{resolve_api_key, Ambient};
use crate::error::{PostError, PostResult};
use crate::models::{PostOutcome, PostRequest};
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use serde_json::Value;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://api.yeetpost.com";

/// Клиент yeetpost API: проверяет запрос, делает ровно один POST
/// и раскладывает ответ по `PostOutcome`.
pub struct YeetpostClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    ambient: Ambient,
}

impl YeetpostClient {
    /// Клиент с reqwest транспортом и ключом из окружения процесса
    pub fn new() -> PostResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// `{connection}` подставляется как есть, без percent-encoding
    pub fn endpoint(&self, connection: &str) -> String {
        format!("{}/api/v2/post/{}", self.base_url, connection)
    }

    pub fn build_request(&self, request: &PostRequest, api_key: &str) -> HttpRequest {
        HttpRequest {
            method: Method::POST,
            url: self.endpoint(request.connection()),
            headers: vec![
                ("Content-Type".to_string(), "text/plain".to_string()),
                ("x-api-key".to_string(), api_key.to_string()),
            ],
            body: request.text().as_bytes().to_vec(),
        }
    }

    /// Публикует текст.
    ///
    /// `Ok(None)` возвращается только когда API ответил ошибкой, а запрос
    /// собран с `suppress_errors(true)`. Ошибки валидации, отсутствие ключа
    /// и сбои транспорта возвращаются всегда.
    pub async fn post(&self, request: &PostRequest) -> PostResult<Option<PostOutcome>> {
        request.validate()?;
        let api_key = resolve_api_key(request.explicit_api_key(), &self.ambient)?;

        debug!("Posting to connection: {}", request.connection());

        let response = self
            .transport
            .send(self.build_request(request, &api_key))
            .await?;

        if response.is_success() {
            let body = response.body.ok_or(PostError::UnreadableBody)?;
            let raw: Value = serde_json::from_slice(&body).map_err(|e| {
                debug!("Failed to parse post response: {}", e);
                PostError::Decode(e)
            })?;
            let outcome = PostOutcome::from_success(response.status, raw);

            info!("Successfully posted to {}: {}", request.connection(), outcome);
            return Ok(Some(outcome));
        }

        let outcome = classifier::classify(response.status, response.body.as_deref());
        // Ошибка уходит вызывающему, в лог только подробности
        debug!("Failed to post to {}: {}", request.connection(), outcome);

        if request.suppresses_errors() {
            debug!("Suppressing API error for {}", request.connection());
            return Ok(None);
        }

        Err(PostError::RemoteRejection(outcome))
    }
}

#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    ambient: Option<Ambient>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Не задан = без ограничения по времени
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn ambient(mut self, ambient: Ambient) -> Self {
        self.ambient = Some(ambient);
        self
    }

    /// Заменяет reqwest транспорт; `timeout` при этом не применяется
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> PostResult<YeetpostClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.timeout)?),
        };

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(YeetpostClient {
            transport,
            base_url,
            ambient: self.ambient.unwrap_or_else(Ambient::from_env),
        })
    }
}

//! Клиент yeetpost API: один текстовый пост через одно подключение.

pub mod api;
pub mod config;
pub mod error;
pub mod models;

pub use api::client::{ClientBuilder, YeetpostClient, DEFAULT_BASE_URL};
pub use api::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use config::{resolve_api_key, Ambient, API_KEY_ENV};
pub use error::{PostError, PostResult};
pub use models::{
    ErrorBody, ErrorCode, Platform, PostOutcome, PostRequest, SuccessBody, TracedErrorBody,
};

/// Публикует пост клиентом по умолчанию (ключ из YEETPOST_API_KEY,
/// если не задан явно)
pub async fn post(request: &PostRequest) -> PostResult<Option<PostOutcome>> {
    YeetpostClient::new()?.post(request).await
}

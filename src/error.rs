use thiserror::Error;

use crate::models::PostOutcome;

pub type PostResult<T> = Result<T, PostError>;

#[derive(Debug, Error)]
pub enum PostError {
    /// Некорректные connection или text, до сети дело не дошло
    #[error("{0}")]
    InvalidInput(String),

    #[error("YEETPOST_API_KEY or apiKey-option must be provided")]
    MissingCredential,

    /// API ответил неуспешным статусом
    #[error("remote API rejected the post with status {}", .0.status())]
    RemoteRejection(PostOutcome),

    #[error("Timeout waiting for server response")]
    Timeout,

    #[error("Network error")]
    Transport(#[from] reqwest::Error),

    #[error("Response body could not be read")]
    UnreadableBody,

    #[error("JSON parsing error")]
    Decode(#[from] serde_json::Error),
}

impl PostError {
    /// Исход, присланный сервером, если ошибка пришла от API
    pub fn response(&self) -> Option<&PostOutcome> {
        match self {
            PostError::RemoteRejection(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Только отказы API можно подавить через suppress_errors
    pub fn is_suppressible(&self) -> bool {
        matches!(self, PostError::RemoteRejection(_))
    }

    /// Вызов не завершился или успешный ответ не разобрался
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            PostError::Timeout
                | PostError::Transport(_)
                | PostError::UnreadableBody
                | PostError::Decode(_)
        )
    }
}

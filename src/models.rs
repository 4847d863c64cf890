use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{PostError, PostResult};

/// Исходящий запрос на публикацию
#[derive(Clone, PartialEq, Eq)]
pub struct PostRequest {
    connection: String,
    text: String,
    api_key: Option<String>,
    suppress_errors: bool,
}

impl PostRequest {
    pub fn new(connection: impl Into<String>, text: impl Into<String>) -> Self {
        PostRequest {
            connection: connection.into(),
            text: text.into(),
            api_key: None,
            suppress_errors: false,
        }
    }

    /// Явный API ключ, имеет приоритет над YEETPOST_API_KEY
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Отказ удалённого API превращается в `Ok(None)` вместо ошибки
    pub fn suppress_errors(mut self, suppress: bool) -> Self {
        self.suppress_errors = suppress;
        self
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn explicit_api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn suppresses_errors(&self) -> bool {
        self.suppress_errors
    }

    /// Проверяет входные данные до любого сетевого вызова
    pub fn validate(&self) -> PostResult<()> {
        if self.connection.is_empty() {
            return Err(PostError::InvalidInput(
                "connection must be a non-empty string".to_string(),
            ));
        }

        if self.text.is_empty() {
            return Err(PostError::InvalidInput(
                "text must not be an empty string".to_string(),
            ));
        }

        Ok(())
    }
}

// Ключ не должен попадать в логи
impl fmt::Debug for PostRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostRequest")
            .field("connection", &self.connection)
            .field("text", &self.text)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("suppress_errors", &self.suppress_errors)
            .finish()
    }
}

/// Платформа, на которую ушёл пост
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linkedin,
    X,
    Sms,
    Email,
    Slack,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Linkedin => "linkedin",
            Platform::X => "x",
            Platform::Sms => "sms",
            Platform::Email => "email",
            Platform::Slack => "slack",
        };
        f.write_str(name)
    }
}

/// Тело успешного ответа: веб-платформы возвращают ссылку,
/// мессенджеры только подтверждение отправки
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum SuccessBody {
    Linkedin { link: String },
    X { link: String },
    Sms { sent: bool },
    Email { sent: bool },
    Slack { sent: bool },
}

impl SuccessBody {
    pub fn platform(&self) -> Platform {
        match self {
            SuccessBody::Linkedin { .. } => Platform::Linkedin,
            SuccessBody::X { .. } => Platform::X,
            SuccessBody::Sms { .. } => Platform::Sms,
            SuccessBody::Email { .. } => Platform::Email,
            SuccessBody::Slack { .. } => Platform::Slack,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            SuccessBody::Linkedin { link } | SuccessBody::X { link } => Some(link.as_str()),
            _ => None,
        }
    }

    pub fn sent(&self) -> Option<bool> {
        match self {
            SuccessBody::Sms { sent } | SuccessBody::Email { sent } | SuccessBody::Slack { sent } => {
                Some(*sent)
            }
            _ => None,
        }
    }
}

/// Код ошибки из тела ответа API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidConnection,
    InvalidRequest,
    Unauthorized,
    LimitExceeded,
    UnsupportedContentType,
    PlatformRejected,
    InternalServerError,
}

impl ErrorCode {
    /// HTTP статус, с которым API отдаёт этот код
    pub fn status(&self) -> u16 {
        match self {
            ErrorCode::InvalidConnection | ErrorCode::InvalidRequest => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::LimitExceeded => 403,
            ErrorCode::UnsupportedContentType => 415,
            ErrorCode::PlatformRejected => 422,
            ErrorCode::InternalServerError => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorCode,
    pub message: String,
}

/// Тело ошибки с идентификатором запроса (422 и 500)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracedErrorBody {
    pub error: ErrorCode,
    pub message: String,
    #[serde(rename = "reqId")]
    pub req_id: String,
}

/// Результат одного HTTP обмена, размеченный по статусу.
///
/// Типизированный вариант выбирается только если тело в точности
/// совпадает с документированной формой для этого статуса. Всё остальное
/// (незадокументированные статусы, текстовые и пустые тела) попадает
/// в `Other`, поэтому построение исхода никогда не падает.
#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    /// 200
    Posted(SuccessBody),
    /// 400
    BadRequest(ErrorBody),
    /// 401
    Unauthorized(ErrorBody),
    /// 403
    LimitExceeded(ErrorBody),
    /// 415
    UnsupportedContentType(ErrorBody),
    /// 422
    PlatformRejected(TracedErrorBody),
    /// 500
    InternalServerError(TracedErrorBody),
    Other { status: u16, body: Value },
    /// 2xx ответ без конверта `{status, body}`, хранится как пришёл
    Unwrapped { status: u16, body: Value },
}

impl PostOutcome {
    pub fn from_parts(status: u16, body: Value) -> Self {
        Self::typed(status, &body).unwrap_or(PostOutcome::Other { status, body })
    }

    /// Тело успешного ответа. Конверт `{status, body}` разбирается,
    /// любой другой JSON сохраняется без изменений.
    pub fn from_success(status: u16, raw: Value) -> Self {
        match unwrap_envelope(&raw) {
            Some((inner_status, body)) => PostOutcome::from_parts(inner_status, body),
            None => PostOutcome::Unwrapped { status, body: raw },
        }
    }

    fn typed(status: u16, body: &Value) -> Option<Self> {
        fn parse<T: for<'de> Deserialize<'de>>(body: &Value) -> Option<T> {
            serde_json::from_value(body.clone()).ok()
        }

        let outcome = match status {
            200 => PostOutcome::Posted(parse(body)?),
            400 => PostOutcome::BadRequest(parse(body)?),
            401 => PostOutcome::Unauthorized(parse(body)?),
            403 => PostOutcome::LimitExceeded(parse(body)?),
            415 => PostOutcome::UnsupportedContentType(parse(body)?),
            422 => PostOutcome::PlatformRejected(parse(body)?),
            500 => PostOutcome::InternalServerError(parse(body)?),
            _ => return None,
        };

        // В документированном ответе sent всегда true
        if let PostOutcome::Posted(success) = &outcome {
            if success.sent() == Some(false) {
                return None;
            }
        }

        if let Some(code) = outcome.error_code() {
            if code.status() != status {
                return None;
            }
        }

        // Лишние поля молча потерялись бы при разборе
        if outcome.body() != *body {
            return None;
        }

        Some(outcome)
    }

    pub fn status(&self) -> u16 {
        match self {
            PostOutcome::Posted(_) => 200,
            PostOutcome::BadRequest(_) => 400,
            PostOutcome::Unauthorized(_) => 401,
            PostOutcome::LimitExceeded(_) => 403,
            PostOutcome::UnsupportedContentType(_) => 415,
            PostOutcome::PlatformRejected(_) => 422,
            PostOutcome::InternalServerError(_) => 500,
            PostOutcome::Other { status, .. } | PostOutcome::Unwrapped { status, .. } => *status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PostOutcome::Posted(_) | PostOutcome::Unwrapped { .. })
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            PostOutcome::BadRequest(b)
            | PostOutcome::Unauthorized(b)
            | PostOutcome::LimitExceeded(b)
            | PostOutcome::UnsupportedContentType(b) => Some(b.error),
            PostOutcome::PlatformRejected(b) | PostOutcome::InternalServerError(b) => Some(b.error),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            PostOutcome::BadRequest(b)
            | PostOutcome::Unauthorized(b)
            | PostOutcome::LimitExceeded(b)
            | PostOutcome::UnsupportedContentType(b) => Some(b.message.as_str()),
            PostOutcome::PlatformRejected(b) | PostOutcome::InternalServerError(b) => {
                Some(b.message.as_str())
            }
            _ => None,
        }
    }

    pub fn req_id(&self) -> Option<&str> {
        match self {
            PostOutcome::PlatformRejected(b) | PostOutcome::InternalServerError(b) => {
                Some(b.req_id.as_str())
            }
            _ => None,
        }
    }

    /// Тело ответа в виде JSON, как его прислал сервер
    pub fn body(&self) -> Value {
        let value = match self {
            PostOutcome::Posted(b) => serde_json::to_value(b),
            PostOutcome::BadRequest(b)
            | PostOutcome::Unauthorized(b)
            | PostOutcome::LimitExceeded(b)
            | PostOutcome::UnsupportedContentType(b) => serde_json::to_value(b),
            PostOutcome::PlatformRejected(b) | PostOutcome::InternalServerError(b) => {
                serde_json::to_value(b)
            }
            PostOutcome::Other { body, .. } | PostOutcome::Unwrapped { body, .. } => {
                return body.clone()
            }
        };
        // Сериализация простых структур в Value не падает
        value.unwrap_or(Value::Null)
    }
}

#[derive(Serialize)]
struct Envelope {
    status: u16,
    body: Value,
}

/// Ровно два ключа: целый `status` и `body`, иначе это не конверт
fn unwrap_envelope(raw: &Value) -> Option<(u16, Value)> {
    let fields = raw.as_object()?;
    if fields.len() != 2 {
        return None;
    }
    let status = u16::try_from(fields.get("status")?.as_u64()?).ok()?;
    Some((status, fields.get("body")?.clone()))
}

impl Serialize for PostOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let PostOutcome::Unwrapped { body, .. } = self {
            return body.serialize(serializer);
        }

        Envelope {
            status: self.status(),
            body: self.body(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PostOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let (status, body) = unwrap_envelope(&raw)
            .ok_or_else(|| serde::de::Error::custom("expected a {status, body} envelope"))?;
        Ok(PostOutcome::from_parts(status, body))
    }
}

impl fmt::Display for PostOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status(), self.body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validate_rejects_empty_connection() {
        let err = PostRequest::new("", "Hello").validate().unwrap_err();
        assert!(matches!(err, PostError::InvalidInput(_)));
        assert_eq!(err.to_string(), "connection must be a non-empty string");
    }

    #[test]
    fn validate_rejects_empty_text() {
        let err = PostRequest::new("linkedin", "").validate().unwrap_err();
        assert!(matches!(err, PostError::InvalidInput(_)));
        assert_eq!(err.to_string(), "text must not be an empty string");
    }

    #[test]
    fn validate_accepts_whitespace_text() {
        assert!(PostRequest::new("x", " ").validate().is_ok());
    }

    #[test]
    fn debug_redacts_api_key() {
        let request = PostRequest::new("x", "hi").api_key("secret-key");
        let printed = format!("{:?}", request);
        assert!(!printed.contains("secret-key"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn success_link_platform_is_typed() {
        let outcome = PostOutcome::from_parts(
            200,
            json!({"platform": "linkedin", "link": "https://linkedin.com/post/123"}),
        );
        assert_eq!(
            outcome,
            PostOutcome::Posted(SuccessBody::Linkedin {
                link: "https://linkedin.com/post/123".to_string()
            })
        );
        assert!(outcome.is_success());
    }

    #[test]
    fn success_messaging_platform_is_typed() {
        let outcome = PostOutcome::from_parts(200, json!({"platform": "slack", "sent": true}));
        match outcome {
            PostOutcome::Posted(body) => {
                assert_eq!(body.platform(), Platform::Slack);
                assert_eq!(body.sent(), Some(true));
                assert_eq!(body.link(), None);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn unknown_platform_falls_back() {
        let body = json!({"platform": "myspace", "link": "https://myspace.com/1"});
        let outcome = PostOutcome::from_parts(200, body.clone());
        assert_eq!(outcome, PostOutcome::Other { status: 200, body });
    }

    #[test]
    fn error_statuses_map_to_variants() {
        let outcome = PostOutcome::from_parts(
            400,
            json!({"error": "invalid_connection", "message": "Connection not found"}),
        );
        assert_eq!(outcome.error_code(), Some(ErrorCode::InvalidConnection));
        assert_eq!(outcome.message(), Some("Connection not found"));
        assert!(matches!(outcome, PostOutcome::BadRequest(_)));

        let outcome = PostOutcome::from_parts(
            422,
            json!({"error": "platform_rejected", "message": "Too long", "reqId": "req_1"}),
        );
        assert!(matches!(outcome, PostOutcome::PlatformRejected(_)));
        assert_eq!(outcome.req_id(), Some("req_1"));

        let outcome = PostOutcome::from_parts(
            403,
            json!({"error": "limit_exceeded", "message": "Slow down"}),
        );
        assert!(matches!(outcome, PostOutcome::LimitExceeded(_)));
    }

    #[test]
    fn error_code_must_match_status() {
        let body = json!({"error": "unauthorized", "message": "nope"});
        let outcome = PostOutcome::from_parts(400, body.clone());
        assert_eq!(outcome, PostOutcome::Other { status: 400, body });
    }

    #[test]
    fn server_error_without_req_id_falls_back() {
        let body = json!({"error": "internal_server_error", "message": "boom"});
        let outcome = PostOutcome::from_parts(500, body.clone());
        assert_eq!(outcome.status(), 500);
        assert_eq!(outcome.error_code(), None);
        assert_eq!(outcome.body(), body);
    }

    #[test]
    fn extra_fields_fall_back_to_keep_body_intact() {
        let body = json!({"error": "unauthorized", "message": "bad key", "hint": "rotate"});
        let outcome = PostOutcome::from_parts(401, body.clone());
        assert_eq!(outcome, PostOutcome::Other { status: 401, body });
    }

    #[test]
    fn undocumented_status_falls_back() {
        let outcome = PostOutcome::from_parts(502, Value::String("Bad Gateway".into()));
        assert_eq!(outcome.status(), 502);
        assert_eq!(outcome.body(), json!("Bad Gateway"));
    }

    #[test]
    fn deserialized_success_serializes_back_unchanged() {
        let raw = json!({
            "status": 200,
            "body": {"platform": "x", "link": "https://x.com/status/1"}
        });
        let outcome: PostOutcome = serde_json::from_value(raw.clone()).unwrap();
        assert!(matches!(outcome, PostOutcome::Posted(SuccessBody::X { .. })));
        assert_eq!(serde_json::to_value(&outcome).unwrap(), raw);
    }

    #[test]
    fn envelope_without_body_is_rejected() {
        assert!(serde_json::from_value::<PostOutcome>(json!({"status": 204})).is_err());
    }

    #[test]
    fn success_body_without_envelope_is_kept_verbatim() {
        let raw = json!({"platform": "linkedin", "link": "l"});
        let outcome = PostOutcome::from_success(200, raw.clone());

        assert_eq!(outcome, PostOutcome::Unwrapped { status: 200, body: raw.clone() });
        assert!(outcome.is_success());
        assert_eq!(serde_json::to_value(&outcome).unwrap(), raw);
    }

    #[test]
    fn envelope_with_extra_fields_is_kept_verbatim() {
        let raw = json!({
            "status": 200,
            "body": {"platform": "linkedin", "link": "l"},
            "reqId": "abc"
        });
        let outcome = PostOutcome::from_success(200, raw.clone());

        assert!(matches!(outcome, PostOutcome::Unwrapped { .. }));
        assert_eq!(serde_json::to_value(&outcome).unwrap(), raw);
    }

    #[test]
    fn exact_envelope_is_typed() {
        let raw = json!({"status": 200, "body": {"platform": "email", "sent": true}});
        let outcome = PostOutcome::from_success(200, raw.clone());

        assert_eq!(outcome, PostOutcome::Posted(SuccessBody::Email { sent: true }));
        assert_eq!(serde_json::to_value(&outcome).unwrap(), raw);
    }

    #[test]
    fn non_object_success_body_is_kept_verbatim() {
        let outcome = PostOutcome::from_success(201, json!([1, 2]));
        assert_eq!(outcome.status(), 201);
        assert_eq!(serde_json::to_value(&outcome).unwrap(), json!([1, 2]));
    }

    #[test]
    fn unsent_message_falls_back() {
        let body = json!({"platform": "sms", "sent": false});
        let outcome = PostOutcome::from_parts(200, body.clone());
        assert_eq!(outcome, PostOutcome::Other { status: 200, body });
    }

    #[test]
    fn display_shows_status_and_body_json() {
        let outcome = PostOutcome::from_parts(
            401,
            json!({"error": "unauthorized", "message": "bad key"}),
        );
        assert_eq!(
            outcome.to_string(),
            r#"401 {"error":"unauthorized","message":"bad key"}"#
        );
    }
}

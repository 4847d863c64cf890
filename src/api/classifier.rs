use crate::models::PostOutcome;
use serde_json::Value;

/// Строит исход для неуспешного ответа: сначала JSON, затем текст,
/// нечитаемое тело становится null. Форма тела не проверяется.
pub fn classify(status: u16, body: Option<&[u8]>) -> PostOutcome {
    PostOutcome::from_parts(status, read_body(body))
}

pub fn read_body(body: Option<&[u8]>) -> Value {
    match body {
        None => Value::Null,
        Some(bytes) => serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;
    use serde_json::json;

    #[test]
    fn json_body_is_parsed() {
        let outcome = classify(
            400,
            Some(br#"{"error":"invalid_connection","message":"Connection not found"}"#.as_slice()),
        );
        assert_eq!(outcome.error_code(), Some(ErrorCode::InvalidConnection));
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "status": 400,
                "body": {"error": "invalid_connection", "message": "Connection not found"}
            })
        );
    }

    #[test]
    fn non_json_body_falls_back_to_text() {
        let outcome = classify(500, Some(b"Internal Server Error".as_slice()));
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"status": 500, "body": "Internal Server Error"})
        );
    }

    #[test]
    fn unreadable_body_is_null() {
        let outcome = classify(503, None);
        assert_eq!(outcome.status(), 503);
        assert_eq!(outcome.body(), Value::Null);
    }

    #[test]
    fn empty_body_is_empty_text() {
        assert_eq!(read_body(Some(b"".as_slice())), json!(""));
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        assert_eq!(read_body(Some([0x66u8, 0x6f, 0xff].as_slice())), json!("fo\u{fffd}"));
    }
}

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::CampusCardError;

/// Fallback message when a failing response carries no usable body.
const GENERIC_FAILURE: &str = "api call failed";

/// Decodes one HTTP response body into the caller's type.
///
/// The service speaks a single envelope: a success payload, or a JSON
/// object with an `error` string. An `error` field fails the call even
/// when the status code is 2xx; a non-2xx status fails it regardless of
/// body shape, preferring the body's `error` text as the message.
pub(crate) fn decode_body<T: DeserializeOwned>(
    status: u16,
    is_success: bool,
    body: &str,
) -> Result<T, CampusCardError> {
    let parsed: Option<JsonValue> = serde_json::from_str(body).ok();
    let server_error = parsed.as_ref().and_then(error_field);

    if !is_success {
        let message = server_error
            .or_else(|| non_empty(body))
            .unwrap_or_else(|| GENERIC_FAILURE.to_owned());
        return Err(CampusCardError::Http { status, message });
    }

    if let Some(message) = server_error {
        return Err(CampusCardError::Api(message));
    }

    let value = parsed.ok_or_else(|| {
        CampusCardError::Decode(format!("response is not valid JSON; body: {body}"))
    })?;
    serde_json::from_value(value)
        .map_err(|err| CampusCardError::Decode(format!("unexpected response shape: {err}; body: {body}")))
}

fn error_field(value: &JsonValue) -> Option<String> {
    value.get("error")?.as_str().map(str::to_owned)
}

fn non_empty(body: &str) -> Option<String> {
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::decode_body;
    use crate::CampusCardError;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pong {
        pong: bool,
    }

    #[test]
    fn success_body_decodes() {
        let pong: Pong = decode_body(200, true, r#"{"pong": true, "timestamp": 1.5}"#)
            .expect("must decode");
        assert!(pong.pong);
    }

    #[test]
    fn error_field_fails_even_on_success_status() {
        let err = decode_body::<Pong>(200, true, r#"{"error": "User already exists"}"#)
            .expect_err("must fail");
        match err {
            CampusCardError::Api(message) => assert_eq!(message, "User already exists"),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn http_failure_prefers_error_field_message() {
        let err = decode_body::<Pong>(401, false, r#"{"error": "Invalid credentials"}"#)
            .expect_err("must fail");
        match err {
            CampusCardError::Http { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid credentials");
            }
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[test]
    fn http_failure_falls_back_to_raw_body() {
        let err =
            decode_body::<Pong>(502, false, "Bad Gateway").expect_err("must fail");
        match err {
            CampusCardError::Http { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_success_body_is_decode_error() {
        let err = decode_body::<Pong>(200, true, "<html>not json</html>")
            .expect_err("must fail");
        assert!(matches!(err, CampusCardError::Decode(_)));
    }

    #[test]
    fn shape_mismatch_is_decode_error() {
        let err = decode_body::<Pong>(200, true, r#"{"other": 1}"#).expect_err("must fail");
        assert!(matches!(err, CampusCardError::Decode(_)));
    }
}

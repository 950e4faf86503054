//! HTTP clients for the upstream dashboard API.
//!
//! Every endpoint answers with the same envelope, `{error, message?, data}`,
//! where `error` is sometimes `"ok"`, sometimes `"unexpected"`, and
//! sometimes a real error kind. The shared plumbing here decodes that shape
//! once: allow-listed sentinels pass through, anything else on a 2xx
//! becomes a non-fatal advisory carried beside the data, and non-2xx
//! responses become [`Error::Server`] with the body message when one can be
//! extracted.

pub mod catalog;
pub mod grabber;
pub mod storage;

use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};

/// `error` discriminator values the upstream uses on non-failure responses.
/// Inferred from observed server behavior; possibly incomplete.
const NON_ERROR_SENTINELS: [&str; 2] = ["ok", "unexpected"];

/// A decoded `{error, message?, data}` response body.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub data: Value,
    /// Server message attached to a 2xx response whose `error` value is not
    /// in the allow-list. Informational, not a failure.
    pub advisory: Option<String>,
}

/// Validate an API root and strip any trailing slash.
pub(crate) fn normalize_root(api_root: &str) -> Result<String> {
    let url = Url::parse(api_root)
        .map_err(|e| Error::Validation(format!("invalid API root '{api_root}': {e}")))?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

pub(crate) fn envelope_from_body(body: Value) -> Envelope {
    let error = body.get("error").and_then(Value::as_str);
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);

    let advisory = match error {
        Some(kind) if !NON_ERROR_SENTINELS.contains(&kind) => Some(
            message.unwrap_or_else(|| format!("server reported '{kind}' without a message")),
        ),
        _ => None,
    };

    let data = body.get("data").cloned().unwrap_or(Value::Null);
    Envelope { data, advisory }
}

/// Decode a response into an [`Envelope`], turning non-2xx statuses into
/// [`Error::Server`].
pub(crate) async fn read_envelope(resp: reqwest::Response) -> Result<Envelope> {
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }
    let body: Value = resp
        .json()
        .await
        .map_err(|e| Error::DataFormat(format!("response body is not JSON: {e}")))?;
    Ok(envelope_from_body(body))
}

/// Build an [`Error::Server`] from a non-2xx response, preferring the
/// body's `message` field over a synthesized status-code message.
pub(crate) async fn error_from_response(resp: reqwest::Response) -> Error {
    let status = resp.status().as_u16();
    match resp.json::<Value>().await {
        Ok(body) => match body.get("message").and_then(Value::as_str) {
            Some(msg) if !msg.is_empty() => Error::Server {
                status,
                message: msg.to_string(),
            },
            _ => Error::from_status(status),
        },
        Err(_) => Error::from_status(status),
    }
}

/// Expect a 2xx response with no payload of interest.
pub(crate) async fn expect_ok(resp: reqwest::Response) -> Result<()> {
    if resp.status().is_success() {
        Ok(())
    } else {
        Err(error_from_response(resp).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_ok_sentinel_has_no_advisory() {
        let env = envelope_from_body(json!({"error": "ok", "data": [1, 2]}));
        assert!(env.advisory.is_none());
        assert_eq!(env.data, json!([1, 2]));
    }

    #[test]
    fn test_envelope_unexpected_sentinel_has_no_advisory() {
        let env = envelope_from_body(json!({"error": "unexpected", "message": "x", "data": null}));
        assert!(env.advisory.is_none());
    }

    #[test]
    fn test_envelope_other_error_carries_message_as_advisory() {
        let env = envelope_from_body(json!({
            "error": "validation",
            "message": "course selection not yet open",
            "data": []
        }));
        assert_eq!(env.advisory.as_deref(), Some("course selection not yet open"));
        assert_eq!(env.data, json!([]));
    }

    #[test]
    fn test_envelope_other_error_without_message_synthesizes_one() {
        let env = envelope_from_body(json!({"error": "weird", "data": null}));
        assert!(env.advisory.unwrap().contains("weird"));
    }

    #[test]
    fn test_envelope_missing_data_is_null() {
        let env = envelope_from_body(json!({"error": "ok"}));
        assert_eq!(env.data, Value::Null);
    }

    #[test]
    fn test_normalize_root_strips_trailing_slash() {
        assert_eq!(
            normalize_root("http://localhost:8080/api/").unwrap(),
            "http://localhost:8080/api"
        );
    }

    #[test]
    fn test_normalize_root_rejects_garbage() {
        assert!(matches!(
            normalize_root("not a url"),
            Err(Error::Validation(_))
        ));
    }
}

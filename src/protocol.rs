use serde::Deserialize;
use serde_json::Value;

use crate::http::Response;
use crate::{Error, Result};

/// A decoded response body: JSON when the server says so, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Body {
    Json(Value),
    Text(String),
}

/// The uniform response contract shared by every background call: sniff the
/// content type, and turn a non-2xx status into an error carrying the best
/// available message (`detail` field, else the raw body, else the status).
pub(crate) fn decode(response: &Response) -> Result<Body> {
    let body = if response
        .content_type
        .to_ascii_lowercase()
        .contains("application/json")
    {
        let value: Value = serde_json::from_str(&response.body)
            .map_err(|err| Error::Payload(err.to_string()))?;
        Body::Json(value)
    } else {
        Body::Text(response.body.clone())
    };

    if !response.is_success() {
        return Err(Error::Backend {
            status: response.status,
            message: failure_message(response.status, &body),
        });
    }
    Ok(body)
}

fn failure_message(status: u16, body: &Body) -> String {
    match body {
        Body::Json(value) => value
            .get("detail")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| {
                if value.is_null() {
                    format!("Error {status}")
                } else {
                    value.to_string()
                }
            }),
        Body::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                format!("Error {status}")
            } else {
                trimmed.to_string()
            }
        }
    }
}

/// Markup carried by a form-fragment response: the `html` field of a JSON
/// body, or the whole body when the server answered with raw HTML.
pub(crate) fn fragment_html(body: &Body) -> Option<String> {
    match body {
        Body::Json(value) => value
            .get("html")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
        Body::Text(text) => Some(text.clone()),
    }
}

/// Create reply: `{id, role_tag, html}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CreatedCard {
    #[serde(default)]
    pub(crate) id: Option<i64>,
    #[serde(default)]
    pub(crate) role_tag: Option<String>,
    #[serde(default)]
    pub(crate) html: Option<String>,
}

/// Edit reply: `{id, role_tag, html, moved}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct EditedCard {
    #[serde(default)]
    pub(crate) id: Option<i64>,
    #[serde(default)]
    pub(crate) moved: bool,
    #[serde(default)]
    pub(crate) role_tag: Option<String>,
    #[serde(default)]
    pub(crate) html: Option<String>,
}

/// Delete reply: `{ok, id}`. Either field counts as acknowledgement.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DeleteAck {
    #[serde(default)]
    pub(crate) ok: bool,
    #[serde(default)]
    pub(crate) id: Option<i64>,
}

impl DeleteAck {
    pub(crate) fn acknowledged(&self) -> bool {
        self.ok || self.id.is_some()
    }
}

/// Deserializes a reply model from a decoded body. Shape mismatches and
/// plain-text bodies degrade to the model's defaults, which downstream code
/// treats as "not enough to patch the document".
pub(crate) fn reply_from<T: Default + for<'de> Deserialize<'de>>(body: &Body) -> T {
    match body {
        Body::Json(value) => serde_json::from_value(value.clone()).unwrap_or_else(|err| {
            log::warn!("reply did not match the expected shape: {err}");
            T::default()
        }),
        Body::Text(_) => T::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_content_type_parses_json() -> Result<()> {
        let body = decode(&Response::json(200, r#"{"html":"<form></form>"}"#))?;
        assert_eq!(fragment_html(&body).as_deref(), Some("<form></form>"));
        Ok(())
    }

    #[test]
    fn non_json_body_is_kept_verbatim() -> Result<()> {
        let body = decode(&Response::html(200, "<form></form>"))?;
        assert_eq!(body, Body::Text("<form></form>".into()));
        assert_eq!(fragment_html(&body).as_deref(), Some("<form></form>"));
        Ok(())
    }

    #[test]
    fn failure_prefers_the_detail_field() {
        let err = decode(&Response::json(400, r#"{"detail":"Invalid data"}"#))
            .expect_err("non-2xx should fail");
        assert_eq!(
            err,
            Error::Backend {
                status: 400,
                message: "Invalid data".into()
            }
        );
        assert_eq!(err.to_string(), "Invalid data");
    }

    #[test]
    fn failure_falls_back_to_raw_text_then_status() {
        let err = decode(&Response::text(403, "Admins only")).expect_err("should fail");
        assert_eq!(err.to_string(), "Admins only");

        let err = decode(&Response::text(500, "")).expect_err("should fail");
        assert_eq!(err.to_string(), "Error 500");
    }

    #[test]
    fn malformed_json_is_a_payload_error() {
        let err = decode(&Response::json(200, "{not json")).expect_err("should fail");
        assert!(matches!(err, Error::Payload(_)));
    }

    #[test]
    fn json_without_html_yields_no_fragment() -> Result<()> {
        let body = decode(&Response::json(200, r#"{"ok":true}"#))?;
        assert_eq!(fragment_html(&body), None);
        Ok(())
    }

    #[test]
    fn replies_tolerate_missing_and_extra_fields() {
        let body = Body::Json(serde_json::json!({"id": 5, "extra": 1}));
        let edited: EditedCard = reply_from(&body);
        assert_eq!(edited.id, Some(5));
        assert!(!edited.moved);
        assert!(edited.html.is_none());

        let ack: DeleteAck = reply_from(&Body::Text("gone".into()));
        assert!(!ack.acknowledged());
        let ack: DeleteAck = reply_from(&Body::Json(serde_json::json!({"id": 3})));
        assert!(ack.acknowledged());
    }
}

use serde::{Deserialize, Serialize};

/// Typed request passed from a UI surface to the message router.
///
/// The wire shape is `{ "type": ..., "payload": {...} }` so that popup and
/// page surfaces can share one submission path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum RequestEnvelope {
    /// Free-form question typed into the popup.
    #[serde(rename = "QUICK_ASK")]
    QuickAsk {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preset: Option<String>,
    },

    /// Templated transformation of selected page text.
    #[serde(rename = "WRITING_ACTION")]
    WritingAction {
        action: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preset: Option<String>,
        text: String,
    },

    /// Credential check from the settings surface. Uses only the supplied
    /// key; never reads persisted settings and never records history.
    #[serde(rename = "VALIDATE_CONFIG")]
    ValidateConfig {
        provider: String,
        model: String,
        key: String,
    },
}

/// Correlated answer returned to the caller, exactly once per envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseData {
    pub response: String,
}

impl ActionResponse {
    pub fn ok(response: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(ResponseData {
                response: response.into(),
            }),
            error: None,
        }
    }

    /// Success with no payload (VALIDATE_CONFIG answers this way).
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Finished result pushed back to the page that originated the request.
///
/// Relayed as `{ "type": "SHOW_RESULT", "payload": {...} }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowResult {
    pub action: String,
    pub original: String,
    pub result: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_wire_shape() {
        let envelope: RequestEnvelope = serde_json::from_value(json!({
            "type": "WRITING_ACTION",
            "payload": { "action": "grammar", "preset": "email", "text": "original text" }
        }))
        .unwrap();

        assert_eq!(
            envelope,
            RequestEnvelope::WritingAction {
                action: "grammar".to_string(),
                preset: Some("email".to_string()),
                text: "original text".to_string(),
            }
        );
    }

    #[test]
    fn quick_ask_preset_is_optional() {
        let envelope: RequestEnvelope = serde_json::from_value(json!({
            "type": "QUICK_ASK",
            "payload": { "query": "what is rust?" }
        }))
        .unwrap();

        match envelope {
            RequestEnvelope::QuickAsk { query, preset } => {
                assert_eq!(query, "what is rust?");
                assert!(preset.is_none());
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[test]
    fn success_response_omits_error_field() {
        let value = serde_json::to_value(ActionResponse::ok("Improved Text")).unwrap();
        assert_eq!(
            value,
            json!({ "success": true, "data": { "response": "Improved Text" } })
        );
    }

    #[test]
    fn failure_response_omits_data_field() {
        let value = serde_json::to_value(ActionResponse::err("Bad Request")).unwrap();
        assert_eq!(value, json!({ "success": false, "error": "Bad Request" }));
    }
}

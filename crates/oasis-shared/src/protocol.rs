use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// A parsed REST response.
///
/// The API answers with a JSON array whose first element carries `data`
/// (an array of records, or a single record object) and optionally a
/// `message` used as empty-state text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub data: Vec<Value>,
    pub message: Option<String>,
}

impl Envelope {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let first = match value {
            Value::Array(items) => match items.into_iter().next() {
                Some(first) => first,
                None => return Ok(Self::default()),
            },
            other => {
                return Err(ProtocolError::UnexpectedShape(format!(
                    "expected a top-level array, got {}",
                    describe(&other)
                )))
            }
        };

        let Value::Object(mut head) = first else {
            return Err(ProtocolError::UnexpectedShape(
                "first element is not an object".into(),
            ));
        };

        let message = match head.remove("message") {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
            _ => None,
        };

        let data = match head.remove("data") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(record @ Value::Object(_)) => vec![record],
            Some(other) => {
                return Err(ProtocolError::UnexpectedShape(format!(
                    "data must be an array or an object, got {}",
                    describe(&other)
                )))
            }
        };

        Ok(Self { data, message })
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Extract the server-supplied message from an error response body.
///
/// Accepts both the enveloped form (`[{"message": ..}]`) and a bare object
/// carrying `message` or `error`.
pub fn server_message(bytes: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    let head = match value {
        Value::Array(items) => items.into_iter().next()?,
        other => other,
    };
    ["message", "error"].iter().find_map(|key| {
        head.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(String::from)
    })
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Push payload
// ---------------------------------------------------------------------------

/// Navigation intent carried by an inbound push notification.
///
/// Unknown action strings are read as [`PushAction::None`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PushAction {
    #[default]
    None,
    OpenWebview,
    OpenDefaultBrowser,
    OpenAppointmentDetails,
    RefreshProfile,
    RefreshMyAppointments,
    RefreshDashboard,
}

impl PushAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::OpenWebview => "open-webview",
            Self::OpenDefaultBrowser => "open-default-browser",
            Self::OpenAppointmentDetails => "open-appointment-details",
            Self::RefreshProfile => "refresh-profile",
            Self::RefreshMyAppointments => "refresh-my-appointments",
            Self::RefreshDashboard => "refresh-dashboard",
        }
    }
}

impl From<String> for PushAction {
    fn from(value: String) -> Self {
        match value.trim() {
            "open-webview" => Self::OpenWebview,
            "open-default-browser" => Self::OpenDefaultBrowser,
            "open-appointment-details" => Self::OpenAppointmentDetails,
            "refresh-profile" => Self::RefreshProfile,
            "refresh-my-appointments" => Self::RefreshMyAppointments,
            "refresh-dashboard" => Self::RefreshDashboard,
            _ => Self::None,
        }
    }
}

impl From<PushAction> for String {
    fn from(action: PushAction) -> Self {
        action.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub action: PushAction,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub appointment_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl PushPayload {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

//! Frame payload types.
//!
//! Field names on the wire are camelCase. Inbound payload fields default to
//! empty when missing or `null`, so that an absent value surfaces as a
//! validation failure in the router instead of an opaque decode error.

use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Payload of an inbound `review_requested` frame.
///
/// # Protocol Flow
///
/// The backend pushes one of these whenever it has generated candidate
/// replies for an incoming email and needs a human to pick, edit or discard
/// them. The client answers later with a `decision` frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    /// Origin address of the inbound email
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender: String,

    /// Email subject
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,

    /// Verbatim email body
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_body: String,

    /// AI-generated reply texts, in the order the backend ranked them
    #[serde(default, deserialize_with = "null_as_default")]
    pub candidates: Vec<String>,
}

/// Payload of an inbound `server_error` frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerErrorData {
    /// Human readable error, if the server supplied one
    #[serde(default)]
    pub message: Option<String>,
}

impl ServerErrorData {
    /// The message, or a placeholder when the server sent none.
    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().filter(|m| !m.is_empty()).unwrap_or("Unknown error")
    }
}

/// Payload of an outbound `decision` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionData {
    /// Discard the draft without replying
    pub is_skip: bool,

    /// Final reply text. Sent for skips too, where the server only logs it.
    pub body: String,
}

/// Payload of an outbound `connection_probe` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeData {
    /// RFC 3339 timestamp of when the probe was sent
    pub timestamp: String,

    /// Reviewer identifier the connection was opened for
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_fields_decode_as_empty() {
        let request: ReviewRequest = serde_json::from_str(
            r#"{"sender":null,"subject":"X","originalBody":null,"candidates":null}"#,
        )
        .unwrap();

        assert_eq!(request.sender, "");
        assert_eq!(request.subject, "X");
        assert_eq!(request.original_body, "");
        assert!(request.candidates.is_empty());
    }

    #[test]
    fn missing_fields_decode_as_empty() {
        let request: ReviewRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, ReviewRequest::default());
    }
}

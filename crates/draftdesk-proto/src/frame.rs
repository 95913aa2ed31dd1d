//! Inbound and outbound frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::{ProtocolError, Result},
    payloads::{DecisionData, ProbeData, ReviewRequest, ServerErrorData},
};

/// Frame received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// A new draft needs review
    ReviewRequested(ReviewRequest),

    /// Server acknowledged our heartbeat
    HeartbeatAck,

    /// Server is checking that we are alive; answer with `connection_probe_ack`
    ConnectionProbe,

    /// Server answered a probe we sent
    ConnectionProbeAck,

    /// Server reported a problem; the connection stays open
    ServerError(ServerErrorData),

    /// A tag this client does not understand
    Unknown {
        /// The unrecognized `type` value
        kind: String,
    },
}

/// Envelope shared by every frame: `{ "type": ..., "data": ... }`.
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<Value>,
}

impl InboundFrame {
    /// Parse a text message into a frame.
    ///
    /// # Errors
    ///
    /// - `Malformed` if the text is not an object with a string `type`
    /// - `MissingData` if a `review_requested` frame has no `data`
    /// - `InvalidPayload` if a known payload has the wrong shape
    pub fn parse(text: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;

        match envelope.kind.as_str() {
            "review_requested" => {
                let data = envelope
                    .data
                    .ok_or_else(|| ProtocolError::MissingData { kind: envelope.kind.clone() })?;
                let request = decode_payload(&envelope.kind, data)?;
                Ok(Self::ReviewRequested(request))
            },
            "heartbeat_ack" => Ok(Self::HeartbeatAck),
            "connection_probe" => Ok(Self::ConnectionProbe),
            "connection_probe_ack" => Ok(Self::ConnectionProbeAck),
            "server_error" => {
                let data = match envelope.data {
                    Some(data) => decode_payload(&envelope.kind, data)?,
                    None => ServerErrorData::default(),
                };
                Ok(Self::ServerError(data))
            },
            _ => Ok(Self::Unknown { kind: envelope.kind }),
        }
    }

    /// Wire tag of this frame.
    pub fn kind(&self) -> &str {
        match self {
            Self::ReviewRequested(_) => "review_requested",
            Self::HeartbeatAck => "heartbeat_ack",
            Self::ConnectionProbe => "connection_probe",
            Self::ConnectionProbeAck => "connection_probe_ack",
            Self::ServerError(_) => "server_error",
            Self::Unknown { kind } => kind,
        }
    }
}

fn decode_payload<T: serde::de::DeserializeOwned>(kind: &str, data: Value) -> Result<T> {
    serde_json::from_value(data)
        .map_err(|source| ProtocolError::InvalidPayload { kind: kind.to_string(), source })
}

/// Frame sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Keep-alive, sent while the connection is open
    Heartbeat,

    /// Reviewer's decision on the currently selected draft
    Decision(DecisionData),

    /// Manual diagnostic round trip
    ConnectionProbe(ProbeData),

    /// Answer to a server-initiated probe
    ConnectionProbeAck,
}

impl OutboundFrame {
    /// Serialize to a JSON text message.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Wire tag of this frame.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::Decision(_) => "decision",
            Self::ConnectionProbe(_) => "connection_probe",
            Self::ConnectionProbeAck => "connection_probe_ack",
        }
    }
}

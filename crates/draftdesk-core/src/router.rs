//! Message router.
//!
//! Classifies one inbound text frame into the actions the session applies.
//! Routing is deterministic and never touches the connection: unknown tags
//! are ignored, and malformed or invalid frames come back as a
//! [`RouteError`] for the caller to report.

use draftdesk_proto::{InboundFrame, OutboundFrame};
use tracing::{debug, info, warn};

use crate::{error::RouteError, queue::DraftItem};

/// Actions produced by routing one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAction {
    /// Append this draft to the queue
    Enqueue(DraftItem),

    /// Alert the reviewer through the notification gateway
    Notify {
        /// Notification title
        title: String,
        /// Notification body
        body: String,
    },

    /// Send this frame back to the server
    Reply(OutboundFrame),

    /// Server acknowledged a heartbeat
    HeartbeatAcknowledged,

    /// Server answered our diagnostic probe
    ProbeAcknowledged,

    /// Server reported an error; the connection stays open
    ServerError(String),

    /// Frame type is unknown and was dropped
    Ignored {
        /// The unrecognized tag
        kind: String,
    },
}

/// Inbound frame classifier.
#[derive(Debug, Clone)]
pub struct Router {
    alert_title: String,
}

impl Default for Router {
    fn default() -> Self {
        Self::new("New Draft Ready for Review")
    }
}

impl Router {
    /// Create a router that titles new-draft alerts with `alert_title`.
    pub fn new(alert_title: impl Into<String>) -> Self {
        Self { alert_title: alert_title.into() }
    }

    /// Route one text frame.
    ///
    /// # Errors
    /// - `Protocol` if the text does not parse as a frame
    /// - `InvalidDraft` if a `review_requested` payload fails validation
    pub fn route(&self, text: &str) -> Result<Vec<RouteAction>, RouteError> {
        let frame = InboundFrame::parse(text)?;
        self.route_frame(frame)
    }

    /// Route an already parsed frame.
    ///
    /// # Errors
    /// Returns `InvalidDraft` if a `review_requested` payload fails validation.
    pub fn route_frame(&self, frame: InboundFrame) -> Result<Vec<RouteAction>, RouteError> {
        match frame {
            InboundFrame::ReviewRequested(request) => {
                let item = DraftItem::try_from(request)?;
                info!(subject = item.subject(), sender = item.sender(), "draft received");

                let body = format!("Subject: {}\nFrom: {}", item.subject(), item.sender());
                Ok(vec![
                    RouteAction::Enqueue(item),
                    RouteAction::Notify { title: self.alert_title.clone(), body },
                ])
            },
            InboundFrame::HeartbeatAck => Ok(vec![RouteAction::HeartbeatAcknowledged]),
            InboundFrame::ConnectionProbe => {
                debug!("answering connection probe");
                Ok(vec![RouteAction::Reply(OutboundFrame::ConnectionProbeAck)])
            },
            InboundFrame::ConnectionProbeAck => Ok(vec![RouteAction::ProbeAcknowledged]),
            InboundFrame::ServerError(data) => {
                let message = data.message_or_default().to_string();
                warn!(%message, "server reported an error");
                Ok(vec![RouteAction::ServerError(message)])
            },
            InboundFrame::Unknown { kind } => {
                debug!(%kind, "ignoring unknown frame type");
                Ok(vec![RouteAction::Ignored { kind }])
            },
        }
    }
}

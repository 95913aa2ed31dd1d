//! Error types and the fault taxonomy.
//!
//! Individual components return narrow error enums. The session folds every
//! failure into a [`Fault`], which decides how the reviewer hears about it:
//! transport faults only move the status indicator, fatal faults stay on
//! screen until resolved, everything else becomes a transient notice.

use draftdesk_proto::ProtocolError;
use thiserror::Error;

use crate::{connection::ConnectionState, notice::Notice};

/// Connection state machine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// Event or operation not valid in the current state
    #[error("invalid state {state:?} for operation: {operation}")]
    InvalidState {
        /// State the connection was in
        state: ConnectionState,
        /// Operation that was attempted
        operation: String,
    },
}

/// A `review_requested` payload failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DraftError {
    /// `sender` was empty or missing
    #[error("draft is missing a sender")]
    MissingSender,
    /// `subject` was empty or missing
    #[error("draft is missing a subject")]
    MissingSubject,
    /// `candidates` was empty or missing
    #[error("draft has no candidate replies")]
    NoCandidates,
}

/// Inbound frame could not be routed.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The frame did not parse
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// The frame parsed but its draft is unusable
    #[error("invalid draft data: {0}")]
    InvalidDraft(#[from] DraftError),
}

/// A reviewer decision could not be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The connection is not open
    #[error("not connected to server")]
    NotConnected,
    /// There is no draft under the cursor
    #[error("no active draft to respond to")]
    QueueEmpty,
    /// An accept decision carried only whitespace
    #[error("reply text is empty")]
    EmptyBody,
    /// The transport refused the frame
    #[error("failed to send response: {0}")]
    SendFailed(String),
}

/// Endpoint derivation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// Origin scheme is neither http nor https
    #[error("unsupported origin scheme '{0}'")]
    UnsupportedScheme(String),
    /// Origin has no host component
    #[error("origin has no host")]
    MissingHost,
    /// The assembled URL did not parse
    #[error("invalid connection url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// How urgently a fault must be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Shown transiently (or not at all); the reviewer can carry on
    Recoverable,
    /// Shown until resolved; requires a manual reconnect or reload
    Blocking,
}

/// Every failure the core reports.
#[derive(Debug, Error)]
pub enum Fault {
    /// Abnormal close, socket error or connect timeout. Recovered automatically.
    #[error("transport fault: {reason}")]
    Transport {
        /// What happened
        reason: String,
    },

    /// Malformed or invalid inbound frame. Dropped.
    #[error("protocol fault: {0}")]
    Protocol(#[from] RouteError),

    /// Server reported an error over an otherwise healthy connection.
    #[error("server error: {message}")]
    Server {
        /// Message supplied by the server
        message: String,
    },

    /// Decision could not be submitted. Nothing was mutated.
    #[error("submission fault: {0}")]
    Submission(#[from] SubmitError),

    /// Reconnection attempts exhausted.
    #[error("connection failed after {attempts} reconnect attempts")]
    Fatal {
        /// Number of retries that were made
        attempts: u32,
    },
}

impl Fault {
    /// Presentation severity.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Fatal { .. } => Severity::Blocking,
            _ => Severity::Recoverable,
        }
    }

    /// Transient notice for this fault, if the reviewer should see one.
    ///
    /// Transport faults return `None`: the connection status is the only
    /// feedback. Fatal faults also return `None` because they are shown as a
    /// persistent banner instead.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Transport { .. } | Self::Fatal { .. } => None,
            Self::Protocol(RouteError::InvalidDraft(_)) => {
                Some(Notice::error("Received invalid draft data"))
            },
            Self::Protocol(RouteError::Protocol(_)) => {
                Some(Notice::warning("Ignored a malformed message from the server"))
            },
            Self::Server { message } => Some(Notice::error(format!("Server error: {message}"))),
            Self::Submission(SubmitError::NotConnected) => {
                Some(Notice::error("Not connected to server"))
            },
            Self::Submission(SubmitError::QueueEmpty) => {
                Some(Notice::warning("No active draft to respond to"))
            },
            Self::Submission(SubmitError::EmptyBody) => {
                Some(Notice::warning("Reply text is empty"))
            },
            Self::Submission(SubmitError::SendFailed(_)) => {
                Some(Notice::error("Failed to send response"))
            },
        }
    }

    /// Banner text for blocking faults.
    pub fn banner(&self) -> Option<String> {
        match self {
            Self::Fatal { .. } => {
                Some("Connection failed. Reconnect manually or restart the client.".to_string())
            },
            _ => None,
        }
    }
}

//! Session actions
//!
//! Effects produced by the session for the runtime to execute.

use draftdesk_core::DraftId;
use draftdesk_proto::{CloseCode, OutboundFrame};
use url::Url;

/// Why a frame is being sent. Handed back to the session with the send result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPurpose {
    /// Keep-alive
    Heartbeat,
    /// Reply to a server probe
    ProbeAck,
    /// Reviewer-initiated diagnostic probe
    Probe,
    /// Reviewer decision about a queued draft
    Decision {
        /// Draft to dequeue once the send succeeds
        draft: DraftId,
        /// Whether the decision is a skip
        is_skip: bool,
    },
}

/// Actions produced by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open a transport.
    Connect {
        /// Socket URL
        url: Url,
    },

    /// Close the current transport and drop its listeners.
    Disconnect {
        /// Close code
        code: CloseCode,
        /// Human readable reason
        reason: String,
    },

    /// Send a frame and report the result through `Session::send_completed`.
    Send {
        /// Frame to encode
        frame: OutboundFrame,
        /// What the send is for
        purpose: SendPurpose,
    },
}

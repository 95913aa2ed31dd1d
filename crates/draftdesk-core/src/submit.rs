//! Submission protocol.
//!
//! Turns a reviewer decision about the selected draft into a `decision`
//! frame. Preconditions are checked in a fixed order and a failed check
//! mutates nothing. The caller removes the draft only after the transport
//! has accepted the frame.

use draftdesk_proto::{DecisionData, OutboundFrame};

use crate::{
    connection::ConnectionState,
    error::SubmitError,
    queue::{DraftId, DraftItem, DraftQueue},
};

/// The reviewer's verdict on the selected draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Decline to respond
    pub is_skip: bool,
    /// Reply text (possibly edited), empty for a skip
    pub body: String,
}

impl Decision {
    /// Accept with this reply text.
    pub fn accept(body: impl Into<String>) -> Self {
        Self { is_skip: false, body: body.into() }
    }

    /// Skip the draft.
    pub fn skip() -> Self {
        Self { is_skip: true, body: String::new() }
    }

    /// Accept candidate `index` of `item` unedited.
    pub fn accept_candidate(item: &DraftItem, index: usize) -> Option<Self> {
        item.candidate(index).map(Self::accept)
    }
}

/// A decision that passed every precondition and is ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    /// Draft the decision is about
    pub draft: DraftId,
    /// Frame to put on the wire
    pub frame: OutboundFrame,
    /// Whether this is a skip
    pub is_skip: bool,
}

/// Validate a decision against the connection and queue.
///
/// # Errors
///
/// Checked in order:
/// - `NotConnected` if the connection is not open
/// - `QueueEmpty` if no draft is selected
/// - `EmptyBody` if an accept carries only whitespace
pub fn prepare(
    decision: &Decision,
    state: ConnectionState,
    queue: &DraftQueue,
) -> Result<PendingSubmission, SubmitError> {
    if state != ConnectionState::Open {
        return Err(SubmitError::NotConnected);
    }

    let (draft, _) = queue.current().ok_or(SubmitError::QueueEmpty)?;

    if !decision.is_skip && decision.body.trim().is_empty() {
        return Err(SubmitError::EmptyBody);
    }

    let frame = OutboundFrame::Decision(DecisionData {
        is_skip: decision.is_skip,
        body: decision.body.clone(),
    });

    Ok(PendingSubmission { draft, frame, is_skip: decision.is_skip })
}

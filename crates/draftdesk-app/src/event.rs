//! Events
//!
//! Everything the runtime reacts to: transport signals, reviewer commands,
//! timer expiry and quit.

use draftdesk_core::Decision;
use draftdesk_proto::CloseCode;

/// Signals from the active transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed
    Opened,
    /// Text frame received
    Message(String),
    /// Transport closed
    Closed {
        /// Close code reported by the transport
        code: CloseCode,
    },
    /// Transport failed
    Error {
        /// What went wrong
        reason: String,
    },
}

/// Reviewer commands from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit a decision about the selected draft
    Submit(Decision),
    /// Accept a candidate of the selected draft unedited
    AcceptCandidate {
        /// Candidate index
        index: usize,
    },
    /// Skip the selected draft
    Skip,
    /// Jump to a queue position
    SetCursor {
        /// Queue index
        index: usize,
    },
    /// Select the following draft
    Next,
    /// Select the preceding draft
    Previous,
    /// Tear down and reconnect now
    Reconnect,
    /// Send a diagnostic probe
    Probe,
    /// Ask for notification permission again
    RequestPermission,
}

/// One unit of input for the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// Transport signal
    Transport(TransportEvent),
    /// Reviewer command
    Command(Command),
    /// A deadline passed
    Tick,
    /// Leave the event loop
    Quit,
}

//! Read-only session snapshot for presentation.

use std::time::Instant;

use draftdesk_core::{ConnectionState, DraftId, DraftItem, DraftQueue, Permission};
use url::Url;

/// What the presentation layer may read.
#[derive(Debug, Clone)]
pub struct SessionView<'a> {
    /// Connection state
    pub connection: ConnectionState,
    /// Pending drafts
    pub queue: &'a DraftQueue,
    /// Notification permission
    pub permission: Permission,
    /// Persistent banner for blocking faults
    pub banner: Option<String>,
    /// When the server last acknowledged a heartbeat
    pub last_heartbeat_ack: Option<Instant>,
    /// Socket URL
    pub url: &'a Url,
}

impl SessionView<'_> {
    /// Whether the connection is open.
    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Open
    }

    /// Index of the selected draft.
    pub fn cursor(&self) -> Option<usize> {
        self.queue.cursor()
    }

    /// Selected draft.
    pub fn current(&self) -> Option<(DraftId, &DraftItem)> {
        self.queue.current()
    }
}

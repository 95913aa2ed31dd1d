//! Draft queue store.
//!
//! Ordered collection of drafts awaiting review plus the cursor that says
//! which one is on screen. Insertion order is arrival order.
//!
//! # Invariants
//!
//! - The cursor is `None` exactly when the queue is empty.
//! - When present, the cursor is always `< len()`.
//!
//! Removal repairs the cursor immediately so the reviewer keeps looking at
//! "the next pending draft" instead of being bumped elsewhere.

use std::fmt;

use draftdesk_proto::ReviewRequest;

use crate::error::DraftError;

/// Identity of a queued draft, unique for the lifetime of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DraftId(u64);

impl DraftId {
    /// Raw value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One candidate reply bundle awaiting a reviewer decision.
///
/// Immutable once created. Construction validates that the sender, subject
/// and candidate list are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftItem {
    sender: String,
    subject: String,
    original_body: String,
    candidates: Vec<String>,
}

impl DraftItem {
    /// Build a validated draft.
    ///
    /// # Errors
    /// Returns the first missing piece: sender, subject, then candidates.
    pub fn new(
        sender: impl Into<String>,
        subject: impl Into<String>,
        original_body: impl Into<String>,
        candidates: Vec<String>,
    ) -> Result<Self, DraftError> {
        let sender = sender.into();
        let subject = subject.into();

        if sender.is_empty() {
            return Err(DraftError::MissingSender);
        }
        if subject.is_empty() {
            return Err(DraftError::MissingSubject);
        }
        if candidates.is_empty() {
            return Err(DraftError::NoCandidates);
        }

        Ok(Self { sender, subject, original_body: original_body.into(), candidates })
    }

    /// Origin address of the inbound email.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Email subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Verbatim email body.
    pub fn original_body(&self) -> &str {
        &self.original_body
    }

    /// Candidate replies, never empty.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Candidate reply at `index`.
    pub fn candidate(&self, index: usize) -> Option<&str> {
        self.candidates.get(index).map(String::as_str)
    }
}

impl TryFrom<ReviewRequest> for DraftItem {
    type Error = DraftError;

    fn try_from(request: ReviewRequest) -> Result<Self, Self::Error> {
        Self::new(request.sender, request.subject, request.original_body, request.candidates)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    id: DraftId,
    item: DraftItem,
}

/// Ordered queue of pending drafts with a cursor.
#[derive(Debug, Clone, Default)]
pub struct DraftQueue {
    slots: Vec<Slot>,
    cursor: Option<usize>,
    next_id: u64,
}

impl DraftQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending drafts.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Index of the draft on screen, `None` when empty.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Draft at `index`.
    pub fn get(&self, index: usize) -> Option<&DraftItem> {
        self.slots.get(index).map(|slot| &slot.item)
    }

    /// Identity of the draft at `index`.
    pub fn id_at(&self, index: usize) -> Option<DraftId> {
        self.slots.get(index).map(|slot| slot.id)
    }

    /// Current position of the draft with this identity.
    pub fn position(&self, id: DraftId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.id == id)
    }

    /// Draft under the cursor.
    pub fn current(&self) -> Option<(DraftId, &DraftItem)> {
        let slot = self.slots.get(self.cursor?)?;
        Some((slot.id, &slot.item))
    }

    /// Pending drafts in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (DraftId, &DraftItem)> {
        self.slots.iter().map(|slot| (slot.id, &slot.item))
    }

    /// Append a draft. The first draft into an empty queue is selected.
    pub fn enqueue(&mut self, item: DraftItem) -> DraftId {
        let id = DraftId(self.next_id);
        self.next_id += 1;

        self.slots.push(Slot { id, item });
        if self.cursor.is_none() {
            self.cursor = Some(0);
        }
        id
    }

    /// Remove the draft at `index` and repair the cursor.
    ///
    /// - Removing the selected draft keeps the cursor on the same index, which
    ///   now holds the next draft, clamped to the new last index.
    /// - Removing a draft before the cursor shifts the cursor back so the same
    ///   draft stays selected.
    /// - Removing the last draft clears the cursor.
    pub fn remove_at(&mut self, index: usize) -> Option<DraftItem> {
        if index >= self.slots.len() {
            return None;
        }

        let removed = self.slots.remove(index);
        let len = self.slots.len();

        self.cursor = match self.cursor {
            _ if len == 0 => None,
            Some(cursor) if index < cursor => Some(cursor - 1),
            Some(cursor) => Some(cursor.min(len - 1)),
            None => Some(0),
        };

        Some(removed.item)
    }

    /// Remove the draft with this identity, wherever it now sits.
    pub fn remove(&mut self, id: DraftId) -> Option<DraftItem> {
        let index = self.position(id)?;
        self.remove_at(index)
    }

    /// Move the cursor. Out-of-range indices are ignored.
    ///
    /// Returns whether the cursor moved.
    pub fn set_cursor(&mut self, index: usize) -> bool {
        if index >= self.slots.len() {
            return false;
        }
        let changed = self.cursor != Some(index);
        self.cursor = Some(index);
        changed
    }

    /// Select the following draft, if any.
    pub fn select_next(&mut self) -> bool {
        match self.cursor {
            Some(cursor) => self.set_cursor(cursor + 1),
            None => false,
        }
    }

    /// Select the preceding draft, if any.
    pub fn select_previous(&mut self) -> bool {
        match self.cursor {
            Some(cursor) if cursor > 0 => self.set_cursor(cursor - 1),
            _ => false,
        }
    }
}

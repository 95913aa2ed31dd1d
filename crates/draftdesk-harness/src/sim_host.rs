//! Recording notification host.

use draftdesk_core::{HostError, NotificationHost, Permission, PlatformNotification};

/// Notification host that answers from configuration and records what it
/// was asked to show.
#[derive(Debug, Clone)]
pub struct SimHost {
    supported: bool,
    answer: Result<Permission, HostError>,
    fail_show: bool,
    requests: usize,
    shown: Vec<PlatformNotification>,
}

impl Default for SimHost {
    fn default() -> Self {
        Self::granted()
    }
}

impl SimHost {
    /// Host that grants permission.
    pub fn granted() -> Self {
        Self::answering(Ok(Permission::Granted))
    }

    /// Host whose user blocks notifications.
    pub fn denied() -> Self {
        Self::answering(Ok(Permission::Denied))
    }

    /// Host whose permission request itself fails.
    pub fn broken() -> Self {
        Self::answering(Err(HostError::Platform("permission prompt crashed".into())))
    }

    /// Host without a notification facility.
    pub fn unsupported() -> Self {
        Self { supported: false, ..Self::answering(Err(HostError::Unsupported)) }
    }

    fn answering(answer: Result<Permission, HostError>) -> Self {
        Self { supported: true, answer, fail_show: false, requests: 0, shown: Vec::new() }
    }

    /// Make every `show` fail.
    #[must_use]
    pub fn failing_show(mut self) -> Self {
        self.fail_show = true;
        self
    }

    /// Notifications shown so far.
    pub fn shown(&self) -> &[PlatformNotification] {
        &self.shown
    }

    /// Number of permission requests received.
    pub fn requests(&self) -> usize {
        self.requests
    }
}

impl NotificationHost for SimHost {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn request_permission(&mut self) -> Result<Permission, HostError> {
        self.requests += 1;
        self.answer.clone()
    }

    fn show(&mut self, notification: &PlatformNotification) -> Result<(), HostError> {
        if self.fail_show {
            return Err(HostError::Platform("notification daemon unavailable".into()));
        }
        self.shown.push(notification.clone());
        Ok(())
    }
}

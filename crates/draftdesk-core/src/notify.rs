//! Notification gateway.
//!
//! Asks the host platform for permission and dispatches new-draft alerts.
//! When the platform cannot (or may not) show a notification, the alert
//! degrades to an in-app [`Notice`] carrying the same text. The gateway never
//! returns an error to its caller.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::notice::Notice;

/// Permission to show platform notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Permission {
    /// Not asked yet, or the platform has no notification facility
    #[default]
    Default,
    /// Notifications allowed
    Granted,
    /// Notifications blocked
    Denied,
}

/// Host platform failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The platform has no notification facility
    #[error("notifications are not supported on this platform")]
    Unsupported,
    /// The platform refused or failed to act
    #[error("notification platform error: {0}")]
    Platform(String),
}

/// A notification as handed to the host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformNotification {
    /// Title line
    pub title: String,
    /// Body text
    pub body: String,
    /// Category id. A notification with the same tag replaces an undismissed
    /// one instead of stacking.
    pub tag: String,
    /// Dismiss automatically after this long
    pub auto_dismiss: Duration,
    /// Keep on screen until the reviewer interacts (or it auto-dismisses)
    pub requires_interaction: bool,
    /// Bring the application to the foreground when clicked
    pub focus_on_click: bool,
}

/// Platform notification facility.
pub trait NotificationHost {
    /// Whether the platform can show notifications at all.
    fn is_supported(&self) -> bool;

    /// Ask the platform (and possibly the user) for permission.
    fn request_permission(&mut self) -> Result<Permission, HostError>;

    /// Show a notification.
    fn show(&mut self, notification: &PlatformNotification) -> Result<(), HostError>;
}

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    /// Category id shared by every draft alert
    pub tag: String,
    /// Auto-dismiss duration
    pub auto_dismiss: Duration,
    /// Title used for new-draft alerts
    pub title: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            tag: "draft-review".to_string(),
            auto_dismiss: Duration::from_secs(60 * 60),
            title: "New Draft Ready for Review".to_string(),
        }
    }
}

/// Where an alert ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Shown by the host platform
    Platform,
    /// Shown in-app instead
    Fallback(Notice),
}

/// Notification gateway over a host platform.
#[derive(Debug)]
pub struct NotificationGateway<H> {
    host: H,
    config: NotifyConfig,
    permission: Permission,
    warned_denied: bool,
}

impl<H: NotificationHost> NotificationGateway<H> {
    /// Create a gateway. Permission starts as `Default`.
    pub fn new(host: H, config: NotifyConfig) -> Self {
        Self { host, config, permission: Permission::Default, warned_denied: false }
    }

    /// Last known permission value.
    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Configuration.
    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// The host platform.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host platform.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Ask the host for permission and remember the answer.
    ///
    /// A failed request counts as `Denied`. The first denial produces a
    /// warning notice; later denials stay quiet.
    pub fn request_permission(&mut self) -> Option<Notice> {
        if !self.host.is_supported() {
            debug!("platform has no notification facility");
            return None;
        }

        self.permission = match self.host.request_permission() {
            Ok(permission) => permission,
            Err(e) => {
                warn!(error = %e, "permission request failed");
                Permission::Denied
            },
        };
        info!(permission = ?self.permission, "notification permission");

        if self.permission == Permission::Denied && !self.warned_denied {
            self.warned_denied = true;
            return Some(Notice::warning("Notifications blocked - you may miss draft alerts"));
        }
        None
    }

    /// Alert the reviewer.
    ///
    /// Uses the platform when permission is granted, otherwise (or if the
    /// platform fails) falls back to an in-app notice with the same text.
    pub fn notify(&mut self, title: &str, body: &str) -> Delivery {
        if self.permission == Permission::Granted {
            let notification = PlatformNotification {
                title: title.to_string(),
                body: body.to_string(),
                tag: self.config.tag.clone(),
                auto_dismiss: self.config.auto_dismiss,
                requires_interaction: true,
                focus_on_click: true,
            };

            match self.host.show(&notification) {
                Ok(()) => {
                    debug!(tag = %self.config.tag, "platform notification shown");
                    return Delivery::Platform;
                },
                Err(e) => warn!(error = %e, "platform notification failed, falling back"),
            }
        }

        Delivery::Fallback(Notice::info(format!("{title}\n{body}")))
    }
}

//! Desktop notifications through `notify-send`.
//!
//! Freedesktop notification daemons have no permission prompt, so
//! permission is granted whenever the tool is available. Notifications share
//! a synchronous hint keyed by tag so a newer alert replaces an older one.
//!
//! The tool is started and left to run; its exit status is collected on a
//! background task so a slow daemon never stalls the event loop.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use draftdesk_core::{HostError, NotificationHost, Permission, PlatformNotification};
use tokio::{process::Command, runtime::Handle};
use tracing::{debug, warn};

const PROGRAM: &str = "notify-send";

/// Notification host backed by the desktop notification daemon.
#[derive(Debug, Clone)]
pub struct DesktopHost {
    program: Option<PathBuf>,
}

impl DesktopHost {
    /// Look up `notify-send` on `PATH`.
    pub fn detect() -> Self {
        let program = std::env::var_os("PATH").and_then(|paths| {
            std::env::split_paths(&paths).map(|dir| dir.join(PROGRAM)).find(|p| p.is_file())
        });
        debug!(?program, "desktop notifier lookup");
        Self { program }
    }

    /// Host that never shows anything.
    pub fn disabled() -> Self {
        Self { program: None }
    }

    /// Host using a specific executable.
    pub fn with_program(program: impl AsRef<Path>) -> Self {
        Self { program: Some(program.as_ref().to_path_buf()) }
    }
}

/// `notify-send` arguments for a notification.
pub fn arguments(notification: &PlatformNotification) -> Vec<String> {
    let urgency = if notification.requires_interaction { "critical" } else { "normal" };
    vec![
        "--app-name=draftdesk".to_string(),
        format!("--urgency={urgency}"),
        format!("--expire-time={}", notification.auto_dismiss.as_millis()),
        format!("--hint=string:x-canonical-private-synchronous:{}", notification.tag),
        notification.title.clone(),
        notification.body.clone(),
    ]
}

impl NotificationHost for DesktopHost {
    fn is_supported(&self) -> bool {
        self.program.is_some()
    }

    fn request_permission(&mut self) -> Result<Permission, HostError> {
        if self.program.is_some() { Ok(Permission::Granted) } else { Err(HostError::Unsupported) }
    }

    fn show(&mut self, notification: &PlatformNotification) -> Result<(), HostError> {
        let program = self.program.as_ref().ok_or(HostError::Unsupported)?;
        let runtime = Handle::try_current()
            .map_err(|_| HostError::Platform("no async runtime to run the notifier on".into()))?;

        // Child spawning registers with the runtime's process driver.
        let _guard = runtime.enter();
        let mut child = Command::new(program)
            .args(arguments(notification))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| HostError::Platform(e.to_string()))?;

        runtime.spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {},
                Ok(status) => warn!(%status, "{PROGRAM} failed"),
                Err(e) => debug!(error = %e, "lost track of {PROGRAM}"),
            }
        });
        Ok(())
    }
}

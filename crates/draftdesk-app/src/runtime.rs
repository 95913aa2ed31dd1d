//! Generic runtime
//!
//! Owns a [`Driver`] and a [`Session`] and shuttles between them: events go
//! into the session, actions come out and are executed on the driver. The
//! loop is single-threaded; each event is handled to completion before the
//! next is polled.

use std::{collections::VecDeque, time::SystemTime};

use chrono::{DateTime, SecondsFormat, Utc};
use draftdesk_core::NotificationHost;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    action::SessionAction,
    driver::Driver,
    event::{Command, DriverEvent, TransportEvent},
    session::Session,
};

/// Runtime failures. Only the driver can fail the loop; session faults are
/// reported as notices instead.
#[derive(Debug, Error)]
pub enum RuntimeError<E: std::error::Error + 'static> {
    /// Polling for input failed
    #[error("failed to poll for events: {0}")]
    Poll(#[source] E),
    /// Rendering failed
    #[error("failed to render: {0}")]
    Render(#[source] E),
}

/// RFC 3339 timestamp with millisecond precision, as sent in probes.
pub fn probe_timestamp(at: SystemTime) -> String {
    DateTime::<Utc>::from(at).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Event loop over a driver and a session.
pub struct Runtime<D, H> {
    driver: D,
    session: Session<H>,
}

impl<D: Driver, H: NotificationHost> Runtime<D, H> {
    /// Create a runtime. Nothing happens until [`Runtime::start`] or
    /// [`Runtime::run`].
    pub fn new(driver: D, session: Session<H>) -> Self {
        Self { driver, session }
    }

    /// The session.
    pub fn session(&self) -> &Session<H> {
        &self.session
    }

    /// Mutable access to the session.
    pub fn session_mut(&mut self) -> &mut Session<H> {
        &mut self.session
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable access to the driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Ask for notification permission, then start connecting.
    pub fn start(&mut self) {
        self.session.request_notification_permission();
        let now = self.driver.now();
        let actions = self.session.connect(now);
        self.execute(actions);
    }

    /// Handle one event. Returns `false` on quit.
    pub fn step(&mut self, event: DriverEvent) -> bool {
        let now = self.driver.now();
        let actions = match event {
            DriverEvent::Transport(event) => self.session.handle_transport(event, now),
            DriverEvent::Command(command) => self.handle_command(command),
            DriverEvent::Tick => self.session.tick(now),
            DriverEvent::Quit => return false,
        };
        self.execute(actions);
        true
    }

    /// Run until the driver reports quit, then shut the session down.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to poll or render. The session is
    /// shut down before the error is returned.
    pub async fn run(&mut self) -> Result<(), RuntimeError<D::Error>> {
        self.start();
        let result = self.event_loop().await;
        self.shutdown();
        result
    }

    /// Stop the session and close the transport.
    pub fn shutdown(&mut self) {
        let now = self.driver.now();
        let actions = self.session.shutdown(now);
        self.execute(actions);
    }

    async fn event_loop(&mut self) -> Result<(), RuntimeError<D::Error>> {
        self.render()?;
        loop {
            let deadline = self.session.next_deadline();
            let event = self.driver.poll_event(deadline).await.map_err(RuntimeError::Poll)?;
            if !self.step(event) {
                info!("quit requested");
                return Ok(());
            }
            self.render()?;
        }
    }

    fn render(&mut self) -> Result<(), RuntimeError<D::Error>> {
        let notices = self.session.drain_notices();
        let view = self.session.view();
        self.driver.render(&view, &notices).map_err(RuntimeError::Render)
    }

    fn handle_command(&mut self, command: Command) -> Vec<SessionAction> {
        debug!(?command, "command");
        match command {
            Command::Submit(decision) => self.session.submit(&decision).unwrap_or_default(),
            Command::AcceptCandidate { index } => {
                self.session.submit_candidate(index).unwrap_or_default()
            },
            Command::Skip => self.session.skip().unwrap_or_default(),
            Command::SetCursor { index } => {
                self.session.set_cursor(index);
                vec![]
            },
            Command::Next => {
                self.session.select_next();
                vec![]
            },
            Command::Previous => {
                self.session.select_previous();
                vec![]
            },
            Command::Reconnect => {
                let now = self.driver.now();
                self.session.manual_reconnect(now)
            },
            Command::Probe => {
                let timestamp = probe_timestamp(self.driver.wall_clock());
                self.session.send_diagnostic_probe(timestamp)
            },
            Command::RequestPermission => {
                self.session.request_notification_permission();
                vec![]
            },
        }
    }

    fn execute(&mut self, actions: Vec<SessionAction>) {
        let mut pending: VecDeque<SessionAction> = actions.into();

        while let Some(action) = pending.pop_front() {
            match action {
                SessionAction::Connect { url } => {
                    if let Err(e) = self.driver.connect(&url) {
                        warn!(error = %e, %url, "could not start connection attempt");
                        let now = self.driver.now();
                        let event = TransportEvent::Error { reason: e.to_string() };
                        pending.extend(self.session.handle_transport(event, now));
                    }
                },
                SessionAction::Disconnect { code, reason } => {
                    self.driver.disconnect(code, &reason);
                },
                SessionAction::Send { frame, purpose } => {
                    let result = match frame.encode() {
                        Ok(text) => self.driver.send_text(text).map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    if let Err(reason) = &result {
                        warn!(kind = frame.kind(), %reason, "send failed");
                    }
                    self.session.send_completed(purpose, result);
                },
            }
        }
    }
}

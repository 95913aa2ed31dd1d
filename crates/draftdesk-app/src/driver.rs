//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the runtime from specific I/O. The terminal
//! front end implements it over a real WebSocket; the simulation harness
//! implements it over a scripted event list and a virtual clock. The generic
//! [`crate::Runtime`] handles all orchestration.

use std::{
    future::Future,
    time::{Instant, SystemTime},
};

use draftdesk_core::Notice;
use draftdesk_proto::CloseCode;
use url::Url;

use crate::{event::DriverEvent, view::SessionView};

/// Abstracts I/O operations for the runtime.
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next event.
    ///
    /// Returns [`DriverEvent::Tick`] once `deadline` passes without any other
    /// input. `None` means no timer is armed.
    fn poll_event(
        &mut self,
        deadline: Option<Instant>,
    ) -> impl Future<Output = Result<DriverEvent, Self::Error>> + Send;

    /// Begin opening a transport to `url`.
    ///
    /// Completion is reported later as a transport event. Any previous
    /// transport must already be gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt cannot even be started.
    fn connect(&mut self, url: &Url) -> Result<(), Self::Error>;

    /// Enqueue a text frame on the open transport.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no open transport or it refused the frame.
    fn send_text(&mut self, text: String) -> Result<(), Self::Error>;

    /// Close the current transport and drop its listeners. No further
    /// transport events may be reported for it.
    fn disconnect(&mut self, code: CloseCode, reason: &str);

    /// Check if a transport is open.
    fn is_connected(&self) -> bool;

    /// Current monotonic time.
    fn now(&self) -> Instant;

    /// Current wall-clock time.
    fn wall_clock(&self) -> SystemTime;

    /// Render the session state and any new notices.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, view: &SessionView<'_>, notices: &[Notice]) -> Result<(), Self::Error>;
}

//! Scripted driver over a virtual clock.
//!
//! Tests queue [`Step`]s: events to deliver and waits to sit through. While
//! waiting, armed deadlines fire as [`DriverEvent::Tick`] at their exact
//! virtual instant. Everything the runtime asks the driver to do is recorded
//! for assertions.

use std::{
    collections::VecDeque,
    future::{Future, ready},
    time::{Duration, Instant, SystemTime},
};

use draftdesk_app::{Driver, DriverEvent, SessionView, TransportEvent};
use draftdesk_core::{ConnectionState, Environment, Notice};
use draftdesk_proto::CloseCode;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::sim_env::SimEnv;

/// Simulated driver failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// No transport to send on
    #[error("not connected")]
    NotConnected,
    /// Sends are configured to fail
    #[error("send refused")]
    SendRefused,
    /// The link dropped while sending
    #[error("link dropped")]
    LinkDropped,
    /// Connection attempts are configured to fail
    #[error("connection refused")]
    ConnectRefused,
}

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Deliver this event
    Event(DriverEvent),
    /// Let virtual time pass, firing any deadlines on the way
    Wait(Duration),
}

/// Scripted, recording driver.
pub struct SimDriver {
    env: SimEnv,
    script: VecDeque<Step>,
    until: Option<Instant>,
    transport: bool,
    auto_open: bool,
    fail_sends: bool,
    fail_connects: bool,
    drop_rate: f64,
    connects: Vec<Url>,
    sent: Vec<String>,
    disconnects: Vec<(CloseCode, String)>,
    notices: Vec<Notice>,
    renders: usize,
    last_state: Option<ConnectionState>,
}

impl SimDriver {
    /// Driver over `env` with an empty script.
    pub fn new(env: SimEnv) -> Self {
        Self {
            env,
            script: VecDeque::new(),
            until: None,
            transport: false,
            auto_open: false,
            fail_sends: false,
            fail_connects: false,
            drop_rate: 0.0,
            connects: Vec::new(),
            sent: Vec::new(),
            disconnects: Vec::new(),
            notices: Vec::new(),
            renders: 0,
            last_state: None,
        }
    }

    /// Report every connection attempt as opened straight away.
    #[must_use]
    pub fn auto_open(mut self) -> Self {
        self.auto_open = true;
        self
    }

    /// Once the script is exhausted keep firing deadlines for `duration` of
    /// virtual time before quitting.
    pub fn run_for(&mut self, duration: Duration) {
        self.until = Some(self.env.now() + duration);
    }

    /// Drop the link on a send with probability `rate`, using the
    /// environment's seeded randomness.
    pub fn set_drop_rate(&mut self, rate: f64) {
        self.drop_rate = rate;
    }

    /// Make sends fail.
    pub fn set_fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }

    /// Make connection attempts fail to start.
    pub fn set_fail_connects(&mut self, fail: bool) {
        self.fail_connects = fail;
    }

    /// Queue an event.
    pub fn push_event(&mut self, event: DriverEvent) {
        self.script.push_back(Step::Event(event));
    }

    /// Queue a transport event.
    pub fn push_transport(&mut self, event: TransportEvent) {
        self.push_event(DriverEvent::Transport(event));
    }

    /// Queue a text frame from the server.
    pub fn push_message(&mut self, text: impl Into<String>) {
        self.push_transport(TransportEvent::Message(text.into()));
    }

    /// Queue a wait.
    pub fn push_wait(&mut self, duration: Duration) {
        self.script.push_back(Step::Wait(duration));
    }

    /// Whether scripted steps remain.
    pub fn has_script(&self) -> bool {
        !self.script.is_empty()
    }

    /// The environment.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// URLs passed to `connect`.
    pub fn connects(&self) -> &[Url] {
        &self.connects
    }

    /// Text frames sent.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Wire tags of the frames sent, in order.
    pub fn sent_kinds(&self) -> Vec<String> {
        self.sent
            .iter()
            .filter_map(|text| serde_json::from_str::<serde_json::Value>(text).ok())
            .filter_map(|value| value.get("type").and_then(|t| t.as_str()).map(str::to_string))
            .collect()
    }

    /// Close codes and reasons passed to `disconnect`.
    pub fn disconnects(&self) -> &[(CloseCode, String)] {
        &self.disconnects
    }

    /// Every notice handed to `render`.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Number of renders.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Connection state at the last render.
    pub fn last_state(&self) -> Option<ConnectionState> {
        self.last_state
    }

    /// Next event, advancing virtual time as needed.
    ///
    /// Returns `Quit` once the script is exhausted and no deadline falls
    /// within the [`SimDriver::run_for`] window.
    pub fn next_event(&mut self, deadline: Option<Instant>) -> DriverEvent {
        while let Some(step) = self.script.front_mut() {
            match step {
                Step::Event(_) => {
                    if let Some(Step::Event(event)) = self.script.pop_front() {
                        self.observe(&event);
                        return event;
                    }
                },
                Step::Wait(remaining) => {
                    let now = self.env.now();
                    let wake = now + *remaining;
                    if let Some(at) = deadline.filter(|at| *at <= wake) {
                        let at = at.max(now);
                        *remaining = wake - at;
                        self.env.advance_to(at);
                        return DriverEvent::Tick;
                    }
                    self.env.advance_to(wake);
                    self.script.pop_front();
                },
            }
        }

        match (deadline, self.until) {
            (Some(at), Some(until)) if at <= until => {
                self.env.advance_to(at);
                DriverEvent::Tick
            },
            (_, Some(until)) => {
                self.env.advance_to(until);
                DriverEvent::Quit
            },
            _ => DriverEvent::Quit,
        }
    }

    fn observe(&mut self, event: &DriverEvent) {
        if let DriverEvent::Transport(TransportEvent::Closed { .. } | TransportEvent::Error { .. }) =
            event
        {
            self.transport = false;
        }
    }
}

impl Driver for SimDriver {
    type Error = SimError;

    fn poll_event(
        &mut self,
        deadline: Option<Instant>,
    ) -> impl Future<Output = Result<DriverEvent, Self::Error>> + Send {
        ready(Ok(self.next_event(deadline)))
    }

    fn connect(&mut self, url: &Url) -> Result<(), Self::Error> {
        if self.fail_connects {
            return Err(SimError::ConnectRefused);
        }
        debug!(%url, "sim connect");
        self.connects.push(url.clone());
        self.transport = true;
        if self.auto_open {
            self.script.push_front(Step::Event(DriverEvent::Transport(TransportEvent::Opened)));
        }
        Ok(())
    }

    fn send_text(&mut self, text: String) -> Result<(), Self::Error> {
        if !self.transport {
            return Err(SimError::NotConnected);
        }
        if self.fail_sends {
            return Err(SimError::SendRefused);
        }
        if self.drop_rate > 0.0 && self.env.chance(self.drop_rate) {
            self.transport = false;
            let closed = TransportEvent::Closed { code: CloseCode::ABNORMAL };
            self.script.push_front(Step::Event(DriverEvent::Transport(closed)));
            return Err(SimError::LinkDropped);
        }
        self.sent.push(text);
        Ok(())
    }

    fn disconnect(&mut self, code: CloseCode, reason: &str) {
        self.transport = false;
        self.disconnects.push((code, reason.to_string()));
    }

    fn is_connected(&self) -> bool {
        self.transport
    }

    fn now(&self) -> Instant {
        self.env.now()
    }

    fn wall_clock(&self) -> SystemTime {
        self.env.wall_clock()
    }

    fn render(&mut self, view: &SessionView<'_>, notices: &[Notice]) -> Result<(), Self::Error> {
        self.renders += 1;
        self.last_state = Some(view.connection);
        self.notices.extend_from_slice(notices);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_fires_deadlines_on_the_way() {
        let env = SimEnv::new();
        let t0 = env.now();
        let mut driver = SimDriver::new(env.clone());
        driver.push_wait(Duration::from_secs(10));

        let deadline = t0 + Duration::from_secs(3);
        assert_eq!(driver.next_event(Some(deadline)), DriverEvent::Tick);
        assert_eq!(env.now(), deadline);

        assert_eq!(driver.next_event(None), DriverEvent::Quit);
        assert_eq!(env.now(), t0 + Duration::from_secs(10));
    }

    #[test]
    fn run_for_bounds_ticks() {
        let env = SimEnv::new();
        let t0 = env.now();
        let mut driver = SimDriver::new(env.clone());
        driver.run_for(Duration::from_secs(5));

        assert_eq!(driver.next_event(Some(t0 + Duration::from_secs(4))), DriverEvent::Tick);
        assert_eq!(driver.next_event(Some(t0 + Duration::from_secs(6))), DriverEvent::Quit);
    }

    #[test]
    fn sends_need_a_transport() {
        let mut driver = SimDriver::new(SimEnv::new());
        assert_eq!(driver.send_text("x".into()), Err(SimError::NotConnected));

        let url = Url::parse("ws://localhost:8000/").unwrap();
        driver.connect(&url).unwrap();
        assert!(driver.send_text("x".into()).is_ok());

        driver.disconnect(CloseCode::NORMAL, "bye");
        assert!(!driver.is_connected());
    }
}

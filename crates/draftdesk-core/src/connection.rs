//! Connection manager state machine.
//!
//! Owns the lifecycle of the single logical connection to the review
//! backend: opening, heartbeats, abnormal-close detection and exponential
//! backoff reconnection.
//!
//! # Architecture: Action-Based State Machine
//!
//! - Methods accept time as parameter (no stored clock)
//! - Methods return `Vec<ConnectionAction>` for the driver to execute
//! - Timers are [`Timer`] handles stored alongside the state, so every
//!   cleanup path cancels them synchronously
//!
//! # State Machine
//!
//! ```text
//!            connect / manual          open
//! ┌──────┐ ───────────────> ┌────────────┐ ───────> ┌──────┐
//! │ Idle │                  │ Connecting │          │ Open │
//! └──────┘ <─┐              └────────────┘          └──────┘
//!    ^       │ close(1000)     │  ^  abnormal close,   │  │
//!    │       └─────────────────┼──┼── error, timeout ──┘  │ close()
//!    │                         v  │ delay elapsed         v
//!    │               ┌──────────────────┐           ┌─────────┐
//!    │               │ Reconnecting(n)  │           │ Closing │
//!    │               └──────────────────┘           └─────────┘
//!    │                         │ n >= max                │
//!    │                         v                         │
//!    │                    ┌────────┐                     │
//!    │                    │ Failed │                     │
//!    │                    └────────┘                     │
//!    └───────────────────────────────────────────────────┘
//! ```
//!
//! # Timers
//!
//! - **Connect timeout**: 30 seconds to reach `Open`, then force-closed
//! - **Heartbeat interval**: 30 seconds between keep-alive frames while `Open`
//! - **Reconnect delay**: `ReconnectPolicy::delay(n)` while `Reconnecting(n)`
//!
//! Heartbeat acknowledgments are informational only. Staleness is detected
//! by the transport's own close and error signals.

use std::time::{Duration, Instant};

use draftdesk_proto::{CloseCode, OutboundFrame};
use tracing::{debug, error, info, warn};

use crate::{
    backoff::ReconnectPolicy,
    error::ConnectionError,
    timer::{self, Timer},
};

/// Actions returned by the connection state machine.
///
/// The driver executes these:
/// - `Connect`: start opening a new transport
/// - `Disconnect`: tear down the current transport and drop its listeners
/// - `SendFrame`: serialize and send over the open transport
///
/// The remaining variants are signals for presentation feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a new transport to the configured endpoint
    Connect,

    /// Close the current transport. No further events from it are expected.
    Disconnect {
        /// Close code to send, if the code is sendable
        code: CloseCode,
        /// Human readable reason
        reason: String,
    },

    /// Send this frame to the server
    SendFrame(OutboundFrame),

    /// Connection opened after at least one failed attempt
    Reconnected,

    /// A retry was scheduled
    ReconnectScheduled {
        /// Zero-based retry number
        attempt: u32,
        /// Delay before the retry starts
        delay: Duration,
    },

    /// Retries are exhausted; no further automatic attempts
    Exhausted {
        /// Number of retries that were made
        attempts: u32,
    },
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport and nothing scheduled
    Idle,
    /// Transport is opening
    Connecting,
    /// Transport is open; heartbeats running
    Open,
    /// Deliberate close in progress
    Closing,
    /// Waiting for the backoff delay before retry number `attempt`
    Reconnecting {
        /// Zero-based retry number
        attempt: u32,
    },
    /// Retries exhausted; only a manual reconnect leaves this state
    Failed {
        /// Number of retries that were made
        attempts: u32,
    },
}

/// Connection configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Interval between keep-alive frames while open
    pub heartbeat_interval: Duration,
    /// Time allowed for an attempt to reach `Open`
    pub connect_timeout: Duration,
    /// Backoff policy for automatic retries
    pub policy: ReconnectPolicy,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
            policy: ReconnectPolicy::default(),
        }
    }
}

/// Connection manager
///
/// Maintains at most one live transport, with automatic recovery.
///
/// This is a pure state machine - no I/O, no clock. Time is passed to the
/// methods that need it.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Current state
    state: ConnectionState,
    /// Configuration
    config: ConnectionConfig,
    /// Retries scheduled since the last successful open
    attempts: u32,
    /// Keep-alive interval
    heartbeat: Timer,
    /// Pending retry
    reconnect: Timer,
    /// Deadline for the current attempt to open
    connect_timeout: Timer,
    /// Last heartbeat acknowledgment from the server
    last_heartbeat_ack: Option<Instant>,
}

impl Connection {
    /// Create a new connection manager in `Idle` state
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            state: ConnectionState::Idle,
            config,
            attempts: 0,
            heartbeat: Timer::new(),
            reconnect: Timer::new(),
            connect_timeout: Timer::new(),
            last_heartbeat_ack: None,
        }
    }

    /// Get current state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the transport is open
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Retries scheduled since the last successful open
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Whether a retry is scheduled
    #[must_use]
    pub fn has_pending_reconnect(&self) -> bool {
        self.reconnect.is_armed()
    }

    /// Whether the heartbeat is running
    #[must_use]
    pub fn heartbeat_running(&self) -> bool {
        self.heartbeat.is_armed()
    }

    /// Last heartbeat acknowledgment received
    #[must_use]
    pub fn last_heartbeat_ack(&self) -> Option<Instant> {
        self.last_heartbeat_ack
    }

    /// Earliest armed timer deadline, so the driver knows when to tick next
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        timer::earliest([&self.heartbeat, &self.reconnect, &self.connect_timeout])
    }

    /// Start a connection attempt.
    ///
    /// Idempotent: while `Connecting` or `Open` this returns no actions, so a
    /// second transport is never created. From `Reconnecting` the pending
    /// retry is brought forward.
    ///
    /// # Errors
    /// Returns `InvalidState` from `Closing` and `Failed`; the latter needs
    /// [`Connection::manual_reconnect`].
    pub fn connect(&mut self, now: Instant) -> Result<Vec<ConnectionAction>, ConnectionError> {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => {
                debug!(state = ?self.state, "connect ignored, attempt already in progress");
                Ok(vec![])
            },
            ConnectionState::Idle | ConnectionState::Reconnecting { .. } => {
                Ok(self.begin_attempt(now))
            },
            ConnectionState::Closing | ConnectionState::Failed { .. } => {
                Err(ConnectionError::InvalidState {
                    state: self.state,
                    operation: "connect".to_string(),
                })
            },
        }
    }

    /// Transition to `Open` (handshake completed)
    ///
    /// Resets the retry counter and starts the heartbeat. Emits
    /// [`ConnectionAction::Reconnected`] if this open followed a failure.
    ///
    /// # Errors
    /// Returns `InvalidState` if not `Connecting`
    pub fn handle_open(&mut self, now: Instant) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state != ConnectionState::Connecting {
            return Err(ConnectionError::InvalidState {
                state: self.state,
                operation: "handle_open".to_string(),
            });
        }

        let was_reconnecting = self.attempts > 0;

        self.state = ConnectionState::Open;
        self.attempts = 0;
        self.connect_timeout.cancel();
        self.heartbeat.arm_after(now, self.config.heartbeat_interval);
        info!("connection open");

        if was_reconnecting { Ok(vec![ConnectionAction::Reconnected]) } else { Ok(vec![]) }
    }

    /// Handle the transport closing.
    ///
    /// The normal-closure code (or any close while `Closing`) settles in
    /// `Idle`. Any other code while `Connecting` or `Open` schedules a retry.
    /// Closes arriving in other states are stale and ignored.
    pub fn handle_close(&mut self, code: CloseCode, now: Instant) -> Vec<ConnectionAction> {
        match self.state {
            ConnectionState::Closing => {
                self.settle_idle();
                vec![]
            },
            ConnectionState::Connecting | ConnectionState::Open if code.is_normal() => {
                info!(%code, "connection closed normally");
                self.settle_idle();
                vec![]
            },
            ConnectionState::Connecting | ConnectionState::Open => {
                warn!(%code, state = ?self.state, "connection closed abnormally");
                self.schedule_reconnect(now)
            },
            ConnectionState::Idle
            | ConnectionState::Reconnecting { .. }
            | ConnectionState::Failed { .. } => {
                debug!(%code, state = ?self.state, "ignoring stale close");
                vec![]
            },
        }
    }

    /// Handle a transport error.
    ///
    /// Treated like an abnormal close: the transport is torn down and a retry
    /// is scheduled. Errors in other states are stale and ignored.
    pub fn handle_error(&mut self, reason: &str, now: Instant) -> Vec<ConnectionAction> {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => {
                warn!(reason, state = ?self.state, "transport error");
                let mut actions = vec![ConnectionAction::Disconnect {
                    code: CloseCode::ABNORMAL,
                    reason: reason.to_string(),
                }];
                actions.extend(self.schedule_reconnect(now));
                actions
            },
            _ => {
                debug!(reason, state = ?self.state, "ignoring stale transport error");
                vec![]
            },
        }
    }

    /// Record a heartbeat acknowledgment. Informational only.
    pub fn record_heartbeat_ack(&mut self, now: Instant) {
        self.last_heartbeat_ack = Some(now);
    }

    /// Tick the state machine - fire due timers
    ///
    /// Call this whenever the deadline from [`Connection::next_deadline`]
    /// passes. Handles:
    /// - Connect timeout (force-close, then abnormal-close path)
    /// - Retry start
    /// - Heartbeat sending
    pub fn tick(&mut self, now: Instant) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();

        if self.connect_timeout.fire(now) && self.state == ConnectionState::Connecting {
            let reason = format!("connect timeout after {:?}", self.config.connect_timeout);
            warn!(%reason, "connection attempt timed out");
            actions.push(ConnectionAction::Disconnect { code: CloseCode::ABNORMAL, reason });
            actions.extend(self.schedule_reconnect(now));
            return actions;
        }

        if self.reconnect.fire(now) {
            if let ConnectionState::Reconnecting { attempt } = self.state {
                debug!(attempt, "retry delay elapsed");
                actions.extend(self.begin_attempt(now));
            }
            return actions;
        }

        if self.heartbeat.fire(now) && self.state == ConnectionState::Open {
            actions.push(ConnectionAction::SendFrame(OutboundFrame::Heartbeat));
            self.heartbeat.arm_after(now, self.config.heartbeat_interval);
        }

        actions
    }

    /// Manual reconnect.
    ///
    /// Cancels any pending retry, resets the retry counter, tears down the
    /// current transport and immediately starts a new attempt. Valid from
    /// every state, including `Failed`.
    pub fn manual_reconnect(&mut self, now: Instant) -> Vec<ConnectionAction> {
        info!(state = ?self.state, "manual reconnect");

        let mut actions = Vec::new();
        if matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Open | ConnectionState::Closing
        ) {
            actions.push(ConnectionAction::Disconnect {
                code: CloseCode::NORMAL,
                reason: "manual reconnect".to_string(),
            });
        }

        self.cancel_timers();
        self.attempts = 0;
        self.state = ConnectionState::Idle;
        actions.extend(self.begin_attempt(now));
        actions
    }

    /// Deliberate close.
    ///
    /// Cancels every timer. An existing transport moves to `Closing` and is
    /// closed with the normal-closure code; no retry is ever scheduled from
    /// here.
    pub fn close(&mut self) -> Vec<ConnectionAction> {
        self.cancel_timers();

        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => {
                self.state = ConnectionState::Closing;
                vec![ConnectionAction::Disconnect {
                    code: CloseCode::NORMAL,
                    reason: "client shutdown".to_string(),
                }]
            },
            ConnectionState::Reconnecting { .. } | ConnectionState::Failed { .. } => {
                self.state = ConnectionState::Idle;
                vec![]
            },
            ConnectionState::Idle | ConnectionState::Closing => vec![],
        }
    }

    fn begin_attempt(&mut self, now: Instant) -> Vec<ConnectionAction> {
        self.reconnect.cancel();
        self.state = ConnectionState::Connecting;
        self.connect_timeout.arm_after(now, self.config.connect_timeout);
        debug!(attempts = self.attempts, "connecting");
        vec![ConnectionAction::Connect]
    }

    fn schedule_reconnect(&mut self, now: Instant) -> Vec<ConnectionAction> {
        self.heartbeat.cancel();
        self.connect_timeout.cancel();

        let attempt = self.attempts;
        if !self.config.policy.allows(attempt) {
            error!(attempts = attempt, "reconnect attempts exhausted");
            self.state = ConnectionState::Failed { attempts: attempt };
            return vec![ConnectionAction::Exhausted { attempts: attempt }];
        }

        let delay = self.config.policy.delay(attempt);
        self.reconnect.arm_after(now, delay);
        self.attempts += 1;
        self.state = ConnectionState::Reconnecting { attempt };
        info!(attempt, delay_ms = delay.as_millis() as u64, "reconnect scheduled");

        vec![ConnectionAction::ReconnectScheduled { attempt, delay }]
    }

    fn settle_idle(&mut self) {
        self.cancel_timers();
        self.state = ConnectionState::Idle;
    }

    fn cancel_timers(&mut self) {
        self.heartbeat.cancel();
        self.reconnect.cancel();
        self.connect_timeout.cancel();
    }
}

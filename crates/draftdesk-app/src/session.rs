//! Session context
//!
//! One explicitly constructed object owning the connection manager, the
//! router, the draft queue and the notification gateway. Presentation code
//! holds a reference to it; nothing here is global.
//!
//! Every handler runs to completion and turns failures into a [`Fault`]
//! that becomes a notice or the fatal banner. No handler returns a fault to
//! the event loop except [`Session::submit`], which also reports it.

use std::{collections::VecDeque, time::Instant};

use draftdesk_core::{
    Connection, ConnectionAction, ConnectionConfig, ConnectionState, Decision, Delivery,
    DraftQueue, Endpoint, EndpointError, Fault, NotificationGateway, NotificationHost,
    NotifyConfig, Notice, Permission, RouteAction, Router, Severity, SubmitError, submit,
};
use draftdesk_proto::{CloseCode, OutboundFrame, ProbeData};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    action::{SendPurpose, SessionAction},
    event::TransportEvent,
    view::SessionView,
};

/// Notices kept while nobody drains them.
const MAX_PENDING_NOTICES: usize = 64;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Where the draft service lives
    pub endpoint: Endpoint,
    /// Heartbeat, timeout and retry settings
    pub connection: ConnectionConfig,
    /// Notification settings
    pub notify: NotifyConfig,
}

impl SessionConfig {
    /// Default settings for `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint, connection: ConnectionConfig::default(), notify: NotifyConfig::default() }
    }
}

/// Draft review session.
pub struct Session<H> {
    url: Url,
    user_id: String,
    connection: Connection,
    router: Router,
    queue: DraftQueue,
    notifier: NotificationGateway<H>,
    notices: VecDeque<Notice>,
    fatal: Option<Fault>,
    transport_fault: Option<Fault>,
}

impl<H: NotificationHost> Session<H> {
    /// Create a session. Nothing is opened until [`Session::connect`].
    ///
    /// # Errors
    /// Returns an `EndpointError` if no socket URL can be derived.
    pub fn new(config: SessionConfig, host: H) -> Result<Self, EndpointError> {
        let url = config.endpoint.url()?;
        info!(%url, "session created");

        Ok(Self {
            url,
            user_id: config.endpoint.user_id().to_string(),
            connection: Connection::new(config.connection),
            router: Router::new(config.notify.title.clone()),
            queue: DraftQueue::new(),
            notifier: NotificationGateway::new(host, config.notify),
            notices: VecDeque::new(),
            fatal: None,
            transport_fault: None,
        })
    }

    /// Start connecting. A no-op while connecting or open.
    pub fn connect(&mut self, now: Instant) -> Vec<SessionAction> {
        match self.connection.connect(now) {
            Ok(actions) => self.apply_connection(actions),
            Err(e) => {
                debug!(error = %e, "connect refused");
                vec![]
            },
        }
    }

    /// Tear down whatever exists and connect again with a fresh retry budget.
    pub fn manual_reconnect(&mut self, now: Instant) -> Vec<SessionAction> {
        let actions = self.connection.manual_reconnect(now);
        self.apply_connection(actions)
    }

    /// Stop the session.
    ///
    /// Cancels every timer and closes the transport with the normal-closure
    /// code. The transport's listeners are dropped with it, so the connection
    /// is settled in `Idle` here instead of waiting for a close event.
    pub fn shutdown(&mut self, now: Instant) -> Vec<SessionAction> {
        let actions = self.connection.close();
        if self.connection.state() == ConnectionState::Closing {
            self.connection.handle_close(CloseCode::NORMAL, now);
        }
        info!("session shut down");
        self.apply_connection(actions)
    }

    /// Process a signal from the transport.
    pub fn handle_transport(&mut self, event: TransportEvent, now: Instant) -> Vec<SessionAction> {
        match event {
            TransportEvent::Opened => match self.connection.handle_open(now) {
                Ok(actions) => {
                    self.transport_fault = None;
                    if self.fatal.take().is_some() {
                        info!("connection restored, clearing fatal fault");
                    }
                    self.apply_connection(actions)
                },
                Err(e) => {
                    debug!(error = %e, "ignoring stale open");
                    vec![]
                },
            },
            TransportEvent::Message(text) => self.handle_message(&text, now),
            TransportEvent::Closed { code } => {
                let actions = self.connection.handle_close(code, now);
                self.report_transport(&actions, || format!("closed with code {code}"));
                self.apply_connection(actions)
            },
            TransportEvent::Error { reason } => {
                let actions = self.connection.handle_error(&reason, now);
                self.report_transport(&actions, || reason);
                self.apply_connection(actions)
            },
        }
    }

    /// Fire due timers.
    pub fn tick(&mut self, now: Instant) -> Vec<SessionAction> {
        let actions = self.connection.tick(now);
        let timed_out = actions.iter().find_map(|action| match action {
            ConnectionAction::Disconnect { reason, .. } => Some(reason.clone()),
            _ => None,
        });
        if let Some(reason) = timed_out {
            self.report_transport(&actions, || reason);
        }
        self.apply_connection(actions)
    }

    /// Earliest timer deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.connection.next_deadline()
    }

    /// Submit a decision about the selected draft.
    ///
    /// On success the returned send must be executed and its result handed to
    /// [`Session::send_completed`]; the draft is dequeued there.
    ///
    /// # Errors
    /// `NotConnected`, `QueueEmpty` or `EmptyBody`. The fault is also
    /// reported as a notice and nothing is mutated.
    pub fn submit(&mut self, decision: &Decision) -> Result<Vec<SessionAction>, SubmitError> {
        match submit::prepare(decision, self.connection.state(), &self.queue) {
            Ok(pending) => {
                debug!(draft = %pending.draft, is_skip = pending.is_skip, "submitting decision");
                Ok(vec![SessionAction::Send {
                    frame: pending.frame,
                    purpose: SendPurpose::Decision { draft: pending.draft, is_skip: pending.is_skip },
                }])
            },
            Err(e) => {
                self.report(Fault::Submission(e.clone()));
                Err(e)
            },
        }
    }

    /// Accept candidate `index` of the selected draft unedited.
    ///
    /// An index past the candidate list carries no reply text and is
    /// rejected like a blank accept.
    ///
    /// # Errors
    /// See [`Session::submit`].
    pub fn submit_candidate(&mut self, index: usize) -> Result<Vec<SessionAction>, SubmitError> {
        let body = self
            .queue
            .current()
            .and_then(|(_, item)| item.candidate(index))
            .unwrap_or_default()
            .to_string();
        self.submit(&Decision::accept(body))
    }

    /// Skip the selected draft.
    ///
    /// # Errors
    /// See [`Session::submit`].
    pub fn skip(&mut self) -> Result<Vec<SessionAction>, SubmitError> {
        self.submit(&Decision::skip())
    }

    /// Result of executing a [`SessionAction::Send`].
    ///
    /// A decision is dequeued only once its frame reached the transport. A
    /// failed decision send leaves the queue untouched so the reviewer can
    /// retry.
    pub fn send_completed(&mut self, purpose: SendPurpose, result: Result<(), String>) {
        match (purpose, result) {
            (SendPurpose::Decision { draft, is_skip }, Ok(())) => {
                if self.queue.remove(draft).is_none() {
                    warn!(%draft, "decided draft already gone");
                }
                info!(%draft, is_skip, remaining = self.queue.len(), "decision sent");
                let message = if is_skip { "Draft cancelled" } else { "Draft response sent" };
                self.push_notice(Notice::success(message));
            },
            (SendPurpose::Decision { .. }, Err(reason)) => {
                self.report(Fault::Submission(SubmitError::SendFailed(reason)));
            },
            (SendPurpose::Probe, Err(reason)) => {
                warn!(%reason, "probe send failed");
                self.push_notice(Notice::error("Connection test failed"));
            },
            (purpose, Err(reason)) => {
                // The transport reports its own error; nothing queued was lost.
                debug!(?purpose, %reason, "send failed");
            },
            (_, Ok(())) => {},
        }
    }

    /// Send a diagnostic probe stamped with `timestamp`.
    pub fn send_diagnostic_probe(&mut self, timestamp: String) -> Vec<SessionAction> {
        if !self.connection.is_open() {
            self.report(Fault::Submission(SubmitError::NotConnected));
            return vec![];
        }

        debug!(%timestamp, "sending diagnostic probe");
        vec![SessionAction::Send {
            frame: OutboundFrame::ConnectionProbe(ProbeData {
                timestamp,
                user_id: self.user_id.clone(),
            }),
            purpose: SendPurpose::Probe,
        }]
    }

    /// Move the cursor. Out-of-range indices are ignored.
    pub fn set_cursor(&mut self, index: usize) -> bool {
        self.queue.set_cursor(index)
    }

    /// Select the following draft.
    pub fn select_next(&mut self) -> bool {
        self.queue.select_next()
    }

    /// Select the preceding draft.
    pub fn select_previous(&mut self) -> bool {
        self.queue.select_previous()
    }

    /// Ask the host for notification permission.
    pub fn request_notification_permission(&mut self) {
        if let Some(notice) = self.notifier.request_permission() {
            self.push_notice(notice);
        }
    }

    /// Connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Whether the connection is open.
    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    /// Pending drafts.
    pub fn queue(&self) -> &DraftQueue {
        &self.queue
    }

    /// Notification permission.
    pub fn notification_permission(&self) -> Permission {
        self.notifier.permission()
    }

    /// Blocking fault, if one is active.
    pub fn fatal(&self) -> Option<&Fault> {
        self.fatal.as_ref()
    }

    /// Most recent unexpected transport loss. Cleared once the socket opens.
    pub fn transport_fault(&self) -> Option<&Fault> {
        self.transport_fault.as_ref()
    }

    /// Socket URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Notification gateway.
    pub fn notifier(&self) -> &NotificationGateway<H> {
        &self.notifier
    }

    /// Notices not yet shown. Oldest first.
    pub fn pending_notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Take every pending notice. Oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Snapshot for presentation.
    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            connection: self.connection.state(),
            queue: &self.queue,
            permission: self.notifier.permission(),
            banner: self.fatal.as_ref().and_then(Fault::banner),
            last_heartbeat_ack: self.connection.last_heartbeat_ack(),
            url: &self.url,
        }
    }

    fn handle_message(&mut self, text: &str, now: Instant) -> Vec<SessionAction> {
        let routed = match self.router.route(text) {
            Ok(routed) => routed,
            Err(e) => {
                self.report(Fault::Protocol(e));
                return vec![];
            },
        };

        let mut actions = Vec::new();
        for action in routed {
            match action {
                RouteAction::Enqueue(item) => {
                    let id = self.queue.enqueue(item);
                    debug!(draft = %id, pending = self.queue.len(), "draft queued");
                },
                RouteAction::Notify { title, body } => {
                    if let Delivery::Fallback(notice) = self.notifier.notify(&title, &body) {
                        self.push_notice(notice);
                    }
                },
                RouteAction::Reply(frame) => {
                    actions.push(SessionAction::Send { frame, purpose: SendPurpose::ProbeAck });
                },
                RouteAction::HeartbeatAcknowledged => self.connection.record_heartbeat_ack(now),
                RouteAction::ProbeAcknowledged => {
                    self.push_notice(Notice::success("Connection test successful"));
                },
                RouteAction::ServerError(message) => self.report(Fault::Server { message }),
                RouteAction::Ignored { .. } => {},
            }
        }
        actions
    }

    fn apply_connection(&mut self, actions: Vec<ConnectionAction>) -> Vec<SessionAction> {
        let mut out = Vec::new();
        for action in actions {
            match action {
                ConnectionAction::Connect => out.push(SessionAction::Connect { url: self.url.clone() }),
                ConnectionAction::Disconnect { code, reason } => {
                    out.push(SessionAction::Disconnect { code, reason });
                },
                ConnectionAction::SendFrame(frame) => {
                    out.push(SessionAction::Send { frame, purpose: SendPurpose::Heartbeat });
                },
                ConnectionAction::Reconnected => {
                    self.push_notice(Notice::success("Reconnected to draft service"));
                },
                ConnectionAction::ReconnectScheduled { attempt, delay } => {
                    debug!(attempt, delay_ms = delay.as_millis() as u64, "waiting to reconnect");
                },
                ConnectionAction::Exhausted { attempts } => {
                    self.report(Fault::Fatal { attempts });
                },
            }
        }
        out
    }

    /// Report a lost link when the connection decided to retry or give up.
    fn report_transport(&mut self, actions: &[ConnectionAction], reason: impl FnOnce() -> String) {
        let lost = actions.iter().any(|action| {
            matches!(
                action,
                ConnectionAction::ReconnectScheduled { .. } | ConnectionAction::Exhausted { .. }
            )
        });
        if lost {
            let reason = reason();
            self.report(Fault::Transport { reason: reason.clone() });
            self.transport_fault = Some(Fault::Transport { reason });
        }
    }

    fn report(&mut self, fault: Fault) {
        match fault.severity() {
            Severity::Blocking => {
                error!(%fault, "blocking fault");
                self.fatal = Some(fault);
            },
            Severity::Recoverable => {
                warn!(%fault, "recoverable fault");
                if let Some(notice) = fault.notice() {
                    self.push_notice(notice);
                }
            },
        }
    }

    fn push_notice(&mut self, notice: Notice) {
        if self.notices.len() == MAX_PENDING_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use draftdesk_core::{HostError, NoticeLevel, PlatformNotification};
    use proptest::prelude::*;

    use super::*;

    #[derive(Default)]
    struct QuietHost;

    impl NotificationHost for QuietHost {
        fn is_supported(&self) -> bool {
            false
        }

        fn request_permission(&mut self) -> Result<Permission, HostError> {
            Err(HostError::Unsupported)
        }

        fn show(&mut self, _: &PlatformNotification) -> Result<(), HostError> {
            Err(HostError::Unsupported)
        }
    }

    const DRAFT: &str = r#"{"type":"review_requested","data":{"sender":"y@z.com","subject":"X","originalBody":"hi","candidates":["A","B"]}}"#;

    fn session() -> Session<QuietHost> {
        let endpoint = Endpoint::parse("http://localhost").unwrap();
        Session::new(SessionConfig::new(endpoint), QuietHost).unwrap()
    }

    fn open_session(now: Instant) -> Session<QuietHost> {
        let mut session = session();
        session.connect(now);
        session.handle_transport(TransportEvent::Opened, now);
        session
    }

    #[test]
    fn connect_emits_url() {
        let mut session = session();
        let actions = session.connect(Instant::now());
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], SessionAction::Connect { url } if url.scheme() == "ws"));
        assert!(session.connect(Instant::now()).is_empty());
    }

    #[test]
    fn draft_is_queued_with_fallback_notice() {
        let now = Instant::now();
        let mut session = open_session(now);

        session.handle_transport(TransportEvent::Message(DRAFT.into()), now);
        assert_eq!(session.queue().len(), 1);
        assert_eq!(session.queue().cursor(), Some(0));

        let notices = session.drain_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].message.contains("Subject: X"));
        assert!(notices[0].message.contains("y@z.com"));
    }

    #[test]
    fn submit_dequeues_only_after_send() {
        let now = Instant::now();
        let mut session = open_session(now);
        session.handle_transport(TransportEvent::Message(DRAFT.into()), now);
        session.drain_notices();

        let actions = session.submit(&Decision::accept("reply")).unwrap();
        let SessionAction::Send { purpose, .. } = actions[0].clone() else {
            panic!("expected send, got {:?}", actions[0]);
        };
        assert_eq!(session.queue().len(), 1);

        session.send_completed(purpose, Err("socket closed".into()));
        assert_eq!(session.queue().len(), 1);
        assert_eq!(session.drain_notices()[0].message, "Failed to send response");

        session.send_completed(purpose, Ok(()));
        assert!(session.queue().is_empty());
        assert_eq!(session.drain_notices()[0].message, "Draft response sent");
    }

    #[test]
    fn submit_while_disconnected_reports() {
        let mut session = session();
        assert_eq!(session.skip(), Err(SubmitError::NotConnected));
        let notices = session.drain_notices();
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "Not connected to server");
    }

    #[test]
    fn out_of_range_candidate_is_blank() {
        let now = Instant::now();
        let mut session = open_session(now);
        session.handle_transport(TransportEvent::Message(DRAFT.into()), now);

        assert_eq!(session.submit_candidate(5), Err(SubmitError::EmptyBody));
        assert!(session.submit_candidate(1).is_ok());
    }

    #[test]
    fn probe_round_trip() {
        let now = Instant::now();
        let mut session = open_session(now);

        let actions = session.send_diagnostic_probe("2026-01-01T00:00:00.000Z".into());
        assert!(matches!(
            &actions[0],
            SessionAction::Send { frame: OutboundFrame::ConnectionProbe(data), purpose: SendPurpose::Probe }
                if data.user_id == "default_user"
        ));

        session.handle_transport(
            TransportEvent::Message(r#"{"type":"connection_probe_ack"}"#.into()),
            now,
        );
        assert_eq!(session.drain_notices()[0].message, "Connection test successful");
    }

    #[test]
    fn server_probe_is_answered() {
        let now = Instant::now();
        let mut session = open_session(now);
        let actions = session
            .handle_transport(TransportEvent::Message(r#"{"type":"connection_probe"}"#.into()), now);
        assert_eq!(actions, vec![SessionAction::Send {
            frame: OutboundFrame::ConnectionProbeAck,
            purpose: SendPurpose::ProbeAck,
        }]);
    }

    #[test]
    fn abnormal_close_records_transport_fault() {
        let now = Instant::now();
        let mut session = open_session(now);

        session.handle_transport(TransportEvent::Closed { code: CloseCode::ABNORMAL }, now);
        let Some(Fault::Transport { reason }) = session.transport_fault() else {
            panic!("expected transport fault, got {:?}", session.transport_fault());
        };
        assert!(reason.contains("1006"));
        assert!(session.drain_notices().is_empty());
        assert!(session.fatal().is_none());

        session.tick(now + Duration::from_secs(31));
        session.handle_transport(TransportEvent::Opened, now + Duration::from_secs(31));
        assert!(session.transport_fault().is_none());
    }

    #[test]
    fn normal_close_is_not_a_transport_fault() {
        let now = Instant::now();
        let mut session = open_session(now);

        session.handle_transport(TransportEvent::Closed { code: CloseCode::NORMAL }, now);
        assert!(session.transport_fault().is_none());
    }

    #[test]
    fn transport_error_keeps_its_reason() {
        let now = Instant::now();
        let mut session = session();
        session.connect(now);

        session.handle_transport(TransportEvent::Error { reason: "connection refused".into() }, now);
        assert!(matches!(
            session.transport_fault(),
            Some(Fault::Transport { reason }) if reason == "connection refused"
        ));
    }

    #[test]
    fn exhaustion_sets_banner_until_open() {
        let mut now = Instant::now();
        let mut session = session();
        session.connect(now);

        for _ in 0..=10 {
            session.handle_transport(TransportEvent::Closed { code: CloseCode::ABNORMAL }, now);
            now += Duration::from_secs(31);
            session.tick(now);
        }
        assert!(matches!(session.connection_state(), ConnectionState::Failed { .. }));
        assert!(session.view().banner.is_some());

        session.manual_reconnect(now);
        session.handle_transport(TransportEvent::Opened, now);
        assert!(session.fatal().is_none());
        assert!(session.view().banner.is_none());
    }

    fn frame(valid: bool, subject: &str) -> String {
        let candidates = if valid { r#"["A"]"# } else { "[]" };
        format!(
            r#"{{"type":"review_requested","data":{{"sender":"s@x.com","subject":"{subject}","candidates":{candidates}}}}}"#
        )
    }

    proptest! {
        #[test]
        fn queue_grows_only_with_valid_drafts(frames in prop::collection::vec(any::<bool>(), 0..32)) {
            let now = Instant::now();
            let mut session = open_session(now);

            for (i, valid) in frames.iter().enumerate() {
                session.handle_transport(TransportEvent::Message(frame(*valid, &format!("s{i}"))), now);
            }

            let expected = frames.iter().filter(|valid| **valid).count();
            prop_assert_eq!(session.queue().len(), expected);
        }
    }

    #[test]
    fn shutdown_settles_idle() {
        let now = Instant::now();
        let mut session = open_session(now);

        let actions = session.shutdown(now);
        assert!(matches!(
            &actions[..],
            [SessionAction::Disconnect { code, .. }] if code.is_normal()
        ));
        assert_eq!(session.connection_state(), ConnectionState::Idle);
        assert_eq!(session.next_deadline(), None);
    }
}

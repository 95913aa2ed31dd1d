//! Terminal driver
//!
//! Implements [`Driver`] over a WebSocket connection and line-based terminal
//! I/O. Each connection attempt runs in its own task and reports back through
//! a channel tagged with a generation number; events from a connection that
//! has since been replaced or closed are dropped, so the session never hears
//! from a transport it let go of.

use std::{
    io::Write,
    time::{Duration, Instant, SystemTime},
};

use draftdesk_app::{Command as SessionCommand, Driver, DriverEvent, SessionView, TransportEvent};
use draftdesk_core::{Decision, DraftId, Environment, Notice, SystemEnv};
use draftdesk_proto::CloseCode;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, Lines},
    sync::mpsc,
    task::JoinHandle,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Message,
        protocol::{CloseFrame, frame::coding::CloseCode as WireCloseCode},
    },
};
use tracing::{debug, info};
use url::Url;

use crate::{
    commands::{self, Command},
    render,
};

/// Close handshake received without a status code.
const NO_STATUS: CloseCode = CloseCode::new(1005);

/// How long [`TerminalDriver::finish`] waits for a close frame to go out.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// Terminal I/O failed
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// No open connection
    #[error("not connected")]
    NotConnected,

    /// The connection task has stopped
    #[error("connection task has stopped")]
    LinkClosed,

    /// Called outside a tokio runtime
    #[error("no async runtime to run the connection on")]
    NoRuntime,
}

enum Outbound {
    Text(String),
    Close { code: CloseCode, reason: String },
}

struct LinkEvent {
    generation: u64,
    event: TransportEvent,
}

struct Link {
    outbound: mpsc::UnboundedSender<Outbound>,
    task: JoinHandle<()>,
}

enum Wake {
    Link(LinkEvent),
    Input(std::io::Result<Option<String>>),
    Deadline,
}

/// Terminal driver.
///
/// Reads reviewer input as lines from `input`, usually buffered stdin, and
/// writes status, drafts and notices to `out`.
pub struct TerminalDriver<R, W> {
    env: SystemEnv,
    out: W,
    input: Lines<R>,
    events_tx: mpsc::UnboundedSender<LinkEvent>,
    events: mpsc::UnboundedReceiver<LinkEvent>,
    link: Option<Link>,
    closing: Option<JoinHandle<()>>,
    generation: u64,
    open: bool,
    shown_status: Option<String>,
    shown_banner: Option<String>,
    shown_draft: Option<DraftId>,
}

impl<R, W> TerminalDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Create a driver reading lines from `input` and writing to `out`.
    ///
    /// ```no_run
    /// use draftdesk_tui::TerminalDriver;
    /// use tokio::io::BufReader;
    ///
    /// let driver = TerminalDriver::new(BufReader::new(tokio::io::stdin()), std::io::stdout());
    /// ```
    pub fn new(input: R, out: W) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        Self {
            env: SystemEnv,
            out,
            input: input.lines(),
            events_tx,
            events,
            link: None,
            closing: None,
            generation: 0,
            open: false,
            shown_status: None,
            shown_banner: None,
            shown_draft: None,
        }
    }

    /// Everything written so far.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Wait briefly for the last close frame to be written.
    pub async fn finish(&mut self) {
        if let Some(task) = self.closing.take() {
            if tokio::time::timeout(CLOSE_GRACE, task).await.is_err() {
                debug!("close handshake did not finish in time");
            }
        }
    }

    /// Turn an input line into an event. Help and parse errors are answered
    /// locally.
    fn interpret(&mut self, line: &str) -> Result<Option<DriverEvent>, TerminalError> {
        let command = match commands::parse(line) {
            Command::Next => SessionCommand::Next,
            Command::Previous => SessionCommand::Previous,
            Command::Goto { index } => SessionCommand::SetCursor { index },
            Command::Accept { candidate } => SessionCommand::AcceptCandidate { index: candidate },
            Command::Reply { text } => SessionCommand::Submit(Decision::accept(text)),
            Command::Skip => SessionCommand::Skip,
            Command::Reconnect => SessionCommand::Reconnect,
            Command::Probe => SessionCommand::Probe,
            Command::Notify => SessionCommand::RequestPermission,
            Command::Quit => return Ok(Some(DriverEvent::Quit)),
            Command::Blank => return Ok(None),
            Command::Help => {
                self.write_line(render::HELP)?;
                return Ok(None);
            },
            Command::Unknown { input } => {
                self.write_line(&format!("Unknown command: {input} (try /help)"))?;
                return Ok(None);
            },
            Command::InvalidArgs { command, error } => {
                self.write_line(&format!("/{command}: {error}"))?;
                return Ok(None);
            },
        };

        // Navigating always shows the card again, even if the selection did
        // not move.
        if matches!(
            command,
            SessionCommand::Next | SessionCommand::Previous | SessionCommand::SetCursor { .. }
        ) {
            self.shown_draft = None;
        }

        Ok(Some(DriverEvent::Command(command)))
    }

    fn write_line(&mut self, line: &str) -> Result<(), TerminalError> {
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }

    fn on_link_event(&mut self, event: &TransportEvent) {
        match event {
            TransportEvent::Opened => self.open = true,
            TransportEvent::Closed { .. } | TransportEvent::Error { .. } => {
                self.open = false;
                self.link = None;
            },
            TransportEvent::Message(_) => {},
        }
    }
}

impl<R, W> Driver for TerminalDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    type Error = TerminalError;

    fn poll_event(
        &mut self,
        deadline: Option<Instant>,
    ) -> impl Future<Output = Result<DriverEvent, Self::Error>> + Send {
        async move {
            loop {
                let wake = tokio::select! {
                    Some(event) = self.events.recv() => Wake::Link(event),
                    line = self.input.next_line() => Wake::Input(line),
                    () = wait_until(deadline) => Wake::Deadline,
                };

                match wake {
                    Wake::Link(LinkEvent { generation, event }) => {
                        if generation != self.generation {
                            debug!(generation, "dropping event from a released connection");
                            continue;
                        }
                        self.on_link_event(&event);
                        return Ok(DriverEvent::Transport(event));
                    },
                    Wake::Input(Ok(None)) => return Ok(DriverEvent::Quit),
                    Wake::Input(Err(e)) => return Err(TerminalError::Io(e)),
                    Wake::Input(Ok(Some(line))) => {
                        if let Some(event) = self.interpret(&line)? {
                            return Ok(event);
                        }
                    },
                    Wake::Deadline => return Ok(DriverEvent::Tick),
                }
            }
        }
    }

    fn connect(&mut self, url: &Url) -> Result<(), Self::Error> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| TerminalError::NoRuntime)?;

        if let Some(link) = self.link.take() {
            link.task.abort();
        }
        self.generation += 1;
        self.open = false;

        let (outbound, rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(run_link(url.clone(), self.generation, self.events_tx.clone(), rx));
        self.link = Some(Link { outbound, task });

        info!(%url, generation = self.generation, "connecting");
        Ok(())
    }

    fn send_text(&mut self, text: String) -> Result<(), Self::Error> {
        let link = self.link.as_ref().filter(|_| self.open).ok_or(TerminalError::NotConnected)?;
        link.outbound.send(Outbound::Text(text)).map_err(|_| TerminalError::LinkClosed)
    }

    fn disconnect(&mut self, code: CloseCode, reason: &str) {
        self.generation += 1;
        self.open = false;

        let Some(link) = self.link.take() else {
            return;
        };

        // Reserved codes describe a local condition and never go on the wire.
        let close = Outbound::Close { code, reason: reason.to_string() };
        if code.is_reserved() || link.outbound.send(close).is_err() {
            link.task.abort();
        } else {
            self.closing = Some(link.task);
        }
        debug!(code = code.as_u16(), reason, "disconnected");
    }

    fn is_connected(&self) -> bool {
        self.open
    }

    fn now(&self) -> Instant {
        self.env.now()
    }

    fn wall_clock(&self) -> SystemTime {
        self.env.wall_clock()
    }

    fn render(&mut self, view: &SessionView<'_>, notices: &[Notice]) -> Result<(), Self::Error> {
        for notice in notices {
            writeln!(self.out, "{}", render::notice_line(notice))?;
        }

        if view.banner != self.shown_banner {
            if let Some(banner) = &view.banner {
                writeln!(self.out, "{}", render::banner_line(banner))?;
            }
            self.shown_banner.clone_from(&view.banner);
        }

        let status = render::status_line(view);
        if self.shown_status.as_ref() != Some(&status) {
            writeln!(self.out, "{status}")?;
            self.shown_status = Some(status);
        }

        let current = view.current();
        let current_id = current.map(|(id, _)| id);
        if current_id != self.shown_draft {
            if let (Some((_, item)), Some(cursor)) = (current, view.cursor()) {
                writeln!(self.out, "{}", render::draft_card(cursor, view.queue.len(), item))?;
            }
            self.shown_draft = current_id;
        }

        self.out.flush()?;
        Ok(())
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

/// One connection: open, then pump frames both ways until either side
/// closes.
async fn run_link(
    url: Url,
    generation: u64,
    events: mpsc::UnboundedSender<LinkEvent>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    let report = |event| {
        // The driver may already be gone during shutdown.
        let _ = events.send(LinkEvent { generation, event });
    };

    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            report(TransportEvent::Error { reason: e.to_string() });
            return;
        },
    };
    report(TransportEvent::Opened);

    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            out = outbound.recv() => match out {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = sink.send(Message::text(text)).await {
                        report(TransportEvent::Error { reason: e.to_string() });
                        return;
                    }
                },
                Some(Outbound::Close { code, reason }) => {
                    let frame = CloseFrame { code: WireCloseCode::from(code.as_u16()), reason: reason.into() };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        debug!(error = %e, "close frame not sent");
                    }
                    let _ = sink.close().await;
                    return;
                },
                None => return,
            },
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    report(TransportEvent::Message(text.as_str().to_owned()));
                },
                Some(Ok(Message::Close(frame))) => {
                    let code = frame.map_or(NO_STATUS, |f| CloseCode::new(u16::from(f.code)));
                    report(TransportEvent::Closed { code });
                    return;
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    report(TransportEvent::Error { reason: e.to_string() });
                    return;
                },
                // Stream ended without a close handshake.
                None => {
                    report(TransportEvent::Closed { code: CloseCode::ABNORMAL });
                    return;
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use draftdesk_core::{ConnectionState, DraftItem, DraftQueue, Permission};
    use tokio::io::{AsyncWriteExt, BufReader, DuplexStream};

    use super::*;

    type TestDriver = TerminalDriver<BufReader<DuplexStream>, Vec<u8>>;

    fn driver() -> (DuplexStream, TestDriver) {
        let (tx, rx) = tokio::io::duplex(256);
        (tx, TerminalDriver::new(BufReader::new(rx), Vec::new()))
    }

    fn written(driver: &TestDriver) -> String {
        String::from_utf8(driver.output().clone()).unwrap()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn input_lines_become_commands() {
        let (mut tx, mut driver) = driver();
        tx.write_all(b"/accept 2\nlooks good\n").await.unwrap();

        assert_eq!(
            driver.poll_event(None).await.unwrap(),
            DriverEvent::Command(SessionCommand::AcceptCandidate { index: 1 })
        );
        assert_eq!(
            driver.poll_event(None).await.unwrap(),
            DriverEvent::Command(SessionCommand::Submit(Decision::accept("looks good")))
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn help_and_errors_are_answered_locally() {
        let (mut tx, mut driver) = driver();
        tx.write_all(b"/help\n/bogus\n\n/q\n").await.unwrap();

        assert_eq!(driver.poll_event(None).await.unwrap(), DriverEvent::Quit);
        let out = written(&driver);
        assert!(out.contains("/reconnect"));
        assert!(out.contains("Unknown command: /bogus"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn end_of_input_quits() {
        let (tx, mut driver) = driver();
        drop(tx);
        assert_eq!(driver.poll_event(None).await.unwrap(), DriverEvent::Quit);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn last_line_without_newline_is_read() {
        let mut driver = TerminalDriver::new(BufReader::new(&b"/skip"[..]), Vec::new());
        assert_eq!(driver.poll_event(None).await.unwrap(), DriverEvent::Command(SessionCommand::Skip));
        assert_eq!(driver.poll_event(None).await.unwrap(), DriverEvent::Quit);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unreadable_input_is_an_error() {
        let mut driver = TerminalDriver::new(BufReader::new(&[0xff, 0xfe, b'\n'][..]), Vec::new());
        assert!(matches!(driver.poll_event(None).await, Err(TerminalError::Io(_))));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn past_deadline_ticks() {
        let (_tx, mut driver) = driver();
        let deadline = driver.now();
        assert_eq!(driver.poll_event(Some(deadline)).await.unwrap(), DriverEvent::Tick);
    }

    #[test]
    fn send_without_link_fails() {
        let (_tx, mut driver) = driver();
        assert!(matches!(driver.send_text("{}".into()), Err(TerminalError::NotConnected)));
        assert!(!driver.is_connected());
    }

    #[test]
    fn connect_outside_runtime_fails() {
        let (_tx, mut driver) = driver();
        let url = Url::parse("ws://127.0.0.1:1/").unwrap();
        assert!(matches!(driver.connect(&url), Err(TerminalError::NoRuntime)));
    }

    #[test]
    fn render_prints_changes_only() {
        let (_tx, mut driver) = driver();
        let url = Url::parse("ws://127.0.0.1:8000/").unwrap();
        let mut queue = DraftQueue::new();
        queue.enqueue(DraftItem::new("a@b.com", "Hello", "", vec!["Hi".into()]).unwrap());
        let view = SessionView {
            connection: ConnectionState::Open,
            queue: &queue,
            permission: Permission::Granted,
            banner: None,
            last_heartbeat_ack: None,
            url: &url,
        };

        driver.render(&view, &[Notice::success("Reconnected to draft service")]).unwrap();
        driver.render(&view, &[]).unwrap();

        let out = written(&driver);
        assert_eq!(out.matches("[connected] 1 pending").count(), 1);
        assert_eq!(out.matches("--- Draft 1 of 1 ---").count(), 1);
        assert!(out.starts_with("[ok] Reconnected to draft service\n"));
    }
}

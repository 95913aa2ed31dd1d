//! Text rendering.
//!
//! Pure functions from session state to terminal lines. The driver decides
//! when to print them.

use std::fmt::Write as _;

use draftdesk_app::SessionView;
use draftdesk_core::{ConnectionState, DraftItem, Notice, Permission};

/// Command summary shown by `/help`.
pub const HELP: &str = "\
Commands:
  /next, /prev       select the following or preceding draft
  /goto <n>          select draft n
  /accept [n]        send candidate n (default 1) as the reply
  /send <text>       send your own reply (plain text works too)
  /skip              cancel the selected draft
  /reconnect         reconnect now
  /probe             test the connection
  /notify            ask for notification permission
  /quit              leave";

/// One-line connection and queue summary.
pub fn status_line(view: &SessionView<'_>) -> String {
    let mut line = format!("[{}] {} pending", connection_label(view.connection), view.queue.len());
    if let Some(cursor) = view.cursor() {
        let _ = write!(line, ", viewing {} of {}", cursor + 1, view.queue.len());
    }
    if view.permission == Permission::Denied {
        line.push_str(", notifications blocked");
    }
    line
}

fn connection_label(state: ConnectionState) -> String {
    match state {
        ConnectionState::Idle => "offline".into(),
        ConnectionState::Connecting => "connecting".into(),
        ConnectionState::Open => "connected".into(),
        ConnectionState::Closing => "closing".into(),
        ConnectionState::Reconnecting { attempt } => format!("reconnecting, attempt {}", attempt + 1),
        ConnectionState::Failed { .. } => "disconnected".into(),
    }
}

/// Persistent error banner.
pub fn banner_line(text: &str) -> String {
    format!("!! {text} (use /reconnect)")
}

/// The selected draft, with numbered candidates.
pub fn draft_card(index: usize, total: usize, item: &DraftItem) -> String {
    let mut card = format!(
        "--- Draft {} of {total} ---\nFrom:    {}\nSubject: {}\n",
        index + 1,
        item.sender(),
        item.subject()
    );

    for line in item.original_body().lines() {
        let _ = writeln!(card, "  > {line}");
    }

    card.push_str("Candidates:");
    for (n, candidate) in item.candidates().iter().enumerate() {
        let _ = write!(card, "\n  [{}] {candidate}", n + 1);
    }
    card
}

/// A transient notice.
pub fn notice_line(notice: &Notice) -> String {
    format!("[{}] {}", notice.level, notice.message)
}

#[cfg(test)]
mod tests {
    use draftdesk_core::DraftQueue;
    use url::Url;

    use super::*;

    fn item() -> DraftItem {
        DraftItem::new(
            "client@example.com",
            "Meeting tomorrow",
            "Can we move it to 3pm?\nThanks",
            vec!["Sure, 3pm works.".into(), "Sorry, I'm booked.".into()],
        )
        .unwrap()
    }

    fn view<'a>(queue: &'a DraftQueue, url: &'a Url, connection: ConnectionState) -> SessionView<'a> {
        SessionView {
            connection,
            queue,
            permission: Permission::Granted,
            banner: None,
            last_heartbeat_ack: None,
            url,
        }
    }

    #[test]
    fn draft_card_layout() {
        insta::assert_snapshot!(draft_card(0, 2, &item()), @r"
        --- Draft 1 of 2 ---
        From:    client@example.com
        Subject: Meeting tomorrow
          > Can we move it to 3pm?
          > Thanks
        Candidates:
          [1] Sure, 3pm works.
          [2] Sorry, I'm booked.
        ");
    }

    #[test]
    fn status_with_selection() {
        let url = Url::parse("ws://localhost:8000/").unwrap();
        let mut queue = DraftQueue::new();
        queue.enqueue(item());
        queue.enqueue(item());

        insta::assert_snapshot!(
            status_line(&view(&queue, &url, ConnectionState::Open)),
            @"[connected] 2 pending, viewing 1 of 2"
        );
    }

    #[test]
    fn status_while_reconnecting() {
        let url = Url::parse("ws://localhost:8000/").unwrap();
        let queue = DraftQueue::new();
        let mut view = view(&queue, &url, ConnectionState::Reconnecting { attempt: 2 });
        view.permission = Permission::Denied;

        insta::assert_snapshot!(
            status_line(&view),
            @"[reconnecting, attempt 3] 0 pending, notifications blocked"
        );
    }

    #[test]
    fn notice_prefix() {
        assert_eq!(notice_line(&Notice::success("Draft response sent")), "[ok] Draft response sent");
        assert_eq!(notice_line(&Notice::error("Reply text is empty")), "[error] Reply text is empty");
    }
}

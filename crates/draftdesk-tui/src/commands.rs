//! Command parsing for the terminal front end.
//!
//! This module parses input lines into structured [`Command`] values.
//! Candidate and queue positions are 1-based on the command line and
//! 0-based everywhere else.

/// Parsed command from reviewer input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Select the following draft.
    Next,

    /// Select the preceding draft.
    Previous,

    /// Jump to a queue position.
    Goto {
        /// 0-based queue index.
        index: usize,
    },

    /// Accept a candidate reply unedited.
    Accept {
        /// 0-based candidate index.
        candidate: usize,
    },

    /// Accept with a reply typed by the reviewer.
    Reply {
        /// Reply text.
        text: String,
    },

    /// Skip the selected draft.
    Skip,

    /// Reconnect now.
    Reconnect,

    /// Send a diagnostic probe.
    Probe,

    /// Ask for notification permission again.
    Notify,

    /// Show the command list.
    Help,

    /// Quit the application.
    Quit,

    /// Nothing was typed.
    Blank,

    /// Unknown command.
    Unknown {
        /// The original input.
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

/// Parse a reviewer input line into a command.
///
/// Commands start with `/`. Anything else is a typed reply to the selected
/// draft.
pub fn parse(input: &str) -> Command {
    let input = input.trim();

    if input.is_empty() {
        return Command::Blank;
    }

    let Some(cmd_str) = input.strip_prefix('/') else {
        return Command::Reply { text: input.to_string() };
    };

    let (command, rest) = match cmd_str.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (cmd_str, ""),
    };

    match command {
        "next" | "n" => Command::Next,
        "prev" | "p" => Command::Previous,

        "goto" => match position(rest) {
            Some(Ok(index)) => Command::Goto { index },
            Some(Err(error)) => Command::InvalidArgs { command: "goto".into(), error },
            None => Command::InvalidArgs {
                command: "goto".into(),
                error: "Usage: /goto <position>".into(),
            },
        },

        "accept" | "a" => match position(rest) {
            Some(Ok(candidate)) => Command::Accept { candidate },
            Some(Err(error)) => Command::InvalidArgs { command: "accept".into(), error },
            None => Command::Accept { candidate: 0 },
        },

        "send" => {
            if rest.is_empty() {
                Command::InvalidArgs { command: "send".into(), error: "Usage: /send <reply>".into() }
            } else {
                Command::Reply { text: rest.to_string() }
            }
        },

        "skip" | "s" => Command::Skip,
        "reconnect" => Command::Reconnect,
        "probe" => Command::Probe,
        "notify" => Command::Notify,
        "help" | "?" => Command::Help,
        "quit" | "q" => Command::Quit,

        _ => Command::Unknown { input: input.to_string() },
    }
}

/// 1-based position argument to a 0-based index. `None` if absent.
fn position(arg: &str) -> Option<Result<usize, String>> {
    let arg = arg.split_whitespace().next()?;
    Some(match arg.parse::<usize>() {
        Ok(0) => Err("Positions start at 1".into()),
        Ok(n) => Ok(n - 1),
        Err(_) => Err(format!("Invalid position '{arg}'")),
    })
}

//! Reusable oracles.

use draftdesk_core::ConnectionState;

use super::OracleFn;

/// The connection ends in `expected`.
pub fn state_is(expected: ConnectionState) -> OracleFn {
    Box::new(move |world| {
        let actual = world.session().connection_state();
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected state {expected:?}, got {actual:?}"))
        }
    })
}

/// The queue holds exactly these subjects, in order.
pub fn queue_subjects(expected: &[&str]) -> OracleFn {
    let expected: Vec<String> = expected.iter().map(|s| (*s).to_string()).collect();
    Box::new(move |world| {
        let actual: Vec<String> =
            world.session().queue().iter().map(|(_, item)| item.subject().to_string()).collect();
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected queue {expected:?}, got {actual:?}"))
        }
    })
}

/// The cursor ends at `expected`.
pub fn cursor_is(expected: Option<usize>) -> OracleFn {
    Box::new(move |world| {
        let actual = world.session().queue().cursor();
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected cursor {expected:?}, got {actual:?}"))
        }
    })
}

/// Some pending notice carries exactly `message`.
pub fn notice(message: &str) -> OracleFn {
    let message = message.to_string();
    Box::new(move |world| {
        if world.session().pending_notices().any(|n| n.message == message) {
            Ok(())
        } else {
            Err(format!("no notice {message:?}"))
        }
    })
}

/// Every oracle passes. Stops at the first failure.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    Box::new(move |world| oracles.iter().try_for_each(|oracle| oracle(world)))
}

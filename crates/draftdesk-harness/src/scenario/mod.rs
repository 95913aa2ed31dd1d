//! Scenario builder and server frame helpers.
//!
//! A scenario scripts what the server and the reviewer do, runs the
//! production runtime over a [`SimDriver`], and hands the final world to a
//! mandatory oracle that decides whether the run was correct.
//!
//! ```text
//! Scenario::new("name")
//!     .host(SimHost::granted())
//!     .open()
//!     .server(review_requested("X", "y@z.com", &["A", "B"]))
//!     .reviewer(Command::AcceptCandidate { index: 0 })
//!     .oracle(Box::new(|world| { ... }))
//!     .run()
//! ```

mod builder;
pub mod oracle;

pub use builder::{RunnableScenario, Scenario};
use draftdesk_app::{Runtime, Session, SessionConfig};
use draftdesk_core::{Endpoint, EndpointError};
use serde_json::json;

use crate::{sim_driver::SimDriver, sim_host::SimHost};

/// Origin the simulated client is served from.
pub const ORIGIN: &str = "http://review.local";

/// Runtime under test.
pub type World = Runtime<SimDriver, SimHost>;

/// Verifies the final world of a scenario.
pub type OracleFn = Box<dyn Fn(&World) -> Result<(), String>>;

/// A `review_requested` frame.
pub fn review_requested(subject: &str, sender: &str, candidates: &[&str]) -> String {
    json!({
        "type": "review_requested",
        "data": {
            "sender": sender,
            "subject": subject,
            "originalBody": format!("Original message about {subject}"),
            "candidates": candidates,
        }
    })
    .to_string()
}

/// A `server_error` frame.
pub fn server_error(message: &str) -> String {
    json!({ "type": "server_error", "data": { "message": message } }).to_string()
}

/// A `heartbeat_ack` frame.
pub fn heartbeat_ack() -> String {
    json!({ "type": "heartbeat_ack" }).to_string()
}

/// A server-initiated `connection_probe` frame.
pub fn connection_probe() -> String {
    json!({ "type": "connection_probe" }).to_string()
}

/// A `connection_probe_ack` frame.
pub fn connection_probe_ack() -> String {
    json!({ "type": "connection_probe_ack" }).to_string()
}

/// Session configuration used by scenarios.
///
/// # Errors
/// Returns an `EndpointError` if [`ORIGIN`] does not parse.
pub fn session_config() -> Result<SessionConfig, EndpointError> {
    Endpoint::parse(ORIGIN).map(SessionConfig::new)
}

/// Build a started world: permission requested, first attempt issued.
///
/// # Errors
/// Returns a description if the session cannot be created.
pub fn world(driver: SimDriver, host: SimHost, config: SessionConfig) -> Result<World, String> {
    let session = Session::new(config, host).map_err(|e| format!("session: {e}"))?;
    let mut world = Runtime::new(driver, session);
    world.start();
    Ok(world)
}

//! Deterministic simulation harness for the draft review client.
//!
//! A virtual clock, a scripted [`SimDriver`] and a recording [`SimHost`] let
//! tests run the production [`draftdesk_app::Runtime`] without sockets,
//! sleeps or a desktop.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod scenario;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_host;

pub use scenario::{OracleFn, RunnableScenario, Scenario, World};
pub use sim_driver::{SimDriver, SimError, Step};
pub use sim_env::SimEnv;
pub use sim_host::SimHost;

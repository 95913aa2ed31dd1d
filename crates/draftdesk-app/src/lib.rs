//! Application layer for the draft review client
//!
//! Composes the core state machines into one explicitly owned session and
//! runs it through a generic runtime, so deterministic simulation exercises
//! the same orchestration code that runs in production.
//!
//! # Components
//!
//! - [`Session`]: Session context (connection, router, queue, notifications)
//! - [`SessionView`]: Read-only snapshot for presentation
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

mod action;
mod driver;
mod event;
mod runtime;
mod session;
mod view;

pub use action::{SendPurpose, SessionAction};
pub use driver::Driver;
pub use event::{Command, DriverEvent, TransportEvent};
pub use runtime::{Runtime, RuntimeError, probe_timestamp};
pub use session::{Session, SessionConfig};
pub use view::SessionView;

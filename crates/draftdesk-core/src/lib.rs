//! Draft review core logic
//!
//! Pure state machine logic for the draft review client, completely decoupled
//! from I/O. Nothing in this crate opens sockets, reads clocks or sleeps.
//!
//! # Architecture
//!
//! Every time-dependent method takes the current `Instant` as a parameter.
//! State transitions produce declarative actions that describe intended
//! effects (open a transport, send a frame, close the transport) rather than
//! executing them. A runtime or test harness interprets the actions.
//!
//! # Components
//!
//! - [`connection`]: Connection manager (open/close/error, heartbeat, backoff)
//! - [`backoff`]: Reconnect delay policy
//! - [`timer`]: Cancellable deadline timers
//! - [`router`]: Classifies inbound frames
//! - [`queue`]: Ordered draft queue with cursor repair
//! - [`submit`]: Reviewer decision protocol
//! - [`notify`]: Notification gateway over a host platform
//! - [`endpoint`]: Connection URL derivation
//! - [`mod@env`]: Environment abstraction (time)
//! - [`error`]: Fault taxonomy and error types

pub mod backoff;
pub mod connection;
pub mod endpoint;
pub mod env;
pub mod error;
pub mod notice;
pub mod notify;
pub mod queue;
pub mod router;
pub mod submit;
pub mod timer;

pub use backoff::ReconnectPolicy;
pub use connection::{Connection, ConnectionAction, ConnectionConfig, ConnectionState};
pub use endpoint::Endpoint;
pub use env::{Environment, SystemEnv};
pub use error::{ConnectionError, DraftError, EndpointError, Fault, RouteError, Severity, SubmitError};
pub use notice::{Notice, NoticeLevel};
pub use notify::{
    Delivery, HostError, NotificationGateway, NotificationHost, NotifyConfig, Permission,
    PlatformNotification,
};
pub use queue::{DraftId, DraftItem, DraftQueue};
pub use router::{RouteAction, Router};
pub use submit::{Decision, PendingSubmission};
pub use timer::Timer;

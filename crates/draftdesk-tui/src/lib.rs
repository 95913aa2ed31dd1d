//! Terminal front end for the draft review client
//!
//! A thin shell over [`draftdesk_app::Driver`] that provides terminal and
//! WebSocket I/O. All orchestration logic lives in the generic
//! [`draftdesk_app::Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
pub mod config;
pub mod desktop;
pub mod render;
pub mod terminal;

pub use commands::Command;
pub use config::{Args, ClientConfig, ConfigError};
pub use desktop::DesktopHost;
pub use draftdesk_app::{Driver, Runtime};
pub use terminal::{TerminalDriver, TerminalError};

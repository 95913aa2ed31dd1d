//! Wire format for the draft review channel.
//!
//! Every frame is a single JSON text message with a `type` tag and an optional
//! `data` payload. Inbound frames are parsed in two steps: first the envelope,
//! then the payload for the tags we know. Unknown tags parse successfully into
//! [`InboundFrame::Unknown`] so a newer server never breaks an older client.
//!
//! Close codes follow RFC 6455; only [`CloseCode::NORMAL`] means "do not
//! reconnect".
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod close;
pub mod errors;
pub mod frame;
pub mod payloads;

pub use close::CloseCode;
pub use errors::{ProtocolError, Result};
pub use frame::{InboundFrame, OutboundFrame};
pub use payloads::{DecisionData, ProbeData, ReviewRequest, ServerErrorData};

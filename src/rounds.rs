//! The generic machinery of a round-based protocol: messages, routing, errors,
//! the accumulation of per-sender payloads behind a barrier, and the public session interface.

mod error;
mod generic;
mod message;
mod session;

pub use error::{InitError, KeygenError, KeygenErrorKind, LocalError, RoundError};
pub(crate) use generic::{Round, RoundState};
pub use message::{route, Message};
pub use session::{FinalizeError, FinalizeOutcome, Session};

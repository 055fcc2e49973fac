//! The line-oriented scan protocol.
//!
//! - [`transport`] - CR LF line I/O over the daemon socket, with receive timeouts
//! - [`classifier`] - What a received line means
//! - [`parser`] - Splitting result lines into path, status and detail
//! - [`session`] - The per-target state machine tying them together

pub mod classifier;
pub mod parser;
pub mod session;
pub mod transport;

pub use classifier::{classify, LineKind};
pub use parser::{parse_result_line, ItemStatus, ResultEntry};
pub use session::{ScanSession, SessionTimeouts};
pub use transport::{LineTransport, TransportError, UnixLineTransport};

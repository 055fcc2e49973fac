//! Scanning backend implementations.
//!
//! - [`daemon`] - a local scan daemon spoken to over its line protocol
//! - [`spool`] - transient scan targets the daemon reads from disk
//!
//! Other engines plug in by implementing [`Scanner`](crate::core::Scanner).

pub mod daemon;
pub mod spool;

pub use daemon::{DaemonConfig, DaemonScanner};
pub use spool::SpoolDir;

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscriber's `wait` resolves → server stops accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; the server and tests subscribe the same way
//! - Dropping the coordinator also releases waiters

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;

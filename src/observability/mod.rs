//! Crate diagnostics.
//!
//! # Data Flow
//! ```text
//! Service internals (startup, shutdown, sink failures)
//!     → logging.rs (tracing subscriber, RUST_LOG aware)
//!
//! Request outcomes
//!     → metrics.rs (counters, histograms through the metrics facade)
//! ```
//!
//! # Design Decisions
//! - Kept separate from the request logger: these are the service's own diagnostics
//! - Metrics are cheap (atomic increments) and no-ops without a recorder

pub mod logging;
pub mod metrics;

pub use logging::init_tracing;

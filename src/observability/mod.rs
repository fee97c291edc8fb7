//! Observability
//!
//! Tracing setup for the `pactsmith` binary and for tests. The library only
//! emits `tracing` events; installing a subscriber is left to the caller.

pub mod telemetry;

pub use telemetry::{init_tracing, init_tracing_verbose, init_tracing_with_filter};

//! Observability: access events and the sink boundary they flow through.
//!
//! Core accessor logic never calls `tracing` directly; every event is
//! recorded through an `EventSink`.

mod sink;

pub use sink::{AccessEvent, EventSink, StatementKind, TracingSink};

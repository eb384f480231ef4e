use crate::error::Operation;
use tracing::{debug, warn};

///
/// StatementKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Filter,
    Count,
}

///
/// AccessEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccessEvent<'a> {
    /// An operation was refused before reaching the handle.
    Rejected {
        entity: &'a str,
        operation: Operation,
        reason: &'a str,
    },
    /// A filter or count request compiled into an artifact.
    Compiled {
        entity: &'a str,
        kind: StatementKind,
        sql: &'a str,
        params: usize,
    },
    /// A filter or count request failed to compile.
    CompileFailed { entity: &'a str, errors: usize },
    /// A statement ran against the handle.
    Executed {
        entity: &'a str,
        kind: StatementKind,
        rows: u64,
    },
}

///
/// EventSink
///

pub trait EventSink: Send + Sync {
    fn record(&self, event: &AccessEvent<'_>);
}

///
/// TracingSink
/// Default sink; forwards events to `tracing` under the `tabula::access` target.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &AccessEvent<'_>) {
        match *event {
            AccessEvent::Rejected {
                entity,
                operation,
                reason,
            } => {
                warn!(target: "tabula::access", entity, %operation, reason, "operation rejected");
            }
            AccessEvent::Compiled {
                entity,
                kind,
                sql,
                params,
            } => {
                debug!(target: "tabula::access", entity, ?kind, sql, params, "query compiled");
            }
            AccessEvent::CompileFailed { entity, errors } => {
                warn!(target: "tabula::access", entity, errors, "query compilation failed");
            }
            AccessEvent::Executed { entity, kind, rows } => {
                debug!(target: "tabula::access", entity, ?kind, rows, "statement executed");
            }
        }
    }
}

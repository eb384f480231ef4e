//! ## Crate layout
//! - `core`: rows, fields, value types, accessors, the filter compiler,
//!   configuration and observability.
//!
//! The `prelude` module carries the vocabulary used when describing
//! entities and issuing requests; handles, sinks and errors are imported
//! from their modules.

pub use tabula_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use tabula_core::{
    config::AccessorConfig,
    db::{AccessorRegistry, Handle, HandleError, QueryArtifact},
    error::{AccessError, ErrorClass},
};

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        db::{
            Handle as _,
            accessor::{Accessor, EntityDescriptor, Operations},
            filter::{Comparator, FilterCondition, FilterRequest, SortSpec},
        },
        error::Operation,
        model::{ColumnCategory, ColumnDescriptor, CrossFieldRule, Field, ValidationSchema},
        row::{InputSource as _, ParseContext, Row, RowBatch},
        types::{Date, Decimal, Timestamp},
        value::{Value, ValueType},
    };
}

//! Core runtime for Tabula: schema-described rows, per-entity accessors
//! that synthesize CRUD SQL, and the filter compiler.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod row;
pub mod types;
pub mod validate;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, handles, sinks, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{
            accessor::{Accessor, EntityDescriptor, Operations},
            filter::{Comparator, FilterCondition, FilterRequest, SortSpec},
        },
        model::{ColumnCategory, ColumnDescriptor, Field},
        row::{Row, RowBatch},
        value::{Value, ValueType},
    };
}

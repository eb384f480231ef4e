//! Runtime data model: fields, value schemas, cross-field rules, row
//! metadata and the column descriptors that drive SQL synthesis.
//!
//! In general:
//! - `Field` / `RowMetadata` describe *what a row holds*
//! - `ColumnDescriptor` describes *how a slot is persisted*

mod column;
mod error;
mod field;
mod metadata;
mod rule;
mod schema;


pub use column::{ColumnCategory, ColumnDescriptor};
pub use error::{DescriptorError, FieldError, FieldErrorKind};
pub use field::{Field, FieldSource};
pub use metadata::{FieldOverride, RowMetadata};
pub use rule::CrossFieldRule;
pub use schema::ValidationSchema;

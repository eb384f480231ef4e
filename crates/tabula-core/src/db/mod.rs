//! Database boundary: the handle contract, dialects, the filter compiler
//! and the per-entity accessor that ties rows to tables.

pub mod accessor;
pub mod artifact;
pub mod dialect;
pub mod filter;
pub mod handle;
pub mod registry;

pub use accessor::{Accessor, EntityDescriptor, Operations, Template, Templates};
pub use artifact::QueryArtifact;
pub use dialect::{Dialect, DialectKind, SqlDialect};
pub use filter::{
    Comparator, CompileError, CompileErrors, FilterCondition, FilterRequest, SortSpec,
};
pub use handle::{Handle, HandleError};
pub use registry::{AccessorRegistry, RegistryError};

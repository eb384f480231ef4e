use crate::db::{filter::CompileErrors, handle::HandleError};
use std::fmt;
use thiserror::Error as ThisError;

///
/// ErrorClass
///
/// Coarse split between soft rejections (the request itself was refused)
/// and system failures raised by the persistence collaborator.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Rejected,
    System,
}

///
/// ShapeError
///
/// A values array does not match the length of its row metadata.
/// Always a programming defect; never produced by client input.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("entity '{entity}' expects {expected} values, got {actual}")]
pub struct ShapeError {
    pub entity: String,
    pub expected: usize,
    pub actual: usize,
}

///
/// Operation
///
/// The persistence intents an entity may be configured to allow.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    Get,
    Create,
    Update,
    Delete,
    Filter,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Filter => "filter",
        };

        f.write_str(label)
    }
}

///
/// AccessError
///
/// The single error type at every CRUD/filter call boundary.
/// "Not found" and "no row affected" are not errors: they surface as `Ok(false)`.
///

#[derive(Debug, ThisError)]
pub enum AccessError {
    #[error("operation '{operation}' is not allowed on entity '{entity}'")]
    NotAllowed { entity: String, operation: Operation },

    #[error("entity '{entity}' has no primary key")]
    NoPrimaryKey { entity: String },

    #[error("entity '{entity}' has no updatable columns")]
    NothingToUpdate { entity: String },

    #[error("row of entity '{actual}' passed to accessor for '{expected}'")]
    WrongEntity { expected: String, actual: String },

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Compile(#[from] CompileErrors),

    #[error(transparent)]
    Handle(#[from] HandleError),
}

impl AccessError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Handle(_) => ErrorClass::System,
            Self::NotAllowed { .. }
            | Self::NoPrimaryKey { .. }
            | Self::NothingToUpdate { .. }
            | Self::WrongEntity { .. }
            | Self::Shape(_)
            | Self::Compile(_) => ErrorClass::Rejected,
        }
    }
}

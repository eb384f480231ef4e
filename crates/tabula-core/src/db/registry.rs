use crate::db::accessor::Accessor;
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error as ThisError;

///
/// RegistryError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RegistryError {
    #[error("entity '{name}' is already registered")]
    Duplicate { name: String },
}

///
/// AccessorRegistry
/// Accessors by unique entity name, shared read-only once registered.
///

#[derive(Debug, Default)]
pub struct AccessorRegistry {
    accessors: BTreeMap<String, Arc<Accessor>>,
}

impl AccessorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, accessor: Accessor) -> Result<Arc<Accessor>, RegistryError> {
        let name = accessor.name().to_string();
        if self.accessors.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }

        let accessor = Arc::new(accessor);
        self.accessors.insert(name, Arc::clone(&accessor));

        Ok(accessor)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Accessor>> {
        self.accessors.get(name).cloned()
    }

    /// Registered entity names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.accessors.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}

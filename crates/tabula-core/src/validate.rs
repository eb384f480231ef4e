//! Value-list validation boundary.
//!
//! Fields may reference a named enumeration; membership is decided by a
//! `ValueLists` implementation supplied by the caller.

use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};

///
/// ValueLists
///

pub trait ValueLists {
    /// Whether `value` is a member of the list named `list`.
    fn is_valid(&self, list: &str, value: &Value) -> bool;
}

///
/// NoValueLists
/// Rejects every enumerated value; fields without an enumeration are unaffected.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoValueLists;

impl ValueLists for NoValueLists {
    fn is_valid(&self, _list: &str, _value: &Value) -> bool {
        false
    }
}

///
/// StaticValueLists
///
/// In-memory lists keyed by name; members compare by their text rendering.
///

#[derive(Clone, Debug, Default)]
pub struct StaticValueLists {
    lists: BTreeMap<String, BTreeSet<String>>,
}

impl StaticValueLists {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_list<I, S>(mut self, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lists
            .insert(name.into(), members.into_iter().map(Into::into).collect());
        self
    }
}

impl ValueLists for StaticValueLists {
    fn is_valid(&self, list: &str, value: &Value) -> bool {
        self.lists
            .get(list)
            .is_some_and(|members| members.contains(&value.to_string()))
    }
}

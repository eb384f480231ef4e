use crate::value::{Value, ValueType};

///
/// QueryArtifact
///
/// Compiled SQL plus the values and types bound to its placeholders.
/// Output names and types are present for statements that return rows.
///

#[derive(Clone, Debug, PartialEq)]
pub struct QueryArtifact {
    pub sql: String,
    pub param_values: Vec<Value>,
    pub param_types: Vec<ValueType>,
    pub output_names: Option<Vec<String>>,
    pub output_types: Option<Vec<ValueType>>,

    // field index each output column maps back to
    pub(crate) output_indexes: Vec<usize>,
}

impl QueryArtifact {
    #[must_use]
    pub const fn param_count(&self) -> usize {
        self.param_values.len()
    }

    /// Output types, or an empty slice for statements without outputs.
    #[must_use]
    pub fn output_types(&self) -> &[ValueType] {
        self.output_types.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn output_indexes(&self) -> &[usize] {
        &self.output_indexes
    }
}

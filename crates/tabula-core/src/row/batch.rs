use crate::{
    error::ShapeError,
    model::{FieldError, RowMetadata},
    row::{InputSource, ParseContext, Row, RowError, check_shape},
    value::Value,
};
use std::sync::Arc;

///
/// RowRef
///
/// Borrowed view of one row inside a batch.
///

#[derive(Clone, Copy, Debug)]
pub struct RowRef<'a> {
    metadata: &'a RowMetadata,
    values: &'a [Value],
}

impl<'a> RowRef<'a> {
    #[must_use]
    pub const fn values(&self) -> &'a [Value] {
        self.values
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&'a Value> {
        self.metadata.index_of(name).and_then(|idx| self.values.get(idx))
    }
}

///
/// RowBatch
///
/// Ordered rows sharing one metadata. Grows by append only; every stored
/// row is complete.
///

#[derive(Clone, Debug, PartialEq)]
pub struct RowBatch {
    metadata: Arc<RowMetadata>,
    rows: Vec<Vec<Value>>,
}

impl RowBatch {
    #[must_use]
    pub const fn new(metadata: Arc<RowMetadata>) -> Self {
        Self {
            metadata,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub const fn metadata(&self) -> &Arc<RowMetadata> {
        &self.metadata
    }

    /// Append a row built from the same metadata.
    pub fn append(&mut self, row: Row) -> Result<(), RowError> {
        if !same_entity(&self.metadata, row.metadata()) {
            return Err(RowError::ForeignMetadata {
                expected: self.metadata.name().to_string(),
                actual: row.metadata().name().to_string(),
            });
        }

        self.rows.push(row.into_values());

        Ok(())
    }

    /// Append a raw values array.
    pub fn push_values(&mut self, values: Vec<Value>) -> Result<(), ShapeError> {
        check_shape(&self.metadata, values.len())?;
        self.rows.push(values);

        Ok(())
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<RowRef<'_>> {
        self.rows.get(index).map(|values| RowRef {
            metadata: &self.metadata,
            values,
        })
    }

    /// Owned copy of one row.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Row> {
        self.rows.get(index).map(|values| Row {
            metadata: Arc::clone(&self.metadata),
            values: values.clone(),
        })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(|values| RowRef {
            metadata: &self.metadata,
            values,
        })
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub(crate) fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<Value>] {
        &mut self.rows
    }

    /// Parse tabular input, one row per element.
    ///
    /// Errors carry `table` and the 1-based row number. Rows that fail are not
    /// appended; every input is still attempted.
    pub fn parse_all<I: InputSource>(
        &mut self,
        inputs: &[I],
        for_insert: bool,
        ctx: &ParseContext<'_>,
        table: Option<&str>,
    ) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        for (pos, input) in inputs.iter().enumerate() {
            let mut row = Row::new(Arc::clone(&self.metadata));
            let row_ctx = ctx.at(table, pos + 1);

            match row.parse(input, for_insert, &row_ctx) {
                Ok(()) => self.rows.push(row.into_values()),
                Err(mut row_errors) => errors.append(&mut row_errors),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl<'a> IntoIterator for &'a RowBatch {
    type Item = RowRef<'a>;
    type IntoIter = Box<dyn Iterator<Item = RowRef<'a>> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

// Same name and slot layout; overridden metadata of the entity still qualifies.
pub(crate) fn same_entity(a: &Arc<RowMetadata>, b: &Arc<RowMetadata>) -> bool {
    if Arc::ptr_eq(a, b) {
        return true;
    }

    a.name() == b.name()
        && a.len() == b.len()
        && a
            .fields()
            .iter()
            .zip(b.fields())
            .all(|(x, y)| x.name() == y.name() && x.value_type() == y.value_type())
}

use super::{Accessor, Template};
use crate::{
    db::{
        filter::FilterRequest,
        handle::{Handle, HandleError},
    },
    error::{AccessError, Operation, ShapeError},
    obs::StatementKind,
    row::{Row, RowBatch},
    value::Value,
};

fn count_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

///
/// CRUD
///
/// Every call returns `Ok(false)` for "not found" and "no row affected";
/// errors are reserved for refusals and handle failures.
///

impl Accessor {
    /// Load the row identified by its key columns (and tenant) into `row`.
    pub fn read<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        row: &mut Row,
    ) -> Result<bool, AccessError> {
        self.ensure_allowed(Operation::Get)?;
        self.ensure_entity(row.metadata())?;

        self.read_values(handle, row.values_mut())
    }

    /// Insert `row`; a store-generated key is written back into it.
    pub fn insert<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        row: &mut Row,
    ) -> Result<bool, AccessError> {
        self.ensure_allowed(Operation::Create)?;
        self.ensure_entity(row.metadata())?;

        self.insert_values(handle, row.values_mut())
    }

    pub fn update<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        row: &Row,
    ) -> Result<bool, AccessError> {
        self.ensure_allowed(Operation::Update)?;
        self.ensure_entity(row.metadata())?;

        self.update_values(handle, row.values())
    }

    pub fn delete<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        row: &Row,
    ) -> Result<bool, AccessError> {
        self.ensure_allowed(Operation::Delete)?;
        self.ensure_entity(row.metadata())?;

        let delete = self.key_template(self.templates.delete())?;
        let params = delete.bind(row.values());
        let affected = handle.execute_write(delete.sql(), &params, delete.param_types())?;
        self.record_executed(StatementKind::Delete, affected);

        Ok(affected > 0)
    }

    /// Update, falling back to insert when no row matched.
    ///
    /// Two statements, not atomic: a concurrent writer can insert the same
    /// key between them. Run on a transactional handle when that matters.
    pub fn save<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        row: &mut Row,
    ) -> Result<bool, AccessError> {
        self.ensure_allowed(Operation::Create)?;
        self.ensure_allowed(Operation::Update)?;
        self.ensure_entity(row.metadata())?;

        self.save_values(handle, row.values_mut())
    }

    // ------------------------------------------------------------------
    // Batches
    // ------------------------------------------------------------------

    /// Insert every row; `true` only when each one was inserted.
    pub fn insert_all<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        batch: &mut RowBatch,
    ) -> Result<bool, AccessError> {
        self.ensure_allowed(Operation::Create)?;
        self.ensure_entity(batch.metadata())?;

        if batch.is_empty() {
            return Ok(true);
        }

        // one round trip per row so each generated key lands on its row
        if self.generated_key.is_some() {
            let mut all = true;
            for values in batch.rows_mut() {
                all &= self.insert_values(handle, values)?;
            }
            return Ok(all);
        }

        let insert = self.templates.insert();
        let affected = self.write_many(handle, insert, batch.rows())?;
        self.record_executed(StatementKind::Insert, affected);

        Ok(affected >= count_u64(batch.len()))
    }

    /// Update every row; `true` only when each one matched.
    pub fn update_all<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        batch: &RowBatch,
    ) -> Result<bool, AccessError> {
        self.ensure_allowed(Operation::Update)?;
        self.ensure_entity(batch.metadata())?;

        if batch.is_empty() {
            return Ok(true);
        }

        let update = self.update_template()?;
        let affected = self.write_many(handle, update, batch.rows())?;
        self.record_executed(StatementKind::Update, affected);

        Ok(affected >= count_u64(batch.len()))
    }

    /// Save every row; `true` only when each one was updated or inserted.
    pub fn save_all<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        batch: &mut RowBatch,
    ) -> Result<bool, AccessError> {
        self.ensure_allowed(Operation::Create)?;
        self.ensure_allowed(Operation::Update)?;
        self.ensure_entity(batch.metadata())?;

        let mut all = true;
        for values in batch.rows_mut() {
            all &= self.save_values(handle, values)?;
        }

        Ok(all)
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    /// Compile and run a filter. Returned rows are entity-shaped; slots
    /// outside the projection are `Null`.
    pub fn filter<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        request: &FilterRequest,
        tenant: Option<&Value>,
    ) -> Result<RowBatch, AccessError> {
        self.ensure_allowed(Operation::Filter)?;

        let artifact = self.compile_filter(request, self.max_rows_ceiling, tenant)?;
        let rows = handle.execute_read_many(
            &artifact.sql,
            &artifact.param_values,
            &artifact.param_types,
            artifact.output_types(),
        )?;

        let mut batch = self.new_batch();
        for returned in rows {
            let mut values = vec![Value::Null; self.metadata.len()];
            self.scatter(artifact.output_indexes(), returned, &mut values)?;
            batch.push_values(values)?;
        }
        self.record_executed(StatementKind::Filter, count_u64(batch.len()));

        Ok(batch)
    }

    /// Number of rows a filter request matches.
    pub fn count<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        request: &FilterRequest,
        tenant: Option<&Value>,
    ) -> Result<u64, AccessError> {
        self.ensure_allowed(Operation::Filter)?;

        let artifact = self.compile_count(request, tenant)?;
        let returned = handle.execute_read(
            &artifact.sql,
            &artifact.param_values,
            &artifact.param_types,
            artifact.output_types(),
        )?;

        let count = match returned.as_deref() {
            None | Some([]) => 0,
            Some([value, ..]) => value
                .as_integer()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| HandleError::new(format!("count returned '{value}'")))?,
        };
        self.record_executed(StatementKind::Count, count);

        Ok(count)
    }

    // ------------------------------------------------------------------
    // Values-level operations
    // ------------------------------------------------------------------

    fn read_values<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        values: &mut [Value],
    ) -> Result<bool, AccessError> {
        let select = self.key_template(self.templates.select())?;
        let params = select.bind(values);
        let returned = handle.execute_read(
            select.sql(),
            &params,
            select.param_types(),
            self.templates.output_types(),
        )?;

        let Some(returned) = returned else {
            self.record_executed(StatementKind::Select, 0);
            return Ok(false);
        };
        self.scatter(self.templates.output_indexes(), returned, values)?;
        self.record_executed(StatementKind::Select, 1);

        Ok(true)
    }

    fn insert_values<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        values: &mut [Value],
    ) -> Result<bool, AccessError> {
        let insert = self.templates.insert();
        let params = insert.bind(values);

        let affected = match self.generated_column() {
            Some((index, column)) => {
                let (affected, key) = handle.execute_write_returning_generated_key(
                    insert.sql(),
                    &params,
                    insert.param_types(),
                    column,
                )?;
                if affected > 0
                    && let Some(key) = key
                    && let Some(slot) = values.get_mut(index)
                {
                    *slot = self.coerce_key(index, key)?;
                }
                affected
            }
            None => handle.execute_write(insert.sql(), &params, insert.param_types())?,
        };
        self.record_executed(StatementKind::Insert, affected);

        Ok(affected > 0)
    }

    fn update_values<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        values: &[Value],
    ) -> Result<bool, AccessError> {
        let update = self.update_template()?;
        let params = update.bind(values);
        let affected = handle.execute_write(update.sql(), &params, update.param_types())?;
        self.record_executed(StatementKind::Update, affected);

        Ok(affected > 0)
    }

    fn save_values<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        values: &mut [Value],
    ) -> Result<bool, AccessError> {
        if self.update_values(handle, values)? {
            return Ok(true);
        }

        self.insert_values(handle, values)
    }

    fn write_many<H: Handle + ?Sized>(
        &self,
        handle: &mut H,
        template: &Template,
        rows: &[Vec<Value>],
    ) -> Result<u64, AccessError> {
        let params: Vec<Vec<Value>> = rows.iter().map(|values| template.bind(values)).collect();

        Ok(handle.execute_write_many(template.sql(), &params, template.param_types())?)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn key_template<'t>(
        &self,
        template: Option<&'t Template>,
    ) -> Result<&'t Template, AccessError> {
        template.ok_or_else(|| AccessError::NoPrimaryKey {
            entity: self.name().to_string(),
        })
    }

    fn update_template(&self) -> Result<&Template, AccessError> {
        match self.templates.update() {
            Some(template) => Ok(template),
            None if self.key_indexes.is_empty() => Err(AccessError::NoPrimaryKey {
                entity: self.name().to_string(),
            }),
            None => Err(AccessError::NothingToUpdate {
                entity: self.name().to_string(),
            }),
        }
    }

    fn generated_column(&self) -> Option<(usize, &str)> {
        let index = self.generated_key?;
        let column = self.columns.get(index)?.column_name.as_deref()?;

        Some((index, column))
    }

    // Store keys may come back in a wider type (e.g. text ids); coerce to the field.
    fn coerce_key(&self, index: usize, key: Value) -> Result<Value, HandleError> {
        let Some(field) = self.metadata.field(index) else {
            return Ok(key);
        };
        let value_type = field.value_type();
        if value_type.accepts(&key) {
            return Ok(key);
        }

        value_type.parse(&key.to_string()).ok_or_else(|| {
            HandleError::new(format!(
                "generated key '{key}' for '{}' is not a {value_type} value",
                field.name()
            ))
        })
    }

    // Write returned output values back to their field slots.
    fn scatter(
        &self,
        indexes: &[usize],
        returned: Vec<Value>,
        values: &mut [Value],
    ) -> Result<(), ShapeError> {
        if returned.len() != indexes.len() {
            return Err(ShapeError {
                entity: self.name().to_string(),
                expected: indexes.len(),
                actual: returned.len(),
            });
        }

        for (&index, value) in indexes.iter().zip(returned) {
            if let Some(slot) = values.get_mut(index) {
                *slot = value;
            }
        }

        Ok(())
    }
}

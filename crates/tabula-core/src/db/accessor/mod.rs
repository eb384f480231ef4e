//! Module: db::accessor
//! Responsibility: the per-entity engine. Precompiles CRUD templates from
//! column categories, executes them through a `Handle`, and compiles
//! filter requests.
//! Does not own: transaction scope (the caller's handle does).

mod crud;
mod template;

#[cfg(test)]
mod tests;

pub use template::{Template, Templates};

use crate::{
    config::AccessorConfig,
    db::{
        artifact::QueryArtifact,
        dialect::{Dialect, SqlDialect},
        filter::{CompileErrors, FilterCompiler, FilterRequest},
    },
    error::{AccessError, Operation},
    model::{
        ColumnCategory, ColumnDescriptor, CrossFieldRule, DescriptorError, FieldOverride,
        RowMetadata,
    },
    obs::{AccessEvent, EventSink, StatementKind, TracingSink},
    row::{Row, RowBatch, same_entity},
    value::Value,
};
use std::{fmt, sync::Arc};

///
/// Operations
/// Set of operations an entity permits.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Operations(u8);

impl Operations {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b1_1111);
    pub const READ_ONLY: Self = Self::NONE.with(Operation::Get).with(Operation::Filter);

    const fn bit(op: Operation) -> u8 {
        match op {
            Operation::Get => 1,
            Operation::Create => 1 << 1,
            Operation::Update => 1 << 2,
            Operation::Delete => 1 << 3,
            Operation::Filter => 1 << 4,
        }
    }

    #[must_use]
    pub const fn with(self, op: Operation) -> Self {
        Self(self.0 | Self::bit(op))
    }

    #[must_use]
    pub const fn without(self, op: Operation) -> Self {
        Self(self.0 & !Self::bit(op))
    }

    #[must_use]
    pub const fn contains(self, op: Operation) -> bool {
        self.0 & Self::bit(op) != 0
    }
}

impl Default for Operations {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromIterator<Operation> for Operations {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

///
/// EntityDescriptor
///
/// Everything needed to register an entity: names, ordered columns,
/// permitted operations and cross-field rules.
///

#[derive(Clone, Debug, PartialEq)]
pub struct EntityDescriptor {
    pub name: String,
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
    pub operations: Operations,
    pub rules: Vec<CrossFieldRule>,
}

impl EntityDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns: Vec::new(),
            operations: Operations::ALL,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub const fn operations(mut self, operations: Operations) -> Self {
        self.operations = operations;
        self
    }

    #[must_use]
    pub fn rule(mut self, rule: CrossFieldRule) -> Self {
        self.rules.push(rule);
        self
    }
}

///
/// Accessor
///
/// Immutable once built; share it behind an `Arc` across callers.
///

#[derive(Clone)]
pub struct Accessor {
    metadata: Arc<RowMetadata>,
    table: String,
    columns: Vec<ColumnDescriptor>,
    operations: Operations,
    templates: Arc<Templates>,
    key_indexes: Vec<usize>,
    generated_key: Option<usize>,
    tenant: Option<usize>,
    max_rows_ceiling: u32,
    dialect: Arc<dyn Dialect>,
    sink: Arc<dyn EventSink>,
}

impl Accessor {
    pub fn new(
        descriptor: EntityDescriptor,
        config: &AccessorConfig,
    ) -> Result<Self, DescriptorError> {
        let EntityDescriptor {
            name,
            table,
            columns,
            operations,
            rules,
        } = descriptor;

        if name.trim().is_empty() {
            return Err(DescriptorError::EmptyEntityName);
        }
        if table.trim().is_empty() {
            return Err(DescriptorError::EmptyTableName { entity: name });
        }
        check_categories(&name, &columns)?;

        let fields = columns
            .iter()
            .map(|c| {
                let mut field = c.field.clone().with_source(c.category.source());
                if c.category.implies_required() {
                    field.set_required(true);
                }
                field
            })
            .collect();
        let metadata = RowMetadata::new(name, fields, rules)?;

        let columns: Vec<ColumnDescriptor> = columns
            .into_iter()
            .zip(metadata.fields())
            .map(|(mut column, field)| {
                column.field = field.clone();
                column
            })
            .collect();

        let key_indexes = positions(&columns, ColumnCategory::is_key);
        let generated_key = positions(&columns, |c| c == ColumnCategory::GeneratedPrimaryKey)
            .first()
            .copied();
        let tenant = positions(&columns, |c| c == ColumnCategory::TenantKey)
            .first()
            .copied();

        let dialect: Arc<dyn Dialect> = Arc::new(SqlDialect::from_config(config));
        let templates = Arc::new(Templates::build(&table, &columns, dialect.as_ref()));

        Ok(Self {
            metadata: Arc::new(metadata),
            table,
            columns,
            operations,
            templates,
            key_indexes,
            generated_key,
            tenant,
            max_rows_ceiling: config.max_rows_ceiling.max(1),
            dialect,
            sink: Arc::new(TracingSink),
        })
    }

    /// Replace the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the dialect; templates are rebuilt.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.templates = Arc::new(Templates::build(&self.table, &self.columns, dialect.as_ref()));
        self.dialect = dialect;
        self
    }

    /// Copy of this accessor whose metadata carries administrator overrides.
    pub fn with_field_overrides(
        &self,
        overrides: &[FieldOverride],
    ) -> Result<Self, DescriptorError> {
        let metadata = self.metadata.with_overrides(overrides)?;

        let mut next = self.clone();
        for (column, field) in next.columns.iter_mut().zip(metadata.fields()) {
            column.field = field.clone();
        }
        next.metadata = Arc::new(metadata);

        Ok(next)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    #[must_use]
    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub const fn metadata(&self) -> &Arc<RowMetadata> {
        &self.metadata
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    #[must_use]
    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    #[must_use]
    pub const fn operations(&self) -> Operations {
        self.operations
    }

    #[must_use]
    pub const fn allows(&self, op: Operation) -> bool {
        self.operations.contains(op)
    }

    #[must_use]
    pub fn key_indexes(&self) -> &[usize] {
        &self.key_indexes
    }

    #[must_use]
    pub const fn generated_key_index(&self) -> Option<usize> {
        self.generated_key
    }

    #[must_use]
    pub const fn tenant_index(&self) -> Option<usize> {
        self.tenant
    }

    #[must_use]
    pub fn new_row(&self) -> Row {
        Row::new(Arc::clone(&self.metadata))
    }

    #[must_use]
    pub fn new_batch(&self) -> RowBatch {
        RowBatch::new(Arc::clone(&self.metadata))
    }

    // ------------------------------------------------------------------
    // Compilation
    // ------------------------------------------------------------------

    /// Compile a filter request. `tenant` is required when the entity has a
    /// tenant column and ignored otherwise.
    pub fn compile_filter(
        &self,
        request: &FilterRequest,
        max_rows_ceiling: u32,
        tenant: Option<&Value>,
    ) -> Result<QueryArtifact, CompileErrors> {
        let result = self
            .compiler()
            .compile_filter(request, max_rows_ceiling, tenant);
        self.record_compile(StatementKind::Filter, &result);

        result
    }

    /// Compile the `count(*)` twin of a filter request; projection, sort and
    /// row limit are ignored.
    pub fn compile_count(
        &self,
        request: &FilterRequest,
        tenant: Option<&Value>,
    ) -> Result<QueryArtifact, CompileErrors> {
        let result = self.compiler().compile_count(request, tenant);
        self.record_compile(StatementKind::Count, &result);

        result
    }

    fn compiler(&self) -> FilterCompiler<'_> {
        FilterCompiler {
            entity: self.metadata.name(),
            table: &self.table,
            columns: &self.columns,
            tenant: self.tenant,
            dialect: self.dialect.as_ref(),
        }
    }

    // ------------------------------------------------------------------
    // Guards and events
    // ------------------------------------------------------------------

    fn ensure_allowed(&self, operation: Operation) -> Result<(), AccessError> {
        if self.operations.contains(operation) {
            return Ok(());
        }

        self.sink.record(&AccessEvent::Rejected {
            entity: self.name(),
            operation,
            reason: "operation not allowed",
        });

        Err(AccessError::NotAllowed {
            entity: self.name().to_string(),
            operation,
        })
    }

    fn ensure_entity(&self, metadata: &Arc<RowMetadata>) -> Result<(), AccessError> {
        if same_entity(&self.metadata, metadata) {
            Ok(())
        } else {
            Err(AccessError::WrongEntity {
                expected: self.name().to_string(),
                actual: metadata.name().to_string(),
            })
        }
    }

    fn record_compile(&self, kind: StatementKind, result: &Result<QueryArtifact, CompileErrors>) {
        let event = match result {
            Ok(artifact) => AccessEvent::Compiled {
                entity: self.name(),
                kind,
                sql: &artifact.sql,
                params: artifact.param_count(),
            },
            Err(errors) => AccessEvent::CompileFailed {
                entity: self.name(),
                errors: errors.len(),
            },
        };

        self.sink.record(&event);
    }

    fn record_executed(&self, kind: StatementKind, rows: u64) {
        self.sink.record(&AccessEvent::Executed {
            entity: self.name(),
            kind,
            rows,
        });
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("entity", &self.metadata.name())
            .field("table", &self.table)
            .field("operations", &self.operations)
            .field("key_indexes", &self.key_indexes)
            .field("generated_key", &self.generated_key)
            .field("tenant", &self.tenant)
            .field("max_rows_ceiling", &self.max_rows_ceiling)
            .finish_non_exhaustive()
    }
}

fn positions(columns: &[ColumnDescriptor], pred: impl Fn(ColumnCategory) -> bool) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, c)| pred(c.category))
        .map(|(index, _)| index)
        .collect()
}

// Structural invariants over column categories.
fn check_categories(entity: &str, columns: &[ColumnDescriptor]) -> Result<(), DescriptorError> {
    let count = |category: ColumnCategory| {
        columns
            .iter()
            .filter(|c| c.category == category)
            .count()
    };

    if count(ColumnCategory::GeneratedPrimaryKey) > 1 {
        return Err(DescriptorError::MultipleGeneratedKeys {
            entity: entity.to_string(),
        });
    }
    if count(ColumnCategory::TenantKey) > 1 {
        return Err(DescriptorError::MultipleTenantKeys {
            entity: entity.to_string(),
        });
    }
    if count(ColumnCategory::GeneratedPrimaryKey) == 1
        && let Some(plain) = columns
            .iter()
            .find(|c| c.category == ColumnCategory::PrimaryKey)
    {
        return Err(DescriptorError::KeyWithGeneratedKey {
            entity: entity.to_string(),
            field: plain.field.name().to_string(),
        });
    }

    let structural = |category: ColumnCategory| {
        !matches!(
            category,
            ColumnCategory::Ordinary | ColumnCategory::RequiredOrdinary
        )
    };
    if let Some(column) = columns
        .iter()
        .find(|c| structural(c.category) && !c.is_persisted())
    {
        return Err(DescriptorError::UnpersistedColumn {
            field: column.field.name().to_string(),
            category: column.category.to_string(),
        });
    }

    Ok(())
}

use super::*;
use crate::{
    db::filter::{Comparator, FilterCondition},
    error::ErrorClass,
    model::{Field, FieldSource},
    row::ParseContext,
    test_support::{CapturingSink, MemoryHandle, codes, codes_descriptor, contacts},
    types::Decimal,
    value::ValueType,
};
use serde_json::json;

fn new_contact(accessor: &Accessor, name: &str, age: i64) -> Row {
    let mut row = accessor.new_row();
    row.set_by_name("tenant", "acme").expect("tenant");
    row.set_by_name("name", name).expect("name");
    row.set_by_name("age", age).expect("age");
    row.set_by_name("balance", Decimal::new(1250, 2)).expect("balance");
    row
}

fn new_code(accessor: &Accessor, code: &str, rank: i64) -> Row {
    let mut row = accessor.new_row();
    row.set_by_name("code", code).expect("code");
    row.set_by_name("label", code.to_uppercase()).expect("label");
    row.set_by_name("rank", rank).expect("rank");
    row
}

// ----------------------------------------------------------------------
// Construction
// ----------------------------------------------------------------------

#[test]
fn templates_follow_column_categories() {
    let accessor = contacts();
    let templates = accessor.templates();

    let select = templates.select().expect("select");
    assert_eq!(
        select.sql(),
        "SELECT id, tenant_id, name, age, retire_age, birthday, active, balance, \
         created_at, modified_at, modified_by FROM contacts WHERE id = ? AND tenant_id = ?"
    );
    assert_eq!(select.param_indexes(), &[0, 1]);
    assert_eq!(templates.output_indexes(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

    let insert = templates.insert();
    assert_eq!(
        insert.sql(),
        "INSERT INTO contacts (tenant_id, name, age, retire_age, birthday, active, balance, \
         created_at, modified_at, modified_by) \
         VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP, ?)"
    );
    assert_eq!(insert.param_indexes(), &[1, 2, 3, 4, 5, 6, 7, 10]);

    let update = templates.update().expect("update");
    assert_eq!(
        update.sql(),
        "UPDATE contacts SET name = ?, age = ?, retire_age = ?, birthday = ?, active = ?, \
         balance = ?, modified_at = CURRENT_TIMESTAMP, modified_by = ? \
         WHERE id = ? AND tenant_id = ?"
    );
    assert_eq!(update.param_indexes(), &[2, 3, 4, 5, 6, 7, 10, 0, 1]);

    let delete = templates.delete().expect("delete");
    assert_eq!(
        delete.sql(),
        "DELETE FROM contacts WHERE id = ? AND tenant_id = ?"
    );
    assert_eq!(delete.param_types(), &[ValueType::Integer, ValueType::Text]);
}

#[test]
fn construction_derives_key_metadata() {
    let accessor = contacts();

    assert_eq!(accessor.name(), "contact");
    assert_eq!(accessor.table(), "contacts");
    assert_eq!(accessor.key_indexes(), &[0]);
    assert_eq!(accessor.generated_key_index(), Some(0));
    assert_eq!(accessor.tenant_index(), Some(1));

    let metadata = accessor.metadata();
    assert_eq!(
        metadata.field_by_name("id").map(Field::source),
        Some(FieldSource::GeneratedKey)
    );
    assert_eq!(
        metadata.field_by_name("tenant").map(Field::source),
        Some(FieldSource::Server)
    );
    assert!(metadata.field_by_name("name").is_some_and(Field::is_required));
}

#[test]
fn keyless_entity_has_insert_only() {
    let accessor = Accessor::new(
        EntityDescriptor::new("audit", "audit_log")
            .column(ColumnDescriptor::ordinary(Field::new("message", ValueType::Text))),
        &AccessorConfig::default(),
    )
    .expect("accessor");
    let templates = accessor.templates();

    assert!(templates.select().is_none());
    assert!(templates.update().is_none());
    assert!(templates.delete().is_none());
    assert_eq!(
        templates.insert().sql(),
        "INSERT INTO audit_log (message) VALUES (?)"
    );

    let mut handle = MemoryHandle::new();
    let row = accessor.new_row();
    let err = accessor.delete(&mut handle, &row).expect_err("no key");
    assert!(matches!(err, AccessError::NoPrimaryKey { .. }));
    assert!(handle.statements.is_empty());
}

#[test]
fn key_only_entity_cannot_update() {
    let accessor = Accessor::new(
        EntityDescriptor::new("tag", "tags").column(ColumnDescriptor::new(
            Field::new("tag", ValueType::Text),
            "tag",
            ColumnCategory::PrimaryKey,
        )),
        &AccessorConfig::default(),
    )
    .expect("accessor");

    let mut handle = MemoryHandle::new();
    let mut row = accessor.new_row();
    row.set(0, "rust").expect("set");

    let err = accessor.update(&mut handle, &row).expect_err("nothing to set");
    assert!(matches!(err, AccessError::NothingToUpdate { .. }));
    assert!(accessor.insert(&mut handle, &mut row).expect("insert"));
}

#[test]
fn category_invariants_are_enforced() {
    let config = AccessorConfig::default();
    let key = |name: &str, category| {
        ColumnDescriptor::new(Field::new(name, ValueType::Integer), name, category)
    };

    let err = Accessor::new(
        EntityDescriptor::new("x", "xs")
            .column(key("a", ColumnCategory::GeneratedPrimaryKey))
            .column(key("b", ColumnCategory::GeneratedPrimaryKey)),
        &config,
    )
    .expect_err("two generated keys");
    assert!(matches!(err, DescriptorError::MultipleGeneratedKeys { .. }));

    let err = Accessor::new(
        EntityDescriptor::new("x", "xs")
            .column(key("a", ColumnCategory::GeneratedPrimaryKey))
            .column(key("b", ColumnCategory::PrimaryKey)),
        &config,
    )
    .expect_err("mixed keys");
    assert_eq!(
        err,
        DescriptorError::KeyWithGeneratedKey {
            entity: "x".to_string(),
            field: "b".to_string(),
        }
    );

    let err = Accessor::new(
        EntityDescriptor::new("x", "xs")
            .column(key("a", ColumnCategory::TenantKey))
            .column(key("b", ColumnCategory::TenantKey)),
        &config,
    )
    .expect_err("two tenants");
    assert!(matches!(err, DescriptorError::MultipleTenantKeys { .. }));

    let mut transient_key = ColumnDescriptor::transient(Field::new("a", ValueType::Integer));
    transient_key.category = ColumnCategory::PrimaryKey;
    let err = Accessor::new(EntityDescriptor::new("x", "xs").column(transient_key), &config)
        .expect_err("unpersisted key");
    assert!(matches!(err, DescriptorError::UnpersistedColumn { .. }));

    let err = Accessor::new(EntityDescriptor::new("x", " "), &config).expect_err("no table");
    assert!(matches!(err, DescriptorError::EmptyTableName { .. }));
}

#[test]
fn operations_set_semantics() {
    let ops: Operations = [Operation::Get, Operation::Delete].into_iter().collect();

    assert!(ops.contains(Operation::Get));
    assert!(ops.contains(Operation::Delete));
    assert!(!ops.contains(Operation::Create));
    assert!(Operations::READ_ONLY.contains(Operation::Filter));
    assert!(!Operations::ALL.without(Operation::Update).contains(Operation::Update));
    assert_eq!(Operations::default(), Operations::ALL);
}

// ----------------------------------------------------------------------
// CRUD round trips
// ----------------------------------------------------------------------

#[test]
fn insert_then_read_round_trips_generated_key() {
    let accessor = contacts();
    let mut handle = MemoryHandle::new();

    let mut row = new_contact(&accessor, "Ada", 36);
    assert!(accessor.insert(&mut handle, &mut row).expect("insert"));
    assert_eq!(row.get_by_name("id"), Some(&Value::Integer(1)));

    let mut loaded = accessor.new_row();
    loaded.set_by_name("id", 1).expect("id");
    loaded.set_by_name("tenant", "acme").expect("tenant");
    assert!(accessor.read(&mut handle, &mut loaded).expect("read"));

    for name in [
        "id",
        "tenant",
        "name",
        "age",
        "retire_age",
        "birthday",
        "active",
        "balance",
        "modified_by",
    ] {
        assert_eq!(loaded.get_by_name(name), row.get_by_name(name), "{name}");
    }
    assert!(matches!(
        loaded.get_by_name("created_at"),
        Some(Value::Timestamp(_))
    ));
    assert_eq!(loaded.get_by_name("display_name"), Some(&Value::Null));
}

#[test]
fn read_is_scoped_by_tenant() {
    let accessor = contacts();
    let mut handle = MemoryHandle::new();

    let mut row = new_contact(&accessor, "Ada", 36);
    accessor.insert(&mut handle, &mut row).expect("insert");

    let mut other = accessor.new_row();
    other.set_by_name("id", 1).expect("id");
    other.set_by_name("tenant", "globex").expect("tenant");

    assert!(!accessor.read(&mut handle, &mut other).expect("read"));
    assert_eq!(other.get_by_name("name"), Some(&Value::Null));
}

#[test]
fn update_and_delete_report_matches() {
    let accessor = contacts();
    let mut handle = MemoryHandle::new();

    let mut row = new_contact(&accessor, "Ada", 36);
    accessor.insert(&mut handle, &mut row).expect("insert");

    row.set_by_name("age", 37).expect("age");
    assert!(accessor.update(&mut handle, &row).expect("update"));
    assert_eq!(handle.rows("contacts")[0].get("age"), Some(&Value::Integer(37)));

    assert!(accessor.delete(&mut handle, &row).expect("delete"));
    assert!(!accessor.delete(&mut handle, &row).expect("second delete"));
    assert!(handle.rows("contacts").is_empty());
}

#[test]
fn update_binds_set_list_then_keys() {
    let accessor = contacts();
    let mut handle = MemoryHandle::new();

    let mut row = new_contact(&accessor, "Ada", 36);
    row.set_by_name("id", 9).expect("id");
    accessor.update(&mut handle, &row).expect("update");

    let params = handle.params.last().expect("params");
    assert_eq!(params.len(), 9);
    assert_eq!(params[0], Value::from("Ada"));
    assert_eq!(params[7..], [Value::Integer(9), Value::from("acme")]);
}

#[test]
fn save_with_unset_key_inserts() {
    let accessor = contacts();
    let mut handle = MemoryHandle::new();

    let mut row = new_contact(&accessor, "Ada", 36);
    assert!(accessor.save(&mut handle, &mut row).expect("save"));

    assert!(handle.statements[0].starts_with("UPDATE contacts"));
    assert!(handle.statements[1].starts_with("INSERT INTO contacts"));
    assert_eq!(row.get_by_name("id"), Some(&Value::Integer(1)));
}

#[test]
fn save_with_existing_key_updates() {
    let accessor = contacts();
    let mut handle = MemoryHandle::new();

    let mut row = new_contact(&accessor, "Ada", 36);
    accessor.insert(&mut handle, &mut row).expect("insert");
    row.set_by_name("name", "Ada L.").expect("name");

    assert!(accessor.save(&mut handle, &mut row).expect("save"));
    assert!(handle.last_sql().starts_with("UPDATE contacts"));
    assert_eq!(handle.rows("contacts").len(), 1);
    assert_eq!(
        handle.rows("contacts")[0].get("name"),
        Some(&Value::from("Ada L."))
    );
}

// ----------------------------------------------------------------------
// Batches
// ----------------------------------------------------------------------

#[test]
fn insert_all_writes_back_one_key_per_row() {
    let accessor = contacts();
    let mut handle = MemoryHandle::new();

    let mut batch = accessor.new_batch();
    batch.append(new_contact(&accessor, "Ada", 36)).expect("append");
    batch.append(new_contact(&accessor, "Grace", 45)).expect("append");

    assert!(accessor.insert_all(&mut handle, &mut batch).expect("insert_all"));
    assert_eq!(batch.get(0).and_then(|r| r.get(0)), Some(&Value::Integer(1)));
    assert_eq!(batch.get(1).and_then(|r| r.get(0)), Some(&Value::Integer(2)));
}

#[test]
fn insert_all_fails_when_any_row_fails() {
    let accessor = codes();
    let mut handle = MemoryHandle::new().with_unique("codes", "code");

    let mut batch = accessor.new_batch();
    for (code, rank) in [("a", 1), ("b", 2), ("a", 3)] {
        batch.append(new_code(&accessor, code, rank)).expect("append");
    }

    assert!(!accessor.insert_all(&mut handle, &mut batch).expect("insert_all"));
    assert_eq!(handle.rows("codes").len(), 2);
}

#[test]
fn update_all_and_save_all_require_every_row() {
    let accessor = codes();
    let mut handle = MemoryHandle::new();

    let mut batch = accessor.new_batch();
    batch.append(new_code(&accessor, "a", 1)).expect("append");
    batch.append(new_code(&accessor, "b", 2)).expect("append");

    assert!(!accessor.update_all(&mut handle, &batch).expect("nothing stored"));
    assert!(accessor.save_all(&mut handle, &mut batch).expect("save_all"));
    assert_eq!(handle.rows("codes").len(), 2);
    assert!(accessor.update_all(&mut handle, &batch).expect("update_all"));
    assert!(accessor.insert_all(&mut handle, &mut accessor.new_batch()).expect("empty"));
}

// ----------------------------------------------------------------------
// Refusals and failures
// ----------------------------------------------------------------------

#[test]
fn disallowed_operation_is_rejected_and_logged() {
    let sink = CapturingSink::shared();
    let descriptor = codes_descriptor().operations(Operations::READ_ONLY);
    let accessor = Accessor::new(descriptor, &AccessorConfig::default())
        .expect("accessor")
        .with_event_sink(sink.clone());
    let mut handle = MemoryHandle::new();

    let mut row = new_code(&accessor, "a", 1);
    let err = accessor.insert(&mut handle, &mut row).expect_err("read only");

    assert!(matches!(
        err,
        AccessError::NotAllowed {
            operation: Operation::Create,
            ..
        }
    ));
    assert_eq!(err.class(), ErrorClass::Rejected);
    assert!(handle.statements.is_empty());

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert!(events[0].starts_with("Rejected"));
    assert!(events[0].contains("Create"));
}

#[test]
fn rows_of_other_entities_are_refused() {
    let mut handle = MemoryHandle::new();
    let mut row = new_code(&codes(), "a", 1);

    let err = contacts().insert(&mut handle, &mut row).expect_err("wrong entity");

    assert_eq!(
        err.to_string(),
        "row of entity 'code' passed to accessor for 'contact'"
    );
}

#[test]
fn same_named_rows_of_another_shape_are_refused() {
    let mut handle = MemoryHandle::new();
    let narrow = Accessor::new(
        EntityDescriptor::new("code", "codes").column(ColumnDescriptor::new(
            Field::new("code", ValueType::Text),
            "code",
            ColumnCategory::PrimaryKey,
        )),
        &AccessorConfig::default(),
    )
    .expect("narrow accessor");
    let mut row = narrow.new_row();
    row.set(0, "a").expect("code");

    let err = codes().insert(&mut handle, &mut row).expect_err("other shape");

    assert!(matches!(err, AccessError::WrongEntity { .. }));
    assert!(handle.statements.is_empty());
}

#[test]
fn handle_failures_propagate_as_system_errors() {
    let accessor = codes();
    let mut handle = MemoryHandle::new().failing_on("INSERT");

    let mut row = new_code(&accessor, "a", 1);
    let err = accessor.insert(&mut handle, &mut row).expect_err("constraint");

    assert!(matches!(err, AccessError::Handle(_)));
    assert_eq!(err.class(), ErrorClass::System);
}

// ----------------------------------------------------------------------
// Filters
// ----------------------------------------------------------------------

#[test]
fn filter_materialises_entity_shaped_rows() {
    let accessor = contacts();
    let mut handle = MemoryHandle::new();
    handle.stage(vec![
        vec![Value::Integer(1), Value::from("Ada")],
        vec![Value::Integer(2), Value::from("Grace")],
    ]);

    let request = FilterRequest::new()
        .field("id")
        .field("name")
        .filter(FilterCondition::new("name", Comparator::StartsWith, "a"));
    let batch = accessor
        .filter(&mut handle, &request, Some(&Value::from("acme")))
        .expect("filter");

    assert_eq!(batch.len(), 2);
    let second = batch.get(1).expect("row");
    assert_eq!(second.get_by_name("name"), Some(&Value::from("Grace")));
    assert_eq!(second.get_by_name("age"), Some(&Value::Null));
    assert_eq!(handle.params[0], vec![Value::from("acme"), Value::from("A%")]);
}

#[test]
fn filter_rejects_misshapen_results() {
    let accessor = contacts();
    let mut handle = MemoryHandle::new();
    handle.stage(vec![vec![Value::Integer(1)]]);

    let request = FilterRequest::new().field("id").field("name");
    let err = accessor
        .filter(&mut handle, &request, Some(&Value::from("acme")))
        .expect_err("short row");

    assert!(matches!(err, AccessError::Shape(_)));
}

#[test]
fn filter_compile_errors_never_reach_the_handle() {
    let accessor = contacts();
    let mut handle = MemoryHandle::new();

    let request =
        FilterRequest::new().filter(FilterCondition::new("ghost", Comparator::Equal, "1"));
    let err = accessor
        .filter(&mut handle, &request, Some(&Value::from("acme")))
        .expect_err("unknown field");

    match err {
        AccessError::Compile(errors) => assert!(errors.mentions("ghost")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(handle.statements.is_empty());
}

#[test]
fn count_runs_the_count_artifact() {
    let accessor = codes();
    let mut handle = MemoryHandle::new();
    let mut batch = accessor.new_batch();
    batch.append(new_code(&accessor, "a", 1)).expect("append");
    batch.append(new_code(&accessor, "b", 2)).expect("append");
    accessor.insert_all(&mut handle, &mut batch).expect("insert_all");

    let count = accessor
        .count(&mut handle, &FilterRequest::new(), None)
        .expect("count");

    assert_eq!(count, 2);
    assert_eq!(handle.last_sql(), "SELECT count(*) FROM codes");
}

// ----------------------------------------------------------------------
// Overrides and parsing
// ----------------------------------------------------------------------

#[test]
fn field_overrides_leave_original_untouched() {
    let accessor = contacts();
    let overridden = accessor
        .with_field_overrides(&[FieldOverride {
            required: Some(true),
            default: Some(Value::Integer(18)),
            ..FieldOverride::new("age")
        }])
        .expect("overrides");

    let age = |a: &Accessor| a.metadata().field_by_name("age").cloned().expect("age");
    assert!(age(&overridden).is_required());
    assert!(!age(&accessor).is_required());
    assert_eq!(overridden.new_row().get_by_name("age"), Some(&Value::Integer(18)));
    assert_eq!(overridden.templates(), accessor.templates());

    let err = accessor
        .with_field_overrides(&[FieldOverride::new("ghost")])
        .expect_err("unknown");
    assert!(matches!(err, DescriptorError::OverrideUnknownField { .. }));
}

#[test]
fn parsed_input_skips_server_columns() {
    let accessor = contacts();
    let mut row = accessor.new_row();
    let input = json!({
        "id": "99",
        "tenant": "evil",
        "name": "Ada",
        "age": "36",
        "modified_by": "mallory",
    });

    row.parse(&input, true, &ParseContext::default()).expect("parses");

    assert_eq!(row.get_by_name("id"), Some(&Value::Null));
    assert_eq!(row.get_by_name("tenant"), Some(&Value::Null));
    assert_eq!(row.get_by_name("modified_by"), Some(&Value::Null));
    assert_eq!(row.get_by_name("age"), Some(&Value::Integer(36)));

    let mut update = accessor.new_row();
    let errors = update
        .parse(&json!({ "name": "Ada" }), false, &ParseContext::default())
        .expect_err("key required for update");
    assert_eq!(errors[0].field, "id");
}

//! End-to-end scenarios across forms, filters and tables.

use dashkit_engine::{
    from_url_params, presets, to_url_params, validate_filter_state, ColumnDef, FieldDef,
    FieldOption, FilterFieldDef, FilterFieldType, FilterSchema, FilterStore, FilterValidation,
    Form, FormSchema, Operator, PageItem, RenderNode, Rule, SortDirection, SubmitOutcome, Table,
    TableEvent, TableOptions,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

fn users(n: usize) -> Vec<Value> {
    (1..=n)
        .map(|i| {
            json!({
                "name": format!("user{i:02}"),
                "age": 20 + (i % 7),
                "role": if i % 3 == 0 { "admin" } else { "member" },
            })
        })
        .collect()
}

// ============================================================================
// Forms
// ============================================================================

#[test]
fn signup_form_flow() {
    let schema = FormSchema::new(vec![
        FieldDef::text("name").label("Name").required().rule(Rule::min_length(2)),
        FieldDef::email("email").label("Email"),
        FieldDef::array(
            "phones",
            FieldDef::text("phone").rule(Rule::pattern(r"^\+?[0-9 ]+$")),
        )
        .max_items(2),
    ])
    .submit_text("Sign Up");

    let mut form = Form::new(schema).unwrap();
    assert_eq!(form.values(), &json!({"phones": []}));

    form.set_value("name", "A").unwrap();
    let mut calls = 0;
    let outcome = form.submit(|_| calls += 1);
    assert_eq!(calls, 0);
    let SubmitOutcome::Invalid(errors) = outcome else {
        panic!("expected validation to fail");
    };
    assert_eq!(errors.get("name"), Some("Must be at least 2 characters"));

    form.set_value("name", "Alice").unwrap();
    form.set_value("email", "a@b.com").unwrap();
    form.append("phones").unwrap();
    form.set_value("phones.0", "+47 123").unwrap();

    let mut submitted = Vec::new();
    assert_eq!(
        form.submit(|values| submitted.push(values.clone())),
        SubmitOutcome::Submitted
    );
    assert_eq!(
        submitted,
        vec![json!({"name": "Alice", "email": "a@b.com", "phones": ["+47 123"]})]
    );
}

#[test]
fn array_errors_are_keyed_by_entry() {
    let mut form = Form::new(FormSchema::new(vec![FieldDef::array(
        "phones",
        FieldDef::text("phone").rule(Rule::pattern(r"^[0-9]+$").with_message("Digits only")),
    )]))
    .unwrap();
    form.append("phones").unwrap();
    form.append("phones").unwrap();
    form.set_value("phones.0", "123").unwrap();
    form.set_value("phones.1", "abc").unwrap();

    assert!(matches!(form.submit(|_| {}), SubmitOutcome::Invalid(_)));
    assert_eq!(form.error("phones.1"), Some("Digits only"));
    assert_eq!(form.error("phones.0"), None);

    let nodes = form.render();
    let RenderNode::List { items, .. } = &nodes[0] else {
        panic!("expected list");
    };
    assert_eq!(items[1].node.binding().error.as_deref(), Some("Digits only"));

    form.remove("phones", 1).unwrap();
    assert!(form.errors().is_empty());
}

#[test]
fn login_preset_renders_two_inputs() {
    let form = Form::new(presets::login()).unwrap();
    let nodes = form.render();
    let labels: Vec<_> = nodes
        .iter()
        .map(|n| n.field().label.clone().unwrap_or_default())
        .collect();
    assert_eq!(labels, ["Email", "Password"]);
    assert_eq!(form.schema().submit_text.as_deref(), Some("Sign In"));
}

// ============================================================================
// Filters
// ============================================================================

fn people_filters() -> FilterSchema {
    FilterSchema::new()
        .with_field("name", FilterFieldDef::new(FilterFieldType::Text, "Name"))
        .with_field(
            "role",
            FilterFieldDef::new(FilterFieldType::Select, "Role").options(vec![
                FieldOption::new("Admin", "admin"),
                FieldOption::new("Member", "member"),
            ]),
        )
        .with_field(
            "age",
            FilterFieldDef::new(FilterFieldType::Number, "Age").validation(FilterValidation {
                min: Some(0.0),
                max: Some(130.0),
                ..Default::default()
            }),
        )
}

#[test]
fn filter_builder_flow() {
    let mut store = FilterStore::new(people_filters(), None).unwrap();
    let notified = Arc::new(Mutex::new(0));
    let counter = notified.clone();
    store.subscribe(move |_| *counter.lock().unwrap() += 1);

    store.update("name", "Jane", Operator::StartsWith);
    store.update("age", 30, Operator::Gte);
    assert_eq!(*notified.lock().unwrap(), 2);

    assert_eq!(
        Value::Object(store.to_query()),
        json!({
            "name": {"$regex": "^Jane", "$options": "i"},
            "age": {"$gte": 30},
        })
    );

    let url = to_url_params(store.state()).to_query_string();
    let restored = from_url_params(&dashkit_engine::UrlParams::parse(&url), store.schema());
    assert_eq!(restored.get("age"), store.state().get("age"));
    assert_eq!(restored.get("name"), store.state().get("name"));
    assert!(restored.get("role").is_none());

    store.update("age", 200, Operator::Eq);
    let errors = validate_filter_state(store.state(), store.schema()).unwrap_err();
    assert_eq!(errors.get("age"), Some("Age must be at most 130"));

    store.reset();
    assert_eq!(*notified.lock().unwrap(), 4);
    assert_eq!(Value::Object(store.to_query()), json!({"age": 0}));
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn table_sort_filter_paginate() {
    let columns = vec![
        ColumnDef::key("name", "Name"),
        ColumnDef::key("age", "Age"),
        ColumnDef::key("role", "Role"),
    ];
    let mut table = Table::new(columns, users(25), TableOptions::default()).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    table.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

    assert_eq!(table.total_pages(), 3);
    assert_eq!(
        table.page_items(),
        vec![PageItem::Page(1), PageItem::Page(2), PageItem::Page(3)]
    );

    table.toggle_sort("name").unwrap();
    table.toggle_sort("name").unwrap();
    let view = table.view();
    assert_eq!(view.rows[0].cells[0], "user25");
    assert_eq!(view.headers[0].sort_direction, Some(SortDirection::Desc));

    table.set_page(3);
    assert_eq!(table.page_rows().len(), 5);

    table.set_column_filter("role", "admin");
    assert_eq!(table.state().current_page, 1);
    assert_eq!(table.processed_rows().len(), 8);
    assert_eq!(table.total_pages(), 1);

    let events = events.lock().unwrap();
    assert_eq!(
        events.first(),
        Some(&TableEvent::SortChange {
            column: "name".into(),
            direction: SortDirection::Asc
        })
    );
    assert_eq!(events.last(), Some(&TableEvent::PageChange { page: 1 }));
}

#[test]
fn manual_table_reports_changes_only() {
    let options = TableOptions {
        manual_filtering: true,
        manual_pagination: true,
        total_items: Some(95),
        ..Default::default()
    };
    let mut table = Table::new(vec![ColumnDef::key("name", "Name")], users(10), options).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    table.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

    assert_eq!(table.total_pages(), 10);
    table.set_global_filter("zzz");
    assert_eq!(table.page_rows().len(), 10);

    let events = events.lock().unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        TableEvent::FilterChange { global_filter, .. } if global_filter == "zzz"
    )));
}

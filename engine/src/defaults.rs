//! Default-value derivation for form schemas.

use crate::schema::{FieldDef, FieldKind, FormSchema};
use serde_json::{Map, Value};

/// Derive the initial value tree of a form.
///
/// Fields with no derivable default are left out of the mapping rather than
/// set to null.
pub fn derive_defaults(schema: &FormSchema) -> Value {
    Value::Object(collect(schema.fields.iter().map(|f| (f.name.as_str(), f))))
}

/// Derive the default of a single field.
///
/// A declared `default_value` always wins. Otherwise arrays and multi-selects
/// start empty, checkboxes and switches start `false`, objects recurse into
/// their properties, and everything else has no default.
pub fn derive_field_default(field: &FieldDef) -> Option<Value> {
    if let Some(value) = &field.default_value {
        return Some(value.clone());
    }
    match &field.kind {
        FieldKind::Array { .. } => Some(Value::Array(Vec::new())),
        FieldKind::Checkbox | FieldKind::Switch => Some(Value::Bool(false)),
        FieldKind::Select(options) if options.multiple => Some(Value::Array(Vec::new())),
        FieldKind::Object { properties } => Some(Value::Object(collect(
            properties.iter().map(|(key, f)| (key.as_str(), f)),
        ))),
        _ => None,
    }
}

fn collect<'a>(fields: impl Iterator<Item = (&'a str, &'a FieldDef)>) -> Map<String, Value> {
    fields
        .filter_map(|(key, field)| derive_field_default(field).map(|v| (key.to_string(), v)))
        .collect()
}

//! Form schema definition.
//!
//! A form is described by a list of [`FieldDef`]s. Each definition carries
//! the attributes every field shares plus a [`FieldKind`], a tagged union
//! whose `object` and `array` variants nest further definitions.

use crate::{
    error::Result,
    validation::{ExplicitValidator, Rule},
    Error,
};
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Field type tag, as written in the schema's `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Password,
    Tel,
    Url,
    Textarea,
    Number,
    Date,
    Select,
    Radio,
    Checkbox,
    Switch,
    Object,
    Array,
    Custom,
}

impl FieldType {
    /// Types whose value is a free-form string.
    pub fn is_text_like(self) -> bool {
        matches!(
            self,
            FieldType::Text
                | FieldType::Email
                | FieldType::Password
                | FieldType::Tel
                | FieldType::Url
                | FieldType::Textarea
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Password => "password",
            FieldType::Tel => "tel",
            FieldType::Url => "url",
            FieldType::Textarea => "textarea",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Switch => "switch",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Custom => "custom",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input hints for text-like fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// Bounds for date pickers, as ISO strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

/// A selectable choice of a select or radio field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    pub label: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

impl FieldOption {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectOptions {
    pub options: Vec<FieldOption>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub multiple: bool,
}

/// Radio group orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Horizontal,
    #[default]
    Vertical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RadioOptions {
    pub options: Vec<FieldOption>,
    pub layout: Layout,
}

/// Type-specific part of a field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum FieldKind {
    Text(TextOptions),
    Email(TextOptions),
    Password(TextOptions),
    Tel(TextOptions),
    Url(TextOptions),
    Textarea(TextOptions),
    Number(NumberOptions),
    Date(DateOptions),
    Select(SelectOptions),
    Radio(RadioOptions),
    Checkbox,
    Switch,
    /// Nested form: one sub-field per property, in declaration order.
    Object { properties: Properties },
    /// Repeatable entries, each described by `item_field`.
    Array {
        item_field: Box<FieldDef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
    /// Rendering is delegated to a caller-registered component.
    Custom { component: String },
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::Text(_) => FieldType::Text,
            FieldKind::Email(_) => FieldType::Email,
            FieldKind::Password(_) => FieldType::Password,
            FieldKind::Tel(_) => FieldType::Tel,
            FieldKind::Url(_) => FieldType::Url,
            FieldKind::Textarea(_) => FieldType::Textarea,
            FieldKind::Number(_) => FieldType::Number,
            FieldKind::Date(_) => FieldType::Date,
            FieldKind::Select(_) => FieldType::Select,
            FieldKind::Radio(_) => FieldType::Radio,
            FieldKind::Checkbox => FieldType::Checkbox,
            FieldKind::Switch => FieldType::Switch,
            FieldKind::Object { .. } => FieldType::Object,
            FieldKind::Array { .. } => FieldType::Array,
            FieldKind::Custom { .. } => FieldType::Custom,
        }
    }

    /// Whether the value is a sequence: arrays and multi-selects.
    pub fn is_multiple(&self) -> bool {
        matches!(
            self,
            FieldKind::Array { .. } | FieldKind::Select(SelectOptions { multiple: true, .. })
        )
    }
}

// ============================================================================
// Object properties
// ============================================================================

/// Sub-fields of an `object` field, keyed by property name in declaration
/// order.
///
/// Repeated keys are kept as written so that [`FieldDef::check`] can reject
/// them instead of one definition silently replacing another.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, FieldDef)>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property. An existing entry with the same key is not replaced.
    pub fn insert(&mut self, key: impl Into<String>, field: FieldDef) {
        self.0.push((key.into(), field));
    }

    /// First definition declared under `key`.
    pub fn get(&self, key: &str) -> Option<&FieldDef> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    pub fn iter(&self) -> PropertiesIter<'_> {
        PropertiesIter(self.0.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldDef> {
        self.0.iter().map(|(_, f)| f)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First key declared more than once.
    pub fn duplicate_key(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .map(|(k, _)| k.as_str())
            .find(|k| !seen.insert(*k))
    }
}

/// Iterator over `(key, definition)` pairs of [`Properties`].
pub struct PropertiesIter<'a>(std::slice::Iter<'a, (String, FieldDef)>);

impl<'a> Iterator for PropertiesIter<'a> {
    type Item = (&'a String, &'a FieldDef);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, f)| (k, f))
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a String, &'a FieldDef);
    type IntoIter = PropertiesIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<(String, FieldDef)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, FieldDef)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, field) in &self.0 {
            map.serialize_entry(key, field)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = Properties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of property name to field definition")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> std::result::Result<Properties, M::Error> {
                let mut properties = Properties::new();
                while let Some((key, field)) = access.next_entry::<String, FieldDef>()? {
                    properties.insert(key, field);
                }
                Ok(properties)
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}

/// Whether `name` can be addressed by a [`FieldPath`](crate::FieldPath):
/// non-empty, no `.`, and not all digits (those segments parse as indices).
fn check_name(name: &str, context: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidSchema(format!("{context} must not be empty")));
    }
    if name.contains('.') {
        return Err(Error::InvalidSchema(format!(
            "{context} '{name}' must not contain '.'"
        )));
    }
    if name.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidSchema(format!(
            "{context} '{name}' must not be numeric"
        )));
    }
    Ok(())
}

/// Definition of a single form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Field name, the key of its value in the parent mapping
    pub name: String,
    /// Type tag plus type-specific settings
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Absent values fail validation when set
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    /// Hidden fields are neither rendered nor validated
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Validation rules, applied in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
    /// Replaces the validator generated from `rules` when set
    #[serde(skip)]
    pub validator: Option<ExplicitValidator>,
}

impl FieldDef {
    /// Create a field definition of the given kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: None,
            description: None,
            placeholder: None,
            required: false,
            disabled: false,
            hidden: false,
            default_value: None,
            rules: Vec::new(),
            validator: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text(TextOptions::default()))
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Email(TextOptions::default()))
    }

    pub fn password(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Password(TextOptions::default()))
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number(NumberOptions::default()))
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date(DateOptions::default()))
    }

    pub fn checkbox(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Checkbox)
    }

    pub fn switch(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Switch)
    }

    pub fn select(name: impl Into<String>, options: Vec<FieldOption>) -> Self {
        Self::new(
            name,
            FieldKind::Select(SelectOptions {
                options,
                multiple: false,
            }),
        )
    }

    pub fn multi_select(name: impl Into<String>, options: Vec<FieldOption>) -> Self {
        Self::new(
            name,
            FieldKind::Select(SelectOptions {
                options,
                multiple: true,
            }),
        )
    }

    pub fn radio(name: impl Into<String>, options: Vec<FieldOption>) -> Self {
        Self::new(
            name,
            FieldKind::Radio(RadioOptions {
                options,
                layout: Layout::Vertical,
            }),
        )
    }

    /// Nested object; properties are keyed by their own names.
    pub fn object(name: impl Into<String>, properties: impl IntoIterator<Item = FieldDef>) -> Self {
        let properties = properties
            .into_iter()
            .map(|field| (field.name.clone(), field))
            .collect();
        Self::new(name, FieldKind::Object { properties })
    }

    pub fn array(name: impl Into<String>, item_field: FieldDef) -> Self {
        Self::new(
            name,
            FieldKind::Array {
                item_field: Box::new(item_field),
                min_items: None,
                max_items: None,
            },
        )
    }

    pub fn custom(name: impl Into<String>, component: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Custom {
                component: component.into(),
            },
        )
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_validator(mut self, validator: ExplicitValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Lower bound on entries; only meaningful for arrays.
    pub fn min_items(mut self, n: usize) -> Self {
        if let FieldKind::Array { min_items, .. } = &mut self.kind {
            *min_items = Some(n);
        }
        self
    }

    /// Upper bound on entries; only meaningful for arrays.
    pub fn max_items(mut self, n: usize) -> Self {
        if let FieldKind::Array { max_items, .. } = &mut self.kind {
            *max_items = Some(n);
        }
        self
    }

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    /// Check the structural invariants of this definition and its children.
    pub fn check(&self) -> Result<()> {
        check_name(&self.name, "field name")?;
        match &self.kind {
            FieldKind::Object { properties } => {
                if properties.is_empty() {
                    return Err(Error::InvalidSchema(format!(
                        "object field '{}' has no properties",
                        self.name
                    )));
                }
                if let Some(key) = properties.duplicate_key() {
                    return Err(Error::InvalidSchema(format!(
                        "duplicate property '{key}' in object field '{}'",
                        self.name
                    )));
                }
                properties.iter().try_for_each(|(key, field)| {
                    check_name(key, "property key")?;
                    field.check()
                })
            }
            FieldKind::Array {
                item_field,
                min_items,
                max_items,
            } => {
                if let (Some(min), Some(max)) = (min_items, max_items) {
                    if min > max {
                        return Err(Error::InvalidSchema(format!(
                            "array field '{}' has minItems {} above maxItems {}",
                            self.name, min, max
                        )));
                    }
                }
                item_field.check()
            }
            _ => Ok(()),
        }
    }
}

/// A complete form description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    /// Top-level fields in display order
    pub fields: Vec<FieldDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_text: Option<String>,
    #[serde(default)]
    pub show_reset: bool,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self {
            fields,
            submit_text: None,
            show_reset: false,
        }
    }

    /// Builder-style method to add a field.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn submit_text(mut self, text: impl Into<String>) -> Self {
        self.submit_text = Some(text.into());
        self
    }

    pub fn show_reset(mut self, show: bool) -> Self {
        self.show_reset = show;
        self
    }

    /// Get a top-level field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check every field and reject duplicate top-level names.
    pub fn check(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field name: {}",
                    field.name
                )));
            }
            field.check()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile_schema() -> FormSchema {
        FormSchema::new(vec![
            FieldDef::text("name").label("Name").required(),
            FieldDef::object(
                "address",
                [FieldDef::text("street"), FieldDef::text("city")],
            ),
            FieldDef::array("tags", FieldDef::text("tag")).max_items(3),
        ])
    }

    #[test]
    fn parse_from_json() {
        let schema: FormSchema = serde_json::from_value(json!({
            "fields": [
                {"name": "email", "type": "email", "label": "Email", "required": true},
                {"name": "age", "type": "number", "min": 18},
                {"name": "role", "type": "select", "options": [{"label": "Admin", "value": "admin"}]},
                {"name": "address", "type": "object", "properties": {
                    "city": {"name": "city", "type": "text"}
                }},
                {"name": "phones", "type": "array", "itemField": {"name": "phone", "type": "tel"}, "maxItems": 2}
            ]
        }))
        .unwrap();

        assert_eq!(schema.fields.len(), 5);
        assert_eq!(schema.fields[0].field_type(), FieldType::Email);
        assert!(schema.fields[0].required);
        assert!(matches!(
            schema.fields[1].kind,
            FieldKind::Number(NumberOptions { min: Some(m), .. }) if m == 18.0
        ));
        assert!(matches!(
            &schema.fields[4].kind,
            FieldKind::Array { max_items: Some(2), item_field, .. } if item_field.field_type() == FieldType::Tel
        ));
        assert!(schema.check().is_ok());
    }

    #[test]
    fn schema_serialization() {
        let schema = profile_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let parsed: FormSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, parsed);
    }

    #[test]
    fn empty_object_is_rejected() {
        let schema = FormSchema::new(vec![FieldDef::new(
            "address",
            FieldKind::Object {
                properties: Properties::new(),
            },
        )]);
        assert!(matches!(schema.check(), Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn inverted_item_bounds_are_rejected() {
        let schema = FormSchema::new(vec![FieldDef::array("tags", FieldDef::text("tag"))
            .min_items(3)
            .max_items(1)]);
        assert!(matches!(schema.check(), Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let schema = FormSchema::new(vec![FieldDef::text("a"), FieldDef::number("a")]);
        assert!(matches!(schema.check(), Err(Error::InvalidSchema(m)) if m.contains("duplicate")));
    }

    #[test]
    fn duplicate_properties_are_kept_and_rejected() {
        let field = FieldDef::object("o", [FieldDef::text("a"), FieldDef::number("a")]);
        let FieldKind::Object { properties } = &field.kind else {
            panic!("expected object");
        };
        assert_eq!(properties.len(), 2);
        assert_eq!(properties.get("a").map(FieldDef::field_type), Some(FieldType::Text));

        let schema = FormSchema::new(vec![field]);
        assert!(matches!(
            schema.check(),
            Err(Error::InvalidSchema(m)) if m.contains("duplicate property 'a'")
        ));
    }

    #[test]
    fn duplicate_json_properties_are_rejected() {
        let schema: FormSchema = serde_json::from_str(
            r#"{"fields": [{"name": "o", "type": "object", "properties": {
                "a": {"name": "a", "type": "text"},
                "a": {"name": "a", "type": "number"}
            }}]}"#,
        )
        .unwrap();
        assert!(matches!(schema.check(), Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn unaddressable_names_are_rejected() {
        for name in ["a.b", "3", ""] {
            let schema = FormSchema::new(vec![FieldDef::text(name)]);
            assert!(
                matches!(schema.check(), Err(Error::InvalidSchema(_))),
                "{name:?} accepted"
            );
        }

        let schema = FormSchema::new(vec![FieldDef::object(
            "address",
            [FieldDef::text("line.1")],
        )]);
        assert!(matches!(schema.check(), Err(Error::InvalidSchema(_))));

        let schema = FormSchema::new(vec![FieldDef::text("line1"), FieldDef::text("+1")]);
        assert!(schema.check().is_ok());
    }

    #[test]
    fn multiple_kinds() {
        assert!(FieldDef::multi_select("roles", vec![]).kind.is_multiple());
        assert!(!FieldDef::select("role", vec![]).kind.is_multiple());
        assert!(FieldType::Password.is_text_like());
        assert!(!FieldType::Number.is_text_like());
        assert_eq!(FieldType::Switch.to_string(), "switch");
    }
}

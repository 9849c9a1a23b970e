//! Validation builder.
//!
//! Each [`Rule`] compiles to a pure check `(&Value) -> Result<(), String>`.
//! A field's [`Validator`] is the conjunction of a type-appropriate base
//! check and its rules, in declaration order. [`SchemaValidator`] compiles a
//! whole [`FormSchema`] and validates every field independently, collecting
//! one message per failing field path.

use crate::{
    error::Result,
    path::FieldPath,
    schema::{FieldDef, FieldKind, FieldType, FormSchema, SelectOptions},
    value::{coerce_number, display_value, format_f64, json_type_name, parse_date},
    Error,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

const EMAIL_PATTERN: &str =
    r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$";

pub(crate) const REQUIRED_MESSAGE: &str = "This field is required";

/// A single compiled check.
pub type Check = Arc<dyn Fn(&Value) -> std::result::Result<(), String> + Send + Sync>;

/// Caller-supplied predicate for [`Rule::Custom`].
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn test(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A field validator supplied by the caller.
///
/// It receives the raw (possibly absent) value and replaces everything the
/// schema would otherwise generate for that field, including the required
/// check and nested validation.
#[derive(Clone)]
pub struct ExplicitValidator(
    Arc<dyn Fn(Option<&Value>) -> std::result::Result<(), String> + Send + Sync>,
);

impl ExplicitValidator {
    pub fn new(
        f: impl Fn(Option<&Value>) -> std::result::Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    pub fn validate(&self, value: Option<&Value>) -> std::result::Result<(), String> {
        (self.0)(value)
    }
}

impl fmt::Debug for ExplicitValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExplicitValidator(..)")
    }
}

impl PartialEq for ExplicitValidator {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A declarative validation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Rule {
    /// Non-empty string (text-like fields)
    Required {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Lower bound: number value, date instant or array length
    Min {
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Upper bound: number value, date instant or array length
    Max {
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    MinLength {
        value: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    MaxLength {
        value: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Email {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Url {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Pattern {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    OneOf {
        value: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    #[serde(skip)]
    Custom {
        predicate: Predicate,
        message: Option<String>,
    },
}

impl Rule {
    pub fn required() -> Self {
        Rule::Required { message: None }
    }

    pub fn min(value: impl Into<Value>) -> Self {
        Rule::Min {
            value: value.into(),
            message: None,
        }
    }

    pub fn max(value: impl Into<Value>) -> Self {
        Rule::Max {
            value: value.into(),
            message: None,
        }
    }

    pub fn min_length(value: usize) -> Self {
        Rule::MinLength {
            value,
            message: None,
        }
    }

    pub fn max_length(value: usize) -> Self {
        Rule::MaxLength {
            value,
            message: None,
        }
    }

    pub fn email() -> Self {
        Rule::Email { message: None }
    }

    pub fn url() -> Self {
        Rule::Url { message: None }
    }

    pub fn pattern(value: impl Into<String>) -> Self {
        Rule::Pattern {
            value: value.into(),
            message: None,
        }
    }

    pub fn one_of(value: Vec<Value>) -> Self {
        Rule::OneOf {
            value,
            message: None,
        }
    }

    pub fn custom(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Rule::Custom {
            predicate: Predicate::new(f),
            message: None,
        }
    }

    /// Replace the default failure message.
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        let slot = match &mut self {
            Rule::Required { message }
            | Rule::Min { message, .. }
            | Rule::Max { message, .. }
            | Rule::MinLength { message, .. }
            | Rule::MaxLength { message, .. }
            | Rule::Email { message }
            | Rule::Url { message }
            | Rule::Pattern { message, .. }
            | Rule::OneOf { message, .. }
            | Rule::Custom { message, .. } => message,
        };
        *slot = Some(text.into());
        self
    }
}

/// Conjunction of checks; the first failure wins.
#[derive(Clone, Default)]
pub struct Validator {
    checks: Vec<Check>,
}

impl Validator {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Add a check that runs after the existing ones.
    pub fn and(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        self.checks.iter().try_for_each(|check| check(value))
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("checks", &self.checks.len())
            .finish()
    }
}

fn check(f: impl Fn(&Value) -> std::result::Result<(), String> + Send + Sync + 'static) -> Check {
    Arc::new(f)
}

fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

fn is_valid_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

/// Build the validator for a field of the given kind.
///
/// Rules that do not apply to the field's type are skipped. Only rule
/// values that cannot be interpreted (a non-numeric `min` on a number
/// field, a malformed pattern) are errors.
pub fn build_validator(kind: &FieldKind, rules: &[Rule]) -> Result<Validator> {
    let field_type = kind.field_type();
    let mut validator = Validator::new().and(base_check(kind)?);

    match field_type {
        FieldType::Email => {
            let re = compile_regex(EMAIL_PATTERN)?;
            validator = validator.and(string_check(move |s| {
                re.is_match(s).then_some(()).ok_or("Invalid email address".into())
            }));
        }
        FieldType::Url => {
            validator = validator.and(string_check(|s| {
                is_valid_url(s).then_some(()).ok_or("Invalid URL".into())
            }));
        }
        _ => {}
    }

    for rule in rules {
        if let Some(rule_check) = rule_check(kind, rule)? {
            validator = validator.and(rule_check);
        }
    }
    Ok(validator)
}

fn base_check(kind: &FieldKind) -> Result<Check> {
    let field_type = kind.field_type();
    let base = match kind {
        _ if field_type.is_text_like() => check(|v| expect_kind(v.is_string(), "string", v)),
        FieldKind::Select(SelectOptions { multiple: true, .. }) | FieldKind::Array { .. } => {
            check(|v| expect_kind(v.is_array(), "array", v))
        }
        FieldKind::Select(_) | FieldKind::Radio(_) => {
            check(|v| expect_kind(v.is_string() || v.is_number(), "string", v))
        }
        FieldKind::Number(_) => check(|v| {
            coerce_number(v)
                .map(|_| ())
                .ok_or_else(|| "Expected number".to_string())
        }),
        FieldKind::Date(_) => check(|v| match v.as_str().and_then(parse_date) {
            Some(_) => Ok(()),
            None => Err("Invalid date".into()),
        }),
        FieldKind::Checkbox | FieldKind::Switch => {
            check(|v| expect_kind(v.is_boolean(), "boolean", v))
        }
        FieldKind::Object { .. } => check(|v| expect_kind(v.is_object(), "object", v)),
        _ => check(|_| Ok(())),
    };
    Ok(base)
}

fn expect_kind(ok: bool, expected: &str, v: &Value) -> std::result::Result<(), String> {
    if ok {
        Ok(())
    } else {
        Err(format!("Expected {expected}, received {}", json_type_name(v)))
    }
}

/// Wrap a string-only check; non-strings were already rejected by the base.
fn string_check(
    f: impl Fn(&str) -> std::result::Result<(), String> + Send + Sync + 'static,
) -> Check {
    check(move |v| match v.as_str() {
        Some(s) => f(s),
        None => Ok(()),
    })
}

fn message_or(message: &Option<String>, default: String) -> String {
    message.clone().unwrap_or(default)
}

fn rule_check(kind: &FieldKind, rule: &Rule) -> Result<Option<Check>> {
    let field_type = kind.field_type();
    let text_like = field_type.is_text_like();

    let compiled = match rule {
        Rule::Required { message } if text_like => {
            let msg = message_or(message, REQUIRED_MESSAGE.into());
            Some(string_check(move |s| {
                if s.is_empty() {
                    Err(msg.clone())
                } else {
                    Ok(())
                }
            }))
        }
        Rule::MinLength { value, message } if text_like => {
            let (n, msg) = (*value, message_or(message, format!("Must be at least {value} characters")));
            Some(string_check(move |s| {
                if s.chars().count() < n {
                    Err(msg.clone())
                } else {
                    Ok(())
                }
            }))
        }
        Rule::MaxLength { value, message } if text_like => {
            let (n, msg) = (*value, message_or(message, format!("Must be at most {value} characters")));
            Some(string_check(move |s| {
                if s.chars().count() > n {
                    Err(msg.clone())
                } else {
                    Ok(())
                }
            }))
        }
        Rule::Email { message } if matches!(field_type, FieldType::Text | FieldType::Email) => {
            let re = compile_regex(EMAIL_PATTERN)?;
            let msg = message_or(message, "Invalid email address".into());
            Some(string_check(move |s| {
                if re.is_match(s) {
                    Ok(())
                } else {
                    Err(msg.clone())
                }
            }))
        }
        Rule::Url { message } if matches!(field_type, FieldType::Text | FieldType::Url) => {
            let msg = message_or(message, "Invalid URL".into());
            Some(string_check(move |s| {
                if is_valid_url(s) {
                    Ok(())
                } else {
                    Err(msg.clone())
                }
            }))
        }
        Rule::Pattern { value, message } if text_like => {
            let re = compile_regex(value)?;
            let msg = message_or(message, "Invalid format".into());
            Some(string_check(move |s| {
                if re.is_match(s) {
                    Ok(())
                } else {
                    Err(msg.clone())
                }
            }))
        }
        Rule::Min { value, message } => bound_check(kind, value, message, Bound::Lower)?,
        Rule::Max { value, message } => bound_check(kind, value, message, Bound::Upper)?,
        Rule::OneOf { value, message } => {
            let allowed = value.clone();
            let msg = message_or(
                message,
                format!(
                    "Must be one of: {}",
                    allowed.iter().map(display_value).collect::<Vec<_>>().join(", ")
                ),
            );
            Some(check(move |v| {
                if allowed.iter().any(|a| same_choice(a, v)) {
                    Ok(())
                } else {
                    Err(msg.clone())
                }
            }))
        }
        Rule::Custom { predicate, message } => {
            let predicate = predicate.clone();
            let msg = message_or(message, "Invalid value".into());
            Some(check(move |v| {
                if predicate.test(v) {
                    Ok(())
                } else {
                    Err(msg.clone())
                }
            }))
        }
        // Gated out for this field type
        _ => None,
    };
    Ok(compiled)
}

fn same_choice(allowed: &Value, value: &Value) -> bool {
    if allowed == value {
        return true;
    }
    let scalar = |v: &Value| v.is_string() || v.is_number() || v.is_boolean();
    scalar(allowed) && scalar(value) && display_value(allowed) == display_value(value)
}

#[derive(Clone, Copy)]
enum Bound {
    Lower,
    Upper,
}

impl Bound {
    fn violated<T: PartialOrd>(self, actual: T, limit: T) -> bool {
        match self {
            Bound::Lower => actual < limit,
            Bound::Upper => actual > limit,
        }
    }
}

fn bound_check(
    kind: &FieldKind,
    limit: &Value,
    message: &Option<String>,
    bound: Bound,
) -> Result<Option<Check>> {
    let word = match bound {
        Bound::Lower => "least",
        Bound::Upper => "most",
    };

    if kind.is_multiple() {
        let n = limit.as_u64().ok_or_else(|| {
            Error::InvalidSchema(format!("item count bound must be a non-negative integer, got {limit}"))
        })? as usize;
        let msg = message_or(message, format!("Must contain at {word} {n} item(s)"));
        return Ok(Some(check(move |v| match v.as_array() {
            Some(items) if bound.violated(items.len(), n) => Err(msg.clone()),
            _ => Ok(()),
        })));
    }

    match kind.field_type() {
        FieldType::Number => {
            let n = coerce_number(limit).ok_or_else(|| {
                Error::InvalidSchema(format!("numeric bound expected, got {limit}"))
            })?;
            let msg = message_or(message, format!("Must be at {word} {}", format_f64(n)));
            Ok(Some(check(move |v| match coerce_number(v) {
                Some(actual) if bound.violated(actual, n) => Err(msg.clone()),
                _ => Ok(()),
            })))
        }
        FieldType::Date => {
            let raw = limit.as_str().unwrap_or_default().to_string();
            let instant = parse_date(&raw)
                .ok_or_else(|| Error::InvalidSchema(format!("date bound expected, got {limit}")))?;
            let relation = match bound {
                Bound::Lower => "on or after",
                Bound::Upper => "on or before",
            };
            let msg = message_or(message, format!("Must be {relation} {raw}"));
            Ok(Some(check(move |v| match v.as_str().and_then(parse_date) {
                Some(actual) if bound.violated(actual, instant) => Err(msg.clone()),
                _ => Ok(()),
            })))
        }
        _ => Ok(None),
    }
}

/// Validation messages keyed by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Record a message; the first message for a path is kept.
    pub fn insert(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.entry(path.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.0.remove(path)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

enum Rules {
    Generated(Validator),
    Explicit(ExplicitValidator),
}

enum Nested {
    None,
    Object(Vec<(String, FieldValidator)>),
    Array {
        item: Box<FieldValidator>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
}

/// Compiled validator for one field and its descendants.
pub struct FieldValidator {
    required: bool,
    /// `""` counts as missing when the field is required
    blank_is_missing: bool,
    /// `""` counts as missing whether or not the field is required
    blank_is_absent: bool,
    rules: Rules,
    nested: Nested,
}

impl FieldValidator {
    /// Compile a field definition.
    pub fn new(field: &FieldDef) -> Result<Self> {
        let rules = match &field.validator {
            Some(explicit) => Rules::Explicit(explicit.clone()),
            None => Rules::Generated(build_validator(&field.kind, &field.rules)?),
        };

        let nested = match &field.kind {
            FieldKind::Object { properties } => Nested::Object(
                properties
                    .iter()
                    .filter(|(_, f)| !f.hidden)
                    .map(|(key, f)| Ok((key.clone(), FieldValidator::new(f)?)))
                    .collect::<Result<Vec<_>>>()?,
            ),
            FieldKind::Array {
                item_field,
                min_items,
                max_items,
            } => Nested::Array {
                item: Box::new(FieldValidator::new(item_field)?),
                min_items: *min_items,
                max_items: *max_items,
            },
            _ => Nested::None,
        };

        Ok(Self {
            required: field.required,
            blank_is_missing: field.field_type().is_text_like()
                || matches!(field.kind, FieldKind::Radio(_))
                || matches!(field.kind, FieldKind::Select(SelectOptions { multiple: false, .. })),
            blank_is_absent: matches!(field.kind, FieldKind::Date(_)),
            rules,
            nested,
        })
    }

    /// Validate `value` located at `path`, recording failures in `errors`.
    pub fn validate_into(&self, path: &FieldPath, value: Option<&Value>, errors: &mut FieldErrors) {
        let validator = match &self.rules {
            Rules::Explicit(explicit) => {
                if let Err(message) = explicit.validate(value) {
                    errors.insert(path.to_string(), message);
                }
                return;
            }
            Rules::Generated(validator) => validator,
        };

        let value = match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s))
                if s.is_empty() && (self.blank_is_absent || (self.blank_is_missing && self.required)) =>
            {
                None
            }
            Some(v) => Some(v),
        };
        let Some(value) = value else {
            if self.required {
                errors.insert(path.to_string(), REQUIRED_MESSAGE);
            }
            return;
        };

        if let Err(message) = validator.validate(value) {
            errors.insert(path.to_string(), message);
            return;
        }

        match &self.nested {
            Nested::None => {}
            Nested::Object(properties) => {
                for (key, child) in properties {
                    child.validate_into(&path.key(key.clone()), value.get(key), errors);
                }
            }
            Nested::Array {
                item,
                min_items,
                max_items,
            } => {
                let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
                if let Some(min) = min_items.filter(|min| items.len() < *min) {
                    errors.insert(path.to_string(), format!("Must contain at least {min} item(s)"));
                }
                if let Some(max) = max_items.filter(|max| items.len() > *max) {
                    errors.insert(path.to_string(), format!("Must contain at most {max} item(s)"));
                }
                for (i, entry) in items.iter().enumerate() {
                    item.validate_into(&path.index(i), Some(entry), errors);
                }
            }
        }
    }
}

/// Whole-record validator for a [`FormSchema`].
pub struct SchemaValidator {
    fields: Vec<(String, FieldValidator)>,
}

impl SchemaValidator {
    /// Compile every visible field of the schema.
    pub fn new(schema: &FormSchema) -> Result<Self> {
        let fields = schema
            .fields
            .iter()
            .filter(|f| !f.hidden)
            .map(|f| Ok((f.name.clone(), FieldValidator::new(f)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    /// Validate a record. Every field is checked; no failure short-circuits
    /// another field.
    pub fn validate(&self, record: &Value) -> std::result::Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let root = FieldPath::root();
        for (name, field) in &self.fields {
            field.validate_into(&root.key(name.clone()), record.get(name), &mut errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldOption;
    use serde_json::json;

    fn text() -> FieldKind {
        FieldDef::text("t").kind
    }

    #[test]
    fn rules_apply_in_order_conjunctively() {
        let v = build_validator(&text(), &[Rule::min_length(2), Rule::max_length(4)]).unwrap();
        assert_eq!(v.validate(&json!("A")), Err("Must be at least 2 characters".into()));
        assert_eq!(v.validate(&json!("Alice")), Err("Must be at most 4 characters".into()));
        assert!(v.validate(&json!("Ali")).is_ok());
    }

    #[test]
    fn gated_rules_are_no_ops() {
        let number = FieldDef::number("n").kind;
        let v = build_validator(&number, &[Rule::min_length(5), Rule::email(), Rule::pattern("^x$")])
            .unwrap();
        assert!(v.validate(&json!(3)).is_ok());

        let checkbox = FieldDef::checkbox("c").kind;
        let v = build_validator(&checkbox, &[Rule::min(1), Rule::max_length(0)]).unwrap();
        assert!(v.validate(&json!(true)).is_ok());
    }

    #[test]
    fn base_checks() {
        let v = build_validator(&FieldDef::number("n").kind, &[]).unwrap();
        assert!(v.validate(&json!("12")).is_ok());
        assert!(v.validate(&json!("")).is_ok());
        assert_eq!(v.validate(&json!("abc")), Err("Expected number".into()));

        let v = build_validator(&FieldDef::checkbox("c").kind, &[]).unwrap();
        assert_eq!(
            v.validate(&json!("yes")),
            Err("Expected boolean, received string".into())
        );

        let v = build_validator(&FieldDef::multi_select("m", vec![]).kind, &[]).unwrap();
        assert!(v.validate(&json!(["a"])).is_ok());
        assert!(v.validate(&json!("a")).is_err());

        let v = build_validator(&FieldDef::date("d").kind, &[]).unwrap();
        assert!(v.validate(&json!("2024-02-01")).is_ok());
        assert_eq!(v.validate(&json!("someday")), Err("Invalid date".into()));
    }

    #[test]
    fn email_and_url_types() {
        let v = build_validator(&FieldDef::email("e").kind, &[]).unwrap();
        assert!(v.validate(&json!("a@b.com")).is_ok());
        assert_eq!(v.validate(&json!("nope")), Err("Invalid email address".into()));

        let url = FieldDef::new("u", FieldKind::Url(Default::default()));
        let v = build_validator(&url.kind, &[]).unwrap();
        assert!(v.validate(&json!("https://example.com/x")).is_ok());
        assert_eq!(v.validate(&json!("example")), Err("Invalid URL".into()));
    }

    #[test]
    fn numeric_date_and_length_bounds() {
        let v = build_validator(&FieldDef::number("n").kind, &[Rule::min(18), Rule::max(65)]).unwrap();
        assert_eq!(v.validate(&json!(10)), Err("Must be at least 18".into()));
        assert_eq!(v.validate(&json!("70")), Err("Must be at most 65".into()));
        assert!(v.validate(&json!(30)).is_ok());

        let v = build_validator(&FieldDef::date("d").kind, &[Rule::min("2024-01-01")]).unwrap();
        assert_eq!(
            v.validate(&json!("2023-12-31")),
            Err("Must be on or after 2024-01-01".into())
        );

        let array = FieldDef::array("a", FieldDef::text("t")).kind;
        let v = build_validator(&array, &[Rule::max(1)]).unwrap();
        assert_eq!(
            v.validate(&json!(["x", "y"])),
            Err("Must contain at most 1 item(s)".into())
        );
    }

    #[test]
    fn bad_rule_values_are_errors() {
        let err = build_validator(&text(), &[Rule::pattern("(")]).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));

        let err = build_validator(&FieldDef::number("n").kind, &[Rule::min("ten")]).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }

    #[test]
    fn one_of_and_custom() {
        let v = build_validator(
            &FieldDef::select("s", vec![FieldOption::new("A", "a")]).kind,
            &[Rule::one_of(vec![json!("a"), json!("b")])],
        )
        .unwrap();
        assert!(v.validate(&json!("a")).is_ok());
        assert_eq!(v.validate(&json!("c")), Err("Must be one of: a, b".into()));

        let v = build_validator(
            &text(),
            &[Rule::custom(|v| v.as_str() != Some("admin")).with_message("Reserved name")],
        )
        .unwrap();
        assert_eq!(v.validate(&json!("admin")), Err("Reserved name".into()));
    }

    #[test]
    fn schema_validator_reports_fields_independently() {
        let schema = FormSchema::new(vec![
            FieldDef::text("name").required().rule(Rule::min_length(2)),
            FieldDef::email("email").required(),
            FieldDef::number("age"),
        ]);
        let validator = SchemaValidator::new(&schema).unwrap();

        let errors = validator
            .validate(&json!({"name": "A", "email": "bad", "age": 3}))
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("name"), Some("Must be at least 2 characters"));
        assert_eq!(errors.get("email"), Some("Invalid email address"));

        let errors = validator.validate(&json!({})).unwrap_err();
        assert_eq!(errors.get("name"), Some(REQUIRED_MESSAGE));
        assert_eq!(errors.get("email"), Some(REQUIRED_MESSAGE));
        assert!(!errors.contains("age"));
    }

    #[test]
    fn nested_paths() {
        let schema = FormSchema::new(vec![
            FieldDef::object(
                "address",
                [FieldDef::text("city").required(), FieldDef::text("zip").rule(Rule::pattern(r"^\d{4}$"))],
            ),
            FieldDef::array("contacts", FieldDef::email("contact")).min_items(1),
        ]);
        let validator = SchemaValidator::new(&schema).unwrap();

        let errors = validator
            .validate(&json!({
                "address": {"zip": "12a"},
                "contacts": ["ok@example.com", "broken"]
            }))
            .unwrap_err();
        assert_eq!(errors.get("address.city"), Some(REQUIRED_MESSAGE));
        assert_eq!(errors.get("address.zip"), Some("Invalid format"));
        assert_eq!(errors.get("contacts.1"), Some("Invalid email address"));
        assert!(!errors.contains("contacts.0"));

        let errors = validator
            .validate(&json!({"address": {"city": "Oslo"}, "contacts": []}))
            .unwrap_err();
        assert_eq!(errors.get("contacts"), Some("Must contain at least 1 item(s)"));
    }

    #[test]
    fn explicit_validator_replaces_generated() {
        let schema = FormSchema::new(vec![FieldDef::text("code")
            .required()
            .rule(Rule::min_length(10))
            .with_validator(ExplicitValidator::new(|v| match v {
                Some(Value::String(s)) if s.starts_with('X') => Ok(()),
                _ => Err("Code must start with X".into()),
            }))]);
        let validator = SchemaValidator::new(&schema).unwrap();

        assert!(validator.validate(&json!({"code": "X1"})).is_ok());
        let errors = validator.validate(&json!({})).unwrap_err();
        assert_eq!(errors.get("code"), Some("Code must start with X"));
    }

    #[test]
    fn blank_values() {
        let schema = FormSchema::new(vec![
            FieldDef::date("start"),
            FieldDef::select("role", vec![FieldOption::new("Admin", "admin")]).required(),
            FieldDef::text("nickname"),
        ]);
        let validator = SchemaValidator::new(&schema).unwrap();
        let errors = validator
            .validate(&json!({"start": "", "role": "", "nickname": ""}))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("role"), Some(REQUIRED_MESSAGE));
    }

    #[test]
    fn hidden_fields_are_skipped() {
        let schema = FormSchema::new(vec![FieldDef::text("secret").required().hidden()]);
        let validator = SchemaValidator::new(&schema).unwrap();
        assert!(validator.validate(&json!({})).is_ok());
    }

    #[test]
    fn rules_round_trip_through_json() {
        let rules: Vec<Rule> = serde_json::from_value(json!([
            {"type": "required"},
            {"type": "minLength", "value": 2, "message": "Too short"},
            {"type": "oneOf", "value": ["a", "b"]}
        ]))
        .unwrap();
        assert_eq!(rules[0], Rule::required());
        assert_eq!(rules[1], Rule::min_length(2).with_message("Too short"));
        assert_eq!(serde_json::to_value(&rules[2]).unwrap()["type"], "oneOf");
    }
}

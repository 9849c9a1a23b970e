//! Filter persistence in URL query parameters.
//!
//! Each non-empty entry becomes `{field}_op=<operator>` plus either
//! `{field}=<value>` or one `{field}[]=<value>` per array element. Parsing
//! goes back through the schema so values regain their declared types.

use super::{
    operator::{FilterFieldType, Operator},
    schema::{FilterFieldDef, FilterSchema},
    state::{FilterItem, FilterState},
};
use crate::value::{display_value, is_empty, parse_date, parse_number, to_iso_string};
use serde_json::Value;
use url::form_urlencoded;

/// Ordered multimap of query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParams(Vec<(String, String)>);

impl UrlParams {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse an `application/x-www-form-urlencoded` string. A leading `?`
    /// is ignored.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self(form_urlencoded::parse(query.as_bytes()).into_owned().collect())
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.0)
            .finish()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Serialize the non-empty entries of a filter state.
pub fn to_url_params(state: &FilterState) -> UrlParams {
    let mut params = UrlParams::new();
    for (field, item) in state.iter().filter(|(_, item)| !is_empty(&item.value)) {
        params.append(format!("{field}_op"), item.operator.as_str());
        match &item.value {
            Value::Array(values) => {
                for value in values {
                    params.append(format!("{field}[]"), display_value(value));
                }
            }
            value => params.append(field, display_value(value)),
        }
    }
    params
}

/// Rebuild a filter state from URL parameters.
///
/// Fields are visited in schema order. A field is left out when its operator
/// parameter is missing or unknown, or when its value cannot be read as the
/// field's type.
pub fn from_url_params(params: &UrlParams, schema: &FilterSchema) -> FilterState {
    let mut state = FilterState::new();

    for (name, field) in schema.iter() {
        let Some(token) = params.get(&format!("{name}_op")) else {
            continue;
        };
        let operator = match token.parse::<Operator>() {
            Ok(operator) => operator,
            Err(e) => {
                tracing::warn!(field = name, "dropping filter parameter: {}", e);
                continue;
            }
        };

        let list = params.get_all(&format!("{name}[]"));
        let value = if !list.is_empty() {
            Some(Value::Array(
                list.into_iter()
                    .filter_map(|raw| coerce(field, raw))
                    .collect(),
            ))
        } else {
            params.get(name).and_then(|raw| coerce(field, raw))
        };

        match value {
            Some(value) => {
                state.insert(name, FilterItem { value, operator });
            }
            None => {
                tracing::warn!(field = name, "dropping filter parameter: unreadable value");
            }
        }
    }
    state
}

fn coerce(field: &FilterFieldDef, raw: &str) -> Option<Value> {
    match field.field_type {
        FilterFieldType::Number => parse_number(raw),
        FilterFieldType::Boolean | FilterFieldType::Checkbox => Some(Value::Bool(raw == "true")),
        FilterFieldType::Date | FilterFieldType::Datetime => {
            parse_date(raw).map(|dt| Value::String(to_iso_string(&dt)))
        }
        t if t.has_options() => Some(
            field
                .option_value(raw)
                .cloned()
                .unwrap_or_else(|| Value::String(raw.to_string())),
        ),
        _ => Some(Value::String(raw.to_string())),
    }
}

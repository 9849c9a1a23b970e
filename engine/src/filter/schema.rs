//! Filter schema: the fields a filter builder offers.

use super::operator::{FilterFieldType, Operator};
use crate::{error::Result, schema::FieldOption, Error};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extra constraints checked by [`validate_filter_state`](super::validate_filter_state).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Definition of one filter field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterFieldDef {
    #[serde(rename = "type")]
    pub field_type: FilterFieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_operator: Option<Operator>,
    /// Restricts the operator picker; must be a subset of the type's operators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_operators: Option<Vec<Operator>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FilterValidation>,
}

impl FilterFieldDef {
    pub fn new(field_type: FilterFieldType, label: impl Into<String>) -> Self {
        Self {
            field_type,
            label: label.into(),
            placeholder: None,
            default_value: None,
            default_operator: None,
            available_operators: None,
            options: Vec::new(),
            required: false,
            validation: None,
        }
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn default_operator(mut self, operator: Operator) -> Self {
        self.default_operator = Some(operator);
        self
    }

    pub fn available_operators(mut self, operators: Vec<Operator>) -> Self {
        self.available_operators = Some(operators);
        self
    }

    pub fn options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn validation(mut self, validation: FilterValidation) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Operator used by a fresh entry.
    pub fn initial_operator(&self) -> Operator {
        self.default_operator
            .unwrap_or_else(|| self.field_type.default_operator())
    }

    /// Operators offered to the user, in display order.
    pub fn operators(&self) -> Vec<Operator> {
        match &self.available_operators {
            Some(ops) => ops.clone(),
            None => self.field_type.operators().to_vec(),
        }
    }

    /// Value of a fresh entry.
    pub fn initial_value(&self) -> Value {
        self.default_value
            .clone()
            .unwrap_or_else(|| self.field_type.default_value())
    }

    /// Find the declared option whose string form is `raw`.
    pub fn option_value(&self, raw: &str) -> Option<&Value> {
        self.options
            .iter()
            .map(|o| &o.value)
            .find(|v| crate::value::display_value(v) == raw)
    }

    fn check(&self, name: &str) -> Result<()> {
        let declared = self
            .default_operator
            .iter()
            .chain(self.available_operators.iter().flatten());
        for operator in declared {
            if !self.field_type.supports(*operator) {
                return Err(Error::IncompatibleOperator {
                    field: name.to_string(),
                    operator: operator.to_string(),
                    field_type: self.field_type.to_string(),
                });
            }
        }
        if let Some(pattern) = self.validation.as_ref().and_then(|v| v.pattern.as_deref()) {
            Regex::new(pattern).map_err(|e| Error::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

/// Filter fields keyed by name, in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSchema(IndexMap<String, FilterFieldDef>);

impl FilterSchema {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Builder-style method to add a field.
    pub fn with_field(mut self, name: impl Into<String>, field: FilterFieldDef) -> Self {
        self.0.insert(name.into(), field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FilterFieldDef> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterFieldDef)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject operators outside a field's compatibility row and malformed
    /// validation patterns.
    pub fn check(&self) -> Result<()> {
        self.iter().try_for_each(|(name, field)| field.check(name))
    }
}

impl FromIterator<(String, FilterFieldDef)> for FilterSchema {
    fn from_iter<I: IntoIterator<Item = (String, FilterFieldDef)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

//! Filter operators and the type → operator compatibility table.

use crate::{error::Result, Error};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Comparison semantics of a filter entry, spelled as query operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "$eq")]
    Eq,
    #[serde(rename = "$ne")]
    Ne,
    #[serde(rename = "$gt")]
    Gt,
    #[serde(rename = "$gte")]
    Gte,
    #[serde(rename = "$lt")]
    Lt,
    #[serde(rename = "$lte")]
    Lte,
    #[serde(rename = "$in")]
    In,
    #[serde(rename = "$nin")]
    Nin,
    #[serde(rename = "$exists")]
    Exists,
    #[serde(rename = "$regex")]
    Regex,
    #[serde(rename = "$startsWith")]
    StartsWith,
    #[serde(rename = "$endsWith")]
    EndsWith,
    #[serde(rename = "$contains")]
    Contains,
}

impl Operator {
    pub const ALL: [Operator; 13] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::In,
        Operator::Nin,
        Operator::Exists,
        Operator::Regex,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::Contains,
    ];

    /// The wire token, e.g. `$gte`.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::Exists => "$exists",
            Operator::Regex => "$regex",
            Operator::StartsWith => "$startsWith",
            Operator::EndsWith => "$endsWith",
            Operator::Contains => "$contains",
        }
    }

    /// Human-readable label for operator pickers.
    pub fn label(self) -> &'static str {
        match self {
            Operator::Eq => "Equals",
            Operator::Ne => "Not Equal",
            Operator::Gt => "Greater Than",
            Operator::Gte => "Greater Than or Equal",
            Operator::Lt => "Less Than",
            Operator::Lte => "Less Than or Equal",
            Operator::In => "Includes Any",
            Operator::Nin => "Excludes All",
            Operator::Exists => "Exists",
            Operator::Regex => "Matches Pattern",
            Operator::StartsWith => "Starts With",
            Operator::EndsWith => "Ends With",
            Operator::Contains => "Contains",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| Error::UnknownOperator(s.to_string()))
    }
}

/// Input type of a filter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterFieldType {
    Text,
    Number,
    Date,
    Datetime,
    Checkbox,
    Radio,
    Select,
    Multiselect,
    Boolean,
}

impl FilterFieldType {
    /// Operators compatible with this type; the first one is the default.
    pub fn operators(self) -> &'static [Operator] {
        use Operator::*;
        match self {
            FilterFieldType::Text => &[Eq, Ne, Regex, StartsWith, EndsWith, Contains],
            FilterFieldType::Number | FilterFieldType::Date | FilterFieldType::Datetime => {
                &[Eq, Ne, Gt, Gte, Lt, Lte]
            }
            FilterFieldType::Checkbox | FilterFieldType::Boolean => &[Eq],
            FilterFieldType::Radio | FilterFieldType::Select => &[Eq, Ne],
            FilterFieldType::Multiselect => &[In, Nin],
        }
    }

    pub fn default_operator(self) -> Operator {
        self.operators()[0]
    }

    pub fn supports(self, operator: Operator) -> bool {
        self.operators().contains(&operator)
    }

    /// Value of a fresh entry when the field declares no default.
    pub fn default_value(self) -> Value {
        match self {
            FilterFieldType::Multiselect => Value::Array(Vec::new()),
            FilterFieldType::Boolean => Value::Bool(false),
            FilterFieldType::Number => Value::from(0),
            _ => Value::String(String::new()),
        }
    }

    /// Whether values of this type are picked from declared options.
    pub fn has_options(self) -> bool {
        matches!(
            self,
            FilterFieldType::Radio | FilterFieldType::Select | FilterFieldType::Multiselect
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterFieldType::Text => "text",
            FilterFieldType::Number => "number",
            FilterFieldType::Date => "date",
            FilterFieldType::Datetime => "datetime",
            FilterFieldType::Checkbox => "checkbox",
            FilterFieldType::Radio => "radio",
            FilterFieldType::Select => "select",
            FilterFieldType::Multiselect => "multiselect",
            FilterFieldType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for FilterFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use super::{schema::FilterSchema, state::FilterState};
use crate::{
    validation::FieldErrors,
    value::{format_f64, is_empty},
};
use regex::Regex;
use serde_json::Value;

/// Check a filter state against its schema.
///
/// Every schema field is checked on its own; the returned errors are keyed
/// by field name. Optional fields without a value are skipped.
pub fn validate_filter_state(
    state: &FilterState,
    schema: &FilterSchema,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    for (name, field) in schema.iter() {
        let item = state.get(name).filter(|item| !is_empty(&item.value));
        let Some(item) = item else {
            if field.required {
                errors.insert(name, format!("{} is required", field.label));
            }
            continue;
        };

        // Later checks take precedence over earlier ones.
        let mut message = None;
        if let Some(rules) = &field.validation {
            match &item.value {
                Value::Number(n) => {
                    let n = n.as_f64().unwrap_or_default();
                    if let Some(min) = rules.min.filter(|min| n < *min) {
                        message = Some(format!("{} must be at least {}", field.label, format_f64(min)));
                    }
                    if let Some(max) = rules.max.filter(|max| n > *max) {
                        message = Some(format!("{} must be at most {}", field.label, format_f64(max)));
                    }
                }
                Value::String(s) => {
                    let matches = rules
                        .pattern
                        .as_deref()
                        .and_then(|p| Regex::new(p).ok())
                        .map_or(true, |re| re.is_match(s));
                    if !matches {
                        message = Some(
                            rules
                                .error_message
                                .clone()
                                .unwrap_or_else(|| format!("{} is invalid", field.label)),
                        );
                    }
                }
                _ => {}
            }
        }
        if let Some(allowed) = &field.available_operators {
            if !allowed.contains(&item.operator) {
                message = Some(format!("Invalid operator for {}", field.label));
            }
        }

        if let Some(message) = message {
            errors.insert(name, message);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

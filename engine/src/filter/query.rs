//! Translation of filter state into a document-store query object.

use super::{operator::Operator, state::FilterState};
use crate::value::{display_value, is_empty, is_truthy};
use serde_json::{json, Map, Value};

/// Build the query object for a filter state.
///
/// Entries whose value is null, `""` or `[]` are left out entirely.
pub fn to_query(state: &FilterState) -> Map<String, Value> {
    state
        .iter()
        .filter(|(_, item)| !is_empty(&item.value))
        .map(|(field, item)| (field.to_string(), predicate(item.operator, &item.value)))
        .collect()
}

fn predicate(operator: Operator, value: &Value) -> Value {
    let op = operator.as_str();
    match operator {
        Operator::Eq => value.clone(),
        Operator::Ne | Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            json!({ op: value })
        }
        Operator::In | Operator::Nin => {
            let items = match value {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            json!({ op: items })
        }
        Operator::Exists => json!({ "$exists": is_truthy(value) }),
        Operator::Regex => json!({ "$regex": value, "$options": "i" }),
        Operator::StartsWith => regex_query(format!("^{}", escape_regex(&display_value(value)))),
        Operator::EndsWith => regex_query(format!("{}$", escape_regex(&display_value(value)))),
        Operator::Contains => regex_query(escape_regex(&display_value(value))),
    }
}

fn regex_query(pattern: String) -> Value {
    json!({ "$regex": pattern, "$options": "i" })
}

/// Escape regex metacharacters so `raw` matches literally.
pub fn escape_regex(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(
            c,
            '.' | '*' | '+' | '?' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterItem;

    fn state(entries: &[(&str, Value, Operator)]) -> FilterState {
        entries
            .iter()
            .map(|(f, v, op)| (f.to_string(), FilterItem::new(v.clone(), *op)))
            .collect()
    }

    #[test]
    fn operator_translation() {
        let query = to_query(&state(&[
            ("status", json!("active"), Operator::Eq),
            ("age", json!(18), Operator::Gte),
            ("role", json!("guest"), Operator::Ne),
            ("tags", json!("a"), Operator::In),
            ("ids", json!([1, 2]), Operator::Nin),
            ("avatar", json!("yes"), Operator::Exists),
            ("code", json!("^A\\d+"), Operator::Regex),
        ]));

        assert_eq!(
            Value::Object(query),
            json!({
                "status": "active",
                "age": {"$gte": 18},
                "role": {"$ne": "guest"},
                "tags": {"$in": ["a"]},
                "ids": {"$nin": [1, 2]},
                "avatar": {"$exists": true},
                "code": {"$regex": "^A\\d+", "$options": "i"}
            })
        );
    }

    #[test]
    fn text_matchers_escape_input() {
        let query = to_query(&state(&[
            ("a", json!("a.b"), Operator::StartsWith),
            ("b", json!("(x)"), Operator::EndsWith),
            ("c", json!("1+1"), Operator::Contains),
        ]));
        assert_eq!(query["a"], json!({"$regex": "^a\\.b", "$options": "i"}));
        assert_eq!(query["b"], json!({"$regex": "\\(x\\)$", "$options": "i"}));
        assert_eq!(query["c"], json!({"$regex": "1\\+1", "$options": "i"}));
    }

    #[test]
    fn empty_values_are_omitted() {
        let query = to_query(&state(&[
            ("a", Value::Null, Operator::Eq),
            ("b", json!(""), Operator::Contains),
            ("c", json!([]), Operator::In),
            ("d", json!(0), Operator::Eq),
            ("e", json!(false), Operator::Eq),
        ]));
        assert_eq!(Value::Object(query), json!({"d": 0, "e": false}));
    }
}

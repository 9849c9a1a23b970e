//! Filter state and its store.

use super::{operator::Operator, schema::FilterSchema};
use crate::{
    error::Result,
    store::{Store, SubscriptionId},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field's filter: a value and how to compare against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterItem {
    pub value: Value,
    pub operator: Operator,
}

impl FilterItem {
    pub fn new(value: impl Into<Value>, operator: Operator) -> Self {
        Self {
            value: value.into(),
            operator,
        }
    }

    /// Whether this entry means "no filter".
    pub fn is_empty(&self) -> bool {
        crate::value::is_empty(&self.value)
    }
}

/// Filter entries keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState(IndexMap<String, FilterItem>);

impl FilterState {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn get(&self, field: &str) -> Option<&FilterItem> {
        self.0.get(field)
    }

    /// Replace the entry for `field`.
    pub fn insert(&mut self, field: impl Into<String>, item: FilterItem) -> Option<FilterItem> {
        self.0.insert(field.into(), item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterItem)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries that actually filter something.
    pub fn active_count(&self) -> usize {
        self.0.values().filter(|item| !item.is_empty()).count()
    }
}

impl FromIterator<(String, FilterItem)> for FilterState {
    fn from_iter<I: IntoIterator<Item = (String, FilterItem)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Derive the starting state of every schema field.
pub fn initial_state(schema: &FilterSchema) -> FilterState {
    schema
        .iter()
        .map(|(name, field)| {
            (
                name.to_string(),
                FilterItem::new(field.initial_value(), field.initial_operator()),
            )
        })
        .collect()
}

/// Holds the filter state for one filter builder.
///
/// `update` and `reset` are the only ways to change the state; each notifies
/// subscribers exactly once.
#[derive(Debug)]
pub struct FilterStore {
    schema: FilterSchema,
    store: Store<FilterState>,
}

impl FilterStore {
    /// Create a store. A provided state is used as-is; otherwise the state
    /// is derived from the schema.
    pub fn new(schema: FilterSchema, provided: Option<FilterState>) -> Result<Self> {
        schema.check()?;
        let state = provided.unwrap_or_else(|| initial_state(&schema));
        Ok(Self {
            schema,
            store: Store::new(state),
        })
    }

    pub fn schema(&self) -> &FilterSchema {
        &self.schema
    }

    pub fn state(&self) -> &FilterState {
        self.store.state()
    }

    /// Replace the entry for `field` in full.
    ///
    /// Unknown fields and operators the field's type does not support are
    /// stored as given and logged at warn level.
    pub fn update(&mut self, field: &str, value: impl Into<Value>, operator: Operator) {
        match self.schema.get(field) {
            None => tracing::warn!(field, "filter update for a field outside the schema"),
            Some(def) if !def.field_type.supports(operator) => tracing::warn!(
                field,
                operator = %operator,
                field_type = def.field_type.as_str(),
                "operator not supported by field type"
            ),
            Some(_) => {}
        }
        let item = FilterItem::new(value, operator);
        tracing::debug!(field, operator = %operator, "filter updated");
        self.store.update(|state| {
            state.insert(field, item);
        });
    }

    /// Restore the schema-derived state.
    pub fn reset(&mut self) {
        let fresh = initial_state(&self.schema);
        tracing::debug!(fields = fresh.len(), "filters reset");
        self.store.replace(fresh);
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&FilterState) + Send + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Query object for the current state.
    pub fn to_query(&self) -> serde_json::Map<String, Value> {
        super::to_query(self.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterFieldDef, FilterFieldType};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn schema() -> FilterSchema {
        FilterSchema::new()
            .with_field("q", FilterFieldDef::new(FilterFieldType::Text, "Search"))
            .with_field("age", FilterFieldDef::new(FilterFieldType::Number, "Age"))
            .with_field("tags", FilterFieldDef::new(FilterFieldType::Multiselect, "Tags"))
            .with_field(
                "active",
                FilterFieldDef::new(FilterFieldType::Boolean, "Active").default_value(true),
            )
    }

    #[test]
    fn initial_state_from_schema() {
        let state = initial_state(&schema());
        assert_eq!(state.get("q"), Some(&FilterItem::new("", Operator::Eq)));
        assert_eq!(state.get("age"), Some(&FilterItem::new(0, Operator::Eq)));
        assert_eq!(state.get("tags"), Some(&FilterItem::new(json!([]), Operator::In)));
        assert_eq!(state.get("active"), Some(&FilterItem::new(true, Operator::Eq)));
        assert_eq!(state.active_count(), 2);
    }

    #[test]
    fn provided_state_is_used_as_is() {
        let provided: FilterState = [("q".to_string(), FilterItem::new("x", Operator::Ne))]
            .into_iter()
            .collect();
        let store = FilterStore::new(schema(), Some(provided.clone())).unwrap();
        assert_eq!(store.state(), &provided);
    }

    #[test]
    fn update_and_reset_notify_once_each() {
        let notifications = Arc::new(Mutex::new(0));
        let mut store = FilterStore::new(schema(), None).unwrap();
        let n = notifications.clone();
        store.subscribe(move |_| *n.lock().unwrap() += 1);

        store.update("q", "jane", Operator::Contains);
        assert_eq!(*notifications.lock().unwrap(), 1);
        assert_eq!(
            store.state().get("q"),
            Some(&FilterItem::new("jane", Operator::Contains))
        );

        store.reset();
        assert_eq!(*notifications.lock().unwrap(), 2);
        assert_eq!(store.state(), &initial_state(store.schema()));
    }

    #[test]
    fn mismatched_update_is_stored_as_given() {
        let notifications = Arc::new(Mutex::new(0));
        let mut store = FilterStore::new(schema(), None).unwrap();
        let n = notifications.clone();
        store.subscribe(move |_| *n.lock().unwrap() += 1);

        store.update("active", "x", Operator::StartsWith);
        store.update("missing", 1, Operator::Eq);

        assert_eq!(*notifications.lock().unwrap(), 2);
        assert_eq!(
            store.state().get("active"),
            Some(&FilterItem::new("x", Operator::StartsWith))
        );
        assert_eq!(store.state().get("missing"), Some(&FilterItem::new(1, Operator::Eq)));
    }
}

//! Column definitions and row access.

use super::SortDirection;
use crate::value::display_value;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A table row whose fields can be looked up by key.
pub trait Row {
    /// Value of the field named `key`, if the row has one.
    fn field(&self, key: &str) -> Option<Value>;
}

impl Row for Value {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl Row for Map<String, Value> {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

pub type AccessorFn<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
pub type CellFn<T> = Arc<dyn Fn(&T, &Value) -> String + Send + Sync>;
pub type SortFn<T> = Arc<dyn Fn(&T, &T, SortDirection) -> Ordering + Send + Sync>;
pub type FilterFn<T> = Arc<dyn Fn(&T, &str) -> bool + Send + Sync>;

/// How a column reads its raw value from a row.
#[derive(Clone)]
pub enum Accessor<T> {
    /// Key lookup through [`Row::field`]
    Key(String),
    /// Computed from the whole row
    Fn(AccessorFn<T>),
    /// Display-only column; its value is always null
    None,
}

impl<T> fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Accessor::Fn(_) => f.write_str("Fn(..)"),
            Accessor::None => f.write_str("None"),
        }
    }
}

/// Definition of one table column.
#[derive(Clone)]
pub struct ColumnDef<T> {
    pub id: String,
    pub header: String,
    pub accessor: Accessor<T>,
    pub cell: Option<CellFn<T>>,
    pub sort_fn: Option<SortFn<T>>,
    pub filter_fn: Option<FilterFn<T>>,
    /// Falls back to the table setting when unset
    pub enable_sorting: Option<bool>,
    /// Falls back to the table setting when unset
    pub enable_filter: Option<bool>,
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,
}

impl<T: Row> ColumnDef<T> {
    /// Column without an accessor.
    pub fn new(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            accessor: Accessor::None,
            cell: None,
            sort_fn: None,
            filter_fn: None,
            enable_sorting: None,
            enable_filter: None,
            min_width: None,
            max_width: None,
        }
    }

    /// Column reading the row field with the same name as its id.
    pub fn key(id: impl Into<String>, header: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), header).accessor_key(id)
    }

    pub fn accessor_key(mut self, key: impl Into<String>) -> Self {
        self.accessor = Accessor::Key(key.into());
        self
    }

    pub fn accessor_fn(mut self, f: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        self.accessor = Accessor::Fn(Arc::new(f));
        self
    }

    /// Custom cell text, given the row and the resolved value.
    pub fn cell(mut self, f: impl Fn(&T, &Value) -> String + Send + Sync + 'static) -> Self {
        self.cell = Some(Arc::new(f));
        self
    }

    /// Custom comparator. It receives the active direction and its result is
    /// used as-is, so it must apply the direction itself.
    pub fn sort_fn(
        mut self,
        f: impl Fn(&T, &T, SortDirection) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.sort_fn = Some(Arc::new(f));
        self
    }

    pub fn filter_fn(mut self, f: impl Fn(&T, &str) -> bool + Send + Sync + 'static) -> Self {
        self.filter_fn = Some(Arc::new(f));
        self
    }

    pub fn sortable(mut self, enabled: bool) -> Self {
        self.enable_sorting = Some(enabled);
        self
    }

    pub fn filterable(mut self, enabled: bool) -> Self {
        self.enable_filter = Some(enabled);
        self
    }

    pub fn min_width(mut self, px: u32) -> Self {
        self.min_width = Some(px);
        self
    }

    pub fn max_width(mut self, px: u32) -> Self {
        self.max_width = Some(px);
        self
    }

    /// Raw value of this column for `row`; null when there is none.
    pub fn resolve(&self, row: &T) -> Value {
        match &self.accessor {
            Accessor::Key(key) => row.field(key).unwrap_or(Value::Null),
            Accessor::Fn(f) => f(row),
            Accessor::None => Value::Null,
        }
    }

    /// Cell text: the custom renderer if set, else the value's display form.
    pub fn render(&self, row: &T) -> String {
        let value = self.resolve(row);
        match &self.cell {
            Some(cell) => cell(row, &value),
            None => display_value(&value),
        }
    }

    /// Whether the column matches a per-column filter string.
    pub fn matches(&self, row: &T, query: &str) -> bool {
        if let Some(filter) = &self.filter_fn {
            return filter(row, query);
        }
        contains_ignore_case(&self.resolve(row), query)
    }

    pub fn is_sortable(&self, table_default: bool) -> bool {
        self.enable_sorting.unwrap_or(table_default)
    }

    pub fn is_filterable(&self, table_default: bool) -> bool {
        self.enable_filter.unwrap_or(table_default)
    }
}

/// Case-insensitive substring test on a value's display form. Null never
/// matches.
pub(crate) fn contains_ignore_case(value: &Value, query: &str) -> bool {
    if value.is_null() {
        return false;
    }
    display_value(value)
        .to_lowercase()
        .contains(&query.to_lowercase())
}

impl<T> fmt::Debug for ColumnDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("accessor", &self.accessor)
            .field("cell", &self.cell.is_some())
            .field("sort_fn", &self.sort_fn.is_some())
            .field("filter_fn", &self.filter_fn.is_some())
            .field("enable_sorting", &self.enable_sorting)
            .field("enable_filter", &self.enable_filter)
            .finish()
    }
}

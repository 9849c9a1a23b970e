//! The table engine: state, handlers and the sort → filter → paginate
//! pipeline.

use super::{
    column::{contains_ignore_case, ColumnDef, Row},
    compare::compare_values,
    pagination::{page_numbers, PageItem},
};
use crate::{
    error::Result,
    store::{Listeners, SubscriptionId},
    Error,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Sort direction of the active column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
    #[default]
    #[serde(rename = "none")]
    Unsorted,
}

impl SortDirection {
    /// Next direction when the same header is activated again.
    pub fn cycle(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Unsorted,
            SortDirection::Unsorted => SortDirection::Asc,
        }
    }
}

/// Table behavior switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableOptions {
    pub enable_pagination: bool,
    pub page_size: usize,
    pub enable_row_selection: bool,
    pub enable_filtering: bool,
    pub enable_global_filter: bool,
    pub enable_sorting: bool,
    pub initial_sort_column: Option<String>,
    pub initial_sort_direction: SortDirection,
    /// Rows arrive sorted; sort changes are only reported
    pub manual_sorting: bool,
    /// Rows arrive filtered; filter changes are only reported
    pub manual_filtering: bool,
    /// Rows arrive as one page; `total_items` drives the page count
    pub manual_pagination: bool,
    pub total_items: Option<usize>,
    pub no_data_message: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            enable_pagination: true,
            page_size: 10,
            enable_row_selection: false,
            enable_filtering: true,
            enable_global_filter: true,
            enable_sorting: true,
            initial_sort_column: None,
            initial_sort_direction: SortDirection::Unsorted,
            manual_sorting: false,
            manual_filtering: false,
            manual_pagination: false,
            total_items: None,
            no_data_message: "No data available".to_string(),
        }
    }
}

/// Interactive state of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableState {
    /// 1-based
    pub current_page: usize,
    pub sort_column: Option<String>,
    pub sort_direction: SortDirection,
    pub filter_values: IndexMap<String, String>,
    pub global_filter: String,
    pub selected_rows: BTreeMap<String, bool>,
}

/// Notifications emitted by table handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TableEvent {
    PageChange {
        page: usize,
    },
    SortChange {
        column: String,
        direction: SortDirection,
    },
    /// Only emitted under manual filtering
    FilterChange {
        filter_values: IndexMap<String, String>,
        global_filter: String,
    },
    RowClick {
        key: String,
        source_index: usize,
    },
}

/// Header cell of a [`TableView`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderView {
    pub id: String,
    pub header: String,
    pub sortable: bool,
    pub filterable: bool,
    /// Set only on the active sort column
    pub sort_direction: Option<SortDirection>,
    pub filter_value: String,
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,
}

/// Displayed row of a [`TableView`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView<'a, T> {
    /// `row-{display index}`
    pub key: String,
    /// Position in the table's data
    pub source_index: usize,
    pub selected: bool,
    pub cells: Vec<String>,
    #[serde(skip)]
    pub row: &'a T,
}

/// Everything needed to draw the table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView<'a, T> {
    pub headers: Vec<HeaderView>,
    pub rows: Vec<RowView<'a, T>>,
    pub current_page: usize,
    pub total_pages: usize,
    pub page_items: Vec<PageItem>,
    pub global_filter: String,
    /// Set when the page has no rows
    pub no_data_message: Option<String>,
}

fn row_key(display_index: usize) -> String {
    format!("row-{display_index}")
}

/// A table over rows of type `T`.
pub struct Table<T = Value> {
    columns: Vec<ColumnDef<T>>,
    data: Vec<T>,
    options: TableOptions,
    state: TableState,
    listeners: Listeners<TableEvent>,
}

impl<T: Row> Table<T> {
    /// Create a table. Column ids must be unique.
    pub fn new(columns: Vec<ColumnDef<T>>, data: Vec<T>, options: TableOptions) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.id.as_str()) {
                return Err(Error::DuplicateColumn(column.id.clone()));
            }
        }
        if let Some(id) = &options.initial_sort_column {
            if !seen.contains(id.as_str()) {
                return Err(Error::UnknownColumn(id.clone()));
            }
        }

        let state = TableState {
            current_page: 1,
            sort_column: options.initial_sort_column.clone(),
            sort_direction: options.initial_sort_direction,
            filter_values: IndexMap::new(),
            global_filter: String::new(),
            selected_rows: BTreeMap::new(),
        };
        Ok(Self {
            columns,
            data,
            options,
            state,
            listeners: Listeners::new(),
        })
    }

    pub fn columns(&self) -> &[ColumnDef<T>] {
        &self.columns
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TableEvent) + Send + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn column(&self, id: &str) -> Option<&ColumnDef<T>> {
        self.columns.iter().find(|c| c.id == id)
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// Source indices after the sort stage.
    fn sorted(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.data.len()).collect();
        let direction = self.state.sort_direction;
        if self.options.manual_sorting
            || !self.options.enable_sorting
            || direction == SortDirection::Unsorted
        {
            return order;
        }
        let Some(column) = self.state.sort_column.as_deref().and_then(|id| self.column(id)) else {
            return order;
        };

        if let Some(sort_fn) = &column.sort_fn {
            order.sort_by(|&a, &b| sort_fn(&self.data[a], &self.data[b], direction));
        } else {
            let keys: Vec<Value> = self.data.iter().map(|row| column.resolve(row)).collect();
            order.sort_by(|&a, &b| {
                let ord = compare_values(&keys[a], &keys[b]);
                match direction {
                    SortDirection::Desc => ord.reverse(),
                    _ => ord,
                }
            });
        }
        order
    }

    /// Source indices after the sort and filter stages.
    fn filtered(&self) -> Vec<usize> {
        let order = self.sorted();
        if !self.options.enable_filtering || self.options.manual_filtering {
            return order;
        }

        let active: Vec<(&ColumnDef<T>, &str)> = self
            .state
            .filter_values
            .iter()
            .filter(|(_, query)| !query.is_empty())
            .filter_map(|(id, query)| self.column(id).map(|c| (c, query.as_str())))
            .collect();
        let global = self.options.enable_global_filter && !self.state.global_filter.is_empty();

        order
            .into_iter()
            .filter(|&i| {
                let row = &self.data[i];
                active.iter().all(|(column, query)| column.matches(row, query))
                    && (!global
                        || self.columns.iter().any(|column| {
                            contains_ignore_case(&column.resolve(row), &self.state.global_filter)
                        }))
            })
            .collect()
    }

    /// Source indices of the rows on the current page.
    fn page(&self) -> (Vec<usize>, usize) {
        let rows = self.filtered();
        let total_pages = self.pages_for(rows.len());
        if !self.options.enable_pagination || self.options.manual_pagination {
            return (rows, total_pages);
        }
        let size = self.page_size();
        let start = (self.state.current_page.max(1) - 1).saturating_mul(size);
        let page = rows.into_iter().skip(start).take(size).collect();
        (page, total_pages)
    }

    fn page_size(&self) -> usize {
        self.options.page_size.max(1)
    }

    fn pages_for(&self, filtered_rows: usize) -> usize {
        let n = if self.options.manual_pagination {
            self.options.total_items.unwrap_or(filtered_rows)
        } else {
            filtered_rows
        };
        n.div_ceil(self.page_size())
    }

    /// Number of pages for the current data and filters.
    pub fn total_pages(&self) -> usize {
        self.pages_for(self.filtered().len())
    }

    /// Rows surviving the sort and filter stages, in display order.
    pub fn processed_rows(&self) -> Vec<&T> {
        self.filtered().into_iter().map(|i| &self.data[i]).collect()
    }

    /// Rows of the current page, in display order.
    pub fn page_rows(&self) -> Vec<&T> {
        self.page().0.into_iter().map(|i| &self.data[i]).collect()
    }

    pub fn page_items(&self) -> Vec<PageItem> {
        page_numbers(self.state.current_page, self.total_pages())
    }

    /// Render the current page.
    pub fn view(&self) -> TableView<'_, T> {
        let (page, total_pages) = self.page();

        let headers = self
            .columns
            .iter()
            .map(|column| HeaderView {
                id: column.id.clone(),
                header: column.header.clone(),
                sortable: column.is_sortable(self.options.enable_sorting),
                filterable: column.is_filterable(self.options.enable_filtering),
                sort_direction: (self.state.sort_column.as_deref() == Some(column.id.as_str())
                    && self.state.sort_direction != SortDirection::Unsorted)
                    .then_some(self.state.sort_direction),
                filter_value: self
                    .state
                    .filter_values
                    .get(&column.id)
                    .cloned()
                    .unwrap_or_default(),
                min_width: column.min_width,
                max_width: column.max_width,
            })
            .collect();

        let rows: Vec<RowView<'_, T>> = page
            .into_iter()
            .enumerate()
            .map(|(display_index, source_index)| {
                let key = row_key(display_index);
                let row = &self.data[source_index];
                RowView {
                    selected: self.state.selected_rows.get(&key).copied().unwrap_or(false),
                    key,
                    source_index,
                    cells: self.columns.iter().map(|c| c.render(row)).collect(),
                    row,
                }
            })
            .collect();

        TableView {
            headers,
            no_data_message: rows
                .is_empty()
                .then(|| self.options.no_data_message.clone()),
            rows,
            current_page: self.state.current_page,
            total_pages,
            page_items: page_numbers(self.state.current_page, total_pages),
            global_filter: self.state.global_filter.clone(),
        }
    }

    // ========================================================================
    // Handlers
    // ========================================================================

    /// Activate a column header: asc → desc → unsorted on the same column,
    /// asc on a different one. Non-sortable columns are ignored.
    pub fn toggle_sort(&mut self, column_id: &str) -> Result<()> {
        let column = self
            .column(column_id)
            .ok_or_else(|| Error::UnknownColumn(column_id.to_string()))?;
        if !column.is_sortable(self.options.enable_sorting) {
            tracing::debug!(column = column_id, "sort ignored for non-sortable column");
            return Ok(());
        }

        let direction = if self.state.sort_column.as_deref() == Some(column_id) {
            self.state.sort_direction.cycle()
        } else {
            SortDirection::Asc
        };
        self.state.sort_column =
            (direction != SortDirection::Unsorted).then(|| column_id.to_string());
        self.state.sort_direction = direction;
        tracing::debug!(column = column_id, ?direction, "sort changed");

        self.listeners.emit(&TableEvent::SortChange {
            column: column_id.to_string(),
            direction,
        });
        Ok(())
    }

    /// Set or clear (with `""`) one column's filter.
    pub fn set_column_filter(&mut self, column_id: &str, value: impl Into<String>) {
        self.state
            .filter_values
            .insert(column_id.to_string(), value.into());
        self.filters_changed();
    }

    pub fn set_global_filter(&mut self, value: impl Into<String>) {
        self.state.global_filter = value.into();
        self.filters_changed();
    }

    pub fn clear_filters(&mut self) {
        self.state.filter_values.clear();
        self.state.global_filter.clear();
        self.filters_changed();
    }

    fn filters_changed(&mut self) {
        self.state.current_page = 1;
        self.listeners.emit(&TableEvent::PageChange { page: 1 });
        if self.options.manual_filtering {
            self.listeners.emit(&TableEvent::FilterChange {
                filter_values: self.state.filter_values.clone(),
                global_filter: self.state.global_filter.clone(),
            });
        }
    }

    /// Go to `page`. Pages outside `1..=total_pages` fall back to page 1.
    pub fn set_page(&mut self, page: usize) {
        let total = self.total_pages();
        let page = if page < 1 || (total > 0 && page > total) {
            tracing::debug!(requested = page, total, "page out of range, using page 1");
            1
        } else {
            page
        };
        self.state.current_page = page;
        self.listeners.emit(&TableEvent::PageChange { page });
    }

    pub fn next_page(&mut self) {
        if self.state.current_page < self.total_pages() {
            self.set_page(self.state.current_page + 1);
        }
    }

    pub fn previous_page(&mut self) {
        if self.state.current_page > 1 {
            self.set_page(self.state.current_page - 1);
        }
    }

    /// Replace the rows.
    pub fn set_data(&mut self, data: Vec<T>) {
        self.data = data;
        self.clamp_page();
    }

    /// Update the externally known row count used by manual pagination.
    pub fn set_total_items(&mut self, total_items: Option<usize>) {
        self.options.total_items = total_items;
        self.clamp_page();
    }

    fn clamp_page(&mut self) {
        let total = self.total_pages();
        if total > 0 && self.state.current_page > total {
            self.state.current_page = 1;
            self.listeners.emit(&TableEvent::PageChange { page: 1 });
        }
    }

    /// Click the row at `display_index` on the current page.
    ///
    /// Toggles its selection when row selection is enabled and reports the
    /// click either way.
    pub fn click_row(&mut self, display_index: usize) -> Result<()> {
        let (page, _) = self.page();
        let source_index = *page.get(display_index).ok_or(Error::IndexOutOfBounds {
            path: "rows".into(),
            index: display_index,
            len: page.len(),
        })?;

        let key = row_key(display_index);
        if self.options.enable_row_selection {
            let selected = self.state.selected_rows.entry(key.clone()).or_insert(false);
            *selected = !*selected;
        }
        self.listeners.emit(&TableEvent::RowClick { key, source_index });
        Ok(())
    }

    /// Keys of selected rows.
    pub fn selected_keys(&self) -> Vec<&str> {
        self.state
            .selected_rows
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

impl<T> std::fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("columns", &self.columns)
            .field("rows", &self.data.len())
            .field("options", &self.options)
            .field("state", &self.state)
            .finish()
    }
}

//! Dynamic data table.
//!
//! A [`Table`] applies three stages to its rows, always in this order:
//! sort, filter, paginate. Each stage can be disabled or delegated to the
//! caller ("manual"), in which case the engine only reports the change
//! through a [`TableEvent`].

mod column;
mod compare;
mod engine;
mod pagination;

pub use column::{Accessor, AccessorFn, CellFn, ColumnDef, FilterFn, Row, SortFn};
pub use compare::{compare_values, locale_compare};
pub use engine::{
    HeaderView, RowView, SortDirection, Table, TableEvent, TableOptions, TableState, TableView,
};
pub use pagination::{page_numbers, PageItem};

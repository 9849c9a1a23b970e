//! # Dashkit Engine
//!
//! Headless interpretation of declarative dashboard UI schemas.
//!
//! This crate turns form schemas, filter schemas and table column
//! definitions into render trees, validators, query objects and table views.
//! Drawing is left to the caller.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine never touches files, network or the clock
//! - **Synchronous**: every operation completes before it returns
//! - **Errors as values**: a field failing validation yields [`FieldErrors`],
//!   while [`Error`] is reserved for malformed schemas and misuse
//! - **Portable**: usable from Rust directly or through the C ABI in [`ffi`]
//!
//! ## Core Concepts
//!
//! ### Forms
//!
//! A [`FormSchema`] lists [`FieldDef`]s. [`derive_defaults`] computes the
//! initial value tree, [`SchemaValidator`] checks a whole tree at once and
//! [`Form`] ties both together with a render tree and array editing.
//! [`presets`] holds the schemas of the authentication screens.
//!
//! ### Filters
//!
//! A [`FilterSchema`] describes filterable fields. [`FilterStore`] holds the
//! current [`FilterState`], which [`to_query`] turns into a query object and
//! [`to_url_params`] / [`from_url_params`] persist in a URL.
//!
//! ### Tables
//!
//! A [`Table`] sorts, filters and paginates rows according to its
//! [`ColumnDef`]s and [`TableOptions`], reporting changes as [`TableEvent`]s.
//!
//! ## Quick Start
//!
//! ```rust
//! use dashkit_engine::{FieldDef, Form, FormSchema, Rule, SubmitOutcome};
//! use serde_json::json;
//!
//! let schema = FormSchema::new(vec![
//!     FieldDef::text("name").label("Name").required().rule(Rule::min_length(2)),
//!     FieldDef::email("email").label("Email"),
//! ]);
//! let mut form = Form::new(schema).unwrap();
//!
//! form.set_value("name", "A").unwrap();
//! assert!(matches!(form.submit(|_| {}), SubmitOutcome::Invalid(_)));
//! assert_eq!(form.error("name"), Some("Must be at least 2 characters"));
//!
//! form.set_value("name", "Alice").unwrap();
//! let mut sent = None;
//! form.submit(|values| sent = Some(values.clone()));
//! assert_eq!(sent, Some(json!({"name": "Alice"})));
//! ```

pub mod defaults;
pub mod error;
pub mod ffi;
pub mod filter;
pub mod form;
pub mod path;
pub mod presets;
pub mod schema;
pub mod store;
pub mod table;
pub mod validation;
pub mod value;

// Re-export main types at crate root
pub use defaults::{derive_defaults, derive_field_default};
pub use error::{Error, Result};
pub use filter::{
    escape_regex, from_url_params, initial_state, to_query, to_url_params, validate_filter_state,
    FilterFieldDef, FilterFieldType, FilterItem, FilterSchema, FilterState, FilterStore,
    FilterValidation, Operator, UrlParams,
};
pub use form::{
    Binding, ControlVariant, FieldMeta, Form, ListItem, RenderNode, SubmitOutcome,
};
pub use path::{FieldPath, Segment};
pub use schema::{
    DateOptions, FieldDef, FieldKind, FieldOption, FieldType, FormSchema, Layout, NumberOptions,
    Properties, RadioOptions, SelectOptions, TextOptions,
};
pub use store::{Listeners, Store, SubscriptionId};
pub use table::{
    compare_values, page_numbers, Accessor, ColumnDef, PageItem, Row, SortDirection, Table,
    TableEvent, TableOptions, TableState, TableView,
};
pub use validation::{
    build_validator, ExplicitValidator, FieldErrors, FieldValidator, Predicate, Rule,
    SchemaValidator, Validator,
};

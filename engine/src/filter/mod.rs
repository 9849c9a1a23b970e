//! Filter builder state machine.
//!
//! A [`FilterSchema`] declares the filterable fields. A [`FilterStore`] holds
//! the live [`FilterState`], which can be turned into a query object with
//! [`to_query`], persisted in URL parameters with [`to_url_params`] /
//! [`from_url_params`], and checked with [`validate_filter_state`].

mod operator;
mod params;
mod query;
mod schema;
mod state;
mod validate;

pub use operator::{FilterFieldType, Operator};
pub use params::{from_url_params, to_url_params, UrlParams};
pub use query::{escape_regex, to_query};
pub use schema::{FilterFieldDef, FilterSchema, FilterValidation};
pub use state::{initial_state, FilterItem, FilterState, FilterStore};
pub use validate::validate_filter_state;

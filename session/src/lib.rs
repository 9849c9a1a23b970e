//! Dashkit Session - authentication state and backend access for a dashboard.
//!
//! This crate owns the only I/O of the workspace: it reads configuration
//! from the environment, talks to the auth API over HTTP and exposes the
//! result as observable state built on [`dashkit_engine::Store`].

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

pub use app::AppContext;
pub use auth::{AuthApi, AuthState, AuthStore, HttpAuthClient, User};
pub use config::{Config, ConfigError, Environment};
pub use error::{Result, SessionError};

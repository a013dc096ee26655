//! HTTP service for synthetic persons.
//!
//! ## Structure
//!
//! - [`config`] - CLI/env configuration (`CliArgs`, `ServerConfig`).
//! - [`telemetry`] - `tracing` subscriber setup.
//! - [`handler`] - axum routes and query validation.
//! - [`service`] - batch execution, concurrency limits and cancellation.
//! - [`person`] - fake person attributes and the identity-number provider.
//! - [`error`] - HTTP error mapping.

pub mod config;
pub mod error;
pub mod handler;
pub mod person;
pub mod service;
pub mod telemetry;

//! workhours - work hours, vacation and expense tracking for small teams
//!
//! This is the library interface, used by the `workhours` binary and by
//! the integration tests.

pub mod accounts;
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod records;
pub mod report;
pub mod store;

pub use config::Config;
pub use error::Error;

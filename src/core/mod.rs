//! core
//!
//! Domain types, configuration and credential resolution.
//!
//! # Modules
//!
//! - [`types`] - Bug records, analysis modes, output formats
//! - [`report`] - The pattern report and its closed enumerations
//! - [`config`] - Configuration schema and loading
//! - [`credentials`] - Environment/config/secret-store resolution
//!
//! Nothing in `core` performs network I/O.

pub mod config;
pub mod credentials;
pub mod report;
pub mod types;

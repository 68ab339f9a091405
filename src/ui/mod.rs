//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Interactive prompts (masked token entry)
//! - [`output`] - Verbosity-aware terminal output
//! - [`render`] - Report rendering in every output format
//!
//! # Design
//!
//! All output and prompts go through this module so that quiet and
//! non-interactive modes are honored in one place.

pub mod output;
pub mod prompts;
pub mod render;

pub use render::render;

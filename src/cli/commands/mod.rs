//! CLI command implementations

pub mod completions;
pub mod config;
pub mod process;
pub mod stats;
pub mod upload;
pub mod validate;

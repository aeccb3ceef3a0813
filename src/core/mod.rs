//! Core module - loading, grouping, export and upload

pub mod builder;
pub mod config;
pub mod connection;
pub mod devops;
pub mod export;
pub mod loader;
pub mod stats;
pub mod text;
pub mod upload;

pub use builder::{build, BuildError, ProcessedCases};
pub use config::Config;
pub use devops::{ApiError, Credentials, DevOpsClient, WorkItemApi};
pub use loader::{load_table, LoadError};

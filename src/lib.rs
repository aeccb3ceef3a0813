//! formcase: Azure DevOps test cases from form requirement spreadsheets
//!
//! Reads a CSV of form, field and edit-check requirements, groups it into
//! review test cases with numbered steps, exports them in the Azure DevOps
//! import layout, and uploads them as Test Case work items.

pub mod cli;
pub mod core;
pub mod entities;

//! Entity type definitions
//!
//! - [`RawRow`] / [`RawTable`] - requirement rows as read from the CSV
//! - [`TestCase`] - a grouped review test case with its steps

pub mod row;
pub mod test_case;

pub use row::{Classification, RawRow, RawTable, TestingTier};
pub use test_case::{Step, TestCase, TestCaseKind};

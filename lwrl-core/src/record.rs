//! Key-value summaries of updates.
//!
//! [`Model::update`](crate::Model::update) returns a [`Record`] produced by the
//! algorithm, e.g., the loss of the update step. The runner adds its own
//! entries and writes the record to the log.
//!
//! ```rust
//! use lwrl_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("loss", 0.5);
//! record.insert("q_values", RecordValue::Array1(vec![1.0, 2.0]));
//! assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
//! ```
mod base;

pub use base::{Record, RecordValue};

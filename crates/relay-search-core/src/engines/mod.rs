//! Engine implementations.
//!
//! Both engines share the executor's evaluation and ranking; they differ
//! only in candidate selection. New backends implement
//! [`crate::engine::SearchEngine`] and get verified by the conformance
//! suite like the built-in pair.

mod inverted;
mod relational;

pub use inverted::InvertedEngine;
pub use relational::RelationalEngine;

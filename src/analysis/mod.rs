//! Overdue analysis.
//!
//! Grouping of raw rows into per-party buckets and severity classification.

pub mod aggregator;
pub mod classifier;

pub use aggregator::*;
pub use classifier::*;

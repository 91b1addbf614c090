//! Hierarchical chart layout toolkit.
//!
//! Flat tabular records are grouped by an accessor chain into a weighted
//! branch forest, optionally collapsed so that below-threshold leaves merge
//! into synthetic "Other" records, and finally positioned as nested treemap
//! cells ready for a renderer.

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod format;
pub mod hierarchy;
pub mod layout;
pub mod merge;
pub mod record;

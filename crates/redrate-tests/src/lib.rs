//! Integration test suite for redrate.
//!
//! The tests drive the controller through the update gate the way an
//! external caller would, try to break its invariants with hostile inputs,
//! and check the compounder against an independent decimal oracle.

pub mod helpers;
pub mod oracle;

//! Integration test suite for flowgate.
//!
//! Exercises the public API end to end: building graphs through the
//! workflow context and operators, and submitting them through a
//! recorded in-memory transport. No live gateway is contacted, so the
//! suite is safe for CI.

mod fixtures;

mod graph_rules;
mod workflow_e2e;

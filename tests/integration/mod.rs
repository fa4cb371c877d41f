//! Integration test suite for stamp
//!
//! End-to-end tests of [`stamp_cli::generator::run_copy`] and the `stamp`
//! binary against on-disk templates.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **python_template**: the Python project template scenarios, output
//!   shape, token substitution and determinism
//! - **error_scenarios**: every failure kind of a render
//! - **rendering**: conditional paths, suffixes, undefined-token policy,
//!   answers file settings
//! - **versioning**: git templates, tags, `HEAD` and dirty snapshots
//! - **tasks**: `_tasks` policy and execution
//! - **cli**: the `stamp` binary

mod common;

mod cli;
mod error_scenarios;
mod python_template;
mod rendering;
mod tasks;
mod versioning;

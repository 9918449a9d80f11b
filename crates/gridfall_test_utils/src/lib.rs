//! # Gridfall Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Level and input fixtures
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

//! Shared test utilities for audi integration tests.
//!
//! This module provides:
//! - `TestHarness` owning an isolated jobs root and a scripted command runner
//! - WAV byte builders for fake transcoder output

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{ScriptedRunner, TestHarness};

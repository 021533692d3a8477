//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies of the console (wall clock, build backend) sit behind
//! traits. This crate provides test-friendly implementations that:
//! - Return deterministic, pre-scripted values
//! - Record every call for later assertions
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod backend;
pub mod clock;

pub use backend::{BackendCall, NullBackend};
pub use clock::NullClock;

//! Fundamental types for the Metis build console.
//!
//! This crate defines the shapes shared by every other crate in the workspace:
//! build history rows, task and host snapshots, VM inventory entries, the build
//! request form, server-reported state enums with their display labels, and
//! the timestamp/expiry arithmetic behind countdowns.

pub mod build;
pub mod error;
pub mod host;
pub mod labels;
pub mod project;
pub mod state;
pub mod time;
pub mod vm;

pub use build::{BuildDetails, BuildRequest, CloudPlatform, HistoryItem, TaskState, WareVersion};
pub use error::TypeError;
pub use host::HostResources;
pub use project::{Commit, Component, ProjectComponents};
pub use state::{BuildAction, BuildState, StateTone, VmAction, VmPowerState};
pub use time::{Clock, SystemClock, Timestamp};
pub use vm::Vm;

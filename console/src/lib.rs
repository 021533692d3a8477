//! Metis build console: client-side state over the build backend.
//!
//! The console keeps the small amount of state an operator needs between
//! backend calls:
//! - Build history with filters, paging, lock flags and cleanup countdowns
//! - The three-step build wizard and its request form
//! - Host capacity and the test VM inventory
//! - Task progress polling until a build settles
//!
//! Configuration is passed in explicitly through [`ConsoleConfig`].

pub mod config;
pub mod countdown;
pub mod error;
pub mod history;
pub mod hosts;
pub mod inventory;
pub mod shutdown;
pub mod task;
pub mod ticker;
pub mod wizard;

pub use config::ConsoleConfig;
pub use countdown::{Countdown, CountdownBoard};
pub use error::ConsoleError;
pub use history::HistoryFeed;
pub use hosts::HostCatalog;
pub use inventory::VmInventory;
pub use shutdown::ShutdownController;
pub use task::TaskMonitor;
pub use ticker::{run_ticker, TickerExit};
pub use wizard::{BuildWizard, WizardStep};

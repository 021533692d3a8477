//! Client for the Metis build backend.
//!
//! The backend is an opaque JSON service that queues builds, keeps their
//! history and manages the VMs they are deployed to. This crate exposes it
//! through the [`BuildBackend`] trait so console logic can run against the
//! real HTTP client or a test double.
//!
//! Endpoints:
//! - `POST /get_versions/`, `POST /project_version`, `GET /esxi_state`
//! - `POST /build/`, `PUT /build/`, `GET /build/{deploy_id}`, `GET /history`
//! - `GET /show_vms_state`, `POST /vm_action`

pub mod backend;
pub mod client;
pub mod error;
pub mod wire;

pub use backend::BuildBackend;
pub use client::BuildClient;
pub use error::ClientError;
pub use wire::HistoryQuery;

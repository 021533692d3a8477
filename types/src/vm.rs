//! Test VM inventory entries.

use serde::{Deserialize, Serialize};

use crate::state::VmPowerState;

/// One VM from `GET /show_vms_state`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vm {
    pub id: u64,
    #[serde(default)]
    pub vm_os: String,
    #[serde(default)]
    pub vm_ip: String,
    #[serde(default)]
    pub vm_name: String,
    #[serde(default)]
    pub vm_host: String,
    pub vm_uuid: String,
    pub vm_state: VmPowerState,
}

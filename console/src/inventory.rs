//! Test VM inventory with power control.

use metis_client::BuildBackend;
use metis_types::{Vm, VmAction};
use std::sync::Arc;

use crate::error::ConsoleError;

pub struct VmInventory {
    backend: Arc<dyn BuildBackend>,
    vms: Vec<Vm>,
}

impl VmInventory {
    pub fn new(backend: Arc<dyn BuildBackend>) -> Self {
        Self {
            backend,
            vms: Vec::new(),
        }
    }

    pub fn vms(&self) -> &[Vm] {
        &self.vms
    }

    pub fn get(&self, vm_uuid: &str) -> Option<&Vm> {
        self.vms.iter().find(|vm| vm.vm_uuid == vm_uuid)
    }

    /// Replace the inventory with the backend's current view.
    pub async fn refresh(&mut self) -> Result<&[Vm], ConsoleError> {
        self.vms = self.backend.vms().await?;
        tracing::debug!(vms = self.vms.len(), "VM inventory refreshed");
        Ok(&self.vms)
    }

    /// Power a VM on or off.
    ///
    /// Refused when the VM is unknown or already in the target state. On
    /// success the local entry is updated without refetching.
    pub async fn power(&mut self, vm_uuid: &str, action: VmAction) -> Result<(), ConsoleError> {
        let target = action.target_state();
        let vm = self
            .get(vm_uuid)
            .ok_or_else(|| ConsoleError::UnknownVm(vm_uuid.to_string()))?;
        if vm.vm_state == target {
            return Err(ConsoleError::AlreadyInState {
                uuid: vm_uuid.to_string(),
                state: target.to_string(),
            });
        }
        self.backend.vm_action(action, vm_uuid).await?;
        if let Some(vm) = self.vms.iter_mut().find(|vm| vm.vm_uuid == vm_uuid) {
            vm.vm_state = target;
        }
        tracing::info!(vm_uuid, %action, "VM power action succeeded");
        Ok(())
    }
}

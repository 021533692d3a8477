//! The seam between console logic and the backend service.

use async_trait::async_trait;
use metis_types::{
    BuildAction, BuildDetails, BuildRequest, HistoryItem, HostResources, ProjectComponents,
    TaskState, Vm, VmAction,
};

use crate::error::ClientError;
use crate::wire::HistoryQuery;

/// Operations the build backend offers.
///
/// Implemented over HTTP by [`crate::BuildClient`]; tests substitute a
/// scripted double.
#[async_trait]
pub trait BuildBackend: Send + Sync {
    /// Versions available for a project.
    async fn versions(&self, project: &str) -> Result<Vec<String>, ClientError>;

    /// Capacity of every virtualisation host.
    async fn host_resources(&self) -> Result<Vec<HostResources>, ClientError>;

    /// Components and selectable commits of a project version.
    async fn project_components(
        &self,
        app_name: &str,
        app_version: &str,
    ) -> Result<ProjectComponents, ClientError>;

    /// Queue a new build.
    async fn submit_build(&self, request: &BuildRequest) -> Result<(), ClientError>;

    /// One page of build history.
    async fn history(&self, query: &HistoryQuery) -> Result<Vec<HistoryItem>, ClientError>;

    async fn build_details(&self, deploy_id: &str) -> Result<BuildDetails, ClientError>;

    async fn task_state(&self, deploy_id: &str) -> Result<TaskState, ClientError>;

    /// Lock, unlock, delete or stop a build.
    async fn build_action(&self, action: BuildAction, deploy_id: &str)
        -> Result<(), ClientError>;

    async fn vms(&self) -> Result<Vec<Vm>, ClientError>;

    async fn vm_action(&self, action: VmAction, vm_uuid: &str) -> Result<(), ClientError>;
}

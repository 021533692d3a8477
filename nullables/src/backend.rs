//! Nullable backend: scripted responses, recorded calls.

use async_trait::async_trait;
use metis_client::{BuildBackend, ClientError, HistoryQuery};
use metis_types::{
    BuildAction, BuildDetails, BuildRequest, HistoryItem, HostResources, ProjectComponents,
    TaskState, Vm, VmAction,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// One request the console made, in the order it was made.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    Versions(String),
    HostResources,
    ProjectComponents { app_name: String, app_version: String },
    SubmitBuild(BuildRequest),
    History(HistoryQuery),
    BuildDetails(String),
    TaskState(String),
    BuildAction(BuildAction, String),
    Vms,
    VmAction(VmAction, String),
}

/// An in-memory build backend for tests.
///
/// Unscripted lookups behave like an empty backend: no versions, no hosts,
/// empty history pages. Unknown deploy ids are rejected with HTTP 404.
#[derive(Default)]
pub struct NullBackend {
    versions: Mutex<HashMap<String, Vec<String>>>,
    hosts: Mutex<Vec<HostResources>>,
    components: Mutex<HashMap<(String, String), ProjectComponents>>,
    history_pages: Mutex<HashMap<u32, Vec<HistoryItem>>>,
    details: Mutex<HashMap<String, BuildDetails>>,
    /// Successive task snapshots per deploy id; the last one repeats.
    task_states: Mutex<HashMap<String, VecDeque<TaskState>>>,
    /// Deploy ids whose task state requests never complete.
    stalled_tasks: Mutex<HashSet<String>>,
    vms: Mutex<Vec<Vm>>,
    /// Targets whose requests are rejected: a deploy id, a VM uuid, or the
    /// app version of a submitted build.
    rejections: Mutex<HashMap<String, (u16, Option<String>)>>,
    offline: AtomicBool,
    calls: Mutex<Vec<BackendCall>>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(self, project: &str, versions: &[&str]) -> Self {
        self.versions.lock().unwrap_or_else(PoisonError::into_inner).insert(
            project.to_string(),
            versions.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn with_hosts(self, hosts: Vec<HostResources>) -> Self {
        *self.hosts.lock().unwrap_or_else(PoisonError::into_inner) = hosts;
        self
    }

    pub fn with_components(
        self,
        app_name: &str,
        app_version: &str,
        components: ProjectComponents,
    ) -> Self {
        self.components
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((app_name.to_string(), app_version.to_string()), components);
        self
    }

    /// Rows returned for a page number, whatever the filters.
    pub fn with_history_page(self, page: u32, rows: Vec<HistoryItem>) -> Self {
        self.history_pages.lock().unwrap_or_else(PoisonError::into_inner).insert(page, rows);
        self
    }

    pub fn with_details(self, details: BuildDetails) -> Self {
        self.details
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(details.deploy_id.clone(), details);
        self
    }

    pub fn with_task_states(self, deploy_id: &str, states: Vec<TaskState>) -> Self {
        self.task_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(deploy_id.to_string(), states.into());
        self
    }

    /// Make task state requests for `deploy_id` hang forever.
    pub fn with_stalled_task(self, deploy_id: &str) -> Self {
        self.stalled_tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(deploy_id.to_string());
        self
    }

    pub fn with_vms(self, vms: Vec<Vm>) -> Self {
        *self.vms.lock().unwrap_or_else(PoisonError::into_inner) = vms;
        self
    }

    /// Make actions on `target` fail with the given status and info text.
    pub fn reject_actions_on(self, target: &str, status: u16, info: Option<&str>) -> Self {
        self.rejections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(target.to_string(), (status, info.map(str::to_string)));
        self
    }

    /// Toggle whether every call fails as unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of calls matching a predicate.
    pub fn count_calls(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| pred(c))
            .count()
    }

    fn record(&self, call: BackendCall) -> Result<(), ClientError> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
        if self.offline.load(Ordering::SeqCst) {
            return Err(ClientError::Unreachable("null backend is offline".into()));
        }
        Ok(())
    }

    fn check_rejection(&self, target: &str) -> Result<(), ClientError> {
        match self.rejections.lock().unwrap_or_else(PoisonError::into_inner).get(target) {
            Some((status, info)) => Err(ClientError::Rejected {
                status: *status,
                info: info.clone(),
            }),
            None => Ok(()),
        }
    }

    fn not_found(deploy_id: &str) -> ClientError {
        ClientError::Rejected {
            status: 404,
            info: Some(format!("build {deploy_id} not found")),
        }
    }
}

#[async_trait]
impl BuildBackend for NullBackend {
    async fn versions(&self, project: &str) -> Result<Vec<String>, ClientError> {
        self.record(BackendCall::Versions(project.to_string()))?;
        Ok(self
            .versions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project)
            .cloned()
            .unwrap_or_default())
    }

    async fn host_resources(&self) -> Result<Vec<HostResources>, ClientError> {
        self.record(BackendCall::HostResources)?;
        Ok(self.hosts.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn project_components(
        &self,
        app_name: &str,
        app_version: &str,
    ) -> Result<ProjectComponents, ClientError> {
        self.record(BackendCall::ProjectComponents {
            app_name: app_name.to_string(),
            app_version: app_version.to_string(),
        })?;
        Ok(self
            .components
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(app_name.to_string(), app_version.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn submit_build(&self, request: &BuildRequest) -> Result<(), ClientError> {
        self.record(BackendCall::SubmitBuild(request.clone()))?;
        self.check_rejection(&request.app_version)
    }

    async fn history(&self, query: &HistoryQuery) -> Result<Vec<HistoryItem>, ClientError> {
        self.record(BackendCall::History(query.clone()))?;
        Ok(self
            .history_pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&query.page)
            .cloned()
            .unwrap_or_default())
    }

    async fn build_details(&self, deploy_id: &str) -> Result<BuildDetails, ClientError> {
        self.record(BackendCall::BuildDetails(deploy_id.to_string()))?;
        self.details
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(deploy_id)
            .cloned()
            .ok_or_else(|| Self::not_found(deploy_id))
    }

    async fn task_state(&self, deploy_id: &str) -> Result<TaskState, ClientError> {
        self.record(BackendCall::TaskState(deploy_id.to_string()))?;
        let stalled = self
            .stalled_tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(deploy_id);
        if stalled {
            return std::future::pending().await;
        }
        let mut states = self.task_states.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = states
            .get_mut(deploy_id)
            .ok_or_else(|| Self::not_found(deploy_id))?;
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        next.ok_or_else(|| Self::not_found(deploy_id))
    }

    async fn build_action(
        &self,
        action: BuildAction,
        deploy_id: &str,
    ) -> Result<(), ClientError> {
        self.record(BackendCall::BuildAction(action, deploy_id.to_string()))?;
        self.check_rejection(deploy_id)
    }

    async fn vms(&self) -> Result<Vec<Vm>, ClientError> {
        self.record(BackendCall::Vms)?;
        Ok(self.vms.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn vm_action(&self, action: VmAction, vm_uuid: &str) -> Result<(), ClientError> {
        self.record(BackendCall::VmAction(action, vm_uuid.to_string()))?;
        self.check_rejection(vm_uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metis_types::BuildState;

    fn task(state: BuildState) -> TaskState {
        TaskState {
            deploy_time: "waf-1".into(),
            step: "compile".into(),
            state,
            action: String::new(),
        }
    }

    #[tokio::test]
    async fn task_states_advance_then_repeat() {
        let backend = NullBackend::new().with_task_states(
            "waf-1",
            vec![task(BuildState::Running), task(BuildState::Success)],
        );
        assert_eq!(backend.task_state("waf-1").await.unwrap().state, BuildState::Running);
        assert_eq!(backend.task_state("waf-1").await.unwrap().state, BuildState::Success);
        assert_eq!(backend.task_state("waf-1").await.unwrap().state, BuildState::Success);
        assert!(backend.task_state("other").await.is_err());
    }

    #[tokio::test]
    async fn offline_backend_records_then_fails() {
        let backend = NullBackend::new();
        backend.set_offline(true);
        assert!(matches!(
            backend.vms().await,
            Err(ClientError::Unreachable(_))
        ));
        assert_eq!(backend.calls(), vec![BackendCall::Vms]);
    }

    #[tokio::test]
    async fn rejections_apply_to_their_target_only() {
        let backend = NullBackend::new().reject_actions_on("waf-1", 409, Some("locked"));
        assert!(backend.build_action(BuildAction::Delete, "waf-2").await.is_ok());
        let err = backend
            .build_action(BuildAction::Delete, "waf-1")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "locked");
    }
}

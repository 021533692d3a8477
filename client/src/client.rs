//! HTTP implementation of [`BuildBackend`].

use async_trait::async_trait;
use metis_types::{
    BuildAction, BuildDetails, BuildRequest, HistoryItem, HostResources, ProjectComponents,
    TaskState, Vm, VmAction,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::backend::BuildBackend;
use crate::error::ClientError;
use crate::wire::{
    BuildActionRequest, ErrorBody, HistoryQuery, HistoryResponse, HostStateResponse,
    ProjectVersionRequest, VersionsRequest, VersionsResponse, VmActionRequest, VmsResponse,
};

/// Default timeout for backend requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the build backend's REST API.
pub struct BuildClient {
    /// Base URL without a trailing slash, e.g. `http://192.168.1.82:8000`.
    base_url: String,
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
}

impl BuildClient {
    /// Create a client with default timeout settings.
    pub fn new(base_url: &str) -> Self {
        Self::with_timeouts(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a client with custom request and connect timeouts.
    pub fn with_timeouts(base_url: &str, timeout: Duration, connect_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/build/{deploy_id}` with the id escaped as a single path segment.
    fn build_url(&self, deploy_id: &str) -> Result<reqwest::Url, ClientError> {
        let mut url = reqwest::Url::parse(&self.url("/build/"))
            .map_err(|e| ClientError::RequestFailed(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::RequestFailed("base URL cannot have a path".into()))?
            .pop_if_empty()
            .push(deploy_id);
        Ok(url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        let response = request.send().await.map_err(classify_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let info = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.info);
        tracing::debug!(status = status.as_u16(), ?info, "backend rejected request");
        Err(ClientError::Rejected {
            status: status.as_u16(),
            info,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|e| {
            ClientError::InvalidResponse(format!("failed to parse {what} response: {e}"))
        })
    }
}

fn classify_transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Unreachable(format!("request timed out: {e}"))
    } else if e.is_connect() {
        ClientError::Unreachable(format!("connection failed: {e}"))
    } else {
        ClientError::RequestFailed(e.to_string())
    }
}

#[async_trait]
impl BuildBackend for BuildClient {
    async fn versions(&self, project: &str) -> Result<Vec<String>, ClientError> {
        let request = self
            .http_client
            .post(self.url("/get_versions/"))
            .json(&VersionsRequest {
                project_name: project,
            });
        let resp: VersionsResponse = self.send_json(request, "versions").await?;
        Ok(resp.versions)
    }

    async fn host_resources(&self) -> Result<Vec<HostResources>, ClientError> {
        let request = self.http_client.get(self.url("/esxi_state"));
        let resp: HostStateResponse = self.send_json(request, "host state").await?;
        resp.into_hosts().map_err(|e| {
            ClientError::InvalidResponse(format!("failed to parse host usage: {e}"))
        })
    }

    async fn project_components(
        &self,
        app_name: &str,
        app_version: &str,
    ) -> Result<ProjectComponents, ClientError> {
        let request = self
            .http_client
            .post(self.url("/project_version"))
            .json(&ProjectVersionRequest {
                app_name,
                app_version,
            });
        self.send_json(request, "project version").await
    }

    async fn submit_build(&self, request: &BuildRequest) -> Result<(), ClientError> {
        tracing::info!(
            app = %request.app_name,
            version = %request.app_version,
            ware = %request.ware_version,
            host = %request.deploy_host,
            "submitting build"
        );
        let request = self.http_client.post(self.url("/build/")).json(request);
        self.send(request).await.map(drop)
    }

    async fn history(&self, query: &HistoryQuery) -> Result<Vec<HistoryItem>, ClientError> {
        let request = self
            .http_client
            .get(self.url("/history"))
            .query(&query.as_pairs());
        let resp: HistoryResponse = self.send_json(request, "history").await?;
        Ok(resp.history)
    }

    async fn build_details(&self, deploy_id: &str) -> Result<BuildDetails, ClientError> {
        let request = self.http_client.get(self.build_url(deploy_id)?);
        self.send_json(request, "build details").await
    }

    async fn task_state(&self, deploy_id: &str) -> Result<TaskState, ClientError> {
        let request = self.http_client.get(self.build_url(deploy_id)?);
        self.send_json(request, "task state").await
    }

    async fn build_action(
        &self,
        action: BuildAction,
        deploy_id: &str,
    ) -> Result<(), ClientError> {
        tracing::info!(%action, deploy_id, "build action");
        let request = self
            .http_client
            .put(self.url("/build/"))
            .json(&BuildActionRequest { action, deploy_id });
        self.send(request).await.map(drop)
    }

    async fn vms(&self) -> Result<Vec<Vm>, ClientError> {
        let request = self.http_client.get(self.url("/show_vms_state"));
        let resp: VmsResponse = self.send_json(request, "VM state").await?;
        Ok(resp.data)
    }

    async fn vm_action(&self, action: VmAction, vm_uuid: &str) -> Result<(), ClientError> {
        tracing::info!(%action, vm_uuid, "VM action");
        let request = self
            .http_client
            .post(self.url("/vm_action"))
            .json(&VmActionRequest { action, vm_uuid });
        self.send(request).await.map(drop)
    }
}

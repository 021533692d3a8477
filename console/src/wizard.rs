//! Three-step build request wizard.

use metis_client::BuildBackend;
use metis_types::build::{CHANNELS, CPU_OPTIONS, DISK_OPTIONS, MEMORY_OPTIONS, PROJECTS};
use metis_types::{BuildRequest, CloudPlatform, HostResources, ProjectComponents, WareVersion};
use std::fmt;
use std::sync::Arc;

use crate::error::ConsoleError;
use crate::hosts::HostCatalog;

/// Wizard page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    /// Project, version, profile and sizing.
    Parameters = 1,
    /// Component commits.
    Configuration = 2,
    /// Review before submitting.
    Preview = 3,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parameters => "parameters",
            Self::Configuration => "configuration",
            Self::Preview => "preview",
        };
        write!(f, "{}/3 {name}", self.number())
    }
}

/// Form state for a new build request.
///
/// Hard builds have no component selection, so the configuration page is
/// skipped in both directions.
pub struct BuildWizard {
    backend: Arc<dyn BuildBackend>,
    step: WizardStep,
    request: BuildRequest,
    version_options: Vec<String>,
    components: ProjectComponents,
    hosts: HostCatalog,
    selected_host: Option<HostResources>,
}

impl BuildWizard {
    pub fn new(backend: Arc<dyn BuildBackend>) -> Self {
        Self {
            backend,
            step: WizardStep::Parameters,
            request: BuildRequest::default(),
            version_options: Vec::new(),
            components: ProjectComponents::default(),
            hosts: HostCatalog::new(),
            selected_host: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn request(&self) -> &BuildRequest {
        &self.request
    }

    pub fn version_options(&self) -> &[String] {
        &self.version_options
    }

    pub fn components(&self) -> &ProjectComponents {
        &self.components
    }

    pub fn hosts(&self) -> &HostCatalog {
        &self.hosts
    }

    pub fn selected_host(&self) -> Option<&HostResources> {
        self.selected_host.as_ref()
    }

    /// Choose the project and load its versions. On success the previous
    /// version and its components are cleared; on failure nothing changes.
    pub async fn set_app_name(&mut self, app_name: &str) -> Result<(), ConsoleError> {
        check_choice("app_name", app_name, PROJECTS)?;
        let versions = self.backend.versions(app_name).await?;
        self.request.app_name = app_name.to_string();
        self.request.app_version.clear();
        self.request.projects.clear();
        self.components = ProjectComponents::default();
        self.version_options = versions;
        Ok(())
    }

    /// Choose the version and load its components, picking each one's first
    /// commit unless a choice was already made.
    pub async fn set_app_version(&mut self, app_version: &str) -> Result<(), ConsoleError> {
        if !self.version_options.iter().any(|v| v == app_version) {
            return Err(ConsoleError::InvalidChoice {
                field: "app_version",
                value: app_version.to_string(),
            });
        }
        let components = self
            .backend
            .project_components(&self.request.app_name, app_version)
            .await?;
        self.request.app_version = app_version.to_string();
        self.request.projects = components.default_selection(&self.request.projects);
        tracing::debug!(
            app_name = %self.request.app_name,
            app_version,
            components = components.len(),
            "components loaded"
        );
        self.components = components;
        Ok(())
    }

    pub fn set_ware_version(&mut self, ware: WareVersion) {
        self.request.ware_version = ware;
        if !ware.uses_deploy_host() {
            self.selected_host = None;
        }
    }

    pub fn set_channel(&mut self, channel: &str) -> Result<(), ConsoleError> {
        check_choice("channel", channel, CHANNELS)?;
        self.request.channel = channel.to_string();
        Ok(())
    }

    pub fn set_cloud_platform(&mut self, cloud: CloudPlatform) -> Result<(), ConsoleError> {
        if !self.request.ware_version.uses_cloud_platform() && cloud != CloudPlatform::None {
            return Err(ConsoleError::InvalidChoice {
                field: "cloud_platform",
                value: cloud.to_string(),
            });
        }
        self.request.cloud_platform = cloud;
        Ok(())
    }

    pub fn set_cpu(&mut self, cpu: u32) -> Result<(), ConsoleError> {
        self.request.cpu = check_size("cpu", cpu, CPU_OPTIONS)?;
        Ok(())
    }

    pub fn set_memory(&mut self, memory: u32) -> Result<(), ConsoleError> {
        self.request.memory = check_size("memory", memory, MEMORY_OPTIONS)?;
        Ok(())
    }

    pub fn set_disk(&mut self, disk: u32) -> Result<(), ConsoleError> {
        self.request.disk = check_size("disk", disk, DISK_OPTIONS)?;
        Ok(())
    }

    pub fn set_new_build(&mut self, is_new: bool) {
        self.request.is_new = is_new;
    }

    /// Set the deploy host, loading host capacity on first use. A host the
    /// catalog does not know is accepted with no capacity shown.
    pub async fn select_host(&mut self, ip: &str) -> Result<(), ConsoleError> {
        if !self.request.ware_version.uses_deploy_host() {
            return Err(ConsoleError::InvalidChoice {
                field: "deploy_host",
                value: ip.to_string(),
            });
        }
        self.hosts.ensure_loaded(self.backend.as_ref()).await?;
        self.selected_host = self.hosts.find(ip).cloned();
        self.request.deploy_host = ip.to_string();
        Ok(())
    }

    /// Pick the commit for one component.
    pub fn select_commit(&mut self, component: &str, commit: &str) -> Result<(), ConsoleError> {
        let known = self
            .components
            .get(component)
            .ok_or_else(|| ConsoleError::InvalidChoice {
                field: "component",
                value: component.to_string(),
            })?;
        if !known.has_commit(commit) {
            return Err(ConsoleError::InvalidChoice {
                field: "commit",
                value: commit.to_string(),
            });
        }
        self.request
            .projects
            .insert(component.to_string(), commit.to_string());
        Ok(())
    }

    pub fn next(&mut self) -> WizardStep {
        self.step = match self.step {
            WizardStep::Parameters if self.request.ware_version == WareVersion::Hard => {
                WizardStep::Preview
            }
            WizardStep::Parameters => WizardStep::Configuration,
            WizardStep::Configuration | WizardStep::Preview => WizardStep::Preview,
        };
        self.step
    }

    pub fn previous(&mut self) -> WizardStep {
        self.step = match self.step {
            WizardStep::Preview if self.request.ware_version == WareVersion::Hard => {
                WizardStep::Parameters
            }
            WizardStep::Preview => WizardStep::Configuration,
            WizardStep::Configuration | WizardStep::Parameters => WizardStep::Parameters,
        };
        self.step
    }

    /// Post the request. The wizard keeps its state, so a rejected request
    /// can be corrected and resubmitted.
    pub async fn submit(&self) -> Result<(), ConsoleError> {
        if self.request.app_version.is_empty() {
            return Err(ConsoleError::Incomplete("no version selected".into()));
        }
        self.backend.submit_build(&self.request).await?;
        tracing::info!(
            app_name = %self.request.app_name,
            app_version = %self.request.app_version,
            ware = %self.request.ware_version,
            "build submitted"
        );
        Ok(())
    }
}

fn check_choice(field: &'static str, value: &str, options: &[&str]) -> Result<(), ConsoleError> {
    if options.contains(&value) {
        Ok(())
    } else {
        Err(ConsoleError::InvalidChoice {
            field,
            value: value.to_string(),
        })
    }
}

fn check_size(field: &'static str, value: u32, options: &[u32]) -> Result<u32, ConsoleError> {
    if options.contains(&value) {
        Ok(value)
    } else {
        Err(ConsoleError::InvalidChoice {
            field,
            value: value.to_string(),
        })
    }
}

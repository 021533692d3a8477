//! Build history rows, task snapshots and the build request form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;
use crate::state::BuildState;

/// Projects the backend knows how to build.
pub const PROJECTS: &[&str] = &["waf", "omas", "lams", "dsas", "cosa"];

/// Distribution channels a build can be branded for.
pub const CHANNELS: &[&str] = &["uguardsec", "sunyainfo", "ruisuyun", "whiteboard"];

/// Allowed VM core counts.
pub const CPU_OPTIONS: &[u32] = &[4, 8, 16, 32];

/// Allowed VM memory sizes in GB.
pub const MEMORY_OPTIONS: &[u32] = &[8, 16, 32];

/// Allowed VM disk sizes in GB.
pub const DISK_OPTIONS: &[u32] = &[50, 100, 150, 250, 500];

/// Placeholder host meaning "let the backend choose".
pub const DEFAULT_DEPLOY_HOST: &str = "localhost";

/// One row of `GET /history`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Deploy identifier; also the name of the produced image.
    pub iso_name: String,
    /// 1 when the artifacts are protected from cleanup.
    #[serde(default)]
    pub is_lock: u8,
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub start_build_time: String,
    /// Absent or empty while the build is still running.
    #[serde(default)]
    pub end_build_time: Option<String>,
    #[serde(default)]
    pub ci_count: u32,
    #[serde(default)]
    pub deploy_host: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub state: BuildState,
}

impl HistoryItem {
    pub fn is_locked(&self) -> bool {
        self.is_lock == 1
    }
}

/// Response of `GET /build/{deploy_id}` as shown in the details view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDetails {
    #[serde(default)]
    pub deploy_id: String,
    #[serde(default)]
    pub step: String,
    #[serde(default)]
    pub state: BuildState,
    #[serde(default)]
    pub task_id: String,
}

/// Response of `GET /build/{deploy_id}` as shown in the task view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    #[serde(default)]
    pub deploy_time: String,
    #[serde(default)]
    pub step: String,
    #[serde(default)]
    pub state: BuildState,
    #[serde(default)]
    pub action: String,
}

/// Hardware/virtualisation profile of a build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WareVersion {
    /// Software image deployed to a VM on a chosen host.
    #[default]
    Soft,
    /// Hardware appliance image; no VM configuration.
    Hard,
    Cloud,
    /// Software image with cloud packaging.
    SoftCloud,
}

impl WareVersion {
    pub const ALL: [WareVersion; 4] = [Self::Soft, Self::Hard, Self::Cloud, Self::SoftCloud];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soft => "soft",
            Self::Hard => "hard",
            Self::Cloud => "cloud",
            Self::SoftCloud => "soft_cloud",
        }
    }

    /// Whether the build targets a VM on a selectable host.
    pub fn uses_deploy_host(&self) -> bool {
        matches!(self, Self::Soft | Self::SoftCloud)
    }

    /// Whether a cloud platform must be chosen.
    pub fn uses_cloud_platform(&self) -> bool {
        matches!(self, Self::Cloud)
    }
}

impl FromStr for WareVersion {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| TypeError::UnknownVariant {
                kind: "ware version",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for WareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target cloud for `cloud` builds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudPlatform {
    #[default]
    None,
    Aliyun,
    Tencent,
    Huawei,
}

impl CloudPlatform {
    pub const ALL: [CloudPlatform; 4] = [Self::None, Self::Aliyun, Self::Tencent, Self::Huawei];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Aliyun => "aliyun",
            Self::Tencent => "tencent",
            Self::Huawei => "huawei",
        }
    }
}

impl FromStr for CloudPlatform {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| TypeError::UnknownVariant {
                kind: "cloud platform",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for CloudPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /build/`.
///
/// Sizes travel as decimal strings on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub app_name: String,
    pub app_version: String,
    pub channel: String,
    pub ware_version: WareVersion,
    #[serde(with = "decimal_string")]
    pub cpu: u32,
    #[serde(with = "decimal_string")]
    pub memory: u32,
    #[serde(with = "decimal_string")]
    pub disk: u32,
    pub deploy_host: String,
    pub cloud_platform: CloudPlatform,
    /// Selected commit per component key (`name@version`).
    pub projects: BTreeMap<String, String>,
    /// Rebuild every component from scratch instead of reusing cached artifacts.
    pub is_new: bool,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self {
            app_name: PROJECTS[0].to_string(),
            app_version: String::new(),
            channel: CHANNELS[0].to_string(),
            ware_version: WareVersion::default(),
            cpu: CPU_OPTIONS[0],
            memory: MEMORY_OPTIONS[0],
            disk: DISK_OPTIONS[0],
            deploy_host: DEFAULT_DEPLOY_HOST.to_string(),
            cloud_platform: CloudPlatform::default(),
            projects: BTreeMap::new(),
            is_new: false,
        }
    }
}

mod decimal_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    /// Accepts either `"8"` or `8`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u32),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.trim().parse().map_err(de::Error::custom),
            Raw::Number(n) => Ok(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_request_matches_form_defaults() {
        let req = BuildRequest::default();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "app_name": "waf",
                "app_version": "",
                "channel": "uguardsec",
                "ware_version": "soft",
                "cpu": "4",
                "memory": "8",
                "disk": "50",
                "deploy_host": "localhost",
                "cloud_platform": "none",
                "projects": {},
                "is_new": false,
            })
        );
    }

    #[test]
    fn sizes_accept_numbers_or_strings() {
        let mut json = serde_json::to_value(BuildRequest::default()).unwrap();
        json["cpu"] = serde_json::json!(16);
        json["disk"] = serde_json::json!("250");
        let req: BuildRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.cpu, 16);
        assert_eq!(req.disk, 250);
    }

    #[test]
    fn history_item_tolerates_missing_fields() {
        let item: HistoryItem = serde_json::from_str(
            r#"{"iso_name": "waf-20240501", "state": "RUNNING", "end_build_time": null}"#,
        )
        .unwrap();
        assert_eq!(item.iso_name, "waf-20240501");
        assert!(!item.is_locked());
        assert_eq!(item.state, BuildState::Running);
        assert_eq!(item.end_build_time, None);
    }

    #[test]
    fn ware_version_parsing() {
        assert_eq!("soft_cloud".parse::<WareVersion>().unwrap(), WareVersion::SoftCloud);
        assert!("firmware".parse::<WareVersion>().is_err());
        assert!(WareVersion::Soft.uses_deploy_host());
        assert!(WareVersion::SoftCloud.uses_deploy_host());
        assert!(!WareVersion::Hard.uses_deploy_host());
        assert!(WareVersion::Cloud.uses_cloud_platform());
    }

    #[test]
    fn cloud_platform_parsing() {
        assert_eq!("huawei".parse::<CloudPlatform>().unwrap(), CloudPlatform::Huawei);
        assert_eq!(
            "aws".parse::<CloudPlatform>(),
            Err(TypeError::UnknownVariant {
                kind: "cloud platform",
                value: "aws".into()
            })
        );
    }
}

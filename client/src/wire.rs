//! Request and response envelopes of the backend API.

use metis_types::host::HostUsage;
use metis_types::{BuildAction, HistoryItem, HostResources, Vm, VmAction};
use serde::{Deserialize, Deserializer, Serialize};

/// Filters and page of a `GET /history` call. Empty strings mean "any".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryQuery {
    /// 1-based page number.
    pub page: u32,
    pub project: String,
    pub version: String,
}

impl HistoryQuery {
    pub fn first_page(project: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            page: 1,
            project: project.into(),
            version: version.into(),
        }
    }

    pub(crate) fn as_pairs(&self) -> [(&'static str, String); 3] {
        [
            ("page", self.page.to_string()),
            ("project", self.project.clone()),
            ("version", self.version.clone()),
        ]
    }
}

#[derive(Serialize)]
pub(crate) struct VersionsRequest<'a> {
    pub project_name: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct VersionsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub versions: Vec<String>,
}

#[derive(Serialize)]
pub(crate) struct ProjectVersionRequest<'a> {
    pub app_name: &'a str,
    pub app_version: &'a str,
}

#[derive(Serialize)]
pub(crate) struct BuildActionRequest<'a> {
    pub action: BuildAction,
    pub deploy_id: &'a str,
}

#[derive(Serialize)]
pub(crate) struct VmActionRequest<'a> {
    pub action: VmAction,
    pub vm_uuid: &'a str,
}

/// `GET /history` envelope. Anything other than an array under `history`
/// counts as an empty page.
#[derive(Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default, deserialize_with = "lenient_rows")]
    pub history: Vec<HistoryItem>,
}

/// `GET /esxi_state` envelope: a list of single-key objects `{ip: usage}`.
#[derive(Deserialize)]
pub(crate) struct HostStateResponse {
    #[serde(default)]
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl HostStateResponse {
    /// Flatten to one entry per host, in backend order.
    pub fn into_hosts(self) -> Result<Vec<HostResources>, serde_json::Error> {
        let mut hosts = Vec::with_capacity(self.data.len());
        for entry in self.data {
            for (ip, usage) in entry {
                let usage: HostUsage = serde_json::from_value(usage)?;
                hosts.push(usage.into_resources(ip));
            }
        }
        Ok(hosts)
    }
}

#[derive(Deserialize)]
pub(crate) struct VmsResponse {
    #[serde(default)]
    pub data: Vec<Vm>,
}

/// Error body some endpoints return alongside a failure status.
#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    pub info: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_rows<'de, D>(deserializer: D) -> Result<Vec<HistoryItem>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        value @ serde_json::Value::Array(_) => {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_envelope_is_lenient() {
        let empty: HistoryResponse = serde_json::from_str(r#"{"history": "none"}"#).unwrap();
        assert!(empty.history.is_empty());
        let missing: HistoryResponse = serde_json::from_str("{}").unwrap();
        assert!(missing.history.is_empty());
        let rows: HistoryResponse =
            serde_json::from_str(r#"{"history": [{"iso_name": "a", "state": "SUCCESS"}]}"#)
                .unwrap();
        assert_eq!(rows.history.len(), 1);
    }

    #[test]
    fn versions_tolerate_null() {
        let resp: VersionsResponse = serde_json::from_str(r#"{"versions": null}"#).unwrap();
        assert!(resp.versions.is_empty());
    }

    #[test]
    fn host_state_is_flattened() {
        let resp: HostStateResponse = serde_json::from_str(
            r#"{"data": [
                {"10.0.0.1": {"disk_total": 1000, "disk_usage": 10, "mem_total": 256, "mem_usage": 64, "cpu_total": 48, "cpu_usage": 12}},
                {"10.0.0.2": {"disk_total": 500, "disk_usage": 400, "mem_total": 128, "mem_usage": 100, "cpu_total": 24, "cpu_usage": 20}}
            ]}"#,
        )
        .unwrap();
        let hosts = resp.into_hosts().unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].ip, "10.0.0.1");
        assert_eq!(hosts[0].mem_usage, 64.0);
        assert_eq!(hosts[1].ip, "10.0.0.2");
        assert_eq!(hosts[1].disk_usage, 400.0);
    }

    #[test]
    fn action_bodies_serialize() {
        let body = serde_json::to_value(BuildActionRequest {
            action: BuildAction::Lock,
            deploy_id: "waf-1",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"action": "lock", "deploy_id": "waf-1"}));
        let body = serde_json::to_value(VmActionRequest {
            action: VmAction::PowerOff,
            vm_uuid: "4201-aa",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"action": "poweroff", "vm_uuid": "4201-aa"}));
    }
}

//! Virtualisation host capacity snapshots.

use serde::{Deserialize, Serialize};

/// Capacity and usage reported for one ESXi host. Disk and memory are in GB.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostResources {
    pub ip: String,
    pub disk_total: f64,
    pub disk_usage: f64,
    pub mem_total: f64,
    pub mem_usage: f64,
    pub cpu_total: f64,
    pub cpu_usage: f64,
}

/// Per-host figures as they appear under the host's IP in `GET /esxi_state`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct HostUsage {
    #[serde(default)]
    pub disk_total: f64,
    #[serde(default)]
    pub disk_usage: f64,
    #[serde(default)]
    pub mem_total: f64,
    #[serde(default)]
    pub mem_usage: f64,
    #[serde(default)]
    pub cpu_total: f64,
    #[serde(default)]
    pub cpu_usage: f64,
}

impl HostUsage {
    pub fn into_resources(self, ip: impl Into<String>) -> HostResources {
        HostResources {
            ip: ip.into(),
            disk_total: self.disk_total,
            disk_usage: self.disk_usage,
            mem_total: self.mem_total,
            mem_usage: self.mem_usage,
            cpu_total: self.cpu_total,
            cpu_usage: self.cpu_usage,
        }
    }
}

/// Used share of a resource in `[0.0, 1.0]`; zero when the total is unknown.
pub fn usage_fraction(used: f64, total: f64) -> f64 {
    if total > 0.0 {
        (used / total).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl HostResources {
    pub fn cpu_fraction(&self) -> f64 {
        usage_fraction(self.cpu_usage, self.cpu_total)
    }

    pub fn mem_fraction(&self) -> f64 {
        usage_fraction(self.mem_usage, self.mem_total)
    }

    pub fn disk_fraction(&self) -> f64 {
        usage_fraction(self.disk_usage, self.disk_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_handle_zero_totals() {
        let host = HostUsage {
            disk_total: 500.0,
            disk_usage: 125.0,
            mem_total: 0.0,
            mem_usage: 4.0,
            cpu_total: 32.0,
            cpu_usage: 40.0,
        }
        .into_resources("10.0.0.5");
        assert_eq!(host.ip, "10.0.0.5");
        assert_eq!(host.disk_fraction(), 0.25);
        assert_eq!(host.mem_fraction(), 0.0);
        assert_eq!(host.cpu_fraction(), 1.0);
    }
}

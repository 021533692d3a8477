//! Display labels for backend enumerations.
//!
//! Each table is total over its enumeration. Values the backend reports that
//! we do not recognise are shown verbatim.

use crate::build::{CloudPlatform, WareVersion};
use crate::state::{BuildState, StateTone, VmPowerState};

pub fn build_state_label(state: &BuildState) -> &str {
    match state {
        BuildState::Stopped => "Stopped",
        BuildState::Running => "Running",
        BuildState::Deleted => "Deleted",
        BuildState::Success => "Succeeded",
        BuildState::Failure => "Failed",
        BuildState::Verified => "Verified",
        BuildState::Other(raw) => raw,
    }
}

pub fn build_state_tone(state: &BuildState) -> StateTone {
    match state {
        BuildState::Stopped => StateTone::Neutral,
        BuildState::Running => StateTone::Active,
        BuildState::Deleted => StateTone::Danger,
        BuildState::Success => StateTone::Success,
        BuildState::Failure => StateTone::Failure,
        BuildState::Verified => StateTone::Verified,
        BuildState::Other(_) => StateTone::Warning,
    }
}

pub fn ware_version_label(ware: WareVersion) -> &'static str {
    match ware {
        WareVersion::Soft => "Software",
        WareVersion::Hard => "Hardware",
        WareVersion::Cloud => "Cloud platform",
        WareVersion::SoftCloud => "Hybrid",
    }
}

pub fn cloud_platform_label(platform: CloudPlatform) -> &'static str {
    match platform {
        CloudPlatform::None => "None",
        CloudPlatform::Aliyun => "Alibaba Cloud",
        CloudPlatform::Tencent => "Tencent Cloud",
        CloudPlatform::Huawei => "Huawei Cloud",
    }
}

pub fn channel_label(channel: &str) -> &str {
    match channel {
        "uguardsec" => "UGuardSec edition",
        "sunyainfo" => "Sunyainfo edition",
        "ruisuyun" => "Ruisuyun edition",
        "whiteboard" => "White-label",
        other => other,
    }
}

pub fn project_label(project: &str) -> &str {
    match project {
        "waf" => "WAF",
        other => other,
    }
}

pub fn vm_power_label(state: &VmPowerState) -> &str {
    match state {
        VmPowerState::PoweredOn => "Powered on",
        VmPowerState::PoweredOff => "Powered off",
        VmPowerState::Other(raw) => raw,
    }
}

//! Plain-text rendering of console state.

use metis_console::{Countdown, HistoryFeed};
use metis_types::labels::{
    build_state_label, build_state_tone, channel_label, cloud_platform_label, project_label,
    vm_power_label, ware_version_label,
};
use metis_types::{
    BuildDetails, BuildRequest, BuildState, HostResources, ProjectComponents, StateTone, TaskState,
    Timestamp, Vm,
};

/// State label prefixed with a one-character marker for its tone.
fn state_cell(state: &BuildState) -> String {
    let marker = match build_state_tone(state) {
        StateTone::Neutral => ' ',
        StateTone::Active => '~',
        StateTone::Danger => '-',
        StateTone::Success => '+',
        StateTone::Failure => 'x',
        StateTone::Verified => '*',
        StateTone::Warning => '?',
    };
    format!("{marker}{}", build_state_label(state))
}

pub fn history_table(feed: &HistoryFeed, now: Timestamp) -> String {
    let mut out = format!(
        "{:<32} {:<6} {:<10} {:<11} {:<5} {:<16} {}\n",
        "BUILD", "LOCK", "VERSION", "STATE", "CI", "HOST", "CLEANUP"
    );
    for row in feed.rows() {
        let countdown = feed.countdowns().render(&row.iso_name, now);
        out.push_str(&format!(
            "{:<32} {:<6} {:<10} {:<11} {:<5} {:<16} {}\n",
            row.iso_name,
            if feed.is_locked(&row.iso_name) { "yes" } else { "" },
            row.app_version,
            state_cell(&row.state),
            row.ci_count,
            row.deploy_host,
            countdown_cell(&countdown),
        ));
    }
    out
}

fn countdown_cell(countdown: &Countdown) -> String {
    match countdown {
        Countdown::Active { remaining, fraction } => {
            format!("{remaining} ({:.0}%)", fraction * 100.0)
        }
        Countdown::Expired => "-".to_string(),
    }
}

pub fn details(details: &BuildDetails) -> String {
    format!(
        "build:  {}\nstep:   {}\nstate:  {}\ntask:   {}",
        details.deploy_id,
        details.step,
        build_state_label(&details.state),
        details.task_id
    )
}

pub fn task_line(task: &TaskState) -> String {
    format!(
        "{} [{}] {}",
        task.deploy_time,
        state_cell(&task.state),
        task.step
    )
}

pub fn hosts(hosts: &[HostResources]) -> String {
    let mut out = format!(
        "{:<16} {:>6} {:>6} {:>6}\n",
        "HOST", "CPU", "MEM", "DISK"
    );
    for host in hosts {
        out.push_str(&format!(
            "{:<16} {:>5.0}% {:>5.0}% {:>5.0}%\n",
            host.ip,
            host.cpu_fraction() * 100.0,
            host.mem_fraction() * 100.0,
            host.disk_fraction() * 100.0
        ));
    }
    out
}

pub fn components(components: &ProjectComponents) -> String {
    let mut out = String::new();
    for component in components.iter() {
        out.push_str(&format!("{} {}\n", component.name(), component.version()));
        for commit in &component.commits {
            out.push_str(&format!("  {} {}\n", commit.id, commit.message));
        }
    }
    out
}

pub fn build_preview(request: &BuildRequest, host: Option<&HostResources>) -> String {
    let mut out = format!(
        "project:  {} {}\nprofile:  {}\nchannel:  {}\nsizing:   {} vCPU, {} GB RAM, {} GB disk\n",
        project_label(&request.app_name),
        request.app_version,
        ware_version_label(request.ware_version),
        channel_label(&request.channel),
        request.cpu,
        request.memory,
        request.disk,
    );
    if request.ware_version.uses_deploy_host() {
        out.push_str(&format!("host:     {}\n", request.deploy_host));
        if let Some(host) = host {
            out.push_str(&format!(
                "          cpu {:.0}%, mem {:.0}%, disk {:.0}% used\n",
                host.cpu_fraction() * 100.0,
                host.mem_fraction() * 100.0,
                host.disk_fraction() * 100.0
            ));
        }
    }
    if request.ware_version.uses_cloud_platform() {
        out.push_str(&format!(
            "cloud:    {}\n",
            cloud_platform_label(request.cloud_platform)
        ));
    }
    if request.is_new {
        out.push_str("rebuild:  from scratch\n");
    }
    for (component, commit) in &request.projects {
        out.push_str(&format!("  {component} = {commit}\n"));
    }
    out
}

pub fn vms(vms: &[Vm]) -> String {
    let mut out = format!(
        "{:<38} {:<20} {:<16} {:<10} {}\n",
        "UUID", "NAME", "IP", "OS", "POWER"
    );
    for vm in vms {
        out.push_str(&format!(
            "{:<38} {:<20} {:<16} {:<10} {}\n",
            vm.vm_uuid,
            vm.vm_name,
            vm.vm_ip,
            vm.vm_os,
            vm_power_label(&vm.vm_state)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_countdown_is_a_dash() {
        assert_eq!(countdown_cell(&Countdown::Expired), "-");
        assert_eq!(
            countdown_cell(&Countdown::Active {
                remaining: "01:00:00".into(),
                fraction: 0.5,
            }),
            "01:00:00 (50%)"
        );
    }

    #[test]
    fn state_cells_carry_tone_marker() {
        assert_eq!(state_cell(&BuildState::Success), "+Succeeded");
        assert_eq!(state_cell(&BuildState::from("QUEUED")), "?QUEUED");
    }

    #[test]
    fn hard_preview_omits_host_and_cloud() {
        let request = BuildRequest {
            app_version: "3.2.0".into(),
            ware_version: metis_types::WareVersion::Hard,
            ..Default::default()
        };
        let text = build_preview(&request, None);
        assert!(text.contains("Hardware"));
        assert!(!text.contains("host:"));
        assert!(!text.contains("cloud:"));
    }
}

//! Picks the one network stack that governs the host.
//!
//! Checks run in a fixed priority order and the first hit wins:
//! a netplan directory holding YAML, a running NetworkManager, systemd with
//! networkctl, and finally raw iproute2 which is always available.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};

use super::BackendKind;
use crate::{
    config::HostPaths,
    helper::command::{CommandRunner, run_tolerant},
};

pub fn detect(paths: &HostPaths, runner: &dyn CommandRunner) -> BackendKind {
    let backend = if has_netplan_yaml(&paths.netplan_dir) {
        BackendKind::Netplan
    } else if network_manager_running(runner) {
        BackendKind::NetworkManager
    } else if paths.systemd_run_dir.exists() && runner.has_program("networkctl") {
        BackendKind::SystemdNetworkd
    } else {
        BackendKind::RawIproute2
    };

    info!(target: "staticip::detect", "-- Detected backend {backend}");
    backend
}

/// Netplan YAML files in `dir`, sorted by file name.
pub fn netplan_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

fn has_netplan_yaml(dir: &Path) -> bool {
    !netplan_files(dir).is_empty()
}

/// A state query that cannot be answered counts as running: a missing or
/// broken answer is not proof the daemon is down.
fn network_manager_running(runner: &dyn CommandRunner) -> bool {
    if !runner.has_program("nmcli") {
        return false;
    }

    match run_tolerant(runner, &["nmcli", "-t", "-f", "RUNNING", "general"]) {
        Some(output) if output.success() => {
            let running = output.stdout.to_lowercase().contains("running");
            debug!(target: "staticip::detect", "- nmcli reports running={running}");
            running
        }
        _ => {
            debug!(target: "staticip::detect", "- nmcli state query failed, assuming NetworkManager is active");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::command::fake::FakeRunner;

    const NM_STATE: [&str; 5] = ["nmcli", "-t", "-f", "RUNNING", "general"];

    fn host() -> (tempfile::TempDir, HostPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths::under(dir.path());
        (dir, paths)
    }

    fn every_tool() -> FakeRunner {
        FakeRunner::new()
            .with_program("nmcli")
            .with_program("networkctl")
            .respond(&NM_STATE, 0, "running\n")
    }

    #[test]
    fn netplan_yaml_wins_over_everything() {
        let (_dir, paths) = host();
        fs::create_dir_all(&paths.netplan_dir).unwrap();
        fs::create_dir_all(&paths.systemd_run_dir).unwrap();
        fs::write(paths.netplan_dir.join("50-cloud-init.yaml"), "network: {}\n").unwrap();

        let runner = every_tool();
        assert_eq!(detect(&paths, &runner), BackendKind::Netplan);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn yml_extension_counts_as_netplan() {
        let (_dir, paths) = host();
        fs::create_dir_all(&paths.netplan_dir).unwrap();
        fs::write(paths.netplan_dir.join("01-netcfg.yml"), "").unwrap();

        assert_eq!(detect(&paths, &FakeRunner::new()), BackendKind::Netplan);
    }

    #[test]
    fn empty_netplan_dir_is_ignored() {
        let (_dir, paths) = host();
        fs::create_dir_all(&paths.netplan_dir).unwrap();
        fs::write(paths.netplan_dir.join("README"), "").unwrap();

        assert_eq!(detect(&paths, &every_tool()), BackendKind::NetworkManager);
    }

    #[test]
    fn running_network_manager_is_selected() {
        let (_dir, paths) = host();
        let runner = FakeRunner::new()
            .with_program("nmcli")
            .respond(&NM_STATE, 0, "RUNNING\n");
        assert_eq!(detect(&paths, &runner), BackendKind::NetworkManager);
    }

    #[test]
    fn stopped_network_manager_falls_through() {
        let (_dir, paths) = host();
        fs::create_dir_all(&paths.systemd_run_dir).unwrap();
        let runner = FakeRunner::new()
            .with_program("nmcli")
            .with_program("networkctl")
            .respond(&NM_STATE, 0, "stopped\n");
        assert_eq!(detect(&paths, &runner), BackendKind::SystemdNetworkd);
    }

    #[test]
    fn failing_state_query_fails_open() {
        let (_dir, paths) = host();
        let failing = FakeRunner::new()
            .with_program("nmcli")
            .respond(&NM_STATE, 8, "");
        assert_eq!(detect(&paths, &failing), BackendKind::NetworkManager);

        let unspawnable = FakeRunner::new()
            .with_program("nmcli")
            .unspawnable(&["nmcli"]);
        assert_eq!(detect(&paths, &unspawnable), BackendKind::NetworkManager);
    }

    #[test]
    fn networkd_needs_both_runtime_dir_and_networkctl() {
        let (_dir, paths) = host();
        let runner = FakeRunner::new().with_program("networkctl");
        assert_eq!(detect(&paths, &runner), BackendKind::RawIproute2);

        fs::create_dir_all(&paths.systemd_run_dir).unwrap();
        assert_eq!(detect(&paths, &runner), BackendKind::SystemdNetworkd);
        assert_eq!(detect(&paths, &FakeRunner::new()), BackendKind::RawIproute2);
    }

    #[test]
    fn bare_host_falls_back_to_iproute2() {
        let (_dir, paths) = host();
        assert_eq!(detect(&paths, &FakeRunner::new()), BackendKind::RawIproute2);
    }

    #[test]
    fn netplan_files_are_sorted_by_name() {
        let (_dir, paths) = host();
        fs::create_dir_all(&paths.netplan_dir).unwrap();
        for name in ["90-b.yaml", "01-a.yml", "50-c.yaml", "notes.txt"] {
            fs::write(paths.netplan_dir.join(name), "").unwrap();
        }
        let names: Vec<_> = netplan_files(&paths.netplan_dir)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["01-a.yml", "50-c.yaml", "90-b.yaml"]);
    }
}

//! systemd-networkd backend: one `10-<iface>.network` unit, then a daemon restart.

use std::{fs, path::PathBuf};

use log::info;

use crate::{
    config::{HostPaths, NetworkConfig},
    error::StaticIpError,
    helper::{
        backup::backup,
        command::{CommandRunner, run_checked, run_tolerant},
    },
};

pub fn apply(
    config: &NetworkConfig,
    paths: &HostPaths,
    runner: &dyn CommandRunner,
) -> Result<(), StaticIpError> {
    fs::create_dir_all(&paths.networkd_dir).map_err(|source| StaticIpError::Write {
        path: paths.networkd_dir.clone(),
        source,
    })?;

    let unit = unit_path(paths, config.interface());
    backup(&unit)?;
    fs::write(&unit, render(config)).map_err(|source| StaticIpError::Write {
        path: unit.clone(),
        source,
    })?;
    info!(target: "staticip::networkd::apply", "-- Wrote {}", unit.display());

    // enabling an already running daemon is allowed to complain
    run_tolerant(runner, &["systemctl", "enable", "--now", "systemd-networkd"]);
    run_checked(runner, &["systemctl", "restart", "systemd-networkd"])?;
    Ok(())
}

pub fn unit_path(paths: &HostPaths, interface: &str) -> PathBuf {
    paths.networkd_dir.join(format!("10-{interface}.network"))
}

pub fn render(config: &NetworkConfig) -> String {
    let mut lines = vec![
        "[Match]".to_string(),
        format!("Name={}", config.interface()),
        String::new(),
        "[Network]".to_string(),
        format!("Address={}", config.cidr()),
        format!("Gateway={}", config.gateway()),
        format!("DNS={}", config.dns_joined(" ")),
    ];
    if let Some(domain) = config.search() {
        lines.push(format!("Domains={domain}"));
    }
    lines.join("\n") + "\n"
}

//! Raw iproute2 backend.
//!
//! Last resort when no network manager owns the host: the address, link state
//! and default route are set directly with `ip`, and resolv.conf is rewritten
//! when it is a plain file. Nothing here survives a reboot.

use std::{fs, io::ErrorKind, path::Path};

use log::info;

use crate::{
    config::{HostPaths, NetworkConfig},
    error::StaticIpError,
    helper::{
        backup::backup,
        command::{CommandRunner, run_checked, run_tolerant},
    },
};

/// Drives one interface's kernel state through the `ip` tool.
pub struct IpRoute2Manager<'a> {
    interface_name: &'a str,
    runner: &'a dyn CommandRunner,
}

impl<'a> IpRoute2Manager<'a> {
    pub fn new(interface_name: &'a str, runner: &'a dyn CommandRunner) -> Self {
        IpRoute2Manager {
            interface_name,
            runner,
        }
    }

    /// Drops every address on the interface. Having none to drop is fine.
    pub fn flush_addresses(&self) {
        info!(target: "staticip::iproute2::flush", "-- Flushing addresses on {}", self.interface_name);
        run_tolerant(self.runner, &["ip", "addr", "flush", "dev", self.interface_name]);
    }

    pub fn add_address(&self, cidr: &str) -> Result<(), StaticIpError> {
        info!(target: "staticip::iproute2::add_address", "-- Adding {} to {}", cidr, self.interface_name);
        run_checked(self.runner, &["ip", "addr", "add", cidr, "dev", self.interface_name])?;
        Ok(())
    }

    pub fn enable(&self) -> Result<(), StaticIpError> {
        run_checked(self.runner, &["ip", "link", "set", self.interface_name, "up"])?;
        Ok(())
    }

    pub fn replace_default_route(&self, gateway: &str) -> Result<(), StaticIpError> {
        info!(target: "staticip::iproute2::set_gateway", "-- Default route via {} on {}", gateway, self.interface_name);
        run_checked(
            self.runner,
            &["ip", "route", "replace", "default", "via", gateway, "dev", self.interface_name],
        )?;
        Ok(())
    }
}

pub fn apply(
    config: &NetworkConfig,
    paths: &HostPaths,
    runner: &dyn CommandRunner,
) -> Result<(), StaticIpError> {
    let manager = IpRoute2Manager::new(config.interface(), runner);
    manager.flush_addresses();
    manager.add_address(&config.cidr())?;
    manager.enable()?;
    manager.replace_default_route(&config.gateway().to_string())?;

    set_dns(config, &paths.resolv_conf)
}

/// Rewrites resolv.conf in place unless it is missing or a symlink, which
/// means something else (systemd-resolved, resolvconf) owns it.
pub fn set_dns(config: &NetworkConfig, resolv_conf: &Path) -> Result<(), StaticIpError> {
    match fs::symlink_metadata(resolv_conf) {
        Ok(meta) if meta.file_type().is_file() => {}
        Ok(_) => {
            info!(target: "staticip::iproute2::set_dns", "- {} is not a regular file, leaving it alone", resolv_conf.display());
            return Ok(());
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(target: "staticip::iproute2::set_dns", "- {} does not exist, skipping DNS", resolv_conf.display());
            return Ok(());
        }
        Err(source) => {
            return Err(StaticIpError::Write {
                path: resolv_conf.to_path_buf(),
                source,
            });
        }
    }

    backup(resolv_conf)?;
    fs::write(resolv_conf, render_resolv_conf(config)).map_err(|source| StaticIpError::Write {
        path: resolv_conf.to_path_buf(),
        source,
    })?;
    info!(target: "staticip::iproute2::set_dns", "-- Setting DNS servers {:?} in {}", config.dns(), resolv_conf.display());
    Ok(())
}

pub fn render_resolv_conf(config: &NetworkConfig) -> String {
    let search = config.search().map(|domain| format!("search {domain}\n"));
    let nameservers: String = config
        .dns()
        .iter()
        .map(|server| format!("nameserver {server}\n"))
        .collect();
    search.unwrap_or_default() + &nameservers
}

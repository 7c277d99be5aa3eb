//! Netplan backend.
//!
//! Writes the interface definition into the first existing netplan YAML file
//! (or a new `99-static-ip.yaml`), then runs `netplan generate` and
//! `netplan apply`. A failed apply leaves the new file in place for inspection.

use std::{collections::BTreeMap, fs, net::Ipv4Addr, path::PathBuf};

use log::info;
use serde::Serialize;

use super::detect::netplan_files;
use crate::{
    config::{HostPaths, NetworkConfig},
    error::StaticIpError,
    helper::{
        backup::backup,
        command::{CommandRunner, run_checked},
    },
};

pub const DEFAULT_NETPLAN_YAML: &str = "99-static-ip.yaml";

#[derive(Debug, Serialize)]
struct NetplanDocument<'a> {
    network: Network<'a>,
}

#[derive(Debug, Serialize)]
struct Network<'a> {
    version: u8,
    ethernets: BTreeMap<&'a str, Ethernet<'a>>,
}

#[derive(Debug, Serialize)]
struct Ethernet<'a> {
    dhcp4: bool,
    addresses: Vec<String>,
    routes: Vec<Route>,
    nameservers: Nameservers<'a>,
}

#[derive(Debug, Serialize)]
struct Route {
    to: &'static str,
    via: Ipv4Addr,
}

#[derive(Debug, Serialize)]
struct Nameservers<'a> {
    addresses: &'a [Ipv4Addr],
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<Vec<&'a str>>,
}

pub fn apply(
    config: &NetworkConfig,
    paths: &HostPaths,
    runner: &dyn CommandRunner,
) -> Result<(), StaticIpError> {
    let target = target_file(paths);
    let content = render(config)?;

    backup(&target)?;
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir).map_err(|source| StaticIpError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::write(&target, content).map_err(|source| StaticIpError::Write {
        path: target.clone(),
        source,
    })?;
    info!(target: "staticip::netplan::apply", "-- Wrote {}", target.display());

    run_checked(runner, &["netplan", "generate"])?;
    run_checked(runner, &["netplan", "apply"])?;
    Ok(())
}

/// First YAML file by name, or the conventional new file.
pub fn target_file(paths: &HostPaths) -> PathBuf {
    netplan_files(&paths.netplan_dir)
        .into_iter()
        .next()
        .unwrap_or_else(|| paths.netplan_dir.join(DEFAULT_NETPLAN_YAML))
}

pub fn render(config: &NetworkConfig) -> Result<String, serde_yaml::Error> {
    let ethernet = Ethernet {
        dhcp4: false,
        addresses: vec![config.cidr()],
        routes: vec![Route {
            to: "default",
            via: config.gateway(),
        }],
        nameservers: Nameservers {
            addresses: config.dns(),
            search: config.search().map(|domain| vec![domain]),
        },
    };

    let document = NetplanDocument {
        network: Network {
            version: 2,
            ethernets: BTreeMap::from([(config.interface(), ethernet)]),
        },
    };
    serde_yaml::to_string(&document)
}

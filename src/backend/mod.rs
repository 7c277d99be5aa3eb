//! Network stack backends.
//!
//! Each backend both persists the configuration in its own idiom and makes it
//! take effect on the live system. The first failing step aborts the backend
//! and the error names the command or file that failed.

pub mod detect;
pub mod iproute2;
pub mod netplan;
pub mod networkd;
pub mod nmcli;

use std::fmt;

use clap::ValueEnum;

use crate::{
    config::{HostPaths, NetworkConfig},
    error::StaticIpError,
    helper::command::CommandRunner,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// NetworkManager, driven through nmcli
    #[value(name = "nmcli")]
    NetworkManager,
    /// A netplan YAML file followed by `netplan generate` and `netplan apply`
    Netplan,
    /// A systemd-networkd `.network` unit
    #[value(name = "networkd")]
    SystemdNetworkd,
    /// Direct `ip` calls plus resolv.conf, lost on reboot
    #[value(name = "iproute2")]
    RawIproute2,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::NetworkManager => "nmcli",
            BackendKind::Netplan => "netplan",
            BackendKind::SystemdNetworkd => "networkd",
            BackendKind::RawIproute2 => "iproute2",
        };
        f.write_str(name)
    }
}

impl BackendKind {
    /// Whether the backend's change survives a reboot.
    pub fn is_persistent(self) -> bool {
        !matches!(self, BackendKind::RawIproute2)
    }

    pub fn apply(
        self,
        config: &NetworkConfig,
        paths: &HostPaths,
        runner: &dyn CommandRunner,
    ) -> Result<(), StaticIpError> {
        match self {
            BackendKind::NetworkManager => nmcli::apply(config, runner),
            BackendKind::Netplan => netplan::apply(config, paths, runner),
            BackendKind::SystemdNetworkd => networkd::apply(config, paths, runner),
            BackendKind::RawIproute2 => iproute2::apply(config, paths, runner),
        }
    }
}

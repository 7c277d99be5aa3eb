use std::{
    fmt,
    net::Ipv4Addr,
    path::{Path, PathBuf},
};

use crate::{
    error::{Field, StaticIpError},
    helper::validate::{self, ValidationError},
};

pub const NETPLAN_DIR: &str = "/etc/netplan";
pub const NETWORKD_DIR: &str = "/etc/systemd/network";
pub const SYSTEMD_RUN_DIR: &str = "/run/systemd/system";
pub const RESOLV_CONF: &str = "/etc/resolv.conf";

/// Filesystem locations the detector and the backends read or write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub netplan_dir: PathBuf,
    pub networkd_dir: PathBuf,
    pub systemd_run_dir: PathBuf,
    pub resolv_conf: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self::under("/")
    }
}

impl HostPaths {
    /// Re-roots every location below `root`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let rooted = |path: &str| root.join(path.trim_start_matches('/'));
        HostPaths {
            netplan_dir: rooted(NETPLAN_DIR),
            networkd_dir: rooted(NETWORKD_DIR),
            systemd_run_dir: rooted(SYSTEMD_RUN_DIR),
            resolv_conf: rooted(RESOLV_CONF),
        }
    }
}

/// Raw, unvalidated values as collected from the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigRequest {
    pub interface: String,
    pub address: String,
    pub prefix: String,
    pub gateway: String,
    pub dns: String,
    pub search: Option<String>,
}

impl ConfigRequest {
    /// Checks every field and builds the only way to obtain a [`NetworkConfig`].
    pub fn validate(&self) -> Result<NetworkConfig, StaticIpError> {
        let interface = validate::interface(&self.interface).map_err(invalid(Field::Interface))?;
        let address = validate::ipv4(self.address.trim()).map_err(invalid(Field::Address))?;
        let prefix = validate::prefix(self.prefix.trim()).map_err(invalid(Field::Prefix))?;
        let gateway = validate::ipv4(self.gateway.trim()).map_err(invalid(Field::Gateway))?;
        let dns = validate::dns_list(&self.dns).map_err(invalid(Field::Dns))?;
        let search = match self.search.as_deref() {
            Some(search) => validate::search_domain(search).map_err(invalid(Field::Search))?,
            None => None,
        };

        Ok(NetworkConfig {
            interface,
            address,
            prefix,
            gateway,
            dns,
            search,
        })
    }
}

fn invalid(field: Field) -> impl FnOnce(ValidationError) -> StaticIpError {
    move |source| StaticIpError::Validation { field, source }
}

/// A validated static configuration for one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    interface: String,
    address: Ipv4Addr,
    prefix: u8,
    gateway: Ipv4Addr,
    dns: Vec<Ipv4Addr>,
    search: Option<String>,
}

impl NetworkConfig {
    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Address and prefix as a single `a.b.c.d/n` literal.
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.address(), self.prefix())
    }

    pub fn gateway(&self) -> Ipv4Addr {
        self.gateway
    }

    pub fn dns(&self) -> &[Ipv4Addr] {
        &self.dns
    }

    pub fn dns_joined(&self, separator: &str) -> String {
        self.dns
            .iter()
            .map(Ipv4Addr::to_string)
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }
}

impl fmt::Display for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Interface : {}", self.interface)?;
        writeln!(f, "  Address   : {}", self.cidr())?;
        writeln!(f, "  Gateway   : {}", self.gateway)?;
        writeln!(f, "  DNS       : {}", self.dns_joined(", "))?;
        write!(f, "  Search    : {}", self.search.as_deref().unwrap_or("-"))
    }
}

#[cfg(test)]
pub(crate) fn sample_config(search: Option<&str>) -> NetworkConfig {
    ConfigRequest {
        interface: "eth0".into(),
        address: "10.0.0.5".into(),
        prefix: "24".into(),
        gateway: "10.0.0.1".into(),
        dns: "8.8.8.8,1.1.1.1".into(),
        search: search.map(str::to_string),
    }
    .validate()
    .expect("sample config is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_normalizes_request() {
        let config = sample_config(Some("  lab.example  "));
        assert_eq!(config.interface(), "eth0");
        assert_eq!(config.cidr(), "10.0.0.5/24");
        assert_eq!(config.gateway(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(config.dns_joined(","), "8.8.8.8,1.1.1.1");
        assert_eq!(config.search(), Some("lab.example"));
    }

    #[test]
    fn blank_search_domain_becomes_none() {
        assert_eq!(sample_config(Some("   ")).search(), None);
    }

    #[test]
    fn validate_reports_field_and_reason() {
        let request = ConfigRequest {
            gateway: "999.1.1.1".into(),
            ..sample_request()
        };
        match request.validate() {
            Err(StaticIpError::Validation { field, source }) => {
                assert_eq!(field, Field::Gateway);
                assert_eq!(source, ValidationError::OctetOutOfRange);
            }
            other => panic!("expected gateway validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_search_domain_injection() {
        let request = ConfigRequest {
            search: Some("lab.example\nDNS=6.6.6.6".into()),
            ..sample_request()
        };
        match request.validate() {
            Err(StaticIpError::Validation { field, source }) => {
                assert_eq!(field, Field::Search);
                assert!(matches!(source, ValidationError::InvalidSearchDomain(_)));
            }
            other => panic!("expected search domain validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_interface_outside_device_names() {
        for interface in ["../../../escaped", "-eth0", "eth 0", "abcdefghijklmnop"] {
            let request = ConfigRequest {
                interface: interface.into(),
                ..sample_request()
            };
            match request.validate() {
                Err(StaticIpError::Validation { field, source }) => {
                    assert_eq!(field, Field::Interface);
                    assert!(matches!(source, ValidationError::InvalidInterface { .. }));
                }
                other => panic!("expected interface validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn host_paths_reroot_every_location() {
        let paths = HostPaths::under("/tmp/host");
        assert_eq!(paths.netplan_dir, PathBuf::from("/tmp/host/etc/netplan"));
        assert_eq!(
            paths.networkd_dir,
            PathBuf::from("/tmp/host/etc/systemd/network")
        );
        assert_eq!(
            paths.systemd_run_dir,
            PathBuf::from("/tmp/host/run/systemd/system")
        );
        assert_eq!(paths.resolv_conf, PathBuf::from("/tmp/host/etc/resolv.conf"));
        assert_eq!(HostPaths::default().resolv_conf, PathBuf::from(RESOLV_CONF));
    }

    fn sample_request() -> ConfigRequest {
        ConfigRequest {
            interface: "eth0".into(),
            address: "10.0.0.5".into(),
            prefix: "24".into(),
            gateway: "10.0.0.1".into(),
            dns: "8.8.8.8".into(),
            search: None,
        }
    }
}

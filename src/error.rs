use std::path::PathBuf;

use thiserror::Error;

use crate::helper::validate::ValidationError;

/// Which user-supplied value a [`ValidationError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Interface,
    Address,
    Prefix,
    Gateway,
    Dns,
    Search,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::Interface => "interface",
            Field::Address => "address",
            Field::Prefix => "prefix",
            Field::Gateway => "gateway",
            Field::Dns => "DNS servers",
            Field::Search => "search domain",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum StaticIpError {
    #[error("Invalid {field}: {source}")]
    Validation {
        field: Field,
        #[source]
        source: ValidationError,
    },
    #[error("Command `{command}` failed with exit code {}: {stderr}", code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("Could not run `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Backup of {} failed: {source}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Writing {} failed: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Netplan document could not be rendered: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Could not detect a network interface, pass one with --interface")]
    NoInterface,
    #[error("Missing required value for {0}")]
    MissingValue(Field),
    #[error("This tool must be run as root")]
    NotRoot,
    #[error("System IO Error: {0}")]
    Io(#[from] std::io::Error),
}

impl StaticIpError {
    /// Process exit status for this failure.
    ///
    /// A failed external tool hands its own exit code through when it fits in
    /// a process status, everything else collapses to a generic code.
    pub fn exit_code(&self) -> i32 {
        match self {
            StaticIpError::CommandFailed {
                code: Some(code), ..
            } if (1..=255).contains(code) => *code,
            StaticIpError::Validation { .. }
            | StaticIpError::MissingValue(_)
            | StaticIpError::NoInterface => 2,
            _ => 1,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StaticIpError::Validation { .. })
    }
}

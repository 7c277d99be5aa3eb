//! Validation Helper Module
//!
//! Pure checks for the raw strings an operator types in. Each validator either
//! returns the parsed value or a [`ValidationError`] naming the exact reason the
//! input was rejected, so callers can re-prompt with a useful message.

use std::net::Ipv4Addr;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Not an IPv4 address (expected 4 dot-separated octets, found {0})")]
    WrongSegmentCount(usize),
    #[error("IPv4 octets must be numeric")]
    NonNumericOctet,
    #[error("IPv4 octet out of range (0-255)")]
    OctetOutOfRange,
    #[error("Prefix must be numeric")]
    NonNumericPrefix,
    #[error("Prefix must be between 1 and 32")]
    PrefixOutOfRange,
    #[error("Provide at least one DNS server")]
    NoDnsServers,
    #[error("DNS '{entry}' invalid: {reason}")]
    InvalidDnsServer {
        entry: String,
        reason: Box<ValidationError>,
    },
    #[error("Interface name must not be empty")]
    EmptyInterface,
    #[error("Interface name {name:?} {reason}")]
    InvalidInterface { name: String, reason: &'static str },
    #[error("Search domain {0:?} must not contain whitespace or control characters")]
    InvalidSearchDomain(String),
}

/// Longest name the kernel accepts for a network device (`IFNAMSIZ - 1`).
pub const MAX_INTERFACE_LEN: usize = libc::IFNAMSIZ - 1;

fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Accepts exactly four dot-separated, all-digit octets in `0..=255`.
pub fn ipv4(value: &str) -> Result<Ipv4Addr, ValidationError> {
    let segments: Vec<&str> = value.split('.').collect();
    if segments.len() != 4 {
        return Err(ValidationError::WrongSegmentCount(segments.len()));
    }

    let mut octets = [0u8; 4];
    for (octet, segment) in octets.iter_mut().zip(&segments) {
        if !is_all_digits(segment) {
            return Err(ValidationError::NonNumericOctet);
        }
        // all-digit input can only fail to parse by overflowing
        *octet = segment
            .parse::<u8>()
            .map_err(|_| ValidationError::OctetOutOfRange)?;
    }

    Ok(Ipv4Addr::from(octets))
}

/// Accepts a digit string in `1..=32`.
pub fn prefix(value: &str) -> Result<u8, ValidationError> {
    if !is_all_digits(value) {
        return Err(ValidationError::NonNumericPrefix);
    }
    match value.parse::<u8>() {
        Ok(n @ 1..=32) => Ok(n),
        _ => Err(ValidationError::PrefixOutOfRange),
    }
}

/// Splits a comma-separated list, drops blank entries and validates the rest.
pub fn dns_list(value: &str) -> Result<Vec<Ipv4Addr>, ValidationError> {
    let entries: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();

    if entries.is_empty() {
        return Err(ValidationError::NoDnsServers);
    }

    entries
        .into_iter()
        .map(|entry| {
            ipv4(entry).map_err(|reason| ValidationError::InvalidDnsServer {
                entry: entry.to_string(),
                reason: Box::new(reason),
            })
        })
        .collect()
}

/// Accepts a kernel device name: at most 15 bytes, no `/`, no whitespace or
/// control characters, and no leading `-`.
///
/// The name ends up in file names and on command lines, so anything that
/// could escape a directory or pass as an option is refused.
pub fn interface(value: &str) -> Result<String, ValidationError> {
    let name = value.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyInterface);
    }

    let reason = if name.len() > MAX_INTERFACE_LEN {
        Some("is longer than 15 bytes")
    } else if name.contains('/') {
        Some("must not contain '/'")
    } else if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Some("must not contain whitespace or control characters")
    } else if name.starts_with('-') {
        Some("must not start with '-'")
    } else if name == "." || name == ".." {
        Some("is not a device name")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ValidationError::InvalidInterface {
            name: name.to_string(),
            reason,
        }),
        None => Ok(name.to_string()),
    }
}

/// Trims an optional search domain. Blank input means no search domain.
pub fn search_domain(value: &str) -> Result<Option<String>, ValidationError> {
    let domain = value.trim();
    if domain.is_empty() {
        return Ok(None);
    }
    if domain.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidSearchDomain(domain.to_string()));
    }
    Ok(Some(domain.to_string()))
}

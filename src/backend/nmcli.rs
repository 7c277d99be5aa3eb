//! NetworkManager backend.
//!
//! Finds (or creates) the connection profile bound to the interface, rewrites
//! its IPv4 settings and bounces it so the change takes effect.

use log::info;

use crate::{
    config::NetworkConfig,
    error::StaticIpError,
    helper::command::{CommandRunner, run_checked, run_tolerant},
};

pub fn apply(config: &NetworkConfig, runner: &dyn CommandRunner) -> Result<(), StaticIpError> {
    let iface = config.interface();
    let profile = resolve_profile(iface, runner)?;
    info!(target: "staticip::nmcli::apply", "-- Using connection profile '{profile}' for {iface}");

    let cidr = config.cidr();
    let gateway = config.gateway().to_string();
    let dns = config.dns_joined(",");
    // an empty value clears a search domain left by an earlier run
    let search = config.search().unwrap_or("");

    for (setting, value) in [
        ("ipv4.method", "manual"),
        ("ipv4.addresses", cidr.as_str()),
        ("ipv4.gateway", gateway.as_str()),
        ("ipv4.dns", dns.as_str()),
        ("ipv4.dns-search", search),
        ("connection.autoconnect", "yes"),
    ] {
        run_checked(runner, &["nmcli", "connection", "modify", &profile, setting, value])?;
    }

    // the profile may not have been active
    run_tolerant(runner, &["nmcli", "connection", "down", &profile]);
    run_checked(runner, &["nmcli", "connection", "up", &profile])?;

    info!(target: "staticip::nmcli::apply", "-- Reactivated '{profile}'");
    Ok(())
}

/// Active profile on `iface`, else any profile on `iface`, else a new `static-<iface>`.
fn resolve_profile(iface: &str, runner: &dyn CommandRunner) -> Result<String, StaticIpError> {
    let active = run_checked(
        runner,
        &["nmcli", "-t", "-f", "NAME,DEVICE", "connection", "show", "--active"],
    )?;
    if let Some(name) = profile_for_device(&active.stdout, iface) {
        return Ok(name);
    }

    let all = run_checked(runner, &["nmcli", "-t", "-f", "NAME,DEVICE", "connection", "show"])?;
    if let Some(name) = profile_for_device(&all.stdout, iface) {
        return Ok(name);
    }

    let name = format!("static-{iface}");
    info!(target: "staticip::nmcli::resolve_profile", "- No profile bound to {iface}, creating '{name}'");
    run_checked(
        runner,
        &["nmcli", "connection", "add", "type", "ethernet", "ifname", iface, "con-name", &name],
    )?;
    Ok(name)
}

/// Scans `nmcli -t -f NAME,DEVICE` output for the profile on `iface`.
fn profile_for_device(terse: &str, iface: &str) -> Option<String> {
    terse.lines().find_map(|line| {
        let (name, device) = split_terse(line)?;
        (device == iface).then_some(name)
    })
}

/// Splits a terse `NAME:DEVICE` line, honouring the `\:` and `\\` escapes nmcli
/// applies inside field values.
fn split_terse(line: &str) -> Option<(String, String)> {
    let mut fields = vec![String::new()];
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    fields.last_mut()?.push(escaped);
                }
            }
            ':' => fields.push(String::new()),
            _ => fields.last_mut()?.push(c),
        }
    }

    let device = fields.pop()?;
    let name = fields.pop()?;
    (!name.is_empty()).then_some((name, device))
}

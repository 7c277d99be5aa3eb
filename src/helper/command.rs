//! Command Helper Module
//!
//! Every backend drives the host through external tools (`nmcli`, `netplan`,
//! `systemctl`, `ip`). They all go through the narrow [`CommandRunner`] seam so
//! the backends can be exercised against a recording fake instead of a live host.

use std::{
    env,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process::Command,
};

use log::{debug, warn};

use crate::error::StaticIpError;

/// Search path used both to locate tools and to run them, so a trimmed
/// `PATH` under sudo cannot hide the sbin directories.
pub const SYSTEM_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Outcome of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub trait CommandRunner {
    /// Runs `argv[0]` with the remaining arguments and waits for it to finish.
    ///
    /// A non-zero exit is reported through [`CommandOutput::code`], only a
    /// failure to start the process is an `Err`.
    fn execute(&self, argv: &[&str]) -> Result<CommandOutput, StaticIpError>;

    /// Whether `program` can be found on the search path.
    fn has_program(&self, program: &str) -> bool;
}

/// Runs commands on the real host.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn execute(&self, argv: &[&str]) -> Result<CommandOutput, StaticIpError> {
        let (program, args) = argv.split_first().ok_or_else(|| StaticIpError::CommandSpawn {
            command: String::new(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty command line",
            ),
        })?;

        let output = Command::new(program)
            .env("PATH", search_path())
            .args(args)
            .output()
            .map_err(|source| StaticIpError::CommandSpawn {
                command: argv.join(" "),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn has_program(&self, program: &str) -> bool {
        find_program(program, &search_path()).is_some()
    }
}

fn search_path() -> String {
    match env::var("PATH") {
        Ok(path) if !path.is_empty() => format!("{path}:{SYSTEM_PATH}"),
        _ => SYSTEM_PATH.to_string(),
    }
}

/// Finds the first executable regular file named `program` on `path`.
pub fn find_program(program: &str, path: &str) -> Option<PathBuf> {
    env::split_paths(path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Runs a command whose failure aborts the current backend.
pub fn run_checked(
    runner: &dyn CommandRunner,
    argv: &[&str],
) -> Result<CommandOutput, StaticIpError> {
    debug!(target: "staticip::command::run", "$ {}", argv.join(" "));
    let output = runner.execute(argv)?;
    if !output.success() {
        return Err(StaticIpError::CommandFailed {
            command: argv.join(" "),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output)
}

/// Runs a command whose failure is expected on some hosts and only logged.
pub fn run_tolerant(runner: &dyn CommandRunner, argv: &[&str]) -> Option<CommandOutput> {
    debug!(target: "staticip::command::run", "$ {}", argv.join(" "));
    match runner.execute(argv) {
        Ok(output) if output.success() => Some(output),
        Ok(output) => {
            warn!(target: "staticip::command::run", "- `{}` exited with {:?}, continuing: {}", argv.join(" "), output.code, output.stderr.trim());
            Some(output)
        }
        Err(err) => {
            warn!(target: "staticip::command::run", "- {err}, continuing");
            None
        }
    }
}

/// Interface carrying the default route, else the first non-loopback link that is up.
pub fn default_interface(runner: &dyn CommandRunner) -> Option<String> {
    let from_route = runner
        .execute(&["ip", "route", "show", "default"])
        .ok()
        .filter(CommandOutput::success)
        .and_then(|output| {
            output.stdout.lines().find_map(|line| {
                let mut tokens = line.split_whitespace();
                tokens.find(|token| *token == "dev")?;
                tokens.next().map(str::to_string)
            })
        });
    if from_route.is_some() {
        return from_route;
    }

    let output = runner
        .execute(&["ip", "-o", "link", "show", "up"])
        .ok()
        .filter(CommandOutput::success)?;
    output.stdout.lines().find_map(|line| {
        // "2: eth0: <BROADCAST,...> mtu 1500 ..." and "3: veth0@if2: ..."
        let name = line.split(':').nth(1)?.trim();
        let name = name.split('@').next().unwrap_or(name);
        (!name.is_empty() && name != "lo").then(|| name.to_string())
    })
}

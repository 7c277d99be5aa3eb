mod backend;
mod config;
mod error;
mod helper;
mod orchestrator;
mod prompt;

use std::{
    io::{self, IsTerminal},
    process::ExitCode,
};

use clap::Parser;
use log::{LevelFilter, error};

use crate::{
    backend::BackendKind,
    config::{ConfigRequest, HostPaths},
    error::{Field, StaticIpError},
    helper::{
        command::{SystemRunner, default_interface},
        validate,
    },
    orchestrator::Orchestrator,
    prompt::Prompter,
};

/// Configure a static IPv4 address, gateway and DNS servers on the primary
/// interface through whichever network stack manages this host.
#[derive(Parser, Debug)]
#[command(name = "staticip", version)]
struct CommandLine {
    /// Interface to configure (defaults to the one carrying the default route)
    #[arg(short, long)]
    interface: Option<String>,
    /// Static IPv4 address
    #[arg(short, long)]
    address: Option<String>,
    /// CIDR prefix length
    #[arg(short, long)]
    prefix: Option<String>,
    /// Default gateway
    #[arg(short, long)]
    gateway: Option<String>,
    /// Comma-separated DNS servers
    #[arg(short, long)]
    dns: Option<String>,
    /// DNS search domain
    #[arg(short, long)]
    search: Option<String>,
    /// Skip detection and use this backend
    #[arg(short, long, value_enum)]
    backend: Option<BackendKind>,
    /// Never prompt; missing values are an error
    #[arg(short, long)]
    yes: bool,
    /// Log debug output, including every command run
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = CommandLine::parse();
    init_logging(&args);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(target: "staticip::main", "{err}");
            if err.is_validation() {
                eprintln!("ERROR: {err}. Nothing was changed.");
            } else {
                eprintln!("ERROR: {err}");
            }
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}

fn init_logging(args: &CommandLine) {
    let level = if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(args: CommandLine) -> Result<(), StaticIpError> {
    if unsafe { libc::geteuid() } != 0 {
        return Err(StaticIpError::NotRoot);
    }

    let paths = HostPaths::default();
    let runner = SystemRunner;
    let interactive = !args.yes && io::stdin().is_terminal();
    let request = collect_request(&args, interactive, &runner)?;

    Orchestrator::new(&paths, &runner).configure(&request, args.backend, |plan| {
        println!("\n[SUMMARY]\n{plan}");
    })?;
    println!("\n[OK] Configuration applied.");
    Ok(())
}

/// Fills in every value missing from the command line, prompting when allowed.
fn collect_request(
    args: &CommandLine,
    interactive: bool,
    runner: &SystemRunner,
) -> Result<ConfigRequest, StaticIpError> {
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    let interface = match &args.interface {
        Some(interface) => interface.clone(),
        None => {
            let detected = default_interface(runner);
            let answer = if interactive {
                prompter.ask(
                    "Interface (Enter for auto-detect)",
                    detected.as_deref(),
                    false,
                    validate::interface,
                )?
            } else {
                String::new()
            };
            match (answer.trim(), detected) {
                ("", Some(detected)) => detected,
                ("", None) => return Err(StaticIpError::NoInterface),
                (answer, _) => answer.to_string(),
            }
        }
    };

    let mut value = |given: &Option<String>,
                     field: Field,
                     message: &str,
                     default: Option<&str>,
                     check: &dyn Fn(&str) -> Result<(), validate::ValidationError>|
     -> Result<String, StaticIpError> {
        match (given, default) {
            (Some(given), _) => Ok(given.clone()),
            (None, _) if interactive => prompter.ask(message, default, true, check),
            (None, Some(default)) => Ok(default.to_string()),
            (None, None) => Err(StaticIpError::MissingValue(field)),
        }
    };

    let address = value(&args.address, Field::Address, "Static IP", None, &|s: &str| {
        validate::ipv4(s).map(drop)
    })?;
    let prefix = value(&args.prefix, Field::Prefix, "CIDR Prefix", Some("24"), &|s: &str| {
        validate::prefix(s).map(drop)
    })?;
    let gateway = value(&args.gateway, Field::Gateway, "Gateway", None, &|s: &str| {
        validate::ipv4(s).map(drop)
    })?;
    let dns = value(
        &args.dns,
        Field::Dns,
        "DNS servers (comma-separated)",
        None,
        &|s: &str| validate::dns_list(s).map(drop),
    )?;

    let search = match &args.search {
        Some(search) => Some(search.clone()),
        None if interactive => Some(prompter.ask(
            "DNS search domain (optional)",
            None,
            false,
            validate::search_domain,
        )?),
        None => None,
    };

    Ok(ConfigRequest {
        interface,
        address,
        prefix,
        gateway,
        dns,
        search,
    })
}

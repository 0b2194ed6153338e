// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing and help text for crd-warden.

use std::path::PathBuf;

/// Output format for `render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    Yaml,
    Json,
}

impl RenderFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            RenderFormat::Yaml => "yaml",
            RenderFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderArgs {
    pub out: Option<PathBuf>,
    pub format: RenderFormat,
}

/// Parse `render` options from `args[2..]`.
pub fn parse_render_args(args: &[String]) -> Result<RenderArgs, String> {
    let mut out = None;
    let mut format = RenderFormat::Yaml;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--out" => {
                let value = args.get(i + 1).ok_or("Missing value for --out")?;
                out = Some(PathBuf::from(value));
                i += 2;
            }
            "--format" => {
                let value = args.get(i + 1).ok_or("Missing value for --format")?;
                format = match value.as_str() {
                    "yaml" | "yml" => RenderFormat::Yaml,
                    "json" => RenderFormat::Json,
                    other => return Err(format!("Unknown format: {}", other)),
                };
                i += 2;
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }
    Ok(RenderArgs { out, format })
}

/// Parse `once` options from `args[2..]`; returns whether `--json` was given.
pub fn parse_once_args(args: &[String]) -> Result<bool, String> {
    let mut json = false;
    for arg in args.iter().skip(2) {
        match arg.as_str() {
            "--json" => json = true,
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }
    Ok(json)
}

/// Print general usage information.
pub fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "crd-warden - keeps resource definitions present in a declarative store v{}

USAGE:
    crd-warden [COMMAND] [OPTIONS]

COMMANDS:
    run          Run the reconcile loop until Ctrl-C (default when no command given)
    once         Run a single pass and exit
    render       Write the generated catalog as manifests
    config       Manage configuration (show, defaults, validate)
    version      Show version information
    help         Show this help message

OPTIONS:
    -h, --help     Show help for command
    -V, --version  Show version information

EXAMPLES:
    crd-warden                            # Run the loop (default)
    crd-warden once --json                # One pass, JSON report on stdout
    crd-warden render --out ./manifests   # Write <singular>.yaml per definition
    crd-warden config validate            # Validate configuration

ENVIRONMENT:
    CRD_WARDEN_CONFIG           Path to a TOML config file
    CRD_WARDEN_GROUP            Override the API group
    CRD_WARDEN_STORE_DIR        Override the store directory
    CRD_WARDEN_LOG_JSON         Emit JSON logs (true/false)
    CRD_WARDEN_MAX_CONCURRENCY  Override reconcile concurrency (0 = CPUs)
    RUST_LOG                    Log filter (overrides [log] filter)

EXIT CODES:
    0  Success / pass idle or healed
    1  Failure / pass degraded
    2  Configuration error
",
        version
    );
}

/// Print detailed help for a specific command.
pub fn print_command_help(command: &str) {
    match command {
        "run" => print_run_help(),
        "once" => print_once_help(),
        "render" => print_render_help(),
        "config" => print_config_help(),
        _ => {
            eprintln!(
                "No detailed help available for '{}'. Use 'crd-warden help' for general usage.",
                command
            );
        }
    }
}

fn print_run_help() {
    eprintln!(
        "crd-warden run - Run the reconcile loop

USAGE:
    crd-warden run

DESCRIPTION:
    Opens the store directory and reconciles the catalog until Ctrl-C.
    The first pass starts immediately; later passes follow the schedule
    (steady interval when idle, short interval after healing, backoff
    while degraded).
"
    );
}

fn print_once_help() {
    eprintln!(
        "crd-warden once - Run a single pass

USAGE:
    crd-warden once [--json]

OPTIONS:
    --json   Print the pass report as JSON on stdout

EXIT CODES:
    0  Pass idle or healed
    1  Pass degraded
    2  Configuration error
"
    );
}

fn print_render_help() {
    eprintln!(
        "crd-warden render - Write the generated catalog

USAGE:
    crd-warden render [--out DIR] [--format yaml|json]

OPTIONS:
    --out DIR        Write one <singular>.<ext> file per definition into DIR
                     (stdout when omitted)
    --format FORMAT  yaml (default) or json
"
    );
}

fn print_config_help() {
    eprintln!(
        "crd-warden config - Manage configuration

USAGE:
    crd-warden config <SUBCOMMAND>

SUBCOMMANDS:
    show           Show effective configuration
    validate       Validate configuration
    defaults       Show default configuration
"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_args() {
        let parsed =
            parse_render_args(&args(&["crd-warden", "render", "--out", "m", "--format", "json"]))
                .unwrap();
        assert_eq!(parsed.out, Some(PathBuf::from("m")));
        assert_eq!(parsed.format, RenderFormat::Json);

        let defaults = parse_render_args(&args(&["crd-warden", "render"])).unwrap();
        assert_eq!(defaults, RenderArgs { out: None, format: RenderFormat::Yaml });

        assert!(parse_render_args(&args(&["crd-warden", "render", "--out"])).is_err());
        assert!(parse_render_args(&args(&["crd-warden", "render", "--format", "xml"])).is_err());
    }

    #[test]
    fn test_once_args() {
        assert!(!parse_once_args(&args(&["crd-warden", "once"])).unwrap());
        assert!(parse_once_args(&args(&["crd-warden", "once", "--json"])).unwrap());
        assert!(parse_once_args(&args(&["crd-warden", "once", "--yaml"])).is_err());
    }
}

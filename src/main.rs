// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! crd-warden entry point.
//!
//! Loads configuration, installs logging and dispatches to the requested
//! command.

mod cli_parser;
mod runtime_init;

use std::process::ExitCode;

use runtime_init::{EXIT_CONFIG, EXIT_DEGRADED};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("run");

    match command {
        "run" | "" => run_loop().await,
        "once" => run_once(&args).await,
        "render" => run_render(&args).await,
        "config" => run_config_cmd(&args),
        "help" | "--help" | "-h" => {
            if let Some(sub) = args.get(2) {
                cli_parser::print_command_help(sub);
            } else {
                cli_parser::print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("crd-warden {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            cli_parser::print_usage();
            ExitCode::FAILURE
        }
    }
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(code as u8)
}

async fn run_loop() -> ExitCode {
    let config = match runtime_init::load_config() {
        Ok(c) => c,
        Err(code) => return exit(code),
    };
    runtime_init::init_logging(&config);
    match runtime_init::run_controller(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Controller error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_once(args: &[String]) -> ExitCode {
    let json = match cli_parser::parse_once_args(args) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("{}", e);
            cli_parser::print_command_help("once");
            return exit(EXIT_CONFIG);
        }
    };
    let config = match runtime_init::load_config() {
        Ok(c) => c,
        Err(code) => return exit(code),
    };
    runtime_init::init_logging(&config);
    exit(runtime_init::run_once(config, json).await)
}

async fn run_render(args: &[String]) -> ExitCode {
    let render_args = match cli_parser::parse_render_args(args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e);
            cli_parser::print_command_help("render");
            return exit(EXIT_CONFIG);
        }
    };
    let config = match runtime_init::load_config() {
        Ok(c) => c,
        Err(code) => return exit(code),
    };
    runtime_init::init_logging(&config);
    match runtime_init::run_render(config, render_args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Render error: {}", e);
            exit(EXIT_DEGRADED)
        }
    }
}

fn run_config_cmd(args: &[String]) -> ExitCode {
    let sub = args.get(2).map(|s| s.as_str()).unwrap_or("show");
    match sub {
        "show" => exit(runtime_init::run_config_show()),
        "defaults" => exit(runtime_init::run_config_defaults()),
        "validate" => exit(runtime_init::run_config_validate()),
        _ => {
            eprintln!("Unknown config subcommand: {}", sub);
            cli_parser::print_command_help("config");
            ExitCode::FAILURE
        }
    }
}

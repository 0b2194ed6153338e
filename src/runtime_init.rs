// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Runtime initialization and command implementations for crd-warden.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crd_warden::telemetry;
use crd_warden::{
    Controller, DirectoryStore, PassReport, PassState, Reconciler, ResourceDefinition,
    WardenConfig,
};

use crate::cli_parser::{RenderArgs, RenderFormat};

pub const EXIT_OK: i32 = 0;
pub const EXIT_DEGRADED: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;

/// Load and validate configuration, printing the error on failure.
pub fn load_config() -> Result<WardenConfig, i32> {
    WardenConfig::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        EXIT_CONFIG
    })
}

/// Install logging. A second install is reported but not fatal.
pub fn init_logging(config: &WardenConfig) {
    if let Err(e) = telemetry::init_tracing(&config.log) {
        eprintln!("Logging already initialised: {}", e);
    }
}

async fn build_reconciler(config: &WardenConfig) -> Result<Arc<Reconciler>, Box<dyn std::error::Error>> {
    let store = DirectoryStore::open(&config.store.dir).await?;
    Ok(Arc::new(Reconciler::new(
        Arc::new(store),
        config.generator(),
        config.schedule.policy(),
        config.reconcile.reconciler_config(),
    )))
}

/// Run the controller until Ctrl-C.
pub async fn run_controller(config: WardenConfig) -> Result<(), Box<dyn std::error::Error>> {
    let reconciler = build_reconciler(&config).await?;
    let catalog = config.catalog.catalog();
    tracing::info!(
        group = %config.group,
        dir = %config.store.dir.display(),
        definitions = catalog.len(),
        "starting crd-warden"
    );

    let shutdown = CancellationToken::new();
    let handle = Controller::new(reconciler, catalog, config.group.clone()).spawn(shutdown);

    tokio::signal::ctrl_c().await?;
    eprintln!("Shutdown signal received, stopping...");

    handle.shutdown().await?;
    eprintln!("Shutdown complete");
    Ok(())
}

/// Run a single pass and map its state to an exit code.
pub async fn run_once(config: WardenConfig, json: bool) -> i32 {
    let reconciler = match build_reconciler(&config).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Store error: {}", e);
            return EXIT_DEGRADED;
        }
    };

    let catalog = config.catalog.catalog();
    let started_at = Utc::now();
    let started = Instant::now();
    let result = reconciler.reconcile(&catalog, &config.group).await;
    let report = PassReport::new(&result, &config.group, started_at, started.elapsed());
    report.record_metrics();

    if json {
        match report.to_json_pretty() {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to encode report: {}", e);
                return EXIT_DEGRADED;
            }
        }
    } else {
        println!(
            "{}: {} present, {} created, {} failed (next pass in {}s)",
            report.state,
            report.summary.present,
            report.summary.created,
            report.summary.failed,
            report.next_delay().as_secs()
        );
        for failure in &report.failures {
            println!("  {}: {}", failure.name, failure.reason);
        }
    }

    match report.state {
        PassState::Idle | PassState::Healed => EXIT_OK,
        PassState::Degraded => EXIT_DEGRADED,
    }
}

fn encode(definition: &ResourceDefinition, format: RenderFormat) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        RenderFormat::Yaml => serde_yaml::to_string(definition)?,
        RenderFormat::Json => definition.to_json_pretty()?,
    })
}

/// Write or print the generated catalog.
pub async fn run_render(config: WardenConfig, args: RenderArgs) -> Result<usize, Box<dyn std::error::Error>> {
    let generator = config.generator();
    let catalog = config.catalog.catalog();

    if let Some(dir) = &args.out {
        tokio::fs::create_dir_all(dir).await?;
    }

    for index in catalog.iter() {
        let definition = generator.generate(index, &config.group);
        let text = encode(&definition, args.format)?;
        match &args.out {
            Some(dir) => {
                let file = dir.join(format!(
                    "{}.{}",
                    definition.names.singular,
                    args.format.extension()
                ));
                tokio::fs::write(&file, text).await?;
                tracing::debug!(file = %file.display(), "wrote manifest");
            }
            None => match args.format {
                RenderFormat::Yaml => print!("---\n{}", text),
                RenderFormat::Json => println!("{}", text),
            },
        }
    }

    if let Some(dir) = &args.out {
        eprintln!("Wrote {} manifests to {}", catalog.len(), dir.display());
    }
    Ok(catalog.len())
}

/// `config show`: effective configuration after file and environment.
pub fn run_config_show() -> i32 {
    match load_config() {
        Ok(config) => print_toml(&config),
        Err(code) => code,
    }
}

/// `config defaults`: built-in defaults.
pub fn run_config_defaults() -> i32 {
    print_toml(&WardenConfig::default())
}

/// `config validate`.
pub fn run_config_validate() -> i32 {
    match load_config() {
        Ok(config) => {
            println!(
                "Configuration OK: group {}, {} definitions",
                config.group,
                config.catalog.catalog().len()
            );
            EXIT_OK
        }
        Err(code) => code,
    }
}

fn print_toml(config: &WardenConfig) -> i32 {
    match config.to_toml_string() {
        Ok(text) => {
            print!("{}", text);
            EXIT_OK
        }
        Err(e) => {
            eprintln!("Failed to encode configuration: {}", e);
            EXIT_CONFIG
        }
    }
}

//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::EfisBlueprint;
use std::time::Duration;
use tracing::info;

use super::shutdown_signal;
use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let mut blueprint = match args.config {
        Some(ref path) => {
            info!(config = %path.display(), "Loading configuration");
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            info!("No configuration file given, using defaults");
            EfisBlueprint::default()
        }
    };

    // Apply CLI overrides
    if let Some(mode) = args.mode {
        info!(mode = ?mode, "Overriding mode from CLI");
        blueprint.mode = mode.into();
    }
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding bind host from CLI");
        blueprint.network.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding bind port from CLI");
        blueprint.network.port = port;
    }

    info!(
        mode = blueprint.mode.as_str(),
        bind = %blueprint.network.bind_addr(),
        queue = ?blueprint.queue.to_policy(),
        poll_interval_ms = blueprint.dispatch.poll_interval_ms,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        duration: if args.duration == 0 {
            None
        } else {
            Some(Duration::from_secs(args.duration))
        },
        log_instruments: args.log_instruments,
    };

    info!("Starting pipeline...");

    let stats = Pipeline::new(pipeline_config)
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        frames_applied = stats.dispatch.counters.frames_applied,
        frames_dropped = stats.dispatch.counters.frames_dropped,
        duration_secs = stats.duration.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        "Pipeline completed successfully"
    );

    // Print detailed statistics
    stats.print_summary();

    info!("EFIS finished");
    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &EfisBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Mode: {}", blueprint.mode.as_str());
    println!("\nNetwork:");
    println!("  Bind: {}", blueprint.network.bind_addr());
    println!("  Max datagram: {} bytes", blueprint.network.max_datagram_size);
    println!("  Read timeout: {} ms", blueprint.network.read_timeout_ms);
    println!("\nQueue: {:?}", blueprint.queue.to_policy());
    println!("Dispatch: every {} ms", blueprint.dispatch.poll_interval_ms);

    match blueprint.bus.resolve_bindings(blueprint.mode) {
        Ok(bindings) if !bindings.is_empty() => {
            println!("\nBus bindings ({}):", bindings.len());
            for (parameter, instrument) in bindings {
                println!("  - {} -> {}", parameter, instrument);
            }
        }
        Ok(_) => println!("\nBus bindings: none"),
        Err(e) => println!("\nBus bindings: invalid ({e})"),
    }

    println!();
}

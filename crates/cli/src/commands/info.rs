//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{EfisBlueprint, FrameLayout};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    mode: String,
    network: NetworkInfo,
    queue: String,
    poll_interval_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    layout: Option<FrameLayout>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bindings: Vec<BindingInfo>,
}

#[derive(Serialize)]
struct NetworkInfo {
    bind_addr: String,
    max_datagram_size: usize,
    read_timeout_ms: u64,
}

#[derive(Serialize)]
struct BindingInfo {
    parameter: String,
    instrument: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args)?;
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args)?;
    }

    Ok(())
}

fn resolved_bindings(blueprint: &EfisBlueprint) -> Result<Vec<BindingInfo>> {
    let bindings = blueprint
        .bus
        .resolve_bindings(blueprint.mode)
        .context("Invalid bus bindings")?;
    Ok(bindings
        .into_iter()
        .map(|(parameter, instrument)| BindingInfo {
            parameter: parameter.name().to_string(),
            instrument: instrument.label().to_string(),
        })
        .collect())
}

fn build_config_info(blueprint: &EfisBlueprint, args: &InfoArgs) -> Result<ConfigInfo> {
    let bindings = if args.bindings {
        resolved_bindings(blueprint)?
    } else {
        Vec::new()
    };

    Ok(ConfigInfo {
        version: format!("{:?}", blueprint.version),
        mode: blueprint.mode.as_str().to_string(),
        network: NetworkInfo {
            bind_addr: blueprint.network.bind_addr(),
            max_datagram_size: blueprint.network.max_datagram_size,
            read_timeout_ms: blueprint.network.read_timeout_ms,
        },
        queue: format!("{:?}", blueprint.queue.to_policy()),
        poll_interval_ms: blueprint.dispatch.poll_interval_ms,
        layout: args.layout.then(|| blueprint.layout.clone()),
        bindings,
    })
}

fn print_config_info(blueprint: &EfisBlueprint, args: &InfoArgs) -> Result<()> {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                    EFIS Configuration                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⚙️  Session");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Mode: {}", blueprint.mode.as_str());
    println!("   ├─ Queue: {:?}", blueprint.queue.to_policy());
    println!("   └─ Dispatch: every {} ms", blueprint.dispatch.poll_interval_ms);

    let network = &blueprint.network;
    println!("\n📡 Network");
    println!("   ├─ Bind: {}", network.bind_addr());
    println!("   ├─ Max datagram: {} bytes", network.max_datagram_size);
    println!("   └─ Read timeout: {} ms", network.read_timeout_ms);

    if args.layout {
        let fields = blueprint.layout.mapped_fields();
        println!("\n🧾 Frame Layout ({} fields min)", blueprint.layout.min_fields());
        for (i, (name, index)) in fields.iter().enumerate() {
            let prefix = if i == fields.len() - 1 { "└─" } else { "├─" };
            println!("   {} [{:>2}] {}", prefix, index, name);
        }
    }

    if args.bindings {
        let bindings = resolved_bindings(blueprint)?;
        println!("\n🔌 Bus Bindings ({})", bindings.len());
        for (i, binding) in bindings.iter().enumerate() {
            let prefix = if i == bindings.len() - 1 { "└─" } else { "├─" };
            println!("   {} {} → {}", prefix, binding.parameter, binding.instrument);
        }
    } else {
        println!(
            "\n🔌 Bus: {} on {} at {} Hz",
            blueprint.bus.adapter, blueprint.bus.device, blueprint.bus.rate_hz
        );
    }

    println!();
    Ok(())
}

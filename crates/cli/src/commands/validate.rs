//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{EfisBlueprint, Mode, QueuePolicy};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    mode: String,
    bind_addr: String,
    queue_policy: String,
    min_frame_fields: usize,
    binding_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let binding_count = blueprint
                .bus
                .resolve_bindings(blueprint.mode)
                .map(|b| b.len())
                .unwrap_or_default();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    mode: blueprint.mode.as_str().to_string(),
                    bind_addr: blueprint.network.bind_addr(),
                    queue_policy: format!("{:?}", blueprint.queue.to_policy()),
                    min_frame_fields: blueprint.layout.min_fields(),
                    binding_count,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &EfisBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    match blueprint.mode {
        Mode::Fgfs => {
            if blueprint.bus.bindings.is_some() {
                warnings.push("bus.bindings has no effect in fgfs mode".to_string());
            }
        }
        Mode::Normal | Mode::Test => {
            if blueprint.bus.adapter != "simulated" {
                warnings.push(format!(
                    "bus.adapter '{}' is not available; run will fail in {} mode",
                    blueprint.bus.adapter,
                    blueprint.mode.as_str()
                ));
            }
            if matches!(&blueprint.bus.bindings, Some(b) if b.is_empty()) {
                warnings.push("bus.bindings is empty - no instrument will move".to_string());
            }
        }
    }

    if let QueuePolicy::DropOldest { capacity } = blueprint.queue.to_policy() {
        if capacity < 4 {
            warnings.push(format!(
                "queue.capacity {capacity} is very small - frames will be evicted under any jitter"
            ));
        }
    }

    if blueprint.network.max_datagram_size < blueprint.layout.min_fields() * 2 {
        warnings.push(format!(
            "network.max_datagram_size {} cannot hold a {}-field frame",
            blueprint.network.max_datagram_size,
            blueprint.layout.min_fields()
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Mode: {}", summary.mode);
            println!("  Bind: {}", summary.bind_addr);
            println!("  Queue: {}", summary.queue_policy);
            println!("  Frame fields: {}", summary.min_frame_fields);
            println!("  Bus bindings: {}", summary.binding_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_config() {
        let file = write_config("mode = \"fgfs\"\n");
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        });
        assert!(result.valid);
        assert_eq!(result.summary.unwrap().mode, "fgfs");
    }

    #[test]
    fn test_invalid_config() {
        let file = write_config("[dispatch]\npoll_interval_ms = 0\n");
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("poll_interval_ms"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/nonexistent/efis.toml".into(),
            json: false,
        });
        assert!(!result.valid);
    }

    #[test]
    fn test_warnings() {
        let mut blueprint = EfisBlueprint::default();
        assert!(collect_warnings(&blueprint).is_empty());

        blueprint.bus.adapter = "arinc429".to_string();
        blueprint.queue.policy = contracts::QueuePolicyKind::DropOldest;
        blueprint.queue.capacity = 1;
        assert_eq!(collect_warnings(&blueprint).len(), 2);
    }
}

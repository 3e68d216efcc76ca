//! `emit` command implementation.
//!
//! Stands in for the flight simulator: sends synthetic frames to a running
//! `efis run --mode fgfs`.

use std::io::ErrorKind;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::FrameLayout;
use ingestion::FrameEmitter;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::shutdown_signal;

/// Shortest send period; `interval` rejects a zero period
const MIN_SEND_PERIOD: Duration = Duration::from_micros(1);
use crate::cli::EmitArgs;

/// Execute the `emit` command
pub async fn run_emit(args: &EmitArgs) -> Result<()> {
    let period = send_period(args.rate)?;

    let layout = match args.config {
        Some(ref path) => {
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
                .layout
        }
        None => FrameLayout::default(),
    };

    let mut emitter = FrameEmitter::connect(args.target.as_str())
        .with_context(|| format!("Failed to open UDP socket towards {}", args.target))?
        .with_layout(layout);

    info!(
        target = %emitter.target(),
        rate_hz = args.rate,
        count = args.count,
        "Emitting synthetic telemetry"
    );

    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let start = Instant::now();
    let mut refused_logged = false;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        if args.count > 0 && emitter.sent() >= args.count {
            break;
        }
        tokio::select! {
            _ = &mut shutdown => {
                info!("Received shutdown signal, stopping emitter");
                break;
            }
            _ = ticker.tick() => {
                match emitter.send_synthetic(start.elapsed().as_secs_f64()) {
                    Ok(_) => {}
                    // ICMP port unreachable from an earlier datagram; receiver not up yet
                    Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                        if !refused_logged {
                            warn!(target = %emitter.target(), "No receiver listening, still sending");
                            refused_logged = true;
                        }
                        continue;
                    }
                    Err(e) => return Err(e).context("Failed to send frame"),
                }
                if emitter.sent().is_multiple_of(100) {
                    debug!(sent = emitter.sent(), "Emitter progress");
                }
            }
        }
    }

    info!(
        sent = emitter.sent(),
        duration_secs = start.elapsed().as_secs_f64(),
        "Emitter finished"
    );
    Ok(())
}

/// Interval between frames for `rate` Hz
fn send_period(rate: f64) -> Result<Duration> {
    if !(rate > 0.0 && rate.is_finite()) {
        anyhow::bail!("--rate must be > 0, got {}", rate);
    }
    Ok(Duration::from_secs_f64(1.0 / rate).max(MIN_SEND_PERIOD))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_period() {
        assert_eq!(send_period(50.0).unwrap(), Duration::from_millis(20));
        assert_eq!(send_period(1.0).unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn test_huge_rate_is_clamped() {
        assert_eq!(send_period(1e10).unwrap(), MIN_SEND_PERIOD);
        assert_eq!(send_period(f64::MAX).unwrap(), MIN_SEND_PERIOD);
    }

    #[test]
    fn test_invalid_rate_rejected() {
        assert!(send_period(0.0).is_err());
        assert!(send_period(-5.0).is_err());
        assert!(send_period(f64::NAN).is_err());
        assert!(send_period(f64::INFINITY).is_err());
    }
}

// GridSim Headless Runner
// Drives the reference grid (or a topology file) without a front end.
//
// Usage:
//   cargo run --release --bin gridsim                          # 120 ticks, as fast as possible
//   cargo run --release --bin gridsim -- --ticks 600 --seed 42
//   cargo run --release --bin gridsim -- --realtime --period-ms 250
//   cargo run --release --bin gridsim -- --topology grid.json --time-series out/run.jsonl

mod time_series;

use std::cell::RefCell;
use std::future::Future;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use gridsim_engine::{
    ControllerConfig, GridSummary, SimulationController, StateChange, Topology,
};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use time_series::TimeSeriesRecorder;

// ─── CLI ────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "gridsim", version, about = "Headless power grid stability simulation")]
struct Cli {
    /// Number of ticks to run.
    #[arg(long, default_value_t = 120)]
    ticks: u64,

    /// Drift generator seed. Defaults to the current time.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON topology document; the built-in reference grid when omitted.
    #[arg(long)]
    topology: Option<PathBuf>,

    /// Pace ticks against the wall clock instead of running flat out.
    #[arg(long)]
    realtime: bool,

    /// Tick period for real-time runs.
    #[arg(long, default_value_t = 1000)]
    period_ms: u64,

    /// Write one JSON line per tick to this file.
    #[arg(long)]
    time_series: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn load_topology(path: Option<&PathBuf>) -> Result<Topology> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading topology {}", path.display()))?;
            Topology::from_json(&json).with_context(|| format!("loading topology {}", path.display()))
        }
        None => Ok(Topology::reference_grid()),
    }
}

fn default_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

// ─── Main ───────────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let seed = cli.seed.unwrap_or_else(default_seed);
    let topology = load_topology(cli.topology.as_ref())?;
    let config = ControllerConfig {
        tick_period: Duration::from_millis(cli.period_ms.max(1)),
        seed,
    };
    let mut controller = SimulationController::new(topology, config)?;
    info!(seed, ticks = cli.ticks, realtime = cli.realtime, "gridsim starting");

    let recorder = Rc::new(RefCell::new(TimeSeriesRecorder::new()));
    if cli.time_series.is_some() {
        let sink = Rc::clone(&recorder);
        controller.subscribe(move |state, change| {
            if change == StateChange::Tick {
                sink.borrow_mut().record(state);
            }
        });
    }
    controller.subscribe(|state, change| {
        if change == StateChange::Tick {
            let summary = GridSummary::from_state(state);
            info!(
                tick = state.tick,
                unstable = summary.unstable_count,
                avg_load = summary.average_load_ratio,
                health = summary.system_health,
                "tick"
            );
        }
    });

    if cli.realtime {
        run_realtime(&mut controller, cli.ticks, tokio::signal::ctrl_c()).await;
    } else {
        for _ in 0..cli.ticks {
            controller.tick_now();
        }
    }

    let summary = GridSummary::from_state(controller.state());
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(path) = &cli.time_series {
        let recorder = recorder.borrow();
        recorder
            .write_jsonl(path)
            .with_context(|| format!("writing time series {}", path.display()))?;
        info!(path = %path.display(), ticks = recorder.len(), "time series written");
    }

    Ok(())
}

/// Feed wall-clock time to the controller until `ticks` ticks have run or
/// `shutdown` resolves.
async fn run_realtime<S: Future>(controller: &mut SimulationController, ticks: u64, shutdown: S) {
    let poll_every = (controller.clock().period() / 10).clamp(
        Duration::from_millis(1),
        Duration::from_millis(50),
    );
    let mut poll = interval(poll_every);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::pin!(shutdown);

    controller.start();
    let mut last = Instant::now();
    loop {
        tokio::select! {
            _ = poll.tick() => {}
            _ = &mut shutdown => {
                info!(tick = controller.state().tick, "interrupted");
                break;
            }
        }
        let now = Instant::now();
        controller.advance(now - last);
        last = now;
        if controller.state().tick >= ticks {
            break;
        }
    }
    controller.pause();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slow_controller() -> SimulationController {
        let config = ControllerConfig {
            tick_period: Duration::from_secs(3600),
            seed: 9,
        };
        SimulationController::new(Topology::reference_grid(), config).unwrap()
    }

    #[tokio::test]
    async fn test_realtime_stops_on_shutdown() {
        // The shutdown outlives several poll intervals, so it only fires if
        // the same future is polled across iterations.
        let mut controller = slow_controller();
        let shutdown = tokio::time::sleep(Duration::from_millis(200));
        tokio::time::timeout(
            Duration::from_secs(5),
            run_realtime(&mut controller, 10, shutdown),
        )
        .await
        .unwrap();
        assert_eq!(controller.state().tick, 0);
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn test_realtime_runs_requested_ticks() {
        let config = ControllerConfig {
            tick_period: Duration::from_millis(10),
            seed: 9,
        };
        let mut controller = SimulationController::new(Topology::reference_grid(), config).unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            run_realtime(&mut controller, 3, std::future::pending::<()>()),
        )
        .await
        .unwrap();
        assert_eq!(controller.state().tick, 3);
        assert!(!controller.is_running());
    }
}

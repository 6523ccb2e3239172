//! Fixed-rate driver around a shared simulation.

use anyhow::{Context, Result};
use ecolife_core::RunnerConfig;
use ecolife_world::{Simulation, Snapshot};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, instrument};

/// Simulation shared between the tick loop and readers
pub type SharedSimulation = Arc<RwLock<Simulation>>;

pub struct Driver {
    config: RunnerConfig,
    sim: SharedSimulation,
}

impl Driver {
    pub fn new(config: RunnerConfig) -> Result<Self> {
        let sim = Simulation::new(config.sim.clone()).context("failed to build simulation")?;
        Ok(Self {
            config,
            sim: Arc::new(RwLock::new(sim)),
        })
    }

    pub fn simulation(&self) -> SharedSimulation {
        self.sim.clone()
    }

    /// Tick at `tick_ms` until `max_ticks` is reached or `stop` flips to true.
    /// Returns the number of ticks run.
    #[instrument(skip_all, fields(tick_ms = self.config.tick_ms))]
    pub async fn run(&self, mut stop: watch::Receiver<bool>) -> u64 {
        let mut ticker = interval(Duration::from_millis(self.config.tick_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0;

        loop {
            if self.config.max_ticks.map_or(false, |max| ticks >= max) {
                info!(ticks, "Tick limit reached");
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.changed() => {
                    info!(ticks, "Tick loop stopping");
                    break;
                }
            }

            let report = self.sim.write().tick();
            ticks += 1;
            if !report.events.is_empty() {
                debug!(
                    tick = report.tick,
                    events = report.events.len(),
                    population = report.stats.population,
                    "Tick applied"
                );
            }
        }
        ticks
    }

    /// Log population stats every `report_interval_ms` until `stop` flips
    pub async fn report(&self, mut stop: watch::Receiver<bool>) {
        let mut ticker = interval(Duration::from_millis(self.config.report_interval_ms.max(1)));
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.changed() => break,
            }

            let (stats, counters) = {
                let sim = self.sim.read();
                (sim.stats(), sim.counters().clone())
            };
            info!(
                tick = stats.tick,
                population = stats.population,
                faction_a = stats.faction_a,
                faction_b = stats.faction_b,
                food = stats.food,
                missiles = stats.missiles,
                avg_energy = format!("{:.2}", stats.avg_energy()),
                net_growth = counters.net_growth(),
                detonations = counters.detonations,
                "Population report"
            );
        }
    }

    /// Write the current snapshot as JSON to the configured path, if any
    pub fn save_snapshot(&self) -> Result<Option<Snapshot>> {
        let Some(path) = self.config.snapshot_path.as_deref() else {
            return Ok(None);
        };
        let snapshot = self.sim.read().snapshot();
        write_snapshot(&snapshot, path)?;
        info!(path, tick = snapshot.tick, cells = snapshot.cells.len(), "Snapshot written");
        Ok(Some(snapshot))
    }
}

fn write_snapshot(snapshot: &Snapshot, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = snapshot.to_json()?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

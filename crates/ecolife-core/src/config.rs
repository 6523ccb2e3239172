//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::{Faction, NeighborCounts};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest grid edge for which the 8 neighbors of a cell are distinct
pub const MIN_GRID_EDGE: i32 = 3;

/// Largest number of slots a grid may have
pub const MAX_GRID_CELLS: i32 = 1 << 22;

/// World configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the world grid
    pub width: i32,
    /// Height of the world grid
    pub height: i32,
    /// Initial random fill (0.0 to 1.0)
    pub initial_density: f32,
    /// Share of the initial fill assigned to faction B
    pub faction_b_ratio: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 120,
            height: 80,
            initial_density: 0.15,
            faction_b_ratio: 0.5,
        }
    }
}

/// Energy, foraging and reproduction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Upper bound for any cell's energy
    pub max_energy: i32,
    /// Energy for seeded and host-placed cells
    pub initial_energy: i32,
    /// Energy for cells born by the automaton or by reproduction
    pub birth_energy: i32,
    /// Energy gained per food eaten
    pub eat_gain: i32,
    /// Every this many ticks each cell loses one energy
    pub hunger_period: u64,
    /// Minimum energy before a cell attempts to reproduce
    pub repro_threshold: i32,
    /// Energy the parent pays for a successful reproduction
    pub repro_cost: i32,
    /// Probability that a reproduction attempt succeeds
    pub repro_chance: f32,
    /// Per-tick probability of one food spawning
    pub food_spawn_chance: f32,
    /// Maximum food on the board
    pub max_food: usize,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max_energy: 10,
            initial_energy: 5,
            birth_energy: 3,
            eat_gain: 3,
            hunger_period: 10,
            repro_threshold: 7,
            repro_cost: 3,
            repro_chance: 0.1,
            food_spawn_chance: 0.3,
            max_food: 200,
        }
    }
}

/// Missile and explosion parameters. Distances are in cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Minimum energy for a faction-A cell to launch
    pub launch_threshold: i32,
    /// Per-tick launch probability for an eligible cell
    pub launch_chance: f32,
    /// Energy paid by the launcher
    pub launch_cost: i32,
    /// Maximum missiles in flight
    pub max_missiles: usize,
    /// Speed at launch
    pub missile_speed: f32,
    /// Speed gained per tick
    pub thrust: f32,
    /// Speed ceiling
    pub max_speed: f32,
    /// Maximum heading change per tick (radians)
    pub turn_rate: f32,
    /// Ticks before an unexploded missile is removed
    pub missile_ttl: u32,
    /// Distance to a faction-B cell that triggers detonation
    pub impact_radius: f32,
    /// Blast radius; cells at exactly this distance are destroyed
    pub explosion_radius: f32,
    /// Ticks an explosion stays visible
    pub explosion_life: u32,
    /// Probability that a casualty leaves food behind
    pub food_drop_chance: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            launch_threshold: 8,
            launch_chance: 0.02,
            launch_cost: 1,
            max_missiles: 12,
            missile_speed: 0.5,
            thrust: 0.05,
            max_speed: 0.9,
            turn_rate: 0.12,
            missile_ttl: 120,
            impact_radius: 0.75,
            explosion_radius: 2.0,
            explosion_life: 8,
            food_drop_chance: 0.3,
        }
    }
}

/// Population regulator parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegulatorConfig {
    /// Below this many live cells the regulator reseeds
    pub low_watermark: usize,
    /// Hard population cap
    pub max_cells: usize,
    /// Half-width of a reseed cluster square
    pub reseed_radius: i32,
    /// Fill probability inside a reseed cluster
    pub reseed_density: f32,
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        Self {
            low_watermark: 50,
            max_cells: 2000,
            reseed_radius: 4,
            reseed_density: 0.5,
        }
    }
}

/// Faction assigned to a birth when neighbor factions are level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieBreak {
    PreferA,
    PreferB,
}

impl TieBreak {
    /// Majority faction of `counts`, resolving equal counts by policy
    pub fn majority(self, counts: NeighborCounts) -> Faction {
        if counts.a > counts.b {
            Faction::A
        } else if counts.b > counts.a {
            Faction::B
        } else {
            match self {
                TieBreak::PreferA => Faction::A,
                TieBreak::PreferB => Faction::B,
            }
        }
    }
}

/// Whether surviving cells can change faction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurvivalRule {
    /// Survivors keep their faction
    Keep,
    /// A survivor strictly outnumbered by opposing neighbors flips
    Convert,
}

impl SurvivalRule {
    pub fn resolve(self, current: Faction, counts: NeighborCounts) -> Faction {
        match self {
            SurvivalRule::Keep => current,
            SurvivalRule::Convert => {
                let rival = current.opponent();
                if counts.of(rival) > counts.of(current) {
                    rival
                } else {
                    current
                }
            }
        }
    }
}

/// Distance metric used when a missile picks its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetMetric {
    /// Squared planar distance, no wraparound
    Planar,
    /// Shortest distance across the torus
    Toroidal,
}

/// Rule variants and subsystem switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub tie_break: TieBreak,
    pub survival: SurvivalRule,
    pub targeting: TargetMetric,
    pub allow_foraging: bool,
    pub allow_reproduction: bool,
    pub allow_combat: bool,
    pub allow_regulation: bool,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::PreferA,
            survival: SurvivalRule::Keep,
            targeting: TargetMetric::Planar,
            allow_foraging: true,
            allow_reproduction: true,
            allow_combat: true,
            allow_regulation: true,
        }
    }
}

impl RuleConfig {
    /// Plain two-faction Life: no energy economy, no combat, no regulator
    pub fn classic() -> Self {
        Self {
            allow_foraging: false,
            allow_reproduction: false,
            allow_combat: false,
            allow_regulation: false,
            ..Default::default()
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Ticks between population metric log lines (0 disables)
    pub metrics_interval: u64,
    pub world: WorldConfig,
    pub energy: EnergyConfig,
    pub combat: CombatConfig,
    pub regulator: RegulatorConfig,
    pub rules: RuleConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            metrics_interval: 100,
            world: WorldConfig::default(),
            energy: EnergyConfig::default(),
            combat: CombatConfig::default(),
            regulator: RegulatorConfig::default(),
            rules: RuleConfig::default(),
        }
    }
}

impl SimConfig {
    /// Reject configurations that would break the engine's invariants
    pub fn validate(&self) -> Result<()> {
        validate_dimensions(self.world.width, self.world.height)?;

        let energy = &self.energy;
        if energy.max_energy < 1 {
            return Err(Error::InvalidConfig("max_energy must be at least 1".into()));
        }
        for (name, value) in [
            ("initial_energy", energy.initial_energy),
            ("birth_energy", energy.birth_energy),
        ] {
            if value < 1 || value > energy.max_energy {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be within 1..={}",
                    energy.max_energy
                )));
            }
        }
        if energy.hunger_period == 0 {
            return Err(Error::InvalidConfig("hunger_period must be positive".into()));
        }
        if energy.eat_gain < 0 || energy.repro_cost < 0 || self.combat.launch_cost < 0 {
            return Err(Error::InvalidConfig("energy costs and gains must be non-negative".into()));
        }

        let combat = &self.combat;
        if combat.explosion_radius < 0.0 || combat.impact_radius < 0.0 {
            return Err(Error::InvalidConfig("radii must be non-negative".into()));
        }
        if combat.max_speed < combat.missile_speed {
            return Err(Error::InvalidConfig("max_speed must be at least missile_speed".into()));
        }

        let regulator = &self.regulator;
        if regulator.low_watermark > regulator.max_cells {
            return Err(Error::InvalidConfig(
                "low_watermark must not exceed max_cells".into(),
            ));
        }
        if regulator.reseed_radius < 0 {
            return Err(Error::InvalidConfig("reseed_radius must be non-negative".into()));
        }

        for (name, p) in [
            ("initial_density", self.world.initial_density),
            ("faction_b_ratio", self.world.faction_b_ratio),
            ("repro_chance", energy.repro_chance),
            ("food_spawn_chance", energy.food_spawn_chance),
            ("launch_chance", combat.launch_chance),
            ("food_drop_chance", combat.food_drop_chance),
            ("reseed_density", regulator.reseed_density),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::InvalidConfig(format!("{name} must be within 0.0..=1.0")));
            }
        }

        Ok(())
    }
}

/// Check that a grid of `width` x `height` supports toroidal neighborhoods
pub fn validate_dimensions(width: i32, height: i32) -> Result<()> {
    if width < MIN_GRID_EDGE || height < MIN_GRID_EDGE {
        return Err(Error::InvalidDimensions { width, height });
    }
    match width.checked_mul(height) {
        Some(cells) if cells <= MAX_GRID_CELLS => {}
        _ => return Err(Error::InvalidDimensions { width, height }),
    }
    Ok(())
}

/// Host runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Fixed tick interval (milliseconds)
    pub tick_ms: u64,
    /// Stop after this many ticks; run until interrupted when unset
    pub max_ticks: Option<u64>,
    /// Interval of the snapshot reporter (milliseconds)
    pub report_interval_ms: u64,
    /// Write the final snapshot as JSON to this path on shutdown
    pub snapshot_path: Option<String>,
    /// Emit logs as JSON lines
    pub json_logs: bool,
    pub sim: SimConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 150,
            max_ticks: None,
            report_interval_ms: 5000,
            snapshot_path: None,
            json_logs: false,
            sim: SimConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Load a runner configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: RunnerConfig = serde_json::from_str(&text)?;
        config.sim.validate()?;
        Ok(config)
    }
}

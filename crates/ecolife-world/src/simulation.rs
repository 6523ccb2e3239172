//! Simulation engine: owns the world and sequences one tick at a time.

use crate::automaton;
use crate::combat;
use crate::foraging;
use crate::grid::Grid;
use crate::regulator;
use crate::snapshot::Snapshot;
use crate::world::WorldState;
use ecolife_core::{
    validate_dimensions, Counters, EventLog, Faction, MissileId, PopulationStats, Position, Result,
    SimConfig, TickReport,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, event, info, instrument, Level};

pub struct Simulation {
    state: WorldState,
    config: SimConfig,
    rng: ChaCha8Rng,
    tick: u64,
    events: EventLog,
    counters: Counters,
}

impl Simulation {
    /// Build an engine and fill the board at `initial_density`
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let state = WorldState::new(config.world.width, config.world.height);

        let mut sim = Self {
            state,
            config,
            rng,
            tick: 0,
            events: EventLog::new(),
            counters: Counters::new(),
        };
        sim.randomize();
        Ok(sim)
    }

    /// Build an engine with an empty board
    pub fn empty(config: SimConfig) -> Result<Self> {
        let mut sim = Self::new(config)?;
        sim.clear();
        Ok(sim)
    }

    /// Advance the simulation by one step and return the committed event batch
    pub fn tick(&mut self) -> TickReport {
        self.tick += 1;
        let config = &self.config;
        let state = &mut self.state;
        let rng = &mut self.rng;
        let events = &mut self.events;

        let (births, deaths) = automaton::step(state, &config.rules, &config.energy, events);

        if config.rules.allow_foraging {
            foraging::eat(state, &config.energy, events);
            foraging::hunger(state, self.tick, &config.energy);
        }
        if config.rules.allow_reproduction {
            foraging::reproduce(state, &config.energy, rng, events);
        }
        if config.rules.allow_foraging {
            foraging::spawn_food(state, &config.energy, rng);
        }

        combat::step(
            state,
            &config.combat,
            &config.energy,
            config.rules.targeting,
            config.rules.allow_combat,
            rng,
            events,
        );

        let (reseeded, culled) = regulator::step(
            state,
            &config.regulator,
            &config.energy,
            config.rules.allow_regulation,
            rng,
            events,
        );
        if reseeded > 0 {
            self.counters.reseeds += 1;
        }
        self.counters.culled += culled as u64;

        let batch = self.events.drain();
        for event in &batch {
            self.counters.record(event);
        }

        debug!(
            tick = self.tick,
            births,
            deaths,
            events = batch.len(),
            population = self.state.population(),
            "Tick committed"
        );

        if self.config.metrics_interval > 0 && self.tick % self.config.metrics_interval == 0 {
            self.emit_population_metrics();
        }

        TickReport {
            tick: self.tick,
            events: batch,
            stats: self.stats(),
        }
    }

    /// Run `ticks` steps back to back, returning the final stats
    #[instrument(skip(self))]
    pub fn run(&mut self, ticks: u64) -> PopulationStats {
        info!("Running simulation for {} ticks", ticks);
        for _ in 0..ticks {
            self.tick();
        }
        let stats = self.stats();
        info!(
            tick = self.tick,
            population = stats.population,
            faction_a = stats.faction_a,
            faction_b = stats.faction_b,
            "Run complete"
        );
        stats
    }

    fn emit_population_metrics(&self) {
        let stats = self.stats();
        info!(
            event = "population_metrics",
            tick = self.tick,
            population = stats.population,
            faction_a = stats.faction_a,
            faction_b = stats.faction_b,
            food = stats.food,
            missiles = stats.missiles,
            avg_energy = format!("{:.2}", stats.avg_energy()),
            max_age = stats.max_age,
            births_total = self.counters.births,
            deaths_total = self.counters.deaths,
            detonations_total = self.counters.detonations,
            reseeds_total = self.counters.reseeds,
            culled_total = self.counters.culled,
            "Population metrics snapshot"
        );

        event!(
            Level::INFO,
            gauge_name = "population_total",
            gauge_value = stats.population,
            tick = self.tick,
            "Population gauge"
        );
    }

    /// Place host-supplied cells with `initial_energy`. Occupied slots are skipped and
    /// placement stops at the population cap. Returns how many were placed.
    pub fn add_cells(&mut self, cells: &[(Position, Faction)]) -> usize {
        let energy = self.config.energy.initial_energy;
        cells
            .iter()
            .filter(|(pos, faction)| self.put_cell(*pos, *faction, energy))
            .count()
    }

    /// Place one cell with explicit energy (clamped to the valid range)
    pub fn put_cell(&mut self, pos: Position, faction: Faction, energy: i32) -> bool {
        if self.state.population() >= self.config.regulator.max_cells {
            return false;
        }
        self.state
            .spawn_cell(pos, faction, energy, self.config.energy.max_energy)
            .is_some()
    }

    /// Remove the cells at `positions`. Each removal is reported as a death in the
    /// next tick's batch.
    pub fn remove_cells(&mut self, positions: &[Position]) -> usize {
        positions
            .iter()
            .filter(|pos| self.state.kill(**pos, &mut self.events).is_some())
            .count()
    }

    pub fn add_food(&mut self, positions: &[Position]) -> usize {
        let max_food = self.config.energy.max_food;
        positions
            .iter()
            .filter(|pos| self.state.place_food(**pos, max_food))
            .count()
    }

    /// Fill a square of side `2 * radius + 1` around `center` with `faction`
    pub fn add_cluster(&mut self, center: Position, radius: i32, faction: Faction) -> usize {
        let mut cells = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                cells.push((center.add(dx, dy), faction));
            }
        }
        self.add_cells(&cells)
    }

    /// Scatter `count` cells of random faction over the board
    pub fn add_random_cells(&mut self, count: usize) -> usize {
        let mut cells = Vec::with_capacity(count);
        for _ in 0..count {
            let pos = Position::new(
                self.rng.gen_range(0..self.state.width()),
                self.rng.gen_range(0..self.state.height()),
            );
            let faction = if self.rng.gen_bool(0.5) {
                Faction::A
            } else {
                Faction::B
            };
            cells.push((pos, faction));
        }
        self.add_cells(&cells)
    }

    /// Fire a missile from `origin` on behalf of the host
    pub fn fire_missile(&mut self, origin: Position) -> Option<MissileId> {
        combat::launch(
            &mut self.state,
            &self.config.combat,
            self.config.rules.targeting,
            origin,
            None,
            &mut self.rng,
            &mut self.events,
        )
    }

    /// Reinitialize with new grid dimensions. Partial resizes are not supported
    /// because the toroidal wrap depends on the dimensions.
    pub fn reset(&mut self, width: i32, height: i32) -> Result<()> {
        validate_dimensions(width, height)?;
        self.config.world.width = width;
        self.config.world.height = height;
        self.randomize();
        info!(width, height, "Simulation reset");
        Ok(())
    }

    /// Empty the board, food, missiles and explosions and restart the tick counter
    pub fn clear(&mut self) {
        self.state = WorldState::new(self.config.world.width, self.config.world.height);
        self.tick = 0;
        self.events.clear();
        self.counters = Counters::new();
    }

    /// Clear, then fill the board at `initial_density` with the configured faction mix
    pub fn randomize(&mut self) {
        self.clear();
        let world = &self.config.world;
        let energy = &self.config.energy;
        for y in 0..world.height {
            for x in 0..world.width {
                if self.rng.gen::<f32>() >= world.initial_density {
                    continue;
                }
                let faction = if self.rng.gen::<f32>() < world.faction_b_ratio {
                    Faction::B
                } else {
                    Faction::A
                };
                if self.state.population() < self.config.regulator.max_cells {
                    self.state.spawn_cell(
                        Position::new(x, y),
                        faction,
                        energy.initial_energy,
                        energy.max_energy,
                    );
                }
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state, self.tick)
    }

    pub fn stats(&self) -> PopulationStats {
        let mut stats = PopulationStats {
            tick: self.tick,
            food: self.state.food.len(),
            missiles: self.state.missiles.len(),
            explosions: self.state.explosions.len(),
            ..Default::default()
        };
        for (_, cell) in self.state.grid.iter() {
            stats.population += 1;
            match cell.faction {
                Faction::A => stats.faction_a += 1,
                Faction::B => stats.faction_b += 1,
            }
            stats.total_energy += cell.energy as i64;
            stats.max_energy = stats.max_energy.max(cell.energy);
            stats.max_age = stats.max_age.max(cell.age);
        }
        stats
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn grid(&self) -> &Grid {
        &self.state.grid
    }
}

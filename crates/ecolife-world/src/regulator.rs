//! Population regulator: reseeds a dying board and culls an overcrowded one.

use crate::world::WorldState;
use ecolife_core::{EnergyConfig, Event, EventLog, Faction, Position, RegulatorConfig};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::cmp::Reverse;
use tracing::warn;

/// Cluster placements tried before falling back to filling random empty slots
const MAX_CLUSTERS: usize = 64;

fn random_faction(rng: &mut ChaCha8Rng) -> Faction {
    if rng.gen_bool(0.5) {
        Faction::A
    } else {
        Faction::B
    }
}

fn place(
    state: &mut WorldState,
    pos: Position,
    energy: &EnergyConfig,
    rng: &mut ChaCha8Rng,
    events: &mut EventLog,
) {
    let faction = random_faction(rng);
    if state
        .spawn_cell(pos, faction, energy.initial_energy, energy.max_energy)
        .is_some()
    {
        events.push(Event::birth(pos, faction, energy.initial_energy));
    }
}

/// Seed mixed-faction clusters until the population reaches the low watermark
/// (or the board is full). Returns the number of cells placed.
pub fn reseed(
    state: &mut WorldState,
    config: &RegulatorConfig,
    energy: &EnergyConfig,
    rng: &mut ChaCha8Rng,
    events: &mut EventLog,
) -> usize {
    let goal = config.low_watermark.min(state.grid.capacity());
    let before = state.population();
    if before >= goal {
        return 0;
    }

    let radius = config.reseed_radius;
    for _ in 0..MAX_CLUSTERS {
        if state.population() >= goal {
            break;
        }
        let center = Position::new(
            rng.gen_range(0..state.width()),
            rng.gen_range(0..state.height()),
        );
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let pos = center.add(dx, dy).wrap(state.width(), state.height());
                if !state.grid.is_occupied(pos) && rng.gen::<f32>() < config.reseed_density {
                    place(state, pos, energy, rng, events);
                }
            }
        }
    }

    // Sparse clusters on a crowded board may still fall short
    if state.population() < goal {
        let mut empties: Vec<Position> = state
            .grid
            .positions()
            .filter(|pos| !state.grid.is_occupied(*pos))
            .collect();
        empties.shuffle(rng);
        for pos in empties {
            if state.population() >= goal {
                break;
            }
            place(state, pos, energy, rng, events);
        }
    }

    let placed = state.population() - before;
    warn!(before, placed, low_watermark = config.low_watermark, "Population below watermark, reseeded");
    placed
}

/// Remove the lowest-energy cells until the population is back under `max_cells`.
///
/// Among equally hungry cells the oldest goes first, then grid order.
pub fn cull(state: &mut WorldState, config: &RegulatorConfig, events: &mut EventLog) -> usize {
    let population = state.population();
    if population <= config.max_cells {
        return 0;
    }
    let excess = population - config.max_cells;

    let mut ranked: Vec<(i32, Reverse<u64>, Position)> = state
        .grid
        .iter()
        .map(|(pos, cell)| (cell.energy, Reverse(cell.age), pos))
        .collect();
    ranked.sort_by_key(|&(energy, age, pos)| (energy, age, (pos.y, pos.x)));

    for &(_, _, pos) in ranked.iter().take(excess) {
        state.kill(pos, events);
    }

    warn!(population, culled = excess, max_cells = config.max_cells, "Population over cap, culled");
    excess
}

/// One regulator pass. The cull always runs so the population cap holds even
/// when reseeding is switched off. Returns `(reseeded, culled)`.
pub fn step(
    state: &mut WorldState,
    config: &RegulatorConfig,
    energy: &EnergyConfig,
    allow_reseed: bool,
    rng: &mut ChaCha8Rng,
    events: &mut EventLog,
) -> (usize, usize) {
    let reseeded = if allow_reseed {
        reseed(state, config, energy, rng, events)
    } else {
        0
    };
    let culled = cull(state, config, events);
    (reseeded, culled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecolife_core::EventKind;
    use rand::SeedableRng;

    #[test]
    fn test_reseed_reaches_watermark() {
        let mut state = WorldState::new(30, 30);
        let config = RegulatorConfig {
            low_watermark: 40,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut events = EventLog::new();

        let placed = reseed(&mut state, &config, &EnergyConfig::default(), &mut rng, &mut events);
        assert!(state.population() >= 40);
        assert_eq!(placed, state.population());
        assert_eq!(events.count(EventKind::Birth), placed);

        let factions: Vec<Faction> = state.grid.iter().map(|(_, c)| c.faction).collect();
        assert!(factions.contains(&Faction::A));
        assert!(factions.contains(&Faction::B));
    }

    #[test]
    fn test_reseed_with_zero_density_falls_back() {
        let mut state = WorldState::new(10, 10);
        let config = RegulatorConfig {
            low_watermark: 30,
            reseed_density: 0.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut events = EventLog::new();

        reseed(&mut state, &config, &EnergyConfig::default(), &mut rng, &mut events);
        assert_eq!(state.population(), 30);
    }

    #[test]
    fn test_reseed_noop_above_watermark() {
        let mut state = WorldState::new(10, 10);
        state.spawn_cell(Position::new(1, 1), Faction::A, 5, 10);
        let config = RegulatorConfig {
            low_watermark: 1,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut events = EventLog::new();
        assert_eq!(reseed(&mut state, &config, &EnergyConfig::default(), &mut rng, &mut events), 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_cull_removes_lowest_energy_first() {
        let mut state = WorldState::new(10, 10);
        for (x, energy) in [(0, 9), (2, 1), (4, 5), (6, 2), (8, 7)] {
            state.spawn_cell(Position::new(x, 0), Faction::A, energy, 10);
        }
        let config = RegulatorConfig {
            low_watermark: 0,
            max_cells: 3,
            ..Default::default()
        };
        let mut events = EventLog::new();

        assert_eq!(cull(&mut state, &config, &mut events), 2);
        assert_eq!(state.population(), 3);
        assert!(!state.grid.is_occupied(Position::new(2, 0)));
        assert!(!state.grid.is_occupied(Position::new(6, 0)));
        assert_eq!(events.count(EventKind::Death), 2);
    }

    #[test]
    fn test_cull_ties_go_oldest_then_grid_order() {
        let mut state = WorldState::new(10, 10);
        for x in 0..4 {
            state.spawn_cell(Position::new(x * 2, 0), Faction::B, 4, 10);
        }
        // (4, 0) is the oldest; (0, 0) and (6, 0) share the next age
        for (x, age) in [(0, 3), (2, 1), (4, 7), (6, 3)] {
            if let Some(cell) = state.grid.get_mut(Position::new(x, 0)) {
                cell.age = age;
            }
        }
        let config = RegulatorConfig {
            low_watermark: 0,
            max_cells: 2,
            ..Default::default()
        };
        let mut events = EventLog::new();

        assert_eq!(cull(&mut state, &config, &mut events), 2);
        assert!(!state.grid.is_occupied(Position::new(4, 0)));
        assert!(!state.grid.is_occupied(Position::new(0, 0)));
        assert!(state.grid.is_occupied(Position::new(2, 0)));
        assert!(state.grid.is_occupied(Position::new(6, 0)));
    }

    #[test]
    fn test_step_without_reseed_still_culls() {
        let mut state = WorldState::new(10, 10);
        for x in 0..5 {
            state.spawn_cell(Position::new(x, 5), Faction::A, 5, 10);
        }
        let config = RegulatorConfig {
            low_watermark: 3,
            max_cells: 3,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut events = EventLog::new();
        let energy = EnergyConfig::default();

        assert_eq!(step(&mut state, &config, &energy, false, &mut rng, &mut events), (0, 2));
        // Below the watermark, but reseeding is off
        state.grid.remove(Position::new(2, 5));
        assert_eq!(step(&mut state, &config, &energy, false, &mut rng, &mut events), (0, 0));
        assert_eq!(state.population(), 2);
    }
}

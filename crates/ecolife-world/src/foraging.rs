//! Energy economy: eating, hunger, reproduction and food spawning.

use crate::world::WorldState;
use ecolife_core::{EnergyConfig, Event, EventLog, Position};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use tracing::trace;

/// Random probes for an empty food slot before giving up for this tick
const FOOD_SPAWN_ATTEMPTS: usize = 32;

/// Cells standing on food consume it. Returns the number of meals.
pub fn eat(state: &mut WorldState, config: &EnergyConfig, events: &mut EventLog) -> usize {
    let meals: Vec<Position> = state
        .food
        .iter()
        .copied()
        .filter(|pos| state.grid.is_occupied(*pos))
        .collect();

    for pos in &meals {
        state.food.remove(pos);
        if let Some(cell) = state.grid.get_mut(*pos) {
            let gained = cell.add_energy(config.eat_gain, config.max_energy);
            events.push(Event::eat(*pos, cell.faction, gained));
        }
    }

    meals.len()
}

/// Every `hunger_period` ticks each cell loses one energy, floored at 1
pub fn hunger(state: &mut WorldState, tick: u64, config: &EnergyConfig) -> usize {
    if tick % config.hunger_period != 0 {
        return 0;
    }
    state
        .grid
        .cells_mut()
        .map(|cell| cell.starve())
        .filter(|starved| *starved)
        .count()
}

/// Well-fed cells with sparse neighborhoods try to place an offspring next to them.
///
/// Parents are chosen against the board as it stands before any offspring is placed,
/// and each empty slot can be claimed by only one parent per tick.
pub fn reproduce(
    state: &mut WorldState,
    config: &EnergyConfig,
    rng: &mut ChaCha8Rng,
    events: &mut EventLog,
) -> usize {
    let parents: Vec<Position> = state
        .grid
        .iter()
        .filter(|(pos, cell)| {
            cell.energy >= config.repro_threshold && state.grid.neighbor_counts(*pos).total < 3
        })
        .map(|(pos, _)| pos)
        .collect();

    let mut claimed = HashSet::new();
    let mut placements = Vec::new();
    for parent in parents {
        let slots: Vec<Position> = state
            .grid
            .empty_neighbors(parent)
            .into_iter()
            .filter(|slot| !claimed.contains(slot))
            .collect();
        let Some(&slot) = slots.choose(rng) else {
            continue;
        };
        if rng.gen::<f32>() < config.repro_chance {
            claimed.insert(slot);
            placements.push((parent, slot));
        }
    }

    let mut born = 0;
    for (parent, slot) in placements {
        let Some(faction) = state.grid.get(parent).map(|cell| cell.faction) else {
            continue;
        };
        if state
            .spawn_cell(slot, faction, config.birth_energy, config.max_energy)
            .is_none()
        {
            continue;
        }
        if let Some(cell) = state.grid.get_mut(parent) {
            cell.consume_energy(config.repro_cost);
            trace!(parent = %cell.id, energy = cell.energy, x = slot.x, y = slot.y, "Cell reproduced");
        }
        events.push(Event::birth(slot, faction, config.birth_energy));
        born += 1;
    }

    born
}

/// With probability `food_spawn_chance`, drop one food on a random vacant coordinate
pub fn spawn_food(state: &mut WorldState, config: &EnergyConfig, rng: &mut ChaCha8Rng) -> bool {
    if state.food.len() >= config.max_food || rng.gen::<f32>() >= config.food_spawn_chance {
        return false;
    }

    for _ in 0..FOOD_SPAWN_ATTEMPTS {
        let pos = Position::new(
            rng.gen_range(0..state.width()),
            rng.gen_range(0..state.height()),
        );
        if state.is_vacant(pos) {
            return state.place_food(pos, config.max_food);
        }
    }

    false
}

//! Synchronous two-faction birth/death/survival rule.
//!
//! The whole board is evaluated against one immutable view of the grid and the
//! resulting [`Transition`] is applied afterwards, so a cell born this tick never
//! counts as a neighbor during the same tick.

use crate::grid::Grid;
use crate::world::WorldState;
use ecolife_core::{EnergyConfig, Event, EventLog, Faction, Position, RuleConfig};
use tracing::trace;

/// Buffered outcome of one automaton pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub births: Vec<(Position, Faction)>,
    pub deaths: Vec<Position>,
    pub conversions: Vec<(Position, Faction)>,
}

impl Transition {
    pub fn is_empty(&self) -> bool {
        self.births.is_empty() && self.deaths.is_empty() && self.conversions.is_empty()
    }
}

/// Evaluate the rule for every coordinate that can change: live cells and their neighbors
pub fn evolve(grid: &Grid, rules: &RuleConfig) -> Transition {
    let mut transition = Transition::default();
    let mut checked = vec![false; grid.capacity()];

    for (pos, _) in grid.iter() {
        let mut candidates = [pos; 9];
        candidates[1..].copy_from_slice(&pos.neighbors(grid.width, grid.height));

        for candidate in candidates {
            let index = (candidate.y * grid.width + candidate.x) as usize;
            if checked[index] {
                continue;
            }
            checked[index] = true;

            let counts = grid.neighbor_counts(candidate);
            match grid.get(candidate) {
                Some(cell) => {
                    let survives = (2..=3).contains(&counts.total) && !cell.is_starved();
                    if !survives {
                        transition.deaths.push(candidate);
                        continue;
                    }
                    let faction = rules.survival.resolve(cell.faction, counts);
                    if faction != cell.faction {
                        transition.conversions.push((candidate, faction));
                    }
                }
                None if counts.total == 3 => {
                    transition.births.push((candidate, rules.tie_break.majority(counts)));
                }
                None => {}
            }
        }
    }

    transition
}

/// Commit a transition: deaths, aging of survivors, conversions, then births
pub fn apply(
    state: &mut WorldState,
    transition: Transition,
    energy: &EnergyConfig,
    events: &mut EventLog,
) {
    for pos in transition.deaths {
        state.kill(pos, events);
    }

    for cell in state.grid.cells_mut() {
        cell.tick();
    }

    for (pos, faction) in transition.conversions {
        if let Some(cell) = state.grid.get_mut(pos) {
            trace!(cell = %cell.id, from = %cell.faction, to = %faction, "Cell converted");
            cell.faction = faction;
        }
    }

    for (pos, faction) in transition.births {
        if state
            .spawn_cell(pos, faction, energy.birth_energy, energy.max_energy)
            .is_some()
        {
            events.push(Event::birth(pos, faction, energy.birth_energy));
        }
    }
}

/// One automaton tick. Returns `(births, deaths)`.
pub fn step(
    state: &mut WorldState,
    rules: &RuleConfig,
    energy: &EnergyConfig,
    events: &mut EventLog,
) -> (usize, usize) {
    let transition = evolve(&state.grid, rules);
    let counts = (transition.births.len(), transition.deaths.len());
    apply(state, transition, energy, events);
    counts
}

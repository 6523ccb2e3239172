//! Homing missiles and area-damage explosions.
//!
//! A missile goes `Launched -> Homing* -> Detonated | Expired`, dropping to
//! `Unguided` whenever no faction-B cell is left to chase. Targets are held as
//! [`CellId`] handles and re-resolved against the grid every tick.

use crate::grid::Grid;
use crate::world::WorldState;
use ecolife_core::{
    wrapped_delta, CellId, CombatConfig, EnergyConfig, Event, EventLog, Faction, MissileId,
    Position, TargetMetric,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use tracing::{debug, trace};

/// Faction that missiles hunt
const PREY: Faction = Faction::B;

/// Faction whose cells launch missiles
const HUNTER: Faction = Faction::A;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissilePhase {
    Launched,
    Homing,
    Unguided,
}

/// A projectile with continuous position, measured in cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Missile {
    pub id: MissileId,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub target: Option<CellId>,
    pub ttl: u32,
    pub phase: MissilePhase,
}

impl Missile {
    pub fn speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    pub fn heading(&self) -> f32 {
        self.vy.atan2(self.vx)
    }
}

/// Transient blast marker, kept around for renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub life: u32,
}

/// Result of advancing a missile by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flight {
    InFlight,
    Detonated { x: f32, y: f32 },
    Expired,
}

/// Offset from a point to a cell coordinate under `metric`
fn offset(grid: &Grid, x: f32, y: f32, pos: Position, metric: TargetMetric) -> (f32, f32) {
    match metric {
        TargetMetric::Planar => (pos.x as f32 - x, pos.y as f32 - y),
        TargetMetric::Toroidal => (
            wrapped_delta(x, pos.x as f32, grid.width as f32),
            wrapped_delta(y, pos.y as f32, grid.height as f32),
        ),
    }
}

/// Nearest live faction-B cell to the point `(x, y)`; ties go to the first in grid order
pub fn nearest_target(grid: &Grid, x: f32, y: f32, metric: TargetMetric) -> Option<(CellId, Position)> {
    let mut best: Option<(f32, CellId, Position)> = None;
    for (pos, cell) in grid.iter() {
        if cell.faction != PREY {
            continue;
        }
        let (dx, dy) = offset(grid, x, y, pos, metric);
        let d2 = dx * dx + dy * dy;
        if best.map_or(true, |(best_d2, _, _)| d2 < best_d2) {
            best = Some((d2, cell.id, pos));
        }
    }
    best.map(|(_, id, pos)| (id, pos))
}

/// Live target coordinate for a handle, if it still names a faction-B cell
fn resolve_target(grid: &Grid, target: Option<CellId>) -> Option<Position> {
    let (pos, cell) = grid.resolve(target?)?;
    (cell.faction == PREY).then_some(pos)
}

fn wrap_coord(value: f32, span: f32) -> f32 {
    let wrapped = value.rem_euclid(span);
    if wrapped >= span {
        0.0
    } else {
        wrapped
    }
}

/// Put a missile in flight from `origin`, aimed at the nearest prey if there is one
pub fn launch(
    state: &mut WorldState,
    config: &CombatConfig,
    metric: TargetMetric,
    origin: Position,
    faction: Option<Faction>,
    rng: &mut ChaCha8Rng,
    events: &mut EventLog,
) -> Option<MissileId> {
    if state.missiles.len() >= config.max_missiles {
        return None;
    }

    let origin = origin.wrap(state.width(), state.height());
    let (x, y) = (origin.x as f32, origin.y as f32);
    let target = nearest_target(&state.grid, x, y, metric);
    let heading = match target {
        Some((_, pos)) => {
            let (dx, dy) = offset(&state.grid, x, y, pos, metric);
            dy.atan2(dx)
        }
        None => rng.gen_range(0.0..TAU),
    };

    let id = state.allocate_missile_id();
    state.missiles.push(Missile {
        id,
        x,
        y,
        vx: heading.cos() * config.missile_speed,
        vy: heading.sin() * config.missile_speed,
        target: target.map(|(cell, _)| cell),
        ttl: config.missile_ttl,
        phase: MissilePhase::Launched,
    });
    events.push(Event::launch(origin, faction, id));
    debug!(missile = %id, x = origin.x, y = origin.y, target = ?target, "Missile launched");
    Some(id)
}

/// Eligible faction-A cells fire with probability `launch_chance`
pub fn launch_volley(
    state: &mut WorldState,
    config: &CombatConfig,
    metric: TargetMetric,
    rng: &mut ChaCha8Rng,
    events: &mut EventLog,
) -> usize {
    let launchers: Vec<Position> = state
        .grid
        .iter()
        .filter(|(_, cell)| cell.faction == HUNTER && cell.energy >= config.launch_threshold)
        .map(|(pos, _)| pos)
        .collect();

    let mut launched = 0;
    for pos in launchers {
        if state.missiles.len() >= config.max_missiles {
            break;
        }
        if rng.gen::<f32>() >= config.launch_chance {
            continue;
        }
        if let Some(cell) = state.grid.get_mut(pos) {
            cell.consume_energy(config.launch_cost);
        }
        if launch(state, config, metric, pos, Some(HUNTER), rng, events).is_some() {
            launched += 1;
        }
    }
    launched
}

/// Re-target, steer, move and test one missile for impact or expiry
pub fn advance(missile: &mut Missile, grid: &Grid, config: &CombatConfig, metric: TargetMetric) -> Flight {
    let goal = match resolve_target(grid, missile.target) {
        Some(pos) => Some(pos),
        None => {
            let retarget = nearest_target(grid, missile.x, missile.y, metric);
            if let Some((id, _)) = retarget {
                trace!(missile = %missile.id, target = %id, "Missile re-targeted");
            }
            missile.target = retarget.map(|(id, _)| id);
            retarget.map(|(_, pos)| pos)
        }
    };

    let mut heading = missile.heading();
    match goal {
        Some(pos) => {
            let (dx, dy) = offset(grid, missile.x, missile.y, pos, metric);
            let mut turn = dy.atan2(dx) - heading;
            while turn > PI {
                turn -= TAU;
            }
            while turn < -PI {
                turn += TAU;
            }
            heading += turn.clamp(-config.turn_rate, config.turn_rate);
            missile.phase = MissilePhase::Homing;
        }
        None => missile.phase = MissilePhase::Unguided,
    }

    let speed = (missile.speed() + config.thrust).min(config.max_speed);
    missile.vx = heading.cos() * speed;
    missile.vy = heading.sin() * speed;
    missile.x = wrap_coord(missile.x + missile.vx, grid.width as f32);
    missile.y = wrap_coord(missile.y + missile.vy, grid.height as f32);

    let hit = grid
        .within_radius(missile.x, missile.y, config.impact_radius)
        .into_iter()
        .any(|pos| grid.get(pos).map_or(false, |cell| cell.faction == PREY));
    if hit {
        return Flight::Detonated {
            x: missile.x,
            y: missile.y,
        };
    }

    missile.ttl = missile.ttl.saturating_sub(1);
    if missile.ttl == 0 {
        Flight::Expired
    } else {
        Flight::InFlight
    }
}

/// Blow up at `(x, y)`: every cell within `explosion_radius` (inclusive) dies,
/// whatever its faction. Returns the number of casualties.
pub fn detonate(
    state: &mut WorldState,
    config: &CombatConfig,
    energy: &EnergyConfig,
    x: f32,
    y: f32,
    rng: &mut ChaCha8Rng,
    events: &mut EventLog,
) -> usize {
    let impact = Position::new(x.round() as i32, y.round() as i32).wrap(state.width(), state.height());
    let victims = state.grid.within_radius(x, y, config.explosion_radius);

    state.explosions.push(Explosion {
        x,
        y,
        radius: config.explosion_radius,
        life: config.explosion_life,
    });
    events.push(Event::detonate(impact, victims.len()));

    for pos in &victims {
        state.kill(*pos, events);
        if rng.gen::<f32>() < config.food_drop_chance {
            state.place_food(*pos, energy.max_food);
        }
    }

    debug!(x = impact.x, y = impact.y, casualties = victims.len(), "Missile detonated");
    victims.len()
}

/// Age explosions and drop the ones that have faded
pub fn decay_explosions(state: &mut WorldState) {
    for explosion in &mut state.explosions {
        explosion.life = explosion.life.saturating_sub(1);
    }
    state.explosions.retain(|e| e.life > 0);
}

/// One combat tick. Missiles launched here are first advanced next tick.
pub fn step(
    state: &mut WorldState,
    config: &CombatConfig,
    energy: &EnergyConfig,
    metric: TargetMetric,
    allow_launch: bool,
    rng: &mut ChaCha8Rng,
    events: &mut EventLog,
) {
    decay_explosions(state);

    let mut blasts = Vec::new();
    let grid = &state.grid;
    state.missiles.retain_mut(|missile| match advance(missile, grid, config, metric) {
        Flight::InFlight => true,
        Flight::Detonated { x, y } => {
            blasts.push((x, y));
            false
        }
        Flight::Expired => {
            trace!(missile = %missile.id, "Missile expired");
            false
        }
    });

    for (x, y) in blasts {
        detonate(state, config, energy, x, y, rng, events);
    }

    if allow_launch {
        launch_volley(state, config, metric, rng, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecolife_core::EventKind;
    use rand::SeedableRng;

    fn quiet_config() -> CombatConfig {
        CombatConfig {
            food_drop_chance: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_nearest_target_planar_vs_toroidal() {
        let mut state = WorldState::new(20, 20);
        state.spawn_cell(Position::new(18, 0), Faction::B, 5, 10);
        state.spawn_cell(Position::new(6, 0), Faction::B, 5, 10);
        state.spawn_cell(Position::new(1, 0), Faction::A, 5, 10);

        let planar = nearest_target(&state.grid, 0.0, 0.0, TargetMetric::Planar);
        assert_eq!(planar.map(|(_, pos)| pos), Some(Position::new(6, 0)));

        let toroidal = nearest_target(&state.grid, 0.0, 0.0, TargetMetric::Toroidal);
        assert_eq!(toroidal.map(|(_, pos)| pos), Some(Position::new(18, 0)));
    }

    #[test]
    fn test_unguided_missile_expires_after_ttl() {
        let mut state = WorldState::new(30, 30);
        let config = CombatConfig {
            missile_ttl: 5,
            ..quiet_config()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut events = EventLog::new();
        launch(&mut state, &config, TargetMetric::Planar, Position::new(5, 5), None, &mut rng, &mut events);

        let mut missile = state.missiles[0].clone();
        assert!(missile.target.is_none());
        for _ in 0..4 {
            assert_eq!(advance(&mut missile, &state.grid, &config, TargetMetric::Planar), Flight::InFlight);
            assert_eq!(missile.phase, MissilePhase::Unguided);
        }
        assert_eq!(advance(&mut missile, &state.grid, &config, TargetMetric::Planar), Flight::Expired);
    }

    #[test]
    fn test_speed_is_clamped() {
        let grid = Grid::new(50, 50);
        let config = quiet_config();
        let mut missile = Missile {
            id: MissileId(1),
            x: 10.0,
            y: 10.0,
            vx: config.max_speed,
            vy: 0.0,
            target: None,
            ttl: 100,
            phase: MissilePhase::Launched,
        };
        for _ in 0..10 {
            advance(&mut missile, &grid, &config, TargetMetric::Planar);
            assert!(missile.speed() <= config.max_speed + 1e-5);
        }
        assert!((missile.vy).abs() < 1e-5);
    }

    #[test]
    fn test_turn_rate_is_bounded() {
        let mut grid = Grid::new(50, 50);
        grid.put(
            Position::new(10, 30),
            crate::cell::Cell::new(CellId(9), Faction::B, 5, 10),
        );
        let config = quiet_config();
        // Flying east, target due south
        let mut missile = Missile {
            id: MissileId(1),
            x: 10.0,
            y: 10.0,
            vx: config.missile_speed,
            vy: 0.0,
            target: Some(CellId(9)),
            ttl: 100,
            phase: MissilePhase::Launched,
        };
        advance(&mut missile, &grid, &config, TargetMetric::Planar);
        assert!((missile.heading() - config.turn_rate).abs() < 1e-4);
        assert_eq!(missile.phase, MissilePhase::Homing);
    }

    #[test]
    fn test_dangling_target_is_replaced() {
        let mut state = WorldState::new(30, 30);
        let config = quiet_config();
        let doomed = state.spawn_cell(Position::new(20, 5), Faction::B, 5, 10);
        let survivor = state.spawn_cell(Position::new(5, 25), Faction::B, 5, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut events = EventLog::new();
        launch(&mut state, &config, TargetMetric::Planar, Position::new(18, 5), None, &mut rng, &mut events);
        assert_eq!(state.missiles[0].target, doomed);

        state.kill(Position::new(20, 5), &mut events);
        let mut missile = state.missiles[0].clone();
        advance(&mut missile, &state.grid, &config, TargetMetric::Planar);
        assert_eq!(missile.target, survivor);
    }

    #[test]
    fn test_detonation_friendly_fire_inclusive_radius() {
        let mut state = WorldState::new(20, 20);
        let config = CombatConfig {
            explosion_radius: 2.0,
            ..quiet_config()
        };
        let energy = EnergyConfig::default();
        // Exactly on the boundary, both factions
        state.spawn_cell(Position::new(12, 10), Faction::A, 5, 10);
        state.spawn_cell(Position::new(10, 8), Faction::B, 5, 10);
        // Inside
        state.spawn_cell(Position::new(11, 11), Faction::A, 5, 10);
        // Just outside: sqrt(5) > 2
        state.spawn_cell(Position::new(12, 11), Faction::B, 5, 10);

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut events = EventLog::new();
        let casualties = detonate(&mut state, &config, &energy, 10.0, 10.0, &mut rng, &mut events);

        assert_eq!(casualties, 3);
        assert_eq!(state.population(), 1);
        assert!(state.grid.is_occupied(Position::new(12, 11)));
        assert_eq!(state.explosions.len(), 1);
        assert_eq!(events.count(EventKind::Detonate), 1);
        assert_eq!(events.count(EventKind::Death), 3);
    }

    #[test]
    fn test_casualties_drop_food_up_to_cap() {
        let mut state = WorldState::new(20, 20);
        let config = CombatConfig {
            explosion_radius: 2.0,
            food_drop_chance: 1.0,
            ..Default::default()
        };
        let energy = EnergyConfig {
            max_food: 3,
            ..Default::default()
        };
        state.place_food(Position::new(0, 0), energy.max_food);
        for (x, y) in [(9, 10), (10, 10), (11, 10), (10, 11)] {
            state.spawn_cell(Position::new(x, y), Faction::B, 5, 10);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut events = EventLog::new();
        let casualties = detonate(&mut state, &config, &energy, 10.0, 10.0, &mut rng, &mut events);

        assert_eq!(casualties, 4);
        assert_eq!(state.food.len(), energy.max_food);
        assert!(state.food.contains(&Position::new(0, 0)));
        // Victims are processed in grid order, so the first two get the food
        assert!(state.food.contains(&Position::new(9, 10)));
        assert!(state.food.contains(&Position::new(10, 10)));
        assert!(!state.food.contains(&Position::new(10, 11)));
    }

    #[test]
    fn test_missile_hits_nearby_prey() {
        let mut state = WorldState::new(30, 30);
        let config = quiet_config();
        let energy = EnergyConfig::default();
        state.spawn_cell(Position::new(12, 10), Faction::B, 5, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut events = EventLog::new();
        launch(&mut state, &config, TargetMetric::Planar, Position::new(10, 10), None, &mut rng, &mut events);

        for _ in 0..10 {
            step(&mut state, &config, &energy, TargetMetric::Planar, false, &mut rng, &mut events);
        }
        assert!(state.missiles.is_empty());
        assert_eq!(events.count(EventKind::Detonate), 1);
        assert!(!state.grid.is_occupied(Position::new(12, 10)));
    }

    #[test]
    fn test_volley_pays_launch_cost_and_respects_cap() {
        let mut state = WorldState::new(30, 30);
        let config = CombatConfig {
            launch_chance: 1.0,
            max_missiles: 2,
            ..quiet_config()
        };
        for x in 0..4 {
            state.spawn_cell(Position::new(x * 3, 0), Faction::A, 10, 10);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut events = EventLog::new();

        assert_eq!(launch_volley(&mut state, &config, TargetMetric::Planar, &mut rng, &mut events), 2);
        assert_eq!(state.missiles.len(), 2);
        assert_eq!(state.grid.get(Position::new(0, 0)).map(|c| c.energy), Some(9));
        assert_eq!(state.grid.get(Position::new(9, 0)).map(|c| c.energy), Some(10));
        assert_eq!(events.count(EventKind::Launch), 2);
    }

    #[test]
    fn test_explosions_fade() {
        let mut state = WorldState::new(10, 10);
        state.explosions.push(Explosion {
            x: 1.0,
            y: 1.0,
            radius: 2.0,
            life: 2,
        });
        decay_explosions(&mut state);
        assert_eq!(state.explosions.len(), 1);
        decay_explosions(&mut state);
        assert!(state.explosions.is_empty());
    }
}

//! Wave composition and placement
//!
//! Harder archetypes sit in fixed rows; every Nth round is an all-boss wave.
//! Odd rounds line up on a strict grid, even rounds scatter around it.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::enemy::{Archetype, Behavior, BehaviorKind, Enemy, PatrolShape, Weapon};
use super::formation::FormationPattern;
use super::state::SessionState;
use crate::Tuning;
use crate::consts::*;

/// Grid pitch
pub const COLUMN_SPACING: f32 = 60.0;
pub const ROW_SPACING: f32 = 45.0;
/// Top row y
pub const GRID_TOP: f32 = 60.0;
/// Scatter jitter and the closest two scattered slots may sit
pub const JITTER: Vec2 = Vec2::new(20.0, 10.0);
pub const MIN_SPACING: f32 = 40.0;
pub const PLACEMENT_ATTEMPTS: u32 = 30;
/// Most asteroids a wave carries
pub const MAX_ASTEROIDS: u32 = 4;

/// One formation slot to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPlan {
    pub row: u32,
    pub col: u32,
    pub archetype: Archetype,
    pub behavior: BehaviorKind,
}

/// Archetype and behavior for a row
pub fn row_archetype(row: u32) -> (Archetype, BehaviorKind) {
    match row % 5 {
        0 => (Archetype::Boss, BehaviorKind::Basic),
        1 => (Archetype::Red, BehaviorKind::Zigzag),
        2 => (Archetype::Butterfly, BehaviorKind::PatternOrbit),
        3 => (Archetype::Phantom, BehaviorKind::Homing),
        _ => (Archetype::Bee, BehaviorKind::Basic),
    }
}

/// Slots for a round, row-major
pub fn wave_layout(round: u32, tuning: &Tuning) -> Vec<SlotPlan> {
    let boss_wave = tuning.is_boss_round(round);
    let mut plans = Vec::with_capacity((tuning.rows * tuning.cols) as usize);
    for row in 0..tuning.rows {
        let (archetype, behavior) = if boss_wave {
            (Archetype::Boss, BehaviorKind::Basic)
        } else {
            row_archetype(row)
        };
        for col in 0..tuning.cols {
            // Butterflies only take every other column
            if archetype == Archetype::Butterfly && col % 2 == 0 {
                continue;
            }
            plans.push(SlotPlan {
                row,
                col,
                archetype,
                behavior,
            });
        }
    }
    plans
}

pub fn asteroid_count(round: u32) -> u32 {
    if round < 3 {
        0
    } else {
        ((round - 1) / 2).min(MAX_ASTEROIDS)
    }
}

/// Enemies a fresh wave for `round` contains
pub fn wave_population(round: u32, tuning: &Tuning) -> usize {
    wave_layout(round, tuning).len() + asteroid_count(round) as usize
}

/// Grid slot, centered horizontally
pub fn grid_slot(row: u32, col: u32, cols: u32) -> Vec2 {
    let width = cols.saturating_sub(1) as f32 * COLUMN_SPACING + ENEMY_WIDTH;
    let left = (SCREEN_WIDTH - width) / 2.0;
    Vec2::new(
        left + col as f32 * COLUMN_SPACING,
        GRID_TOP + row as f32 * ROW_SPACING,
    )
}

/// Jitter each grid slot, keeping a minimum spacing. Falls back to the grid
/// slot when no jittered spot fits.
pub fn scattered_slots<R: Rng>(grid: &[Vec2], rng: &mut R) -> Vec<Vec2> {
    let mut placed: Vec<Vec2> = Vec::with_capacity(grid.len());
    for &slot in grid {
        let candidate = (0..PLACEMENT_ATTEMPTS)
            .map(|_| {
                let jitter = Vec2::new(
                    rng.random_range(-JITTER.x..=JITTER.x),
                    rng.random_range(-JITTER.y..=JITTER.y),
                );
                clamp_slot(slot + jitter)
            })
            .find(|c| placed.iter().all(|p| p.distance(*c) >= MIN_SPACING));
        placed.push(candidate.unwrap_or(slot));
    }
    placed
}

fn clamp_slot(slot: Vec2) -> Vec2 {
    Vec2::new(
        slot.x.clamp(0.0, SCREEN_WIDTH - ENEMY_WIDTH),
        slot.y.clamp(FORMATION_TOP, FORMATION_FLOOR - ENEMY_HEIGHT),
    )
}

/// Random point off the left, right or top edge
pub fn spawn_origin<R: Rng>(rng: &mut R) -> Vec2 {
    match rng.random_range(0..3) {
        0 => Vec2::new(
            -OFFSCREEN_MARGIN / 2.0,
            rng.random_range(-OFFSCREEN_MARGIN..=SCREEN_HEIGHT / 4.0),
        ),
        1 => Vec2::new(
            SCREEN_WIDTH + OFFSCREEN_MARGIN / 2.0,
            rng.random_range(-OFFSCREEN_MARGIN..=SCREEN_HEIGHT / 4.0),
        ),
        _ => Vec2::new(
            rng.random_range(0.0..=SCREEN_WIDTH - ENEMY_WIDTH),
            -OFFSCREEN_MARGIN,
        ),
    }
}

/// Build the enemy for one slot
fn build_enemy(state: &mut SessionState, plan: &SlotPlan, slot: Vec2) -> Enemy {
    let id = state.next_entity_id();
    let round = &state.round;
    let rng = &mut state.rng;

    let behavior = match plan.behavior {
        BehaviorKind::Basic => Behavior::Basic,
        BehaviorKind::Zigzag => Behavior::zigzag(rng),
        BehaviorKind::PatternOrbit => {
            let shape = PatrolShape::ALL
                .choose(rng)
                .copied()
                .unwrap_or(PatrolShape::Circle);
            Behavior::pattern_orbit(shape, round.round, round.patrol_speed(), plan.col % 4 < 2)
        }
        BehaviorKind::Homing => Behavior::homing(round.homing_speed()),
        BehaviorKind::Asteroid => Behavior::asteroid(rng),
    };

    let origin = spawn_origin(rng);
    let health = round.health_for(plan.archetype);
    let enemy = Enemy::new(id, plan.archetype, behavior, origin, slot, health, rng);

    match plan.archetype.gun() {
        Some((pattern, cooldown_ticks)) => {
            let delay = rng.random_range(0..=state.tuning.max_attack_delay_ticks) as u64;
            enemy.with_weapon(Weapon {
                pattern,
                cooldown_ticks,
                ready_at: state.time_ticks + delay,
            })
        }
        None => enemy,
    }
}

fn build_asteroid(state: &mut SessionState) -> Enemy {
    let id = state.next_entity_id();
    let rng = &mut state.rng;
    let behavior = Behavior::asteroid(rng);
    let start = Vec2::new(
        rng.random_range(0.0..=SCREEN_WIDTH - ENEMY_WIDTH),
        rng.random_range(-SCREEN_HEIGHT / 2.0..=-ENEMY_HEIGHT),
    );
    let health = state.round.health_for(Archetype::Asteroid);
    Enemy::new(id, Archetype::Asteroid, behavior, start, start, health, rng)
}

/// Populate the arena for the current round and reset group motion
pub fn spawn_wave(state: &mut SessionState) {
    let round = state.round.round;
    let cols = state.tuning.cols;
    let plans = wave_layout(round, &state.tuning);
    let grid: Vec<Vec2> = plans.iter().map(|p| grid_slot(p.row, p.col, cols)).collect();
    let scattered = round % 2 == 0;
    let slots = if scattered {
        scattered_slots(&grid, &mut state.rng)
    } else {
        grid
    };

    for (plan, slot) in plans.iter().zip(slots) {
        let enemy = build_enemy(state, plan, slot);
        state.enemies.push(enemy);
    }
    let asteroids = asteroid_count(round);
    for _ in 0..asteroids {
        let asteroid = build_asteroid(state);
        state.enemies.push(asteroid);
    }

    let pattern = FormationPattern::for_wave(state.round.wave);
    state
        .formation
        .reset(pattern, state.round.formation_speed, state.tuning.descend_step);
    state.dive.reset();
    state.dive.raise_cap(state.round.max_divers);
    state.normalize_order();

    log::info!(
        "Spawned wave {} (round {}): {} enemies, {} asteroids, {:?}{}",
        state.round.wave,
        round,
        state.enemies.len(),
        asteroids,
        pattern,
        if scattered { ", scattered" } else { "" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyState;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_round_one_layout() {
        let tuning = Tuning::default();
        let plans = wave_layout(1, &tuning);
        // 5x6 minus the three skipped butterfly columns
        assert_eq!(plans.len(), 27);
        assert_eq!(plans.iter().filter(|p| p.archetype == Archetype::Butterfly).count(), 3);
        assert!(plans.iter().filter(|p| p.row == 0).all(|p| p.archetype == Archetype::Boss));
        assert_eq!(wave_population(1, &tuning), 27);
    }

    #[test]
    fn test_boss_wave() {
        let tuning = Tuning::default();
        let plans = wave_layout(5, &tuning);
        assert_eq!(plans.len(), 30);
        assert!(plans.iter().all(|p| p.archetype == Archetype::Boss));
        assert_eq!(wave_population(5, &tuning), 32);
    }

    #[test]
    fn test_asteroid_count() {
        assert_eq!(asteroid_count(1), 0);
        assert_eq!(asteroid_count(2), 0);
        assert_eq!(asteroid_count(3), 1);
        assert_eq!(asteroid_count(6), 2);
        assert_eq!(asteroid_count(50), MAX_ASTEROIDS);
    }

    #[test]
    fn test_grid_is_centered() {
        let left = grid_slot(0, 0, 6);
        let right = grid_slot(0, 5, 6);
        assert_eq!(left.x, SCREEN_WIDTH - (right.x + ENEMY_WIDTH));
        assert_eq!(grid_slot(4, 0, 6).y, GRID_TOP + 4.0 * ROW_SPACING);
    }

    #[test]
    fn test_scatter_keeps_spacing_or_falls_back() {
        let grid: Vec<Vec2> = (0..5)
            .flat_map(|r| (0..6).map(move |c| grid_slot(r, c, 6)))
            .collect();
        for seed in 0..64 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let slots = scattered_slots(&grid, &mut rng);
            assert_eq!(slots.len(), grid.len());
            for (i, s) in slots.iter().enumerate() {
                assert!((s.x - grid[i].x).abs() <= JITTER.x);
                assert!((s.y - grid[i].y).abs() <= JITTER.y);
            }
            // A later slot closer than the minimum must be a grid fallback
            for j in 1..slots.len() {
                for i in 0..j {
                    if slots[i].distance(slots[j]) < MIN_SPACING {
                        assert_eq!(slots[j], grid[j], "seed {seed}: slots {i} and {j} crowd");
                    }
                }
            }
        }
    }

    #[test]
    fn test_scatter_falls_back_when_crowded() {
        // The jitter box fits at most two points MIN_SPACING apart
        let grid = vec![Vec2::new(200.0, 100.0); 3];
        for seed in 0..16 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let slots = scattered_slots(&grid, &mut rng);
            assert_eq!(slots[2], grid[2]);
        }
    }

    #[test]
    fn test_spawn_wave_round_one() {
        let state = SessionState::new(11);
        assert_eq!(state.enemies.len(), 27);
        assert!(state.enemies.iter().all(|e| e.state == EnemyState::Entering));
        let armed = state.enemies.iter().filter(|e| e.can_shoot()).count();
        // Bosses, reds and butterflies carry guns
        assert_eq!(armed, 6 + 6 + 3);
        let origins_offscreen = state
            .enemies
            .iter()
            .all(|e| e.pos.x < 0.0 || e.pos.x > SCREEN_WIDTH - ENEMY_WIDTH || e.pos.y < 0.0);
        assert!(origins_offscreen);
    }

    #[test]
    fn test_spawn_wave_with_asteroids() {
        let mut state = SessionState::new(12);
        state.enemies.clear();
        state.round.round = 4;
        spawn_wave(&mut state);
        assert_eq!(state.enemies.len(), wave_population(4, &state.tuning));
        assert_eq!(state.enemies.iter().filter(|e| e.is_hazard()).count(), 1);
        assert!(state.enemies.windows(2).all(|w| w[0].id < w[1].id));
    }
}

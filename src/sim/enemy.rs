//! Enemy entities and their motion state machine
//!
//! Every enemy runs the same cycle:
//! `Entering -> InFormation -> Diving -> (Looping) -> Returning -> InFormation`,
//! with `Destroyed` reachable from anywhere. Per-variant motion is a tagged
//! [`Behavior`] dispatched through `match`, so the state machine stays
//! exhaustive.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::path::{PathCursor, generate_path, plunge_path};
use super::projectile::{Projectile, ProjectileSystem};
use super::rect::Rect;
use super::state::Rgb;
use crate::Tuning;
use crate::consts::*;

/// Zigzag sine drift
pub const ZIGZAG_AMPLITUDE: f32 = 15.0;
pub const ZIGZAG_FREQUENCY: f32 = 0.08;
/// Radius and angular rate of the loop an orbiting diver flies around its path
pub const ORBIT_RADIUS: f32 = 25.0;
pub const ORBIT_RATE: f32 = 0.15;
/// Homing plunge: samples per leg and cursor step
pub const PLUNGE_STEPS: usize = 60;
pub const FAST_FOLLOW_STEP: usize = 2;
/// Homing drift never strays further than this from the plunge line
pub const MAX_HOMING_DRIFT: f32 = 150.0;

/// Motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyState {
    /// Flying the entry path toward the home slot
    Entering,
    /// Holding a slot, moving with the formation
    InFormation,
    /// Attack run toward the player
    Diving,
    /// Re-entering from the top after diving off the bottom
    Looping,
    /// Flying back to the home slot
    Returning,
    /// Removed at the end of the current tick
    Destroyed,
}

impl EnemyState {
    /// Away from the formation on an attack run
    pub fn is_sortie(self) -> bool {
        matches!(
            self,
            EnemyState::Diving | EnemyState::Looping | EnemyState::Returning
        )
    }
}

/// Enemy type: look, score value, toughness and armament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Bee,
    Butterfly,
    Boss,
    Red,
    /// Shrugs off the first hit by phasing back to formation
    Phantom,
    Asteroid,
}

impl Archetype {
    pub fn color(self) -> Rgb {
        match self {
            Archetype::Bee => Rgb(255, 255, 0),
            Archetype::Butterfly => Rgb(0, 0, 255),
            Archetype::Boss => Rgb(128, 0, 128),
            Archetype::Red => Rgb(255, 0, 0),
            Archetype::Phantom => Rgb(180, 0, 180),
            Archetype::Asteroid => Rgb(105, 105, 105),
        }
    }

    pub fn points(self) -> u32 {
        match self {
            Archetype::Bee => 30,
            Archetype::Butterfly => 40,
            Archetype::Boss => 50,
            Archetype::Red => 60,
            Archetype::Phantom => 80,
            Archetype::Asteroid => 10,
        }
    }

    /// Health before round scaling
    pub fn base_health(self) -> u32 {
        match self {
            Archetype::Bee | Archetype::Phantom => 1,
            Archetype::Butterfly | Archetype::Asteroid => 2,
            Archetype::Red => 3,
            Archetype::Boss => 10,
        }
    }

    /// Gun pattern and cooldown (ticks), if armed
    pub fn gun(self) -> Option<(ShotPattern, u32)> {
        match self {
            Archetype::Butterfly => Some((ShotPattern::Twin, 240)),
            Archetype::Boss => Some((ShotPattern::Single, 180)),
            Archetype::Red => Some((ShotPattern::Single, 300)),
            Archetype::Bee | Archetype::Phantom | Archetype::Asteroid => None,
        }
    }

    /// Sideways offset of the dive aim point (flankers miss on purpose)
    pub fn flank_offset(self) -> f32 {
        match self {
            Archetype::Butterfly => 150.0,
            _ => 0.0,
        }
    }

    pub fn has_health_bar(self) -> bool {
        self == Archetype::Boss
    }

    pub fn drop_chance(self, tuning: &Tuning) -> f64 {
        if self == Archetype::Boss {
            tuning.boss_drop_chance
        } else {
            tuning.drop_chance
        }
    }
}

/// How a gun fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotPattern {
    Single,
    /// Two bullets spreading left and right
    Twin,
}

/// Per-enemy gun with an absolute ready timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub pattern: ShotPattern,
    pub cooldown_ticks: u32,
    pub ready_at: u64,
}

/// Patrol outline flown around the home slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatrolShape {
    Circle,
    Square,
    Triangle,
    Diamond,
}

impl PatrolShape {
    pub const ALL: [PatrolShape; 4] = [
        PatrolShape::Circle,
        PatrolShape::Square,
        PatrolShape::Triangle,
        PatrolShape::Diamond,
    ];

    /// Waypoints relative to the slot
    pub fn waypoints(self, size: f32) -> Vec<Vec2> {
        match self {
            PatrolShape::Circle => (0..20)
                .map(|i| {
                    let a = TAU * i as f32 / 20.0;
                    Vec2::new(size * a.cos(), size * a.sin())
                })
                .collect(),
            PatrolShape::Square => vec![
                Vec2::new(-size, -size),
                Vec2::new(size, -size),
                Vec2::new(size, size),
                Vec2::new(-size, size),
            ],
            PatrolShape::Triangle => {
                let h = size * 3f32.sqrt() / 2.0;
                vec![
                    Vec2::new(0.0, -h),
                    Vec2::new(-size, h / 2.0),
                    Vec2::new(size, h / 2.0),
                ]
            }
            PatrolShape::Diamond => vec![
                Vec2::new(0.0, -size),
                Vec2::new(size, 0.0),
                Vec2::new(0.0, size),
                Vec2::new(-size, 0.0),
            ],
        }
    }
}

/// Index of the waypoint closest to `to` (linear scan; 0 when empty)
pub fn nearest_waypoint(waypoints: &[Vec2], to: Vec2) -> usize {
    waypoints
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.distance_squared(to)
                .partial_cmp(&b.distance_squared(to))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Behavior discriminant, for layout tables and renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorKind {
    Basic,
    Zigzag,
    PatternOrbit,
    Homing,
    Asteroid,
}

/// Per-variant motion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Swooping Bezier dive, loops back from the top
    Basic,
    /// Sine drift in formation and while diving; charges home at double step
    Zigzag {
        amplitude: f32,
        frequency: f32,
        phase: f32,
    },
    /// Patrols a shape around its slot; flies loops while diving
    PatternOrbit {
        shape: PatrolShape,
        waypoints: Vec<Vec2>,
        waypoint: usize,
        patrol_speed: f32,
        orbit_angle: f32,
        orbit_dir: f32,
    },
    /// Straight plunge that bends toward the player's live position
    Homing {
        speed: f32,
        turn_rate: f32,
        drift: f32,
    },
    /// Falls through the screen, never joins the formation
    Asteroid { speed: f32 },
}

impl Behavior {
    pub fn zigzag<R: Rng>(rng: &mut R) -> Self {
        Behavior::Zigzag {
            amplitude: ZIGZAG_AMPLITUDE,
            frequency: ZIGZAG_FREQUENCY,
            phase: rng.random_range(0.0..TAU),
        }
    }

    /// Patrol size grows with the round
    pub fn pattern_orbit(shape: PatrolShape, round: u32, speed: f32, clockwise: bool) -> Self {
        let size = (12.0 + 2.0 * round as f32).min(30.0);
        Behavior::PatternOrbit {
            shape,
            waypoints: shape.waypoints(size),
            waypoint: 0,
            patrol_speed: speed,
            orbit_angle: 0.0,
            orbit_dir: if clockwise { 1.0 } else { -1.0 },
        }
    }

    pub fn homing(speed: f32) -> Self {
        Behavior::Homing {
            speed,
            turn_rate: 2.0 * speed,
            drift: 0.0,
        }
    }

    pub fn asteroid<R: Rng>(rng: &mut R) -> Self {
        Behavior::Asteroid {
            speed: rng.random_range(0.5..1.5),
        }
    }

    pub fn kind(&self) -> BehaviorKind {
        match self {
            Behavior::Basic => BehaviorKind::Basic,
            Behavior::Zigzag { .. } => BehaviorKind::Zigzag,
            Behavior::PatternOrbit { .. } => BehaviorKind::PatternOrbit,
            Behavior::Homing { .. } => BehaviorKind::Homing,
            Behavior::Asteroid { .. } => BehaviorKind::Asteroid,
        }
    }

    /// Entry path cursor step (fast homers skip samples)
    fn entry_step(&self) -> usize {
        match self {
            Behavior::Homing { speed, .. } => (speed.floor() as usize).max(1),
            _ => 1,
        }
    }

    /// Offset added to the sampled dive point this tick
    fn dive_offset(&mut self, sample: Vec2, size: Vec2, player_center: Vec2) -> Vec2 {
        match self {
            Behavior::Basic | Behavior::Asteroid { .. } => Vec2::ZERO,
            Behavior::Zigzag {
                amplitude,
                frequency,
                phase,
            } => Vec2::new(*amplitude * (*frequency * sample.y + *phase).sin(), 0.0),
            Behavior::PatternOrbit {
                orbit_angle,
                orbit_dir,
                ..
            } => {
                *orbit_angle += ORBIT_RATE * *orbit_dir;
                // Starts at zero offset so the loop doesn't teleport the diver
                Vec2::new(
                    ORBIT_RADIUS * orbit_angle.sin(),
                    ORBIT_RADIUS * (1.0 - orbit_angle.cos()),
                )
            }
            Behavior::Homing {
                turn_rate, drift, ..
            } => {
                let wanted = player_center.x - (sample.x + size.x / 2.0);
                *drift += (wanted - *drift).clamp(-*turn_rate, *turn_rate);
                *drift = drift.clamp(-MAX_HOMING_DRIFT, MAX_HOMING_DRIFT);
                Vec2::new(*drift, 0.0)
            }
        }
    }
}

/// What an enemy needs to know about the world to move
#[derive(Debug, Clone, Copy)]
pub struct MotionContext {
    /// Current shared formation translation
    pub formation_offset: Vec2,
    /// Player box center
    pub player_center: Vec2,
}

/// An enemy entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub archetype: Archetype,
    pub behavior: Behavior,
    pub state: EnemyState,
    /// Top-left of the bounding box
    pub pos: Vec2,
    pub size: Vec2,
    pub health: u32,
    pub max_health: u32,
    pub points: u32,
    /// Fixed slot for this wave; the live target is `home_slot + formation offset`
    pub home_slot: Vec2,
    /// Per-variant oscillation around the slot while in formation
    pub local_offset: Vec2,
    /// Active path (entry, dive, loop or return)
    pub cursor: PathCursor,
    /// Phantom phase flag
    pub hit_once: bool,
    pub weapon: Option<Weapon>,
    pub age_ticks: u64,
}

impl Enemy {
    /// Create an enemy at `spawn` with an entry path to `home_slot`.
    /// Asteroids skip the entry and start falling immediately.
    pub fn new<R: Rng>(
        id: u32,
        archetype: Archetype,
        behavior: Behavior,
        spawn: Vec2,
        home_slot: Vec2,
        health: u32,
        rng: &mut R,
    ) -> Self {
        let (state, cursor) = if behavior.kind() == BehaviorKind::Asteroid {
            (EnemyState::Diving, PathCursor::default())
        } else {
            let step = behavior.entry_step();
            (
                EnemyState::Entering,
                PathCursor::new(generate_path(spawn, home_slot, rng), step),
            )
        };
        let health = health.max(1);
        Self {
            id,
            archetype,
            behavior,
            state,
            pos: spawn,
            size: Vec2::new(ENEMY_WIDTH, ENEMY_HEIGHT),
            health,
            max_health: health,
            points: archetype.points(),
            home_slot,
            local_offset: Vec2::ZERO,
            cursor,
            hit_once: false,
            weapon: None,
            age_ticks: 0,
        }
    }

    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapon = Some(weapon);
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    pub fn is_alive(&self) -> bool {
        self.state != EnemyState::Destroyed
    }

    /// Free-roaming hazard outside the formation/dive cycle
    pub fn is_hazard(&self) -> bool {
        self.behavior.kind() == BehaviorKind::Asteroid
    }

    pub fn can_shoot(&self) -> bool {
        self.weapon.is_some()
    }

    pub fn health_ratio(&self) -> f32 {
        self.health as f32 / self.max_health.max(1) as f32
    }

    /// Eligible for dive selection
    pub fn can_dive(&self) -> bool {
        self.state == EnemyState::InFormation
            && !self.is_hazard()
            && !(self.archetype == Archetype::Phantom && self.hit_once)
    }

    pub fn formation_target(&self, formation_offset: Vec2) -> Vec2 {
        self.home_slot + formation_offset
    }

    /// Flew off somewhere it can never come back from
    pub fn is_lost(&self) -> bool {
        !self.pos.is_finite()
            || self.pos.x < -SCREEN_WIDTH
            || self.pos.x > 2.0 * SCREEN_WIDTH
            || self.pos.y < -SCREEN_HEIGHT
            || self.pos.y > 2.0 * SCREEN_HEIGHT
    }

    /// Advance the state machine one tick. Returns the new state on a transition.
    pub fn update<R: Rng>(&mut self, ctx: &MotionContext, rng: &mut R) -> Option<EnemyState> {
        debug_assert!(self.is_alive(), "updating destroyed enemy {}", self.id);
        let before = self.state;
        self.age_ticks += 1;

        match self.state {
            EnemyState::Entering | EnemyState::Returning => match self.cursor.advance() {
                Some(p) => self.pos = p,
                None => self.join_formation(ctx.formation_offset),
            },
            EnemyState::InFormation => self.patrol(),
            EnemyState::Diving => self.update_dive(ctx, rng),
            EnemyState::Looping => match self.cursor.advance() {
                Some(p) => self.pos = p,
                None => {
                    let from = Vec2::new(
                        rng.random_range(0.0..=SCREEN_WIDTH - self.size.x),
                        -OFFSCREEN_MARGIN,
                    );
                    self.begin_return(from, ctx.formation_offset, 1, rng);
                }
            },
            EnemyState::Destroyed => {}
        }

        (self.state != before).then_some(self.state)
    }

    /// Local oscillation while holding a slot
    fn patrol(&mut self) {
        match &mut self.behavior {
            Behavior::Zigzag {
                amplitude,
                frequency,
                phase,
            } => {
                let t = self.age_ticks as f32;
                self.local_offset = Vec2::new(*amplitude * (*frequency * t + *phase).sin(), 0.0);
            }
            Behavior::PatternOrbit {
                waypoints,
                waypoint,
                patrol_speed,
                ..
            } => {
                if waypoints.is_empty() {
                    return;
                }
                let target = waypoints[*waypoint % waypoints.len()];
                let to_target = target - self.local_offset;
                let dist = to_target.length();
                if dist <= *patrol_speed {
                    self.local_offset = target;
                    *waypoint = (*waypoint + 1) % waypoints.len();
                } else {
                    self.local_offset += to_target / dist * *patrol_speed;
                }
            }
            Behavior::Basic | Behavior::Homing { .. } | Behavior::Asteroid { .. } => {}
        }
    }

    fn update_dive<R: Rng>(&mut self, ctx: &MotionContext, rng: &mut R) {
        if let Behavior::Asteroid { speed } = self.behavior {
            self.pos.y += speed;
            if self.pos.y > SCREEN_HEIGHT {
                // Wrap to the top, fully repaired
                self.pos = Vec2::new(
                    rng.random_range(0.0..=SCREEN_WIDTH - self.size.x),
                    -self.size.y,
                );
                self.health = self.max_health;
            }
            return;
        }

        match self.cursor.advance() {
            Some(sample) => {
                let offset = self
                    .behavior
                    .dive_offset(sample, self.size, ctx.player_center);
                self.pos = sample + offset;
            }
            None => self.end_dive(ctx.formation_offset, rng),
        }
    }

    /// Dive path used up: loop from the top or head home
    fn end_dive<R: Rng>(&mut self, formation_offset: Vec2, rng: &mut R) {
        let at_bottom = self.pos.y + self.size.y >= SCREEN_HEIGHT;
        match self.behavior.kind() {
            BehaviorKind::Basic if at_bottom => self.begin_loop(rng),
            BehaviorKind::Zigzag => {
                self.begin_return(self.pos, formation_offset, FAST_FOLLOW_STEP, rng)
            }
            _ => self.begin_return(self.pos, formation_offset, 1, rng),
        }
    }

    fn begin_loop<R: Rng>(&mut self, rng: &mut R) {
        let x = self.pos.x;
        let path = generate_path(
            Vec2::new(x, SCREEN_HEIGHT + 50.0),
            Vec2::new(x, -OFFSCREEN_MARGIN),
            rng,
        );
        self.cursor = PathCursor::new(path, 1);
        self.state = EnemyState::Looping;
    }

    fn begin_return<R: Rng>(
        &mut self,
        from: Vec2,
        formation_offset: Vec2,
        step: usize,
        rng: &mut R,
    ) {
        self.pos = from;
        let path = generate_path(from, self.formation_target(formation_offset), rng);
        self.cursor = PathCursor::new(path, step);
        self.local_offset = Vec2::ZERO;
        self.state = EnemyState::Returning;
    }

    /// Snap onto the live slot and hold it
    fn join_formation(&mut self, formation_offset: Vec2) {
        let n = self.cursor.path.len();
        let approach = match (self.cursor.path.get(n.wrapping_sub(2)), self.cursor.path.last()) {
            (Some(prev), Some(last)) => prev - last,
            _ => Vec2::ZERO,
        };
        if let Behavior::PatternOrbit {
            waypoints, waypoint, ..
        } = &mut self.behavior
        {
            *waypoint = nearest_waypoint(waypoints, approach);
        }

        self.local_offset = Vec2::ZERO;
        self.pos = self.formation_target(formation_offset);
        self.cursor = PathCursor::default();
        self.state = EnemyState::InFormation;
    }

    /// Peel off toward `aim` (the player's center). Returns false if not eligible.
    pub fn start_dive<R: Rng>(&mut self, aim: Vec2, rng: &mut R) -> bool {
        if !self.can_dive() {
            return false;
        }
        let floor = SCREEN_HEIGHT + OFFSCREEN_MARGIN;
        let aim_x = aim.x - self.size.x / 2.0;

        match &mut self.behavior {
            Behavior::Homing { drift, .. } => {
                *drift = 0.0;
                let path = plunge_path(self.pos, aim_x, floor, PLUNGE_STEPS);
                self.cursor = PathCursor::new(path, FAST_FOLLOW_STEP);
            }
            behavior => {
                if let Behavior::PatternOrbit { orbit_angle, .. } = behavior {
                    *orbit_angle = 0.0;
                }
                let flank = self.archetype.flank_offset();
                let flank = if flank > 0.0 && rng.random_bool(0.5) {
                    -flank
                } else {
                    flank
                };
                let target = Vec2::new(aim_x + flank, floor);
                self.cursor = PathCursor::new(generate_path(self.pos, target, rng), 1);
            }
        }

        self.local_offset = Vec2::ZERO;
        self.state = EnemyState::Diving;
        true
    }

    /// Abort a dive or loop and head home from the current position
    pub fn force_return<R: Rng>(&mut self, formation_offset: Vec2, rng: &mut R) -> bool {
        if self.is_hazard() || !matches!(self.state, EnemyState::Diving | EnemyState::Looping) {
            return false;
        }
        self.begin_return(self.pos, formation_offset, 1, rng);
        true
    }

    /// Phantom first-hit rule: vanish to the top and fly back to the slot
    pub fn phase_out<R: Rng>(&mut self, formation_offset: Vec2, rng: &mut R) {
        self.hit_once = true;
        let from = Vec2::new(
            rng.random_range(0.0..=SCREEN_WIDTH - self.size.x),
            -OFFSCREEN_MARGIN,
        );
        self.begin_return(from, formation_offset, 1, rng);
    }

    /// Apply damage. Returns true if this destroyed the enemy.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.state = EnemyState::Destroyed;
            true
        } else {
            false
        }
    }

    /// Fire the enemy's own gun if it is holding a slot and off cooldown
    pub fn shoot(&mut self, now: u64, projectiles: &mut ProjectileSystem, tuning: &Tuning) -> bool {
        if self.state != EnemyState::InFormation {
            return false;
        }
        let rect = self.rect();
        let Some(weapon) = self.weapon.as_mut() else {
            return false;
        };
        if now < weapon.ready_at {
            return false;
        }
        weapon.ready_at = now + weapon.cooldown_ticks as u64;

        let muzzle = Vec2::new(rect.center().x, rect.bottom());
        let speed = tuning.enemy_bullet_speed;
        match weapon.pattern {
            ShotPattern::Single => projectiles
                .enemy_bullets
                .push(Projectile::enemy_shot(muzzle, Vec2::new(0.0, speed))),
            ShotPattern::Twin => {
                for side in [-1.0f32, 1.0] {
                    projectiles.enemy_bullets.push(Projectile::enemy_shot(
                        muzzle + Vec2::new(4.0 * side, 0.0),
                        Vec2::new(tuning.twin_spread * side, speed),
                    ));
                }
            }
        }
        true
    }
}

//! Session state and core simulation types
//!
//! Everything the tick mutates lives in [`SessionState`]; there are no
//! process-wide singletons.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::dive::DiveController;
use super::enemy::{Archetype, Enemy, MotionContext};
use super::formation::{Formation, FormationPattern};
use super::projectile::ProjectileSystem;
use super::rect::Rect;
use crate::Tuning;
use crate::consts::*;

/// Display color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Player just died; waiting for the formation to reassemble
    Regrouping,
    /// Frozen; nothing advances
    Paused,
    /// Lives exhausted
    GameOver,
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Invincible while active
    Shield,
    /// Shorter fire cooldown
    RapidFire,
    /// Three bullets per shot
    SpreadShot,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::Shield,
        PowerUpKind::RapidFire,
        PowerUpKind::SpreadShot,
    ];

    pub fn color(self) -> Rgb {
        match self {
            PowerUpKind::Shield => Rgb(0, 255, 255),
            PowerUpKind::RapidFire => Rgb(255, 165, 0),
            PowerUpKind::SpreadShot => Rgb(0, 255, 0),
        }
    }

    pub fn duration_ticks(self, tuning: &Tuning) -> u32 {
        match self {
            PowerUpKind::Shield => tuning.shield_ticks,
            PowerUpKind::RapidFire => tuning.rapid_fire_ticks,
            PowerUpKind::SpreadShot => tuning.spread_shot_ticks,
        }
    }
}

/// A falling power-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub rect: Rect,
    pub vel: Vec2,
}

impl PowerUp {
    pub fn new(id: u32, kind: PowerUpKind, center: Vec2, fall_speed: f32) -> Self {
        Self {
            id,
            kind,
            rect: Rect::centered(center, Vec2::splat(POWERUP_SIZE)),
            vel: Vec2::new(0.0, fall_speed),
        }
    }

    pub fn advance(&mut self) {
        self.rect.pos += self.vel;
    }

    pub fn is_off_screen(&self) -> bool {
        self.rect.top() > SCREEN_HEIGHT
    }
}

/// One-shot special abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Special {
    /// Piercing shot
    PowerShot,
    /// Clears every enemy bullet
    SmartItem,
    /// Activates the shield
    ForceField,
}

/// Which specials are still available (each usable once per session)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specials {
    pub power_shot: bool,
    pub smart_item: bool,
    pub force_field: bool,
}

impl Default for Specials {
    fn default() -> Self {
        Self {
            power_shot: true,
            smart_item: true,
            force_field: true,
        }
    }
}

impl Specials {
    /// Consume a special. Returns false if it was already used.
    pub fn take(&mut self, special: Special) -> bool {
        let slot = match special {
            Special::PowerShot => &mut self.power_shot,
            Special::SmartItem => &mut self.smart_item,
            Special::ForceField => &mut self.force_field,
        };
        std::mem::replace(slot, false)
    }
}

/// The player's ship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub rect: Rect,
    pub lives: u8,
    /// Absolute tick the invincibility window ends (exclusive)
    pub invincible_until: u64,
    /// Active power-ups and their absolute expiry ticks
    pub active: BTreeMap<PowerUpKind, u64>,
    /// Earliest tick the next shot may fire
    pub fire_ready_at: u64,
    pub specials: Specials,
}

impl PlayerState {
    pub fn new(lives: u8) -> Self {
        Self {
            rect: Rect::from_pos_size(Self::spawn_point(), Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT)),
            lives,
            invincible_until: 0,
            active: BTreeMap::new(),
            fire_ready_at: 0,
            specials: Specials::default(),
        }
    }

    /// Bottom-center spawn position (top-left corner)
    pub fn spawn_point() -> Vec2 {
        Vec2::new(
            SCREEN_WIDTH / 2.0 - PLAYER_WIDTH / 2.0,
            SCREEN_HEIGHT - PLAYER_SPAWN_INSET,
        )
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    pub fn has(&self, kind: PowerUpKind, now: u64) -> bool {
        self.active.get(&kind).is_some_and(|&until| until > now)
    }

    /// Shield counts as invincibility
    pub fn is_invincible(&self, now: u64) -> bool {
        self.invincible_until > now || self.has(PowerUpKind::Shield, now)
    }

    /// Extend (never shorten) the invincibility window
    pub fn grant_invincibility(&mut self, now: u64, ticks: u32) {
        self.invincible_until = self.invincible_until.max(now + ticks as u64);
    }

    /// Activate or refresh a power-up. Re-pickup restarts the timer; it does
    /// not add to it.
    pub fn apply_powerup(&mut self, kind: PowerUpKind, now: u64, ticks: u32) {
        self.active.insert(kind, now + ticks as u64);
    }

    /// Drop expired power-ups; returns the ones that ran out
    pub fn expire(&mut self, now: u64) -> Vec<PowerUpKind> {
        let expired: Vec<_> = self
            .active
            .iter()
            .filter(|&(_, &until)| until <= now)
            .map(|(&kind, _)| kind)
            .collect();
        for kind in &expired {
            self.active.remove(kind);
        }
        expired
    }

    pub fn fire_cooldown(&self, tuning: &Tuning, now: u64) -> u32 {
        if self.has(PowerUpKind::RapidFire, now) {
            tuning.rapid_fire_cooldown_ticks
        } else {
            tuning.fire_cooldown_ticks
        }
    }

    /// Move within the player band
    pub fn move_by(&mut self, delta: Vec2) {
        let pos = self.rect.pos + delta;
        self.rect.pos = Vec2::new(
            pos.x.clamp(0.0, SCREEN_WIDTH - self.rect.size.x),
            pos.y.clamp(PLAYER_MIN_Y, PLAYER_MAX_BOTTOM - self.rect.size.y),
        );
    }

    /// Back to the spawn point with a fresh invincibility window
    pub fn respawn(&mut self, now: u64, invincibility_ticks: u32) {
        self.rect.pos = Self::spawn_point();
        self.grant_invincibility(now, invincibility_ticks);
    }
}

/// Difficulty and scoring progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    /// 1-based difficulty tier
    pub round: u32,
    /// 1-based count of waves spawned
    pub wave: u32,
    pub waves_cleared: u32,
    pub score: u64,
    pub max_divers: u32,
    /// Formation speed (pixels per tick)
    pub formation_speed: f32,
    /// Extra health for regular archetypes
    pub health_bonus: u32,
}

impl RoundState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            round: 1,
            wave: 1,
            waves_cleared: 0,
            score: 0,
            max_divers: tuning.max_divers_for_round(1),
            formation_speed: tuning.formation_speed_for(0),
            health_bonus: 0,
        }
    }

    /// Record a cleared wave and escalate. Returns true if the round advanced.
    /// Parameters only ever ratchet upward.
    pub fn advance(&mut self, tuning: &Tuning) -> bool {
        self.waves_cleared += 1;
        self.wave += 1;
        let advanced = self.waves_cleared % tuning.waves_per_round.max(1) == 0;
        if advanced {
            self.round += 1;
        }
        self.max_divers = self
            .max_divers
            .max(tuning.max_divers_for_round(self.round));
        self.formation_speed = self
            .formation_speed
            .max(tuning.formation_speed_for(self.waves_cleared));
        self.health_bonus = self.health_bonus.max((self.round - 1) / 2);
        advanced
    }

    /// Starting health for an archetype this round
    pub fn health_for(&self, archetype: Archetype) -> u32 {
        match archetype {
            Archetype::Boss => archetype.base_health() + self.round / 2,
            Archetype::Phantom | Archetype::Asteroid => archetype.base_health(),
            Archetype::Bee | Archetype::Butterfly | Archetype::Red => {
                archetype.base_health() + self.health_bonus
            }
        }
    }

    /// Homing dive speed for this round
    pub fn homing_speed(&self) -> f32 {
        (1.0 + 0.25 * (self.round - 1) as f32).min(3.0)
    }

    /// Patrol speed of orbiting enemies for this round
    pub fn patrol_speed(&self) -> f32 {
        (1.0 + 0.1 * self.round as f32).min(2.0)
    }
}

/// Final result handed to the persistence collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub score: u64,
    pub round: u32,
    pub wave: u32,
}

/// Things that happened during a tick, for audio/UI collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    EnemyDestroyed {
        id: u32,
        archetype: Archetype,
        points: u32,
    },
    EnemyDamaged {
        id: u32,
        health: u32,
    },
    PhantomPhased {
        id: u32,
    },
    PowerUpDropped {
        kind: PowerUpKind,
    },
    PowerUpCollected {
        kind: PowerUpKind,
    },
    PowerUpExpired {
        kind: PowerUpKind,
    },
    SpecialUsed {
        special: Special,
    },
    PlayerHit {
        lives_left: u8,
    },
    FormationRegrouped,
    WaveCleared {
        wave: u32,
    },
    RoundAdvanced {
        round: u32,
    },
    Paused,
    Resumed,
    GameOver(SessionSummary),
}

/// Complete session state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// The only random source in the simulation
    pub rng: Pcg32,
    pub tuning: Tuning,
    /// Simulation tick counter; all timestamps are absolute ticks
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Phase to restore when unpausing
    pub resume_phase: GamePhase,
    pub player: PlayerState,
    pub round: RoundState,
    /// Active enemies (sorted by id)
    pub enemies: Vec<Enemy>,
    pub formation: Formation,
    pub dive: DiveController,
    pub projectiles: ProjectileSystem,
    /// Falling power-ups (sorted by id)
    pub powerups: Vec<PowerUp>,
    /// Next formation-wide random volley
    pub next_volley_at: u64,
    /// Events produced by the last tick
    pub events: Vec<GameEvent>,
    /// Set once the session ends
    pub summary: Option<SessionSummary>,
    /// Next entity ID
    next_id: u32,
}

impl SessionState {
    /// New session with default tuning and the first wave spawned
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let round = RoundState::new(&tuning);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            player: PlayerState::new(tuning.starting_lives),
            formation: Formation::new(FormationPattern::for_wave(1), round.formation_speed),
            dive: DiveController::new(round.max_divers),
            round,
            tuning,
            time_ticks: 0,
            phase: GamePhase::Playing,
            resume_phase: GamePhase::Playing,
            enemies: Vec::new(),
            projectiles: ProjectileSystem::new(),
            powerups: Vec::new(),
            next_volley_at: 0,
            events: Vec::new(),
            summary: None,
            next_id: 1,
        };
        state.next_volley_at = state.tuning.formation_volley_ticks as u64;
        super::wave::spawn_wave(&mut state);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn motion_context(&self) -> MotionContext {
        MotionContext {
            formation_offset: self.formation.offset,
            player_center: self.player.center(),
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            score: self.round.score,
            round: self.round.round,
            wave: self.round.wave,
        }
    }

    /// Ensure entity lists are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.powerups.sort_by_key(|p| p.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_powerup_refresh_does_not_stack() {
        let mut p = PlayerState::new(3);
        p.apply_powerup(PowerUpKind::RapidFire, 100, 420);
        p.apply_powerup(PowerUpKind::RapidFire, 200, 420);
        assert_eq!(p.active[&PowerUpKind::RapidFire], 620);
        assert!(p.has(PowerUpKind::RapidFire, 619));
        assert!(!p.has(PowerUpKind::RapidFire, 620));
    }

    #[test]
    fn test_shield_is_invincibility() {
        let mut p = PlayerState::new(3);
        assert!(!p.is_invincible(0));
        p.apply_powerup(PowerUpKind::Shield, 10, 300);
        assert!(p.is_invincible(50));
        assert!(!p.is_invincible(310));
    }

    #[test]
    fn test_expire_reports_finished_powerups() {
        let mut p = PlayerState::new(3);
        p.apply_powerup(PowerUpKind::Shield, 0, 10);
        p.apply_powerup(PowerUpKind::SpreadShot, 0, 20);
        assert!(p.expire(9).is_empty());
        assert_eq!(p.expire(10), vec![PowerUpKind::Shield]);
        assert_eq!(p.active.len(), 1);
    }

    #[test]
    fn test_player_band() {
        let mut p = PlayerState::new(3);
        p.move_by(Vec2::new(-1000.0, -1000.0));
        assert_eq!(p.rect.pos, Vec2::new(0.0, PLAYER_MIN_Y));
        p.move_by(Vec2::new(5000.0, 5000.0));
        assert_eq!(p.rect.right(), SCREEN_WIDTH);
        assert_eq!(p.rect.bottom(), PLAYER_MAX_BOTTOM);
    }

    #[test]
    fn test_specials_are_one_shot() {
        let mut s = Specials::default();
        assert!(s.take(Special::SmartItem));
        assert!(!s.take(Special::SmartItem));
        assert!(s.take(Special::PowerShot));
    }

    #[test]
    fn test_round_escalation_ratchets() {
        let tuning = Tuning::default();
        let mut r = RoundState::new(&tuning);
        let mut prev = r.clone();
        for _ in 0..30 {
            assert!(r.advance(&tuning));
            assert!(r.max_divers >= prev.max_divers);
            assert!(r.formation_speed >= prev.formation_speed);
            assert!(r.health_for(Archetype::Red) >= prev.health_for(Archetype::Red));
            assert!(r.health_for(Archetype::Boss) >= prev.health_for(Archetype::Boss));
            prev = r.clone();
        }
        assert_eq!(r.round, 31);
    }

    #[test]
    fn test_waves_per_round() {
        let tuning = Tuning {
            waves_per_round: 3,
            ..Tuning::default()
        };
        let mut r = RoundState::new(&tuning);
        assert!(!r.advance(&tuning));
        assert!(!r.advance(&tuning));
        assert!(r.advance(&tuning));
        assert_eq!(r.round, 2);
        assert_eq!(r.wave, 4);
    }

    #[test]
    fn test_new_session_spawns_first_wave() {
        let state = SessionState::new(42);
        assert!(!state.enemies.is_empty());
        assert!(state.enemies.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(state.player.lives, 3);
        assert_eq!(state.phase, GamePhase::Playing);
    }
}

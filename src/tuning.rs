//! Data-driven game balance
//!
//! Every number a designer might want to tweak lives here. Durations are in
//! simulation ticks (60 per second), speeds in pixels per tick.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ticks_from_millis;

/// Balance table for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player ===
    /// Lives at session start
    pub starting_lives: u8,
    /// Horizontal/vertical movement per tick
    pub player_speed: f32,
    /// Player bullet speed (upward)
    pub player_bullet_speed: f32,
    /// Ticks between shots
    pub fire_cooldown_ticks: u32,
    /// Ticks between shots while RapidFire is active
    pub rapid_fire_cooldown_ticks: u32,
    /// Invincibility granted on respawn and at wave start
    pub invincibility_ticks: u32,

    // === Power-ups ===
    pub shield_ticks: u32,
    pub rapid_fire_ticks: u32,
    pub spread_shot_ticks: u32,
    /// Falling speed of dropped power-ups
    pub powerup_fall_speed: f32,
    /// Drop probability for regular enemies
    pub drop_chance: f64,
    /// Drop probability for bosses
    pub boss_drop_chance: f64,

    // === Enemies ===
    /// Enemy bullet speed (downward)
    pub enemy_bullet_speed: f32,
    /// Horizontal spread of twin-gun bullets
    pub twin_spread: f32,
    /// Ticks between formation-wide random volleys
    pub formation_volley_ticks: u32,
    /// Per-tick chance (out of 1000) that an armed diver fires
    pub diver_shot_permille: u32,
    /// Added to `diver_shot_permille` per round
    pub diver_shot_permille_per_round: u32,
    /// Longest random delay before an enemy's gun arms
    pub max_attack_delay_ticks: u32,

    // === Formation / dives ===
    pub formation_base_speed: f32,
    /// Added to formation speed for every cleared wave
    pub formation_speed_step: f32,
    pub formation_max_speed: f32,
    /// Step-down applied by the Descend pattern on wall contact
    pub descend_step: f32,
    /// Diver cap is `min(max_divers_ceiling, round + diver_bonus)`
    pub diver_bonus: u32,
    pub max_divers_ceiling: u32,

    // === Waves ===
    pub rows: u32,
    pub cols: u32,
    /// Cleared waves needed to advance one round
    pub waves_per_round: u32,
    /// Every Nth round spawns an all-boss wave
    pub boss_wave_every: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            player_speed: 5.0,
            player_bullet_speed: 10.0,
            fire_cooldown_ticks: ticks_from_millis(500),
            rapid_fire_cooldown_ticks: ticks_from_millis(200),
            invincibility_ticks: ticks_from_millis(3000),

            shield_ticks: ticks_from_millis(5000),
            rapid_fire_ticks: ticks_from_millis(7000),
            spread_shot_ticks: ticks_from_millis(7000),
            powerup_fall_speed: 3.0,
            drop_chance: 0.1,
            boss_drop_chance: 0.2,

            enemy_bullet_speed: 6.0,
            twin_spread: 3.0,
            formation_volley_ticks: ticks_from_millis(2000),
            diver_shot_permille: 5,
            diver_shot_permille_per_round: 3,
            max_attack_delay_ticks: ticks_from_millis(2000),

            formation_base_speed: 1.5,
            formation_speed_step: 0.2,
            formation_max_speed: 4.0,
            descend_step: 20.0,
            diver_bonus: 2,
            max_divers_ceiling: 5,

            rows: 5,
            cols: 6,
            waves_per_round: 1,
            boss_wave_every: 5,
        }
    }
}

impl Tuning {
    /// Parse a tuning table from JSON (missing fields take their defaults)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a tuning table from disk, falling back to defaults on any failure
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.display());
                    tuning
                }
                Err(e) => {
                    log::warn!("Bad tuning file {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read tuning file {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Diver cap for a round
    pub fn max_divers_for_round(&self, round: u32) -> u32 {
        (round + self.diver_bonus).min(self.max_divers_ceiling)
    }

    /// Formation speed after `waves_cleared` waves
    pub fn formation_speed_for(&self, waves_cleared: u32) -> f32 {
        (self.formation_base_speed + self.formation_speed_step * waves_cleared as f32)
            .min(self.formation_max_speed)
    }

    /// Whether a round spawns the all-boss wave
    pub fn is_boss_round(&self, round: u32) -> bool {
        self.boss_wave_every > 0 && round % self.boss_wave_every == 0
    }
}

//! From Beyond - enemy choreography and combat core for a vertical arcade shooter
//!
//! Core modules:
//! - `sim`: Fixed-tick simulation (enemy state machines, formation, dives, combat)
//! - `tuning`: Data-driven game balance
//! - `highscores`: Single-value high score persistence

pub mod highscores;
pub mod sim;
pub mod tuning;

pub use highscores::HighScore;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate (60 Hz arcade tick)
    pub const SIM_HZ: u32 = 60;

    /// Playfield dimensions (pixels, origin top-left, y grows downward)
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 700.0;

    /// Entity boxes
    pub const ENEMY_WIDTH: f32 = 30.0;
    pub const ENEMY_HEIGHT: f32 = 30.0;
    pub const PLAYER_WIDTH: f32 = 30.0;
    pub const PLAYER_HEIGHT: f32 = 30.0;
    pub const PLAYER_BULLET_WIDTH: f32 = 5.0;
    pub const PLAYER_BULLET_HEIGHT: f32 = 15.0;
    pub const ENEMY_BULLET_WIDTH: f32 = 4.0;
    pub const ENEMY_BULLET_HEIGHT: f32 = 12.0;
    pub const POWERUP_SIZE: f32 = 20.0;

    /// Player spawn sits this far above the bottom edge
    pub const PLAYER_SPAWN_INSET: f32 = 70.0;
    /// Player may not climb above this line
    pub const PLAYER_MIN_Y: f32 = SCREEN_HEIGHT - 200.0;
    /// Player's bottom edge may not sink below this line
    pub const PLAYER_MAX_BOTTOM: f32 = SCREEN_HEIGHT - 30.0;

    /// Formation vertical band
    pub const FORMATION_TOP: f32 = 50.0;
    pub const FORMATION_FLOOR: f32 = SCREEN_HEIGHT - 150.0;

    /// Bezier sampling resolution (segments, so paths hold SEGMENTS + 1 points)
    pub const PATH_SEGMENTS: usize = 100;
    /// How far past the screen edge dive and loop paths travel
    pub const OFFSCREEN_MARGIN: f32 = 100.0;

    /// Invincibility blink period (ticks per on/off half-cycle)
    pub const BLINK_TICKS: u64 = 18;
}

/// Convert a millisecond duration to whole simulation ticks (rounded up)
#[inline]
pub fn ticks_from_millis(ms: u32) -> u32 {
    (ms * consts::SIM_HZ).div_ceil(1000)
}

/// Clamp a box's top-left corner so a `size` box stays on screen
#[inline]
pub fn clamp_to_screen(pos: Vec2, size: Vec2) -> Vec2 {
    Vec2::new(
        pos.x.clamp(0.0, consts::SCREEN_WIDTH - size.x),
        pos.y.clamp(0.0, consts::SCREEN_HEIGHT - size.y),
    )
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod combat;
pub mod dive;
pub mod enemy;
pub mod formation;
pub mod path;
pub mod projectile;
pub mod rect;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod wave;

pub use combat::HitOutcome;
pub use dive::DiveController;
pub use enemy::{Archetype, Behavior, BehaviorKind, Enemy, EnemyState, PatrolShape, Weapon};
pub use formation::{Formation, FormationPattern};
pub use path::{Path, PathCursor, generate_path};
pub use projectile::{Owner, Projectile, ProjectileSystem};
pub use rect::Rect;
pub use snapshot::{Banner, RenderSnapshot};
pub use state::{
    GameEvent, GamePhase, PlayerState, PowerUp, PowerUpKind, RoundState, SessionState,
    SessionSummary, Special,
};
pub use tick::{TickInput, tick};
pub use wave::{spawn_wave, wave_population};

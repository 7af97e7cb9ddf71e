//! Read-only per-tick view for a renderer
//!
//! Plain data only; building one never touches the simulation.

use serde::{Deserialize, Serialize};

use super::enemy::Archetype;
use super::projectile::Owner;
use super::rect::Rect;
use super::state::{GamePhase, PowerUpKind, Rgb, SessionState};
use crate::consts::BLINK_TICKS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub rect: Rect,
    /// False on the "off" half of the invincibility blink
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyView {
    pub id: u32,
    pub archetype: Archetype,
    pub rect: Rect,
    pub color: Rgb,
    /// Only for archetypes that show a health bar
    pub health_ratio: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletView {
    pub rect: Rect,
    pub color: Rgb,
    pub owner: Owner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpView {
    pub rect: Rect,
    pub color: Rgb,
    pub kind: PowerUpKind,
}

/// Overlay text the HUD should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Banner {
    Paused,
    Regrouping,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub score: u64,
    pub lives: u8,
    pub round: u32,
    pub wave: u32,
    pub banner: Option<Banner>,
}

/// Everything a renderer draws for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub player: PlayerView,
    pub enemies: Vec<EnemyView>,
    pub bullets: Vec<BulletView>,
    pub powerups: Vec<PowerUpView>,
    pub hud: Hud,
}

impl RenderSnapshot {
    pub fn capture(state: &SessionState) -> Self {
        let now = state.time_ticks;
        let visible = match state.phase {
            GamePhase::GameOver => false,
            _ if state.player.is_invincible(now) => (now / BLINK_TICKS) % 2 == 0,
            _ => true,
        };

        let enemies = state
            .enemies
            .iter()
            .map(|e| EnemyView {
                id: e.id,
                archetype: e.archetype,
                rect: e.rect(),
                color: e.archetype.color(),
                health_ratio: e.archetype.has_health_bar().then(|| e.health_ratio()),
            })
            .collect();

        let bullets = state
            .projectiles
            .player_bullets
            .iter()
            .chain(&state.projectiles.enemy_bullets)
            .map(|b| BulletView {
                rect: b.rect,
                color: b.color,
                owner: b.owner,
            })
            .collect();

        let powerups = state
            .powerups
            .iter()
            .map(|p| PowerUpView {
                rect: p.rect,
                color: p.kind.color(),
                kind: p.kind,
            })
            .collect();

        let banner = match state.phase {
            GamePhase::Playing => None,
            GamePhase::Regrouping => Some(Banner::Regrouping),
            GamePhase::Paused => Some(Banner::Paused),
            GamePhase::GameOver => Some(Banner::GameOver),
        };

        Self {
            player: PlayerView {
                rect: state.player.rect,
                visible,
            },
            enemies,
            bullets,
            powerups,
            hud: Hud {
                score: state.round.score,
                lives: state.player.lives,
                round: state.round.round,
                wave: state.round.wave,
                banner,
            },
        }
    }
}

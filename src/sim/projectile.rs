//! Player and enemy bullets
//!
//! Both sides share one projectile type; only owner and direction differ.
//! Bullets are dropped once they leave the screen vertically; collision
//! removal is handled by the combat pass.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use super::state::Rgb;
use crate::consts::*;

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

pub const PLAYER_BULLET_COLOR: Rgb = Rgb(255, 255, 255);
pub const POWER_SHOT_COLOR: Rgb = Rgb(255, 140, 0);
pub const ENEMY_BULLET_COLOR: Rgb = Rgb(173, 216, 230);

/// A bullet in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub rect: Rect,
    /// Pixels per tick
    pub vel: Vec2,
    pub owner: Owner,
    pub color: Rgb,
    /// Piercing shots survive hits (one enemy per tick, never the same one twice)
    pub piercing: bool,
    /// Enemies a piercing shot has already damaged
    #[serde(default)]
    pub pierced: Vec<u32>,
}

impl Projectile {
    /// Player bullet whose top-center sits at `nose`
    pub fn player_shot(nose: Vec2, speed: f32) -> Self {
        Self {
            rect: Rect::new(
                nose.x - PLAYER_BULLET_WIDTH / 2.0,
                nose.y,
                PLAYER_BULLET_WIDTH,
                PLAYER_BULLET_HEIGHT,
            ),
            vel: Vec2::new(0.0, -speed),
            owner: Owner::Player,
            color: PLAYER_BULLET_COLOR,
            piercing: false,
            pierced: Vec::new(),
        }
    }

    /// Piercing power shot (double height)
    pub fn power_shot(nose: Vec2, speed: f32) -> Self {
        let mut shot = Self::player_shot(nose, speed);
        shot.rect.size.y *= 2.0;
        shot.color = POWER_SHOT_COLOR;
        shot.piercing = true;
        shot
    }

    /// Enemy bullet whose top-center sits at `muzzle`
    pub fn enemy_shot(muzzle: Vec2, vel: Vec2) -> Self {
        Self {
            rect: Rect::new(
                muzzle.x - ENEMY_BULLET_WIDTH / 2.0,
                muzzle.y,
                ENEMY_BULLET_WIDTH,
                ENEMY_BULLET_HEIGHT,
            ),
            vel,
            owner: Owner::Enemy,
            color: ENEMY_BULLET_COLOR,
            piercing: false,
            pierced: Vec::new(),
        }
    }

    /// Above the top edge (player shots) or below the bottom edge (enemy shots)
    pub fn is_off_screen(&self) -> bool {
        match self.owner {
            Owner::Player => self.rect.bottom() < 0.0,
            Owner::Enemy => self.rect.top() > SCREEN_HEIGHT,
        }
    }
}

/// All live bullets, split by side
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectileSystem {
    pub player_bullets: Vec<Projectile>,
    pub enemy_bullets: Vec<Projectile>,
}

impl ProjectileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire from the player's forward edge. Spread adds two side shots
    /// slightly behind the center one.
    pub fn fire_player(&mut self, player_box: &Rect, speed: f32, spread: bool) {
        let nose = Vec2::new(player_box.center().x, player_box.top());
        self.player_bullets.push(Projectile::player_shot(nose, speed));
        if spread {
            for dx in [-8.0, 8.0] {
                let side = nose + Vec2::new(dx, 5.0);
                self.player_bullets.push(Projectile::player_shot(side, speed));
            }
        }
    }

    /// Fire a piercing power shot from the player's forward edge
    pub fn fire_power_shot(&mut self, player_box: &Rect, speed: f32) {
        let nose = Vec2::new(player_box.center().x, player_box.top());
        self.player_bullets.push(Projectile::power_shot(nose, speed));
    }

    /// Add a straight-down enemy shot from the bottom-center of `shooter`
    pub fn fire_enemy(&mut self, shooter: &Rect, speed: f32) {
        let muzzle = Vec2::new(shooter.center().x, shooter.bottom());
        self.enemy_bullets
            .push(Projectile::enemy_shot(muzzle, Vec2::new(0.0, speed)));
    }

    /// Move every bullet one tick and drop those that left the screen
    pub fn advance(&mut self) {
        for p in self.player_bullets.iter_mut().chain(self.enemy_bullets.iter_mut()) {
            p.rect.pos += p.vel;
        }
        self.player_bullets.retain(|p| !p.is_off_screen());
        self.enemy_bullets.retain(|p| !p.is_off_screen());
    }

    pub fn clear_enemy(&mut self) {
        self.enemy_bullets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_bullets_leave_top() {
        let mut ps = ProjectileSystem::new();
        let player = Rect::new(385.0, 30.0, PLAYER_WIDTH, PLAYER_HEIGHT);
        ps.fire_player(&player, 10.0, false);
        assert_eq!(ps.player_bullets.len(), 1);
        assert_eq!(ps.player_bullets[0].rect.center().x, 400.0);
        // bottom starts at 45, gone after it crosses 0
        for _ in 0..4 {
            ps.advance();
        }
        assert_eq!(ps.player_bullets.len(), 1);
        ps.advance();
        assert!(ps.player_bullets.is_empty());
    }

    #[test]
    fn test_enemy_bullets_leave_bottom() {
        let mut ps = ProjectileSystem::new();
        let shooter = Rect::new(100.0, SCREEN_HEIGHT - 40.0, ENEMY_WIDTH, ENEMY_HEIGHT);
        ps.fire_enemy(&shooter, 6.0);
        // top starts at 690, passes 700 after two ticks
        ps.advance();
        assert_eq!(ps.enemy_bullets.len(), 1);
        ps.advance();
        assert!(ps.enemy_bullets.is_empty());
    }

    #[test]
    fn test_spread_fires_three() {
        let mut ps = ProjectileSystem::new();
        let player = Rect::new(385.0, 600.0, PLAYER_WIDTH, PLAYER_HEIGHT);
        ps.fire_player(&player, 10.0, true);
        assert_eq!(ps.player_bullets.len(), 3);
        assert!(ps.player_bullets.iter().all(|b| b.owner == Owner::Player));
    }

    #[test]
    fn test_power_shot_pierces() {
        let mut ps = ProjectileSystem::new();
        let player = Rect::new(385.0, 600.0, PLAYER_WIDTH, PLAYER_HEIGHT);
        ps.fire_power_shot(&player, 10.0);
        let shot = &ps.player_bullets[0];
        assert!(shot.piercing);
        assert_eq!(shot.rect.size.y, PLAYER_BULLET_HEIGHT * 2.0);
    }
}

//! Bounding-box collision queries
//!
//! Pure lookups; nothing here mutates. Iteration order is the arena order
//! (ascending id), so "first hit" is deterministic.

use super::enemy::Enemy;
use super::projectile::Projectile;
use super::rect::Rect;

/// First live enemy a bullet overlaps. Piercing shots skip enemies they
/// already damaged.
pub fn first_enemy_hit(bullet: &Projectile, enemies: &[Enemy]) -> Option<usize> {
    enemies.iter().position(|e| {
        e.is_alive() && !bullet.pierced.contains(&e.id) && bullet.rect.intersects(&e.rect())
    })
}

/// First enemy bullet touching the player
pub fn first_bullet_on(target: &Rect, bullets: &[Projectile]) -> Option<usize> {
    bullets.iter().position(|b| b.rect.intersects(target))
}

/// First live enemy body touching the player
pub fn first_body_on(target: &Rect, enemies: &[Enemy]) -> Option<usize> {
    enemies
        .iter()
        .position(|e| e.is_alive() && e.rect().intersects(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::enemy::{Archetype, Behavior, EnemyState};
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn enemy_at(id: u32, x: f32, y: f32) -> Enemy {
        let mut rng = Pcg32::seed_from_u64(0);
        let p = Vec2::new(x, y);
        let mut e = Enemy::new(id, Archetype::Bee, Behavior::Basic, p, p, 1, &mut rng);
        e.state = EnemyState::InFormation;
        e
    }

    #[test]
    fn test_one_pixel_overlap_registers() {
        let enemies = vec![enemy_at(1, 100.0, 100.0)];
        // Bullet top sits 1px above the enemy's bottom edge
        let bullet = Projectile::player_shot(Vec2::new(115.0, 129.0), 10.0);
        assert_eq!(first_enemy_hit(&bullet, &enemies), Some(0));

        let clear = Projectile::player_shot(Vec2::new(115.0, 130.0), 10.0);
        assert_eq!(first_enemy_hit(&clear, &enemies), None);
    }

    #[test]
    fn test_first_in_order_wins() {
        // Two overlapping enemies; lower id is credited
        let enemies = vec![enemy_at(3, 100.0, 100.0), enemy_at(7, 105.0, 105.0)];
        let bullet = Projectile::player_shot(Vec2::new(118.0, 120.0), 10.0);
        assert_eq!(first_enemy_hit(&bullet, &enemies), Some(0));
    }

    #[test]
    fn test_destroyed_and_pierced_are_skipped() {
        let mut enemies = vec![enemy_at(1, 100.0, 100.0), enemy_at(2, 100.0, 100.0)];
        let mut bullet = Projectile::power_shot(Vec2::new(115.0, 110.0), 10.0);
        enemies[0].state = EnemyState::Destroyed;
        assert_eq!(first_enemy_hit(&bullet, &enemies), Some(1));
        bullet.pierced.push(2);
        assert_eq!(first_enemy_hit(&bullet, &enemies), None);
    }

    #[test]
    fn test_player_strikes() {
        let player = Rect::new(385.0, 630.0, PLAYER_WIDTH, PLAYER_HEIGHT);
        let bullets = vec![
            Projectile::enemy_shot(Vec2::new(100.0, 630.0), Vec2::new(0.0, 6.0)),
            Projectile::enemy_shot(Vec2::new(400.0, 620.0), Vec2::new(0.0, 6.0)),
        ];
        assert_eq!(first_bullet_on(&player, &bullets), Some(1));

        let enemies = vec![enemy_at(1, 10.0, 10.0), enemy_at(2, 390.0, 640.0)];
        assert_eq!(first_body_on(&player, &enemies), Some(1));
    }
}

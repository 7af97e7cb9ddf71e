//! Formation group motion
//!
//! One shared translation per tick moves every `InFormation` enemy. The
//! translation comes from a swappable [`FormationPattern`], chosen per wave.
//! After the group moves, each member is clamped to the screen on its own.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy::{Enemy, EnemyState};
use super::rect::Rect;
use crate::clamp_to_screen;
use crate::consts::*;

/// Sine pattern sway (pixels)
const SINE_AMPLITUDE: f32 = 80.0;
/// Circle pattern radius (pixels)
const CIRCLE_RADIUS: f32 = 40.0;
/// Angular rate per unit of formation speed (radians per tick)
const ANGULAR_RATE: f32 = 0.01;

/// Group movement strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormationPattern {
    /// Back and forth, flipping at the walls
    Sweep,
    /// Back and forth, stepping down on every flip
    Descend,
    /// Smooth horizontal sway
    Sine,
    /// Smooth circular drift
    Circle,
}

impl FormationPattern {
    pub const ALL: [FormationPattern; 4] = [
        FormationPattern::Sweep,
        FormationPattern::Descend,
        FormationPattern::Sine,
        FormationPattern::Circle,
    ];

    /// Patterns cycle with the (1-based) wave number
    pub fn for_wave(wave: u32) -> Self {
        Self::ALL[(wave.saturating_sub(1) as usize) % Self::ALL.len()]
    }
}

/// Shared formation motion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    pub pattern: FormationPattern,
    /// Current translation applied to every home slot
    pub offset: Vec2,
    /// +1 right, -1 left (Sweep and Descend)
    pub direction: f32,
    pub elapsed_ticks: u64,
    /// Pixels per tick
    pub speed: f32,
    /// Vertical step on wall contact (Descend)
    pub descend_step: f32,
}

impl Formation {
    pub fn new(pattern: FormationPattern, speed: f32) -> Self {
        Self {
            pattern,
            offset: Vec2::ZERO,
            direction: 1.0,
            elapsed_ticks: 0,
            speed,
            descend_step: 20.0,
        }
    }

    /// Fresh motion for a new wave
    pub fn reset(&mut self, pattern: FormationPattern, speed: f32, descend_step: f32) {
        *self = Self {
            descend_step,
            ..Self::new(pattern, speed)
        };
    }

    /// Bounding extent of the members currently holding a slot
    pub fn extent(enemies: &[Enemy]) -> Option<Rect> {
        let rects: Vec<Rect> = enemies
            .iter()
            .filter(|e| e.state == EnemyState::InFormation)
            .map(Enemy::rect)
            .collect();
        Rect::extent(&rects)
    }

    /// Extent of every slot, occupied or not (used when nobody is home)
    fn slot_extent(&self, enemies: &[Enemy]) -> Option<Rect> {
        let rects: Vec<Rect> = enemies
            .iter()
            .filter(|e| e.is_alive() && !e.is_hazard())
            .map(|e| Rect::from_pos_size(e.formation_target(self.offset), e.size))
            .collect();
        Rect::extent(&rects)
    }

    /// Advance the group one tick and reposition every member
    pub fn update(&mut self, enemies: &mut [Enemy]) {
        self.elapsed_ticks += 1;
        let Some(extent) = Self::extent(enemies).or_else(|| self.slot_extent(enemies)) else {
            return;
        };

        let delta = self.step(&extent);
        let delta = Self::keep_inside(delta, &extent);
        self.offset += delta;

        for e in enemies.iter_mut().filter(|e| e.state == EnemyState::InFormation) {
            let pos = e.formation_target(self.offset) + e.local_offset;
            e.pos = clamp_to_screen(pos, e.size);
        }
    }

    /// Pattern translation for this tick
    fn step(&mut self, extent: &Rect) -> Vec2 {
        match self.pattern {
            FormationPattern::Sweep | FormationPattern::Descend => {
                let dx = self.direction * self.speed;
                let hits_wall =
                    extent.left() + dx < 0.0 || extent.right() + dx > SCREEN_WIDTH;
                if !hits_wall {
                    return Vec2::new(dx, 0.0);
                }
                self.direction = -self.direction;
                let dy = if self.pattern == FormationPattern::Descend {
                    self.descend_step
                } else {
                    0.0
                };
                Vec2::new(self.direction * self.speed, dy)
            }
            FormationPattern::Sine => {
                let t = self.elapsed_ticks as f32 * self.speed * ANGULAR_RATE;
                Vec2::new(SINE_AMPLITUDE * t.sin() - self.offset.x, 0.0)
            }
            FormationPattern::Circle => {
                let t = self.elapsed_ticks as f32 * self.speed * ANGULAR_RATE;
                let target = Vec2::new(CIRCLE_RADIUS * (t.cos() - 1.0), CIRCLE_RADIUS * t.sin());
                target - self.offset
            }
        }
    }

    /// Trim a translation so the group stays on screen and inside the band
    fn keep_inside(delta: Vec2, extent: &Rect) -> Vec2 {
        Vec2::new(
            delta
                .x
                .max(-extent.left())
                .min(SCREEN_WIDTH - extent.right()),
            delta
                .y
                .max(FORMATION_TOP - extent.top())
                .min(FORMATION_FLOOR - extent.bottom()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::{Archetype, Behavior};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn member(id: u32, x: f32, y: f32) -> Enemy {
        let mut rng = Pcg32::seed_from_u64(id as u64);
        let mut e = Enemy::new(
            id,
            Archetype::Bee,
            Behavior::Basic,
            Vec2::new(x, y),
            Vec2::new(x, y),
            1,
            &mut rng,
        );
        e.state = EnemyState::InFormation;
        e
    }

    #[test]
    fn test_pattern_cycles_per_wave() {
        assert_eq!(FormationPattern::for_wave(1), FormationPattern::Sweep);
        assert_eq!(FormationPattern::for_wave(2), FormationPattern::Descend);
        assert_eq!(FormationPattern::for_wave(5), FormationPattern::Sweep);
        assert_eq!(FormationPattern::for_wave(0), FormationPattern::Sweep);
    }

    #[test]
    fn test_sweep_moves_members_together() {
        let mut f = Formation::new(FormationPattern::Sweep, 1.5);
        let mut enemies = vec![member(1, 100.0, 100.0), member(2, 200.0, 100.0)];
        f.update(&mut enemies);
        assert_eq!(enemies[0].pos, Vec2::new(101.5, 100.0));
        assert_eq!(enemies[1].pos, Vec2::new(201.5, 100.0));
    }

    #[test]
    fn test_sweep_flips_at_wall() {
        let mut f = Formation::new(FormationPattern::Sweep, 2.0);
        let mut enemies = vec![member(1, SCREEN_WIDTH - ENEMY_WIDTH - 1.0, 100.0)];
        f.update(&mut enemies);
        assert_eq!(f.direction, -1.0);
        assert!(enemies[0].rect().right() <= SCREEN_WIDTH);
        assert!(enemies[0].pos.x < SCREEN_WIDTH - ENEMY_WIDTH - 1.0);
    }

    #[test]
    fn test_descend_steps_down_on_flip() {
        let mut f = Formation::new(FormationPattern::Descend, 2.0);
        let mut enemies = vec![member(1, 1.0, 100.0)];
        f.direction = -1.0;
        f.update(&mut enemies);
        assert_eq!(f.direction, 1.0);
        assert_eq!(enemies[0].pos.y, 120.0);
    }

    #[test]
    fn test_descend_respects_floor() {
        let mut f = Formation::new(FormationPattern::Descend, 2.0);
        let y = FORMATION_FLOOR - ENEMY_HEIGHT - 5.0;
        let mut enemies = vec![member(1, 1.0, y)];
        f.direction = -1.0;
        f.update(&mut enemies);
        assert_eq!(enemies[0].rect().bottom(), FORMATION_FLOOR);
    }

    #[test]
    fn test_only_in_formation_members_move() {
        let mut f = Formation::new(FormationPattern::Sweep, 1.5);
        let mut enemies = vec![member(1, 100.0, 100.0), member(2, 200.0, 100.0)];
        enemies[1].state = EnemyState::Diving;
        f.update(&mut enemies);
        assert_eq!(enemies[1].pos, Vec2::new(200.0, 100.0));
    }

    #[test]
    fn test_smooth_patterns_stay_on_screen() {
        for pattern in [FormationPattern::Sine, FormationPattern::Circle] {
            let mut f = Formation::new(pattern, 4.0);
            let mut enemies: Vec<Enemy> = (0..6)
                .map(|i| member(i + 1, 10.0 + 130.0 * i as f32, FORMATION_TOP + 5.0))
                .collect();
            for _ in 0..2000 {
                f.update(&mut enemies);
                for e in &enemies {
                    assert!(e.pos.x >= 0.0 && e.rect().right() <= SCREEN_WIDTH);
                    assert!(e.pos.y >= FORMATION_TOP - 1e-3);
                }
            }
        }
    }

    #[test]
    fn test_empty_formation_is_noop() {
        let mut f = Formation::new(FormationPattern::Sweep, 1.5);
        f.update(&mut []);
        assert_eq!(f.offset, Vec2::ZERO);
    }
}

//! Dive selection
//!
//! Tracks which enemies are away on an attack run. An id stays in the set
//! from the moment it peels off until it is back in its slot (or gone), so
//! the cap bounds divers, loopers and returners together.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::enemy::{Enemy, EnemyState};

/// Bounded set of diving enemy ids
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiveController {
    divers: BTreeSet<u32>,
    pub max_divers: u32,
    /// No new dives while set (after a player death, until the regroup ends)
    pub suppressed: bool,
}

impl DiveController {
    pub fn new(max_divers: u32) -> Self {
        Self {
            divers: BTreeSet::new(),
            max_divers,
            suppressed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.divers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.divers.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.divers.contains(&id)
    }

    pub fn divers(&self) -> impl Iterator<Item = u32> + '_ {
        self.divers.iter().copied()
    }

    /// Raise the cap (never lowers it)
    pub fn raise_cap(&mut self, max_divers: u32) {
        self.max_divers = self.max_divers.max(max_divers);
    }

    /// Drop ids whose enemy is gone, destroyed, or home again
    pub fn reconcile(&mut self, enemies: &[Enemy]) {
        self.divers.retain(|&id| {
            enemies
                .binary_search_by_key(&id, |e| e.id)
                .ok()
                .map(|i| &enemies[i])
                .is_some_and(|e| e.state.is_sortie())
        });
    }

    /// Promote random formation members into dives until the cap is reached.
    /// Returns the ids that started diving.
    pub fn select<R: Rng>(&mut self, enemies: &mut [Enemy], aim: Vec2, rng: &mut R) -> Vec<u32> {
        let capacity = (self.max_divers as usize).saturating_sub(self.divers.len());
        if self.suppressed || capacity == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<usize> = enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| e.can_dive() && !self.divers.contains(&e.id))
            .map(|(i, _)| i)
            .collect();
        candidates.shuffle(rng);

        let mut started = Vec::new();
        for i in candidates.into_iter().take(capacity) {
            let enemy = &mut enemies[i];
            if enemy.start_dive(aim, rng) {
                self.divers.insert(enemy.id);
                started.push(enemy.id);
            }
        }

        debug_assert!(
            self.divers.len() <= self.max_divers as usize,
            "diver cap exceeded: {} > {}",
            self.divers.len(),
            self.max_divers
        );
        if !started.is_empty() {
            log::debug!("Dive: {:?} ({} / {})", started, self.divers.len(), self.max_divers);
        }
        started
    }

    /// Send every diver and looper home and stop selecting until `resume`
    pub fn recall_all<R: Rng>(
        &mut self,
        enemies: &mut [Enemy],
        formation_offset: Vec2,
        rng: &mut R,
    ) -> usize {
        let recalled = enemies
            .iter_mut()
            .filter(|e| matches!(e.state, EnemyState::Diving | EnemyState::Looping))
            .map(|e| e.force_return(formation_offset, rng))
            .filter(|&r| r)
            .count();
        self.divers.clear();
        self.suppressed = true;
        recalled
    }

    pub fn resume(&mut self) {
        self.suppressed = false;
    }

    /// Forget every diver (new wave)
    pub fn reset(&mut self) {
        self.divers.clear();
        self.suppressed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::{Archetype, Behavior, MotionContext};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn formation(n: u32, rng: &mut Pcg32) -> Vec<Enemy> {
        (1..=n)
            .map(|id| {
                let slot = Vec2::new(
                    50.0 + 60.0 * (id % 10) as f32,
                    60.0 + 45.0 * (id / 10) as f32,
                );
                let mut e = Enemy::new(id, Archetype::Bee, Behavior::Basic, slot, slot, 1, rng);
                e.state = EnemyState::InFormation;
                e
            })
            .collect()
    }

    const AIM: Vec2 = Vec2::new(400.0, 645.0);

    #[test]
    fn test_select_fills_to_cap() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemies = formation(12, &mut rng);
        let mut dive = DiveController::new(3);
        let started = dive.select(&mut enemies, AIM, &mut rng);
        assert_eq!(started.len(), 3);
        assert_eq!(dive.len(), 3);
        assert_eq!(
            enemies.iter().filter(|e| e.state == EnemyState::Diving).count(),
            3
        );
        // Full: nothing more
        assert!(dive.select(&mut enemies, AIM, &mut rng).is_empty());
    }

    #[test]
    fn test_suppressed_selects_nothing() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut enemies = formation(5, &mut rng);
        let mut dive = DiveController::new(3);
        dive.suppressed = true;
        assert!(dive.select(&mut enemies, AIM, &mut rng).is_empty());
    }

    #[test]
    fn test_recall_all_returns_divers() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut enemies = formation(8, &mut rng);
        let mut dive = DiveController::new(4);
        dive.select(&mut enemies, AIM, &mut rng);
        let recalled = dive.recall_all(&mut enemies, Vec2::ZERO, &mut rng);
        assert_eq!(recalled, 4);
        assert!(dive.is_empty());
        assert!(dive.suppressed);
        assert!(enemies.iter().all(|e| e.state != EnemyState::Diving));
        assert_eq!(
            enemies.iter().filter(|e| e.state == EnemyState::Returning).count(),
            4
        );
    }

    #[test]
    fn test_reconcile_drops_returned_and_missing() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut enemies = formation(6, &mut rng);
        let mut dive = DiveController::new(3);
        let started = dive.select(&mut enemies, AIM, &mut rng);

        // One diver destroyed and removed, one back home
        enemies.retain(|e| e.id != started[0]);
        if let Some(e) = enemies.iter_mut().find(|e| e.id == started[1]) {
            e.state = EnemyState::InFormation;
        }
        dive.reconcile(&enemies);
        assert_eq!(dive.divers().collect::<Vec<_>>(), vec![started[2]]);
    }

    proptest! {
        #[test]
        fn prop_cap_never_exceeded(seed in any::<u64>(), cap in 1u32..6, n in 0u32..30) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut enemies = formation(n, &mut rng);
            let mut dive = DiveController::new(cap);
            let ctx = MotionContext { formation_offset: Vec2::ZERO, player_center: AIM };
            for _ in 0..400 {
                for e in enemies.iter_mut() {
                    e.update(&ctx, &mut rng);
                }
                dive.reconcile(&enemies);
                prop_assert!(dive.len() <= cap as usize);
                dive.select(&mut enemies, AIM, &mut rng);
                prop_assert!(dive.len() <= cap as usize);
                let away = enemies.iter().filter(|e| e.state.is_sortie()).count();
                prop_assert!(away <= cap as usize);
            }
        }
    }
}

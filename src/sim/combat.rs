//! Combat resolution: damage, scoring, drops, player death and pickups
//!
//! Hits are applied in arena order. A destroyed enemy is only marked during
//! the pass; [`sweep_enemies`] removes it afterwards, so no collection is
//! mutated while another pass walks it.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::collision::{first_body_on, first_bullet_on, first_enemy_hit};
use super::enemy::{Archetype, EnemyState};
use super::state::{GameEvent, GamePhase, PowerUp, PowerUpKind, SessionState};

/// What a single player-bullet hit did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Health dropped but the enemy lives
    Damaged,
    /// Phantom shrugged off its first hit and fled to formation
    Phased,
    Destroyed,
}

/// Apply one unit of player damage to `state.enemies[index]`
pub fn apply_hit(state: &mut SessionState, index: usize) -> HitOutcome {
    let offset = state.formation.offset;
    let enemy = &mut state.enemies[index];
    debug_assert!(enemy.is_alive(), "hit on destroyed enemy {}", enemy.id);

    if enemy.archetype == Archetype::Phantom && !enemy.hit_once {
        enemy.phase_out(offset, &mut state.rng);
        log::debug!("Phantom {} phased out", enemy.id);
        state.events.push(GameEvent::PhantomPhased { id: enemy.id });
        return HitOutcome::Phased;
    }

    if !enemy.take_damage(1) {
        state.events.push(GameEvent::EnemyDamaged {
            id: enemy.id,
            health: enemy.health,
        });
        return HitOutcome::Damaged;
    }

    let (id, archetype, points, center) = (enemy.id, enemy.archetype, enemy.points, enemy.center());
    state.round.score += points as u64;
    state.events.push(GameEvent::EnemyDestroyed {
        id,
        archetype,
        points,
    });
    roll_drop(state, archetype, center);
    HitOutcome::Destroyed
}

/// Independent chance to drop a random power-up where an enemy died
fn roll_drop(state: &mut SessionState, archetype: Archetype, center: Vec2) {
    let chance = archetype.drop_chance(&state.tuning).clamp(0.0, 1.0);
    if !state.rng.random_bool(chance) {
        return;
    }
    let Some(&kind) = PowerUpKind::ALL.choose(&mut state.rng) else {
        return;
    };
    let id = state.next_entity_id();
    let fall_speed = state.tuning.powerup_fall_speed;
    state.powerups.push(PowerUp::new(id, kind, center, fall_speed));
    state.events.push(GameEvent::PowerUpDropped { kind });
}

/// Player bullets vs enemies. Each bullet credits at most one enemy per tick;
/// plain bullets are spent on impact, piercing ones keep flying.
pub fn resolve_player_bullets(state: &mut SessionState) {
    let mut bullets = std::mem::take(&mut state.projectiles.player_bullets);
    bullets.retain_mut(|bullet| {
        let Some(index) = first_enemy_hit(bullet, &state.enemies) else {
            return true;
        };
        let id = state.enemies[index].id;
        apply_hit(state, index);
        if bullet.piercing {
            bullet.pierced.push(id);
            true
        } else {
            false
        }
    });
    state.projectiles.player_bullets = bullets;
}

/// Drop destroyed enemies and any that flew somewhere unrecoverable
pub fn sweep_enemies(state: &mut SessionState) {
    state.enemies.retain(|e| {
        if e.is_lost() {
            log::warn!("Enemy {} lost at {:?}, removing", e.id, e.pos);
            return false;
        }
        e.is_alive()
    });
}

/// Enemy bullets and bodies vs the player. At most one hit lands per tick.
/// Returns true if the player lost a life.
pub fn resolve_player_hits(state: &mut SessionState) -> bool {
    if state.phase != GamePhase::Playing || state.player.is_invincible(state.time_ticks) {
        return false;
    }
    let target = state.player.rect;

    if let Some(b) = first_bullet_on(&target, &state.projectiles.enemy_bullets) {
        state.projectiles.enemy_bullets.remove(b);
        kill_player(state);
        return true;
    }
    if let Some(i) = first_body_on(&target, &state.enemies) {
        // Ramming costs the enemy too (no score)
        state.enemies[i].state = EnemyState::Destroyed;
        kill_player(state);
        return true;
    }
    false
}

/// Lose a life: clear the board and respawn, or end the session
pub fn kill_player(state: &mut SessionState) {
    let now = state.time_ticks;
    state.player.lives = state.player.lives.saturating_sub(1);
    let lives_left = state.player.lives;
    state.events.push(GameEvent::PlayerHit { lives_left });

    state.projectiles.clear_enemy();
    state.powerups.clear();
    state.player.active.clear();

    if lives_left == 0 {
        let summary = state.summary();
        log::info!(
            "Game over: score {} at round {} wave {}",
            summary.score,
            summary.round,
            summary.wave
        );
        state.phase = GamePhase::GameOver;
        state.summary = Some(summary);
        state.events.push(GameEvent::GameOver(summary));
        return;
    }

    log::info!("Player hit, {lives_left} lives left");
    state.player.respawn(now, state.tuning.invincibility_ticks);
    let offset = state.formation.offset;
    let recalled = state
        .dive
        .recall_all(&mut state.enemies, offset, &mut state.rng);
    log::debug!("Recalled {recalled} divers");
    state.phase = GamePhase::Regrouping;
}

/// Advance falling power-ups and apply any the player catches
pub fn collect_powerups(state: &mut SessionState) {
    let now = state.time_ticks;
    let catcher = state.player.rect;
    let mut caught = Vec::new();
    state.powerups.retain_mut(|p| {
        p.advance();
        if p.rect.intersects(&catcher) {
            caught.push(p.kind);
            return false;
        }
        !p.is_off_screen()
    });

    for kind in caught {
        let ticks = kind.duration_ticks(&state.tuning);
        state.player.apply_powerup(kind, now, ticks);
        log::debug!("Collected {kind:?} for {ticks} ticks");
        state.events.push(GameEvent::PowerUpCollected { kind });
    }
}

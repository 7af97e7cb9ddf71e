//! Fixed timestep simulation tick
//!
//! One call advances the whole session by one 60 Hz step, in a fixed order:
//! input, enemy motion, formation, dives, enemy fire, projectiles, combat,
//! pickups, regroup/wave checks, effect expiry.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::combat;
use super::enemy::EnemyState;
use super::state::{GameEvent, GamePhase, PowerUpKind, SessionState, Special};
use super::wave::spawn_wave;

/// Input intents for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub fire: bool,
    /// Pause toggle
    pub pause_toggle: bool,
    /// Power shot
    pub special_1: bool,
    /// Smart item (clear enemy bullets)
    pub special_2: bool,
    /// Force field
    pub special_3: bool,
    /// Demo mode - the simulation steers the player
    pub autopilot: bool,
}

/// Advance the session by one fixed timestep
pub fn tick(state: &mut SessionState, input: &TickInput) {
    state.events.clear();

    // Handle pause toggle
    if input.pause_toggle {
        match state.phase {
            GamePhase::Playing | GamePhase::Regrouping => {
                state.resume_phase = state.phase;
                state.phase = GamePhase::Paused;
                state.events.push(GameEvent::Paused);
                log::info!("Paused at tick {}", state.time_ticks);
                return;
            }
            GamePhase::Paused => {
                state.phase = state.resume_phase;
                state.events.push(GameEvent::Resumed);
                log::info!("Resumed");
            }
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    if matches!(state.phase, GamePhase::Paused | GamePhase::GameOver) {
        return;
    }

    state.time_ticks += 1;

    let mut input = *input;
    if input.autopilot {
        autopilot(state, &mut input);
    }

    if state.phase == GamePhase::Playing {
        update_player(state, &input);
    }

    // Enemy state machines, then the group
    let ctx = state.motion_context();
    for enemy in state.enemies.iter_mut() {
        enemy.update(&ctx, &mut state.rng);
    }
    state.formation.update(&mut state.enemies);

    // Dives
    state.dive.reconcile(&state.enemies);
    if state.phase == GamePhase::Playing {
        let aim = state.player.center();
        state.dive.select(&mut state.enemies, aim, &mut state.rng);
    }

    if state.phase == GamePhase::Playing {
        enemy_fire(state);
    }
    state.projectiles.advance();

    // Combat: removals only after each pass
    combat::resolve_player_bullets(state);
    combat::sweep_enemies(state);
    combat::resolve_player_hits(state);
    combat::sweep_enemies(state);
    state.dive.reconcile(&state.enemies);
    if state.is_over() {
        state.normalize_order();
        return;
    }

    combat::collect_powerups(state);
    check_regroup(state);
    check_wave_complete(state);
    expire_effects(state);

    state.normalize_order();
    debug_assert!(
        state.dive.len() <= state.dive.max_divers as usize,
        "diver cap exceeded"
    );
    debug_assert!(
        state.enemies.iter().all(|e| e.is_alive() && e.health > 0),
        "dead enemy survived the tick"
    );
}

/// Movement, firing and specials
fn update_player(state: &mut SessionState, input: &TickInput) {
    let now = state.time_ticks;
    let speed = state.tuning.player_speed;

    let mut delta = Vec2::ZERO;
    if input.move_left {
        delta.x -= speed;
    }
    if input.move_right {
        delta.x += speed;
    }
    if input.move_up {
        delta.y -= speed;
    }
    if input.move_down {
        delta.y += speed;
    }
    state.player.move_by(delta);

    if input.fire && now >= state.player.fire_ready_at {
        let spread = state.player.has(PowerUpKind::SpreadShot, now);
        state
            .projectiles
            .fire_player(&state.player.rect, state.tuning.player_bullet_speed, spread);
        state.player.fire_ready_at = now + state.player.fire_cooldown(&state.tuning, now) as u64;
    }

    let requested = [
        (input.special_1, Special::PowerShot),
        (input.special_2, Special::SmartItem),
        (input.special_3, Special::ForceField),
    ];
    for (pressed, special) in requested {
        if !pressed || !state.player.specials.take(special) {
            continue;
        }
        match special {
            Special::PowerShot => state
                .projectiles
                .fire_power_shot(&state.player.rect, state.tuning.player_bullet_speed),
            Special::SmartItem => state.projectiles.clear_enemy(),
            Special::ForceField => {
                let ticks = PowerUpKind::Shield.duration_ticks(&state.tuning);
                state.player.apply_powerup(PowerUpKind::Shield, now, ticks);
            }
        }
        log::debug!("Special {special:?} used");
        state.events.push(GameEvent::SpecialUsed { special });
    }
}

/// Per-enemy guns, the formation volley, and random diver shots
fn enemy_fire(state: &mut SessionState) {
    let now = state.time_ticks;
    let bullet_speed = state.tuning.enemy_bullet_speed;

    for enemy in state.enemies.iter_mut() {
        enemy.shoot(now, &mut state.projectiles, &state.tuning);
    }

    if now >= state.next_volley_at {
        state.next_volley_at = now + state.tuning.formation_volley_ticks as u64;
        let armed: Vec<usize> = state
            .enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| e.state == EnemyState::InFormation && e.can_shoot())
            .map(|(i, _)| i)
            .collect();
        if let Some(&i) = armed.choose(&mut state.rng) {
            let muzzle = state.enemies[i].rect();
            state.projectiles.fire_enemy(&muzzle, bullet_speed);
        }
    }

    let permille = state.tuning.diver_shot_permille
        + state.tuning.diver_shot_permille_per_round * state.round.round;
    for id in state.dive.divers() {
        let Ok(i) = state.enemies.binary_search_by_key(&id, |e| e.id) else {
            continue;
        };
        let diver = &state.enemies[i];
        if diver.state != EnemyState::Diving || !diver.can_shoot() {
            continue;
        }
        if state.rng.random_range(0..1000) < permille {
            state.projectiles.fire_enemy(&diver.rect(), bullet_speed);
        }
    }
}

/// End the regroup once every formation enemy is home
fn check_regroup(state: &mut SessionState) {
    if state.phase != GamePhase::Regrouping {
        return;
    }
    let whole = state
        .enemies
        .iter()
        .filter(|e| !e.is_hazard())
        .all(|e| e.state == EnemyState::InFormation);
    if whole {
        state.phase = GamePhase::Playing;
        state.dive.resume();
        state.events.push(GameEvent::FormationRegrouped);
        log::info!("Formation regrouped");
    }
}

/// Spawn the next wave once the arena is empty
fn check_wave_complete(state: &mut SessionState) {
    if !state.enemies.is_empty() {
        return;
    }
    let now = state.time_ticks;
    let cleared = state.round.wave;
    state.events.push(GameEvent::WaveCleared { wave: cleared });

    if state.round.advance(&state.tuning) {
        let round = state.round.round;
        log::info!(
            "Round {round}: divers {}, formation speed {:.1}, health +{}",
            state.round.max_divers,
            state.round.formation_speed,
            state.round.health_bonus
        );
        state.events.push(GameEvent::RoundAdvanced { round });
    }

    state.projectiles.clear_enemy();
    spawn_wave(state);
    state.phase = GamePhase::Playing;
    let ticks = state.tuning.invincibility_ticks;
    state.player.grant_invincibility(now, ticks);
}

fn expire_effects(state: &mut SessionState) {
    for kind in state.player.expire(state.time_ticks) {
        log::debug!("{kind:?} expired");
        state.events.push(GameEvent::PowerUpExpired { kind });
    }
}

/// Simple demo AI: dodge close bullets, otherwise shadow the lowest enemy
fn autopilot(state: &SessionState, input: &mut TickInput) {
    let me = state.player.center();
    input.fire = true;

    let threat = state
        .projectiles
        .enemy_bullets
        .iter()
        .map(|b| b.rect.center())
        .filter(|c| c.y < me.y + 10.0 && me.y - c.y < 120.0 && (c.x - me.x).abs() < 25.0)
        .max_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal));

    let target_x = match threat {
        Some(bullet) if bullet.x > me.x => me.x - 60.0,
        Some(_) => me.x + 60.0,
        None => state
            .enemies
            .iter()
            .filter(|e| !e.is_hazard())
            .max_by(|a, b| a.pos.y.partial_cmp(&b.pos.y).unwrap_or(std::cmp::Ordering::Equal))
            .map(|e| e.center().x)
            .unwrap_or(me.x),
    };

    input.move_left = target_x < me.x - 2.0;
    input.move_right = target_x > me.x + 2.0;
    input.special_2 = state.projectiles.enemy_bullets.len() >= 8;
}

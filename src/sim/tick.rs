//! Variable-timestep simulation frame
//!
//! Advances the whole game by one frame of `dt` milliseconds. The step is a
//! pure function of `(state, input, dt)` plus the state's seeded RNG.

use glam::Vec2;

use super::collision::{Bounded, collides};
use super::particles::Burst;
use super::state::{GameEvent, GamePhase, GameState, WaveController};
use crate::consts::*;

/// Input snapshot for a single frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Fire held (space or touch)
    pub firing: bool,
    /// Pointer/touch target in field coordinates
    pub pointer: Option<Vec2>,
}

impl TickInput {
    /// No movement, no firing
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.phase == GamePhase::GameOver {
        return;
    }
    let dt = dt.clamp(0.0, MAX_FRAME_MS);

    state.stats.play_time += dt as f64;

    // Player
    state.player.update(dt, input, &state.field);
    if input.firing
        && let Some(shot) = state.player.shoot()
    {
        state.projectiles.push(shot);
        state.events.push(GameEvent::PlayerFired);
    }

    // Projectiles
    for p in &mut state.projectiles {
        p.update(dt);
    }
    let field = state.field;
    state
        .projectiles
        .retain(|p| !field.is_outside(p.pos, PROJECTILE_CULL_MARGIN));

    update_enemies(state, dt);
    update_boss(state, dt);

    // Power-ups
    for p in &mut state.power_ups {
        p.update(dt);
    }
    state
        .power_ups
        .retain(|p| !p.is_expired() && p.pos.y <= field.height + POWER_UP_CULL_MARGIN);

    state.particles.update(dt);

    resolve_collisions(state);
    update_waves(state, dt);
    update_power_up_spawner(state, dt);

    if !state.player.is_alive() {
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::RunOver);
        log::info!(
            "Run over: score {}, wave {}, kills {}",
            state.stats.score,
            state.stats.wave,
            state.stats.kills
        );
    }
}

fn update_enemies(state: &mut GameState, dt: f32) {
    let player = state.player.pos;
    let field = state.field;
    for enemy in &mut state.enemies {
        let shots = enemy.update(dt, player, &field);
        state.projectiles.extend(shots);
    }
    let mut escaped = Vec::new();
    state.enemies.retain(|e| {
        let gone = e.has_escaped(&field, ENEMY_ESCAPE_MARGIN);
        if gone {
            escaped.push(e.id);
        }
        !gone
    });
    for id in escaped {
        log::debug!("Enemy #{} escaped", id);
        state.events.push(GameEvent::EnemyEscaped { id });
    }
}

fn update_boss(state: &mut GameState, dt: f32) {
    let player = state.player.pos;
    let field = state.field;
    let Some(boss) = state.boss.as_mut() else {
        return;
    };
    let shots = boss.update(dt, player, &field);
    state.projectiles.extend(shots);

    if !boss.defeated {
        return;
    }
    let (kind, center, pos, size, score, coins) = (
        boss.kind,
        boss.bounds().center(),
        boss.pos,
        boss.size,
        boss.score_value,
        boss.coin_value,
    );
    state.boss = None;

    state.stats.credit(score, coins);
    state.particles.burst(center, Burst::BossExplosion);
    for _ in 0..BOSS_POWER_UP_DROPS {
        let offset = Vec2::new(state.roll(), state.roll()) * size;
        state.spawn_power_up(pos + offset);
    }
    state.waves.boss_wave = false;
    state.waves.complete = true;
    state.waves.timer = 0.0;
    state.events.push(GameEvent::BossDefeated { kind });
    log::info!("{:?} defeated on wave {}", kind, state.stats.wave);
}

/// Pairwise collision resolution in fixed order
fn resolve_collisions(state: &mut GameState) {
    // Player projectiles against enemies, then the boss
    let mut i = state.projectiles.len();
    while i > 0 {
        i -= 1;
        if !state.projectiles[i].is_player() {
            continue;
        }
        let shot = state.projectiles[i].clone();

        if let Some(j) = state.enemies.iter().rposition(|e| collides(&shot, e)) {
            state.projectiles.remove(i);
            let enemy = &mut state.enemies[j];
            enemy.take_damage(shot.damage);
            let at = enemy.pos;
            state.particles.burst(at, Burst::Impact);
            if !enemy.is_alive() {
                let enemy = state.enemies.remove(j);
                state.stats.credit(enemy.score_value, enemy.coin_value);
                state.particles.burst(at, Burst::Explosion);
                state.events.push(GameEvent::EnemyDestroyed {
                    id: enemy.id,
                    kind: enemy.kind,
                    rammed: false,
                });
                if state.chance(ENEMY_DROP_CHANCE) {
                    state.spawn_power_up(at);
                }
            }
            continue;
        }

        if let Some(boss) = state.boss.as_mut()
            && collides(&shot, &*boss)
        {
            boss.take_damage(shot.damage);
            state.projectiles.remove(i);
            state.particles.burst(shot.pos, Burst::BossImpact);
        }
    }

    // Hostile projectiles against the player
    let mut i = state.projectiles.len();
    while i > 0 {
        i -= 1;
        let shot = &state.projectiles[i];
        if shot.is_player() || !collides(shot, &state.player) {
            continue;
        }
        let damage = shot.damage;
        state.projectiles.remove(i);
        state.player.take_damage(damage);
        state.particles.burst(state.player.pos, Burst::PlayerHit);
        state.events.push(GameEvent::PlayerHit { damage });
    }

    // Ship contact; ram kills never drop power-ups
    let mut i = state.enemies.len();
    while i > 0 {
        i -= 1;
        if !collides(&state.enemies[i], &state.player) {
            continue;
        }
        let damage = state.enemies[i].damage;
        state.player.take_damage(damage);
        state.enemies[i].take_damage(PLAYER_RAM_DAMAGE);
        let mid = (state.enemies[i].pos + state.player.pos) * 0.5;
        state.particles.burst(mid, Burst::Ram);
        state.events.push(GameEvent::PlayerHit { damage });

        if !state.enemies[i].is_alive() {
            let enemy = state.enemies.remove(i);
            state.stats.credit(enemy.score_value, enemy.coin_value);
            state.events.push(GameEvent::EnemyDestroyed {
                id: enemy.id,
                kind: enemy.kind,
                rammed: true,
            });
        }
    }

    // Boss body contact; the boss takes nothing back
    if let Some(boss) = &state.boss
        && collides(boss, &state.player)
    {
        let damage = boss.damage;
        state.player.take_damage(damage);
        state.particles.burst(state.player.pos, Burst::BossRam);
        state.events.push(GameEvent::PlayerHit { damage });
    }

    // Pickups
    let mut i = state.power_ups.len();
    while i > 0 {
        i -= 1;
        if !collides(&state.power_ups[i], &state.player) {
            continue;
        }
        let power_up = state.power_ups.remove(i);
        state.player.apply_power_up(power_up.kind);
        state
            .particles
            .explode(power_up.pos, power_up.kind.color(), 8);
        state.events.push(GameEvent::PowerUpCollected {
            kind: power_up.kind,
        });
    }
}

fn update_waves(state: &mut GameState, dt: f32) {
    let waves = &state.waves;
    let cleared = state.enemies.is_empty()
        && (!waves.boss_wave || state.boss.is_none())
        && waves.quota_issued();

    if cleared {
        if !state.waves.complete {
            let wave = state.stats.wave as u64;
            let (bonus_score, bonus_coins) = (wave * 100, wave * 10);
            state.waves.complete = true;
            state.waves.timer = 0.0;
            state.stats.score += bonus_score;
            state.stats.coins += bonus_coins;
            state.events.push(GameEvent::WaveCleared {
                wave: state.stats.wave,
                bonus_score,
                bonus_coins,
            });
            log::info!("Wave {} cleared", state.stats.wave);
        }
        state.waves.timer += dt;
        if state.waves.timer >= WAVE_DELAY_MS {
            start_next_wave(state);
        }
    } else if !state.waves.boss_wave
        && !state.waves.quota_issued()
        && state.enemies.len() < MAX_CONCURRENT_ENEMIES
    {
        state.spawn_enemy();
        state.waves.spawned += 1;
    }
}

/// Advance to the next wave, spawning the boss on every fifth
pub fn start_next_wave(state: &mut GameState) {
    state.stats.wave += 1;
    let wave = state.stats.wave;
    state.waves.complete = false;
    state.waves.timer = 0.0;
    state.waves.spawned = 0;
    state.waves.boss_wave = WaveController::is_boss_wave(wave);

    if state.waves.boss_wave {
        state.waves.quota = 0;
        state.spawn_boss();
        state.waves.difficulty += DIFFICULTY_STEP;
    } else {
        state.waves.quota = WaveController::quota_for(wave);
    }

    state.events.push(GameEvent::WaveStarted {
        wave,
        boss: state.waves.boss_wave,
    });
    log::info!(
        "Wave {} started (quota {}, difficulty {:.1})",
        wave,
        state.waves.quota,
        state.waves.difficulty
    );
}

fn update_power_up_spawner(state: &mut GameState, dt: f32) {
    state.power_up_timer += dt;
    if state.power_up_timer >= POWER_UP_SPAWN_INTERVAL_MS {
        state.power_up_timer = 0.0;
        let x = state.roll() * (state.field.width - 40.0).max(0.0);
        state.spawn_power_up(Vec2::new(x, -40.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::Field;
    use crate::sim::enemy::{EnemyKind, MovementPattern};
    use crate::sim::pickup::{PowerUp, PowerUpKind};
    use crate::sim::player::Upgrades;
    use crate::sim::projectile::{Owner, Projectile};

    fn new_state(seed: u64) -> GameState {
        GameState::new(seed, Field::new(800.0, 600.0), Upgrades::default(), 0)
    }

    fn player_shot(pos: Vec2, damage: f32) -> Projectile {
        Projectile::new(pos, Vec2::ZERO, Projectile::PLAYER_SIZE, damage, Owner::Player)
    }

    /// Wave flow parked, no shield, regen held off
    fn quiet_state(seed: u64) -> GameState {
        let mut state = new_state(seed);
        state.waves.spawned = state.waves.quota;
        state.waves.complete = true;
        state.waves.timer = -1e9;
        state.player.shield = 0.0;
        state.player.since_damage = 0.0;
        state
    }

    fn hold_fire(state: &mut GameState) {
        for enemy in &mut state.enemies {
            enemy.fire_cooldown = 1e9;
        }
    }

    fn count_run_over(events: &[GameEvent]) -> usize {
        events.iter().filter(|e| **e == GameEvent::RunOver).count()
    }

    #[test]
    fn test_play_time_accumulates() {
        let mut state = new_state(1);
        tick(&mut state, &TickInput::idle(), 16.0);
        tick(&mut state, &TickInput::idle(), 16.0);
        assert!((state.stats.play_time - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_cleared_wave_advances_after_delay() {
        let mut state = new_state(1);
        state.waves.spawned = state.waves.quota;

        for _ in 0..29 {
            tick(&mut state, &TickInput::idle(), 100.0);
        }
        assert_eq!(state.stats.wave, 1);
        assert!(state.waves.complete);

        tick(&mut state, &TickInput::idle(), 100.0);
        assert_eq!(state.stats.wave, 2);
        assert_eq!(state.stats.score, 100);
        assert_eq!(state.stats.coins, 10);
        assert_eq!(state.waves.quota, 6);
        assert_eq!(state.waves.spawned, 0);
        assert!(!state.waves.complete);
    }

    #[test]
    fn test_two_hits_kill_once() {
        let mut state = new_state(2);
        let id = state.spawn_enemy_at(
            EnemyKind::Scout,
            MovementPattern::Straight,
            Vec2::new(400.0, 100.0),
        );
        assert_eq!(state.enemies[0].hp, 25.0);
        let at = Vec2::new(410.0, 110.0);

        state.projectiles.push(player_shot(at, 15.0));
        tick(&mut state, &TickInput::idle(), 1.0);
        let enemy = state.enemies.iter().find(|e| e.id == id);
        assert_eq!(enemy.map(|e| e.hp), Some(10.0));
        assert_eq!(state.stats.kills, 0);

        let score = state.stats.score;
        let coins = state.stats.coins;
        let at = state
            .enemies
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.pos + Vec2::new(10.0, 10.0))
            .unwrap_or(at);
        state.projectiles.push(player_shot(at, 15.0));
        tick(&mut state, &TickInput::idle(), 1.0);
        assert!(state.enemies.iter().all(|e| e.id != id));
        assert_eq!(state.stats.kills, 1);
        assert_eq!(state.stats.score - score, 50);
        assert_eq!(state.stats.coins - coins, 5);

        tick(&mut state, &TickInput::idle(), 1.0);
        assert_eq!(state.stats.kills, 1);
        assert_eq!(state.stats.score - score, 50);
    }

    #[test]
    fn test_projectile_hits_only_first_enemy() {
        let mut state = new_state(3);
        state.waves.spawned = state.waves.quota;
        for _ in 0..2 {
            state.spawn_enemy_at(
                EnemyKind::Heavy,
                MovementPattern::Straight,
                Vec2::new(400.0, 100.0),
            );
        }
        state.projectiles.push(player_shot(Vec2::new(420.0, 120.0), 30.0));
        tick(&mut state, &TickInput::idle(), 1.0);
        let damaged = state.enemies.iter().filter(|e| e.hp < e.max_hp).count();
        assert_eq!(damaged, 1);
        assert!(state.projectiles.iter().all(|p| !p.is_player()));
    }

    #[test]
    fn test_ram_kill_credits_without_drop() {
        let mut state = quiet_state(21);
        let player = state.player.pos;
        let id = state.spawn_enemy_at(
            EnemyKind::Scout,
            MovementPattern::Straight,
            player + Vec2::new(5.0, 5.0),
        );
        hold_fire(&mut state);
        let damage = state.enemies[0].damage;
        state.drain_events();

        tick(&mut state, &TickInput::idle(), 1.0);
        assert!(state.enemies.is_empty());
        assert!((state.player.hp - (100.0 - damage)).abs() < 1e-4);
        assert_eq!(state.stats.kills, 1);
        assert_eq!(state.stats.score, 50);
        assert_eq!(state.stats.coins, 5);
        assert!(state.power_ups.is_empty());

        let events = state.drain_events();
        assert!(events.contains(&GameEvent::PlayerHit { damage }));
        assert!(events.contains(&GameEvent::EnemyDestroyed {
            id,
            kind: EnemyKind::Scout,
            rammed: true,
        }));
    }

    #[test]
    fn test_ram_survivor_takes_fixed_damage() {
        let mut state = quiet_state(22);
        let player = state.player.pos;
        state.spawn_enemy_at(
            EnemyKind::Heavy,
            MovementPattern::Straight,
            player - Vec2::new(10.0, 10.0),
        );
        hold_fire(&mut state);
        let hp = state.enemies[0].max_hp;

        tick(&mut state, &TickInput::idle(), 1.0);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.enemies[0].hp, hp - PLAYER_RAM_DAMAGE);
        assert_eq!(state.stats.kills, 0);
        assert_eq!(state.stats.score, 0);
    }

    #[test]
    fn test_hostile_shot_hits_player() {
        let mut state = quiet_state(23);
        let at = state.player.pos + Vec2::new(15.0, 15.0);
        state
            .projectiles
            .push(Projectile::new(at, Vec2::ZERO, Vec2::new(8.0, 8.0), 30.0, Owner::Hostile));
        state.drain_events();

        tick(&mut state, &TickInput::idle(), 1.0);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.player.hp, 70.0);
        assert_eq!(state.player.since_damage, 0.0);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::PlayerHit { damage: 30.0 }]
        );

        // A full shield soaks the hit first
        state.player.shield = state.player.max_shield();
        let at = state.player.pos + Vec2::new(15.0, 15.0);
        state
            .projectiles
            .push(Projectile::new(at, Vec2::ZERO, Vec2::new(8.0, 8.0), 30.0, Owner::Hostile));
        tick(&mut state, &TickInput::idle(), 1.0);
        assert_eq!(state.player.hp, 70.0);
        assert_eq!(state.player.shield, state.player.max_shield() - 30.0);
    }

    #[test]
    fn test_own_shots_never_hit_player() {
        let mut state = quiet_state(24);
        let at = state.player.pos + Vec2::new(15.0, 15.0);
        state.projectiles.push(player_shot(at, 30.0));
        tick(&mut state, &TickInput::idle(), 1.0);
        assert_eq!(state.player.hp, 100.0);
        assert_eq!(state.projectiles.len(), 1);
    }

    #[test]
    fn test_power_up_pickup_applies_buff() {
        let mut state = quiet_state(25);
        let at = state.player.pos + Vec2::new(5.0, 5.0);
        state.player.hp = 50.0;
        state.power_ups.push(PowerUp::new(900, PowerUpKind::Weapon, at));
        state.power_ups.push(PowerUp::new(901, PowerUpKind::Health, at));
        state.drain_events();

        tick(&mut state, &TickInput::idle(), 1.0);
        assert!(state.power_ups.is_empty());
        assert_eq!(
            state.player.buffs.get(&PowerUpKind::Weapon),
            Some(&WEAPON_BUFF_MS)
        );
        assert_eq!(state.player.hp, 50.0 + HEALTH_PICKUP_HP);

        let collected: Vec<_> = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::PowerUpCollected { .. }))
            .collect();
        assert_eq!(collected.len(), 2);
    }

    #[test]
    fn test_escaped_enemy_costs_nothing() {
        let mut state = quiet_state(26);
        let bottom = state.field.height + ENEMY_ESCAPE_MARGIN;
        let gone = state.spawn_enemy_at(
            EnemyKind::Scout,
            MovementPattern::Straight,
            Vec2::new(50.0, bottom + 1.0),
        );
        let stays = state.spawn_enemy_at(
            EnemyKind::Scout,
            MovementPattern::Straight,
            Vec2::new(50.0, bottom - 50.0),
        );
        hold_fire(&mut state);
        state.drain_events();

        tick(&mut state, &TickInput::idle(), 1.0);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.enemies[0].id, stays);
        assert_eq!(state.stats.score, 0);
        assert_eq!(state.stats.kills, 0);
        assert_eq!(state.player.hp, 100.0);
        assert!(state.drain_events().contains(&GameEvent::EnemyEscaped { id: gone }));
    }

    #[test]
    fn test_boss_contact_ends_run_once() {
        let mut state = new_state(4);
        state.stats.wave = 5;
        state.waves.quota = 0;
        state.waves.boss_wave = true;
        state.spawn_boss();

        state.player.pos = Vec2::new(400.0, 100.0);
        state.player.shield = 0.0;
        state.player.since_damage = 0.0;
        if let Some(boss) = state.boss.as_mut() {
            boss.pos = Vec2::new(360.0, 60.0);
            boss.damage = 80.0;
            boss.fire_cooldown = 1e9;
            boss.special_cooldown = 1e9;
        }

        tick(&mut state, &TickInput::idle(), 16.0);
        assert_eq!(state.player.hp, 20.0);
        assert_eq!(state.phase, GamePhase::Playing);

        tick(&mut state, &TickInput::idle(), 16.0);
        assert_eq!(state.player.hp, 0.0);
        assert_eq!(state.phase, GamePhase::GameOver);

        for _ in 0..5 {
            tick(&mut state, &TickInput::idle(), 16.0);
        }
        assert_eq!(count_run_over(&state.drain_events()), 1);
    }

    #[test]
    fn test_idle_frames_only_advance_timers() {
        let mut state = new_state(5);
        state.waves.spawned = state.waves.quota;
        state.waves.complete = true;

        let before = (
            state.enemies.len(),
            state.projectiles.len(),
            state.power_ups.len(),
            state.stats.score,
            state.stats.wave,
        );
        for _ in 0..100 {
            tick(&mut state, &TickInput::idle(), 16.0);
        }
        let after = (
            state.enemies.len(),
            state.projectiles.len(),
            state.power_ups.len(),
            state.stats.score,
            state.stats.wave,
        );
        assert_eq!(before, after);
        assert!((state.stats.play_time - 1600.0).abs() < 1e-3);
        assert!((state.waves.timer - 1600.0).abs() < 1e-3);
        assert!((state.power_up_timer - 1600.0).abs() < 1e-3);
    }

    #[test]
    fn test_boss_every_fifth_wave() {
        let mut state = new_state(6);
        for _ in 0..13 {
            let prev = state.stats.wave;
            start_next_wave(&mut state);
            assert_eq!(state.stats.wave, prev + 1);
            let wave = state.stats.wave;
            assert_eq!(state.waves.boss_wave, wave % 5 == 0);
            assert_eq!(state.boss.is_some(), wave % 5 == 0);
            state.boss = None;
        }
        assert!((state.waves.difficulty - 1.4).abs() < 1e-5);

        state.start_run(7);
        assert_eq!(state.waves.difficulty, 1.0);
    }

    #[test]
    fn test_boss_defeat_rewards_and_completes() {
        let mut state = new_state(8);
        state.stats.wave = 5;
        state.waves.quota = 0;
        state.waves.boss_wave = true;
        state.spawn_boss();
        if let Some(boss) = state.boss.as_mut() {
            boss.take_damage(f32::MAX);
        }

        tick(&mut state, &TickInput::idle(), 16.0);
        assert!(state.boss.is_none());
        assert!(!state.waves.boss_wave);
        assert!(state.waves.complete);
        assert_eq!(state.stats.score, 2000);
        assert_eq!(state.stats.coins, 200);
        assert_eq!(state.power_ups.len(), 3);
    }

    #[test]
    fn test_enemies_throttled_to_three() {
        let mut state = new_state(9);
        for _ in 0..10 {
            tick(&mut state, &TickInput::idle(), 16.0);
        }
        assert_eq!(state.enemies.len(), 3);
        assert_eq!(state.waves.spawned, 3);
    }

    #[test]
    fn test_ambient_power_up() {
        let mut state = new_state(10);
        state.waves.spawned = state.waves.quota;
        state.waves.complete = true;
        state.waves.timer = -1e9;
        for _ in 0..150 {
            tick(&mut state, &TickInput::idle(), 100.0);
        }
        assert_eq!(state.power_ups.len(), 1);
        assert_eq!(state.power_up_timer, 0.0);
    }

    #[test]
    fn test_firing_spawns_player_projectile() {
        let mut state = new_state(11);
        state.player.fire_cooldown = 0.0;
        let input = TickInput {
            firing: true,
            ..Default::default()
        };
        tick(&mut state, &input, 16.0);
        assert_eq!(state.projectiles.iter().filter(|p| p.is_player()).count(), 1);
    }

    #[test]
    fn test_determinism() {
        let mut a = new_state(12345);
        let mut b = new_state(12345);
        let inputs = [
            TickInput {
                left: true,
                firing: true,
                ..Default::default()
            },
            TickInput {
                up: true,
                right: true,
                ..Default::default()
            },
            TickInput {
                pointer: Some(Vec2::new(120.0, 300.0)),
                firing: true,
                ..Default::default()
            },
        ];
        for frame in 0..900 {
            let input = &inputs[(frame / 60) % inputs.len()];
            tick(&mut a, input, 16.0);
            tick(&mut b, input, 16.0);
        }
        assert_eq!(a.stats, b.stats);
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.enemies.len(), b.enemies.len());
        for (x, y) in a.enemies.iter().zip(&b.enemies) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.hp, y.hp);
        }
        assert_eq!(a.drain_events(), b.drain_events());
    }
}

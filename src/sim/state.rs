//! Game state and core simulation types
//!
//! The simulation owns every live entity. Entities hold no references back
//! into the state; the frame step in `tick` does all cross-entity work.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::{Boss, BossKind};
use super::collision::Field;
use super::enemy::{Enemy, EnemyKind, MovementPattern};
use super::particles::{MAX_PARTICLES, ParticleSystem};
use super::pickup::{PowerUp, PowerUpKind};
use super::player::{Player, Upgrades};
use super::projectile::Projectile;
use crate::consts::*;

/// Run lifecycle as seen by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Player destroyed; the frame step is a no-op from here on
    GameOver,
}

/// Per-run statistics (coins carry across runs)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub score: u64,
    /// Current wave number (1-based)
    pub wave: u32,
    pub coins: u64,
    pub kills: u32,
    /// Accumulated play time (ms)
    pub play_time: f64,
}

impl GameStats {
    /// Fresh run stats that keep the wallet
    pub fn new(coins: u64) -> Self {
        Self {
            score: 0,
            wave: 1,
            coins,
            kills: 0,
            play_time: 0.0,
        }
    }

    /// Credit a kill reward
    pub fn credit(&mut self, score: u64, coins: u64) {
        self.kills += 1;
        self.score += score;
        self.coins += coins;
    }
}

/// Wave progression state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveController {
    /// Regular enemies to issue this wave
    pub quota: u32,
    /// Regular enemies issued so far
    pub spawned: u32,
    pub complete: bool,
    pub boss_wave: bool,
    /// Time since the wave was cleared (ms)
    pub timer: f32,
    /// Enemy hp multiplier; +0.2 at every boss wave, reset each run
    pub difficulty: f32,
}

impl Default for WaveController {
    fn default() -> Self {
        Self {
            quota: FIRST_WAVE_QUOTA,
            spawned: 0,
            complete: false,
            boss_wave: false,
            timer: 0.0,
            difficulty: 1.0,
        }
    }
}

impl WaveController {
    /// Regular enemy quota for a wave number
    pub fn quota_for(wave: u32) -> u32 {
        (FIRST_WAVE_QUOTA + wave / 2).min(MAX_WAVE_QUOTA)
    }

    pub fn is_boss_wave(wave: u32) -> bool {
        wave.is_multiple_of(BOSS_WAVE_INTERVAL)
    }

    pub fn quota_issued(&self) -> bool {
        self.spawned >= self.quota
    }
}

/// Discrete things that happened during a frame (audio cues, UI, logging)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PlayerFired,
    EnemySpawned { id: u32, kind: EnemyKind },
    EnemyDestroyed { id: u32, kind: EnemyKind, rammed: bool },
    EnemyEscaped { id: u32 },
    BossSpawned { kind: BossKind },
    BossDefeated { kind: BossKind },
    PlayerHit { damage: f32 },
    PowerUpSpawned { kind: PowerUpKind },
    PowerUpCollected { kind: PowerUpKind },
    WaveCleared { wave: u32, bonus_score: u64, bonus_coins: u64 },
    WaveStarted { wave: u32, boss: bool },
    RunOver,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub field: Field,
    pub phase: GamePhase,
    pub stats: GameStats,
    pub waves: WaveController,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,
    pub projectiles: Vec<Projectile>,
    pub power_ups: Vec<PowerUp>,
    /// Visual particles (not gameplay-affecting)
    pub particles: ParticleSystem,
    /// Time since the last ambient power-up (ms)
    pub power_up_timer: f32,
    /// Events raised since the last drain
    pub events: Vec<GameEvent>,
    rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Create a state ready to play wave 1
    pub fn new(seed: u64, field: Field, upgrades: Upgrades, coins: u64) -> Self {
        Self {
            seed,
            field,
            phase: GamePhase::Playing,
            stats: GameStats::new(coins),
            waves: WaveController::default(),
            player: Player::new(Player::spawn_point(&field), upgrades),
            enemies: Vec::new(),
            boss: None,
            projectiles: Vec::new(),
            power_ups: Vec::new(),
            particles: ParticleSystem::new(seed ^ 0x9e37_79b9_7f4a_7c15, MAX_PARTICLES),
            power_up_timer: 0.0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Start a fresh run: keeps upgrades and coins, resets everything else
    pub fn start_run(&mut self, seed: u64) {
        let coins = self.stats.coins;
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.phase = GamePhase::Playing;
        self.stats = GameStats::new(coins);
        self.waves = WaveController::default();
        self.player.reset(Player::spawn_point(&self.field));
        self.enemies.clear();
        self.boss = None;
        self.projectiles.clear();
        self.power_ups.clear();
        self.particles.clear();
        self.power_up_timer = 0.0;
        self.events.clear();
        self.next_id = 1;
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Resize the field and keep the player inside it
    pub fn resize(&mut self, width: f32, height: f32) {
        self.field = Field::new(width, height);
        self.player.pos = self.field.clamp_box(self.player.pos, Player::SIZE);
    }

    /// Spawn a wave-scaled enemy with a random kind and pattern at the top edge
    pub fn spawn_enemy(&mut self) {
        let x = self.rng.random::<f32>() * (self.field.width - 60.0).max(0.0);
        let kind = EnemyKind::random_for_wave(self.stats.wave, &mut self.rng);
        let pattern = MovementPattern::random(&mut self.rng);
        self.spawn_enemy_at(kind, pattern, Vec2::new(x, -60.0));
    }

    /// Spawn a specific enemy scaled for the current wave and difficulty
    pub fn spawn_enemy_at(&mut self, kind: EnemyKind, pattern: MovementPattern, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        let enemy = Enemy::new(id, kind, pattern, pos, self.stats.wave, self.waves.difficulty);
        log::debug!("Spawned {:?} #{} ({:?}, hp {})", kind, id, pattern, enemy.hp);
        self.enemies.push(enemy);
        self.events.push(GameEvent::EnemySpawned { id, kind });
        id
    }

    /// Spawn the boss for the current wave
    pub fn spawn_boss(&mut self) {
        let boss = Boss::for_wave(self.stats.wave, &self.field);
        log::info!(
            "Boss incoming: {:?} (wave {}, hp {})",
            boss.kind,
            self.stats.wave,
            boss.max_hp
        );
        self.events.push(GameEvent::BossSpawned { kind: boss.kind });
        self.boss = Some(boss);
    }

    /// Spawn a power-up of a uniformly random kind
    pub fn spawn_power_up(&mut self, pos: Vec2) {
        let kind = PowerUpKind::random(&mut self.rng);
        let id = self.next_entity_id();
        self.power_ups.push(PowerUp::new(id, kind, pos));
        self.events.push(GameEvent::PowerUpSpawned { kind });
    }

    /// Uniform roll in [0, 1)
    pub fn roll(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Bernoulli roll
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.random_bool(p.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(7, Field::new(800.0, 600.0), Upgrades::default(), 0)
    }

    #[test]
    fn test_new_state() {
        let s = state();
        assert_eq!(s.stats.wave, 1);
        assert_eq!(s.waves.quota, 5);
        assert_eq!(s.waves.difficulty, 1.0);
        assert_eq!(s.player.pos, Vec2::new(400.0, 500.0));
        assert!(s.enemies.is_empty());
        assert_eq!(s.phase, GamePhase::Playing);
    }

    #[test]
    fn test_quota_and_boss_waves() {
        assert_eq!(WaveController::quota_for(2), 6);
        assert_eq!(WaveController::quota_for(7), 8);
        assert_eq!(WaveController::quota_for(40), 15);
        assert!(WaveController::is_boss_wave(5));
        assert!(WaveController::is_boss_wave(10));
        assert!(!WaveController::is_boss_wave(4));
    }

    #[test]
    fn test_start_run_keeps_coins_and_upgrades() {
        let mut s = state();
        s.stats.coins = 320;
        s.stats.score = 9000;
        s.stats.wave = 7;
        s.waves.difficulty = 1.4;
        s.player.upgrade(crate::sim::UpgradeKind::Hp);
        s.player.take_damage(400.0);
        s.spawn_enemy();
        s.phase = GamePhase::GameOver;

        s.start_run(11);
        assert_eq!(s.stats.coins, 320);
        assert_eq!(s.stats.score, 0);
        assert_eq!(s.stats.wave, 1);
        assert_eq!(s.waves.difficulty, 1.0);
        assert_eq!(s.player.upgrades.hp, 2);
        assert_eq!(s.player.hp, 125.0);
        assert!(s.enemies.is_empty());
        assert_eq!(s.phase, GamePhase::Playing);
    }

    #[test]
    fn test_spawned_enemies_use_difficulty() {
        let mut s = state();
        s.waves.difficulty = 2.0;
        s.spawn_enemy_at(
            EnemyKind::Scout,
            MovementPattern::Straight,
            Vec2::new(10.0, -60.0),
        );
        assert_eq!(s.enemies[0].max_hp, 50.0);
    }

    #[test]
    fn test_same_seed_same_spawns() {
        let mut a = state();
        let mut b = state();
        for _ in 0..10 {
            a.spawn_enemy();
            b.spawn_enemy();
        }
        for (x, y) in a.enemies.iter().zip(&b.enemies) {
            assert_eq!(x.kind, y.kind);
            assert_eq!(x.pattern, y.pattern);
            assert_eq!(x.pos, y.pos);
        }
    }

    #[test]
    fn test_resize_clamps_player() {
        let mut s = state();
        s.resize(300.0, 200.0);
        assert_eq!(s.player.pos, Vec2::new(260.0, 160.0));
    }
}

//! Boss ships
//!
//! One boss per boss wave. The phase (1-3) is derived from the hp ratio on
//! every update and drives movement speed, the Fortress pursuit mode and the
//! size of the special attack.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Bounded, Field};
use super::projectile::{Projectile, Volley};

/// Time between special attacks (ms)
pub const SPECIAL_ATTACK_COOLDOWN_MS: f32 = 8000.0;

/// Boss types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossKind {
    Dreadnought,
    Mothership,
    Fortress,
}

/// Base stats before wave scaling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossTable {
    pub size: Vec2,
    pub hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub fire_cooldown: f32,
    pub score: u64,
    pub coins: u64,
}

impl BossKind {
    /// Boss bracket for a wave number
    pub fn for_wave(wave: u32) -> Self {
        match wave {
            0..=5 => BossKind::Dreadnought,
            6..=10 => BossKind::Mothership,
            _ => BossKind::Fortress,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BossKind::Dreadnought => "Dreadnought",
            BossKind::Mothership => "Mothership",
            BossKind::Fortress => "Fortress",
        }
    }

    pub fn table(&self) -> BossTable {
        match self {
            BossKind::Dreadnought => BossTable {
                size: Vec2::new(120.0, 80.0),
                hp: 500.0,
                speed: 80.0,
                damage: 60.0,
                fire_cooldown: 1500.0,
                score: 2000,
                coins: 200,
            },
            BossKind::Mothership => BossTable {
                size: Vec2::new(160.0, 100.0),
                hp: 800.0,
                speed: 60.0,
                damage: 80.0,
                fire_cooldown: 1200.0,
                score: 3500,
                coins: 350,
            },
            BossKind::Fortress => BossTable {
                size: Vec2::new(200.0, 120.0),
                hp: 1200.0,
                speed: 40.0,
                damage: 100.0,
                fire_cooldown: 1000.0,
                score: 5000,
                coins: 500,
            },
        }
    }

    /// Regular volley; the Fortress adds two barrels in phase 3
    pub fn volley(&self, phase: u8) -> Volley {
        match self {
            BossKind::Dreadnought => Volley::single(350.0, Vec2::new(6.0, 12.0))
                .with_count(4)
                .with_spacing(20.0),
            BossKind::Mothership => Volley::lateral(7, 60.0, 400.0, 0.8, Vec2::new(5.0, 10.0)),
            BossKind::Fortress => {
                let shots = if phase >= 3 { 8 } else { 6 };
                Volley::ring(shots, 200.0, 300.0, 200.0, 1.0, Vec2::new(8.0, 16.0))
            }
        }
    }

    /// Special attack; two extra shots per phase above 1
    pub fn special(&self, phase: u8) -> Volley {
        let extra = 2 * phase.saturating_sub(1) as u32;
        match self {
            BossKind::Dreadnought => Volley::single(600.0, Vec2::new(4.0, 20.0))
                .with_damage(1.5)
                .with_count(10 + extra)
                .with_stagger(5.0),
            BossKind::Mothership => Volley::single(250.0, Vec2::new(6.0, 14.0))
                .with_damage(1.2)
                .with_count(5 + extra)
                .with_spacing(30.0),
            BossKind::Fortress => {
                Volley::ring(12 + extra, 300.0, 200.0, 250.0, 1.3, Vec2::new(10.0, 20.0))
            }
        }
    }

    /// Display tint (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            BossKind::Dreadnought => 0xff0000,
            BossKind::Mothership => 0xff4400,
            BossKind::Fortress => 0x8800ff,
        }
    }
}

/// Phase from the hp ratio: above 66% → 1, above 33% → 2, else 3
pub fn phase_for(hp: f32, max_hp: f32) -> u8 {
    let ratio = if max_hp > 0.0 { hp / max_hp } else { 0.0 };
    if ratio > 0.66 {
        1
    } else if ratio > 0.33 {
        2
    } else {
        3
    }
}

/// A boss ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub kind: BossKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub score_value: u64,
    pub coin_value: u64,
    pub fire_interval: f32,
    /// Time until the next regular volley (ms)
    pub fire_cooldown: f32,
    /// Time until the next special attack (ms)
    pub special_cooldown: f32,
    /// Time since spawn (ms)
    pub pattern_time: f32,
    pub phase: u8,
    pub defeated: bool,
}

impl Boss {
    /// Spawn position: centered-ish, just above the field
    pub fn spawn_point(field: &Field) -> Vec2 {
        Vec2::new(field.width / 2.0 - 100.0, -120.0)
    }

    pub fn new(kind: BossKind, pos: Vec2, wave: u32) -> Self {
        let table = kind.table();
        let wave_mult = 1.0 + wave.saturating_sub(1) as f32 * 0.15;
        let max_hp = (table.hp * wave_mult).floor();
        Self {
            kind,
            pos,
            vel: Vec2::ZERO,
            size: table.size,
            hp: max_hp,
            max_hp,
            speed: table.speed,
            damage: (table.damage * wave_mult).floor(),
            score_value: table.score,
            coin_value: table.coins,
            fire_interval: table.fire_cooldown,
            fire_cooldown: table.fire_cooldown,
            special_cooldown: SPECIAL_ATTACK_COOLDOWN_MS,
            pattern_time: 0.0,
            phase: 1,
            defeated: false,
        }
    }

    /// Boss for a wave, typed by bracket
    pub fn for_wave(wave: u32, field: &Field) -> Self {
        Self::new(BossKind::for_wave(wave), Self::spawn_point(field), wave)
    }

    /// Movement velocity for the current phase
    fn movement(&self, player: Vec2) -> Vec2 {
        let t = self.pattern_time;
        let speed = self.speed * (1.0 + 0.25 * (self.phase - 1) as f32);
        match self.kind {
            BossKind::Dreadnought => Vec2::new(
                (t * 0.001).sin() * speed,
                (t * 0.0005).sin() * speed * 0.3,
            ),
            BossKind::Mothership => {
                let angle = t * 0.0008;
                Vec2::new(angle.cos() * speed * 0.8, angle.sin() * speed * 0.4)
            }
            BossKind::Fortress if self.phase == 3 => {
                let dx = player.x - (self.pos.x + self.size.x / 2.0);
                let side = if dx > 0.0 {
                    1.0
                } else if dx < 0.0 {
                    -1.0
                } else {
                    0.0
                };
                Vec2::new(side * speed * 0.5, (t * 0.0003).sin() * speed * 0.2)
            }
            BossKind::Fortress => Vec2::new((t * 0.0006).sin() * speed * 0.7, 0.0),
        }
    }

    /// Move by `dt` ms and return everything fired this frame
    pub fn update(&mut self, dt: f32, player: Vec2, field: &Field) -> Vec<Projectile> {
        self.pattern_time += dt;
        self.fire_cooldown -= dt;
        self.special_cooldown -= dt;
        self.phase = phase_for(self.hp, self.max_hp);

        self.vel = self.movement(player);
        self.pos += self.vel * dt / 1000.0;
        self.pos.x = self.pos.x.clamp(0.0, (field.width - self.size.x).max(0.0));
        let min_y = -self.size.y * 0.3;
        self.pos.y = self.pos.y.clamp(min_y, (field.height * 0.4).max(min_y));

        let muzzle = Vec2::new(self.pos.x + self.size.x / 2.0, self.pos.y + self.size.y);
        let mut shots = Vec::new();
        if self.fire_cooldown <= 0.0 {
            self.fire_cooldown = self.fire_interval;
            shots.extend(self.kind.volley(self.phase).fire(muzzle, self.damage));
        }
        if self.special_cooldown <= 0.0 {
            self.special_cooldown = SPECIAL_ATTACK_COOLDOWN_MS;
            shots.extend(self.kind.special(self.phase).fire(muzzle, self.damage));
        }
        shots
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.hp = (self.hp - amount.max(0.0)).max(0.0);
        if self.hp <= 0.0 {
            self.defeated = true;
        }
    }
}

impl Bounded for Boss {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_by_wave_bracket() {
        assert_eq!(BossKind::for_wave(5), BossKind::Dreadnought);
        assert_eq!(BossKind::for_wave(10), BossKind::Mothership);
        assert_eq!(BossKind::for_wave(15), BossKind::Fortress);
    }

    #[test]
    fn test_stats_scale_with_wave() {
        let boss = Boss::new(BossKind::Dreadnought, Vec2::ZERO, 5);
        // 1 + 4 × 0.15 = 1.6
        assert_eq!(boss.max_hp, 800.0);
        assert_eq!(boss.damage, 96.0);
        assert_eq!(boss.size, Vec2::new(120.0, 80.0));
    }

    #[test]
    fn test_phase_thresholds() {
        assert_eq!(phase_for(100.0, 100.0), 1);
        assert_eq!(phase_for(67.0, 100.0), 1);
        assert_eq!(phase_for(66.0, 100.0), 2);
        assert_eq!(phase_for(34.0, 100.0), 2);
        assert_eq!(phase_for(33.0, 100.0), 3);
        assert_eq!(phase_for(0.0, 100.0), 3);
    }

    #[test]
    fn test_phase_follows_hp() {
        let field = Field::default();
        let mut boss = Boss::new(BossKind::Fortress, Vec2::new(300.0, 50.0), 15);
        boss.update(16.0, Vec2::ZERO, &field);
        assert_eq!(boss.phase, 1);

        boss.take_damage(boss.max_hp * 0.5);
        boss.update(16.0, Vec2::ZERO, &field);
        assert_eq!(boss.phase, 2);

        boss.take_damage(boss.max_hp * 0.4);
        boss.update(16.0, Vec2::ZERO, &field);
        assert_eq!(boss.phase, 3);
        assert!(!boss.defeated);
    }

    #[test]
    fn test_defeat_flag() {
        let mut boss = Boss::new(BossKind::Dreadnought, Vec2::ZERO, 5);
        boss.take_damage(799.0);
        assert!(!boss.defeated);
        boss.take_damage(50.0);
        assert_eq!(boss.hp, 0.0);
        assert!(boss.defeated);
    }

    #[test]
    fn test_regular_and_special_fire_same_frame() {
        let field = Field::default();
        let mut boss = Boss::new(BossKind::Dreadnought, Vec2::new(300.0, 50.0), 5);
        boss.fire_cooldown = 10.0;
        boss.special_cooldown = 10.0;
        let shots = boss.update(16.0, Vec2::ZERO, &field);
        assert_eq!(shots.len(), 4 + 10);
    }

    #[test]
    fn test_special_damage_multipliers() {
        assert_eq!(BossKind::Dreadnought.special(1).damage_mult, 1.5);
        assert_eq!(BossKind::Mothership.special(1).damage_mult, 1.2);
        assert_eq!(BossKind::Fortress.special(1).damage_mult, 1.3);

        // Every laser segment carries the full 1.5x
        let field = Field::default();
        let boss = Boss::for_wave(5, &field);
        let laser = BossKind::Dreadnought
            .special(1)
            .fire(Vec2::ZERO, boss.damage);
        assert_eq!(laser.len(), 10);
        assert!(laser.iter().all(|s| (s.damage - boss.damage * 1.5).abs() < 1e-3));
    }

    #[test]
    fn test_regular_volley_velocities() {
        let spread = BossKind::Mothership.volley(1).fire(Vec2::ZERO, 10.0);
        assert_eq!(spread.len(), 7);
        assert_eq!(spread[0].vel, Vec2::new(-180.0, 400.0));
        assert_eq!(spread[6].vel, Vec2::new(180.0, 400.0));

        // First Fortress shot points straight down: cos(0)·300 + 200
        let barrage = BossKind::Fortress.volley(1).fire(Vec2::ZERO, 10.0);
        assert!(barrage[0].vel.distance(Vec2::new(0.0, 500.0)) < 1e-3);
    }

    #[test]
    fn test_special_grows_with_phase() {
        assert_eq!(BossKind::Mothership.special(1).count, 5);
        assert_eq!(BossKind::Mothership.special(3).count, 9);
        assert_eq!(BossKind::Fortress.volley(2).count, 6);
        assert_eq!(BossKind::Fortress.volley(3).count, 8);
    }

    #[test]
    fn test_clamped_to_upper_field() {
        let field = Field::new(800.0, 600.0);
        let mut boss = Boss::new(BossKind::Dreadnought, Vec2::new(300.0, 1000.0), 5);
        boss.update(16.0, Vec2::ZERO, &field);
        assert!(boss.pos.y <= 240.0);

        let mut boss = Boss::for_wave(5, &field);
        assert_eq!(boss.pos, Vec2::new(300.0, -120.0));
        boss.update(16.0, Vec2::ZERO, &field);
        assert!(boss.pos.y >= -24.0);
    }
}

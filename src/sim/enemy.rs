//! Regular enemy ships
//!
//! Each kind has a fixed stat table and volley. Movement is picked once at
//! spawn and is a pure function of pattern time (plus the player position
//! for pursuit).

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Bounded, Field};
use super::projectile::{Projectile, Volley};

/// Enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Scout,
    Fighter,
    Heavy,
    Bomber,
    Interceptor,
    Destroyer,
}

/// Base stats before wave scaling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyTable {
    pub size: Vec2,
    pub hp: f32,
    pub speed: f32,
    /// Speed added per wave number
    pub speed_per_wave: f32,
    pub damage: f32,
    pub fire_cooldown: f32,
    pub score: u64,
    pub coins: u64,
    /// First wave this kind can appear in
    pub min_wave: u32,
    /// Relative spawn weight once unlocked
    pub weight: u32,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 6] = [
        EnemyKind::Scout,
        EnemyKind::Fighter,
        EnemyKind::Heavy,
        EnemyKind::Bomber,
        EnemyKind::Interceptor,
        EnemyKind::Destroyer,
    ];

    pub fn table(&self) -> EnemyTable {
        match self {
            EnemyKind::Scout => EnemyTable {
                size: Vec2::new(30.0, 30.0),
                hp: 25.0,
                speed: 150.0,
                speed_per_wave: 10.0,
                damage: 15.0,
                fire_cooldown: 2000.0,
                score: 50,
                coins: 5,
                min_wave: 1,
                weight: 60,
            },
            EnemyKind::Fighter => EnemyTable {
                size: Vec2::new(40.0, 40.0),
                hp: 50.0,
                speed: 100.0,
                speed_per_wave: 8.0,
                damage: 25.0,
                fire_cooldown: 1500.0,
                score: 100,
                coins: 10,
                min_wave: 1,
                weight: 25,
            },
            EnemyKind::Heavy => EnemyTable {
                size: Vec2::new(60.0, 50.0),
                hp: 100.0,
                speed: 60.0,
                speed_per_wave: 5.0,
                damage: 40.0,
                fire_cooldown: 1000.0,
                score: 200,
                coins: 20,
                min_wave: 1,
                weight: 15,
            },
            EnemyKind::Bomber => EnemyTable {
                size: Vec2::new(50.0, 40.0),
                hp: 70.0,
                speed: 80.0,
                speed_per_wave: 6.0,
                damage: 30.0,
                fire_cooldown: 2500.0,
                score: 150,
                coins: 15,
                min_wave: 3,
                weight: 12,
            },
            EnemyKind::Interceptor => EnemyTable {
                size: Vec2::new(28.0, 34.0),
                hp: 35.0,
                speed: 200.0,
                speed_per_wave: 12.0,
                damage: 20.0,
                fire_cooldown: 1200.0,
                score: 120,
                coins: 12,
                min_wave: 4,
                weight: 12,
            },
            EnemyKind::Destroyer => EnemyTable {
                size: Vec2::new(70.0, 60.0),
                hp: 180.0,
                speed: 50.0,
                speed_per_wave: 4.0,
                damage: 45.0,
                fire_cooldown: 1800.0,
                score: 350,
                coins: 35,
                min_wave: 6,
                weight: 8,
            },
        }
    }

    pub fn volley(&self) -> Volley {
        let shot = Vec2::new(4.0, 12.0);
        match self {
            EnemyKind::Scout | EnemyKind::Fighter | EnemyKind::Heavy => Volley::single(400.0, shot),
            EnemyKind::Bomber => Volley::fan(3, 0.6, 250.0, 0.8, Vec2::new(6.0, 10.0)),
            EnemyKind::Interceptor => Volley::single(500.0, shot).with_count(2).with_spacing(14.0),
            EnemyKind::Destroyer => Volley::fan(5, 1.0, 320.0, 0.7, Vec2::new(6.0, 12.0)),
        }
    }

    /// Display tint (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            EnemyKind::Scout => 0xff4444,
            EnemyKind::Fighter => 0xff8800,
            EnemyKind::Heavy => 0xff0088,
            EnemyKind::Bomber => 0xaa66ff,
            EnemyKind::Interceptor => 0x44ffaa,
            EnemyKind::Destroyer => 0xff2222,
        }
    }

    /// Weighted pick among the kinds unlocked at `wave`
    pub fn random_for_wave(wave: u32, rng: &mut impl Rng) -> Self {
        let total: u32 = Self::ALL
            .iter()
            .map(|k| k.table())
            .filter(|t| t.min_wave <= wave)
            .map(|t| t.weight)
            .sum();
        let mut roll = rng.random_range(0..total.max(1));
        for kind in Self::ALL {
            let table = kind.table();
            if table.min_wave > wave {
                continue;
            }
            if roll < table.weight {
                return kind;
            }
            roll -= table.weight;
        }
        EnemyKind::Scout
    }
}

/// Movement patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementPattern {
    /// Straight down at full speed
    Straight,
    /// Descend while weaving sideways
    Sine,
    /// Drift toward the player, never slower than half speed downward
    Pursuit,
    /// Descend with constant-speed sideways sweeps
    Zigzag,
}

impl MovementPattern {
    pub const ALL: [MovementPattern; 4] = [
        MovementPattern::Straight,
        MovementPattern::Sine,
        MovementPattern::Pursuit,
        MovementPattern::Zigzag,
    ];

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Velocity for this pattern
    ///
    /// `prev` is returned unchanged by pursuit when the ship sits exactly on
    /// the player.
    pub fn velocity(&self, speed: f32, pattern_time: f32, from: Vec2, player: Vec2, prev: Vec2) -> Vec2 {
        match self {
            MovementPattern::Straight => Vec2::new(0.0, speed),
            MovementPattern::Sine => Vec2::new(
                (pattern_time * 0.003).sin() * speed * 0.5,
                speed * 0.7,
            ),
            MovementPattern::Pursuit => {
                let delta = player - from;
                let distance = delta.length();
                if distance > 0.0 {
                    let dir = delta / distance;
                    Vec2::new(
                        dir.x * speed * 0.3,
                        (dir.y * speed * 0.3).max(speed * 0.5),
                    )
                } else {
                    prev
                }
            }
            MovementPattern::Zigzag => {
                // Flip direction every 800 ms
                let leg = (pattern_time / 800.0).floor() as i64;
                let side = if leg % 2 == 0 { 1.0 } else { -1.0 };
                Vec2::new(side * speed * 0.6, speed * 0.6)
            }
        }
    }
}

/// A regular enemy ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pattern: MovementPattern,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    /// Contact and shot damage
    pub damage: f32,
    pub score_value: u64,
    pub coin_value: u64,
    pub fire_interval: f32,
    /// Time until the next volley (ms)
    pub fire_cooldown: f32,
    /// Time since spawn (ms), drives the movement pattern
    pub pattern_time: f32,
}

impl Enemy {
    /// Build an enemy scaled for `wave` and the current difficulty multiplier
    pub fn new(
        id: u32,
        kind: EnemyKind,
        pattern: MovementPattern,
        pos: Vec2,
        wave: u32,
        difficulty: f32,
    ) -> Self {
        let table = kind.table();
        let wave_mult = 1.0 + wave.saturating_sub(1) as f32 * 0.1;
        let max_hp = (table.hp * wave_mult * difficulty).floor().max(1.0);
        Self {
            id,
            kind,
            pattern,
            pos,
            vel: Vec2::ZERO,
            size: table.size,
            hp: max_hp,
            max_hp,
            speed: table.speed + wave as f32 * table.speed_per_wave,
            damage: (table.damage * wave_mult).floor(),
            score_value: table.score,
            coin_value: table.coins,
            fire_interval: table.fire_cooldown,
            fire_cooldown: table.fire_cooldown,
            pattern_time: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Move by `dt` ms and return any volley fired this frame
    pub fn update(&mut self, dt: f32, player: Vec2, field: &Field) -> Vec<Projectile> {
        self.pattern_time += dt;
        self.fire_cooldown -= dt;

        self.vel = self
            .pattern
            .velocity(self.speed, self.pattern_time, self.pos, player, self.vel);
        self.pos += self.vel * dt / 1000.0;
        self.pos.x = self.pos.x.clamp(0.0, (field.width - self.size.x).max(0.0));

        if self.fire_cooldown <= 0.0 {
            self.fire_cooldown = self.fire_interval;
            let muzzle = Vec2::new(self.pos.x + self.size.x / 2.0, self.pos.y + self.size.y);
            self.kind.volley().fire(muzzle, self.damage)
        } else {
            Vec::new()
        }
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.hp = (self.hp - amount.max(0.0)).max(0.0);
    }

    /// Past the bottom edge by more than `margin`
    pub fn has_escaped(&self, field: &Field, margin: f32) -> bool {
        self.pos.y > field.height + margin
    }
}

impl Bounded for Enemy {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn scout(wave: u32, difficulty: f32) -> Enemy {
        Enemy::new(
            1,
            EnemyKind::Scout,
            MovementPattern::Straight,
            Vec2::new(100.0, 0.0),
            wave,
            difficulty,
        )
    }

    #[test]
    fn test_wave_one_scout_stats() {
        let e = scout(1, 1.0);
        assert_eq!(e.max_hp, 25.0);
        assert_eq!(e.hp, 25.0);
        assert_eq!(e.damage, 15.0);
        assert_eq!(e.speed, 160.0);
        assert_eq!(e.size, Vec2::new(30.0, 30.0));
    }

    #[test]
    fn test_stats_scale_with_wave_and_difficulty() {
        let e = scout(6, 1.2);
        // 25 × 1.5 × 1.2 = 45
        assert_eq!(e.max_hp, 45.0);
        // Damage ignores difficulty: floor(15 × 1.5)
        assert_eq!(e.damage, 22.0);
        assert_eq!(e.speed, 210.0);
    }

    #[test]
    fn test_take_damage_floors_at_zero() {
        let mut e = scout(1, 1.0);
        e.take_damage(15.0);
        assert_eq!(e.hp, 10.0);
        assert!(e.is_alive());
        e.take_damage(15.0);
        assert_eq!(e.hp, 0.0);
        assert!(!e.is_alive());
    }

    #[test]
    fn test_straight_pattern_moves_down() {
        let field = Field::default();
        let mut e = scout(1, 1.0);
        let shots = e.update(1000.0, Vec2::new(400.0, 500.0), &field);
        assert!(shots.is_empty());
        assert!((e.pos.y - 160.0).abs() < 1e-3);
        assert_eq!(e.pos.x, 100.0);
    }

    #[test]
    fn test_fires_when_cooldown_elapses() {
        let field = Field::default();
        let mut e = scout(1, 1.0);
        assert!(e.update(1999.0, Vec2::ZERO, &field).is_empty());
        let shots = e.update(1.0, Vec2::ZERO, &field);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].damage, 15.0);
        assert!(shots[0].vel.y > 0.0);
        assert!(e.update(16.0, Vec2::ZERO, &field).is_empty());
    }

    #[test]
    fn test_pursuit_never_climbs() {
        let v = MovementPattern::Pursuit.velocity(
            100.0,
            0.0,
            Vec2::new(0.0, 500.0),
            Vec2::new(0.0, 0.0),
            Vec2::ZERO,
        );
        assert_eq!(v.y, 50.0);

        let prev = Vec2::new(3.0, 4.0);
        let v = MovementPattern::Pursuit.velocity(100.0, 0.0, Vec2::ONE, Vec2::ONE, prev);
        assert_eq!(v, prev);
    }

    #[test]
    fn test_patterns_are_deterministic() {
        for pattern in MovementPattern::ALL {
            let a = pattern.velocity(120.0, 1234.0, Vec2::new(10.0, 20.0), Vec2::new(300.0, 400.0), Vec2::ZERO);
            let b = pattern.velocity(120.0, 1234.0, Vec2::new(10.0, 20.0), Vec2::new(300.0, 400.0), Vec2::ZERO);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_clamped_horizontally() {
        let field = Field::new(200.0, 600.0);
        let mut e = Enemy::new(
            1,
            EnemyKind::Scout,
            MovementPattern::Pursuit,
            Vec2::new(160.0, 0.0),
            1,
            1.0,
        );
        for _ in 0..200 {
            e.update(16.0, Vec2::new(5000.0, 100.0), &field);
        }
        assert!(e.pos.x <= 170.0);
    }

    #[test]
    fn test_late_kinds_locked_early() {
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..500 {
            let kind = EnemyKind::random_for_wave(1, &mut rng);
            assert!(matches!(
                kind,
                EnemyKind::Scout | EnemyKind::Fighter | EnemyKind::Heavy
            ));
        }
        let seen_destroyer =
            (0..2000).any(|_| EnemyKind::random_for_wave(8, &mut rng) == EnemyKind::Destroyer);
        assert!(seen_destroyer);
    }
}

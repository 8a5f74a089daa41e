//! Power-ups dropped by enemies, bosses and the ambient spawner

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Bounded};
use crate::consts::POWER_UP_LIFETIME_MS;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerUpKind {
    Health,
    Shield,
    Weapon,
    Speed,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Health,
        PowerUpKind::Shield,
        PowerUpKind::Weapon,
        PowerUpKind::Speed,
    ];

    /// Uniform pick over all kinds
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::Health => "health",
            PowerUpKind::Shield => "shield",
            PowerUpKind::Weapon => "weapon",
            PowerUpKind::Speed => "speed",
        }
    }

    /// Display tint (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            PowerUpKind::Health => 0x00ff00,
            PowerUpKind::Shield => 0x0088ff,
            PowerUpKind::Weapon => 0xff4400,
            PowerUpKind::Speed => 0xffff00,
        }
    }
}

/// A collectible drifting down the field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Time alive (ms)
    pub age: f32,
}

impl PowerUp {
    pub const SIZE: Vec2 = Vec2::new(30.0, 30.0);
    pub const DRIFT_SPEED: f32 = 50.0;

    pub fn new(id: u32, kind: PowerUpKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            vel: Vec2::new(0.0, Self::DRIFT_SPEED),
            age: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.age += dt;
        self.pos += self.vel * dt / 1000.0;
    }

    pub fn is_expired(&self) -> bool {
        self.age >= POWER_UP_LIFETIME_MS
    }

    /// Fraction of lifetime left (0-1), for blink-out rendering
    pub fn remaining_fraction(&self) -> f32 {
        (1.0 - self.age / POWER_UP_LIFETIME_MS).clamp(0.0, 1.0)
    }
}

impl Bounded for PowerUp {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, Self::SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_drifts_and_expires() {
        let mut p = PowerUp::new(1, PowerUpKind::Health, Vec2::new(10.0, 0.0));
        p.update(1000.0);
        assert!((p.pos.y - 50.0).abs() < 1e-3);
        assert!(!p.is_expired());

        p.update(13_999.0);
        assert!(!p.is_expired());
        p.update(1.0);
        assert!(p.is_expired());
        assert_eq!(p.remaining_fraction(), 0.0);
    }

    #[test]
    fn test_random_kind_covers_all() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(PowerUpKind::random(&mut rng));
        }
        assert_eq!(seen.len(), PowerUpKind::ALL.len());
    }
}

//! Projectiles and the volley patterns that fire them

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Bounded};
use crate::downward_dir;

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Hostile,
}

/// A straight-line shot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub damage: f32,
    pub owner: Owner,
}

impl Projectile {
    pub const PLAYER_SIZE: Vec2 = Vec2::new(4.0, 12.0);
    pub const PLAYER_SPEED: f32 = 800.0;

    pub fn new(pos: Vec2, vel: Vec2, size: Vec2, damage: f32, owner: Owner) -> Self {
        Self {
            pos,
            vel,
            size,
            damage,
            owner,
        }
    }

    /// Kinematic step, `dt` in milliseconds
    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt / 1000.0;
    }

    pub fn is_player(&self) -> bool {
        self.owner == Owner::Player
    }
}

impl Bounded for Projectile {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

/// How the shots of a volley fan out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spread {
    /// Parallel shots straight down
    Parallel,
    /// Angular fan of this total width (radians)
    Fan(f32),
    /// Horizontal velocity step between adjacent shots
    Lateral(f32),
    /// Full turn starting straight down: shot `i` at angle `i / count · 2π`,
    /// velocity `(sin · horizontal, cos · speed)`
    Ring { horizontal: f32 },
}

/// A fixed firing pattern for hostile ships
///
/// Shots are laid out symmetrically around the muzzle: shot `i` gets an
/// index offset `t = i - (count - 1) / 2`, which scales the fan step,
/// the lateral velocity and the horizontal muzzle spacing. Stagger steps
/// by the plain index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volley {
    pub count: u32,
    pub spread: Spread,
    /// Horizontal distance between adjacent muzzles
    pub spacing: f32,
    /// Vertical distance between adjacent shots (for beam-like columns)
    pub stagger: f32,
    pub speed: f32,
    /// Extra downward velocity added after the spread
    pub drift: f32,
    pub damage_mult: f32,
    pub size: Vec2,
}

impl Volley {
    /// A single straight-down shot
    pub const fn single(speed: f32, size: Vec2) -> Self {
        Self {
            count: 1,
            spread: Spread::Parallel,
            spacing: 0.0,
            stagger: 0.0,
            speed,
            drift: 0.0,
            damage_mult: 1.0,
            size,
        }
    }

    /// A fan of `count` shots over `spread` radians
    pub const fn fan(count: u32, spread: f32, speed: f32, damage_mult: f32, size: Vec2) -> Self {
        Self {
            count,
            spread: Spread::Fan(spread),
            damage_mult,
            ..Self::single(speed, size)
        }
    }

    /// `count` shots at a common downward `speed`, sideways speeds `step` apart
    pub const fn lateral(count: u32, step: f32, speed: f32, damage_mult: f32, size: Vec2) -> Self {
        Self {
            count,
            spread: Spread::Lateral(step),
            damage_mult,
            ..Self::single(speed, size)
        }
    }

    /// A full ring with separate horizontal and vertical speeds plus drift
    pub const fn ring(
        count: u32,
        horizontal: f32,
        vertical: f32,
        drift: f32,
        damage_mult: f32,
        size: Vec2,
    ) -> Self {
        Self {
            count,
            spread: Spread::Ring { horizontal },
            drift,
            damage_mult,
            ..Self::single(vertical, size)
        }
    }

    pub const fn with_damage(mut self, damage_mult: f32) -> Self {
        self.damage_mult = damage_mult;
        self
    }

    pub const fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    pub const fn with_stagger(mut self, stagger: f32) -> Self {
        self.stagger = stagger;
        self
    }

    pub const fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    fn velocity(&self, i: u32, t: f32, count: u32) -> Vec2 {
        let base = match self.spread {
            Spread::Parallel => Vec2::new(0.0, self.speed),
            Spread::Fan(width) => {
                let step = if count > 1 {
                    width / (count - 1) as f32
                } else {
                    0.0
                };
                downward_dir(t * step) * self.speed
            }
            Spread::Lateral(step) => Vec2::new(t * step, self.speed),
            Spread::Ring { horizontal } => {
                let angle = i as f32 / count as f32 * std::f32::consts::TAU;
                Vec2::new(angle.sin() * horizontal, angle.cos() * self.speed)
            }
        };
        base + Vec2::new(0.0, self.drift)
    }

    /// Emit the volley from `muzzle` (bottom-center of the shooter)
    pub fn fire(&self, muzzle: Vec2, base_damage: f32) -> Vec<Projectile> {
        let count = self.count.max(1);
        let mid = (count - 1) as f32 / 2.0;
        let damage = base_damage * self.damage_mult;

        (0..count)
            .map(|i| {
                let t = i as f32 - mid;
                let pos = Vec2::new(
                    muzzle.x + t * self.spacing - self.size.x / 2.0,
                    muzzle.y + (i as f32) * self.stagger,
                );
                Projectile::new(pos, self.velocity(i, t, count), self.size, damage, Owner::Hostile)
            })
            .collect()
    }
}

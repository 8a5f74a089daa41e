//! The player's ship, its upgrades and timed buffs

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Bounded, Field};
use super::pickup::PowerUpKind;
use super::projectile::{Owner, Projectile};
use super::tick::TickInput;
use crate::consts::*;

/// Shop upgrade tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    Weapon,
    Shield,
    Hp,
    Speed,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 4] = [
        UpgradeKind::Weapon,
        UpgradeKind::Shield,
        UpgradeKind::Hp,
        UpgradeKind::Speed,
    ];

    /// Price of the first purchase on this track
    pub fn base_cost(&self) -> u64 {
        match self {
            UpgradeKind::Weapon => 100,
            UpgradeKind::Shield => 150,
            UpgradeKind::Hp => 200,
            UpgradeKind::Speed => 120,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeKind::Weapon => "weapon",
            UpgradeKind::Shield => "shield",
            UpgradeKind::Hp => "hp",
            UpgradeKind::Speed => "speed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "weapon" => Some(UpgradeKind::Weapon),
            "shield" => Some(UpgradeKind::Shield),
            "hp" | "health" => Some(UpgradeKind::Hp),
            "speed" => Some(UpgradeKind::Speed),
            _ => None,
        }
    }
}

/// Persistent upgrade levels (each starts at 1, no upper bound)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrades {
    pub weapon: u32,
    pub shield: u32,
    pub hp: u32,
    pub speed: u32,
}

impl Default for Upgrades {
    fn default() -> Self {
        Self {
            weapon: 1,
            shield: 1,
            hp: 1,
            speed: 1,
        }
    }
}

impl Upgrades {
    pub fn level(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::Weapon => self.weapon,
            UpgradeKind::Shield => self.shield,
            UpgradeKind::Hp => self.hp,
            UpgradeKind::Speed => self.speed,
        }
    }

    fn level_mut(&mut self, kind: UpgradeKind) -> &mut u32 {
        match kind {
            UpgradeKind::Weapon => &mut self.weapon,
            UpgradeKind::Shield => &mut self.shield,
            UpgradeKind::Hp => &mut self.hp,
            UpgradeKind::Speed => &mut self.speed,
        }
    }

    /// Bump one level
    pub fn raise(&mut self, kind: UpgradeKind) {
        *self.level_mut(kind) += 1;
    }

    /// `floor(base × 1.5^(level-1))`
    pub fn cost(&self, kind: UpgradeKind) -> u64 {
        let level = self.level(kind).max(1);
        let scale = 1.5f64.powi(level as i32 - 1);
        (kind.base_cost() as f64 * scale).floor() as u64
    }

    /// Raise any level below 1 (corrupt or hand-edited saves)
    pub fn sanitized(mut self) -> Self {
        for kind in UpgradeKind::ALL {
            let level = self.level_mut(kind);
            *level = (*level).max(1);
        }
        self
    }
}

/// Stats derived purely from upgrade levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub max_hp: f32,
    pub max_shield: f32,
    pub speed: f32,
    pub damage: f32,
    pub fire_rate: f32,
}

impl DerivedStats {
    pub fn from_upgrades(upgrades: &Upgrades) -> Self {
        let steps = |level: u32| level.saturating_sub(1) as f32;
        Self {
            max_hp: PLAYER_BASE_HP + steps(upgrades.hp) * 25.0,
            max_shield: PLAYER_BASE_SHIELD + steps(upgrades.shield) * 30.0,
            speed: PLAYER_BASE_SPEED + steps(upgrades.speed) * 50.0,
            damage: PLAYER_BASE_DAMAGE + steps(upgrades.weapon) * 10.0,
            fire_rate: (PLAYER_BASE_FIRE_RATE_MS - steps(upgrades.weapon) * 30.0)
                .max(PLAYER_MIN_FIRE_RATE_MS),
        }
    }
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub hp: f32,
    pub shield: f32,
    pub stats: DerivedStats,
    pub upgrades: Upgrades,
    /// Time until the next shot is allowed (ms)
    pub fire_cooldown: f32,
    /// Time since the last hit (ms), gates shield regeneration
    pub since_damage: f32,
    /// Active timed buffs and their remaining time (ms)
    pub buffs: BTreeMap<PowerUpKind, f32>,
}

impl Player {
    pub const SIZE: Vec2 = Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT);

    pub fn new(pos: Vec2, upgrades: Upgrades) -> Self {
        let stats = DerivedStats::from_upgrades(&upgrades);
        Self {
            pos,
            vel: Vec2::ZERO,
            hp: stats.max_hp,
            shield: stats.max_shield,
            stats,
            upgrades,
            fire_cooldown: stats.fire_rate,
            since_damage: SHIELD_REGEN_DELAY_MS,
            buffs: BTreeMap::new(),
        }
    }

    /// Spawn point for a field: horizontally centered, near the bottom
    pub fn spawn_point(field: &Field) -> Vec2 {
        Vec2::new(field.width / 2.0, field.height - PLAYER_SPAWN_OFFSET)
    }

    pub fn max_hp(&self) -> f32 {
        self.stats.max_hp
    }

    pub fn max_shield(&self) -> f32 {
        self.stats.max_shield
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn has_buff(&self, kind: PowerUpKind) -> bool {
        self.buffs.contains_key(&kind)
    }

    /// Speed including the Speed buff
    pub fn current_speed(&self) -> f32 {
        if self.has_buff(PowerUpKind::Speed) {
            self.stats.speed * 1.5
        } else {
            self.stats.speed
        }
    }

    /// Shot damage including the Weapon buff
    pub fn current_damage(&self) -> f32 {
        if self.has_buff(PowerUpKind::Weapon) {
            self.stats.damage * 2.0
        } else {
            self.stats.damage
        }
    }

    /// Advance movement, cooldowns, regen and buffs by `dt` ms
    pub fn update(&mut self, dt: f32, input: &TickInput, field: &Field) {
        let mut dir = Vec2::ZERO;
        if input.left {
            dir.x -= 1.0;
        }
        if input.right {
            dir.x += 1.0;
        }
        if input.up {
            dir.y -= 1.0;
        }
        if input.down {
            dir.y += 1.0;
        }
        // Pointer seek overrides the keys outside the dead zone
        if let Some(pointer) = input.pointer {
            let target = crate::centered(pointer, Self::SIZE);
            let delta = target - self.pos;
            if delta.length() > POINTER_DEAD_ZONE {
                dir = delta.normalize_or_zero();
            }
        }

        // Applies to pointer seek as well as keys
        if dir.x != 0.0 && dir.y != 0.0 {
            dir *= DIAGONAL_FACTOR;
        }

        self.vel = dir * self.current_speed();
        self.pos += self.vel * dt / 1000.0;
        self.pos = field.clamp_box(self.pos, Self::SIZE);

        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);

        self.since_damage += dt;
        if self.since_damage > SHIELD_REGEN_DELAY_MS && self.shield < self.stats.max_shield {
            self.shield =
                (self.shield + SHIELD_REGEN_PER_SEC * dt / 1000.0).min(self.stats.max_shield);
        }

        self.buffs.retain(|_, left| {
            *left -= dt;
            *left > 0.0
        });
    }

    /// Fire a shot straight up if the cooldown has elapsed
    pub fn shoot(&mut self) -> Option<Projectile> {
        if self.fire_cooldown > 0.0 {
            return None;
        }
        self.fire_cooldown = self.stats.fire_rate;
        let muzzle = Vec2::new(self.pos.x + Self::SIZE.x / 2.0 - 2.0, self.pos.y);
        Some(Projectile::new(
            muzzle,
            Vec2::new(0.0, -Projectile::PLAYER_SPEED),
            Projectile::PLAYER_SIZE,
            self.current_damage(),
            Owner::Player,
        ))
    }

    /// Shield soaks first, the rest comes off hp (floored at 0)
    pub fn take_damage(&mut self, amount: f32) {
        let amount = amount.max(0.0);
        self.since_damage = 0.0;

        let absorbed = self.shield.min(amount);
        self.shield -= absorbed;
        let rest = amount - absorbed;
        if rest > 0.0 {
            self.hp = (self.hp - rest).max(0.0);
        }
    }

    pub fn apply_power_up(&mut self, kind: PowerUpKind) {
        match kind {
            PowerUpKind::Health => {
                self.hp = (self.hp + HEALTH_PICKUP_HP).min(self.stats.max_hp);
            }
            PowerUpKind::Shield => {
                self.shield = (self.shield + SHIELD_PICKUP_AMOUNT).min(self.stats.max_shield);
            }
            PowerUpKind::Weapon => {
                self.buffs.insert(PowerUpKind::Weapon, WEAPON_BUFF_MS);
            }
            PowerUpKind::Speed => {
                self.buffs.insert(PowerUpKind::Speed, SPEED_BUFF_MS);
            }
        }
    }

    pub fn upgrade_cost(&self, kind: UpgradeKind) -> u64 {
        self.upgrades.cost(kind)
    }

    /// Bump a level and recompute derived stats; current hp/shield only shrink to fit
    pub fn upgrade(&mut self, kind: UpgradeKind) {
        self.upgrades.raise(kind);
        self.recompute_stats();
    }

    /// Replace all levels (loading a save) and refill to the new maximums
    pub fn apply_upgrades(&mut self, upgrades: Upgrades) {
        self.upgrades = upgrades.sanitized();
        self.recompute_stats();
        self.hp = self.stats.max_hp;
        self.shield = self.stats.max_shield;
    }

    fn recompute_stats(&mut self) {
        self.stats = DerivedStats::from_upgrades(&self.upgrades);
        self.hp = self.hp.min(self.stats.max_hp);
        self.shield = self.shield.min(self.stats.max_shield);
    }

    /// Restore for a new run; upgrade levels survive
    pub fn reset(&mut self, pos: Vec2) {
        self.pos = pos;
        self.vel = Vec2::ZERO;
        self.hp = self.stats.max_hp;
        self.shield = self.stats.max_shield;
        self.fire_cooldown = self.stats.fire_rate;
        self.since_damage = SHIELD_REGEN_DELAY_MS;
        self.buffs.clear();
    }
}

impl Bounded for Player {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, Self::SIZE)
    }
}

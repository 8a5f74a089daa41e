//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Time only through the frame's `dt`
//! - Seeded RNG only
//! - Stable iteration order (reverse index in collision passes)
//! - No rendering, storage or platform dependencies

pub mod boss;
pub mod collision;
pub mod enemy;
pub mod particles;
pub mod pickup;
pub mod player;
pub mod projectile;
pub mod state;
pub mod tick;

pub use boss::{Boss, BossKind, phase_for};
pub use collision::{Aabb, Bounded, Field, collides};
pub use enemy::{Enemy, EnemyKind, MovementPattern};
pub use particles::{Burst, Particle, ParticleSystem};
pub use pickup::{PowerUp, PowerUpKind};
pub use player::{DerivedStats, Player, UpgradeKind, Upgrades};
pub use projectile::{Owner, Projectile, Spread, Volley};
pub use state::{GameEvent, GamePhase, GameState, GameStats, WaveController};
pub use tick::{TickInput, start_next_wave, tick};

//! Visual-only particle bursts
//!
//! Particles never feed back into gameplay. They draw from their own RNG so
//! the particle cap or toggling effects off cannot shift gameplay rolls.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Default particle cap
pub const MAX_PARTICLES: usize = 500;

/// Downward pull on particles (units/s²)
const PARTICLE_GRAVITY: f32 = 50.0;
/// Per-frame velocity damping
const PARTICLE_DAMPING: f32 = 0.99;

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32,
    /// Remaining life (ms)
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
}

impl Particle {
    /// Remaining life as 0-1, for fading
    pub fn alpha(&self) -> f32 {
        if self.max_life > 0.0 {
            (self.life / self.max_life).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Common burst presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Burst {
    /// Projectile impact on an enemy
    Impact,
    /// Projectile impact on a boss
    BossImpact,
    /// Enemy destroyed
    Explosion,
    /// Boss destroyed
    BossExplosion,
    /// Hostile hit on the player
    PlayerHit,
    /// Ship-to-ship contact
    Ram,
    /// Boss body contact
    BossRam,
}

impl Burst {
    /// (particle count, color)
    pub fn params(&self) -> (usize, u32) {
        match self {
            Burst::Impact => (5, 0xff4444),
            Burst::BossImpact => (8, 0xff4444),
            Burst::Explosion => (15, 0xffaa00),
            Burst::BossExplosion => (30, 0xffaa00),
            Burst::PlayerHit => (8, 0x4444ff),
            Burst::Ram => (10, 0xffffff),
            Burst::BossRam => (15, 0xffffff),
        }
    }
}

/// Particle accumulator
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pub particles: Vec<Particle>,
    max_particles: usize,
    rng: Pcg32,
}

impl ParticleSystem {
    pub fn new(seed: u64, max_particles: usize) -> Self {
        Self {
            particles: Vec::new(),
            max_particles,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn set_max_particles(&mut self, max: usize) {
        self.max_particles = max;
        self.evict_oldest();
    }

    /// Drop the oldest particles beyond the cap
    fn evict_oldest(&mut self) {
        let excess = self.particles.len().saturating_sub(self.max_particles);
        self.particles.drain(..excess);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Emit a preset burst
    pub fn burst(&mut self, at: Vec2, burst: Burst) {
        let (count, color) = burst.params();
        self.explode(at, color, count);
    }

    /// Radial burst of `count` particles
    pub fn explode(&mut self, at: Vec2, color: u32, count: usize) {
        if self.max_particles == 0 {
            return;
        }
        self.particles.reserve(count);
        for i in 0..count {
            let angle = std::f32::consts::TAU * i as f32 / count as f32
                + self.rng.random::<f32>() * 0.5;
            let speed = 100.0 + self.rng.random::<f32>() * 200.0;
            let life = 1000.0 + self.rng.random::<f32>() * 1000.0;
            self.particles.push(Particle {
                pos: at,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                color,
                life,
                max_life: life,
                size: 2.0 + self.rng.random::<f32>() * 4.0,
            });
        }
        self.evict_oldest();
    }

    /// Integrate, apply gravity and damping, drop dead particles
    pub fn update(&mut self, dt: f32) {
        let secs = dt / 1000.0;
        for p in &mut self.particles {
            p.pos += p.vel * secs;
            p.life -= dt;
            p.vel.y += PARTICLE_GRAVITY * secs;
            p.vel *= PARTICLE_DAMPING;
        }
        self.particles.retain(|p| p.life > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_counts() {
        let mut ps = ParticleSystem::new(1, MAX_PARTICLES);
        ps.burst(Vec2::ZERO, Burst::Explosion);
        assert_eq!(ps.len(), 15);
        ps.burst(Vec2::ZERO, Burst::BossExplosion);
        assert_eq!(ps.len(), 45);
    }

    #[test]
    fn test_particles_die_out() {
        let mut ps = ParticleSystem::new(1, MAX_PARTICLES);
        ps.burst(Vec2::new(100.0, 100.0), Burst::Impact);
        ps.update(500.0);
        assert_eq!(ps.len(), 5);
        assert!(ps.particles.iter().all(|p| p.alpha() < 1.0));
        ps.update(2000.0);
        assert!(ps.is_empty());
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut ps = ParticleSystem::new(3, 10);
        ps.explode(Vec2::ZERO, 0x111111, 8);
        ps.explode(Vec2::ZERO, 0x222222, 8);
        assert_eq!(ps.len(), 10);
        assert_eq!(ps.particles.iter().filter(|p| p.color == 0x222222).count(), 8);

        ps.set_max_particles(4);
        assert_eq!(ps.len(), 4);
    }

    #[test]
    fn test_burst_larger_than_cap_keeps_newest() {
        let mut ps = ParticleSystem::new(4, 10);
        ps.explode(Vec2::ZERO, 0x111111, 5);
        ps.explode(Vec2::ZERO, 0x222222, 25);
        assert_eq!(ps.len(), 10);
        assert!(ps.particles.iter().all(|p| p.color == 0x222222));

        // Same draws as an uncapped system: the tail of the burst survives
        let mut uncapped = ParticleSystem::new(4, 100);
        uncapped.explode(Vec2::ZERO, 0x111111, 5);
        uncapped.explode(Vec2::ZERO, 0x222222, 25);
        let tail = &uncapped.particles[20..];
        for (a, b) in ps.particles.iter().zip(tail) {
            assert_eq!(a.vel, b.vel);
            assert_eq!(a.life, b.life);
        }
    }

    #[test]
    fn test_disabled_emits_nothing() {
        let mut ps = ParticleSystem::new(3, 0);
        ps.burst(Vec2::ZERO, Burst::Ram);
        assert!(ps.is_empty());
    }
}

use std::collections::VecDeque;
use std::f32::consts::TAU;

use rand::{Rng, rngs::StdRng};

use crate::{
    config,
    types::{ColorId, Particle, ParticleKind, Vec2},
};

const SMOKE_GROWTH: f32 = 2.4;
const SMOKE_DRAG: f32 = 0.93;
const SPARK_FADE_KNEE: f32 = 0.3;
const SPARK_FADE_FACTOR: f32 = 2.0;

/// One `spawn` call's worth of particles. Speed and lifetime are bases; each
/// particle randomizes within 50–100% / 70–100% of them.
pub struct SpawnBatch<'a> {
    pub count: usize,
    pub origin: Vec2,
    pub speed: f32,
    pub life: f32,
    pub palette: &'a [ColorId],
    pub size: f32,
    pub gravity: f32,
    pub angle_spread: f32,
    pub direction: f32,
    pub kind: ParticleKind,
}

/// Bounded FIFO pool of short-lived visual particles. The budget is a hard
/// ceiling: inserting at capacity evicts the oldest particle first, and
/// shrinking the budget truncates from the oldest end.
pub struct ParticleSystem {
    pool: VecDeque<Particle>,
    budget: usize,
}

impl ParticleSystem {
    pub fn new(budget: usize) -> Self {
        Self {
            pool: VecDeque::with_capacity(budget),
            budget,
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.pool.iter()
    }

    pub fn snapshot(&self, out: &mut Vec<Particle>) {
        out.clear();
        out.extend(self.pool.iter().copied());
    }

    pub fn set_budget(&mut self, budget: usize) {
        self.budget = budget;
        while self.pool.len() > budget {
            self.pool.pop_front();
        }
    }

    pub fn spawn(&mut self, batch: &SpawnBatch, rng: &mut StdRng) {
        if self.budget == 0 {
            return;
        }
        for _ in 0..batch.count {
            if self.pool.len() >= self.budget {
                self.pool.pop_front();
            }
            let angle = if batch.angle_spread > 0.0 {
                let half = (batch.angle_spread * 0.5).min(TAU);
                batch.direction + rng.gen_range(-half..half)
            } else {
                batch.direction
            };
            let speed = batch.speed * rng.gen_range(0.5..1.0);
            let life = (batch.life * rng.gen_range(0.7..1.0)).max(0.01);
            let color = if batch.palette.is_empty() {
                ColorId::White
            } else {
                batch.palette[rng.gen_range(0..batch.palette.len())]
            };
            self.pool.push_back(Particle {
                pos: batch.origin,
                vel: Vec2::from_angle(angle) * speed,
                life,
                max_life: life,
                size: batch.size,
                gravity: batch.gravity,
                color,
                kind: batch.kind,
            });
        }
    }

    /// Advance kinematics and lifetimes by `dt` normalized frames, reaping
    /// expired particles.
    pub fn update(&mut self, dt: f32) {
        let secs = dt * config::FRAME_SECS;
        for particle in &mut self.pool {
            particle.pos += particle.vel * secs;
            particle.vel.y += particle.gravity * secs;
            let mut burn = secs;
            match particle.kind {
                ParticleKind::Spark => {
                    if particle.alpha() < SPARK_FADE_KNEE {
                        burn *= SPARK_FADE_FACTOR;
                    }
                }
                ParticleKind::Smoke => {
                    particle.size += SMOKE_GROWTH * secs;
                    particle.vel = particle.vel * SMOKE_DRAG.powf(dt);
                }
                ParticleKind::Debris => {}
            }
            particle.life -= burn;
        }
        self.pool.retain(|p| p.life > 0.0);
    }
}

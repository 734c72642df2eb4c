use rand::{Rng, rngs::StdRng};

use crate::{
    config,
    config::Tuning,
    core::collision::are_colliding,
    core::particles::{ParticleSystem, SpawnBatch},
    types::{Body, BodyKind, ColorId, ParticleKind},
};

const ANTICIPATION_CHANCE: f32 = 0.08;
const ANTICIPATION_PALETTE: [ColorId; 2] = [ColorId::Cyan, ColorId::White];

pub fn add_glow(body: &mut Body, amount: f32, max_glow: f32) {
    body.glow = (body.glow + amount).min(max_glow.min(1.0));
}

/// Fade every body's glow by the configured factor, snapping to zero below
/// the epsilon so faded bodies stop paying the multiply.
pub fn decay(bodies: &mut [Body], tuning: &Tuning, dt: f32) {
    let factor = tuning.glow_decay.powf(dt);
    for body in bodies {
        if body.glow > config::GLOW_EPSILON {
            body.glow *= factor;
        } else {
            body.glow = 0.0;
        }
    }
}

fn proximity_candidate(body: &Body) -> bool {
    matches!(body.kind, BodyKind::Moon | BodyKind::Meteorite)
}

/// Anticipatory brightening of moons/meteorites drifting toward each other,
/// quadratic in closeness, with the occasional tiny particle at the midpoint.
/// Orbital state is never touched here.
pub fn apply_proximity(
    bodies: &mut [Body],
    particles: &mut ParticleSystem,
    tuning: &Tuning,
    rng: &mut StdRng,
) {
    if tuning.proximity_glow_distance <= 0.0 {
        return;
    }
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (left, right) = bodies.split_at_mut(j);
            let a = &mut left[i];
            let b = &mut right[0];
            if !proximity_candidate(a) || !proximity_candidate(b) {
                continue;
            }
            if a.parent.is_some() && a.parent == b.parent {
                continue;
            }
            // Actual contact belongs to the resolver, not here.
            if are_colliding(a, b) {
                continue;
            }
            let gap = (b.pos - a.pos).length() - (a.radius + b.radius);
            if gap <= 0.0 || gap >= tuning.proximity_glow_distance {
                continue;
            }
            let closeness = 1.0 - gap / tuning.proximity_glow_distance;
            let amount = tuning.proximity_glow_intensity * closeness * closeness;
            add_glow(a, amount, tuning.max_glow);
            add_glow(b, amount, tuning.max_glow);
            if rng.gen_range(0.0..1.0f32) < ANTICIPATION_CHANCE * closeness {
                let midpoint = a.pos + (b.pos - a.pos) * 0.5;
                particles.spawn(
                    &SpawnBatch {
                        count: 1,
                        origin: midpoint,
                        speed: 12.0,
                        life: 0.3,
                        palette: &ANTICIPATION_PALETTE,
                        size: 0.8,
                        gravity: 0.0,
                        angle_spread: std::f32::consts::TAU,
                        direction: 0.0,
                        kind: ParticleKind::Spark,
                    },
                    rng,
                );
            }
        }
    }
}

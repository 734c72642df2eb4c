use std::f32::consts::TAU;
use std::time::Duration;

use rand::rngs::StdRng;

use crate::{
    config,
    config::Tuning,
    core::{
        collision::CollisionEvent,
        glow,
        particles::{ParticleSystem, SpawnBatch},
        shake::CameraShake,
    },
    types::{Body, ColorId, ParticleKind},
};

const SPARK_PALETTE: [ColorId; 3] = [ColorId::Spark, ColorId::Yellow, ColorId::White];
const EMBER_PALETTE: [ColorId; 3] = [ColorId::Ember, ColorId::Red, ColorId::Yellow];
const SMOKE_PALETTE: [ColorId; 2] = [ColorId::Smoke, ColorId::Gray];
const DEBRIS_PALETTE: [ColorId; 2] = [ColorId::Gray, ColorId::White];

const GRAZING_SPARKS: usize = 6;
const GRAZING_SMOKE: usize = 3;
const GRAZING_GLOW: f32 = 0.12;
const SHAKE_STRENGTH_FLOOR: f32 = 0.3;

/// Turn resolver output into visuals. Pure side effects: orbital state is
/// never touched here.
pub fn trigger_collision_effects(
    events: &[CollisionEvent],
    bodies: &mut [Body],
    particles: &mut ParticleSystem,
    shake: &mut CameraShake,
    tuning: &Tuning,
    rng: &mut StdRng,
) {
    for event in events {
        let strength = (event.impact_speed / config::IMPACT_SPEED_NORM).min(1.0);
        let glow_amount;
        if event.impact_speed < tuning.grazing_speed_threshold {
            // Grazing contact: a fixed, dim little puff.
            particles.spawn(
                &SpawnBatch {
                    count: GRAZING_SPARKS,
                    origin: event.point,
                    speed: 45.0,
                    life: 0.45,
                    palette: &SPARK_PALETTE,
                    size: 1.0,
                    gravity: 0.0,
                    angle_spread: TAU,
                    direction: 0.0,
                    kind: ParticleKind::Spark,
                },
                rng,
            );
            particles.spawn(
                &SpawnBatch {
                    count: GRAZING_SMOKE,
                    origin: event.point,
                    speed: 18.0,
                    life: 0.8,
                    palette: &SMOKE_PALETTE,
                    size: 1.4,
                    gravity: -6.0,
                    angle_spread: TAU,
                    direction: 0.0,
                    kind: ParticleKind::Smoke,
                },
                rng,
            );
            glow_amount = GRAZING_GLOW;
        } else {
            let sparks = 8 + (strength * 22.0) as usize;
            let smoke = 4 + (strength * 10.0) as usize;
            let debris = (strength * 6.0) as usize;
            let palette: &[ColorId] = if strength > 0.5 {
                &EMBER_PALETTE
            } else {
                &SPARK_PALETTE
            };
            particles.spawn(
                &SpawnBatch {
                    count: sparks,
                    origin: event.point,
                    speed: 120.0 + 480.0 * strength,
                    life: 0.5 + 0.7 * strength,
                    palette,
                    size: 1.0 + strength,
                    gravity: 0.0,
                    angle_spread: TAU,
                    direction: 0.0,
                    kind: ParticleKind::Spark,
                },
                rng,
            );
            particles.spawn(
                &SpawnBatch {
                    count: smoke,
                    origin: event.point,
                    speed: 30.0 + 70.0 * strength,
                    life: 0.9 + 0.8 * strength,
                    palette: &SMOKE_PALETTE,
                    size: 1.6 + strength,
                    gravity: -10.0,
                    angle_spread: TAU,
                    direction: 0.0,
                    kind: ParticleKind::Smoke,
                },
                rng,
            );
            if debris > 0 {
                particles.spawn(
                    &SpawnBatch {
                        count: debris,
                        origin: event.point,
                        speed: 90.0 + 200.0 * strength,
                        life: 0.7 + 0.5 * strength,
                        palette: &DEBRIS_PALETTE,
                        size: 1.2,
                        gravity: 45.0,
                        angle_spread: TAU,
                        direction: 0.0,
                        kind: ParticleKind::Debris,
                    },
                    rng,
                );
            }
            glow_amount = 0.3 + 0.6 * strength;
            if strength > SHAKE_STRENGTH_FLOOR {
                shake.trigger(
                    strength * 6.0,
                    Duration::from_millis((150.0 + 250.0 * strength) as u64),
                );
            }
            // Escalation tier for cataclysmic impacts. Disabled in the
            // current configuration: supernova_impact_speed is zero.
            if tuning.supernova_impact_speed > 0.0
                && event.impact_speed >= tuning.supernova_impact_speed
            {
                particles.spawn(
                    &SpawnBatch {
                        count: 60,
                        origin: event.point,
                        speed: 700.0,
                        life: 1.6,
                        palette: &EMBER_PALETTE,
                        size: 2.5,
                        gravity: 0.0,
                        angle_spread: TAU,
                        direction: 0.0,
                        kind: ParticleKind::Spark,
                    },
                    rng,
                );
                shake.trigger(12.0, Duration::from_millis(600));
            }
        }
        if let Some(body) = bodies.iter_mut().find(|b| b.id == event.a) {
            glow::add_glow(body, glow_amount, tuning.max_glow);
        }
        if let Some(body) = bodies.iter_mut().find(|b| b.id == event.b) {
            glow::add_glow(body, glow_amount, tuning.max_glow);
        }
    }
}

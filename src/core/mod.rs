use std::f32::consts::TAU;
use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config,
    config::Tuning,
    types::{
        Body, BodyId, BodyKind, BodySnapshot, FieldBounds, LABEL_MAX_DRAW, OrbitState, Particle,
        TRAIL_LEN, Vec2, WorldStats,
    },
};

pub mod collision;
pub mod effects;
pub mod glow;
pub mod orbit;
pub mod particles;
pub mod rail;
pub mod shake;

pub use collision::{CollisionEvent, are_colliding};
pub use particles::{ParticleSystem, SpawnBatch};
pub use shake::CameraShake;

/// Seed table: chain ticker, market cap (M$), tokens on that chain.
const CHAINS: [(&str, f32, &[(&str, f32)]); 5] = [
    (
        "ETH",
        445_000.0,
        &[
            ("USDC", 72_000.0),
            ("LINK", 9_800.0),
            ("UNI", 4_100.0),
            ("AAVE", 2_400.0),
        ],
    ),
    (
        "SOL",
        88_000.0,
        &[("JUP", 1_400.0), ("BONK", 1_100.0), ("RAY", 620.0)],
    ),
    ("BASE", 12_000.0, &[("AERO", 480.0), ("BRETT", 310.0)]),
    ("ARB", 9_500.0, &[("PENDLE", 530.0), ("GMX", 210.0)]),
    ("OP", 7_400.0, &[("VELO", 95.0)]),
];

pub struct World {
    pub bodies: Vec<Body>,
    pub tuning: Tuning,
    particles: ParticleSystem,
    shake: CameraShake,
    rng: StdRng,
    next_id: BodyId,
    collisions_total: u64,
    meteorite_count: u32,
}

impl World {
    pub fn new(tuning: Tuning) -> Self {
        Self::with_rng(tuning, StdRng::from_entropy())
    }

    fn with_rng(tuning: Tuning, rng: StdRng) -> Self {
        let budget = tuning.max_particles;
        let mut world = Self {
            bodies: Vec::new(),
            tuning,
            particles: ParticleSystem::new(budget),
            shake: CameraShake::new(),
            rng,
            next_id: 1,
            collisions_total: 0,
            meteorite_count: 0,
        };
        world.seed_market();
        world
    }

    /// One simulation frame. `dt` is caller-normalized: ≈1.0 per 60 Hz step.
    /// The order is load-bearing: collisions see fresh rail positions, and
    /// glow decays only after this frame's additions.
    pub fn tick(&mut self, dt: f32) {
        orbit::advance(&mut self.bodies, dt, &self.tuning);
        let events = collision::resolve_all(&mut self.bodies, &self.tuning, &mut self.rng);
        self.collisions_total += events.len() as u64;
        effects::trigger_collision_effects(
            &events,
            &mut self.bodies,
            &mut self.particles,
            &mut self.shake,
            &self.tuning,
            &mut self.rng,
        );
        glow::apply_proximity(
            &mut self.bodies,
            &mut self.particles,
            &self.tuning,
            &mut self.rng,
        );
        self.particles.update(dt);
        glow::decay(&mut self.bodies, &self.tuning, dt);
    }

    /// Throw a meteorite in from beyond the outer ring, aimed to sweep
    /// inward through the planet rings.
    pub fn spawn_meteorite(&mut self) {
        let id = self.next_id();
        self.meteorite_count += 1;
        let outer = config::PLANET_RING_BASE
            + (CHAINS.len().saturating_sub(1)) as f32 * config::PLANET_RING_STEP;
        let orbit_radius = outer + 140.0;
        let angle = self.rng.gen_range(0.0..TAU);
        let spin = if self.rng.gen_range(0.0..1.0f32) < 0.5 {
            -1.0
        } else {
            1.0
        };
        let pos = Vec2::from_angle(angle) * orbit_radius;
        self.bodies.push(Body {
            id,
            kind: BodyKind::Meteorite,
            parent: None,
            label: format!("*{}", self.meteorite_count),
            pos,
            vel: Vec2::ZERO,
            radius: config::METEORITE_RADIUS,
            mass: config::METEORITE_MASS,
            orbit_radius,
            orbit_angle: angle,
            angular_velocity: config::METEORITE_ANGULAR_VELOCITY * spin,
            base_orbit_angle: angle,
            angle_offset: 0.0,
            slot_span: std::f32::consts::PI,
            target_orbit_radius: Some(self.rng.gen_range(170.0..260.0)),
            field_bounds: None,
            orbit_state: OrbitState::OnRail,
            slot_release_timer: 0.0,
            glow: 0.0,
            trail: [pos; TRAIL_LEN],
            trail_head: 0,
            trail_len: 1,
        });
    }

    pub fn set_particle_budget(&mut self, budget: usize) {
        self.particles.set_budget(budget);
    }

    pub fn particle_budget(&self) -> usize {
        self.particles.budget()
    }

    pub fn trigger_shake(&mut self, intensity: f32, duration: Duration) {
        self.shake.trigger(intensity, duration);
    }

    pub fn shake_offset(&mut self) -> Vec2 {
        self.shake.offset()
    }

    pub fn particles_snapshot(&self, out: &mut Vec<Particle>) {
        self.particles.snapshot(out);
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn snapshot(&self, out: &mut Vec<BodySnapshot>) {
        out.clear();
        let sun_pos = self
            .bodies
            .iter()
            .find(|b| b.is_sun())
            .map(|b| b.pos)
            .unwrap_or(Vec2::ZERO);
        for body in &self.bodies {
            let center = match body.kind {
                BodyKind::Sun => body.pos,
                BodyKind::Planet | BodyKind::Meteorite => sun_pos,
                BodyKind::Moon => body
                    .parent
                    .and_then(|id| self.bodies.iter().find(|b| b.id == id))
                    .map(|b| b.pos)
                    .unwrap_or(sun_pos),
            };
            let mut label = [' '; LABEL_MAX_DRAW];
            let mut label_len = 0;
            for (idx, ch) in body.label.chars().take(LABEL_MAX_DRAW).enumerate() {
                label[idx] = ch;
                label_len = idx + 1;
            }
            out.push(BodySnapshot {
                id: body.id,
                kind: body.kind,
                label,
                label_len,
                pos: body.pos,
                center,
                radius: body.radius,
                orbit_radius: body.orbit_radius,
                mass: body.mass,
                glow: body.glow,
                free: !body.orbit_state.is_on_rail(),
                trail: body.trail,
                trail_head: body.trail_head,
                trail_len: body.trail_len,
            });
        }
    }

    pub fn stats(&self) -> WorldStats {
        let mut stats = WorldStats {
            particle_count: self.particles.len(),
            particle_budget: self.particles.budget(),
            collisions_total: self.collisions_total,
            ..WorldStats::default()
        };
        for body in &self.bodies {
            match body.kind {
                BodyKind::Sun => {}
                BodyKind::Planet => stats.planet_count += 1,
                BodyKind::Moon => stats.moon_count += 1,
                BodyKind::Meteorite => stats.meteorite_count += 1,
            }
            if !body.orbit_state.is_on_rail() {
                stats.free_bodies += 1;
            }
        }
        stats
    }

    fn next_id(&mut self) -> BodyId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn seed_market(&mut self) {
        let sun_id = self.next_id();
        self.bodies.push(Body {
            id: sun_id,
            kind: BodyKind::Sun,
            parent: None,
            label: "SUN".to_string(),
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: config::SUN_RADIUS,
            mass: config::SUN_MASS,
            orbit_radius: 0.0,
            orbit_angle: 0.0,
            angular_velocity: 0.0,
            base_orbit_angle: 0.0,
            angle_offset: 0.0,
            slot_span: 0.0,
            target_orbit_radius: None,
            field_bounds: None,
            orbit_state: OrbitState::OnRail,
            slot_release_timer: 0.0,
            glow: 0.0,
            trail: [Vec2::ZERO; TRAIL_LEN],
            trail_head: 0,
            trail_len: 0,
        });

        for (ring, (ticker, cap, tokens)) in CHAINS.iter().enumerate() {
            let mass = config::market_cap_to_mass(*cap);
            let radius = config::planet_radius(mass);
            let orbit_radius = config::PLANET_RING_BASE + ring as f32 * config::PLANET_RING_STEP;
            let angle = self.rng.gen_range(0.0..TAU);
            let planet_id = self.next_id();
            let pos = Vec2::from_angle(angle) * orbit_radius;
            self.bodies.push(Body {
                id: planet_id,
                kind: BodyKind::Planet,
                parent: None,
                label: ticker.to_string(),
                pos,
                vel: Vec2::ZERO,
                radius,
                mass,
                orbit_radius,
                orbit_angle: angle,
                angular_velocity: 1.3 / orbit_radius,
                base_orbit_angle: angle,
                angle_offset: 0.0,
                slot_span: 0.6,
                target_orbit_radius: None,
                field_bounds: None,
                orbit_state: OrbitState::OnRail,
                slot_release_timer: 0.0,
                glow: 0.0,
                trail: [pos; TRAIL_LEN],
                trail_head: 0,
                trail_len: 1,
            });

            let field = FieldBounds {
                inner: radius + config::MOON_RING_BASE * 0.6,
                outer: radius
                    + config::MOON_RING_BASE
                    + tokens.len() as f32 * config::MOON_RING_STEP
                    + 24.0,
            };
            for (slot, (token, token_cap)) in tokens.iter().enumerate() {
                let moon_mass = config::market_cap_to_mass(*token_cap) * 0.5;
                let moon_orbit =
                    radius + config::MOON_RING_BASE + slot as f32 * config::MOON_RING_STEP;
                let moon_angle = self.rng.gen_range(0.0..TAU);
                let moon_id = self.next_id();
                let moon_pos = pos + Vec2::from_angle(moon_angle) * moon_orbit;
                self.bodies.push(Body {
                    id: moon_id,
                    kind: BodyKind::Moon,
                    parent: Some(planet_id),
                    label: token.to_string(),
                    pos: moon_pos,
                    vel: Vec2::ZERO,
                    radius: config::moon_radius(moon_mass),
                    mass: moon_mass,
                    orbit_radius: moon_orbit,
                    orbit_angle: moon_angle,
                    angular_velocity: 0.035 - 0.003 * slot as f32,
                    base_orbit_angle: moon_angle,
                    angle_offset: 0.0,
                    slot_span: 0.5,
                    target_orbit_radius: None,
                    field_bounds: Some(field),
                    orbit_state: OrbitState::OnRail,
                    slot_release_timer: 0.0,
                    glow: 0.0,
                    trail: [moon_pos; TRAIL_LEN],
                    trail_head: 0,
                    trail_len: 1,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_world() -> World {
        World::with_rng(Tuning::default(), StdRng::seed_from_u64(1234))
    }

    fn own_moon_pair(a: &Body, b: &Body) -> bool {
        (a.kind == BodyKind::Planet && b.parent == Some(a.id))
            || (b.kind == BodyKind::Planet && a.parent == Some(b.id))
    }

    mod seeding {
        use super::*;

        #[test]
        fn seeds_one_sun_with_planets_and_moons() {
            let world = seeded_world();
            let stats = world.stats();
            assert_eq!(
                world.bodies.iter().filter(|b| b.is_sun()).count(),
                1,
            );
            assert_eq!(stats.planet_count, CHAINS.len());
            let expected_moons: usize = CHAINS.iter().map(|(_, _, t)| t.len()).sum();
            assert_eq!(stats.moon_count, expected_moons);
        }

        #[test]
        fn every_moon_parent_resolves_to_a_planet() {
            let world = seeded_world();
            for body in world.bodies.iter().filter(|b| b.kind == BodyKind::Moon) {
                let parent = body.parent.expect("moon has a parent");
                assert!(
                    world
                        .bodies
                        .iter()
                        .any(|b| b.id == parent && b.kind == BodyKind::Planet)
                );
            }
        }

        #[test]
        fn bigger_caps_seed_heavier_planets() {
            let world = seeded_world();
            let eth = world.bodies.iter().find(|b| b.label == "ETH").unwrap();
            let op = world.bodies.iter().find(|b| b.label == "OP").unwrap();
            assert!(eth.mass > op.mass);
        }

        #[test]
        fn moons_start_inside_their_field_bounds() {
            let world = seeded_world();
            for body in world.bodies.iter().filter(|b| b.kind == BodyKind::Moon) {
                let bounds = body.field_bounds.expect("moon has field bounds");
                assert!(body.orbit_radius >= bounds.inner);
                assert!(body.orbit_radius <= bounds.outer);
            }
        }
    }

    mod long_run_invariants {
        use super::*;

        #[test]
        fn engine_invariants_hold_over_many_frames() {
            let mut world = seeded_world();
            world.spawn_meteorite();
            world.spawn_meteorite();
            for frame in 0..600 {
                world.tick(1.0);
                let budget = world.particle_budget();
                assert!(
                    world.particle_count() <= budget,
                    "particle cap violated at frame {frame}"
                );
                for body in &world.bodies {
                    assert!(
                        (0.0..=1.0).contains(&body.glow),
                        "glow out of bounds at frame {frame}"
                    );
                    let bound = body.slot_span * crate::config::SLOT_CLAMP_RELEASED;
                    assert!(
                        body.angle_offset.abs() <= bound + 1e-4,
                        "slot bound violated at frame {frame}"
                    );
                    if body.slot_release_timer <= 0.0 {
                        let tight = body.slot_span * crate::config::SLOT_CLAMP_BASE;
                        assert!(body.angle_offset.abs() <= tight + 1e-4);
                    }
                    assert!(body.pos.x.is_finite() && body.pos.y.is_finite());
                    if let Some(target) = body.target_orbit_radius {
                        if let Some(bounds) = body.field_bounds {
                            assert!(target >= bounds.inner - 1e-3);
                            assert!(target <= bounds.outer + 1e-3);
                        }
                    }
                }
            }
        }

        #[test]
        fn no_pair_stays_overlapped_across_frames() {
            // A single resolver pass can leave a chain pile-up slightly
            // overlapped for a frame; what must never happen is the same
            // pair staying interpenetrated tick after tick.
            let mut world = seeded_world();
            world.spawn_meteorite();
            world.spawn_meteorite();
            let mut streaks: std::collections::HashMap<(BodyId, BodyId), u32> =
                std::collections::HashMap::new();
            for frame in 0..300 {
                world.tick(1.0);
                for i in 0..world.bodies.len() {
                    for j in (i + 1)..world.bodies.len() {
                        let a = &world.bodies[i];
                        let b = &world.bodies[j];
                        if a.is_sun() || b.is_sun() || own_moon_pair(a, b) {
                            continue;
                        }
                        let key = (a.id.min(b.id), a.id.max(b.id));
                        let dist = (b.pos - a.pos).length();
                        if dist < a.radius + b.radius - 1e-2 {
                            let streak = streaks.entry(key).or_insert(0);
                            *streak += 1;
                            assert!(
                                *streak <= 3,
                                "{} and {} interpenetrated for {streak} frames at frame {frame}",
                                a.label,
                                b.label
                            );
                        } else {
                            streaks.remove(&key);
                        }
                    }
                }
            }
        }

        #[test]
        fn glow_added_this_frame_survives_the_same_frame() {
            // Decay runs after effects: a fresh impact must still be visible.
            let mut world = seeded_world();
            world.spawn_meteorite();
            world.spawn_meteorite();
            for _ in 0..1200 {
                world.tick(1.0);
                if world.stats().collisions_total > 0 {
                    break;
                }
            }
            if world.stats().collisions_total > 0 {
                assert!(world.bodies.iter().any(|b| b.glow > 0.0));
            }
        }
    }

    mod meteorites {
        use super::*;

        #[test]
        fn spawn_adds_a_body_on_an_inward_rail() {
            let mut world = seeded_world();
            let before = world.bodies.len();
            world.spawn_meteorite();
            assert_eq!(world.bodies.len(), before + 1);
            let meteor = world.bodies.last().unwrap();
            assert_eq!(meteor.kind, BodyKind::Meteorite);
            let target = meteor.target_orbit_radius.expect("meteorite sweeps inward");
            assert!(target < meteor.orbit_radius);
        }
    }

    mod budget_controls {
        use super::*;

        #[test]
        fn set_particle_budget_truncates_immediately() {
            let mut world = seeded_world();
            world.spawn_meteorite();
            world.spawn_meteorite();
            // Run until impacts have filled some of the pool.
            for _ in 0..2400 {
                world.tick(1.0);
                if world.particle_count() > 20 {
                    break;
                }
            }
            world.set_particle_budget(10);
            assert!(world.particle_count() <= 10);
            assert_eq!(world.particle_budget(), 10);
        }
    }

    mod snapshots {
        use super::*;

        #[test]
        fn snapshot_covers_every_body() {
            let world = seeded_world();
            let mut out = Vec::new();
            world.snapshot(&mut out);
            assert_eq!(out.len(), world.bodies.len());
        }

        #[test]
        fn moon_snapshot_center_is_its_planet() {
            let world = seeded_world();
            let mut out = Vec::new();
            world.snapshot(&mut out);
            for (snapshot, body) in out.iter().zip(world.bodies.iter()) {
                if body.kind == BodyKind::Moon {
                    let parent = world
                        .bodies
                        .iter()
                        .find(|b| Some(b.id) == body.parent)
                        .unwrap();
                    assert_eq!(snapshot.center, parent.pos);
                }
            }
        }

        #[test]
        fn labels_are_truncated_to_the_draw_buffer() {
            let world = seeded_world();
            let mut out = Vec::new();
            world.snapshot(&mut out);
            for snapshot in &out {
                assert!(snapshot.label_len <= LABEL_MAX_DRAW);
            }
        }
    }
}

use std::collections::HashSet;

use rand::{Rng, rngs::StdRng};

use crate::{
    config,
    config::Tuning,
    core::{glow, rail},
    types::{Body, BodyId, BodyKind, Vec2, wrap_angle},
};

const PLANET_MOON_GLOW: f32 = 0.05;
const FRICTION_CAP_RATIO: f32 = 0.5;

/// One resolved impact, reported to the effects layer.
#[derive(Clone, Copy, Debug)]
pub struct CollisionEvent {
    pub a: BodyId,
    pub b: BodyId,
    /// Contact point on the surface of `a` toward `b`.
    pub point: Vec2,
    /// Magnitude of the relative velocity at impact.
    pub impact_speed: f32,
}

/// Cheap overlap pre-check on physical radii.
pub fn are_colliding(a: &Body, b: &Body) -> bool {
    (b.pos - a.pos).length() < a.radius + b.radius
}

/// Walk every unordered pair once and resolve overlaps. Plain O(n²): the body
/// counts here never justify a spatial index.
pub fn resolve_all(bodies: &mut [Body], tuning: &Tuning, rng: &mut StdRng) -> Vec<CollisionEvent> {
    let planet_ids: HashSet<BodyId> = bodies
        .iter()
        .filter(|b| b.kind == BodyKind::Planet)
        .map(|b| b.id)
        .collect();
    let orphan = |body: &Body| {
        body.kind == BodyKind::Moon
            && !body
                .parent
                .map(|id| planet_ids.contains(&id))
                .unwrap_or(false)
    };

    let mut events = Vec::new();
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (left, right) = bodies.split_at_mut(j);
            let a = &mut left[i];
            let b = &mut right[0];

            // An orphaned moon sits the frame out; the check reruns next tick.
            if orphan(a) || orphan(b) {
                continue;
            }
            if a.is_sun() {
                resolve_sun_pair(a, b, tuning);
                continue;
            }
            if b.is_sun() {
                resolve_sun_pair(b, a, tuning);
                continue;
            }
            if own_moon_pair(a, b) {
                buffer_glow(a, b, tuning);
                continue;
            }
            if let Some(event) = resolve_pair(a, b, tuning, rng) {
                events.push(event);
            }
        }
    }
    events
}

/// The sun takes no impulse response. Bodies inside its exclusion radius are
/// placed back on its edge with a small outward kick and a touch of glow;
/// their rail state is untouched.
fn resolve_sun_pair(sun: &Body, other: &mut Body, tuning: &Tuning) {
    let delta = other.pos - sun.pos;
    let dist = delta.length().max(0.001);
    let min_dist = sun.radius + other.radius + config::SUN_EXCLUSION_MARGIN;
    if dist >= min_dist {
        return;
    }
    let normal = delta * (1.0 / dist);
    other.pos = sun.pos + normal * min_dist;
    other.vel += normal * config::SUN_KICK_SPEED;
    glow::add_glow(other, config::SUN_GLOW_ON_CONTACT, tuning.max_glow);
}

fn own_moon_pair(a: &Body, b: &Body) -> bool {
    (a.kind == BodyKind::Planet && b.kind == BodyKind::Moon && b.parent == Some(a.id))
        || (b.kind == BodyKind::Planet && a.kind == BodyKind::Moon && a.parent == Some(b.id))
}

/// A planet and its own moon never exchange physics; the rail keeps the moon
/// clear. Inside the buffer zone both just brighten.
fn buffer_glow(a: &mut Body, b: &mut Body, tuning: &Tuning) {
    let dist = (b.pos - a.pos).length();
    if dist < a.radius + b.radius + config::PLANET_MOON_BUFFER {
        glow::add_glow(a, PLANET_MOON_GLOW, tuning.max_glow);
        glow::add_glow(b, PLANET_MOON_GLOW, tuning.max_glow);
    }
}

fn resolve_pair(
    a: &mut Body,
    b: &mut Body,
    tuning: &Tuning,
    rng: &mut StdRng,
) -> Option<CollisionEvent> {
    let delta = b.pos - a.pos;
    let contact = a.radius + b.radius + tuning.min_separation;
    if delta.length_sq() >= contact * contact {
        return None;
    }
    let dist = delta.length().max(0.001);
    let normal = delta * (1.0 / dist);
    let overlap = contact - dist;

    // Sub-linear mass weighting: the lighter body takes the larger share of
    // the response, but a heavy one still moves.
    let eff_a = a.mass.max(0.001).powf(tuning.mass_exponent);
    let eff_b = b.mass.max(0.001).powf(tuning.mass_exponent);
    let share_a = eff_b / (eff_a + eff_b);
    let share_b = eff_a / (eff_a + eff_b);

    // Slide both along their slots: the body ahead on its rail is pushed
    // further ahead, the one behind further behind, so displaced bodies keep
    // flowing along the orbit instead of jittering radially.
    let a_ahead = wrap_angle(a.orbit_angle - b.orbit_angle) >= 0.0;
    let (dir_a, dir_b) = if a_ahead { (1.0, -1.0) } else { (-1.0, 1.0) };
    if a.orbit_radius > 1.0 {
        rail::push_angle(a, dir_a * overlap * share_a * config::ANGULAR_PUSH / a.orbit_radius);
    }
    if b.orbit_radius > 1.0 {
        rail::push_angle(b, dir_b * overlap * share_b * config::ANGULAR_PUSH / b.orbit_radius);
    }

    // Co-orbiting moons of one planet also split radially so they stop
    // re-colliding at the same ring.
    if a.kind == BodyKind::Moon && b.kind == BodyKind::Moon && a.parent == b.parent {
        if a.mass <= b.mass {
            rail::nudge_target_radius(a, config::RADIAL_DESTACK);
            rail::nudge_target_radius(b, -config::RADIAL_DESTACK * 0.5);
        } else {
            rail::nudge_target_radius(b, config::RADIAL_DESTACK);
            rail::nudge_target_radius(a, -config::RADIAL_DESTACK * 0.5);
        }
    }

    // Positional separation: no overlap survives the frame.
    a.pos -= normal * (overlap * share_a);
    b.pos += normal * (overlap * share_b);

    // Impulse response on effective velocities, so calm on-rail bodies behave
    // as if they carry their orbital momentum.
    let va = a.effective_velocity();
    let vb = b.effective_velocity();
    a.vel = va;
    b.vel = vb;
    let rel = vb - va;
    let closing = rel.dot(normal);
    let inv_a = 1.0 / eff_a;
    let inv_b = 1.0 / eff_b;
    let inv_sum = inv_a + inv_b;
    let mut normal_impulse = 0.0;
    if closing < 0.0 {
        normal_impulse = -(1.0 + tuning.restitution) * closing / inv_sum;
        a.vel -= normal * (normal_impulse * inv_a);
        b.vel += normal * (normal_impulse * inv_b);
    }

    // Guarantee separation even at near-zero closing speed.
    let sep = overlap * config::SEPARATION_IMPULSE / inv_sum;
    a.vel -= normal * (sep * inv_a);
    b.vel += normal * (sep * inv_b);

    // Tangential friction bleeds sliding motion, capped by the normal
    // response, plus a little jitter for visual variety.
    let tangent = normal.perp();
    let rel_t = rel.dot(tangent);
    let cap = (normal_impulse + sep) * FRICTION_CAP_RATIO;
    let friction = (rel_t * tuning.tangential_friction / inv_sum).clamp(-cap, cap);
    a.vel += tangent * (friction * inv_a);
    b.vel -= tangent * (friction * inv_b);
    if tuning.tangential_jitter > 0.0 {
        a.vel += tangent * rng.gen_range(-tuning.tangential_jitter..tuning.tangential_jitter);
        b.vel += tangent * rng.gen_range(-tuning.tangential_jitter..tuning.tangential_jitter);
    }

    a.vel = a.vel.clamp_length(tuning.max_free_speed);
    b.vel = b.vel.clamp_length(tuning.max_free_speed);

    rail::enter_free_orbit(a, tuning, rng);
    rail::enter_free_orbit(b, tuning, rng);

    Some(CollisionEvent {
        a: a.id,
        b: b.id,
        point: a.pos + normal * a.radius,
        impact_speed: rel.length(),
    })
}

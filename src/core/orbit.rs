use std::collections::HashMap;

use crate::{
    config,
    config::Tuning,
    core::rail,
    types::{Body, BodyId, BodyKind, OrbitState, Vec2, wrap_angle},
};

/// Advance every body's nominal orbital state by one frame. Planets and
/// meteorites ride rails around the sun; moons ride rails around their
/// planet's fresh position, so planets integrate first.
pub fn advance(bodies: &mut [Body], dt: f32, tuning: &Tuning) {
    let secs = dt * config::FRAME_SECS;
    let sun_pos = bodies
        .iter()
        .find(|b| b.is_sun())
        .map(|b| b.pos)
        .unwrap_or(Vec2::ZERO);

    for body in bodies.iter_mut() {
        if matches!(body.kind, BodyKind::Planet | BodyKind::Meteorite) {
            integrate_one(body, sun_pos, dt, secs, tuning);
        }
    }

    let centers: HashMap<BodyId, Vec2> = bodies
        .iter()
        .filter(|b| b.kind == BodyKind::Planet)
        .map(|b| (b.id, b.pos))
        .collect();
    for body in bodies.iter_mut().filter(|b| b.kind == BodyKind::Moon) {
        // A moon with no live planet sits still; next frame may re-resolve it.
        let Some(center) = body.parent.and_then(|id| centers.get(&id).copied()) else {
            continue;
        };
        integrate_one(body, center, dt, secs, tuning);
    }

    for body in bodies.iter_mut() {
        if !body.is_sun() {
            body.record_trail();
        }
    }
}

fn integrate_one(body: &mut Body, center: Vec2, dt: f32, secs: f32, tuning: &Tuning) {
    // The slot center keeps moving regardless of flight state.
    body.base_orbit_angle = wrap_angle(body.base_orbit_angle + body.angular_velocity * dt);

    match body.orbit_state {
        OrbitState::OnRail => {
            if let Some(target) = body.target_orbit_radius {
                body.orbit_radius += (target - body.orbit_radius) * (config::RADIUS_EASE * dt).min(1.0);
            }
            body.orbit_angle = wrap_angle(body.orbit_angle + body.angular_velocity * dt);
            let diff = wrap_angle(body.target_orbit_angle() - body.orbit_angle);
            body.orbit_angle = wrap_angle(body.orbit_angle + diff * (config::ANGLE_EASE * dt).min(1.0));
            body.pos = center + Vec2::from_angle(body.orbit_angle) * body.orbit_radius;
            body.vel = Vec2::ZERO;
        }
        OrbitState::FreeOrbit {
            timer,
            duration,
            anchor_radius,
            ..
        } => {
            // Drag and the rail spring ramp up over the excursion so the
            // kick reads first and the recapture takes over late.
            let ramp = if duration > 0.0 {
                (1.0 - timer / duration).clamp(0.15, 1.0)
            } else {
                1.0
            };
            let drag = (tuning.free_orbit_damping * tuning.global_velocity_drag).powf(dt);
            body.vel = body.vel * drag;

            let rel = body.pos - center;
            let r = rel.length().max(0.001);
            let radial = rel * (1.0 / r);
            let rail_r = body.target_orbit_radius.unwrap_or(anchor_radius);
            body.vel -= radial * ((r - rail_r) * tuning.free_orbit_spring * ramp * dt);

            let spin = if body.angular_velocity < 0.0 { -1.0 } else { 1.0 };
            let tangent = radial.perp() * spin;
            body.vel += tangent * (tuning.free_orbit_orbit_assist * ramp * dt);

            body.vel = body.vel.clamp_length(tuning.max_free_speed);
            body.pos += body.vel * secs;

            // Rail fields track the flown position so the blend starts from
            // wherever the body actually ended up.
            let rel = body.pos - center;
            body.orbit_radius = rel.length();
            body.orbit_angle = rel.angle();
        }
        OrbitState::RailBlend { .. } => {
            let ease = (tuning.rail_blend_ease * dt).min(1.0);
            let rail_r = body.target_orbit_radius.unwrap_or(body.orbit_radius);
            body.orbit_radius += (rail_r - body.orbit_radius) * ease;
            body.orbit_angle = wrap_angle(body.orbit_angle + body.angular_velocity * dt);
            let diff = wrap_angle(body.target_orbit_angle() - body.orbit_angle);
            body.orbit_angle = wrap_angle(body.orbit_angle + diff * ease);
            body.pos = center + Vec2::from_angle(body.orbit_angle) * body.orbit_radius;
            body.vel = body.vel * tuning.global_velocity_drag.powf(dt);
        }
    }

    rail::step_state(body, dt, tuning);
}

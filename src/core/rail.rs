use rand::{Rng, rngs::StdRng};

use crate::{
    config,
    config::Tuning,
    types::{Body, OrbitState, Vec2},
};

/// How far past its slot half-width a body may currently wander. The clamp
/// loosens while `slot_release_timer` runs so a body mid-impact sequence is
/// not fighting the slot bound and the separation push at the same time.
pub fn slot_clamp_multiplier(body: &Body) -> f32 {
    if body.slot_release_timer > 0.0 {
        config::SLOT_CLAMP_RELEASED
    } else {
        config::SLOT_CLAMP_BASE
    }
}

/// Shift the body along its slot, keeping `angle_offset` inside the bound.
pub fn push_angle(body: &mut Body, delta: f32) {
    let bound = body.slot_span * slot_clamp_multiplier(body);
    body.angle_offset = (body.angle_offset + delta).clamp(-bound, bound);
}

/// Move the radial target, clamped into the body's field bounds when present.
pub fn nudge_target_radius(body: &mut Body, delta: f32) {
    let base = body.target_orbit_radius.unwrap_or(body.orbit_radius);
    let mut target = base + delta;
    if let Some(bounds) = body.field_bounds {
        target = bounds.clamp(target);
    }
    body.target_orbit_radius = Some(target);
}

/// Kick the body into free flight. Re-entry while already free (or blending)
/// extends the excursion: timers only ever grow from a new impact.
pub fn enter_free_orbit(body: &mut Body, tuning: &Tuning, rng: &mut StdRng) {
    let fresh = tuning.free_orbit_duration * rng.gen_range(0.75..1.25);
    body.orbit_state = match body.orbit_state {
        OrbitState::FreeOrbit {
            timer,
            duration,
            anchor_radius,
            anchor_angle,
        } => {
            let timer = timer.max(fresh);
            OrbitState::FreeOrbit {
                timer,
                duration: duration.max(timer),
                anchor_radius,
                anchor_angle,
            }
        }
        OrbitState::OnRail | OrbitState::RailBlend { .. } => {
            // The anchor doubles as the rail home the blend returns to.
            if body.target_orbit_radius.is_none() {
                let mut home = body.orbit_radius;
                if let Some(bounds) = body.field_bounds {
                    home = bounds.clamp(home);
                }
                body.target_orbit_radius = Some(home);
            }
            OrbitState::FreeOrbit {
                timer: fresh,
                duration: fresh,
                anchor_radius: body.orbit_radius,
                anchor_angle: body.orbit_angle,
            }
        }
    };
    body.slot_release_timer = body.slot_release_timer.max(tuning.slot_release_duration);
}

/// Advance timers and state transitions by one frame. Also re-applies the
/// slot clamp so the offset bound holds once a release expires.
pub fn step_state(body: &mut Body, dt: f32, tuning: &Tuning) {
    body.slot_release_timer = (body.slot_release_timer - dt).max(0.0);
    body.orbit_state = match body.orbit_state {
        OrbitState::OnRail => OrbitState::OnRail,
        OrbitState::FreeOrbit {
            timer,
            duration,
            anchor_radius,
            anchor_angle,
        } => {
            let timer = timer - dt;
            if timer <= 0.0 {
                OrbitState::RailBlend {
                    timer: tuning.rail_blend_duration,
                }
            } else {
                OrbitState::FreeOrbit {
                    timer,
                    duration,
                    anchor_radius,
                    anchor_angle,
                }
            }
        }
        OrbitState::RailBlend { timer } => {
            let timer = timer - dt;
            if timer <= 0.0 {
                body.vel = Vec2::ZERO;
                OrbitState::OnRail
            } else {
                OrbitState::RailBlend { timer }
            }
        }
    };
    let bound = body.slot_span * slot_clamp_multiplier(body);
    body.angle_offset = body.angle_offset.clamp(-bound, bound);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BodyKind, FieldBounds, TRAIL_LEN};
    use rand::SeedableRng;

    fn test_body() -> Body {
        Body {
            id: 7,
            kind: BodyKind::Moon,
            parent: Some(1),
            label: "LINK".to_string(),
            pos: Vec2::new(60.0, 0.0),
            vel: Vec2::ZERO,
            radius: 5.0,
            mass: 9.0,
            orbit_radius: 60.0,
            orbit_angle: 0.0,
            angular_velocity: 0.02,
            base_orbit_angle: 0.0,
            angle_offset: 0.0,
            slot_span: 0.4,
            target_orbit_radius: None,
            field_bounds: None,
            orbit_state: OrbitState::OnRail,
            slot_release_timer: 0.0,
            glow: 0.0,
            trail: [Vec2::ZERO; TRAIL_LEN],
            trail_head: 0,
            trail_len: 0,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    mod push_angle_fn {
        use super::*;

        #[test]
        fn accumulates_small_pushes() {
            let mut body = test_body();
            push_angle(&mut body, 0.05);
            push_angle(&mut body, 0.05);
            assert!((body.angle_offset - 0.1).abs() < 1e-6);
        }

        #[test]
        fn clamps_to_baseline_slot_bound() {
            let mut body = test_body();
            push_angle(&mut body, 10.0);
            assert!((body.angle_offset - body.slot_span * config::SLOT_CLAMP_BASE).abs() < 1e-6);
        }

        #[test]
        fn released_slot_allows_wider_offset() {
            let mut body = test_body();
            body.slot_release_timer = 10.0;
            push_angle(&mut body, 10.0);
            assert!(
                (body.angle_offset - body.slot_span * config::SLOT_CLAMP_RELEASED).abs() < 1e-6
            );
        }
    }

    mod nudge_target_radius_fn {
        use super::*;

        #[test]
        fn starts_from_current_orbit_radius() {
            let mut body = test_body();
            nudge_target_radius(&mut body, 8.0);
            assert_eq!(body.target_orbit_radius, Some(68.0));
        }

        #[test]
        fn respects_field_bounds() {
            let mut body = test_body();
            body.field_bounds = Some(FieldBounds {
                inner: 40.0,
                outer: 64.0,
            });
            nudge_target_radius(&mut body, 100.0);
            assert_eq!(body.target_orbit_radius, Some(64.0));
            nudge_target_radius(&mut body, -100.0);
            assert_eq!(body.target_orbit_radius, Some(40.0));
        }
    }

    mod enter_free_orbit_fn {
        use super::*;

        #[test]
        fn sets_timer_and_anchors() {
            let mut body = test_body();
            let tuning = Tuning::default();
            enter_free_orbit(&mut body, &tuning, &mut rng());
            match body.orbit_state {
                OrbitState::FreeOrbit {
                    timer,
                    anchor_radius,
                    ..
                } => {
                    assert!(timer > 0.0);
                    assert_eq!(anchor_radius, 60.0);
                }
                other => panic!("expected FreeOrbit, got {other:?}"),
            }
            assert_eq!(body.slot_release_timer, tuning.slot_release_duration);
            assert_eq!(body.target_orbit_radius, Some(60.0));
        }

        #[test]
        fn second_impact_never_shrinks_timer() {
            let mut body = test_body();
            let mut rng = rng();
            let tuning = Tuning::default();
            enter_free_orbit(&mut body, &tuning, &mut rng);
            let mut prev = body.orbit_state.free_timer().unwrap();
            for _ in 0..100 {
                enter_free_orbit(&mut body, &tuning, &mut rng);
                let timer = body.orbit_state.free_timer().unwrap();
                assert!(timer >= prev - 1e-6);
                assert!(timer >= tuning.free_orbit_duration * 0.75 - 1e-3);
                prev = timer;
            }
        }

        #[test]
        fn impact_during_blend_restarts_free_flight() {
            let mut body = test_body();
            let tuning = Tuning::default();
            body.orbit_state = OrbitState::RailBlend { timer: 5.0 };
            enter_free_orbit(&mut body, &tuning, &mut rng());
            assert!(body.orbit_state.free_timer().is_some());
        }
    }

    mod step_state_fn {
        use super::*;

        #[test]
        fn free_timer_strictly_decreases_to_blend() {
            let mut body = test_body();
            let tuning = Tuning::default();
            enter_free_orbit(&mut body, &tuning, &mut rng());
            let mut last = body.orbit_state.free_timer().unwrap();
            let mut steps = 0;
            while let Some(timer) = body.orbit_state.free_timer() {
                assert!(timer <= last);
                last = timer;
                step_state(&mut body, 1.0, &tuning);
                steps += 1;
                assert!(steps < 10_000, "free orbit never expired");
            }
            assert!(matches!(body.orbit_state, OrbitState::RailBlend { .. }));
        }

        #[test]
        fn blend_expires_back_to_rail_with_zero_velocity() {
            let mut body = test_body();
            let tuning = Tuning::default();
            body.vel = Vec2::new(30.0, -10.0);
            body.orbit_state = OrbitState::RailBlend { timer: 2.0 };
            step_state(&mut body, 1.0, &tuning);
            step_state(&mut body, 1.0, &tuning);
            assert!(body.orbit_state.is_on_rail());
            assert_eq!(body.vel, Vec2::ZERO);
        }

        #[test]
        fn offset_retightens_after_release_expires() {
            let mut body = test_body();
            let tuning = Tuning::default();
            body.slot_release_timer = 1.0;
            push_angle(&mut body, 10.0);
            assert!(body.angle_offset > body.slot_span * config::SLOT_CLAMP_BASE);
            step_state(&mut body, 1.0, &tuning);
            step_state(&mut body, 1.0, &tuning);
            assert!(body.angle_offset <= body.slot_span * config::SLOT_CLAMP_BASE + 1e-6);
        }

        #[test]
        fn on_rail_body_is_left_alone() {
            let mut body = test_body();
            let tuning = Tuning::default();
            step_state(&mut body, 1.0, &tuning);
            assert!(body.orbit_state.is_on_rail());
            assert_eq!(body.angle_offset, 0.0);
        }
    }
}

use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::config;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector at `angle` radians from the +x axis.
    pub fn from_angle(angle: f32) -> Self {
        Vec2::new(angle.cos(), angle.sin())
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn normalize(self) -> Vec2 {
        let len = self.length();
        if len > 0.0 {
            Vec2::new(self.x / len, self.y / len)
        } else {
            Vec2::ZERO
        }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Counter-clockwise perpendicular. For a radial direction this is the
    /// orbital tangent.
    pub fn perp(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn clamp_length(self, max: f32) -> Vec2 {
        let len = self.length();
        if len > max && len > 0.0 {
            self * (max / len)
        } else {
            self
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2> for f32 {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self * rhs.x, self * rhs.y)
    }
}

/// Wrap an angle difference into (-π, π].
pub fn wrap_angle(mut angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

pub type BodyId = u64;

pub const LABEL_MAX_DRAW: usize = 12;
pub const TRAIL_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    Sun,
    Planet,
    Moon,
    Meteorite,
}

/// Where a body currently is in its rail lifecycle. A body is either fully
/// rail-driven, knocked into velocity-driven free flight, or easing back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OrbitState {
    OnRail,
    FreeOrbit {
        timer: f32,
        duration: f32,
        anchor_radius: f32,
        anchor_angle: f32,
    },
    RailBlend {
        timer: f32,
    },
}

impl OrbitState {
    pub fn is_on_rail(self) -> bool {
        matches!(self, OrbitState::OnRail)
    }

    pub fn free_timer(self) -> Option<f32> {
        match self {
            OrbitState::FreeOrbit { timer, .. } => Some(timer),
            _ => None,
        }
    }
}

/// Radial band a body's target orbit radius may be pushed within.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldBounds {
    pub inner: f32,
    pub outer: f32,
}

impl FieldBounds {
    pub fn clamp(self, radius: f32) -> f32 {
        radius.clamp(self.inner, self.outer)
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    pub id: BodyId,
    pub kind: BodyKind,
    pub parent: Option<BodyId>,
    pub label: String,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub orbit_radius: f32,
    pub orbit_angle: f32,
    pub angular_velocity: f32,
    pub base_orbit_angle: f32,
    pub angle_offset: f32,
    pub slot_span: f32,
    pub target_orbit_radius: Option<f32>,
    pub field_bounds: Option<FieldBounds>,
    pub orbit_state: OrbitState,
    pub slot_release_timer: f32,
    pub glow: f32,
    pub trail: [Vec2; TRAIL_LEN],
    pub trail_head: usize,
    pub trail_len: usize,
}

impl Body {
    pub fn is_sun(&self) -> bool {
        self.kind == BodyKind::Sun
    }

    /// Angle the rail controller currently wants the body at.
    pub fn target_orbit_angle(&self) -> f32 {
        self.base_orbit_angle + self.angle_offset
    }

    /// Velocity the body behaves as carrying in an impact. On-rail bodies
    /// store no explicit velocity, so infer one from the orbital angular rate
    /// along the tangent.
    pub fn effective_velocity(&self) -> Vec2 {
        if self.vel.length() > config::EFFECTIVE_SPEED_FLOOR {
            return self.vel;
        }
        let tangent = Vec2::from_angle(self.orbit_angle).perp();
        tangent * (self.angular_velocity * config::SIM_HZ * self.orbit_radius)
    }

    pub fn record_trail(&mut self) {
        self.trail_head = (self.trail_head + 1) % TRAIL_LEN;
        self.trail[self.trail_head] = self.pos;
        if self.trail_len < TRAIL_LEN {
            self.trail_len += 1;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorId {
    White,
    Cyan,
    Blue,
    Yellow,
    Magenta,
    Red,
    Gray,
    Trail,
    Spark,
    Ember,
    Smoke,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleKind {
    Spark,
    Smoke,
    Debris,
}

#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds remaining.
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
    /// Downward acceleration bias, px/s².
    pub gravity: f32,
    pub color: ColorId,
    pub kind: ParticleKind,
}

impl Particle {
    pub fn alpha(&self) -> f32 {
        if self.max_life > 0.0 {
            (self.life / self.max_life).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub kind: BodyKind,
    pub label: [char; LABEL_MAX_DRAW],
    pub label_len: usize,
    pub pos: Vec2,
    /// Parent center this body orbits, for ring hinting.
    pub center: Vec2,
    pub radius: f32,
    pub orbit_radius: f32,
    pub mass: f32,
    pub glow: f32,
    pub free: bool,
    pub trail: [Vec2; TRAIL_LEN],
    pub trail_head: usize,
    pub trail_len: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct WorldStats {
    pub planet_count: usize,
    pub moon_count: usize,
    pub meteorite_count: usize,
    pub free_bodies: usize,
    pub particle_count: usize,
    pub particle_budget: usize,
    pub collisions_total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod vec2_basics {
        use super::*;

        #[test]
        fn length_of_3_4_is_5() {
            assert_eq!(Vec2::new(3.0, 4.0).length(), 5.0);
        }

        #[test]
        fn normalize_zero_stays_zero() {
            assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
        }

        #[test]
        fn perp_is_ccw_quarter_turn() {
            let v = Vec2::new(1.0, 0.0).perp();
            assert!((v.x - 0.0).abs() < 1e-6);
            assert!((v.y - 1.0).abs() < 1e-6);
        }

        #[test]
        fn perp_is_orthogonal() {
            let v = Vec2::new(3.0, -2.0);
            assert!(v.dot(v.perp()).abs() < 1e-6);
        }

        #[test]
        fn from_angle_round_trips_through_angle() {
            let v = Vec2::from_angle(1.1);
            assert!((v.angle() - 1.1).abs() < 1e-6);
            assert!((v.length() - 1.0).abs() < 1e-6);
        }

        #[test]
        fn clamp_length_shrinks_long_vectors() {
            let v = Vec2::new(30.0, 40.0).clamp_length(5.0);
            assert!((v.length() - 5.0).abs() < 1e-5);
        }

        #[test]
        fn clamp_length_leaves_short_vectors_alone() {
            let v = Vec2::new(1.0, 2.0);
            assert_eq!(v.clamp_length(100.0), v);
        }
    }

    mod wrap_angle_fn {
        use super::*;
        use std::f32::consts::{PI, TAU};

        #[test]
        fn small_angles_unchanged() {
            assert!((wrap_angle(0.5) - 0.5).abs() < 1e-6);
            assert!((wrap_angle(-0.5) + 0.5).abs() < 1e-6);
        }

        #[test]
        fn full_turn_wraps_to_zero() {
            assert!(wrap_angle(TAU).abs() < 1e-5);
        }

        #[test]
        fn stays_within_pi() {
            for k in -6..=6 {
                let wrapped = wrap_angle(1.3 + k as f32 * TAU);
                assert!(wrapped > -PI - 1e-5 && wrapped <= PI + 1e-5);
            }
        }
    }

    mod orbit_state {
        use super::*;

        #[test]
        fn on_rail_reports_no_free_timer() {
            assert!(OrbitState::OnRail.is_on_rail());
            assert_eq!(OrbitState::OnRail.free_timer(), None);
        }

        #[test]
        fn free_orbit_exposes_timer() {
            let state = OrbitState::FreeOrbit {
                timer: 12.0,
                duration: 90.0,
                anchor_radius: 200.0,
                anchor_angle: 0.3,
            };
            assert!(!state.is_on_rail());
            assert_eq!(state.free_timer(), Some(12.0));
        }
    }

    mod field_bounds {
        use super::*;

        #[test]
        fn clamps_into_band() {
            let bounds = FieldBounds {
                inner: 20.0,
                outer: 60.0,
            };
            assert_eq!(bounds.clamp(10.0), 20.0);
            assert_eq!(bounds.clamp(100.0), 60.0);
            assert_eq!(bounds.clamp(45.0), 45.0);
        }
    }

    mod body_helpers {
        use super::*;

        fn test_body() -> Body {
            Body {
                id: 1,
                kind: BodyKind::Moon,
                parent: Some(0),
                label: "TEST".to_string(),
                pos: Vec2::new(100.0, 0.0),
                vel: Vec2::ZERO,
                radius: 5.0,
                mass: 8.0,
                orbit_radius: 100.0,
                orbit_angle: 0.0,
                angular_velocity: 0.01,
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

        #[test]
        fn target_angle_is_base_plus_offset() {
            let mut body = test_body();
            body.base_orbit_angle = 1.0;
            body.angle_offset = 0.25;
            assert!((body.target_orbit_angle() - 1.25).abs() < 1e-6);
        }

        #[test]
        fn calm_body_infers_tangential_velocity() {
            let body = test_body();
            let eff = body.effective_velocity();
            // At orbit_angle 0 the tangent points along +y.
            assert!(eff.x.abs() < 1e-3);
            assert!(eff.y > 0.0);
            let expected = body.angular_velocity * config::SIM_HZ * body.orbit_radius;
            assert!((eff.length() - expected).abs() < 1e-3);
        }

        #[test]
        fn moving_body_keeps_its_real_velocity() {
            let mut body = test_body();
            body.vel = Vec2::new(50.0, -20.0);
            assert_eq!(body.effective_velocity(), body.vel);
        }

        #[test]
        fn trail_ring_buffer_wraps() {
            let mut body = test_body();
            for i in 0..(TRAIL_LEN + 3) {
                body.pos = Vec2::new(i as f32, 0.0);
                body.record_trail();
            }
            assert_eq!(body.trail_len, TRAIL_LEN);
            assert_eq!(body.trail[body.trail_head].x, (TRAIL_LEN + 2) as f32);
        }
    }

    mod particle_alpha {
        use super::*;

        #[test]
        fn alpha_is_life_fraction() {
            let particle = Particle {
                pos: Vec2::ZERO,
                vel: Vec2::ZERO,
                life: 0.25,
                max_life: 1.0,
                size: 2.0,
                gravity: 0.0,
                color: ColorId::Spark,
                kind: ParticleKind::Spark,
            };
            assert!((particle.alpha() - 0.25).abs() < 1e-6);
        }

        #[test]
        fn zero_max_life_gives_zero_alpha() {
            let particle = Particle {
                pos: Vec2::ZERO,
                vel: Vec2::ZERO,
                life: 1.0,
                max_life: 0.0,
                size: 2.0,
                gravity: 0.0,
                color: ColorId::Smoke,
                kind: ParticleKind::Smoke,
            };
            assert_eq!(particle.alpha(), 0.0);
        }
    }
}

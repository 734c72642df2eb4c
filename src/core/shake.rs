use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::types::Vec2;

/// Camera-space shake, driven by wall-clock time rather than sim frames so a
/// paused simulation still settles. Owned state, passed by reference into the
/// frame pipeline.
pub struct CameraShake {
    intensity: f32,
    started: Instant,
    duration: Duration,
    rng: StdRng,
}

impl CameraShake {
    pub fn new() -> Self {
        Self {
            intensity: 0.0,
            started: Instant::now(),
            duration: Duration::ZERO,
            rng: StdRng::from_entropy(),
        }
    }

    /// Start (or strengthen) a shake. A weaker trigger never cuts an ongoing
    /// stronger shake short.
    pub fn trigger(&mut self, intensity: f32, duration: Duration) {
        let now = Instant::now();
        if intensity >= self.intensity * self.falloff(now) {
            self.intensity = intensity;
            self.started = now;
            self.duration = duration;
        }
    }

    pub fn is_active(&self) -> bool {
        self.falloff(Instant::now()) > 0.0
    }

    /// Transient offset to add to the camera position this frame.
    pub fn offset(&mut self) -> Vec2 {
        let falloff = self.falloff(Instant::now());
        if falloff <= 0.0 {
            return Vec2::ZERO;
        }
        let mag = self.intensity * falloff * falloff;
        Vec2::new(
            self.rng.gen_range(-1.0..1.0_f32),
            self.rng.gen_range(-1.0..1.0_f32),
        ) * mag
    }

    fn falloff(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 0.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= self.duration {
            0.0
        } else {
            1.0 - elapsed.as_secs_f32() / self.duration.as_secs_f32()
        }
    }
}

impl Default for CameraShake {
    fn default() -> Self {
        Self::new()
    }
}

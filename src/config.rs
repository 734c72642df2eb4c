use serde::Deserialize;

pub const SIM_HZ: f32 = 60.0;
pub const RENDER_HZ: f32 = 30.0;
pub const FRAME_SECS: f32 = 1.0 / SIM_HZ;
pub const MAX_CATCHUP_FRAMES: u32 = 4;

pub const WORLD_HALF_WIDTH: f32 = 640.0;
pub const WORLD_HALF_HEIGHT: f32 = 640.0;

pub const SUN_RADIUS: f32 = 46.0;
pub const SUN_MASS: f32 = 5000.0;
pub const SUN_EXCLUSION_MARGIN: f32 = 100.0;
pub const SUN_KICK_SPEED: f32 = 30.0;
pub const SUN_GLOW_ON_CONTACT: f32 = 0.25;

pub const PLANET_RING_BASE: f32 = 220.0;
pub const PLANET_RING_STEP: f32 = 95.0;
pub const MOON_RING_BASE: f32 = 30.0;
pub const MOON_RING_STEP: f32 = 16.0;
pub const PLANET_MOON_BUFFER: f32 = 24.0;

pub const METEORITE_RADIUS: f32 = 4.0;
pub const METEORITE_MASS: f32 = 3.0;
pub const METEORITE_ANGULAR_VELOCITY: f32 = 0.011;

// Resolver constants that are not part of the runtime-tunable surface.
pub const ANGULAR_PUSH: f32 = 1.25;
pub const RADIAL_DESTACK: f32 = 7.0;
pub const SEPARATION_IMPULSE: f32 = 5.0;
pub const SLOT_CLAMP_BASE: f32 = 0.45;
pub const SLOT_CLAMP_RELEASED: f32 = 1.2;
pub const IMPACT_SPEED_NORM: f32 = 800.0;
pub const EFFECTIVE_SPEED_FLOOR: f32 = 4.0;

pub const ANGLE_EASE: f32 = 0.08;
pub const RADIUS_EASE: f32 = 0.05;
pub const GLOW_EPSILON: f32 = 0.01;

/// Market cap (millions) to body mass. Log scale keeps giants and dust on the
/// same screen.
pub fn market_cap_to_mass(cap_musd: f32) -> f32 {
    cap_musd.max(1.0).ln()
}

pub fn planet_radius(mass: f32) -> f32 {
    7.0 + mass * 1.5
}

pub fn moon_radius(mass: f32) -> f32 {
    2.0 + mass * 0.55
}

/// Runtime-tunable physics and effects configuration.
///
/// All fields default to the compile-time values in [`Tuning::default`].
/// Override any subset by placing a `marketcosmo.toml` next to the binary;
/// missing keys keep their defaults, a missing file is not an error.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub restitution: f32,
    pub min_separation: f32,
    pub mass_exponent: f32,
    pub grazing_speed_threshold: f32,
    pub max_particles: usize,
    pub glow_decay: f32,
    pub max_glow: f32,
    pub free_orbit_duration: f32,
    pub free_orbit_spring: f32,
    pub free_orbit_damping: f32,
    pub free_orbit_orbit_assist: f32,
    pub tangential_jitter: f32,
    pub slot_release_duration: f32,
    pub tangential_friction: f32,
    pub max_free_speed: f32,
    pub global_velocity_drag: f32,
    pub rail_blend_duration: f32,
    pub rail_blend_ease: f32,
    pub proximity_glow_distance: f32,
    pub proximity_glow_intensity: f32,
    /// Impact speed at which the supernova escalation tier would engage.
    /// Zero disables the tier entirely.
    pub supernova_impact_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            restitution: 0.55,
            min_separation: 2.0,
            mass_exponent: 0.6,
            grazing_speed_threshold: 40.0,
            max_particles: 250,
            glow_decay: 0.92,
            max_glow: 1.0,
            free_orbit_duration: 90.0,
            free_orbit_spring: 0.015,
            free_orbit_damping: 0.97,
            free_orbit_orbit_assist: 4.0,
            tangential_jitter: 6.0,
            slot_release_duration: 45.0,
            tangential_friction: 0.25,
            max_free_speed: 900.0,
            global_velocity_drag: 0.995,
            rail_blend_duration: 36.0,
            rail_blend_ease: 0.12,
            proximity_glow_distance: 26.0,
            proximity_glow_intensity: 0.035,
            supernova_impact_speed: 0.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Tuning {
    pub fn load(path: &str) -> Result<Self, TuningError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load `path` if present, falling back to defaults. A parse error is
    /// reported on stderr but never aborts startup.
    pub fn load_or_default(path: &str) -> Self {
        match Self::load(path) {
            Ok(tuning) => tuning,
            Err(TuningError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                eprintln!("{path}: {e}; using defaults");
                Self::default()
            }
        }
    }
}

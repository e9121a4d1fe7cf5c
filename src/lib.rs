//! Icon Card - animated portfolio landing page
//!
//! Core modules:
//! - `sim`: Deterministic animation core (sequencer, particles, counters)
//! - `surface`: Render-surface capability interface and element catalogue
//! - `haptics`: Named vibration patterns
//! - `platform`: Browser adapters (DOM, timers, frame loop)
//! - `settings`: Page configuration

pub mod error;
pub mod haptics;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod surface;

pub use error::{ConfigError, SetupError, TimelineError};
pub use settings::{PageConfig, QualityPreset};

/// Page animation constants
pub mod consts {
    /// Fixed particle integration step (60 Hz)
    pub const PARTICLE_DT: f32 = 1.0 / 60.0;
    /// Maximum integration substeps per frame (covers MAX_FRAME_DT)
    pub const MAX_SUBSTEPS: u32 = 6;
    /// Largest frame delta fed to the simulation, in seconds
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Celebration particle physics
    pub const GRAVITY: f32 = 400.0;
    pub const UPWARD_BIAS: f32 = 200.0;
    pub const CELEBRATION_MIN_SPEED: f32 = 200.0;
    pub const CELEBRATION_MAX_SPEED: f32 = 500.0;
    pub const CELEBRATION_LIFETIME_MS: f64 = 2000.0;
    /// Degrees of spin per second of particle age
    pub const CELEBRATION_SPIN: f32 = 360.0;

    /// Ambient particles spawn this far below the bottom edge (px)
    pub const AMBIENT_SPAWN_DEPTH: f32 = 20.0;

    /// Tilt sensitivity: pixels of pointer offset per degree of rotation
    pub const TILT_DIVISOR: f32 = 10.0;
    pub const TILT_PERSPECTIVE_PX: u32 = 1000;
}

/// Pad a counter value to at least two digits ("07", "92", "100")
pub fn pad2(value: i64) -> String {
    if value < 0 {
        format!("-{:02}", value.unsigned_abs())
    } else {
        format!("{:02}", value)
    }
}

/// Format a CSS pixel length
#[inline]
pub fn px(value: f32) -> String {
    format!("{}px", value)
}

/// Format a CSS percentage
#[inline]
pub fn percent(value: f32) -> String {
    format!("{}%", value)
}

/// Format a CSS duration in seconds
#[inline]
pub fn seconds(value: f32) -> String {
    format!("{}s", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad2() {
        assert_eq!(pad2(0), "00");
        assert_eq!(pad2(7), "07");
        assert_eq!(pad2(92), "92");
        assert_eq!(pad2(100), "100");
        assert_eq!(pad2(-3), "-03");
    }

    #[test]
    fn test_css_units() {
        assert_eq!(px(4.5), "4.5px");
        assert_eq!(percent(50.0), "50%");
        assert_eq!(seconds(2.0), "2s");
    }
}

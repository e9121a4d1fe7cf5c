//! Pointer tilt controller
//!
//! Maps the pointer's offset from the card center to a 3D rotation of the
//! inner card layer. Inactive until the card face is shown.

use crate::consts::{TILT_DIVISOR, TILT_PERSPECTIVE_PX};
use crate::surface::{RenderSurface, Target};

const FAST_TRANSITION: &str = "transform 0.1s ease-out";
const SETTLE_TRANSITION: &str = "transform 0.5s ease-out";

/// Card bounds in client coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Transition currently applied to the card layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiltMode {
    /// Untouched since the card was shown
    Idle,
    /// Pointer over the card: follow quickly
    Tracking,
    /// Pointer left: ease back to neutral
    Settling,
}

#[derive(Debug)]
pub struct TiltController {
    armed: bool,
    mode: TiltMode,
}

impl Default for TiltController {
    fn default() -> Self {
        Self::new()
    }
}

impl TiltController {
    pub fn new() -> Self {
        Self {
            armed: false,
            mode: TiltMode::Idle,
        }
    }

    /// Enable tilting (card face is showing)
    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn armed(&self) -> bool {
        self.armed
    }

    pub fn mode(&self) -> TiltMode {
        self.mode
    }

    /// (rotateX, rotateY) in degrees for a pointer at client (x, y)
    pub fn angles(x: f32, y: f32, rect: &CardRect) -> (f32, f32) {
        let local_x = x - rect.left;
        let local_y = y - rect.top;
        let center_x = rect.width / 2.0;
        let center_y = rect.height / 2.0;
        (
            (local_y - center_y) / TILT_DIVISOR,
            (center_x - local_x) / TILT_DIVISOR,
        )
    }

    pub fn transform(rotate_x: f32, rotate_y: f32) -> String {
        format!(
            "perspective({}px) rotateX({}deg) rotateY({}deg)",
            TILT_PERSPECTIVE_PX, rotate_x, rotate_y
        )
    }

    pub fn on_enter(&mut self, surface: &mut dyn RenderSurface) {
        if !self.armed {
            return;
        }
        self.mode = TiltMode::Tracking;
        surface.set_style(Target::CardInner, "transition", FAST_TRANSITION);
    }

    pub fn on_move(&mut self, x: f32, y: f32, rect: &CardRect, surface: &mut dyn RenderSurface) {
        if !self.armed {
            return;
        }
        let (rx, ry) = Self::angles(x, y, rect);
        surface.set_style(Target::CardInner, "transform", &Self::transform(rx, ry));
    }

    pub fn on_leave(&mut self, surface: &mut dyn RenderSurface) {
        if !self.armed {
            return;
        }
        self.mode = TiltMode::Settling;
        surface.set_style(Target::CardInner, "transform", &Self::transform(0.0, 0.0));
        surface.set_style(Target::CardInner, "transition", SETTLE_TRANSITION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    const RECT: CardRect = CardRect {
        left: 100.0,
        top: 50.0,
        width: 300.0,
        height: 400.0,
    };

    #[test]
    fn test_angles_from_center_offset() {
        // Dead center: no rotation
        assert_eq!(TiltController::angles(250.0, 250.0, &RECT), (0.0, 0.0));
        // Top-left corner: tilt back and to the left
        assert_eq!(TiltController::angles(100.0, 50.0, &RECT), (-20.0, 15.0));
        // Bottom-right corner
        assert_eq!(TiltController::angles(400.0, 450.0, &RECT), (20.0, -15.0));
    }

    #[test]
    fn test_no_effect_before_reveal() {
        let mut tilt = TiltController::new();
        let mut surface = RecordingSurface::new(0, 0);
        tilt.on_enter(&mut surface);
        tilt.on_move(120.0, 60.0, &RECT, &mut surface);
        tilt.on_leave(&mut surface);
        assert_eq!(surface.writes, 0);
        assert_eq!(tilt.mode(), TiltMode::Idle);
    }

    #[test]
    fn test_enter_move_leave() {
        let mut tilt = TiltController::new();
        let mut surface = RecordingSurface::new(0, 0);
        tilt.arm();

        tilt.on_enter(&mut surface);
        assert_eq!(surface.style(Target::CardInner, "transition"), Some(FAST_TRANSITION));

        tilt.on_move(100.0, 50.0, &RECT, &mut surface);
        assert_eq!(
            surface.style(Target::CardInner, "transform"),
            Some("perspective(1000px) rotateX(-20deg) rotateY(15deg)")
        );

        tilt.on_leave(&mut surface);
        assert_eq!(tilt.mode(), TiltMode::Settling);
        assert_eq!(
            surface.style(Target::CardInner, "transform"),
            Some("perspective(1000px) rotateX(0deg) rotateY(0deg)")
        );
        assert_eq!(surface.style(Target::CardInner, "transition"), Some(SETTLE_TRANSITION));
    }
}

//! Haptic feedback
//!
//! Vibration is an optional enhancement: a platform without it simply
//! reports that nothing happened.

/// Named vibration patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticPattern {
    /// Football hits the screen
    Impact,
    /// Leaving the landing page
    Enter,
    /// Opening the card pack
    Reveal,
}

impl HapticPattern {
    /// Alternating on/off durations in milliseconds
    pub fn durations(&self) -> &'static [u32] {
        match self {
            HapticPattern::Impact => &[100, 50, 150, 50, 100, 50, 200],
            HapticPattern::Enter => &[100, 50, 100],
            HapticPattern::Reveal => &[50, 50, 100],
        }
    }
}

/// Best-effort vibration port
pub trait Haptics {
    /// Play a pattern. Returns false when the capability is absent.
    fn vibrate(&mut self, pattern: HapticPattern) -> bool;
}

/// A platform without vibration
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn vibrate(&mut self, _pattern: HapticPattern) -> bool {
        false
    }
}

/// Records played patterns (tests, native walkthrough)
#[derive(Debug, Default, Clone)]
pub struct RecordingHaptics {
    pub played: Vec<HapticPattern>,
}

impl Haptics for RecordingHaptics {
    fn vibrate(&mut self, pattern: HapticPattern) -> bool {
        self.played.push(pattern);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_alternate_on_off() {
        for pattern in [HapticPattern::Impact, HapticPattern::Enter, HapticPattern::Reveal] {
            // Patterns start and end with a pulse
            assert_eq!(pattern.durations().len() % 2, 1);
        }
        assert_eq!(HapticPattern::Impact.durations().iter().sum::<u32>(), 700);
    }

    #[test]
    fn test_absent_capability_is_silent() {
        let mut haptics = NoHaptics;
        assert!(!haptics.vibrate(HapticPattern::Impact));
    }
}

//! Counter animator
//!
//! Eases a displayed integer from a start value to a target with a cubic
//! ease-out. Every counter keeps its own start timestamp, so counters started
//! at different moments run independently.

use crate::pad2;
use crate::surface::{RenderSurface, Target};

/// Cubic ease-out: fast start, slow settle. `eased(0) = 0`, `eased(1) = 1`.
#[inline]
pub fn ease_out_cubic(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

/// Fraction of `duration_ms` covered by `elapsed_ms`, clamped to [0, 1]
#[inline]
pub fn progress(elapsed_ms: f64, duration_ms: f64) -> f64 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    (elapsed_ms / duration_ms).clamp(0.0, 1.0)
}

/// One sampled counter frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSample {
    pub value: i64,
    pub done: bool,
}

/// A number easing toward its target on one display element
#[derive(Debug, Clone, PartialEq)]
pub struct Counter {
    pub target: Target,
    pub start_value: i64,
    pub end_value: i64,
    pub start_ms: f64,
    pub duration_ms: f64,
    last_written: Option<i64>,
}

impl Counter {
    pub fn new(target: Target, start_value: i64, end_value: i64, start_ms: f64, duration_ms: f64) -> Self {
        Self {
            target,
            start_value,
            end_value,
            start_ms,
            duration_ms,
            last_written: None,
        }
    }

    pub fn sample(&self, now_ms: f64) -> CounterSample {
        // Compare absolute times: (start + d) - start may round below d
        if self.duration_ms <= 0.0 || now_ms >= self.start_ms + self.duration_ms {
            // Exact target, never a truncated 0.999...
            return CounterSample {
                value: self.end_value,
                done: true,
            };
        }
        let p = progress(now_ms - self.start_ms, self.duration_ms);
        let span = (self.end_value - self.start_value) as f64;
        let value = (self.start_value as f64 + span * ease_out_cubic(p)).floor() as i64;
        CounterSample { value, done: false }
    }
}

/// All running counters
#[derive(Debug, Default)]
pub struct CounterBank {
    counters: Vec<Counter>,
}

impl CounterBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, counter: Counter) {
        self.counters.push(counter);
    }

    pub fn active(&self) -> usize {
        self.counters.len()
    }

    pub fn clear(&mut self) {
        self.counters.clear();
    }

    /// Write every changed value; finished counters are dropped
    pub fn frame(&mut self, now_ms: f64, surface: &mut dyn RenderSurface) {
        self.counters.retain_mut(|counter| {
            let sample = counter.sample(now_ms);
            if sample.done || counter.last_written != Some(sample.value) {
                surface.set_text(counter.target, &pad2(sample.value));
                counter.last_written = Some(sample.value);
            }
            !sample.done
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;
    use proptest::prelude::*;

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-12);
        // Clamped outside [0, 1]
        assert_eq!(ease_out_cubic(-1.0), 0.0);
        assert_eq!(ease_out_cubic(2.0), 1.0);
    }

    #[test]
    fn test_counter_done_at_exact_duration() {
        // (100 + 470.2041) - 100 rounds below 470.2041
        for end in [0, 92] {
            let counter = Counter::new(Target::RatingNumber, 0, end, 100.0, 470.2041);
            assert_eq!(
                counter.sample(100.0 + 470.2041),
                CounterSample { value: end, done: true }
            );
        }
    }

    proptest! {
        #[test]
        fn test_ease_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(ease_out_cubic(lo) <= ease_out_cubic(hi));
        }

        #[test]
        fn test_counter_finishes_exactly(end in 0i64..1000, duration in 1.0f64..5000.0) {
            let counter = Counter::new(Target::RatingNumber, 0, end, 100.0, duration);
            let sample = counter.sample(100.0 + duration);
            prop_assert_eq!(sample, CounterSample { value: end, done: true });
        }

        #[test]
        fn test_counter_never_overshoots(end in 0i64..1000, t in 0.0f64..2000.0) {
            let counter = Counter::new(Target::RatingNumber, 0, end, 0.0, 1500.0);
            let sample = counter.sample(t);
            prop_assert!(sample.value >= 0 && sample.value <= end);
        }
    }

    #[test]
    fn test_counter_floors_midway() {
        let counter = Counter::new(Target::RatingNumber, 0, 92, 0.0, 1000.0);
        // eased(0.5) = 0.875 -> 80.5 -> 80
        assert_eq!(counter.sample(500.0), CounterSample { value: 80, done: false });
        assert_eq!(counter.sample(0.0).value, 0);
    }

    #[test]
    fn test_counter_before_start_holds_start_value() {
        let counter = Counter::new(Target::RatingNumber, 10, 50, 1000.0, 500.0);
        assert_eq!(counter.sample(0.0).value, 10);
    }

    #[test]
    fn test_bank_writes_padded_and_discards_finished() {
        let mut surface = RecordingSurface::new(2, 0);
        let mut bank = CounterBank::new();
        bank.start(Counter::new(Target::StatValue(0), 0, 7, 0.0, 100.0));
        bank.start(Counter::new(Target::StatValue(1), 0, 90, 50.0, 100.0));

        bank.frame(0.0, &mut surface);
        assert_eq!(surface.text_of(Target::StatValue(0)), Some("00"));

        bank.frame(100.0, &mut surface);
        assert_eq!(surface.text_of(Target::StatValue(0)), Some("07"));
        assert_eq!(bank.active(), 1);

        bank.frame(150.0, &mut surface);
        assert_eq!(surface.text_of(Target::StatValue(1)), Some("90"));
        assert_eq!(bank.active(), 0);
    }

    #[test]
    fn test_bank_skips_unchanged_values() {
        let mut surface = RecordingSurface::new(1, 0);
        let mut bank = CounterBank::new();
        bank.start(Counter::new(Target::StatValue(0), 5, 5, 0.0, 100.0));
        bank.frame(10.0, &mut surface);
        bank.frame(20.0, &mut surface);
        bank.frame(100.0, &mut surface);
        assert_eq!(
            surface.text_history[&Target::StatValue(0)],
            vec!["05".to_string(), "05".to_string()]
        );
    }
}

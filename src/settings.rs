//! Page configuration
//!
//! Every timing, count and piece of card data has a default matching the
//! shipped page. A page can override any of it with an inline JSON block
//! (`<script type="application/json" id="pageConfig">`).

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, TimelineError};
use crate::sim::timeline::{Cue, Timeline};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    /// Multiplier for decorative element counts (stars, sparkles, particles)
    pub fn density(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.3,
            QualityPreset::Medium => 1.0,
            QualityPreset::High => 1.5,
        }
    }
}

/// Fixed offsets of the reveal timeline (milliseconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Football hits the screen, after mount
    pub impact_ms: u32,
    /// Crack starts shrinking, after mount
    pub crack_shrink_ms: u32,
    /// Landing content appears, after mount
    pub content_reveal_ms: u32,
    /// Landing exit transition, before main content mounts
    pub exit_delay_ms: u32,
    /// Card face shown, after the pack is opened
    pub card_show_ms: u32,
    /// Card starts shaking, after the pack is opened
    pub shake_start_ms: u32,
    pub shake_duration_ms: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            impact_ms: 1400,
            crack_shrink_ms: 1900,
            content_reveal_ms: 2600,
            exit_delay_ms: 400,
            card_show_ms: 400,
            shake_start_ms: 800,
            shake_duration_ms: 600,
        }
    }
}

/// Decorative element counts and emission rates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counts {
    pub landing_stars: usize,
    pub main_stars: usize,
    pub sparkles: usize,
    pub ambient_initial: usize,
    pub ambient_initial_stagger_ms: u32,
    pub ambient_interval_ms: u32,
    pub celebration_burst: usize,
    pub celebration_stagger_ms: u32,
}

impl Default for Counts {
    fn default() -> Self {
        Self {
            landing_stars: 200,
            main_stars: 150,
            sparkles: 60,
            ambient_initial: 30,
            ambient_initial_stagger_ms: 200,
            ambient_interval_ms: 300,
            celebration_burst: 60,
            celebration_stagger_ms: 20,
        }
    }
}

/// Counter and bar animation timings (milliseconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterTimings {
    pub rating_ms: u32,
    pub stat_ms: u32,
    pub stat_stagger_ms: u32,
    pub skill_stagger_ms: u32,
}

impl Default for CounterTimings {
    fn default() -> Self {
        Self {
            rating_ms: 1500,
            stat_ms: 1000,
            stat_stagger_ms: 100,
            skill_stagger_ms: 150,
        }
    }
}

/// Viewport reveal observer options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            root_margin: "0px 0px -50px 0px".to_string(),
        }
    }
}

/// One card stat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatLine {
    pub label: String,
    pub value: i64,
    pub tooltip: String,
}

impl StatLine {
    fn new(label: &str, value: i64, tooltip: &str) -> Self {
        Self {
            label: label.to_string(),
            value,
            tooltip: tooltip.to_string(),
        }
    }
}

/// What the card shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardProfile {
    pub alias: String,
    pub name: String,
    pub position: String,
    pub rating: i64,
    pub stats: Vec<StatLine>,
    pub photo_path: String,
}

impl Default for CardProfile {
    fn default() -> Self {
        Self {
            alias: "CRISP".to_string(),
            name: "SHUBH ARYA".to_string(),
            position: "FSD".to_string(),
            rating: 92,
            stats: vec![
                StatLine::new("JS", 90, "JavaScript"),
                StatLine::new("PY", 88, "Python"),
                StatLine::new("TS", 87, "TypeScript"),
                StatLine::new("RE", 86, "React"),
                StatLine::new("NX", 85, "Next.js"),
                StatLine::new("ND", 84, "Node.js"),
            ],
            photo_path: "/profile.jpg".to_string(),
        }
    }
}

/// Page configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub quality: QualityPreset,
    pub timings: Timings,
    pub counts: Counts,
    pub counters: CounterTimings,
    pub observer: ObserverConfig,
    pub card: CardProfile,
    /// Number of skill bars in the skills section
    pub skill_bars: usize,
    /// Vibrate on impact/enter/reveal where supported
    pub haptics: bool,
    /// Skip shake effects
    pub reduced_motion: bool,
    /// Fixed RNG seed (random per page load otherwise)
    pub seed: Option<u64>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            timings: Timings::default(),
            counts: Counts::default(),
            counters: CounterTimings::default(),
            observer: ObserverConfig::default(),
            card: CardProfile::default(),
            skill_bars: 6,
            haptics: true,
            reduced_motion: false,
            seed: None,
        }
    }
}

impl PageConfig {
    /// Inline config element id
    pub const ELEMENT_ID: &'static str = "pageConfig";

    /// Parse and validate a JSON config (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PageConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.landing_timeline()?;
        self.card_timeline()?;

        let c = &self.counts;
        if c.ambient_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "counts.ambient_interval_ms",
                reason: "must be positive",
            });
        }
        if self.timings.shake_duration_ms == 0 || self.timings.exit_delay_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timings",
                reason: "durations must be positive",
            });
        }
        if self.counters.rating_ms == 0 || self.counters.stat_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "counters",
                reason: "durations must be positive",
            });
        }
        if !(0.0..=1.0).contains(&self.observer.threshold) {
            return Err(ConfigError::Invalid {
                field: "observer.threshold",
                reason: "must be within [0, 1]",
            });
        }
        Ok(())
    }

    /// Intro timeline: impact, crack shrink, content reveal
    pub fn landing_timeline(&self) -> Result<Timeline, TimelineError> {
        let t = &self.timings;
        Timeline::new(vec![
            (t.impact_ms, Cue::Impact),
            (t.crack_shrink_ms, Cue::CrackShrink),
            (t.content_reveal_ms, Cue::RevealContent),
        ])
    }

    /// Pack-opened timeline: show card, start shaking
    pub fn card_timeline(&self) -> Result<Timeline, TimelineError> {
        let t = &self.timings;
        Timeline::new(vec![
            (t.card_show_ms, Cue::ShowCard),
            (t.shake_start_ms, Cue::StartShake),
        ])
    }

    /// Scale a decorative element count by the quality preset
    pub fn scaled(&self, count: usize) -> usize {
        (count as f32 * self.quality.density()).round() as usize
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_shake(&self) -> bool {
        !self.reduced_motion
    }

    /// Load the inline config block (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let text = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::ELEMENT_ID))
            .and_then(|el| el.text_content());

        if let Some(json) = text {
            match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded page config ({} quality)", config.quality.as_str());
                    return config;
                }
                Err(e) => log::error!("Ignoring page config: {}", e),
            }
        }

        log::info!("Using default page config");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

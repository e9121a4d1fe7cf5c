//! Reveal sequencer
//!
//! Orchestrates the whole page:
//!
//! ```text
//! Idle → IntroPlaying → Impact → CrackShrink → ContentRevealed
//!      → (enter) → Hidden → MainVisible
//!      → (card click) → PackRevealed → CardShown → Shaking → StatsRevealed
//! ```
//!
//! Timed transitions arrive as [`Cue`]s from a [`Scheduler`]; user input and
//! display frames are pushed in by the host. Progress is recorded as
//! monotonic flags: nothing ever un-happens within one page lifetime.
//! Every scheduled timer is tracked so [`RevealSequencer::teardown`] can
//! release them all at once.

use std::collections::BTreeSet;

use super::easing::{Counter, CounterBank};
use super::observer::{Intersection, RevealObserver};
use super::particle::{ParticleKind, ParticleSystem};
use super::rng::VisualRng;
use super::starfield::{self, FieldKind};
use super::tilt::{CardRect, TiltController};
use super::timeline::{Cue, PendingTimers, Scheduler, Timeline, TimerHandle};
use crate::error::ConfigError;
use crate::haptics::{HapticPattern, Haptics};
use crate::pad2;
use crate::settings::PageConfig;
use crate::surface::{Feature, NodeIds, ObserverOptions, RenderSurface, Target, require};

/// Host capabilities for one call into the sequencer
pub struct Ports<'a> {
    /// Current time on the host's monotonic clock (ms)
    pub now_ms: f64,
    pub scheduler: &'a mut dyn Scheduler,
    pub surface: &'a mut dyn RenderSurface,
    pub haptics: &'a mut dyn Haptics,
}

/// Page stage, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    IntroPlaying,
    Impact,
    CrackShrink,
    ContentRevealed,
    Hidden,
    MainVisible,
    PackRevealed,
    CardShown,
    Shaking,
    StatsRevealed,
}

/// One-way progress flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceFlags {
    pub started: bool,
    pub impact_triggered: bool,
    pub crack_shrinking: bool,
    pub content_revealed: bool,
    pub hidden: bool,
    pub main_visible: bool,
    /// Reveal latch: the pack has been opened
    pub pack_revealed: bool,
    pub card_revealed: bool,
    pub shaking: bool,
    pub stats_revealed: bool,
}

impl SequenceFlags {
    /// Furthest stage reached
    pub fn stage(&self) -> Stage {
        let reached = [
            (self.stats_revealed, Stage::StatsRevealed),
            (self.shaking, Stage::Shaking),
            (self.card_revealed, Stage::CardShown),
            (self.pack_revealed, Stage::PackRevealed),
            (self.main_visible, Stage::MainVisible),
            (self.hidden, Stage::Hidden),
            (self.content_revealed, Stage::ContentRevealed),
            (self.crack_shrinking, Stage::CrackShrink),
            (self.impact_triggered, Stage::Impact),
            (self.started, Stage::IntroPlaying),
        ];
        reached
            .iter()
            .find(|(set, _)| *set)
            .map(|(_, stage)| *stage)
            .unwrap_or(Stage::Idle)
    }

    /// True if every flag set in `earlier` is still set here
    pub fn includes(&self, earlier: &SequenceFlags) -> bool {
        let pairs = [
            (earlier.started, self.started),
            (earlier.impact_triggered, self.impact_triggered),
            (earlier.crack_shrinking, self.crack_shrinking),
            (earlier.content_revealed, self.content_revealed),
            (earlier.hidden, self.hidden),
            (earlier.main_visible, self.main_visible),
            (earlier.pack_revealed, self.pack_revealed),
            (earlier.card_revealed, self.card_revealed),
            (earlier.shaking, self.shaking),
            (earlier.stats_revealed, self.stats_revealed),
        ];
        pairs.iter().all(|(was, is)| !*was || *is)
    }
}

/// `KeyboardEvent.code` values that advance the page
pub fn is_trigger_key(code: &str) -> bool {
    matches!(code, "Enter" | "Space")
}

pub struct RevealSequencer {
    config: PageConfig,
    landing: Timeline,
    card: Timeline,
    flags: SequenceFlags,
    timers: PendingTimers,
    enabled: BTreeSet<Feature>,
    rng: VisualRng,
    ids: NodeIds,
    counters: CounterBank,
    ambient: ParticleSystem,
    celebration: ParticleSystem,
    observer: RevealObserver,
    tilt: TiltController,
    torn_down: bool,
}

impl RevealSequencer {
    pub fn new(config: PageConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let landing = config.landing_timeline()?;
        let card = config.card_timeline()?;
        let observer = RevealObserver::new(ObserverOptions {
            threshold: config.observer.threshold,
            root_margin: config.observer.root_margin.clone(),
        });
        Ok(Self {
            rng: VisualRng::new(config.seed.unwrap_or(seed)),
            config,
            landing,
            card,
            flags: SequenceFlags::default(),
            timers: PendingTimers::new(),
            enabled: BTreeSet::new(),
            ids: NodeIds::new(),
            counters: CounterBank::new(),
            ambient: ParticleSystem::new(Target::LandingParticles),
            celebration: ParticleSystem::new(Target::CelebrationParticles),
            observer,
            tilt: TiltController::new(),
            torn_down: false,
        })
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn flags(&self) -> SequenceFlags {
        self.flags
    }

    pub fn stage(&self) -> Stage {
        self.flags.stage()
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.enabled.contains(&feature)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn observer(&self) -> &RevealObserver {
        &self.observer
    }

    pub fn tilt(&self) -> &TiltController {
        &self.tilt
    }

    pub fn live_particles(&self) -> usize {
        self.ambient.live() + self.celebration.live()
    }

    pub fn active_counters(&self) -> usize {
        self.counters.active()
    }

    /// Something still needs per-frame updates
    pub fn is_animating(&self) -> bool {
        !self.torn_down
            && (self.counters.active() > 0
                || self.ambient.live() + self.ambient.pending() > 0
                || self.ambient.streaming()
                || self.celebration.live() + self.celebration.pending() > 0)
    }

    /// Start the intro. Later calls are no-ops.
    pub fn mount(&mut self, ports: &mut Ports<'_>) {
        if self.torn_down || self.flags.started {
            return;
        }
        self.flags.started = true;
        log::info!("Mounting landing page (seed {})", self.rng.seed());

        if self.try_enable(Feature::LandingStarfield, ports.surface) {
            let count = self.config.scaled(self.config.counts.landing_stars);
            starfield::populate(FieldKind::LandingStars, count, &mut self.rng, &mut self.ids, ports.surface);
        }

        if self.try_enable(Feature::LandingParticles, ports.surface) {
            let counts = &self.config.counts;
            let initial = self.config.scaled(counts.ambient_initial);
            self.ambient.spawn_burst(
                ParticleKind::Ambient,
                initial,
                counts.ambient_initial_stagger_ms,
                ports.now_ms,
            );
            self.ambient.start_stream(counts.ambient_interval_ms, ports.now_ms);
        }

        if self.try_enable(Feature::Landing, ports.surface) {
            self.landing.schedule(&mut self.timers, ports.scheduler);
        } else {
            // Nothing to animate: go straight to the main content
            log::warn!("Skipping intro animation");
            self.flags.impact_triggered = true;
            self.flags.crack_shrinking = true;
            self.flags.content_revealed = true;
            self.flags.hidden = true;
            ports.surface.add_class(Target::LandingPage, "hidden");
            self.ambient.stop_stream();
            self.show_main(ports);
        }
    }

    /// Deliver a fired timer
    pub fn on_cue(&mut self, handle: TimerHandle, cue: Cue, ports: &mut Ports<'_>) {
        if self.torn_down {
            return;
        }
        if !self.timers.settle(handle) {
            log::debug!("Ignoring stale timer {:?} ({:?})", handle, cue);
            return;
        }

        match cue {
            Cue::Impact => self.impact(ports),
            Cue::CrackShrink => {
                if self.flags.crack_shrinking {
                    return;
                }
                self.flags.crack_shrinking = true;
                ports.surface.add_class(Target::ScreenCrack, "shrinking");
                log::info!("Crack shrinking");
            }
            Cue::RevealContent => self.reveal_content(ports),
            Cue::ShowMain => self.show_main(ports),
            Cue::ShowCard => {
                if self.flags.card_revealed {
                    return;
                }
                self.flags.card_revealed = true;
                ports.surface.add_class(Target::Card, "revealed");
                self.tilt.arm();
                log::info!("Card shown");
            }
            Cue::StartShake => {
                if self.flags.shaking {
                    return;
                }
                self.flags.shaking = true;
                if self.config.effective_shake() {
                    ports.surface.add_class(Target::Card, "shake");
                }
                let duration = self.config.timings.shake_duration_ms;
                self.timers.schedule(ports.scheduler, duration, Cue::EndShake);
            }
            Cue::EndShake => self.celebrate(ports),
            Cue::StatCounter(i) => self.start_stat(i, ports.now_ms),
            Cue::SkillBar(i) => RevealObserver::reveal_skill_bar(i, ports.surface),
        }
    }

    /// Football button clicked (or trigger key on the landing page)
    pub fn enter(&mut self, ports: &mut Ports<'_>) {
        if self.torn_down || !self.flags.content_revealed || self.flags.hidden {
            return;
        }
        self.flags.hidden = true;
        self.vibrate(HapticPattern::Enter, ports);
        ports.surface.add_class(Target::LandingPage, "hidden");
        self.ambient.stop_stream();
        let delay = self.config.timings.exit_delay_ms;
        self.timers.schedule(ports.scheduler, delay, Cue::ShowMain);
        log::info!("Leaving landing page");
    }

    /// Card clicked (or trigger key once main content is up)
    pub fn reveal_card(&mut self, ports: &mut Ports<'_>) {
        if self.torn_down
            || !self.flags.main_visible
            || !self.is_enabled(Feature::CardReveal)
            || self.flags.pack_revealed
        {
            return;
        }
        self.flags.pack_revealed = true;
        log::info!("Card reveal triggered");
        self.vibrate(HapticPattern::Reveal, ports);
        ports.surface.add_class(Target::Pack, "revealed");
        self.card.schedule(&mut self.timers, ports.scheduler);
    }

    /// Keyboard input. Returns true if the key was a trigger key.
    pub fn on_key(&mut self, code: &str, ports: &mut Ports<'_>) -> bool {
        if !is_trigger_key(code) {
            return false;
        }
        if self.flags.hidden {
            self.reveal_card(ports);
        } else {
            self.enter(ports);
        }
        true
    }

    pub fn on_intersections(&mut self, entries: &[Intersection], ports: &mut Ports<'_>) {
        if self.torn_down || !self.is_enabled(Feature::ScrollReveal) {
            return;
        }
        if self.observer.on_entries(entries, ports.surface) {
            let stagger = self.config.counters.skill_stagger_ms;
            for i in 0..self.config.skill_bars {
                self.timers.schedule(ports.scheduler, i as u32 * stagger, Cue::SkillBar(i));
            }
        }
    }

    pub fn pointer_enter(&mut self, surface: &mut dyn RenderSurface) {
        if !self.torn_down && self.is_enabled(Feature::Tilt) {
            self.tilt.on_enter(surface);
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, rect: &CardRect, surface: &mut dyn RenderSurface) {
        if !self.torn_down && self.is_enabled(Feature::Tilt) {
            self.tilt.on_move(x, y, rect, surface);
        }
    }

    pub fn pointer_leave(&mut self, surface: &mut dyn RenderSurface) {
        if !self.torn_down && self.is_enabled(Feature::Tilt) {
            self.tilt.on_leave(surface);
        }
    }

    /// Per-display-frame update: particles and counters
    pub fn frame(&mut self, now_ms: f64, surface: &mut dyn RenderSurface) {
        if self.torn_down {
            return;
        }
        self.ambient.frame(now_ms, &mut self.rng, &mut self.ids, surface);
        self.celebration.frame(now_ms, &mut self.rng, &mut self.ids, surface);
        self.counters.frame(now_ms, surface);
    }

    /// Release every pending timer and drop all animation state.
    /// The host must also stop its frame loop.
    pub fn teardown(&mut self, scheduler: &mut dyn Scheduler) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        let pending = self.timers.len();
        self.timers.cancel_all(scheduler);
        self.counters.clear();
        self.ambient.clear();
        self.celebration.clear();
        log::info!("Page torn down ({} timers cancelled)", pending);
    }

    fn try_enable(&mut self, feature: Feature, surface: &dyn RenderSurface) -> bool {
        match require(surface, feature) {
            Ok(()) => {
                self.enabled.insert(feature);
                true
            }
            Err(e) => {
                log::error!("{}", e);
                false
            }
        }
    }

    fn vibrate(&self, pattern: HapticPattern, ports: &mut Ports<'_>) {
        if !self.config.haptics {
            return;
        }
        if !ports.haptics.vibrate(pattern) {
            log::debug!("Vibration unsupported, skipped {:?}", pattern);
        }
    }

    fn impact(&mut self, ports: &mut Ports<'_>) {
        if self.flags.impact_triggered {
            return;
        }
        self.flags.impact_triggered = true;
        let surface = &mut *ports.surface;
        if self.config.effective_shake() {
            surface.add_class(Target::LandingPage, "shake");
        }
        surface.add_class(Target::ScreenCrack, "active");
        surface.add_class(Target::ImpactFlash, "active");
        self.vibrate(HapticPattern::Impact, ports);
        log::info!("Impact");
    }

    fn reveal_content(&mut self, ports: &mut Ports<'_>) {
        if self.flags.content_revealed {
            return;
        }
        self.flags.content_revealed = true;
        let surface = &mut *ports.surface;
        surface.set_style(Target::FootballContainer, "display", "none");
        surface.remove_class(Target::LandingPage, "shake");
        surface.remove_class(Target::LandingContent, "hidden");
        surface.add_class(Target::LandingContent, "reveal");
        log::info!("Landing content revealed");
    }

    fn show_main(&mut self, ports: &mut Ports<'_>) {
        if self.flags.main_visible {
            return;
        }
        self.flags.main_visible = true;
        if !ports.surface.exists(Target::MainContent) {
            log::warn!("Main content element {} not found", Target::MainContent);
        }
        ports.surface.add_class(Target::MainContent, "visible");

        if self.try_enable(Feature::Starfield, ports.surface) {
            let count = self.config.scaled(self.config.counts.main_stars);
            starfield::populate(FieldKind::MainStars, count, &mut self.rng, &mut self.ids, ports.surface);
        }
        if self.try_enable(Feature::SparkleField, ports.surface) {
            let count = self.config.scaled(self.config.counts.sparkles);
            starfield::populate(FieldKind::Sparkles, count, &mut self.rng, &mut self.ids, ports.surface);
        }
        if self.try_enable(Feature::CardReveal, ports.surface) {
            self.write_profile(ports.surface);
        }
        self.try_enable(Feature::Celebration, ports.surface);
        self.try_enable(Feature::Tilt, ports.surface);
        if self.try_enable(Feature::ScrollReveal, ports.surface) {
            self.observer.attach(ports.surface);
        }
        log::info!("Main content visible");
    }

    fn write_profile(&self, surface: &mut dyn RenderSurface) {
        let card = &self.config.card;
        surface.set_text(Target::PlayerAlias, &card.alias);
        surface.set_text(Target::PlayerName, &card.name);
        surface.set_text(Target::Position, &card.position);
        surface.set_attribute(Target::PlayerPhoto, "src", &card.photo_path);
        surface.set_text(Target::RatingNumber, &pad2(0));
        for i in 0..card.stats.len() {
            surface.set_text(Target::StatValue(i), &pad2(0));
        }
    }

    /// Shake over: counters and particles start together
    fn celebrate(&mut self, ports: &mut Ports<'_>) {
        if self.flags.stats_revealed {
            return;
        }
        self.flags.stats_revealed = true;
        ports.surface.remove_class(Target::Card, "shake");

        let now = ports.now_ms;
        let counters = &self.config.counters;
        self.counters.start(Counter::new(
            Target::RatingNumber,
            0,
            self.config.card.rating,
            now,
            counters.rating_ms as f64,
        ));
        let stagger = counters.stat_stagger_ms;
        for i in 0..self.config.card.stats.len() {
            let delay = i as u32 * stagger;
            if delay == 0 {
                self.start_stat(i, now);
            } else {
                self.timers.schedule(ports.scheduler, delay, Cue::StatCounter(i));
            }
        }

        if self.is_enabled(Feature::Celebration) {
            let counts = &self.config.counts;
            let burst = self.config.scaled(counts.celebration_burst);
            self.celebration.spawn_burst(
                ParticleKind::Celebration,
                burst,
                counts.celebration_stagger_ms,
                now,
            );
        }
        log::info!("Stats revealed");
    }

    fn start_stat(&mut self, index: usize, now_ms: f64) {
        let Some(stat) = self.config.card.stats.get(index) else {
            return;
        };
        self.counters.start(Counter::new(
            Target::StatValue(index),
            0,
            stat.value,
            now_ms,
            self.config.counters.stat_ms as f64,
        ));
    }
}

//! Render-surface capability interface
//!
//! The animation core never touches a UI toolkit directly. It names the
//! page's fixed elements through [`Target`], spawns transient nodes with
//! [`NodeId`]s, and talks to whatever implements [`RenderSurface`]: the DOM
//! adapter in `platform::web`, or [`RecordingSurface`] in tests and the
//! native walkthrough.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::error::SetupError;

/// Scroll-revealed page sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    About,
    Skills,
    Social,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::About, Section::Skills, Section::Social];
}

/// A fixed, named element of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    // Landing
    LandingPage,
    LandingContent,
    FootballContainer,
    ScreenCrack,
    ImpactFlash,
    EnterButton,
    LandingStarfield,
    LandingParticles,
    // Main content
    MainContent,
    Starfield,
    SparkleField,
    // Card
    CardWrapper,
    Pack,
    ClickHint,
    Card,
    CardInner,
    RatingNumber,
    StatValue(usize),
    PlayerPhoto,
    PlayerAlias,
    PlayerName,
    Position,
    CelebrationParticles,
    // Scroll sections
    Section(Section),
    SkillBar(usize),
}

/// How a target is located in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// `document.getElementById`
    Id(&'static str),
    /// First match of `document.querySelector`
    Query(&'static str),
    /// n-th match of `document.querySelectorAll`
    Nth(&'static str, usize),
}

impl Target {
    pub fn selector(&self) -> Selector {
        match self {
            Target::LandingPage => Selector::Id("landingPage"),
            Target::LandingContent => Selector::Id("landingContent"),
            Target::FootballContainer => Selector::Id("footballContainer"),
            Target::ScreenCrack => Selector::Id("screenCrack"),
            Target::ImpactFlash => Selector::Id("impactFlash"),
            Target::EnterButton => Selector::Id("enterBtn"),
            Target::LandingStarfield => Selector::Id("landingStarfield"),
            Target::LandingParticles => Selector::Id("landingParticles"),
            Target::MainContent => Selector::Id("mainContent"),
            Target::Starfield => Selector::Id("starfield"),
            Target::SparkleField => Selector::Query(".sparkle-field"),
            Target::CardWrapper => Selector::Query(".card-wrapper"),
            Target::Pack => Selector::Id("pack"),
            Target::ClickHint => Selector::Query(".click-hint"),
            Target::Card => Selector::Id("fifaCard"),
            Target::CardInner => Selector::Query("#fifaCard .card-inner"),
            Target::RatingNumber => Selector::Query(".rating .rating-number"),
            Target::StatValue(i) => Selector::Nth(".stat-item .stat-value", *i),
            Target::PlayerPhoto => Selector::Query(".profile-img"),
            Target::PlayerAlias => Selector::Query(".player-alias"),
            Target::PlayerName => Selector::Query(".player-name"),
            Target::Position => Selector::Query(".position"),
            Target::CelebrationParticles => Selector::Id("celebrationParticles"),
            Target::Section(Section::About) => Selector::Query(".about-section"),
            Target::Section(Section::Skills) => Selector::Query(".skills-section"),
            Target::Section(Section::Social) => Selector::Query(".social-section"),
            Target::SkillBar(i) => Selector::Nth(".skill-bar-item", *i),
        }
    }

    /// Every target of a page with the given stat and skill-bar counts
    pub fn catalogue(stat_count: usize, skill_count: usize) -> Vec<Target> {
        let mut all = vec![
            Target::LandingPage,
            Target::LandingContent,
            Target::FootballContainer,
            Target::ScreenCrack,
            Target::ImpactFlash,
            Target::EnterButton,
            Target::LandingStarfield,
            Target::LandingParticles,
            Target::MainContent,
            Target::Starfield,
            Target::SparkleField,
            Target::CardWrapper,
            Target::Pack,
            Target::ClickHint,
            Target::Card,
            Target::CardInner,
            Target::RatingNumber,
            Target::PlayerPhoto,
            Target::PlayerAlias,
            Target::PlayerName,
            Target::Position,
            Target::CelebrationParticles,
        ];
        all.extend((0..stat_count).map(Target::StatValue));
        all.extend(Section::ALL.iter().map(|s| Target::Section(*s)));
        all.extend((0..skill_count).map(Target::SkillBar));
        all
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.selector() {
            Selector::Id(id) => write!(f, "#{}", id),
            Selector::Query(q) => write!(f, "{}", q),
            Selector::Nth(q, i) => write!(f, "{}[{}]", q, i),
        }
    }
}

/// Independently initialized page features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    Landing,
    LandingStarfield,
    LandingParticles,
    Starfield,
    SparkleField,
    CardReveal,
    Celebration,
    ScrollReveal,
    Tilt,
}

impl Feature {
    /// Elements the feature cannot run without
    pub fn required_targets(&self) -> &'static [Target] {
        match self {
            Feature::Landing => &[
                Target::LandingPage,
                Target::LandingContent,
                Target::FootballContainer,
                Target::ScreenCrack,
                Target::ImpactFlash,
            ],
            Feature::LandingStarfield => &[Target::LandingStarfield],
            Feature::LandingParticles => &[Target::LandingParticles],
            Feature::Starfield => &[Target::Starfield],
            Feature::SparkleField => &[Target::SparkleField],
            Feature::CardReveal => &[Target::Pack, Target::Card, Target::CardWrapper],
            Feature::Celebration => &[Target::CelebrationParticles],
            Feature::ScrollReveal => &[],
            Feature::Tilt => &[Target::Card, Target::CardInner],
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feature::Landing => "landing intro",
            Feature::LandingStarfield => "landing starfield",
            Feature::LandingParticles => "landing particles",
            Feature::Starfield => "starfield",
            Feature::SparkleField => "sparkle field",
            Feature::CardReveal => "card reveal",
            Feature::Celebration => "celebration particles",
            Feature::ScrollReveal => "scroll reveal",
            Feature::Tilt => "3D tilt",
        };
        f.write_str(name)
    }
}

/// Check that every element a feature needs is present
pub fn require(surface: &dyn RenderSurface, feature: Feature) -> Result<(), SetupError> {
    match feature
        .required_targets()
        .iter()
        .find(|t| !surface.exists(**t))
    {
        Some(target) => Err(SetupError::MissingElement {
            feature,
            target: *target,
        }),
        None => Ok(()),
    }
}

/// Identity of a transient node (star, sparkle, particle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Hands out unique [`NodeId`]s for one surface
#[derive(Debug, Default)]
pub struct NodeIds {
    next: u64,
}

impl NodeIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> NodeId {
        self.next += 1;
        NodeId(self.next)
    }
}

/// Initial class and inline styles of a transient node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSpec {
    pub class: &'static str,
    pub styles: Vec<(&'static str, String)>,
}

impl NodeSpec {
    pub fn new(class: &'static str) -> Self {
        Self {
            class,
            styles: Vec::new(),
        }
    }

    pub fn style(mut self, property: &'static str, value: impl Into<String>) -> Self {
        self.styles.push((property, value.into()));
        self
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v.as_str())
    }
}

/// Viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn center(&self) -> glam::Vec2 {
        glam::Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Intersection observer options
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    /// Visible ratio that counts as "in view"
    pub threshold: f64,
    /// CSS margin around the root (negative bottom fires early)
    pub root_margin: String,
}

/// Everything the animation core is allowed to do to the page
pub trait RenderSurface {
    fn exists(&self, target: Target) -> bool;
    fn viewport(&self) -> Viewport;

    fn add_class(&mut self, target: Target, class: &str);
    fn remove_class(&mut self, target: Target, class: &str);
    fn set_style(&mut self, target: Target, property: &str, value: &str);
    fn set_text(&mut self, target: Target, text: &str);
    fn set_attribute(&mut self, target: Target, name: &str, value: &str);

    fn append_node(&mut self, parent: Target, node: NodeId, spec: &NodeSpec);
    fn style_node(&mut self, node: NodeId, property: &str, value: &str);
    fn remove_node(&mut self, node: NodeId);

    fn observe_intersections(&mut self, targets: &[Target], options: &ObserverOptions);
}

/// A transient node held by [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedNode {
    pub parent: Target,
    pub class: &'static str,
    pub styles: HashMap<String, String>,
}

/// In-memory surface that records every write
#[derive(Debug, Default)]
pub struct RecordingSurface {
    present: HashSet<Target>,
    viewport: Viewport,
    pub classes: HashMap<Target, BTreeSet<String>>,
    pub styles: HashMap<Target, HashMap<String, String>>,
    pub text: HashMap<Target, String>,
    pub attributes: HashMap<Target, HashMap<String, String>>,
    pub nodes: BTreeMap<NodeId, RecordedNode>,
    /// Nodes in removal order
    pub removed: Vec<NodeId>,
    /// Writes to nodes that were already removed (or never appended)
    pub stale_writes: usize,
    pub observed: Vec<Target>,
    pub observer_options: Option<ObserverOptions>,
    /// Total number of writes of any kind
    pub writes: usize,
    /// Text history per target, in write order
    pub text_history: HashMap<Target, Vec<String>>,
}

impl RecordingSurface {
    /// A surface where every catalogued element exists
    pub fn new(stat_count: usize, skill_count: usize) -> Self {
        Self {
            present: Target::catalogue(stat_count, skill_count)
                .into_iter()
                .collect(),
            ..Default::default()
        }
    }

    /// Drop an element from the page (simulates broken markup)
    pub fn without(mut self, target: Target) -> Self {
        self.present.remove(&target);
        self
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = Viewport { width, height };
        self
    }

    pub fn has_class(&self, target: Target, class: &str) -> bool {
        self.classes
            .get(&target)
            .is_some_and(|set| set.contains(class))
    }

    pub fn style(&self, target: Target, property: &str) -> Option<&str> {
        self.styles
            .get(&target)
            .and_then(|s| s.get(property))
            .map(String::as_str)
    }

    pub fn text_of(&self, target: Target) -> Option<&str> {
        self.text.get(&target).map(String::as_str)
    }

    /// Live transient nodes under a parent
    pub fn children(&self, parent: Target) -> usize {
        self.nodes.values().filter(|n| n.parent == parent).count()
    }
}

impl RenderSurface for RecordingSurface {
    fn exists(&self, target: Target) -> bool {
        self.present.contains(&target)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn add_class(&mut self, target: Target, class: &str) {
        if !self.exists(target) {
            return;
        }
        self.writes += 1;
        self.classes
            .entry(target)
            .or_default()
            .insert(class.to_string());
    }

    fn remove_class(&mut self, target: Target, class: &str) {
        if !self.exists(target) {
            return;
        }
        self.writes += 1;
        if let Some(set) = self.classes.get_mut(&target) {
            set.remove(class);
        }
    }

    fn set_style(&mut self, target: Target, property: &str, value: &str) {
        if !self.exists(target) {
            return;
        }
        self.writes += 1;
        self.styles
            .entry(target)
            .or_default()
            .insert(property.to_string(), value.to_string());
    }

    fn set_text(&mut self, target: Target, text: &str) {
        if !self.exists(target) {
            return;
        }
        self.writes += 1;
        self.text.insert(target, text.to_string());
        self.text_history
            .entry(target)
            .or_default()
            .push(text.to_string());
    }

    fn set_attribute(&mut self, target: Target, name: &str, value: &str) {
        if !self.exists(target) {
            return;
        }
        self.writes += 1;
        self.attributes
            .entry(target)
            .or_default()
            .insert(name.to_string(), value.to_string());
    }

    fn append_node(&mut self, parent: Target, node: NodeId, spec: &NodeSpec) {
        if !self.exists(parent) {
            return;
        }
        self.writes += 1;
        let styles = spec
            .styles
            .iter()
            .map(|(p, v)| (p.to_string(), v.clone()))
            .collect();
        self.nodes.insert(
            node,
            RecordedNode {
                parent,
                class: spec.class,
                styles,
            },
        );
    }

    fn style_node(&mut self, node: NodeId, property: &str, value: &str) {
        self.writes += 1;
        match self.nodes.get_mut(&node) {
            Some(n) => {
                n.styles.insert(property.to_string(), value.to_string());
            }
            None => self.stale_writes += 1,
        }
    }

    fn remove_node(&mut self, node: NodeId) {
        self.writes += 1;
        match self.nodes.remove(&node) {
            Some(_) => self.removed.push(node),
            None => self.stale_writes += 1,
        }
    }

    fn observe_intersections(&mut self, targets: &[Target], options: &ObserverOptions) {
        self.writes += 1;
        self.observed
            .extend(targets.iter().copied().filter(|t| self.present.contains(t)));
        self.observer_options = Some(options.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_reports_first_missing_element() {
        let surface = RecordingSurface::new(6, 4).without(Target::Card);
        assert!(require(&surface, Feature::Landing).is_ok());

        let err = require(&surface, Feature::CardReveal).unwrap_err();
        assert_eq!(
            err,
            SetupError::MissingElement {
                feature: Feature::CardReveal,
                target: Target::Card,
            }
        );
        assert_eq!(
            err.to_string(),
            "card reveal: required element #fifaCard not found"
        );
    }

    #[test]
    fn test_indexed_selectors() {
        assert_eq!(
            Target::StatValue(2).selector(),
            Selector::Nth(".stat-item .stat-value", 2)
        );
        assert_eq!(Target::SkillBar(0).to_string(), ".skill-bar-item[0]");
    }

    #[test]
    fn test_recording_surface_tracks_stale_node_writes() {
        let mut surface = RecordingSurface::new(0, 0);
        let spec = NodeSpec::new("star").style("left", "10%");
        surface.append_node(Target::Starfield, NodeId(1), &spec);
        assert_eq!(surface.children(Target::Starfield), 1);

        surface.remove_node(NodeId(1));
        surface.style_node(NodeId(1), "opacity", "0");
        surface.remove_node(NodeId(1));

        assert_eq!(surface.removed, vec![NodeId(1)]);
        assert_eq!(surface.stale_writes, 2);
    }

    #[test]
    fn test_writes_to_missing_targets_are_ignored() {
        let mut surface = RecordingSurface::new(0, 0).without(Target::Pack);
        surface.add_class(Target::Pack, "revealed");
        assert!(!surface.has_class(Target::Pack, "revealed"));
        assert_eq!(surface.writes, 0);
    }
}

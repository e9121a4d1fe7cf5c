//! Star and sparkle field generator
//!
//! Purely decorative: N nodes with randomized position, size and twinkle
//! timing. The twinkle itself is CSS; we only pick the parameters.

use super::rng::VisualRng;
use crate::surface::{NodeIds, NodeSpec, RenderSurface, Target};
use crate::{percent, px, seconds};

pub const SPARKLE_COLORS: [&str; 4] = [
    "rgba(212, 175, 55, 0.7)",
    "rgba(244, 208, 63, 0.6)",
    "rgba(255, 255, 255, 0.5)",
    "rgba(0, 212, 255, 0.4)",
];

/// A twinkling star
#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub left: f32,
    pub top: f32,
    pub size: f32,
    pub duration_s: f32,
    pub delay_s: f32,
    /// Main starfield stars rest at a dimmer base opacity
    pub base_opacity: Option<f32>,
}

impl Star {
    pub fn random(rng: &mut VisualRng, with_base_opacity: bool) -> Self {
        let left = rng.span(0.0, 100.0);
        let top = rng.span(0.0, 100.0);
        let size = rng.span(1.0, 2.0);
        let duration_s = rng.span(2.0, 3.0);
        let delay_s = rng.span(0.0, 5.0);
        let base_opacity = with_base_opacity.then(|| rng.span(0.3, 0.5));
        Self {
            left,
            top,
            size,
            duration_s,
            delay_s,
            base_opacity,
        }
    }

    pub fn node_spec(&self) -> NodeSpec {
        let spec = NodeSpec::new("star")
            .style("left", percent(self.left))
            .style("top", percent(self.top))
            .style("width", px(self.size))
            .style("height", px(self.size))
            .style("--duration", seconds(self.duration_s))
            .style("animation-duration", seconds(self.duration_s))
            .style("animation-delay", seconds(self.delay_s));
        match self.base_opacity {
            Some(o) => spec.style("--base-opacity", o.to_string()),
            None => spec,
        }
    }
}

/// A slow-floating coloured sparkle
#[derive(Debug, Clone, PartialEq)]
pub struct Sparkle {
    pub left: f32,
    pub top: f32,
    pub size: f32,
    pub color: &'static str,
    pub max_opacity: f32,
    pub duration_s: f32,
    pub delay_s: f32,
}

impl Sparkle {
    pub fn random(rng: &mut VisualRng) -> Self {
        Self {
            color: rng.pick(&SPARKLE_COLORS),
            size: rng.span(2.0, 4.0),
            max_opacity: rng.span(0.2, 0.4),
            left: rng.span(0.0, 100.0),
            top: rng.span(0.0, 100.0),
            duration_s: rng.span(6.0, 6.0),
            delay_s: rng.span(0.0, 8.0),
        }
    }

    pub fn node_spec(&self) -> NodeSpec {
        NodeSpec::new("sparkle")
            .style("left", percent(self.left))
            .style("top", percent(self.top))
            .style("width", px(self.size))
            .style("height", px(self.size))
            .style("--duration", seconds(self.duration_s))
            .style("--color", self.color)
            .style("--max-opacity", self.max_opacity.to_string())
            .style("animation-delay", seconds(self.delay_s))
    }
}

/// Which decorative field to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    LandingStars,
    MainStars,
    Sparkles,
}

impl FieldKind {
    pub fn container(&self) -> Target {
        match self {
            FieldKind::LandingStars => Target::LandingStarfield,
            FieldKind::MainStars => Target::Starfield,
            FieldKind::Sparkles => Target::SparkleField,
        }
    }
}

/// Generate `count` node specs for a field
pub fn generate(kind: FieldKind, count: usize, rng: &mut VisualRng) -> Vec<NodeSpec> {
    (0..count)
        .map(|_| match kind {
            FieldKind::LandingStars => Star::random(rng, false).node_spec(),
            FieldKind::MainStars => Star::random(rng, true).node_spec(),
            FieldKind::Sparkles => Sparkle::random(rng).node_spec(),
        })
        .collect()
}

/// Append a generated field to its container. Returns the number of nodes added.
pub fn populate(
    kind: FieldKind,
    count: usize,
    rng: &mut VisualRng,
    ids: &mut NodeIds,
    surface: &mut dyn RenderSurface,
) -> usize {
    let container = kind.container();
    let specs = generate(kind, count, rng);
    for spec in &specs {
        surface.append_node(container, ids.next_id(), spec);
    }
    log::debug!("Filled {:?} with {} nodes", kind, specs.len());
    specs.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_star_ranges(seed in any::<u64>()) {
            let mut rng = VisualRng::new(seed);
            for _ in 0..50 {
                let star = Star::random(&mut rng, true);
                prop_assert!((0.0..100.0).contains(&star.left));
                prop_assert!((0.0..100.0).contains(&star.top));
                prop_assert!((1.0..3.0).contains(&star.size));
                prop_assert!((2.0..5.0).contains(&star.duration_s));
                prop_assert!((0.0..5.0).contains(&star.delay_s));
                let base = star.base_opacity.unwrap_or(0.0);
                prop_assert!((0.3..0.8).contains(&base));
            }
        }

        #[test]
        fn test_sparkle_ranges(seed in any::<u64>()) {
            let mut rng = VisualRng::new(seed);
            for _ in 0..50 {
                let s = Sparkle::random(&mut rng);
                prop_assert!((2.0..6.0).contains(&s.size));
                prop_assert!((0.2..0.6).contains(&s.max_opacity));
                prop_assert!((6.0..12.0).contains(&s.duration_s));
                prop_assert!((0.0..8.0).contains(&s.delay_s));
                prop_assert!(SPARKLE_COLORS.contains(&s.color));
            }
        }
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = generate(FieldKind::MainStars, 20, &mut VisualRng::new(5));
        let b = generate(FieldKind::MainStars, 20, &mut VisualRng::new(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_landing_stars_have_no_base_opacity() {
        let field = generate(FieldKind::LandingStars, 5, &mut VisualRng::new(1));
        assert!(field.iter().all(|s| s.get("--base-opacity").is_none()));
        assert!(field.iter().all(|s| s.get("--duration") == s.get("animation-duration")));
    }

    #[test]
    fn test_populate_appends_to_container() {
        let mut surface = RecordingSurface::new(0, 0);
        let mut ids = NodeIds::new();
        let added = populate(FieldKind::Sparkles, 60, &mut VisualRng::new(2), &mut ids, &mut surface);
        assert_eq!(added, 60);
        assert_eq!(surface.children(Target::SparkleField), 60);
    }
}

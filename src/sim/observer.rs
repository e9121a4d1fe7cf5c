//! Viewport reveal observer
//!
//! Sections become visible once, permanently. Scrolling a section back out of
//! view never hides it again.

use std::collections::BTreeSet;

use crate::surface::{ObserverOptions, RenderSurface, Section, Target};

/// Browsers report ratios a hair under the threshold that triggered them
const RATIO_TOLERANCE: f64 = 1e-3;

/// One intersection report from the platform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub target: Target,
    pub ratio: f64,
    pub intersecting: bool,
}

#[derive(Debug)]
pub struct RevealObserver {
    options: ObserverOptions,
    visible: BTreeSet<Section>,
    skills_triggered: bool,
}

impl RevealObserver {
    pub fn new(options: ObserverOptions) -> Self {
        Self {
            options,
            visible: BTreeSet::new(),
            skills_triggered: false,
        }
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.options
    }

    pub fn targets() -> Vec<Target> {
        Section::ALL.iter().map(|s| Target::Section(*s)).collect()
    }

    /// Ask the surface to start reporting intersections
    pub fn attach(&self, surface: &mut dyn RenderSurface) {
        surface.observe_intersections(&Self::targets(), &self.options);
    }

    pub fn is_visible(&self, section: Section) -> bool {
        self.visible.contains(&section)
    }

    /// Apply a batch of reports. Returns true the first time the skills
    /// section is revealed.
    pub fn on_entries(&mut self, entries: &[Intersection], surface: &mut dyn RenderSurface) -> bool {
        let mut skills_now = false;
        for entry in entries {
            let Target::Section(section) = entry.target else {
                continue;
            };
            if !entry.intersecting || entry.ratio + RATIO_TOLERANCE < self.options.threshold {
                continue;
            }
            if self.visible.insert(section) {
                surface.add_class(entry.target, "visible");
                log::debug!("Section revealed: {:?}", section);
            }
            if section == Section::Skills && !self.skills_triggered {
                self.skills_triggered = true;
                skills_now = true;
            }
        }
        skills_now
    }

    /// Reveal one skill bar
    pub fn reveal_skill_bar(index: usize, surface: &mut dyn RenderSurface) {
        let bar = Target::SkillBar(index);
        surface.add_class(bar, "visible");
        surface.add_class(bar, "animate");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    fn observer() -> RevealObserver {
        RevealObserver::new(ObserverOptions {
            threshold: 0.2,
            root_margin: "0px 0px -50px 0px".to_string(),
        })
    }

    fn entry(section: Section, ratio: f64, intersecting: bool) -> Intersection {
        Intersection {
            target: Target::Section(section),
            ratio,
            intersecting,
        }
    }

    #[test]
    fn test_reveal_is_permanent() {
        let mut obs = observer();
        let mut surface = RecordingSurface::new(0, 0);

        obs.on_entries(&[entry(Section::About, 0.25, true)], &mut surface);
        assert!(obs.is_visible(Section::About));

        // Scrolled out
        obs.on_entries(&[entry(Section::About, 0.0, false)], &mut surface);
        assert!(obs.is_visible(Section::About));
        assert!(surface.has_class(Target::Section(Section::About), "visible"));
    }

    #[test]
    fn test_below_threshold_is_ignored() {
        let mut obs = observer();
        let mut surface = RecordingSurface::new(0, 0);
        obs.on_entries(&[entry(Section::Social, 0.05, true)], &mut surface);
        assert!(!obs.is_visible(Section::Social));
        obs.on_entries(&[entry(Section::Social, 0.1999, true)], &mut surface);
        assert!(obs.is_visible(Section::Social));
    }

    #[test]
    fn test_skills_trigger_only_once() {
        let mut obs = observer();
        let mut surface = RecordingSurface::new(0, 0);
        assert!(obs.on_entries(&[entry(Section::Skills, 0.3, true)], &mut surface));
        obs.on_entries(&[entry(Section::Skills, 0.0, false)], &mut surface);
        assert!(!obs.on_entries(&[entry(Section::Skills, 0.5, true)], &mut surface));
    }

    #[test]
    fn test_attach_observes_existing_sections() {
        let obs = observer();
        let mut surface = RecordingSurface::new(0, 0).without(Target::Section(Section::Social));
        obs.attach(&mut surface);
        assert_eq!(
            surface.observed,
            vec![Target::Section(Section::About), Target::Section(Section::Skills)]
        );
        assert_eq!(surface.observer_options.as_ref().map(|o| o.threshold), Some(0.2));
    }

    #[test]
    fn test_skill_bar_classes() {
        let mut surface = RecordingSurface::new(0, 3);
        RevealObserver::reveal_skill_bar(2, &mut surface);
        assert!(surface.has_class(Target::SkillBar(2), "visible"));
        assert!(surface.has_class(Target::SkillBar(2), "animate"));
    }
}

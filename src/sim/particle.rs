//! Particle physics simulator
//!
//! Two kinds of short-lived DOM particles:
//! - celebration: burst from the viewport center, ballistic with gravity
//! - ambient: rise from below the bottom edge at constant speed, no gravity
//!
//! Each particle owns one transient node. It is appended when released,
//! restyled every frame, and removed exactly once when its lifetime runs out.

use std::collections::VecDeque;

use glam::Vec2;

use super::rng::VisualRng;
use crate::consts::*;
use crate::surface::{NodeId, NodeIds, NodeSpec, RenderSurface, Target, Viewport};
use crate::{percent, px};

pub const CELEBRATION_COLORS: [&str; 5] = ["#d4af37", "#f4d03f", "#ffd700", "#b8860b", "#ffffff"];
pub const AMBIENT_COLORS: [&str; 4] = ["#d4af37", "#f4d03f", "#00d4ff", "#ffffff"];

const STAR_CLIP_PATH: &str = "polygon(50% 0%, 61% 35%, 98% 35%, 68% 57%, 79% 91%, 50% 70%, 21% 91%, 32% 57%, 2% 35%, 39% 35%)";

/// Ambient emission may fall behind (background tab); cap the catch-up
const MAX_AMBIENT_CATCH_UP: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Celebration,
    Ambient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleShape {
    Circle,
    Diamond,
    Star,
}

impl ParticleShape {
    pub const ALL: [ParticleShape; 3] = [ParticleShape::Circle, ParticleShape::Diamond, ParticleShape::Star];

    /// Fixed rotation baked into the shape
    fn base_rotation(&self) -> f32 {
        match self {
            ParticleShape::Diamond => 45.0,
            _ => 0.0,
        }
    }
}

/// A live particle
#[derive(Debug, Clone)]
pub struct Particle {
    pub node: NodeId,
    pub kind: ParticleKind,
    /// Displacement from the spawn point (px)
    pub offset: Vec2,
    /// px/s
    pub vel: Vec2,
    pub spawn_ms: f64,
    pub lifetime_ms: f64,
    pub color: &'static str,
    pub size: f32,
    pub shape: ParticleShape,
    /// Spawn position: px from the container's top-left (celebration),
    /// or percent of width (ambient)
    pub anchor: Vec2,
    accumulator: f32,
}

impl Particle {
    /// Burst particle leaving `origin` in a random direction
    pub fn celebration(rng: &mut VisualRng, node: NodeId, origin: Vec2, spawn_ms: f64) -> Self {
        let angle = rng.angle();
        let speed = rng.span(CELEBRATION_MIN_SPEED, CELEBRATION_MAX_SPEED - CELEBRATION_MIN_SPEED);
        let vel = Vec2::new(angle.cos() * speed, angle.sin() * speed - UPWARD_BIAS);
        Self {
            node,
            kind: ParticleKind::Celebration,
            offset: Vec2::ZERO,
            vel,
            spawn_ms,
            lifetime_ms: CELEBRATION_LIFETIME_MS,
            color: rng.pick(&CELEBRATION_COLORS),
            size: rng.span(5.0, 15.0),
            shape: rng.pick(&ParticleShape::ALL),
            anchor: origin,
            accumulator: 0.0,
        }
    }

    /// Background particle rising from below the bottom edge
    pub fn ambient(rng: &mut VisualRng, node: NodeId, viewport: Viewport, spawn_ms: f64) -> Self {
        let color = rng.pick(&AMBIENT_COLORS);
        let size = rng.span(2.0, 4.0);
        let lifetime_s = rng.span(5.0, 8.0);
        let left = rng.span(0.0, 100.0);
        let drift = rng.span(-10.0, 20.0);
        // Cover the full height plus the spawn depth on both ends
        let rise = (viewport.height + 2.0 * AMBIENT_SPAWN_DEPTH) / lifetime_s;
        Self {
            node,
            kind: ParticleKind::Ambient,
            offset: Vec2::ZERO,
            vel: Vec2::new(drift, -rise),
            spawn_ms,
            lifetime_ms: lifetime_s as f64 * 1000.0,
            color,
            size,
            shape: ParticleShape::Circle,
            anchor: Vec2::new(left, 0.0),
            accumulator: 0.0,
        }
    }

    /// Initial node for this particle
    pub fn node_spec(&self) -> NodeSpec {
        match self.kind {
            ParticleKind::Celebration => {
                let spec = NodeSpec::new("celebration-particle")
                    .style("background", self.color)
                    .style("width", px(self.size))
                    .style("height", px(self.size))
                    .style("left", px(self.anchor.x))
                    .style("top", px(self.anchor.y));
                match self.shape {
                    ParticleShape::Star => spec
                        .style("border-radius", "0")
                        .style("clip-path", STAR_CLIP_PATH),
                    _ => spec,
                }
            }
            ParticleKind::Ambient => NodeSpec::new("landing-particle")
                .style("background", self.color)
                .style("width", px(self.size))
                .style("height", px(self.size))
                .style("left", percent(self.anchor.x))
                .style("bottom", px(-AMBIENT_SPAWN_DEPTH))
                .style("box-shadow", format!("0 0 {}px {}", self.size * 2.0, self.color))
                .style("animation", "none"),
        }
    }

    /// Seconds since spawn
    pub fn age_s(&self, now_ms: f64) -> f32 {
        ((now_ms - self.spawn_ms).max(0.0) / 1000.0) as f32
    }

    pub fn expired(&self, now_ms: f64) -> bool {
        now_ms - self.spawn_ms > self.lifetime_ms
    }

    /// Linear fade from 1 to 0 over the lifetime
    pub fn opacity(&self, now_ms: f64) -> f32 {
        let t = (now_ms - self.spawn_ms) / self.lifetime_ms;
        (1.0 - t).clamp(0.0, 1.0) as f32
    }

    /// One fixed gravity step (vertical axis only)
    pub fn integrate(&mut self, dt: f32) {
        self.vel.y += GRAVITY * dt;
        self.offset.y += self.vel.y * dt;
    }

    /// Advance to `now_ms` given the (already clamped) frame delta
    pub fn advance(&mut self, now_ms: f64, frame_dt: f32) {
        let age = self.age_s(now_ms);
        match self.kind {
            ParticleKind::Celebration => {
                // Never integrate time from before the particle existed
                self.accumulator += frame_dt.min(age);
                let mut steps = 0;
                while self.accumulator >= PARTICLE_DT && steps < MAX_SUBSTEPS {
                    self.integrate(PARTICLE_DT);
                    self.accumulator -= PARTICLE_DT;
                    steps += 1;
                }
                if steps == MAX_SUBSTEPS {
                    self.accumulator = self.accumulator.min(PARTICLE_DT);
                }
                self.offset.x = self.vel.x * age;
            }
            ParticleKind::Ambient => {
                self.offset = self.vel * age;
            }
        }
    }

    /// CSS transform for the current offset
    pub fn transform(&self, now_ms: f64) -> String {
        match self.kind {
            ParticleKind::Celebration => {
                let spin = self.age_s(now_ms) * CELEBRATION_SPIN + self.shape.base_rotation();
                format!(
                    "translate({}px, {}px) rotate({}deg)",
                    self.offset.x, self.offset.y, spin
                )
            }
            ParticleKind::Ambient => format!("translate({}px, {}px)", self.offset.x, self.offset.y),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Release {
    at_ms: f64,
    kind: ParticleKind,
}

/// Continuous ambient emission
#[derive(Debug, Clone, Copy)]
struct Stream {
    interval_ms: f64,
    next_ms: f64,
}

/// All particles living in one container
#[derive(Debug)]
pub struct ParticleSystem {
    container: Target,
    particles: Vec<Particle>,
    pending: VecDeque<Release>,
    stream: Option<Stream>,
    last_frame_ms: Option<f64>,
}

impl ParticleSystem {
    pub fn new(container: Target) -> Self {
        Self {
            container,
            particles: Vec::new(),
            pending: VecDeque::new(),
            stream: None,
            last_frame_ms: None,
        }
    }

    pub fn live(&self) -> usize {
        self.particles.len()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Queue `count` particles released `stagger_ms` apart, the first at `now_ms`
    pub fn spawn_burst(&mut self, kind: ParticleKind, count: usize, stagger_ms: u32, now_ms: f64) {
        let mut at_ms = now_ms;
        for _ in 0..count {
            // Releases stay sorted: bursts may interleave with the stream
            let idx = self.pending.partition_point(|r| r.at_ms <= at_ms);
            self.pending.insert(idx, Release { at_ms, kind });
            at_ms += stagger_ms as f64;
        }
    }

    /// Emit one ambient particle every `interval_ms`, starting one interval from now
    pub fn start_stream(&mut self, interval_ms: u32, now_ms: f64) {
        let interval_ms = interval_ms.max(1) as f64;
        self.stream = Some(Stream {
            interval_ms,
            next_ms: now_ms + interval_ms,
        });
    }

    /// Stop emitting. Queued releases are dropped; live particles finish normally.
    pub fn stop_stream(&mut self) {
        self.stream = None;
        self.pending.clear();
    }

    pub fn streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Release due particles, move live ones, remove expired ones
    pub fn frame(
        &mut self,
        now_ms: f64,
        rng: &mut VisualRng,
        ids: &mut NodeIds,
        surface: &mut dyn RenderSurface,
    ) {
        let frame_dt = match self.last_frame_ms {
            Some(last) => (((now_ms - last) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT),
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);

        self.emit_stream(now_ms);
        self.release_due(now_ms, rng, ids, surface);

        self.particles.retain_mut(|p| {
            if p.expired(now_ms) {
                surface.remove_node(p.node);
                return false;
            }
            p.advance(now_ms, frame_dt);
            surface.style_node(p.node, "transform", &p.transform(now_ms));
            surface.style_node(p.node, "opacity", &p.opacity(now_ms).to_string());
            true
        });
    }

    /// Drop every particle without touching the surface (owner torn down)
    pub fn clear(&mut self) {
        self.particles.clear();
        self.pending.clear();
        self.stream = None;
    }

    fn emit_stream(&mut self, now_ms: f64) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        let mut emitted = 0;
        while stream.next_ms <= now_ms && emitted < MAX_AMBIENT_CATCH_UP {
            self.pending.push_back(Release {
                at_ms: stream.next_ms,
                kind: ParticleKind::Ambient,
            });
            stream.next_ms += stream.interval_ms;
            emitted += 1;
        }
        if stream.next_ms <= now_ms {
            stream.next_ms = now_ms + stream.interval_ms;
        }
    }

    fn release_due(
        &mut self,
        now_ms: f64,
        rng: &mut VisualRng,
        ids: &mut NodeIds,
        surface: &mut dyn RenderSurface,
    ) {
        let viewport = surface.viewport();
        while self.pending.front().is_some_and(|r| r.at_ms <= now_ms) {
            let Some(release) = self.pending.pop_front() else {
                break;
            };
            let node = ids.next_id();
            let particle = match release.kind {
                ParticleKind::Celebration => {
                    Particle::celebration(rng, node, viewport.center(), release.at_ms)
                }
                ParticleKind::Ambient => Particle::ambient(rng, node, viewport, release.at_ms),
            };
            surface.append_node(self.container, node, &particle.node_spec());
            self.particles.push(particle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    fn setup() -> (VisualRng, NodeIds, RecordingSurface) {
        (
            VisualRng::new(42),
            NodeIds::new(),
            RecordingSurface::new(0, 0).with_viewport(1000.0, 800.0),
        )
    }

    #[test]
    fn test_gravity_after_one_second() {
        let mut rng = VisualRng::new(1);
        let mut p = Particle::celebration(&mut rng, NodeId(1), Vec2::ZERO, 0.0);
        p.vel.y = -200.0;

        let dt: f32 = 0.016;
        let steps = (1.0 / dt).round() as u32;
        for _ in 0..steps {
            p.integrate(dt);
        }
        // Within one integration step of the exact 200
        assert!((p.vel.y - 200.0).abs() <= GRAVITY * dt, "vy = {}", p.vel.y);
    }

    #[test]
    fn test_frame_drop_does_not_explode_velocity() {
        let mut rng = VisualRng::new(3);
        let mut smooth = Particle::celebration(&mut rng, NodeId(1), Vec2::ZERO, 0.0);
        let mut choppy = smooth.clone();

        // 60 fps vs. a single 1.5s stall
        for i in 1..=30 {
            smooth.advance(i as f64 * 1000.0 / 60.0, 1.0 / 60.0);
        }
        choppy.advance(1500.0, MAX_FRAME_DT);

        assert!(choppy.vel.y <= smooth.vel.y + 1.0);
        assert!(choppy.vel.y.is_finite());
    }

    #[test]
    fn test_late_burst_integrates_only_own_age() {
        let (mut rng, mut ids, mut surface) = setup();
        let mut system = ParticleSystem::new(Target::CelebrationParticles);
        system.frame(0.0, &mut rng, &mut ids, &mut surface);

        // Released long after the loop started: no gravity applied yet
        system.spawn_burst(ParticleKind::Celebration, 1, 20, 5000.0);
        system.frame(5000.0, &mut rng, &mut ids, &mut surface);
        let first = system.particles()[0].clone();
        assert_eq!(first.offset, Vec2::ZERO);

        for i in 1..=60 {
            system.frame(5000.0 + i as f64 * 1000.0 / 60.0, &mut rng, &mut ids, &mut surface);
        }
        let p = &system.particles()[0];
        let gained = p.vel.y - first.vel.y;
        assert!(
            (gained - GRAVITY).abs() <= GRAVITY * PARTICLE_DT + 0.01,
            "gained {} px/s over one second",
            gained
        );
    }

    #[test]
    fn test_celebration_attributes_in_range() {
        let mut rng = VisualRng::new(9);
        for i in 0..500 {
            let p = Particle::celebration(&mut rng, NodeId(i), Vec2::new(500.0, 400.0), 0.0);
            assert!((5.0..20.0).contains(&p.size));
            assert!(CELEBRATION_COLORS.contains(&p.color));
            // Upward bias: speed <= 500, so vy in [-700, 300]
            assert!(p.vel.y >= -700.0 && p.vel.y <= 300.0);
            let speed = Vec2::new(p.vel.x, p.vel.y + UPWARD_BIAS).length();
            assert!(speed >= CELEBRATION_MIN_SPEED - 0.01 && speed <= CELEBRATION_MAX_SPEED + 0.01);
        }
    }

    #[test]
    fn test_ambient_attributes_in_range() {
        let mut rng = VisualRng::new(11);
        let viewport = Viewport { width: 1000.0, height: 800.0 };
        for i in 0..500 {
            let p = Particle::ambient(&mut rng, NodeId(i), viewport, 0.0);
            assert!((2.0..6.0).contains(&p.size));
            assert!((5000.0..13000.0).contains(&p.lifetime_ms));
            assert!((0.0..100.0).contains(&p.anchor.x));
            assert!(p.vel.y < 0.0, "ambient particles rise");
            assert_eq!(p.shape, ParticleShape::Circle);
        }
    }

    #[test]
    fn test_burst_is_staggered() {
        let (mut rng, mut ids, mut surface) = setup();
        let mut system = ParticleSystem::new(Target::CelebrationParticles);
        system.spawn_burst(ParticleKind::Celebration, 60, 20, 0.0);

        system.frame(0.0, &mut rng, &mut ids, &mut surface);
        assert_eq!(system.live(), 1);

        system.frame(100.0, &mut rng, &mut ids, &mut surface);
        assert_eq!(system.live(), 6);

        system.frame(1180.0, &mut rng, &mut ids, &mut surface);
        assert_eq!(system.live(), 60);
        assert_eq!(system.pending(), 0);
        assert_eq!(surface.children(Target::CelebrationParticles), 60);
    }

    #[test]
    fn test_burst_starts_at_viewport_center() {
        let (mut rng, mut ids, mut surface) = setup();
        let mut system = ParticleSystem::new(Target::CelebrationParticles);
        system.spawn_burst(ParticleKind::Celebration, 1, 20, 0.0);
        system.frame(0.0, &mut rng, &mut ids, &mut surface);

        let node = &surface.nodes[&system.particles()[0].node];
        assert_eq!(node.styles["left"], "500px");
        assert_eq!(node.styles["top"], "400px");
        assert_eq!(node.class, "celebration-particle");
    }

    #[test]
    fn test_each_particle_removed_exactly_once() {
        let (mut rng, mut ids, mut surface) = setup();
        let mut system = ParticleSystem::new(Target::CelebrationParticles);
        system.spawn_burst(ParticleKind::Celebration, 10, 20, 0.0);

        let mut t = 0.0;
        while t <= 3000.0 {
            system.frame(t, &mut rng, &mut ids, &mut surface);
            t += 1000.0 / 60.0;
        }

        assert_eq!(system.live(), 0);
        assert_eq!(surface.removed.len(), 10);
        let mut unique = surface.removed.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 10);
        assert_eq!(surface.stale_writes, 0, "no writes after removal");
    }

    #[test]
    fn test_opacity_fades_linearly() {
        let mut rng = VisualRng::new(5);
        let p = Particle::celebration(&mut rng, NodeId(1), Vec2::ZERO, 1000.0);
        assert_eq!(p.opacity(1000.0), 1.0);
        assert!((p.opacity(2000.0) - 0.5).abs() < 1e-6);
        assert_eq!(p.opacity(3000.0), 0.0);
        assert!(!p.expired(3000.0));
        assert!(p.expired(3000.5));
    }

    #[test]
    fn test_ambient_stream_and_stop() {
        let (mut rng, mut ids, mut surface) = setup();
        let mut system = ParticleSystem::new(Target::LandingParticles);
        system.start_stream(300, 0.0);

        system.frame(0.0, &mut rng, &mut ids, &mut surface);
        assert_eq!(system.live(), 0);
        system.frame(900.0, &mut rng, &mut ids, &mut surface);
        assert_eq!(system.live(), 3);

        system.stop_stream();
        system.frame(1800.0, &mut rng, &mut ids, &mut surface);
        assert_eq!(system.live(), 3);

        // Longest ambient lifetime is 13s
        system.frame(20_000.0, &mut rng, &mut ids, &mut surface);
        assert_eq!(system.live(), 0);
        assert_eq!(surface.removed.len(), 3);
    }

    #[test]
    fn test_stream_catch_up_is_capped() {
        let (mut rng, mut ids, mut surface) = setup();
        let mut system = ParticleSystem::new(Target::LandingParticles);
        system.start_stream(300, 0.0);
        system.frame(60_000.0, &mut rng, &mut ids, &mut surface);
        assert!(system.live() + surface.removed.len() <= MAX_AMBIENT_CATCH_UP);
    }

    #[test]
    fn test_ambient_rises_without_gravity() {
        let mut rng = VisualRng::new(8);
        let viewport = Viewport { width: 1000.0, height: 800.0 };
        let mut p = Particle::ambient(&mut rng, NodeId(1), viewport, 0.0);
        let vy = p.vel.y;
        p.advance(1000.0, MAX_FRAME_DT);
        assert_eq!(p.vel.y, vy);
        assert!((p.offset.y - vy).abs() < 1e-3);
    }
}

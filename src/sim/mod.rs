//! Deterministic page core
//!
//! All sequencing and animation logic lives here. This module must be pure
//! and deterministic:
//! - Time is passed in, never read
//! - Seeded RNG only
//! - Fixed timestep for particle physics
//! - No browser dependencies: output goes through [`RenderSurface`](crate::surface::RenderSurface)

pub mod easing;
pub mod observer;
pub mod particle;
pub mod rng;
pub mod sequencer;
pub mod starfield;
pub mod tilt;
pub mod timeline;

pub use easing::{Counter, CounterBank, ease_out_cubic};
pub use observer::{Intersection, RevealObserver};
pub use particle::{Particle, ParticleKind, ParticleShape, ParticleSystem};
pub use rng::VisualRng;
pub use sequencer::{Ports, RevealSequencer, SequenceFlags, Stage, is_trigger_key};
pub use starfield::{FieldKind, Sparkle, Star};
pub use tilt::{CardRect, TiltController};
pub use timeline::{Cue, Fired, PendingTimers, Scheduler, Timeline, TimerHandle, VirtualScheduler};

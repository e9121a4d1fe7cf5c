//! Platform abstraction layer
//!
//! Browser adapters for the ports the core talks to:
//! - Render surface (DOM)
//! - Timers (setTimeout/clearTimeout)
//! - Display frames (requestAnimationFrame)
//! - Vibration (navigator.vibrate)
//! - Viewport intersection (IntersectionObserver)
//!
//! Native builds use the in-memory implementations from `surface`,
//! `haptics` and `sim::timeline` instead.

#[cfg(target_arch = "wasm32")]
pub mod web;

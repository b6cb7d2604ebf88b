//! Sprite visibility and masked-draw phase of a Doom-style software
//! renderer.
//!
//! The wall/BSP renderer runs first each frame and leaves behind an ordered
//! list of screen-space wall segments ([`render::DrawSeg`]) with per-column
//! clip bounds. This crate owns everything drawn *after* that pass:
//!
//! * projecting world-space things and floor decals into screen-space
//!   visible-sprite records,
//! * keeping those records depth-sorted for back-to-front drawing,
//! * clipping each sprite against nearer wall segments and fake
//!   floor/ceiling sectors,
//! * walking sprite columns post-by-post and handing visible spans to an
//!   injected column painter,
//! * and the player weapon overlay drawn on top of the scene.
//!
//! Pixels are never touched here; the [`render::Backend`] capability paints
//! the spans. The whole phase is synchronous, single-threaded, and scoped
//! to one frame: [`render::MaskedPhase::clear_frame`] resets it.

pub mod defs;
pub mod fixed;
pub mod render;
pub mod world;

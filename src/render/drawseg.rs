//! Wall-segment silhouette records left behind by the wall pass.
//!
//! The wall renderer pushes one [`DrawSeg`] per rendered seg, newest last,
//! with per-column clip heights parked in a shared [`Openings`] pool. The
//! masked phase replays them in reverse to decide, column by column, how
//! much of each sprite survives behind the walls drawn in front of it.

use std::ops::Range;

use bitflags::bitflags;
use glam::Vec2;

use crate::fixed::Fixed;

/// Opaque handle to a wall texture owned by the wall renderer.
pub type WallTextureId = u16;

bitflags! {
    /// Which edges of a seg can hide things behind it.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct Silhouette: u8 {
        const NONE   = 0;
        const BOTTOM = 0b01;
        const TOP    = 0b10;
        const SOLID  = 0b11;
    }
}

/// Per-frame pool of clip columns. Draw segs store [`Range`]s into this
/// instead of pointers, so the pool can reallocate freely while segs are
/// being pushed.
#[derive(Default)]
pub struct Openings {
    data: Vec<i16>,
}

impl Openings {
    pub fn new() -> Self {
        Openings { data: Vec::new() }
    }

    /// Drop all allocations; capacity is kept for the next frame.
    pub fn reset(&mut self) {
        self.data.clear();
    }

    /// Reserve `len` clip entries and return their range.
    pub fn alloc(&mut self, len: usize) -> Range<usize> {
        let start = self.data.len();
        self.data.resize(start + len, 0);
        start..self.data.len()
    }

    #[inline]
    pub fn slice(&self, range: &Range<usize>) -> &[i16] {
        &self.data[range.clone()]
    }

    #[inline]
    pub fn slice_mut(&mut self, range: &Range<usize>) -> &mut [i16] {
        &mut self.data[range.clone()]
    }
}

/// One wall segment as the sprite clipper sees it.
#[derive(Clone, Debug)]
pub struct DrawSeg {
    /// Seg endpoints on the map plane, for the side-of-line test.
    pub v1: Vec2,
    pub v2: Vec2,

    /// Inclusive screen column range the seg covered.
    pub x1: i32,
    pub x2: i32,
    /// Perspective scale at `x1` / `x2`.
    pub scale1: Fixed,
    pub scale2: Fixed,

    pub silhouette: Silhouette,
    /// Set when the seg carries a see-through mid-texture that must be
    /// drawn during the masked phase.
    pub masked_mid: Option<WallTextureId>,

    /// Per-column clip heights, one entry per column in `x1..=x2`.
    /// `top_clip[i]` is the lowest row the seg's upper silhouette reaches
    /// at column `x1 + i`; `bot_clip[i]` the highest row of the lower one.
    pub top_clip: Range<usize>,
    pub bot_clip: Range<usize>,
}

impl DrawSeg {
    /// Larger of the two endpoint scales.
    #[inline]
    pub fn scale_max(&self) -> Fixed {
        self.scale1.max(self.scale2)
    }

    /// Smaller of the two endpoint scales.
    #[inline]
    pub fn scale_min(&self) -> Fixed {
        self.scale1.min(self.scale2)
    }

    /// True when `p` lies on the back side of the seg's line (the side
    /// facing away from the direction it was rendered from).
    #[inline]
    pub fn point_on_back_side(&self, p: Vec2) -> bool {
        let d = self.v2 - self.v1;
        (p.y - self.v1.y) * d.x >= (p.x - self.v1.x) * d.y
    }
}

/*====================================================================*/
/*                                Tests                               */
/*====================================================================*/

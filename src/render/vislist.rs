//! Per-frame visibility records and the depth-ordered sprite list.
//!
//! Sprites are kept sorted by perspective scale as they are inserted, via
//! a halving (binary-ish) search over an index array, so drawing is a
//! plain reverse walk. When a frame fills the list, extra sprites compete
//! for the farthest slot instead of growing it mid-frame; the list grows
//! between frames.

use glam::Vec2;

use crate::fixed::Fixed;
use crate::render::patch::PatchId;
use crate::render::PaintStyle;
use crate::world::SectorId;

/// Floor shadow to paint under a sprite, captured at projection time.
#[derive(Clone, Copy, Debug)]
pub struct ShadowPass {
    pub style: PaintStyle,
    /// Floor height the shadow lies on.
    pub floor_h: f32,
    /// World-unit lift above the floor plane.
    pub offset: f32,
}

/// One projected sprite, ready for clipping and rasterization.
#[derive(Clone, Copy, Debug)]
pub struct VisSprite {
    /// Inclusive screen column range (before per-frame clipping).
    pub x1: i32,
    pub x2: i32,
    /// Perspective scale; doubles as the depth sort key.
    pub scale: Fixed,

    /// World position, for the seg side-of-line test.
    pub gpos: Vec2,
    /// Bottom and top of the sprite in world z.
    pub gz: f32,
    pub gzt: f32,

    pub patch: PatchId,
    /// Texture column at `x1`, 16.16.
    pub startfrac: Fixed,
    /// Texture columns per screen column; negative when mirrored.
    pub xiscale: Fixed,
    /// Texture row at the view center, 16.16.
    pub texturemid: Fixed,
    /// Rows clipped off the bottom for things sunk in liquid.
    pub footclip: Fixed,

    pub colormap: usize,
    pub style: PaintStyle,
    pub translation: Option<u8>,
    /// Fake floor/ceiling sector of the thing's sector, when present.
    pub heightsec: Option<SectorId>,
    pub shadow: Option<ShadowPass>,
}

impl Default for VisSprite {
    fn default() -> Self {
        VisSprite {
            x1: 0,
            x2: 0,
            scale: Fixed::ZERO,
            gpos: Vec2::ZERO,
            gz: 0.0,
            gzt: 0.0,
            patch: 0,
            startfrac: Fixed::ZERO,
            xiscale: Fixed::ONE,
            texturemid: Fixed::ZERO,
            footclip: Fixed::ZERO,
            colormap: 0,
            style: PaintStyle::Opaque,
            translation: None,
            heightsec: None,
            shadow: None,
        }
    }
}

/// A projected floor decal. Flat record, no depth sort: decals are drawn
/// in reverse projection order before any sprite.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DecalVis {
    pub x1: i32,
    pub x2: i32,
    pub scale: Fixed,
    pub gpos: Vec2,
    pub patch: PatchId,
    pub startfrac: Fixed,
    pub xiscale: Fixed,
    pub texturemid: Fixed,
    pub colormap: usize,
    pub style: PaintStyle,
    pub blood: u8,
}

const INITIAL_CAPACITY: usize = 128;
const GROWTH: usize = 256;

/// Depth-ordered sprite list. `order` holds slot indices sorted by
/// descending scale (index 0 = nearest), so popping from the end yields
/// sprites farthest first.
pub struct VisList {
    sprites: Vec<VisSprite>,
    order: Vec<usize>,
    capacity: usize,
}

impl VisList {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        VisList {
            sprites: Vec::new(),
            order: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Empty the list. A frame that hit the cap earns more room for the
    /// next one; never grows mid-frame.
    pub fn clear(&mut self) {
        if self.sprites.len() >= self.capacity {
            self.capacity += GROWTH;
        }
        self.sprites.clear();
        self.order.clear();
    }

    /// Remove and return the farthest sprite.
    pub fn pop_farthest(&mut self) -> Option<VisSprite> {
        self.order.pop().map(|slot| self.sprites[slot])
    }

    /// Insert a record at its depth-ordered position and return it for the
    /// caller to fill in. Returns `None` when the list is full and `scale`
    /// is farther than everything already in it; when full but nearer, the
    /// current farthest sprite is recycled.
    pub fn insert(&mut self, scale: Fixed) -> Option<&mut VisSprite> {
        let n = self.order.len();
        let pos = if n < 2 {
            if n == 1 && scale <= self.sprites[self.order[0]].scale {
                1
            } else {
                0
            }
        } else {
            self.search(scale, n)
        };

        let slot = if self.sprites.len() >= self.capacity {
            if pos >= n {
                return None;
            }
            let Some(recycled) = self.order.pop() else {
                return None;
            };
            recycled
        } else {
            self.sprites.push(VisSprite::default());
            self.sprites.len() - 1
        };

        self.order.insert(pos, slot);
        let vis = &mut self.sprites[slot];
        *vis = VisSprite {
            scale,
            ..VisSprite::default()
        };
        Some(vis)
    }

    /// Halving search for the insertion point in the descending-scale
    /// order array. Converges in O(log n) probes; a miss (scale farther
    /// than everything while starting mid-array) lands at `n`.
    fn search(&self, scale: Fixed, n: usize) -> usize {
        let mut pos = (n + 1) >> 1;
        let mut step = (pos + 1) >> 1;
        let mut count = pos << 1;
        loop {
            let d2 = self.sprites[self.order[pos]].scale;
            let mut nearer = false;
            if scale >= d2 {
                if pos == 0 {
                    break;
                }
                let d1 = self.sprites[self.order[pos - 1]].scale;
                if scale <= d1 {
                    break;
                }
                nearer = true;
            }
            pos = if nearer {
                pos.saturating_sub(step)
            } else {
                (pos + step).min(n - 1)
            };
            step = (step + 1) >> 1;
            count >>= 1;
            if count == 0 {
                pos = n;
                break;
            }
        }
        pos
    }

    #[cfg(test)]
    fn scales_nearest_first(&self) -> Vec<Fixed> {
        self.order.iter().map(|&s| self.sprites[s].scale).collect()
    }
}

impl Default for VisList {
    fn default() -> Self {
        Self::new()
    }
}

/*====================================================================*/
/*                                Tests                               */
/*====================================================================*/

//! Occlusion resolution: per-column clip bounds for one sprite.
//!
//! Walls are never painted over. Instead, the wall pass leaves silhouette
//! records ([`DrawSeg`]) and this module scans them newest-first for segs
//! in front of the sprite, tightening an upper and lower bound per screen
//! column. Whatever window is left is all the rasterizer may touch.

use crate::fixed::{FRACBITS, Fixed};
use crate::render::vislist::DecalVis;
use crate::render::{Backend, MaskedPhase, Scene, Silhouette, VisSprite};

/// Clip window per screen column. `top[x]` is the last hidden row above
/// (-1 = none), `bot[x]` the first hidden row below (viewport height =
/// none); the visible window is `top[x]+1 ..= bot[x]-1`.
pub(crate) struct ClipBounds {
    pub top: Vec<i32>,
    pub bot: Vec<i32>,
}

impl ClipBounds {
    fn open(view_width: i32, view_height: i32) -> ClipBounds {
        ClipBounds {
            top: vec![-1; view_width as usize],
            bot: vec![view_height; view_width as usize],
        }
    }

    /// Fully open bounds, used by the weapon overlay.
    pub(crate) fn screen(view_width: i32, view_height: i32) -> ClipBounds {
        Self::open(view_width, view_height)
    }

    /// Tighten against every rendered seg in front of the sprite at depth
    /// `scale`. Segs behind it that carry a masked mid-texture are flushed
    /// through `masked` instead, so they end up under the sprite.
    fn clip_by_segs(
        &mut self,
        x1: i32,
        x2: i32,
        scale: Fixed,
        gpos: glam::Vec2,
        scene: &Scene<'_>,
        mut masked: Option<&mut dyn Backend>,
    ) {
        for ds in scene.segs.iter().rev() {
            if ds.x1 > x2
                || ds.x2 < x1
                || (!ds.silhouette.intersects(Silhouette::SOLID) && ds.masked_mid.is_none())
            {
                continue; // does not cover the sprite
            }

            let r1 = ds.x1.max(x1);
            let r2 = ds.x2.min(x2);

            if ds.scale_max() < scale
                || (ds.scale_min() < scale && !ds.point_on_back_side(gpos))
            {
                // seg is behind the sprite; a masked mid-texture on it
                // must still go down before the sprite does
                if ds.masked_mid.is_some() {
                    if let Some(backend) = masked.as_deref_mut() {
                        backend.draw_masked_seg(ds, r1, r2);
                    }
                }
                continue;
            }

            let bottom = ds.silhouette.contains(Silhouette::BOTTOM);
            let top = ds.silhouette.contains(Silhouette::TOP);
            let bot_clip = scene.openings.slice(&ds.bot_clip);
            let top_clip = scene.openings.slice(&ds.top_clip);
            for x in r1..=r2 {
                let i = (x - ds.x1) as usize;
                if bottom && self.bot[x as usize] > bot_clip[i] as i32 {
                    self.bot[x as usize] = bot_clip[i] as i32;
                }
                if top && self.top[x as usize] < top_clip[i] as i32 {
                    self.top[x as usize] = top_clip[i] as i32;
                }
            }
        }
    }
}

impl MaskedPhase {
    pub(crate) fn resolve_sprite_clip(
        &self,
        vis: &VisSprite,
        scene: &Scene<'_>,
        backend: &mut dyn Backend,
    ) -> ClipBounds {
        let view = scene.view;
        let mut bounds = ClipBounds::open(view.width, view.height);
        bounds.clip_by_segs(vis.x1, vis.x2, vis.scale, vis.gpos, scene, Some(backend));

        // clip against deep water and fake ceilings: the part of the
        // sprite on the far side of the plane belongs to the other view
        // of this sector and must not leak through
        if let Some(hs) = vis.heightsec {
            let fake = &scene.sectors[hs as usize];
            let eye_hs = scene.sectors[view.sector as usize]
                .heightsec
                .map(|s| &scene.sectors[s as usize]);

            if fake.floor_h > vis.gz {
                let mh = fake.floor_h - view.z;
                let h = view.centeryfrac - Fixed::from_f32(mh).mul(vis.scale);
                if h >= Fixed::ZERO && (h.0 >> FRACBITS) < view.height {
                    let h = h.0 >> FRACBITS;
                    if mh <= 0.0 || matches!(eye_hs, Some(eh) if view.z > eh.floor_h) {
                        for x in vis.x1..=vis.x2 {
                            bounds.bot[x as usize] = bounds.bot[x as usize].min(h);
                        }
                    } else if matches!(eye_hs, Some(eh) if view.z <= eh.floor_h) {
                        for x in vis.x1..=vis.x2 {
                            bounds.top[x as usize] = bounds.top[x as usize].max(h);
                        }
                    }
                }
            }

            if fake.ceil_h < vis.gzt {
                let h = view.centeryfrac - Fixed::from_f32(fake.ceil_h - view.z).mul(vis.scale);
                if h >= Fixed::ZERO && (h.0 >> FRACBITS) < view.height {
                    let h = h.0 >> FRACBITS;
                    if matches!(eye_hs, Some(eh) if view.z >= eh.ceil_h) {
                        for x in vis.x1..=vis.x2 {
                            bounds.bot[x as usize] = bounds.bot[x as usize].min(h);
                        }
                    } else {
                        for x in vis.x1..=vis.x2 {
                            bounds.top[x as usize] = bounds.top[x as usize].max(h);
                        }
                    }
                }
            }
        }

        bounds
    }

    /// Decals only clip against wall silhouettes; no fake planes and no
    /// masked mid-texture flushing.
    pub(crate) fn resolve_decal_clip(&self, d: &DecalVis, scene: &Scene<'_>) -> ClipBounds {
        let view = scene.view;
        let mut bounds = ClipBounds::open(view.width, view.height);
        bounds.clip_by_segs(d.x1, d.x2, d.scale, d.gpos, scene, None);
        bounds
    }
}

/*====================================================================*/
/*                                Tests                               */
/*====================================================================*/

//! Rasterizer driver: visibility records to clipped column spans.
//!
//! Walks a sprite's patch columns left to right, intersects each post with
//! the per-column clip window, and hands every surviving span to the
//! backend. All vertical stepping is 16.16 fixed; the unclipped top of a
//! tall close-up sprite can overflow 32 bits, so that one value is i64.

use crate::fixed::{FRACBITS, FRACUNIT, Fixed};
use crate::render::clip::ClipBounds;
use crate::render::patch::PatchColumn;
use crate::render::vislist::DecalVis;
use crate::render::{Backend, ColumnSpan, MaskedPhase, PaintStyle, Scene, VisSprite};

/// `centeryfrac - texturemid * scale`, widened.
#[inline]
fn top_screen(centeryfrac: Fixed, texturemid: Fixed, scale: Fixed) -> i64 {
    centeryfrac.wide() - ((texturemid.wide() * scale.wide()) >> FRACBITS)
}

/// Shared per-sprite state for the column walk.
struct ColumnWalk {
    sprtopscreen: i64,
    spryscale: Fixed,
    iscale: Fixed,
    texturemid: Fixed,
    centery: i32,
    /// Last row feet-clipped sprites may touch; -1 = none.
    baseclip: i32,
    colormap: usize,
    style: PaintStyle,
    translation: Option<u8>,
    blood: Option<u8>,
}

impl ColumnWalk {
    fn blast_sprite(
        &self,
        x: i32,
        column: &PatchColumn,
        ceilingclip: i32,
        floorclip: i32,
        backend: &mut dyn Backend,
    ) {
        for post in &column.posts {
            let len = post.pixels.len() as i64;
            let topscreen = self.sprtopscreen + self.spryscale.wide() * post.top as i64 + 1;

            let yl = (((topscreen + FRACUNIT as i64) >> FRACBITS) as i32).max(ceilingclip);
            let mut yh = (((topscreen + self.spryscale.wide() * len) >> FRACBITS) as i32)
                .min(floorclip);
            if self.baseclip != -1 {
                yh = yh.min(self.baseclip);
            }

            if yl <= yh {
                let frac = self.texturemid - Fixed::from_int(post.top)
                    + Fixed((yl - self.centery) << FRACBITS).mul(self.iscale);
                backend.draw_column(&ColumnSpan {
                    x,
                    y1: yl,
                    y2: yh,
                    frac,
                    iscale: self.iscale,
                    source: &post.pixels,
                    colormap: self.colormap,
                    style: self.style,
                    translation: self.translation,
                    blood: self.blood,
                });
            }
        }
    }

    /// Decal posts carry no texels to sample; the span is a flat tint.
    fn blast_decal(
        &self,
        x: i32,
        column: &PatchColumn,
        ceilingclip: i32,
        floorclip: i32,
        backend: &mut dyn Backend,
    ) {
        for post in &column.posts {
            let len = post.pixels.len() as i64;
            let topscreen = self.sprtopscreen + self.spryscale.wide() * post.top as i64 + 1;

            let yl = (((topscreen + FRACUNIT as i64) >> FRACBITS) as i32).max(ceilingclip);
            let yh = (((topscreen + self.spryscale.wide() * len) >> FRACBITS) as i32)
                .min(floorclip);

            if yl <= yh {
                backend.draw_column(&ColumnSpan {
                    x,
                    y1: yl,
                    y2: yh,
                    frac: Fixed::ZERO,
                    iscale: self.iscale,
                    source: &[],
                    colormap: self.colormap,
                    style: self.style,
                    translation: None,
                    blood: self.blood,
                });
            }
        }
    }

    /// Shadow posts are squashed to a tenth of the sprite height and
    /// shifted back under the thing.
    fn blast_shadow(
        &self,
        x: i32,
        column: &PatchColumn,
        shift: i64,
        ceilingclip: i32,
        floorclip: i32,
        backend: &mut dyn Backend,
    ) {
        for post in &column.posts {
            let len = post.pixels.len() as i64;
            let topscreen = self.sprtopscreen + self.spryscale.wide() * post.top as i64 + 1;

            let yl = ((((topscreen + FRACUNIT as i64) >> FRACBITS) / 10 + shift) as i32)
                .max(ceilingclip);
            let yh = ((((topscreen + self.spryscale.wide() * len) >> FRACBITS) / 10 + shift)
                as i32)
                .min(floorclip);

            if yl <= yh {
                backend.draw_column(&ColumnSpan {
                    x,
                    y1: yl,
                    y2: yh,
                    frac: Fixed::ZERO,
                    iscale: self.iscale,
                    source: &[],
                    colormap: self.colormap,
                    style: self.style,
                    translation: None,
                    blood: None,
                });
            }
        }
    }
}

impl MaskedPhase {
    pub(crate) fn rasterize_sprite(
        &self,
        vis: &VisSprite,
        bounds: &ClipBounds,
        scene: &Scene<'_>,
        backend: &mut dyn Backend,
    ) {
        let view = scene.view;
        let patch = scene.cache.patch(vis.patch);
        let spryscale = vis.scale;
        let iscale = vis.xiscale.abs();

        if let Some(shadow) = vis.shadow {
            let sprtopscreen = top_screen(
                view.centeryfrac,
                Fixed::from_f32(shadow.floor_h + shadow.offset - view.z),
                spryscale,
            );
            let shift = (sprtopscreen * 9 / 10) >> FRACBITS;
            let walk = ColumnWalk {
                sprtopscreen,
                spryscale,
                iscale,
                texturemid: Fixed::ZERO,
                centery: view.centery,
                baseclip: -1,
                colormap: vis.colormap,
                style: shadow.style,
                translation: None,
                blood: None,
            };
            let mut frac = vis.startfrac;
            for x in vis.x1..=vis.x2 {
                let col = frac.to_int();
                if col >= 0 && (col as usize) < patch.columns.len() {
                    walk.blast_shadow(
                        x,
                        &patch.columns[col as usize],
                        shift,
                        bounds.top[x as usize] + 1,
                        bounds.bot[x as usize] - 1,
                        backend,
                    );
                }
                frac += vis.xiscale;
            }
        }

        // a palette translation replaces the base paint routine
        let mut style = if vis.translation.is_some() {
            PaintStyle::Opaque
        } else {
            vis.style
        };
        if view.fixed_colormap.is_some() && self.opts.translucency {
            style = style.under_fixed_colormap();
        }

        let sprtopscreen = top_screen(view.centeryfrac, vis.texturemid, spryscale);
        let baseclip = if vis.footclip != Fixed::ZERO {
            ((sprtopscreen as i32 as i64 + Fixed::from_int(patch.height).mul(spryscale).wide()
                - vis.footclip.mul(spryscale).wide())
                >> FRACBITS) as i32
        } else {
            -1
        };

        let walk = ColumnWalk {
            sprtopscreen,
            spryscale,
            iscale,
            texturemid: vis.texturemid,
            centery: view.centery,
            baseclip,
            colormap: vis.colormap,
            style,
            translation: vis.translation,
            blood: None,
        };
        let mut frac = vis.startfrac;
        for x in vis.x1..=vis.x2 {
            let col = frac.to_int();
            if col >= 0 && (col as usize) < patch.columns.len() {
                walk.blast_sprite(
                    x,
                    &patch.columns[col as usize],
                    bounds.top[x as usize] + 1,
                    bounds.bot[x as usize] - 1,
                    backend,
                );
            }
            frac += vis.xiscale;
        }
    }

    pub(crate) fn rasterize_decal(
        &self,
        d: &DecalVis,
        bounds: &ClipBounds,
        scene: &Scene<'_>,
        backend: &mut dyn Backend,
    ) {
        let view = scene.view;
        let patch = scene.cache.patch(d.patch);
        let walk = ColumnWalk {
            sprtopscreen: top_screen(view.centeryfrac, d.texturemid, d.scale),
            spryscale: d.scale,
            iscale: d.xiscale.abs(),
            texturemid: d.texturemid,
            centery: view.centery,
            baseclip: -1,
            colormap: d.colormap,
            style: d.style,
            translation: None,
            blood: Some(d.blood),
        };
        let mut frac = d.startfrac;
        for x in d.x1..=d.x2 {
            let col = frac.to_int();
            if col >= 0 && (col as usize) < patch.columns.len() {
                walk.blast_decal(
                    x,
                    &patch.columns[col as usize],
                    bounds.top[x as usize] + 1,
                    bounds.bot[x as usize] - 1,
                    backend,
                );
            }
            frac += d.xiscale;
        }
    }

    /// Weapon overlay: clipped only to the viewport, never feet-clipped,
    /// never shadowed.
    pub(crate) fn rasterize_overlay(
        &self,
        vis: &VisSprite,
        scene: &Scene<'_>,
        backend: &mut dyn Backend,
    ) {
        let view = scene.view;
        let patch = scene.cache.patch(vis.patch);
        let bounds = ClipBounds::screen(view.width, view.height);
        let walk = ColumnWalk {
            sprtopscreen: top_screen(view.centeryfrac, vis.texturemid, vis.scale),
            spryscale: vis.scale,
            iscale: vis.xiscale.abs(),
            texturemid: vis.texturemid,
            centery: view.centery,
            baseclip: -1,
            colormap: vis.colormap,
            style: vis.style,
            translation: None,
            blood: None,
        };
        let mut frac = vis.startfrac;
        for x in vis.x1..=vis.x2 {
            let col = frac.to_int();
            if col >= 0 && (col as usize) < patch.columns.len() {
                walk.blast_sprite(
                    x,
                    &patch.columns[col as usize],
                    bounds.top[x as usize] + 1,
                    bounds.bot[x as usize] - 1,
                    backend,
                );
            }
            frac += vis.xiscale;
        }
    }
}

/*====================================================================*/
/*                                Tests                               */
/*====================================================================*/

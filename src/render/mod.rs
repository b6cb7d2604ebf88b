//! The masked-draw phase: everything painted after walls and planes.
//!
//! Per frame the driver calls, in order:
//! 1. [`MaskedPhase::clear_frame`] before world traversal,
//! 2. [`MaskedPhase::add_sprites`] once per visited sector,
//! 3. [`MaskedPhase::draw_masked`] after traversal, which draws decals,
//!    depth-sorted sprites, leftover masked mid-textures, and the weapon
//!    overlay, handing every visible span to the injected [`Backend`].
//!
//! The phase never touches pixels and never holds state across frames
//! beyond reusable capacity and the weapon-bob interpolation cache.

mod clip;
mod drawseg;
mod patch;
mod project;
mod psprite;
mod raster;
mod vislist;

pub use drawseg::{DrawSeg, Openings, Silhouette, WallTextureId};
pub use patch::{Patch, PatchBank, PatchBankError, PatchCache, PatchColumn, PatchId, Post};
pub use psprite::{PlayerView, PspLayer, WeaponSprite};
pub use vislist::{ShadowPass, VisList, VisSprite};

use crate::defs::SpriteDefs;
use crate::fixed::Fixed;
use crate::world::{LightTables, Sector, View, WorldState};
use vislist::DecalVis;

/// Hard cap on decal visibility records per frame. Overflow silently drops
/// the extras; decals are cosmetic and the cap only bites under absurd
/// splat counts.
pub const MAX_VISIBLE_DECALS: usize = 1024;

/*──────────────────────── painter selection ──────────────────────────*/

/// Translucency family of a paint routine. The fixed-colormap downgrade
/// mapping is exact: a wrong blend is a visibly wrong frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Blend {
    Tl,
    Tl50,
    Red,
    Red33,
    Green,
    Green33,
    Blue,
    Blue25,
    RedWhite1,
    RedWhite2,
    RedWhite50,
}

impl Blend {
    /// Alternate blend strength used while a full-screen fixed colormap is
    /// active (the normal tables assume an unmodified palette).
    pub fn under_fixed_colormap(self) -> Blend {
        match self {
            Blend::Tl => Blend::Tl50,
            Blend::Red => Blend::Red33,
            Blend::Green => Blend::Green33,
            Blend::Blue => Blend::Blue25,
            Blend::RedWhite1 | Blend::RedWhite2 => Blend::RedWhite50,
            other => other,
        }
    }
}

/// How a column is painted. Chosen once when an entity spawns (or once per
/// sprite at draw time for the overrides) and carried as a tag; the
/// [`Backend`] maps tags to its actual routines.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PaintStyle {
    Opaque,
    /// Spectre/invisibility distortion.
    Fuzz,
    /// Frozen fuzz used while the game is paused.
    PausedFuzz,
    /// Squashed black floor shadow.
    Shadow,
    Translucent(Blend),
    /// Palette tweak for the stock super-shotgun flash frames.
    SuperShotgun,
}

impl PaintStyle {
    pub fn under_fixed_colormap(self) -> PaintStyle {
        match self {
            PaintStyle::Translucent(b) => PaintStyle::Translucent(b.under_fixed_colormap()),
            other => other,
        }
    }
}

/*──────────────────────── injected capabilities ──────────────────────*/

/// One visible vertical strip, ready to paint. Bundles the ambient state a
/// column routine needs; `frac` is the 16.16 texture fraction at `y1`,
/// relative to the start of `source`, advancing by `iscale` per row.
pub struct ColumnSpan<'a> {
    pub x: i32,
    /// Inclusive vertical pixel range.
    pub y1: i32,
    pub y2: i32,
    pub frac: Fixed,
    pub iscale: Fixed,
    /// Post texels. Empty for styles that paint without sampling
    /// (shadows, decal tints, fuzz).
    pub source: &'a [u8],
    pub colormap: usize,
    pub style: PaintStyle,
    /// Palette translation table for palette-swapped entities.
    pub translation: Option<u8>,
    /// Tint palette index for blood decals.
    pub blood: Option<u8>,
}

/// The paint capability this phase drives. Implemented by the framebuffer
/// owner; nothing here allocates or retains the spans.
pub trait Backend {
    /// Paint one visible span of a sprite/decal/overlay column.
    fn draw_column(&mut self, span: &ColumnSpan<'_>);

    /// Render (part of) a masked mid-texture wall seg. May be called more
    /// than once for the same seg with overlapping ranges; the wall
    /// renderer tracks which columns it already painted.
    fn draw_masked_seg(&mut self, seg: &DrawSeg, x1: i32, x2: i32);

    /// Full-viewport tint used by the invisibility weapon path.
    fn fill_view(&mut self, shade: u8);

    /// Resolve deferred fuzz columns after the invisibility weapon path.
    fn finish_fuzz(&mut self, paused: bool);
}

/*──────────────────────── per-call context ───────────────────────────*/

/// Everything the phase borrows from its collaborators for one call.
/// Nothing in here outlives the call; the phase holds no world pointers
/// between frames.
pub struct Scene<'a> {
    pub view: &'a View,
    pub sectors: &'a [Sector],
    pub state: WorldState,
    pub defs: &'a SpriteDefs,
    pub cache: &'a dyn PatchCache,
    /// Wall segments in draw order, most recent last.
    pub segs: &'a [DrawSeg],
    /// Clip-array pool the wall segments point into.
    pub openings: &'a Openings,
}

/// Feature toggles, fixed for the lifetime of the phase.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub shadows: bool,
    /// Clip the feet of things standing in liquid.
    pub liquid_clip: bool,
    /// Animate foot clip with the liquid bob.
    pub liquid_bob: bool,
    pub translucency: bool,
    /// False when rendering untextured (debug view); disables fuzz swaps.
    pub textures: bool,
    pub decals: bool,
    pub player_sprites: bool,
    /// Apply the stock super-shotgun flash palette fix.
    pub supershotgun_tweak: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            shadows: true,
            liquid_clip: true,
            liquid_bob: true,
            translucency: true,
            textures: true,
            decals: true,
            player_sprites: true,
            supershotgun_tweak: true,
        }
    }
}

/// Per-frame toggles handed to [`MaskedPhase::clear_frame`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameState {
    /// Menu, pause, or console is up: freeze fuzz, stop interpolating.
    pub paused: bool,
    /// Rendering faster than the simulation ticks.
    pub interpolate: bool,
    /// Fraction of the current tick already elapsed, `0.0..1.0`.
    pub frac_tic: f32,
    /// True on the first rendered frame of a new simulation tick.
    pub real_frame: bool,
}

/*──────────────────────────── the phase ──────────────────────────────*/

pub struct MaskedPhase {
    pub(crate) vis: VisList,
    pub(crate) decals: Vec<DecalVis>,
    pub(crate) lights: LightTables,
    pub(crate) opts: Options,

    /* frame-scoped */
    pub(crate) sprite_light_row: usize,
    pub(crate) draw_shadows: bool,
    pub(crate) pause_sprites: bool,
    pub(crate) interpolate_sprites: bool,
    pub(crate) frac_tic: f32,
    pub(crate) real_frame: bool,

    /* weapon overlay interpolation cache, survives across frames */
    pub(crate) psp_interp: psprite::PspInterp,
    pub(crate) skip_psp_interp: bool,
    pub(crate) skip_psp_interp2: bool,
}

impl MaskedPhase {
    pub fn new(lights: LightTables, opts: Options) -> Self {
        MaskedPhase {
            vis: VisList::new(),
            decals: Vec::new(),
            lights,
            opts,
            sprite_light_row: 0,
            draw_shadows: false,
            pause_sprites: false,
            interpolate_sprites: false,
            frac_tic: 0.0,
            real_frame: false,
            psp_interp: psprite::PspInterp::default(),
            skip_psp_interp: false,
            skip_psp_interp2: false,
        }
    }

    /// Reset for a new frame. Keeps backing capacity; grows the visibility
    /// list here if the previous frame filled it.
    pub fn clear_frame(&mut self, frame: FrameState) {
        self.vis.clear();
        self.decals.clear();
        self.pause_sprites = frame.paused;
        self.interpolate_sprites = frame.interpolate && !frame.paused;
        self.frac_tic = frame.frac_tic;
        self.real_frame = frame.real_frame;
    }

    /// Ask for the weapon-bob interpolation to be skipped for one frame
    /// (weapon switch, teleport, respawn).
    pub fn skip_weapon_interpolation(&mut self) {
        self.skip_psp_interp = true;
    }

    pub fn num_vissprites(&self) -> usize {
        self.vis.len()
    }

    pub fn num_decal_vissprites(&self) -> usize {
        self.decals.len()
    }

    /// Draw everything accumulated this frame: decals, then sprites back to
    /// front, then remaining masked mid-textures, then the weapon overlay.
    pub fn draw_masked(
        &mut self,
        scene: &Scene<'_>,
        player: Option<&PlayerView>,
        backend: &mut dyn Backend,
    ) {
        // decals first; they sit on floors, so wall silhouettes are the
        // only thing that can hide them
        while let Some(d) = self.decals.pop() {
            self.draw_decal_sprite(&d, scene, backend);
        }

        while let Some(vis) = self.vis.pop_farthest() {
            self.draw_sprite(&vis, scene, backend);
        }

        // masked mid-textures not already painted behind some sprite
        for ds in scene.segs.iter().rev() {
            if ds.masked_mid.is_some() {
                backend.draw_masked_seg(ds, ds.x1, ds.x2);
            }
        }

        if self.opts.player_sprites {
            if let Some(p) = player {
                self.draw_player_sprites(p, scene, backend);
            }
        }
    }

    /// Occlusion-clip one sprite and rasterize it.
    fn draw_sprite(&mut self, vis: &VisSprite, scene: &Scene<'_>, backend: &mut dyn Backend) {
        if vis.x1 >= vis.x2 {
            return; // degenerate width
        }
        let bounds = self.resolve_sprite_clip(vis, scene, backend);
        self.rasterize_sprite(vis, &bounds, scene, backend);
    }

    fn draw_decal_sprite(&mut self, d: &DecalVis, scene: &Scene<'_>, backend: &mut dyn Backend) {
        if d.x1 >= d.x2 {
            return;
        }
        let bounds = self.resolve_decal_clip(d, scene);
        self.rasterize_decal(d, &bounds, scene, backend);
    }
}

/*====================================================================*/
/*                                Tests                               */
/*====================================================================*/

//! Snapshots of the world objects the masked phase consumes.
//!
//! The game simulation owns the real entities; per frame it hands this
//! crate flat read-only views of them, grouped by sector. Paint routines
//! are chosen once at spawn time and carried as [`PaintStyle`] tags rather
//! than callables.

use bitflags::bitflags;
use glam::Vec2;

use crate::render::{PaintStyle, PatchId};

pub type SectorId = u16;
pub type SpriteId = u16;

bitflags! {
    /// Render-relevant entity flags.
    #[derive(Default, Clone, Copy, Debug)]
    pub struct EntityFlags: u16 {
        /// Never project this entity.
        const HIDDEN         = 0x0001;
        /// Horizontally mirror the sprite regardless of rotation frame.
        const MIRRORED       = 0x0002;
        /// Paint a squashed floor shadow before the sprite itself.
        const CAST_SHADOW    = 0x0004;
        /// Feet sink into liquid floors (clip the bottom of the sprite).
        const FEET_CLIPPED   = 0x0008;
        /// Spectre-style fuzz entity; frozen fuzz while the game is paused.
        const FUZZ           = 0x0010;
        /// Eligible for sub-tick position interpolation.
        const INTERPOLATE    = 0x0020;
        /// Use the patch's original offsets instead of the corrected ones
        /// (content replaced the frame, so the fix no longer applies).
        const COMPAT_OFFSETS = 0x0040;
    }
}

bitflags! {
    /// Flags carried by floor decals.
    #[derive(Default, Clone, Copy, Debug)]
    pub struct DecalFlags: u8 {
        const MIRRORED = 0x01;
        const FUZZ     = 0x02;
    }
}

/// One movable thing, as seen by the projector.
#[derive(Clone, Debug)]
pub struct Entity {
    pub pos: Vec2,
    pub z: f32,
    /// Position at the previous simulation tick, for interpolation.
    pub prev_pos: Vec2,
    pub prev_z: f32,
    /// Facing angle, radians.
    pub angle: f32,

    pub sprite: SpriteId,
    pub frame: u8,
    /// This animation frame ignores diminished lighting.
    pub frame_bright: bool,
    /// The whole thing class is fullbright from any viewing angle.
    pub always_bright: bool,

    pub flags: EntityFlags,
    /// Palette translation table index for palette-swapped variants.
    pub translation: Option<u8>,

    pub painter: PaintStyle,
    pub shadow_painter: PaintStyle,
    /// World-unit lift of the shadow off the floor plane.
    pub shadow_offset: f32,

    pub sector: SectorId,
}

impl Default for Entity {
    fn default() -> Self {
        Entity {
            pos: Vec2::ZERO,
            z: 0.0,
            prev_pos: Vec2::ZERO,
            prev_z: 0.0,
            angle: 0.0,
            sprite: 0,
            frame: 0,
            frame_bright: false,
            always_bright: false,
            flags: EntityFlags::empty(),
            translation: None,
            painter: PaintStyle::Opaque,
            shadow_painter: PaintStyle::Shadow,
            shadow_offset: 0.0,
            sector: 0,
        }
    }
}

/// A blood splat stuck to a sector floor. No foot clip, no fake-sector
/// interaction; one fixed orientation per splat.
#[derive(Clone, Debug)]
pub struct Decal {
    pub pos: Vec2,
    pub patch: PatchId,
    /// Palette index the splat tint was derived from.
    pub blood: u8,
    pub flags: DecalFlags,
    pub painter: PaintStyle,
    pub sector: SectorId,
}

/// Sector state relevant to sprite projection and clipping. Heights are
/// the interpolated values for the frame being rendered.
#[derive(Clone, Debug)]
pub struct Sector {
    pub floor_h: f32,
    pub ceil_h: f32,
    pub light: i32,
    /// Secondary floor/ceiling plane faking deep water or a hanging
    /// ceiling; sprites inside need extra visibility clipping.
    pub heightsec: Option<SectorId>,
    pub is_liquid: bool,
    /// Shadows are not painted onto sky floors.
    pub floor_is_sky: bool,
    /// Sector whose light level the weapon overlay reads, when the floor
    /// borrows lighting from elsewhere.
    pub floor_light_sec: Option<SectorId>,
}

impl Default for Sector {
    fn default() -> Self {
        Sector {
            floor_h: 0.0,
            ceil_h: 128.0,
            light: 160,
            heightsec: None,
            is_liquid: false,
            floor_is_sky: false,
            floor_light_sec: None,
        }
    }
}

/// World-level inputs that are not per-sector.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorldState {
    /// Current liquid bob displacement, world units. Added to foot clip so
    /// partially submerged things ride the surface animation.
    pub liquid_bob: f32,
}

//! Per-frame viewer state consumed by the masked phase.

use glam::{Vec2, vec2};

use crate::fixed::{FRACBITS, Fixed};
use crate::world::SectorId;

/// Base resolution the weapon-overlay coordinate system is authored in.
pub const BASE_WIDTH: i32 = 320;
pub const BASE_HEIGHT: i32 = 200;
/// Weapon sprites hang from the vertical center of the base screen.
pub const BASE_YCENTER: i32 = BASE_HEIGHT / 2;

/// Read-only snapshot of the viewer for one rendered frame.
///
/// Produced by the main renderer before world traversal; this crate only
/// ever borrows it. Heights and positions are world units (`f32`), screen
/// stepping constants are 16.16 fixed.
#[derive(Clone, Debug)]
pub struct View {
    /// Eye position on the map plane.
    pub pos: Vec2,
    /// Absolute eye height.
    pub z: f32,
    /// Heading in radians (0 = east, counter-clockwise).
    pub yaw: f32,
    /// Sector containing the viewer (for fake floor/ceiling clipping).
    pub sector: SectorId,

    pub width: i32,
    pub height: i32,
    /// Horizontal screen center in pixels.
    pub centerx: f32,
    pub centery: i32,
    pub centeryfrac: Fixed,
    /// Pixels per world unit at depth 1 (`w/2 / tan(fov/2)`).
    pub focal: f32,

    /// Full-screen colormap override (invulnerability and friends).
    /// Non-`None` wins over every per-sprite light rule.
    pub fixed_colormap: Option<usize>,
    /// Gun-flash light boost.
    pub extra_light: i32,

    /* weapon overlay scaling, precomputed once per resolution */
    pub psprite_xscale: Fixed,
    pub psprite_yscale: Fixed,
    pub psprite_iscale: Fixed,
}

impl View {
    pub fn new(pos: Vec2, z: f32, yaw: f32, fov: f32, width: i32, height: i32, sector: SectorId) -> Self {
        let xscale = Fixed::from_f32(width as f32 / BASE_WIDTH as f32);
        View {
            pos,
            z,
            yaw,
            sector,
            width,
            height,
            centerx: width as f32 * 0.5,
            centery: height / 2,
            centeryfrac: Fixed((height / 2) << FRACBITS),
            focal: width as f32 * 0.5 / (fov * 0.5).tan(),
            fixed_colormap: None,
            extra_light: 0,
            psprite_xscale: xscale,
            psprite_yscale: Fixed::from_f32(height as f32 / BASE_HEIGHT as f32),
            psprite_iscale: Fixed::ONE.div(xscale),
        }
    }

    /// Transform a map point into view space:
    /// `.x` = lateral offset (+ right), `.y` = depth along the view axis.
    #[inline]
    pub fn to_cam(&self, p: Vec2) -> Vec2 {
        let dx = p.x - self.pos.x;
        let dy = p.y - self.pos.y;
        let (s, c) = self.yaw.sin_cos();
        vec2(dx * s - dy * c, dx * c + dy * s)
    }

    /// World angle from the eye to `p`, radians.
    #[inline]
    pub fn point_angle(&self, p: Vec2) -> f32 {
        (p.y - self.pos.y).atan2(p.x - self.pos.x)
    }
}

/*====================================================================*/
/*                                Tests                               */
/*====================================================================*/

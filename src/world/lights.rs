//! Diminished-light lookup tables.
//!
//! Lighting here is pure table lookup: a sector light level picks a row,
//! a sprite's perspective scale picks a column, and the cell is an index
//! into the backend's bank of colormaps (0 = brightest). The weapon
//! overlay keeps the original coarser table so fixed content keeps its
//! authored brightness steps.

use crate::fixed::Fixed;

pub const LIGHTLEVELS: usize = 32;
pub const LIGHTSEGSHIFT: i32 = 3;
/// Light rows gained per unit of gun-flash `extra_light`.
pub const LIGHTBRIGHT: i32 = 2;
pub const MAXLIGHTSCALE: usize = 48;
pub const LIGHTSCALESHIFT: i32 = 12;
pub const NUMCOLORMAPS: usize = 32;

/* compatibility tables used by the weapon overlay */
pub const OLDLIGHTLEVELS: usize = 16;
pub const OLDLIGHTSEGSHIFT: i32 = 4;
pub const OLDMAXLIGHTSCALE: usize = 32;

const DISTMAP: i32 = 2;

/// Precomputed colormap-index tables. Built once at startup.
pub struct LightTables {
    scale_light: Vec<[usize; MAXLIGHTSCALE]>,
    psp_scale_light: Vec<[usize; OLDMAXLIGHTSCALE]>,
    /// Colormap used by fullbright frames: no attenuation at all.
    pub fullbright: usize,
}

impl LightTables {
    pub fn new() -> Self {
        let mut scale_light = Vec::with_capacity(LIGHTLEVELS);
        for i in 0..LIGHTLEVELS {
            let startmap = ((LIGHTLEVELS - 1 - i) * 2 * NUMCOLORMAPS / LIGHTLEVELS) as i32;
            let mut row = [0usize; MAXLIGHTSCALE];
            for (j, cell) in row.iter_mut().enumerate() {
                let level = (startmap - j as i32 / DISTMAP).clamp(0, NUMCOLORMAPS as i32 - 1);
                *cell = level as usize;
            }
            scale_light.push(row);
        }

        let mut psp_scale_light = Vec::with_capacity(OLDLIGHTLEVELS);
        for i in 0..OLDLIGHTLEVELS {
            let startmap = ((OLDLIGHTLEVELS - 1 - i) * 2 * NUMCOLORMAPS / OLDLIGHTLEVELS) as i32;
            let mut row = [0usize; OLDMAXLIGHTSCALE];
            for (j, cell) in row.iter_mut().enumerate() {
                let level = (startmap - j as i32 / DISTMAP).clamp(0, NUMCOLORMAPS as i32 - 1);
                *cell = level as usize;
            }
            psp_scale_light.push(row);
        }

        LightTables {
            scale_light,
            psp_scale_light,
            fullbright: 0,
        }
    }

    /// Row index for a sector light level; picked once per sector while
    /// sprites are being added.
    pub fn sprite_row(&self, light_level: i32, extra_light: i32) -> usize {
        ((light_level >> LIGHTSEGSHIFT) + extra_light * LIGHTBRIGHT)
            .clamp(0, LIGHTLEVELS as i32 - 1) as usize
    }

    /// Diminished colormap for a sprite: row from the sector, column from
    /// the clamped perspective scale.
    pub fn sprite_colormap(&self, row: usize, scale: Fixed) -> usize {
        let col = (scale.0 >> LIGHTSCALESHIFT).clamp(0, MAXLIGHTSCALE as i32 - 1) as usize;
        self.scale_light[row][col]
    }

    /// Weapon-overlay colormap through the compatibility tables.
    pub fn psprite_colormap(&self, light_level: i32, extra_light: i32) -> usize {
        let lightnum = (light_level >> OLDLIGHTSEGSHIFT) + extra_light;
        let row = lightnum.clamp(0, OLDLIGHTLEVELS as i32 - 1) as usize;
        let col = (lightnum + 16).clamp(0, OLDMAXLIGHTSCALE as i32 - 1) as usize;
        self.psp_scale_light[row][col]
    }
}

impl Default for LightTables {
    fn default() -> Self {
        Self::new()
    }
}

/*====================================================================*/
/*                                Tests                               */
/*====================================================================*/

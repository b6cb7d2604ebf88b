//! Sprite rotation-frame tables.
//!
//! Built once at startup from the list of sprite patch lumps. A lump name
//! is the sprite's name followed by a frame letter and a rotation digit
//! (`'0'` = usable for every rotation, `'1'..'8'` = one of eight views);
//! a second letter/digit pair makes the same patch serve another frame
//! horizontally flipped.
//!
//! Inconsistent metadata here is the only fatal condition in the crate:
//! the per-frame path can silently skip an off-screen sprite, but it
//! cannot repair a frame that has no patch for the rotation it needs.

use thiserror::Error;

use crate::render::PatchId;
use crate::world::SpriteId;

pub const MAX_SPRITE_FRAMES: usize = 29;
pub const ROTATIONS: usize = 8;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpriteDefError {
    #[error("bad frame characters in lump `{0}`")]
    BadFrameChars(String),

    #[error("sprite `{name}` has no lumps for frame {frame}")]
    MissingFrame { name: String, frame: char },

    #[error("frame {frame} of sprite `{name}` is missing rotations")]
    MissingRotations { name: String, frame: char },
}

/// One animation frame: a patch per rotation plus per-rotation mirroring.
#[derive(Clone, Copy, Debug)]
pub struct SpriteFrame {
    /// False when a single patch covers every view angle.
    pub rotate: bool,
    lump: [PatchId; ROTATIONS],
    flip: u8,
}

impl SpriteFrame {
    #[inline]
    pub fn lump(&self, rot: usize) -> PatchId {
        self.lump[rot]
    }

    #[inline]
    pub fn flip(&self, rot: usize) -> bool {
        self.flip & (1 << rot) != 0
    }
}

#[derive(Clone, Debug)]
pub struct SpriteDef {
    frames: Vec<SpriteFrame>,
}

/// All sprite definitions, indexed by [`SpriteId`].
#[derive(Clone, Debug)]
pub struct SpriteDefs {
    defs: Vec<SpriteDef>,
}

/* working state while installing one sprite's lumps */
#[derive(Clone, Copy)]
struct TempFrame {
    rotate: Option<bool>,
    lump: [Option<PatchId>; ROTATIONS],
    flip: u8,
}

const EMPTY_FRAME: TempFrame = TempFrame {
    rotate: None,
    lump: [None; ROTATIONS],
    flip: 0,
};

impl SpriteDefs {
    /// Build definitions for `names` (sprite names in [`SpriteId`] order)
    /// from `(lump name, patch)` pairs. The frame/rotation characters sit
    /// directly after the sprite name, wherever it ends.
    pub fn build(names: &[&str], lumps: &[(&str, PatchId)]) -> Result<Self, SpriteDefError> {
        let mut defs = Vec::with_capacity(names.len());

        for name in names {
            let mut temp = [EMPTY_FRAME; MAX_SPRITE_FRAMES];
            let mut maxframe: i32 = -1;

            for (lump_name, patch) in lumps {
                if !lump_name.starts_with(name) {
                    continue;
                }
                let chars: Vec<char> = lump_name.chars().collect();
                let base = name.len();
                if chars.len() < base + 2 {
                    return Err(SpriteDefError::BadFrameChars(lump_name.to_string()));
                }
                install(
                    &mut temp,
                    &mut maxframe,
                    lump_name,
                    chars[base],
                    chars[base + 1],
                    *patch,
                    false,
                )?;
                if chars.len() >= base + 4 {
                    install(
                        &mut temp,
                        &mut maxframe,
                        lump_name,
                        chars[base + 2],
                        chars[base + 3],
                        *patch,
                        true,
                    )?;
                }
            }

            let numframes = (maxframe + 1) as usize;
            let mut frames = Vec::with_capacity(numframes);
            for (f, tf) in temp.iter().enumerate().take(numframes) {
                let frame_ch = (b'A' + f as u8) as char;
                match tf.rotate {
                    None => {
                        return Err(SpriteDefError::MissingFrame {
                            name: name.to_string(),
                            frame: frame_ch,
                        });
                    }
                    Some(rotate) => {
                        let mut lump = [0 as PatchId; ROTATIONS];
                        for (r, slot) in tf.lump.iter().enumerate() {
                            lump[r] = slot.ok_or_else(|| SpriteDefError::MissingRotations {
                                name: name.to_string(),
                                frame: frame_ch,
                            })?;
                        }
                        frames.push(SpriteFrame {
                            rotate,
                            lump,
                            flip: tf.flip,
                        });
                    }
                }
            }

            defs.push(SpriteDef { frames });
        }

        Ok(SpriteDefs { defs })
    }

    /// Frame table for one sprite. `frame` must come from content that was
    /// validated against these defs.
    #[inline]
    pub fn frame(&self, sprite: SpriteId, frame: u8) -> &SpriteFrame {
        &self.defs[sprite as usize].frames[frame as usize]
    }

    pub fn num_frames(&self, sprite: SpriteId) -> usize {
        self.defs[sprite as usize].frames.len()
    }
}

fn install(
    temp: &mut [TempFrame; MAX_SPRITE_FRAMES],
    maxframe: &mut i32,
    lump_name: &str,
    frame_ch: char,
    rot_ch: char,
    patch: PatchId,
    flipped: bool,
) -> Result<(), SpriteDefError> {
    let frame = (frame_ch as i32) - ('A' as i32);
    if !(0..MAX_SPRITE_FRAMES as i32).contains(&frame) {
        return Err(SpriteDefError::BadFrameChars(lump_name.to_string()));
    }
    let frame = frame as usize;
    if frame as i32 > *maxframe {
        *maxframe = frame as i32;
    }

    let tf = &mut temp[frame];
    match rot_ch {
        '0' => {
            // one patch for every view angle; earlier specific rotations win
            for r in 0..ROTATIONS {
                if tf.lump[r].is_none() {
                    tf.lump[r] = Some(patch);
                    if flipped {
                        tf.flip |= 1 << r;
                    }
                    tf.rotate = Some(false);
                }
            }
        }
        '1'..='8' => {
            let r = (rot_ch as u8 - b'1') as usize;
            if tf.lump[r].is_none() {
                tf.lump[r] = Some(patch);
                if flipped {
                    tf.flip |= 1 << r;
                }
                tf.rotate = Some(true);
            }
        }
        _ => return Err(SpriteDefError::BadFrameChars(lump_name.to_string())),
    }
    Ok(())
}

/*====================================================================*/
/*                                Tests                               */
/*====================================================================*/

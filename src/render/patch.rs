//! Sprite patches: run-length encoded columns of palette texels.
//!
//! A patch column is a list of [`Post`]s, each a vertical run of opaque
//! texels starting at some row. Gaps between posts are fully transparent,
//! which is what makes sprite drawing "masked": the rasterizer only ever
//! touches rows covered by a post.

use std::collections::HashMap;

use smallvec::SmallVec;
use thiserror::Error;

/// Index of a patch in the frame-wide patch cache.
pub type PatchId = u16;

/// One opaque run within a column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Post {
    /// First row of the run, relative to the top of the patch.
    pub top: i32,
    pub pixels: Vec<u8>,
}

/// All posts of one column, top to bottom. Most sprite columns are a
/// single run; two covers almost everything else.
#[derive(Clone, Debug, Default)]
pub struct PatchColumn {
    pub posts: SmallVec<[Post; 2]>,
}

/// A decoded sprite patch.
#[derive(Clone, Debug)]
pub struct Patch {
    pub width: i32,
    pub height: i32,
    /// Offsets as authored in the lump.
    pub left_offset: i32,
    pub top_offset: i32,
    /// Corrected offsets used by default; identical to the authored ones
    /// unless the patch shipped with known-bad values.
    pub render_left_offset: i32,
    pub render_top_offset: i32,
    pub columns: Vec<PatchColumn>,
}

impl Patch {
    /// Build a patch from a row-major pixel grid, treating `transparent`
    /// as the mask key. Offsets default to the sprite convention: centered
    /// horizontally, anchored at the bottom.
    pub fn from_pixels(width: i32, height: i32, pixels: &[u8], transparent: u8) -> Patch {
        let mut columns = Vec::with_capacity(width as usize);
        for x in 0..width {
            let mut col = PatchColumn::default();
            let mut run: Option<Post> = None;
            for y in 0..height {
                let px = pixels[(y * width + x) as usize];
                if px == transparent {
                    if let Some(post) = run.take() {
                        col.posts.push(post);
                    }
                } else {
                    run.get_or_insert_with(|| Post {
                        top: y,
                        pixels: Vec::new(),
                    })
                    .pixels
                    .push(px);
                }
            }
            if let Some(post) = run {
                col.posts.push(post);
            }
            columns.push(col);
        }
        Patch {
            width,
            height,
            left_offset: width / 2,
            top_offset: height,
            render_left_offset: width / 2,
            render_top_offset: height,
            columns,
        }
    }
}

/// Read access to decoded patches. The projector and rasterizer only need
/// lookups; who decodes and owns the patches is the caller's business.
pub trait PatchCache {
    fn patch(&self, id: PatchId) -> &Patch;
}

#[derive(Error, Debug)]
pub enum PatchBankError {
    #[error("duplicate patch name `{0}`")]
    Duplicate(String),
}

/// Simple owning patch store, addressable by id and by name.
#[derive(Default)]
pub struct PatchBank {
    patches: Vec<Patch>,
    by_name: HashMap<String, PatchId>,
}

impl PatchBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, patch: Patch) -> Result<PatchId, PatchBankError> {
        if self.by_name.contains_key(name) {
            return Err(PatchBankError::Duplicate(name.to_string()));
        }
        let id = self.patches.len() as PatchId;
        self.patches.push(patch);
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn id(&self, name: &str) -> Option<PatchId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

impl PatchCache for PatchBank {
    #[inline]
    fn patch(&self, id: PatchId) -> &Patch {
        &self.patches[id as usize]
    }
}

/*====================================================================*/
/*                                Tests                               */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    const T: u8 = 247; // mask key

    #[test]
    fn posts_split_on_transparency() {
        // one column: texel, gap, two texels
        #[rustfmt::skip]
        let pixels = [
            5,
            T,
            6,
            7,
        ];
        let p = Patch::from_pixels(1, 4, &pixels, T);
        let posts = &p.columns[0].posts;
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0], Post { top: 0, pixels: vec![5] });
        assert_eq!(posts[1], Post { top: 2, pixels: vec![6, 7] });
    }

    #[test]
    fn fully_transparent_column_has_no_posts() {
        let pixels = [T, T, T];
        let p = Patch::from_pixels(1, 3, &pixels, T);
        assert!(p.columns[0].posts.is_empty());
    }

    #[test]
    fn bank_rejects_duplicate_names() {
        let mut bank = PatchBank::new();
        let p = Patch::from_pixels(1, 1, &[1], T);
        let id = bank.insert("TROOA1", p.clone()).unwrap();
        assert_eq!(bank.id("TROOA1"), Some(id));
        assert!(matches!(
            bank.insert("TROOA1", p),
            Err(PatchBankError::Duplicate(_))
        ));
    }
}

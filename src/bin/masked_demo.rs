//! Renders one frame of a synthetic scene through the masked phase and
//! writes it out as a PPM image: a few monsters at different depths, a
//! blood splat, one see-through mid-texture wall, and the weapon overlay.

use std::f32::consts::{FRAC_PI_2, PI};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::vec2;

use masked_rs::defs::SpriteDefs;
use masked_rs::fixed::Fixed;
use masked_rs::render::{
    Backend, ColumnSpan, DrawSeg, FrameState, MaskedPhase, Openings, Options, PaintStyle, Patch,
    PatchBank, PlayerView, PspLayer, Scene, Silhouette, WeaponSprite,
};
use masked_rs::world::{
    Decal, DecalFlags, Entity, EntityFlags, LightTables, Sector, View, WorldState,
};

#[derive(Parser)]
#[command(about = "Render a demo frame of the masked sprite phase")]
struct Args {
    /// Viewport width in pixels
    #[arg(long, default_value_t = 640)]
    width: i32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 400)]
    height: i32,

    /// Output image path
    #[arg(long, default_value = "masked_demo.ppm")]
    out: PathBuf,

    /// Number of monsters to line up
    #[arg(long, default_value_t = 4)]
    sprites: u32,
}

/// Paints spans into a paletted framebuffer. Palette index 0 is the
/// background; the colormap darkens linearly.
struct SoftBackend {
    width: i32,
    height: i32,
    frame: Vec<u8>,
    /// Columns of masked segs already painted, keyed by (x, texture).
    masked_done: Vec<bool>,
}

impl SoftBackend {
    fn new(width: i32, height: i32) -> Self {
        SoftBackend {
            width,
            height,
            frame: vec![0; (width * height) as usize],
            masked_done: vec![false; width as usize],
        }
    }

    fn put(&mut self, x: i32, y: i32, px: u8) {
        if x >= 0 && x < self.width && y >= 0 && y < self.height {
            self.frame[(y * self.width + x) as usize] = px;
        }
    }

    fn shade(px: u8, colormap: usize) -> u8 {
        let dim = 32usize.saturating_sub(colormap);
        ((px as usize * dim / 32) as u8).max(1)
    }
}

impl Backend for SoftBackend {
    fn draw_column(&mut self, span: &ColumnSpan<'_>) {
        let mut frac = span.frac;
        for y in span.y1..=span.y2 {
            let px = match span.style {
                PaintStyle::Shadow => {
                    let old = self.frame[(y * self.width + span.x) as usize];
                    old / 2
                }
                PaintStyle::Fuzz | PaintStyle::PausedFuzz => {
                    let old = self.frame[(y * self.width + span.x) as usize];
                    old.saturating_sub(48)
                }
                _ => {
                    let texel = if span.source.is_empty() {
                        span.blood.unwrap_or(200)
                    } else {
                        let i = (frac.to_int().max(0) as usize).min(span.source.len() - 1);
                        span.source[i]
                    };
                    Self::shade(texel, span.colormap)
                }
            };
            self.put(span.x, y, px);
            frac += span.iscale;
        }
    }

    fn draw_masked_seg(&mut self, _seg: &DrawSeg, x1: i32, x2: i32) {
        // a dim curtain standing in for the mid-texture; each column is
        // painted at most once per frame
        for x in x1.max(0)..=x2.min(self.width - 1) {
            if self.masked_done[x as usize] {
                continue;
            }
            self.masked_done[x as usize] = true;
            for y in self.height / 4..self.height * 3 / 4 {
                if (x + y) % 3 == 0 {
                    self.put(x, y, 40);
                }
            }
        }
    }

    fn fill_view(&mut self, shade: u8) {
        self.frame.fill(shade);
    }

    fn finish_fuzz(&mut self, _paused: bool) {}
}

/// A crude humanoid silhouette as a sprite patch.
fn monster_patch() -> Patch {
    const W: i32 = 32;
    const H: i32 = 56;
    let mut pixels = vec![0u8; (W * H) as usize];
    for y in 0..H {
        for x in 0..W {
            let dx = (x - W / 2) as f32;
            let inside = if y < 12 {
                // head
                dx.abs() < 6.0
            } else if y < 40 {
                // torso, tapering
                dx.abs() < 10.0 - (y - 12) as f32 * 0.1
            } else {
                // legs
                dx.abs() > 2.0 && dx.abs() < 8.0
            };
            if inside {
                pixels[(y * W + x) as usize] = 160 + ((x * 3 + y) % 64) as u8;
            }
        }
    }
    Patch::from_pixels(W, H, &pixels, 0)
}

fn splat_patch() -> Patch {
    const W: i32 = 16;
    const H: i32 = 8;
    let mut pixels = vec![0u8; (W * H) as usize];
    for y in 0..H {
        for x in 0..W {
            let dx = (x - W / 2) as f32 / (W as f32 / 2.0);
            let dy = (y - H / 2) as f32 / (H as f32 / 2.0);
            if dx * dx + dy * dy < 1.0 {
                pixels[(y * W + x) as usize] = 176;
            }
        }
    }
    Patch::from_pixels(W, H, &pixels, 0)
}

fn pistol_patch() -> Patch {
    const W: i32 = 48;
    const H: i32 = 40;
    let mut pixels = vec![0u8; (W * H) as usize];
    for y in 0..H {
        for x in 0..W {
            let barrel = (18..30).contains(&x) && y < 24;
            let grip = (20..34).contains(&x) && y >= 24;
            if barrel || grip {
                pixels[(y * W + x) as usize] = 96 + (y % 32) as u8;
            }
        }
    }
    let mut p = Patch::from_pixels(W, H, &pixels, 0);
    p.left_offset = 0;
    p.render_left_offset = 0;
    p.top_offset = 0;
    p.render_top_offset = 0;
    p
}

fn write_ppm(path: &PathBuf, frame: &[u8], width: i32, height: i32) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "P6 {width} {height} 255")?;
    for &px in frame {
        // simple palette: low indices cool, high indices warm
        let rgb = [px.saturating_add(px / 4), px, px / 2];
        out.write_all(&rgb)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut bank = PatchBank::new();
    let monster = bank.insert("DEMOA0", monster_patch())?;
    let splat = bank.insert("SPLT00", splat_patch())?;
    bank.insert("PISGA0", pistol_patch())?;
    let defs = SpriteDefs::build(
        &["DEMO", "PISG"],
        &[("DEMOA0", monster), ("PISGA0", bank.id("PISGA0").unwrap())],
    )?;

    let sectors = [Sector {
        floor_h: 0.0,
        ceil_h: 128.0,
        light: 192,
        ..Sector::default()
    }];
    let view = View::new(
        vec2(0.0, 0.0),
        41.0,
        0.0,
        FRAC_PI_2,
        args.width,
        args.height,
        0,
    );

    // one see-through wall crossing the middle distance
    let mut openings = Openings::new();
    let n = (args.width / 2 + 1) as usize;
    let top_clip = openings.alloc(n);
    let bot_clip = openings.alloc(n);
    openings.slice_mut(&top_clip).fill((args.height / 4) as i16);
    openings
        .slice_mut(&bot_clip)
        .fill((args.height * 3 / 4) as i16);
    let segs = [DrawSeg {
        v1: vec2(150.0, -200.0),
        v2: vec2(150.0, 200.0),
        x1: args.width / 4,
        x2: args.width * 3 / 4,
        scale1: Fixed::from_f32(view.focal / 150.0),
        scale2: Fixed::from_f32(view.focal / 150.0),
        silhouette: Silhouette::SOLID,
        masked_mid: Some(1),
        top_clip,
        bot_clip,
    }];

    let scene = Scene {
        view: &view,
        sectors: &sectors,
        state: WorldState { liquid_bob: 0.0 },
        defs: &defs,
        cache: &bank,
        segs: &segs,
        openings: &openings,
    };

    let mut entities = Vec::new();
    for i in 0..args.sprites {
        let depth = 80.0 + i as f32 * 90.0;
        let lateral = (i as f32 - args.sprites as f32 / 2.0) * 60.0;
        entities.push(Entity {
            pos: vec2(depth, lateral),
            angle: PI,
            sprite: 0,
            flags: EntityFlags::CAST_SHADOW,
            ..Entity::default()
        });
    }

    let decals = [Decal {
        pos: vec2(60.0, -20.0),
        patch: splat,
        blood: 176,
        flags: DecalFlags::empty(),
        painter: PaintStyle::Opaque,
        sector: 0,
    }];

    let player = PlayerView {
        layers: [
            Some(PspLayer {
                sprite: 1,
                weapon: WeaponSprite::Pistol,
                frame: 0,
                fullbright: false,
                sx: Fixed::from_int(1),
                sy: Fixed::from_int(32),
                translucent: false,
            }),
            None,
        ],
        ..PlayerView::default()
    };

    let mut phase = MaskedPhase::new(LightTables::new(), Options::default());
    phase.clear_frame(FrameState::default());
    phase.add_sprites(&sectors[0], sectors[0].light, &entities, &decals, &scene);

    println!(
        "projected {} sprites, {} decals",
        phase.num_vissprites(),
        phase.num_decal_vissprites()
    );

    let mut backend = SoftBackend::new(args.width, args.height);
    phase.draw_masked(&scene, Some(&player), &mut backend);

    write_ppm(&args.out, &backend.frame, args.width, args.height)?;
    println!("wrote {}", args.out.display());
    Ok(())
}

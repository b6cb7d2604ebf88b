//! Player weapon overlay.
//!
//! Weapon sprites live in a fixed 320x200 coordinate system and are
//! scaled to the viewport, never clipped by world geometry, and drawn
//! last. The bob position is interpolated between simulation ticks
//! through a small cache that survives across frames.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::fixed::{FRACUNIT, Fixed};
use crate::render::patch::PatchId;
use crate::render::{Backend, Blend, MaskedPhase, PaintStyle, Scene, VisSprite};
use crate::world::{BASE_WIDTH, BASE_YCENTER, SpriteId};

/// Palette shade used to dim the view behind an invisible player's weapon.
const INVISIBILITY_SHADE: u8 = 251;

/// Weapon sprite classes with special flash handling. Anything content
/// adds beyond the stock set is [`WeaponSprite::Other`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum WeaponSprite {
    Fist,
    Chainsaw,
    Pistol,
    PistolFlash,
    Shotgun,
    ShotgunFlash,
    SuperShotgun,
    Chaingun,
    ChaingunFlash,
    RocketLauncher,
    RocketFlash,
    Plasma,
    PlasmaFlash,
    Bfg,
    BfgFlash,
    Other,
}

/// Paint style per weapon sprite while a muzzle flash is active: normal,
/// and the downgraded variant used under a fixed colormap.
static FLASH_STYLES: Lazy<HashMap<WeaponSprite, (PaintStyle, PaintStyle)>> = Lazy::new(|| {
    use Blend::*;
    use PaintStyle::{Opaque, Translucent};
    use WeaponSprite::*;

    HashMap::from([
        (Fist, (Opaque, Opaque)),
        (Chainsaw, (Opaque, Opaque)),
        (Pistol, (Opaque, Opaque)),
        (PistolFlash, (Translucent(Tl), Translucent(Tl50))),
        (Shotgun, (Opaque, Opaque)),
        (ShotgunFlash, (Translucent(Tl), Translucent(Tl50))),
        (SuperShotgun, (Translucent(RedWhite1), Translucent(RedWhite50))),
        (Chaingun, (Opaque, Opaque)),
        (ChaingunFlash, (Translucent(RedWhite2), Translucent(RedWhite50))),
        (RocketLauncher, (Opaque, Opaque)),
        (RocketFlash, (Translucent(RedWhite2), Translucent(RedWhite50))),
        (Plasma, (Opaque, Opaque)),
        (PlasmaFlash, (Translucent(Tl), Translucent(Tl50))),
        (Bfg, (Opaque, Opaque)),
        (BfgFlash, (Translucent(Tl), Translucent(Tl50))),
    ])
});

/// One active weapon layer (the gun, or the muzzle flash drawn over it).
#[derive(Clone, Copy, Debug)]
pub struct PspLayer {
    pub sprite: SpriteId,
    pub weapon: WeaponSprite,
    pub frame: u8,
    pub fullbright: bool,
    /// Bob position in base-screen 16.16 coordinates.
    pub sx: Fixed,
    pub sy: Fixed,
    /// Modified content explicitly marked this state translucent.
    pub translucent: bool,
}

/// Everything the overlay needs to know about the viewing player.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlayerView {
    /// Weapon layer and flash layer, either possibly inactive.
    pub layers: [Option<PspLayer>; 2],
    /// Invisibility power countdown; the weapon turns to fuzz while it
    /// is high or blinking out.
    pub invisibility: i32,
    /// The ready weapon's definition came from modified content, so the
    /// authored patch offsets apply.
    pub weapon_modified: bool,
}

/// Weapon-bob interpolation cache.
#[derive(Default)]
pub(crate) struct PspInterp {
    x1: i32,
    x1_prev: i32,
    texturemid: Fixed,
    texturemid_prev: Fixed,
    patch: Option<PatchId>,
}

impl MaskedPhase {
    pub(crate) fn draw_player_sprites(
        &mut self,
        player: &PlayerView,
        scene: &Scene<'_>,
        backend: &mut dyn Backend,
    ) {
        let invisible = player.invisibility > 128 || (player.invisibility & 8) != 0;

        if invisible && self.opts.textures {
            backend.fill_view(INVISIBILITY_SHADE);
            for layer in player.layers.iter().flatten() {
                self.draw_psprite(layer, player, true, false, scene, backend);
            }
            backend.finish_fuzz(self.pause_sprites);
        } else {
            // a flash on either layer brightens both
            let muzzleflash = player.layers.iter().flatten().any(|l| l.fullbright);
            for layer in player.layers.iter().flatten() {
                self.draw_psprite(layer, player, false, muzzleflash, scene, backend);
            }
        }
    }

    fn draw_psprite(
        &mut self,
        layer: &PspLayer,
        player: &PlayerView,
        invisibility: bool,
        muzzleflash: bool,
        scene: &Scene<'_>,
        backend: &mut dyn Backend,
    ) {
        let view = scene.view;
        let lump = scene.defs.frame(layer.sprite, layer.frame).lump(0);
        let patch = scene.cache.patch(lump);

        let xoff = if player.weapon_modified {
            patch.left_offset
        } else {
            patch.render_left_offset
        };

        // edges of the shape, in base-screen space scaled out
        let centerxfrac = Fixed::from_f32(view.centerx);
        let half = Fixed(FRACUNIT / 2);
        let mut tx = layer.sx - Fixed::from_int(BASE_WIDTH / 2) - Fixed::from_int(xoff);
        let x1 = (centerxfrac + half + tx.mul(view.psprite_xscale)).to_int();
        tx += Fixed::from_int(patch.width);
        let x2 = (centerxfrac + half + tx.mul(view.psprite_xscale)).to_int() - 1;

        let mut x1c = x1.max(0);
        let mut x2c = x2.min(view.width - 1);
        let mut texturemid = Fixed::from_int(BASE_YCENTER) + Fixed(FRACUNIT / 4)
            - (layer.sy - Fixed::from_int(patch.top_offset));

        let (style, colormap) = if invisibility {
            (PaintStyle::Fuzz, 0)
        } else {
            let style = self.weapon_style(layer, player, muzzleflash, scene);
            let colormap = if let Some(fc) = view.fixed_colormap {
                fc
            } else if muzzleflash || layer.fullbright {
                self.lights.fullbright
            } else {
                let sec = &scene.sectors[view.sector as usize];
                let light = sec
                    .floor_light_sec
                    .map(|s| scene.sectors[s as usize].light)
                    .unwrap_or(sec.light);
                self.lights.psprite_colormap(light, view.extra_light)
            };
            (style, colormap)
        };

        if self.interpolate_sprites {
            if self.real_frame {
                self.psp_interp.x1 = self.psp_interp.x1_prev;
                self.psp_interp.texturemid = self.psp_interp.texturemid_prev;
            }
            self.psp_interp.x1_prev = x1c;
            self.psp_interp.texturemid_prev = texturemid;

            if self.psp_interp.patch == Some(lump)
                && !self.skip_psp_interp
                && !self.skip_psp_interp2
            {
                let ft = Fixed::from_f32(self.frac_tic);
                let dx = x2c - x1c;
                x1c = self.psp_interp.x1 + ft.mul(Fixed::from_int(x1c - self.psp_interp.x1)).to_int();
                x2c = x1c + dx;
                texturemid = self.psp_interp.texturemid
                    + ft.mul(texturemid - self.psp_interp.texturemid);
            } else {
                self.psp_interp.x1 = x1c;
                self.psp_interp.texturemid = texturemid;
                self.psp_interp.patch = Some(lump);
                // a requested skip suppresses interpolation for this
                // frame and the next one
                self.skip_psp_interp2 = self.skip_psp_interp;
                self.skip_psp_interp = false;
            }
        }

        let vis = VisSprite {
            x1: x1c,
            x2: x2c,
            scale: view.psprite_yscale,
            patch: lump,
            startfrac: Fixed::ZERO,
            xiscale: view.psprite_iscale,
            texturemid,
            colormap,
            style,
            ..VisSprite::default()
        };
        self.rasterize_overlay(&vis, scene, backend);
    }

    fn weapon_style(
        &self,
        layer: &PspLayer,
        player: &PlayerView,
        muzzleflash: bool,
        scene: &Scene<'_>,
    ) -> PaintStyle {
        // the stock super-shotgun idle/flash frames get a dedicated
        // palette tweak when the stock patch is still in place
        if layer.weapon == WeaponSprite::SuperShotgun
            && ((layer.frame == 0 && !layer.fullbright) || layer.fullbright)
            && self.opts.supershotgun_tweak
        {
            return PaintStyle::SuperShotgun;
        }

        if self.opts.translucency {
            if layer.weapon == WeaponSprite::SuperShotgun {
                return if layer.frame != 0 && layer.fullbright {
                    PaintStyle::Translucent(Blend::RedWhite1)
                } else {
                    PaintStyle::Opaque
                };
            }
            if muzzleflash
                && layer.weapon != WeaponSprite::Other
                && (!player.weapon_modified || layer.translucent)
            {
                if let Some(&(normal, fixed)) = FLASH_STYLES.get(&layer.weapon) {
                    return if scene.view.fixed_colormap.is_some() {
                        fixed
                    } else {
                        normal
                    };
                }
            }
        }

        PaintStyle::Opaque
    }
}

/*====================================================================*/
/*                                Tests                               */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::SpriteDefs;
    use crate::render::{
        ColumnSpan, DrawSeg, FrameState, Openings, Options, Patch, PatchBank,
    };
    use crate::world::{LightTables, Sector, View, WorldState};
    use glam::vec2;
    use std::f32::consts::FRAC_PI_2;

    struct Recorder {
        spans: Vec<(i32, i32, i32, PaintStyle, usize)>,
        fills: u32,
        fuzz_finishes: u32,
    }

    impl Recorder {
        fn new() -> Self {
            Recorder { spans: Vec::new(), fills: 0, fuzz_finishes: 0 }
        }
    }

    impl Backend for Recorder {
        fn draw_column(&mut self, span: &ColumnSpan<'_>) {
            self.spans
                .push((span.x, span.y1, span.y2, span.style, span.colormap));
        }
        fn draw_masked_seg(&mut self, _seg: &DrawSeg, _x1: i32, _x2: i32) {}
        fn fill_view(&mut self, _shade: u8) {
            self.fills += 1;
        }
        fn finish_fuzz(&mut self, _paused: bool) {
            self.fuzz_finishes += 1;
        }
    }

    struct Fixture {
        bank: PatchBank,
        defs: SpriteDefs,
        view: View,
        sectors: [Sector; 1],
        openings: Openings,
    }

    fn fixture() -> Fixture {
        let mut bank = PatchBank::new();
        // 64x48 weapon-ish patch, fully opaque
        let mut p = Patch::from_pixels(64, 48, &[3u8; 64 * 48], 0);
        p.left_offset = 0;
        p.render_left_offset = 0;
        p.top_offset = 0;
        p.render_top_offset = 0;
        bank.insert("PISGA0", p).unwrap();
        let defs =
            SpriteDefs::build(&["PISG"], &[("PISGA0", bank.id("PISGA0").unwrap())]).unwrap();
        Fixture {
            bank,
            defs,
            view: View::new(vec2(0.0, 0.0), 41.0, 0.0, FRAC_PI_2, 320, 200, 0),
            sectors: [Sector::default()],
            openings: Openings::new(),
        }
    }

    fn scene(f: &Fixture) -> Scene<'_> {
        Scene {
            view: &f.view,
            sectors: &f.sectors,
            state: WorldState::default(),
            defs: &f.defs,
            cache: &f.bank,
            segs: &[],
            openings: &f.openings,
        }
    }

    fn gun_layer(sx: i32) -> PspLayer {
        PspLayer {
            sprite: 0,
            weapon: WeaponSprite::Pistol,
            frame: 0,
            fullbright: false,
            sx: Fixed::from_int(sx),
            sy: Fixed::from_int(32),
            translucent: false,
        }
    }

    fn phase() -> MaskedPhase {
        let mut p = MaskedPhase::new(LightTables::new(), Options::default());
        p.clear_frame(FrameState::default());
        p
    }

    #[test]
    fn weapon_layer_is_drawn() {
        let f = fixture();
        let sc = scene(&f);
        let mut ph = phase();
        let mut rec = Recorder::new();

        let player = PlayerView {
            layers: [Some(gun_layer(1)), None],
            ..PlayerView::default()
        };
        ph.draw_player_sprites(&player, &sc, &mut rec);
        assert!(!rec.spans.is_empty());
        assert!(rec.spans.iter().all(|s| s.3 == PaintStyle::Opaque));
        assert_eq!(rec.fills, 0);
    }

    #[test]
    fn invisibility_turns_weapon_to_fuzz() {
        let f = fixture();
        let sc = scene(&f);
        let mut ph = phase();
        let mut rec = Recorder::new();

        let player = PlayerView {
            layers: [Some(gun_layer(1)), None],
            invisibility: 200,
            ..PlayerView::default()
        };
        ph.draw_player_sprites(&player, &sc, &mut rec);
        assert_eq!(rec.fills, 1);
        assert_eq!(rec.fuzz_finishes, 1);
        assert!(rec.spans.iter().all(|s| s.3 == PaintStyle::Fuzz));
    }

    #[test]
    fn muzzle_flash_brightens_both_layers() {
        let f = fixture();
        let sc = scene(&f);
        let mut ph = phase();
        let fullbright = ph.lights.fullbright;
        let mut rec = Recorder::new();

        let flash = PspLayer {
            weapon: WeaponSprite::PistolFlash,
            fullbright: true,
            ..gun_layer(1)
        };
        let player = PlayerView {
            layers: [Some(gun_layer(1)), Some(flash)],
            ..PlayerView::default()
        };
        ph.draw_player_sprites(&player, &sc, &mut rec);
        assert!(!rec.spans.is_empty());
        assert!(rec.spans.iter().all(|s| s.4 == fullbright));
        // flash layer painted translucent, gun stays opaque
        assert!(rec
            .spans
            .iter()
            .any(|s| s.3 == PaintStyle::Translucent(Blend::Tl)));
        assert!(rec.spans.iter().any(|s| s.3 == PaintStyle::Opaque));
    }

    #[test]
    fn fixed_colormap_downgrades_flash_blend() {
        let mut f = fixture();
        f.view.fixed_colormap = Some(0);
        let sc = scene(&f);
        let mut ph = phase();
        let mut rec = Recorder::new();

        let flash = PspLayer {
            weapon: WeaponSprite::PistolFlash,
            fullbright: true,
            ..gun_layer(1)
        };
        let player = PlayerView {
            layers: [None, Some(flash)],
            ..PlayerView::default()
        };
        ph.draw_player_sprites(&player, &sc, &mut rec);
        assert!(rec
            .spans
            .iter()
            .all(|s| s.3 == PaintStyle::Translucent(Blend::Tl50)));
    }

    #[test]
    fn bob_interpolation_moves_halfway() {
        let f = fixture();
        let sc = scene(&f);
        let mut ph = phase();

        // frame 1: establish the cache at sx=0
        ph.clear_frame(FrameState {
            interpolate: true,
            frac_tic: 0.0,
            real_frame: true,
            ..FrameState::default()
        });
        let mut rec = Recorder::new();
        let player = PlayerView {
            layers: [Some(gun_layer(0)), None],
            ..PlayerView::default()
        };
        ph.draw_player_sprites(&player, &sc, &mut rec);
        let x_first = rec.spans.iter().map(|s| s.0).min().unwrap();

        // frame 2, same tick half elapsed: weapon bobbed 16 units right
        ph.clear_frame(FrameState {
            interpolate: true,
            frac_tic: 0.5,
            real_frame: false,
            ..FrameState::default()
        });
        let mut rec2 = Recorder::new();
        let player2 = PlayerView {
            layers: [Some(gun_layer(16)), None],
            ..PlayerView::default()
        };
        ph.draw_player_sprites(&player2, &sc, &mut rec2);
        let x_second = rec2.spans.iter().map(|s| s.0).min().unwrap();

        // 16 base units = 16 screen pixels at 320 wide; halfway = 8
        assert_eq!(x_second - x_first, 8);
    }

    #[test]
    fn interpolation_skip_holds_for_one_frame() {
        let f = fixture();
        let sc = scene(&f);
        let mut ph = phase();

        ph.clear_frame(FrameState {
            interpolate: true,
            frac_tic: 0.5,
            real_frame: true,
            ..FrameState::default()
        });
        let mut rec = Recorder::new();
        let player = PlayerView {
            layers: [Some(gun_layer(0)), None],
            ..PlayerView::default()
        };
        ph.draw_player_sprites(&player, &sc, &mut rec);

        // weapon switch: skip requested, new position must not be blended
        ph.skip_weapon_interpolation();
        ph.clear_frame(FrameState {
            interpolate: true,
            frac_tic: 0.5,
            real_frame: false,
            ..FrameState::default()
        });
        let mut rec2 = Recorder::new();
        let player2 = PlayerView {
            layers: [Some(gun_layer(32)), None],
            ..PlayerView::default()
        };
        ph.draw_player_sprites(&player2, &sc, &mut rec2);
        let x_skip = rec2.spans.iter().map(|s| s.0).min().unwrap();
        let x_base = rec.spans.iter().map(|s| s.0).min().unwrap();
        // full 32-pixel jump, no halfway blend
        assert_eq!(x_skip - x_base, 32);
    }

    #[test]
    fn super_shotgun_idle_gets_palette_tweak() {
        let f = fixture();
        let sc = scene(&f);
        let ph = phase();
        let player = PlayerView::default();

        let idle = PspLayer {
            weapon: WeaponSprite::SuperShotgun,
            frame: 0,
            fullbright: false,
            ..gun_layer(1)
        };
        assert_eq!(
            ph.weapon_style(&idle, &player, false, &sc),
            PaintStyle::SuperShotgun
        );

        // later non-flash frames are plain opaque
        let pumping = PspLayer { frame: 3, ..idle };
        assert_eq!(
            ph.weapon_style(&pumping, &player, false, &sc),
            PaintStyle::Opaque
        );
    }

    #[test]
    fn modified_weapon_flash_stays_opaque_unless_marked() {
        let f = fixture();
        let sc = scene(&f);
        let ph = phase();
        let player = PlayerView {
            weapon_modified: true,
            ..PlayerView::default()
        };

        let flash = PspLayer {
            weapon: WeaponSprite::PistolFlash,
            fullbright: true,
            ..gun_layer(1)
        };
        assert_eq!(
            ph.weapon_style(&flash, &player, true, &sc),
            PaintStyle::Opaque
        );

        let marked = PspLayer { translucent: true, ..flash };
        assert_eq!(
            ph.weapon_style(&marked, &player, true, &sc),
            PaintStyle::Translucent(Blend::Tl)
        );
    }
}

//! Projection: world things to screen-space visibility records.
//!
//! Called once per sector during world traversal. Everything that can be
//! rejected is rejected here, before a record is allocated: behind the
//! near plane, outside the horizontal or vertical frustum, or fully
//! hidden by a fake floor/ceiling plane.

use std::f32::consts::{FRAC_PI_4, PI, TAU};

use crate::fixed::{FRACUNIT, Fixed};
use crate::render::vislist::DecalVis;
use crate::render::{MAX_VISIBLE_DECALS, MaskedPhase, PaintStyle, Scene, ShadowPass, VisSprite};
use crate::world::{Decal, DecalFlags, Entity, EntityFlags, Sector};

/// Near-plane depth in world units.
const MINZ: f32 = 4.0;
/// Decals smaller than quarter scale are not worth a record.
const MIN_DECAL_SCALE: Fixed = Fixed(FRACUNIT / 4);
/// Centers the eight 45-degree rotation sectors on their view angles.
const ROTATION_BIAS: f32 = PI * 9.0 / 8.0;

/// Eight-way rotation index for viewing a thing facing `thing_angle` from
/// direction `view_angle`. Index 0 is the sprite facing the viewer.
#[inline]
fn rotation_index(view_angle: f32, thing_angle: f32) -> usize {
    (((view_angle - thing_angle + ROTATION_BIAS).rem_euclid(TAU)) / FRAC_PI_4) as usize & 7
}

impl MaskedPhase {
    /// Project all entities and decals of one visited sector.
    /// `light_level` is passed separately so sectors with fake planes can
    /// substitute the corrected value.
    pub fn add_sprites(
        &mut self,
        sector: &Sector,
        light_level: i32,
        entities: &[Entity],
        decals: &[Decal],
        scene: &Scene<'_>,
    ) {
        self.sprite_light_row = self
            .lights
            .sprite_row(light_level, scene.view.extra_light);

        // decals are only visible on floors below the eye
        if self.opts.decals && sector.floor_h <= scene.view.z {
            for decal in decals {
                self.project_decal(decal, scene);
            }
        }

        self.draw_shadows = self.opts.shadows
            && scene.view.fixed_colormap.is_none()
            && !sector.floor_is_sky;

        for thing in entities {
            self.project_entity(thing, sector, scene);
        }
    }

    fn project_entity(&mut self, thing: &Entity, sector: &Sector, scene: &Scene<'_>) {
        if thing.flags.contains(EntityFlags::HIDDEN) {
            return;
        }
        let view = scene.view;

        let (fpos, fz) =
            if self.interpolate_sprites && thing.flags.contains(EntityFlags::INTERPOLATE) {
                (
                    thing.prev_pos + (thing.pos - thing.prev_pos) * self.frac_tic,
                    thing.prev_z + (thing.z - thing.prev_z) * self.frac_tic,
                )
            } else {
                (thing.pos, thing.z)
            };

        let cam = view.to_cam(fpos);
        let (mut tx, tz) = (cam.x, cam.y);
        if tz < MINZ {
            return;
        }
        // crude lateral cull before any patch lookup
        if tx.abs() > tz * 4.0 {
            return;
        }
        let xscale = view.focal / tz;

        let frame = scene.defs.frame(thing.sprite, thing.frame);
        let (lump, rot) = if frame.rotate {
            let rot = rotation_index(view.point_angle(fpos), thing.angle);
            (frame.lump(rot), rot)
        } else {
            (frame.lump(0), 0)
        };
        let flip = frame.flip(rot) || thing.flags.contains(EntityFlags::MIRRORED);

        let patch = scene.cache.patch(lump);
        let (xoff, yoff) = if thing.flags.contains(EntityFlags::COMPAT_OFFSETS) {
            (patch.left_offset, patch.top_offset)
        } else {
            (patch.render_left_offset, patch.render_top_offset)
        };
        let width = patch.width as f32;

        tx -= if flip {
            width - xoff as f32
        } else {
            xoff as f32
        };
        let x1 = (view.centerx + tx * xscale).floor() as i32;
        if x1 > view.width {
            return;
        }
        let x2 = ((view.centerx + (tx + width) * xscale - 0.5).floor() as i32) - 1;
        if x2 < 0 {
            return;
        }

        let gzt = fz + yoff as f32;
        // vertical frustum cull
        let half_span = view.height as f32 / xscale;
        if fz > view.z + half_span || gzt < view.z - half_span {
            return;
        }

        // things fully on the far side of a fake floor/ceiling plane are
        // invisible from here; the plane itself covers them. Only whole
        // rejects when the viewer stands in a special sector too; otherwise
        // the per-column pass does all the clipping.
        if let Some(hs) = sector.heightsec {
            let fake = &scene.sectors[hs as usize];
            if let Some(eye) = scene.sectors[view.sector as usize]
                .heightsec
                .map(|s| &scene.sectors[s as usize])
            {
                if view.z < eye.floor_h {
                    if fz >= fake.floor_h {
                        return;
                    }
                } else if gzt < fake.floor_h {
                    return;
                }

                if view.z > eye.ceil_h {
                    if gzt < fake.ceil_h && view.z >= fake.ceil_h {
                        return;
                    }
                } else if fz >= fake.ceil_h {
                    return;
                }
            }
        }

        let scale = Fixed::from_f32(xscale);

        let colormap = if let Some(fc) = view.fixed_colormap {
            fc
        } else if thing.frame_bright && (rot <= 2 || rot >= 6 || thing.always_bright) {
            self.lights.fullbright
        } else {
            self.lights.sprite_colormap(self.sprite_light_row, scale)
        };

        let style = if thing.flags.contains(EntityFlags::FUZZ)
            && self.pause_sprites
            && self.opts.textures
        {
            PaintStyle::PausedFuzz
        } else {
            thing.painter
        };

        let mut texturemid = Fixed::from_f32(gzt - view.z);
        let mut footclip = Fixed::ZERO;
        if thing.flags.contains(EntityFlags::FEET_CLIPPED)
            && fz <= sector.floor_h + 1.0
            && sector.heightsec.is_none()
            && self.opts.liquid_clip
        {
            let clip = Fixed::from_int((patch.height / 4).min(10));
            texturemid -= clip;
            footclip = if self.opts.liquid_bob {
                clip + Fixed::from_f32(scene.state.liquid_bob)
            } else {
                clip
            };
        }

        let cx1 = x1.max(0);
        let cx2 = x2.min(view.width - 1);
        let iscale = Fixed::ONE.div(scale);
        let (mut startfrac, xiscale) = if flip {
            (Fixed::from_int(patch.width) - Fixed(1), -iscale)
        } else {
            (Fixed::ZERO, iscale)
        };
        if cx1 > x1 {
            startfrac += xiscale * (cx1 - x1);
        }

        let shadow = if self.draw_shadows
            && thing.flags.contains(EntityFlags::CAST_SHADOW)
            && !sector.is_liquid
        {
            Some(ShadowPass {
                style: thing.shadow_painter,
                floor_h: sector.floor_h,
                offset: thing.shadow_offset,
            })
        } else {
            None
        };

        let record = VisSprite {
            x1: cx1,
            x2: cx2,
            scale,
            gpos: fpos,
            gz: sector.floor_h,
            gzt,
            patch: lump,
            startfrac,
            xiscale,
            texturemid,
            footclip,
            colormap,
            style,
            translation: thing.translation,
            heightsec: sector.heightsec,
            shadow,
        };
        if let Some(slot) = self.vis.insert(scale) {
            *slot = record;
        }
    }

    fn project_decal(&mut self, decal: &Decal, scene: &Scene<'_>) {
        if self.decals.len() >= MAX_VISIBLE_DECALS {
            return;
        }
        let view = scene.view;

        let cam = view.to_cam(decal.pos);
        let (mut tx, tz) = (cam.x, cam.y);
        if tz < MINZ {
            return;
        }
        if tx.abs() > tz * 4.0 {
            return;
        }
        let xscale = view.focal / tz;
        let scale = Fixed::from_f32(xscale);
        if scale < MIN_DECAL_SCALE {
            return;
        }

        let patch = scene.cache.patch(decal.patch);
        let width = patch.width as f32;
        tx -= width * 0.5;

        let x1 = (view.centerx + 0.5 + tx * xscale).floor() as i32;
        if x1 > view.width {
            return;
        }
        let x2 = ((view.centerx + 0.5 + (tx + width) * xscale).floor() as i32) - 1;
        if x2 < 0 {
            return;
        }

        let colormap = match view.fixed_colormap {
            Some(fc) => fc,
            None => self.lights.sprite_colormap(self.sprite_light_row, scale),
        };
        let style = if decal.flags.contains(DecalFlags::FUZZ)
            && self.pause_sprites
            && self.opts.textures
        {
            PaintStyle::PausedFuzz
        } else {
            decal.painter
        };

        let cx1 = x1.max(0);
        let cx2 = x2.min(view.width - 1);
        let iscale = Fixed::ONE.div(scale);
        let (mut startfrac, xiscale) = if decal.flags.contains(DecalFlags::MIRRORED) {
            (Fixed::from_int(patch.width) - Fixed(1), -iscale)
        } else {
            (Fixed::ZERO, iscale)
        };
        if cx1 > x1 {
            startfrac += xiscale * (cx1 - x1);
        }

        let floor_h = scene.sectors[decal.sector as usize].floor_h;
        self.decals.push(DecalVis {
            x1: cx1,
            x2: cx2,
            scale,
            gpos: decal.pos,
            patch: decal.patch,
            startfrac,
            xiscale,
            texturemid: Fixed::from_f32(floor_h - view.z),
            colormap,
            style,
            blood: decal.blood,
        });
    }
}

/*====================================================================*/
/*                                Tests                               */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::SpriteDefs;
    use crate::render::{FrameState, Openings, Options, Patch, PatchBank};
    use crate::world::{LightTables, View, WorldState};
    use glam::vec2;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn test_bank() -> PatchBank {
        let mut bank = PatchBank::new();
        // 4x8 opaque block
        let pixels = vec![1u8; 32];
        for rot in 1..=8 {
            let p = Patch::from_pixels(4, 8, &pixels, 0);
            bank.insert(&format!("TSTA{rot}"), p).unwrap();
        }
        bank.insert("TSTB0", Patch::from_pixels(4, 8, &pixels, 0))
            .unwrap();
        bank
    }

    fn test_defs(bank: &PatchBank) -> SpriteDefs {
        let names: Vec<(String, crate::render::PatchId)> = (1..=8)
            .map(|r| (format!("TSTA{r}"), bank.id(&format!("TSTA{r}")).unwrap()))
            .chain(std::iter::once(("TSTB0".to_string(), bank.id("TSTB0").unwrap())))
            .collect();
        let borrowed: Vec<(&str, _)> = names.iter().map(|(n, p)| (n.as_str(), *p)).collect();
        SpriteDefs::build(&["TST"], &borrowed).unwrap()
    }

    fn scene<'a>(
        view: &'a View,
        sectors: &'a [crate::world::Sector],
        defs: &'a SpriteDefs,
        bank: &'a PatchBank,
        openings: &'a Openings,
    ) -> Scene<'a> {
        Scene {
            view,
            sectors,
            state: WorldState::default(),
            defs,
            cache: bank,
            segs: &[],
            openings,
        }
    }

    fn phase() -> MaskedPhase {
        let mut p = MaskedPhase::new(LightTables::new(), Options::default());
        p.clear_frame(FrameState::default());
        p
    }

    #[test]
    fn rotation_faces_viewer() {
        // looking straight at a thing that faces us: rotation 0
        assert_eq!(rotation_index(PI, 0.0), 0);
        // thing facing away shows its back (rotation 4)
        assert_eq!(rotation_index(0.0, 0.0), 4);
        // quarter turns land on the odd/even sectors either side
        assert_eq!(rotation_index(PI + FRAC_PI_2, 0.0), 2);
        assert_eq!(rotation_index(PI - FRAC_PI_2, 0.0), 6);
    }

    #[test]
    fn thing_behind_viewer_is_rejected() {
        let bank = test_bank();
        let defs = test_defs(&bank);
        let sectors = [crate::world::Sector::default()];
        let view = View::new(vec2(0.0, 0.0), 41.0, 0.0, FRAC_PI_2, 320, 200, 0);
        let openings = Openings::new();
        let sc = scene(&view, &sectors, &defs, &bank, &openings);
        let mut ph = phase();

        let thing = Entity {
            pos: vec2(-100.0, 0.0), // behind the eye (facing +X)
            sector: 0,
            ..Entity::default()
        };
        ph.add_sprites(&sectors[0], 160, std::slice::from_ref(&thing), &[], &sc);
        assert_eq!(ph.num_vissprites(), 0);
    }

    #[test]
    fn visible_thing_produces_record() {
        let bank = test_bank();
        let defs = test_defs(&bank);
        let sectors = [crate::world::Sector::default()];
        let view = View::new(vec2(0.0, 0.0), 41.0, 0.0, FRAC_PI_2, 320, 200, 0);
        let openings = Openings::new();
        let sc = scene(&view, &sectors, &defs, &bank, &openings);
        let mut ph = phase();

        let thing = Entity {
            pos: vec2(100.0, 0.0),
            z: 0.0,
            angle: PI, // facing the viewer
            sector: 0,
            ..Entity::default()
        };
        ph.add_sprites(&sectors[0], 160, std::slice::from_ref(&thing), &[], &sc);
        assert_eq!(ph.num_vissprites(), 1);
        let vis = ph.vis.pop_farthest().unwrap();
        // centered horizontally, a couple of pixels wide
        assert!(vis.x1 < 160 && vis.x2 >= 160, "{} {}", vis.x1, vis.x2);
        assert!(vis.xiscale > Fixed::ZERO);
        assert_eq!(vis.scale, Fixed::from_f32(view.focal / 100.0));
    }

    #[test]
    fn nearer_things_get_larger_scale() {
        let bank = test_bank();
        let defs = test_defs(&bank);
        let sectors = [crate::world::Sector::default()];
        let view = View::new(vec2(0.0, 0.0), 41.0, 0.0, FRAC_PI_2, 320, 200, 0);
        let openings = Openings::new();
        let sc = scene(&view, &sectors, &defs, &bank, &openings);
        let mut ph = phase();

        let far = Entity { pos: vec2(400.0, 0.0), ..Entity::default() };
        let near = Entity { pos: vec2(50.0, 0.0), ..Entity::default() };
        ph.add_sprites(&sectors[0], 160, &[far, near], &[], &sc);
        assert_eq!(ph.num_vissprites(), 2);
        let first = ph.vis.pop_farthest().unwrap();
        let second = ph.vis.pop_farthest().unwrap();
        assert!(first.scale < second.scale);
    }

    #[test]
    fn mirrored_thing_steps_texture_backwards() {
        let bank = test_bank();
        let defs = test_defs(&bank);
        let sectors = [crate::world::Sector::default()];
        let view = View::new(vec2(0.0, 0.0), 41.0, 0.0, FRAC_PI_2, 320, 200, 0);
        let openings = Openings::new();
        let sc = scene(&view, &sectors, &defs, &bank, &openings);
        let mut ph = phase();

        let thing = Entity {
            pos: vec2(100.0, 0.0),
            angle: PI,
            flags: EntityFlags::MIRRORED,
            ..Entity::default()
        };
        ph.add_sprites(&sectors[0], 160, std::slice::from_ref(&thing), &[], &sc);
        let vis = ph.vis.pop_farthest().unwrap();
        assert!(vis.xiscale < Fixed::ZERO);
        assert_eq!(vis.startfrac, Fixed::from_int(4) - Fixed(1));
    }

    #[test]
    fn feet_clip_in_liquid_sector() {
        let bank = test_bank();
        let defs = test_defs(&bank);
        let sectors = [crate::world::Sector {
            is_liquid: true,
            ..crate::world::Sector::default()
        }];
        let view = View::new(vec2(0.0, 0.0), 41.0, 0.0, FRAC_PI_2, 320, 200, 0);
        let openings = Openings::new();
        let sc = scene(&view, &sectors, &defs, &bank, &openings);
        let mut ph = phase();

        let thing = Entity {
            pos: vec2(100.0, 0.0),
            z: 0.0,
            angle: PI,
            flags: EntityFlags::FEET_CLIPPED,
            ..Entity::default()
        };
        ph.add_sprites(&sectors[0], 160, std::slice::from_ref(&thing), &[], &sc);
        let vis = ph.vis.pop_farthest().unwrap();
        // patch is 8 tall: clip = min(8/4, 10) = 2 rows
        assert_eq!(vis.footclip, Fixed::from_int(2));
    }

    #[test]
    fn fullbright_frame_ignores_sector_light() {
        let bank = test_bank();
        let defs = test_defs(&bank);
        let sectors = [crate::world::Sector::default()];
        let view = View::new(vec2(0.0, 0.0), 41.0, 0.0, FRAC_PI_2, 320, 200, 0);
        let openings = Openings::new();
        let sc = scene(&view, &sectors, &defs, &bank, &openings);
        let mut ph = phase();

        let thing = Entity {
            pos: vec2(300.0, 0.0),
            angle: PI, // facing: rotation 0, eligible for fullbright
            frame_bright: true,
            ..Entity::default()
        };
        // pitch dark sector
        ph.add_sprites(&sectors[0], 0, std::slice::from_ref(&thing), &[], &sc);
        let vis = ph.vis.pop_farthest().unwrap();
        assert_eq!(vis.colormap, ph.lights.fullbright);
    }

    #[test]
    fn fullbright_back_rotation_stays_lit_by_sector() {
        let bank = test_bank();
        let defs = test_defs(&bank);
        let sectors = [crate::world::Sector::default()];
        let view = View::new(vec2(0.0, 0.0), 41.0, 0.0, FRAC_PI_2, 320, 200, 0);
        let openings = Openings::new();
        let sc = scene(&view, &sectors, &defs, &bank, &openings);
        let mut ph = phase();

        // facing away: we see its back, the muzzle flash is hidden
        let thing = Entity {
            pos: vec2(300.0, 0.0),
            angle: 0.0,
            frame_bright: true,
            ..Entity::default()
        };
        ph.add_sprites(&sectors[0], 0, std::slice::from_ref(&thing), &[], &sc);
        let vis = ph.vis.pop_farthest().unwrap();
        assert_ne!(vis.colormap, ph.lights.fullbright);
    }

    #[test]
    fn shadow_captured_only_on_dry_floors() {
        let bank = test_bank();
        let defs = test_defs(&bank);
        let dry = crate::world::Sector::default();
        let wet = crate::world::Sector { is_liquid: true, ..dry.clone() };
        let sectors = [dry.clone(), wet.clone()];
        let view = View::new(vec2(0.0, 0.0), 41.0, 0.0, FRAC_PI_2, 320, 200, 0);
        let openings = Openings::new();
        let sc = scene(&view, &sectors, &defs, &bank, &openings);
        let mut ph = phase();

        let caster = Entity {
            pos: vec2(100.0, 0.0),
            flags: EntityFlags::CAST_SHADOW,
            ..Entity::default()
        };
        ph.add_sprites(&sectors[0], 160, std::slice::from_ref(&caster), &[], &sc);
        assert!(ph.vis.pop_farthest().unwrap().shadow.is_some());

        ph.add_sprites(&sectors[1], 160, std::slice::from_ref(&caster), &[], &sc);
        assert!(ph.vis.pop_farthest().unwrap().shadow.is_none());
    }

    #[test]
    fn decal_projected_only_below_eye() {
        let bank = test_bank();
        let defs = test_defs(&bank);
        let low = crate::world::Sector::default();
        let high = crate::world::Sector { floor_h: 100.0, ..low.clone() };
        let sectors = [low.clone(), high.clone()];
        let view = View::new(vec2(0.0, 0.0), 41.0, 0.0, FRAC_PI_2, 320, 200, 0);
        let openings = Openings::new();
        let sc = scene(&view, &sectors, &defs, &bank, &openings);
        let mut ph = phase();

        let splat = Decal {
            pos: vec2(80.0, 0.0),
            patch: bank.id("TSTB0").unwrap(),
            blood: 184,
            flags: DecalFlags::empty(),
            painter: PaintStyle::Opaque,
            sector: 0,
        };
        ph.add_sprites(&sectors[0], 160, &[], std::slice::from_ref(&splat), &sc);
        assert_eq!(ph.num_decal_vissprites(), 1);

        // floor above the eye: skipped wholesale
        let mut ph2 = phase();
        ph2.add_sprites(&sectors[1], 160, &[], std::slice::from_ref(&splat), &sc);
        assert_eq!(ph2.num_decal_vissprites(), 0);
    }

    #[test]
    fn distant_decal_dropped_at_quarter_scale() {
        let bank = test_bank();
        let defs = test_defs(&bank);
        let sectors = [crate::world::Sector::default()];
        let view = View::new(vec2(0.0, 0.0), 41.0, 0.0, FRAC_PI_2, 320, 200, 0);
        let openings = Openings::new();
        let sc = scene(&view, &sectors, &defs, &bank, &openings);
        let mut ph = phase();

        let splat = Decal {
            pos: vec2(2000.0, 0.0), // scale = 160/2000 << 1/4
            patch: bank.id("TSTB0").unwrap(),
            blood: 184,
            flags: DecalFlags::empty(),
            painter: PaintStyle::Opaque,
            sector: 0,
        };
        ph.add_sprites(&sectors[0], 160, &[], std::slice::from_ref(&splat), &sc);
        assert_eq!(ph.num_decal_vissprites(), 0);
    }

    #[test]
    fn thing_under_deep_water_is_rejected_from_above() {
        let bank = test_bank();
        let defs = test_defs(&bank);
        // viewer and thing both stand in sectors faking a water surface at
        // z=64 via sector 2; the eye is above it
        let fake = crate::world::Sector { floor_h: 64.0, ..crate::world::Sector::default() };
        let wet = crate::world::Sector {
            heightsec: Some(2),
            ..crate::world::Sector::default()
        };
        let sectors = [wet.clone(), wet.clone(), fake];
        let view = View::new(vec2(0.0, 0.0), 80.0, 0.0, FRAC_PI_2, 320, 200, 0);
        let openings = Openings::new();
        let sc = scene(&view, &sectors, &defs, &bank, &openings);
        let mut ph = phase();

        // fully below the surface: invisible from above the water
        let sunk = Entity {
            pos: vec2(100.0, 0.0),
            z: 0.0,
            angle: PI,
            sector: 1,
            ..Entity::default()
        };
        ph.add_sprites(&sectors[1], 160, std::slice::from_ref(&sunk), &[], &sc);
        assert_eq!(ph.num_vissprites(), 0);

        // poking above it: projected as usual
        let afloat = Entity { z: 100.0, ..sunk };
        ph.add_sprites(&sectors[1], 160, std::slice::from_ref(&afloat), &[], &sc);
        assert_eq!(ph.num_vissprites(), 1);
    }

    #[test]
    fn deep_water_reject_needs_viewer_in_special_sector() {
        let bank = test_bank();
        let defs = test_defs(&bank);
        // same submerged thing, but the viewer's own sector is plain: the
        // record survives projection and the per-column pass clips it later
        let fake = crate::world::Sector { floor_h: 64.0, ..crate::world::Sector::default() };
        let wet = crate::world::Sector {
            heightsec: Some(2),
            ..crate::world::Sector::default()
        };
        let sectors = [crate::world::Sector::default(), wet.clone(), fake];
        let view = View::new(vec2(0.0, 0.0), 80.0, 0.0, FRAC_PI_2, 320, 200, 0);
        let openings = Openings::new();
        let sc = scene(&view, &sectors, &defs, &bank, &openings);
        let mut ph = phase();

        let sunk = Entity {
            pos: vec2(100.0, 0.0),
            z: 0.0,
            angle: PI,
            sector: 1,
            ..Entity::default()
        };
        ph.add_sprites(&sectors[1], 160, std::slice::from_ref(&sunk), &[], &sc);
        assert_eq!(ph.num_vissprites(), 1);
    }

    #[test]
    fn rotation_index_wraps_cleanly() {
        for k in 0..8 {
            let view_angle = PI + k as f32 * FRAC_PI_4;
            assert_eq!(rotation_index(view_angle, 0.0), k);
        }
    }
}

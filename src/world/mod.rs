mod lights;
mod things;
mod view;

pub use lights::{
    LIGHTBRIGHT, LIGHTLEVELS, LIGHTSCALESHIFT, LIGHTSEGSHIFT, LightTables, MAXLIGHTSCALE,
    NUMCOLORMAPS, OLDLIGHTLEVELS, OLDLIGHTSEGSHIFT, OLDMAXLIGHTSCALE,
};

pub use things::{Decal, DecalFlags, Entity, EntityFlags, Sector, SectorId, SpriteId, WorldState};

pub use view::{BASE_HEIGHT, BASE_WIDTH, BASE_YCENTER, View};

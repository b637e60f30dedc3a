mod basemap;
mod geometry;
mod projection;
pub mod spatial;
mod surface;

pub use basemap::{Basemap, LineString, Lod};
pub use geometry::draw_line;
pub use projection::{ViewState, Viewport, MAX_RENDER_ZOOM, MIN_RENDER_ZOOM, TILE_SIZE};
pub use surface::{HitFeature, MapSurface, Popup, Scene};

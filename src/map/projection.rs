use std::f64::consts::PI;

use glam::DVec2;

use crate::risk::Coordinate;

/// Canvas pixels spanned by the whole world at zoom 0
pub const TILE_SIZE: f64 = 256.0;

/// Web Mercator cuts off here
const MAX_LAT: f64 = 85.051_128_78;

/// Camera parameters. Always replaced as a whole, never patched in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub center: Coordinate,
    pub zoom: f64,
}

impl ViewState {
    pub const fn new(lon: f64, lat: f64, zoom: f64) -> Self {
        Self {
            center: Coordinate::new(lon, lat),
            zoom,
        }
    }

    /// Width of the world in canvas pixels at this zoom
    pub fn world_size(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    /// A new view moved by a canvas pixel delta (positive dx pans east, dy south)
    pub fn panned(&self, dx: f64, dy: f64) -> Self {
        let size = self.world_size();
        let c = to_unit(self.center.lon, self.center.lat);
        let (lon, lat) = from_unit(DVec2::new(c.x + dx / size, c.y + dy / size));
        Self::new(wrap_lon(lon), lat.clamp(-MAX_LAT, MAX_LAT), self.zoom)
    }

    pub fn with_zoom(&self, zoom: f64) -> Self {
        Self { zoom, ..*self }
    }
}

/// Normalized Web Mercator: x and y in [0, 1], y growing south
fn to_unit(lon: f64, lat: f64) -> DVec2 {
    let x = (lon + 180.0) / 360.0;
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    DVec2::new(x, y)
}

fn from_unit(p: DVec2) -> (f64, f64) {
    let lon = p.x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * p.y)).sinh().atan().to_degrees();
    (lon, lat)
}

fn wrap_lon(lon: f64) -> f64 {
    if lon > 180.0 || lon < -180.0 {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    } else {
        lon
    }
}

/// Zoom range the canvas can draw; views outside it render at the nearest bound
pub const MIN_RENDER_ZOOM: f64 = 0.0;
pub const MAX_RENDER_ZOOM: f64 = 24.0;

/// A view bound to a canvas of `width` x `height` pixels
#[derive(Clone, Debug)]
pub struct Viewport {
    pub view: ViewState,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(view: ViewState, width: usize, height: usize) -> Self {
        Self {
            view: view.with_zoom(view.zoom.clamp(MIN_RENDER_ZOOM, MAX_RENDER_ZOOM)),
            width,
            height,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.view.zoom
    }

    /// Project a geographic coordinate to fractional canvas pixels
    pub fn project_f(&self, lon: f64, lat: f64) -> DVec2 {
        let size = self.view.world_size();
        let c = to_unit(self.view.center.lon, self.view.center.lat);
        let p = to_unit(lon, lat);
        let half = DVec2::new(self.width as f64 / 2.0, self.height as f64 / 2.0);
        (p - c) * size + half
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let p = self.project_f(lon, lat);
        (p.x.floor() as i32, p.y.floor() as i32)
    }

    /// Convert canvas pixel coordinates back to (lon, lat)
    pub fn unproject(&self, px: f64, py: f64) -> (f64, f64) {
        let size = self.view.world_size();
        let c = to_unit(self.view.center.lon, self.view.center.lat);
        let half = DVec2::new(self.width as f64 / 2.0, self.height as f64 / 2.0);
        from_unit((DVec2::new(px, py) - half) / size + c)
    }

    /// A new view zoomed by `delta` levels, keeping the point under (px, py) fixed
    pub fn zoomed_at(&self, px: f64, py: f64, delta: f64) -> ViewState {
        let (lon, lat) = self.unproject(px, py);
        let zoomed = Viewport::new(self.view.with_zoom(self.view.zoom + delta), self.width, self.height);
        let drift = zoomed.project_f(lon, lat) - DVec2::new(px, py);
        zoomed.view.panned(drift.x, drift.y)
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32, margin: i32) -> bool {
        px >= -margin
            && px < self.width as i32 + margin
            && py >= -margin
            && py < self.height as i32 + margin
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

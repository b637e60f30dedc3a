use crate::braille::BrailleCanvas;
use crate::map::geometry::draw_line;
use crate::map::projection::Viewport;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for basemap outlines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional and city
}

impl Lod {
    /// Select LOD from a web-map zoom level
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 3.0 {
            Lod::Low
        } else if zoom < 6.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// Dark reference map drawn under the risk layers
#[derive(Default)]
pub struct Basemap {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
    borders: Vec<LineString>,
}

impl Basemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finest loaded coastlines not finer than `lod`, falling back to coarser sets
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let candidates = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_low],
            Lod::Low => [&self.coastlines_low, &self.coastlines_low, &self.coastlines_low],
        };
        candidates
            .into_iter()
            .find(|set| !set.is_empty())
            .map(|set| set.as_slice())
            .unwrap_or(&[])
    }

    pub fn render(&self, canvas: &mut BrailleCanvas, viewport: &Viewport) {
        let lod = Lod::from_zoom(viewport.zoom());
        for line in self.coastlines(lod) {
            draw_linestring(canvas, line, viewport);
        }
        if lod != Lod::Low {
            for line in &self.borders {
                draw_linestring(canvas, line, viewport);
            }
        }
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString) {
        self.borders.push(line);
    }

    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;
    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);
        if let Some((prev_x, prev_y)) = prev {
            // Segments longer than the canvas are antimeridian jumps or far off screen
            let dist = (px - prev_x).unsigned_abs() as usize + (py - prev_y).unsigned_abs() as usize;
            if dist < viewport.width.max(1) * 4
                && viewport.line_might_be_visible((prev_x, prev_y), (px, py))
            {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }
        prev = Some((px, py));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::ViewState;

    #[test]
    fn test_lod_fallback() {
        let mut map = Basemap::new();
        map.add_coastline(vec![(0.0, 0.0), (1.0, 1.0)], Lod::Low);
        assert_eq!(map.coastlines(Lod::High).len(), 1);

        map.add_coastline(vec![(0.0, 0.0), (1.0, 1.0)], Lod::High);
        map.add_coastline(vec![(0.0, 0.0), (2.0, 2.0)], Lod::High);
        assert_eq!(map.coastlines(Lod::High).len(), 2);
        assert_eq!(map.coastlines(Lod::Low).len(), 1);
    }

    #[test]
    fn test_render_draws_visible_line() {
        let mut map = Basemap::new();
        map.add_coastline(vec![(-1.0, 0.0), (1.0, 0.0)], Lod::Low);
        let vp = Viewport::new(ViewState::new(0.0, 0.0, 2.0), 40, 40);
        let mut canvas = BrailleCanvas::new(20, 10);
        map.render(&mut canvas, &vp);
        assert!((0..20).any(|c| canvas.glyph(c, 5).is_some()));
    }
}

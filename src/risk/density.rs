use glam::DVec2;
use rayon::prelude::*;
use tracing::trace;

use crate::map::spatial::PointGrid;
use crate::map::Viewport;
use crate::risk::curves::{
    density_ramp, intensity_curve, radius_curve, weight_curve, ColorRamp, LinearCurve, Rgba,
    DENSITY_OPACITY,
};
use crate::risk::dataset::{Coordinate, GeoDataset, ObservationId};

/// Canvas pixels per terminal cell (Braille resolution)
pub const CELL_PX_W: f64 = 2.0;
pub const CELL_PX_H: f64 = 4.0;

/// Paint rules for the density field. Every curve is a plain function of
/// its input so each can be checked on its own.
#[derive(Clone, Debug)]
pub struct DensityStyle {
    /// risk score -> per-point weight
    pub weight: LinearCurve,
    /// zoom -> global multiplier
    pub intensity: LinearCurve,
    /// zoom -> kernel radius in canvas pixels
    pub radius: LinearCurve,
    /// accumulated density -> color
    pub color: ColorRamp,
    pub opacity: f64,
}

impl Default for DensityStyle {
    fn default() -> Self {
        Self {
            weight: weight_curve(),
            intensity: intensity_curve(),
            radius: radius_curve(),
            color: density_ramp(),
            opacity: DENSITY_OPACITY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedPoint {
    pub id: ObservationId,
    pub coordinate: Coordinate,
    pub weight: f64,
}

/// Declarative density layer: weighted points plus the style used to paint them
#[derive(Clone, Debug)]
pub struct DensityLayer {
    pub points: Vec<WeightedPoint>,
    pub style: DensityStyle,
}

#[derive(Debug, Default)]
pub struct DensityLayerBuilder {
    style: DensityStyle,
}

impl DensityLayerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(style: DensityStyle) -> Self {
        Self { style }
    }

    /// Scores outside 0..=6 extrapolate along the weight curve.
    pub fn build(&self, dataset: &GeoDataset) -> DensityLayer {
        let points = dataset
            .iter()
            .map(|(id, obs)| WeightedPoint {
                id,
                coordinate: obs.coordinate,
                weight: self.style.weight.eval(obs.risk_score),
            })
            .collect();
        DensityLayer {
            points,
            style: self.style.clone(),
        }
    }
}

/// Gaussian falloff with three standard deviations inside the radius
#[inline(always)]
fn kernel(dist: f64, radius: f64) -> f64 {
    if radius <= 0.0 || dist >= radius {
        return 0.0;
    }
    let t = 3.0 * dist / radius;
    (-0.5 * t * t).exp()
}

impl DensityLayer {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evaluate the field once per terminal cell of a `cols` x `rows` grid.
    pub fn rasterize(&self, viewport: &Viewport, cols: usize, rows: usize) -> DensityField {
        let zoom = viewport.zoom();
        let intensity = self.style.intensity.eval(zoom);
        let radius = self.style.radius.eval(zoom);
        let mut field = DensityField::empty(cols, rows, self.style.clone());

        if cols == 0 || rows == 0 || self.points.is_empty() || radius <= 0.0 {
            return field;
        }

        let mut grid = PointGrid::new(radius);
        let margin = (radius.ceil() as i32).saturating_add(1);
        for p in &self.points {
            let pos = viewport.project_f(p.coordinate.lon, p.coordinate.lat);
            if viewport.is_visible(pos.x as i32, pos.y as i32, margin) {
                grid.insert(pos.x, pos.y, (p.id, p.weight, pos));
            }
        }
        trace!(visible = grid.len(), radius, intensity, "rasterizing density");
        if grid.is_empty() {
            return field;
        }

        field
            .density
            .par_chunks_mut(cols)
            .zip(field.dominant.par_chunks_mut(cols))
            .enumerate()
            .for_each(|(row, (densities, dominants))| {
                let mut nearby = Vec::new();
                let cy = row as f64 * CELL_PX_H + CELL_PX_H / 2.0;
                for (col, (density, dominant)) in
                    densities.iter_mut().zip(dominants.iter_mut()).enumerate()
                {
                    let cx = col as f64 * CELL_PX_W + CELL_PX_W / 2.0;
                    let center = DVec2::new(cx, cy);
                    nearby.clear();
                    grid.query_radius_into(cx, cy, radius, &mut nearby);

                    let mut sum = 0.0;
                    let mut best: Option<(f64, ObservationId)> = None;
                    for &idx in &nearby {
                        let Some(&(id, weight, pos)) = grid.get(idx) else {
                            continue;
                        };
                        let contribution = weight * kernel(center.distance(pos), radius);
                        sum += contribution;
                        // Later points win ties: they are drawn on top
                        if contribution > 0.0 && best.map_or(true, |(b, _)| contribution >= b) {
                            best = Some((contribution, id));
                        }
                    }
                    *density = (sum * intensity) as f32;
                    *dominant = best.map(|(_, id)| id);
                }
            });

        field
    }
}

/// Per-cell density values for one frame
#[derive(Clone, Debug)]
pub struct DensityField {
    pub cols: usize,
    pub rows: usize,
    density: Vec<f32>,
    dominant: Vec<Option<ObservationId>>,
    style: DensityStyle,
}

impl DensityField {
    fn empty(cols: usize, rows: usize, style: DensityStyle) -> Self {
        Self {
            cols,
            rows,
            density: vec![0.0; cols * rows],
            dominant: vec![None; cols * rows],
            style,
        }
    }

    #[inline(always)]
    fn index(&self, col: usize, row: usize) -> Option<usize> {
        (col < self.cols && row < self.rows).then(|| row * self.cols + col)
    }

    pub fn density_at(&self, col: usize, row: usize) -> f64 {
        self.index(col, row)
            .map(|i| self.density[i] as f64)
            .unwrap_or(0.0)
    }

    /// Observation contributing the most to this cell
    pub fn dominant_at(&self, col: usize, row: usize) -> Option<ObservationId> {
        self.index(col, row).and_then(|i| self.dominant[i])
    }

    /// Ramp color with layer opacity applied
    pub fn color_at(&self, col: usize, row: usize) -> Rgba {
        self.style
            .color
            .eval(self.density_at(col, row))
            .with_opacity(self.style.opacity)
    }

    /// True when the cell shows any color
    pub fn is_painted(&self, col: usize, row: usize) -> bool {
        self.color_at(col, row).a > 0.0
    }

    pub fn max_density(&self) -> f64 {
        self.density.iter().copied().fold(0.0f32, f32::max) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::ViewState;
    use crate::risk::RiskObservation;

    fn delhi() -> GeoDataset {
        GeoDataset::new(vec![
            RiskObservation::new(77.2090, 28.6139, 5.0, "High risk area"),
            RiskObservation::new(77.2150, 28.6200, 2.0, "Low risk area"),
        ])
        .unwrap()
    }

    #[test]
    fn test_weights_follow_score() {
        let layer = DensityLayerBuilder::new().build(&delhi());
        assert_eq!(layer.points.len(), 2);
        let (high, low) = (layer.points[0].weight, layer.points[1].weight);
        assert!((high - 5.0 / 6.0).abs() < 1e-12);
        assert!((low - 1.0 / 3.0).abs() < 1e-12);
        assert!((1.0 - high) < (high - 0.33));
        assert!((low - 0.33).abs() < 0.01);
    }

    #[test]
    fn test_empty_dataset_gives_empty_field() {
        let layer = DensityLayerBuilder::new().build(&GeoDataset::empty());
        assert!(layer.is_empty());
        let vp = Viewport::new(ViewState::new(0.0, 0.0, 3.0), 80, 80);
        let field = layer.rasterize(&vp, 40, 20);
        assert_eq!(field.max_density(), 0.0);
        assert!(!field.is_painted(10, 10));
    }

    #[test]
    fn test_zero_sized_canvas() {
        let layer = DensityLayerBuilder::new().build(&delhi());
        let vp = Viewport::new(ViewState::new(77.2, 28.6, 11.0), 0, 0);
        let field = layer.rasterize(&vp, 0, 0);
        assert_eq!(field.density_at(0, 0), 0.0);
    }

    #[test]
    fn test_peak_under_point() {
        let ds = GeoDataset::new(vec![RiskObservation::new(0.0, 0.0, 6.0, "peak")]).unwrap();
        let layer = DensityLayerBuilder::new().build(&ds);
        // 40x20 cells = 80x80 pixels, point projects to pixel (40, 40) = cell (20, 10)
        let vp = Viewport::new(ViewState::new(0.0, 0.0, 9.0), 80, 80);
        let field = layer.rasterize(&vp, 40, 20);
        let peak = field.density_at(20, 10);
        assert!(peak > 2.5, "peak density {peak}");
        assert!(field.density_at(0, 0) == 0.0);
        assert_eq!(field.dominant_at(20, 10), Some(ObservationId(0)));
        assert_eq!(field.dominant_at(0, 0), None);
        assert!(field.is_painted(20, 10));
        assert!((field.color_at(20, 10).a - DENSITY_OPACITY).abs() < 1e-9);
    }

    #[test]
    fn test_higher_zoom_spreads_further() {
        let ds = GeoDataset::new(vec![RiskObservation::new(0.0, 0.0, 3.0, "")]).unwrap();
        let layer = DensityLayerBuilder::new().build(&ds);
        let painted = |zoom: f64| {
            let vp = Viewport::new(ViewState::new(0.0, 0.0, zoom), 80, 80);
            let field = layer.rasterize(&vp, 40, 20);
            (0..20)
                .flat_map(|r| (0..40).map(move |c| (c, r)))
                .filter(|&(c, r)| field.is_painted(c, r))
                .count()
        };
        assert!(painted(9.0) > painted(1.0));
    }

    #[test]
    fn test_dominant_picks_stronger_neighbor() {
        let field = {
            let layer = DensityLayerBuilder::new().build(&delhi());
            let vp = Viewport::new(ViewState::new(77.2090, 28.6139, 11.0), 160, 160);
            layer.rasterize(&vp, 80, 40)
        };
        // Cell under the high-risk point sits at the viewport center
        assert_eq!(field.dominant_at(40, 20), Some(ObservationId(0)));
    }

    #[test]
    fn test_equal_contributions_later_point_dominates() {
        let ds = GeoDataset::new(vec![
            RiskObservation::new(0.0, 0.0, 3.0, "first"),
            RiskObservation::new(0.0, 0.0, 3.0, "second"),
        ])
        .unwrap();
        let layer = DensityLayerBuilder::new().build(&ds);
        let vp = Viewport::new(ViewState::new(0.0, 0.0, 9.0), 80, 80);
        let field = layer.rasterize(&vp, 40, 20);
        assert_eq!(field.dominant_at(20, 10), Some(ObservationId(1)));
        assert_eq!(field.dominant_at(21, 10), Some(ObservationId(1)));
    }

    #[test]
    fn test_extreme_zoom_still_paints() {
        let layer = DensityLayerBuilder::new().build(&delhi());
        let deep = Viewport::new(ViewState::new(77.2090, 28.6139, 2e9), 160, 160);
        let field = layer.rasterize(&deep, 80, 40);
        assert!(field.is_painted(40, 20));
        assert_eq!(field.dominant_at(40, 20), Some(ObservationId(0)));

        let shallow = Viewport::new(ViewState::new(77.2090, 28.6139, -50.0), 160, 160);
        let field = layer.rasterize(&shallow, 80, 40);
        assert!(field.max_density().is_finite());
    }
}

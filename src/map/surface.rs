use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::map::projection::{ViewState, Viewport};
use crate::risk::density::{CELL_PX_H, CELL_PX_W};
use crate::risk::{
    Coordinate, DensityField, DensityLayer, DensityLayerBuilder, GeoDataset, MarkerLayer,
    MarkerSize, ObservationId, PlacedMarker, SelectionController, SelectionState,
};

/// Extra pixels around a marker glyph that still count as a hit
const MARKER_HIT_SLOP: f64 = 2.0;

/// A rendered feature under a click point
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HitFeature {
    DensityCell {
        col: usize,
        row: usize,
        observation: ObservationId,
    },
    Marker(ObservationId),
}

impl HitFeature {
    pub fn observation(&self) -> ObservationId {
        match *self {
            HitFeature::DensityCell { observation, .. } => observation,
            HitFeature::Marker(id) => id,
        }
    }
}

/// Detail card for the selected observation
#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    pub id: ObservationId,
    pub coordinate: Coordinate,
    /// Canvas pixel anchor, `None` when the observation is off screen
    pub anchor: Option<(i32, i32)>,
    pub title: String,
    pub detail: String,
}

/// Everything needed to draw one frame of the map
#[derive(Clone, Debug)]
pub struct Scene {
    pub viewport: Viewport,
    pub cols: usize,
    pub rows: usize,
    pub density: DensityField,
    /// Markers in draw order
    pub markers: Vec<PlacedMarker>,
    pub marker_size: MarkerSize,
    pub popup: Option<Popup>,
}

impl Scene {
    /// Features under canvas pixel (px, py) in draw order; the last entry is topmost.
    pub fn hit_test(&self, px: f64, py: f64) -> Vec<HitFeature> {
        let mut hits = Vec::new();
        if px < 0.0 || py < 0.0 {
            return hits;
        }

        let col = (px / CELL_PX_W) as usize;
        let row = (py / CELL_PX_H) as usize;
        if self.density.is_painted(col, row) {
            if let Some(observation) = self.density.dominant_at(col, row) {
                hits.push(HitFeature::DensityCell {
                    col,
                    row,
                    observation,
                });
            }
        }

        let tolerance = self.marker_size.hit_radius() + MARKER_HIT_SLOP;
        let click = glam::DVec2::new(px, py);
        hits.extend(
            self.markers
                .iter()
                .filter(|m| m.pos.distance(click) <= tolerance)
                .map(|m| HitFeature::Marker(m.id)),
        );
        hits
    }
}

/// Owns the camera and selection for one live map and recomposes the scene.
pub struct MapSurface {
    dataset: Arc<GeoDataset>,
    density: DensityLayer,
    markers: MarkerLayer,
    view: ViewState,
    selection: SelectionController,
}

impl MapSurface {
    pub fn new(dataset: Arc<GeoDataset>, initial_view: ViewState) -> Self {
        Self::with_builder(dataset, initial_view, &DensityLayerBuilder::new())
    }

    pub fn with_builder(
        dataset: Arc<GeoDataset>,
        initial_view: ViewState,
        builder: &DensityLayerBuilder,
    ) -> Self {
        let density = builder.build(&dataset);
        let markers = MarkerLayer::build(&dataset);
        debug!(
            observations = dataset.len(),
            lon = initial_view.center.lon,
            lat = initial_view.center.lat,
            zoom = initial_view.zoom,
            "map surface created"
        );
        Self {
            dataset,
            density,
            markers,
            view: initial_view,
            selection: SelectionController::new(),
        }
    }

    pub fn dataset(&self) -> &GeoDataset {
        &self.dataset
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn selection(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn density_layer(&self) -> &DensityLayer {
        &self.density
    }

    pub fn marker_layer(&self) -> &MarkerLayer {
        &self.markers
    }

    /// Replace the camera wholesale. Selection is left alone.
    pub fn on_gesture(&mut self, view: ViewState) {
        trace!(lon = view.center.lon, lat = view.center.lat, zoom = view.zoom, "view replaced");
        self.view = view;
    }

    /// Select the topmost hit feature's observation; nothing hit is a no-op.
    pub fn on_map_click(&mut self, hits: &[HitFeature]) {
        if let Some(top) = hits.last() {
            self.select(top.observation());
        }
    }

    pub fn on_marker_click(&mut self, id: ObservationId) {
        self.select(id);
    }

    pub fn on_dismiss(&mut self) {
        self.selection.dismiss();
    }

    fn select(&mut self, id: ObservationId) {
        if self.dataset.get(id).is_none() {
            warn!(id = id.0, "ignoring selection of unknown observation");
            return;
        }
        self.selection.select(id);
    }

    /// Canvas viewport for a grid of `cols` x `rows` terminal cells
    pub fn viewport(&self, cols: usize, rows: usize) -> Viewport {
        Viewport::new(
            self.view,
            (cols as f64 * CELL_PX_W) as usize,
            (rows as f64 * CELL_PX_H) as usize,
        )
    }

    pub fn compose(&self, cols: usize, rows: usize) -> Scene {
        let viewport = self.viewport(cols, rows);
        let density = self.density.rasterize(&viewport, cols, rows);
        let markers = self.markers.place(&viewport);
        let popup = self.popup(&viewport);
        Scene {
            marker_size: MarkerSize::from_zoom(viewport.zoom()),
            viewport,
            cols,
            rows,
            density,
            markers,
            popup,
        }
    }

    /// Hit-test against a freshly composed scene
    pub fn hit_test(&self, cols: usize, rows: usize, px: f64, py: f64) -> Vec<HitFeature> {
        self.compose(cols, rows).hit_test(px, py)
    }

    fn popup(&self, viewport: &Viewport) -> Option<Popup> {
        let id = self.selection.state().selected()?;
        let obs = self.dataset.get(id)?;
        let c = obs.coordinate;
        let (px, py) = viewport.project(c.lon, c.lat);
        Some(Popup {
            id,
            coordinate: c,
            anchor: viewport.is_visible(px, py, 0).then_some((px, py)),
            title: obs.description.clone(),
            detail: format!("Risk Score: {}", obs.risk_score),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskObservation;

    fn surface() -> MapSurface {
        let ds = GeoDataset::new(vec![
            RiskObservation::new(77.2090, 28.6139, 5.0, "High risk area"),
            RiskObservation::new(77.2150, 28.6200, 2.0, "Low risk area"),
        ])
        .unwrap();
        MapSurface::new(Arc::new(ds), ViewState::new(77.2090, 28.6139, 11.0))
    }

    #[test]
    fn test_map_click_without_hits_is_noop() {
        let mut s = surface();
        s.on_map_click(&[]);
        assert_eq!(s.selection(), SelectionState::Empty);

        s.on_marker_click(ObservationId(1));
        s.on_map_click(&[]);
        assert_eq!(s.selection(), SelectionState::Selected(ObservationId(1)));
    }

    #[test]
    fn test_map_click_topmost_wins() {
        let mut s = surface();
        s.on_map_click(&[
            HitFeature::DensityCell {
                col: 0,
                row: 0,
                observation: ObservationId(1),
            },
            HitFeature::Marker(ObservationId(0)),
        ]);
        assert_eq!(s.selection(), SelectionState::Selected(ObservationId(0)));
    }

    #[test]
    fn test_gesture_leaves_selection() {
        let mut s = surface();
        s.on_marker_click(ObservationId(0));
        let next = s.view().panned(40.0, -12.0).with_zoom(9.0);
        s.on_gesture(next);
        assert_eq!(s.view(), next);
        assert_eq!(s.selection(), SelectionState::Selected(ObservationId(0)));
    }

    #[test]
    fn test_unknown_marker_ignored() {
        let mut s = surface();
        s.on_marker_click(ObservationId(7));
        assert_eq!(s.selection(), SelectionState::Empty);
    }

    #[test]
    fn test_dismiss_closes_popup() {
        let mut s = surface();
        s.on_marker_click(ObservationId(0));
        let scene = s.compose(80, 40);
        let popup = scene.popup.expect("popup for selected observation");
        assert_eq!(popup.title, "High risk area");
        assert_eq!(popup.detail, "Risk Score: 5");
        assert_eq!(popup.anchor, Some((80, 80)));

        s.on_dismiss();
        assert!(s.compose(80, 40).popup.is_none());
    }

    #[test]
    fn test_hit_test_marker_on_top_of_density() {
        let s = surface();
        // High-risk marker sits at the canvas center (80, 80)
        let hits = s.hit_test(80, 40, 80.5, 80.5);
        assert!(matches!(hits.first(), Some(HitFeature::DensityCell { .. })));
        assert_eq!(hits.last(), Some(&HitFeature::Marker(ObservationId(0))));
    }

    #[test]
    fn test_hit_test_empty_space() {
        let s = surface();
        assert!(s.hit_test(80, 40, 2.0, 150.0).is_empty());
    }

    #[test]
    fn test_click_through_hit_test_selects() {
        let mut s = surface();
        let hits = s.hit_test(80, 40, 80.5, 80.5);
        s.on_map_click(&hits);
        assert_eq!(s.selection(), SelectionState::Selected(ObservationId(0)));
    }

    #[test]
    fn test_density_cell_click_selects_dominant() {
        let mut s = surface();
        // Inside the low-risk glow, clear of both marker glyphs
        let scene = s.compose(80, 40);
        let hits = scene.hit_test(96.0, 62.0);
        assert_eq!(
            hits,
            vec![HitFeature::DensityCell {
                col: 48,
                row: 15,
                observation: ObservationId(1),
            }]
        );
        assert_eq!(scene.density.dominant_at(48, 15), Some(ObservationId(1)));

        s.on_map_click(&hits);
        assert_eq!(s.selection(), SelectionState::Selected(ObservationId(1)));
    }

    #[test]
    fn test_compose_at_extreme_zoom() {
        let mut s = surface();
        s.on_marker_click(ObservationId(0));

        s.on_gesture(s.view().with_zoom(2e9));
        let scene = s.compose(80, 40);
        assert_eq!(s.view().zoom, 2e9);
        assert!(scene.density.is_painted(40, 20));
        assert_eq!(scene.popup.and_then(|p| p.anchor), Some((80, 80)));

        s.on_gesture(s.view().with_zoom(-50.0));
        let scene = s.compose(80, 40);
        assert_eq!(scene.markers.len(), 2);
        assert!(scene.markers.iter().all(|m| m.pos.is_finite()));
    }
}

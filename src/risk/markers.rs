use glam::DVec2;

use crate::map::Viewport;
use crate::risk::dataset::{Coordinate, GeoDataset, ObservationId};

/// Marker glyph scale, chosen by zoom
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerSize {
    Dot,
    Ring,
    Disc,
}

impl MarkerSize {
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 6.0 {
            MarkerSize::Dot
        } else if zoom < 10.0 {
            MarkerSize::Ring
        } else {
            MarkerSize::Disc
        }
    }

    pub fn glyph(self) -> char {
        match self {
            MarkerSize::Dot => '·',
            MarkerSize::Ring => '○',
            MarkerSize::Disc => '●',
        }
    }

    /// Glyph footprint in canvas pixels around the anchor
    pub fn hit_radius(self) -> f64 {
        match self {
            MarkerSize::Dot => 1.0,
            MarkerSize::Ring => 1.5,
            MarkerSize::Disc => 2.0,
        }
    }
}

/// One clickable marker per observation
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub id: ObservationId,
    pub coordinate: Coordinate,
    pub risk_score: f64,
}

/// A marker placed on the canvas for the current view
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedMarker {
    pub id: ObservationId,
    pub pos: DVec2,
    pub risk_score: f64,
}

/// Markers in dataset order; later markers draw on top of earlier ones.
#[derive(Clone, Debug, Default)]
pub struct MarkerLayer {
    markers: Vec<Marker>,
}

impl MarkerLayer {
    pub fn build(dataset: &GeoDataset) -> Self {
        let markers = dataset
            .iter()
            .map(|(id, obs)| Marker {
                id,
                coordinate: obs.coordinate,
                risk_score: obs.risk_score,
            })
            .collect();
        Self { markers }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Visible markers projected for `viewport`, in draw order
    pub fn place(&self, viewport: &Viewport) -> Vec<PlacedMarker> {
        self.markers
            .iter()
            .filter_map(|m| {
                let pos = viewport.project_f(m.coordinate.lon, m.coordinate.lat);
                viewport
                    .is_visible(pos.x.floor() as i32, pos.y.floor() as i32, 0)
                    .then_some(PlacedMarker {
                        id: m.id,
                        pos,
                        risk_score: m.risk_score,
                    })
            })
            .collect()
    }
}

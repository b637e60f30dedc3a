pub mod curves;
pub mod dataset;
pub mod density;
pub mod markers;
pub mod selection;

pub use dataset::{Coordinate, DatasetError, GeoDataset, ObservationId, RiskObservation};
pub use density::{DensityField, DensityLayer, DensityLayerBuilder, DensityStyle};
pub use markers::{MarkerLayer, MarkerSize, PlacedMarker};
pub use selection::{SelectionController, SelectionState};

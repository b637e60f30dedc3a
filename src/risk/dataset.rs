use std::fmt;
use std::ops::Index;

use thiserror::Error;

/// WGS84 position in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_well_formed(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4}°{}, {:.4}°{}",
            self.lat.abs(),
            if self.lat >= 0.0 { "N" } else { "S" },
            self.lon.abs(),
            if self.lon >= 0.0 { "E" } else { "W" }
        )
    }
}

/// A single geolocated risk record
#[derive(Clone, Debug, PartialEq)]
pub struct RiskObservation {
    pub coordinate: Coordinate,
    /// Conventionally 0..=6; other finite values are accepted
    pub risk_score: f64,
    pub description: String,
}

impl RiskObservation {
    pub fn new(lon: f64, lat: f64, risk_score: f64, description: impl Into<String>) -> Self {
        Self {
            coordinate: Coordinate::new(lon, lat),
            risk_score,
            description: description.into(),
        }
    }
}

/// Position of an observation in its dataset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservationId(pub usize);

#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    #[error("observation {index} has malformed coordinate ({lon}, {lat})")]
    MalformedCoordinate { index: usize, lon: f64, lat: f64 },
    #[error("observation {index} has non-finite risk score {score}")]
    NonFiniteScore { index: usize, score: f64 },
}

/// Immutable, validated, ordered collection of risk observations
#[derive(Clone, Debug, Default)]
pub struct GeoDataset {
    observations: Vec<RiskObservation>,
}

impl GeoDataset {
    /// Validate every observation; malformed input never reaches rendering.
    pub fn new(observations: Vec<RiskObservation>) -> Result<Self, DatasetError> {
        for (index, obs) in observations.iter().enumerate() {
            let c = obs.coordinate;
            if !c.is_well_formed() {
                return Err(DatasetError::MalformedCoordinate {
                    index,
                    lon: c.lon,
                    lat: c.lat,
                });
            }
            if !obs.risk_score.is_finite() {
                return Err(DatasetError::NonFiniteScore {
                    index,
                    score: obs.risk_score,
                });
            }
        }
        Ok(Self { observations })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn get(&self, id: ObservationId) -> Option<&RiskObservation> {
        self.observations.get(id.0)
    }

    /// Observations with their ids, in dataset order
    pub fn iter(&self) -> impl Iterator<Item = (ObservationId, &RiskObservation)> + '_ {
        self.observations
            .iter()
            .enumerate()
            .map(|(i, obs)| (ObservationId(i), obs))
    }
}

impl Index<ObservationId> for GeoDataset {
    type Output = RiskObservation;

    fn index(&self, id: ObservationId) -> &RiskObservation {
        &self.observations[id.0]
    }
}

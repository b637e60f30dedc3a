use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use geojson::{GeoJson, Geometry, Value};
use tracing::{info, warn};

use crate::map::{Basemap, LineString, Lod};
use crate::risk::{DatasetError, GeoDataset, RiskObservation};

/// Observations shown when no data file is configured
pub fn sample_dataset() -> Result<GeoDataset, DatasetError> {
    GeoDataset::new(vec![
        RiskObservation::new(77.2090, 28.6139, 5.0, "High risk area"),
        RiskObservation::new(77.2150, 28.6200, 2.0, "Low risk area"),
    ])
}

/// Load risk observations from a GeoJSON file
pub fn load_dataset(path: &Path) -> Result<GeoDataset> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let dataset = parse_dataset(&content).with_context(|| format!("parsing {}", path.display()))?;
    info!(path = %path.display(), observations = dataset.len(), "risk dataset loaded");
    Ok(dataset)
}

/// Parse a FeatureCollection of Point features carrying `riskScore` and
/// `description` properties. Non-point features are skipped.
pub fn parse_dataset(content: &str) -> Result<GeoDataset> {
    let geojson: GeoJson = content.parse()?;
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => return Err(anyhow!("expected a Feature or FeatureCollection")),
    };

    let mut observations = Vec::with_capacity(features.len());
    for (index, feature) in features.into_iter().enumerate() {
        let coords = match feature.geometry.map(|g| g.value) {
            Some(Value::Point(coords)) => coords,
            Some(_) => {
                warn!(index, "skipping non-point feature");
                continue;
            }
            None => return Err(anyhow!("feature {index} has no geometry")),
        };
        let [lon, lat, ..] = coords[..] else {
            return Err(anyhow!("feature {index} has a point with fewer than two positions"));
        };

        let props = feature.properties.as_ref();
        let risk_score = props
            .and_then(|p| p.get("riskScore"))
            .and_then(|v| v.as_f64())
            .ok_or_else(|| anyhow!("feature {index} is missing a numeric riskScore"))?;
        let description = props
            .and_then(|p| p.get("description"))
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        observations.push(RiskObservation::new(lon, lat, risk_score, description));
    }

    Ok(GeoDataset::new(observations)?)
}

/// Load every Natural Earth file found in `data_dir` into the basemap
pub fn load_basemap(basemap: &mut Basemap, data_dir: &Path) -> Result<()> {
    let coastline_files = [
        ("ne_110m_coastline.json", Lod::Low),
        ("ne_50m_coastline.json", Lod::Medium),
        ("ne_10m_coastline.json", Lod::High),
    ];

    for (filename, lod) in coastline_files {
        let path = data_dir.join(filename);
        if path.exists() {
            if let Err(e) = load_lines(&path, |line| basemap.add_coastline(line, lod)) {
                warn!(file = filename, error = %e, "failed to load coastlines");
            }
        }
    }

    let borders_path = data_dir.join("ne_50m_borders.json");
    if borders_path.exists() {
        if let Err(e) = load_lines(&borders_path, |line| basemap.add_border(line)) {
            warn!(error = %e, "failed to load borders");
        }
    }

    Ok(())
}

fn load_lines<F>(path: &Path, add_line: F) -> Result<()>
where
    F: FnMut(LineString),
{
    let content = fs::read_to_string(path)?;
    let geojson: GeoJson = content.parse()?;
    process_geojson_lines(&geojson, add_line);
    Ok(())
}

/// Process GeoJSON and extract line features
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => process_geometry_lines(geometry, &mut add_line),
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|l| add_line(to_line(l))),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for exterior in polygons.iter().filter_map(|rings| rings.first()) {
                add_line(to_line(exterior));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

fn to_line(coords: &[Vec<f64>]) -> LineString {
    coords.iter().map(|c| (c[0], c[1])).collect()
}

/// Coarse outlines for when no Natural Earth data is available
pub fn generate_simple_world(basemap: &mut Basemap) {
    // South and East Asia
    basemap.add_coastline(
        vec![
            (35.0, 42.0), (40.0, 43.0), (50.0, 40.0), (55.0, 37.0),
            (60.0, 25.0), (65.0, 25.0), (70.0, 20.0), (73.0, 16.0),
            (75.0, 12.0), (77.5, 8.1), (80.0, 10.0), (80.3, 15.0),
            (85.0, 19.5), (88.0, 22.0), (92.0, 22.0), (95.0, 16.0),
            (100.0, 14.0), (105.0, 10.0), (110.0, 20.0), (115.0, 22.0),
            (120.0, 22.0), (122.0, 25.0), (125.0, 30.0), (130.0, 35.0),
            (135.0, 35.0), (140.0, 40.0), (145.0, 45.0), (145.0, 50.0),
            (140.0, 55.0), (135.0, 55.0), (130.0, 52.0), (130.0, 43.0),
            (120.0, 40.0), (110.0, 45.0), (90.0, 50.0), (70.0, 55.0),
            (60.0, 55.0), (50.0, 50.0), (40.0, 43.0),
        ],
        Lod::Low,
    );

    // Europe
    basemap.add_coastline(
        vec![
            (-10.0, 36.0), (-5.0, 36.0), (0.0, 38.0), (5.0, 43.0),
            (10.0, 44.0), (15.0, 45.0), (20.0, 40.0), (25.0, 37.0),
            (30.0, 40.0), (35.0, 42.0), (40.0, 43.0), (40.0, 55.0),
            (30.0, 60.0), (25.0, 65.0), (20.0, 70.0), (10.0, 71.0),
            (5.0, 62.0), (5.0, 58.0), (-5.0, 58.0), (-10.0, 52.0),
            (-5.0, 48.0), (-5.0, 43.0), (-10.0, 36.0),
        ],
        Lod::Low,
    );

    // Africa
    basemap.add_coastline(
        vec![
            (-17.0, 15.0), (-17.0, 20.0), (-15.0, 28.0), (-5.0, 35.0),
            (10.0, 37.0), (20.0, 33.0), (25.0, 32.0), (35.0, 30.0),
            (35.0, 20.0), (42.0, 12.0), (50.0, 12.0), (45.0, 5.0),
            (35.0, -5.0), (35.0, -20.0), (35.0, -25.0), (30.0, -30.0),
            (20.0, -35.0), (18.0, -35.0), (15.0, -30.0), (10.0, -15.0),
            (10.0, 0.0), (5.0, 5.0), (-5.0, 5.0), (-10.0, 10.0),
            (-17.0, 15.0),
        ],
        Lod::Low,
    );

    // Americas
    basemap.add_coastline(
        vec![
            (-168.0, 65.0), (-166.0, 60.0), (-141.0, 60.0), (-130.0, 55.0),
            (-125.0, 48.0), (-124.0, 40.0), (-117.0, 32.0), (-110.0, 25.0),
            (-97.0, 25.0), (-97.0, 28.0), (-82.0, 24.0), (-80.0, 25.0),
            (-81.0, 31.0), (-75.0, 35.0), (-70.0, 41.0), (-67.0, 45.0),
            (-55.0, 47.0), (-58.0, 55.0), (-64.0, 60.0), (-80.0, 63.0),
            (-95.0, 62.0), (-110.0, 68.0), (-130.0, 70.0), (-168.0, 65.0),
        ],
        Lod::Low,
    );
    basemap.add_coastline(
        vec![
            (-80.0, 10.0), (-75.0, 5.0), (-60.0, 5.0), (-50.0, 0.0),
            (-35.0, -5.0), (-38.0, -15.0), (-40.0, -22.0), (-48.0, -25.0),
            (-55.0, -34.0), (-65.0, -42.0), (-68.0, -50.0), (-75.0, -52.0),
            (-72.0, -40.0), (-70.0, -20.0), (-80.0, -5.0), (-80.0, 10.0),
        ],
        Lod::Low,
    );

    // Australia
    basemap.add_coastline(
        vec![
            (115.0, -20.0), (120.0, -18.0), (130.0, -12.0), (140.0, -12.0),
            (145.0, -15.0), (150.0, -25.0), (153.0, -30.0), (150.0, -35.0),
            (145.0, -38.0), (140.0, -38.0), (135.0, -35.0), (130.0, -32.0),
            (125.0, -32.0), (115.0, -35.0), (115.0, -25.0), (115.0, -20.0),
        ],
        Lod::Low,
    );
}

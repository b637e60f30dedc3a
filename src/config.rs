use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use crate::map::ViewState;

/// New Delhi, city scale
pub const DEFAULT_VIEW: ViewState = ViewState::new(77.2090, 28.6139, 11.0);

#[derive(Parser, Debug)]
#[command(author, version, about = "Emergency risk map for the terminal")]
pub struct Args {
    /// GeoJSON FeatureCollection of risk points (`riskScore`, `description`)
    #[arg(long, value_name = "PATH")]
    pub data: Option<PathBuf>,
    /// Directory holding Natural Earth coastline/border GeoJSON
    #[arg(long, value_name = "DIR", default_value = "data")]
    pub basemap: PathBuf,
    /// Initial center longitude
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,
    /// Initial center latitude
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,
    /// Initial zoom level
    #[arg(long)]
    pub zoom: Option<f64>,
    /// Log output; filter with RUST_LOG
    #[arg(long, value_name = "PATH", default_value = "risk-map.log")]
    pub log_file: PathBuf,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub data: Option<PathBuf>,
    pub basemap_dir: PathBuf,
    /// View restored by the reset control
    pub home: ViewState,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: None,
            basemap_dir: PathBuf::from("data"),
            home: DEFAULT_VIEW,
            log_file: PathBuf::from("risk-map.log"),
        }
    }
}

impl TryFrom<Args> for Config {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        let lon = args.lon.unwrap_or(DEFAULT_VIEW.center.lon);
        let lat = args.lat.unwrap_or(DEFAULT_VIEW.center.lat);
        let zoom = args.zoom.unwrap_or(DEFAULT_VIEW.zoom);

        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            bail!("--lon must be between -180 and 180");
        }
        if !lat.is_finite() || !(-85.0..=85.0).contains(&lat) {
            bail!("--lat must be between -85 and 85");
        }
        if !zoom.is_finite() {
            bail!("--zoom must be a finite number");
        }

        Ok(Self {
            data: args.data,
            basemap_dir: args.basemap,
            home: ViewState::new(lon, lat, zoom),
            log_file: args.log_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Config> {
        let args = Args::try_parse_from(std::iter::once("risk-map").chain(argv.iter().copied()))?;
        Config::try_from(args)
    }

    #[test]
    fn test_defaults() {
        let cfg = parse(&[]).unwrap();
        assert_eq!(cfg.home, DEFAULT_VIEW);
        assert!(cfg.data.is_none());
        assert_eq!(cfg.basemap_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_overrides() {
        let cfg = parse(&["--lon", "-73.9", "--lat", "40.7", "--zoom", "9", "--data", "risk.json"]).unwrap();
        assert_eq!(cfg.home, ViewState::new(-73.9, 40.7, 9.0));
        assert_eq!(cfg.data, Some(PathBuf::from("risk.json")));
    }

    #[test]
    fn test_rejects_bad_latitude() {
        assert!(parse(&["--lat", "91"]).is_err());
    }
}

// ⚙️ Configuration - command line flags with environment fallbacks

use crate::controller::DEFAULT_PAGE_SIZE;
use crate::geo::{FixedLocation, HttpLocation, LocationProvider, Unsupported};
use crate::map::DEFAULT_ZOOM;
use crate::record::LatLng;
use crate::source::DEFAULT_ENDPOINT;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "sight-map", version, about = "Browse points of interest in a table and on a map")]
pub struct Cli {
    /// Records endpoint: http(s) URL, or a path to a JSON/CSV file
    #[arg(long, env = "SIGHT_MAP_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Rows per table page
    #[arg(long, env = "SIGHT_MAP_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Start with this category selected
    #[arg(long)]
    pub category: Option<String>,

    /// Fixed user position as "lat,lng"
    #[arg(long, env = "SIGHT_MAP_LOCATION", value_parser = parse_lat_lng)]
    pub location: Option<LatLng>,

    /// Location lookup service returning {"latitude", "longitude"}
    #[arg(long, env = "SIGHT_MAP_LOCATE_URL", conflicts_with = "location")]
    pub locate_url: Option<String>,

    /// Initial map zoom
    #[arg(long, default_value_t = DEFAULT_ZOOM)]
    pub zoom: f64,

    /// Fetch timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Write logs to this file (the viewer is silent otherwise)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive table + map viewer (default)
    View,
    /// Fetch once and print one page of records
    Dump {
        /// Page to print
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::View)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn location_provider(&self) -> Box<dyn LocationProvider> {
        match (&self.location, &self.locate_url) {
            (Some(coords), _) => Box::new(FixedLocation(*coords)),
            (None, Some(url)) => Box::new(HttpLocation::new(url.clone())),
            (None, None) => Box::new(Unsupported),
        }
    }
}

pub fn parse_lat_lng(raw: &str) -> Result<LatLng> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("expected \"lat,lng\", got {:?}", raw))?;

    let lat: f64 = lat.trim().parse().context("invalid latitude")?;
    let lng: f64 = lng.trim().parse().context("invalid longitude")?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(anyhow!("coordinates out of range: {}, {}", lat, lng));
    }

    Ok(LatLng::new(lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["sight-map"]).unwrap();
        assert_eq!(cli.page_size, 7);
        assert_eq!(cli.zoom, 15.0);
        assert_eq!(cli.command(), Command::View);
        assert_eq!(cli.fetch_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_dump_with_location() {
        let cli = Cli::try_parse_from([
            "sight-map",
            "--endpoint",
            "data/sights.json",
            "--location",
            "47.2, 38.9",
            "dump",
            "--page",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.endpoint, "data/sights.json");
        assert_eq!(cli.location, Some(LatLng::new(47.2, 38.9)));
        assert_eq!(cli.command(), Command::Dump { page: 2 });
    }

    #[test]
    fn test_location_and_lookup_conflict() {
        let result = Cli::try_parse_from([
            "sight-map",
            "--location",
            "1,2",
            "--locate-url",
            "http://localhost/where",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_lat_lng_rejects_garbage() {
        assert!(parse_lat_lng("47.2").is_err());
        assert!(parse_lat_lng("abc,1").is_err());
        assert!(parse_lat_lng("91,0").is_err());
        assert_eq!(parse_lat_lng("-1.5,2").unwrap(), LatLng::new(-1.5, 2.0));
    }
}

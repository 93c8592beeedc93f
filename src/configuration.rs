use anyhow::{bail, Context};
use clap::{ArgGroup, Parser};
use gtfs_feed::{Route, Stop};
use rustc_hash::FxHashSet;
use std::path::PathBuf;
use std::str::FromStr;

/// Extracts the part of a GTFS feed serving some stops or routes, without dangling references
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("stops").args(["stop", "bbox"]).multiple(true)))]
pub struct Switches {
    /// feed to read, a directory or a zip archive
    #[arg(short, long)]
    pub input: PathBuf,

    /// directory where the pruned feed is written
    #[arg(short, long)]
    pub output: PathBuf,

    /// keep the trips stopping at this stop (repeatable)
    #[arg(short, long)]
    pub stop: Vec<String>,

    /// keep the trips stopping in this box (format: min_lat,min_lon,max_lat,max_lon)
    #[arg(short, long, allow_hyphen_values(true))]
    pub bbox: Option<Bbox>,

    /// keep the trips of this route (repeatable)
    #[arg(short, long, conflicts_with = "stops")]
    pub route: Vec<String>,

    /// fold the calendar dates into calendars before writing
    #[arg(long)]
    pub normalize_calendars: bool,

    /// stage the source feed in this SQLite database instead of memory
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// replace the SQLite database if it already exists
    #[arg(long, requires = "database")]
    pub overwrite: bool,

    /// fail when the source feed has inconsistencies
    #[arg(long)]
    pub strict: bool,

    /// write a JSON summary of the run to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Area of the stops to keep, in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Bbox {
    /// A stop without coordinates is never inside
    pub fn contains(&self, stop: &Stop) -> bool {
        match (stop.latitude, stop.longitude) {
            (Some(lat), Some(lon)) => {
                (self.min_lat..=self.max_lat).contains(&lat)
                    && (self.min_lon..=self.max_lon).contains(&lon)
            }
            _ => false,
        }
    }
}

impl FromStr for Bbox {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .with_context(|| format!("'{v}' is not a coordinate"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let [min_lat, min_lon, max_lat, max_lon] = values[..] else {
            bail!("expected min_lat,min_lon,max_lat,max_lon, got {} values", values.len());
        };
        if min_lat > max_lat || min_lon > max_lon {
            bail!("the minimum of the box is above its maximum");
        }
        Ok(Bbox {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }
}

/// What decides the trips to keep
#[derive(Debug, Clone, PartialEq)]
pub enum Seeds {
    /// Every stop, only the unreachable records are dropped
    AllStops,
    /// The stops with one of these ids or inside the box
    Stops {
        ids: FxHashSet<String>,
        bbox: Option<Bbox>,
    },
    /// The routes with one of these ids
    Routes(FxHashSet<String>),
}

impl Seeds {
    pub fn keeps_stop(&self, stop: &Stop) -> bool {
        match self {
            Seeds::AllStops => true,
            Seeds::Stops { ids, bbox } => {
                ids.contains(&stop.id) || bbox.map_or(false, |b| b.contains(stop))
            }
            Seeds::Routes(_) => false,
        }
    }

    pub fn keeps_route(&self, route: &Route) -> bool {
        match self {
            Seeds::Routes(ids) => ids.contains(&route.id),
            _ => false,
        }
    }
}

pub struct Configuration {
    pub input: PathBuf,
    pub output: PathBuf,
    pub seeds: Seeds,
    pub normalize_calendars: bool,
    pub database: Option<PathBuf>,
    pub overwrite: bool,
    pub strict: bool,
    pub report: Option<PathBuf>,
}

impl TryFrom<Switches> for Configuration {
    type Error = anyhow::Error;

    fn try_from(switches: Switches) -> Result<Self, Self::Error> {
        if !switches.input.exists() {
            bail!("{} does not exist", switches.input.display());
        }
        if switches.output == switches.input {
            bail!("the output would overwrite the input feed");
        }
        let seeds = if !switches.route.is_empty() {
            Seeds::Routes(switches.route.into_iter().collect())
        } else if !switches.stop.is_empty() || switches.bbox.is_some() {
            Seeds::Stops {
                ids: switches.stop.into_iter().collect(),
                bbox: switches.bbox,
            }
        } else {
            Seeds::AllStops
        };
        Ok(Configuration {
            input: switches.input,
            output: switches.output,
            seeds,
            normalize_calendars: switches.normalize_calendars,
            database: switches.database,
            overwrite: switches.overwrite,
            strict: switches.strict,
            report: switches.report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Switches, clap::Error> {
        Switches::try_parse_from(
            ["gtfs-prune", "--input", "in", "--output", "out"]
                .iter()
                .chain(args),
        )
    }

    #[test]
    fn repeated_stops_and_a_box() {
        let switches = parse(&["--stop", "A", "--stop", "B", "--bbox", "36.0,-117.5,37,-116"]).unwrap();
        assert_eq!(vec!["A", "B"], switches.stop);
        assert_eq!(
            Some(Bbox {
                min_lat: 36.0,
                min_lon: -117.5,
                max_lat: 37.0,
                max_lon: -116.0
            }),
            switches.bbox
        );
        assert!(!switches.strict);
    }

    #[test]
    fn routes_exclude_stops() {
        assert!(parse(&["--route", "R1", "--stop", "A"]).is_err());
        assert!(parse(&["--route", "R1", "--bbox", "0,0,1,1"]).is_err());
        let switches = parse(&["--route", "R1", "--route", "R2", "--strict"]).unwrap();
        assert_eq!(vec!["R1", "R2"], switches.route);
        assert!(switches.strict);
    }

    #[test]
    fn overwrite_needs_a_database() {
        assert!(parse(&["--overwrite"]).is_err());
        let switches = parse(&["--database", "feed.sqlite", "--overwrite"]).unwrap();
        assert_eq!(Some(PathBuf::from("feed.sqlite")), switches.database);
        assert!(switches.overwrite);
        assert!(!parse(&["--database", "feed.sqlite"]).unwrap().overwrite);
    }

    #[test]
    fn invalid_boxes() {
        assert!("1,2,3".parse::<Bbox>().is_err());
        assert!("1,2,3,x".parse::<Bbox>().is_err());
        assert!("3,0,1,1".parse::<Bbox>().is_err());
    }

    #[test]
    fn the_box_needs_coordinates() {
        let bbox: Bbox = "36,-117,37,-116".parse().unwrap();
        let mut stop = Stop {
            id: "S".to_owned(),
            latitude: Some(36.5),
            longitude: Some(-116.5),
            ..Default::default()
        };
        assert!(bbox.contains(&stop));
        stop.longitude = Some(-118.0);
        assert!(!bbox.contains(&stop));
        stop.latitude = None;
        assert!(!bbox.contains(&stop));
    }

    #[test]
    fn seeds_from_the_switches() {
        let mut switches = parse(&[]).unwrap();
        switches.input = PathBuf::from("gtfs-feed/fixtures/sample-feed");
        let configuration = Configuration::try_from(switches).unwrap();
        assert_eq!(Seeds::AllStops, configuration.seeds);

        let mut switches = parse(&["--stop", "A"]).unwrap();
        switches.input = PathBuf::from("gtfs-feed/fixtures/sample-feed");
        let configuration = Configuration::try_from(switches).unwrap();
        let stop = Stop {
            id: "A".to_owned(),
            ..Default::default()
        };
        assert!(configuration.seeds.keeps_stop(&stop));
        assert!(!configuration.seeds.keeps_route(&Route::default()));

        assert!(Configuration::try_from(parse(&[]).unwrap()).is_err());
    }
}

use crate::enums::ResetUnknown;
use crate::objects::*;
use crate::Error;
use crate::GtfsReader;
use std::path::Path;

/// The GTFS files as they were read, one result per file
///
/// Nothing is checked beyond the CSV parsing. A [crate::Feed] is built from it with [crate::Feed::from_raw]
#[derive(Debug)]
pub struct RawGtfs {
    /// Time needed to read and parse the archive in milliseconds
    pub read_duration: i64,
    /// All Calendar, None if the file was absent as it is not mandatory
    pub calendar: Option<Result<Vec<Calendar>, Error>>,
    /// All Calendar dates, None if the file was absent as it is not mandatory
    pub calendar_dates: Option<Result<Vec<CalendarDate>, Error>>,
    /// All Stops
    pub stops: Result<Vec<Stop>, Error>,
    /// All Routes
    pub routes: Result<Vec<Route>, Error>,
    /// All Trips
    pub trips: Result<Vec<Trip>, Error>,
    /// All Agencies
    pub agencies: Result<Vec<Agency>, Error>,
    /// All shapes points, None if the file was absent as it is not mandatory
    pub shapes: Option<Result<Vec<Shape>, Error>>,
    /// All FareAttributes, None if the file was absent as it is not mandatory
    pub fare_attributes: Option<Result<Vec<FareAttribute>, Error>>,
    /// All FareRules, None if the file was absent as it is not mandatory
    pub fare_rules: Option<Result<Vec<FareRule>, Error>>,
    /// All Frequencies, None if the file was absent as it is not mandatory
    pub frequencies: Option<Result<Vec<Frequency>, Error>>,
    /// All Transfers, None if the file was absent as it is not mandatory
    pub transfers: Option<Result<Vec<Transfer>, Error>>,
    /// All FeedInfo, None if the file was absent as it is not mandatory
    pub feed_info: Option<Result<Vec<FeedInfo>, Error>>,
    /// All StopTimes
    pub stop_times: Result<Vec<StopTime>, Error>,
    /// All files that are present in the feed
    pub files: Vec<String>,
    /// sha256 sum of the feed, only for archives
    pub sha256: Option<String>,
}

impl RawGtfs {
    /// Logs the number of records of each file, or why it could not be read
    pub fn print_stats(&self) {
        log::info!("GTFS data read in {} ms", self.read_duration);
        log::info!("  Agencies: {}", mandatory_file_summary(&self.agencies));
        log::info!("  Stops: {}", mandatory_file_summary(&self.stops));
        log::info!("  Routes: {}", mandatory_file_summary(&self.routes));
        log::info!("  Trips: {}", mandatory_file_summary(&self.trips));
        log::info!("  Stop times: {}", mandatory_file_summary(&self.stop_times));
        log::info!("  Calendar: {}", optional_file_summary(&self.calendar));
        log::info!(
            "  Calendar dates: {}",
            optional_file_summary(&self.calendar_dates)
        );
        log::info!("  Shapes: {}", optional_file_summary(&self.shapes));
        log::info!("  Fares: {}", optional_file_summary(&self.fare_attributes));
        log::info!("  Fare rules: {}", optional_file_summary(&self.fare_rules));
        log::info!(
            "  Frequencies: {}",
            optional_file_summary(&self.frequencies)
        );
        log::info!("  Transfers: {}", optional_file_summary(&self.transfers));
        log::info!("  Feed info: {}", optional_file_summary(&self.feed_info));
    }

    /// Reads the raw GTFS from a local zip archive or local directory
    pub fn from_path<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path> + std::fmt::Display,
    {
        GtfsReader::default().raw().read_from_path(path)
    }

    /// Reads a zip archive from any object implementing [std::io::Read] and [std::io::Seek]
    pub fn from_reader<T: std::io::Read + std::io::Seek>(reader: T) -> Result<Self, Error> {
        GtfsReader::default().raw().read_from_reader(reader)
    }

    pub(crate) fn unknown_to_default(&mut self) {
        if let Ok(stops) = &mut self.stops {
            for stop in stops.iter_mut() {
                stop.location_type.reset_unknown();
                stop.wheelchair_boarding.reset_unknown();
            }
        }
        if let Ok(routes) = &mut self.routes {
            for route in routes.iter_mut() {
                route.continuous_pickup.reset_unknown();
                route.continuous_drop_off.reset_unknown();
            }
        }
        if let Ok(stop_times) = &mut self.stop_times {
            for stop_time in stop_times.iter_mut() {
                stop_time.pickup_type.reset_unknown();
                stop_time.drop_off_type.reset_unknown();
                stop_time.continuous_pickup.reset_unknown();
                stop_time.continuous_drop_off.reset_unknown();
            }
        }
        if let Ok(trips) = &mut self.trips {
            for trip in trips.iter_mut() {
                trip.wheelchair_accessible.reset_unknown();
                trip.bikes_allowed.reset_unknown();
            }
        }
    }
}

fn mandatory_file_summary<T>(objs: &Result<Vec<T>, Error>) -> String {
    match objs {
        Ok(vec) => format!("{} objects", vec.len()),
        Err(e) => format!("Could not read {}", e),
    }
}

fn optional_file_summary<T>(objs: &Option<Result<Vec<T>, Error>>) -> String {
    match objs {
        Some(objs) => mandatory_file_summary(objs),
        None => "File not present".to_string(),
    }
}

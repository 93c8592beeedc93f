//! Typed collections of GTFS records, independent of where they are stored
//!
//! A [Feed] holds one [EntityCollection] per GTFS file. The [Storage] decides what the collections are:
//! [InMemory] keeps the records in vectors, [SqliteStorage] keeps them in the tables of a SQLite database.
//! Everything working on a feed (filters, calendar normalization, validation, writer) only relies on
//! the [EntityCollection] operations.
use crate::objects::*;
use crate::{Error, RawGtfs};
use std::collections::BTreeMap;
use std::fmt;

mod memory;
mod sqlite;

pub use memory::{InMemory, MemoryCollection};
pub use sqlite::{SqliteCollection, SqliteStorage};

/// Operations available on the records of one GTFS file
pub trait EntityCollection<T: Entity> {
    /// Appends a record. Records keep their insertion order
    fn add(&mut self, entity: T) -> Result<(), Error>;

    /// Appends all the records
    fn add_all<I>(&mut self, entities: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
    {
        for entity in entities {
            self.add(entity)?;
        }
        Ok(())
    }

    /// All the records, in insertion order
    fn all(&self) -> Result<Vec<T>, Error>;

    /// The record with this unique key ([Entity::key])
    ///
    /// Always `None` for the files without unique key
    fn get(&self, key: &str) -> Result<Option<T>, Error>;

    /// The records grouped under this foreign key ([Entity::foreign_key]), in insertion order
    fn get_by_foreign_key(&self, foreign_key: &str) -> Result<Vec<T>, Error>;

    /// Removes the records with this unique key, returns how many were removed
    fn remove(&mut self, key: &str) -> Result<usize, Error>;

    /// Removes the records grouped under this foreign key, returns how many were removed
    fn remove_by_foreign_key(&mut self, foreign_key: &str) -> Result<usize, Error>;

    /// Number of records
    fn len(&self) -> Result<usize, Error>;

    /// Is there no record at all
    fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len()? == 0)
    }
}

/// Provides the collections of a [Feed]
pub trait Storage {
    /// The collection holding the records of type `T`
    type Collection<T: Entity>: EntityCollection<T>;

    /// Opens (and creates if needed) the collection of records of type `T`
    fn collection<T: Entity>(&self) -> Result<Self::Collection<T>, Error>;
}

/// All the GTFS files of a transit feed
pub struct Feed<S: Storage> {
    /// All agencies
    pub agencies: S::Collection<Agency>,
    /// All stops, stations and other locations
    pub stops: S::Collection<Stop>,
    /// All routes
    pub routes: S::Collection<Route>,
    /// All trips
    pub trips: S::Collection<Trip>,
    /// All stop times, grouped by trip
    pub stop_times: S::Collection<StopTime>,
    /// All calendars, grouped by service
    pub calendar: S::Collection<Calendar>,
    /// All calendar dates, grouped by service
    pub calendar_dates: S::Collection<CalendarDate>,
    /// All fare attributes
    pub fare_attributes: S::Collection<FareAttribute>,
    /// All fare rules, grouped by route
    pub fare_rules: S::Collection<FareRule>,
    /// All frequencies, grouped by trip
    pub frequencies: S::Collection<Frequency>,
    /// All shape points, grouped by shape
    pub shapes: S::Collection<Shape>,
    /// All transfers, grouped by departure stop
    pub transfers: S::Collection<Transfer>,
    /// Feed information. There is no identifier
    pub feed_info: S::Collection<FeedInfo>,
}

impl<S: Storage> Feed<S> {
    /// Creates a feed whose collections are provided by the storage
    ///
    /// With a persistent storage, the feed exposes the records already stored.
    pub fn new(storage: &S) -> Result<Self, Error> {
        Ok(Feed {
            agencies: storage.collection()?,
            stops: storage.collection()?,
            routes: storage.collection()?,
            trips: storage.collection()?,
            stop_times: storage.collection()?,
            calendar: storage.collection()?,
            calendar_dates: storage.collection()?,
            fare_attributes: storage.collection()?,
            fare_rules: storage.collection()?,
            frequencies: storage.collection()?,
            shapes: storage.collection()?,
            transfers: storage.collection()?,
            feed_info: storage.collection()?,
        })
    }

    /// Stores all the records of a [RawGtfs]
    ///
    /// Fails if a file could not be read, or if a mandatory file is missing
    pub fn from_raw(storage: &S, raw: RawGtfs) -> Result<Self, Error> {
        let mut feed = Feed::new(storage)?;
        feed.agencies.add_all(raw.agencies?)?;
        feed.stops.add_all(raw.stops?)?;
        feed.routes.add_all(raw.routes?)?;
        feed.trips.add_all(raw.trips?)?;
        feed.stop_times.add_all(raw.stop_times?)?;
        feed.calendar
            .add_all(raw.calendar.unwrap_or_else(|| Ok(Vec::new()))?)?;
        feed.calendar_dates
            .add_all(raw.calendar_dates.unwrap_or_else(|| Ok(Vec::new()))?)?;
        feed.fare_attributes
            .add_all(raw.fare_attributes.unwrap_or_else(|| Ok(Vec::new()))?)?;
        feed.fare_rules
            .add_all(raw.fare_rules.unwrap_or_else(|| Ok(Vec::new()))?)?;
        feed.frequencies
            .add_all(raw.frequencies.unwrap_or_else(|| Ok(Vec::new()))?)?;
        feed.shapes
            .add_all(raw.shapes.unwrap_or_else(|| Ok(Vec::new()))?)?;
        feed.transfers
            .add_all(raw.transfers.unwrap_or_else(|| Ok(Vec::new()))?)?;
        feed.feed_info
            .add_all(raw.feed_info.unwrap_or_else(|| Ok(Vec::new()))?)?;
        Ok(feed)
    }

    /// Copies every record of this feed into another one, possibly backed by another storage
    pub fn copy_into<D: Storage>(&self, target: &mut Feed<D>) -> Result<(), Error> {
        target.agencies.add_all(self.agencies.all()?)?;
        target.stops.add_all(self.stops.all()?)?;
        target.routes.add_all(self.routes.all()?)?;
        target.trips.add_all(self.trips.all()?)?;
        target.stop_times.add_all(self.stop_times.all()?)?;
        target.calendar.add_all(self.calendar.all()?)?;
        target.calendar_dates.add_all(self.calendar_dates.all()?)?;
        target.fare_attributes.add_all(self.fare_attributes.all()?)?;
        target.fare_rules.add_all(self.fare_rules.all()?)?;
        target.frequencies.add_all(self.frequencies.all()?)?;
        target.shapes.add_all(self.shapes.all()?)?;
        target.transfers.add_all(self.transfers.all()?)?;
        target.feed_info.add_all(self.feed_info.all()?)?;
        Ok(())
    }

    /// Number of records per GTFS file name
    pub fn counts(&self) -> Result<BTreeMap<&'static str, usize>, Error> {
        Ok(BTreeMap::from([
            (Agency::FILE_NAME, self.agencies.len()?),
            (Stop::FILE_NAME, self.stops.len()?),
            (Route::FILE_NAME, self.routes.len()?),
            (Trip::FILE_NAME, self.trips.len()?),
            (StopTime::FILE_NAME, self.stop_times.len()?),
            (Calendar::FILE_NAME, self.calendar.len()?),
            (CalendarDate::FILE_NAME, self.calendar_dates.len()?),
            (FareAttribute::FILE_NAME, self.fare_attributes.len()?),
            (FareRule::FILE_NAME, self.fare_rules.len()?),
            (Frequency::FILE_NAME, self.frequencies.len()?),
            (Shape::FILE_NAME, self.shapes.len()?),
            (Transfer::FILE_NAME, self.transfers.len()?),
            (FeedInfo::FILE_NAME, self.feed_info.len()?),
        ]))
    }

    /// Logs the number of records of each file. Mostly to be sure that everything was read
    pub fn print_stats(&self) -> Result<(), Error> {
        for (file_name, count) in self.counts()? {
            log::info!("  {}: {} objects", file_name, count);
        }
        Ok(())
    }

    /// Gets a [Stop] by its `stop_id`
    pub fn get_stop(&self, id: &str) -> Result<Stop, Error> {
        self.stops
            .get(id)?
            .ok_or_else(|| Error::ReferenceError(id.to_owned()))
    }

    /// Gets a [Trip] by its `trip_id`
    pub fn get_trip(&self, id: &str) -> Result<Trip, Error> {
        self.trips
            .get(id)?
            .ok_or_else(|| Error::ReferenceError(id.to_owned()))
    }

    /// Gets a [Route] by its `route_id`
    pub fn get_route(&self, id: &str) -> Result<Route, Error> {
        self.routes
            .get(id)?
            .ok_or_else(|| Error::ReferenceError(id.to_owned()))
    }

    /// All the [StopTime] of a trip, sorted by `stop_sequence`
    pub fn stop_times_of(&self, trip_id: &str) -> Result<Vec<StopTime>, Error> {
        let mut stop_times = self.stop_times.get_by_foreign_key(trip_id)?;
        stop_times.sort_by_key(|st| st.stop_sequence);
        Ok(stop_times)
    }

    /// All the points of a shape, sorted by their sequence
    pub fn shape_points(&self, shape_id: &str) -> Result<Vec<Shape>, Error> {
        let mut points = self.shapes.get_by_foreign_key(shape_id)?;
        points.sort_by_key(|p| p.sequence);
        Ok(points)
    }

    /// Every `service_id` referenced by a calendar, a calendar date or a trip, sorted
    pub fn service_ids(&self) -> Result<Vec<String>, Error> {
        let mut ids: Vec<String> = self
            .calendar
            .all()?
            .into_iter()
            .map(|c| c.service_id)
            .chain(self.calendar_dates.all()?.into_iter().map(|c| c.service_id))
            .chain(self.trips.all()?.into_iter().map(|t| t.service_id))
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

impl Feed<InMemory> {
    /// An empty feed kept in memory
    pub fn in_memory() -> Self {
        Feed {
            agencies: MemoryCollection::default(),
            stops: MemoryCollection::default(),
            routes: MemoryCollection::default(),
            trips: MemoryCollection::default(),
            stop_times: MemoryCollection::default(),
            calendar: MemoryCollection::default(),
            calendar_dates: MemoryCollection::default(),
            fare_attributes: MemoryCollection::default(),
            fare_rules: MemoryCollection::default(),
            frequencies: MemoryCollection::default(),
            shapes: MemoryCollection::default(),
            transfers: MemoryCollection::default(),
            feed_info: MemoryCollection::default(),
        }
    }

    /// Reads the GTFS from a local zip archive or local directory into memory
    pub fn from_path<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<std::path::Path> + std::fmt::Display,
    {
        RawGtfs::from_path(path).and_then(|raw| Feed::from_raw(&InMemory, raw))
    }
}

impl Default for Feed<InMemory> {
    fn default() -> Self {
        Feed::in_memory()
    }
}

impl PartialEq for Feed<InMemory> {
    fn eq(&self, other: &Self) -> bool {
        self.agencies == other.agencies
            && self.stops == other.stops
            && self.routes == other.routes
            && self.trips == other.trips
            && self.stop_times == other.stop_times
            && self.calendar == other.calendar
            && self.calendar_dates == other.calendar_dates
            && self.fare_attributes == other.fare_attributes
            && self.fare_rules == other.fare_rules
            && self.frequencies == other.frequencies
            && self.shapes == other.shapes
            && self.transfers == other.transfers
            && self.feed_info == other.feed_info
    }
}

impl fmt::Debug for Feed<InMemory> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Feed")
            .field("agencies", &self.agencies)
            .field("stops", &self.stops)
            .field("routes", &self.routes)
            .field("trips", &self.trips)
            .field("stop_times", &self.stop_times)
            .field("calendar", &self.calendar)
            .field("calendar_dates", &self.calendar_dates)
            .field("fare_attributes", &self.fare_attributes)
            .field("fare_rules", &self.fare_rules)
            .field("frequencies", &self.frequencies)
            .field("shapes", &self.shapes)
            .field("transfers", &self.transfers)
            .field("feed_info", &self.feed_info)
            .finish()
    }
}

use crate::feed::{EntityCollection, Feed, Storage};
use crate::objects::Entity;
use crate::Error;
use std::path::{Path, PathBuf};

/// Writes a [Feed] as GTFS CSV files in a directory
///
/// The headers are the GTFS field names. Only the non-empty collections produce a file.
///
/// ```no_run
///let feed = gtfs_feed::Feed::from_path("fixtures/sample-feed")?;
///let written = gtfs_feed::GtfsWriter::new("/tmp/sample-feed").write(&feed)?;
///assert!(written.contains(&"stops.txt"));
/// # Ok::<(), gtfs_feed::Error>(())
///```
pub struct GtfsWriter {
    dir: PathBuf,
}

impl GtfsWriter {
    /// The directory is created when the feed is written
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        GtfsWriter { dir: dir.into() }
    }

    /// Directory where the files are written
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes every file of the feed, returns the names of the files written
    ///
    /// A file left by a previous run is removed when its collection is empty.
    pub fn write<S: Storage>(&self, feed: &Feed<S>) -> Result<Vec<&'static str>, Error> {
        std::fs::create_dir_all(&self.dir)?;
        let mut written = Vec::new();
        self.write_file(&feed.agencies, true, &mut written)?;
        self.write_file(&feed.stops, true, &mut written)?;
        self.write_file(&feed.routes, true, &mut written)?;
        self.write_file(&feed.trips, true, &mut written)?;
        self.write_file(&feed.stop_times, true, &mut written)?;
        self.write_file(&feed.calendar, false, &mut written)?;
        self.write_file(&feed.calendar_dates, false, &mut written)?;
        self.write_file(&feed.fare_attributes, false, &mut written)?;
        self.write_file(&feed.fare_rules, false, &mut written)?;
        self.write_file(&feed.frequencies, false, &mut written)?;
        self.write_file(&feed.shapes, false, &mut written)?;
        self.write_file(&feed.transfers, false, &mut written)?;
        self.write_file(&feed.feed_info, false, &mut written)?;
        log::info!("{} files written in {}", written.len(), self.dir.display());
        Ok(written)
    }

    fn write_file<T, C>(
        &self,
        collection: &C,
        mandatory: bool,
        written: &mut Vec<&'static str>,
    ) -> Result<(), Error>
    where
        T: Entity,
        C: EntityCollection<T>,
    {
        let path = self.dir.join(T::FILE_NAME);
        let records = collection.all()?;
        if records.is_empty() {
            if mandatory {
                log::warn!("no record for the mandatory file {}, not written", T::FILE_NAME);
            }
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
            return Ok(());
        }

        let write_error = |source: csv::Error| Error::Write {
            file_name: T::FILE_NAME.to_owned(),
            source,
        };
        let mut wtr = csv::Writer::from_path(&path).map_err(write_error)?;
        for record in &records {
            wtr.serialize(record).map_err(write_error)?;
        }
        wtr.flush()?;
        log::debug!("{}: {} records written", T::FILE_NAME, records.len());
        written.push(T::FILE_NAME);
        Ok(())
    }
}

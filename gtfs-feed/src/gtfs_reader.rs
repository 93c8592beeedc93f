use chrono::Utc;
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};

use crate::feed::{Feed, InMemory, Storage};
use crate::objects::*;
use crate::{Error, RawGtfs};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Allows to parameterize how the parsing library behaves
///
/// ```
///let feed = gtfs_feed::GtfsReader::default()
///    .read_stop_times(false) // Won’t read the stop times to save time and memory
///    .unkown_enum_as_default(false) // Won’t convert unknown enumerations into default (e.g. LocationType=42 considered as a stop point)
///    .read("fixtures/sample-feed")?;
///assert_eq!(0, feed.stop_times.iter().count());
/// # Ok::<(), gtfs_feed::Error>(())
///```
///
/// You can also get a [RawGtfs] by doing
/// ```
///let raw = gtfs_feed::GtfsReader::default()
///    .read_stop_times(false)
///    .raw()
///    .read_from_path("fixtures/sample-feed")?;
///assert_eq!(11, raw.trips?.len());
///assert_eq!(0, raw.stop_times?.len());
/// # Ok::<(), gtfs_feed::Error>(())
///```
#[derive(Derivative)]
#[derivative(Default)]
pub struct GtfsReader {
    /// [StopTime] are very large and not always needed. This allows to skip reading them
    #[derivative(Default(value = "true"))]
    pub read_stop_times: bool,
    /// If a an enumeration has un unknown value, should we use the default value
    #[derivative(Default(value = "false"))]
    pub unkown_enum_as_default: bool,
    /// Avoid trimming the fields
    ///
    /// It is quite time consumming
    /// If performance is an issue, and if your data is high quality, you can switch it off
    #[derivative(Default(value = "true"))]
    pub trim_fields: bool,
}

impl GtfsReader {
    /// Configures the reader to read or not the stop times (default: true)
    ///
    /// This can be useful to save time and memory with large datasets when the timetable are not needed
    /// Returns Self and can be chained
    pub fn read_stop_times(mut self, read_stop_times: bool) -> Self {
        self.read_stop_times = read_stop_times;
        self
    }

    /// If a an enumeration has un unknown value, should we use the default value (default: false)
    ///
    /// For instance, if [Stop] has a [LocationType] with a value 42 in the GTFS
    /// when true, we will parse it as StopPoint
    /// when false, we will parse it as Unknown(42)
    /// Returns Self and can be chained
    pub fn unkown_enum_as_default(mut self, unkown_enum_as_default: bool) -> Self {
        self.unkown_enum_as_default = unkown_enum_as_default;
        self
    }

    /// Should the fields be trimmed (default: true)
    ///
    /// It is quite time consumming
    /// If performance is an issue, and if your data is high quality, you can set it to false
    pub fn trim_fields(mut self, trim_fields: bool) -> Self {
        self.trim_fields = trim_fields;
        self
    }

    /// Reads a local path (either a directory or zipped file) into memory
    pub fn read<P>(self, path: P) -> Result<Feed<InMemory>, Error>
    where
        P: AsRef<Path> + std::fmt::Display,
    {
        self.read_into(path, &InMemory)
    }

    /// Reads a local path (either a directory or zipped file) into the collections of a storage
    ///
    /// Fails on the first mandatory file that is missing or invalid
    pub fn read_into<P, S>(self, path: P, storage: &S) -> Result<Feed<S>, Error>
    where
        P: AsRef<Path> + std::fmt::Display,
        S: Storage,
    {
        let raw = self.raw().read_from_path(path)?;
        raw.print_stats();
        Feed::from_raw(storage, raw)
    }

    /// Read the Gtfs as a [RawGtfs].
    pub fn raw(self) -> RawGtfsReader {
        RawGtfsReader { reader: self }
    }
}

/// Where the files of a feed are read from
enum Source<'a, R> {
    Directory(&'a Path),
    Archive {
        archive: zip::ZipArchive<R>,
        // The files may be in a sub-directory of the archive
        index: FxHashMap<String, usize>,
    },
}

/// This reader generates [RawGtfs]. It must be built using [GtfsReader::raw]
pub struct RawGtfsReader {
    reader: GtfsReader,
}

impl RawGtfsReader {
    /// Reads the raw GTFS from a local zip archive or local directory
    pub fn read_from_path<P>(&self, path: P) -> Result<RawGtfs, Error>
    where
        P: AsRef<Path> + std::fmt::Display,
    {
        let p = path.as_ref();
        if p.is_file() {
            let reader = File::open(p)?;
            self.read_from_reader(reader)
        } else if p.is_dir() {
            self.read_from_directory(p)
        } else {
            Err(Error::NotFileNorDirectory(format!("{}", p.display())))
        }
    }

    fn read_from_directory(&self, p: &Path) -> Result<RawGtfs, Error> {
        let now = Utc::now();
        let files = std::fs::read_dir(p)?
            .filter_map(|d| d.ok().and_then(|p| p.path().to_str().map(|s| s.to_owned())))
            .collect();
        let mut source: Source<File> = Source::Directory(p);
        Ok(self.read_all(&mut source, now, files, None))
    }

    /// Reads a zip archive from any object implementing [std::io::Read] and [std::io::Seek]
    pub fn read_from_reader<T: std::io::Read + std::io::Seek>(
        &self,
        reader: T,
    ) -> Result<RawGtfs, Error> {
        let now = Utc::now();
        let mut hasher = Sha256::new();
        let mut buf_reader = std::io::BufReader::new(reader);
        let _n = std::io::copy(&mut buf_reader, &mut hasher)?;
        let hash = hasher.finalize();
        let mut archive = zip::ZipArchive::new(buf_reader)?;

        let mut files = Vec::with_capacity(archive.len());
        let mut index = FxHashMap::default();
        for i in 0..archive.len() {
            let archive_file = archive.by_index(i)?;
            files.push(archive_file.name().to_owned());
            if let Some(file_name) = Path::new(archive_file.name())
                .file_name()
                .and_then(|f| f.to_str())
            {
                index.entry(file_name.to_owned()).or_insert(i);
            }
        }

        let mut source = Source::Archive { archive, index };
        Ok(self.read_all(&mut source, now, files, Some(format!("{:x}", hash))))
    }

    fn read_all<R: std::io::Read + std::io::Seek>(
        &self,
        source: &mut Source<R>,
        started_at: chrono::DateTime<Utc>,
        files: Vec<String>,
        sha256: Option<String>,
    ) -> RawGtfs {
        let mut result = RawGtfs {
            agencies: self.read_mandatory(source),
            stops: self.read_mandatory(source),
            routes: self.read_mandatory(source),
            trips: self.read_mandatory(source),
            stop_times: if self.reader.read_stop_times {
                self.read_mandatory(source)
            } else {
                Ok(Vec::new())
            },
            calendar: self.read_optional(source),
            calendar_dates: self.read_optional(source),
            shapes: self.read_optional(source),
            fare_attributes: self.read_optional(source),
            fare_rules: self.read_optional(source),
            frequencies: self.read_optional(source),
            transfers: self.read_optional(source),
            feed_info: self.read_optional(source),
            read_duration: Utc::now()
                .signed_duration_since(started_at)
                .num_milliseconds(),
            files,
            sha256,
        };

        if self.reader.unkown_enum_as_default {
            result.unknown_to_default();
        }
        result
    }

    fn read_mandatory<T, R>(&self, source: &mut Source<R>) -> Result<Vec<T>, Error>
    where
        T: Entity,
        R: std::io::Read + std::io::Seek,
    {
        self.read_optional(source)
            .unwrap_or_else(|| Err(Error::MissingFile(T::FILE_NAME.to_owned())))
    }

    // None if the file is not in the feed
    fn read_optional<T, R>(&self, source: &mut Source<R>) -> Option<Result<Vec<T>, Error>>
    where
        T: Entity,
        R: std::io::Read + std::io::Seek,
    {
        let file_io_error = |e: std::io::Error| Error::NamedFileIO {
            file_name: T::FILE_NAME.to_owned(),
            source: Box::new(e),
        };
        match source {
            Source::Directory(dir) => {
                let path = dir.join(T::FILE_NAME);
                if !path.is_file() {
                    return None;
                }
                Some(
                    File::open(path)
                        .map_err(file_io_error)
                        .and_then(|r| self.read_objs(r, T::FILE_NAME)),
                )
            }
            Source::Archive { archive, index } => index.get(T::FILE_NAME).map(|&i| {
                let file = archive.by_index(i).map_err(|e| Error::NamedFileIO {
                    file_name: T::FILE_NAME.to_owned(),
                    source: Box::new(e),
                })?;
                self.read_objs(file, T::FILE_NAME)
            }),
        }
    }

    fn read_objs<T, O>(&self, mut reader: T, file_name: &str) -> Result<Vec<O>, Error>
    where
        O: Entity,
        T: std::io::Read,
    {
        let mut bom = [0; 3];
        reader
            .read_exact(&mut bom)
            .map_err(|e| Error::NamedFileIO {
                file_name: file_name.to_owned(),
                source: Box::new(e),
            })?;

        let chained = if bom != [0xefu8, 0xbbu8, 0xbfu8] {
            bom.chain(reader)
        } else {
            [].chain(reader)
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(if self.reader.trim_fields {
                csv::Trim::Fields
            } else {
                csv::Trim::None
            })
            .from_reader(chained);
        let csv_error = |source: csv::Error, line_in_error| Error::CSVError {
            file_name: file_name.to_owned(),
            source,
            line_in_error,
        };
        // Kept to be returned with the offending line
        let headers = reader
            .headers()
            .map_err(|e| csv_error(e, None))?
            .clone();

        let mut rec = csv::StringRecord::new();
        let mut objs = Vec::new();
        while reader
            .read_record(&mut rec)
            .map_err(|e| csv_error(e, None))?
        {
            let obj = rec.deserialize(Some(&headers)).map_err(|e| {
                csv_error(
                    e,
                    Some(crate::error::LineError {
                        headers: headers.iter().map(String::from).collect(),
                        values: rec.iter().map(String::from).collect(),
                    }),
                )
            })?;
            objs.push(obj);
        }
        log::debug!("{}: {} records", file_name, objs.len());
        Ok(objs)
    }
}

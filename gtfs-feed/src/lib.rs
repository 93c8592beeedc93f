/*! Reads, stores, prunes and rewrites [GTFS](https://gtfs.org/) feeds.

A GTFS feed is a collection of CSV files (often bundled as a zip file).
Each file represents a collection of one type (stops, routes, trips, etc.) that have relationships through unique identifiers.

## Reading

[GtfsReader] reads a directory or a zip archive into a [RawGtfs], with one result per file,
then into a [Feed]. The records are plain [serde](https://serde.rs) structures, as close as possible to their CSV representation.

## Storing

A [Feed] holds one [EntityCollection] per file. Where the records live is decided by the [Storage]:
[InMemory] or [SqliteStorage]. The records can be fetched by identifier or grouped by their main reference
(the stop times of a trip, the calendars of a service…).

## Pruning

[filter_stops] and [filter_routes] (or the [FeedFilter] implementations [StopsFilter] and [RoutesFilter])
extract the part of a feed needed by some stops or routes, without leaving any dangling reference.

## Calendars

A [Calendar] is a date range and a set of weekdays. The [calendar] module adds and removes single days while keeping
that representation, and [normalize_calendars] folds every [CalendarDate] of a feed into calendars.

## Checking and writing

[validate] lists the broken references and other inconsistencies, and [GtfsWriter] writes a feed back as CSV files.

### Use of Enum

Many values are integers that are actually enumerations of certain values. We always use Rust enums, like [LocationType] to represent them, and not the integer value.

### Renaming

We kept some names even if they can be confusing (a [Calendar] will be referenced by `service_id`), but we strip the object type (`route_short_name` is [Route::short_name]).

*/
#![warn(missing_docs)]

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate serde_derive;

pub mod calendar;
mod enums;
pub mod error;
pub mod feed;
pub mod filter;
mod gtfs_reader;
mod gtfs_writer;
pub mod normalize;
pub(crate) mod objects;
mod raw_gtfs;
mod serde_helpers;
pub mod validation;

#[cfg(test)]
mod tests;

pub use error::Error;
pub use feed::{EntityCollection, Feed, InMemory, SqliteStorage, Storage};
pub use filter::{filter_routes, filter_stops, FeedFilter, RoutesFilter, StopsFilter};
pub use gtfs_reader::{GtfsReader, RawGtfsReader};
pub use gtfs_writer::GtfsWriter;
pub use normalize::{normalize_calendars, NormalizationSummary};
pub use objects::*;
pub use raw_gtfs::RawGtfs;
pub use validation::{validate, Issue};

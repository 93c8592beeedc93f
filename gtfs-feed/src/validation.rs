//! Consistency checks of a feed, reported without modifying it
use crate::feed::{EntityCollection, Feed, Storage};
use crate::objects::*;
use crate::Error;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use std::fmt;

/// A problem found in a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    /// A field references an object that does not exist
    DanglingReference {
        /// Type of the object holding the reference
        object_type: ObjectType,
        /// Identifier of the object holding the reference (or of its parent for the objects without identifier)
        object_id: String,
        /// Name of the GTFS field
        field: &'static str,
        /// The unknown identifier
        reference: String,
    },
    /// Several objects share the same identifier
    DuplicateId {
        /// Type of the objects
        object_type: ObjectType,
        /// The shared identifier
        id: String,
        /// Number of objects with that identifier
        count: usize,
    },
    /// Two stop times of a trip have the same `stop_sequence`
    RepeatedStopSequence {
        /// The trip of the stop times
        trip_id: String,
        /// The shared sequence
        stop_sequence: u16,
    },
    /// A calendar ends before it starts
    InvertedCalendar {
        /// Service of the calendar
        service_id: String,
        /// `start_date` as written in the GTFS
        start_date: String,
        /// `end_date` as written in the GTFS
        end_date: String,
    },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Issue::DanglingReference {
                object_type,
                object_id,
                field,
                reference,
            } => write!(
                f,
                "{} {}: {} '{}' does not exist",
                object_type, object_id, field, reference
            ),
            Issue::DuplicateId {
                object_type,
                id,
                count,
            } => write!(f, "{} {} is defined {} times", object_type, id, count),
            Issue::RepeatedStopSequence {
                trip_id,
                stop_sequence,
            } => write!(
                f,
                "trip {}: stop_sequence {} is used more than once",
                trip_id, stop_sequence
            ),
            Issue::InvertedCalendar {
                service_id,
                start_date,
                end_date,
            } => write!(
                f,
                "calendar {}: start_date {} is after end_date {}",
                service_id, start_date, end_date
            ),
        }
    }
}

/// Collects the [Issue] of references pointing nowhere
struct References<'a> {
    issues: &'a mut Vec<Issue>,
}

impl References<'_> {
    fn check<T: Type>(
        &mut self,
        known: &FxHashSet<String>,
        object: &T,
        object_id: &str,
        field: &'static str,
        reference: Option<&str>,
    ) {
        if let Some(reference) = reference {
            if !known.contains(reference) {
                self.issues.push(Issue::DanglingReference {
                    object_type: object.object_type(),
                    object_id: object_id.to_owned(),
                    field,
                    reference: reference.to_owned(),
                });
            }
        }
    }
}

fn duplicates<T: Entity>(records: &[T]) -> Vec<Issue> {
    let object_type = match records.first() {
        Some(record) => record.object_type(),
        None => return Vec::new(),
    };
    records
        .iter()
        .filter_map(|r| r.key())
        .counts()
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .sorted()
        .map(|(id, count)| Issue::DuplicateId {
            object_type,
            id: id.to_owned(),
            count,
        })
        .collect()
}

/// Checks the references between the files, the unicity of identifiers, the stop sequences and the calendar ranges
pub fn validate<S: Storage>(feed: &Feed<S>) -> Result<Vec<Issue>, Error> {
    let agencies = feed.agencies.all()?;
    let stops = feed.stops.all()?;
    let routes = feed.routes.all()?;
    let trips = feed.trips.all()?;
    let stop_times = feed.stop_times.all()?;
    let calendars = feed.calendar.all()?;
    let calendar_dates = feed.calendar_dates.all()?;
    let fare_attributes = feed.fare_attributes.all()?;
    let fare_rules = feed.fare_rules.all()?;
    let frequencies = feed.frequencies.all()?;
    let shapes = feed.shapes.all()?;
    let transfers = feed.transfers.all()?;

    let mut issues = Vec::new();
    issues.extend(duplicates(&agencies));
    issues.extend(duplicates(&stops));
    issues.extend(duplicates(&routes));
    issues.extend(duplicates(&trips));
    issues.extend(duplicates(&fare_attributes));

    let agency_ids: FxHashSet<String> = agencies.iter().filter_map(|a| a.id.clone()).collect();
    let stop_ids: FxHashSet<String> = stops.iter().map(|s| s.id.clone()).collect();
    let route_ids: FxHashSet<String> = routes.iter().map(|r| r.id.clone()).collect();
    let trip_ids: FxHashSet<String> = trips.iter().map(|t| t.id.clone()).collect();
    let fare_ids: FxHashSet<String> = fare_attributes.iter().map(|f| f.id.clone()).collect();
    let shape_ids: FxHashSet<String> = shapes.iter().map(|s| s.id.clone()).collect();
    let service_ids: FxHashSet<String> = calendars
        .iter()
        .map(|c| c.service_id.clone())
        .chain(calendar_dates.iter().map(|cd| cd.service_id.clone()))
        .collect();

    let mut references = References {
        issues: &mut issues,
    };
    for stop in &stops {
        references.check(
            &stop_ids,
            stop,
            &stop.id,
            "parent_station",
            stop.parent_station.as_deref(),
        );
    }
    for route in &routes {
        references.check(
            &agency_ids,
            route,
            &route.id,
            "agency_id",
            route.agency_id.as_deref(),
        );
    }
    for trip in &trips {
        references.check(&route_ids, trip, &trip.id, "route_id", Some(trip.route_id.as_str()));
        references.check(&service_ids, trip, &trip.id, "service_id", Some(trip.service_id.as_str()));
        references.check(&shape_ids, trip, &trip.id, "shape_id", trip.shape_id.as_deref());
    }
    for stop_time in &stop_times {
        let id = &stop_time.trip_id;
        references.check(&trip_ids, stop_time, id, "trip_id", Some(id.as_str()));
        references.check(&stop_ids, stop_time, id, "stop_id", Some(stop_time.stop_id.as_str()));
    }
    for fare in &fare_attributes {
        references.check(&agency_ids, fare, &fare.id, "agency_id", fare.agency_id.as_deref());
    }
    for rule in &fare_rules {
        let id = &rule.fare_id;
        references.check(&fare_ids, rule, id, "fare_id", Some(id.as_str()));
        references.check(&route_ids, rule, id, "route_id", rule.route_id.as_deref());
    }
    for frequency in &frequencies {
        let id = &frequency.trip_id;
        references.check(&trip_ids, frequency, id, "trip_id", Some(id.as_str()));
    }
    for transfer in &transfers {
        let id = &transfer.from_stop_id;
        references.check(&stop_ids, transfer, id, "from_stop_id", Some(id.as_str()));
        references.check(&stop_ids, transfer, id, "to_stop_id", Some(transfer.to_stop_id.as_str()));
    }

    issues.extend(
        stop_times
            .iter()
            .map(|st| (st.trip_id.as_str(), st.stop_sequence))
            .sorted()
            .tuple_windows()
            .filter(|(a, b)| a == b)
            .map(|(a, _)| a)
            .dedup()
            .map(|(trip_id, stop_sequence)| Issue::RepeatedStopSequence {
                trip_id: trip_id.to_owned(),
                stop_sequence,
            }),
    );

    issues.extend(
        calendars
            .iter()
            .filter(|c| c.start_date > c.end_date)
            .map(|c| Issue::InvertedCalendar {
                service_id: c.service_id.clone(),
                start_date: c.start_date.format("%Y%m%d").to_string(),
                end_date: c.end_date.format("%Y%m%d").to_string(),
            }),
    );

    log::info!("{} issues found", issues.len());
    Ok(issues)
}

//! Extraction of a self-contained part of a feed
//!
//! A filter selects seed records (stops or routes) and keeps everything they need: the trips
//! serving them, the stops of those trips, the routes, agencies, services, shapes, fares,
//! frequencies and transfers. Records whose mandatory references do not exist in the source are
//! considered unreachable and never copied. Optional references (such as `shape_id`) pointing
//! nowhere are cleared, so the resulting feed has no dangling reference.
//!
//! Every collection of the result keeps the order of the source.
use crate::feed::{EntityCollection, Feed, InMemory, Storage};
use crate::objects::*;
use crate::Error;
use rustc_hash::{FxHashMap, FxHashSet};

mod routes;
mod stops;

pub use routes::RoutesFilter;
pub use stops::StopsFilter;

/// Copies the part of a feed selected by the filter into another feed
///
/// The source and the target can use different storages.
pub trait FeedFilter {
    /// Adds to `target` the records of `source` kept by the filter
    fn filter<S: Storage, D: Storage>(
        &self,
        source: &Feed<S>,
        target: &mut Feed<D>,
    ) -> Result<(), Error>;
}

/// Keeps the stops matching the predicate and everything needed by the trips serving them
///
/// ```
/// # use gtfs_feed::{filter_stops, EntityCollection, Feed};
/// let feed = Feed::from_path("fixtures/sample-feed")?;
/// let pruned = filter_stops(&feed, |stop| stop.id == "FUR_CREEK_RES")?;
/// assert_eq!(2, pruned.trips.len()?);
/// # Ok::<(), gtfs_feed::Error>(())
/// ```
pub fn filter_stops<S, P>(source: &Feed<S>, predicate: P) -> Result<Feed<InMemory>, Error>
where
    S: Storage,
    P: Fn(&Stop) -> bool,
{
    let mut target = Feed::in_memory();
    StopsFilter::new(predicate).filter(source, &mut target)?;
    Ok(target)
}

/// Keeps the routes matching the predicate and everything needed by their trips
pub fn filter_routes<S, P>(source: &Feed<S>, predicate: P) -> Result<Feed<InMemory>, Error>
where
    S: Storage,
    P: Fn(&Route) -> bool,
{
    let mut target = Feed::in_memory();
    RoutesFilter::new(predicate).filter(source, &mut target)?;
    Ok(target)
}

/// `service_id` defined by a calendar or a calendar date
fn known_services<S: Storage>(source: &Feed<S>) -> Result<FxHashSet<String>, Error> {
    Ok(source
        .calendar
        .all()?
        .into_iter()
        .map(|c| c.service_id)
        .chain(source.calendar_dates.all()?.into_iter().map(|cd| cd.service_id))
        .collect())
}

/// The trips whose route and service exist
fn resolvable_trips<S: Storage>(source: &Feed<S>) -> Result<Vec<Trip>, Error> {
    let services = known_services(source)?;
    let routes: FxHashSet<String> = source.routes.all()?.into_iter().map(|r| r.id).collect();
    let (resolvable, dangling): (Vec<Trip>, Vec<Trip>) = source
        .trips
        .all()?
        .into_iter()
        .partition(|t| routes.contains(&t.route_id) && services.contains(&t.service_id));
    if !dangling.is_empty() {
        log::debug!(
            "{} trips ignored, their route or service does not exist",
            dangling.len()
        );
    }
    Ok(resolvable)
}

/// Stops used by the seeds and the stop times, with all their parent stations
fn reachable_stops(
    source_stops: &[Stop],
    seeds: FxHashSet<String>,
    stop_times: &[StopTime],
) -> FxHashSet<String> {
    let parents: FxHashMap<&str, Option<&str>> = source_stops
        .iter()
        .map(|s| (s.id.as_str(), s.parent_station.as_deref()))
        .collect();

    let mut kept = seeds;
    kept.extend(
        stop_times
            .iter()
            .filter(|st| parents.contains_key(st.stop_id.as_str()))
            .map(|st| st.stop_id.clone()),
    );
    let mut pending: Vec<String> = kept.iter().cloned().collect();
    while let Some(id) = pending.pop() {
        if let Some(Some(parent)) = parents.get(id.as_str()) {
            if parents.contains_key(parent) && kept.insert((*parent).to_owned()) {
                pending.push((*parent).to_owned());
            }
        }
    }
    kept
}

/// Copies the kept trips and everything they reference, plus the seed stops and routes
///
/// Optional references (`shape_id`, `agency_id`, `parent_station`) that do not exist in the
/// source are cleared on the copies.
fn copy_reachable<S: Storage, D: Storage>(
    source: &Feed<S>,
    target: &mut Feed<D>,
    mut trips: Vec<Trip>,
    seed_stops: FxHashSet<String>,
    seed_routes: FxHashSet<String>,
) -> Result<(), Error> {
    let trip_ids: FxHashSet<String> = trips.iter().map(|t| t.id.clone()).collect();
    let mut source_stops = source.stops.all()?;
    let trip_stop_times: Vec<StopTime> = source
        .stop_times
        .all()?
        .into_iter()
        .filter(|st| trip_ids.contains(&st.trip_id))
        .collect();
    let source_stop_ids: FxHashSet<String> = source_stops.iter().map(|s| s.id.clone()).collect();
    for stop in &mut source_stops {
        clear_unknown(&mut stop.parent_station, &source_stop_ids);
    }
    let stops = reachable_stops(&source_stops, seed_stops, &trip_stop_times);

    let source_shapes: FxHashSet<String> = source.shapes.all()?.into_iter().map(|p| p.id).collect();
    for trip in &mut trips {
        clear_unknown(&mut trip.shape_id, &source_shapes);
    }

    let mut route_ids = seed_routes;
    route_ids.extend(trips.iter().map(|t| t.route_id.clone()));
    let service_ids: FxHashSet<&str> = trips.iter().map(|t| t.service_id.as_str()).collect();
    let shape_ids: FxHashSet<&str> = trips.iter().filter_map(|t| t.shape_id.as_deref()).collect();

    let source_agencies = source.agencies.all()?;
    let source_agency_ids: FxHashSet<String> =
        source_agencies.iter().filter_map(|a| a.id.clone()).collect();
    let mut routes: Vec<Route> = source
        .routes
        .all()?
        .into_iter()
        .filter(|r| route_ids.contains(&r.id))
        .collect();
    for route in &mut routes {
        clear_unknown(&mut route.agency_id, &source_agency_ids);
    }
    // a route without agency_id belongs to the only agency of the feed
    let implicit_agency = routes.iter().any(|r| r.agency_id.is_none());

    let mut fare_attributes = source.fare_attributes.all()?;
    for fare in &mut fare_attributes {
        clear_unknown(&mut fare.agency_id, &source_agency_ids);
    }
    let fare_rules: Vec<FareRule> = {
        let known_fares: FxHashSet<&str> = fare_attributes.iter().map(|f| f.id.as_str()).collect();
        source
            .fare_rules
            .all()?
            .into_iter()
            .filter(|rule| {
                rule.route_id
                    .as_deref()
                    .map_or(false, |id| route_ids.contains(id))
                    && known_fares.contains(rule.fare_id.as_str())
            })
            .collect()
    };
    let fare_ids: FxHashSet<&str> = fare_rules.iter().map(|rule| rule.fare_id.as_str()).collect();
    let fare_attributes: Vec<FareAttribute> = fare_attributes
        .into_iter()
        .filter(|f| fare_ids.contains(f.id.as_str()))
        .collect();

    let agency_ids: FxHashSet<&str> = routes
        .iter()
        .filter_map(|r| r.agency_id.as_deref())
        .chain(fare_attributes.iter().filter_map(|f| f.agency_id.as_deref()))
        .collect();

    log::info!(
        "keeping {} stops, {} trips, {} routes, {} services",
        stops.len(),
        trips.len(),
        routes.len(),
        service_ids.len()
    );

    target.agencies.add_all(
        source_agencies
            .into_iter()
            .filter(|a| match a.id.as_deref() {
                Some(id) => agency_ids.contains(id) || implicit_agency,
                None => !routes.is_empty(),
            }),
    )?;
    target
        .stops
        .add_all(source_stops.into_iter().filter(|s| stops.contains(&s.id)))?;
    target.stop_times.add_all(
        trip_stop_times
            .into_iter()
            .filter(|st| stops.contains(&st.stop_id)),
    )?;
    target.calendar.add_all(
        source
            .calendar
            .all()?
            .into_iter()
            .filter(|c| service_ids.contains(c.service_id.as_str())),
    )?;
    target.calendar_dates.add_all(
        source
            .calendar_dates
            .all()?
            .into_iter()
            .filter(|cd| service_ids.contains(cd.service_id.as_str())),
    )?;
    target.fare_attributes.add_all(fare_attributes)?;
    target.frequencies.add_all(
        source
            .frequencies
            .all()?
            .into_iter()
            .filter(|f| trip_ids.contains(&f.trip_id)),
    )?;
    target.shapes.add_all(
        source
            .shapes
            .all()?
            .into_iter()
            .filter(|p| shape_ids.contains(p.id.as_str())),
    )?;
    target.transfers.add_all(
        source
            .transfers
            .all()?
            .into_iter()
            .filter(|t| stops.contains(&t.from_stop_id) && stops.contains(&t.to_stop_id)),
    )?;
    target.feed_info.add_all(source.feed_info.all()?)?;
    target.fare_rules.add_all(fare_rules)?;
    target.routes.add_all(routes)?;
    target.trips.add_all(trips)?;
    Ok(())
}

/// Forgets an optional reference to an object missing from the source
fn clear_unknown(reference: &mut Option<String>, known: &FxHashSet<String>) {
    if reference.as_ref().map_or(false, |r| !known.contains(r)) {
        log::debug!("unknown reference {:?} cleared", reference);
        *reference = None;
    }
}

use crate::feed::{EntityCollection, Feed, InMemory, SqliteStorage};
use crate::normalize::{normalize_calendars, service_runs_on, NormalizationSummary};
use crate::objects::*;
use crate::{filter_routes, filter_stops, validate, GtfsReader, GtfsWriter, RawGtfs};
use chrono::{Duration, NaiveDate};
use rgb::RGB8;

const SAMPLE: &str = "fixtures/sample-feed";

fn sample() -> Feed<InMemory> {
    Feed::from_path(SAMPLE).expect("impossible to read gtfs")
}

fn ids<T: Entity>(records: Vec<T>) -> Vec<String> {
    records
        .iter()
        .map(|r| r.key().expect("records without key").to_owned())
        .collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn read_sample_feed() {
    let gtfs = sample();
    let counts = gtfs.counts().unwrap();
    assert_eq!(1, counts["agency.txt"]);
    assert_eq!(9, counts["stops.txt"]);
    assert_eq!(5, counts["routes.txt"]);
    assert_eq!(11, counts["trips.txt"]);
    assert_eq!(28, counts["stop_times.txt"]);
    assert_eq!(2, counts["calendar.txt"]);
    assert_eq!(1, counts["calendar_dates.txt"]);
    assert_eq!(2, counts["fare_attributes.txt"]);
    assert_eq!(4, counts["fare_rules.txt"]);
    assert_eq!(11, counts["frequencies.txt"]);
    assert_eq!(4, counts["shapes.txt"]);
    assert_eq!(3, counts["transfers.txt"]);
    assert_eq!(1, counts["feed_info.txt"]);
}

#[test]
fn read_from_zip() {
    let raw = RawGtfs::from_path("fixtures/zips/sample-feed.zip").expect("impossible to read gtfs");
    assert!(raw.sha256.is_some());
    let zipped = Feed::from_raw(&InMemory, raw).unwrap();
    assert_eq!(sample(), zipped);
}

#[test]
fn read_objects() {
    let gtfs = sample();
    let stop = gtfs.get_stop("BEATTY_AIRPORT").unwrap();
    assert_eq!("Nye County Airport (Demo)", stop.name);
    assert_eq!(Some(36.868446), stop.latitude);
    assert_eq!(LocationType::StopPoint, stop.location_type);

    let route = gtfs.get_route("AB").unwrap();
    assert_eq!(RouteType::Bus, route.route_type);
    assert_eq!(RGB8::new(255, 255, 255), route.color);
    assert_eq!(RGB8::new(0, 0, 0), route.text_color);

    let trip = gtfs.get_trip("AB1").unwrap();
    assert_eq!(Some(DirectionType::Outbound), trip.direction_id);
    assert_eq!(Some("AB_SHAPE".to_owned()), trip.shape_id);
    assert!(gtfs.get_trip("unknown").is_err());

    let fare = gtfs.fare_attributes.get("p").unwrap().unwrap();
    assert_eq!("1.25", fare.price);
    assert_eq!(Transfers::NoTransfer, fare.transfers);
    assert_eq!(None, fare.transfer_duration);

    let feed_info = gtfs.feed_info.all().unwrap();
    assert_eq!(Some(date(2010, 12, 31)), feed_info[0].end_date);
}

#[test]
fn read_calendars() {
    let gtfs = sample();
    let fullw = gtfs.calendar.get_by_foreign_key("FULLW").unwrap();
    assert_eq!(1, fullw.len());
    assert!(fullw[0].monday && fullw[0].sunday);
    let we = &gtfs.calendar.get_by_foreign_key("WE").unwrap()[0];
    assert!(!we.monday && we.saturday && we.sunday);
    let exceptions = gtfs.calendar_dates.get_by_foreign_key("FULLW").unwrap();
    assert_eq!(Exception::Removed, exceptions[0].exception_type);
    assert_eq!(date(2007, 6, 4), exceptions[0].date);
    assert_eq!(vec!["FULLW", "WE"], gtfs.service_ids().unwrap());
}

#[test]
fn stop_times_and_shapes_are_sorted() {
    let gtfs = sample();
    let stops: Vec<_> = gtfs
        .stop_times_of("CITY2")
        .unwrap()
        .into_iter()
        .map(|st| st.stop_id)
        .collect();
    assert_eq!(vec!["EMSI", "DADAN", "NADAV", "NANAA", "STAGECOACH"], stops);
    assert_eq!(Some(6 * 3600 + 28 * 60), gtfs.stop_times_of("CITY2").unwrap()[0].arrival_time);
    let points = gtfs.shape_points("BFC_SHAPE").unwrap();
    assert_eq!(vec![1, 2], points.iter().map(|p| p.sequence).collect::<Vec<_>>());
}

#[test]
fn read_without_stop_times() {
    let gtfs = GtfsReader::default()
        .read_stop_times(false)
        .read(SAMPLE)
        .unwrap();
    assert!(gtfs.stop_times.is_empty().unwrap());
    assert_eq!(11, gtfs.trips.len().unwrap());
}

#[test]
fn unknown_enums() {
    let mut raw = RawGtfs::from_path(SAMPLE).unwrap();
    if let Ok(stops) = &mut raw.stops {
        stops[0].location_type = LocationType::Unknown(42);
    }
    raw.unknown_to_default();
    assert_eq!(LocationType::StopPoint, raw.stops.unwrap()[0].location_type);
}

#[test]
fn invalid_path() {
    assert!(matches!(
        Feed::from_path("fixtures/does-not-exist"),
        Err(crate::Error::NotFileNorDirectory(_))
    ));
}

#[test]
fn missing_mandatory_file() {
    let mut raw = RawGtfs::from_path(SAMPLE).unwrap();
    raw.stops = Err(crate::Error::MissingFile("stops.txt".to_owned()));
    assert!(matches!(
        Feed::from_raw(&InMemory, raw),
        Err(crate::Error::MissingFile(file)) if file == "stops.txt"
    ));
}

#[test]
fn the_sample_feed_is_consistent() {
    assert_eq!(Vec::<crate::Issue>::new(), validate(&sample()).unwrap());
}

#[test]
fn filter_on_a_stop() {
    let pruned = filter_stops(&sample(), |s| s.id == "FUR_CREEK_RES").unwrap();
    assert_eq!(vec!["BFC1", "BFC2"], ids(pruned.trips.all().unwrap()));
    assert_eq!(
        vec!["FUR_CREEK_RES", "BULLFROG"],
        ids(pruned.stops.all().unwrap())
    );
    assert_eq!(vec!["BFC"], ids(pruned.routes.all().unwrap()));
    assert_eq!(vec!["DTA"], ids(pruned.agencies.all().unwrap()));
    assert_eq!(vec!["FULLW"], pruned.service_ids().unwrap());
    assert_eq!(1, pruned.calendar_dates.len().unwrap());
    assert_eq!(vec!["p"], ids(pruned.fare_attributes.all().unwrap()));
    assert_eq!(1, pruned.fare_rules.len().unwrap());
    assert_eq!(4, pruned.stop_times.len().unwrap());
    assert!(pruned.frequencies.is_empty().unwrap());
    assert_eq!(2, pruned.shape_points("BFC_SHAPE").unwrap().len());
    assert!(pruned.shape_points("AB_SHAPE").unwrap().is_empty());
    let transfers = pruned.transfers.all().unwrap();
    assert_eq!(1, transfers.len());
    assert_eq!("BULLFROG", transfers[0].from_stop_id);
    assert_eq!(1, pruned.feed_info.len().unwrap());

    assert_eq!(Vec::<crate::Issue>::new(), validate(&pruned).unwrap());
}

#[test]
fn filter_on_a_route() {
    let pruned = filter_routes(&sample(), |r| r.id == "AAMV").unwrap();
    assert_eq!(
        vec!["AAMV1", "AAMV2", "AAMV3", "AAMV4"],
        ids(pruned.trips.all().unwrap())
    );
    assert_eq!(vec!["BEATTY_AIRPORT", "AMV"], ids(pruned.stops.all().unwrap()));
    assert_eq!(vec!["WE"], pruned.service_ids().unwrap());
    assert!(pruned.calendar_dates.is_empty().unwrap());
    assert_eq!(vec!["a"], ids(pruned.fare_attributes.all().unwrap()));
    assert!(pruned.transfers.is_empty().unwrap());
    assert!(pruned.shapes.is_empty().unwrap());

    assert_eq!(Vec::<crate::Issue>::new(), validate(&pruned).unwrap());
}

#[test]
fn filters_are_idempotent() {
    let in_town = |s: &Stop| s.latitude.map_or(false, |lat| lat > 36.9);
    let once = filter_stops(&sample(), in_town).unwrap();
    assert_eq!(once, filter_stops(&once, in_town).unwrap());
    assert_eq!(vec!["STBA", "CITY1", "CITY2"], ids(once.trips.all().unwrap()));

    let once = filter_routes(&sample(), |r| r.id == "AB" || r.id == "CITY").unwrap();
    assert_eq!(
        once,
        filter_routes(&once, |r| r.id == "AB" || r.id == "CITY").unwrap()
    );
}

#[test]
fn unknown_optional_references_are_not_copied() {
    let mut gtfs = sample();
    let mut trip = gtfs.get_trip("AB1").unwrap();
    trip.shape_id = Some("NO_SUCH_SHAPE".to_owned());
    gtfs.trips.remove("AB1").unwrap();
    gtfs.trips.add(trip).unwrap();
    let mut route = gtfs.get_route("AB").unwrap();
    route.agency_id = Some("NO_SUCH_AGENCY".to_owned());
    gtfs.routes.remove("AB").unwrap();
    gtfs.routes.add(route).unwrap();
    assert_eq!(2, validate(&gtfs).unwrap().len());

    let by_route = filter_routes(&gtfs, |r| r.id == "AB").unwrap();
    let by_stop = filter_stops(&gtfs, |s| s.id == "BULLFROG").unwrap();
    for pruned in [by_route, by_stop] {
        assert_eq!(Vec::<crate::Issue>::new(), validate(&pruned).unwrap());
        assert_eq!(None, pruned.get_trip("AB1").unwrap().shape_id);
        assert_eq!(None, pruned.get_route("AB").unwrap().agency_id);
        // the route now belongs to the only agency of the feed
        assert_eq!(1, pruned.agencies.len().unwrap());
    }
}

#[test]
fn every_stop_as_seed_keeps_everything() {
    let gtfs = sample();
    assert_eq!(gtfs, filter_stops(&gtfs, |_| true).unwrap());
}

#[test]
fn sqlite_and_memory_give_the_same_result() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let stored = GtfsReader::default().read_into(SAMPLE, &storage).unwrap();
    assert_eq!(sample().counts().unwrap(), stored.counts().unwrap());

    let from_memory = filter_stops(&sample(), |s| s.id == "BULLFROG").unwrap();
    let from_sqlite = filter_stops(&stored, |s| s.id == "BULLFROG").unwrap();
    assert_eq!(from_memory, from_sqlite);
}

#[test]
fn normalization_keeps_the_running_days() {
    let original = sample();
    let mut gtfs = sample();
    let summary = normalize_calendars(&mut gtfs).unwrap();
    assert_eq!(
        NormalizationSummary {
            services: 1,
            calendars_before: 1,
            calendars_after: 3,
            calendar_dates_folded: 1,
        },
        summary
    );
    assert!(gtfs.calendar_dates.is_empty().unwrap());

    for service_id in original.service_ids().unwrap() {
        let calendars = original.calendar.get_by_foreign_key(&service_id).unwrap();
        let exceptions = original.calendar_dates.get_by_foreign_key(&service_id).unwrap();
        let normalized = gtfs.calendar.get_by_foreign_key(&service_id).unwrap();
        let mut day = date(2006, 12, 1);
        while day <= date(2011, 1, 31) {
            assert_eq!(
                service_runs_on(&calendars, &exceptions, day),
                service_runs_on(&normalized, &[], day),
                "{} on {}",
                service_id,
                day
            );
            day += Duration::days(1);
        }
    }

    // nothing left to fold
    assert_eq!(
        NormalizationSummary::default(),
        normalize_calendars(&mut gtfs).unwrap()
    );
}

#[test]
fn normalization_on_sqlite() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let mut stored = GtfsReader::default().read_into(SAMPLE, &storage).unwrap();
    let mut in_memory = sample();
    normalize_calendars(&mut stored).unwrap();
    normalize_calendars(&mut in_memory).unwrap();
    let mut from_sqlite = stored.calendar.all().unwrap();
    let mut from_memory = in_memory.calendar.all().unwrap();
    from_sqlite.sort_by_key(|c| (c.service_id.clone(), c.start_date));
    from_memory.sort_by_key(|c| (c.service_id.clone(), c.start_date));
    assert_eq!(from_memory, from_sqlite);
}

#[test]
fn written_feed_reads_back() {
    let dir = std::env::temp_dir().join(format!("gtfs-feed-writer-{}", std::process::id()));
    let gtfs = sample();
    let written = GtfsWriter::new(&dir).write(&gtfs).unwrap();
    assert_eq!(13, written.len());

    let read_back = Feed::from_path(dir.display().to_string()).unwrap();
    assert_eq!(gtfs, read_back);

    // a file left by a previous run disappears with its records
    let pruned = filter_routes(&gtfs, |r| r.id == "AAMV").unwrap();
    let written = GtfsWriter::new(&dir).write(&pruned).unwrap();
    assert!(!written.contains(&"transfers.txt"));
    assert!(!dir.join("transfers.txt").exists());
    assert_eq!(pruned, Feed::from_path(dir.display().to_string()).unwrap());

    std::fs::remove_dir_all(&dir).unwrap();
}

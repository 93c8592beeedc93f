use gtfs_feed::{filter_stops, normalize_calendars, EntityCollection, GtfsReader, SqliteStorage};

fn main() {
    // the feed is staged in an SQLite database living in memory
    let storage = SqliteStorage::open_in_memory().expect("impossible to open the database");
    let gtfs = GtfsReader::default()
        .read_into("fixtures/sample-feed", &storage)
        .expect("impossible to read gtfs");

    let mut pruned =
        filter_stops(&gtfs, |stop| stop.id == "BULLFROG").expect("impossible to filter");
    for trip in pruned.trips.all().expect("impossible to read trips") {
        println!("trip {} on route {}", trip.id, trip.route_id);
    }

    let summary = normalize_calendars(&mut pruned).expect("impossible to normalize");
    println!("{:?}", summary);
    for calendar in pruned.calendar.all().expect("impossible to read calendars") {
        println!("{}", calendar);
    }
}

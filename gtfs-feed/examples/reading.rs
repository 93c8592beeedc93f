use gtfs_feed::{validate, GtfsReader};

/// prints some stats about the GTFS given as a cli argument, and its inconsistencies
fn main() {
    let file_path = std::env::args()
        .nth(1)
        .expect("you should put the path of the file to load");

    println!("reading file {}", &file_path);
    let gtfs = GtfsReader::default()
        .read(&file_path)
        .expect("impossible to read gtfs");
    gtfs.print_stats().expect("impossible to count the records");

    match validate(&gtfs) {
        Ok(issues) => {
            for issue in &issues {
                println!("{}", issue);
            }
            println!("{} issues", issues.len());
        }
        Err(e) => eprintln!("error: {:?}", e),
    }
}

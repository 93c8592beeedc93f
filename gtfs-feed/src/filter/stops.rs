use super::{copy_reachable, resolvable_trips, FeedFilter};
use crate::feed::{EntityCollection, Feed, Storage};
use crate::objects::Stop;
use crate::Error;
use rustc_hash::FxHashSet;

/// Keeps the stops matching a predicate, the trips stopping there and everything those trips need
///
/// Only the trips with a stop time at a matching stop are kept. Their other stops are kept too,
/// but the trips serving only those other stops are not.
pub struct StopsFilter<P> {
    predicate: P,
}

impl<P: Fn(&Stop) -> bool> StopsFilter<P> {
    /// Filter keeping the stops for which the predicate is true
    pub fn new(predicate: P) -> Self {
        StopsFilter { predicate }
    }
}

impl<P: Fn(&Stop) -> bool> FeedFilter for StopsFilter<P> {
    fn filter<S: Storage, D: Storage>(
        &self,
        source: &Feed<S>,
        target: &mut Feed<D>,
    ) -> Result<(), Error> {
        let seeds: FxHashSet<String> = source
            .stops
            .all()?
            .into_iter()
            .filter(|s| (self.predicate)(s))
            .map(|s| s.id)
            .collect();
        log::debug!("{} stops match the predicate", seeds.len());

        let trips = resolvable_trips(source)?;
        let resolvable: FxHashSet<&str> = trips.iter().map(|t| t.id.as_str()).collect();
        let serving: FxHashSet<String> = source
            .stop_times
            .all()?
            .into_iter()
            .filter(|st| seeds.contains(&st.stop_id) && resolvable.contains(st.trip_id.as_str()))
            .map(|st| st.trip_id)
            .collect();
        let trips = trips
            .into_iter()
            .filter(|t| serving.contains(&t.id))
            .collect();

        copy_reachable(source, target, trips, seeds, FxHashSet::default())
    }
}

use super::{copy_reachable, resolvable_trips, FeedFilter};
use crate::feed::{EntityCollection, Feed, Storage};
use crate::objects::Route;
use crate::Error;
use rustc_hash::FxHashSet;

/// Keeps the routes matching a predicate with all their trips and everything those trips need
pub struct RoutesFilter<P> {
    predicate: P,
}

impl<P: Fn(&Route) -> bool> RoutesFilter<P> {
    /// Filter keeping the routes for which the predicate is true
    pub fn new(predicate: P) -> Self {
        RoutesFilter { predicate }
    }
}

impl<P: Fn(&Route) -> bool> FeedFilter for RoutesFilter<P> {
    fn filter<S: Storage, D: Storage>(
        &self,
        source: &Feed<S>,
        target: &mut Feed<D>,
    ) -> Result<(), Error> {
        let seeds: FxHashSet<String> = source
            .routes
            .all()?
            .into_iter()
            .filter(|r| (self.predicate)(r))
            .map(|r| r.id)
            .collect();
        log::debug!("{} routes match the predicate", seeds.len());

        let trips = resolvable_trips(source)?
            .into_iter()
            .filter(|t| seeds.contains(&t.route_id))
            .collect();
        copy_reachable(source, target, trips, FxHashSet::default(), seeds)
    }
}

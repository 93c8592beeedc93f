//! Folds the [CalendarDate] exceptions of each service into plain [Calendar] patterns
use crate::feed::{EntityCollection, Feed, Storage};
use crate::objects::{Calendar, CalendarDate, Exception};
use crate::Error;
use chrono::NaiveDate;
use itertools::Itertools;

/// Does the service run on that date, following the GTFS rules
///
/// An exception for that date decides; otherwise the service runs if any calendar covers the date.
/// With conflicting exceptions for the same date, the last one wins.
pub fn service_runs_on(
    calendars: &[Calendar],
    calendar_dates: &[CalendarDate],
    date: NaiveDate,
) -> bool {
    match calendar_dates.iter().rev().find(|cd| cd.date == date) {
        Some(exception) => exception.exception_type == Exception::Added,
        None => calendars.iter().any(|c| c.covers_date(date)),
    }
}

/// Calendars of one service running on exactly the same days as the calendars and exceptions given
///
/// The result never needs any [CalendarDate].
pub fn normalize_service(
    service_id: &str,
    calendars: Vec<Calendar>,
    calendar_dates: &[CalendarDate],
) -> Vec<Calendar> {
    let mut calendars: Vec<Calendar> = calendars
        .into_iter()
        .filter(Calendar::covers_any_day)
        .collect();

    // stable: the last exception of a date is applied last
    for exception in calendar_dates.iter().sorted_by_key(|cd| cd.date) {
        let day = exception.date;
        match exception.exception_type {
            Exception::Added => {
                if calendars.iter().any(|c| c.covers_date(day)) {
                    continue;
                }
                match calendars.iter().position(|c| c.contains(day)) {
                    Some(idx) => {
                        let pieces = calendars.remove(idx).add(day);
                        for (offset, piece) in pieces.into_iter().enumerate() {
                            calendars.insert(idx + offset, piece);
                        }
                    }
                    None => calendars.push(Calendar::single_day(service_id, day)),
                }
            }
            Exception::Removed => {
                calendars = calendars
                    .into_iter()
                    .flat_map(|c| c.subtract(day))
                    .collect();
            }
        }
    }

    let mut calendars = merge_calendars(calendars);
    calendars.retain(Calendar::covers_any_day);
    calendars
}

/// Merges the calendars with [Calendar::try_merge] until no more merge is possible
pub fn merge_calendars(mut calendars: Vec<Calendar>) -> Vec<Calendar> {
    loop {
        calendars.sort_by_key(|c| (c.start_date, c.end_date));
        let before = calendars.len();
        let mut merged: Vec<Calendar> = Vec::with_capacity(before);
        for calendar in calendars {
            let target = merged
                .iter_mut()
                .rev()
                .find_map(|m| m.try_merge(&calendar).map(|result| (m, result)));
            match target {
                Some((m, result)) => *m = result,
                None => merged.push(calendar),
            }
        }
        calendars = merged;
        if calendars.len() == before {
            return calendars;
        }
    }
}

/// What [normalize_calendars] changed
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizationSummary {
    /// Services whose calendars were rewritten
    pub services: usize,
    /// Calendars of those services before
    pub calendars_before: usize,
    /// Calendars of those services after
    pub calendars_after: usize,
    /// Calendar dates removed from the feed
    pub calendar_dates_folded: usize,
}

/// Replaces the calendars and calendar dates of every service by normalized calendars
///
/// A service without any running day keeps a single calendar with no weekday,
/// so that its trips still reference a known service.
pub fn normalize_calendars<S: Storage>(feed: &mut Feed<S>) -> Result<NormalizationSummary, Error> {
    let mut summary = NormalizationSummary::default();
    for service_id in feed.service_ids()? {
        let calendars = feed.calendar.get_by_foreign_key(&service_id)?;
        let calendar_dates = feed.calendar_dates.get_by_foreign_key(&service_id)?;
        if calendars.is_empty() && calendar_dates.is_empty() {
            // only referenced by trips, nothing to rewrite
            continue;
        }

        let span = calendars
            .iter()
            .flat_map(|c| [c.start_date, c.end_date])
            .chain(calendar_dates.iter().map(|cd| cd.date))
            .minmax()
            .into_option();
        let mut normalized = normalize_service(&service_id, calendars.clone(), &calendar_dates);
        if normalized.is_empty() {
            if let Some((start, end)) = span {
                normalized.push(Calendar::new(&service_id, start, end));
            }
        }
        if calendar_dates.is_empty() && normalized == calendars {
            continue;
        }
        log::debug!(
            "service {}: {} calendars and {} calendar dates into {} calendars",
            service_id,
            calendars.len(),
            calendar_dates.len(),
            normalized.len()
        );

        summary.services += 1;
        summary.calendars_before += calendars.len();
        summary.calendars_after += normalized.len();
        summary.calendar_dates_folded += feed.calendar_dates.remove_by_foreign_key(&service_id)?;
        feed.calendar.remove_by_foreign_key(&service_id)?;
        feed.calendar.add_all(normalized)?;
    }
    log::info!(
        "{} calendar dates folded into the calendars of {} services",
        summary.calendar_dates_folded,
        summary.services
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::FULL_MASK;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn exception(day: NaiveDate, exception_type: Exception) -> CalendarDate {
        CalendarDate {
            service_id: "S".to_owned(),
            date: day,
            exception_type,
        }
    }

    fn assert_same_days(
        calendars: &[Calendar],
        calendar_dates: &[CalendarDate],
        normalized: &[Calendar],
        from: NaiveDate,
        to: NaiveDate,
    ) {
        let mut day = from;
        while day <= to {
            assert_eq!(
                service_runs_on(calendars, calendar_dates, day),
                service_runs_on(normalized, &[], day),
                "{}",
                day
            );
            day += Duration::days(1);
        }
    }

    #[test]
    fn exceptions_win_over_calendars() {
        let mut weekdays = Calendar::new("S", date(2007, 1, 1), date(2007, 12, 31));
        weekdays.set_mask(0b001_1111);
        let calendars = vec![weekdays];
        let dates = vec![
            exception(date(2007, 1, 1), Exception::Removed),
            exception(date(2007, 1, 6), Exception::Added),
        ];
        assert!(!service_runs_on(&calendars, &dates, date(2007, 1, 1)));
        assert!(service_runs_on(&calendars, &dates, date(2007, 1, 2)));
        assert!(service_runs_on(&calendars, &dates, date(2007, 1, 6)));
        assert!(!service_runs_on(&calendars, &dates, date(2007, 1, 7)));
    }

    #[test]
    fn removed_days_split_the_calendar() {
        let mut full = Calendar::new("S", date(2007, 1, 1), date(2007, 12, 31));
        full.set_mask(FULL_MASK);
        let calendars = vec![full];
        let dates = vec![
            exception(date(2007, 7, 4), Exception::Removed),
            exception(date(2007, 12, 25), Exception::Removed),
        ];
        let normalized = normalize_service("S", calendars.clone(), &dates);
        // the week of christmas merges with the last day of the year
        assert_eq!(4, normalized.len());
        assert_same_days(&calendars, &dates, &normalized, date(2006, 12, 1), date(2008, 1, 31));
    }

    #[test]
    fn added_days_only() {
        // every saturday of january, the 20th excepted
        let dates: Vec<_> = [6, 13, 27]
            .iter()
            .map(|&d| exception(date(2007, 1, d), Exception::Added))
            .collect();
        let normalized = normalize_service("S", vec![], &dates);

        let mut saturdays = Calendar::new("S", date(2007, 1, 6), date(2007, 1, 13));
        saturdays.saturday = true;
        assert_eq!(
            vec![saturdays, Calendar::single_day("S", date(2007, 1, 27))],
            normalized
        );
        assert_same_days(&[], &dates, &normalized, date(2007, 1, 1), date(2007, 2, 28));
    }

    #[test]
    fn removed_then_added_back() {
        let mut full = Calendar::new("S", date(2007, 1, 1), date(2007, 3, 31));
        full.set_mask(FULL_MASK);
        let calendars = vec![full.clone()];
        let dates = vec![
            exception(date(2007, 2, 14), Exception::Removed),
            exception(date(2007, 2, 14), Exception::Added),
        ];
        assert!(service_runs_on(&calendars, &dates, date(2007, 2, 14)));
        let normalized = normalize_service("S", calendars.clone(), &dates);
        assert_same_days(&calendars, &dates, &normalized, date(2006, 12, 1), date(2007, 4, 30));
    }

    #[test]
    fn merging_is_order_independent() {
        let first = Calendar::single_day("S", date(2007, 1, 1));
        let second = Calendar::single_day("S", date(2007, 1, 8));
        let third = Calendar::single_day("S", date(2007, 1, 15));
        let mut mondays = Calendar::new("S", date(2007, 1, 1), date(2007, 1, 15));
        mondays.monday = true;
        assert_eq!(
            vec![mondays.clone()],
            merge_calendars(vec![third.clone(), first.clone(), second.clone()])
        );
        assert_eq!(vec![mondays], merge_calendars(vec![first, second, third]));
    }

    #[test]
    fn calendars_without_running_day_are_dropped() {
        // a weekend service on a tuesday to thursday range
        let mut weekend = Calendar::new("S", date(2007, 1, 2), date(2007, 1, 4));
        weekend.set_mask(0b110_0000);
        assert_eq!(Vec::<Calendar>::new(), normalize_service("S", vec![weekend], &[]));
    }

    #[test]
    fn only_running_day_removed_then_added_back() {
        // sunday to monday, running on mondays only
        let mut monday_only = Calendar::new("S", date(2007, 1, 7), date(2007, 1, 8));
        monday_only.monday = true;
        let calendars = vec![monday_only];
        let dates = vec![
            exception(date(2007, 1, 8), Exception::Removed),
            exception(date(2007, 1, 8), Exception::Added),
        ];
        let normalized = normalize_service("S", calendars.clone(), &dates);
        assert_eq!(1, normalized.len());
        assert!(normalized[0].covers_date(date(2007, 1, 8)));
        assert_same_days(&calendars, &dates, &normalized, date(2007, 1, 1), date(2007, 1, 31));
    }
}

//! Operations on the weekly pattern of a [Calendar]
//!
//! A calendar is a date range and a set of weekdays (the mask, bit 0 is monday, bit 6 is sunday).
//! The operations keep that representation: adding or removing a single day can split a calendar
//! around the week of that day, and neighbouring calendars of a service can be merged back.
use crate::objects::{Calendar, CalendarDate, Exception};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::cmp::{max, min};

/// No weekday set
pub const EMPTY_MASK: u8 = 0;
/// Every weekday set
pub const FULL_MASK: u8 = 0b111_1111;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Bit of the weekday in a calendar mask
pub fn weekday_bit(weekday: Weekday) -> u8 {
    1 << weekday.num_days_from_monday()
}

/// Monday of the week of the given date
pub fn first_day_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Sunday of the week of the given date
pub fn last_day_of_week(date: NaiveDate) -> NaiveDate {
    first_day_of_week(date) + Duration::days(6)
}

impl Calendar {
    /// A calendar running on no weekday
    pub fn new(service_id: &str, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Calendar {
            service_id: service_id.to_owned(),
            monday: false,
            tuesday: false,
            wednesday: false,
            thursday: false,
            friday: false,
            saturday: false,
            sunday: false,
            start_date,
            end_date,
        }
    }

    /// A calendar running only on the given day
    pub fn single_day(service_id: &str, day: NaiveDate) -> Self {
        let mut calendar = Calendar::new(service_id, day, day);
        calendar.set(day.weekday(), true);
        calendar
    }

    fn weekday_mut(&mut self, weekday: Weekday) -> &mut bool {
        match weekday {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        }
    }

    /// Does the service run on this weekday
    pub fn is_set(&self, weekday: Weekday) -> bool {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    /// Sets if the service runs on this weekday
    pub fn set(&mut self, weekday: Weekday, runs: bool) {
        *self.weekday_mut(weekday) = runs;
    }

    /// The weekdays as a 7 bits mask
    pub fn mask(&self) -> u8 {
        WEEKDAYS
            .iter()
            .filter(|&&w| self.is_set(w))
            .fold(EMPTY_MASK, |mask, &w| mask | weekday_bit(w))
    }

    /// Sets all the weekdays from a 7 bits mask
    pub fn set_mask(&mut self, mask: u8) {
        for weekday in WEEKDAYS {
            self.set(weekday, mask & weekday_bit(weekday) != 0);
        }
    }

    /// Is the date within `[start_date, end_date]`, whatever the weekday
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Number of days of the range, both ends included
    pub fn span_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Does the service run this day
    pub fn covers_date(&self, date: NaiveDate) -> bool {
        self.contains(date) && self.is_set(date.weekday())
    }

    /// `None` when the date is out of the range, else if the service runs that weekday
    pub fn status_for(&self, date: NaiveDate) -> Option<bool> {
        if self.contains(date) {
            Some(self.is_set(date.weekday()))
        } else {
            None
        }
    }

    /// Does the service run at least one day
    pub fn covers_any_day(&self) -> bool {
        if self.span_days() >= 7 {
            self.mask() != EMPTY_MASK
        } else {
            self.dates().next().is_some()
        }
    }

    /// All the days the service runs, in chronological order
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.span_days().max(0))
            .map(move |offset| self.start_date + Duration::days(offset))
            .filter(move |&d| self.is_set(d.weekday()))
    }

    /// Makes sure the service runs on `day`
    ///
    /// When the calendar is no longer than a week and holds the day, the weekday is set in place.
    /// Otherwise a single day calendar is returned next to the unchanged one.
    pub fn add(mut self, day: NaiveDate) -> Vec<Calendar> {
        if self.covers_date(day) {
            return vec![self];
        }
        if self.span_days() <= 7 && self.contains(day) {
            self.set(day.weekday(), true);
            return vec![self];
        }
        let extra = Calendar::single_day(&self.service_id, day);
        vec![self, extra]
    }

    /// Makes sure the service does not run on `day`
    ///
    /// When the week of `day` holds the whole calendar, the weekday is cleared in place.
    /// Otherwise the calendar is split around that week: the days before and after keep the
    /// pattern, the week itself loses the weekday of `day`. The week is always returned, even without
    /// any running day left, so the day can be added back; the days before and after are dropped
    /// when they hold no running day.
    pub fn subtract(mut self, day: NaiveDate) -> Vec<Calendar> {
        if !self.covers_date(day) {
            return vec![self];
        }
        let week_start = first_day_of_week(day);
        let week_end = last_day_of_week(day);
        if week_start <= self.start_date && self.end_date <= week_end {
            self.set(day.weekday(), false);
            return vec![self];
        }

        let mut pieces = Vec::with_capacity(3);
        if self.start_date < week_start {
            let mut before = self.clone();
            before.end_date = week_start - Duration::days(1);
            if before.covers_any_day() {
                pieces.push(before);
            }
        }
        let mut week = self.clone();
        week.start_date = max(self.start_date, week_start);
        week.end_date = min(self.end_date, week_end);
        week.set(day.weekday(), false);
        pieces.push(week);
        if week_end < self.end_date {
            let mut after = self;
            after.start_date = week_end + Duration::days(1);
            if after.covers_any_day() {
                pieces.push(after);
            }
        }
        pieces
    }

    /// Applies a [CalendarDate] on the calendar, see [Calendar::add] and [Calendar::subtract]
    pub fn apply(self, exception: &CalendarDate) -> Vec<Calendar> {
        match exception.exception_type {
            Exception::Added => self.add(exception.date),
            Exception::Removed => self.subtract(exception.date),
        }
    }

    /// Moves the start and end dates to days where the service runs
    ///
    /// Does nothing when no weekday is set.
    /// The calendar must run at least one day (checked in debug builds).
    pub fn trim_dates(&mut self) {
        if self.mask() == EMPTY_MASK {
            return;
        }
        let runs = self.covers_any_day();
        debug_assert!(runs, "calendar {} has no running day to trim to", self);
        if !runs {
            log::warn!("calendar {} has no running day, dates left untouched", self);
            return;
        }
        while !self.is_set(self.start_date.weekday()) {
            self.start_date += Duration::days(1);
        }
        while !self.is_set(self.end_date.weekday()) {
            self.end_date -= Duration::days(1);
        }
    }

    /// Weekdays of the range holding at least one day
    fn weekdays_in_range(&self) -> u8 {
        if self.span_days() >= 7 {
            return FULL_MASK;
        }
        (0..self.span_days().max(0))
            .map(|offset| (self.start_date + Duration::days(offset)).weekday())
            .fold(EMPTY_MASK, |mask, w| mask | weekday_bit(w))
    }

    /// Merges two calendars of the same service into one, when it can be done without changing the running days
    ///
    /// The calendars must start the same week, or the later one must start the week following the end of the
    /// earlier one. For each weekday, a calendar only has a say if its range holds that weekday; the two
    /// calendars must not disagree. The merged calendar is trimmed.
    pub fn try_merge(&self, other: &Calendar) -> Option<Calendar> {
        if self.service_id != other.service_id {
            return None;
        }
        let (first, second) = if self.start_date <= other.start_date {
            (self, other)
        } else {
            (other, self)
        };
        let first_week = first_day_of_week(first.start_date);
        let second_week = first_day_of_week(second.start_date);
        let week_after_first = first_day_of_week(first.end_date) + Duration::days(7);
        if second_week != first_week && second_week != week_after_first {
            return None;
        }

        let (first_days, second_days) = (first.weekdays_in_range(), second.weekdays_in_range());
        let mut mask = EMPTY_MASK;
        for weekday in WEEKDAYS {
            let bit = weekday_bit(weekday);
            let first_status = (first_days & bit != 0).then(|| first.is_set(weekday));
            let second_status = (second_days & bit != 0).then(|| second.is_set(weekday));
            let runs = match (first_status, second_status) {
                (Some(a), Some(b)) if a != b => return None,
                (Some(a), _) | (None, Some(a)) => a,
                (None, None) => false,
            };
            if runs {
                mask |= bit;
            }
        }

        let mut merged = Calendar::new(
            &first.service_id,
            first.start_date,
            max(first.end_date, second.end_date),
        );
        merged.set_mask(mask);
        // a gap between the ranges, or a longer range, must not gain running days
        if merged
            .dates()
            .any(|d| !first.covers_date(d) && !second.covers_date(d))
        {
            return None;
        }
        if mask != EMPTY_MASK && merged.covers_any_day() {
            merged.trim_dates();
        }
        Some(merged)
    }

    /// The running weekdays of the week starting at `monday`
    ///
    /// Days of that week outside of the range are cleared.
    ///
    /// # Panics
    ///
    /// If `monday` is not a monday
    pub fn mask_for_week(&self, monday: NaiveDate) -> u8 {
        assert_eq!(
            Weekday::Mon,
            monday.weekday(),
            "{} is not the first day of a week",
            monday
        );
        (0..7)
            .map(|offset| monday + Duration::days(offset))
            .filter(|&d| self.covers_date(d))
            .fold(EMPTY_MASK, |mask, d| mask | weekday_bit(d.weekday()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar(mask: u8, start: NaiveDate, end: NaiveDate) -> Calendar {
        let mut calendar = Calendar::new("FULLW", start, end);
        calendar.set_mask(mask);
        calendar
    }

    fn fullw() -> Calendar {
        calendar(FULL_MASK, date(2007, 1, 1), date(2010, 12, 31))
    }

    const MONDAY: u8 = 0b000_0001;
    const SATURDAY: u8 = 0b010_0000;
    const SUNDAY: u8 = 0b100_0000;
    const WEEKDAYS_ONLY: u8 = 0b001_1111;

    #[test]
    fn week_boundaries() {
        // 2007-06-06 is a wednesday
        assert_eq!(date(2007, 6, 4), first_day_of_week(date(2007, 6, 6)));
        assert_eq!(date(2007, 6, 10), last_day_of_week(date(2007, 6, 6)));
        assert_eq!(date(2007, 6, 4), first_day_of_week(date(2007, 6, 4)));
        assert_eq!(date(2007, 6, 10), last_day_of_week(date(2007, 6, 10)));
    }

    #[test]
    fn mask_matches_weekday_fields() {
        let mut c = fullw();
        c.set_mask(SATURDAY | SUNDAY);
        assert!(!c.monday && !c.friday);
        assert!(c.saturday && c.sunday);
        assert_eq!(SATURDAY | SUNDAY, c.mask());
        assert_eq!(1 << 6, weekday_bit(Weekday::Sun));
    }

    #[test]
    fn coverage_and_status() {
        let c = calendar(WEEKDAYS_ONLY, date(2007, 1, 1), date(2007, 1, 31));
        assert!(c.covers_date(date(2007, 1, 5)));
        assert!(!c.covers_date(date(2007, 1, 6)));
        assert!(!c.covers_date(date(2007, 2, 1)));
        assert_eq!(Some(true), c.status_for(date(2007, 1, 5)));
        assert_eq!(Some(false), c.status_for(date(2007, 1, 6)));
        assert_eq!(None, c.status_for(date(2006, 12, 29)));
    }

    #[test]
    fn removing_the_sample_feed_exception() {
        let pieces = fullw().subtract(date(2007, 6, 4));
        assert_eq!(
            vec![
                calendar(FULL_MASK, date(2007, 1, 1), date(2007, 6, 3)),
                calendar(FULL_MASK & !MONDAY, date(2007, 6, 4), date(2007, 6, 10)),
                calendar(FULL_MASK, date(2007, 6, 11), date(2010, 12, 31)),
            ],
            pieces
        );
        assert!(pieces.iter().all(|p| !p.covers_date(date(2007, 6, 4))));
        assert!(pieces.iter().any(|p| p.covers_date(date(2007, 6, 5))));
        assert!(pieces.iter().any(|p| p.covers_date(date(2007, 6, 11))));
    }

    #[test]
    fn subtract_in_a_single_week_flips_the_bit() {
        let c = calendar(FULL_MASK, date(2007, 6, 5), date(2007, 6, 9));
        assert_eq!(
            vec![calendar(
                FULL_MASK & !weekday_bit(Weekday::Thu),
                date(2007, 6, 5),
                date(2007, 6, 9)
            )],
            c.subtract(date(2007, 6, 7))
        );
    }

    #[test]
    fn subtract_on_the_edges() {
        // first week of the range: no prefix
        let pieces = fullw().subtract(date(2007, 1, 3));
        assert_eq!(2, pieces.len());
        assert_eq!(date(2007, 1, 1), pieces[0].start_date);
        assert_eq!(date(2007, 1, 7), pieces[0].end_date);
        // the range ends on a friday, its last week is partial
        let pieces = fullw().subtract(date(2010, 12, 31));
        assert_eq!(2, pieces.len());
        assert_eq!(date(2010, 12, 26), pieces[0].end_date);
        assert_eq!(date(2010, 12, 27), pieces[1].start_date);
        assert!(!pieces[1].covers_date(date(2010, 12, 31)));
    }

    #[test]
    fn subtract_keeps_the_week_of_the_day() {
        // only mondays, the week of the removed monday has nothing left
        let c = calendar(MONDAY, date(2007, 1, 1), date(2007, 1, 31));
        let pieces = c.subtract(date(2007, 1, 15));
        assert_eq!(
            vec![
                calendar(MONDAY, date(2007, 1, 1), date(2007, 1, 14)),
                calendar(EMPTY_MASK, date(2007, 1, 15), date(2007, 1, 21)),
                calendar(MONDAY, date(2007, 1, 22), date(2007, 1, 31)),
            ],
            pieces
        );
    }

    #[test]
    fn subtract_the_only_running_day() {
        // sunday 2007-01-07 to monday 2007-01-08, running on mondays
        let c = calendar(MONDAY, date(2007, 1, 7), date(2007, 1, 8));
        let monday = date(2007, 1, 8);
        let pieces = c.clone().subtract(monday);
        // the sunday before the week runs on no day and is dropped
        assert_eq!(vec![calendar(EMPTY_MASK, monday, monday)], pieces);

        let restored: Vec<Calendar> = pieces.into_iter().flat_map(|p| p.add(monday)).collect();
        assert_eq!(vec![calendar(MONDAY, monday, monday)], restored);
        assert!(restored.iter().any(|p| p.covers_date(monday)));
        assert!(c.dates().eq(restored.iter().flat_map(|p| p.dates())));
    }

    #[test]
    fn subtract_of_a_day_not_running() {
        let c = calendar(WEEKDAYS_ONLY, date(2007, 1, 1), date(2007, 1, 31));
        assert_eq!(vec![c.clone()], c.clone().subtract(date(2007, 1, 6)));
        assert_eq!(vec![c.clone()], c.clone().subtract(date(2008, 1, 7)));
    }

    #[test]
    fn add_in_a_short_calendar_sets_the_bit() {
        let c = calendar(MONDAY, date(2007, 6, 4), date(2007, 6, 10));
        assert_eq!(
            vec![calendar(MONDAY | SUNDAY, date(2007, 6, 4), date(2007, 6, 10))],
            c.add(date(2007, 6, 10))
        );
    }

    #[test]
    fn add_in_a_long_calendar_creates_a_single_day() {
        let c = calendar(WEEKDAYS_ONLY, date(2007, 1, 1), date(2007, 1, 31));
        let added = c.clone().add(date(2007, 1, 6));
        assert_eq!(2, added.len());
        assert_eq!(c, added[0]);
        assert_eq!(Calendar::single_day("FULLW", date(2007, 1, 6)), added[1]);
        assert_eq!(SATURDAY, added[1].mask());

        // out of the range, even for a short calendar
        let short = calendar(MONDAY, date(2007, 6, 4), date(2007, 6, 5));
        assert_eq!(2, short.add(date(2007, 6, 20)).len());
    }

    #[test]
    fn add_of_a_running_day() {
        let c = fullw();
        assert_eq!(vec![c.clone()], c.clone().add(date(2008, 2, 29)));
    }

    #[test]
    fn subtract_then_add_restores_the_day() {
        let removed = date(2009, 3, 18);
        let pieces: Vec<Calendar> = fullw().subtract(removed);
        assert!(pieces.iter().all(|p| !p.covers_date(removed)));

        let restored: Vec<Calendar> = pieces.into_iter().flat_map(|p| p.add(removed)).collect();
        assert!(restored.iter().any(|p| p.covers_date(removed)));
        for offset in -10..10 {
            let d = removed + Duration::days(offset);
            assert_eq!(
                fullw().covers_date(d),
                restored.iter().any(|p| p.covers_date(d)),
                "{}",
                d
            );
        }
    }

    #[test]
    fn apply_exceptions() {
        let removed = CalendarDate {
            service_id: "FULLW".to_owned(),
            date: date(2007, 6, 4),
            exception_type: Exception::Removed,
        };
        assert_eq!(3, fullw().apply(&removed).len());
        let added = CalendarDate {
            exception_type: Exception::Added,
            ..removed
        };
        assert_eq!(vec![fullw()], fullw().apply(&added));
    }

    #[test]
    fn trim_moves_to_running_days() {
        // 2007-01-01 is a monday, 2007-01-31 a wednesday
        let mut c = calendar(SATURDAY | SUNDAY, date(2007, 1, 1), date(2007, 1, 31));
        c.trim_dates();
        assert_eq!(date(2007, 1, 6), c.start_date);
        assert_eq!(date(2007, 1, 28), c.end_date);

        let trimmed = c.clone();
        c.trim_dates();
        assert_eq!(trimmed, c);
    }

    #[test]
    fn trim_without_weekday() {
        let mut c = calendar(EMPTY_MASK, date(2007, 1, 1), date(2007, 1, 31));
        c.trim_dates();
        assert_eq!(calendar(EMPTY_MASK, date(2007, 1, 1), date(2007, 1, 31)), c);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "no running day")]
    fn trim_without_running_day() {
        // a tuesday to wednesday range, running only on mondays
        let mut c = calendar(MONDAY, date(2007, 1, 2), date(2007, 1, 3));
        c.trim_dates();
    }

    #[test]
    fn merge_back_a_split_calendar() {
        let pieces = fullw().subtract(date(2007, 6, 4));
        // the week with the removed monday conflicts with both neighbours
        assert_eq!(None, pieces[0].try_merge(&pieces[1]));
        assert_eq!(None, pieces[1].try_merge(&pieces[2]));

        let first = calendar(FULL_MASK, date(2007, 1, 1), date(2007, 6, 3));
        let second = calendar(FULL_MASK, date(2007, 6, 4), date(2010, 12, 31));
        assert_eq!(Some(fullw()), first.try_merge(&second));
        assert_eq!(Some(fullw()), second.try_merge(&first));
    }

    #[test]
    fn merge_single_days_of_consecutive_weeks() {
        let first = Calendar::single_day("FULLW", date(2007, 1, 6));
        let second = Calendar::single_day("FULLW", date(2007, 1, 13));
        assert_eq!(
            Some(calendar(SATURDAY, date(2007, 1, 6), date(2007, 1, 13))),
            first.try_merge(&second)
        );

        // a week is missing in between
        let third = Calendar::single_day("FULLW", date(2007, 1, 20));
        assert_eq!(None, first.try_merge(&third));
    }

    #[test]
    fn merge_in_the_same_week() {
        let monday = Calendar::single_day("FULLW", date(2007, 1, 1));
        let friday = Calendar::single_day("FULLW", date(2007, 1, 5));
        assert_eq!(
            Some(calendar(
                MONDAY | weekday_bit(Weekday::Fri),
                date(2007, 1, 1),
                date(2007, 1, 5)
            )),
            monday.try_merge(&friday)
        );
    }

    #[test]
    fn merge_refuses_to_add_days() {
        // mondays for three weeks, tuesdays only the first week
        let mondays = calendar(MONDAY, date(2007, 1, 1), date(2007, 1, 21));
        let tuesday = Calendar::single_day("FULLW", date(2007, 1, 2));
        assert_eq!(None, mondays.try_merge(&tuesday));
    }

    #[test]
    fn merge_needs_the_same_service() {
        let first = calendar(FULL_MASK, date(2007, 1, 1), date(2007, 6, 3));
        let mut second = calendar(FULL_MASK, date(2007, 6, 4), date(2010, 12, 31));
        second.service_id = "WE".to_owned();
        assert_eq!(None, first.try_merge(&second));
    }

    #[test]
    fn week_projection() {
        // 2007-01-03 (wednesday) to 2007-01-09 (tuesday)
        let c = calendar(WEEKDAYS_ONLY, date(2007, 1, 3), date(2007, 1, 9));
        assert_eq!(0b001_1100, c.mask_for_week(date(2007, 1, 1)));
        assert_eq!(0b000_0011, c.mask_for_week(date(2007, 1, 8)));
        assert_eq!(EMPTY_MASK, c.mask_for_week(date(2007, 1, 15)));
        assert_eq!(FULL_MASK, fullw().mask_for_week(date(2008, 6, 2)));
    }

    #[test]
    #[should_panic(expected = "is not the first day of a week")]
    fn week_projection_needs_a_monday() {
        fullw().mask_for_week(date(2007, 1, 2));
    }

    #[test]
    fn running_dates() {
        let c = calendar(SATURDAY | SUNDAY, date(2007, 1, 1), date(2007, 1, 14));
        let dates: Vec<_> = c.dates().collect();
        assert_eq!(
            vec![date(2007, 1, 6), date(2007, 1, 7), date(2007, 1, 13), date(2007, 1, 14)],
            dates
        );
        assert!(c.covers_any_day());
        assert!(!calendar(SATURDAY, date(2007, 1, 1), date(2007, 1, 5)).covers_any_day());
    }
}

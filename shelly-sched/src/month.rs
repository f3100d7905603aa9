//! Month arithmetic shared by the repeater: weekday occurrences within a
//! month and day-of-month lookups that skip short months.

use jiff::civil::Date;
use jiff::Span;

use crate::error::ScheduleError;
use crate::pattern::DayOfMonth;
use crate::weekday::{WeekOfMonth, Weekday};

/// Which way to walk the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub(crate) fn months(self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

/// Number of days in the given month.
pub fn days_in_month(year: i16, month: i8) -> Result<i8, ScheduleError> {
    Ok(Date::new(year, month, 1)?.days_in_month())
}

/// Every date in `month`/`year` that falls on `weekday`, ascending.
pub fn all_weekday_occurrences(
    weekday: Weekday,
    month: i8,
    year: i16,
) -> Result<WeekdayOccurrences, ScheduleError> {
    let first = Date::new(year, month, 1)?;
    let offset = Weekday::of(first).days_until(weekday);
    let next = first.checked_add(Span::new().days(offset))?;
    Ok(WeekdayOccurrences {
        next: Some(next),
        month,
    })
}

/// The `ordinal`-th `weekday` of the month.
///
/// Fails with `OrdinalOutOfRange` when the month has fewer occurrences, e.g.
/// the fifth Friday of February 2025.
pub fn nth_weekday_occurrence(
    weekday: Weekday,
    month: i8,
    year: i16,
    ordinal: WeekOfMonth,
) -> Result<Date, ScheduleError> {
    all_weekday_occurrences(weekday, month, year)?
        .nth(usize::from(ordinal.number() - 1))
        .ok_or(ScheduleError::OrdinalOutOfRange {
            weekday: weekday.as_str(),
            ordinal: ordinal.number(),
            year,
            month,
        })
}

/// Walk month by month from `from`'s month (exclusive) in `direction` until
/// a month long enough to hold `day`, and return that date.
///
/// Short months are skipped rather than clamped: day 31 after January 31 is
/// March 31, never February 28.
pub fn nearest_valid_day_of_month(
    day: DayOfMonth,
    from: Date,
    direction: Direction,
) -> Result<Date, ScheduleError> {
    let step = Span::new().months(direction.months());
    let mut month = from.first_of_month();
    // Any two consecutive months include one with 31 days.
    for _ in 0..3 {
        month = month.checked_add(step)?;
        if month.days_in_month() >= day.get() as i8 {
            return Ok(month.with().day(day.get() as i8).build()?);
        }
    }
    Err(ScheduleError::calendar(format!(
        "no month near {from} has a day {}",
        day.get()
    )))
}

/// Lazy iterator over one month's dates for a single weekday.
#[derive(Debug, Clone)]
pub struct WeekdayOccurrences {
    next: Option<Date>,
    month: i8,
}

impl Iterator for WeekdayOccurrences {
    type Item = Date;

    fn next(&mut self) -> Option<Date> {
        let current = self.next.filter(|d| d.month() == self.month)?;
        self.next = current.checked_add(Span::new().days(7)).ok();
        Some(current)
    }
}

use jiff::civil::{Date, Time};
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Span, Zoned};

use crate::error::ScheduleError;
use crate::month::{self, Direction};
use crate::pattern::{DayOfMonth, Pattern};
use crate::weekday::{WeekOfMonth, Weekday};

/// A recurrence pattern bound to an activation window and run history.
///
/// Queries are pure: `next_run`, `prev_run` and friends never mutate the
/// repeater. The only mutation is [`Repeater::record_fire`], which the
/// dispatching driver calls after invoking the trigger's action.
///
/// Calendar patterns (weekday, ordinal weekday, day of month) resolve a
/// *date*; the returned instant keeps the wall-clock time of the reference
/// it was computed from. Duration patterns are anchored on `last_run`.
#[derive(Debug, Clone)]
pub struct Repeater {
    pattern: Pattern,
    start: Zoned,
    expires: Option<Zoned>,
    last_run: Option<Zoned>,
    tz: TimeZone,
}

impl Repeater {
    /// Calendar arithmetic happens in `start`'s time zone.
    pub fn new(pattern: Pattern, start: Zoned) -> Self {
        let tz = start.time_zone().clone();
        Self {
            pattern,
            start,
            expires: None,
            last_run: None,
            tz,
        }
    }

    /// Start at the current instant in `tz`.
    pub fn starting_now(pattern: Pattern, tz: TimeZone) -> Self {
        Self::new(pattern, Zoned::now().with_time_zone(tz))
    }

    /// Evaluate in `tz` instead of `start`'s zone.
    pub fn in_time_zone(mut self, tz: TimeZone) -> Self {
        self.start = self.start.with_time_zone(tz.clone());
        self.expires = self.expires.map(|e| e.with_time_zone(tz.clone()));
        self.last_run = self.last_run.map(|l| l.with_time_zone(tz.clone()));
        self.tz = tz;
        self
    }

    /// Close the activation window at `expires` (exclusive).
    pub fn expiring(mut self, expires: Zoned) -> Self {
        self.expires = Some(self.localize(&expires));
        self
    }

    pub fn with_last_run(mut self, last_run: Zoned) -> Self {
        self.last_run = Some(self.localize(&last_run));
        self
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn start(&self) -> &Zoned {
        &self.start
    }

    pub fn expires(&self) -> Option<&Zoned> {
        self.expires.as_ref()
    }

    pub fn last_run(&self) -> Option<&Zoned> {
        self.last_run.as_ref()
    }

    pub fn time_zone(&self) -> &TimeZone {
        &self.tz
    }

    pub fn started(&self, now: &Zoned) -> bool {
        self.start <= *now
    }

    pub fn expired(&self, now: &Zoned) -> bool {
        self.expires.as_ref().is_some_and(|e| e <= now)
    }

    /// Inside the `[start, expires)` window.
    pub fn running(&self, now: &Zoned) -> bool {
        self.started(now) && !self.expired(now)
    }

    /// Record that the trigger fired at `at`.
    pub fn record_fire(&mut self, at: Zoned) {
        self.last_run = Some(self.localize(&at));
    }

    /// The next occurrence at or after `now`, or `None` outside the window.
    ///
    /// Duration patterns return `last_run + period` whatever `now` is, so a
    /// driver that fell behind sees the overdue instant.
    pub fn next_run(&self, now: &Zoned) -> Result<Option<Zoned>, ScheduleError> {
        if !self.running(now) {
            return Ok(None);
        }
        let candidate = self.on_or_after(&self.localize(now))?;
        Ok(self.before_expiry(candidate))
    }

    /// The latest occurrence at or before `now`, or `None` outside the window.
    pub fn prev_run(&self, now: &Zoned) -> Result<Option<Zoned>, ScheduleError> {
        if !self.running(now) {
            return Ok(None);
        }
        let candidate = self.on_or_before(&self.localize(now))?;
        Ok(candidate.filter(|c| *c >= self.start))
    }

    /// The first occurrence at or after `start`, independent of any clock.
    pub fn first_run(&self) -> Result<Option<Zoned>, ScheduleError> {
        let candidate = self.on_or_after(&self.start)?;
        Ok(self.before_expiry(candidate))
    }

    /// The first fire instant at or after `now` for a trigger that runs at
    /// `time_of_day` on the pattern's dates.
    ///
    /// Duration patterns carry their own time of day and are returned as is.
    pub fn next_run_at(
        &self,
        time_of_day: Time,
        now: &Zoned,
    ) -> Result<Option<Zoned>, ScheduleError> {
        if self.pattern.is_duration() {
            return self.next_run(now);
        }
        let day = match self.next_run(now)? {
            Some(day) => day,
            None => return Ok(None),
        };
        let mut fire = self.at(day.date(), time_of_day)?;
        if fire < *now {
            // Today matches but the time has passed: search from tomorrow.
            let tomorrow = self.at(day.date().tomorrow()?, Time::midnight())?;
            let day = match self.next_run(&tomorrow)? {
                Some(day) => day,
                None => return Ok(None),
            };
            fire = self.at(day.date(), time_of_day)?;
        }
        Ok(self.before_expiry(fire))
    }

    /// Lazy iterator over successive occurrences from `from`.
    pub fn occurrences(&self, from: &Zoned) -> Occurrences {
        Occurrences::new(self.clone(), from.clone(), None)
    }

    /// Lazy iterator over successive fire instants at `time_of_day`.
    pub fn occurrences_at(&self, time_of_day: Time, from: &Zoned) -> Occurrences {
        Occurrences::new(self.clone(), from.clone(), Some(time_of_day))
    }

    // --- Per-variant evaluation ---

    fn on_or_after(&self, reference: &Zoned) -> Result<Zoned, ScheduleError> {
        let date = reference.date();
        let target = match self.pattern {
            Pattern::ByDuration(period) => {
                let last = self.last_run.as_ref().ok_or(ScheduleError::NoPriorRun)?;
                return Ok(last.checked_add(period.get())?);
            }
            Pattern::ByWeekday(weekday) => {
                let ahead = Weekday::of(date).days_until(weekday);
                date.checked_add(Span::new().days(ahead))?
            }
            Pattern::ByOrdinalWeekdayOfMonth { weekday, ordinal } => {
                ordinal_in_or_beside_month(weekday, ordinal, date, Direction::Forward)?
            }
            Pattern::ByDayOfMonth(day) => day_in_or_beside_month(day, date, Direction::Forward)?,
        };
        self.on_date(target, reference)
    }

    fn on_or_before(&self, reference: &Zoned) -> Result<Option<Zoned>, ScheduleError> {
        let date = reference.date();
        let target = match self.pattern {
            Pattern::ByDuration(period) => {
                return self.last_run_at_or_before(period.get(), reference)
            }
            Pattern::ByWeekday(weekday) => {
                let behind = Weekday::of(date).days_since(weekday);
                date.checked_add(Span::new().days(-behind))?
            }
            Pattern::ByOrdinalWeekdayOfMonth { weekday, ordinal } => {
                ordinal_in_or_beside_month(weekday, ordinal, date, Direction::Backward)?
            }
            Pattern::ByDayOfMonth(day) => day_in_or_beside_month(day, date, Direction::Backward)?,
        };
        self.on_date(target, reference).map(Some)
    }

    /// `last_run` when it is not ahead of `reference`; otherwise step back
    /// whole periods until it is.
    fn last_run_at_or_before(
        &self,
        period: SignedDuration,
        reference: &Zoned,
    ) -> Result<Option<Zoned>, ScheduleError> {
        let last = self.last_run.as_ref().ok_or(ScheduleError::NoPriorRun)?;
        if last <= reference {
            return Ok(Some(last.clone()));
        }
        if period.is_zero() {
            return Ok(None);
        }
        let step = period.as_nanos();
        let ahead = last.timestamp().duration_since(reference.timestamp()).as_nanos();
        let back = ((ahead + step - 1) / step) * step;
        let secs = i64::try_from(back / 1_000_000_000)
            .map_err(|_| ScheduleError::calendar("last run is too far ahead of now"))?;
        let back = SignedDuration::new(secs, (back % 1_000_000_000) as i32);
        Ok(Some(last.checked_sub(back)?))
    }

    fn on_date(&self, date: Date, reference: &Zoned) -> Result<Zoned, ScheduleError> {
        if date == reference.date() {
            return Ok(reference.clone());
        }
        self.at(date, reference.time())
    }

    fn at(&self, date: Date, time: Time) -> Result<Zoned, ScheduleError> {
        Ok(date.to_datetime(time).to_zoned(self.tz.clone())?)
    }

    fn localize(&self, zdt: &Zoned) -> Zoned {
        zdt.with_time_zone(self.tz.clone())
    }

    fn before_expiry(&self, candidate: Zoned) -> Option<Zoned> {
        match &self.expires {
            Some(expires) if candidate >= *expires => None,
            _ => Some(candidate),
        }
    }
}

fn reaches(direction: Direction, candidate: Date, reference: Date) -> bool {
    match direction {
        Direction::Forward => candidate >= reference,
        Direction::Backward => candidate <= reference,
    }
}

/// The ordinal weekday of `date`'s month if it lies in `direction` from
/// `date`, else the one in the adjacent month. Only those two months are
/// consulted.
fn ordinal_in_or_beside_month(
    weekday: Weekday,
    ordinal: WeekOfMonth,
    date: Date,
    direction: Direction,
) -> Result<Date, ScheduleError> {
    match month::nth_weekday_occurrence(weekday, date.month(), date.year(), ordinal) {
        Ok(found) if reaches(direction, found, date) => return Ok(found),
        Ok(_) | Err(ScheduleError::OrdinalOutOfRange { .. }) => {}
        Err(e) => return Err(e),
    }
    let adjacent = date
        .first_of_month()
        .checked_add(Span::new().months(direction.months()))?;
    month::nth_weekday_occurrence(weekday, adjacent.month(), adjacent.year(), ordinal)
}

fn day_in_or_beside_month(
    day: DayOfMonth,
    date: Date,
    direction: Direction,
) -> Result<Date, ScheduleError> {
    let wanted = day.get() as i8;
    if wanted <= date.days_in_month() {
        let same_month = date.with().day(wanted).build()?;
        if reaches(direction, same_month, date) {
            return Ok(same_month);
        }
    }
    month::nearest_valid_day_of_month(day, date, direction)
}

/// Lazy iterator over a repeater's occurrences.
///
/// Duration patterns advance by recording each yielded instant as the last
/// run on a private copy of the repeater. The iterator ends when the window
/// closes, when a duration occurrence fails to move forward (a zero period
/// yields its instant once), and after the first error.
pub struct Occurrences {
    repeater: Repeater,
    cursor: Zoned,
    time_of_day: Option<Time>,
    last: Option<Zoned>,
    done: bool,
}

impl Occurrences {
    fn new(repeater: Repeater, from: Zoned, time_of_day: Option<Time>) -> Self {
        Self {
            repeater,
            cursor: from,
            time_of_day,
            last: None,
            done: false,
        }
    }

    fn advance(&mut self, at: &Zoned) -> Result<Zoned, jiff::Error> {
        if self.repeater.pattern.is_duration() {
            self.repeater.record_fire(at.clone());
            Ok(if *at > self.cursor {
                at.clone()
            } else {
                self.cursor.clone()
            })
        } else if self.time_of_day.is_some() {
            at.checked_add(SignedDuration::from_secs(1))
        } else {
            at.checked_add(Span::new().days(1))
        }
    }
}

impl Iterator for Occurrences {
    type Item = Result<Zoned, ScheduleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let found = match self.time_of_day {
            Some(time) => self.repeater.next_run_at(time, &self.cursor),
            None => self.repeater.next_run(&self.cursor),
        };
        match found {
            Ok(Some(at)) if self.last.as_ref().is_some_and(|last| at <= *last) => {
                self.done = true;
                None
            }
            Ok(Some(at)) => match self.advance(&at) {
                Ok(cursor) => {
                    self.cursor = cursor;
                    self.last = Some(at.clone());
                    Some(Ok(at))
                }
                Err(e) => {
                    self.done = true;
                    Some(Err(ScheduleError::calendar(format!("overflow: {e}"))))
                }
            },
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

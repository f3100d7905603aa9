use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use jiff::civil::Time;
use jiff::Zoned;

use crate::error::ScheduleError;
use crate::repeater::Repeater;

/// Something a dispatcher runs when a trigger fires.
pub trait Action {
    fn fire(&self) -> Result<(), ScheduleError>;
}

impl<F> Action for F
where
    F: Fn() -> Result<(), ScheduleError>,
{
    fn fire(&self) -> Result<(), ScheduleError> {
        self()
    }
}

/// A named repeater that fires an action at a wall-clock time on each of
/// the repeater's dates.
#[derive(Debug, Clone)]
pub struct ScheduledTrigger<A> {
    name: String,
    time_of_day: Time,
    repeater: Repeater,
    action: A,
}

impl<A> ScheduledTrigger<A> {
    pub fn new(name: impl Into<String>, time_of_day: Time, repeater: Repeater, action: A) -> Self {
        Self {
            name: name.into(),
            time_of_day,
            repeater,
            action,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time_of_day(&self) -> Time {
        self.time_of_day
    }

    pub fn repeater(&self) -> &Repeater {
        &self.repeater
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    /// The next fire instant at or after `now`.
    ///
    /// Date from the repeater, time from `time_of_day`, in the repeater's
    /// zone. Duration patterns fire at their own instants.
    pub fn next_fire(&self, now: &Zoned) -> Result<Option<Zoned>, ScheduleError> {
        self.repeater.next_run_at(self.time_of_day, now)
    }

    pub fn record_fire(&mut self, at: Zoned) {
        self.repeater.record_fire(at);
    }

    /// Swap the action, keeping name and schedule.
    pub fn map_action<B>(self, f: impl FnOnce(A) -> B) -> ScheduledTrigger<B> {
        ScheduledTrigger {
            name: self.name,
            time_of_day: self.time_of_day,
            repeater: self.repeater,
            action: f(self.action),
        }
    }
}

impl<A: Action> ScheduledTrigger<A> {
    /// Run the action, then record `at` as the last run.
    ///
    /// A failed action leaves the run history untouched.
    pub fn fire(&mut self, at: Zoned) -> Result<(), ScheduleError> {
        self.action.fire()?;
        self.record_fire(at);
        Ok(())
    }
}

/// One trigger's upcoming fire, identified by its position in the slice
/// passed to [`agenda`]. Ordered by instant, then position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFire {
    pub at: Zoned,
    pub index: usize,
}

impl Ord for PendingFire {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .cmp(&other.at)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for PendingFire {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A trigger whose evaluation failed this cycle.
#[derive(Debug, Clone)]
pub struct SkippedTrigger {
    pub index: usize,
    pub error: ScheduleError,
}

/// Pending fires across a set of triggers, earliest first.
#[derive(Debug, Clone, Default)]
pub struct Agenda {
    pending: Vec<PendingFire>,
    skipped: Vec<SkippedTrigger>,
}

impl Agenda {
    pub fn pending(&self) -> &[PendingFire] {
        &self.pending
    }

    pub fn skipped(&self) -> &[SkippedTrigger] {
        &self.skipped
    }

    pub fn earliest(&self) -> Option<&PendingFire> {
        self.pending.first()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Min-heap of the pending fires for a dispatch loop.
    pub fn into_queue(self) -> BinaryHeap<Reverse<PendingFire>> {
        self.pending.into_iter().map(Reverse).collect()
    }
}

/// Evaluate every trigger's next fire at `now`.
///
/// A trigger that fails to evaluate lands in [`Agenda::skipped`] and does
/// not affect the others. Triggers outside their window are left out.
pub fn agenda<A>(triggers: &[ScheduledTrigger<A>], now: &Zoned) -> Agenda {
    let mut agenda = Agenda::default();
    for (index, trigger) in triggers.iter().enumerate() {
        match trigger.next_fire(now) {
            Ok(Some(at)) => agenda.pending.push(PendingFire { at, index }),
            Ok(None) => {}
            Err(error) => agenda.skipped.push(SkippedTrigger { index, error }),
        }
    }
    agenda.pending.sort();
    agenda
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;
    use crate::weekday::{WeekOfMonth, Weekday};
    use jiff::civil::{date, time};
    use jiff::tz::TimeZone;
    use jiff::SignedDuration;
    use std::cell::Cell;

    fn utc(y: i16, m: i8, d: i8, h: i8, mi: i8) -> Zoned {
        date(y, m, d).at(h, mi, 0, 0).to_zoned(TimeZone::UTC).unwrap()
    }

    fn weekly(weekday: Weekday, start: Zoned) -> Repeater {
        Repeater::new(Pattern::ByWeekday(weekday), start)
    }

    #[test]
    fn next_fire_combines_date_and_time() {
        let trigger = ScheduledTrigger::new(
            "wake",
            time(6, 45, 0, 0),
            weekly(Weekday::Friday, utc(2024, 1, 1, 0, 0)),
            (),
        );
        assert_eq!(
            trigger.next_fire(&utc(2024, 1, 1, 12, 0)).unwrap(),
            Some(utc(2024, 1, 5, 6, 45))
        );
    }

    #[test]
    fn duration_trigger_follows_recorded_fires() {
        let start = utc(2024, 1, 1, 0, 0);
        let repeater = Repeater::new(
            Pattern::by_duration(SignedDuration::from_hours(6)).unwrap(),
            start.clone(),
        )
        .with_last_run(start.clone());
        let mut trigger = ScheduledTrigger::new("poll", Time::midnight(), repeater, ());
        let first = trigger.next_fire(&start).unwrap().unwrap();
        assert_eq!(first, utc(2024, 1, 1, 6, 0));
        trigger.record_fire(first.clone());
        assert_eq!(
            trigger.next_fire(&first).unwrap(),
            Some(utc(2024, 1, 1, 12, 0))
        );
    }

    #[test]
    fn fire_runs_action_and_records() {
        let calls = Cell::new(0);
        let action = || -> Result<(), ScheduleError> {
            calls.set(calls.get() + 1);
            Ok(())
        };
        let mut trigger = ScheduledTrigger::new(
            "lamp",
            time(7, 0, 0, 0),
            weekly(Weekday::Monday, utc(2024, 1, 1, 0, 0)),
            action,
        );
        let at = utc(2024, 1, 1, 7, 0);
        trigger.fire(at.clone()).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(trigger.repeater().last_run(), Some(&at));
    }

    #[test]
    fn failed_action_does_not_record() {
        let action = || -> Result<(), ScheduleError> {
            Err(ScheduleError::device("connection refused"))
        };
        let mut trigger = ScheduledTrigger::new(
            "lamp",
            time(7, 0, 0, 0),
            weekly(Weekday::Monday, utc(2024, 1, 1, 0, 0)),
            action,
        );
        assert!(trigger.fire(utc(2024, 1, 1, 7, 0)).is_err());
        assert_eq!(trigger.repeater().last_run(), None);
    }

    #[test]
    fn agenda_orders_and_skips() {
        let now = utc(2025, 2, 1, 0, 0);
        let triggers = vec![
            ScheduledTrigger::new(
                "late",
                time(9, 0, 0, 0),
                weekly(Weekday::Tuesday, now.clone()),
                (),
            ),
            ScheduledTrigger::new(
                "fifth-friday",
                time(9, 0, 0, 0),
                Repeater::new(
                    Pattern::by_ordinal_weekday(Weekday::Friday, WeekOfMonth::Fifth),
                    now.clone(),
                ),
                (),
            ),
            ScheduledTrigger::new(
                "early",
                time(9, 0, 0, 0),
                weekly(Weekday::Monday, now.clone()),
                (),
            ),
            ScheduledTrigger::new(
                "same-time",
                time(9, 0, 0, 0),
                weekly(Weekday::Monday, now.clone()),
                (),
            ),
        ];
        let agenda = agenda(&triggers, &now);
        let order: Vec<usize> = agenda.pending().iter().map(|p| p.index).collect();
        assert_eq!(order, vec![2, 3, 0]);
        assert_eq!(agenda.earliest().unwrap().at, utc(2025, 2, 3, 9, 0));
        assert_eq!(agenda.skipped().len(), 1);
        assert_eq!(agenda.skipped()[0].index, 1);
        assert!(agenda.skipped()[0].error.is_recoverable());
    }

    #[test]
    fn queue_pops_earliest_first() {
        let now = utc(2024, 1, 1, 0, 0);
        let triggers = vec![
            ScheduledTrigger::new(
                "b",
                time(8, 0, 0, 0),
                weekly(Weekday::Wednesday, now.clone()),
                (),
            ),
            ScheduledTrigger::new(
                "a",
                time(8, 0, 0, 0),
                weekly(Weekday::Tuesday, now.clone()),
                (),
            ),
        ];
        let mut queue = agenda(&triggers, &now).into_queue();
        let Reverse(first) = queue.pop().unwrap();
        assert_eq!(triggers[first.index].name(), "a");
    }

    #[test]
    fn expired_triggers_are_left_out() {
        let now = utc(2024, 6, 1, 0, 0);
        let triggers = vec![ScheduledTrigger::new(
            "old",
            time(8, 0, 0, 0),
            weekly(Weekday::Monday, utc(2024, 1, 1, 0, 0)).expiring(utc(2024, 2, 1, 0, 0)),
            (),
        )];
        let agenda = agenda(&triggers, &now);
        assert!(agenda.is_empty());
        assert!(agenda.skipped().is_empty());
    }

    #[test]
    fn map_action_keeps_schedule() {
        let trigger = ScheduledTrigger::new(
            "lamp",
            time(7, 0, 0, 0),
            weekly(Weekday::Monday, utc(2024, 1, 1, 0, 0)),
            40u8,
        );
        let mapped = trigger.map_action(|b| u32::from(b) * 2);
        assert_eq!(*mapped.action(), 80);
        assert_eq!(mapped.name(), "lamp");
    }
}

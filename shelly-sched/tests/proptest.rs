use jiff::civil::date;
use jiff::tz::TimeZone;
use jiff::Zoned;
use proptest::prelude::*;
use shelly_sched::{Pattern, Repeater, WeekOfMonth, Weekday};

fn arb_weekday() -> impl Strategy<Value = Weekday> {
    (0usize..7).prop_map(|i| Weekday::ALL[i])
}

/// First through fourth: every month has at least four of each weekday.
fn arb_common_ordinal() -> impl Strategy<Value = WeekOfMonth> {
    (0usize..4).prop_map(|i| WeekOfMonth::ALL[i])
}

/// A UTC instant between 2020 and 2039.
fn arb_now() -> impl Strategy<Value = Zoned> {
    (2020i16..2040, 1i8..=12, 1i8..=28, 0i8..24, 0i8..60).prop_map(|(y, m, d, h, mi)| {
        date(y, m, d).at(h, mi, 0, 0).to_zoned(TimeZone::UTC).unwrap()
    })
}

fn long_ago() -> Zoned {
    date(2000, 1, 1).at(0, 0, 0, 0).to_zoned(TimeZone::UTC).unwrap()
}

fn month_index(z: &Zoned) -> i32 {
    i32::from(z.year()) * 12 + i32::from(z.month())
}

fn arb_expression() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u32..72).prop_map(|h| format!("every {h}h")),
        (1u32..600).prop_map(|m| format!("every {m} minutes")),
        arb_weekday().prop_map(|d| format!("every {}", d.short())),
        (0usize..5, arb_weekday())
            .prop_map(|(o, d)| format!("{} {d} of every month", WeekOfMonth::ALL[o].abbreviation())),
        (1u8..=31).prop_map(|d| format!("every month on the {d}")),
    ]
}

fn calendar_pattern() -> impl Strategy<Value = Pattern> {
    prop_oneof![
        arb_weekday().prop_map(Pattern::by_weekday),
        (arb_weekday(), arb_common_ordinal())
            .prop_map(|(d, o)| Pattern::by_ordinal_weekday(d, o)),
        (1i64..=31).prop_map(|d| Pattern::by_day_of_month(d).unwrap()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Display output re-parses to the same pattern.
    #[test]
    fn roundtrip_idempotency(expr in arb_expression()) {
        let pattern = Pattern::parse(&expr).unwrap();
        let displayed = pattern.to_string();
        let reparsed = Pattern::parse(&displayed)
            .unwrap_or_else(|e| panic!("re-parse failed for '{displayed}': {e}"));
        prop_assert_eq!(&reparsed, &pattern,
            "'{}' displayed as '{}' re-parsed differently", expr, displayed);
        prop_assert_eq!(reparsed.to_string(), displayed);
    }

    #[test]
    fn weekday_index_roundtrip(day in arb_weekday()) {
        prop_assert_eq!(Weekday::from_index(i64::from(day.index())).unwrap(), day);
        prop_assert_eq!(Weekday::from_name(day.as_str()).unwrap(), day);
    }

    /// The next run lands on the weekday within a week.
    #[test]
    fn weekday_next_run_is_on_target(day in arb_weekday(), now in arb_now()) {
        let r = Repeater::new(Pattern::by_weekday(day), long_ago());
        let next = r.next_run(&now).unwrap().unwrap();
        prop_assert_eq!(Weekday::of(next.date()), day);
        prop_assert!(next >= now);
        prop_assert!(next.date() < now.date().checked_add(jiff::Span::new().days(7)).unwrap());
    }

    /// Days every month has are found in the current or the next month.
    #[test]
    fn short_days_never_skip_a_month(day in 1i64..=28, now in arb_now()) {
        let r = Repeater::new(Pattern::by_day_of_month(day).unwrap(), long_ago());
        let next = r.next_run(&now).unwrap().unwrap();
        prop_assert_eq!(i64::from(next.day()), day);
        let gap = month_index(&next) - month_index(&now);
        prop_assert!(gap == 0 || gap == 1, "jumped {} months to {}", gap, next);
    }

    /// Day 31 only ever lands in 31-day months.
    #[test]
    fn day_31_skips_short_months(now in arb_now()) {
        let r = Repeater::new(Pattern::by_day_of_month(31).unwrap(), long_ago());
        let next = r.next_run(&now).unwrap().unwrap();
        prop_assert_eq!(next.day(), 31);
        prop_assert_eq!(next.date().days_in_month(), 31);
        let prev = r.prev_run(&now).unwrap().unwrap();
        prop_assert_eq!(prev.day(), 31);
    }

    /// prev_run <= now <= next_run for calendar patterns.
    #[test]
    fn prev_and_next_bracket_now(pattern in calendar_pattern(), now in arb_now()) {
        let r = Repeater::new(pattern, long_ago());
        let next = r.next_run(&now).unwrap().unwrap();
        let prev = r.prev_run(&now).unwrap().unwrap();
        prop_assert!(prev <= now, "prev {} after now {}", prev, now);
        prop_assert!(next >= now, "next {} before now {}", next, now);
    }

    /// Duration prev_run never lands after now, even with a last run ahead.
    #[test]
    fn duration_prev_not_after_now(
        mins in 0i64..10_000,
        ahead in -20_000i64..20_000,
        now in arb_now(),
    ) {
        let period = jiff::SignedDuration::from_mins(mins);
        let last_run = now.checked_add(jiff::SignedDuration::from_mins(ahead)).unwrap();
        let r = Repeater::new(Pattern::by_duration(period).unwrap(), long_ago())
            .with_last_run(last_run);
        if let Some(prev) = r.prev_run(&now).unwrap() {
            prop_assert!(prev <= now, "prev {} after now {}", prev, now);
        }
    }

    /// Successive occurrences strictly increase.
    #[test]
    fn occurrences_increase(pattern in calendar_pattern(), now in arb_now()) {
        let r = Repeater::new(pattern, long_ago());
        let got: Vec<Zoned> = r.occurrences(&now).take(6).collect::<Result<_, _>>().unwrap();
        for pair in got.windows(2) {
            prop_assert!(pair[0] < pair[1], "{} then {}", pair[0], pair[1]);
        }
    }
}

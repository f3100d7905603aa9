//! shelly-sched: recurring light schedules for networked dimmers.
//!
//! A [`Pattern`] says what repeats (every 24h, every tuesday, the second
//! monday of every month, the 31st of every month). A [`Repeater`] binds a
//! pattern to an activation window and answers "when next?" and "when
//! last?". A [`ScheduledTrigger`] adds a time of day and an [`Action`] to
//! run, typically a [`LightCommand`] sent to a dimmer.
//!
//! # Examples
//!
//! ```
//! use jiff::civil::date;
//! use jiff::tz::TimeZone;
//! use shelly_sched::{Pattern, Repeater};
//!
//! let pattern: Pattern = "second monday of every month".parse().unwrap();
//! let start = date(2024, 1, 1).at(0, 0, 0, 0).to_zoned(TimeZone::UTC).unwrap();
//! let repeater = Repeater::new(pattern, start.clone());
//! let next = repeater.next_run(&start).unwrap().unwrap();
//! assert_eq!(next.date().to_string(), "2024-01-08");
//! ```

pub mod command;
pub mod display;
pub mod error;
pub mod lexer;
pub mod month;
pub mod parser;
pub mod pattern;
pub mod repeater;
pub mod trigger;
pub mod weekday;

#[cfg(feature = "serde")]
pub mod config;
#[cfg(feature = "serde")]
pub mod status;

#[cfg(feature = "device")]
pub mod device;

pub use command::{LightCommand, Turn};
pub use error::ScheduleError;
pub use parser::{parse_instant, parse_time_of_day};
pub use pattern::{DayOfMonth, Pattern, Period};
pub use repeater::{Occurrences, Repeater};
pub use trigger::{agenda, Action, Agenda, PendingFire, ScheduledTrigger, SkippedTrigger};
pub use weekday::{WeekOfMonth, Weekday, WeekdayRef};

#[cfg(feature = "device")]
pub use device::{Dimmer, LightAction, StatusPoller};

use jiff::tz::TimeZone;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The zone to evaluate schedules in when none is configured: the system
/// zone, or UTC when it cannot be determined.
///
/// Resolve this once at startup and pass it down.
pub fn process_time_zone() -> TimeZone {
    TimeZone::try_system().unwrap_or(TimeZone::UTC)
}

#[cfg(feature = "serde")]
impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Deserialize from the expression string
        let s = String::deserialize(deserializer)?;
        Pattern::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "serde")]
impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Weekday::from_name(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn pattern_serializes_as_expression() {
        let pattern: Pattern = "2nd tue of every month".parse().unwrap();
        assert_eq!(
            serde_json::to_string(&pattern).unwrap(),
            "\"second tuesday of every month\""
        );
        let back: Pattern = serde_json::from_str("\"second tuesday of every month\"").unwrap();
        assert_eq!(back, pattern);
    }

    #[test]
    fn pattern_deserialize_reports_parse_errors() {
        let err = serde_json::from_str::<Pattern>("\"every blursday\"").unwrap_err();
        assert!(err.to_string().contains("blursday"), "{err}");
    }

    #[test]
    fn weekday_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&Weekday::Saturday).unwrap(),
            "\"saturday\""
        );
        let day: Weekday = serde_json::from_str("\"Thu\"").unwrap();
        assert_eq!(day, Weekday::Thursday);
    }
}

use std::fmt;

use crate::pattern::{DayOfMonth, Pattern};
use crate::weekday::{WeekOfMonth, Weekday, WeekdayRef};

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Friendly duration format: "24h", "1h 30m".
            Pattern::ByDuration(period) => write!(f, "every {:#}", period.get()),
            Pattern::ByWeekday(weekday) => write!(f, "every {weekday}"),
            Pattern::ByOrdinalWeekdayOfMonth { weekday, ordinal } => {
                write!(f, "{ordinal} {weekday} of every month")
            }
            Pattern::ByDayOfMonth(day) => write!(f, "every month on the {day}"),
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WeekOfMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WeekdayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ordinal() {
            Some(ordinal) => write!(f, "{ordinal} {}", self.day_of_week()),
            None => write!(f, "{}", self.day_of_week()),
        }
    }
}

impl fmt::Display for DayOfMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.get(), self.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;

    fn roundtrip(input: &str) -> String {
        let pattern = crate::parser::parse(input).unwrap();
        let text = pattern.to_string();
        assert_eq!(crate::parser::parse(&text).unwrap(), pattern, "{text}");
        text
    }

    #[test]
    fn test_canonical_forms() {
        assert_eq!(roundtrip("every PT24H"), "every 24h");
        assert_eq!(roundtrip("every 90 minutes"), "every 1h 30m");
        assert_eq!(roundtrip("Every TUE"), "every tuesday");
        assert_eq!(
            roundtrip("2nd mon of every month"),
            "second monday of every month"
        );
        assert_eq!(roundtrip("every month on the 22"), "every month on the 22nd");
    }

    #[test]
    fn test_zero_duration() {
        let text = Pattern::by_duration(SignedDuration::ZERO).unwrap().to_string();
        assert_eq!(text, "every 0s");
        assert_eq!(roundtrip(&text), text);
    }

    #[test]
    fn test_weekday_ref_display() {
        assert_eq!(WeekdayRef::new(Weekday::Friday).to_string(), "friday");
        assert_eq!(
            WeekdayRef::nth(Weekday::Friday, WeekOfMonth::Fifth).to_string(),
            "fifth friday"
        );
    }
}

use jiff::SignedDuration;

use crate::error::ScheduleError;
use crate::weekday::{WeekOfMonth, Weekday, WeekdayRef};

/// A validated day of month (1..=31), independent of any month's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayOfMonth(u8);

impl DayOfMonth {
    pub fn new(day: i64) -> Result<Self, ScheduleError> {
        match u8::try_from(day) {
            Ok(d @ 1..=31) => Ok(Self(d)),
            _ => Err(ScheduleError::InvalidDay { day }),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Ordinal suffix for display: 1st, 2nd, 3rd, 11th, 22nd.
    pub fn suffix(self) -> &'static str {
        match self.0 {
            11..=13 => "th",
            d if d % 10 == 1 => "st",
            d if d % 10 == 2 => "nd",
            d if d % 10 == 3 => "rd",
            _ => "th",
        }
    }
}

/// A non-negative recurrence period. Zero is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period(SignedDuration);

impl Period {
    pub fn new(period: SignedDuration) -> Result<Self, ScheduleError> {
        if period.is_negative() {
            return Err(ScheduleError::invalid_duration(format!(
                "period {period:#} is negative"
            )));
        }
        Ok(Self(period))
    }

    pub fn get(self) -> SignedDuration {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<SignedDuration> for Period {
    type Error = ScheduleError;

    fn try_from(period: SignedDuration) -> Result<Self, Self::Error> {
        Self::new(period)
    }
}

/// What repeats: exactly one recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// `every 24h`: a fixed period after the last fire.
    ByDuration(Period),
    /// `every tuesday`
    ByWeekday(Weekday),
    /// `second monday of every month`
    ByOrdinalWeekdayOfMonth {
        weekday: Weekday,
        ordinal: WeekOfMonth,
    },
    /// `every month on the 31st`: months without that day are skipped.
    ByDayOfMonth(DayOfMonth),
}

impl Pattern {
    /// Fails for negative periods; a zero period is allowed.
    pub fn by_duration(period: SignedDuration) -> Result<Self, ScheduleError> {
        Period::new(period).map(Self::ByDuration)
    }

    pub fn by_weekday(weekday: Weekday) -> Self {
        Self::ByWeekday(weekday)
    }

    pub fn by_ordinal_weekday(weekday: Weekday, ordinal: WeekOfMonth) -> Self {
        Self::ByOrdinalWeekdayOfMonth { weekday, ordinal }
    }

    pub fn by_day_of_month(day: i64) -> Result<Self, ScheduleError> {
        DayOfMonth::new(day).map(Self::ByDayOfMonth)
    }

    /// Weekly when the reference has no ordinal, monthly when it does.
    pub fn from_weekday_ref(weekday: WeekdayRef) -> Self {
        match weekday.ordinal() {
            Some(ordinal) => Self::by_ordinal_weekday(weekday.day_of_week(), ordinal),
            None => Self::by_weekday(weekday.day_of_week()),
        }
    }

    /// Parse a pattern expression such as `every tuesday`.
    pub fn parse(input: &str) -> Result<Self, ScheduleError> {
        crate::parser::parse(input)
    }

    pub fn is_duration(&self) -> bool {
        matches!(self, Self::ByDuration(_))
    }

    /// Short variant name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ByDuration(_) => "duration",
            Self::ByWeekday(_) => "weekday",
            Self::ByOrdinalWeekdayOfMonth { .. } => "ordinal_weekday",
            Self::ByDayOfMonth(_) => "day_of_month",
        }
    }
}

impl std::str::FromStr for Pattern {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

use std::cmp::Ordering;
use std::str::FromStr;

use jiff::civil::Date;
use jiff::Zoned;

use crate::error::ScheduleError;
use crate::pattern::DayOfMonth;

/// Day of the week, ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    pub fn short(self) -> &'static str {
        &self.as_str()[..3]
    }

    pub fn to_jiff(self) -> jiff::civil::Weekday {
        match self {
            Self::Monday => jiff::civil::Weekday::Monday,
            Self::Tuesday => jiff::civil::Weekday::Tuesday,
            Self::Wednesday => jiff::civil::Weekday::Wednesday,
            Self::Thursday => jiff::civil::Weekday::Thursday,
            Self::Friday => jiff::civil::Weekday::Friday,
            Self::Saturday => jiff::civil::Weekday::Saturday,
            Self::Sunday => jiff::civil::Weekday::Sunday,
        }
    }

    pub fn from_jiff(wd: jiff::civil::Weekday) -> Self {
        match wd {
            jiff::civil::Weekday::Monday => Self::Monday,
            jiff::civil::Weekday::Tuesday => Self::Tuesday,
            jiff::civil::Weekday::Wednesday => Self::Wednesday,
            jiff::civil::Weekday::Thursday => Self::Thursday,
            jiff::civil::Weekday::Friday => Self::Friday,
            jiff::civil::Weekday::Saturday => Self::Saturday,
            jiff::civil::Weekday::Sunday => Self::Sunday,
        }
    }

    /// Weekday of a calendar date.
    pub fn of(date: Date) -> Self {
        Self::from_jiff(date.weekday())
    }

    /// Zero-based index: Monday=0, Sunday=6.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Weekday::index`].
    pub fn from_index(n: i64) -> Result<Self, ScheduleError> {
        usize::try_from(n)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| {
                ScheduleError::invalid_weekday(format!("index {n} is outside 0 through 6"))
            })
    }

    /// Resolve a case-insensitive prefix of a weekday name ("tu", "FRI", "sunday").
    ///
    /// The prefix must select exactly one weekday: "t" and "s" are ambiguous.
    pub fn from_name(name: &str) -> Result<Self, ScheduleError> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Err(ScheduleError::invalid_weekday("empty weekday name"));
        }
        let candidates: Vec<Weekday> = Self::ALL
            .into_iter()
            .filter(|d| d.as_str().starts_with(&needle))
            .collect();
        match candidates.as_slice() {
            [one] => Ok(*one),
            [] => Err(ScheduleError::invalid_weekday(format!(
                "'{name}' does not name a weekday"
            ))),
            many => {
                let names: Vec<&str> = many.iter().map(|d| d.as_str()).collect();
                Err(ScheduleError::invalid_weekday(format!(
                    "'{name}' is ambiguous ({})",
                    names.join(", ")
                )))
            }
        }
    }

    /// Days to walk forward from `self` to reach `target` (0..=6).
    pub fn days_until(self, target: Weekday) -> i64 {
        (i64::from(target.index()) - i64::from(self.index())).rem_euclid(7)
    }

    /// Days to walk backward from `self` to reach `target` (0..=6).
    pub fn days_since(self, target: Weekday) -> i64 {
        target.days_until(self)
    }
}

impl FromStr for Weekday {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Which occurrence of a weekday within its month ("the 2nd Tuesday").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeekOfMonth {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
}

impl WeekOfMonth {
    pub const ALL: [WeekOfMonth; 5] = [
        Self::First,
        Self::Second,
        Self::Third,
        Self::Fourth,
        Self::Fifth,
    ];

    /// One-based position: First=1.
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_number(n: i64) -> Result<Self, ScheduleError> {
        usize::try_from(n - 1)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(ScheduleError::InvalidOrdinal { ordinal: n })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Second => "second",
            Self::Third => "third",
            Self::Fourth => "fourth",
            Self::Fifth => "fifth",
        }
    }

    /// Numeric form: "1st", "2nd", ...
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::First => "1st",
            Self::Second => "2nd",
            Self::Third => "3rd",
            Self::Fourth => "4th",
            Self::Fifth => "5th",
        }
    }
}

/// A validated weekday, optionally qualified with its ordinal in the month.
///
/// Equality and ordering look only at the day of week; the ordinal is
/// carried for pattern construction and ignored by comparisons.
#[derive(Debug, Clone, Copy)]
pub struct WeekdayRef {
    day_of_week: Weekday,
    ordinal: Option<WeekOfMonth>,
}

impl WeekdayRef {
    pub fn new(day_of_week: Weekday) -> Self {
        Self {
            day_of_week,
            ordinal: None,
        }
    }

    /// "The `ordinal` `day_of_week` of the month".
    pub fn nth(day_of_week: Weekday, ordinal: WeekOfMonth) -> Self {
        Self {
            day_of_week,
            ordinal: Some(ordinal),
        }
    }

    pub fn from_index(n: i64) -> Result<Self, ScheduleError> {
        Weekday::from_index(n).map(Self::new)
    }

    pub fn from_name(name: &str) -> Result<Self, ScheduleError> {
        Weekday::from_name(name).map(Self::new)
    }

    /// Attach a one-based ordinal (1..=5).
    pub fn with_ordinal(self, ordinal: i64) -> Result<Self, ScheduleError> {
        let ordinal = WeekOfMonth::from_number(ordinal)?;
        Ok(Self::nth(self.day_of_week, ordinal))
    }

    pub fn day_of_week(&self) -> Weekday {
        self.day_of_week
    }

    pub fn ordinal(&self) -> Option<WeekOfMonth> {
        self.ordinal
    }

    /// True when `date` falls on this weekday.
    pub fn matches(&self, date: Date) -> bool {
        Weekday::of(date) == self.day_of_week
    }

    /// Compare against anything that has a weekday.
    ///
    /// Fails with `InvalidComparison` for values that carry no weekday, such
    /// as a bare day of month.
    pub fn try_cmp(&self, other: impl Into<Comparand>) -> Result<Ordering, ScheduleError> {
        let theirs = match other.into() {
            Comparand::Weekday(wd) => wd,
            Comparand::Reference(r) => r.day_of_week,
            Comparand::Date(date) => Weekday::of(date),
            Comparand::Zoned(zdt) => Weekday::of(zdt.date()),
            Comparand::DayOfMonth(day) => {
                return Err(ScheduleError::invalid_comparison(format!(
                    "day of month {} has no weekday to compare with {}",
                    day.get(),
                    self.day_of_week.as_str()
                )))
            }
        };
        Ok(self.day_of_week.cmp(&theirs))
    }
}

impl From<Weekday> for WeekdayRef {
    fn from(day_of_week: Weekday) -> Self {
        Self::new(day_of_week)
    }
}

impl FromStr for WeekdayRef {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Right-hand side of [`WeekdayRef::try_cmp`].
#[derive(Debug, Clone)]
pub enum Comparand {
    Weekday(Weekday),
    Reference(WeekdayRef),
    Date(Date),
    Zoned(Zoned),
    DayOfMonth(DayOfMonth),
}

impl From<Weekday> for Comparand {
    fn from(wd: Weekday) -> Self {
        Self::Weekday(wd)
    }
}

impl From<jiff::civil::Weekday> for Comparand {
    fn from(wd: jiff::civil::Weekday) -> Self {
        Self::Weekday(Weekday::from_jiff(wd))
    }
}

impl From<WeekdayRef> for Comparand {
    fn from(r: WeekdayRef) -> Self {
        Self::Reference(r)
    }
}

impl From<Date> for Comparand {
    fn from(date: Date) -> Self {
        Self::Date(date)
    }
}

impl From<Zoned> for Comparand {
    fn from(zdt: Zoned) -> Self {
        Self::Zoned(zdt)
    }
}

impl From<&Zoned> for Comparand {
    fn from(zdt: &Zoned) -> Self {
        Self::Zoned(zdt.clone())
    }
}

impl From<DayOfMonth> for Comparand {
    fn from(day: DayOfMonth) -> Self {
        Self::DayOfMonth(day)
    }
}

// --- Comparisons on day of week only ---

impl PartialEq for WeekdayRef {
    fn eq(&self, other: &Self) -> bool {
        self.day_of_week == other.day_of_week
    }
}

impl Eq for WeekdayRef {}

impl PartialOrd for WeekdayRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WeekdayRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.day_of_week.cmp(&other.day_of_week)
    }
}

impl PartialEq<Weekday> for WeekdayRef {
    fn eq(&self, other: &Weekday) -> bool {
        self.day_of_week == *other
    }
}

impl PartialOrd<Weekday> for WeekdayRef {
    fn partial_cmp(&self, other: &Weekday) -> Option<Ordering> {
        Some(self.day_of_week.cmp(other))
    }
}

impl PartialEq<Date> for WeekdayRef {
    fn eq(&self, other: &Date) -> bool {
        self.matches(*other)
    }
}

impl PartialOrd<Date> for WeekdayRef {
    fn partial_cmp(&self, other: &Date) -> Option<Ordering> {
        Some(self.day_of_week.cmp(&Weekday::of(*other)))
    }
}

impl PartialEq<Zoned> for WeekdayRef {
    fn eq(&self, other: &Zoned) -> bool {
        self.matches(other.date())
    }
}

impl PartialOrd<Zoned> for WeekdayRef {
    fn partial_cmp(&self, other: &Zoned) -> Option<Ordering> {
        Some(self.day_of_week.cmp(&Weekday::of(other.date())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_indices_roundtrip() {
        for wd in Weekday::ALL {
            assert_eq!(Weekday::from_name(wd.as_str()).unwrap(), wd);
            assert_eq!(Weekday::from_name(wd.short()).unwrap(), wd);
            assert_eq!(Weekday::from_index(wd.index() as i64).unwrap(), wd);
            assert_eq!(Weekday::from_jiff(wd.to_jiff()), wd);
        }
    }

    #[test]
    fn prefix_is_case_insensitive() {
        assert_eq!(Weekday::from_name("TU").unwrap(), Weekday::Tuesday);
        assert_eq!(Weekday::from_name("th").unwrap(), Weekday::Thursday);
        assert_eq!(Weekday::from_name(" Sat ").unwrap(), Weekday::Saturday);
        assert_eq!(Weekday::from_name("m").unwrap(), Weekday::Monday);
    }

    #[test]
    fn ambiguous_or_unknown_prefix_fails() {
        for bad in ["t", "s", "", "x", "mondays"] {
            let err = Weekday::from_name(bad).unwrap_err();
            assert!(
                matches!(err, ScheduleError::InvalidWeekday { .. }),
                "{bad:?} gave {err:?}"
            );
        }
        let err = Weekday::from_name("t").unwrap_err();
        assert!(err.to_string().contains("tuesday, thursday"));
    }

    #[test]
    fn index_out_of_range_fails() {
        assert!(Weekday::from_index(-1).is_err());
        assert!(Weekday::from_index(7).is_err());
        assert_eq!(Weekday::from_index(0).unwrap(), Weekday::Monday);
        assert_eq!(Weekday::from_index(6).unwrap(), Weekday::Sunday);
    }

    #[test]
    fn ordinal_must_be_one_through_five() {
        let tue = WeekdayRef::new(Weekday::Tuesday);
        assert_eq!(
            tue.with_ordinal(2).unwrap().ordinal(),
            Some(WeekOfMonth::Second)
        );
        assert!(matches!(
            tue.with_ordinal(0),
            Err(ScheduleError::InvalidOrdinal { ordinal: 0 })
        ));
        assert!(matches!(
            tue.with_ordinal(6),
            Err(ScheduleError::InvalidOrdinal { ordinal: 6 })
        ));
    }

    #[test]
    fn days_until_wraps_the_week() {
        assert_eq!(Weekday::Monday.days_until(Weekday::Monday), 0);
        assert_eq!(Weekday::Monday.days_until(Weekday::Wednesday), 2);
        assert_eq!(Weekday::Friday.days_until(Weekday::Monday), 3);
        assert_eq!(Weekday::Monday.days_since(Weekday::Friday), 3);
        assert_eq!(Weekday::Sunday.days_since(Weekday::Monday), 6);
    }

    #[test]
    fn comparisons_ignore_ordinal() {
        let plain = WeekdayRef::new(Weekday::Tuesday);
        let second = WeekdayRef::nth(Weekday::Tuesday, WeekOfMonth::Second);
        assert_eq!(plain, second);
        assert!(WeekdayRef::new(Weekday::Monday) < plain);
        assert!(plain > Weekday::Monday);
        assert!(plain == Weekday::Tuesday);
    }

    #[test]
    fn compares_against_dates() {
        // 2024-01-01 is a Monday.
        let monday = Date::new(2024, 1, 1).unwrap();
        let tue = WeekdayRef::new(Weekday::Tuesday);
        assert!(WeekdayRef::new(Weekday::Monday) == monday);
        assert!(tue > monday);
        assert_eq!(tue.try_cmp(monday).unwrap(), Ordering::Greater);

        let zdt: Zoned = "2024-01-07T10:00:00+00:00[UTC]".parse().unwrap();
        assert_eq!(tue.try_cmp(&zdt).unwrap(), Ordering::Less);
        assert_eq!(
            tue.try_cmp(jiff::civil::Weekday::Tuesday).unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn comparing_with_day_of_month_fails() {
        let tue = WeekdayRef::new(Weekday::Tuesday);
        let err = tue.try_cmp(DayOfMonth::new(12).unwrap()).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidComparison { .. }));
    }
}

use std::fmt;

/// Byte range within the input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span covering all of `input`.
    pub fn whole(input: &str) -> Self {
        Self::new(0, input.len())
    }
}

/// All errors produced by shelly-sched.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ScheduleError {
    InvalidWeekday {
        message: String,
    },

    InvalidOrdinal {
        ordinal: i64,
    },

    InvalidDay {
        day: i64,
    },

    InvalidDuration {
        message: String,
    },

    InvalidComparison {
        message: String,
    },

    /// The month has fewer occurrences of the weekday than requested.
    OrdinalOutOfRange {
        weekday: &'static str,
        ordinal: u8,
        year: i16,
        month: i8,
    },

    NoPriorRun,

    NaiveInstant {
        input: String,
    },

    Parse {
        message: String,
        span: Span,
        input: String,
        suggestion: Option<String>,
    },

    Calendar {
        message: String,
    },

    Config {
        message: String,
    },

    Device {
        message: String,
    },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWeekday { message } => write!(f, "invalid weekday: {message}"),
            Self::InvalidOrdinal { ordinal } => {
                write!(f, "invalid week of month {ordinal}: expected 1 through 5")
            }
            Self::InvalidDay { day } => {
                write!(f, "invalid day of month {day}: expected 1 through 31")
            }
            Self::InvalidDuration { message } => write!(f, "invalid duration: {message}"),
            Self::InvalidComparison { message } => write!(f, "invalid comparison: {message}"),
            Self::OrdinalOutOfRange {
                weekday,
                ordinal,
                year,
                month,
            } => write!(
                f,
                "{year:04}-{month:02} has fewer than {ordinal} occurrences of {weekday}"
            ),
            Self::NoPriorRun => write!(
                f,
                "duration pattern has no last run to measure from; seed last_run with the start"
            ),
            Self::NaiveInstant { input } => {
                write!(f, "instant '{input}' has no offset or time zone")
            }
            Self::Parse { message, .. } => write!(f, "{message}"),
            Self::Calendar { message } => write!(f, "{message}"),
            Self::Config { message } => write!(f, "{message}"),
            Self::Device { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ScheduleError {}

impl ScheduleError {
    pub fn invalid_weekday(message: impl Into<String>) -> Self {
        Self::InvalidWeekday {
            message: message.into(),
        }
    }

    pub fn invalid_duration(message: impl Into<String>) -> Self {
        Self::InvalidDuration {
            message: message.into(),
        }
    }

    pub fn invalid_comparison(message: impl Into<String>) -> Self {
        Self::InvalidComparison {
            message: message.into(),
        }
    }

    pub fn parse(
        message: impl Into<String>,
        span: Span,
        input: impl Into<String>,
        suggestion: Option<String>,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            span,
            input: input.into(),
            suggestion,
        }
    }

    pub fn calendar(message: impl Into<String>) -> Self {
        Self::Calendar {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn device(message: impl Into<String>) -> Self {
        Self::Device {
            message: message.into(),
        }
    }

    /// Whether a driver should log this and retry on its next cycle.
    ///
    /// Construction errors mean the trigger definition itself is wrong and
    /// will fail the same way every time.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::OrdinalOutOfRange { .. }
                | Self::NoPriorRun
                | Self::Calendar { .. }
                | Self::Device { .. }
        )
    }

    /// Format a rich error with underline and optional suggestion.
    pub fn display_rich(&self) -> String {
        match self {
            Self::Parse {
                message,
                span,
                input,
                suggestion,
            } => format_span_error("error", message, span, input, suggestion.as_deref()),
            other => format!("error: {other}"),
        }
    }
}

impl From<jiff::Error> for ScheduleError {
    fn from(e: jiff::Error) -> Self {
        Self::calendar(e.to_string())
    }
}

fn format_span_error(
    prefix: &str,
    message: &str,
    span: &Span,
    input: &str,
    suggestion: Option<&str>,
) -> String {
    let mut out = format!("{prefix}: {message}\n");
    out.push_str(&format!("  {input}\n"));
    let padding = " ".repeat(span.start + 2);
    let underline = "^".repeat((span.end - span.start).max(1));
    out.push_str(&padding);
    out.push_str(&underline);
    if let Some(sug) = suggestion {
        out.push_str(&format!(" try: \"{sug}\""));
    }
    out
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

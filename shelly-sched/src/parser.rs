// Hand-rolled recursive descent parser for pattern expressions, plus the
// text forms of times of day and instants used by trigger files and the CLI.

use jiff::civil::{Date, DateTime, Time};
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp, Zoned};

use crate::error::{ScheduleError, Span};
use crate::lexer::{Token, TokenKind};
use crate::pattern::{DayOfMonth, Pattern};
use crate::weekday::{WeekOfMonth, Weekday};

/// Parser state: consumes a slice of tokens.
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    input: &'a str,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], input: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            input,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind.clone())
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn current_span(&self) -> Span {
        if let Some(tok) = self.peek() {
            tok.span
        } else {
            self.end_span()
        }
    }

    fn end_span(&self) -> Span {
        match self.tokens.last() {
            Some(last) => Span::new(last.span.end, last.span.end),
            None => Span::new(0, 0),
        }
    }

    fn error(&self, message: String, span: Span) -> ScheduleError {
        ScheduleError::parse(message, span, self.input, None)
    }

    fn error_at_end(&self, message: String) -> ScheduleError {
        ScheduleError::parse(message, self.end_span(), self.input, None)
    }

    fn consume_kind(
        &mut self,
        expected: &str,
        check: impl Fn(&TokenKind) -> bool,
    ) -> Result<&Token, ScheduleError> {
        let span = self.current_span();
        match self.peek() {
            Some(tok) if check(&tok.kind) => {
                let idx = self.pos;
                self.pos += 1;
                Ok(&self.tokens[idx])
            }
            Some(_) => {
                let got = &self.input[span.start..span.end];
                Err(self.error(format!("expected {expected}, got '{got}'"), span))
            }
            None => Err(self.error_at_end(format!("expected {expected}"))),
        }
    }

    // --- Grammar productions ---

    // pattern = "every" every_tail | ordinal_weekday
    fn parse_pattern(&mut self) -> Result<Pattern, ScheduleError> {
        let span = self.current_span();
        match self.peek_kind() {
            Some(TokenKind::Every) => {
                self.advance();
                self.parse_every()
            }
            Some(TokenKind::Ordinal(ordinal)) => {
                self.advance();
                self.parse_ordinal_weekday(ordinal)
            }
            Some(TokenKind::OrdinalNumber(n)) => {
                let ordinal = WeekOfMonth::from_number(i64::from(n))?;
                self.advance();
                self.parse_ordinal_weekday(ordinal)
            }
            _ => Err(self.error(
                "expected 'every' or an ordinal (first, second, ...)".into(),
                span,
            )),
        }
    }

    // every_tail = "month" "on" "the" day_number | weekday | duration
    fn parse_every(&mut self) -> Result<Pattern, ScheduleError> {
        let span = self.current_span();
        match self.peek_kind() {
            None => Err(self.error_at_end(
                "expected a weekday, a duration, or 'month' after 'every'".into(),
            )),
            Some(TokenKind::Month) => {
                self.advance();
                self.parse_day_of_month()
            }
            Some(TokenKind::Ordinal(ordinal)) => Err(self.misplaced_ordinal(ordinal, span)),
            Some(TokenKind::OrdinalNumber(n)) => {
                let ordinal = WeekOfMonth::from_number(i64::from(n))?;
                Err(self.misplaced_ordinal(ordinal, span))
            }
            Some(TokenKind::Word(word)) if word.chars().all(|c| c.is_ascii_alphabetic()) => {
                let weekday = self.resolve_weekday(&word, span)?;
                self.advance();
                Ok(Pattern::by_weekday(weekday))
            }
            Some(_) => self.parse_duration(),
        }
    }

    // duration = the remaining input, in jiff's friendly or ISO 8601 format
    fn parse_duration(&mut self) -> Result<Pattern, ScheduleError> {
        let start = self.current_span().start;
        let end = self.end_span().end;
        self.pos = self.tokens.len();
        let text = &self.input[start..end];
        let period: SignedDuration = text.parse().map_err(|e| {
            self.error(
                format!("invalid duration '{text}': {e}"),
                Span::new(start, end),
            )
        })?;
        Pattern::by_duration(period)
    }

    // day_number = 1..31 with optional st/nd/rd/th
    fn parse_day_of_month(&mut self) -> Result<Pattern, ScheduleError> {
        self.consume_kind("'on'", |k| matches!(k, TokenKind::On))?;
        self.consume_kind("'the'", |k| matches!(k, TokenKind::The))?;
        let expected = "expected a day number (1st through 31st)";
        let span = self.current_span();
        let day = match self.peek_kind() {
            Some(TokenKind::Number(n) | TokenKind::OrdinalNumber(n)) => n,
            Some(_) => return Err(self.error(expected.into(), span)),
            None => return Err(self.error_at_end(expected.into())),
        };
        self.advance();
        DayOfMonth::new(i64::from(day)).map(Pattern::ByDayOfMonth)
    }

    // ordinal_weekday = ordinal weekday "of" "every" "month"
    fn parse_ordinal_weekday(&mut self, ordinal: WeekOfMonth) -> Result<Pattern, ScheduleError> {
        let span = self.current_span();
        let word = match self.peek_kind() {
            Some(TokenKind::Word(word)) => word,
            Some(_) => return Err(self.error("expected a weekday".into(), span)),
            None => return Err(self.error_at_end("expected a weekday".into())),
        };
        let weekday = self.resolve_weekday(&word, span)?;
        self.advance();
        self.consume_kind("'of'", |k| matches!(k, TokenKind::Of))?;
        self.consume_kind("'every'", |k| matches!(k, TokenKind::Every))?;
        self.consume_kind("'month'", |k| matches!(k, TokenKind::Month))?;
        Ok(Pattern::by_ordinal_weekday(weekday, ordinal))
    }

    fn resolve_weekday(&self, word: &str, span: Span) -> Result<Weekday, ScheduleError> {
        Weekday::from_name(word).map_err(|e| {
            let suggestion = weekday_suggestion(word).map(|d| format!("every {d}"));
            ScheduleError::parse(e.to_string(), span, self.input, suggestion)
        })
    }

    /// "every 2nd monday": ordinal weekdays are written without "every".
    fn misplaced_ordinal(&self, ordinal: WeekOfMonth, span: Span) -> ScheduleError {
        let weekday = match self.tokens.get(self.pos + 1).map(|t| &t.kind) {
            Some(TokenKind::Word(word)) => Weekday::from_name(word).ok(),
            _ => None,
        };
        let suggestion = weekday.map(|d| format!("{ordinal} {d} of every month"));
        ScheduleError::parse(
            "an ordinal weekday repeats monthly, not 'every'",
            span,
            self.input,
            suggestion,
        )
    }
}

/// A weekday sharing the first two letters of a misspelled name.
fn weekday_suggestion(word: &str) -> Option<Weekday> {
    let head = word.get(..2)?;
    let mut matches = Weekday::ALL.into_iter().filter(|d| d.as_str().starts_with(head));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// Parse a pattern expression string into a [`Pattern`].
pub fn parse(input: &str) -> Result<Pattern, ScheduleError> {
    let mut lexer = crate::lexer::Lexer::new(input);
    let tokens = lexer.tokenize()?;

    if tokens.is_empty() {
        return Err(ScheduleError::parse(
            "empty expression",
            Span::new(0, 0),
            input,
            None,
        ));
    }

    let mut parser = Parser::new(&tokens, input);
    let pattern = parser.parse_pattern()?;

    // Ensure all tokens consumed
    if parser.peek().is_some() {
        let span = parser.current_span();
        return Err(ScheduleError::parse(
            "unexpected tokens after expression",
            span,
            input,
            None,
        ));
    }

    Ok(pattern)
}

/// Parse a wall-clock time: `07:30`, `07:30:15`, `7:30 PM`, `12:15am`.
pub fn parse_time_of_day(input: &str) -> Result<Time, ScheduleError> {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    let (clock, afternoon) = if let Some(rest) = lower.strip_suffix("am") {
        (rest.trim_end(), Some(false))
    } else if let Some(rest) = lower.strip_suffix("pm") {
        (rest.trim_end(), Some(true))
    } else {
        (lower.as_str(), None)
    };
    let bad = |message: &str| {
        ScheduleError::parse(
            format!("{message} in time '{trimmed}'"),
            Span::whole(input),
            input,
            None,
        )
    };

    let fields: Vec<&str> = clock.split(':').collect();
    let well_formed = (2..=3).contains(&fields.len())
        && fields
            .iter()
            .all(|f| (1..=2).contains(&f.len()) && f.bytes().all(|b| b.is_ascii_digit()));
    if !well_formed {
        return Err(bad("expected HH:MM or HH:MM:SS"));
    }
    let field = |i: usize| -> Result<i8, ScheduleError> {
        match fields.get(i) {
            Some(f) => f.parse().map_err(|_| bad("invalid number")),
            None => Ok(0),
        }
    };
    let mut hour = field(0)?;
    let minute = field(1)?;
    let second = field(2)?;

    if let Some(pm) = afternoon {
        if !(1..=12).contains(&hour) {
            return Err(bad("12-hour clock hours run 1 through 12"));
        }
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, false) => h,
            (h, true) => h + 12,
        };
    }
    Time::new(hour, minute, second, 0).map_err(|e| bad(&e.to_string()))
}

/// Parse an absolute instant.
///
/// RFC 9557 text keeps its bracketed zone; RFC 3339 text with an offset is
/// placed in `zone`. Text without offset or zone is a `NaiveInstant` error.
pub fn parse_instant(input: &str, zone: &TimeZone) -> Result<Zoned, ScheduleError> {
    let text = input.trim();
    if let Ok(zoned) = text.parse::<Zoned>() {
        return Ok(zoned);
    }
    if let Ok(timestamp) = text.parse::<Timestamp>() {
        return Ok(timestamp.to_zoned(zone.clone()));
    }
    if text.parse::<DateTime>().is_ok() || text.parse::<Date>().is_ok() {
        return Err(ScheduleError::NaiveInstant {
            input: text.to_string(),
        });
    }
    Err(ScheduleError::parse(
        format!("invalid instant '{text}': expected RFC 3339 or RFC 9557 text"),
        Span::whole(input),
        input,
        None,
    ))
}

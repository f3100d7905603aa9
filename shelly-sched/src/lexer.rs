use crate::error::{ScheduleError, Span};
use crate::weekday::WeekOfMonth;

/// Token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Every,
    Of,
    Month,
    On,
    The,

    // Ordinals
    Ordinal(WeekOfMonth), // "first" .. "fifth"

    // Literals
    Number(u32),
    OrdinalNumber(u32), // 1st, 2nd, 3rd, 31st: the number part

    /// Anything else, lowercased: a weekday prefix or a duration fragment.
    Word(String),
}

/// Splits a pattern expression on whitespace.
///
/// Words are classified but not resolved: whether `tu` is a weekday or
/// `1h` a duration is decided by the parser from context.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, ScheduleError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            if self.pos >= self.bytes.len() {
                break;
            }
            let start = self.pos;
            while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            let span = Span::new(start, self.pos);
            let kind = self.classify(&self.input[start..self.pos], span)?;
            tokens.push(Token { kind, span });
        }
        Ok(tokens)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn classify(&self, raw: &str, span: Span) -> Result<TokenKind, ScheduleError> {
        let word = raw.to_lowercase();
        let kind = match word.as_str() {
            "every" => TokenKind::Every,
            "of" => TokenKind::Of,
            "month" => TokenKind::Month,
            "on" => TokenKind::On,
            "the" => TokenKind::The,

            "first" => TokenKind::Ordinal(WeekOfMonth::First),
            "second" => TokenKind::Ordinal(WeekOfMonth::Second),
            "third" => TokenKind::Ordinal(WeekOfMonth::Third),
            "fourth" => TokenKind::Ordinal(WeekOfMonth::Fourth),
            "fifth" => TokenKind::Ordinal(WeekOfMonth::Fifth),

            _ => {
                let digits_end = word
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(word.len());
                let (digits, rest) = word.split_at(digits_end);
                if digits.is_empty() || !matches!(rest, "" | "st" | "nd" | "rd" | "th") {
                    return Ok(TokenKind::Word(word));
                }
                let num: u32 = digits.parse().map_err(|_| {
                    ScheduleError::parse("number is too large", span, self.input, None)
                })?;
                if rest.is_empty() {
                    TokenKind::Number(num)
                } else {
                    TokenKind::OrdinalNumber(num)
                }
            }
        };
        Ok(kind)
    }
}

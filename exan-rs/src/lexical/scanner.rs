//! The scanner: line loop, maximal munch over the DFA, token disambiguation.

use std::str::FromStr;
use std::sync::LazyLock;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use tracing::debug;

use super::dfa::{self, EndStateCode};
use super::Script;
use crate::error::{Error, Result};
use crate::pool::ValuePool;
use crate::syntax::function::FunctionRegistry;
use crate::token::{Delimiter, Keyword, Position, Token, TokenKind};
use crate::value::Value;

const COMMENT: &str = "##";

const DATE_HINT: &str = "wrong date format, please input as [yyyy-MM-dd] or [yyyy-MM-dd HH:mm:ss]";

static DATE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{4})-(\d{2})-(\d{2})(?: (\d{2}):(\d{2}):(\d{2}))?\]$").ok()
});

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}

/// Turns source text into tokens, classifying identifiers against the
/// caller's functions first and the built-ins second.
pub struct Scanner<'a> {
    functions: &'a FunctionRegistry,
    builtins: &'a FunctionRegistry,
    pool: ValuePool,
    tokens: Vec<Token>,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(functions: &'a FunctionRegistry, builtins: &'a FunctionRegistry) -> Self {
        Scanner {
            functions,
            builtins,
            pool: ValuePool::new(),
            tokens: Vec::new(),
            line: 1,
        }
    }

    pub fn scan(mut self, text: &str) -> Result<Script> {
        if text.trim().is_empty() {
            return Err(self.error(1, "empty expression"));
        }
        for (i, raw) in text.lines().enumerate() {
            self.line = i + 1;
            let code = match raw.find(COMMENT) {
                Some(at) => &raw[..at],
                None => raw,
            };
            let chars: Vec<char> = code.chars().collect();
            self.scan_line(&chars)?;
        }
        debug!(tokens = self.tokens.len(), constants = self.pool.len(), "scan complete");
        Ok(Script {
            tokens: self.tokens,
            pool: self.pool,
        })
    }

    fn scan_line(&mut self, chars: &[char]) -> Result<()> {
        let mut col = 0;
        loop {
            while chars.get(col).copied().is_some_and(is_blank) {
                col += 1;
            }
            if col >= chars.len() {
                return Ok(());
            }

            let start = col;
            let mut id = dfa::START;
            let code = loop {
                let st = dfa::state(id);
                match chars.get(col) {
                    Some(&c) => {
                        if let Some(next) = st.next_state(c) {
                            id = next;
                            col += 1;
                            continue;
                        }
                        match st.end_before(c) {
                            Some(code) => break code,
                            None if col == start => {
                                return Err(self.error(col + 1, format!("unexpected character '{c}'")));
                            }
                            None => {
                                return Err(self.error(
                                    col + 1,
                                    format!("unexpected character '{c}' in {}", st.reading),
                                ));
                            }
                        }
                    }
                    None => match st.end_at_line_end() {
                        Some(code) => break code,
                        None => {
                            return Err(self.error(
                                col + 1,
                                format!("unexpected end of line in {}", st.reading),
                            ));
                        }
                    },
                }
            };

            let word: String = chars[start..col].iter().collect();
            col = self.finish(code, word, start, col)?;
        }
    }

    /// Emit the token for `word`, returning the column to resume at.
    fn finish(&mut self, code: EndStateCode, word: String, start: usize, end: usize) -> Result<usize> {
        let pos = Position::new(self.line, start + 1);
        let kind = match code {
            EndStateCode::Number => {
                let n = BigDecimal::from_str(&word)
                    .map_err(|_| self.error(pos.column, format!("invalid number '{word}'")))?;
                self.constant(Value::Number(n))
            }
            EndStateCode::Id => self.classify(&word),
            EndStateCode::SingleDelimiter => match Delimiter::single(&word) {
                Some(d) => TokenKind::Delimiter(d),
                None => return Err(self.error(pos.column, format!("invalid delimiter '{word}'"))),
            },
            EndStateCode::DoubleDelimiter => {
                if let Some(d) = Delimiter::double(&word) {
                    TokenKind::Delimiter(d)
                } else {
                    let first: String = word.chars().take(1).collect();
                    match Delimiter::single(&first) {
                        Some(d) => {
                            self.push(Token::new(TokenKind::Delimiter(d), first, pos));
                            return Ok(end - 1);
                        }
                        None => {
                            return Err(self.error(pos.column, format!("invalid delimiter '{word}'")))
                        }
                    }
                }
            }
            EndStateCode::Date => {
                let date = parse_date(&word).ok_or_else(|| self.error(pos.column, DATE_HINT))?;
                self.constant(Value::Date(date))
            }
            EndStateCode::Char => {
                let inner: Vec<char> = word.chars().skip(1).take(word.chars().count() - 2).collect();
                let c = match inner.as_slice() {
                    [c] => *c,
                    ['\\', e] => unescape(*e).ok_or_else(|| {
                        self.error(pos.column, format!("unknown escape sequence '\\{e}'"))
                    })?,
                    _ => return Err(self.error(pos.column, format!("malformed character literal {word}"))),
                };
                self.constant(Value::Character(c))
            }
            EndStateCode::String => {
                let inner = &word[1..word.len() - 1];
                let s = unescape_str(inner).map_err(|e| {
                    self.error(pos.column, format!("unknown escape sequence '\\{e}'"))
                })?;
                self.constant(Value::String(s))
            }
        };
        self.push(Token::new(kind, word, pos));
        Ok(end)
    }

    fn classify(&mut self, word: &str) -> TokenKind {
        match word {
            "true" | "TRUE" => return self.constant(Value::Boolean(true)),
            "false" | "FALSE" => return self.constant(Value::Boolean(false)),
            _ => {}
        }
        if let Some(k) = Keyword::from_text(word) {
            return TokenKind::Keyword(k);
        }
        match self.functions.get(word).or_else(|| self.builtins.get(word)) {
            Some(func) => TokenKind::Function(func.clone()),
            None => TokenKind::Variable {
                to_be_assigned: false,
            },
        }
    }

    fn constant(&mut self, value: Value) -> TokenKind {
        let data_type = value.data_type();
        let index = self.pool.intern(value);
        TokenKind::Constant { data_type, index }
    }

    /// Append a token, marking a variable followed by `=` as an assignment
    /// target.
    fn push(&mut self, token: Token) {
        let assigns = token.delimiter() == Some(Delimiter::Assign);
        self.tokens.push(token);
        if !assigns {
            return;
        }
        if let [.., prev, _] = self.tokens.as_mut_slice() {
            if let TokenKind::Variable { to_be_assigned } = &mut prev.kind {
                *to_be_assigned = true;
            }
        }
    }

    fn error(&self, column: usize, message: impl Into<String>) -> Error {
        Error::Lexical {
            line: self.line,
            column,
            message: message.into(),
        }
    }
}

// ── Literal decoding ──────────────────────────────────────────────────────────

fn unescape(e: char) -> Option<char> {
    Some(match e {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'b' => '\u{8}',
        'f' => '\u{c}',
        '0' => '\0',
        '\\' => '\\',
        '\'' => '\'',
        '"' => '"',
        _ => return None,
    })
}

/// Decode the escapes in a string literal body.  On failure returns the
/// offending escape character.
fn unescape_str(body: &str) -> std::result::Result<String, char> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        // The DFA never ends a string on a lone backslash.
        let e = chars.next().unwrap_or('\\');
        out.push(unescape(e).ok_or(e)?);
    }
    Ok(out)
}

/// Parse `[yyyy-MM-dd]` or `[yyyy-MM-dd HH:mm:ss]`.
pub(crate) fn parse_date(word: &str) -> Option<NaiveDateTime> {
    let caps = DATE_PATTERN.as_ref()?.captures(word)?;
    let field = |i: usize| -> Option<u32> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?.and_hms_opt(field(4)?, field(5)?, field(6)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

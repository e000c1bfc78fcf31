//! Table-driven DFA for the scanner.
//!
//! Each mid-state lists its outgoing transitions in priority order and, at
//! most, one end route.  The scanner follows transitions as long as one
//! matches the next character (maximal munch).  When none matches, the end
//! route decides whether the token stops here, leaving that character for
//! the next token.  A state with neither is a lexical error.

use crate::token::DELIMITER_CHARS;

/// Category of a finished token, used by the scanner to disambiguate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndStateCode {
    Number,
    Id,
    SingleDelimiter,
    DoubleDelimiter,
    Date,
    Char,
    String,
}

/// A set of characters a transition or end route is keyed on.
#[derive(Debug, Clone, Copy)]
pub enum CharClass {
    Exact(char),
    Digit,
    IdentStart,
    IdentPart,
    Delimiter,
    /// Anything that cannot continue a number or identifier.
    Boundary,
    Any,
    AnyExcept(char),
}

impl CharClass {
    pub fn contains(self, c: char) -> bool {
        match self {
            CharClass::Exact(x) => c == x,
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::IdentStart => c.is_ascii_alphabetic() || c == '_',
            CharClass::IdentPart => c.is_ascii_alphanumeric() || c == '_',
            CharClass::Delimiter => DELIMITER_CHARS.contains(&c),
            CharClass::Boundary => !(c.is_ascii_alphanumeric() || c == '_' || c == '.'),
            CharClass::Any => true,
            CharClass::AnyExcept(x) => c != x,
        }
    }
}

pub type StateId = usize;

/// How a mid-state may finish its token without consuming more input.
#[derive(Debug, Clone, Copy)]
pub struct EndRoute {
    pub code: EndStateCode,
    /// Characters on which the token stops.  End of line always stops.
    pub on: CharClass,
}

#[derive(Debug)]
pub struct MidState {
    /// What the state is in the middle of, used in error messages.
    pub reading: &'static str,
    pub transitions: &'static [(CharClass, StateId)],
    pub end: Option<EndRoute>,
}

impl MidState {
    pub fn next_state(&self, c: char) -> Option<StateId> {
        self.transitions
            .iter()
            .find(|(class, _)| class.contains(c))
            .map(|&(_, to)| to)
    }

    /// End code for stopping in front of `c`.
    pub fn end_before(&self, c: char) -> Option<EndStateCode> {
        self.end.filter(|route| route.on.contains(c)).map(|route| route.code)
    }

    /// End code for stopping at the end of the line.
    pub fn end_at_line_end(&self) -> Option<EndStateCode> {
        self.end.map(|route| route.code)
    }
}

// ── State table ───────────────────────────────────────────────────────────────

pub const START: StateId = 0;
const INT: StateId = 1;
const DOT: StateId = 2;
const FRAC: StateId = 3;
const ID: StateId = 4;
const DELIM1: StateId = 5;
const DELIM2: StateId = 6;
const DATE_BODY: StateId = 7;
const DATE_CLOSE: StateId = 8;
const CHAR_OPEN: StateId = 9;
const CHAR_ESC: StateId = 10;
const CHAR_BODY: StateId = 11;
const CHAR_CLOSE: StateId = 12;
const STR_BODY: StateId = 13;
const STR_ESC: StateId = 14;
const STR_CLOSE: StateId = 15;

const fn end(code: EndStateCode, on: CharClass) -> Option<EndRoute> {
    Some(EndRoute { code, on })
}

static STATES: [MidState; 16] = [
    MidState {
        reading: "input",
        transitions: &[
            (CharClass::Digit, INT),
            (CharClass::IdentStart, ID),
            (CharClass::Delimiter, DELIM1),
            (CharClass::Exact('['), DATE_BODY),
            (CharClass::Exact('\''), CHAR_OPEN),
            (CharClass::Exact('"'), STR_BODY),
        ],
        end: None,
    },
    MidState {
        reading: "number",
        transitions: &[(CharClass::Digit, INT), (CharClass::Exact('.'), DOT)],
        end: end(EndStateCode::Number, CharClass::Boundary),
    },
    MidState {
        reading: "number",
        transitions: &[(CharClass::Digit, FRAC)],
        end: None,
    },
    MidState {
        reading: "number",
        transitions: &[(CharClass::Digit, FRAC)],
        end: end(EndStateCode::Number, CharClass::Boundary),
    },
    MidState {
        reading: "identifier",
        transitions: &[(CharClass::IdentPart, ID)],
        end: end(EndStateCode::Id, CharClass::Any),
    },
    MidState {
        reading: "delimiter",
        transitions: &[(CharClass::Delimiter, DELIM2)],
        end: end(EndStateCode::SingleDelimiter, CharClass::Any),
    },
    MidState {
        reading: "delimiter",
        transitions: &[],
        end: end(EndStateCode::DoubleDelimiter, CharClass::Any),
    },
    MidState {
        reading: "date literal",
        transitions: &[
            (CharClass::Exact(']'), DATE_CLOSE),
            (CharClass::AnyExcept(']'), DATE_BODY),
        ],
        end: None,
    },
    MidState {
        reading: "date literal",
        transitions: &[],
        end: end(EndStateCode::Date, CharClass::Any),
    },
    MidState {
        reading: "character literal",
        transitions: &[
            (CharClass::Exact('\\'), CHAR_ESC),
            (CharClass::AnyExcept('\''), CHAR_BODY),
        ],
        end: None,
    },
    MidState {
        reading: "character literal",
        transitions: &[(CharClass::Any, CHAR_BODY)],
        end: None,
    },
    MidState {
        reading: "character literal",
        transitions: &[(CharClass::Exact('\''), CHAR_CLOSE)],
        end: None,
    },
    MidState {
        reading: "character literal",
        transitions: &[],
        end: end(EndStateCode::Char, CharClass::Any),
    },
    MidState {
        reading: "string literal",
        transitions: &[
            (CharClass::Exact('"'), STR_CLOSE),
            (CharClass::Exact('\\'), STR_ESC),
            (CharClass::Any, STR_BODY),
        ],
        end: None,
    },
    MidState {
        reading: "string literal",
        transitions: &[(CharClass::Any, STR_BODY)],
        end: None,
    },
    MidState {
        reading: "string literal",
        transitions: &[],
        end: end(EndStateCode::String, CharClass::Any),
    },
];

/// Look up a mid-state by id.  Ids come only from the table itself.
pub fn state(id: StateId) -> &'static MidState {
    &STATES[id]
}

// ── Tests ─────────────────────────────────────────────────────────────────────

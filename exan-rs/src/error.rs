//! Error taxonomy.
//!
//! Every failure aborts the evaluation of the whole script; nothing is
//! recovered or retried.  All variants carry enough position information to
//! point at the offending source text.

use std::fmt;

use crate::token::Position;
use crate::value::DataType;

/// Text and position of the token an error refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl TokenInfo {
    pub fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

impl fmt::Display for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' at line {}, column {}", self.text, self.line, self.column)
    }
}

fn located(token: &Option<TokenInfo>) -> String {
    match token {
        Some(t) => format!(" ({t})"),
        None => String::new(),
    }
}

fn type_list(types: &[DataType]) -> String {
    types.iter().map(|t| t.name()).collect::<Vec<_>>().join(",")
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed token, unknown delimiter, bad literal.
    #[error("lexical error at line {line}, column {column}: {message}")]
    Lexical {
        line: usize,
        column: usize,
        message: String,
    },

    /// No matching production, unmatched terminal, unterminated sentence.
    #[error("syntax error: {message}{}", located(.token))]
    Syntax {
        message: String,
        token: Option<TokenInfo>,
    },

    /// Wrong arity or argument types for an operator or function.
    #[error("arguments ({}) do not match {signature}{}", type_list(.args), located(.token))]
    ArgumentsMismatch {
        args: Vec<DataType>,
        signature: String,
        token: Option<TokenInfo>,
    },

    /// A variable was read before anything assigned it.
    #[error("variable '{name}' is not initialized (line {line}, column {column})")]
    VariableNotInitialized {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("arithmetic error: {message} at line {line}, column {column}")]
    Arithmetic {
        message: String,
        line: usize,
        column: usize,
    },

    /// A value of the wrong type where a specific type is required, such as
    /// a non-boolean `if` condition.
    #[error("type mismatch: cannot convert from {found} to {expected}{}", located(.token))]
    TypeMismatch {
        expected: DataType,
        found: DataType,
        token: Option<TokenInfo>,
    },

    /// A function accepted its arguments but its body reported a failure.
    #[error("function {function} failed: {message}{}", located(.token))]
    FunctionFailed {
        function: String,
        message: String,
        token: Option<TokenInfo>,
    },

    /// A working stack or the context chain grew past the configured limit.
    #[error("{resource} exceeded the limit of {limit}")]
    ResourceExhausted { resource: &'static str, limit: usize },

    /// An error raised while a conditional branch was open.
    #[error("{source} (in conditional branch opened at line {line}, column {column})")]
    InBranch {
        line: usize,
        column: usize,
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn syntax(message: impl Into<String>, token: Option<TokenInfo>) -> Self {
        Error::Syntax {
            message: message.into(),
            token,
        }
    }

    /// The underlying error with any branch wrappers removed.
    pub fn innermost(&self) -> &Error {
        let mut err = self;
        while let Error::InBranch { source, .. } = err {
            err = source;
        }
        err
    }

    /// Source position the error points at, if it has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Lexical { line, column, .. }
            | Error::VariableNotInitialized { line, column, .. }
            | Error::Arithmetic { line, column, .. } => Some(Position::new(*line, *column)),
            Error::Syntax { token, .. }
            | Error::ArgumentsMismatch { token, .. }
            | Error::TypeMismatch { token, .. }
            | Error::FunctionFailed { token, .. } => token.as_ref().map(TokenInfo::pos),
            Error::ResourceExhausted { .. } => None,
            Error::InBranch { source, .. } => source.position(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn info(text: &str, line: usize, column: usize) -> TokenInfo {
        TokenInfo {
            text: text.into(),
            line,
            column,
        }
    }

    #[test]
    fn mismatch_message_names_signature() {
        let e = Error::ArgumentsMismatch {
            args: vec![DataType::Number, DataType::String],
            signature: "max(NUMBER,NUMBER)".into(),
            token: Some(info("max", 1, 1)),
        };
        assert_eq!(
            e.to_string(),
            "arguments (NUMBER,STRING) do not match max(NUMBER,NUMBER) ('max' at line 1, column 1)"
        );
    }

    #[test]
    fn syntax_message_names_token() {
        let e = Error::Syntax {
            message: "no production for '*'".into(),
            token: Some(info("*", 2, 8)),
        };
        assert_eq!(e.to_string(), "syntax error: no production for '*' ('*' at line 2, column 8)");
        let e = Error::Syntax {
            message: "unterminated sentence".into(),
            token: None,
        };
        assert_eq!(e.to_string(), "syntax error: unterminated sentence");
    }

    #[test]
    fn innermost_peels_branches() {
        let inner = Error::Arithmetic {
            message: "division by zero".into(),
            line: 3,
            column: 7,
        };
        let wrapped = Error::InBranch {
            line: 2,
            column: 1,
            source: Box::new(Error::InBranch {
                line: 3,
                column: 1,
                source: Box::new(inner),
            }),
        };
        assert!(matches!(wrapped.innermost(), Error::Arithmetic { .. }));
        assert_eq!(wrapped.position(), Some(Position::new(3, 7)));
        assert!(wrapped.to_string().starts_with("arithmetic error: division by zero"));
    }

    #[test]
    fn resource_has_no_position() {
        let e = Error::ResourceExhausted {
            resource: "syntax stack",
            limit: 8,
        };
        assert_eq!(e.position(), None);
        assert_eq!(e.to_string(), "syntax stack exceeded the limit of 8");
    }
}

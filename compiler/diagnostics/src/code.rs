use std::fmt;

/// An error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[forbid(missing_docs)]
pub enum ErrorCode {
    /// _Permanently unassigned_ (used in tests).
    E000,
    /// Unterminated block comment.
    E001,
    /// Unterminated string literal.
    E002,
    /// Unterminated or malformed character literal.
    E003,
    /// Invalid escape sequence.
    E004,
    /// Unreadable number literal.
    E005,
    /// Identifier exceeding the maximum length.
    E006,
    /// Invalid character.
    E007,
    /// Unexpected token.
    E010,
    /// Structurally valid but meaningless declaration.
    E011,
    /// Too many syntax errors.
    E012,
    /// Conflicting attributes.
    E013,
    /// Undefined identifier.
    E020,
    /// Ambiguous identifier.
    E021,
    /// Template parameter deduction failure.
    E022,
    /// Resolution recursion limit reached.
    E023,
    /// Unable to read source file.
    E030,
}

impl ErrorCode {
    /// A longer explanation of the error, if available.
    pub const fn explanation(self) -> Option<&'static str> {
        Some(match self {
            Self::E004 => {
                "Valid escape sequences are \\' \\\" \\? \\\\ \\0 \\a \\b \\f \\n \\r \\t \\v, \
                 octal escapes of up to three digits, \\x followed by two hexadecimal digits, \
                 \\u followed by four, \\U followed by eight, and named character entities \
                 like \\&amp;."
            }
            Self::E010 => {
                "The parser encountered a token that cannot appear at this position. \
                 Parsing continues with the following token."
            }
            Self::E012 => {
                "After a fixed amount of syntax errors the lexer stops producing tokens \
                 which ends parsing. The amount can be raised with --error-cap."
            }
            Self::E023 => {
                "A symbol refers to itself through its own type or base class, \
                 directly or indirectly. Resolution of the cycle stops after a fixed depth."
            }
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::ELEMENTS
            .into_iter()
            .find(|code| code.to_string() == source)
            .ok_or(())
    }
}

impl ErrorCode {
    pub const ELEMENTS: [Self; 17] = [
        Self::E000,
        Self::E001,
        Self::E002,
        Self::E003,
        Self::E004,
        Self::E005,
        Self::E006,
        Self::E007,
        Self::E010,
        Self::E011,
        Self::E012,
        Self::E013,
        Self::E020,
        Self::E021,
        Self::E022,
        Self::E023,
        Self::E030,
    ];
}

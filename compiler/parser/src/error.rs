use diagnostics::{Diagnostic, ErrorCode};
use lexer::token::TokenKind;
use span::{Location, Span, Spanning};
use std::fmt;
use utility::{Conjunction, ListingExt};

/// A problem found while parsing.
///
/// Errors are collected, parsing always continues after recording one.
#[derive(Clone, PartialEq, Debug)]
pub struct Error {
    pub bare: BareError,
    /// The kind of the token the problem was found at.
    pub token: TokenKind,
    pub span: Span,
}

impl Error {
    pub(crate) fn new(bare: BareError, token: TokenKind, span: Span) -> Self {
        Self { bare, token, span }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.bare {
            BareError::MissingStatic(_)
            | BareError::ConflictingVisibility { .. }
            | BareError::MisplacedModuleDeclaration => ErrorKind::Semantic,
            _ => ErrorKind::Syntax,
        }
    }

    pub fn is_semantic(&self) -> bool {
        self.kind() == ErrorKind::Semantic
    }

    pub fn location(&self) -> Location {
        self.span.start
    }

    pub fn message(&self) -> String {
        use BareError::*;

        match &self.bare {
            Lexical(error) => error.describe().1.into_owned(),
            Unexpected { expected } => format!("found {} but expected {expected}", self.token),
            MissingStatic(keyword) => {
                format!("declaration-level ‘{}’ requires a preceding ‘static’", keyword.text())
            }
            ConflictingVisibility { previous, current } => format!(
                "visibility ‘{}’ conflicts with the preceding ‘{}’",
                current.text(),
                previous.text()
            ),
            MisplacedModuleDeclaration => {
                "the module declaration has to come first in the file".into()
            }
            TooManyErrors { cap } => format!("too many errors, parsing stopped after {cap}"),
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        use BareError::*;

        let message = self.message();

        match self.bare {
            Lexical(error) => lexer::Error { bare: error, span: self.span }.into_diagnostic(),
            Unexpected { .. } => Diagnostic::error()
                .code(ErrorCode::E010)
                .message(message)
                .span(self.span, "unexpected token"),
            MissingStatic(_) | MisplacedModuleDeclaration => Diagnostic::error()
                .code(ErrorCode::E011)
                .message(message)
                .unlabeled_span(self.span),
            ConflictingVisibility { .. } => Diagnostic::error()
                .code(ErrorCode::E013)
                .message(message)
                .span(self.span, "conflicting attribute"),
            TooManyErrors { .. } => Diagnostic::error()
                .code(ErrorCode::E012)
                .message(message)
                .unlabeled_span(self.span),
        }
    }
}

impl Spanning for Error {
    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// A malformed token sequence.
    Syntax,
    /// A well-formed but meaningless construct.
    Semantic,
}

#[derive(Clone, PartialEq, Debug)]
pub enum BareError {
    Lexical(lexer::BareError),
    Unexpected { expected: Expected },
    /// `if` or `assert` at declaration level.
    MissingStatic(TokenKind),
    ConflictingVisibility { previous: TokenKind, current: TokenKind },
    MisplacedModuleDeclaration,
    /// The terminal marker appended once the error cap is reached.
    TooManyErrors { cap: usize },
}

/// What the parser was looking for when it found something else.
#[derive(Clone, PartialEq, Debug)]
pub enum Expected {
    Token(TokenKind),
    Category(&'static str),
    OneOf(Vec<Self>),
}

impl Expected {
    pub(crate) fn or(self, other: impl Into<Self>) -> Self {
        let other = other.into();
        match self {
            Self::OneOf(mut expected) => {
                expected.push(other);
                Self::OneOf(expected)
            }
            expected => Self::OneOf(vec![expected, other]),
        }
    }
}

impl From<TokenKind> for Expected {
    fn from(kind: TokenKind) -> Self {
        Self::Token(kind)
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(kind) => write!(f, "{kind}"),
            Self::Category(name) => f.write_str(name),
            Self::OneOf(expected) => write!(f, "{}", expected.iter().list(Conjunction::Or)),
        }
    }
}

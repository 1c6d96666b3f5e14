//! The diagnostics system.
//!
//! Every pass records its problems as plain data and turns them into [`Diagnostic`]s
//! right before they are shown to the user. Diagnostics of severity [`Severity::Debug`]
//! double as the trace output of the front end.

use span::{SourceFileIndex, Span, Spanning};
use std::{
    collections::BTreeSet,
    ops::Deref,
    path::PathBuf,
};
use utility::Str;

pub use code::ErrorCode;
pub use reporter::{ErasedReportedError, Reporter};

mod code;
mod render;

pub mod error;
pub mod reporter;

#[cfg(test)]
mod test;

/// A complex diagnostic message, optionally with source locations.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug)]
#[must_use]
pub struct Diagnostic(Box<UnboxedDiagnostic>);

impl Diagnostic {
    fn new(severity: Severity) -> Self {
        Self(Box::new(UnboxedDiagnostic::new(severity)))
    }

    /// Create a diagnostic for an internal error of the front end.
    pub fn bug() -> Self {
        Self::new(Severity::Bug)
    }

    /// Create a diagnostic for a user error.
    pub fn error() -> Self {
        Self::new(Severity::Error)
    }

    /// Create a diagnostic for a warning.
    pub fn warning() -> Self {
        Self::new(Severity::Warning)
    }

    /// Create a diagnostic for an internal debugging message.
    pub fn debug() -> Self {
        Self::new(Severity::Debug)
    }

    pub fn code(mut self, code: ErrorCode) -> Self {
        self.0.code = Some(code);
        self
    }

    /// Add a text message describing the issue.
    ///
    /// # Guidelines
    ///
    /// * The message should not contain any line breaks
    /// * The message should not start with an upper case letter
    /// * The message should not end in a punctuation mark
    /// * Surround source code snippets with (directional) single quotation marks
    pub fn message(mut self, message: impl Into<Str>) -> Self {
        self.0.message = Some(message.into());
        self
    }

    /// Set the file the highlighted spans refer to.
    pub fn file(mut self, file: SourceFileIndex) -> Self {
        self.0.file = Some(file);
        self
    }

    fn highlight(mut self, spanning: impl Spanning, label: Option<Str>, role: Role) -> Self {
        self.0.highlights.insert(Highlight { span: spanning.span(), label, role });
        self
    }

    /// Reference and label a code snippet as one of the focal points of the diagnostic.
    pub fn span(self, spanning: impl Spanning, label: impl Into<Str>) -> Self {
        self.highlight(spanning, Some(label.into()), Role::Primary)
    }

    /// Reference a code snippet as one of the focal points of the diagnostic.
    pub fn unlabeled_span(self, spanning: impl Spanning) -> Self {
        self.highlight(spanning, None, Role::Primary)
    }

    /// Reference and label a code snippet as auxiliary information for the diagnostic.
    pub fn label(self, spanning: impl Spanning, label: impl Into<Str>) -> Self {
        self.highlight(spanning, Some(label.into()), Role::Secondary)
    }

    fn subdiagnostic(mut self, severity: Subseverity, message: Str) -> Self {
        self.0.subdiagnostics.push(Subdiagnostic { severity, message });
        self
    }

    /// Add further clarifying information.
    pub fn note(self, message: impl Into<Str>) -> Self {
        self.subdiagnostic(Subseverity::Note, message.into())
    }

    /// Add steps or tips to solve the diagnosed issue.
    pub fn help(self, message: impl Into<Str>) -> Self {
        self.subdiagnostic(Subseverity::Help, message.into())
    }

    /// Reference a path in the diagnostic.
    ///
    /// Useful if the path does not point to a file registered in the source map,
    /// e.g. a module that could not be opened.
    pub fn path(mut self, path: PathBuf) -> Self {
        self.0.path = Some(path);
        self
    }

    pub fn with(self, builder: impl FnOnce(Self) -> Self) -> Self {
        builder(self)
    }

    /// Report the diagnostic.
    pub fn report(self, reporter: &Reporter) -> ErasedReportedError {
        reporter.report(self.0)
    }
}

impl Deref for Diagnostic {
    type Target = UnboxedDiagnostic;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Highlights come before the message so that buffered diagnostics end up in source order.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct UnboxedDiagnostic {
    pub file: Option<SourceFileIndex>,
    pub path: Option<PathBuf>,
    pub highlights: BTreeSet<Highlight>,
    pub subdiagnostics: Vec<Subdiagnostic>,
    pub code: Option<ErrorCode>,
    pub message: Option<Str>,
    pub severity: Severity,
}

impl UnboxedDiagnostic {
    fn new(severity: Severity) -> Self {
        Self {
            file: None,
            path: None,
            highlights: BTreeSet::new(),
            subdiagnostics: Vec::new(),
            code: None,
            message: None,
            severity,
        }
    }

    /// The location of the first focal point.
    pub fn location(&self) -> Option<span::Location> {
        self.highlights
            .iter()
            .find(|highlight| highlight.role == Role::Primary)
            .map(|highlight| highlight.span.start)
    }
}

/// A highlighted code snippet.
#[derive(PartialEq, Eq, Debug, Clone, PartialOrd, Ord)]
pub struct Highlight {
    pub span: Span,
    pub role: Role,
    pub label: Option<Str>,
}

/// The role of a highlighted code snippet: focal point or auxiliary note.
#[derive(PartialEq, Eq, Debug, Clone, Copy, PartialOrd, Ord)]
pub enum Role {
    /// A focal point of the diagnostic.
    Primary,
    /// An auxiliary note of the diagnostic.
    Secondary,
}

/// Part of a [complex error message](Diagnostic) providing extra text messages.
#[derive(PartialEq, Eq, Clone, PartialOrd, Ord, Debug)]
pub struct Subdiagnostic {
    pub severity: Subseverity,
    pub message: Str,
}

/// Level of severity of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub enum Severity {
    /// An internal error of the front end.
    Bug,
    /// A user error.
    Error,
    Warning,
    Debug,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub enum Subseverity {
    /// An auxiliary note.
    Note,
    /// A message containing steps to solve an issue.
    Help,
}

impl Subseverity {
    const fn name(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Help => "help",
        }
    }
}

use diagnostics::{Diagnostic, ErrorCode};
use span::Span;
use std::{fmt, io};
use unicode_width::UnicodeWidthStr;
use utility::{
    paint::{paint_to_string, ColorChoice, Effects, Painter},
    Conjunction, ListingExt, QuoteExt,
};

/// A failure of resolution.
///
/// Errors are recorded in the context and never abort the resolution of sibling branches.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ResolutionError {
    NotFound { name: String, span: Span, suggestion: Option<String> },
    Ambiguous { name: String, span: Span, candidates: Vec<String> },
    DeductionFailed { template: String, span: Span, reason: String },
    RecursionLimit { name: String, span: Span, bound: u32 },
}

impl ResolutionError {
    pub fn span(&self) -> Span {
        match self {
            Self::NotFound { span, .. }
            | Self::Ambiguous { span, .. }
            | Self::DeductionFailed { span, .. }
            | Self::RecursionLimit { span, .. } => *span,
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        match self {
            Self::NotFound { name, span, suggestion } => Diagnostic::error()
                .code(ErrorCode::E020)
                .message(format!("the identifier {} is not defined in this scope", (&name).quote()))
                .unlabeled_span(span)
                .with(|error| match suggestion {
                    Some(lookalike) => error.help(format!(
                        "a declaration with a similar name exists in scope: {}",
                        Lookalike { actual: &name, lookalike: &lookalike },
                    )),
                    None => error,
                }),
            Self::Ambiguous { name, span, candidates } => Diagnostic::error()
                .code(ErrorCode::E021)
                .message(format!("the identifier {} is ambiguous", name.quote()))
                .unlabeled_span(span)
                .note(format!(
                    "it could refer to {}",
                    candidates.iter().map(QuoteExt::quote).list(Conjunction::Or)
                )),
            Self::DeductionFailed { template, span, reason } => Diagnostic::error()
                .code(ErrorCode::E022)
                .message(format!("could not deduce the template arguments of {}", template.quote()))
                .span(span, reason),
            Self::RecursionLimit { name, span, bound } => Diagnostic::error()
                .code(ErrorCode::E023)
                .message(format!("the resolution of {} exceeds the recursion limit", name.quote()))
                .unlabeled_span(span)
                .note(format!("the limit is {bound}")),
        }
    }
}

pub(crate) fn is_similar(identifier: &str, other_identifier: &str) -> bool {
    strsim::levenshtein(other_identifier, identifier) <= std::cmp::max(identifier.len(), 3) / 3
}

struct Lookalike<'a> {
    actual: &'a str,
    lookalike: &'a str,
}

impl Lookalike<'_> {
    fn render(&self, painter: &mut Painter) -> io::Result<()> {
        use difference::{Changeset, Difference};
        use std::io::Write;

        let changeset = Changeset::new(self.actual, self.lookalike, "");
        let mut purely_additive = true;

        write!(painter, "‘")?;

        for difference in &changeset.diffs {
            match difference {
                Difference::Same(segment) => write!(painter, "{segment}")?,
                Difference::Add(segment) => {
                    painter.set(Effects::BOLD)?;
                    write!(painter, "{segment}")?;
                    painter.unset()?;
                }
                Difference::Rem(_) => purely_additive = false,
            }
        }

        write!(painter, "’")?;

        if !(purely_additive || self.actual.width() == 1 && changeset.distance == 2) {
            write!(painter, " (instead of ‘{}’)", self.actual)?;
        }

        Ok(())
    }
}

impl fmt::Display for Lookalike<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = paint_to_string(|painter| self.render(painter), ColorChoice::Auto).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

//! The diagnostic reporter.

use super::{ErrorCode, Severity, UnboxedDiagnostic};
use span::SourceMap;
use std::io::Write;
use std::{
    collections::BTreeSet,
    mem,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError, RwLock, RwLockReadGuard,
    },
};
use utility::{
    paint::{epaint, ColorChoice},
    pluralize, Conjunction, ListingExt,
};

/// A diagnostic reporter.
pub struct Reporter {
    kind: ReporterKind,
    map: Option<Arc<RwLock<SourceMap>>>,
    color: ColorChoice,
}

impl Reporter {
    fn new(kind: ReporterKind) -> Self {
        Self { kind, map: None, color: ColorChoice::Auto }
    }

    pub fn silent() -> Self {
        Self::new(ReporterKind::Silent)
    }

    pub fn buffer(diagnostics: Buffer) -> Self {
        Self::new(ReporterKind::Buffer(diagnostics))
    }

    pub fn stderr() -> Self {
        Self::new(ReporterKind::Stderr)
    }

    /// Collect errors and warnings and print them sorted when the reporter is dropped.
    ///
    /// Debug messages are printed right away.
    pub fn buffered_stderr(reported_any_errors: Arc<AtomicBool>) -> Self {
        Self::new(ReporterKind::BufferedStderr(StderrBuffer {
            errors: Mutex::default(),
            warnings: Mutex::default(),
            reported_any_errors,
        }))
    }

    #[must_use]
    pub fn with_map(mut self, map: Arc<RwLock<SourceMap>>) -> Self {
        self.map = Some(map);
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    fn map(&self) -> Option<RwLockReadGuard<'_, SourceMap>> {
        self.map
            .as_ref()
            .map(|map| map.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub(super) fn report(&self, diagnostic: Box<UnboxedDiagnostic>) -> ErasedReportedError {
        match &self.kind {
            ReporterKind::Silent => {}
            ReporterKind::Buffer(diagnostics) => {
                lock(diagnostics).insert(diagnostic);
            }
            ReporterKind::Stderr => self.print(&diagnostic),
            ReporterKind::BufferedStderr(buffer) => match diagnostic.severity {
                Severity::Bug | Severity::Error => {
                    lock(&buffer.errors).insert(diagnostic);
                }
                Severity::Warning => {
                    lock(&buffer.warnings).insert(diagnostic);
                }
                Severity::Debug => self.print(&diagnostic),
            },
        }

        ErasedReportedError::new()
    }

    fn print(&self, diagnostic: &UnboxedDiagnostic) {
        let map = self.map();
        // Failing to write to stderr leaves us with no place to complain to.
        let _ = epaint(
            |painter| {
                diagnostic.render(map.as_deref(), painter)?;
                writeln!(painter)?;
                writeln!(painter)
            },
            self.color,
        );
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if let ReporterKind::BufferedStderr(buffer) = &self.kind {
            let warnings = mem::take(&mut *lock(&buffer.warnings));
            let errors = mem::take(&mut *lock(&buffer.errors));

            for warning in &warnings {
                self.print(warning);
            }

            if !warnings.is_empty() {
                let summary = crate::Diagnostic::warning().message(format!(
                    "emitted {} {}",
                    warnings.len(),
                    pluralize!(warnings.len(), "warning")
                ));
                self.print(&summary);
            }

            for error in &errors {
                self.print(error);
            }

            if !errors.is_empty() {
                buffer.reported_any_errors.store(true, Ordering::SeqCst);
                self.print(&error_summary(&errors));
            }
        }
    }
}

fn error_summary(errors: &BTreeSet<Box<UnboxedDiagnostic>>) -> crate::Diagnostic {
    let explained_codes: BTreeSet<ErrorCode> = errors
        .iter()
        .filter_map(|error| error.code)
        .filter(|code| code.explanation().is_some())
        .collect();

    crate::Diagnostic::error()
        .message(pluralize!(
            errors.len(),
            "aborting due to previous error",
            format!("aborting due to {} previous errors", errors.len()),
        ))
        .with(|it| {
            if explained_codes.is_empty() {
                return it;
            }

            it.note(format!(
                "the {errors} {codes} {have} a detailed explanation",
                errors = pluralize!(explained_codes.len(), "error"),
                codes = explained_codes.iter().list(Conjunction::And),
                have = pluralize!(explained_codes.len(), "has", "have"),
            ))
        })
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

enum ReporterKind {
    Silent,
    Buffer(Buffer),
    Stderr,
    BufferedStderr(StderrBuffer),
}

pub type Buffer = Arc<Mutex<BTreeSet<Box<UnboxedDiagnostic>>>>;

struct StderrBuffer {
    errors: Mutex<BTreeSet<Box<UnboxedDiagnostic>>>,
    warnings: Mutex<BTreeSet<Box<UnboxedDiagnostic>>>,
    reported_any_errors: Arc<AtomicBool>,
}

/// A witness to a [reported](crate::Diagnostic::report) error.
///
/// A value of this type is a proof that an error was reported (neglecting buffering).
/// Using it as an error type instead of `()` makes it harder to return an error
/// without reporting anything since it can only be constructed by reporting a
/// diagnostic or by [`Self::new_unchecked`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErasedReportedError(());

impl ErasedReportedError {
    const fn new() -> Self {
        Self(())
    }

    pub const fn new_unchecked() -> Self {
        Self::new()
    }
}

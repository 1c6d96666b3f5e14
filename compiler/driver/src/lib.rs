//! The command line driver of the D front end.

use ast::{Module, Render};
use cli::{Command, GlobalOptions, ParseCommandOptions};
use diagnostics::{error::Result, Diagnostic, ErasedReportedError, Reporter};
use lexer::{
    lex,
    token::{Token, TokenKind},
    Comment, LexerOptions,
};
use parser::{parse_expression, parse_module, ParseOptions};
use resolver::{resolve_expression, ResolutionContext};
use span::{Location, SourceFileIndex, SourceMap, Span};
use std::{
    borrow::Cow,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, PoisonError, RwLock, RwLockReadGuard,
    },
};
use utility::{
    default,
    paint::{paint, AnsiColor, ColorChoice, Painter},
    pluralize,
};

pub use loader::{module_name, ParseCache};

mod cli;
mod loader;
#[cfg(test)]
mod test;

macro_rules! time {
    ($options:ident, #![doc = $name:literal] $( $block:tt )+) => {
        let time = std::time::Instant::now();
        $( $block )+
        let duration = time.elapsed();

        if $options.timing {
            eprintln!("  {:<30}{duration:?}", $name.trim_start());
        }
    };
}

pub fn main() -> Result {
    set_panic_hook();

    let (command, options) = cli::arguments()?;

    let map: Arc<RwLock<SourceMap>> = default();
    let reported_any_errors: Arc<AtomicBool> = default();
    let reporter = Reporter::buffered_stderr(reported_any_errors.clone())
        .with_map(map.clone())
        .with_color(options.color);

    let result = execute_command(command, &options, &map, reporter);

    let reported_any_errors = reported_any_errors.load(Ordering::SeqCst);

    if let Err(error) = result {
        debug_assert!(reported_any_errors, "an error occurred but nothing was reported");
        return Err(error);
    }

    // commands report syntax errors without failing
    if reported_any_errors {
        return Err(ErasedReportedError::new_unchecked());
    }

    Ok(())
}

#[allow(clippy::needless_pass_by_value)] // the reporter is flushed on drop
fn execute_command(
    command: Command,
    options: &GlobalOptions,
    map: &Arc<RwLock<SourceMap>>,
    reporter: Reporter,
) -> Result {
    if options.timing {
        eprintln!("Execution times by pass:");
    }

    match command {
        Command::Lex { path, keep_all_comments } => lex_file(&path, keep_all_comments, options, map, &reporter),
        Command::Parse { path, options: parse_options } => {
            parse_file(&path, &parse_options, options, map, &reporter)
        }
        Command::Resolve { path, caret, import_paths } => {
            resolve_at(&path, caret, import_paths, options, map, &reporter)
        }
    }
}

fn lex_file(
    path: &Path,
    keep_all_comments: bool,
    options: &GlobalOptions,
    map: &Arc<RwLock<SourceMap>>,
    reporter: &Reporter,
) -> Result {
    let file = loader::load_file(path, map, reporter)?;

    time! {
        options,
        //! Lexing

        let outcome = lex(read(map)[file].content(), LexerOptions { keep_all_comments, ..default() });
    }

    paint(
        |painter| {
            for token in &outcome.tokens {
                render_token(token, painter)?;
            }
            if options.emit_comments {
                render_comments(&outcome.comments, painter)?;
            }
            Ok(())
        },
        options.color,
    )
    .map_err(|error| output_error(&error, reporter))?;

    let error_count = outcome.errors.len();
    for error in outcome.errors {
        error.into_diagnostic().file(file).report(reporter);
    }

    status(
        "Lexed",
        &format!(
            "{} ({} {}, {error_count} {})",
            path.display(),
            outcome.tokens.len(),
            pluralize!(outcome.tokens.len(), "token"),
            pluralize!(error_count, "error"),
        ),
        options,
        reporter,
    )
}

fn parse_file(
    path: &Path,
    parse_options: &ParseCommandOptions,
    options: &GlobalOptions,
    map: &Arc<RwLock<SourceMap>>,
    reporter: &Reporter,
) -> Result {
    let file = loader::load_file(path, map, reporter)?;

    let defaults = ParseOptions::default();
    let parser_options = ParseOptions {
        structure_only: parse_options.structure_only,
        keep_all_comments: parse_options.keep_all_comments,
        error_cap: parse_options.error_cap.unwrap_or(defaults.error_cap),
        ..defaults
    };

    time! {
        options,
        //! Parsing

        let outcome = parse_module(read(map)[file].content(), parser_options);
    }

    let mut module = outcome.bare;
    name_module(&mut module, path, &[]);

    if parse_options.emit_ast || options.emit_comments {
        paint(
            |painter| {
                if parse_options.emit_ast {
                    module.render(default(), painter)?;
                    writeln!(painter)?;
                }
                if options.emit_comments {
                    render_comments(&outcome.comments, painter)?;
                }
                Ok(())
            },
            options.color,
        )
        .map_err(|error| output_error(&error, reporter))?;
    }

    let error_count = outcome.errors.len();
    for error in outcome.errors {
        error.into_diagnostic().file(file).report(reporter);
    }

    let declaration_count = module.nodes.len().saturating_sub(1);
    status(
        "Parsed",
        &format!(
            "{} ({declaration_count} {}, {error_count} {})",
            module.name,
            pluralize!(declaration_count, "declaration"),
            pluralize!(error_count, "error"),
        ),
        options,
        reporter,
    )
}

fn resolve_at(
    path: &Path,
    caret: Location,
    import_paths: Vec<PathBuf>,
    options: &GlobalOptions,
    map: &Arc<RwLock<SourceMap>>,
    reporter: &Reporter,
) -> Result {
    let file = loader::load_file(path, map, reporter)?;

    let silent = Reporter::silent();
    let trace = if options.trace { reporter } else { &silent };

    let roots = match import_paths.is_empty() {
        true => vec![path.parent().map_or_else(PathBuf::new, Path::to_path_buf)],
        false => import_paths,
    };

    time! {
        options,
        //! Parsing

        let outcome = parse_module(read(map)[file].content(), default());
    }

    for error in outcome.errors {
        error.into_diagnostic().file(file).report(reporter);
    }

    let mut module = outcome.bare;
    name_module(&mut module, path, &roots);

    let mut cache = ParseCache::new(roots, ParseOptions { structure_only: true, ..default() });

    time! {
        options,
        //! Import Loading

        let missing = cache.load_imports(&module, map, reporter);
    }

    for name in missing {
        Diagnostic::debug().message(format!("the module ‘{name}’ was not found")).report(trace);
    }

    let source = read(map)[file].content().to_owned();
    let Some(span) = expression_before(&source, caret) else {
        return Err(Diagnostic::error()
            .message("there is no expression ending at the given location")
            .unlabeled_span(Span::empty(caret))
            .file(file)
            .report(reporter));
    };

    let fragment = parse_expression(
        snippet(map, file, span).as_ref(),
        ParseOptions { start: span.start, ..default() },
    );
    for error in fragment.errors {
        error.into_diagnostic().file(file).report(reporter);
    }
    let expression = fragment.bare.bare;

    let mut context = ResolutionContext::new(&module, caret, &cache, trace);

    time! {
        options,
        //! Resolution

        let results = resolve_expression(&mut context, &expression);
    }

    paint(
        |painter| {
            if results.is_empty() {
                painter.set(AnsiColor::BrightBlack)?;
                writeln!(painter, "no results for ‘{expression}’")?;
                return painter.unset();
            }
            for result in &results {
                writeln!(painter, "{result}")?;
                painter.set(AnsiColor::BrightBlack)?;
                for through in result.resolution_chain().skip(1) {
                    writeln!(painter, "  reached through {through}")?;
                }
                painter.unset()?;
            }
            Ok(())
        },
        options.color,
    )
    .map_err(|error| output_error(&error, reporter))?;

    for error in context.take_errors() {
        error.into_diagnostic().file(file).report(reporter);
    }

    if options.trace {
        context.report_statistics();
    }

    status(
        "Resolved",
        &format!(
            "‘{expression}’ in {} ({} {}, {} loaded {})",
            module.name,
            results.len(),
            pluralize!(results.len(), "result"),
            cache.len(),
            pluralize!(cache.len(), "module"),
        ),
        options,
        reporter,
    )
}

/// Name a module lacking a module declaration after its path.
fn name_module(module: &mut Module, path: &Path, roots: &[PathBuf]) {
    if !module.name.is_empty() {
        return;
    }

    let name = module_name(path, roots).or_else(|| {
        path.file_stem().and_then(|stem| stem.to_str()).map(ToOwned::to_owned)
    });
    if let Some(name) = name {
        module.set_name(name);
    }
}

/// The span of the expression ending at or enclosing the given location.
///
/// Only postfix chains are recognized: identifiers, `this` and `super` joined by `.` and
/// followed by calls, indexing or template instantiations. A caret right after a trailing
/// dot selects the expression in front of it.
fn expression_before(source: &str, caret: Location) -> Option<Span> {
    let tokens = lex(source, default()).tokens;

    let mut end = tokens
        .iter()
        .rposition(|token| token.kind != TokenKind::EndOfFile && token.span.start < caret)?;
    if tokens[end].is(TokenKind::Dot) {
        end = end.checked_sub(1)?;
    }

    let mut start = operand_start(&tokens, end)?;
    while start >= 2 && tokens[start - 1].is(TokenKind::Dot) && ends_operand(tokens[start - 2].kind) {
        start = operand_start(&tokens, start - 2)?;
    }

    Some(tokens[start].span.merge(tokens[end].span))
}

/// The first token of the operand whose last token is at the given index.
fn operand_start(tokens: &[Token], mut index: usize) -> Option<usize> {
    loop {
        match tokens[index].kind {
            TokenKind::Identifier | TokenKind::This | TokenKind::Super | TokenKind::Literal => {
                return Some(index);
            }
            TokenKind::ClosingRoundBracket | TokenKind::ClosingSquareBracket => {
                let opening = opening_bracket(tokens, index)?;
                match opening.checked_sub(1) {
                    // `name!(arguments)`
                    Some(previous) if tokens[previous].is(TokenKind::Exclamation) && previous >= 1 => {
                        index = previous - 1;
                    }
                    Some(previous) if ends_operand(tokens[previous].kind) => index = previous,
                    _ => return Some(opening),
                }
            }
            _ => return None,
        }
    }
}

fn ends_operand(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::This
            | TokenKind::Super
            | TokenKind::Literal
            | TokenKind::ClosingRoundBracket
            | TokenKind::ClosingSquareBracket
    )
}

fn opening_bracket(tokens: &[Token], closing: usize) -> Option<usize> {
    let mut depth = 0_usize;

    for index in (0..=closing).rev() {
        match tokens[index].kind {
            TokenKind::ClosingRoundBracket | TokenKind::ClosingSquareBracket => depth += 1,
            TokenKind::OpeningRoundBracket | TokenKind::OpeningSquareBracket => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }

    None
}

fn render_token(token: &Token, painter: &mut Painter) -> io::Result<()> {
    painter.set(AnsiColor::BrightBlack)?;
    write!(painter, "{:?}", token.span)?;
    painter.unset()?;
    writeln!(painter, " {token}")
}

fn render_comments(comments: &[Comment], painter: &mut Painter) -> io::Result<()> {
    for comment in comments {
        painter.set(AnsiColor::BrightBlack)?;
        write!(painter, "{:?}", comment.span)?;
        painter.unset()?;

        let kind = match comment.documentation {
            true => "documentation comment",
            false => "comment",
        };
        writeln!(painter, " {kind} ‘{}’", comment.content().escape_debug())?;
    }

    Ok(())
}

fn status(label: &str, message: &str, options: &GlobalOptions, reporter: &Reporter) -> Result {
    if options.quiet {
        return Ok(());
    }

    paint(
        |painter| {
            painter.set(AnsiColor::Green.on_default().bold())?;
            write!(painter, "{label:>12} ")?;
            painter.unset()?;
            writeln!(painter, "{message}")
        },
        options.color,
    )
    .map_err(|error| output_error(&error, reporter))
}

fn output_error(error: &io::Error, reporter: &Reporter) -> ErasedReportedError {
    Diagnostic::error().message("could not write to stdout").note(error.to_string()).report(reporter)
}

fn read(map: &RwLock<SourceMap>) -> RwLockReadGuard<'_, SourceMap> {
    map.read().unwrap_or_else(PoisonError::into_inner)
}

fn snippet(map: &RwLock<SourceMap>, file: SourceFileIndex, span: Span) -> String {
    read(map)[file].snippet(span).to_owned()
}

fn set_panic_hook() {
    std::panic::set_hook(Box::new(|information| {
        let payload = information.payload();

        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("unknown cause")
            .to_owned();

        let backtrace = std::env::var("DFRONT_BACKTRACE")
            .map_or(false, |variable| variable != "0")
            .then(std::backtrace::Backtrace::force_capture);

        Diagnostic::bug()
            .message(message)
            .with(|it| match information.location() {
                Some(location) => it.note(format!("at ‘{location}’")),
                None => it,
            })
            .note(std::thread::current().name().map_or_else(
                || Cow::from("in an unnamed thread"),
                |name| format!("in thread ‘{name}’").into(),
            ))
            .note("the front end unexpectedly panicked. this is a bug. we would appreciate a bug report")
            .note(format!("dfront {}", env!("VERSION")))
            .with(|it| match backtrace {
                Some(backtrace) => it.note(format!("with the following backtrace:\n{backtrace}")),
                None => it.help("rerun with the environment variable ‘DFRONT_BACKTRACE=1’ to display a backtrace"),
            })
            .report(&Reporter::stderr().with_color(ColorChoice::Auto));
    }));
}

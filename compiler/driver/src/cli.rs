use clap::{
    builder::{PossibleValue, TypedValueParser, ValueParser},
    value_parser, Arg, ArgAction, ArgMatches,
};
use diagnostics::{error::Result, Diagnostic, Reporter};
use span::Location;
use std::{ffi::OsStr, path::PathBuf};
use utility::paint::ColorChoice;

pub(crate) fn arguments() -> Result<(Command, GlobalOptions)> {
    let path_arg = Arg::new(argument::PATH)
        .value_parser(ValueParser::path_buf())
        .required(true)
        .help("The path to a D source file");

    let all_comments_opt = Arg::new(option::ALL_COMMENTS)
        .long("all-comments")
        .action(ArgAction::SetTrue)
        .help("Keep plain comments in addition to documentation comments");

    let matches = clap::Command::new("dfront")
        .bin_name("dfront")
        .version(env!("VERSION"))
        .about("A front end for the D programming language: lexer, parser and symbol resolver")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .args([
            Arg::new(option::QUIET)
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Suppress status output from being printed to stdout"),
            Arg::new(option::COLOR)
                .long("color")
                .global(true)
                .value_name("WHEN")
                .value_parser(ColorChoiceParser)
                .help("Control when to use color"),
            Arg::new(option::UNSTABLE_OPTION)
                .short('Z')
                .global(true)
                .value_name("OPTION")
                .action(ArgAction::Append)
                .help("Set an unstable option. See ‘-Z help’ for details"),
        ])
        .subcommands([
            clap::Command::new(subcommand::LEX)
                .visible_alias("l")
                .about("Print the tokens of the given source file")
                .args([&path_arg, &all_comments_opt]),
            clap::Command::new(subcommand::PARSE)
                .visible_alias("p")
                .about("Parse the given source file and report syntax errors")
                .args([&path_arg, &all_comments_opt])
                .args([
                    Arg::new(option::STRUCTURE_ONLY)
                        .long("structure-only")
                        .action(ArgAction::SetTrue)
                        .help("Skip the bodies of functions"),
                    Arg::new(option::ERROR_CAP)
                        .long("error-cap")
                        .value_name("N")
                        .value_parser(value_parser!(usize))
                        .help("Stop parsing after the given amount of errors"),
                    Arg::new(option::EMIT_AST)
                        .long("emit-ast")
                        .action(ArgAction::SetTrue)
                        .help("Print the syntax tree"),
                ]),
            clap::Command::new(subcommand::RESOLVE)
                .visible_alias("r")
                .about("Resolve the symbol or expression ending at the given location")
                .arg(&path_arg)
                .args([
                    Arg::new(option::LINE)
                        .long("line")
                        .short('l')
                        .value_name("LINE")
                        .required(true)
                        .value_parser(value_parser!(u32).range(1..))
                        .help("The one-based line of the caret"),
                    Arg::new(option::COLUMN)
                        .long("column")
                        .short('c')
                        .value_name("COLUMN")
                        .required(true)
                        .value_parser(value_parser!(u32).range(1..))
                        .help("The one-based column of the caret in UTF-16 code units"),
                    Arg::new(option::IMPORT_PATH)
                        .short('I')
                        .long("import-path")
                        .value_name("DIR")
                        .action(ArgAction::Append)
                        .value_parser(ValueParser::path_buf())
                        .help("Add a folder to search imported modules in"),
                ]),
        ])
        .get_matches();

    let unstable_options = unstable::deserialize(&matches)?;

    let Some((command, matches)) = matches.subcommand() else {
        return Err(Diagnostic::bug().message("missing subcommand").report(&Reporter::stderr()));
    };
    let path: PathBuf = matches.get_one(argument::PATH).cloned().unwrap_or_default();
    let keep_all_comments = || matches.get_flag(option::ALL_COMMENTS);

    let command = match command {
        subcommand::LEX => Command::Lex { path, keep_all_comments: keep_all_comments() },
        subcommand::PARSE => Command::Parse {
            path,
            options: ParseCommandOptions {
                structure_only: matches.get_flag(option::STRUCTURE_ONLY),
                keep_all_comments: keep_all_comments(),
                error_cap: matches.get_one(option::ERROR_CAP).copied(),
                emit_ast: matches.get_flag(option::EMIT_AST),
            },
        },
        subcommand::RESOLVE => Command::Resolve {
            path,
            caret: Location::new(
                matches.get_one(option::LINE).copied().unwrap_or(1),
                matches.get_one(option::COLUMN).copied().unwrap_or(1),
            ),
            import_paths: matches.get_many(option::IMPORT_PATH).into_iter().flatten().cloned().collect(),
        },
        command => {
            return Err(Diagnostic::bug()
                .message(format!("unhandled subcommand ‘{command}’"))
                .report(&Reporter::stderr()))
        }
    };

    Ok((command, GlobalOptions::deserialize(matches, unstable_options)))
}

mod subcommand {
    pub(super) const LEX: &str = "lex";
    pub(super) const PARSE: &str = "parse";
    pub(super) const RESOLVE: &str = "resolve";
}

mod argument {
    pub(super) const PATH: &str = "PATH";
}

mod option {
    pub(super) const ALL_COMMENTS: &str = "all_comments";
    pub(super) const COLOR: &str = "color";
    pub(super) const COLUMN: &str = "column";
    pub(super) const EMIT_AST: &str = "emit_ast";
    pub(super) const ERROR_CAP: &str = "error_cap";
    pub(super) const IMPORT_PATH: &str = "import_path";
    pub(super) const LINE: &str = "line";
    pub(super) const QUIET: &str = "quiet";
    pub(super) const STRUCTURE_ONLY: &str = "structure_only";
    pub(super) const UNSTABLE_OPTION: &str = "unstable_option";
}

pub(crate) enum Command {
    Lex { path: PathBuf, keep_all_comments: bool },
    Parse { path: PathBuf, options: ParseCommandOptions },
    Resolve { path: PathBuf, caret: Location, import_paths: Vec<PathBuf> },
}

pub(crate) struct ParseCommandOptions {
    pub(crate) structure_only: bool,
    pub(crate) keep_all_comments: bool,
    pub(crate) error_cap: Option<usize>,
    pub(crate) emit_ast: bool,
}

#[derive(Default)]
pub(crate) struct GlobalOptions {
    pub(crate) quiet: bool,
    pub(crate) color: ColorChoice,
    pub(crate) timing: bool,
    pub(crate) emit_comments: bool,
    pub(crate) trace: bool,
}

impl GlobalOptions {
    /// Global options may be given after the subcommand, so they are read from its matches.
    fn deserialize(matches: &ArgMatches, unstable_options: Vec<unstable::UnstableOption>) -> Self {
        let mut options = Self {
            quiet: matches.get_flag(option::QUIET),
            color: matches.get_one(option::COLOR).copied().unwrap_or_default(),
            ..Self::default()
        };

        for unstable_option in unstable_options {
            use unstable::UnstableOption::*;

            match unstable_option {
                EmitComments => options.emit_comments = true,
                Timing => options.timing = true,
                Trace => options.trace = true,
            }
        }

        options
    }
}

#[derive(Clone)]
struct ColorChoiceParser;

impl TypedValueParser for ColorChoiceParser {
    type Value = ColorChoice;

    fn parse_ref(&self, _: &clap::Command, _: Option<&Arg>, source: &OsStr) -> Result<Self::Value, clap::Error> {
        let source = parse_utf8(source)?;

        source.parse().map_err(|()| {
            clap::Error::raw(
                clap::error::ErrorKind::InvalidValue,
                format!("‘{source}’ is not a valid color choice\n"),
            )
        })
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue>>> {
        Some(Box::new(ColorChoice::ELEMENTS.into_iter().map(|choice| PossibleValue::new(choice.name()))))
    }
}

pub(crate) mod unstable {
    use clap::ArgMatches;
    use diagnostics::{error::Result, Diagnostic, Reporter};
    use std::{
        io::{self, Write},
        iter::once,
        str::FromStr,
    };
    use utility::{
        paint::{AnsiColor, ColorChoice, Effects, Painter},
        pluralize, Conjunction, ListingExt, QuoteExt,
    };

    const HELP_OPTION: &str = "help";

    pub(super) fn deserialize(matches: &ArgMatches) -> Result<Vec<UnstableOption>> {
        let mut options = Vec::new();
        let mut invalid_options = Vec::new();

        let unparsed_options = matches
            .get_many::<String>(super::option::UNSTABLE_OPTION)
            .into_iter()
            .flatten()
            .chain(
                matches
                    .subcommand()
                    .and_then(|(_, matches)| matches.get_many::<String>(super::option::UNSTABLE_OPTION))
                    .into_iter()
                    .flatten(),
            );

        for option in unparsed_options {
            if option == HELP_OPTION {
                if let Err(error) = help() {
                    return Err(Diagnostic::error()
                        .message("could not print the help for unstable options")
                        .note(error.to_string())
                        .report(&Reporter::stderr()));
                }
                std::process::exit(0);
            }

            match option.parse() {
                Ok(option) => {
                    if !options.contains(&option) {
                        options.push(option);
                    }
                }
                Err(()) => invalid_options.push(option),
            }
        }

        if !invalid_options.is_empty() {
            return Err(Diagnostic::error()
                .message(format!(
                    "invalid unstable {} {}",
                    pluralize!(invalid_options.len(), "option"),
                    invalid_options.into_iter().map(QuoteExt::quote).list(Conjunction::And)
                ))
                .report(&Reporter::stderr()));
        }

        Ok(options)
    }

    fn help() -> io::Result<()> {
        let mut stdout = Painter::stdout(ColorChoice::Auto);

        stdout.set(Effects::BOLD | Effects::UNDERLINE)?;
        writeln!(stdout, "Unstable Options:")?;
        stdout.unset()?;

        let mut elements: Vec<_> = UnstableOption::ELEMENTS
            .into_iter()
            .map(|option| (option.syntax(), option.help()))
            .chain(once((HELP_OPTION, "Print help information and halt")))
            .collect();
        elements.sort_by_key(|&(syntax, _)| syntax);

        let padding = elements.iter().map(|(syntax, _)| syntax.len()).max().unwrap_or_default();

        for (syntax, help) in elements {
            stdout.set(Effects::BOLD)?;
            write!(stdout, "    -Z {syntax:<padding$}     ")?;
            stdout.unset()?;
            writeln!(stdout, "{help}")?;
        }

        writeln!(stdout)?;

        stdout.set(AnsiColor::Red)?;
        writeln!(
            stdout,
            "\
            These options are not subject to any stability guarantees.\n\
            They may be CHANGED in their behavior or REMOVED ENTIRELY at any time and without further notice."
        )?;
        stdout.unset()?;

        stdout.flush()
    }

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub(crate) enum UnstableOption {
        EmitComments,
        Timing,
        Trace,
    }

    impl UnstableOption {
        pub(crate) const ELEMENTS: [Self; 3] = [Self::EmitComments, Self::Timing, Self::Trace];

        pub(crate) const fn syntax(self) -> &'static str {
            match self {
                Self::EmitComments => "emit-comments",
                Self::Timing => "timing",
                Self::Trace => "trace",
            }
        }

        const fn help(self) -> &'static str {
            match self {
                Self::EmitComments => "Print the comments collected by the lexer or the parser",
                Self::Timing => "Print the time of each pass",
                Self::Trace => "Print debug messages like recursion guard hits and cache statistics",
            }
        }
    }

    impl FromStr for UnstableOption {
        type Err = ();

        fn from_str(source: &str) -> Result<Self, Self::Err> {
            Self::ELEMENTS.into_iter().find(|option| option.syntax() == source).ok_or(())
        }
    }
}

fn parse_utf8(source: &OsStr) -> Result<&str, clap::Error> {
    source.to_str().ok_or_else(|| {
        clap::Error::raw(
            clap::error::ErrorKind::InvalidUtf8,
            format!("‘{}’ is not valid UTF-8\n", source.to_string_lossy()),
        )
    })
}

//! The code responsible for rendering diagnostics.

use super::{Role, Severity, Subseverity, UnboxedDiagnostic};
use span::{
    source_map::{LineWithHighlight, LinesWithHighlight},
    FileName, SourceMap,
};
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;
use utility::paint::{paint_to_string, AnsiColor, ColorChoice, Effects, Painter};

impl UnboxedDiagnostic {
    pub fn render(&self, map: Option<&SourceMap>, p: &mut Painter) -> io::Result<()> {
        render_header(self, p)?;

        let highlights = resolve_highlights(self, map);
        let padding = padding(&highlights);

        let mut renderer = Renderer { diagnostic: self, padding, p };

        renderer.render_path()?;
        renderer.render_highlights(&highlights)?;

        for subdiagnostic in &self.subdiagnostics {
            renderer.render_subdiagnostic(subdiagnostic.severity, &subdiagnostic.message)?;
        }

        Ok(())
    }

    /// Render the diagnostic without colors.
    pub fn format(&self, map: Option<&SourceMap>) -> String {
        paint_to_string(|painter| self.render(map, painter), ColorChoice::Never).unwrap_or_default()
    }
}

fn render_header(diagnostic: &UnboxedDiagnostic, p: &mut Painter) -> io::Result<()> {
    diagnostic.severity.render(p)?;

    if let Some(code) = diagnostic.code {
        p.set(diagnostic.severity.color())?;
        write!(p, "[{code}]")?;
        p.unset()?;
    }

    if let Some(message) = &diagnostic.message {
        write!(p, ": ")?;
        p.set(Effects::BOLD)?;
        write!(p, "{message}")?;
        p.unset()?;
    }

    Ok(())
}

/// A highlight whose lines could be looked up in the source map.
///
/// If there is no map or no file, only the location gets rendered.
enum ResolvedHighlight<'a> {
    Lines {
        lines: LinesWithHighlight<'a>,
        role: Role,
        label: Option<&'a str>,
    },
    Location {
        location: span::Location,
        label: Option<&'a str>,
    },
}

fn resolve_highlights<'a>(
    diagnostic: &'a UnboxedDiagnostic,
    map: Option<&'a SourceMap>,
) -> Vec<ResolvedHighlight<'a>> {
    let file = map.zip(diagnostic.file).filter(|(map, file)| map.get(*file).is_some());

    diagnostic
        .highlights
        .iter()
        .map(|highlight| match file {
            Some((map, file)) => ResolvedHighlight::Lines {
                lines: map.lines_with_highlight(file, highlight.span),
                role: highlight.role,
                label: highlight.label.as_deref(),
            },
            None => ResolvedHighlight::Location {
                location: highlight.span.start,
                label: highlight.label.as_deref(),
            },
        })
        .collect()
}

fn padding(highlights: &[ResolvedHighlight<'_>]) -> String {
    let widest_line_number = highlights
        .iter()
        .filter_map(|highlight| match highlight {
            ResolvedHighlight::Lines { lines, .. } => Some(match &lines.last {
                Some(line) => lines.first.number.max(line.number),
                None => lines.first.number,
            }),
            ResolvedHighlight::Location { .. } => None,
        })
        .max();

    match widest_line_number {
        Some(number) => " ".repeat(number.max(1).ilog10() as usize + 1),
        None => " ".into(),
    }
}

struct Renderer<'a> {
    diagnostic: &'a UnboxedDiagnostic,
    padding: String,
    p: &'a mut Painter,
}

impl Renderer<'_> {
    const BAR: &'static str = Line::Vertical.single();

    fn render_path(&mut self) -> io::Result<()> {
        let Some(path) = &self.diagnostic.path else {
            return Ok(());
        };

        writeln!(self.p)?;
        self.p.set(palette::FRAME)?;
        write!(
            self.p,
            "{} {}{} {}",
            self.padding,
            Line::DownAndRight.single(),
            Line::Horizontal.single(),
            path.display(),
        )?;
        self.p.unset()
    }

    fn render_highlights(&mut self, highlights: &[ResolvedHighlight<'_>]) -> io::Result<()> {
        let mut needs_upward_connection = self.diagnostic.path.is_some();
        let needs_downward_connection = !self.diagnostic.subdiagnostics.is_empty();

        for (index, highlight) in highlights.iter().enumerate() {
            match highlight {
                ResolvedHighlight::Lines { lines, role, label } => {
                    self.render_location(lines, needs_upward_connection)?;

                    match &lines.last {
                        None => self.render_single_line_highlight(&lines.first, *role, *label),
                        Some(final_line) => self.render_multi_line_highlight(
                            &lines.first,
                            final_line,
                            *role,
                            *label,
                        ),
                    }?;

                    if needs_downward_connection || index + 1 < highlights.len() {
                        self.render_bar()?;
                    }
                }
                ResolvedHighlight::Location { location, label } => {
                    writeln!(self.p)?;
                    self.p.set(palette::FRAME)?;
                    write!(self.p, "{} {} {location}", self.padding, Line::Horizontal.single())?;
                    self.p.unset()?;

                    if let Some(label) = label {
                        write!(self.p, " {label}")?;
                    }
                }
            }

            needs_upward_connection = true;
        }

        Ok(())
    }

    fn render_location(
        &mut self,
        lines: &LinesWithHighlight<'_>,
        needs_upward_connection: bool,
    ) -> io::Result<()> {
        let connector = if needs_upward_connection {
            Line::VerticalAndRight
        } else {
            Line::DownAndRight
        }
        .single();

        writeln!(self.p)?;
        self.p.set(palette::FRAME)?;
        write!(self.p, "{} {connector}{} ", self.padding, Line::Horizontal.single())?;
        render_file_name(lines.file, self.p)?;
        write!(self.p, ":{}:{}", lines.first.number, lines.first.highlight.start)?;
        self.p.unset()
    }

    fn render_single_line_highlight(
        &mut self,
        line: &LineWithHighlight<'_>,
        role: Role,
        label: Option<&str>,
    ) -> io::Result<()> {
        let color = role.color(self.diagnostic.severity.color());

        self.render_bar()?;
        writeln!(self.p)?;
        self.render_line_number(line.number)?;
        write!(self.p, " ")?;

        let prefix_width = line.highlight.prefix_width;
        let zero_length_highlight = line.highlight.width == 0;

        if zero_length_highlight && prefix_width == 0 {
            write!(self.p, " ")?;
        }

        writeln!(self.p, "{}", line.content)?;

        self.p.set(palette::FRAME)?;
        write!(self.p, "{} {}", self.padding, Self::BAR)?;
        self.p.unset()?;

        let underline_padding = " ".repeat(if zero_length_highlight {
            prefix_width.saturating_sub(1)
        } else {
            prefix_width
        });
        self.p.set(color)?;
        write!(self.p, " {underline_padding}")?;
        if zero_length_highlight {
            write!(
                self.p,
                "{}{}",
                Line::RightAngleBracket.to_str(role),
                Line::LeftAngleBracket.to_str(role),
            )?;
        } else {
            write!(self.p, "{}", Line::Horizontal.to_str(role).repeat(line.highlight.width))?;
        }

        if let Some(label) = label {
            write!(self.p, " {label}")?;
        }

        self.p.unset()
    }

    fn render_multi_line_highlight(
        &mut self,
        first_line: &LineWithHighlight<'_>,
        final_line: &LineWithHighlight<'_>,
        role: Role,
        label: Option<&str>,
    ) -> io::Result<()> {
        let color = role.color(self.diagnostic.severity.color());
        let hand = Line::UpAndLeft.to_str(role);

        // The upper arm.
        self.render_bar()?;
        writeln!(self.p)?;
        self.render_line_number(first_line.number)?;
        writeln!(self.p, "   {}", first_line.content)?;

        let bar = if final_line.number - first_line.number > 1 {
            ELLIPSIS
        } else {
            Self::BAR
        };
        self.p.set(palette::FRAME)?;
        write!(self.p, "{} {bar} ", self.padding)?;
        self.p.unset()?;

        let arm = Line::Horizontal.to_str(role).repeat(first_line.highlight.prefix_width + 1);
        self.p.set(color)?;
        writeln!(self.p, "{}{arm}{hand}", Line::DownAndRight.to_str(role))?;
        self.p.unset()?;

        // The connector and the lower arm.
        self.render_line_number(final_line.number)?;
        self.p.set(color)?;
        writeln!(self.p, " {} {}", Line::Vertical.to_str(role), final_line.content)?;
        self.p.unset()?;

        self.p.set(palette::FRAME)?;
        write!(self.p, "{} {}", self.padding, Self::BAR)?;
        self.p.unset()?;

        let arm = Line::Horizontal.to_str(role).repeat(final_line.highlight.width);
        self.p.set(color)?;
        write!(self.p, " {}{arm}{hand}", Line::UpAndRight.to_str(role))?;
        if let Some(label) = label {
            write!(self.p, " {label}")?;
        }
        self.p.unset()
    }

    fn render_subdiagnostic(&mut self, severity: Subseverity, message: &str) -> io::Result<()> {
        writeln!(self.p)?;
        write!(self.p, "{}", self.padding)?;
        severity.render(self.p)?;
        write!(self.p, ": ")?;

        let mut lines = message.split('\n');

        if let Some(line) = lines.next() {
            write!(self.p, "{line}")?;
        }

        let severity_spacing = " ".repeat(severity.name().width() + 1);

        for line in lines.filter(|line| !line.is_empty()) {
            writeln!(self.p)?;
            write!(self.p, "{}{severity_spacing} {line}", self.padding)?;
        }

        Ok(())
    }

    fn render_bar(&mut self) -> io::Result<()> {
        writeln!(self.p)?;

        self.p.set(palette::FRAME)?;
        write!(self.p, "{} {}", self.padding, Self::BAR)?;
        self.p.unset()
    }

    fn render_line_number(&mut self, number: u32) -> io::Result<()> {
        let padding = self.padding.len();

        self.p.set(palette::FRAME)?;
        write!(self.p, "{number:>padding$} {}", Self::BAR)?;
        self.p.unset()
    }
}

impl Severity {
    const fn name(self) -> &'static str {
        match self {
            Self::Bug => "internal error",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Debug => "debug",
        }
    }

    pub(super) const fn color(self) -> AnsiColor {
        match self {
            Self::Bug | Self::Error => palette::ERROR,
            Self::Warning => palette::WARNING,
            Self::Debug => palette::DEBUG,
        }
    }

    fn render(self, p: &mut Painter) -> io::Result<()> {
        p.set(self.color().on_default().bold())?;
        write!(p, "{}", self.name())?;
        p.unset()
    }
}

impl Subseverity {
    fn render(self, p: &mut Painter) -> io::Result<()> {
        p.set(palette::HELP.on_default().bold())?;
        write!(p, "{}", self.name())?;
        p.unset()
    }
}

impl Role {
    const fn color(self, primary: AnsiColor) -> AnsiColor {
        match self {
            Self::Primary => primary,
            Self::Secondary => palette::HELP,
        }
    }
}

#[derive(Clone, Copy)]
enum Line {
    Horizontal,
    Vertical,
    DownAndRight,
    VerticalAndRight,
    UpAndLeft,
    UpAndRight,
    RightAngleBracket,
    LeftAngleBracket,
}

impl Line {
    const fn single(self) -> &'static str {
        match self {
            Self::Horizontal => "─",
            Self::Vertical => "│",
            Self::DownAndRight => "┌",
            Self::VerticalAndRight => "├",
            Self::UpAndLeft => "┘",
            Self::UpAndRight => "└",
            Self::LeftAngleBracket => "⟨",
            Self::RightAngleBracket => "⟩",
        }
    }

    const fn double(self) -> &'static str {
        match self {
            Self::Horizontal => "═",
            Self::Vertical => "║",
            Self::DownAndRight => "╔",
            Self::VerticalAndRight => "╠",
            Self::UpAndLeft => "╝",
            Self::UpAndRight => "╚",
            Self::LeftAngleBracket => "⟪",
            Self::RightAngleBracket => "⟫",
        }
    }

    const fn to_str(self, role: Role) -> &'static str {
        match role {
            Role::Primary => self.double(),
            Role::Secondary => self.single(),
        }
    }
}

fn render_file_name(name: &FileName, p: &mut Painter) -> io::Result<()> {
    match name {
        FileName::Anonymous | FileName::Stdin => {
            p.set(Effects::ITALIC)?;
            write!(p, "{name}")?;
            p.unset()
        }
        FileName::Path(_) | FileName::Virtual(_) => write!(p, "{name}"),
    }
}

const ELLIPSIS: &str = "·";

mod palette {
    use utility::paint::AnsiColor;

    pub(super) const FRAME: AnsiColor = AnsiColor::BrightBlue;
    pub(super) const ERROR: AnsiColor = AnsiColor::BrightRed;
    pub(super) const WARNING: AnsiColor = AnsiColor::BrightYellow;
    pub(super) const HELP: AnsiColor = AnsiColor::BrightCyan;
    pub(super) const DEBUG: AnsiColor = AnsiColor::BrightMagenta;
}

use super::{Location, Span};
use index_map::IndexMap;
use std::{
    io,
    path::{Path, PathBuf},
};
use unicode_width::UnicodeWidthStr;
use utility::obtain;

#[cfg(test)]
mod test;

/// A mapping from [index](SourceFileIndex) to [source file](SourceFile).
#[derive(Default)]
pub struct SourceMap {
    files: IndexMap<SourceFileIndex, SourceFile>,
}

impl SourceMap {
    /// Open a file given its path and add it as a [`SourceFile`] to the map.
    pub fn load(&mut self, path: &Path) -> io::Result<SourceFileIndex> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.add(FileName::Path(path.to_owned()), content))
    }

    /// Add text to the map creating a [`SourceFile`] in the process.
    pub fn add(&mut self, name: impl Into<FileName>, content: String) -> SourceFileIndex {
        self.files.insert(SourceFile::new(name, content))
    }

    pub fn add_str(&mut self, name: impl Into<FileName>, content: &str) -> SourceFileIndex {
        self.add(name, content.to_owned())
    }

    pub fn file_by_path(&self, path: &Path) -> Option<SourceFileIndex> {
        self.files
            .iter()
            .find(|(_, file)| file.name.path() == Some(path))
            .map(|(index, _)| index)
    }

    pub fn get(&self, index: SourceFileIndex) -> Option<&SourceFile> {
        self.files.get(index)
    }

    /// Obtain the lines of the given file touched by the span together with the
    /// position of the highlight inside of them.
    pub fn lines_with_highlight(&self, file: SourceFileIndex, span: Span) -> LinesWithHighlight<'_> {
        let file = &self.files[file];

        let first = file.line_with_highlight(span.start.line, span.start, span.end);
        let last = (span.end.line > span.start.line)
            .then(|| file.line_with_highlight(span.end.line, Location::new(span.end.line, 1), span.end));

        LinesWithHighlight { file: &file.name, first, last }
    }
}

impl std::ops::Index<SourceFileIndex> for SourceMap {
    type Output = SourceFile;

    fn index(&self, index: SourceFileIndex) -> &Self::Output {
        &self.files[index]
    }
}

index_map::index!(pub struct SourceFileIndex);

#[derive(Debug, PartialEq, Eq)]
pub struct LinesWithHighlight<'a> {
    pub file: &'a FileName,
    pub first: LineWithHighlight<'a>,
    /// This is `None` if the last is the first line.
    pub last: Option<LineWithHighlight<'a>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct LineWithHighlight<'a> {
    /// One-indexed line number.
    pub number: u32,
    /// The content of the entire line that contains the to-be-highlighted snippet.
    pub content: &'a str,
    pub highlight: Highlight,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Highlight {
    pub start: u32,
    pub end: u32,
    pub width: usize,
    pub prefix_width: usize,
}

/// A source file.
///
/// Apart from its content, it knows where each line starts which makes converting between
/// byte offsets and [locations](Location) cheap.
pub struct SourceFile {
    name: FileName,
    content: String,
    /// Byte offsets of the first character of each line.
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<FileName>, content: String) -> Self {
        let line_starts = line_starts(&content);
        Self { name: name.into(), content, line_starts }
    }

    pub fn name(&self) -> &FileName {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The content of the given one-indexed line without its line break.
    pub fn line(&self, number: u32) -> Option<&str> {
        let index = (number as usize).checked_sub(1)?;
        let start = *self.line_starts.get(index)?;
        let end = self.line_starts.get(index + 1).copied().unwrap_or(self.content.len());
        Some(self.content[start..end].trim_end_matches(['\n', '\r']))
    }

    /// Map a byte offset to a location.
    ///
    /// Offsets past the end of the file are mapped to the end of the file.
    pub fn location(&self, offset: usize) -> Location {
        let offset = offset.min(self.content.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        };
        let start = self.line_starts[line];
        let column = self.content[start..offset]
            .chars()
            .map(char::len_utf16)
            .sum::<usize>();

        #[allow(clippy::cast_possible_truncation)]
        Location::new(line as u32 + 1, column as u32 + 1)
    }

    /// Map a location to a byte offset.
    ///
    /// Columns beyond the end of the line are clamped to the line end.
    pub fn offset(&self, location: Location) -> Option<usize> {
        let line = self.line(location.line)?;
        let start = self.line_starts[location.line as usize - 1];
        let mut column = 1;

        for (index, character) in line.char_indices() {
            if column >= location.column as usize {
                return Some(start + index);
            }
            column += character.len_utf16();
        }

        Some(start + line.len())
    }

    /// The source text covered by the given span.
    pub fn snippet(&self, span: Span) -> &str {
        match (self.offset(span.start), self.offset(span.end)) {
            (Some(start), Some(end)) if start <= end => &self.content[start..end],
            (Some(start), None) => &self.content[start..],
            _ => "",
        }
    }

    fn line_with_highlight(&self, number: u32, start: Location, end: Location) -> LineWithHighlight<'_> {
        let content = self.line(number).unwrap_or_default();
        let line_start = Location::new(number, 1);
        let end = if end.line > number {
            Location::new(number, column_after(content))
        } else {
            end
        };

        let prefix = self.snippet(Span::new(line_start, start.max(line_start)));
        let highlighted = self.snippet(Span::new(start, end.max(start)));

        LineWithHighlight {
            number,
            content,
            highlight: Highlight {
                start: start.column,
                end: end.column,
                width: highlighted.width(),
                prefix_width: prefix.width(),
            },
        }
    }
}

fn line_starts(content: &str) -> Vec<usize> {
    let mut starts = vec![0];
    let bytes = content.as_bytes();
    let mut index = 0;

    while index < bytes.len() {
        match bytes[index] {
            b'\r' if bytes.get(index + 1) == Some(&b'\n') => {
                index += 2;
                starts.push(index);
            }
            b'\r' | b'\n' => {
                index += 1;
                starts.push(index);
            }
            _ => index += 1,
        }
    }

    starts
}

#[allow(clippy::cast_possible_truncation)]
fn column_after(line: &str) -> u32 {
    line.chars().map(char::len_utf16).sum::<usize>() as u32 + 1
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum FileName {
    Anonymous,
    Stdin,
    Path(PathBuf),
    Virtual(&'static str),
}

impl FileName {
    pub fn path(&self) -> Option<&Path> {
        obtain!(self, Self::Path(path) => path.as_path())
    }
}

impl From<PathBuf> for FileName {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&'static str> for FileName {
    fn from(name: &'static str) -> Self {
        Self::Virtual(name)
    }
}

impl std::fmt::Display for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "<anonymous>"),
            Self::Stdin => write!(f, "<stdin>"),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Virtual(name) => write!(f, "{name}"),
        }
    }
}

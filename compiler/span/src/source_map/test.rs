use super::{FileName::Anonymous, Highlight, LineWithHighlight, LinesWithHighlight, SourceFile, SourceMap};
use crate::{span, Location};

#[test]
fn every_line_break_flavor_counts_once() {
    let file = SourceFile::new(Anonymous, "a\r\nb\rc\nd".into());

    assert_eq!(file.line_count(), 4);
    assert_eq!(file.line(1), Some("a"));
    assert_eq!(file.line(2), Some("b"));
    assert_eq!(file.line(3), Some("c"));
    assert_eq!(file.line(4), Some("d"));
    assert_eq!(file.line(5), None);
}

#[test]
fn offsets_and_locations_agree() {
    let file = SourceFile::new(Anonymous, "int x;\r\n  x = 1;\n".into());

    assert_eq!(file.location(0), Location::new(1, 1));
    assert_eq!(file.location(4), Location::new(1, 5));
    assert_eq!(file.location(10), Location::new(2, 3));
    assert_eq!(file.offset(Location::new(2, 3)), Some(10));
    assert_eq!(file.offset(Location::new(1, 5)), Some(4));
}

#[test]
fn columns_count_utf16_code_units() {
    // U+1D11E needs a surrogate pair
    let file = SourceFile::new(Anonymous, "\u{1D11E}x é".into());

    assert_eq!(file.location(4), Location::new(1, 3));
    assert_eq!(file.offset(Location::new(1, 3)), Some(4));
    assert_eq!(file.location(6), Location::new(1, 5));
}

#[test]
fn columns_past_the_line_end_are_clamped() {
    let file = SourceFile::new(Anonymous, "ab\ncd".into());

    assert_eq!(file.offset(Location::new(1, 40)), Some(2));
    assert_eq!(file.offset(Location::new(3, 1)), None);
}

#[test]
fn snippet_spanning_lines() {
    let file = SourceFile::new(Anonymous, "void f() {\n}\n".into());

    assert_eq!(file.snippet(span(1, 10, 2, 2)), "{\n}");
}

#[test]
fn lines_single_line_highlight() {
    let mut map = SourceMap::default();
    let file = map.add_str(Anonymous, "abcdefghijklmnopq\n");

    assert_eq!(
        map.lines_with_highlight(file, span(1, 4, 1, 7)),
        LinesWithHighlight {
            file: &Anonymous,
            first: LineWithHighlight {
                number: 1,
                content: "abcdefghijklmnopq",
                highlight: Highlight { start: 4, end: 7, width: 3, prefix_width: 3 },
            },
            last: None,
        }
    );
}

#[test]
fn lines_multi_line_highlight() {
    let mut map = SourceMap::default();
    let file = map.add_str(Anonymous, "struct S\n{\n    int x;\n}");

    let lines = map.lines_with_highlight(file, span(2, 1, 4, 2));

    assert_eq!(lines.first.number, 2);
    assert_eq!(lines.first.content, "{");
    assert_eq!(lines.first.highlight.width, 1);
    let last = lines.last.unwrap();
    assert_eq!(last.number, 4);
    assert_eq!(last.highlight, Highlight { start: 1, end: 2, width: 1, prefix_width: 0 });
}

use crate::{reporter::Buffer, Diagnostic, ErrorCode, Reporter, Severity};
use span::{span, FileName::Anonymous, SourceMap};
use utility::assert_eq;

#[test]
fn format_no_highlights() {
    let diagnostic = Diagnostic::error().code(ErrorCode::E000).message("summary");

    assert_eq(diagnostic.format(None), "error[E000]: summary".to_owned());
}

#[test]
fn format_single_line_primary_highlight() {
    let mut map = SourceMap::default();
    let file = map.add_str(Anonymous, "alpha\nbeta\ngamma\n");

    let diagnostic = Diagnostic::error()
        .message("message")
        .file(file)
        .unlabeled_span(span(2, 2, 2, 5));

    assert_eq(
        diagnostic.format(Some(&map)),
        "\
error: message
  ┌─ <anonymous>:2:2
  │
2 │ beta
  │  ═══"
            .to_owned(),
    );
}

#[test]
fn format_labeled_highlight_with_note() {
    let mut map = SourceMap::default();
    let file = map.add_str(Anonymous, "int x = y;");

    let diagnostic = Diagnostic::error()
        .code(ErrorCode::E020)
        .message("undefined identifier ‘y’")
        .file(file)
        .span(span(1, 9, 1, 10), "not found in this scope")
        .note("did you mean ‘x’");

    assert_eq(
        diagnostic.format(Some(&map)),
        "\
error[E020]: undefined identifier ‘y’
  ┌─ <anonymous>:1:9
  │
1 │ int x = y;
  │         ═ not found in this scope
  │
 note: did you mean ‘x’"
            .to_owned(),
    );
}

#[test]
fn format_location_without_source_map() {
    let diagnostic = Diagnostic::error()
        .message("expected ‘;’")
        .span(span(3, 4, 3, 5), "here");

    assert_eq(
        diagnostic.format(None),
        "error: expected ‘;’\n  ─ 3:4 here".to_owned(),
    );
}

#[test]
fn buffer_keeps_source_order() {
    let buffer = Buffer::default();
    let reporter = Reporter::buffer(buffer.clone());

    Diagnostic::error().message("second").unlabeled_span(span(5, 1, 5, 2)).report(&reporter);
    Diagnostic::error().message("first").unlabeled_span(span(1, 1, 1, 2)).report(&reporter);

    let messages: Vec<_> = buffer
        .lock()
        .unwrap()
        .iter()
        .map(|diagnostic| diagnostic.message.clone().unwrap_or_default())
        .collect();

    assert_eq(messages, vec!["first".into(), "second".into()]);
}

#[test]
fn debug_diagnostics_keep_their_severity() {
    let diagnostic = Diagnostic::debug().message("cache hit");

    assert_eq(diagnostic.severity, Severity::Debug);
    assert_eq(diagnostic.location(), None);
}

#[test]
fn error_codes_round_trip_through_their_names() {
    for code in ErrorCode::ELEMENTS {
        assert_eq(code.to_string().parse::<ErrorCode>(), Ok(code));
    }
}

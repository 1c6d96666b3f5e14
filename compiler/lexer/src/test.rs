use crate::{
    lex,
    token::{Literal, LiteralFormat, LiteralSubformat, LiteralValue, Token, TokenKind, TokenKind::*},
    BareError, CommentKind, Error, Lexer, LexerOptions, Outcome,
};
use span::{span, Location};

fn lex_default(source: &str) -> Outcome {
    lex(source, LexerOptions::default())
}

fn kinds(source: &str) -> Vec<TokenKind> {
    lex_default(source).tokens.into_iter().map(|token| token.kind).collect()
}

/// The value of the one and only literal in the source.
fn literal(source: &str) -> Literal {
    let outcome = lex_default(source);
    assert_eq!(outcome.errors, Vec::new(), "unexpected errors lexing {source:?}");
    assert_eq!(outcome.tokens.len(), 2, "expected a single token lexing {source:?}");
    outcome.tokens[0].literal.clone().unwrap()
}

fn text(source: &str) -> String {
    match literal(source).value {
        LiteralValue::Text(text) => text,
        value => panic!("expected a string literal, got {value:?}"),
    }
}

#[test]
fn keywords_identifiers_and_symbols() {
    utility::assert_eq(
        lex_default("int x = y >>>= 2;").tokens,
        vec![
            Token::new(Int, span(1, 1, 1, 4)),
            Token::identifier(span(1, 5, 1, 6), "x"),
            Token::new(Equals, span(1, 7, 1, 8)),
            Token::identifier(span(1, 9, 1, 10), "y"),
            Token::new(UnsignedShiftRightEquals, span(1, 11, 1, 15)),
            Token::literal(
                span(1, 16, 1, 17),
                "2",
                Literal::new(LiteralFormat::Scalar, LiteralSubformat::empty(), LiteralValue::Integer(2)),
            ),
            Token::new(Semicolon, span(1, 17, 1, 18)),
            Token::new(EndOfFile, span(1, 18, 1, 18)),
        ],
    );
}

#[test]
fn longest_symbol_wins() {
    assert_eq!(
        kinds("a..b ... => ^^= !is"),
        vec![Identifier, DoubleDot, Identifier, TripleDot, WideArrowRight, DoubleCaretEquals, Exclamation, Is, EndOfFile],
    );
}

#[test]
fn end_of_file_repeats() {
    let mut lexer = Lexer::new("x", LexerOptions::default());
    assert_eq!(lexer.next_token().kind, Identifier);
    assert_eq!(lexer.next_token().kind, EndOfFile);
    assert_eq!(lexer.next_token().kind, EndOfFile);
}

#[test]
fn special_end_of_file_token_ends_input() {
    assert_eq!(kinds("a __EOF__ b c"), vec![Identifier, EndOfFile]);
}

#[test]
fn stop_ends_input() {
    let mut lexer = Lexer::new("a b c", LexerOptions::default());
    lexer.next_token();
    lexer.stop();
    assert!(lexer.is_stopped());
    assert_eq!(lexer.next_token().kind, EndOfFile);
}

#[test]
fn shebang_line_is_skipped() {
    assert_eq!(kinds("#!/usr/bin/env rdmd\nvoid"), vec![Void, EndOfFile]);
}

#[test]
fn line_directive_is_skipped() {
    assert_eq!(kinds("#line 10 \"file.d\"\nint"), vec![Int, EndOfFile]);
}

#[test]
fn columns_count_utf16_code_units() {
    let tokens = lex_default("\"𝔸\" x").tokens;
    assert_eq!(tokens[0].span, span(1, 1, 1, 5));
    assert_eq!(tokens[1].span, span(1, 6, 1, 7));
}

#[test]
fn line_breaks() {
    let tokens = lex_default("a\r\nb\rc\nd").tokens;
    let starts: Vec<_> = tokens.iter().map(|token| token.span.start).collect();
    assert_eq!(
        starts,
        vec![Location::new(1, 1), Location::new(2, 1), Location::new(3, 1), Location::new(4, 1), Location::new(4, 2)],
    );
}

#[test]
fn custom_start_location() {
    let options = LexerOptions { start: Location::new(5, 9), ..LexerOptions::default() };
    let outcome = lex("void", options);
    assert_eq!(outcome.tokens[0].span, span(5, 9, 5, 13));
}

#[test]
fn hexadecimal_integer() {
    assert_eq!(literal("0x1A").value, LiteralValue::Integer(26));
}

#[test]
fn binary_integer() {
    assert_eq!(literal("0b101").value, LiteralValue::Integer(5));
}

#[test]
fn underscores_are_ignored() {
    assert_eq!(literal("1_000").value, LiteralValue::Integer(1000));
    assert_eq!(literal("0xFF_FF").value, LiteralValue::Integer(0xFFFF));
}

#[test]
fn leading_zero_is_decimal() {
    assert_eq!(literal("010").value, LiteralValue::Integer(10));
}

#[test]
fn integer_suffixes() {
    let literal = literal("42uL");
    assert_eq!(literal.subformat, LiteralSubformat::UNSIGNED | LiteralSubformat::LONG);
    assert_eq!(literal.basic_type(), Ulong);
}

#[test]
fn float_suffix() {
    let literal = literal("1.5f");
    assert_eq!(literal.format, LiteralFormat::FloatingPoint);
    assert_eq!(literal.value, LiteralValue::Float(1.5));
    assert_eq!(literal.basic_type(), Float);
}

#[test]
fn integer_with_float_suffix_is_floating_point() {
    let literal = literal("3f");
    assert_eq!(literal.format, LiteralFormat::FloatingPoint);
    assert_eq!(literal.value, LiteralValue::Float(3.0));
}

#[test]
fn exponents() {
    assert_eq!(literal("2.5e2").value, LiteralValue::Float(250.0));
    assert_eq!(literal("1e-1").value, LiteralValue::Float(0.1));
    assert_eq!(literal("0x1.8p1").value, LiteralValue::Float(3.0));
}

#[test]
fn leading_dot_float() {
    assert_eq!(literal(".5").value, LiteralValue::Float(0.5));
}

#[test]
fn range_after_integer_is_not_a_fraction() {
    assert_eq!(kinds("0..10"), vec![TokenKind::Literal, DoubleDot, TokenKind::Literal, EndOfFile]);
}

#[test]
fn member_access_on_integer_is_not_a_fraction() {
    assert_eq!(kinds("1.max"), vec![TokenKind::Literal, Dot, Identifier, EndOfFile]);
}

#[test]
fn integer_overflow() {
    let outcome = lex_default("99999999999999999999");
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].bare, BareError::NumberLiteralOverflow);
}

#[test]
fn unreadable_number() {
    let outcome = lex_default("0b12");
    assert_eq!(outcome.errors[0].bare, BareError::UnreadableNumberLiteral);
    assert_eq!(outcome.tokens.len(), 2);
}

#[test]
fn escapes() {
    assert_eq!(text(r#""a\tb\n""#), "a\tb\n");
    assert_eq!(text(r#""\101""#), "A");
    assert_eq!(text(r#""\x41\u00e9""#), "Aé");
    assert_eq!(text(r#""\U0001D538""#), "𝔸");
    assert_eq!(text(r#""\&amp;\&eacute;""#), "&é");
}

#[test]
fn invalid_escape_is_reported_and_recovered() {
    let outcome = lex_default(r#""a\qb""#);
    assert_eq!(
        outcome.errors,
        vec![Error { bare: BareError::InvalidEscapeSequence(r"\q".into()), span: span(1, 3, 1, 5) }],
    );
    assert_eq!(outcome.tokens[0].literal.as_ref().unwrap().value, LiteralValue::Text("a\u{FFFD}b".into()));
}

#[test]
fn undefined_named_entity() {
    let outcome = lex_default(r#""\&bogus;""#);
    assert_eq!(outcome.errors[0].bare, BareError::UndefinedNamedEntity("bogus".into()));
}

#[test]
fn verbatim_strings() {
    assert_eq!(text(r#"r"C:\path""#), r"C:\path");
    assert_eq!(text("`a``b`"), "a`b");
    assert_eq!(literal("`x`").format, LiteralFormat::VerbatimString);
}

#[test]
fn hex_string() {
    assert_eq!(text(r#"x"41 42""#), "AB");
}

#[test]
fn malformed_hex_string() {
    let outcome = lex_default(r#"x"414""#);
    assert_eq!(outcome.errors[0].bare, BareError::MalformedHexString);
}

#[test]
fn delimited_strings() {
    assert_eq!(text(r#"q"(a(b)c)""#), "a(b)c");
    assert_eq!(text(r#"q"/abc/""#), "abc");
    assert_eq!(text("q\"EOS\nline one\nline two\nEOS\""), "line one\nline two\n");
}

#[test]
fn token_string() {
    assert_eq!(text("q{ int x = { 1 }; /* } */ }"), " int x = { 1 }; /* } */ ");
}

#[test]
fn string_suffixes() {
    assert_eq!(literal(r#""a"w"#).basic_type(), Wchar);
    assert_eq!(literal(r#""a"d"#).subformat, LiteralSubformat::UTF32);
}

#[test]
fn unterminated_string() {
    let outcome = lex_default("\"abc");
    assert_eq!(outcome.errors, vec![Error { bare: BareError::UnterminatedStringLiteral, span: span(1, 1, 1, 5) }]);
    assert_eq!(outcome.tokens[0].kind, TokenKind::Literal);
}

#[test]
fn character_literals() {
    assert_eq!(literal("'a'").value, LiteralValue::Char('a'));
    assert_eq!(literal(r"'\n'").value, LiteralValue::Char('\n'));
    assert_eq!(literal("'Ω'").basic_type(), Wchar);
}

#[test]
fn empty_character_literal() {
    let outcome = lex_default("''");
    assert_eq!(outcome.errors[0].bare, BareError::EmptyCharacterLiteral);
}

#[test]
fn unterminated_character_literal() {
    let outcome = lex_default("'ab'");
    assert_eq!(outcome.errors[0].bare, BareError::UnterminatedCharacterLiteral);
}

#[test]
fn invalid_character() {
    let outcome = lex_default("a \u{0} b");
    assert_eq!(outcome.errors, vec![Error { bare: BareError::InvalidCharacter('\0'), span: span(1, 3, 1, 4) }]);
    assert_eq!(outcome.tokens.len(), 3);
}

#[test]
fn documentation_comments_are_collected() {
    let outcome = lex_default("/// line\n/** block */ int /++ nested /+ inner +/ +/ // plain");
    let comments: Vec<_> = outcome.comments.iter().map(|comment| (comment.kind, comment.content())).collect();
    assert_eq!(
        comments,
        vec![
            (CommentKind::Line, "line".to_owned()),
            (CommentKind::Block, "block".to_owned()),
            (CommentKind::BlockNested, "nested /+ inner +/".to_owned()),
        ],
    );
    assert!(outcome.comments[0].starts_at_line_start);
    assert!(!outcome.comments[2].starts_at_line_start);
}

#[test]
fn plain_comments_are_kept_on_request() {
    let options = LexerOptions { keep_all_comments: true, ..LexerOptions::default() };
    let outcome = lex("// one\n/* two */ /**/", options);
    assert_eq!(outcome.comments.len(), 3);
    assert!(outcome.comments.iter().all(|comment| !comment.documentation));
}

#[test]
fn ditto_comment() {
    let outcome = lex_default("/// Ditto\n");
    assert!(outcome.comments[0].is_ditto());
}

#[test]
fn unterminated_block_comment() {
    let outcome = lex_default("int /* never closed");
    assert_eq!(outcome.errors[0].bare, BareError::UnterminatedBlockComment);
    assert_eq!(outcome.tokens.len(), 2);
}

#[test]
fn skip_current_block() {
    let mut lexer = Lexer::new("{ x = \"}\"; { '}'; } /* } */ } y", LexerOptions::default());
    assert_eq!(lexer.next_token().kind, OpeningCurlyBracket);
    assert_eq!(lexer.skip_current_block(), Some(span(1, 29, 1, 30)));
    assert_eq!(lexer.next_token().text, "y");
}

#[test]
fn skip_unclosed_block() {
    let mut lexer = Lexer::new("{ { }", LexerOptions::default());
    lexer.next_token();
    assert_eq!(lexer.skip_current_block(), None);
    assert_eq!(lexer.next_token().kind, EndOfFile);
}

#[test]
fn identifier_too_long() {
    let source = "a".repeat(crate::MAXIMUM_IDENTIFIER_LENGTH + 1);
    let outcome = lex_default(&source);
    assert_eq!(outcome.errors[0].bare, BareError::IdentifierTooLong(crate::MAXIMUM_IDENTIFIER_LENGTH + 1));
}

//! The lexical analyzer (lexer).
//!
//! The lexer is pulled by the parser one token at a time via [`Lexer::next_token`].
//! Comments do not become tokens but are collected on the side, as are lexical errors.
//! Neither kind of problem ever stops the lexer: it recovers on a best-effort basis and
//! only the end of input (or an explicit [`Lexer::stop`]) ends the token stream.

use diagnostics::{Diagnostic, ErrorCode};
use span::{Location, Span, Spanning};
use std::mem;
use token::{Token, TokenKind};
use utility::Str;

pub mod entity;
mod literal;
pub mod token;

#[cfg(test)]
mod test;

/// Identifiers longer than this are reported (but still lexed).
pub const MAXIMUM_IDENTIFIER_LENGTH: usize = 1024;

/// Lex the given source text in one go.
pub fn lex(source: &str, options: LexerOptions) -> Outcome {
    let mut lexer = Lexer::new(source, options);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token();
        let is_end = token.kind == TokenKind::EndOfFile;
        tokens.push(token);
        if is_end {
            break;
        }
    }

    Outcome { tokens, comments: lexer.take_comments(), errors: lexer.take_errors() }
}

#[derive(Debug, PartialEq)]
pub struct Outcome {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
    pub errors: Vec<Error>,
}

#[derive(Clone, Copy, Debug)]
pub struct LexerOptions {
    /// Retain plain comments in addition to documentation comments.
    pub keep_all_comments: bool,
    /// The location of the first character, used when lexing a region of a larger file.
    pub start: Location,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self { keep_all_comments: false, start: Location::START }
    }
}

/// The state of the lexer.
pub struct Lexer<'a> {
    source: &'a str,
    /// The byte offset of the next character.
    offset: usize,
    /// The location of the next character.
    location: Location,
    token_offset: usize,
    token_start: Location,
    /// The line the previous token ended on.
    last_token_line: Option<u32>,
    options: LexerOptions,
    comments: Vec<Comment>,
    errors: Vec<Error>,
    record_comments: bool,
    stopped: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, options: LexerOptions) -> Self {
        let mut lexer = Self {
            source,
            offset: 0,
            location: options.start,
            token_offset: 0,
            token_start: options.start,
            last_token_line: None,
            options,
            comments: Vec::new(),
            errors: Vec::new(),
            record_comments: true,
            stopped: false,
        };

        if source.starts_with("#!") {
            lexer.skip_line();
        }

        lexer
    }

    /// Produce the next token.
    ///
    /// After the end of input is reached, every further call yields another end-of-file token.
    pub fn next_token(&mut self) -> Token {
        loop {
            if self.stopped {
                self.start_token();
                return Token::new(TokenKind::EndOfFile, self.span());
            }

            self.skip_whitespace_and_comments();
            self.start_token();

            let Some(character) = self.peek() else {
                self.stopped = true;
                continue;
            };

            let token = match character {
                'r' | 'x' if self.peek_nth(1) == Some('"') => self.lex_prefixed_string(),
                'q' if matches!(self.peek_nth(1), Some('"' | '{')) => self.lex_prefixed_string(),
                character if is_identifier_start(character) => match self.lex_identifier() {
                    Some(token) => token,
                    None => {
                        // `__EOF__`
                        self.stopped = true;
                        continue;
                    }
                },
                '0'..='9' => self.lex_number_literal(),
                '.' if self.peek_nth(1).is_some_and(|character| character.is_ascii_digit()) => {
                    self.lex_number_literal()
                }
                '"' => self.lex_string_literal(),
                '`' => self.lex_verbatim_string_literal('`'),
                '\'' => self.lex_character_literal(),
                '#' if self.rest().starts_with("#line") => {
                    self.skip_line();
                    continue;
                }
                _ => match self.lex_symbol() {
                    Some(kind) => Token::new(kind, self.span()),
                    None => {
                        self.advance();
                        self.error(BareError::InvalidCharacter(character));
                        continue;
                    }
                },
            };

            self.last_token_line = Some(token.span.end.line);
            return token;
        }
    }

    /// Make every further call of [`Self::next_token`] return end of input.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// The location of the next character to be lexed.
    pub fn location(&self) -> Location {
        self.location
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn take_comments(&mut self) -> Vec<Comment> {
        mem::take(&mut self.comments)
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<Error> {
        mem::take(&mut self.errors)
    }

    /// Skip the rest of a block whose opening curly bracket was the last token produced.
    ///
    /// Raw-scans the source honoring string literals and comments until the matching
    /// closing bracket and returns its span. Returns `None` if the input ends first.
    pub fn skip_current_block(&mut self) -> Option<Span> {
        let mut depth = 1_usize;
        self.record_comments = false;

        let closing = loop {
            self.start_token();

            let Some(character) = self.peek() else {
                break None;
            };

            match character {
                '{' => {
                    self.advance();
                    depth += 1;
                }
                '}' => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        break Some(self.span());
                    }
                }
                '/' if matches!(self.peek_nth(1), Some('/' | '*' | '+')) => self.lex_comment(),
                'r' | 'x' if self.peek_nth(1) == Some('"') => {
                    self.lex_prefixed_string();
                }
                'q' if matches!(self.peek_nth(1), Some('"' | '{')) => {
                    self.lex_prefixed_string();
                }
                character if is_identifier_start(character) => {
                    self.take_while(is_identifier_middle);
                }
                '"' => {
                    self.lex_string_literal();
                }
                '`' => {
                    self.lex_verbatim_string_literal('`');
                }
                '\'' => {
                    self.lex_character_literal();
                }
                _ => {
                    self.advance();
                }
            }
        };

        self.record_comments = true;
        self.last_token_line = Some(self.location.line);
        closing
    }

    fn lex_identifier(&mut self) -> Option<Token> {
        self.take_while(is_identifier_middle);

        let name = self.token_text();

        if let Some(keyword) = TokenKind::keyword(name) {
            if keyword == TokenKind::SpecialEndOfFile {
                return None;
            }
            return Some(Token::new(keyword, self.span()));
        }

        let length = name.chars().count();
        if length > MAXIMUM_IDENTIFIER_LENGTH {
            self.error(BareError::IdentifierTooLong(length));
        }

        Some(Token::identifier(self.span(), name))
    }

    fn lex_symbol(&mut self) -> Option<TokenKind> {
        use TokenKind::*;

        let character = self.peek()?;
        let second = self.peek_nth(1);
        let third = self.peek_nth(2);
        let fourth = self.peek_nth(3);

        let (kind, length) = match (character, second, third, fourth) {
            ('>', Some('>'), Some('>'), Some('=')) => (UnsignedShiftRightEquals, 4),
            ('>', Some('>'), Some('>'), _) => (UnsignedShiftRight, 3),
            ('>', Some('>'), Some('='), _) => (ShiftRightEquals, 3),
            ('<', Some('<'), Some('='), _) => (ShiftLeftEquals, 3),
            ('^', Some('^'), Some('='), _) => (DoubleCaretEquals, 3),
            ('.', Some('.'), Some('.'), _) => (TripleDot, 3),
            ('>', Some('>'), ..) => (ShiftRight, 2),
            ('>', Some('='), ..) => (GreaterThanOrEqual, 2),
            ('<', Some('<'), ..) => (ShiftLeft, 2),
            ('<', Some('='), ..) => (LessThanOrEqual, 2),
            ('^', Some('^'), ..) => (DoubleCaret, 2),
            ('^', Some('='), ..) => (CaretEquals, 2),
            ('.', Some('.'), ..) => (DoubleDot, 2),
            ('&', Some('&'), ..) => (DoubleAmpersand, 2),
            ('&', Some('='), ..) => (AmpersandEquals, 2),
            ('|', Some('|'), ..) => (DoubleBar, 2),
            ('|', Some('='), ..) => (BarEquals, 2),
            ('-', Some('-'), ..) => (DoubleMinus, 2),
            ('-', Some('='), ..) => (MinusEquals, 2),
            ('+', Some('+'), ..) => (DoublePlus, 2),
            ('+', Some('='), ..) => (PlusEquals, 2),
            ('!', Some('='), ..) => (NotEquals, 2),
            ('=', Some('='), ..) => (DoubleEquals, 2),
            ('=', Some('>'), ..) => (WideArrowRight, 2),
            ('*', Some('='), ..) => (AsteriskEquals, 2),
            ('/', Some('='), ..) => (SlashEquals, 2),
            ('%', Some('='), ..) => (PercentEquals, 2),
            ('~', Some('='), ..) => (TildeEquals, 2),
            ('>', ..) => (GreaterThan, 1),
            ('<', ..) => (LessThan, 1),
            ('^', ..) => (Caret, 1),
            ('.', ..) => (Dot, 1),
            ('&', ..) => (Ampersand, 1),
            ('|', ..) => (Bar, 1),
            ('-', ..) => (Minus, 1),
            ('+', ..) => (Plus, 1),
            ('!', ..) => (Exclamation, 1),
            ('=', ..) => (Equals, 1),
            ('*', ..) => (Asterisk, 1),
            ('/', ..) => (Slash, 1),
            ('%', ..) => (Percent, 1),
            ('~', ..) => (Tilde, 1),
            ('(', ..) => (OpeningRoundBracket, 1),
            (')', ..) => (ClosingRoundBracket, 1),
            ('[', ..) => (OpeningSquareBracket, 1),
            (']', ..) => (ClosingSquareBracket, 1),
            ('{', ..) => (OpeningCurlyBracket, 1),
            ('}', ..) => (ClosingCurlyBracket, 1),
            ('?', ..) => (QuestionMark, 1),
            (',', ..) => (Comma, 1),
            (';', ..) => (Semicolon, 1),
            (':', ..) => (Colon, 1),
            ('$', ..) => (Dollar, 1),
            ('@', ..) => (At, 1),
            ('#', ..) => (Hash, 1),
            _ => return None,
        };

        for _ in 0..length {
            self.advance();
        }

        Some(kind)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(character) = self.peek() {
            match character {
                '/' if matches!(self.peek_nth(1), Some('/' | '*' | '+')) => {
                    self.start_token();
                    self.lex_comment();
                }
                character if character.is_whitespace() => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    /// Lex a comment starting at the current slash.
    fn lex_comment(&mut self) {
        self.advance();

        let (kind, text, documentation) = match self.advance() {
            Some('/') => {
                let documentation = self.peek() == Some('/');
                let content_start = self.offset;
                self.take_while(|character| !matches!(character, '\n' | '\r'));
                (CommentKind::Line, self.slice(content_start, self.offset), documentation)
            }
            Some('*') => {
                // `/**/` is empty and not a documentation comment
                let documentation = self.peek() == Some('*') && self.peek_nth(1) != Some('/');
                let content_start = self.offset;
                let mut content_end = None;

                while let Some(character) = self.advance() {
                    if character == '*' && self.peek() == Some('/') {
                        content_end = Some(self.offset - 1);
                        self.advance();
                        break;
                    }
                }

                let content_end = content_end.unwrap_or_else(|| {
                    self.error(BareError::UnterminatedBlockComment);
                    self.offset
                });
                (CommentKind::Block, self.slice(content_start, content_end), documentation)
            }
            _ => {
                let documentation = self.peek() == Some('+') && self.peek_nth(1) != Some('/');
                let content_start = self.offset;
                let mut content_end = None;
                let mut depth = 1_usize;

                while let Some(character) = self.advance() {
                    match character {
                        '/' if self.peek() == Some('+') => {
                            self.advance();
                            depth += 1;
                        }
                        '+' if self.peek() == Some('/') => {
                            depth -= 1;
                            if depth == 0 {
                                content_end = Some(self.offset - 1);
                                self.advance();
                                break;
                            }
                            self.advance();
                        }
                        _ => {}
                    }
                }

                let content_end = content_end.unwrap_or_else(|| {
                    self.error(BareError::UnterminatedBlockComment);
                    self.offset
                });
                (CommentKind::BlockNested, self.slice(content_start, content_end), documentation)
            }
        };

        if self.record_comments && (documentation || self.options.keep_all_comments) {
            let text = if documentation { &text[1..] } else { text };
            let starts_at_line_start = self.last_token_line != Some(self.token_start.line);

            self.comments.push(Comment {
                kind,
                documentation,
                text: text.to_owned(),
                span: self.span(),
                starts_at_line_start,
            });
        }
    }

    fn skip_line(&mut self) {
        self.take_while(|character| !matches!(character, '\n' | '\r'));
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Step over the next character keeping track of the location.
    fn advance(&mut self) -> Option<char> {
        let character = self.peek()?;
        self.offset += character.len_utf8();

        self.location = match character {
            '\n' => self.location.next_line(),
            // the line feed of a `\r\n` sequence moves to the next line
            '\r' if self.peek() == Some('\n') => self.location,
            '\r' => self.location.next_line(),
            character => self.location.advance(character),
        };

        Some(character)
    }

    /// Step over all succeeding characters where the predicate holds.
    fn take_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(character) = self.peek() {
            if !predicate(character) {
                break;
            }
            self.advance();
        }
    }

    fn start_token(&mut self) {
        self.token_offset = self.offset;
        self.token_start = self.location;
    }

    fn token_text(&self) -> &'a str {
        &self.source[self.token_offset..self.offset]
    }

    fn span(&self) -> Span {
        Span::new(self.token_start, self.location)
    }

    fn error(&mut self, error: BareError) {
        self.error_at(self.span(), error);
    }

    fn error_at(&mut self, span: Span, error: BareError) {
        self.errors.push(Error { bare: error, span });
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Yield tokens up to but excluding the end of input.
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_token()).filter(|token| token.kind != TokenKind::EndOfFile)
    }
}

fn is_identifier_start(character: char) -> bool {
    character == '_' || character.is_alphabetic()
}

fn is_identifier_middle(character: char) -> bool {
    character == '_' || character.is_alphanumeric()
}

/// A comment extracted by the lexer.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Comment {
    pub kind: CommentKind,
    pub documentation: bool,
    /// The text between the delimiters excluding the documentation marker.
    pub text: String,
    pub span: Span,
    /// Whether only whitespace precedes the comment on its line.
    pub starts_at_line_start: bool,
}

impl Comment {
    /// The text without leading decoration like `*` or `+` in front of each line.
    pub fn content(&self) -> String {
        let decoration: &[char] = match self.kind {
            CommentKind::Block => &['*'],
            CommentKind::BlockNested => &['+'],
            CommentKind::Line => &['/'],
        };

        let lines: Vec<_> = self
            .text
            .lines()
            .map(|line| line.trim().trim_start_matches(decoration).trim_end_matches(decoration).trim())
            .collect();

        lines.join("\n").trim().to_owned()
    }

    pub fn is_ditto(&self) -> bool {
        self.content().eq_ignore_ascii_case("ditto")
    }
}

impl Spanning for Comment {
    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CommentKind {
    /// `/* … */`
    Block,
    /// `/+ … +/`
    BlockNested,
    /// `// …`
    Line,
}

/// A lexical error.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Error {
    pub bare: BareError,
    pub span: Span,
}

impl Error {
    pub fn into_diagnostic(self) -> Diagnostic {
        let (code, message, label) = self.bare.describe();

        Diagnostic::error()
            .code(code)
            .message(message)
            .span(self.span, label)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum BareError {
    UnterminatedBlockComment,
    UnterminatedStringLiteral,
    MalformedHexString,
    UnterminatedCharacterLiteral,
    EmptyCharacterLiteral,
    InvalidEscapeSequence(String),
    UndefinedNamedEntity(String),
    UnreadableNumberLiteral,
    NumberLiteralOverflow,
    IdentifierTooLong(usize),
    InvalidCharacter(char),
}

impl BareError {
    /// The error code, the message and the label of the highlighted span.
    pub fn describe(&self) -> (ErrorCode, Str, &'static str) {
        use BareError::*;

        match self {
            UnterminatedBlockComment => (ErrorCode::E001, "unterminated block comment".into(), "missing the closing delimiter"),
            UnterminatedStringLiteral => (ErrorCode::E002, "unterminated string literal".into(), "missing the closing quotation mark"),
            MalformedHexString => (ErrorCode::E002, "malformed hex string literal".into(), "expected pairs of hexadecimal digits"),
            UnterminatedCharacterLiteral => (ErrorCode::E003, "unterminated character literal".into(), "missing the closing apostrophe"),
            EmptyCharacterLiteral => (ErrorCode::E003, "empty character literal".into(), "expected a character"),
            InvalidEscapeSequence(sequence) => (ErrorCode::E004, format!("invalid escape sequence ‘{sequence}’").into(), "not a valid escape"),
            UndefinedNamedEntity(name) => (ErrorCode::E004, format!("undefined named character entity ‘{name}’").into(), "not a known entity"),
            UnreadableNumberLiteral => (ErrorCode::E005, "unreadable number literal".into(), "malformed digits or suffix"),
            NumberLiteralOverflow => (ErrorCode::E005, "number literal does not fit 64 bits".into(), "too large"),
            IdentifierTooLong(length) => (ErrorCode::E006, format!("identifier of length {length} exceeds the maximum of {MAXIMUM_IDENTIFIER_LENGTH}").into(), "too long"),
            InvalidCharacter(character) => (ErrorCode::E007, format!("invalid character U+{:04X}", u32::from(*character)).into(), "unexpected character"),
        }
    }
}

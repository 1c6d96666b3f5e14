//! Number, string and character literals.

use super::{is_identifier_middle, is_identifier_start, BareError, Lexer};
use crate::token::{Literal, LiteralFormat, LiteralSubformat, LiteralValue, Token};
use span::Span;

impl Lexer<'_> {
    pub(super) fn lex_number_literal(&mut self) -> Token {
        let mut radix = 10_u32;

        if self.peek() == Some('0') {
            match self.peek_nth(1) {
                Some('x' | 'X') => radix = 16,
                Some('b' | 'B') => radix = 2,
                _ => {}
            }
            if radix != 10 {
                self.advance();
                self.advance();
            }
        }

        let integer_digits = self.take_digits(radix);
        let mut fraction_digits = Vec::new();
        let mut exponent = None;
        let mut is_floating_point = false;
        let mut unreadable = radix != 10 && integer_digits.is_empty() && self.peek() != Some('.');

        if self.peek() == Some('.') && radix != 2 && self.continues_with_fraction() {
            self.advance();
            is_floating_point = true;
            fraction_digits = self.take_digits(radix);
        }

        let exponent_markers: &[char] = if radix == 16 { &['p', 'P'] } else { &['e', 'E'] };
        if self.peek().is_some_and(|character| exponent_markers.contains(&character)) && radix != 2 {
            self.advance();
            let negative = match self.peek() {
                Some('-') => {
                    self.advance();
                    true
                }
                Some('+') => {
                    self.advance();
                    false
                }
                _ => false,
            };
            let digits = self.take_digits(10);
            if digits.is_empty() {
                unreadable = true;
            }
            let magnitude = digits.iter().fold(0_i32, |value, &digit| value.saturating_mul(10).saturating_add(digit as i32));
            exponent = Some(if negative { -magnitude } else { magnitude });
            is_floating_point = true;
        } else if radix == 16 && is_floating_point {
            // hexadecimal floating point literals require an exponent
            unreadable = true;
        }

        let mut subformat = LiteralSubformat::empty();
        loop {
            let flag = match self.peek() {
                Some('u' | 'U') if !is_floating_point => LiteralSubformat::UNSIGNED,
                Some('L') if is_floating_point => LiteralSubformat::REAL,
                Some('L') => LiteralSubformat::LONG,
                Some('f' | 'F') if radix != 2 && !subformat.contains(LiteralSubformat::UNSIGNED) => {
                    is_floating_point = true;
                    LiteralSubformat::FLOAT
                }
                Some('i') => LiteralSubformat::IMAGINARY,
                _ => break,
            };
            if subformat.contains(flag) {
                unreadable = true;
            }
            subformat |= flag;
            self.advance();
        }

        if self.peek().is_some_and(is_identifier_middle) {
            self.take_while(is_identifier_middle);
            unreadable = true;
        }

        if unreadable {
            self.error(BareError::UnreadableNumberLiteral);
        }

        let value = if is_floating_point {
            if !subformat.intersects(LiteralSubformat::FLOAT | LiteralSubformat::REAL) {
                subformat |= LiteralSubformat::DOUBLE;
            }
            // an integer part followed by `L` already set `LONG`
            if subformat.contains(LiteralSubformat::LONG) {
                subformat.remove(LiteralSubformat::LONG);
                subformat |= LiteralSubformat::REAL;
            }
            LiteralValue::Float(floating_point_value(radix, &integer_digits, &fraction_digits, exponent))
        } else {
            match integer_value(radix, &integer_digits) {
                Some(value) => LiteralValue::Integer(value),
                None => {
                    self.error(BareError::NumberLiteralOverflow);
                    LiteralValue::Integer(u64::MAX)
                }
            }
        };

        let format = if is_floating_point { LiteralFormat::FloatingPoint } else { LiteralFormat::Scalar };
        Token::literal(self.span(), self.token_text(), Literal::new(format, subformat, value))
    }

    /// Whether the dot at the current position starts a fraction as opposed to a range or a member access.
    fn continues_with_fraction(&self) -> bool {
        match self.peek_nth(1) {
            Some('.') => false,
            Some(character) if character.is_ascii_digit() => true,
            Some(character) => !is_identifier_start(character),
            None => true,
        }
    }

    fn take_digits(&mut self, radix: u32) -> Vec<u32> {
        let mut digits = Vec::new();

        while let Some(character) = self.peek() {
            if character == '_' {
                self.advance();
                continue;
            }
            // exponent markers are hexadecimal digits
            let Some(digit) = character.to_digit(radix) else { break };
            digits.push(digit);
            self.advance();
        }

        digits
    }

    pub(super) fn lex_string_literal(&mut self) -> Token {
        self.advance();
        let mut content = String::new();
        let mut terminated = false;

        while let Some(character) = self.peek() {
            match character {
                '"' => {
                    self.advance();
                    terminated = true;
                    break;
                }
                '\\' => self.lex_escape_sequence(&mut content),
                character => {
                    self.advance();
                    content.push(character);
                }
            }
        }

        if !terminated {
            self.error(BareError::UnterminatedStringLiteral);
        }

        self.finish_string_literal(LiteralFormat::String, content)
    }

    /// Lex a WYSIWYG string delimited by the given character where a doubled delimiter stands for itself.
    pub(super) fn lex_verbatim_string_literal(&mut self, delimiter: char) -> Token {
        self.advance();
        let content = self.take_verbatim_content(delimiter);
        self.finish_string_literal(LiteralFormat::VerbatimString, content)
    }

    fn take_verbatim_content(&mut self, delimiter: char) -> String {
        let mut content = String::new();

        loop {
            match self.advance() {
                Some(character) if character == delimiter => {
                    if self.peek() == Some(delimiter) {
                        self.advance();
                        content.push(delimiter);
                    } else {
                        break;
                    }
                }
                Some(character) => content.push(character),
                None => {
                    self.error(BareError::UnterminatedStringLiteral);
                    break;
                }
            }
        }

        content
    }

    /// Lex `r"…"`, `x"…"`, `q"…"` and `q{…}`.
    pub(super) fn lex_prefixed_string(&mut self) -> Token {
        let prefix = self.advance();

        match prefix {
            Some('r') => self.lex_verbatim_string_literal('"'),
            Some('x') => self.lex_hex_string_literal(),
            _ if self.peek() == Some('{') => self.lex_token_string_literal(),
            _ => self.lex_delimited_string_literal(),
        }
    }

    fn lex_hex_string_literal(&mut self) -> Token {
        self.advance();
        let mut digits = Vec::new();
        let mut malformed = false;

        loop {
            match self.advance() {
                Some('"') => break,
                Some(character) if character.is_whitespace() => {}
                Some(character) => match character.to_digit(16) {
                    Some(digit) => digits.push(digit),
                    None => malformed = true,
                },
                None => {
                    self.error(BareError::UnterminatedStringLiteral);
                    break;
                }
            }
        }

        if malformed || digits.len() % 2 != 0 {
            self.error(BareError::MalformedHexString);
        }

        let content = digits
            .chunks(2)
            .filter_map(|pair| match *pair {
                [high, low] => char::from_u32(high * 16 + low),
                _ => None,
            })
            .collect();

        self.finish_string_literal(LiteralFormat::String, content)
    }

    /// Lex `q"(…)"`, `q"/…/"` or a heredoc string `q"IDENTIFIER … IDENTIFIER"`.
    fn lex_delimited_string_literal(&mut self) -> Token {
        self.advance();

        let Some(opening) = self.advance() else {
            self.error(BareError::UnterminatedStringLiteral);
            return self.finish_string_literal(LiteralFormat::VerbatimString, String::new());
        };

        let content = if is_identifier_start(opening) {
            self.take_heredoc_content(opening)
        } else {
            let closing = match opening {
                '(' => ')',
                '[' => ']',
                '{' => '}',
                '<' => '>',
                character => character,
            };
            let mut content = String::new();
            let mut depth = 0_usize;

            loop {
                match self.advance() {
                    Some(character) if character == closing && depth == 0 => {
                        if self.peek() == Some('"') {
                            self.advance();
                            break;
                        }
                        content.push(character);
                    }
                    Some(character) if character == closing => {
                        depth -= 1;
                        content.push(character);
                    }
                    Some(character) if character == opening && closing != opening => {
                        depth += 1;
                        content.push(character);
                    }
                    Some(character) => content.push(character),
                    None => {
                        self.error(BareError::UnterminatedStringLiteral);
                        break;
                    }
                }
            }

            content
        };

        self.finish_string_literal(LiteralFormat::VerbatimString, content)
    }

    fn take_heredoc_content(&mut self, first: char) -> String {
        let mut delimiter = String::from(first);
        while let Some(character) = self.peek().filter(|&character| is_identifier_middle(character)) {
            self.advance();
            delimiter.push(character);
        }

        // the delimiter has to be followed by a line break
        match self.peek() {
            Some('\r') => {
                self.advance();
                if self.peek() == Some('\n') {
                    self.advance();
                }
            }
            Some('\n') => {
                self.advance();
            }
            _ => self.error(BareError::UnterminatedStringLiteral),
        }

        let mut content = String::new();

        loop {
            let rest = self.rest();
            let line_end = rest.find(|character: char| matches!(character, '\r' | '\n')).unwrap_or(rest.len());
            let line = &rest[..line_end];

            if line.strip_prefix(delimiter.as_str()).is_some_and(|rest| rest.starts_with('"')) {
                for _ in 0..=delimiter.chars().count() {
                    self.advance();
                }
                break content;
            }

            if rest.is_empty() {
                self.error(BareError::UnterminatedStringLiteral);
                break content;
            }

            while let Some(character) = self.peek() {
                self.advance();
                content.push(character);
                if character == '\n' || (character == '\r' && self.peek() != Some('\n')) {
                    break;
                }
            }
        }
    }

    /// Lex `q{…}` whose content has to consist of balanced curly brackets.
    fn lex_token_string_literal(&mut self) -> Token {
        self.advance();
        let start = self.offset;
        let mut end = None;
        let mut depth = 0_usize;
        let record_comments = std::mem::replace(&mut self.record_comments, false);

        while let Some(character) = self.peek() {
            match character {
                '{' => {
                    self.advance();
                    depth += 1;
                }
                '}' if depth == 0 => {
                    end = Some(self.offset);
                    self.advance();
                    break;
                }
                '}' => {
                    self.advance();
                    depth -= 1;
                }
                '/' if matches!(self.peek_nth(1), Some('/' | '*' | '+')) => self.lex_comment(),
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
        }

        self.record_comments = record_comments;

        let content = match end {
            Some(end) => self.slice(start, end).to_owned(),
            None => {
                self.error(BareError::UnterminatedStringLiteral);
                self.slice(start, self.offset).to_owned()
            }
        };

        self.finish_string_literal(LiteralFormat::VerbatimString, content)
    }

    /// Read the optional encoding suffix and build the token.
    fn finish_string_literal(&mut self, format: LiteralFormat, content: String) -> Token {
        let subformat = match self.peek() {
            Some('c') => LiteralSubformat::UTF8,
            Some('w') => LiteralSubformat::UTF16,
            Some('d') => LiteralSubformat::UTF32,
            _ => LiteralSubformat::empty(),
        };
        if !subformat.is_empty() {
            self.advance();
        }

        Token::literal(self.span(), self.token_text(), Literal::new(format, subformat, LiteralValue::Text(content)))
    }

    pub(super) fn lex_character_literal(&mut self) -> Token {
        self.advance();

        let value = match self.peek() {
            Some('\'') => {
                self.advance();
                self.error(BareError::EmptyCharacterLiteral);
                return self.finish_character_literal(None);
            }
            Some('\\') => {
                let mut content = String::new();
                self.lex_escape_sequence(&mut content);
                content.chars().next()
            }
            Some('\n' | '\r') | None => None,
            Some(character) => {
                self.advance();
                Some(character)
            }
        };

        if self.peek() == Some('\'') {
            self.advance();
        } else {
            self.error(BareError::UnterminatedCharacterLiteral);
        }

        self.finish_character_literal(value)
    }

    fn finish_character_literal(&mut self, value: Option<char>) -> Token {
        Token::literal(
            self.span(),
            self.token_text(),
            Literal::new(LiteralFormat::Char, LiteralSubformat::empty(), LiteralValue::Char(value.unwrap_or('\0'))),
        )
    }

    /// Decode the escape sequence at the current backslash into the given buffer.
    ///
    /// Invalid sequences are reported and decoded on a best-effort basis.
    fn lex_escape_sequence(&mut self, buffer: &mut String) {
        let start = self.location;
        let start_offset = self.offset;
        self.advance();

        let decoded = match self.peek() {
            Some(character @ ('\'' | '"' | '?' | '\\')) => {
                self.advance();
                Some(character)
            }
            Some(character @ ('a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v')) => {
                self.advance();
                Some(match character {
                    'a' => '\x07',
                    'b' => '\x08',
                    'f' => '\x0C',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    _ => '\x0B',
                })
            }
            Some('0'..='7') => {
                let mut value = 0;
                for _ in 0..3 {
                    match self.peek().and_then(|character| character.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            self.advance();
                        }
                        None => break,
                    }
                }
                char::from_u32(value)
            }
            Some(marker @ ('x' | 'u' | 'U')) => {
                self.advance();
                let length = match marker {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut value = 0_u32;
                let mut complete = true;
                for _ in 0..length {
                    match self.peek().and_then(|character| character.to_digit(16)) {
                        Some(digit) => {
                            value = value * 16 + digit;
                            self.advance();
                        }
                        None => {
                            complete = false;
                            break;
                        }
                    }
                }
                char::from_u32(value).filter(|_| complete)
            }
            Some('&') => {
                self.advance();
                let name_start = self.offset;
                self.take_while(|character| character.is_ascii_alphanumeric());
                let name = self.slice(name_start, self.offset);

                if self.peek() == Some(';') {
                    self.advance();
                    match crate::entity::lookup(name) {
                        Some(character) => Some(character),
                        None => {
                            self.error_at(Span::new(start, self.location), BareError::UndefinedNamedEntity(name.to_owned()));
                            buffer.push(char::REPLACEMENT_CHARACTER);
                            return;
                        }
                    }
                } else {
                    None
                }
            }
            Some(character) if character != '\n' && character != '\r' => {
                self.advance();
                None
            }
            _ => None,
        };

        match decoded {
            Some(character) => buffer.push(character),
            None => {
                let sequence = self.slice(start_offset, self.offset).to_owned();
                self.error_at(Span::new(start, self.location), BareError::InvalidEscapeSequence(sequence));
                buffer.push(char::REPLACEMENT_CHARACTER);
            }
        }
    }
}

fn integer_value(radix: u32, digits: &[u32]) -> Option<u64> {
    digits.iter().try_fold(0_u64, |value, &digit| value.checked_mul(u64::from(radix))?.checked_add(u64::from(digit)))
}

fn floating_point_value(radix: u32, integer_digits: &[u32], fraction_digits: &[u32], exponent: Option<i32>) -> f64 {
    let radix = f64::from(radix);
    let mut value = integer_digits.iter().fold(0.0, |value, &digit| value * radix + f64::from(digit));

    let mut scale = 1.0;
    for &digit in fraction_digits {
        scale /= radix;
        value += f64::from(digit) * scale;
    }

    match exponent {
        // binary exponent
        Some(exponent) if radix == 16.0 => value * 2_f64.powi(exponent),
        Some(exponent) => value * 10_f64.powi(exponent),
        None => value,
    }
}

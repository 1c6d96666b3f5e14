//! The syntactic analyzer (parser).
//!
//! It is a handwritten recursive-descent parser pulling tokens from the lexer on demand.
//! It commits to one token of look-ahead but may look arbitrarily far ahead speculatively:
//! [`Parser::look`](base::Parser::look) scans and rewinds, [`Parser::speculate`](base::Parser::speculate)
//! attempts a sub-parse and rolls back on failure. The D grammar needs both, most prominently
//! for telling declarations apart from expressions (see [`statement`]).
//!
//! Errors never abort parsing. They are collected up to [`ParseOptions::error_cap`] after which
//! the lexer is stopped and the parse winds down at the end of input.
//!
//! # Grammar Notation
//!
//! Most parsing functions in this crate are accompanied by a grammar snippet.
//! These snippets are written in an EBNF-flavor explained below:
//!
//! | Notation  | Name                                | Definition or Remark                                          |
//! |-----------|-------------------------------------|---------------------------------------------------------------|
//! | `; C`     | Comment                             | Stretches until the end of the line                           |
//! | `N ::= R` | Definition                          | Defines non-terminal `N` by rule `R`                          |
//! | `A B`     | Sequence                            | Rule `A` immediately followed by rule `B` modulo comments     |
//! | `(A)`     | Grouping                            | To escape default precedence                                  |
//! | <code>A &vert; B</code>   | Ordered Alternative                 | Either `A` or `B` first trying `A` then `B`                   |
//! | `A?`      | Option                              | `A` or nothing (ε)                                            |
//! | `A*`      | Kleene Star (Multiplicity)          | Arbitrarily long sequence of `A`s                             |
//! | `A+`      | Kleene Plus (Positive Multiplicity) | Arbitrarily long non-empty sequence of `A`s                   |
//! | `"T"`     | Terminal                            | Lexed token by textual content                                |
//! | `#T`      | Named Terminal                      | Lexed token by name                                           |
//! | `(> A)`   | Positive Look-Ahead                 | Decided by a speculative scan                                 |

use ast::{BareStatement, Expression, Module, Statement, TypeDeclaration};
use base::Parser;
pub use error::{BareError, Error, ErrorKind, Expected};
use lexer::{token::TokenKind, Comment};
use span::Location;

mod base;
mod declaration;
mod error;
mod expression;
mod statement;
#[cfg(test)]
mod test;
mod type_declaration;

/// The default amount of errors after which parsing stops.
pub const MAXIMUM_ERROR_COUNT: usize = 100;

#[derive(Clone, Copy, Debug)]
pub struct ParseOptions {
    /// Skip the bodies of functions.
    pub structure_only: bool,
    /// Collect ordinary comments next to documentation comments.
    pub keep_all_comments: bool,
    /// The amount of errors after which the lexer is stopped.
    pub error_cap: usize,
    /// The location of the first character of the source.
    pub start: Location,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            structure_only: false,
            keep_all_comments: false,
            error_cap: MAXIMUM_ERROR_COUNT,
            start: Location::default(),
        }
    }
}

/// The result of parsing: a best-effort tree, the errors and the collected comments.
#[derive(Debug)]
pub struct ParseOutcome<T> {
    pub bare: T,
    pub errors: Vec<Error>,
    pub comments: Vec<Comment>,
}

impl<T> ParseOutcome<T> {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn map<U>(self, mapper: impl FnOnce(T) -> U) -> ParseOutcome<U> {
        ParseOutcome { bare: mapper(self.bare), errors: self.errors, comments: self.comments }
    }
}

/// A statement, expression or type parsed on its own.
///
/// Declarations it contains (like the local variables of a statement block or the parameters
/// of a function literal) live in the accompanying module.
#[derive(Debug)]
pub struct Fragment<T> {
    pub module: Module,
    pub bare: T,
}

/// Parse a whole source file.
///
/// The name of the module is taken from its module declaration if present and left empty
/// otherwise.
pub fn parse_module(source: &str, options: ParseOptions) -> ParseOutcome<Module> {
    let mut parser = Parser::new(source, options);
    parser.parse_module();
    let (module, errors, comments) = parser.finish();
    ParseOutcome { bare: module, errors, comments }
}

/// Parse a sequence of declarations without a module declaration.
pub fn parse_declarations(source: &str, options: ParseOptions) -> ParseOutcome<Module> {
    let mut parser = Parser::new(source, options);
    let root = parser.module.root;
    parser.parse_declarations(root, false);
    let (module, errors, comments) = parser.finish();
    ParseOutcome { bare: module, errors, comments }
}

/// Parse a sequence of statements like the ones between a block opener and the caret.
pub fn parse_block_statement(
    source: &str,
    options: ParseOptions,
) -> ParseOutcome<Fragment<Statement>> {
    parse_fragment(source, options, |parser| {
        let start = parser.span();
        parser.locals.push(Vec::new());

        let mut statements = Vec::new();
        while !parser.at_end() {
            let position = parser.position();
            statements.push(parser.parse_statement());
            if parser.position() == position {
                parser.expected(Expected::Category("statement"));
                parser.advance();
            }
        }

        parser.locals.pop();
        Statement::new(parser.span_from(start), BareStatement::Block(statements))
    })
}

pub fn parse_expression(source: &str, options: ParseOptions) -> ParseOutcome<Fragment<Expression>> {
    parse_fragment(source, options, |parser| {
        let expression = parser.parse_expression();
        parser.expect_end();
        expression
    })
}

pub fn parse_type(source: &str, options: ParseOptions) -> ParseOutcome<Fragment<TypeDeclaration>> {
    parse_fragment(source, options, |parser| {
        let type_ = parser.parse_type();
        parser.expect_end();
        type_
    })
}

fn parse_fragment<T>(
    source: &str,
    options: ParseOptions,
    parse: impl FnOnce(&mut Parser<'_>) -> T,
) -> ParseOutcome<Fragment<T>> {
    let mut parser = Parser::new(source, options);
    let bare = parse(&mut parser);
    let (module, errors, comments) = parser.finish();
    ParseOutcome { bare: Fragment { module, bare }, errors, comments }
}

impl Parser<'_> {
    fn expect_end(&mut self) {
        if !self.at_end() {
            self.expected(TokenKind::EndOfFile);
        }
    }
}

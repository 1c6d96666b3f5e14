//! The token cursor, error recording and speculation.

use super::{BareError, Error, Expected, ParseOptions};
use ast::{Module, NodeIndex};
use lexer::{
    token::{Token, TokenKind},
    Comment, Lexer, LexerOptions,
};
use span::Span;
use std::mem;

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
    /// The tokens pulled from the lexer so far. Never shrinks except when the error cap is hit.
    tokens: Vec<Token>,
    /// The cursor: the index of the current token.
    index: usize,
    pub(crate) options: ParseOptions,
    pub(crate) module: Module,
    errors: Vec<Error>,
    is_capped: bool,
    speculation_depth: usize,
    speculation_failed: bool,
    /// Attributes applying to every following declaration of the current scope.
    pub(crate) block_attributes: Vec<ast::Attribute>,
    /// Attributes applying to the next declaration only.
    pub(crate) declaration_attributes: Vec<ast::Attribute>,
    /// The documentation of the last documented declaration, for `ditto`.
    pub(crate) previous_documentation: Option<String>,
    /// The index of the first documentation comment not yet attached to a declaration.
    pub(crate) comment_cursor: usize,
    /// The names of the local variables of the enclosing blocks, innermost last.
    pub(crate) locals: Vec<Vec<String>>,
    /// The node owning the local declarations parsed at the moment.
    pub(crate) owner: NodeIndex,
}

#[derive(Clone, Copy)]
pub(crate) struct Checkpoint {
    index: usize,
    node_count: usize,
    local_scope_count: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str, options: ParseOptions) -> Self {
        let lexer = Lexer::new(
            source,
            LexerOptions { keep_all_comments: options.keep_all_comments, start: options.start },
        );

        let module = Module::new("");

        Self {
            lexer,
            tokens: Vec::new(),
            index: 0,
            options,
            owner: module.root,
            module,
            errors: Vec::new(),
            is_capped: false,
            speculation_depth: 0,
            speculation_failed: false,
            block_attributes: Vec::new(),
            declaration_attributes: Vec::new(),
            previous_documentation: None,
            comment_cursor: 0,
            locals: Vec::new(),
        }
    }

    pub(crate) fn finish(mut self) -> (Module, Vec<Error>, Vec<Comment>) {
        let comments = self.lexer.take_comments();
        (self.module, self.errors, comments)
    }

    fn fill(&mut self, index: usize) {
        while self.tokens.len() <= index {
            let token = self.lexer.next_token();
            self.tokens.push(token);

            for error in self.lexer.take_errors() {
                let span = error.span;
                self.record(Error::new(BareError::Lexical(error.bare), TokenKind::Invalid, span));
            }
        }
    }

    pub(crate) fn token(&mut self) -> &Token {
        self.look_ahead_token(0)
    }

    pub(crate) fn look_ahead_token(&mut self, amount: usize) -> &Token {
        let index = self.index + amount;
        self.fill(index);
        &self.tokens[index]
    }

    pub(crate) fn kind(&mut self) -> TokenKind {
        self.token().kind
    }

    pub(crate) fn look_ahead(&mut self, amount: usize) -> TokenKind {
        self.look_ahead_token(amount).kind
    }

    pub(crate) fn span(&mut self) -> Span {
        self.token().span
    }

    /// The text of the current identifier or literal.
    pub(crate) fn text(&mut self) -> String {
        self.token().text.clone()
    }

    /// The source text of the current token, also for keywords and symbols.
    pub(crate) fn spelling(&mut self) -> String {
        let token = self.token();
        match token.text.is_empty() {
            true => token.kind.text().to_owned(),
            false => token.text.clone(),
        }
    }

    pub(crate) fn at(&mut self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn at_end(&mut self) -> bool {
        self.at(TokenKind::EndOfFile)
    }

    /// The span of the token before the current one.
    pub(crate) fn previous_span(&mut self) -> Span {
        match self.index.checked_sub(1).and_then(|index| self.tokens.get(index)) {
            Some(token) => token.span,
            None => self.span().start(),
        }
    }

    /// The span from the start of the given span to the end of the previous token.
    pub(crate) fn span_from(&mut self, start: Span) -> Span {
        let end = self.previous_span();
        if end.end < start.start {
            start.start()
        } else {
            start.merge(end)
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.index
    }

    pub(crate) fn advance(&mut self) {
        if !self.at_end() {
            self.index += 1;
        }
    }

    pub(crate) fn maybe_consume(&mut self, kind: TokenKind) -> bool {
        let found = self.at(kind);
        if found {
            self.advance();
        }
        found
    }

    pub(crate) fn maybe_consume_span(&mut self, kind: TokenKind) -> Option<Span> {
        if self.at(kind) {
            let span = self.span();
            self.advance();
            Some(span)
        } else {
            None
        }
    }

    /// Consume the given token or record an error without moving the cursor.
    pub(crate) fn consume(&mut self, kind: TokenKind) -> Option<Span> {
        let span = self.maybe_consume_span(kind);
        if span.is_none() {
            self.expected(kind);
        }
        span
    }

    pub(crate) fn consume_identifier(&mut self) -> Option<(String, Span)> {
        if self.at(TokenKind::Identifier) {
            let token = self.token();
            let identifier = (token.text.clone(), token.span);
            self.advance();
            Some(identifier)
        } else {
            self.expected(Expected::Category("identifier"));
            None
        }
    }

    pub(crate) fn expected(&mut self, expected: impl Into<Expected>) {
        self.error(BareError::Unexpected { expected: expected.into() });
    }

    /// Record an error at the current token.
    pub(crate) fn error(&mut self, error: BareError) {
        let token = self.token();
        let (kind, span) = (token.kind, token.span);
        self.error_at(error, kind, span);
    }

    pub(crate) fn error_at(&mut self, error: BareError, token: TokenKind, span: Span) {
        if self.speculation_depth > 0 {
            self.speculation_failed = true;
            return;
        }
        self.record(Error::new(error, token, span));
    }

    fn record(&mut self, error: Error) {
        if self.is_capped {
            return;
        }

        let span = error.span;
        self.errors.push(error);

        if self.errors.len() >= self.options.error_cap {
            self.is_capped = true;
            self.errors.push(Error::new(
                BareError::TooManyErrors { cap: self.options.error_cap },
                TokenKind::EndOfFile,
                span,
            ));
            self.lexer.stop();
            // everything from the cursor on becomes the end of input
            self.tokens.truncate(self.index);
        }
    }

    pub(crate) fn is_speculating(&self) -> bool {
        self.speculation_depth > 0
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            index: self.index,
            node_count: self.module.nodes.len(),
            local_scope_count: self.locals.len(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.index = checkpoint.index;
        if self.module.nodes.len() > checkpoint.node_count {
            // only surviving parents of discarded nodes may list them as children
            let mut parents: Vec<NodeIndex> =
                self.module.nodes.values().skip(checkpoint.node_count).filter_map(|node| node.parent).collect();
            parents.sort_unstable();
            parents.dedup();

            self.module.nodes.truncate(checkpoint.node_count);
            let end = self.module.nodes.next_index();
            for parent in parents.into_iter().filter(|&parent| parent < end) {
                if let Some(container) = self.module[parent].container_mut() {
                    container.children.retain(|&child| child < end);
                }
            }
        }
        self.locals.truncate(checkpoint.local_scope_count);
    }

    /// Attempt a sub-parse, rolling back the cursor and every node it created
    /// if it returns nothing or records an error.
    ///
    /// Errors recorded during the attempt are discarded either way.
    pub(crate) fn speculate<T>(&mut self, attempt: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let checkpoint = self.checkpoint();
        self.speculation_depth += 1;
        let outer_failed = mem::replace(&mut self.speculation_failed, false);

        let result = attempt(self);
        let failed = self.speculation_failed;

        self.speculation_depth -= 1;
        self.speculation_failed = outer_failed;

        match result {
            Some(result) if !failed => Some(result),
            _ => {
                self.restore(checkpoint);
                None
            }
        }
    }

    /// Run a scan over the upcoming tokens and move the cursor back afterwards.
    pub(crate) fn look<T>(&mut self, scan: impl FnOnce(&mut Self) -> T) -> T {
        let checkpoint = self.checkpoint();
        self.speculation_depth += 1;
        let outer_failed = self.speculation_failed;

        let result = scan(self);

        self.speculation_depth -= 1;
        self.speculation_failed = outer_failed;
        self.restore(checkpoint);
        result
    }

    /// Skip a bracketed token sequence starting at the current opening bracket.
    ///
    /// Returns whether the matching closing bracket was found.
    pub(crate) fn skip_balanced(&mut self) -> bool {
        use TokenKind::*;

        let mut depth = 0_usize;
        loop {
            match self.kind() {
                OpeningRoundBracket | OpeningSquareBracket | OpeningCurlyBracket => depth += 1,
                ClosingRoundBracket | ClosingSquareBracket | ClosingCurlyBracket => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return true;
                    }
                }
                EndOfFile => return false,
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip the block starting at the current `{` without building anything.
    ///
    /// If the lexer has not run ahead of the brace, it skips the block on the character level.
    pub(crate) fn skip_block(&mut self) -> Span {
        let start = self.span();

        if self.index + 1 == self.tokens.len() && !self.is_capped {
            self.index += 1;
            let closing = self.lexer.skip_current_block();
            let end = match closing {
                Some(span) => {
                    self.tokens.push(Token::new(TokenKind::ClosingCurlyBracket, span));
                    self.index += 1;
                    span
                }
                None => {
                    let span = Span::empty(self.lexer.location());
                    self.error_at(
                        BareError::Unexpected { expected: TokenKind::ClosingCurlyBracket.into() },
                        TokenKind::EndOfFile,
                        span,
                    );
                    span
                }
            };
            return start.merge(end);
        }

        if !self.skip_balanced() {
            self.expected(TokenKind::ClosingCurlyBracket);
        }
        self.span_from(start)
    }

    pub(crate) fn comments(&self) -> &[Comment] {
        self.lexer.comments()
    }

    /// Whether the current token names a local variable.
    pub(crate) fn at_local(&mut self) -> bool {
        let name = self.text();
        self.at(TokenKind::Identifier) && self.is_local(&name)
    }

    pub(crate) fn is_local(&self, name: &str) -> bool {
        self.locals.iter().flatten().any(|local| local == name)
    }

    pub(crate) fn declare_local(&mut self, name: &str) {
        if let Some(scope) = self.locals.last_mut() {
            scope.push(name.to_owned());
        }
    }
}

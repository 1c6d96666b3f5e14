//! The parsing of statements.
//!
//! # Declarations and Expressions
//!
//! A statement like `a * b;` is either the declaration of a pointer `b` or a multiplication.
//! The parser decides by [scanning](Parser::is_declaration) past what could be a type: if an
//! identifier follows, it is a declaration. Plain local variables declared earlier in the
//! enclosing blocks are tracked in [`Parser::locals`] and never start a declaration.

use super::{base::Parser, Expected};
use ast::{
    Attribute, Attributes, BareNode, BareStatement, ConditionalStatement, Expression, Labeled,
    Node, NodeIndex, ScopeGuard, Statement, Variable,
};
use lexer::token::TokenKind::*;

impl Parser<'_> {
    /// ```ebnf
    /// BlockStatement ::= "{" Statement* "}"
    /// ```
    pub(crate) fn parse_block(&mut self) -> Statement {
        let start = self.span();
        if self.consume(OpeningCurlyBracket).is_none() {
            return Statement::new(start, BareStatement::Error);
        }

        self.locals.push(Vec::new());
        let mut statements = Vec::new();

        while !self.at(ClosingCurlyBracket) && !self.at_end() {
            let position = self.position();
            statements.push(self.parse_statement());
            if self.position() == position {
                self.advance();
            }
        }

        self.locals.pop();
        self.consume(ClosingCurlyBracket);
        Statement::new(self.span_from(start), BareStatement::Block(statements))
    }

    /// Parse a statement introducing a scope of its own.
    fn parse_scope_statement(&mut self) -> Statement {
        self.locals.push(Vec::new());
        let statement = self.parse_statement();
        self.locals.pop();
        statement
    }

    pub(crate) fn parse_statement(&mut self) -> Statement {
        let start = self.span();

        let bare = match self.kind() {
            Semicolon => {
                self.advance();
                BareStatement::Empty
            }
            OpeningCurlyBracket => return self.parse_block(),
            If => self.parse_if_statement(),
            While => {
                self.advance();
                let condition = self.parse_parenthesized_condition();
                let body = self.parse_scope_statement();
                BareStatement::While(Box::new(ast::While { condition, body }))
            }
            Do => {
                self.advance();
                let body = self.parse_scope_statement();
                self.consume(While);
                let condition = self.parse_parenthesized_condition();
                self.consume(Semicolon);
                BareStatement::DoWhile(Box::new(ast::While { condition, body }))
            }
            For => self.parse_for_statement(),
            Foreach | ForeachReverse => self.parse_foreach_statement(),
            Static if matches!(self.look_ahead(1), Foreach | ForeachReverse) => {
                self.advance();
                self.parse_foreach_statement()
            }
            Switch => self.parse_switch_statement(false),
            Final if self.look_ahead(1) == Switch => {
                self.advance();
                self.parse_switch_statement(true)
            }
            Case | Default => self.parse_case_statement(),
            kind @ (Continue | Break) => {
                self.advance();
                let label = match self.at(Identifier) {
                    true => self.consume_identifier().map(|(label, _)| label),
                    false => None,
                };
                self.consume(Semicolon);
                match kind {
                    Continue => BareStatement::Continue(label),
                    _ => BareStatement::Break(label),
                }
            }
            Return => {
                self.advance();
                let expression = (!self.at(Semicolon)).then(|| self.parse_expression());
                self.consume(Semicolon);
                BareStatement::Return(expression)
            }
            Goto => self.parse_goto_statement(),
            With => {
                self.advance();
                let subject = self.parse_parenthesized_condition();
                let body = self.parse_scope_statement();
                BareStatement::With(Box::new(ast::With { subject, body }))
            }
            Synchronized if matches!(self.look_ahead(1), OpeningRoundBracket | OpeningCurlyBracket) => {
                self.advance();
                let subject = self.at(OpeningRoundBracket).then(|| self.parse_parenthesized_condition());
                let body = self.parse_scope_statement();
                BareStatement::Synchronized(Box::new(ast::Synchronized { subject, body }))
            }
            Try => self.parse_try_statement(),
            Throw => {
                self.advance();
                let expression = self.parse_expression();
                self.consume(Semicolon);
                BareStatement::Throw(expression)
            }
            Scope if self.look_ahead(1) == OpeningRoundBracket => {
                self.advance();
                self.advance();
                let kind = self.consume_identifier().map(|(kind, _)| kind).unwrap_or_default();
                self.consume(ClosingRoundBracket);
                let body = self.parse_scope_statement();
                BareStatement::ScopeGuard(Box::new(ScopeGuard { kind, body }))
            }
            Asm => {
                self.advance();
                while !self.at(OpeningCurlyBracket) && !self.at_end() {
                    self.advance();
                }
                if self.at(OpeningCurlyBracket) {
                    self.skip_block();
                }
                BareStatement::Asm
            }
            Version | Debug => self.parse_conditional_statement(),
            Static if self.look_ahead(1) == If => self.parse_conditional_statement(),
            Static if self.look_ahead(1) == Assert => {
                self.advance();
                self.advance();
                let arguments = self.parse_arguments();
                self.consume(Semicolon);
                BareStatement::StaticAssert(arguments)
            }
            Import if self.look_ahead(1) != OpeningRoundBracket => {
                self.advance();
                let imports = self.parse_import_list(false, false);
                BareStatement::Import(imports)
            }
            Pragma => {
                self.advance();
                if self.at(OpeningRoundBracket) {
                    self.skip_balanced();
                }
                if self.maybe_consume(Semicolon) {
                    BareStatement::Empty
                } else {
                    return self.parse_statement();
                }
            }
            Identifier if self.look_ahead(1) == Colon => {
                let label = self.text();
                self.advance();
                self.advance();
                let body = match self.at(ClosingCurlyBracket) {
                    true => Statement::new(self.span().start(), BareStatement::Empty),
                    false => self.parse_statement(),
                };
                BareStatement::Labeled(Box::new(Labeled { label, body }))
            }
            _ if self.is_declaration() => {
                let owner = self.owner;
                let nodes = self.parse_declaration(owner);
                // local aliases and types still start declarations
                for &node in &nodes {
                    let node = &self.module[node];
                    if node.variable().map_or(false, |variable| !variable.is_alias) {
                        let name = node.name.clone();
                        self.declare_local(&name);
                    }
                }
                BareStatement::Declaration(nodes)
            }
            _ => {
                let expression = self.parse_expression();
                self.consume(Semicolon);
                BareStatement::Expression(expression)
            }
        };

        Statement::new(self.span_from(start), bare)
    }

    /// Decide whether the upcoming statement is a declaration without moving the cursor.
    ///
    /// ```ebnf
    /// DeclarationStart ::=
    ///     | ("alias" | "enum" | "struct" | "class" | "union" | "interface" | "template" | "@")
    ///     | #StorageClass (> ¬"(")
    ///     | "mixin" (> ¬"(")
    ///     | Type (> #Identifier | "delegate" | "function" | #EndOfFile)
    /// ```
    pub(crate) fn is_declaration(&mut self) -> bool {
        let kind = self.kind();

        match kind {
            Alias | Enum | Struct | Class | Union | Interface | Template | At => true,
            Mixin => self.look_ahead(1) != OpeningRoundBracket,
            kind if kind.is_storage_class() && self.look_ahead(1) != OpeningRoundBracket => true,
            Identifier if self.at_local() => false,
            _ => self.look(|parser| {
                while parser.kind().is_type_qualifier() && parser.look_ahead(1) != OpeningRoundBracket {
                    parser.advance();
                }

                if !parser.skip_basic_type() {
                    return false;
                }

                loop {
                    match parser.kind() {
                        // `ubyte[size.sizeof * 8] bits;`
                        Asterisk if parser.look_ahead(1) == Literal => break true,
                        Asterisk => parser.advance(),
                        OpeningSquareBracket => {
                            if !parser.skip_balanced() {
                                break false;
                            }
                        }
                        Identifier | Delegate | Function | EndOfFile => break true,
                        _ => break false,
                    }
                }
            }),
        }
    }

    /// ```ebnf
    /// IfStatement ::= "if" "(" IfCondition ")" ScopeStatement ("else" ScopeStatement)?
    /// IfCondition ::= Expression | ("auto" | "scope" | TypeConstructor)* Type? #Identifier "=" Expression
    /// ```
    fn parse_if_statement(&mut self) -> BareStatement {
        self.advance();
        self.consume(OpeningRoundBracket);
        self.locals.push(Vec::new());

        let (variable, condition) = match self.parse_condition_variable() {
            Some((variable, condition)) => (Some(variable), condition),
            None => (None, self.parse_expression()),
        };
        self.consume(ClosingRoundBracket);

        let consequence = self.parse_scope_statement();
        self.locals.pop();
        let alternative = self.maybe_consume(Else).then(|| self.parse_scope_statement());

        BareStatement::If(Box::new(ast::If { variable, condition, consequence, alternative }))
    }

    /// Parse the variable of `if (auto x = …)` returning it together with a reference to it.
    fn parse_condition_variable(&mut self) -> Option<(NodeIndex, Expression)> {
        let is_variable = match self.kind() {
            Auto | Scope => true,
            kind if kind.is_type_qualifier() => self.look_ahead(1) != OpeningRoundBracket,
            _ => self.look(|parser| {
                parser.skip_type() && parser.at(Identifier) && parser.look_ahead(1) == Equals
            }),
        };
        if !is_variable {
            return None;
        }

        let start = self.span();
        let mut attributes = Attributes::default();
        loop {
            let kind = self.kind();
            if matches!(kind, Auto | Scope)
                || (kind.is_type_qualifier() && self.look_ahead(1) != OpeningRoundBracket)
            {
                attributes.push(Attribute::Keyword(kind));
                self.advance();
            } else {
                break;
            }
        }

        let type_ = match self.at(Identifier) && self.look_ahead(1) == Equals {
            true => None,
            false => Some(self.parse_type()),
        };
        let (name, name_span) = self.consume_identifier()?;
        self.consume(Equals);
        let initializer = self.parse_expression();

        let mut node = Node::new(
            name.clone(),
            name_span,
            BareNode::Variable(Variable { initializer: Some(initializer), is_alias: false }),
        );
        node.type_ = type_;
        node.attributes = attributes;
        node.span = self.span_from(start);

        self.declare_local(&name);
        let variable = self.module.add_detached(self.owner, node);
        Some((variable, Expression::identifier(name_span, name)))
    }

    fn parse_parenthesized_condition(&mut self) -> Expression {
        self.consume(OpeningRoundBracket);
        let expression = self.parse_expression();
        self.consume(ClosingRoundBracket);
        expression
    }

    /// ```ebnf
    /// ForStatement ::= "for" "(" (";" | Statement) Expression? ";" Expression? ")" ScopeStatement
    /// ```
    fn parse_for_statement(&mut self) -> BareStatement {
        self.advance();
        self.consume(OpeningRoundBracket);
        self.locals.push(Vec::new());

        let initializer = match self.maybe_consume(Semicolon) {
            true => None,
            false => Some(self.parse_statement()),
        };
        let condition = (!self.at(Semicolon)).then(|| self.parse_expression());
        self.consume(Semicolon);
        let increment = (!self.at(ClosingRoundBracket)).then(|| self.parse_expression());
        self.consume(ClosingRoundBracket);

        let body = self.parse_scope_statement();
        self.locals.pop();

        BareStatement::For(Box::new(ast::For { initializer, condition, increment, body }))
    }

    /// ```ebnf
    /// ForeachStatement ::=
    ///     ("foreach" | "foreach_reverse") "(" ForeachVariable ("," ForeachVariable)* ";"
    ///     Expression (".." Expression)? ")" ScopeStatement
    /// ForeachVariable ::= ("ref" | "alias" | "enum" | "scope" | TypeConstructor)* Type? #Identifier
    /// ```
    fn parse_foreach_statement(&mut self) -> BareStatement {
        let reverse = self.at(ForeachReverse);
        self.advance();
        self.consume(OpeningRoundBracket);
        self.locals.push(Vec::new());

        let mut variables = Vec::new();
        while !self.at(Semicolon) && !self.at_end() {
            let position = self.position();
            if let Some(variable) = self.parse_foreach_variable() {
                variables.push(variable);
            }
            if self.position() == position {
                self.advance();
            }
            if !self.maybe_consume(Comma) {
                break;
            }
        }
        self.consume(Semicolon);

        let aggregate = self.parse_expression();
        let upper = self.maybe_consume(DoubleDot).then(|| self.parse_expression());
        self.consume(ClosingRoundBracket);

        let body = self.parse_scope_statement();
        self.locals.pop();

        BareStatement::Foreach(Box::new(ast::Foreach { reverse, variables, aggregate, upper, body }))
    }

    fn parse_foreach_variable(&mut self) -> Option<NodeIndex> {
        let start = self.span();
        let mut attributes = Attributes::default();

        loop {
            let kind = self.kind();
            if matches!(kind, Ref | Alias | Enum | Scope)
                || (kind.is_type_qualifier() && self.look_ahead(1) != OpeningRoundBracket)
            {
                attributes.push(Attribute::Keyword(kind));
                self.advance();
            } else {
                break;
            }
        }

        let type_ = match self.at(Identifier) && matches!(self.look_ahead(1), Comma | Semicolon) {
            true => None,
            false => Some(self.try_parse_type()?),
        };
        let (name, name_span) = self.consume_identifier()?;

        let mut node = Node::new(name.clone(), name_span, BareNode::Variable(Variable::default()));
        node.type_ = type_;
        node.attributes = attributes;
        node.span = self.span_from(start);

        self.declare_local(&name);
        Some(self.module.add_detached(self.owner, node))
    }

    /// ```ebnf
    /// SwitchStatement ::= "final"? "switch" "(" Expression ")" ScopeStatement
    /// ```
    fn parse_switch_statement(&mut self, is_final: bool) -> BareStatement {
        self.advance();
        let subject = self.parse_parenthesized_condition();
        let body = self.parse_scope_statement();
        BareStatement::Switch(Box::new(ast::Switch { is_final, subject, body }))
    }

    /// ```ebnf
    /// CaseStatement ::=
    ///     | "case" ArgumentList ":" (".." "case" AssignExpression ":")? CaseBody
    ///     | "default" ":" CaseBody
    /// CaseBody ::= Statement* (> "case" | "default" | "}")
    /// ```
    fn parse_case_statement(&mut self) -> BareStatement {
        let mut values = Vec::new();
        let mut is_range = false;

        if self.maybe_consume(Case) {
            loop {
                values.push(self.parse_assign_expression());
                if !self.maybe_consume(Comma) || self.at(Colon) {
                    break;
                }
            }
            self.consume(Colon);

            if self.maybe_consume(DoubleDot) {
                self.consume(Case);
                values.push(self.parse_assign_expression());
                self.consume(Colon);
                is_range = true;
            }
        } else {
            self.advance();
            self.consume(Colon);
        }

        let start = self.span();
        let mut statements = Vec::new();
        while !matches!(self.kind(), Case | Default | ClosingCurlyBracket | EndOfFile) {
            let position = self.position();
            statements.push(self.parse_statement());
            if self.position() == position {
                self.advance();
            }
        }
        let body = (!statements.is_empty())
            .then(|| Statement::new(self.span_from(start), BareStatement::Block(statements)));

        BareStatement::Case(Box::new(ast::Case { values, is_range, body }))
    }

    /// ```ebnf
    /// GotoStatement ::= "goto" (#Identifier | "default" | "case" Expression?) ";"
    /// ```
    fn parse_goto_statement(&mut self) -> BareStatement {
        self.advance();

        let label = match self.kind() {
            Identifier => self.text(),
            Default => "default".into(),
            Case => "case".into(),
            _ => {
                self.expected(Expected::Category("label"));
                return BareStatement::Error;
            }
        };
        let is_case = self.at(Case);
        self.advance();

        if is_case && !self.at(Semicolon) {
            self.parse_expression();
        }
        self.consume(Semicolon);

        BareStatement::Goto(label)
    }

    /// ```ebnf
    /// TryStatement ::= "try" ScopeStatement Catch* ("finally" ScopeStatement)?
    /// Catch ::= "catch" ("(" Type #Identifier? ")")? ScopeStatement
    /// ```
    fn parse_try_statement(&mut self) -> BareStatement {
        self.advance();
        let body = self.parse_scope_statement();

        let mut catches = Vec::new();
        while self.at(Catch) {
            self.advance();
            self.locals.push(Vec::new());

            let variable = match self.maybe_consume(OpeningRoundBracket) {
                true => {
                    let start = self.span();
                    let type_ = self.parse_type();
                    let (name, name_span) = match self.at(Identifier) {
                        true => self.consume_identifier().unwrap_or_default(),
                        false => (String::new(), self.span().start()),
                    };
                    self.consume(ClosingRoundBracket);

                    let mut node = Node::new(name.clone(), name_span, BareNode::Variable(Variable::default()));
                    node.type_ = Some(type_);
                    node.span = self.span_from(start);
                    self.declare_local(&name);
                    Some(self.module.add_detached(self.owner, node))
                }
                false => None,
            };

            let body = self.parse_statement();
            self.locals.pop();
            catches.push(ast::Catch { variable, body });
        }

        let finally = self.maybe_consume(Finally).then(|| self.parse_scope_statement());

        BareStatement::Try(Box::new(ast::Try { body, catches, finally }))
    }

    /// ```ebnf
    /// ConditionalStatement ::= CompileCondition ScopeStatement ("else" ScopeStatement)?
    /// ```
    fn parse_conditional_statement(&mut self) -> BareStatement {
        let condition = self.parse_compile_condition();
        let consequence = self.parse_scope_statement();
        let alternative = self.maybe_consume(Else).then(|| self.parse_scope_statement());

        BareStatement::Conditional(Box::new(ConditionalStatement { condition, consequence, alternative }))
    }
}

//! The parsing of expressions.
//!
//! Binary operators are parsed by precedence climbing over [`precedence`], everything else by
//! plain recursive descent.

use super::{base::Parser, Expected};
use ast::{
    BareExpression, BareTypeDeclaration, Binary, Call, Conditional, Expression, FunctionLiteral,
    FunctionLiteralBody, Index, IsExpression, LiteralExpression, Member, Parameter, Slice,
    TemplateArgument, TemplateInstance, TypeDeclaration, Unary,
};
use lexer::token::{
    LiteralValue,
    TokenKind::{self, *},
};
use span::Span;

impl Parser<'_> {
    /// ```ebnf
    /// Expression ::= AssignExpression ("," AssignExpression)*
    /// ```
    pub(crate) fn parse_expression(&mut self) -> Expression {
        let start = self.span();
        let mut expression = self.parse_assign_expression();

        while self.maybe_consume(Comma) {
            let right = self.parse_assign_expression();
            expression = binary(self.span_from(start), Comma, false, expression, right);
        }

        expression
    }

    /// ```ebnf
    /// AssignExpression ::= ConditionalExpression (#AssignOperator AssignExpression)?
    /// ```
    pub(crate) fn parse_assign_expression(&mut self) -> Expression {
        let start = self.span();
        let left = self.parse_conditional_expression();

        let operator = self.kind();
        if !operator.is_assign_operator() {
            return left;
        }
        self.advance();

        let right = self.parse_assign_expression();
        binary(self.span_from(start), operator, false, left, right)
    }

    /// ```ebnf
    /// ConditionalExpression ::= BinaryExpression ("?" Expression ":" ConditionalExpression)?
    /// ```
    pub(crate) fn parse_conditional_expression(&mut self) -> Expression {
        let start = self.span();
        let condition = self.parse_binary_expression(1);

        if !self.maybe_consume(QuestionMark) {
            return condition;
        }

        let consequence = self.parse_expression();
        self.consume(Colon);
        let alternative = self.parse_conditional_expression();

        Expression::new(
            self.span_from(start),
            BareExpression::Conditional(Box::new(Conditional { condition, consequence, alternative })),
        )
    }

    /// ```ebnf
    /// BinaryExpression ::= UnaryExpression (#BinaryOperator UnaryExpression)*
    /// ```
    fn parse_binary_expression(&mut self, minimum_precedence: u8) -> Expression {
        let start = self.span();
        let mut left = self.parse_unary_expression();

        while let Some((operator, negated)) = self.binary_operator() {
            let precedence = precedence(operator).unwrap_or_default();
            if precedence < minimum_precedence {
                break;
            }

            self.advance();
            if negated {
                self.advance();
            }

            let right = self.parse_binary_expression(precedence + 1);
            left = binary(self.span_from(start), operator, negated, left, right);
        }

        left
    }

    fn binary_operator(&mut self) -> Option<(TokenKind, bool)> {
        match self.kind() {
            Exclamation => {
                let operator = self.look_ahead(1);
                matches!(operator, Is | In).then_some((operator, true))
            }
            operator => precedence(operator).map(|_| (operator, false)),
        }
    }

    /// ```ebnf
    /// UnaryExpression ::=
    ///     | ("&" | "++" | "--" | "*" | "-" | "+" | "!" | "~" | "delete") UnaryExpression
    ///     | CastExpression
    ///     | PowerExpression
    /// ```
    pub(crate) fn parse_unary_expression(&mut self) -> Expression {
        let start = self.span();

        match self.kind() {
            operator @ (Ampersand | DoublePlus | DoubleMinus | Asterisk | Minus | Plus | Exclamation
            | Tilde | Delete) => {
                self.advance();
                let operand = self.parse_unary_expression();
                Expression::new(
                    self.span_from(start),
                    BareExpression::Unary(Box::new(Unary { operator, operand })),
                )
            }
            Cast => self.parse_cast_expression(),
            _ => self.parse_power_expression(),
        }
    }

    /// ```ebnf
    /// CastExpression ::= "cast" "(" (Type | TypeConstructor+)? ")" UnaryExpression
    /// ```
    fn parse_cast_expression(&mut self) -> Expression {
        let start = self.span();
        self.advance();
        self.consume(OpeningRoundBracket);

        let qualifiers = self
            .speculate(|parser| {
                let mut qualifiers = Vec::new();
                while parser.kind().is_type_qualifier() {
                    qualifiers.push(parser.kind());
                    parser.advance();
                }
                parser.at(ClosingRoundBracket).then_some(qualifiers)
            })
            .unwrap_or_default();

        let type_ = match qualifiers.is_empty() && !self.at(ClosingRoundBracket) {
            true => Some(self.parse_type()),
            false => None,
        };

        self.consume(ClosingRoundBracket);
        let operand = self.parse_unary_expression();

        Expression::new(
            self.span_from(start),
            BareExpression::Cast(Box::new(ast::Cast { type_, qualifiers, operand })),
        )
    }

    /// ```ebnf
    /// PowerExpression ::= PostfixExpression ("^^" UnaryExpression)?
    /// ```
    fn parse_power_expression(&mut self) -> Expression {
        let start = self.span();
        let base = self.parse_postfix_expression();

        if !self.maybe_consume(DoubleCaret) {
            return base;
        }

        let exponent = self.parse_unary_expression();
        binary(self.span_from(start), DoubleCaret, false, base, exponent)
    }

    /// ```ebnf
    /// PostfixExpression ::= PrimaryExpression PostfixOperator*
    /// PostfixOperator ::=
    ///     | "." #Identifier TemplateArguments?
    ///     | "++" | "--"
    ///     | "(" ArgumentList? ")"
    ///     | "[" (AssignExpression (".." AssignExpression | ("," AssignExpression)* ","?))? "]"
    /// ```
    pub(crate) fn parse_postfix_expression(&mut self) -> Expression {
        let start = self.span();
        let mut expression = self.parse_primary_expression();

        loop {
            match self.kind() {
                Dot => {
                    self.advance();
                    let Some((name, name_span)) = self.consume_identifier() else {
                        break expression;
                    };
                    let arguments = self
                        .at_template_arguments()
                        .then(|| self.parse_template_arguments().unwrap_or_default());
                    expression = Expression::new(
                        self.span_from(start),
                        BareExpression::Member(Box::new(Member {
                            base: expression,
                            name,
                            name_span,
                            arguments,
                        })),
                    );
                }
                operator @ (DoublePlus | DoubleMinus) => {
                    self.advance();
                    expression = Expression::new(
                        self.span_from(start),
                        BareExpression::Postfix(Box::new(Unary { operator, operand: expression })),
                    );
                }
                OpeningRoundBracket => {
                    let arguments = self.parse_arguments();
                    expression = Expression::new(
                        self.span_from(start),
                        BareExpression::Call(Box::new(Call { callee: expression, arguments })),
                    );
                }
                OpeningSquareBracket => expression = self.parse_index_or_slice(start, expression),
                _ => break expression,
            }
        }
    }

    fn parse_index_or_slice(&mut self, start: Span, base: Expression) -> Expression {
        self.advance();

        if self.maybe_consume(ClosingSquareBracket) {
            return Expression::new(
                self.span_from(start),
                BareExpression::Index(Box::new(Index { base, arguments: Vec::new() })),
            );
        }

        let first = self.parse_assign_expression();

        if self.maybe_consume(DoubleDot) {
            let upper = self.parse_assign_expression();
            self.consume(ClosingSquareBracket);
            return Expression::new(
                self.span_from(start),
                BareExpression::Slice(Box::new(Slice { base, lower: first, upper })),
            );
        }

        let mut arguments = vec![first];
        while self.maybe_consume(Comma) {
            if self.at(ClosingSquareBracket) {
                break;
            }
            arguments.push(self.parse_assign_expression());
        }
        self.consume(ClosingSquareBracket);

        Expression::new(self.span_from(start), BareExpression::Index(Box::new(Index { base, arguments })))
    }

    /// ```ebnf
    /// Arguments ::= "(" (AssignExpression ("," AssignExpression)* ","?)? ")"
    /// ```
    pub(crate) fn parse_arguments(&mut self) -> Vec<Expression> {
        let mut arguments = Vec::new();
        if self.consume(OpeningRoundBracket).is_none() {
            return arguments;
        }

        while !self.at(ClosingRoundBracket) && !self.at_end() {
            arguments.push(self.parse_assign_expression());
            if !self.maybe_consume(Comma) {
                break;
            }
        }

        self.consume(ClosingRoundBracket);
        arguments
    }

    /// ```ebnf
    /// PrimaryExpression ::=
    ///     | #Identifier TemplateArguments?
    ///     | "." #Identifier TemplateArguments?
    ///     | #Literal+
    ///     | "this" | "super" | "null" | "true" | "false" | "$" | #SpecialToken
    ///     | #BasicTypeKeyword | Type (> ".")
    ///     | TypeConstructor "(" Type ")"
    ///     | "typeof" "(" (Expression | "return") ")"
    ///     | "typeid" "(" TemplateArgument ")"
    ///     | IsExpression | TraitsExpression | NewExpression | FunctionLiteral
    ///     | ("mixin" | "assert") Arguments
    ///     | "import" "(" AssignExpression ")"
    ///     | ArrayLiteral
    ///     | "(" Type ")" (> ".")
    ///     | "(" Expression ")"
    /// ```
    fn parse_primary_expression(&mut self) -> Expression {
        let start = self.span();

        match self.kind() {
            Identifier if self.look_ahead(1) == WideArrowRight => self.parse_function_literal(),
            Identifier => self.parse_symbol_expression(),
            Dot => {
                self.advance();
                let symbol = if self.at(Identifier) {
                    self.parse_symbol_expression()
                } else {
                    self.expected(Expected::Category("identifier"));
                    Expression::error(self.span())
                };
                Expression::new(self.span_from(start), BareExpression::ModuleScope(Box::new(symbol)))
            }
            Literal => self.parse_literal(),
            kind if matches!(kind, This | Super | Null | True | False | Dollar) || kind.is_special_token() => {
                self.advance();
                Expression::new(start, BareExpression::Keyword(kind))
            }
            kind if kind.is_basic_type() => {
                // `int[].init`, `int*.sizeof`
                if matches!(self.look_ahead(1), OpeningSquareBracket | Asterisk) {
                    let type_ = self.speculate(|parser| {
                        let type_ = parser.try_parse_type()?;
                        parser.at(Dot).then_some(type_)
                    });
                    if let Some(type_) = type_ {
                        return Expression::new(type_.span, BareExpression::Type(type_));
                    }
                }
                self.advance();
                Expression::new(start, BareExpression::Keyword(kind))
            }
            kind if kind.is_type_qualifier() && self.look_ahead(1) == OpeningRoundBracket => {
                let type_ = self.parse_type();
                Expression::new(type_.span, BareExpression::Type(type_))
            }
            Typeof if self.look_ahead(2) == Return => {
                let type_ = self.parse_type();
                Expression::new(type_.span, BareExpression::Type(type_))
            }
            Typeof => {
                self.advance();
                self.consume(OpeningRoundBracket);
                let expression = self.parse_expression();
                self.consume(ClosingRoundBracket);
                Expression::new(self.span_from(start), BareExpression::Typeof(Box::new(expression)))
            }
            Typeid => {
                self.advance();
                self.consume(OpeningRoundBracket);
                let argument = self.parse_template_argument();
                self.consume(ClosingRoundBracket);
                Expression::new(self.span_from(start), BareExpression::Typeid(Box::new(argument)))
            }
            Is => self.parse_is_expression(),
            Traits => self.parse_traits_expression(),
            Mixin => {
                self.advance();
                let arguments = self.parse_arguments();
                Expression::new(self.span_from(start), BareExpression::Mixin(arguments))
            }
            Assert => {
                self.advance();
                let arguments = self.parse_arguments();
                Expression::new(self.span_from(start), BareExpression::Assert(arguments))
            }
            Import => {
                self.advance();
                self.consume(OpeningRoundBracket);
                let file = self.parse_assign_expression();
                self.consume(ClosingRoundBracket);
                Expression::new(self.span_from(start), BareExpression::Import(Box::new(file)))
            }
            New => self.parse_new_expression(),
            OpeningSquareBracket => self.parse_array_literal(),
            OpeningRoundBracket => self.parse_parenthesized_expression(),
            Function | Delegate | OpeningCurlyBracket => self.parse_function_literal(),
            _ => {
                self.expected(Expected::Category("expression"));
                Expression::error(start)
            }
        }
    }

    fn parse_symbol_expression(&mut self) -> Expression {
        let start = self.span();
        let name = self.text();
        self.advance();

        if self.at_template_arguments() {
            let arguments = self.parse_template_arguments().unwrap_or_default();
            return Expression::new(
                self.span_from(start),
                BareExpression::TemplateInstance(TemplateInstance { name, arguments }),
            );
        }

        Expression::identifier(start, name)
    }

    /// Parse a literal concatenating adjacent string literals.
    pub(crate) fn parse_literal(&mut self) -> Expression {
        let start = self.span();
        let token = self.token().clone();
        self.advance();

        let Some(mut literal) = token.literal else {
            return Expression::error(start);
        };
        let mut text = token.text;

        while literal.is_string() && self.at(Literal) {
            let next = self.token().clone();
            let (LiteralValue::Text(value), Some(LiteralValue::Text(suffix))) =
                (&mut literal.value, next.literal.map(|literal| literal.value))
            else {
                break;
            };
            value.push_str(&suffix);
            text.push(' ');
            text.push_str(&next.text);
            self.advance();
        }

        Expression::new(self.span_from(start), BareExpression::Literal(LiteralExpression::new(text, literal)))
    }

    /// Parse a parenthesized expression or a parenthesized type used as an expression.
    ///
    /// ```ebnf
    /// ParenthesizedExpression ::= "(" Type ")" (> ".") | "(" Expression ")" | FunctionLiteral
    /// ```
    fn parse_parenthesized_expression(&mut self) -> Expression {
        let start = self.span();

        if self.look(|parser| parser.skip_balanced() && matches!(parser.kind(), WideArrowRight | OpeningCurlyBracket)) {
            return self.parse_function_literal();
        }

        let type_ = self.speculate(|parser| {
            parser.advance();
            let type_ = parser.try_parse_type()?;
            parser.consume(ClosingRoundBracket)?;
            parser.at(Dot).then_some(type_)
        });
        if let Some(type_) = type_ {
            return Expression::new(self.span_from(start), BareExpression::Type(type_));
        }

        self.advance();
        let expression = self.parse_expression();
        self.consume(ClosingRoundBracket);
        Expression::new(self.span_from(start), BareExpression::Parenthesized(Box::new(expression)))
    }

    /// ```ebnf
    /// FunctionLiteral ::=
    ///     | ("function" | "delegate") Type? Parameters? MemberFunctionAttribute* FunctionLiteralBody
    ///     | Parameters MemberFunctionAttribute* FunctionLiteralBody
    ///     | #Identifier "=>" AssignExpression
    ///     | BlockStatement
    /// FunctionLiteralBody ::= "=>" AssignExpression | BlockStatement
    /// ```
    fn parse_function_literal(&mut self) -> Expression {
        let start = self.span();

        let kind = match self.kind() {
            kind @ (Function | Delegate) => {
                self.advance();
                Some(kind)
            }
            _ => None,
        };

        let return_type = match kind.is_some()
            && !matches!(self.kind(), OpeningRoundBracket | OpeningCurlyBracket | WideArrowRight)
        {
            true => self.try_parse_type(),
            false => None,
        };

        let parameters: Vec<_> = match self.kind() {
            Identifier => {
                let span = self.span();
                let name = self.text();
                self.advance();
                vec![Parameter { span, attributes: Vec::new(), type_: None, name: Some(name), default: None }]
            }
            OpeningRoundBracket => self
                .parse_parameters()
                .map(|(parameters, _)| parameters)
                .unwrap_or_default()
                .into_iter()
                .map(untyped_parameter)
                .collect(),
            _ => Vec::new(),
        };
        self.parse_member_function_attributes();

        self.locals.push(parameters.iter().filter_map(|parameter| parameter.name.clone()).collect());
        let body = if self.maybe_consume(WideArrowRight) {
            FunctionLiteralBody::Expression(self.parse_assign_expression())
        } else {
            FunctionLiteralBody::Block(self.parse_block())
        };
        self.locals.pop();

        Expression::new(
            self.span_from(start),
            BareExpression::FunctionLiteral(Box::new(FunctionLiteral { kind, return_type, parameters, body })),
        )
    }

    /// ```ebnf
    /// ArrayLiteral ::= "[" (AssignExpression ("," AssignExpression)* ","?)? "]"
    /// AssociativeArrayLiteral ::= "[" KeyValuePair ("," KeyValuePair)* ","? "]"
    /// KeyValuePair ::= AssignExpression ":" AssignExpression
    /// ```
    fn parse_array_literal(&mut self) -> Expression {
        let start = self.span();
        self.advance();

        if self.maybe_consume(ClosingSquareBracket) {
            return Expression::new(self.span_from(start), BareExpression::ArrayLiteral(Vec::new()));
        }

        let first = self.parse_assign_expression();

        let bare = if self.maybe_consume(Colon) {
            let value = self.parse_assign_expression();
            let mut pairs = vec![(first, value)];
            while self.maybe_consume(Comma) {
                if self.at(ClosingSquareBracket) {
                    break;
                }
                let key = self.parse_assign_expression();
                self.consume(Colon);
                let value = self.parse_assign_expression();
                pairs.push((key, value));
            }
            BareExpression::AssociativeArrayLiteral(pairs)
        } else {
            let mut elements = vec![first];
            while self.maybe_consume(Comma) {
                if self.at(ClosingSquareBracket) {
                    break;
                }
                elements.push(self.parse_assign_expression());
            }
            BareExpression::ArrayLiteral(elements)
        };

        self.consume(ClosingSquareBracket);
        Expression::new(self.span_from(start), bare)
    }

    /// ```ebnf
    /// NewExpression ::=
    ///     | "new" Arguments? Type Arguments?
    ///     | "new" Arguments? "class" Arguments? BaseClassList? AggregateBody
    /// ```
    fn parse_new_expression(&mut self) -> Expression {
        let start = self.span();
        self.advance();

        if self.at(OpeningRoundBracket) {
            self.parse_arguments();
        }

        if self.at(Class) {
            // an anonymous class is represented by its first base class
            let class = self.span();
            self.advance();
            let arguments = match self.at(OpeningRoundBracket) {
                true => self.parse_arguments(),
                false => Vec::new(),
            };
            let base = match self.maybe_consume(Colon) {
                true => self.try_parse_type(),
                false => None,
            };
            while !self.at(OpeningCurlyBracket) && !self.at_end() {
                self.advance();
            }
            if self.at(OpeningCurlyBracket) {
                self.skip_balanced();
            }
            let type_ = base.unwrap_or_else(|| TypeDeclaration::identifier(class, "Object"));
            return Expression::new(self.span_from(start), BareExpression::New(Box::new(ast::New { type_, arguments })));
        }

        let type_ = self.parse_type();
        let arguments = match self.at(OpeningRoundBracket) {
            true => self.parse_arguments(),
            false => Vec::new(),
        };

        Expression::new(self.span_from(start), BareExpression::New(Box::new(ast::New { type_, arguments })))
    }

    /// ```ebnf
    /// IsExpression ::= "is" "(" Type #Identifier? ((":" | "==") TypeSpecialization ("," TemplateParameter)*)? ")"
    /// TypeSpecialization ::= Type | "struct" | "union" | "class" | "interface" | "enum" | "function"
    ///     | "delegate" | "super" | "const" | "immutable" | "inout" | "shared" | "return"
    ///     | "__parameters" | "module" | "package"
    /// ```
    fn parse_is_expression(&mut self) -> Expression {
        let start = self.span();
        self.advance();
        self.consume(OpeningRoundBracket);

        let type_ = self.parse_type();
        let identifier = match self.at(Identifier) {
            true => self.consume_identifier().map(|(name, _)| name),
            false => None,
        };
        let relation = match self.kind() {
            kind @ (Colon | DoubleEquals) => {
                self.advance();
                Some(kind)
            }
            _ => None,
        };
        let specialization = relation.map(|_| self.parse_type_specialization());

        // the template parameter list only introduces names for static ifs
        while !self.at(ClosingRoundBracket) && !self.at_end() {
            if matches!(self.kind(), OpeningRoundBracket | OpeningSquareBracket | OpeningCurlyBracket) {
                self.skip_balanced();
            } else {
                self.advance();
            }
        }
        self.consume(ClosingRoundBracket);

        Expression::new(
            self.span_from(start),
            BareExpression::Is(Box::new(IsExpression { type_, identifier, relation, specialization })),
        )
    }

    fn parse_type_specialization(&mut self) -> TemplateArgument {
        let kind = self.kind();
        let is_keyword = matches!(
            kind,
            Struct
                | Union
                | Class
                | Interface
                | Enum
                | Function
                | Delegate
                | Super
                | Const
                | Immutable
                | Inout
                | Shared
                | Return
                | Parameters
                | Module
                | Package
        );

        if is_keyword && matches!(self.look_ahead(1), Comma | ClosingRoundBracket) {
            let span = self.span();
            self.advance();
            return TemplateArgument::Expression(Expression::new(span, BareExpression::Keyword(kind)));
        }

        self.parse_template_argument()
    }

    /// ```ebnf
    /// TraitsExpression ::= "__traits" "(" #Identifier ("," TemplateArgument)* ")"
    /// ```
    fn parse_traits_expression(&mut self) -> Expression {
        let start = self.span();
        self.advance();
        self.consume(OpeningRoundBracket);

        let name = self.consume_identifier().map(|(name, _)| name).unwrap_or_default();
        let mut arguments = Vec::new();
        while self.maybe_consume(Comma) {
            if self.at(ClosingRoundBracket) {
                break;
            }
            arguments.push(self.parse_template_argument());
        }
        self.consume(ClosingRoundBracket);

        Expression::new(self.span_from(start), BareExpression::Traits(Box::new(ast::Traits { name, arguments })))
    }
}

/// The binding power of binary operators, higher binds tighter.
fn precedence(operator: TokenKind) -> Option<u8> {
    Some(match operator {
        DoubleBar => 1,
        DoubleAmpersand => 2,
        Bar => 3,
        Caret => 4,
        Ampersand => 5,
        DoubleEquals | NotEquals | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual
        | Is | In => 6,
        ShiftLeft | ShiftRight | UnsignedShiftRight => 7,
        Plus | Minus | Tilde => 8,
        Asterisk | Slash | Percent => 9,
        _ => return None,
    })
}

fn binary(span: Span, operator: TokenKind, negated: bool, left: Expression, right: Expression) -> Expression {
    Expression::new(span, BareExpression::Binary(Box::new(Binary { operator, negated, left, right })))
}

/// In function literals, a lone identifier names a parameter rather than its type.
fn untyped_parameter(mut parameter: Parameter) -> Parameter {
    if parameter.name.is_none() {
        if let Some(TypeDeclaration { bare: BareTypeDeclaration::Identifier(name), inner: None, .. }) =
            &parameter.type_
        {
            parameter.name = Some(name.clone());
            parameter.type_ = None;
        }
    }
    parameter
}

//! The parsing of types, template arguments and parameter lists.
//!
//! Next to the parsers proper, this module hosts the side-effect free scanners the
//! declaration-expression disambiguation is built on.

use super::{base::Parser, Expected};
use ast::{
    ArrayKind, Attribute, BareExpression, BareNode, BareTypeDeclaration, Expression, Node,
    NodeIndex, Parameter, Signature, TemplateArgument, TemplateInstance, TemplateParameter,
    TemplateParameterKind, TypeDeclaration,
};
use lexer::token::TokenKind::*;

impl Parser<'_> {
    /// Parse a type, recording an error and returning a placeholder on failure.
    pub(crate) fn parse_type(&mut self) -> TypeDeclaration {
        let span = self.span();
        self.try_parse_type().unwrap_or_else(|| TypeDeclaration::basic(span, Invalid))
    }

    /// Parse a type.
    ///
    /// ```ebnf
    /// Type ::= TypeConstructor* BasicType TypeSuffix*
    /// TypeConstructor ::= ("const" | "immutable" | "shared" | "inout" | "scope") (> ¬"(")
    /// ```
    pub(crate) fn try_parse_type(&mut self) -> Option<TypeDeclaration> {
        let start = self.span();

        let mut constructors = Vec::new();
        while self.kind().is_type_qualifier() && self.look_ahead(1) != OpeningRoundBracket {
            constructors.push(self.kind());
            self.advance();
        }

        let basic = self.parse_basic_type()?;
        let mut type_ = self.parse_type_suffixes(basic)?;

        for constructor in constructors.into_iter().rev() {
            let span = self.span_from(start);
            type_ = type_.wrap(span, BareTypeDeclaration::Qualified(constructor));
        }

        Some(type_)
    }

    /// Parse a basic type.
    ///
    /// ```ebnf
    /// BasicType ::=
    ///     | #BasicTypeKeyword
    ///     | "."? QualifiedSymbol
    ///     | Typeof ("." QualifiedSymbol)?
    ///     | TypeConstructor "(" Type ")"
    ///     | "__vector" "(" Type ")"
    /// ```
    fn parse_basic_type(&mut self) -> Option<TypeDeclaration> {
        let start = self.span();

        match self.kind() {
            kind if kind.is_basic_type() => {
                self.advance();
                Some(TypeDeclaration::basic(start, kind))
            }
            Dot => {
                self.advance();
                let symbol = self.parse_qualified_symbol()?;
                Some(symbol.rooted_at(TypeDeclaration::new(start, BareTypeDeclaration::ModuleScope)))
            }
            Identifier => self.parse_qualified_symbol(),
            Typeof => {
                let typeof_ = self.parse_typeof()?;
                if self.at(Dot) && self.look_ahead(1) == Identifier {
                    self.advance();
                    let symbol = self.parse_qualified_symbol()?;
                    Some(symbol.rooted_at(typeof_))
                } else {
                    Some(typeof_)
                }
            }
            kind if kind.is_type_qualifier() => {
                self.advance();
                self.consume(OpeningRoundBracket)?;
                let inner = self.try_parse_type()?;
                self.consume(ClosingRoundBracket)?;
                let span = self.span_from(start);
                Some(inner.wrap(span, BareTypeDeclaration::Qualified(kind)))
            }
            Vector => {
                self.advance();
                self.consume(OpeningRoundBracket)?;
                let inner = self.try_parse_type()?;
                self.consume(ClosingRoundBracket)?;
                Some(inner)
            }
            _ => {
                self.expected(Expected::Category("type"));
                None
            }
        }
    }

    /// ```ebnf
    /// Typeof ::= "typeof" "(" ("return" | Expression) ")"
    /// ```
    fn parse_typeof(&mut self) -> Option<TypeDeclaration> {
        let start = self.span();
        self.consume(Typeof)?;
        self.consume(OpeningRoundBracket)?;

        let expression = if self.maybe_consume(Return) {
            None
        } else {
            Some(Box::new(self.parse_expression()))
        };

        self.consume(ClosingRoundBracket)?;
        Some(TypeDeclaration::new(self.span_from(start), BareTypeDeclaration::Typeof(expression)))
    }

    /// ```ebnf
    /// QualifiedSymbol ::= Symbol ("." Symbol)*
    /// ```
    pub(crate) fn parse_qualified_symbol(&mut self) -> Option<TypeDeclaration> {
        let start = self.span();
        let mut type_ = self.parse_symbol()?;

        while self.at(Dot) && self.look_ahead(1) == Identifier {
            self.advance();
            let symbol = self.parse_symbol()?;
            let span = self.span_from(start);
            type_ = TypeDeclaration::with_inner(span, symbol.bare, type_);
        }

        Some(type_)
    }

    /// ```ebnf
    /// Symbol ::= #Identifier TemplateArguments?
    /// ```
    fn parse_symbol(&mut self) -> Option<TypeDeclaration> {
        let start = self.span();
        let (name, _) = self.consume_identifier()?;

        if self.at_template_arguments() {
            let arguments = self.parse_template_arguments()?;
            return Some(TypeDeclaration::new(
                self.span_from(start),
                BareTypeDeclaration::TemplateInstance(TemplateInstance { name, arguments }),
            ));
        }

        Some(TypeDeclaration::identifier(start, name))
    }

    /// Whether the current `!` introduces template arguments as opposed to `!is` or `!in`.
    pub(crate) fn at_template_arguments(&mut self) -> bool {
        self.at(Exclamation) && !matches!(self.look_ahead(1), Is | In)
    }

    /// ```ebnf
    /// TemplateArguments ::= "!" ("(" (TemplateArgument ("," TemplateArgument)* ","?)? ")" | TemplateSingleArgument)
    /// TemplateSingleArgument ::= #Identifier | #BasicTypeKeyword | #Literal | "true" | "false" | "null" | "this" | #SpecialToken
    /// ```
    pub(crate) fn parse_template_arguments(&mut self) -> Option<Vec<TemplateArgument>> {
        self.consume(Exclamation)?;

        if !self.maybe_consume(OpeningRoundBracket) {
            let span = self.span();
            let argument = match self.kind() {
                Literal => TemplateArgument::Expression(self.parse_literal()),
                Identifier => {
                    let name = self.text();
                    self.advance();
                    TemplateArgument::Type(TypeDeclaration::identifier(span, name))
                }
                kind if kind.is_basic_type() => {
                    self.advance();
                    TemplateArgument::Type(TypeDeclaration::basic(span, kind))
                }
                kind if matches!(kind, True | False | Null | This) || kind.is_special_token() => {
                    self.advance();
                    TemplateArgument::Expression(Expression::new(span, BareExpression::Keyword(kind)))
                }
                _ => {
                    self.expected(Expected::Category("template argument"));
                    return None;
                }
            };
            return Some(vec![argument]);
        }

        let mut arguments = Vec::new();
        while !self.at(ClosingRoundBracket) && !self.at_end() {
            arguments.push(self.parse_template_argument());
            if !self.maybe_consume(Comma) {
                break;
            }
        }
        self.consume(ClosingRoundBracket)?;

        Some(arguments)
    }

    /// Parse a template argument preferring types over expressions.
    ///
    /// ```ebnf
    /// TemplateArgument ::= Type (> "," | ")") | AssignExpression
    /// ```
    pub(crate) fn parse_template_argument(&mut self) -> TemplateArgument {
        let type_ = self.speculate(|parser| {
            let type_ = parser.try_parse_type()?;
            matches!(parser.kind(), Comma | ClosingRoundBracket).then_some(type_)
        });

        match type_ {
            Some(type_) => TemplateArgument::Type(type_),
            None => TemplateArgument::Expression(self.parse_assign_expression()),
        }
    }

    /// ```ebnf
    /// TypeSuffix ::=
    ///     | "*"
    ///     | "[" (Type (> "]") | AssignExpression)? "]"
    ///     | ("delegate" | "function") Parameters MemberFunctionAttribute*
    /// ```
    fn parse_type_suffixes(&mut self, mut type_: TypeDeclaration) -> Option<TypeDeclaration> {
        let start = type_.span;

        loop {
            match self.kind() {
                Asterisk => {
                    self.advance();
                    type_ = type_.wrap(self.span_from(start), BareTypeDeclaration::Pointer);
                }
                OpeningSquareBracket => {
                    self.advance();

                    let kind = if self.at(ClosingSquareBracket) {
                        ArrayKind::Dynamic
                    } else {
                        let key = self.speculate(|parser| {
                            let key = parser.try_parse_type()?;
                            parser.at(ClosingSquareBracket).then_some(key)
                        });
                        match key {
                            Some(key) => ArrayKind::Associative(Box::new(key)),
                            None => ArrayKind::Static(Box::new(self.parse_assign_expression())),
                        }
                    };

                    self.consume(ClosingSquareBracket)?;
                    type_ = type_.wrap(self.span_from(start), BareTypeDeclaration::Array(kind));
                }
                kind @ (Delegate | Function) => {
                    self.advance();
                    let (parameters, is_variadic) = self.parse_parameters()?;
                    let attributes = self
                        .parse_member_function_attributes()
                        .into_iter()
                        .filter_map(|attribute| match attribute {
                            Attribute::Keyword(keyword) => Some(keyword),
                            _ => None,
                        })
                        .collect();
                    let signature = Signature { kind, parameters, is_variadic, attributes };
                    type_ = type_
                        .wrap(self.span_from(start), BareTypeDeclaration::Delegate(Box::new(signature)));
                }
                _ => break Some(type_),
            }
        }
    }

    /// ```ebnf
    /// Parameters ::= "(" (Parameter ("," Parameter)* ("," "...")? | "...")? ")"
    /// ```
    pub(crate) fn parse_parameters(&mut self) -> Option<(Vec<Parameter>, bool)> {
        self.consume(OpeningRoundBracket)?;

        let mut parameters = Vec::new();
        let mut is_variadic = false;

        while !self.at(ClosingRoundBracket) && !self.at_end() {
            if self.maybe_consume(TripleDot) {
                is_variadic = true;
                break;
            }

            let (parameter, variadic) = self.parse_parameter()?;
            parameters.push(parameter);
            is_variadic |= variadic;

            if !self.maybe_consume(Comma) {
                break;
            }
        }

        self.consume(ClosingRoundBracket)?;
        Some((parameters, is_variadic))
    }

    /// ```ebnf
    /// Parameter ::= ParameterAttribute* Type #Identifier? ("=" AssignExpression)? "..."?
    /// ```
    fn parse_parameter(&mut self) -> Option<(Parameter, bool)> {
        let start = self.span();
        let mut attributes = Vec::new();

        loop {
            let kind = self.kind();
            if kind == At {
                self.parse_at_attributes();
            } else if kind.is_parameter_attribute()
                && !(kind.is_type_qualifier() && self.look_ahead(1) == OpeningRoundBracket)
            {
                attributes.push(kind);
                self.advance();
            } else {
                break;
            }
        }

        // `ref x` in lambdas, `auto ref x` in templates
        let type_ = if self.at(Identifier)
            && !attributes.is_empty()
            && matches!(self.look_ahead(1), Comma | ClosingRoundBracket | Equals)
        {
            None
        } else {
            Some(self.try_parse_type()?)
        };

        let name = if self.at(Identifier) { Some(self.consume_identifier()?.0) } else { None };
        let default = self.maybe_consume(Equals).then(|| self.parse_assign_expression());
        let is_variadic = self.maybe_consume(TripleDot);

        let parameter = Parameter { span: self.span_from(start), attributes, type_, name, default };
        Some((parameter, is_variadic))
    }

    /// ```ebnf
    /// MemberFunctionAttribute ::= ("const" | "immutable" | "shared" | "inout" | "scope") (> ¬"(")
    ///     | "pure" | "nothrow" | "ref" | "return" | AtAttribute
    /// ```
    pub(crate) fn parse_member_function_attributes(&mut self) -> Vec<Attribute> {
        let mut attributes = Vec::new();

        loop {
            let kind = self.kind();
            if kind == At {
                attributes.extend(self.parse_at_attributes());
            } else if kind.is_member_function_attribute()
                && !(kind.is_type_qualifier() && self.look_ahead(1) == OpeningRoundBracket)
            {
                attributes.push(Attribute::Keyword(kind));
                self.advance();
            } else {
                break attributes;
            }
        }
    }

    /// ```ebnf
    /// AtAttribute ::= "@" (#Identifier (> ¬"(" ¬"!") | "(" ArgumentList ")" | PostfixExpression)
    /// ```
    pub(crate) fn parse_at_attributes(&mut self) -> Vec<Attribute> {
        let at = self.span();
        if self.consume(At).is_none() {
            return Vec::new();
        }

        match self.kind() {
            Identifier if !matches!(self.look_ahead(1), OpeningRoundBracket | Exclamation | Dot) => {
                let name = self.text();
                self.advance();
                vec![Attribute::Property(name)]
            }
            OpeningRoundBracket => {
                self.parse_arguments().into_iter().map(Attribute::UserDefined).collect()
            }
            Identifier => vec![Attribute::UserDefined(self.parse_postfix_expression())],
            _ => {
                self.error_at(
                    super::BareError::Unexpected { expected: Expected::Category("attribute") },
                    At,
                    at,
                );
                Vec::new()
            }
        }
    }

    /// Parse a template parameter list into template parameter nodes owned by the given node.
    ///
    /// ```ebnf
    /// TemplateParameters ::= "(" (TemplateParameter ("," TemplateParameter)* ","?)? ")"
    /// ```
    pub(crate) fn parse_template_parameters(&mut self, owner: NodeIndex) -> Vec<NodeIndex> {
        let mut parameters = Vec::new();
        if self.consume(OpeningRoundBracket).is_none() {
            return parameters;
        }

        while !self.at(ClosingRoundBracket) && !self.at_end() {
            let position = self.position();
            if let Some(parameter) = self.parse_template_parameter() {
                parameters.push(self.module.add_detached(owner, parameter));
            }
            if self.position() == position {
                self.advance();
            }
            if !self.maybe_consume(Comma) {
                break;
            }
        }

        self.consume(ClosingRoundBracket);
        parameters
    }

    /// ```ebnf
    /// TemplateParameter ::=
    ///     | #Identifier "..."
    ///     | "this" #Identifier (":" Type)? ("=" Type)?
    ///     | "alias" (Type (> #Identifier))? #Identifier (":" TemplateArgument)? ("=" TemplateArgument)?
    ///     | #Identifier (":" Type)? ("=" Type)?
    ///     | Type #Identifier (":" ConditionalExpression)? ("=" AssignExpression)?
    /// ```
    fn parse_template_parameter(&mut self) -> Option<Node> {
        let start = self.span();

        let (type_, name, name_span, kind) = match self.kind() {
            Identifier if self.look_ahead(1) == TripleDot => {
                let (name, name_span) = self.consume_identifier()?;
                self.advance();
                (None, name, name_span, TemplateParameterKind::Tuple)
            }
            This => {
                self.advance();
                let (name, name_span) = self.consume_identifier()?;
                let specialization = self.maybe_consume(Colon).then(|| self.parse_type());
                let default = self.maybe_consume(Equals).then(|| self.parse_type());
                (None, name, name_span, TemplateParameterKind::This { specialization, default })
            }
            Alias => {
                self.advance();
                let type_ = match self.look_ahead(1) {
                    Colon | Equals | Comma | ClosingRoundBracket => None,
                    _ => Some(self.try_parse_type()?),
                };
                let (name, name_span) = self.consume_identifier()?;
                let specialization = self.maybe_consume(Colon).then(|| self.parse_template_argument());
                let default = self.maybe_consume(Equals).then(|| self.parse_template_argument());
                (type_, name, name_span, TemplateParameterKind::Alias { specialization, default })
            }
            Identifier if matches!(self.look_ahead(1), Colon | Equals | Comma | ClosingRoundBracket) => {
                let (name, name_span) = self.consume_identifier()?;
                let specialization = self.maybe_consume(Colon).then(|| self.parse_type());
                let default = self.maybe_consume(Equals).then(|| self.parse_type());
                (None, name, name_span, TemplateParameterKind::Type { specialization, default })
            }
            _ => {
                let type_ = self.try_parse_type()?;
                let (name, name_span) = self.consume_identifier()?;
                let specialization =
                    self.maybe_consume(Colon).then(|| self.parse_conditional_expression());
                let default = self.maybe_consume(Equals).then(|| self.parse_assign_expression());
                (Some(type_), name, name_span, TemplateParameterKind::Value { specialization, default })
            }
        };

        let mut node = Node::new(name, name_span, BareNode::TemplateParameter(TemplateParameter { kind }));
        node.type_ = type_;
        node.span = self.span_from(start);
        Some(node)
    }

    /// Skip what looks like a type without building anything.
    pub(crate) fn skip_type(&mut self) -> bool {
        while self.kind().is_type_qualifier() && self.look_ahead(1) != OpeningRoundBracket {
            self.advance();
        }

        if !self.skip_basic_type() {
            return false;
        }

        loop {
            match self.kind() {
                Asterisk => self.advance(),
                OpeningSquareBracket => {
                    if !self.skip_balanced() {
                        return false;
                    }
                }
                Delegate | Function => {
                    self.advance();
                    if !self.at(OpeningRoundBracket) || !self.skip_balanced() {
                        return false;
                    }
                }
                _ => break true,
            }
        }
    }

    pub(crate) fn skip_basic_type(&mut self) -> bool {
        match self.kind() {
            kind if kind.is_basic_type() => {
                self.advance();
                true
            }
            Dot => {
                self.advance();
                self.skip_qualified_symbol()
            }
            Identifier => self.skip_qualified_symbol(),
            Typeof => {
                self.advance();
                if !self.at(OpeningRoundBracket) || !self.skip_balanced() {
                    return false;
                }
                if self.at(Dot) && self.look_ahead(1) == Identifier {
                    self.advance();
                    return self.skip_qualified_symbol();
                }
                true
            }
            kind if kind.is_type_qualifier() || kind == Vector => {
                self.advance();
                self.at(OpeningRoundBracket) && self.skip_balanced()
            }
            _ => false,
        }
    }

    fn skip_qualified_symbol(&mut self) -> bool {
        loop {
            if !self.maybe_consume(Identifier) {
                return false;
            }

            if self.at_template_arguments() {
                self.advance();
                if self.at(OpeningRoundBracket) {
                    if !self.skip_balanced() {
                        return false;
                    }
                } else {
                    self.advance();
                }
            }

            if self.at(Dot) && self.look_ahead(1) == Identifier {
                self.advance();
            } else {
                return true;
            }
        }
    }
}

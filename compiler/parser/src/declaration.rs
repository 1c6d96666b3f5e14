//! The parsing of declarations.
//!
//! # Attributes
//!
//! Attributes are tracked on two stacks. Declaration-level attributes (`static int x;`) apply
//! to the very next declaration only, block-level ones (`private:`, `extern(C) { … }`,
//! `version(X):`) to every following declaration of the enclosing scope. Both get merged into
//! the attributes of each node when it is added to the module.
//!
//! # Documentation
//!
//! Documentation comments directly preceding a declaration and a documentation comment
//! trailing it on the line of its last token are attached to it. The text `ditto` stands for
//! the documentation of the previous declaration.

use super::{base::Parser, BareError, Expected};
use ast::{
    Attribute, BareExpression, BareNode, BareStatement, ClassKind, CompileCondition, EnumMember,
    Expression, ImportBinding, Method, MethodKind, Node, NodeIndex, Parameter, Statement,
    TypeDeclaration, Variable,
};
use lexer::token::TokenKind::{self, *};
use span::Span;
use std::mem;

/// The nodes a declaration results in.
enum Declared {
    /// Nodes declared by the declaration itself, still to be documented.
    Fresh(Vec<NodeIndex>),
    /// Nodes of nested declarations that were documented individually.
    Nested(Vec<NodeIndex>),
}

impl Parser<'_> {
    /// ```ebnf
    /// Module ::= ModuleDeclaration? Declaration*
    /// ModuleDeclaration ::= ("deprecated" ("(" AssignExpression ")")? | AtAttribute)* "module" QualifiedName ";"
    /// ```
    pub(crate) fn parse_module(&mut self) {
        let root = self.module.root;

        let has_module_declaration = self.look(|parser| loop {
            match parser.kind() {
                Deprecated | At => {
                    parser.advance();
                    if parser.at(Identifier) {
                        parser.advance();
                    }
                    if parser.at(OpeningRoundBracket) {
                        parser.skip_balanced();
                    }
                }
                Module => break true,
                _ => break false,
            }
        });

        if has_module_declaration {
            let documentation = self.take_documentation();
            let start = self.span();

            let mut attributes = Vec::new();
            loop {
                match self.kind() {
                    Deprecated => attributes.push(self.parse_deprecated()),
                    At => attributes.extend(self.parse_at_attributes()),
                    _ => break,
                }
            }

            self.advance();
            if let Some((name, _)) = self.parse_qualified_name() {
                self.module.set_name(name);
            }
            self.consume(Semicolon);

            let span = self.span_from(start);
            let node = &mut self.module[root];
            node.span = span;
            node.attributes.extend(attributes);
            node.documentation = documentation.clone();
            self.previous_documentation = documentation;
        }

        self.parse_declarations(root, false);
    }

    /// Parse declarations up to the end of input or, if `closing` is set, up to a `}`.
    pub(crate) fn parse_declarations(&mut self, parent: NodeIndex, closing: bool) -> Vec<NodeIndex> {
        let mut declarations = Vec::new();

        loop {
            match self.kind() {
                EndOfFile => break,
                ClosingCurlyBracket if closing => break,
                _ => {}
            }

            let position = self.position();
            declarations.extend(self.parse_declaration(parent));

            if self.position() == position {
                self.expected(Expected::Category("declaration"));
                self.advance();
            }
        }

        declarations
    }

    /// Parse a single declaration adding the declared nodes to the given parent.
    pub(crate) fn parse_declaration(&mut self, parent: NodeIndex) -> Vec<NodeIndex> {
        let documentation = self.take_documentation();
        let declared = self.parse_bare_declaration(parent);
        self.declaration_attributes.clear();

        match declared {
            Declared::Fresh(nodes) => {
                if nodes.is_empty() {
                    return nodes;
                }

                let line = self.previous_span().end.line;
                let documentation = match (documentation, self.trailing_documentation(line)) {
                    (Some(preceding), Some(trailing)) => Some(format!("{preceding}\n{trailing}")),
                    (preceding, trailing) => preceding.or(trailing),
                };

                for &node in &nodes {
                    self.module[node].documentation = documentation.clone();
                }
                self.previous_documentation = documentation;
                nodes
            }
            Declared::Nested(nodes) => nodes,
        }
    }

    /// ```ebnf
    /// Declaration ::=
    ///     | Attribute+ (":" | "{" Declaration* "}")
    ///     | Attribute* BareDeclaration
    /// ```
    fn parse_bare_declaration(&mut self, parent: NodeIndex) -> Declared {
        let has_attributes = self.parse_attributes();

        if has_attributes {
            if self.maybe_consume(Colon) {
                self.push_block_attributes();
                return Declared::Nested(Vec::new());
            }

            if self.at(OpeningCurlyBracket) {
                let saved = self.block_attributes.clone();
                self.push_block_attributes();
                self.advance();
                let nodes = self.parse_declarations(parent, true);
                self.consume(ClosingCurlyBracket);
                self.block_attributes = saved;
                return Declared::Nested(nodes);
            }
        }

        let next = self.look_ahead(1);

        match self.kind() {
            Semicolon => {
                self.advance();
                Declared::Nested(Vec::new())
            }
            Import => {
                self.advance();
                let is_static = self.declaration_attributes.contains(&Attribute::Keyword(Static));
                let is_public = self
                    .block_attributes
                    .iter()
                    .chain(&self.declaration_attributes)
                    .rev()
                    .find_map(|attribute| match attribute {
                        &Attribute::Keyword(keyword) if keyword.is_visibility() => Some(keyword),
                        _ => None,
                    })
                    == Some(Public);
                let imports = self.parse_import_list(is_static, is_public);
                if let Some(container) = self.module[parent].container_mut() {
                    container.imports.extend(imports);
                }
                Declared::Nested(Vec::new())
            }
            kind @ (Class | Interface | Struct | Union) => {
                self.advance();
                let kind = match kind {
                    Class => ClassKind::Class,
                    Interface => ClassKind::Interface,
                    Struct => ClassKind::Struct,
                    _ => ClassKind::Union,
                };
                self.parse_aggregate(parent, kind)
            }
            Template => {
                self.advance();
                self.parse_aggregate(parent, ClassKind::Template)
            }
            Mixin if next == Template => {
                self.advance();
                self.advance();
                self.parse_aggregate(parent, ClassKind::MixinTemplate)
            }
            Mixin => {
                let statement = self.parse_mixin();
                self.push_container_statement(parent, statement);
                Declared::Nested(Vec::new())
            }
            Enum if self.at_enum_declaration() => self.parse_enum(parent),
            Enum => {
                self.push_declaration_attribute(Attribute::Keyword(Enum));
                self.advance();
                self.parse_variable_or_function(parent)
            }
            Alias => self.parse_alias(parent),
            This if next == OpeningRoundBracket => {
                let start = self.span();
                self.advance();

                if self.look_ahead(1) == This && self.look_ahead(2) == ClosingRoundBracket {
                    self.advance();
                    self.advance();
                    self.advance();
                    return self.parse_function_without_parameters(parent, start, "this", start, MethodKind::Postblit);
                }

                self.parse_function(parent, start, None, "this".into(), start, MethodKind::Constructor)
            }
            Tilde if next == This => {
                let start = self.span();
                self.advance();
                self.parse_special_function(parent, start, "~this", MethodKind::Destructor)
            }
            Static if matches!(next, This | Tilde) => {
                let start = self.span();
                self.advance();
                match self.kind() {
                    Tilde => {
                        self.advance();
                        self.parse_special_function(parent, start, "~this", MethodKind::StaticDestructor)
                    }
                    _ => self.parse_special_function(parent, start, "this", MethodKind::StaticConstructor),
                }
            }
            Shared if next == Static && matches!(self.look_ahead(2), This | Tilde) => {
                let start = self.span();
                self.advance();
                self.advance();
                match self.kind() {
                    Tilde => {
                        self.advance();
                        self.parse_special_function(parent, start, "~this", MethodKind::SharedStaticDestructor)
                    }
                    _ => self.parse_special_function(
                        parent,
                        start,
                        "this",
                        MethodKind::SharedStaticConstructor,
                    ),
                }
            }
            Invariant => self.parse_invariant(parent),
            Unittest => {
                let span = self.span();
                self.advance();
                let owner = self.module.add_detached(
                    parent,
                    Node::new("unittest", span, BareNode::Method(Box::new(Method::new(MethodKind::Normal)))),
                );
                let mut method = Method::new(MethodKind::Normal);
                self.parse_function_body(owner, &mut method, Vec::new());
                if let Some(body) = method.body.clone() {
                    self.push_container_statement(parent, body);
                }
                self.module[owner].bare = BareNode::Method(Box::new(method));
                Declared::Nested(Vec::new())
            }
            Version | Debug if next == Equals => {
                // `version = X;` only defines a version identifier
                while !matches!(self.kind(), Semicolon | EndOfFile) {
                    self.advance();
                }
                self.consume(Semicolon);
                Declared::Nested(Vec::new())
            }
            Version | Debug => self.parse_conditional_declaration(parent),
            Static if next == If => self.parse_conditional_declaration(parent),
            If => {
                self.error(BareError::MissingStatic(If));
                self.parse_conditional_declaration(parent)
            }
            Static if next == Assert => {
                self.advance();
                let statement = self.parse_static_assert();
                self.push_container_statement(parent, statement);
                Declared::Nested(Vec::new())
            }
            Assert => {
                self.error(BareError::MissingStatic(Assert));
                let statement = self.parse_static_assert();
                self.push_container_statement(parent, statement);
                Declared::Nested(Vec::new())
            }
            Static if matches!(next, Foreach | ForeachReverse) => {
                // the iteration is not evaluated, the body is taken as is
                self.advance();
                self.advance();
                if self.at(OpeningRoundBracket) {
                    self.skip_balanced();
                }
                Declared::Nested(self.parse_declaration_block(parent))
            }
            Module => {
                self.error(BareError::MisplacedModuleDeclaration);
                while !matches!(self.kind(), Semicolon | EndOfFile) {
                    self.advance();
                }
                self.consume(Semicolon);
                Declared::Nested(Vec::new())
            }
            _ => self.parse_variable_or_function(parent),
        }
    }

    /// Parse the attributes preceding a declaration onto the declaration-level stack.
    ///
    /// ```ebnf
    /// Attribute ::=
    ///     | #Visibility | "package" "(" QualifiedName ")"
    ///     | #StorageClass (> ¬"(")
    ///     | "extern" ("(" Linkage ")")?
    ///     | "align" ("(" AssignExpression ")")?
    ///     | "deprecated" ("(" AssignExpression ")")?
    ///     | "pragma" "(" … ")"
    ///     | AtAttribute
    /// ```
    fn parse_attributes(&mut self) -> bool {
        let mut has_attributes = false;

        loop {
            let kind = self.kind();
            let next = self.look_ahead(1);
            let span = self.span();

            let attribute = match kind {
                Static if matches!(next, If | Assert | This | Tilde | Foreach | ForeachReverse) => break,
                Shared if next == Static && matches!(self.look_ahead(2), This | Tilde) => break,
                kind if kind.is_type_qualifier() && next == OpeningRoundBracket => break,
                At => {
                    for attribute in self.parse_at_attributes() {
                        self.push_declaration_attribute(attribute);
                    }
                    has_attributes = true;
                    continue;
                }
                Pragma => {
                    self.advance();
                    if self.at(OpeningRoundBracket) {
                        self.skip_balanced();
                    }
                    has_attributes = true;
                    continue;
                }
                Extern => {
                    self.advance();
                    match self.at(OpeningRoundBracket) {
                        true => Attribute::Linkage(self.parse_linkage()),
                        false => Attribute::Keyword(Extern),
                    }
                }
                Align => {
                    self.advance();
                    let alignment = self.at(OpeningRoundBracket).then(|| {
                        self.advance();
                        let alignment = self.parse_assign_expression();
                        self.consume(ClosingRoundBracket);
                        alignment
                    });
                    Attribute::Alignment(alignment)
                }
                Deprecated => self.parse_deprecated(),
                kind if kind.is_visibility() || kind.is_storage_class() => {
                    self.advance();
                    if kind == Package && self.at(OpeningRoundBracket) {
                        self.skip_balanced();
                    }
                    Attribute::Keyword(kind)
                }
                _ => break,
            };

            if let Attribute::Keyword(current) = attribute {
                self.check_visibility(current, span);
            }
            self.push_declaration_attribute(attribute);
            has_attributes = true;
        }

        has_attributes
    }

    /// Report a visibility conflicting with an earlier one on the declaration-level stack
    /// and drop the earlier one.
    fn check_visibility(&mut self, current: TokenKind, span: Span) {
        if !current.is_visibility() {
            return;
        }

        let position = self.declaration_attributes.iter().position(is_visibility);
        if let Some(position) = position {
            if let Attribute::Keyword(previous) = self.declaration_attributes.remove(position) {
                if previous != current {
                    self.error_at(BareError::ConflictingVisibility { previous, current }, current, span);
                }
            }
        }
    }

    fn push_declaration_attribute(&mut self, attribute: Attribute) {
        if !self.declaration_attributes.contains(&attribute) {
            self.declaration_attributes.push(attribute);
        }
    }

    /// Move the declaration-level attributes onto the block-level stack.
    ///
    /// A visibility replaces the one currently in effect for the block.
    fn push_block_attributes(&mut self) {
        for attribute in mem::take(&mut self.declaration_attributes) {
            self.push_block_attribute(attribute);
        }
    }

    fn push_block_attribute(&mut self, attribute: Attribute) {
        if is_visibility(&attribute) {
            self.block_attributes.retain(|attribute| !is_visibility(attribute));
        }
        if !self.block_attributes.contains(&attribute) {
            self.block_attributes.push(attribute);
        }
    }

    /// Add a member to the given parent with the attributes currently in effect.
    fn add_member(&mut self, parent: NodeIndex, mut node: Node) -> NodeIndex {
        node.attributes.extend(self.block_attributes.iter().cloned());
        node.attributes.extend(self.declaration_attributes.iter().cloned());
        self.module.add(parent, node)
    }

    fn push_container_statement(&mut self, parent: NodeIndex, statement: Statement) {
        if let Some(container) = self.module[parent].container_mut() {
            container.statements.push(statement);
        }
    }

    /// ```ebnf
    /// Linkage ::= "(" (#Identifier ("++" ("," QualifiedName)?)? | "Objective" "-" "C") ")"
    /// ```
    fn parse_linkage(&mut self) -> String {
        let mut linkage = String::new();
        self.advance();

        while !matches!(self.kind(), ClosingRoundBracket | EndOfFile) {
            match self.kind() {
                Comma => linkage.push_str(", "),
                _ => linkage.push_str(&self.spelling()),
            }
            self.advance();
        }

        self.consume(ClosingRoundBracket);
        linkage
    }

    fn parse_deprecated(&mut self) -> Attribute {
        self.advance();

        let message = self.at(OpeningRoundBracket).then(|| {
            self.advance();
            let message = self.parse_assign_expression();
            self.consume(ClosingRoundBracket);
            message
        });

        Attribute::Deprecated(message)
    }

    /// ```ebnf
    /// QualifiedName ::= #Identifier ("." #Identifier)*
    /// ```
    fn parse_qualified_name(&mut self) -> Option<(String, Span)> {
        let (mut name, start) = self.consume_identifier()?;

        while self.at(Dot) && self.look_ahead(1) == Identifier {
            self.advance();
            name.push('.');
            name.push_str(&self.text());
            self.advance();
        }

        Some((name, self.span_from(start)))
    }

    /// ```ebnf
    /// ImportList ::= Import ("," Import)* (":" ImportBinding ("," ImportBinding)*)? ";"
    /// Import ::= (#Identifier "=")? QualifiedName
    /// ImportBinding ::= (#Identifier "=")? #Identifier
    /// ```
    ///
    /// Only the last import of a list may be selective.
    pub(crate) fn parse_import_list(&mut self, is_static: bool, is_public: bool) -> Vec<ast::Import> {
        let mut imports = Vec::new();

        loop {
            let start = self.span();
            let rename = match self.at(Identifier) && self.look_ahead(1) == Equals {
                true => {
                    let rename = self.text();
                    self.advance();
                    self.advance();
                    Some(rename)
                }
                false => None,
            };

            let Some((module, _)) = self.parse_qualified_name() else {
                break;
            };
            imports.push(ast::Import {
                span: self.span_from(start),
                module,
                rename,
                bindings: Vec::new(),
                is_public,
                is_static,
            });

            if self.maybe_consume(Colon) {
                let bindings = self.parse_import_bindings();
                if let Some(import) = imports.last_mut() {
                    import.bindings = bindings;
                    import.span = self.span_from(import.span);
                }
                break;
            }

            if !self.maybe_consume(Comma) {
                break;
            }
        }

        self.consume(Semicolon);
        imports
    }

    fn parse_import_bindings(&mut self) -> Vec<ImportBinding> {
        let mut bindings = Vec::new();

        loop {
            let Some((first, _)) = self.consume_identifier() else {
                break;
            };

            let binding = match self.maybe_consume(Equals) {
                true => match self.consume_identifier() {
                    Some((name, _)) => ImportBinding { name, rename: Some(first) },
                    None => break,
                },
                false => ImportBinding { name: first, rename: None },
            };
            bindings.push(binding);

            if !self.maybe_consume(Comma) {
                break;
            }
        }

        bindings
    }

    /// ```ebnf
    /// Aggregate ::=
    ///     #Identifier TemplateParameters? Constraint? (":" Type ("," Type)*)? Constraint?
    ///     (AggregateBody | ";")
    /// AnonymousAggregate ::= AggregateBody
    /// ```
    ///
    /// The members of anonymous structs and unions belong to the enclosing aggregate.
    fn parse_aggregate(&mut self, parent: NodeIndex, kind: ClassKind) -> Declared {
        let start = self.span();

        if !self.at(Identifier) {
            if self.at(OpeningCurlyBracket) {
                return Declared::Nested(self.parse_aggregate_body(parent));
            }
            self.expected(Expected::Category("identifier"));
            return Declared::Fresh(Vec::new());
        }
        let Some((name, name_span)) = self.consume_identifier() else {
            return Declared::Fresh(Vec::new());
        };

        let index = self.add_member(parent, Node::new(name, name_span, BareNode::Class(Box::new(ast::Class::new(kind)))));

        let template_parameters = match self.at(OpeningRoundBracket) {
            true => self.parse_template_parameters(index),
            false => Vec::new(),
        };
        let mut constraint = self.parse_constraint();

        let mut base_classes = Vec::new();
        if self.maybe_consume(Colon) {
            loop {
                base_classes.push(self.parse_type());
                if !self.maybe_consume(Comma) {
                    break;
                }
            }
        }
        if constraint.is_none() {
            constraint = self.parse_constraint();
        }

        if let BareNode::Class(class) = &mut self.module[index].bare {
            class.template_parameters = template_parameters;
            class.constraint = constraint;
            class.base_classes = base_classes;
        }

        if !self.maybe_consume(Semicolon) {
            self.parse_aggregate_body(index);
        }

        self.module[index].span = self.span_from(start);
        Declared::Fresh(vec![index])
    }

    /// ```ebnf
    /// AggregateBody ::= "{" Declaration* "}"
    /// ```
    fn parse_aggregate_body(&mut self, parent: NodeIndex) -> Vec<NodeIndex> {
        if self.consume(OpeningCurlyBracket).is_none() {
            return Vec::new();
        }

        let block_attributes = mem::take(&mut self.block_attributes);
        let declaration_attributes = mem::take(&mut self.declaration_attributes);

        let nodes = self.parse_declarations(parent, true);
        self.consume(ClosingCurlyBracket);

        self.block_attributes = block_attributes;
        self.declaration_attributes = declaration_attributes;
        nodes
    }

    /// ```ebnf
    /// Constraint ::= "if" "(" Expression ")"
    /// ```
    fn parse_constraint(&mut self) -> Option<Expression> {
        if !self.maybe_consume(If) {
            return None;
        }

        self.consume(OpeningRoundBracket);
        let constraint = self.parse_expression();
        self.consume(ClosingRoundBracket);
        Some(constraint)
    }

    /// Whether the current `enum` starts an enum declaration as opposed to a manifest constant.
    fn at_enum_declaration(&mut self) -> bool {
        match self.look_ahead(1) {
            OpeningCurlyBracket | Colon => true,
            Identifier => matches!(self.look_ahead(2), OpeningCurlyBracket | Colon | Semicolon),
            _ => false,
        }
    }

    /// ```ebnf
    /// Enum ::= "enum" #Identifier? (":" Type)? ("{" EnumMember ("," EnumMember)* ","? "}" | ";")
    /// EnumMember ::= ("deprecated" ("(" AssignExpression ")")? | AtAttribute)* Type? #Identifier ("=" AssignExpression)?
    /// ```
    fn parse_enum(&mut self, parent: NodeIndex) -> Declared {
        let start = self.span();
        self.advance();

        let (name, name_span) = match self.at(Identifier) {
            true => self.consume_identifier().unwrap_or_default(),
            false => (String::new(), self.span().start()),
        };
        let base = self.maybe_consume(Colon).then(|| self.parse_type());

        let mut node = Node::new(name, name_span, BareNode::Enum(ast::Enum::default()));
        node.type_ = base;
        let index = self.add_member(parent, node);

        if !self.maybe_consume(Semicolon) && self.consume(OpeningCurlyBracket).is_some() {
            let block_attributes = mem::take(&mut self.block_attributes);
            let declaration_attributes = mem::take(&mut self.declaration_attributes);

            while !self.at(ClosingCurlyBracket) && !self.at_end() {
                let position = self.position();
                self.parse_enum_member(index);
                if self.position() == position {
                    self.advance();
                }
                if !self.maybe_consume(Comma) {
                    break;
                }
                // `A, /// documentation`
                let line = self.previous_span().end.line;
                if let Some(documentation) = self.trailing_documentation(line) {
                    if let Some(&member) = self.module[index].children().last() {
                        self.module[member].documentation = Some(documentation.clone());
                        self.previous_documentation = Some(documentation);
                    }
                }
            }

            self.consume(ClosingCurlyBracket);
            self.block_attributes = block_attributes;
            self.declaration_attributes = declaration_attributes;
        }

        self.module[index].span = self.span_from(start);
        Declared::Fresh(vec![index])
    }

    fn parse_enum_member(&mut self, parent: NodeIndex) {
        let documentation = self.take_documentation();
        let start = self.span();

        let mut attributes = Vec::new();
        loop {
            match self.kind() {
                Deprecated => attributes.push(self.parse_deprecated()),
                At => attributes.extend(self.parse_at_attributes()),
                _ => break,
            }
        }

        let type_ = match self.at(Identifier) && matches!(self.look_ahead(1), Comma | Equals | ClosingCurlyBracket) {
            true => None,
            false => match self.try_parse_type() {
                Some(type_) => Some(type_),
                None => return,
            },
        };
        let Some((name, name_span)) = self.consume_identifier() else {
            return;
        };
        let initializer = self.maybe_consume(Equals).then(|| self.parse_assign_expression());

        let mut node = Node::new(name, name_span, BareNode::EnumMember(EnumMember { initializer }));
        node.type_ = type_;
        node.span = self.span_from(start);
        node.attributes.extend(attributes);
        node.documentation = documentation.clone();
        self.module.add(parent, node);

        if documentation.is_some() {
            self.previous_documentation = documentation;
        }
    }

    /// ```ebnf
    /// Alias ::=
    ///     | "alias" #Identifier "this" ";"
    ///     | "alias" AliasBinding ("," AliasBinding)* ";"
    ///     | "alias" Type #Identifier ("," #Identifier)* ";"
    /// AliasBinding ::= #Identifier TemplateParameters? "=" (Type (> ";" | ",") | AssignExpression)
    /// ```
    fn parse_alias(&mut self, parent: NodeIndex) -> Declared {
        let start = self.span();
        self.advance();

        if self.at(Identifier) && self.look_ahead(1) == This {
            let span = self.span();
            let target = self.text();
            self.advance();
            self.advance();
            self.consume(Semicolon);

            let mut node = Node::new("this", span, BareNode::Variable(Variable { initializer: None, is_alias: true }));
            node.type_ = Some(TypeDeclaration::identifier(span, target));
            node.span = self.span_from(start);
            return Declared::Fresh(vec![self.add_member(parent, node)]);
        }

        let mut nodes = Vec::new();

        if self.at(Identifier) && matches!(self.look_ahead(1), Equals | OpeningRoundBracket) {
            loop {
                let Some((name, name_span)) = self.consume_identifier() else {
                    break;
                };
                let index = self.add_member(
                    parent,
                    Node::new(name, name_span, BareNode::Variable(Variable { initializer: None, is_alias: true })),
                );
                if self.at(OpeningRoundBracket) {
                    self.parse_template_parameters(index);
                }
                self.consume(Equals);

                let (type_, initializer) = self.parse_alias_target();
                let span = self.span_from(start);
                let node = &mut self.module[index];
                node.type_ = type_;
                node.span = span;
                if let BareNode::Variable(variable) = &mut node.bare {
                    variable.initializer = initializer;
                }
                nodes.push(index);

                if !self.maybe_consume(Comma) {
                    break;
                }
            }
        } else {
            let type_ = self.parse_type();
            loop {
                let Some((name, name_span)) = self.consume_identifier() else {
                    break;
                };
                // `alias void Callback(int);`
                if self.at(OpeningRoundBracket) {
                    self.skip_balanced();
                    self.parse_member_function_attributes();
                }

                let mut node = Node::new(name, name_span, BareNode::Variable(Variable { initializer: None, is_alias: true }));
                node.type_ = Some(type_.clone());
                node.span = self.span_from(start);
                nodes.push(self.add_member(parent, node));

                if !self.maybe_consume(Comma) {
                    break;
                }
            }
        }

        self.consume(Semicolon);
        Declared::Fresh(nodes)
    }

    /// Parse what an alias binds to, preferring types over expressions.
    fn parse_alias_target(&mut self) -> (Option<TypeDeclaration>, Option<Expression>) {
        let type_ = self.speculate(|parser| {
            let type_ = parser.try_parse_type()?;
            matches!(parser.kind(), Semicolon | Comma).then_some(type_)
        });

        match type_ {
            Some(type_) => (Some(type_), None),
            None => {
                let expression = self.parse_assign_expression();
                (expression.type_representation(), Some(expression))
            }
        }
    }

    /// ```ebnf
    /// Mixin ::= "mixin" Arguments ";" | "mixin" Type #Identifier? ";"
    /// ```
    fn parse_mixin(&mut self) -> Statement {
        let start = self.span();

        if self.look_ahead(1) == OpeningRoundBracket {
            let expression = self.parse_expression();
            self.consume(Semicolon);
            return Statement::new(self.span_from(start), BareStatement::Expression(expression));
        }

        self.advance();
        let type_ = self.parse_type();
        if self.at(Identifier) {
            self.advance();
        }
        self.consume(Semicolon);

        let template = Expression::new(type_.span, BareExpression::Type(type_));
        let span = self.span_from(start);
        Statement::new(span, BareStatement::Expression(Expression::new(span, BareExpression::Mixin(vec![template]))))
    }

    /// ```ebnf
    /// StaticAssert ::= "assert" Arguments ";"
    /// ```
    fn parse_static_assert(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        let arguments = self.parse_arguments();
        self.consume(Semicolon);
        Statement::new(self.span_from(start), BareStatement::StaticAssert(arguments))
    }

    /// ```ebnf
    /// CompileCondition ::=
    ///     | "version" "(" (#Identifier | #Literal | "unittest" | "assert") ")"
    ///     | "debug" ("(" (#Identifier | #Literal) ")")?
    ///     | "static"? "if" "(" AssignExpression ")"
    /// ```
    pub(crate) fn parse_compile_condition(&mut self) -> CompileCondition {
        match self.kind() {
            Version => {
                self.advance();
                self.consume(OpeningRoundBracket);
                let version = match self.kind() {
                    Identifier | Literal | Unittest | Assert => {
                        let version = self.spelling();
                        self.advance();
                        version
                    }
                    _ => {
                        self.expected(Expected::Category("version identifier"));
                        String::new()
                    }
                };
                self.consume(ClosingRoundBracket);
                CompileCondition::Version(version)
            }
            Debug => {
                self.advance();
                let level = self.maybe_consume(OpeningRoundBracket).then(|| {
                    let level = self.spelling();
                    self.advance();
                    self.consume(ClosingRoundBracket);
                    level
                });
                CompileCondition::Debug(level)
            }
            _ => {
                if self.at(Static) {
                    self.advance();
                }
                self.advance();
                self.consume(OpeningRoundBracket);
                let condition = self.parse_assign_expression();
                self.consume(ClosingRoundBracket);
                CompileCondition::StaticIf(condition)
            }
        }
    }

    /// ```ebnf
    /// ConditionalDeclaration ::= CompileCondition (":" | DeclarationBlock ("else" DeclarationBlock)?)
    /// ```
    ///
    /// Both branches are kept, their declarations carry the condition as an attribute.
    fn parse_conditional_declaration(&mut self, parent: NodeIndex) -> Declared {
        let outer = mem::take(&mut self.declaration_attributes);
        let condition = self.parse_compile_condition();

        if self.maybe_consume(Colon) {
            for attribute in outer {
                self.push_block_attribute(attribute);
            }
            self.push_block_attribute(Attribute::Condition(condition));
            return Declared::Nested(Vec::new());
        }

        let mut nodes = self.parse_conditional_branch(parent, &outer, Attribute::Condition(condition.clone()));

        if self.maybe_consume(Else) {
            let negation = Attribute::Condition(CompileCondition::Else(Box::new(condition)));
            nodes.extend(self.parse_conditional_branch(parent, &outer, negation));
        }

        Declared::Nested(nodes)
    }

    fn parse_conditional_branch(&mut self, parent: NodeIndex, outer: &[Attribute], condition: Attribute) -> Vec<NodeIndex> {
        let saved = self.block_attributes.clone();
        for attribute in outer {
            self.push_block_attribute(attribute.clone());
        }
        self.block_attributes.push(condition);

        let nodes = self.parse_declaration_block(parent);

        self.block_attributes = saved;
        nodes
    }

    /// ```ebnf
    /// DeclarationBlock ::= "{" Declaration* "}" | Declaration
    /// ```
    fn parse_declaration_block(&mut self, parent: NodeIndex) -> Vec<NodeIndex> {
        if !self.maybe_consume(OpeningCurlyBracket) {
            return self.parse_declaration(parent);
        }

        let nodes = self.parse_declarations(parent, true);
        self.consume(ClosingCurlyBracket);
        nodes
    }

    /// ```ebnf
    /// VariableOrFunction ::=
    ///     | Type? #Identifier TemplateParameters? Parameters MemberFunctionAttribute* Constraint? FunctionBody
    ///     | Type? Declarator ("," Declarator)* ";"
    /// Declarator ::= #Identifier ("=" Initializer)?
    /// ```
    ///
    /// The type may only be left out after a storage class like in `auto x = 1;`.
    fn parse_variable_or_function(&mut self, parent: NodeIndex) -> Declared {
        let start = self.span();

        let is_inferred = !self.declaration_attributes.is_empty()
            && self.at(Identifier)
            && matches!(self.look_ahead(1), Equals | OpeningRoundBracket);

        let type_ = match is_inferred {
            true => None,
            false => match self.try_parse_type() {
                Some(type_) => Some(type_),
                None => return Declared::Fresh(Vec::new()),
            },
        };

        let Some((mut name, mut name_span)) = self.consume_identifier() else {
            return Declared::Fresh(Vec::new());
        };

        if self.at(OpeningRoundBracket) {
            return self.parse_function(parent, start, type_, name, name_span, MethodKind::Normal);
        }

        let mut nodes = Vec::new();
        loop {
            let initializer = self.maybe_consume(Equals).then(|| self.parse_initializer());

            let mut node = Node::new(name, name_span, BareNode::Variable(Variable { initializer, is_alias: false }));
            node.type_ = type_.clone();
            node.span = self.span_from(start);
            nodes.push(self.add_member(parent, node));

            if !self.maybe_consume(Comma) {
                break;
            }
            match self.consume_identifier() {
                Some(declarator) => (name, name_span) = declarator,
                None => break,
            }
        }

        self.consume(Semicolon);
        Declared::Fresh(nodes)
    }

    /// ```ebnf
    /// Initializer ::= "{" … "}" | AssignExpression
    /// ```
    ///
    /// Struct initializers are skipped.
    fn parse_initializer(&mut self) -> Expression {
        if self.at(OpeningCurlyBracket) {
            let start = self.span();
            self.skip_balanced();
            return Expression::error(self.span_from(start));
        }

        self.parse_assign_expression()
    }

    /// Parse the rest of a function starting at its parameters.
    fn parse_function(
        &mut self,
        parent: NodeIndex,
        start: Span,
        type_: Option<TypeDeclaration>,
        name: String,
        name_span: Span,
        kind: MethodKind,
    ) -> Declared {
        let mut node = Node::new(name, name_span, BareNode::Method(Box::new(Method::new(kind))));
        node.type_ = type_;
        let index = self.add_member(parent, node);

        let mut method = Method::new(kind);

        // `T foo(A)(A a)`
        if self.look(|parser| parser.skip_balanced() && parser.at(OpeningRoundBracket)) {
            method.template_parameters = self.parse_template_parameters(index);
        }

        let mut parameter_names = Vec::new();
        if let Some((parameters, is_variadic)) = self.parse_parameters() {
            method.is_variadic = is_variadic;
            for parameter in parameters {
                parameter_names.extend(parameter.name.clone());
                let parameter = self.add_parameter(index, parameter);
                method.parameters.push(parameter);
            }
        }

        let attributes = self.parse_member_function_attributes();
        self.module[index].attributes.extend(attributes);
        method.constraint = self.parse_constraint();

        self.parse_function_body(index, &mut method, parameter_names);

        let span = self.span_from(start);
        let node = &mut self.module[index];
        node.span = span;
        node.bare = BareNode::Method(Box::new(method));
        Declared::Fresh(vec![index])
    }

    /// Parse special functions like destructors whose name is the current token.
    fn parse_special_function(&mut self, parent: NodeIndex, start: Span, name: &str, kind: MethodKind) -> Declared {
        let name_span = self.span();
        self.advance();
        self.parse_function(parent, start, None, name.into(), name_span, kind)
    }

    fn parse_function_without_parameters(
        &mut self,
        parent: NodeIndex,
        start: Span,
        name: &str,
        name_span: Span,
        kind: MethodKind,
    ) -> Declared {
        let index = self.add_member(parent, Node::new(name, name_span, BareNode::Method(Box::new(Method::new(kind)))));

        let mut method = Method::new(kind);
        let attributes = self.parse_member_function_attributes();
        self.module[index].attributes.extend(attributes);
        self.parse_function_body(index, &mut method, Vec::new());

        let span = self.span_from(start);
        let node = &mut self.module[index];
        node.span = span;
        node.bare = BareNode::Method(Box::new(method));
        Declared::Fresh(vec![index])
    }

    /// ```ebnf
    /// Invariant ::= "invariant" ("(" ")")? BlockStatement | "invariant" "(" AssignExpression ")" ";"
    /// ```
    fn parse_invariant(&mut self, parent: NodeIndex) -> Declared {
        let start = self.span();
        self.advance();

        if self.at(OpeningRoundBracket) && self.look_ahead(1) == ClosingRoundBracket {
            self.advance();
            self.advance();
        }

        if !self.at(OpeningRoundBracket) {
            return self.parse_function_without_parameters(parent, start, "invariant", start, MethodKind::Invariant);
        }

        self.advance();
        let condition = self.parse_assign_expression();
        self.consume(ClosingRoundBracket);
        self.consume(Semicolon);

        let mut method = Method::new(MethodKind::Invariant);
        method.body = Some(Statement::new(condition.span, BareStatement::Expression(condition)));
        let mut node = Node::new("invariant", start, BareNode::Method(Box::new(method)));
        node.span = self.span_from(start);
        Declared::Fresh(vec![self.add_member(parent, node)])
    }

    fn add_parameter(&mut self, owner: NodeIndex, parameter: Parameter) -> NodeIndex {
        let mut node = Node::new(
            parameter.name.unwrap_or_default(),
            parameter.span,
            BareNode::Variable(Variable { initializer: parameter.default, is_alias: false }),
        );
        node.type_ = parameter.type_;
        node.attributes = parameter.attributes.into_iter().map(Attribute::Keyword).collect();
        self.module.add_detached(owner, node)
    }

    /// ```ebnf
    /// FunctionBody ::=
    ///     | ";"
    ///     | "=>" AssignExpression ";"
    ///     | Contract* (("do" | "body") BlockStatement | BlockStatement | ";")
    /// Contract ::=
    ///     | "in" ("(" AssignExpression ")" | BlockStatement)
    ///     | "out" "(" #Identifier? ";" AssignExpression ")"
    ///     | "out" ("(" #Identifier? ")")? BlockStatement
    /// ```
    fn parse_function_body(&mut self, method_index: NodeIndex, method: &mut Method, parameters: Vec<String>) {
        let block_attributes = mem::take(&mut self.block_attributes);
        let declaration_attributes = mem::take(&mut self.declaration_attributes);
        let owner = mem::replace(&mut self.owner, method_index);
        let previous_documentation = self.previous_documentation.take();
        self.locals.push(parameters);

        loop {
            match self.kind() {
                In => {
                    self.advance();
                    method.in_contract = Some(match self.at(OpeningRoundBracket) {
                        true => self.parse_contract_expression(),
                        false => self.parse_function_block(),
                    });
                }
                Out => {
                    self.advance();
                    if self.maybe_consume(OpeningRoundBracket) {
                        if self.at(Identifier) {
                            let result = self.text();
                            self.declare_local(&result);
                            self.advance();
                        }
                        if self.maybe_consume(Semicolon) {
                            let condition = self.parse_assign_expression();
                            self.consume(ClosingRoundBracket);
                            method.out_contract =
                                Some(Statement::new(condition.span, BareStatement::Expression(condition)));
                            continue;
                        }
                        self.consume(ClosingRoundBracket);
                    }
                    method.out_contract = Some(self.parse_function_block());
                }
                Do | Body => {
                    self.advance();
                    method.body = Some(self.parse_function_block());
                    break;
                }
                OpeningCurlyBracket => {
                    method.body = Some(self.parse_function_block());
                    break;
                }
                WideArrowRight => {
                    let start = self.span();
                    self.advance();
                    let expression = self.parse_assign_expression();
                    self.consume(Semicolon);
                    method.body = Some(Statement::new(self.span_from(start), BareStatement::Return(Some(expression))));
                    break;
                }
                Semicolon => {
                    self.advance();
                    break;
                }
                _ => {
                    self.expected(Expected::from(OpeningCurlyBracket).or(Semicolon));
                    break;
                }
            }
        }

        self.locals.pop();
        self.previous_documentation = previous_documentation;
        self.owner = owner;
        self.declaration_attributes = declaration_attributes;
        self.block_attributes = block_attributes;
    }

    fn parse_contract_expression(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        let condition = self.parse_assign_expression();
        self.consume(ClosingRoundBracket);
        Statement::new(self.span_from(start), BareStatement::Expression(condition))
    }

    /// Parse a function body or skip it in structure-only mode.
    fn parse_function_block(&mut self) -> Statement {
        if self.options.structure_only && self.at(OpeningCurlyBracket) {
            let span = self.skip_block();
            return Statement::new(span, BareStatement::Block(Vec::new()));
        }

        self.parse_block()
    }

    /// Take the documentation comments between the previous and the current token.
    fn take_documentation(&mut self) -> Option<String> {
        let start = self.span().start;
        let end_of_previous = match self.position() {
            0 => None,
            _ => Some(self.previous_span().end),
        };

        let comments = self.comments();
        let mut cursor = self.comment_cursor;
        let mut contents = Vec::new();
        while let Some(comment) = comments.get(cursor) {
            if comment.span.start >= start {
                break;
            }
            let is_adjacent = end_of_previous.map_or(true, |end| comment.span.start >= end);
            if comment.documentation && is_adjacent {
                contents.push((comment.is_ditto(), comment.content()));
            }
            cursor += 1;
        }
        self.comment_cursor = cursor;

        match contents.last() {
            None => None,
            Some((true, _)) => self.previous_documentation.clone(),
            Some(_) => Some(
                contents
                    .into_iter()
                    .filter(|(is_ditto, _)| !is_ditto)
                    .map(|(_, content)| content)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        }
    }

    /// Take a documentation comment following the previous token on the given line.
    fn trailing_documentation(&mut self, line: u32) -> Option<String> {
        let next = self.span().start;

        let comments = self.comments();
        let mut cursor = self.comment_cursor;
        let mut trailing = None;
        while let Some(comment) = comments.get(cursor) {
            if comment.span.start >= next || comment.span.start.line != line || comment.starts_at_line_start {
                break;
            }
            cursor += 1;
            if comment.documentation {
                trailing = Some((comment.is_ditto(), comment.content()));
                break;
            }
        }

        let (is_ditto, content) = trailing?;
        self.comment_cursor = cursor;
        match is_ditto {
            true => self.previous_documentation.clone(),
            false => Some(content),
        }
    }
}

fn is_visibility(attribute: &Attribute) -> bool {
    matches!(attribute, &Attribute::Keyword(keyword) if keyword.is_visibility())
}

//! The resolution of expressions to the types of their values.

use super::{
    context::{ResolutionContext, Scope},
    result::{BareResult, Declaration, ResolveResult},
    template::substitute,
    Depth,
};
use ast::{BareExpression, BareNode, ClassKind, Expression, FunctionLiteralBody};
use lexer::token::{LiteralValue, TokenKind};
use span::Span;

impl<'a> ResolutionContext<'a> {
    /// Resolve an expression from the given scope.
    ///
    /// Names resolve to the declarations they refer to, everything else resolves to the type
    /// of its value.
    pub(crate) fn resolve_expression(&mut self, expression: &Expression, scope: Scope<'a>, depth: Depth) -> Vec<ResolveResult<'a>> {
        use BareExpression::*;

        let span = expression.span;

        match &expression.bare {
            Literal(_) | Type(_) | TemplateInstance(_) | Typeof(_) => self.resolve_represented(expression, scope, depth),
            Identifier(name) => self.resolve_name(name, span, scope, depth),
            Keyword(kind) => self.resolve_keyword(*kind, span, scope, depth),
            Member(member) => {
                let bases = self.resolve_expression(&member.base, scope, depth);
                let members = self.resolve_member_of_all(&bases, &member.name, member.name_span, scope, depth);
                match &member.arguments {
                    Some(arguments) => members
                        .into_iter()
                        .map(|member| self.instantiate(member, arguments, span, scope, depth))
                        .collect(),
                    None => members,
                }
            }
            ModuleScope(expression) => {
                let root = Scope::new(Declaration::new(scope.module(), scope.module().root), None);
                self.resolve_expression(expression, root, depth)
            }
            Call(call) => {
                let callees = self.resolve_expression(&call.callee, scope, depth);
                let mut results = Vec::new();
                for callee in callees {
                    results.extend(self.resolve_call(&callee, &call.arguments, scope, depth));
                }
                results
            }
            Index(index) => {
                let bases = self.resolve_values(&index.base, scope, depth);
                bases.into_iter().filter_map(|base| element(&base, &index.arguments)).collect()
            }
            Slice(slice) => self
                .resolve_values(&slice.base, scope, depth)
                .into_iter()
                .map(|base| {
                    let (unqualified, _) = base.unqualified();
                    let element = match unqualified.bare {
                        BareResult::Array { .. } | BareResult::Pointer => unqualified.base().cloned(),
                        _ => None,
                    };
                    match element {
                        Some(element) => ResolveResult::with_base(BareResult::Array { size: None }, element),
                        None => base,
                    }
                })
                .collect(),
            Unary(unary) => {
                let operands = self.resolve_values(&unary.operand, scope, depth);
                match unary.operator {
                    TokenKind::Ampersand => operands
                        .into_iter()
                        .map(|operand| ResolveResult::with_base(BareResult::Pointer, operand))
                        .collect(),
                    TokenKind::Asterisk => operands
                        .into_iter()
                        .filter_map(|operand| match operand.unqualified().0.bare {
                            BareResult::Pointer => operand.unqualified().0.base().cloned(),
                            _ => None,
                        })
                        .collect(),
                    TokenKind::Exclamation => vec![ResolveResult::basic(TokenKind::Bool)],
                    TokenKind::Delete => vec![ResolveResult::basic(TokenKind::Void)],
                    _ => operands,
                }
            }
            Postfix(unary) => self.resolve_values(&unary.operand, scope, depth),
            Binary(binary) => {
                use TokenKind::*;

                match binary.operator {
                    operator if operator.is_assign_operator() => self.resolve_values(&binary.left, scope, depth),
                    Comma => self.resolve_values(&binary.right, scope, depth),
                    In => self
                        .resolve_values(&binary.right, scope, depth)
                        .into_iter()
                        .filter_map(|aggregate| match aggregate.unqualified().0.bare {
                            BareResult::AssociativeArray { .. } if !binary.negated => aggregate
                                .unqualified()
                                .0
                                .base()
                                .map(|value| ResolveResult::with_base(BareResult::Pointer, value.clone())),
                            _ => Some(ResolveResult::basic(Bool)),
                        })
                        .collect(),
                    _ if binary.is_comparison_or_logical() => vec![ResolveResult::basic(Bool)],
                    Tilde => {
                        let left = self.resolve_values(&binary.left, scope, depth);
                        if let Some(array) = left.iter().find(|left| is_array(left)) {
                            return vec![array.clone()];
                        }
                        let right = self.resolve_values(&binary.right, scope, depth);
                        if let Some(array) = right.iter().find(|right| is_array(right)) {
                            return vec![array.clone()];
                        }
                        left.into_iter()
                            .map(|element| ResolveResult::with_base(BareResult::Array { size: None }, element))
                            .collect()
                    }
                    _ => self.resolve_values(&binary.left, scope, depth),
                }
            }
            Conditional(conditional) => {
                let results = self.resolve_values(&conditional.consequence, scope, depth);
                match results.is_empty() {
                    true => self.resolve_values(&conditional.alternative, scope, depth),
                    false => results,
                }
            }
            Cast(cast) => {
                let results = match &cast.type_ {
                    Some(type_) => self.resolve_type_declaration(type_, scope, depth),
                    None => self.resolve_values(&cast.operand, scope, depth),
                };
                results
                    .into_iter()
                    .map(|result| {
                        cast.qualifiers.iter().rev().fold(result, |result, &qualifier| {
                            ResolveResult::with_base(BareResult::Qualified(qualifier), result)
                        })
                    })
                    .collect()
            }
            New(new) => self
                .resolve_type_declaration(&new.type_, scope, depth)
                .into_iter()
                .map(|type_| {
                    let is_reference = match &type_.bare {
                        BareResult::Type { declaration, .. } => {
                            declaration.node().class().map_or(false, |class| class.kind.is_reference())
                        }
                        BareResult::Array { .. } => true,
                        _ => false,
                    };
                    match is_reference {
                        true => type_,
                        false => ResolveResult::with_base(BareResult::Pointer, type_),
                    }
                })
                .collect(),
            ArrayLiteral(elements) => {
                let element = match elements.first() {
                    Some(element) => self.resolve_values(element, scope, depth).into_iter().next(),
                    None => Some(ResolveResult::basic(TokenKind::Void)),
                };
                element
                    .map(|element| ResolveResult::with_base(BareResult::Array { size: None }, element))
                    .into_iter()
                    .collect()
            }
            AssociativeArrayLiteral(entries) => {
                let Some((key, value)) = entries.first() else {
                    return Vec::new();
                };
                let key = self.resolve_values(key, scope, depth).into_iter().next();
                let value = self.resolve_values(value, scope, depth).into_iter().next();
                match (key, value) {
                    (Some(key), Some(value)) => vec![ResolveResult::with_base(
                        BareResult::AssociativeArray { key: Box::new(key) },
                        value,
                    )],
                    _ => Vec::new(),
                }
            }
            FunctionLiteral(literal) => {
                let return_type = match (&literal.return_type, &literal.body) {
                    (Some(type_), _) => self.resolve_type_declaration(type_, scope, depth).into_iter().next(),
                    (None, FunctionLiteralBody::Expression(body)) if literal.parameters.iter().all(|parameter| parameter.type_.is_some()) => {
                        self.resolve_values(body, scope, depth).into_iter().next()
                    }
                    _ => None,
                };
                let bare = BareResult::Delegate(Box::new(literal.signature()));
                vec![match return_type {
                    Some(return_type) => ResolveResult::with_base(bare, return_type),
                    None => ResolveResult::new(bare),
                }]
            }
            Assert(_) => vec![ResolveResult::basic(TokenKind::Void)],
            Import(_) => vec![ResolveResult::string()],
            Typeid(_) => self.look_up("TypeInfo", span, scope, depth).into_iter().take(1).collect(),
            Is(_) | Traits(_) => vec![ResolveResult::basic(TokenKind::Bool)],
            Parenthesized(expression) => self.resolve_expression(expression, scope, depth),
            Mixin(_) | Error => Vec::new(),
        }
    }

    /// Resolve an expression to the types of its values.
    fn resolve_values(&mut self, expression: &Expression, scope: Scope<'a>, depth: Depth) -> Vec<ResolveResult<'a>> {
        self.resolve_expression(expression, scope, depth)
            .into_iter()
            .filter_map(|result| result.type_().cloned())
            .collect()
    }

    /// Resolve an expression through the type declaration its shape represents.
    fn resolve_represented(&mut self, expression: &Expression, scope: Scope<'a>, depth: Depth) -> Vec<ResolveResult<'a>> {
        match expression.type_representation() {
            Some(type_) => self.resolve_type_declaration(&type_, scope, depth),
            None => Vec::new(),
        }
    }

    fn resolve_keyword(&mut self, kind: TokenKind, span: Span, scope: Scope<'a>, depth: Depth) -> Vec<ResolveResult<'a>> {
        use TokenKind::*;

        match kind {
            This => self.enclosing_aggregate(scope, depth).into_iter().collect(),
            Super => self
                .enclosing_aggregate(scope, depth)
                .and_then(|aggregate| aggregate.base.map(|base| *base))
                .into_iter()
                .collect(),
            Null => vec![ResolveResult::basic(Null)],
            True | False => vec![ResolveResult::basic(Bool)],
            Dollar => vec![ResolveResult::basic(Ulong)],
            SpecialLine => vec![ResolveResult::basic(Int)],
            kind if kind.is_special_token() => vec![ResolveResult::string()],
            kind if kind.is_basic_type() => vec![ResolveResult::basic(kind)],
            _ => {
                self.trace(format!("the keyword {kind} at {span:?} does not denote a value"));
                Vec::new()
            }
        }
    }

    /// The class, struct or union `this` refers to.
    fn enclosing_aggregate(&mut self, scope: Scope<'a>, depth: Depth) -> Option<ResolveResult<'a>> {
        let module = scope.module();
        let aggregate = module.ancestors(scope.declaration.index).find(|&index| {
            module[index]
                .class()
                .map_or(false, |class| !matches!(class.kind, ClassKind::Template | ClassKind::MixinTemplate))
        })?;

        Some(self.type_result(Declaration::new(module, aggregate), depth))
    }

    /// The result of calling a callee.
    fn resolve_call(
        &mut self,
        callee: &ResolveResult<'a>,
        arguments: &[Expression],
        scope: Scope<'a>,
        depth: Depth,
    ) -> Option<ResolveResult<'a>> {
        match &callee.bare {
            BareResult::Member(declaration) => {
                let declaration = *declaration;
                let node = declaration.node();

                if let BareNode::Method(method) = &node.bare {
                    let return_type = callee.base()?.clone();
                    if method.template_parameters.is_empty() {
                        return Some(return_type);
                    }
                    let deduced = self.deduce_from_call(declaration, arguments, scope, depth);
                    return Some(substitute(&return_type, &deduced));
                }

                // a variable of a delegate or aggregate type
                let type_ = callee.base()?;
                self.resolve_call(type_, arguments, scope, depth)
            }
            BareResult::Delegate(_) => callee.base().cloned(),
            BareResult::Qualified(_) | BareResult::Pointer => self.resolve_call(callee.base()?, arguments, scope, depth),
            // constructor calls and struct literals
            BareResult::Type { .. } | BareResult::Static(_) => Some(callee.clone()),
            _ => None,
        }
    }
}

/// The type of indexing a value.
///
/// Without arguments, an array is sliced and a type is turned into the array type.
fn element<'a>(base: &ResolveResult<'a>, arguments: &[Expression]) -> Option<ResolveResult<'a>> {
    let (unqualified, _) = base.unqualified();

    match &unqualified.bare {
        BareResult::Array { .. } | BareResult::Pointer | BareResult::AssociativeArray { .. } if !arguments.is_empty() => {
            unqualified.base().cloned()
        }
        BareResult::Array { .. } => Some(ResolveResult::with_base(BareResult::Array { size: None }, unqualified.base()?.clone())),
        BareResult::TypeTuple(elements) => {
            let position = match arguments.first().map(|argument| &argument.bare) {
                Some(BareExpression::Literal(literal)) => match literal.value() {
                    LiteralValue::Integer(position) => usize::try_from(*position).ok()?,
                    _ => return None,
                },
                _ => 0,
            };
            elements.get(position).cloned()
        }
        BareResult::Type { .. } | BareResult::Static(_) if arguments.is_empty() => {
            Some(ResolveResult::with_base(BareResult::Array { size: None }, base.clone()))
        }
        _ => None,
    }
}

fn is_array(result: &ResolveResult<'_>) -> bool {
    matches!(result.unqualified().0.bare, BareResult::Array { .. })
}

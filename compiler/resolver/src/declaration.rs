//! Turning declarations into results.

use super::{
    context::{ResolutionContext, Scope},
    result::{BareResult, Declaration, ResolveResult},
    Depth, MEMBER_DEPTH,
};
use ast::{BareNode, MethodKind, NodeIndex, TemplateParameterKind};
use lexer::token::TokenKind;
use span::Span;

impl<'a> ResolutionContext<'a> {
    /// The results a declaration found by lookup stands for.
    ///
    /// Aliases are replaced by what they alias unless disabled in the options.
    pub(crate) fn resolve_declaration(&mut self, declaration: Declaration<'a>, span: Span, depth: Depth) -> Vec<ResolveResult<'a>> {
        let node = declaration.node();

        match &node.bare {
            BareNode::Module(_) => vec![ResolveResult::new(BareResult::Module(declaration.module))],
            BareNode::Class(_) | BareNode::Enum(_) => vec![self.type_result(declaration, depth)],
            BareNode::TemplateParameter(parameter) => match parameter.kind {
                TemplateParameterKind::Value { .. } => vec![self.member_result(declaration, span, depth)],
                TemplateParameterKind::Alias { .. } => vec![ResolveResult::new(BareResult::Member(declaration))],
                _ => vec![ResolveResult::new(BareResult::type_(declaration))],
            },
            BareNode::Variable(_) if node.is_alias() && self.options.resolve_aliases => {
                self.resolve_alias(declaration, span, depth)
            }
            _ => vec![self.member_result(declaration, span, depth)],
        }
    }

    /// A class, interface, struct, union, template or enum together with its base.
    pub(crate) fn type_result(&mut self, declaration: Declaration<'a>, depth: Depth) -> ResolveResult<'a> {
        let mut result = ResolveResult::new(BareResult::type_(declaration));
        if !self.options.resolve_base_types {
            return result;
        }

        let node = declaration.node();
        match &node.bare {
            BareNode::Class(_) => {
                let (base, interfaces) = self.base_classes(declaration, depth);
                result.base = base.map(Box::new);
                if let BareResult::Type { interfaces: slot, .. } = &mut result.bare {
                    *slot = interfaces;
                }
            }
            BareNode::Enum(_) => {
                result.base = match &node.type_ {
                    Some(type_) => self.resolve_type_declaration(type_, Scope::of(declaration), depth.next()).into_iter().next(),
                    None => Some(ResolveResult::basic(TokenKind::Int)),
                }
                .map(Box::new);
            }
            _ => {}
        }

        result
    }

    /// A variable, method, enum member or value template parameter typed by its base.
    fn member_result(&mut self, declaration: Declaration<'a>, span: Span, depth: Depth) -> ResolveResult<'a> {
        let mut result = ResolveResult::new(BareResult::Member(declaration));
        if self.options.resolve_base_types {
            result.base = self.member_type(declaration, span, depth).map(Box::new);
        }
        result
    }

    /// The type of a variable, the return type of a method or the type of an enum member.
    ///
    /// Beyond the recursion bound, no type is returned.
    pub(crate) fn member_type(&mut self, declaration: Declaration<'a>, span: Span, depth: Depth) -> Option<ResolveResult<'a>> {
        let node = declaration.node();
        if depth.exceeds(MEMBER_DEPTH) {
            self.truncate(&node.name, span, MEMBER_DEPTH);
            return None;
        }

        let scope = Scope::of(declaration);
        if let Some(type_) = &node.type_ {
            return self.resolve_type_declaration(type_, scope, depth.next()).into_iter().next();
        }

        match &node.bare {
            BareNode::Variable(variable) => {
                let initializer = variable.initializer.as_ref()?;
                let result = self.resolve_expression(initializer, scope, depth.next()).into_iter().next()?;
                result.type_().cloned()
            }
            BareNode::EnumMember(member) => {
                let parent = declaration.parent()?;
                if !parent.node().is_anonymous() {
                    return Some(self.type_result(parent, depth.next()));
                }
                if let Some(type_) = &parent.node().type_ {
                    return self.resolve_type_declaration(type_, Scope::of(parent), depth.next()).into_iter().next();
                }
                match &member.initializer {
                    Some(initializer) => {
                        let result = self.resolve_expression(initializer, scope, depth.next()).into_iter().next()?;
                        result.type_().cloned()
                    }
                    None => Some(ResolveResult::basic(TokenKind::Int)),
                }
            }
            BareNode::Method(method) if method.kind == MethodKind::Constructor => {
                let class = declaration.parent().filter(|parent| parent.node().class().is_some())?;
                Some(self.type_result(class, depth.next()))
            }
            _ => None,
        }
    }
}

/// The template parameters of a declaration.
///
/// The parameters of alias templates are not listed by the alias itself but only point to it.
pub(crate) fn template_parameters(declaration: Declaration<'_>) -> Vec<NodeIndex> {
    let node = declaration.node();
    if node.is_template() || !node.is_alias() {
        return node.template_parameters().to_vec();
    }

    declaration
        .module
        .nodes
        .iter()
        .filter(|(_, candidate)| candidate.parent == Some(declaration.index) && candidate.template_parameter().is_some())
        .map(|(index, _)| index)
        .collect()
}

//! The resolution of type declarations.

use super::{
    context::{ResolutionContext, Scope},
    error::ResolutionError,
    result::{BareResult, Declaration, ResolveResult},
    Depth,
};
use ast::{ArrayKind, BareNode, BareTypeDeclaration, TypeDeclaration};
use span::Span;

impl<'a> ResolutionContext<'a> {
    /// Resolve a type declaration from the given scope.
    ///
    /// Results are cached by the textual representation of the declaration and the innermost
    /// block enclosing the scope.
    pub(crate) fn resolve_type_declaration(
        &mut self,
        type_: &TypeDeclaration,
        scope: Scope<'a>,
        depth: Depth,
    ) -> Vec<ResolveResult<'a>> {
        let key = type_.to_string();
        if let Some(results) = self.cached(scope, &key) {
            return results;
        }

        let truncations = self.truncations;
        let results = self.resolve_type_declaration_uncached(type_, scope, depth);
        if self.truncations == truncations {
            self.cache(scope, &key, &results);
        }
        results
    }

    fn resolve_type_declaration_uncached(
        &mut self,
        type_: &TypeDeclaration,
        scope: Scope<'a>,
        depth: Depth,
    ) -> Vec<ResolveResult<'a>> {
        use BareTypeDeclaration::*;

        match &type_.bare {
            Basic(kind) => vec![ResolveResult::basic(*kind)],
            Identifier(name) => match type_.inner() {
                Some(qualifier) => {
                    let qualifiers = self.resolve_type_declaration(qualifier, scope, depth);
                    self.resolve_member_of_all(&qualifiers, name, type_.span, scope, depth)
                }
                None => self.resolve_name(name, type_.span, scope, depth),
            },
            TemplateInstance(instance) => {
                let templates = match type_.inner() {
                    Some(qualifier) => {
                        let qualifiers = self.resolve_type_declaration(qualifier, scope, depth);
                        self.resolve_member_of_all(&qualifiers, &instance.name, type_.span, scope, depth)
                    }
                    None => self.resolve_name(&instance.name, type_.span, scope, depth),
                };
                templates
                    .into_iter()
                    .map(|template| self.instantiate(template, &instance.arguments, type_.span, scope, depth))
                    .collect()
            }
            Pointer => self.resolve_wrapped(type_, scope, depth, BareResult::Pointer),
            Array(ArrayKind::Dynamic) => self.resolve_wrapped(type_, scope, depth, BareResult::Array { size: None }),
            Array(ArrayKind::Static(size)) => {
                self.resolve_wrapped(type_, scope, depth, BareResult::Array { size: Some((**size).clone()) })
            }
            Array(ArrayKind::Associative(key)) => {
                let Some(key) = self.resolve_type_declaration(key, scope, depth).into_iter().next() else {
                    return Vec::new();
                };
                let key = key.type_().cloned().unwrap_or(key);
                self.resolve_wrapped(type_, scope, depth, BareResult::AssociativeArray { key: Box::new(key) })
            }
            Delegate(signature) => self.resolve_wrapped(type_, scope, depth, BareResult::Delegate(signature.clone())),
            Typeof(Some(expression)) => self
                .resolve_expression(expression, scope, depth)
                .into_iter()
                .filter_map(|result| result.type_().cloned())
                .collect(),
            Typeof(None) => self.resolve_return_type(scope, depth).into_iter().collect(),
            Qualified(qualifier) => self.resolve_wrapped(type_, scope, depth, BareResult::Qualified(*qualifier)),
            ModuleScope => vec![ResolveResult::new(BareResult::Module(scope.module()))],
        }
    }

    /// Resolve the inner declaration and wrap each result.
    fn resolve_wrapped(
        &mut self,
        type_: &TypeDeclaration,
        scope: Scope<'a>,
        depth: Depth,
        bare: BareResult<'a>,
    ) -> Vec<ResolveResult<'a>> {
        let Some(inner) = type_.inner() else {
            return Vec::new();
        };

        self.resolve_type_declaration(inner, scope, depth)
            .into_iter()
            .map(|inner| {
                let inner = inner.type_().cloned().unwrap_or(inner);
                ResolveResult::with_base(bare.clone(), inner)
            })
            .collect()
    }

    /// The return type of the function enclosing the scope for `typeof(return)`.
    fn resolve_return_type(&mut self, scope: Scope<'a>, depth: Depth) -> Option<ResolveResult<'a>> {
        let module = scope.module();
        let method = module
            .ancestors(scope.declaration.index)
            .find(|&index| matches!(module[index].bare, BareNode::Method(_)))?;
        let type_ = module[method].type_.as_ref()?;

        self.resolve_type_declaration(type_, Scope::of(Declaration::new(module, method)), depth.next())
            .into_iter()
            .next()
    }

    /// Resolve a member of each of the given results, recording an error if none has one.
    pub(crate) fn resolve_member_of_all(
        &mut self,
        bases: &[ResolveResult<'a>],
        name: &str,
        span: Span,
        scope: Scope<'a>,
        depth: Depth,
    ) -> Vec<ResolveResult<'a>> {
        let mut results = Vec::new();
        for base in bases {
            results.extend(self.resolve_member(base, name, span, scope, depth));
        }

        if results.is_empty() && !bases.is_empty() {
            self.error(ResolutionError::NotFound { name: name.to_owned(), span, suggestion: None });
        }

        results
    }
}

//! The lookup of members of modules, types and values.

use super::{
    context::{ResolutionContext, Scope},
    imports::public_members,
    properties::{initializer, INIT},
    result::{BareResult, Declaration, ResolveResult},
    scope::members,
    template::substitute,
    Depth,
};
use span::Span;

impl<'a> ResolutionContext<'a> {
    /// The members named `name` of a result, each reached through the given base.
    ///
    /// Values are looked into through their type, pointers are dereferenced and everything
    /// falls back to the static properties.
    pub(crate) fn resolve_member(
        &mut self,
        base: &ResolveResult<'a>,
        name: &str,
        span: Span,
        scope: Scope<'a>,
        depth: Depth,
    ) -> Vec<ResolveResult<'a>> {
        let mut results = self.look_up_member(base, name, span, scope, depth);

        if name == INIT {
            if let Some(initializer) = initializer(base) {
                for result in &mut results {
                    if let BareResult::Property { value, .. } = &mut result.bare {
                        value.get_or_insert_with(|| initializer.clone());
                    }
                }
            }
        }

        results.into_iter().map(|result| result.reached_through(base)).collect()
    }

    fn look_up_member(
        &mut self,
        base: &ResolveResult<'a>,
        name: &str,
        span: Span,
        scope: Scope<'a>,
        depth: Depth,
    ) -> Vec<ResolveResult<'a>> {
        match &base.bare {
            BareResult::Module(module) => {
                let module = *module;
                let declarations = match std::ptr::eq(module, scope.module()) {
                    true => members(module, module.root, name),
                    false => public_members(module, module.root, name),
                };

                let mut results = Vec::new();
                for index in declarations {
                    results.extend(self.resolve_declaration(Declaration::new(module, index), span, depth));
                }
                if results.is_empty() {
                    results = self.look_up_in_package(&module.name, name, scope);
                }
                results
            }
            BareResult::ModulePackage(package) => self.look_up_in_package(package, name, scope),
            BareResult::Member(_) | BareResult::ExpressionValue(_) | BareResult::Property { .. } => match base.base() {
                Some(type_) => self.look_up_member(type_, name, span, scope, depth),
                None => Vec::new(),
            },
            BareResult::Type { declaration, deduced, .. } => {
                let declaration = *declaration;

                let mut found: Vec<_> = members(declaration.module, declaration.index, name)
                    .into_iter()
                    .map(|member| declaration.with_index(member))
                    .collect();
                if found.is_empty() && declaration.node().class().is_some() {
                    found = self.look_up_inherited(name, declaration, depth);
                }

                let mut results = Vec::new();
                for member in found {
                    for result in self.resolve_declaration(member, span, depth.next()) {
                        results.push(substitute(&result, deduced));
                    }
                }
                if results.is_empty() {
                    results.extend(self.resolve_property(base, name, depth));
                }
                results
            }
            BareResult::Qualified(_) => match base.base() {
                Some(inner) => self.look_up_member(inner, name, span, scope, depth),
                None => Vec::new(),
            },
            BareResult::Pointer => {
                let mut results: Vec<_> = self.resolve_property(base, name, depth).into_iter().collect();
                if results.is_empty() {
                    if let Some(pointee) = base.base() {
                        if matches!(pointee.unqualified().0.bare, BareResult::Type { .. }) {
                            results = self.look_up_member(pointee, name, span, scope, depth);
                        }
                    }
                }
                results
            }
            _ => self.resolve_property(base, name, depth).into_iter().collect(),
        }
    }
}

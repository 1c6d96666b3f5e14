use super::{
    context::{ResolutionContext, Scope},
    declaration::template_parameters,
    result::{BareResult, Declaration, ResolveResult},
    Depth, ALIAS_DEPTH,
};
use span::Span;

impl<'a> ResolutionContext<'a> {
    /// Replace an alias by what it aliases.
    ///
    /// Aliases of aliases are followed until a fixpoint is reached or the chain exceeds
    /// [`ALIAS_DEPTH`] in which case the alias itself is returned.
    pub(crate) fn resolve_alias(&mut self, alias: Declaration<'a>, span: Span, depth: Depth) -> Vec<ResolveResult<'a>> {
        let node = alias.node();
        let unresolved = || vec![ResolveResult::new(BareResult::Member(alias))];

        if depth.exceeds(ALIAS_DEPTH) {
            self.truncate(&node.name, span, ALIAS_DEPTH);
            return unresolved();
        }

        // the template parameters of alias templates are in scope of the target
        let scope = match template_parameters(alias).is_empty() {
            true => Scope::of(alias),
            false => Scope::new(alias, None),
        };

        let results = match (&node.type_, node.variable().and_then(|variable| variable.initializer.as_ref())) {
            (Some(target), _) => self.resolve_type_declaration(target, scope, depth.next()),
            (None, Some(target)) => self.resolve_expression(target, scope, depth.next()),
            (None, None) => Vec::new(),
        };

        match results.is_empty() {
            true => unresolved(),
            false => results,
        }
    }
}

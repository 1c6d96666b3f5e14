//! The lookup of identifiers through the lexical scopes.

use super::{
    context::{ResolutionContext, Scope},
    declaration::template_parameters,
    error::{is_similar, ResolutionError},
    imports::public_members,
    result::{BareResult, Declaration, ResolveResult},
    Depth,
};
use ast::{lookup, BareNode, Module, NodeIndex};
use span::Span;

/// The members of a container with the given name.
///
/// The members of anonymous enums are hoisted into the enclosing container and class
/// templates contribute their template parameters.
pub(crate) fn members(module: &Module, container: NodeIndex, name: &str) -> Vec<NodeIndex> {
    let mut members = Vec::new();

    for (index, node) in module.children(container) {
        if node.name == name {
            members.push(index);
        } else if node.is_anonymous() && matches!(node.bare, BareNode::Enum(_)) {
            members.extend(module.children(index).filter(|(_, member)| member.name == name).map(|(index, _)| index));
        }
    }

    if let BareNode::Class(_) = module[container].bare {
        members.extend(module[container].template_parameters().iter().copied().filter(|&parameter| module[parameter].name == name));
    }

    members
}

impl<'a> ResolutionContext<'a> {
    /// Resolve an identifier from the given scope, recording an error if it is not defined.
    pub(crate) fn resolve_name(&mut self, name: &str, span: Span, scope: Scope<'a>, depth: Depth) -> Vec<ResolveResult<'a>> {
        let results = self.look_up(name, span, scope, depth);

        if results.is_empty() {
            let suggestion = self.suggest(name, scope);
            self.error(ResolutionError::NotFound { name: name.to_owned(), span, suggestion });
        }

        results
    }

    /// Look up an identifier stage by stage. The first stage with matches wins.
    pub(crate) fn look_up(&mut self, name: &str, span: Span, scope: Scope<'a>, depth: Depth) -> Vec<ResolveResult<'a>> {
        let declarations = self.look_up_lexically(name, scope, depth);
        if !declarations.is_empty() {
            let mut results = Vec::new();
            for declaration in declarations {
                results.extend(self.resolve_declaration(declaration, span, depth));
            }
            return results;
        }

        self.look_up_imported(name, span, scope, depth)
    }

    /// The declarations of the given name in the enclosing scopes.
    fn look_up_lexically(&mut self, name: &str, scope: Scope<'a>, depth: Depth) -> Vec<Declaration<'a>> {
        let module = scope.module();

        for ancestor in module.ancestors(scope.declaration.index).collect::<Vec<_>>() {
            let node = &module[ancestor];

            if let BareNode::Method(method) = &node.bare {
                let locals = match scope.location {
                    Some(location) => lookup::visible_locals(module, ancestor, location),
                    None => method.parameters.iter().chain(&method.template_parameters).copied().collect(),
                };
                let locals: Vec<_> = locals.into_iter().filter(|&local| module[local].name == name).collect();
                if !locals.is_empty() {
                    return locals.into_iter().map(|local| Declaration::new(module, local)).collect();
                }
            }

            if node.is_alias() {
                let parameters: Vec<_> = template_parameters(Declaration::new(module, ancestor))
                    .into_iter()
                    .filter(|&parameter| module[parameter].name == name)
                    .collect();
                if !parameters.is_empty() {
                    return parameters.into_iter().map(|parameter| Declaration::new(module, parameter)).collect();
                }
            }

            if node.container().is_none() {
                continue;
            }

            let members = members(module, ancestor, name);
            if !members.is_empty() {
                return members.into_iter().map(|member| Declaration::new(module, member)).collect();
            }

            if let BareNode::Class(_) = node.bare {
                let inherited = self.look_up_inherited(name, Declaration::new(module, ancestor), depth);
                if !inherited.is_empty() {
                    return inherited;
                }
            }
        }

        Vec::new()
    }

    /// The members of the given name in the base classes of a class.
    ///
    /// The chain is followed up to and including a class named `Object`.
    pub(crate) fn look_up_inherited(&mut self, name: &str, class: Declaration<'a>, depth: Depth) -> Vec<Declaration<'a>> {
        if !self.options.resolve_base_types {
            return Vec::new();
        }

        let (base, interfaces) = self.base_classes(class, depth);
        let mut bases: Vec<ResolveResult<'a>> = base.into_iter().chain(interfaces).collect();
        let mut seen = vec![class];

        while !bases.is_empty() {
            let mut next = Vec::new();
            for base in bases {
                let Some(declaration) = base.declaration() else {
                    continue;
                };
                if seen.contains(&declaration) {
                    continue;
                }
                seen.push(declaration);

                let found: Vec<_> = members(declaration.module, declaration.index, name)
                    .into_iter()
                    .map(|member| declaration.with_index(member))
                    .collect();
                if !found.is_empty() {
                    return found;
                }
                if declaration.node().name.eq_ignore_ascii_case("object") {
                    continue;
                }

                if let BareResult::Type { interfaces, .. } = base.bare {
                    next.extend(interfaces);
                }
                if let Some(base) = base.base {
                    next.push(*base);
                }
            }
            bases = next;
        }

        Vec::new()
    }

    /// Find the name most similar to the given one that is visible from the scope.
    pub(crate) fn suggest(&mut self, name: &str, scope: Scope<'a>) -> Option<String> {
        let module = scope.module();
        let mut candidates: Vec<String> = Vec::new();

        for ancestor in module.ancestors(scope.declaration.index) {
            if let (BareNode::Method(_), Some(location)) = (&module[ancestor].bare, scope.location) {
                candidates.extend(lookup::visible_locals(module, ancestor, location).into_iter().map(|local| module[local].name.clone()));
            }
            for (index, node) in module.children(ancestor) {
                if node.is_anonymous() {
                    candidates.extend(module.children(index).map(|(_, member)| member.name.clone()));
                } else {
                    candidates.push(node.name.clone());
                }
            }
        }

        for import in self.import_set(scope) {
            candidates.extend(
                import.module.children(import.module.root).map(|(index, _)| index).filter_map(|index| {
                    let name = &import.module[index].name;
                    (!public_members(import.module, import.module.root, name).is_empty()).then(|| name.clone())
                }),
            );
        }

        candidates
            .into_iter()
            .filter(|candidate| candidate != name && !candidate.is_empty() && is_similar(name, candidate))
            .min_by_key(|candidate| strsim::levenshtein(name, candidate))
    }
}

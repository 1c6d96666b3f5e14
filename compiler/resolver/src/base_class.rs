use super::{
    context::{ResolutionContext, Scope},
    result::{BareResult, Declaration, ResolveResult},
    Depth, BASE_CLASS_DEPTH,
};
use ast::ClassKind;

/// The name of the implicit base class of every class.
const OBJECT: &str = "Object";

impl<'a> ResolutionContext<'a> {
    /// The base class and the implemented interfaces of a class.
    ///
    /// Classes without an explicit base class derive from `Object`. A class that is part of its
    /// own base class chain has no base at all.
    pub(crate) fn base_classes(
        &mut self,
        class: Declaration<'a>,
        depth: Depth,
    ) -> (Option<ResolveResult<'a>>, Vec<ResolveResult<'a>>) {
        let node = class.node();
        let Some(bare) = node.class() else {
            return (None, Vec::new());
        };

        if depth.exceeds(BASE_CLASS_DEPTH) {
            self.truncate(&node.name, node.name_span, BASE_CLASS_DEPTH);
            return (None, Vec::new());
        }

        let scope = Scope::of(class);
        let mut base = None;
        let mut interfaces = Vec::new();
        let mut is_cyclic = false;

        for type_ in &bare.base_classes {
            let Some(result) = self.resolve_type_declaration(type_, scope, depth.next()).into_iter().next() else {
                continue;
            };
            if inherits_from(&result, class) {
                self.trace(format!("the class ‘{}’ inherits from itself", class.path()));
                is_cyclic = true;
                continue;
            }

            if base.is_none() && interfaces.is_empty() && !is_interface(&result) && bare.kind != ClassKind::Interface {
                base = Some(result);
            } else {
                interfaces.push(result);
            }
        }

        if base.is_none() && !is_cyclic && bare.kind == ClassKind::Class && !node.name.eq_ignore_ascii_case(OBJECT) {
            base = self
                .look_up(OBJECT, node.name_span, scope, depth.next())
                .into_iter()
                .find(|result| matches!(result.bare, BareResult::Type { .. }) && !inherits_from(result, class));
        }

        (base, interfaces)
    }
}

fn is_interface(result: &ResolveResult<'_>) -> bool {
    result
        .declaration()
        .and_then(|declaration| declaration.node().class())
        .map_or(false, |class| class.kind == ClassKind::Interface)
}

/// Whether the given class occurs in the base class chain or among the interfaces of a result.
pub(crate) fn inherits_from(result: &ResolveResult<'_>, class: Declaration<'_>) -> bool {
    if let BareResult::Type { declaration, interfaces, .. } = &result.bare {
        if *declaration == class || interfaces.iter().any(|interface| inherits_from(interface, class)) {
            return true;
        }
    }
    result.base().map_or(false, |base| inherits_from(base, class))
}

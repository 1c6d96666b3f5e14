//! Finding the declarations and statements enclosing a location (the caret).

use super::{BareNode, BareStatement, Module, NodeIndex, Statement};
use span::Location;

/// The innermost class, enum, template or method enclosing the given location.
///
/// Returns the root if no declaration encloses it.
pub fn innermost_scope(module: &Module, location: Location) -> NodeIndex {
    let mut scope = module.root;

    while let Some(inner) = enclosed_scope(module, scope, location) {
        scope = inner;
    }

    scope
}

fn enclosed_scope(module: &Module, scope: NodeIndex, location: Location) -> Option<NodeIndex> {
    let candidates: Vec<NodeIndex> = match &module[scope].bare {
        // local aggregates and nested functions
        BareNode::Method(_) => statement_path(module, scope, location)
            .into_iter()
            .flat_map(|statement| statement.children())
            .filter_map(|statement| match &statement.bare {
                BareStatement::Declaration(declarations) => Some(declarations.clone()),
                _ => None,
            })
            .flatten()
            .collect(),
        _ => module[scope].children().to_vec(),
    };

    candidates.into_iter().find(|&candidate| {
        let node = &module[candidate];
        node.span.contains(location)
            && matches!(node.bare, BareNode::Class(_) | BareNode::Enum(_) | BareNode::Method(_))
    })
}

/// The chain of statements inside of the given method enclosing the location, outermost first.
///
/// Contracts are searched as well as the body.
pub fn statement_path(module: &Module, method: NodeIndex, location: Location) -> Vec<&Statement> {
    let Some(method) = module[method].method() else {
        return Vec::new();
    };

    [&method.in_contract, &method.out_contract, &method.body]
        .into_iter()
        .flatten()
        .map(|statement| statement.path_to(location))
        .find(|path| !path.is_empty())
        .unwrap_or_default()
}

/// The local declarations of a method visible at the given location, innermost first.
///
/// These are the variables declared in enclosing blocks before the location, the
/// variables of enclosing `foreach`, `catch` and `if` statements as well as the parameters
/// and template parameters.
pub fn visible_locals(module: &Module, scope: NodeIndex, location: Location) -> Vec<NodeIndex> {
    let mut locals = Vec::new();

    let path = statement_path(module, scope, location);
    for statement in path.iter().rev() {
        for child in statement.children().into_iter().rev() {
            if let BareStatement::Declaration(declarations) = &child.bare {
                if child.span.end <= location {
                    locals.extend(declarations.iter().rev());
                }
            }
        }
        locals.extend(statement.scoped_declarations());
    }

    if let Some(method) = module[scope].method() {
        locals.extend(&method.parameters);
    }
    locals.extend(module[scope].template_parameters());

    locals
}

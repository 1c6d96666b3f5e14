//! The set of modules visible through imports.

use super::{
    context::{ResolutionContext, Scope},
    error::ResolutionError,
    result::{BareResult, Declaration, ResolveResult},
    Depth,
};
use ast::{BareStatement, Import, ImportBinding, Module, NodeIndex};
use lexer::token::TokenKind;
use span::Span;
use std::rc::Rc;
use utility::HashSet;

/// The module every module implicitly imports.
pub(crate) const OBJECT_MODULE: &str = "object";

/// A module visible through an import.
#[derive(Clone, Debug)]
pub(crate) struct Imported<'a> {
    pub(crate) module: &'a Module,
    /// The name of a renamed import like `io` in `import io = std.stdio;`.
    pub(crate) rename: Option<String>,
    /// The symbols of a selective import.
    pub(crate) bindings: Vec<ImportBinding>,
    pub(crate) is_static: bool,
}

impl<'a> Imported<'a> {
    /// Whether the members are visible unqualified.
    fn is_open(&self) -> bool {
        !self.is_static && self.rename.is_none()
    }

    /// Whether the module can be referred to by its fully qualified name.
    fn is_qualifiable(&self) -> bool {
        self.rename.is_none() && !self.is_selective()
    }

    fn is_selective(&self) -> bool {
        !self.bindings.is_empty()
    }
}

impl<'a> ResolutionContext<'a> {
    /// The imports visible from the given scope.
    ///
    /// These are the imports of the enclosing containers, the import statements preceding the
    /// location, the public imports of those modules (transitively) and the synthetic import
    /// of `object`.
    pub(crate) fn import_set(&mut self, scope: Scope<'a>) -> Vec<Imported<'a>> {
        let module = scope.module();
        let mut direct: Vec<&'a Import> = Vec::new();

        for ancestor in module.ancestors(scope.declaration.index) {
            if let Some(container) = module[ancestor].container() {
                direct.extend(&container.imports);
            }
        }
        if let Some(location) = scope.location {
            for statement in ast::lookup::statement_path(module, scope.declaration.index, location) {
                for child in statement.children() {
                    if let BareStatement::Import(imports) = &child.bare {
                        if child.span.end <= location {
                            direct.extend(imports);
                        }
                    }
                }
            }
        }

        let mut imported = Vec::new();
        let mut visited = HashSet::default();
        visited.insert(module.name.clone());

        for import in direct {
            let Some(target) = self.load(&import.module) else {
                self.trace(format!("the imported module ‘{}’ is not loaded", import.module));
                continue;
            };
            imported.push(Imported {
                module: target,
                rename: import.rename.clone(),
                bindings: import.bindings.clone(),
                is_static: import.is_static,
            });
            if !import.is_selective() {
                imported.extend(self.public_imports(target, &mut visited).iter().cloned());
            }
        }

        if module.name != OBJECT_MODULE && !visited.contains(OBJECT_MODULE) {
            if let Some(object) = self.load(OBJECT_MODULE) {
                imported.push(Imported { module: object, rename: None, bindings: Vec::new(), is_static: false });
            }
        }

        imported
    }

    /// The modules made visible by importing the given module, excluding itself.
    ///
    /// Private imports never propagate.
    fn public_imports(&mut self, module: &'a Module, visited: &mut HashSet<String>) -> Rc<[Imported<'a>]> {
        if let Some(imports) = self.imports.get(&module.name) {
            return imports.clone();
        }
        if !visited.insert(module.name.clone()) {
            return Rc::from([]);
        }

        let mut imported = Vec::new();
        for import in module.imports().iter().filter(|import| import.is_public) {
            let Some(target) = self.load(&import.module) else {
                continue;
            };
            imported.push(Imported {
                module: target,
                rename: import.rename.clone(),
                bindings: import.bindings.clone(),
                is_static: import.is_static,
            });
            if !import.is_selective() {
                imported.extend(self.public_imports(target, visited).iter().cloned());
            }
        }

        let imported: Rc<[Imported<'a>]> = imported.into();
        self.imports.insert(module.name.clone(), imported.clone());
        imported
    }

    /// Look up a name among the imports, returning the matching declarations and the
    /// modules they were found in.
    pub(crate) fn look_up_imported(&mut self, name: &str, span: Span, scope: Scope<'a>, depth: Depth) -> Vec<ResolveResult<'a>> {
        let imported = self.import_set(scope);
        let mut declarations: Vec<Declaration<'a>> = Vec::new();
        let mut modules: Vec<ResolveResult<'a>> = Vec::new();

        for import in &imported {
            if import.rename.as_deref() == Some(name) {
                modules.push(ResolveResult::new(BareResult::Module(import.module)));
                continue;
            }

            if import.is_qualifiable() || import.is_static {
                let module_name = &import.module.name;
                if module_name == name {
                    modules.push(ResolveResult::new(BareResult::Module(import.module)));
                } else if module_name.split('.').next() == Some(name) {
                    if !modules.iter().any(|module| matches!(&module.bare, BareResult::ModulePackage(package) if package == name)) {
                        modules.push(ResolveResult::new(BareResult::ModulePackage(name.to_owned())));
                    }
                }
            }

            if import.is_selective() {
                for binding in import.bindings.iter().filter(|binding| binding.binder() == name) {
                    declarations.extend(
                        public_members(import.module, import.module.root, &binding.name)
                            .into_iter()
                            .map(|index| Declaration::new(import.module, index)),
                    );
                }
            } else if import.is_open() {
                declarations.extend(
                    public_members(import.module, import.module.root, name)
                        .into_iter()
                        .map(|index| Declaration::new(import.module, index)),
                );
            }
        }

        let mut unique: Vec<Declaration<'a>> = Vec::new();
        for declaration in declarations {
            if !unique.contains(&declaration) {
                unique.push(declaration);
            }
        }
        self.check_ambiguity(name, span, &unique);

        let mut results = modules;
        for declaration in unique {
            results.extend(self.resolve_declaration(declaration, span, depth));
        }
        results
    }

    /// Resolve a member of a module package like `stdio` in `std.stdio`.
    pub(crate) fn look_up_in_package(&mut self, package: &str, name: &str, scope: Scope<'a>) -> Vec<ResolveResult<'a>> {
        let path = format!("{package}.{name}");

        let imported = self.import_set(scope);
        let qualified = imported.iter().filter(|import| import.is_qualifiable() || import.is_static);

        let mut results = Vec::new();
        let mut is_package = false;
        for import in qualified {
            if import.module.name == path {
                results.push(ResolveResult::new(BareResult::Module(import.module)));
            } else if import.module.name.starts_with(&path) && import.module.name[path.len()..].starts_with('.') {
                is_package = true;
            }
        }
        if results.is_empty() && is_package {
            results.push(ResolveResult::new(BareResult::ModulePackage(path)));
        }
        results
    }

    fn check_ambiguity(&mut self, name: &str, span: Span, declarations: &[Declaration<'a>]) {
        let mut modules: Vec<&str> = Vec::new();
        for declaration in declarations {
            if !modules.contains(&declaration.module.name.as_str()) {
                modules.push(&declaration.module.name);
            }
        }
        if modules.len() > 1 {
            self.error(ResolutionError::Ambiguous {
                name: name.to_owned(),
                span,
                candidates: declarations.iter().map(|declaration| declaration.path()).collect(),
            });
        }
    }
}

/// The members of a container visible from other modules.
pub(crate) fn public_members(module: &Module, container: NodeIndex, name: &str) -> Vec<NodeIndex> {
    super::scope::members(module, container, name)
        .into_iter()
        .filter(|&index| !matches!(module[index].attributes.visibility(), TokenKind::Private | TokenKind::Package))
        .collect()
}

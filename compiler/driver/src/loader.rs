//! Loading the modules a source file imports.

use ast::{BareStatement, Module, Statement};
use diagnostics::{error::Result, Diagnostic, ErrorCode, Reporter};
use parser::{parse_module, ParseOptions};
use resolver::ModuleCache;
use span::{SourceFileIndex, SourceMap};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};
use utility::{HashMap, HashSet, FILE_EXTENSION, INTERFACE_FILE_EXTENSION};

/// The file name of the module standing for its folder.
const PACKAGE_FILE_STEM: &str = "package";
/// The module implicitly imported by every module.
const OBJECT_MODULE: &str = "object";

/// The parsed modules available to the resolver, keyed by their fully qualified name.
pub struct ParseCache {
    roots: Vec<PathBuf>,
    modules: HashMap<String, Module>,
    /// The names of the modules searched for so far.
    searched: HashSet<String>,
    options: ParseOptions,
}

impl ParseCache {
    pub fn new(roots: Vec<PathBuf>, options: ParseOptions) -> Self {
        Self { roots, modules: HashMap::default(), searched: HashSet::default(), options }
    }

    pub fn insert(&mut self, module: Module) {
        self.modules.insert(module.name.clone(), module);
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Load the modules imported by the given one and, transitively, the modules they import
    /// publicly.
    ///
    /// Returns the names of the modules not found under any root. Syntax errors in loaded
    /// modules are reported as warnings.
    pub fn load_imports(&mut self, module: &Module, map: &Arc<RwLock<SourceMap>>, reporter: &Reporter) -> Vec<String> {
        let mut missing = Vec::new();
        let mut queue: Vec<String> = imported_modules(module, false);
        queue.push(OBJECT_MODULE.to_owned());

        while let Some(name) = queue.pop() {
            if name == module.name || self.modules.contains_key(&name) || !self.searched.insert(name.clone()) {
                continue;
            }

            let Some(path) = self.path_of(&name) else {
                missing.push(name);
                continue;
            };

            let Ok(file) = load_file(&path, map, reporter) else {
                continue;
            };

            let mut imported = {
                let map = map.read().unwrap_or_else(PoisonError::into_inner);
                parse_module(map[file].content(), self.options)
            };
            for error in imported.errors.drain(..) {
                Diagnostic::warning()
                    .message(format!("{} in the imported module ‘{name}’", error.message()))
                    .unlabeled_span(error.span)
                    .file(file)
                    .report(reporter);
            }

            let mut imported = imported.bare;
            if imported.name.is_empty() {
                imported.set_name(name.clone());
            }
            queue.extend(imported_modules(&imported, true));
            self.insert(imported);
        }

        missing
    }

    /// Find the file of a module below the import roots.
    ///
    /// `a.b` is looked for as `a/b.d`, `a/b.di` and `a/b/package.d` in this order.
    pub fn path_of(&self, name: &str) -> Option<PathBuf> {
        let relative: PathBuf = name.split('.').collect();

        self.roots.iter().find_map(|root| {
            let base = root.join(&relative);
            [
                base.with_extension(FILE_EXTENSION),
                base.with_extension(INTERFACE_FILE_EXTENSION),
                base.join(PACKAGE_FILE_STEM).with_extension(FILE_EXTENSION),
            ]
            .into_iter()
            .find(|path| path.is_file())
        })
    }
}

impl ModuleCache for ParseCache {
    fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }
}

/// Register a file in the source map, reporting an error if it cannot be read.
pub(crate) fn load_file(path: &Path, map: &Arc<RwLock<SourceMap>>, reporter: &Reporter) -> Result<SourceFileIndex> {
    let result = map.write().unwrap_or_else(PoisonError::into_inner).load(path);

    result.map_err(|error| {
        Diagnostic::error()
            .code(ErrorCode::E030)
            .message("could not load the file")
            .path(path.to_owned())
            .note(error.to_string())
            .report(reporter)
    })
}

/// The name of the module stored at the given path relative to the first enclosing root.
///
/// Files named `package.d` stand for their folder. Returns `None` if the path is not below
/// any root or not a valid module path.
pub fn module_name(path: &Path, roots: &[PathBuf]) -> Option<String> {
    let relative = roots.iter().find_map(|root| path.strip_prefix(root).ok())?;
    let relative = relative.with_extension("");

    let mut segments: Vec<&str> = relative.iter().map(|segment| segment.to_str()).collect::<Option<_>>()?;
    if segments.last() == Some(&PACKAGE_FILE_STEM) {
        segments.pop();
    }
    if segments.is_empty() || !segments.iter().all(|segment| is_identifier(segment)) {
        return None;
    }

    Some(segments.join("."))
}

fn is_identifier(segment: &str) -> bool {
    let mut characters = segment.chars();
    characters.next().map_or(false, |first| first == '_' || first.is_alphabetic())
        && characters.all(|character| character == '_' || character.is_alphanumeric())
}

/// The names of the modules imported anywhere in a module.
fn imported_modules(module: &Module, public_only: bool) -> Vec<String> {
    let mut names = Vec::new();

    for (_, node) in &module.nodes {
        if let Some(container) = node.container() {
            names.extend(
                container
                    .imports
                    .iter()
                    .filter(|import| !public_only || import.is_public)
                    .map(|import| import.module.clone()),
            );
        }
        if public_only {
            continue;
        }
        if let Some(body) = node.method().and_then(|method| method.body.as_ref()) {
            collect_statement_imports(body, &mut names);
        }
    }

    names
}

fn collect_statement_imports(statement: &Statement, names: &mut Vec<String>) {
    if let BareStatement::Import(imports) = &statement.bare {
        names.extend(imports.iter().map(|import| import.module.clone()));
    }
    for child in statement.children() {
        collect_statement_imports(child, names);
    }
}

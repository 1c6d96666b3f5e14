//! The state of a resolution request.

use super::{
    error::ResolutionError,
    imports::Imported,
    result::{Declaration, ResolveResult},
};
use ast::{lookup, Module, NodeIndex};
use diagnostics::{Diagnostic, Reporter};
use span::{Location, Span};
use std::rc::Rc;
use utility::HashMap;

/// A provider of parsed modules by their fully qualified name.
pub trait ModuleCache {
    fn module(&self, name: &str) -> Option<&Module>;
}

impl ModuleCache for HashMap<String, Module> {
    fn module(&self, name: &str) -> Option<&Module> {
        self.get(name)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ResolveOptions {
    /// Resolve the types of members and the base classes of types.
    pub resolve_base_types: bool,
    /// Replace aliases by what they alias.
    pub resolve_aliases: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { resolve_base_types: true, resolve_aliases: true }
    }
}

/// A place names are looked up from: a declaration and, inside of methods, a location
/// delimiting the visible local variables.
#[derive(Clone, Copy, Debug)]
pub struct Scope<'a> {
    pub declaration: Declaration<'a>,
    pub location: Option<Location>,
}

impl<'a> Scope<'a> {
    pub fn new(declaration: Declaration<'a>, location: Option<Location>) -> Self {
        Self { declaration, location }
    }

    /// The scope a declaration's type and initializer are resolved in.
    pub fn of(declaration: Declaration<'a>) -> Self {
        let node = declaration.node();
        match declaration.parent() {
            Some(parent) => Self::new(parent, Some(node.span.start)),
            None => Self::new(declaration, None),
        }
    }

    pub fn module(self) -> &'a Module {
        self.declaration.module
    }

    /// The innermost block or statement enclosing the location, if inside of a method.
    fn block(self) -> Option<Span> {
        let location = self.location?;
        let path = lookup::statement_path(self.declaration.module, self.declaration.index, location);
        path.last().map(|statement| statement.span)
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    module: String,
    scope: NodeIndex,
    block: Option<Span>,
    declaration: String,
}

/// The context of a resolution request.
///
/// It is created per request and owns the caches. Contexts are never shared between
/// requests from different modules.
pub struct ResolutionContext<'a> {
    pub(crate) module: &'a Module,
    pub(crate) modules: &'a dyn ModuleCache,
    pub(crate) scope: Scope<'a>,
    pub options: ResolveOptions,
    pub(crate) errors: Vec<ResolutionError>,
    pub(crate) reporter: &'a Reporter,
    cache: HashMap<CacheKey, Vec<ResolveResult<'a>>>,
    pub(crate) imports: HashMap<String, Rc<[Imported<'a>]>>,
    /// How often a recursion bound was hit. Results computed meanwhile are not cached.
    pub(crate) truncations: usize,
    cache_hits: usize,
    cache_misses: usize,
}

impl<'a> ResolutionContext<'a> {
    /// Create a context for resolving at the given location of the module.
    pub fn new(
        module: &'a Module,
        location: Location,
        modules: &'a dyn ModuleCache,
        reporter: &'a Reporter,
    ) -> Self {
        let scope = lookup::innermost_scope(module, location);
        let location = module[scope].method().map(|_| location);

        Self {
            module,
            modules,
            scope: Scope::new(Declaration::new(module, scope), location),
            options: ResolveOptions::default(),
            errors: Vec::new(),
            reporter,
            cache: HashMap::default(),
            imports: HashMap::default(),
            truncations: 0,
            cache_hits: 0,
            cache_misses: 0,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn scope(&self) -> Scope<'a> {
        self.scope
    }

    pub fn errors(&self) -> &[ResolutionError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<ResolutionError> {
        std::mem::take(&mut self.errors)
    }

    pub(crate) fn error(&mut self, error: ResolutionError) {
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }

    /// Record that a recursion bound was hit.
    pub(crate) fn truncate(&mut self, name: &str, span: Span, bound: u32) {
        self.truncations += 1;
        self.trace(format!("recursion guard hit while resolving ‘{name}’ (bound {bound})"));
        self.error(ResolutionError::RecursionLimit { name: name.to_owned(), span, bound });
    }

    /// Emit a debug diagnostic.
    pub(crate) fn trace(&self, message: String) {
        Diagnostic::debug().message(message).report(self.reporter);
    }

    /// Look up a module by name, including the module resolution happens in.
    pub(crate) fn load(&self, name: &str) -> Option<&'a Module> {
        if name == self.module.name {
            return Some(self.module);
        }
        self.modules.module(name)
    }

    pub(crate) fn cached(&mut self, scope: Scope<'a>, declaration: &str) -> Option<Vec<ResolveResult<'a>>> {
        let key = cache_key(scope, declaration);
        match self.cache.get(&key) {
            Some(results) => {
                self.cache_hits += 1;
                Some(results.clone())
            }
            None => {
                self.cache_misses += 1;
                None
            }
        }
    }

    pub(crate) fn cache(&mut self, scope: Scope<'a>, declaration: &str, results: &[ResolveResult<'a>]) {
        self.cache.insert(cache_key(scope, declaration), results.to_vec());
    }

    /// The hits and misses of the result cache so far.
    pub fn cache_statistics(&self) -> (usize, usize) {
        (self.cache_hits, self.cache_misses)
    }

    /// Report the cache statistics as a debug diagnostic.
    pub fn report_statistics(&self) {
        let (hits, misses) = self.cache_statistics();
        self.trace(format!("resolution cache: {hits} hits, {misses} misses, {} entries", self.cache.len()));
    }
}

fn cache_key(scope: Scope<'_>, declaration: &str) -> CacheKey {
    CacheKey {
        module: scope.module().name.clone(),
        scope: scope.declaration.index,
        block: scope.block(),
        declaration: declaration.to_owned(),
    }
}

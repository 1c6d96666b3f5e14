//! The symbol and type resolver.
//!
//! Given a parsed [`Module`](ast::Module), a location inside of it (the caret) and a cache of
//! further parsed modules, the resolver answers what a type declaration, an expression or an
//! identifier refers to. The answer is a list of [`ResolveResult`]s which is empty if nothing
//! was found and has several elements for overloads and ambiguities.
//!
//! Names are looked up in the following stages, the first non-empty one wins:
//!
//! 1. the local variables declared before the caret, including parameters and
//!    template parameters
//! 2. the members of the enclosing container, hoisting the members of anonymous enums
//! 3. the members of the base classes of the enclosing class up to and including `Object`
//! 4. stages 2 and 3 for each further enclosing container, innermost first
//! 5. the public top-level members of every module visible through imports
//!
//! Resolution never fails hard: problems are recorded as [`ResolutionError`]s inside of the
//! [`ResolutionContext`] and the remaining branches carry on.
//!
//! Recursion through base classes, aliases and the types of members is bounded by threading
//! an explicit [`Depth`] through the calls.

pub use comparator::{is_equal, is_implicitly_convertible};
pub use context::{ModuleCache, ResolutionContext, ResolveOptions, Scope};
pub use error::ResolutionError;
pub use result::{BareResult, Declaration, Deduction, Origin, ResolveResult};

use ast::{Expression, TypeDeclaration};
use span::Span;

mod alias;
mod base_class;
mod comparator;
mod context;
mod declaration;
mod error;
mod expression;
mod imports;
mod member;
mod properties;
mod result;
mod scope;
mod template;
mod type_declaration;

#[cfg(test)]
mod test;

/// The maximum length of base class chains.
pub const BASE_CLASS_DEPTH: u32 = 8;
/// The maximum length of alias chains.
pub const ALIAS_DEPTH: u32 = 10;
/// The maximum nesting of resolving the type of a member while resolving another one.
pub const MEMBER_DEPTH: u32 = 12;

/// The nesting depth of the current resolution.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Depth(u32);

impl Depth {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub const fn exceeds(self, bound: u32) -> bool {
        self.0 > bound
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Resolve a type declaration at the location of the context.
pub fn resolve_type<'a>(context: &mut ResolutionContext<'a>, type_: &TypeDeclaration) -> Vec<ResolveResult<'a>> {
    let scope = context.scope();
    context
        .resolve_type_declaration(type_, scope, Depth::default())
        .into_iter()
        .map(|result| result.originating(Origin::Type(type_.clone())))
        .collect()
}

/// Resolve an expression at the location of the context.
pub fn resolve_expression<'a>(context: &mut ResolutionContext<'a>, expression: &Expression) -> Vec<ResolveResult<'a>> {
    let scope = context.scope();
    context
        .resolve_expression(expression, scope, Depth::default())
        .into_iter()
        .map(|result| result.originating(Origin::Expression(expression.clone())))
        .collect()
}

/// Resolve a single identifier at the location of the context.
pub fn resolve_identifier<'a>(context: &mut ResolutionContext<'a>, name: &str, span: Span) -> Vec<ResolveResult<'a>> {
    let scope = context.scope();
    context.resolve_name(name, span, scope, Depth::default())
}

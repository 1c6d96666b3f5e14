//! The results of resolution.

use ast::{Expression, Module, Node, NodeIndex, Signature, TypeDeclaration};
use lexer::token::TokenKind;
use std::fmt;
use utility::HashMap;

/// A declaration inside of one of the modules known to the resolver.
#[derive(Clone, Copy)]
pub struct Declaration<'a> {
    pub module: &'a Module,
    pub index: NodeIndex,
}

impl<'a> Declaration<'a> {
    pub fn new(module: &'a Module, index: NodeIndex) -> Self {
        Self { module, index }
    }

    pub fn node(self) -> &'a Node {
        &self.module[self.index]
    }

    pub fn parent(self) -> Option<Self> {
        self.node().parent.map(|parent| Self::new(self.module, parent))
    }

    pub fn with_index(self, index: NodeIndex) -> Self {
        Self::new(self.module, index)
    }

    /// The fully qualified path like `std.stdio.File.open`.
    pub fn path(self) -> String {
        self.module.path(self.index)
    }
}

impl PartialEq for Declaration<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.module, other.module) && self.index == other.index
    }
}

impl Eq for Declaration<'_> {}

impl fmt::Debug for Declaration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// The substitutions for the template parameters of a template instance by name.
pub type Deduction<'a> = HashMap<String, ResolveResult<'a>>;

/// A symbol or type a type declaration or expression resolved to.
///
/// Results form two chains. Through [`Self::base`], the base of a variable is its type, the
/// base of a pointer is its pointee and the base of a class is its base class. Through
/// [`Self::result_base`], a member or property leads back to the result it was looked up in:
/// `s` for `s.x`.
#[derive(Clone, Debug)]
pub struct ResolveResult<'a> {
    pub bare: BareResult<'a>,
    pub base: Option<Box<ResolveResult<'a>>>,
    /// The result this one was reached through.
    pub result_base: Option<Box<ResolveResult<'a>>>,
    /// What was resolved to obtain this result.
    pub origin: Option<Origin>,
}

impl<'a> ResolveResult<'a> {
    pub fn new(bare: BareResult<'a>) -> Self {
        Self { bare, base: None, result_base: None, origin: None }
    }

    pub fn with_base(bare: BareResult<'a>, base: Self) -> Self {
        Self { bare, base: Some(Box::new(base)), result_base: None, origin: None }
    }

    #[must_use]
    pub fn reached_through(mut self, result: &Self) -> Self {
        self.result_base = Some(Box::new(result.clone()));
        self
    }

    pub fn result_base(&self) -> Option<&Self> {
        self.result_base.as_deref()
    }

    /// This result followed by the results it was reached through, outermost last.
    pub fn resolution_chain(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |result| result.result_base())
    }

    pub fn basic(kind: TokenKind) -> Self {
        Self::new(BareResult::Static(kind))
    }

    /// `immutable(char)[]`.
    pub fn string() -> Self {
        let character = Self::with_base(BareResult::Qualified(TokenKind::Immutable), Self::basic(TokenKind::Char));
        Self::with_base(BareResult::Array { size: None }, character)
    }

    #[must_use]
    pub fn originating(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn base(&self) -> Option<&Self> {
        self.base.as_deref()
    }

    pub fn declaration(&self) -> Option<Declaration<'a>> {
        match self.bare {
            BareResult::Member(declaration) | BareResult::Type { declaration, .. } => Some(declaration),
            _ => None,
        }
    }

    /// The type of the value this result denotes.
    ///
    /// Members and properties are typed by their base, everything else denotes a type itself.
    pub fn type_(&self) -> Option<&Self> {
        match self.bare {
            BareResult::Member(_) | BareResult::Property { .. } | BareResult::ExpressionValue(_) => self.base(),
            _ => Some(self),
        }
    }

    /// The result without outer type qualifiers and their qualifier, if any.
    pub fn unqualified(&self) -> (&Self, Option<TokenKind>) {
        let mut result = self;
        let mut qualifier = None;
        while let (BareResult::Qualified(kind), Some(base)) = (&result.bare, result.base()) {
            qualifier = qualifier.or(Some(*kind));
            result = base;
        }
        (result, qualifier)
    }

    /// Whether this result is a template parameter not (yet) substituted.
    pub fn is_naked_template_parameter(&self) -> bool {
        matches!(self.bare, BareResult::Type { declaration, .. } if declaration.node().template_parameter().is_some())
    }
}

#[derive(Clone, Debug)]
pub enum BareResult<'a> {
    /// A variable, method, alias or enum member. The base is its type.
    Member(Declaration<'a>),
    /// A class, interface, struct, union, enum, template or template parameter.
    ///
    /// The base is the first base class or the base type of an enum.
    Type {
        declaration: Declaration<'a>,
        deduced: Deduction<'a>,
        /// The resolved base classes following the first one (interfaces).
        interfaces: Vec<ResolveResult<'a>>,
    },
    Module(&'a Module),
    /// A prefix of the qualified names of known modules like `std` in `std.stdio`.
    ModulePackage(String),
    /// A basic type including `null` as the type of the null literal.
    Static(TokenKind),
    /// An array of base. `size` is set for static arrays.
    Array { size: Option<Expression> },
    /// An associative array from the key to the base.
    AssociativeArray { key: Box<ResolveResult<'a>> },
    Pointer,
    /// A function or delegate type returning the base.
    Delegate(Box<Signature>),
    TypeTuple(Vec<ResolveResult<'a>>),
    /// A value template argument, typed by the base.
    ExpressionValue(Expression),
    /// A synthesized static property like `.sizeof`, typed by the base.
    ///
    /// `.init` of a variable carries the initializer of the variable as its value.
    Property { name: &'static str, value: Option<Expression> },
    /// A qualified base like `const(int)`.
    Qualified(TokenKind),
}

impl<'a> BareResult<'a> {
    pub fn type_(declaration: Declaration<'a>) -> Self {
        Self::Type { declaration, deduced: Deduction::default(), interfaces: Vec::new() }
    }
}

/// The source construct a result answers.
#[derive(Clone, PartialEq, Debug)]
pub enum Origin {
    Type(TypeDeclaration),
    Expression(Expression),
}

impl fmt::Display for ResolveResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = Base(self.base());

        match &self.bare {
            BareResult::Member(declaration) => {
                write!(f, "{}", declaration.path())?;
                if let Some(type_) = self.base() {
                    write!(f, ": {type_}")?;
                }
                Ok(())
            }
            BareResult::Type { declaration, deduced, .. } => {
                write!(f, "{}", declaration.path())?;
                if !deduced.is_empty() {
                    let parameters = declaration.node().template_parameters();
                    let arguments = parameters
                        .iter()
                        .filter_map(|&parameter| deduced.get(&declaration.module[parameter].name))
                        .map(ToString::to_string)
                        .collect::<Vec<_>>();
                    write!(f, "!({})", arguments.join(", "))?;
                }
                Ok(())
            }
            BareResult::Module(module) => write!(f, "module {}", module.name),
            BareResult::ModulePackage(package) => write!(f, "package {package}"),
            BareResult::Static(kind) => f.write_str(kind.text()),
            BareResult::Array { size: None } => write!(f, "{base}[]"),
            BareResult::Array { size: Some(size) } => write!(f, "{base}[{size}]"),
            BareResult::AssociativeArray { key } => write!(f, "{base}[{key}]"),
            BareResult::Pointer => write!(f, "{base}*"),
            BareResult::Delegate(signature) => write!(f, "{base} {signature}"),
            BareResult::TypeTuple(results) => {
                let results = results.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "({})", results.join(", "))
            }
            BareResult::ExpressionValue(expression) => write!(f, "{expression}"),
            BareResult::Property { name, value: None } => write!(f, ".{name}: {base}"),
            BareResult::Property { name, value: Some(value) } => write!(f, ".{name} = {value}: {base}"),
            BareResult::Qualified(qualifier) => write!(f, "{}({base})", qualifier.text()),
        }
    }
}

struct Base<'r, 'a>(Option<&'r ResolveResult<'a>>);

impl fmt::Display for Base<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(base) => write!(f, "{base}"),
            None => f.write_str("?"),
        }
    }
}

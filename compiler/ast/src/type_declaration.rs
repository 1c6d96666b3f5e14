use super::Expression;
use lexer::token::TokenKind;
use span::{Span, Spanning};

/// A type as written in the source.
///
/// Types form a right-to-left chain linked through [`Self::inner`]: `int[]*` is a pointer
/// whose inner declaration is an array whose inner declaration is `int`. For identifiers and
/// template instances, the inner declaration is the qualifier: `a.b` is the identifier `b`
/// inside of the identifier `a`.
#[derive(Clone, PartialEq, Debug)]
pub struct TypeDeclaration {
    pub span: Span,
    pub bare: BareTypeDeclaration,
    pub inner: Option<Box<TypeDeclaration>>,
}

impl TypeDeclaration {
    pub fn new(span: Span, bare: BareTypeDeclaration) -> Self {
        Self { span, bare, inner: None }
    }

    pub fn with_inner(span: Span, bare: BareTypeDeclaration, inner: TypeDeclaration) -> Self {
        Self { span, bare, inner: Some(Box::new(inner)) }
    }

    pub fn basic(span: Span, kind: TokenKind) -> Self {
        Self::new(span, BareTypeDeclaration::Basic(kind))
    }

    pub fn identifier(span: Span, name: impl Into<String>) -> Self {
        Self::new(span, BareTypeDeclaration::Identifier(name.into()))
    }

    /// Wrap this declaration in another link.
    pub fn wrap(self, span: Span, bare: BareTypeDeclaration) -> Self {
        Self::with_inner(span, bare, self)
    }

    pub fn inner(&self) -> Option<&TypeDeclaration> {
        self.inner.as_deref()
    }

    /// The innermost link of the chain.
    pub fn innermost(&self) -> &TypeDeclaration {
        let mut declaration = self;
        while let Some(inner) = declaration.inner() {
            declaration = inner;
        }
        declaration
    }

    /// The name of identifiers and template instances.
    pub fn name(&self) -> Option<&str> {
        match &self.bare {
            BareTypeDeclaration::Identifier(name) => Some(name),
            BareTypeDeclaration::TemplateInstance(instance) => Some(&instance.name),
            _ => None,
        }
    }

    /// Whether the inner declaration is a qualifier of this one (as opposed to a wrapped type).
    pub fn is_qualified_name(&self) -> bool {
        matches!(self.bare, BareTypeDeclaration::Identifier(_) | BareTypeDeclaration::TemplateInstance(_))
            && self.inner.is_some()
    }

    /// Append the given declaration as the new innermost link.
    pub fn rooted_at(self, root: TypeDeclaration) -> TypeDeclaration {
        match self.inner {
            Some(inner) => Self { inner: Some(Box::new(inner.rooted_at(root))), ..self },
            None => Self { inner: Some(Box::new(root)), ..self },
        }
    }

    /// Strip outer type qualifiers like `const(…)`.
    pub fn unqualified(&self) -> &TypeDeclaration {
        match (&self.bare, self.inner()) {
            (BareTypeDeclaration::Qualified(_), Some(inner)) => inner.unqualified(),
            _ => self,
        }
    }
}

impl Spanning for TypeDeclaration {
    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum BareTypeDeclaration {
    /// Built-in types like `int`.
    Basic(TokenKind),
    Identifier(String),
    TemplateInstance(TemplateInstance),
    /// The inner declaration is the pointee.
    Pointer,
    /// The inner declaration is the element or value type.
    Array(ArrayKind),
    /// The inner declaration is the return type.
    Delegate(Box<Signature>),
    /// `typeof(expression)` or `typeof(return)` if absent.
    Typeof(Option<Box<Expression>>),
    /// `const(…)` and the like wrapping the inner declaration.
    Qualified(TokenKind),
    /// The leading dot of `.a.b` refering to the module scope.
    ModuleScope,
}

#[derive(Clone, PartialEq, Debug)]
pub enum ArrayKind {
    /// `T[]`
    Dynamic,
    /// `T[n]`
    Static(Box<Expression>),
    /// `V[K]`
    Associative(Box<TypeDeclaration>),
}

/// A symbol applied to template arguments like `Foo!(int, 2)` or `Foo!int`.
#[derive(Clone, PartialEq, Debug)]
pub struct TemplateInstance {
    pub name: String,
    pub arguments: Vec<TemplateArgument>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum TemplateArgument {
    Type(TypeDeclaration),
    Expression(Expression),
}

impl Spanning for TemplateArgument {
    fn span(&self) -> Span {
        match self {
            Self::Type(type_) => type_.span,
            Self::Expression(expression) => expression.span,
        }
    }
}

/// The signature of a `delegate` or `function` type or literal.
#[derive(Clone, PartialEq, Debug)]
pub struct Signature {
    /// Either `delegate` or `function`.
    pub kind: TokenKind,
    pub parameters: Vec<Parameter>,
    pub is_variadic: bool,
    /// Member function attributes like `const` or `nothrow` following the parameters.
    pub attributes: Vec<TokenKind>,
}

/// A parameter of a [`Signature`].
#[derive(Clone, PartialEq, Debug)]
pub struct Parameter {
    pub span: Span,
    pub attributes: Vec<TokenKind>,
    pub type_: Option<TypeDeclaration>,
    pub name: Option<String>,
    pub default: Option<Expression>,
}

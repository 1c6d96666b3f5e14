use super::{
    ArrayKind, BareTypeDeclaration, Parameter, Signature, Statement, TemplateArgument,
    TemplateInstance, TypeDeclaration,
};
use lexer::token::{Literal, LiteralValue, TokenKind};
use span::{Span, Spanning};

#[derive(Clone, PartialEq, Debug)]
pub struct Expression {
    pub span: Span,
    pub bare: BareExpression,
}

impl Expression {
    pub fn new(span: Span, bare: BareExpression) -> Self {
        Self { span, bare }
    }

    pub fn identifier(span: Span, name: impl Into<String>) -> Self {
        Self::new(span, BareExpression::Identifier(name.into()))
    }

    pub fn error(span: Span) -> Self {
        Self::new(span, BareExpression::Error)
    }

    /// The type declaration the shape of this expression describes.
    ///
    /// Identifier chains and template instances map to the corresponding type declarations,
    /// literals to the type they have without context. Resolution of the returned declaration
    /// is the first step of resolving the expression itself.
    pub fn type_representation(&self) -> Option<TypeDeclaration> {
        use BareExpression::*;

        let span = self.span;

        Some(match &self.bare {
            Identifier(name) => TypeDeclaration::identifier(span, name.clone()),
            TemplateInstance(instance) => {
                TypeDeclaration::new(span, BareTypeDeclaration::TemplateInstance(instance.clone()))
            }
            Member(member) => {
                let inner = member.base.type_representation()?;
                let bare = match &member.arguments {
                    Some(arguments) => BareTypeDeclaration::TemplateInstance(super::TemplateInstance {
                        name: member.name.clone(),
                        arguments: arguments.clone(),
                    }),
                    None => BareTypeDeclaration::Identifier(member.name.clone()),
                };
                TypeDeclaration::with_inner(span, bare, inner)
            }
            ModuleScope(expression) => expression
                .type_representation()?
                .rooted_at(TypeDeclaration::new(span, BareTypeDeclaration::ModuleScope)),
            Type(type_) => type_.clone(),
            Keyword(kind) if kind.is_basic_type() => TypeDeclaration::basic(span, *kind),
            Literal(literal) => literal_type(span, &literal.literal.value),
            Index(index) if index.arguments.is_empty() => index
                .base
                .type_representation()?
                .wrap(span, BareTypeDeclaration::Array(ArrayKind::Dynamic)),
            Parenthesized(expression) => expression.type_representation()?,
            Typeof(expression) => TypeDeclaration::new(
                span,
                BareTypeDeclaration::Typeof(Some(Box::new((**expression).clone()))),
            ),
            _ => return None,
        })
    }

    /// Whether this expression could also be read as a type.
    pub fn is_type_like(&self) -> bool {
        use BareExpression::*;

        match &self.bare {
            Identifier(_) | TemplateInstance(_) | Type(_) | Typeof(_) => true,
            Keyword(kind) => kind.is_basic_type(),
            Member(member) => member.base.is_type_like(),
            ModuleScope(expression) | Parenthesized(expression) => expression.is_type_like(),
            _ => false,
        }
    }
}

fn literal_type(span: Span, value: &LiteralValue) -> TypeDeclaration {
    match value {
        LiteralValue::Integer(value) if *value > i32::MAX as u64 => {
            TypeDeclaration::basic(span, TokenKind::Long)
        }
        LiteralValue::Integer(_) => TypeDeclaration::basic(span, TokenKind::Int),
        LiteralValue::Float(_) => TypeDeclaration::basic(span, TokenKind::Double),
        LiteralValue::Char(_) => TypeDeclaration::basic(span, TokenKind::Char),
        LiteralValue::Text(_) => TypeDeclaration::basic(span, TokenKind::Char)
            .wrap(span, BareTypeDeclaration::Qualified(TokenKind::Immutable))
            .wrap(span, BareTypeDeclaration::Array(ArrayKind::Dynamic)),
    }
}

impl Spanning for Expression {
    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum BareExpression {
    Literal(LiteralExpression),
    Identifier(String),
    TemplateInstance(TemplateInstance),
    /// Keywords used as expressions: `this`, `super`, `null`, `true`, `false`, `$`,
    /// special tokens like `__LINE__` and basic types like in `int.max`.
    Keyword(TokenKind),
    /// A type in expression position like `int[]` in `int[].init` or `(const int).sizeof`.
    Type(TypeDeclaration),
    /// `base.name` or `base.name!(arguments)`.
    Member(Box<Member>),
    /// The leading dot of `.name` refering to the module scope.
    ModuleScope(Box<Expression>),
    Call(Box<Call>),
    /// `base[arguments]`, `base[]` if no arguments.
    Index(Box<Index>),
    /// `base[lower .. upper]`.
    Slice(Box<Slice>),
    /// Prefix operators: `& * - + ! ~ ++ --` as well as `delete`.
    Unary(Box<Unary>),
    /// Postfix `++` and `--`.
    Postfix(Box<Unary>),
    /// Arithmetic, bitwise, comparison, logical, concatenation, assignment, comma,
    /// `in`, `!in`, `is` and `!is`.
    Binary(Box<Binary>),
    Conditional(Box<Conditional>),
    Cast(Box<Cast>),
    New(Box<New>),
    ArrayLiteral(Vec<Expression>),
    AssociativeArrayLiteral(Vec<(Expression, Expression)>),
    /// Function and delegate literals including lambdas.
    FunctionLiteral(Box<FunctionLiteral>),
    Assert(Vec<Expression>),
    Mixin(Vec<Expression>),
    /// `import("file")`
    Import(Box<Expression>),
    Typeid(Box<TemplateArgument>),
    /// `typeof(expression)` in expression position.
    Typeof(Box<Expression>),
    Is(Box<IsExpression>),
    Traits(Box<Traits>),
    Parenthesized(Box<Expression>),
    /// An expression that failed to parse.
    Error,
}

#[derive(Clone, PartialEq, Debug)]
pub struct LiteralExpression {
    /// The source text.
    pub text: String,
    pub literal: Literal,
}

impl LiteralExpression {
    pub fn new(text: impl Into<String>, literal: Literal) -> Self {
        Self { text: text.into(), literal }
    }

    pub fn value(&self) -> &LiteralValue {
        &self.literal.value
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Member {
    pub base: Expression,
    pub name: String,
    pub name_span: Span,
    pub arguments: Option<Vec<TemplateArgument>>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Call {
    pub callee: Expression,
    pub arguments: Vec<Expression>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Index {
    pub base: Expression,
    pub arguments: Vec<Expression>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Slice {
    pub base: Expression,
    pub lower: Expression,
    pub upper: Expression,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Unary {
    pub operator: TokenKind,
    pub operand: Expression,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Binary {
    /// The operator; `!in` and `!is` are represented by `in` and `is` marked as negated.
    pub operator: TokenKind,
    /// Whether the operator is `!in` or `!is`.
    pub negated: bool,
    pub left: Expression,
    pub right: Expression,
}

impl Binary {
    pub fn is_comparison_or_logical(&self) -> bool {
        use TokenKind::*;

        matches!(
            self.operator,
            DoubleEquals
                | NotEquals
                | LessThan
                | LessThanOrEqual
                | GreaterThan
                | GreaterThanOrEqual
                | DoubleAmpersand
                | DoubleBar
                | Is
        )
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Conditional {
    pub condition: Expression,
    pub consequence: Expression,
    pub alternative: Expression,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Cast {
    /// Absent for qualifier-only casts like `cast(const)` or `cast()`.
    pub type_: Option<TypeDeclaration>,
    pub qualifiers: Vec<TokenKind>,
    pub operand: Expression,
}

#[derive(Clone, PartialEq, Debug)]
pub struct New {
    pub type_: TypeDeclaration,
    pub arguments: Vec<Expression>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct FunctionLiteral {
    /// `function` or `delegate` if written out.
    pub kind: Option<TokenKind>,
    pub return_type: Option<TypeDeclaration>,
    pub parameters: Vec<Parameter>,
    pub body: FunctionLiteralBody,
}

impl FunctionLiteral {
    pub fn signature(&self) -> Signature {
        Signature {
            kind: self.kind.unwrap_or(TokenKind::Delegate),
            parameters: self.parameters.clone(),
            is_variadic: false,
            attributes: Vec::new(),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum FunctionLiteralBody {
    /// `=> expression`
    Expression(Expression),
    Block(Statement),
}

/// `is(Type)`, `is(Type == Specialization)`, `is(Type Identifier : Specialization)`.
#[derive(Clone, PartialEq, Debug)]
pub struct IsExpression {
    pub type_: TypeDeclaration,
    pub identifier: Option<String>,
    /// Either `==` or `:`.
    pub relation: Option<TokenKind>,
    pub specialization: Option<TemplateArgument>,
}

/// `__traits(name, arguments)`.
#[derive(Clone, PartialEq, Debug)]
pub struct Traits {
    pub name: String,
    pub arguments: Vec<TemplateArgument>,
}

//! The syntax tree of D source files.
//!
//! A parsed source file is a [`Module`] owning an arena of [`Node`]s: every declaration
//! (including parameters, template parameters and local variables) lives in the arena and is
//! addressed by a [`NodeIndex`]. Containers list their members by index in source order and
//! each node points back to its parent.
//!
//! Statements, expressions and type declarations are plain trees, see [`Statement`],
//! [`Expression`] and [`TypeDeclaration`].

pub use expression::*;
use index_map::IndexMap;
pub use render::Render;
use lexer::token::TokenKind;
use span::{Span, Spanning};
pub use statement::*;
pub use type_declaration::*;
use utility::obtain;

mod expression;
pub mod format;
pub mod lookup;
pub mod render;
mod statement;
mod type_declaration;

#[cfg(test)]
mod test;

index_map::index! {
    /// The index of a [`Node`] inside of the arena of its [`Module`].
    pub struct NodeIndex
}

/// A parsed source file.
#[derive(Clone, PartialEq, Debug)]
pub struct Module {
    /// The fully qualified name like `std.stdio`, empty if unknown.
    pub name: String,
    pub nodes: IndexMap<NodeIndex, Node>,
    pub root: NodeIndex,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut nodes = IndexMap::new();
        let root = nodes.insert(Node::new(
            name.rsplit('.').next().unwrap_or_default(),
            Span::default(),
            BareNode::Module(Container::default()),
        ));

        Self { name, nodes, root }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        let short_name = self.name.rsplit('.').next().unwrap_or_default().to_owned();
        let root = self.root;
        self[root].name = short_name;
    }

    /// Add a node to the arena and register it as a member of the given parent.
    ///
    /// If the parent is not a container, the node is only linked upwards.
    pub fn add(&mut self, parent: NodeIndex, mut node: Node) -> NodeIndex {
        node.parent = Some(parent);
        let index = self.nodes.insert(node);
        if let Some(container) = self[parent].container_mut() {
            container.children.push(index);
        }
        index
    }

    /// Add a node that is owned by its parent in a different way than by membership,
    /// like parameters, template parameters and local variables.
    pub fn add_detached(&mut self, parent: NodeIndex, mut node: Node) -> NodeIndex {
        node.parent = Some(parent);
        self.nodes.insert(node)
    }

    pub fn root(&self) -> &Node {
        &self[self.root]
    }

    /// The direct members of the given node in source order.
    pub fn children(&self, index: NodeIndex) -> impl Iterator<Item = (NodeIndex, &Node)> + '_ {
        self[index].children().iter().map(move |&child| (child, &self[child]))
    }

    /// The given node followed by all of its ancestors up to the root.
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(Some(index), move |&index| self[index].parent)
    }

    /// The innermost enclosing node that is a container (including the given node itself).
    pub fn enclosing_container(&self, index: NodeIndex) -> NodeIndex {
        self.ancestors(index).find(|&index| self[index].container().is_some()).unwrap_or(self.root)
    }

    /// The imports written at module level.
    pub fn imports(&self) -> &[Import] {
        self.root().container().map_or(&[], |container| &container.imports)
    }

    pub fn path(&self, index: NodeIndex) -> String {
        let mut segments: Vec<_> = self
            .ancestors(index)
            .filter(|&index| index != self.root)
            .map(|index| self[index].name.as_str())
            .collect();
        segments.reverse();
        if !self.name.is_empty() {
            segments.insert(0, &self.name);
        }
        segments.join(".")
    }
}

impl std::ops::Index<NodeIndex> for Module {
    type Output = Node;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index]
    }
}

impl std::ops::IndexMut<NodeIndex> for Module {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        &mut self.nodes[index]
    }
}

/// A named declaration.
#[derive(Clone, PartialEq, Debug)]
pub struct Node {
    /// The name, empty for anonymous declarations like anonymous enums.
    pub name: String,
    pub name_span: Span,
    pub span: Span,
    /// The declared type, the return type of methods or the base type of enums.
    pub type_: Option<TypeDeclaration>,
    pub attributes: Attributes,
    pub documentation: Option<String>,
    pub parent: Option<NodeIndex>,
    pub bare: BareNode,
}

impl Node {
    pub fn new(name: impl Into<String>, name_span: Span, bare: BareNode) -> Self {
        Self {
            name: name.into(),
            name_span,
            span: name_span,
            type_: None,
            attributes: Attributes::default(),
            documentation: None,
            parent: None,
            bare,
        }
    }

    pub fn container(&self) -> Option<&Container> {
        match &self.bare {
            BareNode::Module(container) => Some(container),
            BareNode::Class(class) => Some(&class.container),
            BareNode::Enum(enum_) => Some(&enum_.container),
            _ => None,
        }
    }

    pub fn container_mut(&mut self) -> Option<&mut Container> {
        match &mut self.bare {
            BareNode::Module(container) => Some(container),
            BareNode::Class(class) => Some(&mut class.container),
            BareNode::Enum(enum_) => Some(&mut enum_.container),
            _ => None,
        }
    }

    pub fn children(&self) -> &[NodeIndex] {
        self.container().map_or(&[], |container| &container.children)
    }

    pub fn template_parameters(&self) -> &[NodeIndex] {
        match &self.bare {
            BareNode::Method(method) => &method.template_parameters,
            BareNode::Class(class) => &class.template_parameters,
            _ => &[],
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_alias(&self) -> bool {
        obtain!(&self.bare, BareNode::Variable(variable) => variable.is_alias).unwrap_or(false)
    }

    pub fn is_template(&self) -> bool {
        !self.template_parameters().is_empty()
    }

    pub fn class(&self) -> Option<&Class> {
        obtain!(&self.bare, BareNode::Class(class) => &**class)
    }

    pub fn method(&self) -> Option<&Method> {
        obtain!(&self.bare, BareNode::Method(method) => &**method)
    }

    pub fn variable(&self) -> Option<&Variable> {
        obtain!(&self.bare, BareNode::Variable(variable) => variable)
    }

    pub fn template_parameter(&self) -> Option<&TemplateParameter> {
        obtain!(&self.bare, BareNode::TemplateParameter(parameter) => parameter)
    }

    /// Whether this node declares a type rather than a value.
    pub fn is_type(&self) -> bool {
        match &self.bare {
            BareNode::Class(_) | BareNode::Enum(_) => true,
            BareNode::TemplateParameter(parameter) => matches!(
                parameter.kind,
                TemplateParameterKind::Type { .. }
                    | TemplateParameterKind::This { .. }
                    | TemplateParameterKind::Tuple
            ),
            _ => false,
        }
    }
}

impl Spanning for Node {
    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum BareNode {
    Module(Container),
    /// Variables, fields, parameters, aliases and manifest constants.
    Variable(Variable),
    Method(Box<Method>),
    /// Classes, interfaces, structs, unions, templates and mixin templates.
    Class(Box<Class>),
    Enum(Enum),
    EnumMember(EnumMember),
    TemplateParameter(TemplateParameter),
}

/// The members of a module, class or enum.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Container {
    pub children: Vec<NodeIndex>,
    pub imports: Vec<Import>,
    /// Declaration-level statements like `static assert`, `mixin(…)` and unit tests.
    pub statements: Vec<Statement>,
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct Variable {
    pub initializer: Option<Expression>,
    pub is_alias: bool,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Method {
    pub kind: MethodKind,
    pub parameters: Vec<NodeIndex>,
    pub is_variadic: bool,
    pub template_parameters: Vec<NodeIndex>,
    pub constraint: Option<Expression>,
    pub in_contract: Option<Statement>,
    pub out_contract: Option<Statement>,
    pub body: Option<Statement>,
}

impl Method {
    pub fn new(kind: MethodKind) -> Self {
        Self {
            kind,
            parameters: Vec::new(),
            is_variadic: false,
            template_parameters: Vec::new(),
            constraint: None,
            in_contract: None,
            out_contract: None,
            body: None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MethodKind {
    Normal,
    Constructor,
    Destructor,
    Postblit,
    Invariant,
    StaticConstructor,
    StaticDestructor,
    SharedStaticConstructor,
    SharedStaticDestructor,
}

impl MethodKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::Constructor | Self::Postblit => "this",
            Self::Destructor => "~this",
            Self::Invariant => "invariant",
            Self::StaticConstructor => "static this",
            Self::StaticDestructor => "static ~this",
            Self::SharedStaticConstructor => "shared static this",
            Self::SharedStaticDestructor => "shared static ~this",
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Class {
    pub kind: ClassKind,
    pub base_classes: Vec<TypeDeclaration>,
    pub template_parameters: Vec<NodeIndex>,
    pub constraint: Option<Expression>,
    pub container: Container,
}

impl Class {
    pub fn new(kind: ClassKind) -> Self {
        Self {
            kind,
            base_classes: Vec::new(),
            template_parameters: Vec::new(),
            constraint: None,
            container: Container::default(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClassKind {
    Class,
    Interface,
    Struct,
    Union,
    Template,
    MixinTemplate,
}

impl ClassKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Struct => "struct",
            Self::Union => "union",
            Self::Template => "template",
            Self::MixinTemplate => "mixin template",
        }
    }

    /// Whether instances have a reference (pointer-like) representation.
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::Class | Self::Interface)
    }
}

/// An enum, anonymous if its name is empty.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Enum {
    pub container: Container,
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct EnumMember {
    pub initializer: Option<Expression>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct TemplateParameter {
    pub kind: TemplateParameterKind,
}

#[derive(Clone, PartialEq, Debug)]
pub enum TemplateParameterKind {
    /// `T`, `T : int`, `T = int`.
    Type { specialization: Option<TypeDeclaration>, default: Option<TypeDeclaration> },
    /// `int N`, `int N : 3`, `int N = 3`. The node carries the value type.
    Value { specialization: Option<Expression>, default: Option<Expression> },
    /// `alias A`, `alias A = b`.
    Alias { specialization: Option<TemplateArgument>, default: Option<TemplateArgument> },
    /// `Arguments...`.
    Tuple,
    /// `this T`.
    This { specialization: Option<TypeDeclaration>, default: Option<TypeDeclaration> },
}

/// An import declaration binding a single module.
///
/// `import a, b;` yields two imports.
#[derive(Clone, PartialEq, Debug)]
pub struct Import {
    pub span: Span,
    /// The fully qualified module name.
    pub module: String,
    /// The name in `import io = std.stdio;`.
    pub rename: Option<String>,
    /// The selected symbols in `import std.stdio : writeln, w = write;`.
    pub bindings: Vec<ImportBinding>,
    pub is_public: bool,
    pub is_static: bool,
}

impl Import {
    pub fn is_selective(&self) -> bool {
        !self.bindings.is_empty()
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ImportBinding {
    pub name: String,
    pub rename: Option<String>,
}

impl ImportBinding {
    /// The name the symbol is visible under.
    pub fn binder(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct Attributes(pub Vec<Attribute>);

impl Attributes {
    pub fn contains(&self, keyword: TokenKind) -> bool {
        self.0.iter().any(|attribute| *attribute == Attribute::Keyword(keyword))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn push(&mut self, attribute: Attribute) {
        if !self.0.contains(&attribute) {
            self.0.push(attribute);
        }
    }

    pub fn extend(&mut self, attributes: impl IntoIterator<Item = Attribute>) {
        for attribute in attributes {
            self.push(attribute);
        }
    }

    /// The visibility, `public` by default.
    pub fn visibility(&self) -> TokenKind {
        self.0
            .iter()
            .rev()
            .find_map(|attribute| obtain!(attribute, &Attribute::Keyword(keyword) if keyword.is_visibility() => keyword))
            .unwrap_or(TokenKind::Public)
    }

    pub fn is_static(&self) -> bool {
        self.contains(TokenKind::Static)
    }

    /// Whether a manifest constant (`enum x = …;`).
    pub fn is_manifest_constant(&self) -> bool {
        self.contains(TokenKind::Enum)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut attributes = Self::default();
        attributes.extend(iter);
        attributes
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Attribute {
    /// Storage classes, visibilities and the like.
    Keyword(TokenKind),
    /// `@property`, `@safe`, `@nogc`, …
    Property(String),
    /// User-defined attributes like `@Attribute(1)`.
    UserDefined(Expression),
    /// `extern(C)`, `extern(C++, ns)`.
    Linkage(String),
    /// `align`, `align(4)`.
    Alignment(Option<Expression>),
    /// `deprecated`, `deprecated("message")`.
    Deprecated(Option<Expression>),
    /// The condition of the enclosing conditional compilation block.
    Condition(CompileCondition),
}

/// A condition of conditional compilation.
#[derive(Clone, PartialEq, Debug)]
pub enum CompileCondition {
    /// `version(identifier)` or `version(1)`.
    Version(String),
    /// `debug`, `debug(identifier)`.
    Debug(Option<String>),
    /// `static if (expression)`.
    StaticIf(Expression),
    /// The negation of the preceding condition in an `else` branch.
    Else(Box<CompileCondition>),
}

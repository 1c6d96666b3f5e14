//! The tree dump of modules shown by `--emit-ast`.

use super::{Attribute, BareNode, Module, NodeIndex, TemplateParameterKind};
use span::Span;
use std::{
    fmt::Display,
    io::{self, Write},
};
use struct_::Struct;
use utility::paint::{AnsiColor, Painter};

pub use indent::Indent;

mod indent {
    use std::fmt;

    const INDENT_IN_SPACES: Repr = 4;
    type Repr = usize;

    #[derive(Clone, Copy, Default)]
    pub struct Indent(Repr);

    impl Indent {
        pub(super) fn increased(self) -> Self {
            Self(self.0 + INDENT_IN_SPACES)
        }
    }

    impl fmt::Display for Indent {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", " ".repeat(self.0))
        }
    }
}

mod struct_ {
    use super::{palette, Indent, Render};
    use std::io::{self, Write};
    use utility::paint::Painter;

    pub(super) struct Struct<'p> {
        p: &'p mut Painter,
        indent: Indent,
        has_fields: bool,
        result: io::Result<()>,
    }

    impl<'p> Struct<'p> {
        pub(super) fn new(indent: Indent, p: &'p mut Painter) -> Self {
            Self { p, indent, has_fields: false, result: Ok(()) }
        }

        pub(super) fn name(mut self, name: &str) -> Self {
            self.result = self.result.and_then(|()| {
                self.p.set(palette::NAME.on_default().bold())?;
                write!(self.p, "{name}")?;
                self.p.unset()
            });

            self
        }

        pub(super) fn field(mut self, name: &str, field: &(impl Render + ?Sized)) -> Self {
            if !self.has_fields {
                self.has_fields = true;
                self.indent = self.indent.increased();
            }

            self.result = self.result.and_then(|()| {
                writeln!(self.p)?;
                write!(self.p, "{}", self.indent)?;
                self.p.set(palette::FIELD)?;
                write!(self.p, "{name}")?;
                self.p.unset()?;
                write!(self.p, ": ")?;
                field.render(self.indent, self.p)
            });

            self
        }

        pub(super) fn finish(self) -> io::Result<()> {
            self.result
        }
    }
}

pub trait Render {
    fn render(&self, indent: Indent, p: &mut Painter) -> io::Result<()>;
}

impl<T: Render> Render for Option<T> {
    fn render(&self, indent: Indent, p: &mut Painter) -> io::Result<()> {
        match self {
            Some(value) => value.render(indent, p),
            None => {
                p.set(palette::SPECIAL_SYMBOL)?;
                write!(p, "none")?;
                p.unset()
            }
        }
    }
}

impl<T: Render> Render for [T] {
    fn render(&self, indent: Indent, p: &mut Painter) -> io::Result<()> {
        if self.is_empty() {
            p.set(palette::SPECIAL_SYMBOL)?;
            write!(p, "empty")?;
            return p.unset();
        }

        let mut struct_ = Struct::new(indent, p);
        for (index, element) in self.iter().enumerate() {
            struct_ = struct_.field(&index.to_string(), element);
        }
        struct_.finish()
    }
}

impl<T: Render> Render for Vec<T> {
    fn render(&self, indent: Indent, p: &mut Painter) -> io::Result<()> {
        (**self).render(indent, p)
    }
}

impl Render for Span {
    fn render(&self, _: Indent, p: &mut Painter) -> io::Result<()> {
        p.set(palette::SPAN)?;
        write!(p, "{self:?}")?;
        p.unset()
    }
}

impl Render for bool {
    fn render(&self, _: Indent, p: &mut Painter) -> io::Result<()> {
        p.set(palette::SPECIAL_SYMBOL)?;
        write!(p, "{self}")?;
        p.unset()
    }
}

/// Source code rendered as written.
struct Verbatim<T>(T);

impl<T: Display> Render for Verbatim<T> {
    fn render(&self, _: Indent, p: &mut Painter) -> io::Result<()> {
        p.set(palette::VERBATIM)?;
        write!(p, "‘{}’", self.0)?;
        p.unset()
    }
}

fn verbatim<T: Display>(value: Option<T>) -> Option<Verbatim<T>> {
    value.map(Verbatim)
}

impl Render for Attribute {
    fn render(&self, indent: Indent, p: &mut Painter) -> io::Result<()> {
        match self {
            Self::Keyword(keyword) => Verbatim(keyword.text()).render(indent, p),
            Self::Property(property) => Verbatim(format_args!("@{property}")).render(indent, p),
            Self::UserDefined(expression) => Verbatim(format_args!("@{expression}")).render(indent, p),
            Self::Linkage(linkage) => Verbatim(format_args!("extern({linkage})")).render(indent, p),
            Self::Alignment(None) => Verbatim("align").render(indent, p),
            Self::Alignment(Some(alignment)) => Verbatim(format_args!("align({alignment})")).render(indent, p),
            Self::Deprecated(None) => Verbatim("deprecated").render(indent, p),
            Self::Deprecated(Some(message)) => Verbatim(format_args!("deprecated({message})")).render(indent, p),
            Self::Condition(condition) => Verbatim(condition).render(indent, p),
        }
    }
}

impl Render for Module {
    fn render(&self, indent: Indent, p: &mut Painter) -> io::Result<()> {
        Tree { module: self, index: self.root }.render(indent, p)
    }
}

/// A node together with the arena it lives in.
struct Tree<'m> {
    module: &'m Module,
    index: NodeIndex,
}

impl Tree<'_> {
    fn subtrees(&self, indices: &[NodeIndex]) -> Vec<Self> {
        indices.iter().map(|&index| Tree { module: self.module, index }).collect()
    }
}

impl Render for Tree<'_> {
    fn render(&self, indent: Indent, p: &mut Painter) -> io::Result<()> {
        let node = &self.module[self.index];

        let kind = match &node.bare {
            BareNode::Module(_) => "Module",
            BareNode::Variable(variable) if variable.is_alias => "Alias",
            BareNode::Variable(_) => "Variable",
            BareNode::Method(_) => "Method",
            BareNode::Class(_) => "Class",
            BareNode::Enum(_) => "Enum",
            BareNode::EnumMember(_) => "EnumMember",
            BareNode::TemplateParameter(_) => "TemplateParameter",
        };

        node.span.render(indent, p)?;
        write!(p, " ")?;
        let mut struct_ = Struct::new(indent, p).name(kind).field("name", &Verbatim(&node.name));

        if let Some(type_) = &node.type_ {
            struct_ = struct_.field("type", &Verbatim(type_));
        }
        if !node.attributes.is_empty() {
            struct_ = struct_.field("attributes", &node.attributes.0);
        }
        if let Some(documentation) = &node.documentation {
            struct_ = struct_.field("documentation", &Verbatim(documentation.escape_debug()));
        }

        match &node.bare {
            BareNode::Module(container) | BareNode::Enum(super::Enum { container }) => {
                let imports: Vec<_> = container.imports.iter().map(Verbatim).collect();
                if !imports.is_empty() {
                    struct_ = struct_.field("imports", &imports);
                }
                struct_ = struct_.field("members", &self.subtrees(&container.children));
            }
            BareNode::Variable(variable) => {
                struct_ = struct_.field("initializer", &verbatim(variable.initializer.as_ref()));
            }
            BareNode::Method(method) => {
                struct_ = struct_
                    .field("kind", &Verbatim(method.kind.name()))
                    .field("template-parameters", &self.subtrees(&method.template_parameters))
                    .field("parameters", &self.subtrees(&method.parameters))
                    .field("variadic", &method.is_variadic)
                    .field("constraint", &verbatim(method.constraint.as_ref()))
                    .field("body", &method.body.as_ref().map(|body| body.span));
            }
            BareNode::Class(class) => {
                let base_classes: Vec<_> = class.base_classes.iter().map(Verbatim).collect();
                let imports: Vec<_> = class.container.imports.iter().map(Verbatim).collect();
                struct_ = struct_
                    .field("kind", &Verbatim(class.kind.name()))
                    .field("template-parameters", &self.subtrees(&class.template_parameters))
                    .field("base-classes", &base_classes)
                    .field("constraint", &verbatim(class.constraint.as_ref()));
                if !imports.is_empty() {
                    struct_ = struct_.field("imports", &imports);
                }
                struct_ = struct_.field("members", &self.subtrees(&class.container.children));
            }
            BareNode::EnumMember(member) => {
                struct_ = struct_.field("initializer", &verbatim(member.initializer.as_ref()));
            }
            BareNode::TemplateParameter(parameter) => {
                let (kind, specialization, default) = match &parameter.kind {
                    TemplateParameterKind::Type { specialization, default } => {
                        ("type", specialization.as_ref().map(ToString::to_string), default.as_ref().map(ToString::to_string))
                    }
                    TemplateParameterKind::Value { specialization, default } => {
                        ("value", specialization.as_ref().map(ToString::to_string), default.as_ref().map(ToString::to_string))
                    }
                    TemplateParameterKind::Alias { specialization, default } => {
                        ("alias", specialization.as_ref().map(ToString::to_string), default.as_ref().map(ToString::to_string))
                    }
                    TemplateParameterKind::Tuple => ("tuple", None, None),
                    TemplateParameterKind::This { specialization, default } => {
                        ("this", specialization.as_ref().map(ToString::to_string), default.as_ref().map(ToString::to_string))
                    }
                };
                struct_ = struct_
                    .field("kind", &Verbatim(kind))
                    .field("specialization", &verbatim(specialization))
                    .field("default", &verbatim(default));
            }
        }

        struct_.finish()
    }
}

mod palette {
    use super::AnsiColor;

    pub(super) const FIELD: AnsiColor = AnsiColor::BrightWhite;
    pub(super) const NAME: AnsiColor = AnsiColor::BrightCyan;
    pub(super) const SPAN: AnsiColor = AnsiColor::BrightBlack;
    pub(super) const SPECIAL_SYMBOL: AnsiColor = AnsiColor::BrightCyan;
    pub(super) const VERBATIM: AnsiColor = AnsiColor::Yellow;
}

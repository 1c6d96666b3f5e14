//! The textual representations of the syntax tree.
//!
//! Type declarations, template arguments and expressions are displayed in D syntax. The
//! output of type declarations re-parses to a structurally equal chain and serves as the key
//! of resolution caches. [`Tree`] renders an outline of a whole module.

use super::*;
use joinery::JoinableIterator;
use std::fmt::{Display, Formatter, Result};

impl Display for TypeDeclaration {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        use BareTypeDeclaration::*;

        let inner = Inner(self.inner());

        match &self.bare {
            Basic(kind) => f.write_str(kind.text()),
            Identifier(name) => write!(f, "{}{name}", Qualifier(self.inner())),
            TemplateInstance(instance) => write!(f, "{}{instance}", Qualifier(self.inner())),
            Pointer => write!(f, "{inner}*"),
            Array(ArrayKind::Dynamic) => write!(f, "{inner}[]"),
            Array(ArrayKind::Static(size)) => write!(f, "{inner}[{size}]"),
            Array(ArrayKind::Associative(key)) => write!(f, "{inner}[{key}]"),
            Delegate(signature) => write!(f, "{inner} {signature}"),
            Typeof(Some(expression)) => write!(f, "typeof({expression})"),
            Typeof(None) => f.write_str("typeof(return)"),
            Qualified(qualifier) => write!(f, "{}({inner})", qualifier.text()),
            // qualifiers are followed by a dot, so `.a` is printed correctly
            ModuleScope => Ok(()),
        }
    }
}

struct Inner<'a>(Option<&'a TypeDeclaration>);

impl Display for Inner<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.0 {
            Some(inner) => write!(f, "{inner}"),
            None => Ok(()),
        }
    }
}

struct Qualifier<'a>(Option<&'a TypeDeclaration>);

impl Display for Qualifier<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.0 {
            Some(qualifier) => write!(f, "{qualifier}."),
            None => Ok(()),
        }
    }
}

impl Display for TemplateInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}!({})", self.name, self.arguments.iter().join_with(", "))
    }
}

impl Display for TemplateArgument {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::Type(type_) => write!(f, "{type_}"),
            Self::Expression(expression) => write!(f, "{expression}"),
        }
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}(", self.kind.text())?;
        write!(f, "{}", self.parameters.iter().join_with(", "))?;
        if self.is_variadic {
            if !self.parameters.is_empty() {
                f.write_str(", ")?;
            }
            f.write_str("...")?;
        }
        f.write_str(")")?;
        for attribute in &self.attributes {
            write!(f, " {}", attribute.text())?;
        }
        Ok(())
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let mut separator = "";

        for attribute in &self.attributes {
            write!(f, "{separator}{}", attribute.text())?;
            separator = " ";
        }
        if let Some(type_) = &self.type_ {
            write!(f, "{separator}{type_}")?;
            separator = " ";
        }
        if let Some(name) = &self.name {
            write!(f, "{separator}{name}")?;
        }
        if let Some(default) = &self.default {
            write!(f, " = {default}")?;
        }
        Ok(())
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        use BareExpression::*;

        match &self.bare {
            Literal(literal) => f.write_str(&literal.text),
            Identifier(name) => f.write_str(name),
            TemplateInstance(instance) => write!(f, "{instance}"),
            Keyword(kind) => f.write_str(kind.text()),
            Type(type_) => write!(f, "{type_}"),
            Member(member) => {
                write!(f, "{}.{}", member.base, member.name)?;
                if let Some(arguments) = &member.arguments {
                    write!(f, "!({})", arguments.iter().join_with(", "))?;
                }
                Ok(())
            }
            ModuleScope(expression) => write!(f, ".{expression}"),
            Call(call) => write!(f, "{}({})", call.callee, call.arguments.iter().join_with(", ")),
            Index(index) => write!(f, "{}[{}]", index.base, index.arguments.iter().join_with(", ")),
            Slice(slice) => write!(f, "{}[{} .. {}]", slice.base, slice.lower, slice.upper),
            Unary(unary) if unary.operator == TokenKind::Delete => write!(f, "delete {}", unary.operand),
            Unary(unary) => write!(f, "{}{}", unary.operator.text(), unary.operand),
            Postfix(unary) => write!(f, "{}{}", unary.operand, unary.operator.text()),
            Binary(binary) if binary.operator == TokenKind::Comma => {
                write!(f, "{}, {}", binary.left, binary.right)
            }
            Binary(binary) => write!(
                f,
                "{} {}{} {}",
                binary.left,
                if binary.negated { "!" } else { "" },
                binary.operator.text(),
                binary.right
            ),
            Conditional(conditional) => write!(
                f,
                "{} ? {} : {}",
                conditional.condition, conditional.consequence, conditional.alternative
            ),
            Cast(cast) => {
                let qualifiers = cast.qualifiers.iter().map(|qualifier| qualifier.text());
                match &cast.type_ {
                    Some(type_) => write!(
                        f,
                        "cast({}) {}",
                        qualifiers.map(str::to_owned).chain(Some(type_.to_string())).join_with(" "),
                        cast.operand
                    ),
                    None => write!(f, "cast({}) {}", qualifiers.join_with(" "), cast.operand),
                }
            }
            New(new) => write!(f, "new {}({})", new.type_, new.arguments.iter().join_with(", ")),
            ArrayLiteral(elements) => write!(f, "[{}]", elements.iter().join_with(", ")),
            AssociativeArrayLiteral(entries) => write!(
                f,
                "[{}]",
                entries.iter().map(|(key, value)| format!("{key}: {value}")).join_with(", ")
            ),
            FunctionLiteral(literal) => {
                if let Some(kind) = literal.kind {
                    write!(f, "{} ", kind.text())?;
                }
                if let Some(return_type) = &literal.return_type {
                    write!(f, "{return_type} ")?;
                }
                write!(f, "({})", literal.parameters.iter().join_with(", "))?;
                match &literal.body {
                    FunctionLiteralBody::Expression(expression) => write!(f, " => {expression}"),
                    FunctionLiteralBody::Block(_) => f.write_str(" { … }"),
                }
            }
            Assert(arguments) => write!(f, "assert({})", arguments.iter().join_with(", ")),
            Mixin(arguments) => write!(f, "mixin({})", arguments.iter().join_with(", ")),
            Import(expression) => write!(f, "import({expression})"),
            Typeid(argument) => write!(f, "typeid({argument})"),
            Typeof(expression) => write!(f, "typeof({expression})"),
            Is(is) => {
                write!(f, "is({}", is.type_)?;
                if let Some(identifier) = &is.identifier {
                    write!(f, " {identifier}")?;
                }
                if let (Some(relation), Some(specialization)) = (is.relation, &is.specialization) {
                    write!(f, " {} {specialization}", relation.text())?;
                }
                f.write_str(")")
            }
            Traits(traits) => {
                write!(f, "__traits({}", traits.name)?;
                for argument in &traits.arguments {
                    write!(f, ", {argument}")?;
                }
                f.write_str(")")
            }
            Parenthesized(expression) => write!(f, "({expression})"),
            Error => f.write_str("<error>"),
        }
    }
}

impl Display for Import {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if self.is_public {
            f.write_str("public ")?;
        }
        if self.is_static {
            f.write_str("static ")?;
        }
        f.write_str("import ")?;
        if let Some(rename) = &self.rename {
            write!(f, "{rename} = ")?;
        }
        f.write_str(&self.module)?;
        if self.is_selective() {
            let bindings = self.bindings.iter().map(|binding| match &binding.rename {
                Some(rename) => format!("{rename} = {}", binding.name),
                None => binding.name.clone(),
            });
            write!(f, " : {}", bindings.join_with(", "))?;
        }
        Ok(())
    }
}

impl Display for CompileCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::Version(identifier) => write!(f, "version({identifier})"),
            Self::Debug(Some(identifier)) => write!(f, "debug({identifier})"),
            Self::Debug(None) => f.write_str("debug"),
            Self::StaticIf(condition) => write!(f, "static if ({condition})"),
            Self::Else(condition) => write!(f, "!{condition}"),
        }
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::Keyword(keyword) => f.write_str(keyword.text()),
            Self::Property(name) => write!(f, "@{name}"),
            Self::UserDefined(expression) => write!(f, "@({expression})"),
            Self::Linkage(linkage) => write!(f, "extern({linkage})"),
            Self::Alignment(Some(alignment)) => write!(f, "align({alignment})"),
            Self::Alignment(None) => f.write_str("align"),
            Self::Deprecated(Some(message)) => write!(f, "deprecated({message})"),
            Self::Deprecated(None) => f.write_str("deprecated"),
            Self::Condition(condition) => write!(f, "{condition}"),
        }
    }
}

/// An indented outline of all declarations of a module.
pub struct Tree<'m>(pub &'m Module);

impl Tree<'_> {
    fn write_node(&self, f: &mut Formatter<'_>, index: NodeIndex, depth: usize) -> Result {
        let module = self.0;
        let node = &module[index];
        let indentation = "    ".repeat(depth);

        write!(f, "{indentation}")?;
        for attribute in node.attributes.iter() {
            write!(f, "{attribute} ")?;
        }

        let name = if node.is_anonymous() { "<anonymous>" } else { node.name.as_str() };

        match &node.bare {
            BareNode::Module(_) => write!(f, "module {}", if module.name.is_empty() { name } else { module.name.as_str() })?,
            BareNode::Variable(variable) => {
                f.write_str(if variable.is_alias { "alias " } else { "variable " })?;
                f.write_str(name)?;
                if let Some(type_) = &node.type_ {
                    write!(f, ": {type_}")?;
                }
                if let Some(initializer) = &variable.initializer {
                    write!(f, " = {initializer}")?;
                }
            }
            BareNode::Method(method) => {
                write!(f, "method {name}")?;
                self.write_template_parameters(f, &method.template_parameters)?;
                let parameters = method.parameters.iter().map(|&parameter| Declared(&module[parameter]));
                write!(f, "({})", parameters.join_with(", "))?;
                if let Some(type_) = &node.type_ {
                    write!(f, ": {type_}")?;
                }
            }
            BareNode::Class(class) => {
                write!(f, "{} {name}", class.kind.name())?;
                self.write_template_parameters(f, &class.template_parameters)?;
                if !class.base_classes.is_empty() {
                    write!(f, " : {}", class.base_classes.iter().join_with(", "))?;
                }
            }
            BareNode::Enum(_) => {
                write!(f, "enum {name}")?;
                if let Some(type_) = &node.type_ {
                    write!(f, " : {type_}")?;
                }
            }
            BareNode::EnumMember(member) => {
                write!(f, "member {name}")?;
                if let Some(initializer) = &member.initializer {
                    write!(f, " = {initializer}")?;
                }
            }
            BareNode::TemplateParameter(_) => write!(f, "template parameter {name}")?,
        }

        if node.documentation.is_some() {
            f.write_str(" (documented)")?;
        }
        writeln!(f)?;

        if let Some(container) = node.container() {
            for import in &container.imports {
                writeln!(f, "{indentation}    {import}")?;
            }
        }
        for &child in node.children() {
            self.write_node(f, child, depth + 1)?;
        }

        Ok(())
    }

    fn write_template_parameters(&self, f: &mut Formatter<'_>, parameters: &[NodeIndex]) -> Result {
        if parameters.is_empty() {
            return Ok(());
        }
        let names = parameters.iter().map(|&parameter| self.0[parameter].name.as_str());
        write!(f, "({})", names.join_with(", "))
    }
}

impl Display for Tree<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        self.write_node(f, self.0.root, 0)
    }
}

/// A parameter or variable as `type name`.
struct Declared<'a>(&'a Node);

impl Display for Declared<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self.0.type_ {
            Some(type_) if self.0.name.is_empty() => write!(f, "{type_}"),
            Some(type_) => write!(f, "{type_} {}", self.0.name),
            None => f.write_str(&self.0.name),
        }
    }
}

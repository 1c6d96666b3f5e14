use super::*;
use ast::{
    Attribute, BareExpression, BareNode, BareStatement, BareTypeDeclaration, ClassKind,
    CompileCondition, FunctionLiteralBody, MethodKind, Node, NodeIndex, TemplateArgument,
};
use lexer::token::{LiteralValue, TokenKind};
use span::Span;
use std::mem::{discriminant, Discriminant};

fn parse(source: &str) -> Module {
    let outcome = parse_module(source, ParseOptions::default());
    assert!(outcome.errors.is_empty(), "unexpected errors: {:?}", outcome.errors);
    outcome.bare
}

fn member(module: &Module, parent: NodeIndex, name: &str) -> NodeIndex {
    module
        .children(parent)
        .find(|(_, node)| node.name == name)
        .map(|(index, _)| index)
        .unwrap_or_else(|| panic!("no member ‘{name}’"))
}

fn type_of(module: &Module, index: NodeIndex) -> String {
    module[index].type_.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn block(outcome: ParseOutcome<Fragment<Statement>>) -> (Module, Vec<Statement>) {
    assert!(outcome.errors.is_empty(), "unexpected errors: {:?}", outcome.errors);
    let Fragment { module, bare } = outcome.bare;
    match bare.bare {
        BareStatement::Block(statements) => (module, statements),
        bare => panic!("expected a block, got {bare:?}"),
    }
}

#[test]
fn types_display_as_written() {
    for source in ["const(char)[]*", "int[string]", "void function(int, ref double)", "Foo!(int, 3)*"] {
        let outcome = parse_type(source, ParseOptions::default());
        assert!(outcome.errors.is_empty(), "{source}: {:?}", outcome.errors);
        assert_eq!(outcome.bare.bare.to_string(), source);
    }
}

/// The links of a type chain by kind and text, outermost first.
fn links(type_: &TypeDeclaration) -> Vec<(Discriminant<BareTypeDeclaration>, String)> {
    std::iter::successors(Some(type_), |link| link.inner())
        .map(|link| (discriminant(&link.bare), link.to_string()))
        .collect()
}

#[test]
fn printed_types_parse_back_to_the_same_chain() {
    for source in [
        "const( char )[ ]*",
        "int[ string ]",
        "void function( int, ref double )",
        "Foo!( int, 3 )*",
        "std.range.Box!int[]",
        "immutable( int )*[]",
    ] {
        let outcome = parse_type(source, ParseOptions::default());
        assert!(outcome.errors.is_empty(), "{source}: {:?}", outcome.errors);
        let type_ = outcome.bare.bare;
        let printed = type_.to_string();

        let outcome = parse_type(&printed, ParseOptions::default());
        assert!(outcome.errors.is_empty(), "{printed}: {:?}", outcome.errors);
        let reparsed = outcome.bare.bare;

        assert_eq!(links(&reparsed), links(&type_), "{source}");
        assert_eq!(reparsed.to_string(), printed);
    }
}

#[test]
fn static_array_is_not_associative() {
    let outcome = parse_type("int[4]", ParseOptions::default());
    assert!(outcome.errors.is_empty());
    let type_ = outcome.bare.bare;
    assert!(matches!(
        type_.bare,
        ast::BareTypeDeclaration::Array(ast::ArrayKind::Static(_))
    ));
}

#[test]
fn pointer_declaration_statement() {
    let (module, statements) = block(parse_block_statement("int* a;", ParseOptions::default()));

    assert_eq!(statements.len(), 1);
    let BareStatement::Declaration(nodes) = &statements[0].bare else {
        panic!("expected a declaration, got {:?}", statements[0].bare);
    };
    assert_eq!(nodes.len(), 1);
    assert_eq!(module[nodes[0]].name, "a");
    assert_eq!(type_of(&module, nodes[0]), "int*");
}

#[test]
fn local_aliases_and_types_start_declarations() {
    let (module, statements) = block(parse_block_statement(
        "alias int T; T* p; struct S {} S* q; int a; a* b;",
        ParseOptions::default(),
    ));

    assert_eq!(statements.len(), 6);
    for (statement, name, type_) in [(1, "p", "T*"), (3, "q", "S*")] {
        let BareStatement::Declaration(nodes) = &statements[statement].bare else {
            panic!("expected a declaration, got {:?}", statements[statement].bare);
        };
        assert_eq!(module[nodes[0]].name, name);
        assert_eq!(type_of(&module, nodes[0]), type_);
    }
    // variables still make the asterisk a multiplication
    assert!(matches!(&statements[5].bare, BareStatement::Expression(_)));
}

#[test]
fn failed_speculation_discards_added_members() {
    let enum_ = |name: &str| Node::new(name, Span::default(), BareNode::Enum(ast::Enum::default()));
    let mut parser = Parser::new("", ParseOptions::default());
    let root = parser.module.root;
    let kept = parser.module.add(root, enum_("Kept"));

    let attempt = parser.speculate(|parser| {
        let root = parser.module.root;
        let discarded = parser.module.add(root, enum_("Discarded"));
        parser.module.add(kept, enum_("Nested"));
        parser.module.add(discarded, enum_("Inner"));
        None::<()>
    });

    assert!(attempt.is_none());
    assert_eq!(parser.module.nodes.len(), 2);
    assert_eq!(parser.module[root].children().to_vec(), vec![kept]);
    assert!(parser.module[kept].children().is_empty());
}

#[test]
fn multiplication_of_locals_is_an_expression() {
    let (_, statements) = block(parse_block_statement("int a; int b; a * b;", ParseOptions::default()));

    assert_eq!(statements.len(), 3);
    assert!(matches!(statements[0].bare, BareStatement::Declaration(_)));
    assert!(matches!(statements[1].bare, BareStatement::Declaration(_)));
    let BareStatement::Expression(expression) = &statements[2].bare else {
        panic!("expected an expression, got {:?}", statements[2].bare);
    };
    let BareExpression::Binary(binary) = &expression.bare else {
        panic!("expected a binary expression, got {:?}", expression.bare);
    };
    assert_eq!(binary.operator, TokenKind::Asterisk);
}

#[test]
fn template_arguments_prefer_types() {
    let outcome = parse_expression(r#"Foo!(int, 2, "x")"#, ParseOptions::default());
    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);

    let BareExpression::TemplateInstance(instance) = outcome.bare.bare.bare else {
        panic!("expected a template instance");
    };
    assert_eq!(instance.name, "Foo");
    assert_eq!(instance.arguments.len(), 3);
    assert!(matches!(instance.arguments[0], TemplateArgument::Type(_)));
    assert!(matches!(instance.arguments[1], TemplateArgument::Expression(_)));
    assert!(matches!(instance.arguments[2], TemplateArgument::Expression(_)));
}

#[test]
fn adjacent_string_literals_are_concatenated() {
    let outcome = parse_expression(r#""abc" "def""#, ParseOptions::default());
    assert!(outcome.errors.is_empty());

    let BareExpression::Literal(literal) = outcome.bare.bare.bare else {
        panic!("expected a literal");
    };
    assert_eq!(literal.value(), &LiteralValue::Text("abcdef".into()));
}

#[test]
fn lambda_with_untyped_parameters() {
    let outcome = parse_expression("(a, b) => a + b", ParseOptions::default());
    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);

    let BareExpression::FunctionLiteral(literal) = outcome.bare.bare.bare else {
        panic!("expected a function literal");
    };
    let names: Vec<_> = literal.parameters.iter().filter_map(|parameter| parameter.name.as_deref()).collect();
    assert_eq!(names, ["a", "b"]);
    assert!(matches!(literal.body, FunctionLiteralBody::Expression(_)));
}

#[test]
fn error_cap_stops_parsing() {
    let options = ParseOptions { error_cap: 3, ..ParseOptions::default() };
    let outcome = parse_declarations(") ) ) ) ) ) ) )", options);

    assert_eq!(outcome.errors.len(), 4);
    assert_eq!(outcome.errors.last().map(|error| &error.bare), Some(&BareError::TooManyErrors { cap: 3 }));
}

#[test]
fn module_declaration_and_documentation() {
    let module = parse(
        "\
/// The module.
module std.example;

/// Adds.
int add(int a, int b) { return a + b; }

/// ditto
int sub(int a, int b);

int undocumented;
int trailing; /// Trailing.
",
    );

    assert_eq!(module.name, "std.example");
    assert_eq!(module.root().name, "example");
    assert_eq!(module.root().documentation.as_deref(), Some("The module."));

    let root = module.root;
    assert_eq!(module[member(&module, root, "add")].documentation.as_deref(), Some("Adds."));
    assert_eq!(module[member(&module, root, "sub")].documentation.as_deref(), Some("Adds."));
    assert_eq!(module[member(&module, root, "undocumented")].documentation, None);
    assert_eq!(module[member(&module, root, "trailing")].documentation.as_deref(), Some("Trailing."));
}

#[test]
fn leading_and_trailing_documentation_are_combined() {
    let module = parse("/// Leading.\nint x; /// Trailing.\n");
    let x = member(&module, module.root, "x");
    assert_eq!(module[x].documentation.as_deref(), Some("Leading.\nTrailing."));
}

#[test]
fn structure_only_skips_function_bodies() {
    let source = "void f() { int int int; + + ; }\nint g;";

    let outcome = parse_module(source, ParseOptions { structure_only: true, ..ParseOptions::default() });
    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    let module = outcome.bare;
    let f = member(&module, module.root, "f");
    let body = module[f].method().and_then(|method| method.body.as_ref()).map(|body| &body.bare);
    assert_eq!(body, Some(&BareStatement::Block(Vec::new())));
    member(&module, module.root, "g");

    let outcome = parse_module(source, ParseOptions::default());
    assert!(outcome.has_errors());
}

#[test]
fn conditional_declarations_carry_their_condition() {
    let module = parse(
        "\
version (Windows) {
    int handle;
} else {
    long handle;
}
debug int tracing;
static if (is(int)) int checked;
",
    );

    let children: Vec<_> = module.children(module.root).map(|(_, node)| node).collect();
    assert_eq!(children.len(), 4);

    let windows = CompileCondition::Version("Windows".into());
    assert!(children[0].attributes.iter().any(|attribute| *attribute == Attribute::Condition(windows.clone())));
    assert!(children[1]
        .attributes
        .iter()
        .any(|attribute| *attribute == Attribute::Condition(CompileCondition::Else(Box::new(windows.clone())))));
    assert!(children[2]
        .attributes
        .iter()
        .any(|attribute| *attribute == Attribute::Condition(CompileCondition::Debug(None))));
    assert!(children[3]
        .attributes
        .iter()
        .any(|attribute| matches!(attribute, Attribute::Condition(CompileCondition::StaticIf(_)))));
}

#[test]
fn block_attributes_apply_to_following_declarations() {
    let module = parse(
        "\
private:
int a;
public {
    int b;
}
static int c;
int d;
",
    );

    let root = module.root;
    assert_eq!(module[member(&module, root, "a")].attributes.visibility(), TokenKind::Private);
    assert_eq!(module[member(&module, root, "b")].attributes.visibility(), TokenKind::Public);
    let c = &module[member(&module, root, "c")];
    assert!(c.attributes.is_static());
    assert_eq!(c.attributes.visibility(), TokenKind::Private);
    assert!(!module[member(&module, root, "d")].attributes.is_static());
}

#[test]
fn conflicting_visibilities() {
    let outcome = parse_module("public private int x;", ParseOptions::default());

    assert_eq!(outcome.errors.len(), 1);
    let error = &outcome.errors[0];
    assert!(error.is_semantic());
    assert_eq!(
        error.bare,
        BareError::ConflictingVisibility { previous: TokenKind::Public, current: TokenKind::Private }
    );

    let module = outcome.bare;
    assert_eq!(module[member(&module, module.root, "x")].attributes.visibility(), TokenKind::Private);
}

#[test]
fn declaration_level_if_requires_static() {
    let outcome = parse_module("if (true) int x;", ParseOptions::default());

    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].bare, BareError::MissingStatic(TokenKind::If));
    let module = outcome.bare;
    member(&module, module.root, "x");
}

#[test]
fn module_declaration_after_declarations() {
    let outcome = parse_module("int x;\nmodule late;\n", ParseOptions::default());

    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].bare, BareError::MisplacedModuleDeclaration);
    assert!(outcome.bare.name.is_empty());
}

#[test]
fn aliases() {
    let module = parse(
        "\
alias Text = const(char)[];
alias int Number, Count;
alias Pair(T) = T[2];
struct Wrapper {
    int value;
    alias value this;
}
",
    );

    let root = module.root;
    let text = member(&module, root, "Text");
    assert!(module[text].is_alias());
    assert_eq!(type_of(&module, text), "const(char)[]");
    assert_eq!(type_of(&module, member(&module, root, "Number")), "int");
    assert_eq!(type_of(&module, member(&module, root, "Count")), "int");

    let pair = member(&module, root, "Pair");
    assert!(module[pair].is_alias());

    let wrapper = member(&module, root, "Wrapper");
    let this = member(&module, wrapper, "this");
    assert!(module[this].is_alias());
    assert_eq!(type_of(&module, this), "value");
}

#[test]
fn enums_and_manifest_constants() {
    let module = parse(
        "\
enum Color : ubyte { red, green = 3, blue }
enum { first, second }
enum limit = 10;
",
    );

    let root = module.root;
    let color = member(&module, root, "Color");
    assert!(matches!(module[color].bare, BareNode::Enum(_)));
    assert_eq!(type_of(&module, color), "ubyte");

    let members: Vec<_> = module.children(color).map(|(_, node)| node.name.as_str()).collect();
    assert_eq!(members, ["red", "green", "blue"]);
    let green = member(&module, color, "green");
    assert!(matches!(&module[green].bare, BareNode::EnumMember(member) if member.initializer.is_some()));

    let anonymous = module.children(root).map(|(index, _)| index).nth(1);
    let anonymous = anonymous.unwrap_or_else(|| panic!("missing anonymous enum"));
    assert!(module[anonymous].is_anonymous());
    assert_eq!(module[anonymous].children().len(), 2);

    let limit = &module[member(&module, root, "limit")];
    assert!(limit.attributes.is_manifest_constant());
    assert!(limit.type_.is_none());
}

#[test]
fn imports() {
    let module = parse(
        "\
module app;
import std.stdio, std.string;
public import core.memory : GC, collect = free;
static import io = std.file;
",
    );

    let imports = module.imports();
    assert_eq!(imports.len(), 4);
    assert_eq!(imports[0].module, "std.stdio");
    assert_eq!(imports[1].module, "std.string");

    let memory = &imports[2];
    assert!(memory.is_public);
    assert!(memory.is_selective());
    assert_eq!(memory.bindings[0].name, "GC");
    assert_eq!(memory.bindings[1].name, "free");
    assert_eq!(memory.bindings[1].rename.as_deref(), Some("collect"));
    assert_eq!(memory.to_string(), "public import core.memory : GC, collect = free");

    let file = &imports[3];
    assert!(file.is_static);
    assert_eq!(file.rename.as_deref(), Some("io"));
}

#[test]
fn special_member_functions() {
    let module = parse(
        "\
class Widget : Base, Drawable {
    this(int size) {}
    ~this() {}
    static this() {}
    invariant { assert(true); }
    int size() const @property { return 0; }
}
struct Buffer {
    this(this) {}
}
",
    );

    let root = module.root;
    let widget = member(&module, root, "Widget");
    let class = module[widget].class().unwrap_or_else(|| panic!("expected a class"));
    assert_eq!(class.kind, ClassKind::Class);
    assert_eq!(class.base_classes.len(), 2);

    let kinds: Vec<_> = module
        .children(widget)
        .filter_map(|(_, node)| node.method())
        .map(|method| method.kind)
        .collect();
    assert_eq!(
        kinds,
        [
            MethodKind::Constructor,
            MethodKind::Destructor,
            MethodKind::StaticConstructor,
            MethodKind::Invariant,
            MethodKind::Normal,
        ]
    );

    let size = &module[member(&module, widget, "size")];
    assert!(size.attributes.contains(TokenKind::Const));
    assert!(size.attributes.iter().any(|attribute| *attribute == Attribute::Property("property".into())));

    let buffer = member(&module, root, "Buffer");
    let postblit = module.children(buffer).find_map(|(_, node)| node.method()).map(|method| method.kind);
    assert_eq!(postblit, Some(MethodKind::Postblit));
}

#[test]
fn templated_function_with_constraint() {
    let module = parse("T max(T)(T a, T b) if (is(T : int)) { return a > b ? a : b; }");

    let max = member(&module, module.root, "max");
    let method = module[max].method().unwrap_or_else(|| panic!("expected a method"));
    assert_eq!(method.template_parameters.len(), 1);
    assert_eq!(method.parameters.len(), 2);
    assert!(method.constraint.is_some());
    assert_eq!(module[method.parameters[1]].name, "b");
    assert_eq!(type_of(&module, max), "T");
}

#[test]
fn unittest_bodies_become_module_statements() {
    let module = parse("unittest { int x = 1; assert(x == 1); }");

    let statements = module.root().container().map_or(0, |container| container.statements.len());
    assert_eq!(statements, 1);
    assert_eq!(module.children(module.root).count(), 0);
}

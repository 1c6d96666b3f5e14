use super::*;
use crate::{format::Tree, lookup};
use lexer::token::TokenKind;
use span::{span, Location, Span};

fn empty() -> Span {
    Span::default()
}

fn identifier(name: &str) -> TypeDeclaration {
    TypeDeclaration::identifier(empty(), name)
}

fn basic(kind: TokenKind) -> TypeDeclaration {
    TypeDeclaration::basic(empty(), kind)
}

#[test]
fn display_pointer_to_array_of_const_char() {
    let type_ = basic(TokenKind::Char)
        .wrap(empty(), BareTypeDeclaration::Qualified(TokenKind::Const))
        .wrap(empty(), BareTypeDeclaration::Array(ArrayKind::Dynamic))
        .wrap(empty(), BareTypeDeclaration::Pointer);

    assert_eq!(type_.to_string(), "const(char)[]*");
    assert_eq!(type_.innermost(), &basic(TokenKind::Char));
}

#[test]
fn display_associative_array() {
    let type_ = basic(TokenKind::Int).wrap(
        empty(),
        BareTypeDeclaration::Array(ArrayKind::Associative(Box::new(identifier("string")))),
    );

    assert_eq!(type_.to_string(), "int[string]");
}

#[test]
fn display_function_type() {
    let signature = Signature {
        kind: TokenKind::Function,
        parameters: vec![
            Parameter {
                span: empty(),
                attributes: Vec::new(),
                type_: Some(basic(TokenKind::Int)),
                name: None,
                default: None,
            },
            Parameter {
                span: empty(),
                attributes: vec![TokenKind::Ref],
                type_: Some(basic(TokenKind::Double)),
                name: None,
                default: None,
            },
        ],
        is_variadic: false,
        attributes: Vec::new(),
    };
    let type_ = basic(TokenKind::Void).wrap(empty(), BareTypeDeclaration::Delegate(Box::new(signature)));

    assert_eq!(type_.to_string(), "void function(int, ref double)");
}

#[test]
fn display_qualified_names() {
    let module_scoped = identifier("b")
        .rooted_at(identifier("a"))
        .rooted_at(TypeDeclaration::new(empty(), BareTypeDeclaration::ModuleScope));
    assert_eq!(module_scoped.to_string(), ".a.b");

    let instance = TypeDeclaration::with_inner(
        empty(),
        BareTypeDeclaration::Identifier("Inner".into()),
        TypeDeclaration::new(
            empty(),
            BareTypeDeclaration::TemplateInstance(TemplateInstance {
                name: "Foo".into(),
                arguments: vec![TemplateArgument::Type(basic(TokenKind::Int))],
            }),
        ),
    );
    assert_eq!(instance.to_string(), "Foo!(int).Inner");
    assert!(instance.is_qualified_name());
}

#[test]
fn type_representation_of_member_chain() {
    let expression = Expression::new(
        empty(),
        BareExpression::Member(Box::new(Member {
            base: Expression::identifier(empty(), "std"),
            name: "stdio".into(),
            name_span: empty(),
            arguments: None,
        })),
    );

    let representation = expression.type_representation().unwrap();
    assert_eq!(representation.to_string(), "std.stdio");
    assert_eq!(representation.innermost().name(), Some("std"));
}

#[test]
fn type_representation_of_string_literal() {
    let literal = lexer::token::Literal::new(
        lexer::token::LiteralFormat::String,
        lexer::token::LiteralSubformat::empty(),
        lexer::token::LiteralValue::Text("x".into()),
    );
    let expression = Expression::new(empty(), BareExpression::Literal(LiteralExpression::new("\"x\"", literal)));

    assert_eq!(expression.type_representation().unwrap().to_string(), "immutable(char)[]");
}

#[test]
fn calls_have_no_type_representation() {
    let expression = Expression::new(
        empty(),
        BareExpression::Call(Box::new(Call { callee: Expression::identifier(empty(), "f"), arguments: Vec::new() })),
    );

    assert_eq!(expression.type_representation(), None);
}

#[test]
fn visibility_defaults_to_public() {
    let mut attributes = Attributes::default();
    assert_eq!(attributes.visibility(), TokenKind::Public);

    attributes.push(Attribute::Keyword(TokenKind::Static));
    attributes.push(Attribute::Keyword(TokenKind::Private));
    attributes.push(Attribute::Keyword(TokenKind::Static));
    assert_eq!(attributes.visibility(), TokenKind::Private);
    assert_eq!(attributes.0.len(), 2);
}

/// ```d
/// class C {
///     void f(int p) {
///         int a;
///         {
///             int b;
///             <caret>
///         }
///         int c;
///     }
/// }
/// ```
fn sample() -> (Module, NodeIndex, NodeIndex) {
    let mut module = Module::new("sample");

    let mut class = Node::new("C", span(1, 7, 1, 8), BareNode::Class(Box::new(Class::new(ClassKind::Class))));
    class.span = span(1, 1, 10, 2);
    let class = module.add(module.root, class);

    let mut method = Node::new("f", span(2, 10, 2, 11), BareNode::Method(Box::new(Method::new(MethodKind::Normal))));
    method.span = span(2, 5, 9, 6);
    let method = module.add(class, method);

    let parameter = module.add_detached(method, Node::new("p", span(2, 16, 2, 17), BareNode::Variable(default())));
    let a = module.add_detached(method, Node::new("a", span(3, 13, 3, 14), BareNode::Variable(default())));
    let b = module.add_detached(method, Node::new("b", span(5, 17, 5, 18), BareNode::Variable(default())));
    let c = module.add_detached(method, Node::new("c", span(8, 13, 8, 14), BareNode::Variable(default())));

    let declaration = |indices: Vec<NodeIndex>, span| Statement::new(span, BareStatement::Declaration(indices));
    let body = Statement::new(
        span(2, 19, 9, 6),
        BareStatement::Block(vec![
            declaration(vec![a], span(3, 9, 3, 15)),
            Statement::new(span(4, 9, 7, 10), BareStatement::Block(vec![declaration(vec![b], span(5, 13, 5, 19))])),
            declaration(vec![c], span(8, 9, 8, 15)),
        ]),
    );

    let BareNode::Method(bare) = &mut module[method].bare else { unreachable!() };
    bare.parameters.push(parameter);
    bare.body = Some(body);

    (module, class, method)
}

fn default<T: Default>() -> T {
    T::default()
}

#[test]
fn innermost_scope_is_the_method() {
    let (module, _, method) = sample();

    assert_eq!(lookup::innermost_scope(&module, Location::new(6, 13)), method);
    assert_eq!(lookup::innermost_scope(&module, Location::new(11, 1)), module.root);
}

#[test]
fn locals_declared_before_the_caret() {
    let (module, _, method) = sample();

    let names: Vec<_> = lookup::visible_locals(&module, method, Location::new(6, 13))
        .into_iter()
        .map(|local| module[local].name.as_str())
        .collect();

    assert_eq!(names, ["b", "a", "p"]);
}

#[test]
fn statement_path_ends_in_the_inner_block() {
    let (module, _, method) = sample();

    let path = lookup::statement_path(&module, method, Location::new(6, 13));
    assert_eq!(path.len(), 2);
    assert_eq!(path[1].span, span(4, 9, 7, 10));
}

#[test]
fn node_paths_and_outline() {
    let (module, class, method) = sample();

    assert_eq!(module.path(method), "sample.C.f");
    assert_eq!(module.ancestors(method).collect::<Vec<_>>(), [method, class, module.root]);
    assert_eq!(
        Tree(&module).to_string(),
        "module sample\n    class C\n        method f(p)\n"
    );
}

#[test]
fn render_dumps_the_tree() {
    let (module, _, _) = sample();

    let dump = utility::paint::paint_to_string(
        |painter| module.render(render::Indent::default(), painter),
        utility::paint::ColorChoice::Never,
    )
    .unwrap();

    assert!(dump.contains("Module"), "{dump}");
    assert!(dump.contains("name: ‘C’"), "{dump}");
    assert!(dump.contains("name: ‘p’"), "{dump}");
    assert!(!dump.contains("name: ‘a’"), "locals are not members: {dump}");
}

#[test]
fn module_root_is_named_after_the_last_segment() {
    let mut module = Module::new("");
    module.set_name("std.container.array");

    assert_eq!(module.name, "std.container.array");
    assert_eq!(module.root().name, "array");

    module.set_name("main");
    assert_eq!(module.root().name, "main");
}

use super::*;
use ast::Module;
use diagnostics::Reporter;
use lexer::token::TokenKind;
use parser::{parse_expression, parse_module, parse_type, ParseOptions};
use span::Location;
use utility::HashMap;

fn parse(source: &str) -> Module {
    let outcome = parse_module(source, ParseOptions::default());
    assert!(outcome.errors.is_empty(), "unexpected errors: {:?}", outcome.errors);
    outcome.bare
}

fn cache(sources: &[&str]) -> HashMap<String, Module> {
    sources
        .iter()
        .map(|source| parse(source))
        .map(|module| (module.name.clone(), module))
        .collect()
}

fn identifier<'a>(context: &mut ResolutionContext<'a>, name: &str) -> Vec<ResolveResult<'a>> {
    resolve_identifier(context, name, Span::default())
}

fn expression<'a>(context: &mut ResolutionContext<'a>, source: &str) -> Vec<ResolveResult<'a>> {
    let outcome = parse_expression(source, ParseOptions::default());
    assert!(outcome.errors.is_empty(), "unexpected errors: {:?}", outcome.errors);
    resolve_expression(context, &outcome.bare.bare)
}

fn type_of(result: &ResolveResult<'_>) -> String {
    result.type_().map(ToString::to_string).unwrap_or_default()
}

fn array(element: ResolveResult<'static>) -> ResolveResult<'static> {
    ResolveResult::with_base(BareResult::Array { size: None }, element)
}

fn constant(inner: ResolveResult<'static>) -> ResolveResult<'static> {
    ResolveResult::with_base(BareResult::Qualified(TokenKind::Const), inner)
}

fn converts(candidate: &ResolveResult<'_>, target: &ResolveResult<'_>) -> bool {
    is_implicitly_convertible(candidate, target, &mut Deduction::default())
}

#[test]
fn alias_chains_resolve_to_their_target() {
    let module = parse(
        "\
alias int A;
alias A B;
alias B C;
",
    );
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    let results = identifier(&mut context, "C");
    assert_eq!(results.len(), 1);
    assert!(is_equal(&results[0], &ResolveResult::basic(TokenKind::Int)));
    assert!(context.errors().is_empty(), "{:?}", context.errors());
}

#[test]
fn unresolved_aliases_are_kept() {
    let module = parse("alias int A;\nalias A B;\n");
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter)
        .with_options(ResolveOptions { resolve_aliases: false, ..ResolveOptions::default() });

    let results = identifier(&mut context, "B");
    assert_eq!(results.len(), 1);
    assert!(matches!(&results[0].bare, BareResult::Member(alias) if alias.node().name == "B"));
}

#[test]
fn classes_inheriting_from_themselves_have_no_base() {
    let module = parse("class A : A {}\n");
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    let results = identifier(&mut context, "A");
    assert_eq!(results.len(), 1);
    assert!(matches!(&results[0].bare, BareResult::Type { .. }));
    assert!(results[0].base().is_none());
}

#[test]
fn classes_derive_from_object() {
    let modules = cache(&["module object;\nclass Object {}\n"]);
    let module = parse("module main;\nclass Thing {}\n");
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    let results = identifier(&mut context, "Thing");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].base().map(ToString::to_string).as_deref(), Some("object.Object"));
}

#[test]
fn members_are_inherited() {
    let module = parse(
        "\
class Animal { int legs; }
class Dog : Animal {}
Dog dog;
",
    );
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    let results = expression(&mut context, "dog.legs");
    assert_eq!(results.len(), 1);
    assert_eq!(type_of(&results[0]), "int");
}

#[test]
fn locals_are_visible_after_their_declaration() {
    let module = parse(
        "\
void main() {
    int before;

    int after;
}
",
    );
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::new(3, 5), &modules, &reporter);

    let results = identifier(&mut context, "before");
    assert_eq!(results.len(), 1);
    assert_eq!(type_of(&results[0]), "int");

    assert!(identifier(&mut context, "after").is_empty());
    assert!(matches!(
        context.errors(),
        [ResolutionError::NotFound { name, .. }] if name == "after"
    ));
}

#[test]
fn parameters_are_visible_in_the_body() {
    let module = parse(
        "\
double scale(double factor) {
    return factor;
}
",
    );
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::new(2, 5), &modules, &reporter);

    let results = identifier(&mut context, "factor");
    assert_eq!(results.len(), 1);
    assert_eq!(type_of(&results[0]), "double");
}

#[test]
fn public_imports_are_transitive_but_private_ones_are_not() {
    let modules = cache(&[
        "module a;\nint fromA;\nprivate int hidden;\n",
        "module b;\npublic import a;\nint fromB;\n",
        "module c;\nimport b;\nint fromC;\n",
    ]);
    let reporter = Reporter::silent();

    let importing_b = parse("module main;\nimport b;\n");
    let mut context = ResolutionContext::new(&importing_b, Location::new(3, 1), &modules, &reporter);
    assert_eq!(identifier(&mut context, "fromB").len(), 1);
    assert_eq!(identifier(&mut context, "fromA").len(), 1);
    assert!(identifier(&mut context, "hidden").is_empty());

    let importing_c = parse("module main;\nimport c;\n");
    let mut context = ResolutionContext::new(&importing_c, Location::new(3, 1), &modules, &reporter);
    assert_eq!(identifier(&mut context, "fromC").len(), 1);
    assert!(identifier(&mut context, "fromB").is_empty());
    assert!(identifier(&mut context, "fromA").is_empty());
}

#[test]
fn declarations_from_several_modules_are_ambiguous() {
    let modules = cache(&["module x;\nint common;\n", "module y;\nint common;\n"]);
    let module = parse("module main;\nimport x;\nimport y;\n");
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::new(4, 1), &modules, &reporter);

    assert_eq!(identifier(&mut context, "common").len(), 2);
    assert!(matches!(
        context.errors(),
        [ResolutionError::Ambiguous { name, candidates, .. }] if name == "common" && candidates.len() == 2
    ));
}

#[test]
fn undefined_identifiers_come_with_a_suggestion() {
    let module = parse("int counter;\n");
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    assert!(identifier(&mut context, "countr").is_empty());
    let errors = context.take_errors();
    assert_eq!(
        errors,
        [ResolutionError::NotFound { name: "countr".into(), span: Span::default(), suggestion: Some("counter".into()) }]
    );
    assert!(context.errors().is_empty());

    let formatted = errors[0].clone().into_diagnostic().format(None);
    assert!(formatted.contains("the identifier ‘countr’ is not defined in this scope"), "{formatted}");
    assert!(formatted.contains("a declaration with a similar name exists in scope"), "{formatted}");
}

#[test]
fn properties_of_basic_types_and_arrays() {
    let module = parse("int limit;\nint[] numbers;\n");
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    let results = expression(&mut context, "limit.max");
    assert_eq!(results.len(), 1);
    assert_eq!(type_of(&results[0]), "int");

    let results = expression(&mut context, "numbers.length");
    assert_eq!(results.len(), 1);
    assert_eq!(type_of(&results[0]), "ulong");

    let results = expression(&mut context, "numbers.ptr");
    assert_eq!(results.len(), 1);
    assert_eq!(type_of(&results[0]), "int*");

    assert!(expression(&mut context, "limit.length").is_empty());
}

#[test]
fn members_are_reached_through_their_base() {
    let module = parse("struct S { int x; }\nS s;\n");
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    let results = expression(&mut context, "s.x");
    assert_eq!(results.len(), 1);
    assert_eq!(type_of(&results[0]), "int");

    let through = results[0].result_base().expect("members have a result base");
    assert!(matches!(&through.bare, BareResult::Member(variable) if variable.node().name == "s"));
    assert_eq!(results[0].resolution_chain().count(), 2);
    assert!(through.result_base().is_none());
}

#[test]
fn init_carries_the_initializer_of_variables() {
    let module = parse("struct S { int x; }\nint limit = 42;\nS s;\n");
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    let results = expression(&mut context, "limit.init");
    assert_eq!(results.len(), 1);
    assert_eq!(type_of(&results[0]), "int");
    assert!(matches!(
        &results[0].bare,
        BareResult::Property { name: "init", value: Some(value) } if value.to_string() == "42"
    ));
    assert!(results[0].to_string().starts_with(".init = 42"));
    assert!(matches!(&results[0].result_base().unwrap().bare, BareResult::Member(variable) if variable.node().name == "limit"));

    // without an initializer the default value of the type is meant
    let results = expression(&mut context, "s.init");
    assert_eq!(results.len(), 1);
    assert!(matches!(&results[0].bare, BareResult::Property { name: "init", value: None }));
    assert!(results[0].to_string().starts_with(".init: "));
}

#[test]
fn mangleof_and_stringof_are_strings() {
    let module = parse("struct S { int x; }\nint limit;\n");
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    for source in ["limit.mangleof", "limit.stringof", "S.mangleof", "S.stringof"] {
        let results = expression(&mut context, source);
        assert_eq!(results.len(), 1, "{source}");
        assert_eq!(type_of(&results[0]), "immutable(char)[]", "{source}");
        assert!(matches!(&results[0].bare, BareResult::Property { value: None, .. }), "{source}");
    }

    let results = expression(&mut context, "S.sizeof");
    assert_eq!(type_of(&results[0]), "ulong");
}

#[test]
fn resolved_types_are_cached_per_block() {
    let module = parse(
        "\
void main() {
    {
        int first;
    }
    {
        int second;
    }
}
",
    );
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::new(3, 5), &modules, &reporter);
    let type_ = parse_type("int", ParseOptions::default()).bare.bare;
    let first = context.scope();
    let second = Scope::new(first.declaration, Some(Location::new(6, 5)));

    context.resolve_type_declaration(&type_, first, Depth::default());
    assert_eq!(context.cache_statistics(), (0, 1));

    let results = context.resolve_type_declaration(&type_, first, Depth::default());
    assert_eq!(context.cache_statistics(), (1, 1));
    assert_eq!(type_of(&results[0]), "int");

    context.resolve_type_declaration(&type_, second, Depth::default());
    assert_eq!(context.cache_statistics(), (1, 2));
}

#[test]
fn members_of_anonymous_enums_are_hoisted() {
    let module = parse("enum { first, second }\n");
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    let results = identifier(&mut context, "second");
    assert_eq!(results.len(), 1);
    assert_eq!(type_of(&results[0]), "int");
}

#[test]
fn template_arguments_are_substituted_into_members() {
    let module = parse(
        "\
struct Box(T) { T value; }
Box!int boxed;
",
    );
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    let results = expression(&mut context, "boxed");
    assert_eq!(results.len(), 1);
    assert_eq!(type_of(&results[0]), "Box!(int)");

    let results = expression(&mut context, "boxed.value");
    assert_eq!(results.len(), 1);
    assert_eq!(type_of(&results[0]), "int");
}

#[test]
fn missing_template_arguments_fail_deduction() {
    let module = parse(
        "\
struct Pair(K, V) { K key; V value; }
Pair!int half;
",
    );
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    expression(&mut context, "half");
    assert!(context.errors().iter().any(|error| matches!(error, ResolutionError::DeductionFailed { template, .. } if template == "Pair")));
}

#[test]
fn numeric_conversions_widen() {
    let int = ResolveResult::basic(TokenKind::Int);
    let long = ResolveResult::basic(TokenKind::Long);
    let double = ResolveResult::basic(TokenKind::Double);

    assert!(converts(&int, &long));
    assert!(converts(&int, &double));
    assert!(!converts(&long, &int));
    assert!(!converts(&double, &int));
}

#[test]
fn null_converts_to_references() {
    let null = ResolveResult::basic(TokenKind::Null);
    let pointer = ResolveResult::with_base(BareResult::Pointer, ResolveResult::basic(TokenKind::Int));

    assert!(converts(&null, &pointer));
    assert!(converts(&null, &array(ResolveResult::basic(TokenKind::Char))));
    assert!(!converts(&null, &ResolveResult::basic(TokenKind::Int)));
}

#[test]
fn pointers_convert_to_void_pointers() {
    let pointer = ResolveResult::with_base(BareResult::Pointer, ResolveResult::basic(TokenKind::Int));
    let void = ResolveResult::with_base(BareResult::Pointer, ResolveResult::basic(TokenKind::Void));

    assert!(converts(&pointer, &void));
    assert!(!converts(&void, &pointer));
}

#[test]
fn array_elements_may_gain_const() {
    let mutable = array(ResolveResult::basic(TokenKind::Int));
    let immutable = array(constant(ResolveResult::basic(TokenKind::Int)));

    assert!(converts(&mutable, &immutable));
    assert!(!converts(&immutable, &mutable));
    assert!(!converts(&mutable, &array(ResolveResult::basic(TokenKind::Long))));
}

#[test]
fn classes_convert_to_their_bases() {
    let module = parse("class Animal {}\nclass Dog : Animal {}\n");
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    let animal = identifier(&mut context, "Animal").remove(0);
    let dog = identifier(&mut context, "Dog").remove(0);

    assert!(converts(&dog, &animal));
    assert!(!converts(&animal, &dog));
    assert!(!is_equal(&dog, &animal));
}

#[test]
fn recursion_through_aliases_is_bounded() {
    let module = parse("alias B A;\nalias A B;\n");
    let modules = cache(&[]);
    let reporter = Reporter::silent();
    let mut context = ResolutionContext::new(&module, Location::START, &modules, &reporter);

    let results = identifier(&mut context, "A");
    assert!(!results.is_empty());
    assert!(context.errors().iter().any(|error| matches!(error, ResolutionError::RecursionLimit { .. })));
}

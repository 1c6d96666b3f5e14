use crate::{
    cli::unstable::UnstableOption,
    expression_before,
    loader::{module_name, ParseCache},
};
use parser::ParseOptions;
use span::{span, Location, Span};
use std::{fs, path::PathBuf};

fn expression_at(source: &str, line: u32, column: u32) -> Option<Span> {
    expression_before(source, Location::new(line, column))
}

/// A fresh folder below the temporary directory of the system.
fn scratch_folder(name: &str) -> PathBuf {
    let folder = std::env::temp_dir().join(format!("dfront-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&folder);
    fs::create_dir_all(&folder).unwrap();
    folder
}

#[test]
fn module_name_from_relative_path() {
    let roots = [PathBuf::from("/src")];

    assert_eq!(module_name(&PathBuf::from("/src/std/stdio.d"), &roots), Some("std.stdio".to_owned()));
    assert_eq!(module_name(&PathBuf::from("/src/main.d"), &roots), Some("main".to_owned()));
    assert_eq!(module_name(&PathBuf::from("/src/core/sync.di"), &roots), Some("core.sync".to_owned()));
}

#[test]
fn package_module_is_named_after_its_folder() {
    let roots = [PathBuf::from("/src")];

    assert_eq!(module_name(&PathBuf::from("/src/std/package.d"), &roots), Some("std".to_owned()));
    assert_eq!(module_name(&PathBuf::from("/src/package.d"), &roots), None);
}

#[test]
fn module_name_outside_of_roots_or_invalid() {
    let roots = [PathBuf::from("/src"), PathBuf::from("/import")];

    assert_eq!(module_name(&PathBuf::from("/elsewhere/a.d"), &roots), None);
    assert_eq!(module_name(&PathBuf::from("/src/my-module.d"), &roots), None);
    assert_eq!(module_name(&PathBuf::from("/src/2d/shape.d"), &roots), None);
    assert_eq!(module_name(&PathBuf::from("/import/a/b.d"), &roots), Some("a.b".to_owned()));
}

#[test]
fn unstable_options_parse_by_syntax() {
    assert_eq!("timing".parse::<UnstableOption>(), Ok(UnstableOption::Timing));
    assert_eq!("emit-comments".parse::<UnstableOption>(), Ok(UnstableOption::EmitComments));
    assert_eq!("trace".parse::<UnstableOption>(), Ok(UnstableOption::Trace));
    assert_eq!("emit_comments".parse::<UnstableOption>(), Err(()));
    assert_eq!("".parse::<UnstableOption>(), Err(()));
}

#[test]
fn unstable_option_syntax_is_unique() {
    for option in UnstableOption::ELEMENTS {
        assert_eq!(option.syntax().parse::<UnstableOption>(), Ok(option));
    }
}

#[test]
fn expression_before_caret_identifier() {
    let source = "void f() {\n    counter\n}\n";

    assert_eq!(expression_at(source, 2, 12), Some(span(2, 5, 2, 12)));
    // inside of the identifier
    assert_eq!(expression_at(source, 2, 8), Some(span(2, 5, 2, 12)));
}

#[test]
fn expression_before_caret_member_chain() {
    let source = "void f() {\n    this.dog.legs;\n}\n";

    assert_eq!(expression_at(source, 2, 18), Some(span(2, 5, 2, 18)));
}

#[test]
fn expression_before_caret_trailing_dot() {
    let source = "void f() {\n    dog.\n}\n";

    assert_eq!(expression_at(source, 2, 9), Some(span(2, 5, 2, 8)));
}

#[test]
fn expression_before_caret_calls_and_indexing() {
    let source = "auto x = list[0].first(1, 2).name;\n";

    assert_eq!(expression_at(source, 1, 34), Some(span(1, 10, 1, 34)));
}

#[test]
fn expression_before_caret_template_instance() {
    let source = "auto x = Box!(int).value;\n";

    assert_eq!(expression_at(source, 1, 25), Some(span(1, 10, 1, 25)));
}

#[test]
fn expression_before_caret_stops_at_operators() {
    let source = "auto x = a + b.c;\n";

    assert_eq!(expression_at(source, 1, 17), Some(span(1, 14, 1, 17)));
}

#[test]
fn no_expression_before_caret() {
    assert_eq!(expression_at("", 1, 1), None);
    assert_eq!(expression_at("auto x = 1 + ;\n", 1, 15), None);
}

#[test]
fn parse_cache_finds_modules_below_roots() {
    let root = scratch_folder("path-of");
    fs::create_dir_all(root.join("std/container")).unwrap();
    fs::write(root.join("std/stdio.d"), "module std.stdio;\n").unwrap();
    fs::write(root.join("std/math.di"), "module std.math;\n").unwrap();
    fs::write(root.join("std/container/package.d"), "module std.container;\n").unwrap();

    let cache = ParseCache::new(vec![root.clone()], ParseOptions::default());

    assert_eq!(cache.path_of("std.stdio"), Some(root.join("std/stdio.d")));
    assert_eq!(cache.path_of("std.math"), Some(root.join("std/math.di")));
    assert_eq!(cache.path_of("std.container"), Some(root.join("std/container/package.d")));
    assert_eq!(cache.path_of("std.missing"), None);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn parse_cache_loads_public_imports_transitively() {
    use diagnostics::Reporter;
    use resolver::ModuleCache;
    use span::SourceMap;
    use std::sync::{Arc, RwLock};

    let root = scratch_folder("load-imports");
    fs::write(root.join("a.d"), "module a;\npublic import b;\nimport c;\n").unwrap();
    fs::write(root.join("b.d"), "module b;\nint fromB;\n").unwrap();
    fs::write(root.join("c.d"), "module c;\nint fromC;\n").unwrap();

    let module = parser::parse_module("module main;\nimport a;\n", ParseOptions::default()).bare;
    let map: Arc<RwLock<SourceMap>> = Arc::default();
    let mut cache = ParseCache::new(vec![root.clone()], ParseOptions::default());

    let missing = cache.load_imports(&module, &map, &Reporter::silent());

    assert!(cache.module("a").is_some());
    assert!(cache.module("b").is_some());
    // private imports of imported modules are not visible
    assert!(cache.module("c").is_none());
    assert_eq!(missing, vec!["object".to_owned()]);

    let _ = fs::remove_dir_all(&root);
}

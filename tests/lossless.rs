//! Parse/print and strip behaviour over the Python fixtures

mod common;

use common::fixtures::{discover_fixtures, load_fixture};
use docsmith_ast::ToSource;
use docsmith_docstring::{locate, strip_source, validate};
use docsmith_parser::parse;
use std::fs;

#[test]
fn all_fixtures_round_trip_byte_for_byte() {
    let fixtures = discover_fixtures();
    assert!(!fixtures.is_empty(), "No fixtures found in tests/fixtures/");

    let mut failures = Vec::new();
    for path in &fixtures {
        let source = fs::read_to_string(path).unwrap();
        match parse(&source) {
            Ok(tree) if tree.to_source() == source => {}
            Ok(tree) => failures.push(format!("{}: printed text differs\n{}", path.display(), tree.to_source())),
            Err(e) => failures.push(format!("{}: {e}", path.display())),
        }
    }

    assert!(failures.is_empty(), "Round-trip failures:\n{}", failures.join("\n"));
}

#[test]
fn stripping_only_touches_docstrings() {
    for path in discover_fixtures() {
        let source = fs::read_to_string(&path).unwrap();
        let stripped = strip_source(&source).unwrap();

        assert!(
            validate(&source, &stripped).unwrap(),
            "{}: stripping changed code",
            path.display()
        );
        assert_eq!(strip_source(&stripped).unwrap(), stripped, "{}: strip is not idempotent", path.display());

        let tree = parse(&stripped).unwrap();
        assert!(
            locate(&tree).iter().all(|site| !site.has_documentation),
            "{}: docstring survived stripping",
            path.display()
        );
    }
}

#[test]
fn crlf_and_tabs_survive_stripping() {
    let source = load_fixture("crlf_tabs.py");
    assert_eq!(strip_source(&source).unwrap(), source);
    assert!(!source.ends_with('\n'));
}

#[test]
fn module_docstring_removal_keeps_header_comments() {
    let stripped = strip_source(&load_fixture("shapes.py")).unwrap();
    assert!(stripped.starts_with("#!/usr/bin/env python3\n# -*- coding: utf-8 -*-\n\nimport math\n"));
    assert!(!stripped.contains("A closed shape."));
}

#[test]
fn fixtures_locate_in_source_order() {
    let tree = parse(&load_fixture("nested.py")).unwrap();
    let names: Vec<_> = locate(&tree).into_iter().map(|site| site.name).collect();
    assert_eq!(names, ["outer", "inner", "Local", "method", "Outer", "Inner", "deep", "in_loop"]);
}

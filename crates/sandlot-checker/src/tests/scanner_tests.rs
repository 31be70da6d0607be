use crate::scanner::{LiteralKind, scan};

fn specifiers(source: &str) -> Vec<String> {
    scan(source).imports.into_iter().map(|i| i.specifier).collect()
}

#[test]
fn scans_static_import_forms() {
    let source = r#"
import React from 'react';
import { useState, useEffect } from "react";
import * as ns from "./ns";
import "./side-effect.css";
"#;
    assert_eq!(
        specifiers(source),
        vec!["react", "react", "./ns", "./side-effect.css"]
    );
}

#[test]
fn scans_export_from_and_dynamic_forms() {
    let source = r#"
export * from "./a";
export { b } from './b';
const mod = await import("./lazy");
const legacy = require("./legacy");
export const unrelated = 1;
"#;
    assert_eq!(specifiers(source), vec!["./a", "./b", "./lazy", "./legacy"]);
}

#[test]
fn marks_type_only_imports() {
    let source = r#"
import type { Props } from "./types";
import { value } from "./value";
export type { Shape } from "./shape";
"#;
    let imports = scan(source).imports;
    assert_eq!(imports.len(), 3);
    assert!(imports[0].type_only);
    assert!(!imports[1].type_only);
    assert!(imports[2].type_only);
}

#[test]
fn ignores_specifiers_inside_comments_and_strings() {
    let source = r#"
// import hidden from "./comment";
/* import hidden from "./block"; */
const s = 'import fake from "./string"';
const t = `import fake from "./template" ${x}`;
import real from "./real";
"#;
    assert_eq!(specifiers(source), vec!["./real"]);
}

#[test]
fn template_substitutions_do_not_swallow_code() {
    let source = "const a = `prefix ${call({ deep: `${inner}` })} suffix`;\nimport x from \"./after\";\n";
    assert_eq!(specifiers(source), vec!["./after"]);
}

#[test]
fn regex_literals_do_not_start_comments() {
    let source = "const re = /\\/*[\"']/g;\nimport x from \"./after-regex\";\n";
    assert_eq!(specifiers(source), vec!["./after-regex"]);
}

#[test]
fn division_is_not_a_regex() {
    let source = "const half = total / 2; const quarter = half / 2;\nimport x from \"./math\";\n";
    assert_eq!(specifiers(source), vec!["./math"]);
}

#[test]
fn import_positions_point_at_the_specifier() {
    let source = "import { a } from \"./a\";";
    let imports = scan(source).imports;
    assert_eq!(imports[0].offset as usize, source.find("\"./a\"").unwrap());
}

#[test]
fn collects_literal_annotated_declarations() {
    let source = "const n: number = \"s\";\nlet ok: string = \"fine\";\nvar b: boolean = 4;\n";
    let decls = scan(source).decls;
    assert_eq!(decls.len(), 3);
    assert_eq!(decls[0].name, "n");
    assert_eq!(decls[0].type_name, "number");
    assert_eq!(decls[0].literal, LiteralKind::Str);
    assert_eq!(decls[1].literal, LiteralKind::Str);
    assert_eq!(decls[2].literal, LiteralKind::Num);
}

#[test]
fn skips_declarations_with_complex_initializers() {
    let source = "const n: number = \"s\".length;\nconst m: number = compute();\nconst o: CustomType = \"x\";\n";
    let decls = scan(source).decls;
    assert!(decls.is_empty());
}

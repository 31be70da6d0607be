use crate::strip::strip_types;

fn strip(source: &str) -> String {
    strip_types(source, Some("/test.ts")).code
}

/// Collapse blanked-out runs so assertions read naturally.
fn squash(code: &str) -> String {
    let mut out = String::new();
    let mut in_space = false;
    for c in code.chars() {
        if c == ' ' || c == '\t' {
            in_space = true;
            continue;
        }
        if in_space && !out.is_empty() && !out.ends_with('\n') && c != '\n' {
            out.push(' ');
        }
        in_space = false;
        out.push(c);
    }
    out
}

#[test]
fn stripping_preserves_length_and_lines() {
    let source = "const n: number = 1;\nconst s: string = \"x\";\n";
    let stripped = strip(source);
    assert_eq!(stripped.len(), source.len());
    assert_eq!(stripped.lines().count(), source.lines().count());
}

#[test]
fn removes_variable_annotations() {
    assert_eq!(squash(&strip("const n: number = 1;")), "const n = 1;");
    assert_eq!(
        squash(&strip("let items: Array<string> = [];")),
        "let items = [];"
    );
    assert_eq!(
        squash(&strip("const cb: (x: number) => void = f;")),
        "const cb = f;"
    );
}

#[test]
fn removes_function_signatures() {
    let source = "function add(a: number, b: number): number {\n  return a + b;\n}\n";
    assert_eq!(
        squash(&strip(source)),
        "function add(a , b ) {\nreturn a + b;\n}\n"
    );
}

#[test]
fn removes_optional_parameter_markers() {
    assert_eq!(
        squash(&strip("function f(size?: number) { return size; }")),
        "function f(size ) { return size; }"
    );
}

#[test]
fn removes_annotations_on_destructured_parameters() {
    let out = squash(&strip(
        "function C({ title, count }: Props) {\n  return title;\n}\n",
    ));
    assert!(out.contains("function C({ title, count } ) {"));
    assert!(!out.contains("Props"));

    let arr = squash(&strip("function pair([a, b]: Pair) { return a + b; }"));
    assert_eq!(arr, "function pair([a, b] ) { return a + b; }");
}

#[test]
fn labeled_statements_are_not_annotations() {
    let source = "outer: for (const x of xs) {\n  break outer;\n}\n";
    let out = squash(&strip(source));
    assert!(out.contains("outer: for (const x of xs) {"));
    assert!(out.contains("break outer;"));
}

#[test]
fn keeps_object_literals_intact() {
    let source = "const point = { x: 1, y: 2 };";
    assert_eq!(squash(&strip(source)), source);
}

#[test]
fn keeps_ternaries_intact() {
    let source = "const v = cond ? a : b;";
    assert_eq!(squash(&strip(source)), source);
    let nested = "const v = a ? b ? c : d : e;";
    assert_eq!(squash(&strip(nested)), nested);
}

#[test]
fn removes_interface_and_type_alias_statements() {
    let source = "export interface Props {\n  name: string;\n}\ntype Id = string | number;\nconst x = 1;\n";
    let out = squash(&strip(source));
    assert!(!out.contains("interface"));
    assert!(!out.contains("Id"));
    assert!(out.contains("const x = 1;"));
}

#[test]
fn removes_declare_statements() {
    let source = "declare const g: number;\nconst real = 2;\n";
    let out = squash(&strip(source));
    assert!(!out.contains("declare"));
    assert!(out.contains("const real = 2;"));
}

#[test]
fn removes_import_type_and_export_type() {
    let source = "import type { A } from \"./a\";\nimport { b } from \"./b\";\nexport type { A };\n";
    let out = squash(&strip(source));
    assert!(!out.contains("./a"));
    assert!(out.contains("import { b } from \"./b\";"));
    assert!(!out.contains("export type"));
}

#[test]
fn removes_as_casts_but_not_import_aliases() {
    let out = squash(&strip("const el = node as HTMLElement;\nimport * as ns from \"./m\";\n"));
    assert!(out.contains("const el = node ;"));
    assert!(out.contains("import * as ns from \"./m\";"));
}

#[test]
fn removes_satisfies_clauses() {
    let out = squash(&strip("const cfg = { a: 1 } satisfies Config;"));
    assert_eq!(out, "const cfg = { a: 1 } ;");
}

#[test]
fn removes_generics_from_declarations_and_calls() {
    let out = squash(&strip("function id<T>(x: T): T { return x; }\nconst s = new Set<string>();"));
    assert!(out.contains("function id (x ) { return x; }"));
    assert!(out.contains("const s = new Set ();"));
}

#[test]
fn keeps_comparison_chains() {
    let source = "const ok = a < b && c > d;";
    assert_eq!(squash(&strip(source)), source);
}

#[test]
fn removes_heritage_clauses() {
    let out = squash(&strip(
        "class Store extends Base<State> implements Resettable {\n  reset(): void {}\n}",
    ));
    assert!(out.contains("class Store extends Base {"));
    assert!(!out.contains("implements"));
    assert!(out.contains("reset() {}"));
}

#[test]
fn removes_non_null_assertions() {
    let out = squash(&strip("const v = map.get(key)!;\nconst n = a!.b;"));
    assert!(out.contains("const v = map.get(key) ;"));
    assert!(out.contains("const n = a .b;"));
}

#[test]
fn inequality_survives() {
    let source = "if (a != b) { run(); }";
    assert_eq!(squash(&strip(source)), source);
}

#[test]
fn enum_produces_a_warning() {
    let result = strip_types("enum Direction { Up, Down }\n", Some("/e.ts"));
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].text.contains("enum"));
    assert_eq!(result.warnings[0].file.as_deref(), Some("/e.ts"));
}

#[test]
fn accessibility_modifiers_are_removed() {
    let out = squash(&strip(
        "class A {\n  private count = 0;\n  readonly tag = \"a\";\n}",
    ));
    assert!(out.contains("count = 0;"));
    assert!(!out.contains("private"));
    assert!(!out.contains("readonly"));
}

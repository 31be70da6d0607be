use crate::jsx::transform_jsx;

fn lower(source: &str) -> String {
    transform_jsx(source).code
}

#[test]
fn lowers_a_simple_element() {
    let out = lower("const el = <div className=\"box\">hello</div>;");
    assert_eq!(
        out,
        "const el = _jsx(\"div\", { className: \"box\", children: \"hello\" });"
    );
}

#[test]
fn lowers_self_closing_and_boolean_attrs() {
    let out = lower("const el = <input disabled type=\"text\" />;");
    assert_eq!(
        out,
        "const el = _jsx(\"input\", { disabled: true, type: \"text\" });"
    );
}

#[test]
fn components_stay_identifiers() {
    let out = lower("const el = <App theme={theme} />;");
    assert_eq!(out, "const el = _jsx(App, { theme: theme });");
    let member = lower("const el = <UI.Button />;");
    assert_eq!(member, "const el = _jsx(UI.Button, {  });");
}

#[test]
fn multiple_children_use_jsxs() {
    let out = lower("const el = <ul><li>a</li><li>b</li></ul>;");
    assert_eq!(
        out,
        "const el = _jsxs(\"ul\", { children: [_jsx(\"li\", { children: \"a\" }), _jsx(\"li\", { children: \"b\" })] });"
    );
}

#[test]
fn expression_children_and_nesting() {
    let out = lower("const el = <div>{items.map(i => <span key={i}>{i}</span>)}</div>;");
    assert_eq!(
        out,
        "const el = _jsx(\"div\", { children: items.map(i => _jsx(\"span\", { key: i, children: i })) });"
    );
}

#[test]
fn fragments_lower_to_fragment() {
    let out = lower("const el = <><a>1</a></>;");
    assert_eq!(
        out,
        "const el = _jsx(_Fragment, { children: _jsx(\"a\", { children: \"1\" }) });"
    );
}

#[test]
fn spread_attributes() {
    let out = lower("const el = <div {...props} id=\"x\" />;");
    assert_eq!(out, "const el = _jsx(\"div\", { ...props, id: \"x\" });");
}

#[test]
fn comparisons_are_not_elements() {
    let source = "const less = a < b; const ok = x <y> z;";
    assert_eq!(lower(source), source);
}

#[test]
fn jsx_inside_return_position() {
    let out = lower("function App() {\n  return <main>body</main>;\n}\n");
    assert!(out.contains("return _jsx(\"main\", { children: \"body\" });"));
}

#[test]
fn text_whitespace_collapses() {
    let out = lower("const el = <p>\n  hello\n  world\n</p>;");
    assert!(out.contains("children: \"hello world\""));
}

#[test]
fn comment_only_expressions_are_dropped() {
    let out = lower("const el = <div>{/* note */}</div>;");
    assert_eq!(out, "const el = _jsx(\"div\", {  });");
}

#[test]
fn strings_and_comments_are_left_alone() {
    let source = "const s = \"<div>not jsx</div>\"; // <span>\n";
    assert_eq!(lower(source), source);
    assert!(!transform_jsx(source).lowered);
}

#[test]
fn lowered_flag_reports_work() {
    assert!(transform_jsx("const e = <br />;").lowered);
    assert!(!transform_jsx("const e = 1;").lowered);
}

#[test]
fn apostrophes_in_text_children() {
    let out = lower("const el = <p>it's fine</p>;");
    assert!(out.contains("children: \"it's fine\""));
}

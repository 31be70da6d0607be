//! Specifier scanning for `.d.ts` text.
//!
//! Declaration files coming off the CDN are machine-generated, so a
//! line-oriented scan is enough to find every module reference: `import`/
//! `export ... from`, bare `import "..."`, `import("...")` type references,
//! `require("...")`, and triple-slash directives.

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DtsRef {
    /// An `import`/`export from` module specifier.
    Module(String),
    /// `/// <reference path="..." />`
    ReferencePath(String),
    /// `/// <reference types="..." />`
    ReferenceTypes(String),
}

pub(crate) fn scan_dts(text: &str) -> Vec<DtsRef> {
    let mut refs = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(directive) = trimmed.strip_prefix("///") {
            if let Some(value) = directive_value(directive, "path") {
                refs.push(DtsRef::ReferencePath(value));
            } else if let Some(value) = directive_value(directive, "types") {
                refs.push(DtsRef::ReferenceTypes(value));
            }
            continue;
        }
        if trimmed.starts_with("//") {
            continue;
        }
        collect_module_specifiers(line, &mut refs);
    }
    refs
}

/// Attribute value of a `<reference attr="..." />` directive.
fn directive_value(directive: &str, attr: &str) -> Option<String> {
    if !directive.contains("<reference") {
        return None;
    }
    let needle = format!("{attr}=");
    let idx = directive.find(&needle)?;
    let rest = &directive[idx + needle.len()..];
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = &rest[1..];
    let end = inner.find(quote)?;
    Some(inner[..end].to_string())
}

fn collect_module_specifiers(line: &str, refs: &mut Vec<DtsRef>) {
    for anchor in ["from", "import", "require"] {
        let mut search = 0;
        while let Some(found) = line[search..].find(anchor) {
            let at = search + found;
            search = at + anchor.len();
            if !is_word_boundary(line, at, anchor.len()) {
                continue;
            }
            let rest = line[at + anchor.len()..].trim_start();
            // `import("x")` / `require("x")` call forms.
            let rest = rest.strip_prefix('(').map(str::trim_start).unwrap_or(rest);
            if let Some(spec) = leading_string_literal(rest) {
                refs.push(DtsRef::Module(spec));
            }
        }
    }
}

fn is_word_boundary(line: &str, at: usize, len: usize) -> bool {
    let before_ok = at == 0
        || !line[..at]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    let after = &line[at + len..];
    let after_ok = !after
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    before_ok && after_ok
}

fn leading_string_literal(text: &str) -> Option<String> {
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = &text[1..];
    let end = inner.find(quote)?;
    Some(inner[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_import_and_export_specifiers() {
        let text = r#"
import { A } from "./a.d.ts";
export * from './b.d.ts';
import "side-effect";
export declare function f(): import("react").ReactNode;
declare const r: typeof require("node:fs");
"#;
        let refs = scan_dts(text);
        assert!(refs.contains(&DtsRef::Module("./a.d.ts".into())));
        assert!(refs.contains(&DtsRef::Module("./b.d.ts".into())));
        assert!(refs.contains(&DtsRef::Module("side-effect".into())));
        assert!(refs.contains(&DtsRef::Module("react".into())));
        assert!(refs.contains(&DtsRef::Module("node:fs".into())));
    }

    #[test]
    fn scans_triple_slash_directives() {
        let text = "/// <reference path=\"./global.d.ts\" />\n/// <reference types=\"node\" />\n";
        let refs = scan_dts(text);
        assert_eq!(
            refs,
            vec![
                DtsRef::ReferencePath("./global.d.ts".into()),
                DtsRef::ReferenceTypes("node".into()),
            ]
        );
    }

    #[test]
    fn ignores_words_containing_anchors() {
        let refs = scan_dts("declare const important: \"x\";\n");
        assert!(refs.is_empty());
    }
}

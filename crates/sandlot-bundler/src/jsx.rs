//! JSX lowering for the automatic runtime.
//!
//! `<div className="x">{name}</div>` becomes
//! `_jsx("div", { className: "x", children: name })`; multi-child elements
//! use `_jsxs` with a children array, fragments use `_Fragment`. The graph
//! injects the `react/jsx-runtime` import (shared module when registered)
//! whenever a file actually lowered something.
//!
//! The pass is character-level and tolerant: a `<` that does not parse as an
//! element is left untouched, so comparison expressions survive.

/// Names the injected runtime import binds.
pub const JSX_FACTORY: &str = "_jsx";
pub const JSXS_FACTORY: &str = "_jsxs";
pub const FRAGMENT: &str = "_Fragment";

/// Import statement prepended to any file the transform changed.
pub const RUNTIME_IMPORT: &str =
    "import { jsx as _jsx, jsxs as _jsxs, Fragment as _Fragment } from \"react/jsx-runtime\";\n";

#[derive(Debug)]
pub struct JsxOutput {
    pub code: String,
    /// Whether anything was lowered (and the runtime import is needed).
    pub lowered: bool,
}

/// Lower every JSX element in `source`.
#[must_use]
pub fn transform_jsx(source: &str) -> JsxOutput {
    let mut t = Transformer::new(source);
    t.run();
    JsxOutput {
        code: t.out,
        lowered: t.lowered,
    }
}

struct Transformer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    out: String,
    lowered: bool,
    /// Last significant char copied through, for expression-position checks.
    last_sig: Option<char>,
    /// Pending identifier word, for keyword-position checks.
    last_word: String,
    prev_sig: Option<char>,
}

const KEYWORDS_BEFORE_EXPR: &[&str] = &[
    "return", "default", "case", "do", "else", "typeof", "yield", "await", "in", "of",
];

impl<'a> Transformer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            out: String::with_capacity(source.len()),
            lowered: false,
            last_sig: None,
            last_word: String::new(),
            prev_sig: None,
        }
    }

    fn push_through(&mut self, from: usize, to: usize) {
        for &(_, c) in &self.chars[from..to] {
            self.out.push(c);
        }
    }

    fn note_sig(&mut self, c: char) {
        if c.is_whitespace() {
            return;
        }
        self.prev_sig = self.last_sig;
        self.last_sig = Some(c);
        if c.is_alphanumeric() || c == '_' || c == '$' {
            self.last_word.push(c);
        } else {
            self.last_word.clear();
        }
    }

    fn expression_position(&self) -> bool {
        if KEYWORDS_BEFORE_EXPR.contains(&self.last_word.as_str()) {
            return true;
        }
        match self.last_sig {
            None => true,
            Some(c) if c.is_alphanumeric() || c == '_' || c == '$' => false,
            Some('>') => self.prev_sig == Some('='), // arrow body
            Some(c) => matches!(
                c,
                '(' | ',' | '=' | '[' | '{' | '?' | ':' | ';' | '&' | '|' | '!'
            ),
        }
    }

    fn run(&mut self) {
        let mut i = 0;
        let len = self.chars.len();
        while i < len {
            let (_, c) = self.chars[i];
            match c {
                '/' if i + 1 < len && self.chars[i + 1].1 == '/' => {
                    let start = i;
                    while i < len && self.chars[i].1 != '\n' {
                        i += 1;
                    }
                    self.push_through(start, i);
                }
                '/' if i + 1 < len && self.chars[i + 1].1 == '*' => {
                    let start = i;
                    i += 2;
                    while i + 1 < len && !(self.chars[i].1 == '*' && self.chars[i + 1].1 == '/') {
                        i += 1;
                    }
                    i = (i + 2).min(len);
                    self.push_through(start, i);
                }
                '"' | '\'' => {
                    let start = i;
                    i = scan_string(&self.chars, i, c);
                    self.push_through(start, i);
                    self.note_sig('"');
                }
                '`' => {
                    let start = i;
                    i = scan_template(&self.chars, i);
                    self.push_through(start, i);
                    self.note_sig('`');
                }
                '<' if self.expression_position() => match self.parse_element(i) {
                    Some((replacement, next)) => {
                        self.out.push_str(&replacement);
                        self.lowered = true;
                        self.note_sig(')');
                        i = next;
                    }
                    None => {
                        self.out.push(c);
                        self.note_sig(c);
                        i += 1;
                    }
                },
                _ => {
                    self.out.push(c);
                    self.note_sig(c);
                    i += 1;
                }
            }
        }
    }

    /// Parse one element starting at `<`; returns its lowered call and the
    /// index just past the element.
    fn parse_element(&mut self, open: usize) -> Option<(String, usize)> {
        let mut i = open + 1;
        let tag = self.scan_tag_name(&mut i);
        let mut props: Vec<String> = Vec::new();

        // Attributes.
        loop {
            i = self.skip_ws(i);
            let (_, c) = *self.chars.get(i)?;
            match c {
                '>' => {
                    i += 1;
                    break;
                }
                '/' => {
                    // Self-closing.
                    if self.chars.get(i + 1)?.1 != '>' {
                        return None;
                    }
                    return Some((render_call(&tag, props, Vec::new()), i + 2));
                }
                '{' => {
                    // `{...spread}`
                    let end = self.balanced_brace(i)?;
                    let inner = self.slice(i + 1, end - 1);
                    let inner = transform_jsx(inner.trim()).code;
                    props.push(inner);
                    i = end;
                }
                _ => {
                    let name = self.scan_attr_name(&mut i);
                    if name.is_empty() {
                        return None;
                    }
                    i = self.skip_ws(i);
                    if self.chars.get(i).map(|&(_, c)| c) == Some('=') {
                        i = self.skip_ws(i + 1);
                        let (_, v) = *self.chars.get(i)?;
                        let value = match v {
                            '"' | '\'' => {
                                let end = scan_string(&self.chars, i, v);
                                let lit = self.slice(i, end);
                                i = end;
                                lit.to_string()
                            }
                            '{' => {
                                let end = self.balanced_brace(i)?;
                                let inner = self.slice(i + 1, end - 1);
                                i = end;
                                transform_jsx(inner.trim()).code
                            }
                            _ => return None,
                        };
                        props.push(format!("{}: {value}", prop_key(&name)));
                    } else {
                        props.push(format!("{}: true", prop_key(&name)));
                    }
                }
            }
        }

        // Children.
        let mut children: Vec<String> = Vec::new();
        loop {
            let text_start = i;
            // Text run up to the next `<` or `{`.
            while let Some(&(_, c)) = self.chars.get(i) {
                if c == '<' || c == '{' {
                    break;
                }
                i += 1;
            }
            if let Some(text) = jsx_text(self.slice(text_start, i)) {
                children.push(text);
            }
            let (_, c) = *self.chars.get(i)?;
            if c == '{' {
                let end = self.balanced_brace(i)?;
                let inner = self.slice(i + 1, end - 1);
                let trimmed = inner.trim();
                if !trimmed.is_empty() && !is_comment_only(trimmed) {
                    children.push(transform_jsx(trimmed).code);
                }
                i = end;
                continue;
            }
            // `c == '<'`
            if self.chars.get(i + 1).map(|&(_, c)| c) == Some('/') {
                let mut j = i + 2;
                let closing = self.scan_tag_name(&mut j);
                j = self.skip_ws(j);
                if self.chars.get(j).map(|&(_, c)| c) != Some('>') {
                    return None;
                }
                if closing != tag {
                    return None;
                }
                return Some((render_call(&tag, props, children), j + 1));
            }
            let (child, next) = self.parse_element(i)?;
            children.push(child);
            i = next;
        }
    }

    fn scan_tag_name(&self, i: &mut usize) -> String {
        let start = *i;
        while let Some(&(_, c)) = self.chars.get(*i) {
            if c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | '-' | ':') {
                *i += 1;
            } else {
                break;
            }
        }
        self.slice(start, *i).to_string()
    }

    fn scan_attr_name(&self, i: &mut usize) -> String {
        let start = *i;
        while let Some(&(_, c)) = self.chars.get(*i) {
            if c.is_alphanumeric() || matches!(c, '_' | '$' | '-' | ':') {
                *i += 1;
            } else {
                break;
            }
        }
        self.slice(start, *i).to_string()
    }

    fn skip_ws(&self, mut i: usize) -> usize {
        while self.chars.get(i).is_some_and(|&(_, c)| c.is_whitespace()) {
            i += 1;
        }
        i
    }

    /// Index just past the `}` matching the `{` at `open`.
    fn balanced_brace(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = open;
        while let Some(&(_, c)) = self.chars.get(i) {
            match c {
                '{' => {
                    depth += 1;
                    i += 1;
                }
                '}' => {
                    depth -= 1;
                    i += 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                '"' | '\'' => i = scan_string(&self.chars, i, c),
                '`' => i = scan_template(&self.chars, i),
                _ => i += 1,
            }
        }
        None
    }

    fn slice(&self, from: usize, to: usize) -> &'a str {
        let start = self.chars.get(from).map_or(self.source.len(), |&(o, _)| o);
        let end = self.chars.get(to).map_or(self.source.len(), |&(o, _)| o);
        &self.source[start..end]
    }
}

fn scan_string(chars: &[(usize, char)], start: usize, quote: char) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i].1 {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

fn scan_template(chars: &[(usize, char)], start: usize) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i].1 {
            '\\' => i += 2,
            '`' => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

/// JSX text semantics: whitespace runs containing a newline collapse away,
/// interior whitespace collapses to one space.
fn jsx_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut text = String::with_capacity(trimmed.len());
    let mut in_ws = false;
    for c in trimmed.chars() {
        if c.is_whitespace() {
            in_ws = true;
            continue;
        }
        if in_ws {
            text.push(' ');
            in_ws = false;
        }
        text.push(c);
    }
    Some(format!(
        "\"{}\"",
        text.replace('\\', "\\\\").replace('"', "\\\"")
    ))
}

fn is_comment_only(expr: &str) -> bool {
    expr.starts_with("/*") && expr.ends_with("*/") && expr.matches("/*").count() == 1
}

fn prop_key(name: &str) -> String {
    if name.contains('-') || name.contains(':') {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}

fn render_call(tag: &str, props: Vec<String>, children: Vec<String>) -> String {
    let tag_expr = if tag.is_empty() {
        FRAGMENT.to_string()
    } else if tag
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase())
        && !tag.contains('.')
    {
        format!("\"{tag}\"")
    } else {
        tag.to_string()
    };

    let mut entries = props;
    let factory = match children.len() {
        0 => JSX_FACTORY,
        1 => {
            entries.push(format!("children: {}", children[0]));
            JSX_FACTORY
        }
        _ => {
            entries.push(format!("children: [{}]", children.join(", ")));
            JSXS_FACTORY
        }
    };
    format!("{factory}({tag_expr}, {{ {} }})", entries.join(", "))
}

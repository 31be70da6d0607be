//! TypeScript type stripping.
//!
//! The `ts`/`tsx` loaders erase type syntax rather than compiling it: every
//! stripped range is blanked with spaces so byte offsets and line numbers
//! survive into the linked output. Handled: type-only statements
//! (`interface`, `type`, `declare`, `import type`, `export type`),
//! annotations, optional markers, `as`/`satisfies` casts, declaration and
//! call-site generics, heritage clauses, accessibility modifiers, and
//! non-null assertions. `enum` is not lowered; it produces a warning.

use sandlot_checker::scanner::{Token, TokenKind, tokenize};

use sandlot_common::diagnostics::BundleWarning;
use sandlot_common::position::LineMap;

#[derive(Debug)]
pub struct StripResult {
    pub code: String,
    pub warnings: Vec<BundleWarning>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BraceKind {
    Block,
    Object,
    ImportExport,
    /// A parenthesized region (call args, params). Colons inside are
    /// annotatable even when the enclosing braces are an object literal.
    Paren,
}

struct Stripper<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    /// Byte ranges to blank out.
    removals: Vec<(u32, u32)>,
    braces: Vec<BraceKind>,
    /// Open ternaries per nesting level; `?:` colons are not annotations.
    ternaries: usize,
    warnings: Vec<BundleWarning>,
    file: Option<String>,
}

/// Blank the TypeScript-only syntax out of `source`.
#[must_use]
pub fn strip_types(source: &str, file: Option<&str>) -> StripResult {
    let tokens = tokenize(source);
    let mut stripper = Stripper {
        source,
        tokens,
        removals: Vec::new(),
        braces: Vec::new(),
        ternaries: 0,
        warnings: Vec::new(),
        file: file.map(str::to_string),
    };
    stripper.run();
    let code = apply_removals(source, &stripper.removals);
    StripResult {
        code,
        warnings: stripper.warnings,
    }
}

impl<'a> Stripper<'a> {
    fn text(&self, i: usize) -> &'a str {
        self.tokens[i].text(self.source)
    }

    fn kind(&self, i: usize) -> Option<TokenKind> {
        self.tokens.get(i).map(|t| t.kind)
    }

    fn is_ident(&self, i: usize, word: &str) -> bool {
        self.tokens
            .get(i)
            .is_some_and(|t| t.kind == TokenKind::Ident && t.text(self.source) == word)
    }

    fn remove_tokens(&mut self, from: usize, to: usize) {
        if from >= self.tokens.len() || from >= to {
            return;
        }
        let start = self.tokens[from].start;
        let end = self.tokens[(to - 1).min(self.tokens.len() - 1)].end;
        self.removals.push((start, end));
    }

    fn run(&mut self) {
        let mut i = 0;
        while i < self.tokens.len() {
            i = self.step(i);
        }
    }

    fn step(&mut self, i: usize) -> usize {
        let token = self.tokens[i];
        match token.kind {
            TokenKind::Punct('{') => {
                self.braces.push(self.classify_brace(i));
                i + 1
            }
            TokenKind::Punct('}') => {
                self.braces.pop();
                i + 1
            }
            TokenKind::Punct('(') => {
                self.braces.push(BraceKind::Paren);
                i + 1
            }
            TokenKind::Punct(')') => {
                self.braces.pop();
                i + 1
            }
            TokenKind::Punct('?') => {
                // `?.` and `??` are not ternaries.
                if !matches!(self.kind(i + 1), Some(TokenKind::Punct('.')) | Some(TokenKind::Punct('?')))
                    && !self.is_optional_marker(i)
                {
                    self.ternaries += 1;
                }
                i + 1
            }
            TokenKind::Punct(':') => self.handle_colon(i),
            TokenKind::Punct('<') => self.handle_angle(i),
            TokenKind::Punct('!') => self.handle_bang(i),
            TokenKind::Ident => self.handle_ident(i),
            _ => i + 1,
        }
    }

    fn classify_brace(&self, i: usize) -> BraceKind {
        let Some(prev) = i.checked_sub(1).map(|p| self.tokens[p]) else {
            return BraceKind::Block;
        };
        match prev.kind {
            TokenKind::Punct(c) if matches!(c, '=' | '(' | ',' | '[' | ':' | '?' | '&' | '|') => {
                BraceKind::Object
            }
            TokenKind::Ident => match prev.text(self.source) {
                "import" | "export" => BraceKind::ImportExport,
                "return" | "typeof" | "in" | "of" | "const" | "let" | "var" | "case" | "yield"
                | "await" => BraceKind::Object,
                _ => BraceKind::Block,
            },
            _ => BraceKind::Block,
        }
    }

    fn in_object(&self) -> bool {
        matches!(self.braces.last(), Some(BraceKind::Object))
    }

    fn in_import_export(&self) -> bool {
        matches!(self.braces.last(), Some(BraceKind::ImportExport))
    }

    /// `ident ?` directly followed by `:` or `)` or `,` — an optional
    /// parameter marker, not a ternary.
    fn is_optional_marker(&self, i: usize) -> bool {
        let prev_is_name = i
            .checked_sub(1)
            .is_some_and(|p| self.tokens[p].kind == TokenKind::Ident);
        let next_closes = matches!(
            self.kind(i + 1),
            Some(TokenKind::Punct(':')) | Some(TokenKind::Punct(')')) | Some(TokenKind::Punct(','))
        );
        prev_is_name && next_closes
    }

    fn handle_colon(&mut self, i: usize) -> usize {
        if self.ternaries > 0 {
            self.ternaries -= 1;
            return i + 1;
        }
        if self.in_object() || self.in_import_export() {
            return i + 1;
        }
        let Some(prev) = i.checked_sub(1).map(|p| self.tokens[p]) else {
            return i + 1;
        };
        // `label: for (…)` — a label, not an annotation; the statement
        // keyword after the colon gives it away.
        if prev.kind == TokenKind::Ident
            && self.tokens.get(i + 1).is_some_and(|t| {
                t.kind == TokenKind::Ident
                    && matches!(
                        t.text(self.source),
                        "for" | "while" | "do" | "switch" | "if" | "try"
                    )
            })
        {
            return i + 1;
        }
        // `}` covers object-destructured parameters (`{ title }: Props`);
        // object-literal colons never reach here because of the
        // `in_object` check above.
        let annotatable = match prev.kind {
            TokenKind::Ident => !matches!(prev.text(self.source), "default" | "case"),
            TokenKind::Punct(')')
            | TokenKind::Punct(']')
            | TokenKind::Punct('?')
            | TokenKind::Punct('}') => true,
            _ => false,
        };
        if !annotatable {
            return i + 1;
        }

        let end = parse_type_expr(&self.tokens, self.source, i + 1);
        if end == i + 1 {
            return i + 1;
        }
        let mut from = i;
        // `x?: T` drops the optional marker along with the annotation.
        if prev.kind == TokenKind::Punct('?') {
            from -= 1;
        }
        self.remove_tokens(from, end);
        end
    }

    fn handle_angle(&mut self, i: usize) -> usize {
        let Some(prev) = i.checked_sub(1).map(|p| self.tokens[p]) else {
            return i + 1;
        };
        if prev.kind != TokenKind::Ident {
            return i + 1;
        }
        let prev_text = prev.text(self.source);
        // Declaration generics: `function f<T>`, `class C<T>`.
        let declares = i >= 2
            && self.tokens[i - 2].kind == TokenKind::Ident
            && matches!(self.text(i - 2), "function" | "class" | "interface" | "type");
        if !declares && matches!(prev_text, "if" | "for" | "while" | "switch" | "return") {
            return i + 1;
        }

        let Some(close) = skip_angle(&self.tokens, i) else {
            return i + 1;
        };
        // Call-site type arguments (`f<T>(…)`), declaration generics, and
        // heritage generics (`extends Base<T> {`, `Base<T> implements`) all
        // erase; a bare comparison does not.
        let next = self.kind(close);
        let erase = declares
            || matches!(next, Some(TokenKind::Punct('(')) | Some(TokenKind::Punct('{')))
            || self.is_ident(close, "implements");
        if erase {
            self.remove_tokens(i, close);
            close
        } else {
            i + 1
        }
    }

    fn handle_bang(&mut self, i: usize) -> usize {
        let prev_ok = i.checked_sub(1).is_some_and(|p| {
            matches!(
                self.tokens[p].kind,
                TokenKind::Ident | TokenKind::Punct(')') | TokenKind::Punct(']')
            )
        });
        let next_ok = matches!(
            self.kind(i + 1),
            Some(TokenKind::Punct('.'))
                | Some(TokenKind::Punct('('))
                | Some(TokenKind::Punct('['))
                | Some(TokenKind::Punct(';'))
                | Some(TokenKind::Punct(','))
                | Some(TokenKind::Punct(')'))
                | Some(TokenKind::Punct(']'))
                | Some(TokenKind::Punct('}'))
        );
        if prev_ok && next_ok {
            self.remove_tokens(i, i + 1);
        }
        i + 1
    }

    fn handle_ident(&mut self, i: usize) -> usize {
        match self.text(i) {
            "interface" if self.at_statement_type_keyword(i) => self.remove_braced_statement(i),
            "type" if self.is_type_alias(i) => self.remove_type_alias(i),
            "declare" if self.at_statement_type_keyword(i) => self.remove_braced_statement(i),
            "import" if self.is_ident(i + 1, "type") && !self.is_ident(i + 2, "from") => {
                self.remove_through_specifier(i)
            }
            "export" if self.is_ident(i + 1, "type") => self.remove_through_specifier(i),
            "as" | "satisfies" if self.is_cast(i) => {
                let end = parse_type_expr(&self.tokens, self.source, i + 1);
                if end > i + 1 {
                    self.remove_tokens(i, end);
                    end
                } else {
                    i + 1
                }
            }
            "implements" => {
                let end = parse_heritage_list(&self.tokens, self.source, i + 1);
                if end > i + 1 {
                    self.remove_tokens(i, end);
                    end
                } else {
                    i + 1
                }
            }
            "public" | "private" | "protected" | "readonly" | "abstract" | "override"
                if self.kind(i + 1) == Some(TokenKind::Ident) && !self.in_object() =>
            {
                self.remove_tokens(i, i + 1);
                i + 1
            }
            "enum" => {
                let line = LineMap::build(self.source).line_col(self.tokens[i].start).0;
                self.warnings.push(BundleWarning {
                    text: "enum declarations are not lowered; use a const object instead"
                        .to_string(),
                    file: self.file.clone(),
                    line: Some(line),
                    column: None,
                });
                i + 1
            }
            _ => i + 1,
        }
    }

    /// Keyword is in statement position (start of input, after `;`, `}`, or
    /// an `export` in statement position), not an identifier reference.
    fn at_statement_type_keyword(&self, i: usize) -> bool {
        // `interface`/`declare` used as a plain name is followed by
        // something other than an identifier.
        if self.kind(i + 1) != Some(TokenKind::Ident) {
            return false;
        }
        match i.checked_sub(1).map(|p| self.tokens[p]) {
            None => true,
            Some(prev) => match prev.kind {
                TokenKind::Punct(';') | TokenKind::Punct('}') | TokenKind::Punct('{') => true,
                TokenKind::Ident => prev.text(self.source) == "export",
                _ => false,
            },
        }
    }

    fn is_type_alias(&self, i: usize) -> bool {
        if !self.at_statement_type_keyword(i) {
            return false;
        }
        matches!(
            self.kind(i + 2),
            Some(TokenKind::Punct('=')) | Some(TokenKind::Punct('<'))
        )
    }

    fn is_cast(&self, i: usize) -> bool {
        if self.in_import_export() {
            return false;
        }
        let prev_ok = i.checked_sub(1).is_some_and(|p| {
            matches!(
                self.tokens[p].kind,
                TokenKind::Ident
                    | TokenKind::Str
                    | TokenKind::Num
                    | TokenKind::Template
                    | TokenKind::Punct(')')
                    | TokenKind::Punct(']')
                    | TokenKind::Punct('}')
            )
        });
        // `import * as ns`, `export { a as b }` are not casts; the former
        // has `*` before `as`, the latter is inside import/export braces.
        prev_ok
            && matches!(
                self.kind(i + 1),
                Some(TokenKind::Ident)
                    | Some(TokenKind::Punct('{'))
                    | Some(TokenKind::Punct('('))
                    | Some(TokenKind::Punct('['))
                    | Some(TokenKind::Str)
            )
    }

    /// Remove a statement that may carry a braced body (`interface X {}`,
    /// `declare namespace N {}`), including a directly preceding `export`.
    fn remove_braced_statement(&mut self, i: usize) -> usize {
        let from = if i > 0 && self.is_ident(i - 1, "export") {
            i - 1
        } else {
            i
        };
        let mut j = i;
        let mut depth = 0usize;
        while j < self.tokens.len() {
            match self.tokens[j].kind {
                TokenKind::Punct('{') => depth += 1,
                TokenKind::Punct('}') => {
                    // An unbalanced close belongs to the enclosing block.
                    if depth <= 1 {
                        if depth == 1 {
                            j += 1;
                        }
                        break;
                    }
                    depth -= 1;
                }
                TokenKind::Punct(';') if depth == 0 => {
                    j += 1;
                    break;
                }
                _ => {}
            }
            j += 1;
        }
        self.remove_tokens(from, j);
        j
    }

    fn remove_type_alias(&mut self, i: usize) -> usize {
        let from = if i > 0 && self.is_ident(i - 1, "export") {
            i - 1
        } else {
            i
        };
        // `type Name<T> = …`
        let mut j = i + 2;
        if self.kind(j) == Some(TokenKind::Punct('<')) {
            j = skip_angle(&self.tokens, j).unwrap_or(j + 1);
        }
        if self.kind(j) == Some(TokenKind::Punct('=')) {
            j = parse_type_expr(&self.tokens, self.source, j + 1);
        }
        if self.kind(j) == Some(TokenKind::Punct(';')) {
            j += 1;
        }
        self.remove_tokens(from, j);
        j
    }

    /// Remove `import type …` / `export type …` through the trailing module
    /// specifier (or closing brace when there is none).
    fn remove_through_specifier(&mut self, i: usize) -> usize {
        let mut j = i;
        let mut end = i + 2;
        while j < self.tokens.len() {
            match self.tokens[j].kind {
                TokenKind::Punct(';') => {
                    end = j + 1;
                    break;
                }
                TokenKind::Str => {
                    end = j + 1;
                    if self.kind(j + 1) == Some(TokenKind::Punct(';')) {
                        end = j + 2;
                    }
                    break;
                }
                TokenKind::Punct('}')
                    if !self
                        .tokens
                        .get(j + 1)
                        .is_some_and(|t| t.kind == TokenKind::Ident) =>
                {
                    end = j + 1;
                    break;
                }
                _ => {}
            }
            j += 1;
        }
        self.remove_tokens(i, end);
        end
    }
}

/// Skip a balanced `<…>`, tolerating nested angles and ignoring the `>` of
/// a `=>` inside generic defaults. Returns the index after the closing `>`.
fn skip_angle(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0isize;
    let mut parens = 0isize;
    let mut i = open;
    while i < tokens.len() {
        match tokens[i].kind {
            TokenKind::Punct('<') => depth += 1,
            TokenKind::Punct('>') => {
                let arrow = i > 0 && tokens[i - 1].kind == TokenKind::Punct('=');
                if !arrow {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
            }
            TokenKind::Punct('(') => parens += 1,
            TokenKind::Punct(')') => {
                parens -= 1;
                // Escaped the enclosing call; it was a comparison.
                if parens < 0 {
                    return None;
                }
            }
            // Tokens that cannot appear inside type arguments: bail, it was
            // a comparison.
            TokenKind::Punct(';') | TokenKind::Punct('{') | TokenKind::Punct('}') => return None,
            _ => {}
        }
        i += 1;
    }
    None
}

fn skip_balanced(tokens: &[Token], open: usize, open_ch: char, close_ch: char) -> usize {
    let mut depth = 0isize;
    let mut i = open;
    while i < tokens.len() {
        match tokens[i].kind {
            TokenKind::Punct(c) if c == open_ch => depth += 1,
            TokenKind::Punct(c) if c == close_ch => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    i
}

/// Consume one type expression starting at `i`; returns the index after it.
/// Returns `i` unchanged when no type expression starts there.
pub(crate) fn parse_type_expr(tokens: &[Token], source: &str, i: usize) -> usize {
    let mut j = parse_type_term(tokens, source, i);
    if j == i {
        return i;
    }
    loop {
        match tokens.get(j).map(|t| t.kind) {
            Some(TokenKind::Punct('|')) | Some(TokenKind::Punct('&')) => {
                let next = parse_type_term(tokens, source, j + 1);
                if next == j + 1 {
                    return j;
                }
                j = next;
            }
            Some(TokenKind::Punct('[')) => {
                j = skip_balanced(tokens, j, '[', ']');
            }
            Some(TokenKind::Punct('.')) => {
                if tokens.get(j + 1).is_some_and(|t| t.kind == TokenKind::Ident) {
                    j += 2;
                } else {
                    return j;
                }
            }
            Some(TokenKind::Ident)
                if tokens[j].text(source) == "extends" =>
            {
                // Conditional types are consumed conservatively: the checker
                // side never needs their structure.
                let cond = parse_type_term(tokens, source, j + 1);
                if cond == j + 1 {
                    return j;
                }
                j = cond;
            }
            _ => return j,
        }
    }
}

fn parse_type_term(tokens: &[Token], source: &str, i: usize) -> usize {
    let Some(token) = tokens.get(i) else { return i };
    match token.kind {
        TokenKind::Ident => match token.text(source) {
            "typeof" | "keyof" | "readonly" | "infer" | "new" => {
                let inner = parse_type_term(tokens, source, i + 1);
                if inner == i + 1 { i } else { inner }
            }
            _ => {
                let mut j = i + 1;
                if tokens.get(j).map(|t| t.kind) == Some(TokenKind::Punct('<')) {
                    if let Some(after) = skip_angle(tokens, j) {
                        j = after;
                    }
                }
                j
            }
        },
        TokenKind::Str | TokenKind::Num | TokenKind::Template => i + 1,
        TokenKind::Punct('{') => skip_balanced(tokens, i, '{', '}'),
        TokenKind::Punct('[') => skip_balanced(tokens, i, '[', ']'),
        TokenKind::Punct('(') => {
            let after = skip_balanced(tokens, i, '(', ')');
            // `(…) => T` function type.
            if tokens.get(after).map(|t| t.kind) == Some(TokenKind::Punct('='))
                && tokens.get(after + 1).map(|t| t.kind) == Some(TokenKind::Punct('>'))
            {
                parse_type_expr(tokens, source, after + 2)
            } else {
                after
            }
        }
        TokenKind::Punct('-') if tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::Num) => i + 2,
        _ => i,
    }
}

/// Heritage list: comma-separated type expressions after `implements`.
fn parse_heritage_list(tokens: &[Token], source: &str, i: usize) -> usize {
    let mut j = parse_type_expr(tokens, source, i);
    while tokens.get(j).map(|t| t.kind) == Some(TokenKind::Punct(',')) {
        let next = parse_type_expr(tokens, source, j + 1);
        if next == j + 1 {
            return j;
        }
        j = next;
    }
    j
}

/// Blank removed ranges with spaces, preserving newlines so every surviving
/// token keeps its line and column.
fn apply_removals(source: &str, removals: &[(u32, u32)]) -> String {
    if removals.is_empty() {
        return source.to_string();
    }
    let mut bytes: Vec<u8> = source.as_bytes().to_vec();
    for &(start, end) in removals {
        for byte in &mut bytes[start as usize..(end as usize).min(source.len())] {
            if *byte != b'\n' && *byte != b'\r' {
                *byte = b' ';
            }
        }
    }
    // Blanking is ASCII-space only, so the result is still valid UTF-8.
    String::from_utf8(bytes).unwrap_or_else(|_| source.to_string())
}

//! Tolerant TypeScript scanner.
//!
//! The service does not need a full AST; it needs every module specifier a
//! file mentions and the small set of declaration shapes the checker
//! analyzes. The tokenizer handles the lexical structure that matters for
//! not mis-reading source (comments, strings, templates with nested
//! substitutions, regex literals); everything else is a stream of
//! identifiers and punctuation.

/// A lexical token. `start`/`end` are byte offsets into the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: u32,
    pub end: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Str,
    Template,
    Num,
    Regex,
    Punct(char),
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start as usize..self.end as usize]
    }

    /// Inner text of a string literal, quotes stripped.
    pub fn str_value<'a>(&self, source: &'a str) -> &'a str {
        let text = self.text(source);
        let text = text.strip_prefix(['"', '\'']).unwrap_or(text);
        text.strip_suffix(['"', '\'']).unwrap_or(text)
    }
}

/// One module reference found in a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportRef {
    pub specifier: String,
    /// Byte offset of the specifier's string literal.
    pub offset: u32,
    /// `import type` / `export type` — resolved for diagnostics but never
    /// bundled.
    pub type_only: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiteralKind {
    Str,
    Num,
    Bool,
}

impl LiteralKind {
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            LiteralKind::Str => "string",
            LiteralKind::Num => "number",
            LiteralKind::Bool => "boolean",
        }
    }
}

/// `const name: annotation = <literal>` with a primitive annotation and a
/// literal initializer; the only declaration shape the checker analyzes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedDecl {
    pub name: String,
    pub type_name: String,
    pub literal: LiteralKind,
    /// Byte offset of the declaration name.
    pub offset: u32,
}

#[derive(Clone, Debug, Default)]
pub struct ScanResult {
    pub imports: Vec<ImportRef>,
    pub decls: Vec<AnnotatedDecl>,
}

/// Keywords after which `/` starts a regex literal rather than division.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return", "typeof", "case", "in", "of", "new", "delete", "void", "throw", "else", "do",
    "instanceof", "yield", "await",
];

pub fn tokenize(source: &str) -> Vec<Token> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let len = chars.len();
    let end_offset = source.len();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;

    let offset_at = |idx: usize| -> u32 {
        if idx < len {
            chars[idx].0 as u32
        } else {
            end_offset as u32
        }
    };

    while i < len {
        let (_, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == '/' && i + 1 < len {
            match chars[i + 1].1 {
                '/' => {
                    while i < len && chars[i].1 != '\n' {
                        i += 1;
                    }
                    continue;
                }
                '*' => {
                    i += 2;
                    while i + 1 < len && !(chars[i].1 == '*' && chars[i + 1].1 == '/') {
                        i += 1;
                    }
                    i = (i + 2).min(len);
                    continue;
                }
                _ => {}
            }
        }

        if c == '/' && regex_can_follow(tokens.last(), source) {
            let start = i;
            i = scan_regex(&chars, i);
            tokens.push(Token {
                kind: TokenKind::Regex,
                start: offset_at(start),
                end: offset_at(i),
            });
            continue;
        }

        if c == '"' || c == '\'' {
            let start = i;
            i = scan_string(&chars, i, c);
            tokens.push(Token {
                kind: TokenKind::Str,
                start: offset_at(start),
                end: offset_at(i),
            });
            continue;
        }

        if c == '`' {
            let start = i;
            i = scan_template(&chars, i);
            tokens.push(Token {
                kind: TokenKind::Template,
                start: offset_at(start),
                end: offset_at(i),
            });
            continue;
        }

        if is_ident_start(c) {
            let start = i;
            i += 1;
            while i < len && is_ident_part(chars[i].1) {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident,
                start: offset_at(start),
                end: offset_at(i),
            });
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            i += 1;
            while i < len
                && (chars[i].1.is_ascii_alphanumeric() || chars[i].1 == '.' || chars[i].1 == '_')
            {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Num,
                start: offset_at(start),
                end: offset_at(i),
            });
            continue;
        }

        tokens.push(Token {
            kind: TokenKind::Punct(c),
            start: offset_at(i),
            end: offset_at(i + 1),
        });
        i += 1;
    }

    tokens
}

fn regex_can_follow(prev: Option<&Token>, source: &str) -> bool {
    match prev {
        None => true,
        Some(token) => match token.kind {
            TokenKind::Punct(c) => !matches!(c, ')' | ']' | '}'),
            TokenKind::Ident => REGEX_PRECEDING_KEYWORDS.contains(&token.text(source)),
            _ => false,
        },
    }
}

fn scan_string(chars: &[(usize, char)], start: usize, quote: char) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i].1 {
            '\\' => i += 2,
            '\n' => return i, // unterminated; recover at line end
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
            '$' if i + 1 < chars.len() && chars[i + 1].1 == '{' => {
                i = scan_substitution(chars, i + 2);
            }
            _ => i += 1,
        }
    }
    chars.len()
}

/// Consume a `${ ... }` substitution body, tolerating nested braces,
/// strings, and templates.
fn scan_substitution(chars: &[(usize, char)], mut i: usize) -> usize {
    let mut depth = 1usize;
    while i < chars.len() {
        match chars[i].1 {
            '{' => {
                depth += 1;
                i += 1;
            }
            '}' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return i;
                }
            }
            '"' | '\'' => i = scan_string(chars, i, chars[i].1),
            '`' => i = scan_template(chars, i),
            '\\' => i += 2,
            _ => i += 1,
        }
    }
    chars.len()
}

fn scan_regex(chars: &[(usize, char)], start: usize) -> usize {
    let mut i = start + 1;
    let mut in_class = false;
    while i < chars.len() {
        match chars[i].1 {
            '\\' => i += 2,
            '[' => {
                in_class = true;
                i += 1;
            }
            ']' => {
                in_class = false;
                i += 1;
            }
            '/' if !in_class => {
                i += 1;
                while i < chars.len() && chars[i].1.is_ascii_alphabetic() {
                    i += 1;
                }
                return i;
            }
            '\n' => return i, // not a regex after all; recover
            _ => i += 1,
        }
    }
    chars.len()
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Scan a file for module references and checkable declarations.
#[must_use]
pub fn scan(source: &str) -> ScanResult {
    let tokens = tokenize(source);
    let mut result = ScanResult::default();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        if token.kind != TokenKind::Ident {
            i += 1;
            continue;
        }
        match token.text(source) {
            "import" => i = scan_import(source, &tokens, i, &mut result),
            "export" => i = scan_export(source, &tokens, i, &mut result),
            "require" => i = scan_require(source, &tokens, i, &mut result),
            "const" | "let" | "var" => i = scan_decl(source, &tokens, i, &mut result),
            _ => i += 1,
        }
    }
    result
}

fn push_import(source: &str, token: &Token, type_only: bool, result: &mut ScanResult) {
    result.imports.push(ImportRef {
        specifier: token.str_value(source).to_string(),
        offset: token.start,
        type_only,
    });
}

/// `import "x"`, `import(...)`, `import d from "x"`, `import type {..} from "x"`.
fn scan_import(source: &str, tokens: &[Token], at: usize, result: &mut ScanResult) -> usize {
    let next = match tokens.get(at + 1) {
        Some(next) => next,
        None => return at + 1,
    };

    // Dynamic `import("x")`.
    if next.kind == TokenKind::Punct('(') {
        if let Some(spec) = tokens.get(at + 2).filter(|t| t.kind == TokenKind::Str) {
            push_import(source, spec, false, result);
            return at + 3;
        }
        return at + 2;
    }

    // Bare `import "x";`.
    if next.kind == TokenKind::Str {
        push_import(source, next, false, result);
        return at + 2;
    }

    let type_only = next.kind == TokenKind::Ident
        && next.text(source) == "type"
        && !matches!(tokens.get(at + 2).map(|t| t.kind), Some(TokenKind::Punct(',')) | Some(TokenKind::Punct('(')));

    find_from_clause(source, tokens, at + 1, type_only, result)
}

/// `export * from "x"`, `export { a } from "x"`, `export type { T } from "x"`.
fn scan_export(source: &str, tokens: &[Token], at: usize, result: &mut ScanResult) -> usize {
    let type_only = tokens
        .get(at + 1)
        .is_some_and(|t| t.kind == TokenKind::Ident && t.text(source) == "type");
    find_from_clause(source, tokens, at + 1, type_only, result)
}

/// Seek `from "<spec>"` before the end of the statement.
fn find_from_clause(
    source: &str,
    tokens: &[Token],
    mut i: usize,
    type_only: bool,
    result: &mut ScanResult,
) -> usize {
    while let Some(token) = tokens.get(i) {
        match token.kind {
            TokenKind::Punct(';') => return i + 1,
            TokenKind::Punct('=') => return i, // `export const x = ...`
            TokenKind::Ident if token.text(source) == "from" => {
                if let Some(spec) = tokens.get(i + 1).filter(|t| t.kind == TokenKind::Str) {
                    push_import(source, spec, type_only, result);
                    return i + 2;
                }
                return i + 1;
            }
            TokenKind::Ident
                if matches!(token.text(source), "import" | "export" | "const" | "let" | "var")
                    && i > 0 =>
            {
                // Ran into the next statement; this one had no clause.
                return i;
            }
            _ => i += 1,
        }
    }
    i
}

/// `require("x")`.
fn scan_require(source: &str, tokens: &[Token], at: usize, result: &mut ScanResult) -> usize {
    if tokens.get(at + 1).map(|t| t.kind) == Some(TokenKind::Punct('(')) {
        if let Some(spec) = tokens.get(at + 2).filter(|t| t.kind == TokenKind::Str) {
            push_import(source, spec, false, result);
            return at + 3;
        }
    }
    at + 1
}

/// `const name: <primitive> = <literal>` with nothing after the literal that
/// could change its type.
fn scan_decl(source: &str, tokens: &[Token], at: usize, result: &mut ScanResult) -> usize {
    let name = match tokens.get(at + 1) {
        Some(t) if t.kind == TokenKind::Ident => t,
        _ => return at + 1,
    };
    if tokens.get(at + 2).map(|t| t.kind) != Some(TokenKind::Punct(':')) {
        return at + 1;
    }
    let annotation = match tokens.get(at + 3) {
        Some(t) if t.kind == TokenKind::Ident => t,
        _ => return at + 1,
    };
    let type_name = annotation.text(source);
    if !matches!(type_name, "number" | "string" | "boolean") {
        return at + 1;
    }
    if tokens.get(at + 4).map(|t| t.kind) != Some(TokenKind::Punct('=')) {
        return at + 1;
    }
    let initializer = match tokens.get(at + 5) {
        Some(t) => t,
        None => return at + 1,
    };
    let literal = match initializer.kind {
        TokenKind::Str | TokenKind::Template => LiteralKind::Str,
        TokenKind::Num => LiteralKind::Num,
        TokenKind::Ident if matches!(initializer.text(source), "true" | "false") => {
            LiteralKind::Bool
        }
        _ => return at + 1,
    };
    // A following `.`/operator means the initializer is a larger expression.
    match tokens.get(at + 6).map(|t| t.kind) {
        None
        | Some(TokenKind::Punct(';'))
        | Some(TokenKind::Punct(','))
        | Some(TokenKind::Punct(')')) => {}
        Some(TokenKind::Ident) => {}
        _ => return at + 6,
    }

    result.decls.push(AnnotatedDecl {
        name: name.text(source).to_string(),
        type_name: type_name.to_string(),
        literal,
        offset: name.start,
    });
    at + 6
}

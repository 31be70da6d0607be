//! Module-graph walking and linking.
//!
//! The walker starts at the entry, loads each module through the plugin,
//! transforms it (JSX lowering, type stripping, JSON/CSS wrapping), scans
//! the transformed source for imports, and recurses depth first. The linker
//! then rewrites every module into a block that populates a namespace
//! object, emits blocks in dependency-first order, hoists external imports
//! to the top, and re-exports the entry's names as the bundle's own.

use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use sandlot_common::diagnostics::{BundleError, BundleWarning};
use sandlot_common::paths;
use sandlot_common::position::{LineMap, line_text};
use sandlot_vfs::Vfs;

use sandlot_checker::scanner::{Token, TokenKind, scan, tokenize};

use crate::jsx::{RUNTIME_IMPORT, transform_jsx};
use crate::plugin::{ImportKind, Loader, Namespace, Resolved, SandlotPlugin};
use crate::strip::strip_types;
use crate::{BundleFailure, BundleOutput, BundleRequest, Bundler};

/// The default engine: a plugin-driven graph walker producing one flat ES
/// module.
#[derive(Default)]
pub struct GraphBundler;

impl GraphBundler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Bundler for GraphBundler {
    async fn bundle(
        &self,
        vfs: Arc<dyn Vfs>,
        request: BundleRequest,
    ) -> Result<BundleOutput, BundleFailure> {
        let plugin = SandlotPlugin::new(
            vfs,
            request.registry.clone(),
            request.installed.clone(),
            request.cdn_base.clone(),
        );
        let mut walker = Walker::new(&plugin);

        let entry = plugin
            .resolve("/", &request.entry, ImportKind::Entry)
            .map_err(|error| BundleFailure {
                errors: vec![error],
            })?;
        let _ = walker.walk(entry.clone());
        if !walker.errors.is_empty() {
            return Err(BundleFailure {
                errors: walker.errors,
            });
        }

        let mut output = link(walker, &entry);
        if request.minify {
            output.code = minify(&output.code);
        }
        tracing::debug!(
            modules = output.included_files.len(),
            externals = output.externals.len(),
            shared = output.shared_modules.len(),
            bytes = output.code.len(),
            "bundle complete"
        );
        Ok(output)
    }
}

/// Where one import specifier points after resolution.
#[derive(Clone, Debug)]
enum DepTarget {
    /// Index into `Walker::modules`.
    Module(usize),
    /// Index into `Walker::externals`.
    External(usize),
}

struct Module {
    resolved: Resolved,
    code: String,
    ns_var: String,
    deps: FxHashMap<String, DepTarget>,
}

struct External {
    path: String,
    var: String,
}

struct Walker<'a> {
    plugin: &'a SandlotPlugin,
    modules: Vec<Module>,
    /// Post-order (dependency-first) emission order.
    topo: Vec<usize>,
    seen: FxHashMap<String, usize>,
    externals: Vec<External>,
    external_index: FxHashMap<String, usize>,
    included_files: Vec<String>,
    shared_modules: Vec<String>,
    warnings: Vec<BundleWarning>,
    errors: Vec<BundleError>,
    names: NameAllocator,
}

impl<'a> Walker<'a> {
    fn new(plugin: &'a SandlotPlugin) -> Self {
        Self {
            plugin,
            modules: Vec::new(),
            topo: Vec::new(),
            seen: FxHashMap::default(),
            externals: Vec::new(),
            external_index: FxHashMap::default(),
            included_files: Vec::new(),
            shared_modules: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            names: NameAllocator::default(),
        }
    }

    fn walk(&mut self, resolved: Resolved) -> Option<usize> {
        if let Some(&idx) = self.seen.get(&resolved.path) {
            return Some(idx);
        }

        let loaded = match self.plugin.load(&resolved) {
            Ok(loaded) => loaded,
            Err(error) => {
                self.errors.push(error);
                return None;
            }
        };
        match resolved.ns {
            Namespace::Vfs => self.included_files.push(resolved.path.clone()),
            Namespace::Shared => self.shared_modules.push(resolved.path.clone()),
            Namespace::External => {}
        }

        let code = self.transform(&resolved, loaded.code, loaded.loader);
        let ns_var = self.names.allocate(&resolved.path);
        let idx = self.modules.len();
        self.seen.insert(resolved.path.clone(), idx);
        self.modules.push(Module {
            resolved: resolved.clone(),
            code,
            ns_var,
            deps: FxHashMap::default(),
        });

        let importer_dir = match resolved.ns {
            Namespace::Vfs => paths::dirname(&resolved.path),
            _ => "/".to_string(),
        };
        let scanned = scan(&self.modules[idx].code);
        let mut deps: FxHashMap<String, DepTarget> = FxHashMap::default();
        for import in &scanned.imports {
            if import.type_only || deps.contains_key(&import.specifier) {
                continue;
            }
            match self
                .plugin
                .resolve(&importer_dir, &import.specifier, ImportKind::Static)
            {
                Ok(dep) if dep.ns == Namespace::External => {
                    let ext = self.external(&dep.path);
                    deps.insert(import.specifier.clone(), DepTarget::External(ext));
                }
                Ok(dep) => {
                    if let Some(child) = self.walk(dep) {
                        deps.insert(import.specifier.clone(), DepTarget::Module(child));
                    }
                }
                Err(error) => {
                    let code = &self.modules[idx].code;
                    let map = LineMap::build(code);
                    let (line, column) = map.line_col(import.offset);
                    let mut error = error.at(self.modules[idx].resolved.path.clone(), line, column);
                    if let Some(text) = line_text(code, line) {
                        error = error.with_line_text(text.trim_end());
                    }
                    self.errors.push(error);
                }
            }
        }
        self.modules[idx].deps = deps;
        self.topo.push(idx);
        Some(idx)
    }

    fn transform(&mut self, resolved: &Resolved, code: String, loader: Loader) -> String {
        match loader {
            Loader::Js => code,
            Loader::Ts => {
                let stripped = strip_types(&code, Some(&resolved.path));
                self.warnings.extend(stripped.warnings);
                stripped.code
            }
            Loader::Tsx | Loader::Jsx => {
                let lowered = transform_jsx(&code);
                let mut out = if lowered.lowered {
                    format!("{RUNTIME_IMPORT}{}", lowered.code)
                } else {
                    lowered.code
                };
                if loader == Loader::Tsx {
                    let stripped = strip_types(&out, Some(&resolved.path));
                    self.warnings.extend(stripped.warnings);
                    out = stripped.code;
                }
                out
            }
            Loader::Json => format!("export default {};\n", code.trim_end()),
            Loader::Css | Loader::Text => {
                format!("export default {};\n", js_string_literal(&code))
            }
        }
    }

    fn external(&mut self, path: &str) -> usize {
        if let Some(&idx) = self.external_index.get(path) {
            return idx;
        }
        let idx = self.externals.len();
        let var = self.names.allocate_external(path);
        self.externals.push(External {
            path: path.to_string(),
            var,
        });
        self.external_index.insert(path.to_string(), idx);
        idx
    }
}

#[derive(Default)]
struct NameAllocator {
    used: FxHashMap<String, usize>,
}

impl NameAllocator {
    fn allocate(&mut self, path: &str) -> String {
        self.unique(format!("{}_exports", sanitize_stem(path)))
    }

    fn allocate_external(&mut self, path: &str) -> String {
        self.unique(format!("import_{}", sanitize_stem(path)))
    }

    fn unique(&mut self, base: String) -> String {
        let count = self.used.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base
        } else {
            format!("{base}{count}")
        }
    }
}

/// `/src/App.tsx` -> `App`, `https://cdn/nanoid@5.1.6` -> `nanoid`,
/// `@tanstack/react-query` -> `react_query`.
fn sanitize_stem(path: &str) -> String {
    let tail = path.rsplit('/').next().unwrap_or(path);
    let tail = tail.split_once('.').map_or(tail, |(stem, _)| stem);
    let tail = match tail.rfind('@') {
        Some(idx) if idx > 0 => &tail[..idx],
        _ => tail,
    };
    let mut out = String::with_capacity(tail.len());
    for c in tail.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() || out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn js_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Link all walked modules into the final ES module.
fn link(walker: Walker<'_>, entry: &Resolved) -> BundleOutput {
    let Walker {
        modules,
        topo,
        externals,
        included_files,
        shared_modules,
        mut warnings,
        seen,
        ..
    } = walker;
    let entry_idx = seen[&entry.path];

    let mut uses_reexport_helper = false;
    let mut bodies: Vec<String> = Vec::new();
    let mut entry_exports: Vec<String> = Vec::new();

    for &idx in &topo {
        let module = &modules[idx];
        let rewritten = rewrite_module(module, &modules, &externals, &mut warnings);
        uses_reexport_helper |= rewritten.uses_reexport_helper;
        if idx == entry_idx {
            entry_exports = rewritten.exported;
        }
        bodies.push(format!(
            "// {}\n{{\n{}\n}}\n",
            module.resolved.path, rewritten.body
        ));
    }

    let mut out = String::new();
    for external in &externals {
        out.push_str(&format!(
            "import * as {} from {};\n",
            external.var,
            js_string_literal(&external.path)
        ));
    }
    if uses_reexport_helper {
        out.push_str(
            "var __reExport = (target, source) => {\n  for (var key of Object.keys(source)) if (key !== \"default\") target[key] = source[key];\n};\n",
        );
    }
    for &idx in &topo {
        out.push_str(&format!("var {} = {{}};\n", modules[idx].ns_var));
    }
    for body in &bodies {
        out.push_str(body);
    }

    let entry_ns = &modules[entry_idx].ns_var;
    for name in &entry_exports {
        if name == "default" {
            out.push_str(&format!("export default {entry_ns}.default;\n"));
        } else {
            out.push_str(&format!("export const {name} = {entry_ns}.{name};\n"));
        }
    }

    BundleOutput {
        code: out,
        warnings,
        included_files,
        shared_modules,
        externals: externals.into_iter().map(|e| e.path).collect(),
        entry_exports,
    }
}

struct RewrittenModule {
    body: String,
    exported: Vec<String>,
    uses_reexport_helper: bool,
}

/// Rewrite one module's import/export statements against its namespace
/// object.
fn rewrite_module(
    module: &Module,
    modules: &[Module],
    externals: &[External],
    warnings: &mut Vec<BundleWarning>,
) -> RewrittenModule {
    let code = &module.code;
    let tokens = tokenize(code);
    let ns = &module.ns_var;

    let target_var = |specifier: &str| -> Option<String> {
        match module.deps.get(specifier)? {
            DepTarget::Module(idx) => Some(modules[*idx].ns_var.clone()),
            DepTarget::External(idx) => Some(externals[*idx].var.clone()),
        }
    };

    let mut edits: Vec<(u32, u32, String)> = Vec::new();
    let mut tail: Vec<String> = Vec::new();
    let mut exported: Vec<String> = Vec::new();
    let mut uses_reexport_helper = false;

    let mut depth = 0usize;
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        match token.kind {
            TokenKind::Punct('{') => {
                depth += 1;
                i += 1;
            }
            TokenKind::Punct('}') => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            TokenKind::Ident if token.text(code) == "import" => {
                // Dynamic `import("spec")` rewrites at any depth.
                if tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::Punct('(')) {
                    i = rewrite_dynamic_import(code, &tokens, i, &target_var, module, &mut edits);
                    continue;
                }
                if depth == 0 {
                    i = rewrite_static_import(code, &tokens, i, &target_var, &mut edits);
                    continue;
                }
                i += 1;
            }
            TokenKind::Ident if token.text(code) == "require" => {
                if tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::Punct('('))
                    && tokens.get(i + 2).map(|t| t.kind) == Some(TokenKind::Str)
                    && tokens.get(i + 3).map(|t| t.kind) == Some(TokenKind::Punct(')'))
                {
                    let spec = tokens[i + 2].str_value(code);
                    if let Some(var) = target_var(spec) {
                        edits.push((token.start, tokens[i + 3].end, var));
                    }
                    i += 4;
                    continue;
                }
                i += 1;
            }
            TokenKind::Ident if depth == 0 && token.text(code) == "export" => {
                i = rewrite_export(
                    code,
                    &tokens,
                    i,
                    ns,
                    &target_var,
                    &mut edits,
                    &mut tail,
                    &mut exported,
                    &mut uses_reexport_helper,
                    warnings,
                    &module.resolved.path,
                );
            }
            _ => i += 1,
        }
    }

    let mut body = apply_edits(code, edits);
    for assignment in tail {
        body.push_str(&assignment);
        body.push('\n');
    }
    exported.dedup();
    RewrittenModule {
        body,
        exported,
        uses_reexport_helper,
    }
}

fn rewrite_dynamic_import(
    code: &str,
    tokens: &[Token],
    i: usize,
    target_var: &dyn Fn(&str) -> Option<String>,
    module: &Module,
    edits: &mut Vec<(u32, u32, String)>,
) -> usize {
    let (Some(spec_token), Some(close)) = (tokens.get(i + 2), tokens.get(i + 3)) else {
        return i + 1;
    };
    if spec_token.kind != TokenKind::Str || close.kind != TokenKind::Punct(')') {
        return i + 2;
    }
    // Bundled modules and hoisted externals both already exist by the time
    // the bundle runs; the promise just hands their namespace back.
    let spec = spec_token.str_value(code);
    if let Some(var) = target_var(spec) {
        edits.push((tokens[i].start, close.end, format!("Promise.resolve({var})")));
    }
    i + 4
}

fn rewrite_static_import(
    code: &str,
    tokens: &[Token],
    i: usize,
    target_var: &dyn Fn(&str) -> Option<String>,
    edits: &mut Vec<(u32, u32, String)>,
) -> usize {
    let mut default_name: Option<String> = None;
    let mut star_name: Option<String> = None;
    let mut named: Vec<(String, String)> = Vec::new();

    let mut j = i + 1;
    // Side-effect import: `import "spec";`
    if let Some(spec_token) = tokens.get(j).filter(|t| t.kind == TokenKind::Str) {
        let end = statement_end(tokens, j + 1);
        // Bundled side-effect modules run in topo order; externals are
        // hoisted. Either way the statement itself disappears.
        let _ = target_var(spec_token.str_value(code));
        edits.push((tokens[i].start, end, String::new()));
        return token_index_at(tokens, end);
    }

    while let Some(token) = tokens.get(j) {
        match token.kind {
            TokenKind::Ident if token.text(code) == "from" => {
                let Some(spec_token) = tokens.get(j + 1).filter(|t| t.kind == TokenKind::Str)
                else {
                    return j + 1;
                };
                let spec = spec_token.str_value(code);
                let end = statement_end(tokens, j + 2);
                let replacement = match target_var(spec) {
                    Some(var) => {
                        let mut parts: Vec<String> = Vec::new();
                        if let Some(name) = &default_name {
                            parts.push(format!("const {name} = {var}.default ?? {var};"));
                        }
                        if let Some(name) = &star_name {
                            parts.push(format!("const {name} = {var};"));
                        }
                        if !named.is_empty() {
                            let bindings = named
                                .iter()
                                .map(|(imported, local)| {
                                    if imported == local {
                                        imported.clone()
                                    } else {
                                        format!("{imported}: {local}")
                                    }
                                })
                                .collect::<Vec<_>>()
                                .join(", ");
                            parts.push(format!("const {{ {bindings} }} = {var};"));
                        }
                        parts.join(" ")
                    }
                    None => String::new(),
                };
                edits.push((tokens[i].start, end, replacement));
                return token_index_at(tokens, end);
            }
            TokenKind::Ident if token.text(code) == "as" => {
                j += 1;
            }
            TokenKind::Punct('*') => {
                // `* as name`
                if tokens.get(j + 1).is_some_and(|t| t.text(code) == "as") {
                    if let Some(name) = tokens.get(j + 2).filter(|t| t.kind == TokenKind::Ident) {
                        star_name = Some(name.text(code).to_string());
                        j += 3;
                        continue;
                    }
                }
                j += 1;
            }
            TokenKind::Punct('{') => {
                j = parse_named_imports(code, tokens, j + 1, &mut named);
            }
            TokenKind::Ident => {
                default_name = Some(token.text(code).to_string());
                j += 1;
            }
            TokenKind::Punct(',') => j += 1,
            _ => return j + 1,
        }
    }
    j
}

/// `{ a, b as c, type T, default as d }` — returns index after `}`.
fn parse_named_imports(
    code: &str,
    tokens: &[Token],
    mut j: usize,
    named: &mut Vec<(String, String)>,
) -> usize {
    while let Some(token) = tokens.get(j) {
        match token.kind {
            TokenKind::Punct('}') => return j + 1,
            TokenKind::Punct(',') => j += 1,
            TokenKind::Ident => {
                // Inline type-only entries vanish at runtime.
                if token.text(code) == "type"
                    && tokens.get(j + 1).is_some_and(|t| {
                        t.kind == TokenKind::Ident && !matches!(t.text(code), "as")
                    })
                {
                    j += 1;
                    while tokens.get(j).is_some_and(|t| {
                        !matches!(t.kind, TokenKind::Punct(',') | TokenKind::Punct('}'))
                    }) {
                        j += 1;
                    }
                    continue;
                }
                let imported = token.text(code).to_string();
                if tokens.get(j + 1).is_some_and(|t| t.text(code) == "as") {
                    if let Some(local) = tokens.get(j + 2).filter(|t| t.kind == TokenKind::Ident) {
                        named.push((imported, local.text(code).to_string()));
                        j += 3;
                        continue;
                    }
                }
                named.push((imported.clone(), imported));
                j += 1;
            }
            _ => j += 1,
        }
    }
    j
}

#[allow(clippy::too_many_arguments)]
fn rewrite_export(
    code: &str,
    tokens: &[Token],
    i: usize,
    ns: &str,
    target_var: &dyn Fn(&str) -> Option<String>,
    edits: &mut Vec<(u32, u32, String)>,
    tail: &mut Vec<String>,
    exported: &mut Vec<String>,
    uses_reexport_helper: &mut bool,
    warnings: &mut Vec<BundleWarning>,
    module_path: &str,
) -> usize {
    let export_token = tokens[i];
    let Some(next) = tokens.get(i + 1) else {
        return i + 1;
    };

    match next.kind {
        TokenKind::Ident if next.text(code) == "default" => {
            edits.push((export_token.start, next.end, format!("{ns}.default =")));
            exported.push("default".to_string());
            i + 2
        }
        TokenKind::Ident if matches!(next.text(code), "const" | "let" | "var") => {
            edits.push((export_token.start, next.start, String::new()));
            let names = declared_names(code, tokens, i + 1);
            for name in &names {
                tail.push(format!("{ns}.{name} = {name};"));
                exported.push(name.clone());
            }
            i + 2
        }
        TokenKind::Ident if matches!(next.text(code), "function" | "class" | "async") => {
            edits.push((export_token.start, next.start, String::new()));
            let name_at = if next.text(code) == "async" { i + 3 } else { i + 2 };
            if let Some(name) = tokens.get(name_at).filter(|t| t.kind == TokenKind::Ident) {
                let name = name.text(code).to_string();
                tail.push(format!("{ns}.{name} = {name};"));
                exported.push(name);
            }
            i + 2
        }
        TokenKind::Punct('*') => {
            // `export * from "spec"` / `export * as name from "spec"`
            let mut j = i + 2;
            let star_alias = if tokens.get(i + 2).is_some_and(|t| t.text(code) == "as") {
                j = i + 4;
                tokens
                    .get(i + 3)
                    .map(|t| t.text(code).to_string())
            } else {
                None
            };
            if !tokens.get(j).is_some_and(|t| t.text(code) == "from") {
                return i + 1;
            }
            let Some(spec_token) = tokens.get(j + 1).filter(|t| t.kind == TokenKind::Str) else {
                return j + 1;
            };
            let spec = spec_token.str_value(code);
            let end = statement_end(tokens, j + 2);
            let replacement = match (target_var(spec), star_alias) {
                (Some(var), Some(alias)) => {
                    exported.push(alias.clone());
                    format!("{ns}.{alias} = {var};")
                }
                (Some(var), None) => {
                    *uses_reexport_helper = true;
                    warnings.push(BundleWarning {
                        text: format!(
                            "`export * from \"{spec}\"` re-exports are not reflected in the bundle's static export list"
                        ),
                        file: Some(module_path.to_string()),
                        line: None,
                        column: None,
                    });
                    format!("__reExport({ns}, {var});")
                }
                (None, _) => String::new(),
            };
            edits.push((export_token.start, end, replacement));
            token_index_at(tokens, end)
        }
        TokenKind::Punct('{') => {
            let mut entries: Vec<(String, String)> = Vec::new();
            let after = parse_named_imports(code, tokens, i + 2, &mut entries);
            // `export { ... } from "spec"`?
            if tokens.get(after).is_some_and(|t| t.text(code) == "from") {
                let Some(spec_token) = tokens.get(after + 1).filter(|t| t.kind == TokenKind::Str)
                else {
                    return after + 1;
                };
                let spec = spec_token.str_value(code);
                let end = statement_end(tokens, after + 2);
                let replacement = match target_var(spec) {
                    Some(var) => entries
                        .iter()
                        .map(|(source_name, exported_name)| {
                            exported.push(exported_name.clone());
                            format!("{ns}.{exported_name} = {var}.{source_name};")
                        })
                        .collect::<Vec<_>>()
                        .join(" "),
                    None => String::new(),
                };
                edits.push((export_token.start, end, replacement));
                return token_index_at(tokens, end);
            }
            let end = statement_end(tokens, after);
            for (local, exported_name) in &entries {
                tail.push(format!("{ns}.{exported_name} = {local};"));
                exported.push(exported_name.clone());
            }
            edits.push((export_token.start, end, String::new()));
            token_index_at(tokens, end)
        }
        _ => i + 1,
    }
}

/// Binding names introduced by a `const`/`let`/`var` declaration, including
/// simple destructuring patterns.
fn declared_names(code: &str, tokens: &[Token], decl_at: usize) -> Vec<String> {
    let mut names = Vec::new();
    let mut j = decl_at + 1;

    match tokens.get(j).map(|t| t.kind) {
        Some(TokenKind::Ident) => {
            names.push(tokens[j].text(code).to_string());
            // Further declarators: `const x = 1, y = 2;`
            let mut depth = 0isize;
            j += 1;
            while let Some(token) = tokens.get(j) {
                match token.kind {
                    TokenKind::Punct(c) if matches!(c, '(' | '{' | '[') => depth += 1,
                    TokenKind::Punct(c) if matches!(c, ')' | '}' | ']') => {
                        depth -= 1;
                        if depth < 0 {
                            break;
                        }
                    }
                    TokenKind::Punct(';') if depth == 0 => break,
                    TokenKind::Punct(',') if depth == 0 => {
                        if let Some(name) =
                            tokens.get(j + 1).filter(|t| t.kind == TokenKind::Ident)
                        {
                            names.push(name.text(code).to_string());
                        }
                    }
                    _ => {}
                }
                j += 1;
            }
        }
        Some(TokenKind::Punct('{')) | Some(TokenKind::Punct('[')) => {
            let open = tokens[j].kind;
            let close = if open == TokenKind::Punct('{') { '}' } else { ']' };
            let mut depth = 0usize;
            while let Some(token) = tokens.get(j) {
                match token.kind {
                    TokenKind::Punct(c) if c == '{' || c == '[' => depth += 1,
                    TokenKind::Punct(c) if c == '}' || c == ']' => {
                        depth -= 1;
                        if depth == 0 && c == close {
                            break;
                        }
                    }
                    TokenKind::Ident => {
                        // A binding position: followed by `,`, `}`/`]`, or `=`.
                        let binds = matches!(
                            tokens.get(j + 1).map(|t| t.kind),
                            Some(TokenKind::Punct(','))
                                | Some(TokenKind::Punct('}'))
                                | Some(TokenKind::Punct(']'))
                                | Some(TokenKind::Punct('='))
                        );
                        if binds {
                            names.push(token.text(code).to_string());
                        }
                    }
                    _ => {}
                }
                j += 1;
            }
        }
        _ => {}
    }
    names
}

/// Byte offset just past the end of a statement: past a trailing `;` when
/// present, else the end of the previous token.
fn statement_end(tokens: &[Token], after: usize) -> u32 {
    match tokens.get(after) {
        Some(token) if token.kind == TokenKind::Punct(';') => token.end,
        _ => tokens
            .get(after.saturating_sub(1))
            .map(|t| t.end)
            .unwrap_or(0),
    }
}

/// First token index whose start is at or past `offset`.
fn token_index_at(tokens: &[Token], offset: u32) -> usize {
    tokens
        .iter()
        .position(|t| t.start >= offset)
        .unwrap_or(tokens.len())
}

fn apply_edits(code: &str, mut edits: Vec<(u32, u32, String)>) -> String {
    edits.sort_by_key(|(start, _, _)| *start);
    let mut out = String::with_capacity(code.len());
    let mut cursor = 0usize;
    for (start, end, replacement) in edits {
        let (start, end) = (start as usize, end as usize);
        if start < cursor {
            continue;
        }
        out.push_str(&code[cursor..start]);
        out.push_str(&replacement);
        cursor = end.min(code.len());
    }
    out.push_str(&code[cursor..]);
    out
}

/// Whitespace-level minification: comments drop (they live in inter-token
/// gaps), blank runs collapse to one newline or one space.
#[must_use]
pub fn minify(code: &str) -> String {
    let tokens = tokenize(code);
    let mut out = String::with_capacity(code.len());
    let mut cursor = 0usize;
    for token in &tokens {
        let gap = &code[cursor..token.start as usize];
        if !gap.is_empty() && !out.is_empty() {
            if gap.contains('\n') {
                out.push('\n');
            } else if gap.contains(' ') || gap.contains('\t') {
                out.push(' ');
            }
        }
        out.push_str(token.text(code));
        cursor = token.end as usize;
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

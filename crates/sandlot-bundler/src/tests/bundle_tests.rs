use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;

use sandlot_registry::SharedModuleRegistry;
use sandlot_vfs::{MemoryVfs, Vfs};

use crate::{BundleRequest, Bundler, GraphBundler};

fn request(entry: &str) -> BundleRequest {
    BundleRequest {
        entry: entry.to_string(),
        installed: BTreeMap::new(),
        registry: None,
        cdn_base: "https://esm.sh".to_string(),
        minify: false,
    }
}

fn vfs_with(files: &[(&str, &str)]) -> Arc<MemoryVfs> {
    Arc::new(MemoryVfs::with_files(files.iter().copied()))
}

async fn bundle(
    vfs: Arc<MemoryVfs>,
    req: BundleRequest,
) -> Result<crate::BundleOutput, crate::BundleFailure> {
    GraphBundler::new().bundle(vfs, req).await
}

#[tokio::test]
async fn bundles_a_single_module() {
    let vfs = vfs_with(&[("/index.ts", "export const answer: number = 42;\n")]);
    let output = bundle(vfs, request("/index.ts")).await.unwrap();

    assert_eq!(output.included_files, vec!["/index.ts"]);
    assert_eq!(output.entry_exports, vec!["answer"]);
    assert!(output.code.contains("var index_exports = {};"));
    assert!(output.code.contains("index_exports.answer = answer;"));
    assert!(output.code.contains("export const answer = index_exports.answer;"));
    // The annotation is gone.
    assert!(!output.code.contains(": number"));
}

#[tokio::test]
async fn bundles_relative_imports_dependency_first() {
    let vfs = vfs_with(&[
        (
            "/index.ts",
            "import { greet } from \"./lib/greet\";\nexport const message = greet(\"world\");\n",
        ),
        (
            "/lib/greet.ts",
            "export function greet(name: string): string {\n  return `hi ${name}`;\n}\n",
        ),
    ]);
    let output = bundle(vfs, request("/index.ts")).await.unwrap();

    // Resolve-first-visit order.
    assert_eq!(output.included_files, vec!["/index.ts", "/lib/greet.ts"]);
    // Dependency body is emitted before the entry body.
    let greet_pos = output.code.find("// /lib/greet.ts").unwrap();
    let index_pos = output.code.find("// /index.ts").unwrap();
    assert!(greet_pos < index_pos);
    assert!(output.code.contains("const { greet } = greet_exports;"));
}

#[tokio::test]
async fn bundling_is_deterministic() {
    let files = &[
        ("/index.ts", "import \"./a\";\nimport \"./b\";\nexport const x = 1;\n"),
        ("/a.ts", "export const a = 1;\n"),
        ("/b.ts", "export const b = 2;\n"),
    ];
    let first = bundle(vfs_with(files), request("/index.ts")).await.unwrap();
    let second = bundle(vfs_with(files), request("/index.ts")).await.unwrap();
    assert_eq!(first.code, second.code);
}

#[tokio::test]
async fn every_included_file_exists_in_the_vfs() {
    let vfs = vfs_with(&[
        ("/index.ts", "import \"./a\";\nimport data from \"./data.json\";\nexport const d = data;\n"),
        ("/a.ts", "export {};\n"),
        ("/data.json", "{\"k\": 1}\n"),
    ]);
    let output = bundle(vfs.clone(), request("/index.ts")).await.unwrap();
    for path in &output.included_files {
        assert!(vfs.exists(path), "{path} missing");
    }
    assert!(output.code.contains("data_exports.default = {\"k\": 1};"));
}

#[tokio::test]
async fn installed_packages_become_hoisted_external_imports() {
    let vfs = vfs_with(&[(
        "/index.ts",
        "import { nanoid } from 'nanoid';\nexport const id = nanoid();\n",
    )]);
    let mut req = request("/index.ts");
    req.installed.insert("nanoid".to_string(), "5.1.6".to_string());

    let output = bundle(vfs, req).await.unwrap();
    assert_eq!(output.externals, vec!["https://esm.sh/nanoid@5.1.6"]);
    assert!(
        output
            .code
            .contains("import * as import_nanoid from \"https://esm.sh/nanoid@5.1.6\";")
    );
    assert!(output.code.contains("const { nanoid } = import_nanoid;"));
    assert_eq!(output.entry_exports, vec!["id"]);
}

#[tokio::test]
async fn shared_modules_bundle_as_registry_stubs() {
    let registry = SharedModuleRegistry::new([(
        "react",
        json!({"useState": "fn", "useEffect": "fn"}),
    )]);
    let key = registry.registry_key().to_string();
    let vfs = vfs_with(&[(
        "/index.ts",
        "import { useState } from \"react\";\nexport const hook = useState;\n",
    )]);
    let mut req = request("/index.ts");
    req.registry = Some(registry);

    let output = bundle(vfs, req).await.unwrap();
    assert_eq!(output.shared_modules, vec!["react"]);
    assert!(output.code.contains(&format!("globalThis[\"{key}\"]")));
    assert!(output.code.contains("registry.get(\"react\")"));
    assert!(output.code.contains("const useState = __mod__.useState;"));
    assert!(output.code.contains("react_exports.useState = useState;"));
    // The importing module reads the stub's namespace object.
    assert!(output.code.contains("const { useState } = react_exports;"));
}

#[tokio::test]
async fn unresolved_relative_import_fails_with_position() {
    let vfs = vfs_with(&[(
        "/index.ts",
        "import { a } from \"./missing\";\nexport const x = a;\n",
    )]);
    let failure = bundle(vfs, request("/index.ts")).await.unwrap_err();
    let error = &failure.errors[0];
    assert!(error.text.contains("./missing"));
    assert_eq!(error.file.as_deref(), Some("/index.ts"));
    assert_eq!(error.line, Some(1));
    assert!(error.line_text.as_deref().unwrap().contains("./missing"));
}

#[tokio::test]
async fn missing_entry_fails() {
    let vfs = vfs_with(&[]);
    let failure = bundle(vfs, request("/index.ts")).await.unwrap_err();
    assert!(failure.errors[0].text.contains("entry point"));
}

#[tokio::test]
async fn tsx_files_lower_jsx_through_the_shared_runtime() {
    let registry = SharedModuleRegistry::new([(
        "react/jsx-runtime",
        json!({"jsx": "fn", "jsxs": "fn", "Fragment": "sym"}),
    )]);
    let vfs = vfs_with(&[(
        "/App.tsx",
        "export default function App(): unknown {\n  return <main id=\"app\">hello</main>;\n}\n",
    )]);
    let mut req = request("/App.tsx");
    req.registry = Some(registry);

    let output = bundle(vfs, req).await.unwrap();
    assert_eq!(output.shared_modules, vec!["react/jsx-runtime"]);
    assert!(output.code.contains("_jsx(\"main\", { id: \"app\", children: \"hello\" })"));
    assert!(output.code.contains("registry.get(\"react/jsx-runtime\")"));
    assert!(output.entry_exports.contains(&"default".to_string()));
}

#[tokio::test]
async fn dynamic_imports_of_bundled_modules_resolve_inline() {
    let vfs = vfs_with(&[
        (
            "/index.ts",
            "export const load = () => import(\"./lazy\");\n",
        ),
        ("/lazy.ts", "export const lazy = true;\n"),
    ]);
    let output = bundle(vfs, request("/index.ts")).await.unwrap();
    assert!(output.code.contains("Promise.resolve(lazy_exports)"));
    assert_eq!(output.included_files, vec!["/index.ts", "/lazy.ts"]);
}

#[tokio::test]
async fn reexports_flow_through_namespaces() {
    let vfs = vfs_with(&[
        (
            "/index.ts",
            "export { helper as util } from \"./helper\";\n",
        ),
        ("/helper.ts", "export const helper = 1;\n"),
    ]);
    let output = bundle(vfs, request("/index.ts")).await.unwrap();
    assert!(
        output
            .code
            .contains("index_exports.util = helper_exports.helper;")
    );
    assert_eq!(output.entry_exports, vec!["util"]);
    assert!(output.code.contains("export const util = index_exports.util;"));
}

#[tokio::test]
async fn star_reexports_warn_about_static_exports() {
    let vfs = vfs_with(&[
        ("/index.ts", "export * from \"./all\";\n"),
        ("/all.ts", "export const a = 1;\nexport const b = 2;\n"),
    ]);
    let output = bundle(vfs, request("/index.ts")).await.unwrap();
    assert!(output.code.contains("__reExport(index_exports, all_exports);"));
    assert!(!output.warnings.is_empty());
}

#[tokio::test]
async fn minify_drops_comments_and_blank_lines() {
    let vfs = vfs_with(&[(
        "/index.ts",
        "// entry\nexport const x = 1;\n\n\n/* block */\nexport const y = 2;\n",
    )]);
    let mut req = request("/index.ts");
    req.minify = true;
    let output = bundle(vfs, req).await.unwrap();
    assert!(!output.code.contains("// entry"));
    assert!(!output.code.contains("/* block */"));
    assert!(!output.code.contains("\n\n"));
}

#[tokio::test]
async fn css_imports_become_text_defaults() {
    let vfs = vfs_with(&[
        (
            "/index.ts",
            "import styles from \"./app.css\";\nexport const css = styles;\n",
        ),
        ("/app.css", ".app { color: red }\n"),
    ]);
    let output = bundle(vfs, request("/index.ts")).await.unwrap();
    assert!(output.code.contains(".app { color: red }"));
    assert!(output.included_files.contains(&"/app.css".to_string()));
}

use std::sync::Arc;

use sandlot_common::diagnostics::Severity;
use sandlot_vfs::{MemoryVfs, Vfs};

use crate::Typechecker;
use crate::service::LanguageService;

fn service_with(files: &[(&str, &str)]) -> (LanguageService, Arc<MemoryVfs>) {
    let vfs = Arc::new(MemoryVfs::with_files(files.iter().copied()));
    (LanguageService::new(vfs.clone()), vfs)
}

#[test]
fn clean_file_checks_successfully() {
    let (service, _) = service_with(&[("/index.ts", "export const x = 1;\n")]);
    let outcome = service.check("/index.ts");
    assert!(outcome.success);
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn literal_type_mismatch_is_an_error_with_position() {
    let (service, _) = service_with(&[("/a.ts", "const n: number = \"s\";\n")]);
    let outcome = service.check("/a.ts");
    assert!(!outcome.success);
    let diag = &outcome.diagnostics[0];
    assert_eq!(diag.file.as_deref(), Some("/a.ts"));
    assert_eq!(diag.line, Some(1));
    assert_eq!(diag.severity, Severity::Error);
    assert!(diag.message.contains("not assignable"));
}

#[test]
fn missing_entry_fails_with_named_file() {
    let (service, _) = service_with(&[]);
    let outcome = service.check("/missing.ts");
    assert!(!outcome.success);
    assert_eq!(outcome.diagnostics[0].file.as_deref(), Some("/missing.ts"));
}

#[test]
fn unresolved_relative_import_is_cannot_find_module() {
    let (service, _) = service_with(&[("/index.ts", "import { a } from \"./missing\";\n")]);
    let outcome = service.check("/index.ts");
    assert!(!outcome.success);
    assert!(
        outcome.diagnostics[0]
            .message
            .contains("Cannot find module './missing'")
    );
}

#[test]
fn check_follows_the_transitive_closure() {
    let (service, _) = service_with(&[
        ("/index.ts", "import { helper } from \"./lib/helper\";\n"),
        ("/lib/helper.ts", "import \"./broken\";\nexport const helper = 1;\n"),
    ]);
    let outcome = service.check("/index.ts");
    assert!(!outcome.success);
    assert_eq!(outcome.diagnostics[0].file.as_deref(), Some("/lib/helper.ts"));
}

#[test]
fn files_outside_the_closure_are_not_checked() {
    let (service, _) = service_with(&[
        ("/index.ts", "export const ok = 1;\n"),
        ("/unrelated.ts", "const n: number = \"bad\";\n"),
    ]);
    let outcome = service.check("/index.ts");
    assert!(outcome.success);
}

#[test]
fn installed_type_trees_resolve_bare_imports() {
    let (service, _) = service_with(&[
        (
            "/index.ts",
            "import { nanoid } from \"nanoid\";\nexport const id = nanoid();\n",
        ),
        (
            "/node_modules/nanoid/index.d.ts",
            "export declare function nanoid(size?: number): string;\n",
        ),
    ]);
    let outcome = service.check("/index.ts");
    assert!(outcome.success, "diagnostics: {:?}", outcome.diagnostics);
}

#[test]
fn subpath_imports_resolve_inside_packages() {
    let (service, _) = service_with(&[
        ("/index.ts", "import \"react/jsx-runtime\";\n"),
        ("/node_modules/react/jsx-runtime.d.ts", "export {};\n"),
    ]);
    assert!(service.check("/index.ts").success);
}

#[test]
fn unresolved_peer_inside_type_tree_names_the_peer() {
    let (service, _) = service_with(&[
        (
            "/index.ts",
            "import { QueryClient } from \"@tanstack/react-query\";\nconst c = new QueryClient();\nexport default c;\n",
        ),
        (
            "/node_modules/@tanstack/react-query/index.d.ts",
            "export * from \"@tanstack/query-core\";\nexport declare class QueryClient {}\n",
        ),
    ]);
    let outcome = service.check("/index.ts");
    assert!(!outcome.success);
    assert!(
        outcome
            .diagnostics
            .iter()
            .any(|d| d.message.contains("'@tanstack/query-core'"))
    );
}

#[test]
fn resolved_peers_make_the_program_clean() {
    let (service, _) = service_with(&[
        (
            "/index.ts",
            "import { QueryClient } from \"@tanstack/react-query\";\nexport const c = new QueryClient();\n",
        ),
        (
            "/node_modules/@tanstack/react-query/index.d.ts",
            "export * from \"@tanstack/query-core\";\nexport declare class QueryClient {}\n",
        ),
        (
            "/node_modules/@tanstack/query-core/index.d.ts",
            "export declare class QueryCache {}\n",
        ),
    ]);
    assert!(service.check("/index.ts").success);
}

#[test]
fn tsconfig_paths_aliases_resolve() {
    let (service, _) = service_with(&[
        (
            "/tsconfig.json",
            r#"{ "compilerOptions": { "baseUrl": "/", "paths": { "@/*": ["./src/*"] } } }"#,
        ),
        ("/index.ts", "import { app } from \"@/app\";\nexport default app;\n"),
        ("/src/app.ts", "export const app = 1;\n"),
    ]);
    assert!(service.check("/index.ts").success);
}

#[test]
fn type_only_imports_still_resolve() {
    let (service, _) = service_with(&[
        ("/index.ts", "import type { T } from \"./types\";\nexport const x: number = 1;\n"),
    ]);
    let outcome = service.check("/index.ts");
    assert!(!outcome.success);
    assert!(outcome.diagnostics[0].message.contains("'./types'"));
}

#[test]
fn unchanged_files_keep_their_version() {
    let (service, vfs) = service_with(&[("/index.ts", "export const x = 1;\n")]);
    service.check("/index.ts");
    assert_eq!(service.file_version("/index.ts"), Some(1));

    service.check("/index.ts");
    assert_eq!(service.file_version("/index.ts"), Some(1));

    vfs.write_file("/index.ts", "export const x = 2;\n").unwrap();
    service.check("/index.ts");
    assert_eq!(service.file_version("/index.ts"), Some(2));
}

#[test]
fn declaration_files_are_exempt_from_literal_checks() {
    let (service, _) = service_with(&[
        ("/index.ts", "import \"pkg\";\nexport {};\n"),
        (
            "/node_modules/pkg/index.d.ts",
            "declare const weird: number;\nexport { weird };\n",
        ),
    ]);
    assert!(service.check("/index.ts").success);
}

use crate::sandlot::SandlotOptions;
use crate::test_support::{CannedCdn, nanoid_cdn, sandlot};

#[tokio::test]
async fn unknown_commands_are_caller_errors() {
    let lot = sandlot(CannedCdn::default(), SandlotOptions::new());
    let sandbox = lot.create_sandbox().await;

    let result = sandbox.exec("frobnicate --hard").await;
    assert_eq!(result.exit_code, 1);
    assert!(result.stdout.is_empty());
    assert!(!result.stderr.is_empty());

    let empty = sandbox.exec("   ").await;
    assert_eq!(empty.exit_code, 1);
}

#[tokio::test]
async fn install_command_reports_the_pin() {
    let lot = sandlot(nanoid_cdn(), SandlotOptions::new());
    let sandbox = lot.create_sandbox().await;

    let result = sandbox.exec("install nanoid@5.1.6").await;
    assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);
    assert!(result.stdout.contains("Installed nanoid@5.1.6"));
    assert!(result.stdout.contains("type file"));
}

#[tokio::test]
async fn install_without_types_warns_but_succeeds() {
    let lot = sandlot(CannedCdn::default(), SandlotOptions::new());
    let sandbox = lot.create_sandbox().await;

    let result = sandbox.exec("install ghost").await;
    assert_eq!(result.exit_code, 0);
    assert!(result.stdout.contains("Installed ghost@latest"));
    assert!(result.stderr.contains("warning:"));
}

#[tokio::test]
async fn uninstall_of_missing_package_is_exit_one() {
    let lot = sandlot(nanoid_cdn(), SandlotOptions::new());
    let sandbox = lot.create_sandbox().await;

    let missing = sandbox.exec("uninstall nanoid").await;
    assert_eq!(missing.exit_code, 1);
    assert!(missing.stderr.contains("not installed"));

    sandbox.exec("install nanoid@5.1.6").await;
    let removed = sandbox.exec("uninstall nanoid").await;
    assert_eq!(removed.exit_code, 0);
    assert!(removed.stdout.contains("Removed nanoid"));
}

#[tokio::test]
async fn build_command_reports_summary_and_flags_work() {
    let lot = sandlot(CannedCdn::default(), SandlotOptions::new());
    let sandbox = lot.create_sandbox().await;
    sandbox
        .write_file("/index.ts", "// note\nexport const x: number = 1;\n")
        .unwrap();

    let result = sandbox.exec("build --skip-typecheck --minify").await;
    assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);
    assert!(result.stdout.contains("Built /index.ts"));

    let last = sandbox.last_build().unwrap();
    assert!(!last.code.contains("// note"));
}

#[tokio::test]
async fn build_command_renders_typecheck_failures() {
    let lot = sandlot(CannedCdn::default(), SandlotOptions::new());
    let sandbox = lot.create_sandbox().await;
    sandbox
        .write_file("/index.ts", "const n: number = \"s\";\nexport const x = n;\n")
        .unwrap();

    let result = sandbox.exec("build").await;
    assert_eq!(result.exit_code, 2);
    assert!(result.stderr.contains("ERROR: /index.ts:1:"));
    assert!(result.stderr.contains("not assignable"));
}

#[tokio::test]
async fn build_command_renders_bundle_errors_with_caret() {
    let lot = sandlot(CannedCdn::default(), SandlotOptions::new());
    let sandbox = lot.create_sandbox().await;
    sandbox
        .write_file(
            "/index.ts",
            "import { a } from \"./missing\";\nexport const x = a;\n",
        )
        .unwrap();

    let result = sandbox.exec("build --skip-typecheck").await;
    assert_eq!(result.exit_code, 2);
    assert!(result.stderr.contains("ERROR: /index.ts:1:"));
    assert!(result.stderr.contains("./missing"));
    assert!(result.stderr.contains('^'));
}

#[tokio::test]
async fn build_command_missing_entry_is_caller_error() {
    let lot = sandlot(CannedCdn::default(), SandlotOptions::new());
    let sandbox = lot.create_sandbox().await;

    let result = sandbox.exec("build").await;
    assert_eq!(result.exit_code, 1);
    assert!(result.stderr.contains("/index.ts"));
}

#[tokio::test]
async fn typecheck_command_formats_diagnostics() {
    let lot = sandlot(CannedCdn::default(), SandlotOptions::new());
    let sandbox = lot.create_sandbox().await;
    sandbox
        .write_file("/a.ts", "const n: number = \"s\";\n")
        .unwrap();

    let clean = sandbox.exec("typecheck /missing-entry.ts").await;
    assert_eq!(clean.exit_code, 2);

    let result = sandbox.exec("typecheck /a.ts").await;
    assert_eq!(result.exit_code, 2);
    assert!(result.stderr.starts_with("ERROR: /a.ts:1:"));

    sandbox
        .write_file("/ok.ts", "export const fine = true;\n")
        .unwrap();
    let ok = sandbox.exec("typecheck /ok.ts").await;
    assert_eq!(ok.exit_code, 0);
    assert!(ok.stdout.contains("No errors found."));
}

#[tokio::test]
async fn quoted_arguments_parse_as_one_token() {
    let lot = sandlot(CannedCdn::default(), SandlotOptions::new());
    let sandbox = lot.create_sandbox().await;

    // The quoted spec reaches install intact; resolution fails softly.
    let result = sandbox.exec("install \"@scope/pkg@5.x\"").await;
    assert_eq!(result.exit_code, 0);
    assert!(result.stdout.contains("Installed @scope/pkg@5.x"));
}

use sandlot_vfs::{MemoryVfs, Vfs};

use crate::project::{PackageJson, DEFAULT_ENTRY};

#[test]
fn missing_package_json_reads_as_empty() {
    let vfs = MemoryVfs::new();
    let pkg = PackageJson::load(&vfs);
    assert!(pkg.dependencies.is_empty());
    assert_eq!(pkg.entry_point(), DEFAULT_ENTRY);
}

#[test]
fn entry_point_normalizes_main() {
    let vfs = MemoryVfs::with_files([(
        "/package.json",
        r#"{ "main": "./src/app.tsx", "dependencies": {} }"#,
    )]);
    let pkg = PackageJson::load(&vfs);
    assert_eq!(pkg.entry_point(), "/src/app.tsx");
}

#[test]
fn dependencies_round_trip_through_the_vfs() {
    let vfs = MemoryVfs::new();
    let mut pkg = PackageJson::load(&vfs);
    pkg.add_dependency("nanoid", "5.1.6");
    pkg.add_dependency("@tanstack/react-query", "5.1.0");
    pkg.save(&vfs).unwrap();

    let reloaded = PackageJson::load(&vfs);
    assert_eq!(reloaded.dependency_version("nanoid"), Some("5.1.6"));
    let installed = reloaded.installed();
    assert_eq!(installed.len(), 2);
    assert_eq!(installed["@tanstack/react-query"], "5.1.0");
}

#[test]
fn unknown_fields_survive_a_save() {
    let vfs = MemoryVfs::with_files([(
        "/package.json",
        r#"{ "name": "demo", "scripts": { "dev": "vite" }, "dependencies": {} }"#,
    )]);
    let mut pkg = PackageJson::load(&vfs);
    pkg.add_dependency("react", "19.0.0");
    pkg.save(&vfs).unwrap();

    let text = vfs.read_file("/package.json").unwrap();
    assert!(text.contains("\"scripts\""));
    assert!(text.contains("\"react\""));
}

#[test]
fn remove_dependency_reports_presence() {
    let vfs = MemoryVfs::new();
    let mut pkg = PackageJson::load(&vfs);
    pkg.add_dependency("react", "19.0.0");
    assert!(pkg.remove_dependency("react"));
    assert!(!pkg.remove_dependency("react"));
}

#[test]
fn malformed_package_json_reads_as_empty() {
    let vfs = MemoryVfs::with_files([("/package.json", "{broken")]);
    let pkg = PackageJson::load(&vfs);
    assert!(pkg.dependencies.is_empty());
}

use crate::package::{
    PackageSpec, SpecError, from_storage_safe_name, is_bare_specifier, split_bare_specifier,
    storage_safe_name,
};

#[test]
fn parses_plain_name() {
    let spec = PackageSpec::parse("nanoid").unwrap();
    assert_eq!(spec.name, "nanoid");
    assert_eq!(spec.version, None);
    assert_eq!(spec.version_or_latest(), "latest");
}

#[test]
fn parses_name_with_version() {
    let spec = PackageSpec::parse("nanoid@5.1.6").unwrap();
    assert_eq!(spec.name, "nanoid");
    assert_eq!(spec.version.as_deref(), Some("5.1.6"));
}

#[test]
fn parses_scoped_name_without_version() {
    let spec = PackageSpec::parse("@tanstack/react-query").unwrap();
    assert_eq!(spec.name, "@tanstack/react-query");
    assert_eq!(spec.version, None);
}

#[test]
fn parses_scoped_name_with_range_version() {
    let spec = PackageSpec::parse("@tanstack/react-query@5.x").unwrap();
    assert_eq!(spec.name, "@tanstack/react-query");
    assert_eq!(spec.version.as_deref(), Some("5.x"));
}

#[test]
fn rejects_empty_and_malformed_specs() {
    assert_eq!(PackageSpec::parse(""), Err(SpecError::Empty));
    assert_eq!(PackageSpec::parse("   "), Err(SpecError::Empty));
    assert!(matches!(
        PackageSpec::parse("nanoid@"),
        Err(SpecError::Invalid(_))
    ));
    assert!(matches!(
        PackageSpec::parse("@scope"),
        Err(SpecError::Invalid(_))
    ));
}

#[test]
fn bare_specifier_detection() {
    assert!(is_bare_specifier("react"));
    assert!(is_bare_specifier("@scope/pkg"));
    assert!(!is_bare_specifier("./local"));
    assert!(!is_bare_specifier("../up"));
    assert!(!is_bare_specifier("/abs.ts"));
}

#[test]
fn splits_bare_specifiers() {
    assert_eq!(split_bare_specifier("react"), ("react", None));
    assert_eq!(
        split_bare_specifier("react/jsx-runtime"),
        ("react", Some("jsx-runtime"))
    );
    assert_eq!(
        split_bare_specifier("@scope/pkg"),
        ("@scope/pkg", None)
    );
    assert_eq!(
        split_bare_specifier("@scope/pkg/deep/file"),
        ("@scope/pkg", Some("deep/file"))
    );
}

#[test]
fn storage_safe_names_round_trip() {
    assert_eq!(storage_safe_name("nanoid"), "nanoid");
    assert_eq!(
        storage_safe_name("@tanstack/react-query"),
        "@tanstack--react-query"
    );
    assert_eq!(
        from_storage_safe_name("@tanstack--react-query"),
        "@tanstack/react-query"
    );
}

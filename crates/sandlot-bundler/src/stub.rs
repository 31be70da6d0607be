//! Shared-module stub emission.
//!
//! A shared module only exists as a host object, but the bundler analyzes
//! named exports statically. The stub bridges the two: it pulls the module
//! out of the registry's global handle at runtime and re-declares every
//! pre-introspected export name as a static `export const`. `default` falls
//! back to the module object itself when the host module has no explicit
//! default.

/// Emit the ES-module stub for shared module `module_id` against the
/// registry bound at global key `registry_key`.
#[must_use]
pub fn emit_shared_stub(module_id: &str, registry_key: &str, export_names: &[String]) -> String {
    let mut out = String::new();
    out.push_str("const __mod__ = (function () {\n");
    out.push_str(&format!(
        "  const registry = globalThis[{key}];\n",
        key = js_string(registry_key)
    ));
    out.push_str(&format!(
        "  if (!registry) throw new Error(\"shared module registry not found: \" + {key});\n",
        key = js_string(registry_key)
    ));
    out.push_str(&format!(
        "  return registry.get({id});\n",
        id = js_string(module_id)
    ));
    out.push_str("})();\n");
    out.push_str("export default __mod__.default ?? __mod__;\n");
    for name in export_names {
        out.push_str(&format!("export const {name} = __mod__.{name};\n"));
    }
    out
}

fn js_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_reaches_registry_and_reexports_names() {
        let stub = emit_shared_stub(
            "react",
            "__sandlot_registry_abc",
            &["useState".to_string(), "useEffect".to_string()],
        );
        assert!(stub.contains("globalThis[\"__sandlot_registry_abc\"]"));
        assert!(stub.contains("registry.get(\"react\")"));
        assert!(stub.contains("export default __mod__.default ?? __mod__;"));
        assert!(stub.contains("export const useState = __mod__.useState;"));
        assert!(stub.contains("export const useEffect = __mod__.useEffect;"));
    }

    #[test]
    fn stub_without_names_still_has_default() {
        let stub = emit_shared_stub("styles", "__k", &[]);
        assert!(stub.contains("export default"));
        assert!(!stub.contains("export const"));
    }
}

//! POSIX path algebra for the virtual filesystem.
//!
//! Every path in the VFS is absolute, `/`-rooted, and normalized. Paths are
//! plain strings: the VFS never touches the host filesystem, so
//! `std::path::Path` (with its platform separators) is the wrong tool.

/// Collapse `.` and `..` segments and duplicate slashes, producing an
/// absolute `/`-rooted path. Relative input is treated as rooted at `/`.
/// `..` at the root is dropped rather than escaping.
#[must_use]
pub fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            seg => out.push(seg),
        }
    }
    let mut result = String::with_capacity(path.len() + 1);
    result.push('/');
    result.push_str(&out.join("/"));
    result
}

/// Join a path onto a base directory and normalize the result. An absolute
/// `rel` ignores the base.
#[must_use]
pub fn join(base: &str, rel: &str) -> String {
    if rel.starts_with('/') {
        normalize(rel)
    } else {
        normalize(&format!("{base}/{rel}"))
    }
}

/// Parent directory of a normalized path; the parent of `/` is `/`.
#[must_use]
pub fn dirname(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

/// Final segment of a normalized path; empty for `/`.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Extension without the leading dot, from the final segment only.
#[must_use]
pub fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&name[idx + 1..]),
    }
}

/// Whether `path` is `dir` itself or lives under it.
#[must_use]
pub fn is_within(path: &str, dir: &str) -> bool {
    if dir == "/" {
        return true;
    }
    path == dir || path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}

//! Virtual path helpers
//!
//! Virtual paths are relative, `/`-separated and never start with `/`.
//! The overlay root is spelled `.`. Physical names that are not valid UTF-8
//! have no virtual form and are left out of listings.

use std::path::{Path, PathBuf};

/// The virtual root
pub const ROOT: &str = ".";

/// Normalize a virtual path: drop empty and `.` segments, resolve `..`
/// lexically (never above the root), accept `\` as a separator.
pub fn clean(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split(['/', '\\']) {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    if parts.is_empty() {
        ROOT.to_string()
    } else {
        parts.join("/")
    }
}

/// True for the virtual root
pub fn is_root(path: &str) -> bool {
    path.is_empty() || path == ROOT
}

/// Join two virtual paths, treating `.` on either side as empty
pub fn join(base: &str, rest: &str) -> String {
    match (is_root(base), is_root(rest)) {
        (true, true) => ROOT.to_string(),
        (true, false) => rest.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{}/{}", base, rest),
    }
}

/// Split a cleaned path into its directory and base name.
/// `a/b/c.css` -> (`a/b`, `c.css`); `c.css` -> (`.`, `c.css`)
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => (ROOT, path),
    }
}

/// Split off the first segment: `vendor/js/lib.js` -> (`vendor`, `js/lib.js`)
pub fn split_first(path: &str) -> (&str, &str) {
    match path.find('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => (path, ROOT),
    }
}

/// Base name of a virtual path
pub fn base(path: &str) -> &str {
    split(path).1
}

/// Strip a leading segment prefix. Returns `None` if `path` is not under it.
pub fn strip_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if is_root(prefix) {
        return Some(path);
    }
    if path == prefix {
        return Some(ROOT);
    }
    path.strip_prefix(prefix)?.strip_prefix('/')
}

/// Physical location of a virtual path below `root`
pub fn to_physical(root: &Path, path: &str) -> PathBuf {
    if is_root(path) {
        return root.to_path_buf();
    }
    let mut out = root.to_path_buf();
    out.extend(path.split('/'));
    out
}

/// Virtual form of a physical path relative to `root`, with `/` separators.
/// `None` if `real` is outside `root` or a name is not valid UTF-8.
pub fn from_physical(root: &Path, real: &Path) -> Option<String> {
    let rel = real.strip_prefix(root).ok()?;
    let segs = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<&str>>>()?;
    if segs.is_empty() {
        Some(ROOT.to_string())
    } else {
        Some(segs.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean() {
        assert_eq!(clean(""), ".");
        assert_eq!(clean("/"), ".");
        assert_eq!(clean("./themes//dark/"), "themes/dark");
        assert_eq!(clean("themes\\dark\\app.css"), "themes/dark/app.css");
        assert_eq!(clean("a/../../b"), "b");
    }

    #[test]
    fn test_split() {
        assert_eq!(split("themes/dark/app.css"), ("themes/dark", "app.css"));
        assert_eq!(split("app.css"), (".", "app.css"));
        assert_eq!(split_first("vendor/js/lib.js"), ("vendor", "js/lib.js"));
        assert_eq!(split_first("vendor"), ("vendor", "."));
    }

    #[test]
    fn test_join_and_strip() {
        assert_eq!(join(".", "a"), "a");
        assert_eq!(join("a", "."), "a");
        assert_eq!(join("a", "b/c"), "a/b/c");
        assert_eq!(strip_prefix("vendor/lib.js", "vendor"), Some("lib.js"));
        assert_eq!(strip_prefix("vendor", "vendor"), Some("."));
        assert_eq!(strip_prefix("vendors/lib.js", "vendor"), None);
    }

    #[test]
    fn test_physical_round_trip() {
        let root = Path::new("/srv/assets");
        let real = to_physical(root, "themes/app.css");
        assert_eq!(real, Path::new("/srv/assets/themes/app.css"));
        assert_eq!(from_physical(root, &real).as_deref(), Some("themes/app.css"));
        assert_eq!(from_physical(root, root).as_deref(), Some("."));
        assert_eq!(from_physical(root, Path::new("/srv/other/a.css")), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_has_no_virtual_form() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = Path::new("/srv/assets");
        let real = root.join("themes").join(OsStr::from_bytes(b"\xffdark.css"));
        assert_eq!(from_physical(root, &real), None);
    }
}

//! Glob patterns and the deduplicating glob engine
//!
//! Pattern syntax for the base name:
//! - `*` matches zero or more characters
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]`, `[!abc]` / `[^abc]` character classes
//! - `{css,scss}` alternatives
//! - `\` escapes the next character
//!
//! A `**` segment right before the base name makes the pattern recursive,
//! a trailing `/` selects directories instead of files.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

use super::info::FileInfo;
use super::mode::WalkMode;
use super::node::FsNode;
use super::vpath;

/// A parsed traversal request
#[derive(Clone)]
pub struct GlobPattern {
    dir: String,
    name: String,
    matcher: Regex,
    allow_files: bool,
    allow_dirs: bool,
    recursive: bool,
}

impl fmt::Debug for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobPattern")
            .field("dir", &self.dir)
            .field("name", &self.name)
            .field("allow_files", &self.allow_files)
            .field("allow_dirs", &self.allow_dirs)
            .field("recursive", &self.recursive)
            .finish()
    }
}

impl GlobPattern {
    /// Non-recursive, files-only pattern matching `name` inside `dir`
    pub fn new(dir: &str, name: &str) -> Result<Self> {
        Ok(Self {
            dir: vpath::clean(dir),
            name: name.to_string(),
            matcher: compile(if name.is_empty() { "*" } else { name })?,
            allow_files: true,
            allow_dirs: false,
            recursive: false,
        })
    }

    /// Parse `themes/**/*.{css,scss}`, `img/*.png`, `modules/*/` and friends
    pub fn parse(pattern: &str) -> Result<Self> {
        let dirs_only = pattern.ends_with('/');
        let mut segments: Vec<&str> = pattern
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();

        let mut name = segments.pop().unwrap_or("");
        let mut recursive = false;
        if name == "**" {
            recursive = true;
            name = "";
        } else if segments.last() == Some(&"**") {
            recursive = true;
            segments.pop();
        }

        if let Some(bad) = segments.iter().find(|s| has_wildcard(s)) {
            return Err(Error::InvalidPattern {
                pattern: pattern.to_string(),
                reason: format!("wildcards are only supported in the last segment, found {:?}", bad),
            });
        }

        let dir = segments.join("/");
        Ok(Self::new(&dir, name)?
            .with_files(!dirs_only)
            .with_dirs(dirs_only)
            .with_recursive(recursive))
    }

    pub fn with_files(mut self, allow: bool) -> Self {
        self.allow_files = allow;
        self
    }

    pub fn with_dirs(mut self, allow: bool) -> Self {
        self.allow_dirs = allow;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Virtual directory the pattern starts in
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Base-name pattern as written
    pub fn name_pattern(&self) -> &str {
        &self.name
    }

    pub fn allow_files(&self) -> bool {
        self.allow_files
    }

    pub fn allow_dirs(&self) -> bool {
        self.allow_dirs
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Match a base name
    pub fn matches(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }

    fn accepts(&self, info: &FileInfo) -> bool {
        let kind_ok = if info.is_dir() {
            self.allow_dirs
        } else {
            self.allow_files
        };
        kind_ok && self.matches(info.name())
    }
}

fn has_wildcard(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

/// Translate a base-name glob into an anchored regex
fn compile(pattern: &str) -> Result<Regex> {
    let invalid = |reason: &str| Error::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let mut re = String::from("^");
    let mut depth = 0usize;
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            '{' => {
                depth += 1;
                re.push_str("(?:");
            }
            ',' if depth > 0 => re.push('|'),
            '}' if depth > 0 => {
                depth -= 1;
                re.push(')');
            }
            '\\' => match chars.next() {
                Some(escaped) => re.push_str(&regex::escape(&escaped.to_string())),
                None => return Err(invalid("trailing escape")),
            },
            '[' => {
                let mut class = String::from("[");
                if matches!(chars.peek(), Some('!') | Some('^')) {
                    chars.next();
                    class.push('^');
                }
                let mut members: Vec<char> = Vec::new();
                let mut closed = false;
                while let Some(m) = chars.next() {
                    if m == ']' && !members.is_empty() {
                        closed = true;
                        break;
                    }
                    members.push(m);
                }
                if !closed {
                    return Err(invalid("unclosed character class"));
                }
                for (i, m) in members.iter().enumerate() {
                    let is_range = *m == '-' && i > 0 && i + 1 < members.len();
                    if is_range {
                        class.push('-');
                    } else {
                        class.push_str(&regex::escape(&m.to_string()));
                    }
                }
                class.push(']');
                re.push_str(&class);
            }
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }

    if depth > 0 {
        return Err(invalid("unclosed brace"));
    }
    re.push('$');

    Regex::new(&re).map_err(|e| invalid(&e.to_string()))
}

impl<'a> FsNode<'a> {
    /// Deliver every entry matching `pattern` exactly once
    ///
    /// Recursive patterns walk the whole sub-tree below the pattern's
    /// directory, others list it one level deep. The first root (in search
    /// order) that provides a virtual path wins.
    pub fn glob<F>(&self, pattern: &GlobPattern, mut cb: F) -> Result<()>
    where
        F: FnMut(FileInfo) -> Result<()>,
    {
        debug!("glob(node={}, pattern={:?})", self.id(), pattern);
        if !pattern.allow_files && !pattern.allow_dirs {
            return Ok(());
        }

        let mut seen: HashSet<String> = HashSet::new();
        let accept = |info: FileInfo| -> Result<()> {
            if !pattern.accepts(&info) || seen.contains(info.path()) {
                return Ok(());
            }
            let path = info.path().to_string();
            cb(info)?;
            seen.insert(path);
            Ok(())
        };

        let mode = WalkMode::all()
            .with_files(pattern.allow_files)
            .with_dirs(pattern.allow_dirs);
        if pattern.recursive {
            self.walk(&pattern.dir, accept, mode)
        } else {
            self.read_dir(&pattern.dir, accept, mode)
        }
    }

    /// Matching virtual paths with their directory flag
    pub fn glob_paths(&self, pattern: &GlobPattern) -> Result<Vec<(String, bool)>> {
        let mut out = Vec::new();
        self.glob(pattern, |info| {
            out.push((info.path().to_string(), info.is_dir()));
            Ok(())
        })?;
        Ok(out)
    }

    /// Matching entries
    pub fn glob_infos(&self, pattern: &GlobPattern) -> Result<Vec<FileInfo>> {
        let mut out = Vec::new();
        self.glob(pattern, |info| {
            out.push(info);
            Ok(())
        })?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::AssetFileSystem;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    fn names(entries: Vec<(String, bool)>) -> Vec<String> {
        entries.into_iter().map(|(p, _)| p).collect()
    }

    #[test]
    fn test_parse() {
        let p = GlobPattern::parse("themes/*.css").unwrap();
        assert_eq!(p.dir(), "themes");
        assert_eq!(p.name_pattern(), "*.css");
        assert!(p.allow_files() && !p.allow_dirs() && !p.is_recursive());

        let p = GlobPattern::parse("themes/**/*.css").unwrap();
        assert_eq!(p.dir(), "themes");
        assert!(p.is_recursive());

        let p = GlobPattern::parse("modules/*/").unwrap();
        assert_eq!(p.dir(), "modules");
        assert!(!p.allow_files() && p.allow_dirs());

        let p = GlobPattern::parse("**").unwrap();
        assert_eq!(p.dir(), ".");
        assert!(p.is_recursive());
        assert!(p.matches("anything.txt"));

        let p = GlobPattern::parse("*.js").unwrap();
        assert_eq!(p.dir(), ".");
    }

    #[test]
    fn test_parse_rejects_wildcard_dirs() {
        assert!(matches!(
            GlobPattern::parse("them*/a.css"),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_name_matching() {
        let p = GlobPattern::new(".", "*.{css,scss}").unwrap();
        assert!(p.matches("app.css"));
        assert!(p.matches("app.scss"));
        assert!(!p.matches("app.js"));

        let p = GlobPattern::new(".", "logo-?.[pj]ng").unwrap();
        assert!(p.matches("logo-1.png"));
        assert!(p.matches("logo-2.jng"));
        assert!(!p.matches("logo-10.png"));

        let p = GlobPattern::new(".", "[!a-c]*").unwrap();
        assert!(p.matches("dark"));
        assert!(!p.matches("base"));

        let p = GlobPattern::new(".", "a\\*b.txt").unwrap();
        assert!(p.matches("a*b.txt"));
        assert!(!p.matches("axb.txt"));

        let p = GlobPattern::new(".", "").unwrap();
        assert!(p.matches(""));
    }

    #[test]
    fn test_malformed_patterns() {
        for bad in ["[abc", "{a,b", "abc\\"] {
            assert!(
                matches!(GlobPattern::new(".", bad), Err(Error::InvalidPattern { .. })),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_non_recursive_vs_recursive() {
        let a = tempdir().unwrap();
        write(a.path(), "themes/a.css");
        write(a.path(), "themes/sub/b.css");
        write(a.path(), "themes/readme.md");
        let fs = AssetFileSystem::with_roots([a.path()]).unwrap();
        let node = fs.root_node();

        let flat = GlobPattern::new("themes", "*.css").unwrap();
        assert_eq!(names(node.glob_paths(&flat).unwrap()), vec!["themes/a.css"]);

        let deep = flat.clone().with_recursive(true);
        assert_eq!(
            names(node.glob_paths(&deep).unwrap()),
            vec!["themes/a.css", "themes/sub/b.css"]
        );
    }

    #[test]
    fn test_dedup_across_roots() {
        let r1 = tempdir().unwrap();
        let r2 = tempdir().unwrap();
        write(r1.path(), "js/app.js");
        write(r2.path(), "js/app.js");
        write(r2.path(), "js/extra.js");
        let fs = AssetFileSystem::with_roots([r1.path(), r2.path()]).unwrap();

        let pattern = GlobPattern::parse("js/**/*.js").unwrap();
        let infos = fs.root_node().glob_infos(&pattern).unwrap();
        let found: Vec<_> = infos
            .iter()
            .map(|i| (i.path().to_string(), i.real_path().to_path_buf()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("js/app.js".to_string(), r1.path().join("js/app.js")),
                ("js/extra.js".to_string(), r2.path().join("js/extra.js")),
            ]
        );
    }

    #[test]
    fn test_dirs_only_pattern() {
        let r1 = tempdir().unwrap();
        write(r1.path(), "modules/auth/index.js");
        write(r1.path(), "modules/blog/index.js");
        write(r1.path(), "modules/readme.md");
        let fs = AssetFileSystem::with_roots([r1.path()]).unwrap();

        let pattern = GlobPattern::parse("modules/*/").unwrap();
        assert_eq!(
            fs.root_node().glob_paths(&pattern).unwrap(),
            vec![
                ("modules/auth".to_string(), true),
                ("modules/blog".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_no_kinds_allowed_is_empty() {
        let r1 = tempdir().unwrap();
        write(r1.path(), "a.txt");
        let fs = AssetFileSystem::with_roots([r1.path()]).unwrap();

        let pattern = GlobPattern::new(".", "*").unwrap().with_files(false);
        assert!(fs.root_node().glob_paths(&pattern).unwrap().is_empty());
    }

    #[test]
    fn test_callback_error_propagates() {
        let r1 = tempdir().unwrap();
        write(r1.path(), "a.txt");
        write(r1.path(), "b.txt");
        let fs = AssetFileSystem::with_roots([r1.path()]).unwrap();

        let pattern = GlobPattern::new(".", "*.txt").unwrap();
        let mut seen = 0;
        let err = fs
            .root_node()
            .glob(&pattern, |_| {
                seen += 1;
                Err(Error::Cancelled)
            })
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(seen, 1);
    }
}

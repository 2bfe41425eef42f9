//! Ordered physical roots of one overlay node

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Ordered list of physical root directories
///
/// Forward iteration gives "first registered wins", reverse iteration gives
/// "last registered wins".
#[derive(Debug, Clone, Default)]
pub struct SearchOrder {
    roots: Vec<PathBuf>,
}

impl SearchOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every root exactly once, forward or reversed
    pub fn iter(&self, reverse: bool) -> Box<dyn Iterator<Item = &Path> + '_> {
        let roots = self.roots.iter().map(PathBuf::as_path);
        if reverse {
            Box::new(roots.rev())
        } else {
            Box::new(roots)
        }
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn contains(&self, root: &Path) -> bool {
        self.roots.iter().any(|r| r == root)
    }

    /// Append a root (lowest precedence in forward order)
    pub fn register(&mut self, root: impl AsRef<Path>, ignore_exists: bool) -> Result<bool> {
        self.insert(root.as_ref(), ignore_exists, false)
    }

    /// Insert a root at the front (highest precedence in forward order)
    pub fn prepend(&mut self, root: impl AsRef<Path>, ignore_exists: bool) -> Result<bool> {
        self.insert(root.as_ref(), ignore_exists, true)
    }

    /// Returns false if the root was already present and `ignore_exists` is set
    fn insert(&mut self, root: &Path, ignore_exists: bool, front: bool) -> Result<bool> {
        let root = absolute(root)?;
        if self.contains(&root) {
            if ignore_exists {
                return Ok(false);
            }
            return Err(Error::PathAlreadyRegistered(root.display().to_string()));
        }
        if !root.exists() {
            // Overlay roots are sparse
            debug!("registering missing root {:?}", root);
        }
        if front {
            self.roots.insert(0, root);
        } else {
            self.roots.push(root);
        }
        Ok(true)
    }
}

fn absolute(root: &Path) -> Result<PathBuf> {
    if root.is_absolute() {
        Ok(root.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_and_reverse() {
        let mut order = SearchOrder::new();
        order.register("/a", false).unwrap();
        order.register("/b", false).unwrap();
        order.prepend("/c", false).unwrap();

        let forward: Vec<_> = order.iter(false).collect();
        assert_eq!(forward, vec![Path::new("/c"), Path::new("/a"), Path::new("/b")]);

        let reverse: Vec<_> = order.iter(true).collect();
        assert_eq!(reverse, vec![Path::new("/b"), Path::new("/a"), Path::new("/c")]);
    }

    #[test]
    fn test_empty_yields_nothing() {
        let order = SearchOrder::new();
        assert_eq!(order.iter(false).count(), 0);
        assert_eq!(order.iter(true).count(), 0);
    }

    #[test]
    fn test_duplicate_root() {
        let mut order = SearchOrder::new();
        assert!(order.register("/a", false).unwrap());
        assert!(matches!(
            order.register("/a", false),
            Err(Error::PathAlreadyRegistered(_))
        ));
        assert!(!order.prepend("/a", true).unwrap());
        assert_eq!(order.len(), 1);
    }

    #[test]
    fn test_relative_root_made_absolute() {
        let mut order = SearchOrder::new();
        order.register("assets", false).unwrap();
        assert!(order.iter(false).all(Path::is_absolute));
    }
}

//! Overlay node graph
//!
//! Nodes live in an arena owned by `AssetFileSystem`. Namespace children and
//! the parent back-link are plain `NodeId` handles, so the graph has no
//! ownership cycles and is dropped as a whole.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

use super::search_order::SearchOrder;
use super::vpath;

/// Handle of a node inside its `AssetFileSystem`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One mountable unit of the overlay
#[derive(Debug)]
pub struct Node {
    /// Namespace name under the parent (empty for the root)
    name: String,
    /// Virtual mount path from the overlay root (empty for the root)
    path: String,
    roots: SearchOrder,
    parent: Option<NodeId>,
    namespaces: BTreeMap<String, NodeId>,
}

impl Node {
    fn new(name: String, path: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            path,
            roots: SearchOrder::new(),
            parent,
            namespaces: BTreeMap::new(),
        }
    }
}

/// The overlay: a tree of nodes rooted at `root()`
#[derive(Debug)]
pub struct AssetFileSystem {
    nodes: Vec<Node>,
}

impl Default for AssetFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetFileSystem {
    /// Create an overlay with an empty root node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(String::new(), String::new(), None)],
        }
    }

    /// Create an overlay whose root node probes `roots` in order
    pub fn with_roots<I, P>(roots: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut fs = Self::new();
        let root = fs.root();
        for path in roots {
            fs.register_path(root, path)?;
        }
        Ok(fs)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Borrowed handle used to run lookups on a node
    ///
    /// Panics if `id` was not produced by this overlay.
    pub fn node(&self, id: NodeId) -> FsNode<'_> {
        assert!(id.0 < self.nodes.len(), "node {} is not part of this overlay", id);
        FsNode { fs: self, id }
    }

    /// Handle of the root node
    pub fn root_node(&self) -> FsNode<'_> {
        self.node(self.root())
    }

    /// Number of nodes, the root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    fn data(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.0) {
            Some(node) => node,
            None => panic!("node {} is not part of this overlay", id),
        }
    }

    fn data_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.0) {
            Some(node) => node,
            None => panic!("node {} is not part of this overlay", id),
        }
    }

    // Every method taking a `NodeId` panics if the id was not produced by
    // this overlay, like `node()`.

    /// Append a physical root to a node
    pub fn register_path(&mut self, id: NodeId, path: impl AsRef<Path>) -> Result<()> {
        debug!("register_path(node={}, path={:?})", id, path.as_ref());
        self.data_mut(id).roots.register(path, false).map(|_| ())
    }

    /// Insert a physical root in front of a node's existing roots
    pub fn prepend_path(&mut self, id: NodeId, path: impl AsRef<Path>) -> Result<()> {
        debug!("prepend_path(node={}, path={:?})", id, path.as_ref());
        self.data_mut(id).roots.prepend(path, false).map(|_| ())
    }

    /// Like `register_path`, but an already registered root is not an error
    pub fn register_path_once(&mut self, id: NodeId, path: impl AsRef<Path>) -> Result<bool> {
        self.data_mut(id).roots.register(path, true)
    }

    /// Get or create the namespace `name` below `parent`
    pub fn namespace(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        validate_namespace(name)?;
        if let Some(id) = self.get_namespace(parent, name) {
            return Ok(id);
        }

        let path = vpath::join(&self.data(parent).path, name);
        let path = if vpath::is_root(&path) { String::new() } else { path };
        let id = NodeId(self.nodes.len());
        debug!("namespace(parent={}, name={}) -> {} at {:?}", parent, name, id, path);

        self.nodes.push(Node::new(name.to_string(), path, Some(parent)));
        self.data_mut(parent).namespaces.insert(name.to_string(), id);
        Ok(id)
    }

    /// Get or create a chain of namespaces, e.g. `admin/theme`
    pub fn namespace_path(&mut self, parent: NodeId, path: &str) -> Result<NodeId> {
        let cleaned = vpath::clean(path);
        if vpath::is_root(&cleaned) {
            return Ok(parent);
        }
        let mut id = parent;
        for name in cleaned.split('/') {
            id = self.namespace(id, name)?;
        }
        Ok(id)
    }

    /// Look up an existing namespace
    pub fn get_namespace(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.data(parent).namespaces.get(name).copied()
    }
}

fn validate_namespace(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::InvalidNamespace(name.to_string()));
    }
    Ok(())
}

/// A node of an overlay, borrowed for lookups
#[derive(Clone, Copy)]
pub struct FsNode<'a> {
    fs: &'a AssetFileSystem,
    id: NodeId,
}

impl fmt::Debug for FsNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsNode")
            .field("id", &self.id)
            .field("path", &self.path())
            .finish()
    }
}

impl<'a> FsNode<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn data(&self) -> &'a Node {
        self.fs.data(self.id)
    }

    /// Namespace name under the parent (empty for the root)
    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    /// Virtual mount path from the overlay root (empty for the root)
    pub fn path(&self) -> &'a str {
        &self.data().path
    }

    pub fn roots(&self) -> &'a SearchOrder {
        &self.data().roots
    }

    pub fn parent(&self) -> Option<FsNode<'a>> {
        self.data().parent.map(|id| self.fs.node(id))
    }

    /// Registered namespace child `name`
    pub fn namespace(&self, name: &str) -> Option<FsNode<'a>> {
        self.fs.get_namespace(self.id, name).map(|id| self.fs.node(id))
    }

    /// Namespace children in name order
    pub fn namespaces(&self) -> impl Iterator<Item = FsNode<'a>> + 'a {
        let fs = self.fs;
        self.data().namespaces.values().map(move |&id| fs.node(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_paths_and_parent() {
        let mut fs = AssetFileSystem::new();
        let root = fs.root();
        let admin = fs.namespace(root, "admin").unwrap();
        let theme = fs.namespace(admin, "theme").unwrap();

        let node = fs.node(theme);
        assert_eq!(node.name(), "theme");
        assert_eq!(node.path(), "admin/theme");
        assert_eq!(node.parent().unwrap().id(), admin);
        assert_eq!(fs.node(admin).parent().unwrap().id(), root);
        assert!(fs.root_node().parent().is_none());
        assert_eq!(fs.root_node().path(), "");
    }

    #[test]
    fn test_namespace_is_get_or_create() {
        let mut fs = AssetFileSystem::new();
        let root = fs.root();
        let a = fs.namespace(root, "vendor").unwrap();
        let b = fs.namespace(root, "vendor").unwrap();
        assert_eq!(a, b);
        assert_eq!(fs.len(), 2);

        let nested = fs.namespace_path(root, "vendor/js").unwrap();
        assert_eq!(fs.node(nested).path(), "vendor/js");
        assert_eq!(fs.get_namespace(a, "js"), Some(nested));
    }

    #[test]
    fn test_register_paths() {
        let mut fs = AssetFileSystem::new();
        let root = fs.root();
        fs.register_path(root, "/srv/base").unwrap();
        fs.prepend_path(root, "/srv/app").unwrap();
        assert!(fs.register_path(root, "/srv/base").is_err());
        assert!(!fs.register_path_once(root, "/srv/base").unwrap());

        let roots: Vec<_> = fs.root_node().roots().iter(false).collect();
        assert_eq!(roots, vec![Path::new("/srv/app"), Path::new("/srv/base")]);
    }

    #[test]
    fn test_invalid_namespace_names() {
        let mut fs = AssetFileSystem::new();
        let root = fs.root();
        for name in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(
                fs.namespace(root, name),
                Err(Error::InvalidNamespace(_))
            ));
        }
    }

    #[test]
    #[should_panic(expected = "is not part of this overlay")]
    fn test_foreign_node_id_panics() {
        let mut other = AssetFileSystem::new();
        let foreign = other.namespace(other.root(), "vendor").unwrap();

        let mut fs = AssetFileSystem::new();
        let _ = fs.register_path(foreign, "/srv/vendor");
    }

    #[test]
    fn test_namespaces_iterate_in_name_order() {
        let mut fs = AssetFileSystem::new();
        let root = fs.root();
        fs.namespace(root, "zeta").unwrap();
        fs.namespace(root, "alpha").unwrap();
        let names: Vec<_> = fs.root_node().namespaces().map(|n| n.name()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}

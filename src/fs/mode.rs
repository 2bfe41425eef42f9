//! Walk and lookup mode flags

/// Which entries a traversal reports and where it may look
///
/// Recursive calls flip `namespaces` and `parent` explicitly so that a
/// traversal never re-enters the node it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkMode {
    /// Report regular files
    pub files: bool,
    /// Report directories
    pub dirs: bool,
    /// Probe roots last-registered first
    pub reverse: bool,
    /// Descend into namespace children
    pub namespaces: bool,
    /// Fall back to the parent node
    pub parent: bool,
}

impl Default for WalkMode {
    fn default() -> Self {
        Self::all()
    }
}

impl WalkMode {
    /// Files, directories, namespaces and parent, forward order
    pub fn all() -> Self {
        Self {
            files: true,
            dirs: true,
            reverse: false,
            namespaces: true,
            parent: true,
        }
    }

    /// Resolution defaults: namespaces and parent, forward order
    pub fn lookup() -> Self {
        Self::all()
    }

    /// Only this node's own roots
    pub fn local() -> Self {
        Self {
            namespaces: false,
            parent: false,
            ..Self::all()
        }
    }

    pub fn with_files(self, files: bool) -> Self {
        Self { files, ..self }
    }

    pub fn with_dirs(self, dirs: bool) -> Self {
        Self { dirs, ..self }
    }

    pub fn with_reverse(self, reverse: bool) -> Self {
        Self { reverse, ..self }
    }

    pub fn with_namespaces(self, namespaces: bool) -> Self {
        Self { namespaces, ..self }
    }

    pub fn with_parent(self, parent: bool) -> Self {
        Self { parent, ..self }
    }

    /// Mode for descending into a namespace child
    pub(crate) fn into_namespace(self) -> Self {
        self.with_namespaces(true).with_parent(false)
    }

    /// Mode for falling back to the parent node
    pub(crate) fn into_parent(self) -> Self {
        self.with_namespaces(false)
    }

    /// True if at least one entry kind is reported
    pub fn reports_anything(&self) -> bool {
        self.files || self.dirs
    }
}

//! Walk engine
//!
//! Depth-first traversal of the merged view of a node: namespace children,
//! the node's own physical roots, then the parent chain. The walk reports
//! raw provenance and does not deduplicate; a path present in two roots is
//! reported twice. Callers that need unique paths use `glob`.

use std::path::Path;

use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::error::Result;

use super::info::{FileInfo, FileKind};
use super::mode::WalkMode;
use super::node::FsNode;
use super::resolve::stat;
use super::vpath;

type Callback<'c> = dyn FnMut(FileInfo) -> Result<()> + 'c;

/// How deep a traversal goes below the requested directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Depth {
    /// The whole sub-tree
    Recursive,
    /// Direct children only
    Children,
}

impl<'a> FsNode<'a> {
    /// Walk the sub-tree below the virtual `dir`
    ///
    /// Reported paths are relative to this node. An error from `cb` stops the
    /// walk and is returned unchanged.
    pub fn walk<F>(&self, dir: &str, mut cb: F, mode: WalkMode) -> Result<()>
    where
        F: FnMut(FileInfo) -> Result<()>,
    {
        if !mode.reports_anything() {
            return Ok(());
        }
        let dir = vpath::clean(dir);
        debug!("walk(node={}, dir={}, mode={:?})", self.id(), dir, mode);
        self.visit(&dir, &mut cb, mode, Depth::Recursive)
    }

    /// List the direct children of the virtual `dir` across all roots
    pub fn read_dir<F>(&self, dir: &str, mut cb: F, mode: WalkMode) -> Result<()>
    where
        F: FnMut(FileInfo) -> Result<()>,
    {
        if !mode.reports_anything() {
            return Ok(());
        }
        let dir = vpath::clean(dir);
        debug!("read_dir(node={}, dir={}, mode={:?})", self.id(), dir, mode);
        self.visit(&dir, &mut cb, mode, Depth::Children)
    }

    fn visit(&self, dir: &str, cb: &mut Callback<'_>, mode: WalkMode, depth: Depth) -> Result<()> {
        if mode.namespaces {
            if vpath::is_root(dir) {
                // Namespace contents sit at least one level below the root
                if depth == Depth::Recursive {
                    for ns in self.namespaces() {
                        let prefix = ns.name();
                        trace!("walk: entering namespace {}", prefix);
                        ns.visit(
                            vpath::ROOT,
                            &mut |info: FileInfo| cb(info.under(prefix)),
                            mode.into_namespace(),
                            depth,
                        )?;
                    }
                }
            } else {
                let (first, rest) = vpath::split_first(dir);
                if let Some(ns) = self.namespace(first) {
                    trace!("walk: entering namespace {} at {}", first, rest);
                    ns.visit(
                        rest,
                        &mut |info: FileInfo| cb(info.under(first)),
                        mode.into_namespace(),
                        depth,
                    )?;
                }
            }
        }

        for root in self.roots().iter(mode.reverse) {
            let base = vpath::to_physical(root, dir);
            match stat(&base)? {
                Some(meta) if meta.is_dir() => walk_physical(&base, dir, cb, mode, depth)?,
                _ => trace!("walk: skipping missing {:?}", base),
            }
        }

        if mode.parent {
            if let Some(parent) = self.parent() {
                let name = self.name();
                let up = vpath::join(name, dir);
                trace!("walk: falling back to parent {} at {}", parent.id(), up);
                parent.visit(
                    &up,
                    &mut |info: FileInfo| cb(info.strip(name)),
                    mode.into_parent(),
                    depth,
                )?;
            }
        }

        Ok(())
    }
}

/// Walk one physical directory, labelling entries below the virtual `prefix`
fn walk_physical(
    base: &Path,
    prefix: &str,
    cb: &mut Callback<'_>,
    mode: WalkMode,
    depth: Depth,
) -> Result<()> {
    let mut walker = WalkDir::new(base)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    if depth == Depth::Children {
        walker = walker.max_depth(1);
    }

    for entry in walker {
        let entry = entry?;
        let kind = FileKind::from(entry.file_type());
        let wanted = match kind {
            FileKind::Dir => mode.dirs,
            FileKind::File => mode.files,
        };
        if !wanted {
            continue;
        }

        let Some(rel) = vpath::from_physical(base, entry.path()) else {
            warn!("walk: skipping non UTF-8 name {:?}", entry.path());
            continue;
        };
        let meta = entry.metadata()?;
        cb(FileInfo::with_kind(
            kind,
            vpath::join(prefix, &rel),
            entry.path().to_path_buf(),
            &meta,
        ))?;
    }
    Ok(())
}

//! Single-path resolution
//!
//! A virtual path is split into directory and base name. The directory is
//! resolved across namespaces, own roots and the parent chain into an
//! ordered list of candidate physical directories; the first candidate that
//! contains the base name wins.

use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::context::Context;
use crate::error::{Error, Result};

use super::info::FileInfo;
use super::mode::WalkMode;
use super::node::FsNode;
use super::vpath;

impl<'a> FsNode<'a> {
    /// Resolve `path` with namespaces and parent fallback, forward order
    pub fn resolve(&self, ctx: &Context, path: &str) -> Result<FileInfo> {
        self.resolve_with(ctx, path, WalkMode::lookup())
    }

    /// Resolve `path` honoring the `reverse`, `namespaces` and `parent`
    /// flags of `mode`
    pub fn resolve_with(&self, ctx: &Context, path: &str, mode: WalkMode) -> Result<FileInfo> {
        ctx.check()?;
        let path = vpath::clean(path);
        debug!("resolve(node={}, path={}, mode={:?})", self.id(), path, mode);

        if vpath::is_root(&path) {
            return self.resolve_dir_itself(ctx, mode);
        }

        let (dir, base) = vpath::split(&path);
        let mut found = None;
        self.paths_from(ctx, dir, mode, &mut |candidate: &Path| {
            let real = candidate.join(base);
            match stat(&real)? {
                Some(meta) => {
                    found = Some(FileInfo::from_metadata(path.clone(), real, &meta));
                    Ok(ControlFlow::Break(()))
                }
                None => Ok(ControlFlow::Continue(())),
            }
        })?;

        match found {
            Some(info) => {
                trace!("resolved {} -> {:?}", path, info.real_path());
                Ok(info)
            }
            None => Err(Error::NotFound(path)),
        }
    }

    fn resolve_dir_itself(&self, ctx: &Context, mode: WalkMode) -> Result<FileInfo> {
        let mut found = None;
        self.paths_from(ctx, vpath::ROOT, mode, &mut |candidate: &Path| match stat(candidate)? {
            Some(meta) if meta.is_dir() => {
                found = Some(FileInfo::from_metadata(
                    vpath::ROOT.to_string(),
                    candidate.to_path_buf(),
                    &meta,
                ));
                Ok(ControlFlow::Break(()))
            }
            _ => Ok(ControlFlow::Continue(())),
        })?;
        found.ok_or_else(|| Error::NotFound(vpath::ROOT.to_string()))
    }

    /// Visit every candidate physical directory for the virtual `dir`, in
    /// precedence order: matching namespace, own roots, then the parent at
    /// `name/dir`. Candidates are not checked for existence.
    ///
    /// Returns `Break` if the callback stopped the iteration.
    pub fn paths_from<F>(
        &self,
        ctx: &Context,
        dir: &str,
        mode: WalkMode,
        cb: &mut F,
    ) -> Result<ControlFlow<()>>
    where
        F: FnMut(&Path) -> Result<ControlFlow<()>>,
    {
        let dir = vpath::clean(dir);

        if mode.namespaces && !vpath::is_root(&dir) {
            let (first, rest) = vpath::split_first(&dir);
            if let Some(ns) = self.namespace(first) {
                if ns.paths_from(ctx, rest, mode.into_namespace(), cb)?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
        }

        for root in self.roots().iter(mode.reverse) {
            ctx.check()?;
            let candidate: PathBuf = vpath::to_physical(root, &dir);
            if cb(&candidate)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }

        if mode.parent {
            if let Some(parent) = self.parent() {
                let up = vpath::join(self.name(), &dir);
                return parent.paths_from(ctx, &up, mode.into_parent(), cb);
            }
        }

        Ok(ControlFlow::Continue(()))
    }
}

/// Stat following symlinks. `None` means "not in this root".
pub(super) fn stat(path: &Path) -> Result<Option<fs::Metadata>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if is_absent(&e) => Ok(None),
        Err(e) => Err(Error::io_at(path, e)),
    }
}

fn is_absent(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::NotFound {
        return true;
    }
    #[cfg(unix)]
    {
        // A path component is a regular file in this root, or a segment is
        // longer than any name the root could hold
        if matches!(e.raw_os_error(), Some(libc::ENOTDIR) | Some(libc::ENAMETOOLONG)) {
            return true;
        }
    }
    false
}

//! Resolved entry descriptors
//!
//! Every resolution, walk and glob hands out fresh `FileInfo` values that
//! carry the virtual path the caller asked about, while remembering which
//! physical root actually produced the entry.

use std::fs::{self, File, Metadata};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

use crate::error::{Error, Result};

use super::vpath;

/// Kind of a resolved entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    File,
    Dir,
}

impl From<fs::FileType> for FileKind {
    fn from(ft: fs::FileType) -> Self {
        if ft.is_dir() {
            FileKind::Dir
        } else {
            // Symlinks and special files are reported as files
            FileKind::File
        }
    }
}

/// OS-level attributes captured at resolution time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttributes {
    pub size: u64,
    pub mode: u32,
    pub mtime: SystemTime,
    pub symlink: bool,
}

impl FileAttributes {
    #[cfg(unix)]
    pub fn from_metadata(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            size: meta.len(),
            mode: meta.mode() & 0o7777,
            mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            symlink: meta.file_type().is_symlink(),
        }
    }

    #[cfg(not(unix))]
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            size: meta.len(),
            mode: if meta.is_dir() { 0o755 } else if meta.permissions().readonly() { 0o444 } else { 0o644 },
            mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            symlink: meta.file_type().is_symlink(),
        }
    }
}

/// Descriptor shared by every variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    path: String,
    real_path: PathBuf,
    attrs: FileAttributes,
}

/// A resolved overlay entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileInfo {
    File(EntryInfo),
    Dir(EntryInfo),
}

impl FileInfo {
    /// Build a descriptor from metadata of `real_path`, labelled with the
    /// virtual `path`
    pub fn from_metadata(path: String, real_path: PathBuf, meta: &Metadata) -> Self {
        Self::with_kind(FileKind::from(meta.file_type()), path, real_path, meta)
    }

    pub(crate) fn with_kind(
        kind: FileKind,
        path: String,
        real_path: PathBuf,
        meta: &Metadata,
    ) -> Self {
        let entry = EntryInfo {
            path,
            real_path,
            attrs: FileAttributes::from_metadata(meta),
        };
        match kind {
            FileKind::File => FileInfo::File(entry),
            FileKind::Dir => FileInfo::Dir(entry),
        }
    }

    fn entry(&self) -> &EntryInfo {
        match self {
            FileInfo::File(e) | FileInfo::Dir(e) => e,
        }
    }

    fn into_entry(self) -> (FileKind, EntryInfo) {
        match self {
            FileInfo::File(e) => (FileKind::File, e),
            FileInfo::Dir(e) => (FileKind::Dir, e),
        }
    }

    /// Virtual path
    pub fn path(&self) -> &str {
        &self.entry().path
    }

    /// Base name of the virtual path
    pub fn name(&self) -> &str {
        vpath::base(self.path())
    }

    /// Physical path that supplied this entry
    pub fn real_path(&self) -> &Path {
        &self.entry().real_path
    }

    pub fn attributes(&self) -> &FileAttributes {
        &self.entry().attrs
    }

    pub fn size(&self) -> u64 {
        self.entry().attrs.size
    }

    pub fn modified(&self) -> SystemTime {
        self.entry().attrs.mtime
    }

    pub fn kind(&self) -> FileKind {
        match self {
            FileInfo::File(_) => FileKind::File,
            FileInfo::Dir(_) => FileKind::Dir,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FileInfo::Dir(_))
    }

    /// Same entry, virtual path placed under `prefix`
    pub fn under(self, prefix: &str) -> Self {
        let (kind, mut entry) = self.into_entry();
        entry.path = vpath::join(prefix, &entry.path);
        Self::from_parts(kind, entry)
    }

    /// Same entry, `prefix` removed from the virtual path.
    /// Entries outside `prefix` are returned unchanged.
    pub fn strip(self, prefix: &str) -> Self {
        let (kind, mut entry) = self.into_entry();
        if let Some(rest) = vpath::strip_prefix(&entry.path, prefix) {
            entry.path = rest.to_string();
        }
        Self::from_parts(kind, entry)
    }

    fn from_parts(kind: FileKind, entry: EntryInfo) -> Self {
        match kind {
            FileKind::File => FileInfo::File(entry),
            FileKind::Dir => FileInfo::Dir(entry),
        }
    }

    /// Open the physical file read-only
    pub fn open(&self) -> Result<File> {
        File::open(self.real_path()).map_err(|e| Error::io_at(self.real_path(), e))
    }

    /// Enumerate direct children of a directory entry in name order.
    /// Files have no children.
    pub fn read_dir<F>(&self, mut cb: F) -> Result<()>
    where
        F: FnMut(FileInfo) -> Result<()>,
    {
        let FileInfo::Dir(dir) = self else {
            return Ok(());
        };

        let mut children = Vec::new();
        for entry in fs::read_dir(&dir.real_path).map_err(|e| Error::io_at(&dir.real_path, e))? {
            let entry = entry.map_err(|e| Error::io_at(&dir.real_path, e))?;
            let real = entry.path();
            let meta = fs::symlink_metadata(&real).map_err(|e| Error::io_at(&real, e))?;
            let Ok(name) = entry.file_name().into_string() else {
                warn!("read_dir: skipping non UTF-8 name {:?}", real);
                continue;
            };
            children.push((name, real, meta));
        }
        children.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, real, meta) in children {
            cb(FileInfo::from_metadata(vpath::join(&dir.path, &name), real, &meta))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_relabel_keeps_real_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("lib.js");
        fs::write(&file, b"export {}").unwrap();
        let meta = fs::metadata(&file).unwrap();

        let info = FileInfo::from_metadata("lib.js".to_string(), file.clone(), &meta);
        assert_eq!(info.kind(), FileKind::File);
        assert_eq!(info.size(), 9);

        let nested = info.under("vendor");
        assert_eq!(nested.path(), "vendor/lib.js");
        assert_eq!(nested.name(), "lib.js");
        assert_eq!(nested.real_path(), file.as_path());

        let back = nested.strip("vendor");
        assert_eq!(back.path(), "lib.js");
    }

    #[test]
    fn test_dir_read_dir_and_open() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/b.css"), b"b").unwrap();
        fs::write(dir.path().join("css/a.css"), b"a").unwrap();
        fs::create_dir(dir.path().join("css/sub")).unwrap();

        let real = dir.path().join("css");
        let meta = fs::metadata(&real).unwrap();
        let info = FileInfo::from_metadata("themes/css".to_string(), real, &meta);
        assert!(info.is_dir());

        let mut seen = Vec::new();
        info.read_dir(|child| {
            seen.push((child.path().to_string(), child.is_dir()));
            Ok(())
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![
                ("themes/css/a.css".to_string(), false),
                ("themes/css/b.css".to_string(), false),
                ("themes/css/sub".to_string(), true),
            ]
        );

        let file = dir.path().join("css/a.css");
        let meta = fs::metadata(&file).unwrap();
        let info = FileInfo::from_metadata("a.css".to_string(), file, &meta);
        let mut content = String::new();
        info.open().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "a");
    }
}

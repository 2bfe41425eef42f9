//! assetfs - Overlaying asset filesystem
//!
//! This library presents a single virtual tree of assets backed by an
//! ordered list of physical directories, with named namespace sub-trees and
//! fallback lookups through parent nodes.

pub mod config;
pub mod context;
pub mod error;
pub mod fs;

pub use config::Config;
pub use context::Context;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::context::Context;
    pub use crate::error::{Error, Result};
    pub use crate::fs::{AssetFileSystem, FileInfo, FsNode, GlobPattern, WalkMode};
}

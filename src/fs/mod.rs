//! Overlay asset filesystem
//!
//! Presents one virtual tree backed by ordered physical roots, with named
//! namespace sub-trees and fallback to the parent node.

mod glob;
mod info;
mod mode;
mod node;
mod resolve;
mod search_order;
pub mod vpath;
mod walk;

pub use glob::GlobPattern;
pub use info::{EntryInfo, FileAttributes, FileInfo, FileKind};
pub use mode::WalkMode;
pub use node::{AssetFileSystem, FsNode, Node, NodeId};
pub use search_order::SearchOrder;

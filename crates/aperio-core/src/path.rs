//! # Attribute Paths — Locating Values in a Wrapped Tree
//!
//! An `AttrPath` identifies a node inside a wrapped value tree. Paths
//! render as JSON Pointers (`/items/0/name`) so violation reports line
//! up with the instance paths API consumers already know.

use serde::{Deserialize, Serialize};

/// One step in an attribute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// An object property name.
    Key(String),
    /// An array element index.
    Index(usize),
}

/// A path from the root of a wrapped tree to one node.
///
/// Paths are cheap to extend: wrapping clones the parent path and pushes
/// one segment per child. The root path is empty and displays as an
/// empty pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrPath(Vec<PathSegment>);

impl AttrPath {
    /// The empty root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Extend the path with an object property name.
    pub fn key(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(name.into()));
        Self(segments)
    }

    /// Extend the path with an array index.
    pub fn index(&self, idx: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(idx));
        Self(segments)
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path segments, root first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl std::fmt::Display for AttrPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for segment in &self.0 {
            match segment {
                PathSegment::Key(k) => write!(f, "/{k}")?,
                PathSegment::Index(i) => write!(f, "/{i}")?,
            }
        }
        Ok(())
    }
}

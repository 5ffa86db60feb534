//! Path resolution and containment. Every handler goes through [`resolve`];
//! nothing else turns a URL path into a filesystem path.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::server::registry::DirectoryRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Not found")]
    NotFound,
    #[error("Access denied")]
    AccessDenied,
}

/// An absolute path proven to be the configured root or one of its
/// descendants, along with the normalized sub-path segments it was built
/// from. The segments drive virtual-path and parent computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub full: PathBuf,
    pub segments: Vec<String>,
}

impl ResolvedPath {
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

/// Resolves `sub_path` inside the root registered under `name`.
///
/// `..` and `.` are normalized lexically before any filesystem access, so a
/// request can never address anything outside the root: a `..` with nothing
/// left to pop is `AccessDenied`, as are absolute or prefixed components.
/// Symlinks are not followed during normalization.
pub fn resolve(
    registry: &DirectoryRegistry,
    name: &str,
    sub_path: &str,
) -> Result<ResolvedPath, ResolveError> {
    let root = registry.root(name).ok_or(ResolveError::NotFound)?;
    let segments = normalize_segments(sub_path).ok_or(ResolveError::AccessDenied)?;

    let mut full = root.to_path_buf();
    for segment in &segments {
        full.push(segment);
    }

    // Segment-wise descent cannot leave the root, but keep the containment
    // check all handlers rely on in one place.
    if !full.starts_with(root) {
        return Err(ResolveError::AccessDenied);
    }

    Ok(ResolvedPath { full, segments })
}

/// Lexically normalizes a relative URL sub-path into plain segments.
/// Returns `None` when the path would climb above its origin.
pub fn normalize_segments(sub_path: &str) -> Option<Vec<String>> {
    let mut segments: Vec<String> = Vec::new();

    for component in Path::new(sub_path).components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                if segments.pop().is_none() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(segments)
}

/// URL-facing path for a directory entry, always rooted at `/{name}`.
/// Each segment is percent-encoded, so the result contains only URL-safe
/// characters and can be interpolated into markup unescaped.
pub fn virtual_path(name: &str, segments: &[String]) -> String {
    let mut path = format!("/{}", urlencoding::encode(name));
    for segment in segments {
        path.push('/');
        path.push_str(&urlencoding::encode(segment));
    }
    path
}

/// Virtual path of the parent, obtained by trimming the last segment. The
/// parent of the logical root is the logical root itself.
pub fn parent_path(name: &str, segments: &[String]) -> String {
    if segments.len() <= 1 {
        virtual_path(name, &[])
    } else {
        virtual_path(name, &segments[..segments.len() - 1])
    }
}

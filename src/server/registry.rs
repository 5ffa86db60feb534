use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Immutable mapping from a logical directory name to its filesystem root.
/// Built once at startup and shared read-only between workers.
#[derive(Debug, Clone, Default)]
pub struct DirectoryRegistry {
    roots: HashMap<String, PathBuf>,
}

impl DirectoryRegistry {
    pub fn from_config(config: &Config) -> Self {
        Self::from_entries(
            config
                .directories
                .iter()
                .map(|d| (d.name.clone(), PathBuf::from(&d.path))),
        )
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, PathBuf)>,
    {
        let mut roots = HashMap::new();
        for (name, path) in entries {
            // Duplicate names: the later entry wins.
            roots.insert(name, path);
        }
        DirectoryRegistry { roots }
    }

    pub fn root(&self, name: &str) -> Option<&Path> {
        self.roots.get(name).map(PathBuf::as_path)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// The sole entry, when exactly one directory is configured. The top-level
    /// listing collapses onto that directory in this case.
    pub fn single(&self) -> Option<(&str, &Path)> {
        if self.roots.len() == 1 {
            self.roots
                .iter()
                .next()
                .map(|(name, path)| (name.as_str(), path.as_path()))
        } else {
            None
        }
    }
}

//! The working directory as the core sees it: bytes in, bytes out, keyed by
//! repository-relative `/`-separated paths.

use std::{
    collections::BTreeSet,
    fs, io,
    path::{Component, Path, PathBuf},
};

use tracing::debug;

use super::{
    error::{GitletError, Result},
    GITLET_DIR,
};

#[derive(Debug, Clone)]
pub struct WorkTree {
    root: PathBuf,
}

impl WorkTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.root.join(path).is_file()
    }

    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        fs::read(self.root.join(path)).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => GitletError::FileNotFound(path.to_owned()),
            _ => err.into(),
        })
    }

    /// Write a file, creating any missing parent directories.
    pub fn write(&self, path: &str, contents: &[u8]) -> Result<()> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full, contents)?;
        debug!(path, len = contents.len(), "wrote working file");
        Ok(())
    }

    /// Delete a file. Deleting a file that is already gone is not an error.
    pub fn remove(&self, path: &str) -> Result<()> {
        match fs::remove_file(self.root.join(path)) {
            Ok(()) => {
                debug!(path, "removed working file");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Every regular file under the root, excluding the repository directory.
    pub fn files(&self) -> Result<BTreeSet<String>> {
        let mut result = BTreeSet::new();
        let walker = walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != GITLET_DIR);
        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|_| GitletError::InvalidPath(entry.path().display().to_string()))?;
            if let Some(path) = to_repo_path(relative) {
                result.insert(path);
            }
        }
        Ok(result)
    }
}

/// Normalise a user-supplied path into the `/`-separated form used in commits.
pub fn normalize(path: &str) -> Result<String> {
    let invalid = || GitletError::InvalidPath(path.to_owned());
    if path.contains(['\0', '\n']) {
        return Err(invalid());
    }
    let path = Path::new(path);
    if is_illegal(path) || is_ignored(path) {
        return Err(invalid());
    }
    to_repo_path(path).ok_or_else(invalid)
}

fn to_repo_path(path: &Path) -> Option<String> {
    let mut parts = vec![];
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Whether the specified path lies inside the repository directory.
fn is_ignored(path: &Path) -> bool {
    path.components()
        .any(|c| c == Component::Normal(GITLET_DIR.as_ref()))
}

/// Whether a path contains illegal components.
fn is_illegal(path: &Path) -> bool {
    path.components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
}

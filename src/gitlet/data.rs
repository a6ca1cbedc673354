use std::{
    fmt::Write as _,
    fs, io,
    io::Write as _,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use sha1::{Digest as _, Sha1};
use tracing::debug;

use super::{
    error::{GitletError, Result},
    object::{self, Blob, Commit},
    Digest,
};

/// Content-addressed storage for blobs and commits, one file per object.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    dir: PathBuf,
}

impl ObjectStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the objects directory.
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Adds serialized object bytes to the store and returns their digest. Storing the
    /// same bytes again leaves the existing entry alone.
    pub fn put(&self, bytes: &[u8]) -> Result<Digest> {
        let digest = hash(bytes);
        if self.exists(&digest) {
            debug!(%digest, "object already stored");
        } else {
            write_atomic(&self.object_path(&digest), bytes)?;
            debug!(%digest, len = bytes.len(), "stored object");
        }
        Ok(digest)
    }

    /// Retrieves the object with the specified digest, verifying that its bytes still
    /// hash to that digest.
    pub fn get(&self, digest: &Digest) -> Result<Vec<u8>> {
        let bytes = match fs::read(self.object_path(digest)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(GitletError::MissingObject(digest.clone()))
            }
            Err(err) => return Err(err.into()),
        };
        if hash(&bytes) != *digest {
            return Err(GitletError::CorruptObject {
                digest: digest.clone(),
                reason: "content does not match its digest".to_owned(),
            });
        }
        Ok(bytes)
    }

    pub fn exists(&self, digest: &Digest) -> bool {
        self.object_path(digest).is_file()
    }

    pub fn blob(&self, digest: &Digest) -> Result<Blob> {
        Blob::parse(digest, &self.get(digest)?)
    }

    pub fn commit(&self, digest: &Digest) -> Result<Commit> {
        Commit::parse(digest, &self.get(digest)?)
    }

    pub fn put_commit(&self, commit: &Commit) -> Result<Digest> {
        self.put(&commit.serialize())
    }

    /// Whether the stored object is a commit. Missing objects are not.
    pub fn is_commit(&self, digest: &Digest) -> Result<bool> {
        match fs::read(self.object_path(digest)) {
            Ok(bytes) => Ok(is_commit_frame(&bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// All digests currently in the store, sorted.
    pub fn digests(&self) -> Result<Vec<Digest>> {
        let mut digests = vec![];
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Skip leftovers from interrupted writes.
            if let Some(digest) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
                digests.push(digest);
            }
        }
        digests.sort();
        Ok(digests)
    }

    /// Every commit in the store with its digest, in digest order. Each object is read
    /// once.
    pub fn commits(&self) -> Result<Vec<(Digest, Commit)>> {
        let mut commits = vec![];
        for digest in self.digests()? {
            let bytes = self.get(&digest)?;
            if is_commit_frame(&bytes) {
                let commit = Commit::parse(&digest, &bytes)?;
                commits.push((digest, commit));
            }
        }
        Ok(commits)
    }

    /// Return the path to an object in the object store.
    fn object_path(&self, digest: &Digest) -> PathBuf {
        self.dir.join(digest.as_str())
    }
}

fn is_commit_frame(bytes: &[u8]) -> bool {
    matches!(object::split_frame(bytes), Some((kind, _)) if kind == object::COMMIT.as_bytes())
}

/// Generates a digest from a byte slice.
pub fn hash(bytes: &[u8]) -> Digest {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    let mut oid = String::with_capacity(super::DIGEST_LEN);
    for byte in result {
        // Writing to a String cannot fail.
        let _ = write!(&mut oid, "{:02x}", byte);
    }
    Digest(oid)
}

/// Point a branch ref file at the specified commit.
pub fn update_ref(gitlet_dir: &Path, branch: &str, digest: &Digest) -> Result<()> {
    let path = ref_path(gitlet_dir, branch);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_atomic(&path, digest.as_str().as_bytes())?;
    debug!(branch, %digest, "updated ref");
    Ok(())
}

/// Retrieves the commit a branch ref file points at, if the branch exists.
pub fn get_ref(gitlet_dir: &Path, branch: &str) -> Result<Option<Digest>> {
    match fs::read_to_string(ref_path(gitlet_dir, branch)) {
        Ok(contents) => contents
            .trim()
            .parse()
            .map(Some)
            .map_err(|err: super::InvalidDigest| GitletError::CorruptState(err.to_string())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

pub fn delete_ref(gitlet_dir: &Path, branch: &str) -> Result<()> {
    match fs::remove_file(ref_path(gitlet_dir, branch)) {
        Ok(()) => {
            debug!(branch, "deleted ref");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Record the current branch name in `HEAD`.
pub fn write_head(gitlet_dir: &Path, branch: &str) -> Result<()> {
    write_atomic(&gitlet_dir.join("HEAD"), branch.as_bytes())?;
    Ok(())
}

fn ref_path(gitlet_dir: &Path, branch: &str) -> PathBuf {
    gitlet_dir.join("refs").join("heads").join(branch)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read(path)?;
    Ok(serde_json::from_slice(&contents)?)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &contents)
}

/// Write to a sibling temporary file, then rename it over `path`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

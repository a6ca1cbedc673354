//! Three-way merge of another branch into the current one.

use tracing::{debug, info};

use super::{
    base::Repository,
    diff::{self, Tree},
    error::{GitletError, Result},
    graph,
    object::Blob,
    Digest,
};

pub const CONFLICT_HEADER: &str = "<<<<<<< HEAD\n";
pub const CONFLICT_SEPARATOR: &str = "=======\n";
pub const CONFLICT_TRAILER: &str = ">>>>>>>\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The other branch is already contained in the current one.
    AlreadyUpToDate,
    /// The current branch was moved forward to this commit.
    FastForwarded(Digest),
    /// The merge was committed as this commit.
    Merged(Digest),
    /// These paths now hold conflict markers; nothing was committed.
    Conflicted(Vec<String>),
}

/// What to do with one path, given its digest at the split point, head and other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    KeepHead,
    TakeOther(Digest),
    Remove,
    Conflict {
        head: Option<Digest>,
        other: Option<Digest>,
    },
}

pub fn classify(split: Option<&Digest>, head: Option<&Digest>, other: Option<&Digest>) -> Resolution {
    let conflict = || Resolution::Conflict {
        head: head.cloned(),
        other: other.cloned(),
    };
    match (split, head, other) {
        (Some(s), Some(h), Some(o)) => {
            if h == o || o == s {
                Resolution::KeepHead
            } else if h == s {
                Resolution::TakeOther(o.clone())
            } else {
                conflict()
            }
        }
        (Some(s), Some(h), None) => {
            if h == s {
                Resolution::Remove
            } else {
                conflict()
            }
        }
        (Some(s), None, Some(o)) => {
            if o == s {
                Resolution::KeepHead
            } else {
                conflict()
            }
        }
        (None, None, Some(o)) => Resolution::TakeOther(o.clone()),
        (None, Some(h), Some(o)) if h != o => conflict(),
        _ => Resolution::KeepHead,
    }
}

/// The working-file content recorded for a conflicted path.
pub fn conflict_contents(head: &[u8], other: &[u8]) -> Vec<u8> {
    let mut contents = Vec::with_capacity(
        CONFLICT_HEADER.len()
            + head.len()
            + CONFLICT_SEPARATOR.len()
            + other.len()
            + CONFLICT_TRAILER.len(),
    );
    contents.extend_from_slice(CONFLICT_HEADER.as_bytes());
    contents.extend_from_slice(head);
    contents.extend_from_slice(CONFLICT_SEPARATOR.as_bytes());
    contents.extend_from_slice(other);
    contents.extend_from_slice(CONFLICT_TRAILER.as_bytes());
    contents
}

/// Per-path resolutions for merging `other` into `head` from `split`, in path order.
pub fn resolve_trees(split: &Tree, head: &Tree, other: &Tree) -> Vec<(String, Resolution)> {
    diff::compare_trees(&[split, head, other])
        .into_iter()
        .map(|(path, digests)| {
            (path.to_owned(), classify(digests[0], digests[1], digests[2]))
        })
        .collect()
}

impl Repository {
    /// Merge the named branch into the current branch.
    pub fn merge(&mut self, branch: &str) -> Result<MergeOutcome> {
        if self.state.has_staged_changes() {
            return Err(GitletError::DirtyStagingArea);
        }
        let other_digest = self
            .state
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| GitletError::NoSuchBranch(branch.to_owned()))?;
        if self.state.head == branch {
            return Err(GitletError::SelfMerge);
        }
        let other = self.store.commit(&other_digest)?;
        self.check_untracked(&other)?;

        let head_digest = self.head_digest()?;
        let split_digest = graph::find_split(&self.store, &head_digest, &other_digest)?;
        debug!(split = %split_digest, head = %head_digest, other = %other_digest, "found split point");

        if split_digest == other_digest {
            return Ok(MergeOutcome::AlreadyUpToDate);
        }
        let current = self.state.head.clone();
        if split_digest == head_digest {
            self.switch_work_tree(&other)?;
            self.set_branch(&current, &other_digest)?;
            info!(branch = %current, to = %other_digest, "fast-forwarded");
            return Ok(MergeOutcome::FastForwarded(other_digest));
        }

        let split = self.store.commit(&split_digest)?;
        let head = self.store.commit(&head_digest)?;

        let mut conflicts = vec![];
        for (path, resolution) in resolve_trees(&split.files, &head.files, &other.files) {
            debug!(%path, ?resolution, "resolved path");
            match resolution {
                Resolution::KeepHead => {}
                Resolution::TakeOther(digest) => {
                    let blob = self.store.blob(&digest)?;
                    self.work.write(&path, &blob.contents)?;
                    self.stage_addition(path, digest);
                }
                Resolution::Remove => {
                    self.work.remove(&path)?;
                    self.stage_removal(path);
                }
                Resolution::Conflict { head, other } => {
                    self.write_conflict(&path, head.as_ref(), other.as_ref())?;
                    conflicts.push(path);
                }
            }
        }

        if !conflicts.is_empty() {
            info!(branch, conflicts = conflicts.len(), "merge stopped on conflicts");
            return Ok(MergeOutcome::Conflicted(conflicts));
        }
        let digest = self.commit_staged(&format!("Merged {} into {}.", branch, current))?;
        info!(branch, into = %current, commit = %digest, "merged");
        Ok(MergeOutcome::Merged(digest))
    }

    /// Write conflict markers around both sides into the working file and stage the result.
    fn write_conflict(&mut self, path: &str, head: Option<&Digest>, other: Option<&Digest>) -> Result<()> {
        let head = self.blob_contents(head)?;
        let other = self.blob_contents(other)?;
        let blob = Blob::new(path, conflict_contents(&head, &other));
        self.work.write(path, &blob.contents)?;

        let digest = self.store.put(&blob.serialize())?;
        self.stage_addition(path.to_owned(), digest);
        Ok(())
    }

    fn blob_contents(&self, digest: Option<&Digest>) -> Result<Vec<u8>> {
        match digest {
            Some(digest) => Ok(self.store.blob(digest)?.contents),
            None => Ok(vec![]),
        }
    }
}

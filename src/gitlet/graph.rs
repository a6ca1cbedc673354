//! Ancestry queries over the single-parent commit history.

use std::collections::HashSet;

use super::{
    data::ObjectStore,
    error::{GitletError, Result},
    Digest,
};

/// Lazily walks from a commit to the root by following parent links.
///
/// The walk is finite because every chain ends at the parentless root commit. Clone
/// the iterator (or call [`ancestor_chain`] again) to restart it.
#[derive(Debug, Clone)]
pub struct AncestorChain<'a> {
    store: &'a ObjectStore,
    next: Option<Digest>,
}

pub fn ancestor_chain<'a>(store: &'a ObjectStore, start: &Digest) -> AncestorChain<'a> {
    AncestorChain {
        store,
        next: Some(start.clone()),
    }
}

impl Iterator for AncestorChain<'_> {
    type Item = Result<Digest>;

    fn next(&mut self) -> Option<Self::Item> {
        let digest = self.next.take()?;
        match self.store.commit(&digest) {
            Ok(commit) => {
                self.next = commit.parent;
                Some(Ok(digest))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

/// Find the nearest common ancestor of `head` and `other`.
pub fn find_split(store: &ObjectStore, head: &Digest, other: &Digest) -> Result<Digest> {
    let other_ancestors = ancestor_chain(store, other).collect::<Result<HashSet<Digest>>>()?;
    for digest in ancestor_chain(store, head) {
        let digest = digest?;
        if other_ancestors.contains(&digest) {
            return Ok(digest);
        }
    }
    Err(GitletError::NoCommonAncestor(head.clone(), other.clone()))
}

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    config::Config,
    data::{self, ObjectStore},
    diff::{self, Change, Tree},
    error::{GitletError, Result},
    graph,
    object::{Blob, Commit},
    worktree::{self, WorkTree},
    Digest, DIGEST_LEN, GITLET_DIR,
};

pub const DEFAULT_BRANCH: &str = "master";

const STATE_FILE: &str = "state.json";

/// Everything about a repository that changes between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoState {
    /// Name of the current branch.
    pub head: String,
    pub branches: BTreeMap<String, Digest>,
    pub staged_additions: BTreeMap<String, Digest>,
    pub staged_removals: BTreeSet<String>,
}

impl RepoState {
    fn validate(&self) -> Result<()> {
        if !self.branches.contains_key(&self.head) {
            return Err(GitletError::CorruptState(format!(
                "current branch '{}' has no commit",
                self.head
            )));
        }
        if let Some(path) = self
            .staged_removals
            .iter()
            .find(|path| self.staged_additions.contains_key(*path))
        {
            return Err(GitletError::CorruptState(format!(
                "'{}' is staged for both addition and removal",
                path
            )));
        }
        Ok(())
    }

    pub fn has_staged_changes(&self) -> bool {
        !self.staged_additions.is_empty() || !self.staged_removals.is_empty()
    }
}

/// What `status` reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub current_branch: String,
    pub branches: Vec<String>,
    pub staged: Vec<String>,
    pub removed: Vec<String>,
    /// Paths whose working copy differs from what the next commit would record,
    /// either [`Change::Modified`] or [`Change::Deleted`].
    pub modified: Vec<(String, Change)>,
    pub untracked: Vec<String>,
}

/// An open repository: the object store, the working tree and the session state.
///
/// Load it with [`Repository::open`] at the start of a command and [`Repository::save`]
/// it at the end.
#[derive(Debug)]
pub struct Repository {
    gitlet_dir: PathBuf,
    pub(super) store: ObjectStore,
    pub(super) work: WorkTree,
    pub(super) state: RepoState,
    config: Config,
}

impl Repository {
    /// Initialise a new repository with a root commit and a single branch.
    pub fn init(root: &Path, initial_branch: &str) -> Result<Self> {
        validate_branch_name(initial_branch)?;
        let gitlet_dir = root.join(GITLET_DIR);
        if gitlet_dir.exists() {
            return Err(GitletError::AlreadyInitialized);
        }
        fs::create_dir_all(gitlet_dir.join("refs").join("heads"))?;

        let store = ObjectStore::new(gitlet_dir.join("objects"));
        store.init()?;
        let config = Config::default();
        config.save(&gitlet_dir)?;

        let root_commit = store.put_commit(&Commit::root())?;
        data::update_ref(&gitlet_dir, initial_branch, &root_commit)?;

        let mut branches = BTreeMap::new();
        branches.insert(initial_branch.to_owned(), root_commit.clone());
        let repo = Self {
            store,
            work: WorkTree::new(root),
            state: RepoState {
                head: initial_branch.to_owned(),
                branches,
                staged_additions: BTreeMap::new(),
                staged_removals: BTreeSet::new(),
            },
            config,
            gitlet_dir,
        };
        repo.save()?;

        info!(branch = initial_branch, root = %root_commit, "initialized repository");
        Ok(repo)
    }

    pub fn open(root: &Path) -> Result<Self> {
        let gitlet_dir = root.join(GITLET_DIR);
        if !gitlet_dir.is_dir() {
            return Err(GitletError::NotInitialized);
        }
        let config = Config::load(&gitlet_dir)?;
        let state: RepoState = data::read_json(&gitlet_dir.join(STATE_FILE))?;
        state.validate()?;
        debug!(head = %state.head, branches = state.branches.len(), "loaded repository state");

        // The snapshot wins; a stale ref file means an earlier command died midway.
        let recorded = data::get_ref(&gitlet_dir, &state.head)?;
        if recorded.as_ref() != state.branches.get(&state.head) {
            warn!(
                branch = %state.head,
                ref_file = ?recorded,
                "branch ref file disagrees with repository state"
            );
        }

        Ok(Self {
            store: ObjectStore::new(gitlet_dir.join("objects")),
            work: WorkTree::new(root),
            state,
            config,
            gitlet_dir,
        })
    }

    /// Persist the session state.
    pub fn save(&self) -> Result<()> {
        data::write_json(&self.gitlet_dir.join(STATE_FILE), &self.state)?;
        data::write_head(&self.gitlet_dir, &self.state.head)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn head_digest(&self) -> Result<Digest> {
        self.state
            .branches
            .get(&self.state.head)
            .cloned()
            .ok_or_else(|| {
                GitletError::CorruptState(format!("current branch '{}' has no commit", self.state.head))
            })
    }

    pub fn head_commit(&self) -> Result<Commit> {
        self.store.commit(&self.head_digest()?)
    }

    /// Stage the working copy of `path` for the next commit.
    pub fn add(&mut self, path: &str) -> Result<()> {
        let path = worktree::normalize(path)?;
        if !self.work.exists(&path) {
            return Err(GitletError::FileNotFound(path));
        }
        let blob = Blob::new(path.clone(), self.work.read(&path)?);
        let bytes = blob.serialize();
        let digest = data::hash(&bytes);

        let head = self.head_commit()?;
        if head.files.get(&path) == Some(&digest) {
            debug!(%path, "working copy matches head, clearing staged entries");
            self.state.staged_additions.remove(&path);
            self.state.staged_removals.remove(&path);
            return Ok(());
        }

        self.store.put(&bytes)?;
        self.stage_addition(path, digest);
        Ok(())
    }

    /// Unstage `path`, and if it is tracked, delete it and stage its removal.
    pub fn remove(&mut self, path: &str) -> Result<()> {
        let path = worktree::normalize(path)?;
        let head = self.head_commit()?;
        if head.files.contains_key(&path) {
            self.work.remove(&path)?;
            self.stage_removal(path);
        } else if self.state.staged_additions.remove(&path).is_some() {
            debug!(%path, "unstaged addition");
        } else {
            return Err(GitletError::NothingToRemove(path));
        }
        Ok(())
    }

    /// Record the staged changes as a new commit on the current branch.
    pub fn commit(&mut self, message: &str) -> Result<Digest> {
        if message.trim().is_empty() {
            return Err(GitletError::EmptyMessage);
        }
        if !self.state.has_staged_changes() {
            return Err(GitletError::NothingToCommit);
        }
        self.commit_staged(message)
    }

    /// Fold staging onto the head's mapping and advance the current branch, even if
    /// nothing is staged.
    pub(super) fn commit_staged(&mut self, message: &str) -> Result<Digest> {
        let parent = self.head_digest()?;
        let mut files = self.store.commit(&parent)?.files;
        files.extend(
            self.state
                .staged_additions
                .iter()
                .map(|(path, digest)| (path.clone(), digest.clone())),
        );
        for path in &self.state.staged_removals {
            files.remove(path);
        }

        let commit = Commit {
            message: message.to_owned(),
            timestamp: Utc::now(),
            files,
            parent: Some(parent),
        };
        let digest = self.store.put_commit(&commit)?;
        let branch = self.state.head.clone();
        self.set_branch(&branch, &digest)?;
        self.clear_staging();

        info!(%digest, branch = %branch, files = commit.files.len(), "created commit");
        Ok(digest)
    }

    /// Create a branch pointing at the current head commit.
    pub fn branch(&mut self, name: &str) -> Result<()> {
        validate_branch_name(name)?;
        if self.state.branches.contains_key(name) {
            return Err(GitletError::DuplicateBranch(name.to_owned()));
        }
        let head = self.head_digest()?;
        self.set_branch(name, &head)
    }

    pub fn delete_branch(&mut self, name: &str) -> Result<()> {
        if self.state.head == name {
            return Err(GitletError::CannotDeleteCurrent);
        }
        if self.state.branches.remove(name).is_none() {
            return Err(GitletError::NoSuchBranch(name.to_owned()));
        }
        data::delete_ref(&self.gitlet_dir, name)?;
        info!(branch = name, "deleted branch");
        Ok(())
    }

    /// Restore one file from a commit (the head commit when `commit` is `None`).
    pub fn checkout_file(&mut self, path: &str, commit: Option<&Digest>) -> Result<()> {
        let path = worktree::normalize(path)?;
        let commit = match commit {
            Some(digest) => self.store.commit(digest)?,
            None => self.head_commit()?,
        };
        let digest = commit
            .files
            .get(&path)
            .ok_or_else(|| GitletError::FileNotInCommit(path.clone()))?;
        let blob = self.store.blob(digest)?;
        self.work.write(&path, &blob.contents)
    }

    /// Switch the working tree and `HEAD` to another branch.
    pub fn checkout_branch(&mut self, name: &str) -> Result<()> {
        let target_digest = self
            .state
            .branches
            .get(name)
            .cloned()
            .ok_or_else(|| GitletError::NoSuchCheckoutBranch(name.to_owned()))?;
        if self.state.head == name {
            return Err(GitletError::AlreadyOnBranch);
        }
        let target = self.store.commit(&target_digest)?;
        self.check_untracked(&target)?;

        self.switch_work_tree(&target)?;
        self.clear_staging();
        self.state.head = name.to_owned();

        info!(branch = name, commit = %target_digest, "checked out branch");
        Ok(())
    }

    /// Move the current branch to `digest` and make the working tree match it.
    pub fn reset(&mut self, digest: &Digest) -> Result<()> {
        let target = self.store.commit(digest)?;
        self.check_untracked(&target)?;

        self.switch_work_tree(&target)?;
        let branch = self.state.head.clone();
        self.set_branch(&branch, digest)?;
        self.clear_staging();
        Ok(())
    }

    /// Expand a (possibly abbreviated) commit id into the unique commit it names.
    pub fn resolve_commit(&self, id: &str) -> Result<Digest> {
        let prefix = id.trim().to_ascii_lowercase();
        let missing = || GitletError::AmbiguousOrMissingId(id.to_owned());
        if prefix.is_empty() || prefix.len() > DIGEST_LEN {
            return Err(missing());
        }

        let mut matches = vec![];
        for digest in self.store.digests()? {
            if digest.as_str().starts_with(&prefix) && self.store.is_commit(&digest)? {
                matches.push(digest);
            }
        }
        if matches.len() > 1 {
            debug!(id, candidates = matches.len(), "ambiguous commit id");
        }
        match matches.len() {
            1 => Ok(matches.remove(0)),
            _ => Err(missing()),
        }
    }

    /// The current branch's history, newest first.
    pub fn log(&self) -> Result<Vec<(Digest, Commit)>> {
        graph::ancestor_chain(&self.store, &self.head_digest()?)
            .map(|digest| {
                let digest = digest?;
                let commit = self.store.commit(&digest)?;
                Ok((digest, commit))
            })
            .collect()
    }

    /// Every commit ever made, in digest order.
    pub fn global_log(&self) -> Result<Vec<(Digest, Commit)>> {
        self.store.commits()
    }

    /// Ids of all commits with exactly this message.
    pub fn find(&self, message: &str) -> Result<Vec<Digest>> {
        let found: Vec<Digest> = self
            .global_log()?
            .into_iter()
            .filter(|(_, commit)| commit.message == message)
            .map(|(digest, _)| digest)
            .collect();
        if found.is_empty() {
            return Err(GitletError::NoCommitWithMessage);
        }
        Ok(found)
    }

    pub fn status(&self) -> Result<Status> {
        let head = self.head_commit()?;
        let expected = self.expected_tree(&head);
        let working = self.working_tree()?;

        let mut modified = vec![];
        let mut untracked = vec![];
        for (path, change) in diff::changed_files(&expected, &working) {
            match change {
                Change::Added => untracked.push(path.to_owned()),
                Change::Modified | Change::Deleted => modified.push((path.to_owned(), change)),
            }
        }

        Ok(Status {
            current_branch: self.state.head.clone(),
            branches: self.state.branches.keys().cloned().collect(),
            staged: self.state.staged_additions.keys().cloned().collect(),
            removed: self.state.staged_removals.iter().cloned().collect(),
            modified,
            untracked,
        })
    }

    pub(super) fn set_branch(&mut self, name: &str, digest: &Digest) -> Result<()> {
        data::update_ref(&self.gitlet_dir, name, digest)?;
        self.state.branches.insert(name.to_owned(), digest.clone());
        info!(branch = name, %digest, "moved branch");
        Ok(())
    }

    pub(super) fn stage_addition(&mut self, path: String, digest: Digest) {
        self.state.staged_removals.remove(&path);
        debug!(%path, %digest, "staged addition");
        self.state.staged_additions.insert(path, digest);
    }

    pub(super) fn stage_removal(&mut self, path: String) {
        self.state.staged_additions.remove(&path);
        debug!(%path, "staged removal");
        self.state.staged_removals.insert(path);
    }

    fn clear_staging(&mut self) {
        self.state.staged_additions.clear();
        self.state.staged_removals.clear();
    }

    /// What the next commit would record: head overlaid with staging.
    fn expected_tree(&self, head: &Commit) -> Tree {
        let mut tree = head.files.clone();
        for (path, digest) in &self.state.staged_additions {
            tree.insert(path.clone(), digest.clone());
        }
        for path in &self.state.staged_removals {
            tree.remove(path);
        }
        tree
    }

    /// Digest every working file as if it were about to be staged.
    fn working_tree(&self) -> Result<Tree> {
        let mut tree = Tree::new();
        for path in self.work.files()? {
            let digest = Blob::new(path.clone(), self.work.read(&path)?).digest();
            tree.insert(path, digest);
        }
        Ok(tree)
    }

    /// Fail if switching to `target` would overwrite an untracked file with different
    /// content.
    pub(super) fn check_untracked(&self, target: &Commit) -> Result<()> {
        let expected = self.expected_tree(&self.head_commit()?);
        for path in self.work.files()? {
            if expected.contains_key(&path) {
                continue;
            }
            if let Some(target_digest) = target.files.get(&path) {
                let digest = Blob::new(path.clone(), self.work.read(&path)?).digest();
                if digest != *target_digest {
                    return Err(GitletError::UntrackedFileConflict(path));
                }
            }
        }
        Ok(())
    }

    /// Delete files tracked at head but absent from `target`, then write out every file
    /// `target` tracks.
    pub(super) fn switch_work_tree(&self, target: &Commit) -> Result<()> {
        let head = self.head_commit()?;
        for path in head.files.keys() {
            if !target.files.contains_key(path) {
                self.work.remove(path)?;
            }
        }
        for (path, digest) in &target.files {
            let blob = self.store.blob(digest)?;
            self.work.write(path, &blob.contents)?;
        }
        Ok(())
    }
}

fn validate_branch_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !name.chars().any(char::is_whitespace);
    if valid {
        Ok(())
    } else {
        Err(GitletError::InvalidBranchName(name.to_owned()))
    }
}


#[cfg(test)]
mod tests {
    use super::fixture::Fixture;
    use super::*;

    #[test]
    fn init_creates_root_commit_on_default_branch() {
        let fx = Fixture::new();
        let head = fx.repo.head_commit().unwrap();
        assert_eq!(head.message, "initial commit");
        assert!(head.parent.is_none());
        assert!(head.files.is_empty());
        assert_eq!(fx.repo.state.head, DEFAULT_BRANCH);
        assert_eq!(
            data::get_ref(&fx.dir.path().join(GITLET_DIR), DEFAULT_BRANCH).unwrap(),
            Some(fx.repo.head_digest().unwrap())
        );
    }

    #[test]
    fn init_twice_fails() {
        let fx = Fixture::new();
        let err = Repository::init(fx.dir.path(), DEFAULT_BRANCH).unwrap_err();
        assert!(matches!(err, GitletError::AlreadyInitialized));
    }

    #[test]
    fn open_outside_repository_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Repository::open(dir.path()).unwrap_err();
        assert!(matches!(err, GitletError::NotInitialized));
    }

    #[test]
    fn state_survives_reopen() {
        let mut fx = Fixture::new();
        fx.write("a.txt", "hello");
        fx.repo.add("a.txt").unwrap();
        fx.repo.branch("feature").unwrap();

        let before = fx.repo.state.clone();
        fx.reopen();
        assert_eq!(fx.repo.state, before);
    }

    #[test]
    fn add_missing_file_fails() {
        let mut fx = Fixture::new();
        let err = fx.repo.add("nope.txt").unwrap_err();
        assert!(matches!(err, GitletError::FileNotFound(_)));
    }

    #[test]
    fn adding_unchanged_content_twice_is_a_no_op() {
        let mut fx = Fixture::new();
        fx.commit_files(&[("a.txt", "hello")], "add a");

        fx.repo.add("a.txt").unwrap();
        fx.repo.add("a.txt").unwrap();
        assert!(!fx.repo.state.has_staged_changes());
        assert_eq!(
            fx.repo.head_commit().unwrap().files["a.txt"],
            Blob::new("a.txt", b"hello".to_vec()).digest()
        );
    }

    #[test]
    fn adding_twice_stages_once() {
        let mut fx = Fixture::new();
        fx.write("a.txt", "hello");
        fx.repo.add("a.txt").unwrap();
        let staged = fx.repo.state.staged_additions.clone();

        fx.repo.add("a.txt").unwrap();
        assert_eq!(fx.repo.state.staged_additions, staged);
        assert_eq!(staged.len(), 1);
    }

    #[test]
    fn adding_reverted_content_clears_stale_stage() {
        let mut fx = Fixture::new();
        fx.commit_files(&[("a.txt", "v1")], "v1");
        fx.write("a.txt", "v2");
        fx.repo.add("a.txt").unwrap();
        assert!(fx.repo.state.staged_additions.contains_key("a.txt"));

        fx.write("a.txt", "v1");
        fx.repo.add("a.txt").unwrap();
        assert!(!fx.repo.state.has_staged_changes());
    }

    #[test]
    fn add_after_remove_unstages_removal() {
        let mut fx = Fixture::new();
        fx.commit_files(&[("a.txt", "v1")], "v1");
        fx.repo.remove("a.txt").unwrap();
        assert!(fx.repo.state.staged_removals.contains("a.txt"));

        fx.write("a.txt", "v1");
        fx.repo.add("a.txt").unwrap();
        assert!(!fx.repo.state.has_staged_changes());
    }

    #[test]
    fn remove_tracked_file_deletes_it_and_commit_drops_it() {
        let mut fx = Fixture::new();
        fx.commit_files(&[("a.txt", "hello"), ("b.txt", "keep")], "two files");

        fx.repo.remove("a.txt").unwrap();
        assert!(!fx.exists("a.txt"));
        assert!(fx.repo.state.staged_removals.contains("a.txt"));

        fx.repo.commit("drop a").unwrap();
        let files = fx.repo.head_commit().unwrap().files;
        assert!(!files.contains_key("a.txt"));
        assert!(files.contains_key("b.txt"));
        assert!(!fx.repo.state.has_staged_changes());
    }

    #[test]
    fn remove_staged_only_file_keeps_working_copy() {
        let mut fx = Fixture::new();
        fx.write("new.txt", "fresh");
        fx.repo.add("new.txt").unwrap();

        fx.repo.remove("new.txt").unwrap();
        assert!(fx.exists("new.txt"));
        assert!(!fx.repo.state.has_staged_changes());
    }

    #[test]
    fn remove_unknown_file_fails() {
        let mut fx = Fixture::new();
        fx.write("loose.txt", "x");
        let err = fx.repo.remove("loose.txt").unwrap_err();
        assert!(matches!(err, GitletError::NothingToRemove(_)));
        assert!(fx.exists("loose.txt"));
    }

    #[test]
    fn commit_preconditions() {
        let mut fx = Fixture::new();
        assert!(matches!(fx.repo.commit("msg"), Err(GitletError::NothingToCommit)));

        fx.write("a.txt", "x");
        fx.repo.add("a.txt").unwrap();
        assert!(matches!(fx.repo.commit("   "), Err(GitletError::EmptyMessage)));
    }

    #[test]
    fn commit_builds_on_parent_snapshot() {
        let mut fx = Fixture::new();
        let first = fx.commit_files(&[("a.txt", "1"), ("b.txt", "1")], "first");
        let second = fx.commit_files(&[("b.txt", "2")], "second");

        let commit = fx.repo.store.commit(&second).unwrap();
        assert_eq!(commit.parent, Some(first.clone()));
        assert_eq!(commit.files.len(), 2);
        assert_eq!(
            commit.files["a.txt"],
            fx.repo.store.commit(&first).unwrap().files["a.txt"]
        );
        assert_eq!(fx.repo.head_digest().unwrap(), second);
    }

    #[test]
    fn branch_and_delete_branch() {
        let mut fx = Fixture::new();
        fx.repo.branch("feature").unwrap();
        assert_eq!(
            fx.repo.state.branches["feature"],
            fx.repo.head_digest().unwrap()
        );
        assert!(matches!(
            fx.repo.branch("feature"),
            Err(GitletError::DuplicateBranch(_))
        ));
        assert!(matches!(
            fx.repo.branch("bad/name"),
            Err(GitletError::InvalidBranchName(_))
        ));

        assert!(matches!(
            fx.repo.delete_branch(DEFAULT_BRANCH),
            Err(GitletError::CannotDeleteCurrent)
        ));
        fx.repo.delete_branch("feature").unwrap();
        assert!(matches!(
            fx.repo.delete_branch("feature"),
            Err(GitletError::NoSuchBranch(_))
        ));
        assert_eq!(
            data::get_ref(&fx.dir.path().join(GITLET_DIR), "feature").unwrap(),
            None
        );
    }

    #[test]
    fn checkout_file_from_head_and_older_commit() {
        let mut fx = Fixture::new();
        let v1 = fx.commit_files(&[("a.txt", "v1")], "v1");
        fx.commit_files(&[("a.txt", "v2")], "v2");

        fx.write("a.txt", "scribble");
        fx.repo.checkout_file("a.txt", None).unwrap();
        assert_eq!(fx.read("a.txt"), "v2");

        fx.repo.checkout_file("a.txt", Some(&v1)).unwrap();
        assert_eq!(fx.read("a.txt"), "v1");
        assert!(!fx.repo.state.has_staged_changes());

        assert!(matches!(
            fx.repo.checkout_file("missing.txt", None),
            Err(GitletError::FileNotInCommit(_))
        ));
    }

    #[test]
    fn checkout_branch_swaps_working_tree() {
        let mut fx = Fixture::new();
        fx.commit_files(&[("shared.txt", "base"), ("only-master.txt", "m")], "base");
        fx.repo.branch("other").unwrap();
        fx.commit_files(&[("shared.txt", "master edit")], "master edit");

        fx.repo.checkout_branch("other").unwrap();
        assert_eq!(fx.repo.state.head, "other");
        assert_eq!(fx.read("shared.txt"), "base");

        fx.commit_removals(&["only-master.txt"], "drop on other");
        fx.repo.checkout_branch(DEFAULT_BRANCH).unwrap();
        assert_eq!(fx.read("only-master.txt"), "m");
        assert_eq!(fx.read("shared.txt"), "master edit");

        fx.repo.checkout_branch("other").unwrap();
        assert!(!fx.exists("only-master.txt"));
    }

    #[test]
    fn checkout_branch_preconditions() {
        let mut fx = Fixture::new();
        assert!(matches!(
            fx.repo.checkout_branch("nope"),
            Err(GitletError::NoSuchCheckoutBranch(_))
        ));
        assert!(matches!(
            fx.repo.checkout_branch(DEFAULT_BRANCH),
            Err(GitletError::AlreadyOnBranch)
        ));
    }

    #[test]
    fn checkout_branch_refuses_to_clobber_untracked_file() {
        let mut fx = Fixture::new();
        fx.repo.branch("other").unwrap();
        fx.repo.checkout_branch("other").unwrap();
        fx.commit_files(&[("f.txt", "from other")], "other adds f");
        fx.repo.checkout_branch(DEFAULT_BRANCH).unwrap();
        assert!(!fx.exists("f.txt"));

        fx.write("f.txt", "untracked local");
        let err = fx.repo.checkout_branch("other").unwrap_err();
        assert!(matches!(err, GitletError::UntrackedFileConflict(p) if p == "f.txt"));
        assert_eq!(fx.repo.state.head, DEFAULT_BRANCH);
        assert_eq!(fx.read("f.txt"), "untracked local");

        // Identical content would not be lost, so it is allowed.
        fx.write("f.txt", "from other");
        fx.repo.checkout_branch("other").unwrap();
    }

    #[test]
    fn checkout_branch_clears_staging() {
        let mut fx = Fixture::new();
        fx.repo.branch("other").unwrap();
        fx.write("pending.txt", "x");
        fx.repo.add("pending.txt").unwrap();

        fx.repo.checkout_branch("other").unwrap();
        assert!(!fx.repo.state.has_staged_changes());
    }

    #[test]
    fn reset_moves_branch_and_clears_staging() {
        let mut fx = Fixture::new();
        let first = fx.commit_files(&[("a.txt", "1")], "first");
        fx.commit_files(&[("a.txt", "2"), ("b.txt", "2")], "second");
        fx.write("c.txt", "staged");
        fx.repo.add("c.txt").unwrap();

        fx.repo.reset(&first).unwrap();
        assert_eq!(fx.repo.head_digest().unwrap(), first);
        assert!(!fx.repo.state.has_staged_changes());
        assert_eq!(fx.read("a.txt"), "1");
        assert!(!fx.exists("b.txt"));
    }

    #[test]
    fn reset_refuses_to_clobber_untracked_file() {
        let mut fx = Fixture::new();
        let first = fx.commit_files(&[("f.txt", "tracked")], "adds f");
        fx.commit_removals(&["f.txt"], "removes f");
        fx.write("f.txt", "local");
        fx.write("g.txt", "pending");
        fx.repo.add("g.txt").unwrap();
        let before = fx.repo.state.clone();

        let err = fx.repo.reset(&first).unwrap_err();
        assert!(matches!(err, GitletError::UntrackedFileConflict(p) if p == "f.txt"));
        assert_eq!(fx.repo.state, before);
        assert_eq!(fx.read("f.txt"), "local");
        assert_eq!(fx.read("g.txt"), "pending");
    }

    #[test]
    fn reset_to_commit_on_another_branch() {
        let mut fx = Fixture::new();
        fx.repo.branch("other").unwrap();
        fx.repo.checkout_branch("other").unwrap();
        let elsewhere = fx.commit_files(&[("x.txt", "x")], "on other");
        fx.repo.checkout_branch(DEFAULT_BRANCH).unwrap();

        fx.repo.reset(&elsewhere).unwrap();
        assert_eq!(fx.repo.state.head, DEFAULT_BRANCH);
        assert_eq!(fx.repo.head_digest().unwrap(), elsewhere);
        assert_eq!(fx.read("x.txt"), "x");
    }

    #[test]
    fn resolve_commit_by_prefix() {
        let mut fx = Fixture::new();
        let digest = fx.commit_files(&[("a.txt", "1")], "first");

        assert_eq!(fx.repo.resolve_commit(digest.abbrev(8)).unwrap(), digest);
        assert_eq!(fx.repo.resolve_commit(digest.as_str()).unwrap(), digest);
        assert!(matches!(
            fx.repo.resolve_commit(""),
            Err(GitletError::AmbiguousOrMissingId(_))
        ));

        let blob = fx.repo.head_commit().unwrap().files["a.txt"].clone();
        assert!(matches!(
            fx.repo.resolve_commit(blob.as_str()),
            Err(GitletError::AmbiguousOrMissingId(_))
        ));
    }

    #[test]
    fn log_follows_first_parents_and_find_matches_messages() {
        let mut fx = Fixture::new();
        fx.commit_files(&[("a.txt", "1")], "same message");
        fx.commit_files(&[("a.txt", "2")], "same message");

        let log = fx.repo.log().unwrap();
        let messages: Vec<&str> = log.iter().map(|(_, c)| c.message.as_str()).collect();
        assert_eq!(messages, vec!["same message", "same message", "initial commit"]);

        assert_eq!(fx.repo.global_log().unwrap().len(), 3);
        assert_eq!(fx.repo.find("same message").unwrap().len(), 2);
        assert!(matches!(
            fx.repo.find("nothing"),
            Err(GitletError::NoCommitWithMessage)
        ));
    }

    #[test]
    fn status_reports_every_section() {
        let mut fx = Fixture::new();
        fx.commit_files(
            &[("edited.txt", "1"), ("deleted.txt", "1"), ("removed.txt", "1")],
            "base",
        );
        fx.repo.branch("feature").unwrap();

        fx.write("staged.txt", "new");
        fx.repo.add("staged.txt").unwrap();
        fx.repo.remove("removed.txt").unwrap();
        fx.write("edited.txt", "2");
        fx.delete("deleted.txt");
        fx.write("loose.txt", "?");

        let status = fx.repo.status().unwrap();
        assert_eq!(status.current_branch, DEFAULT_BRANCH);
        assert_eq!(status.branches, vec!["feature", DEFAULT_BRANCH]);
        assert_eq!(status.staged, vec!["staged.txt"]);
        assert_eq!(status.removed, vec!["removed.txt"]);
        assert_eq!(
            status.modified,
            vec![
                ("deleted.txt".to_owned(), Change::Deleted),
                ("edited.txt".to_owned(), Change::Modified),
            ]
        );
        assert_eq!(status.untracked, vec!["loose.txt"]);
    }

    #[test]
    fn nested_paths_are_tracked() {
        let mut fx = Fixture::new();
        fx.commit_files(&[("dir/sub/a.txt", "deep")], "nested");
        fx.delete("dir/sub/a.txt");

        fx.repo.checkout_file("dir/sub/a.txt", None).unwrap();
        assert_eq!(fx.read("dir/sub/a.txt"), "deep");
    }
}

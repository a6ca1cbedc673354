use thiserror::Error;

use super::{config::ConfigError, Digest};

/// Everything that can stop a gitlet command.
///
/// Variants above the `Io` line are user errors: expected, detected before any
/// mutation, and reported as a single line. The rest are invariant violations or
/// environment failures and abort loudly.
#[derive(Debug, Error)]
pub enum GitletError {
    #[error("A Gitlet version-control system already exists in the current directory.")]
    AlreadyInitialized,

    #[error("Not in an initialized Gitlet directory.")]
    NotInitialized,

    #[error("File does not exist.")]
    FileNotFound(String),

    #[error("Please enter a commit message.")]
    EmptyMessage,

    #[error("No changes added to the commit.")]
    NothingToCommit,

    #[error("No reason to remove the file.")]
    NothingToRemove(String),

    #[error("A branch with that name already exists.")]
    DuplicateBranch(String),

    #[error("A branch with that name does not exist.")]
    NoSuchBranch(String),

    #[error("No such branch exists.")]
    NoSuchCheckoutBranch(String),

    #[error("Cannot remove the current branch.")]
    CannotDeleteCurrent,

    #[error("No need to checkout the current branch.")]
    AlreadyOnBranch,

    #[error("File does not exist in that commit.")]
    FileNotInCommit(String),

    #[error("There is an untracked file in the way; delete it, or add and commit it first.")]
    UntrackedFileConflict(String),

    #[error("You have uncommitted changes.")]
    DirtyStagingArea,

    #[error("Cannot merge a branch with itself.")]
    SelfMerge,

    #[error("No commit with that id exists.")]
    AmbiguousOrMissingId(String),

    #[error("Found no commit with that message.")]
    NoCommitWithMessage,

    #[error("Invalid path '{0}'.")]
    InvalidPath(String),

    #[error("Invalid branch name '{0}'.")]
    InvalidBranchName(String),

    #[error("Incorrect operands.")]
    IncorrectOperands,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("object {0} is missing from the store")]
    MissingObject(Digest),

    #[error("object {digest} is corrupt: {reason}")]
    CorruptObject { digest: Digest, reason: String },

    #[error("commits {0} and {1} share no common ancestor")]
    NoCommonAncestor(Digest, Digest),

    #[error("repository state is corrupt: {0}")]
    CorruptState(String),

    #[error("failed to (de)serialize repository state: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GitletError {
    /// Whether this is an expected precondition failure rather than a broken invariant.
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            GitletError::Io(_)
                | GitletError::MissingObject(_)
                | GitletError::CorruptObject { .. }
                | GitletError::NoCommonAncestor(..)
                | GitletError::CorruptState(_)
                | GitletError::Json(_)
                | GitletError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GitletError>;

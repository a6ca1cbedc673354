pub mod base;
pub mod config;
pub mod data;
pub mod diff;
pub mod error;
pub mod graph;
pub mod merge;
pub mod object;
pub mod worktree;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const GITLET_DIR: &str = ".gitlet";

/// Length of a full hex-encoded SHA-1 digest.
pub const DIGEST_LEN: usize = 40;

/// Hex-encoded SHA-1 of an object's serialized bytes, used as its key in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first `len` characters of the digest, for display.
    pub fn abbrev(&self, len: usize) -> &str {
        &self.0[..len.min(DIGEST_LEN)]
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDigest(pub String);

impl fmt::Display for InvalidDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a {}-character hex digest", self.0, DIGEST_LEN)
    }
}

impl std::error::Error for InvalidDigest {}

impl FromStr for Digest {
    type Err = InvalidDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let is_hex = s
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if s.len() == DIGEST_LEN && is_hex {
            Ok(Digest(s.to_owned()))
        } else {
            Err(InvalidDigest(s.to_owned()))
        }
    }
}

impl TryFrom<String> for Digest {
    type Error = InvalidDigest;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

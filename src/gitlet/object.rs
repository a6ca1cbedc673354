//! Serialized forms of the two object kinds.
//!
//! Every object is framed as `<kind>\0<payload>` and its digest is the SHA-1 of the
//! whole frame, so equal content always maps to the same digest and a blob can never
//! collide with a commit.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{
    data,
    error::{GitletError, Result},
    Digest,
};

pub const BLOB: &str = "blob";
pub const COMMIT: &str = "commit";

/// Split a framed object into its kind tag and payload.
pub fn split_frame(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let index = bytes.iter().position(|b| *b == 0)?;
    Some((&bytes[..index], &bytes[index + 1..]))
}

fn frame(kind: &str, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(kind.len() + 1 + payload.len());
    bytes.extend_from_slice(kind.as_bytes());
    bytes.push(0);
    bytes.extend_from_slice(payload);
    bytes
}

fn corrupt(digest: &Digest, reason: impl Into<String>) -> GitletError {
    GitletError::CorruptObject {
        digest: digest.clone(),
        reason: reason.into(),
    }
}

fn unframe<'a>(digest: &Digest, bytes: &'a [u8], expected: &str) -> Result<&'a [u8]> {
    let (kind, payload) = split_frame(bytes).ok_or_else(|| corrupt(digest, "missing kind tag"))?;
    if kind != expected.as_bytes() {
        return Err(corrupt(
            digest,
            format!("expected a {} but found a {}", expected, String::from_utf8_lossy(kind)),
        ));
    }
    Ok(payload)
}

/// A file's content as it was staged, together with the path it was staged from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub path: String,
    pub contents: Vec<u8>,
}

impl Blob {
    pub fn new(path: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.path.len() + 1 + self.contents.len());
        payload.extend_from_slice(self.path.as_bytes());
        payload.push(0);
        payload.extend_from_slice(&self.contents);
        frame(BLOB, &payload)
    }

    /// The digest this blob would be stored under, without storing it.
    pub fn digest(&self) -> Digest {
        data::hash(&self.serialize())
    }

    pub fn parse(digest: &Digest, bytes: &[u8]) -> Result<Self> {
        let payload = unframe(digest, bytes, BLOB)?;
        let (path, contents) =
            split_frame(payload).ok_or_else(|| corrupt(digest, "blob has no path"))?;
        let path = std::str::from_utf8(path)
            .map_err(|_| corrupt(digest, "blob path is not valid UTF-8"))?;
        Ok(Blob::new(path, contents.to_vec()))
    }
}

/// A complete snapshot of tracked paths plus history metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Tracked mapping: path to blob digest.
    pub files: BTreeMap<String, Digest>,
    pub parent: Option<Digest>,
}

impl Commit {
    /// The root commit every repository starts from.
    pub fn root() -> Self {
        Self {
            message: "initial commit".to_owned(),
            timestamp: DateTime::<Utc>::default(),
            files: BTreeMap::new(),
            parent: None,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut text = String::new();
        if let Some(parent) = &self.parent {
            text.push_str(&format!("parent {}\n", parent));
        }
        text.push_str(&format!("date {}\n", self.timestamp.timestamp()));
        for (path, digest) in &self.files {
            text.push_str(&format!("file {} {}\n", digest, path));
        }
        text.push('\n');
        text.push_str(&self.message);
        frame(COMMIT, text.as_bytes())
    }

    pub fn parse(digest: &Digest, bytes: &[u8]) -> Result<Self> {
        let payload = unframe(digest, bytes, COMMIT)?;
        let text = std::str::from_utf8(payload)
            .map_err(|_| corrupt(digest, "commit is not valid UTF-8"))?;
        let (headers, message) = text
            .split_once("\n\n")
            .ok_or_else(|| corrupt(digest, "commit has no message separator"))?;

        let mut parent = None;
        let mut timestamp = None;
        let mut files = BTreeMap::new();
        // Paths may carry a trailing '\r', so only '\n' ends a header line.
        for line in headers.split('\n') {
            let mut fields = line.splitn(3, ' ');
            let key = fields.next().unwrap_or_default();
            let value = fields
                .next()
                .ok_or_else(|| corrupt(digest, format!("header '{}' has no value", key)))?;
            match key {
                "parent" => parent = Some(parse_digest(digest, value)?),
                "date" => {
                    let secs: i64 = value
                        .parse()
                        .map_err(|_| corrupt(digest, "commit date is not a number"))?;
                    timestamp = DateTime::from_timestamp(secs, 0);
                }
                "file" => {
                    let path = fields
                        .next()
                        .ok_or_else(|| corrupt(digest, "file header has no path"))?;
                    files.insert(path.to_owned(), parse_digest(digest, value)?);
                }
                _ => return Err(corrupt(digest, format!("unrecognised header '{}'", key))),
            }
        }

        Ok(Commit {
            message: message.to_owned(),
            timestamp: timestamp.ok_or_else(|| corrupt(digest, "commit has no valid date"))?,
            files,
            parent,
        })
    }
}

fn parse_digest(owner: &Digest, value: &str) -> Result<Digest> {
    value
        .parse()
        .map_err(|err: super::InvalidDigest| corrupt(owner, err.to_string()))
}

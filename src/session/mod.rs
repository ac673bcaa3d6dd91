// src/session/mod.rs — Sessions and their identifiers

pub mod store;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::types::{Turn, TurnResult};
use crate::infra::errors::CalaiError;

/// Opaque session identifier. Used directly as a directory name, so it may
/// not contain path separators or be `.`/`..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Accept `raw` verbatim. Surrounding whitespace is rejected rather than
    /// trimmed, so the id always names the folder the caller gave.
    pub fn parse(raw: &str) -> Result<Self, CalaiError> {
        let bad = raw.trim().is_empty()
            || raw.trim() != raw
            || raw == "."
            || raw == ".."
            || raw.contains(['/', '\\'])
            || raw.chars().any(char::is_control);
        if bad {
            return Err(CalaiError::InvalidSessionId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Split a session folder path into (root, id).
    pub fn from_path(path: &Path) -> Result<(std::path::PathBuf, Self), CalaiError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CalaiError::InvalidSessionId(path.display().to_string()))?;
        let id = Self::parse(name)?;
        let root = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        Ok((root, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = CalaiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered turns of one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub turns: Vec<Turn>,
}

impl Session {
    pub fn empty(id: SessionId) -> Self {
        Self {
            id,
            turns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn errors(&self) -> usize {
        self.turns.iter().filter(|t| t.result.is_error()).count()
    }

    pub fn estimates(&self) -> impl Iterator<Item = &Turn> {
        self.turns
            .iter()
            .filter(|t| matches!(t.result, TurnResult::CalorieEstimate(_)))
    }
}

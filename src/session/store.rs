// src/session/store.rs — Append-only, per-session turn log on disk
//
// Layout: <root>/<session_id>/turns.jsonl, one JSON turn per line.
// Appends to one session are serialized through a per-id async lock and
// land as a single O_APPEND write, so concurrent requests for the same
// session cannot interleave lines. Distinct sessions never contend.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::io::AsyncWriteExt;

use super::{Session, SessionId};
use crate::core::types::Turn;
use crate::infra::errors::CalaiError;

pub const TURNS_FILE: &str = "turns.jsonl";

pub struct SessionStore {
    root: PathBuf,
    locks: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_dir(&self, id: &SessionId) -> PathBuf {
        self.root.join(id.as_str())
    }

    pub fn turns_path(&self, id: &SessionId) -> PathBuf {
        self.session_dir(id).join(TURNS_FILE)
    }

    fn lock_for(&self, id: &SessionId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        locks.entry(id.clone()).or_default().clone()
    }

    /// Read every stored turn. A session with no log yet is empty. Never
    /// fails: unreadable logs and corrupt lines are skipped with a warning.
    pub async fn load(&self, id: &SessionId) -> Session {
        let lock = self.lock_for(id);
        let session = {
            let _guard = lock.lock().await;
            self.read_session(id).await
        };
        self.release(id, lock);
        session
    }

    async fn read_session(&self, id: &SessionId) -> Session {
        let path = self.turns_path(id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Session::empty(id.clone());
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Cannot read session log: {}", e);
                return Session::empty(id.clone());
            }
        };

        let mut turns = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Turn>(line) {
                Ok(turn) => turns.push(turn),
                Err(e) => tracing::warn!(
                    session = %id,
                    line = lineno + 1,
                    "Skipping unreadable turn: {}",
                    e
                ),
            }
        }

        Session {
            id: id.clone(),
            turns,
        }
    }

    /// Append one turn. The session folder is created on first write.
    pub async fn append(&self, id: &SessionId, turn: &Turn) -> Result<(), CalaiError> {
        let dir = self.session_dir(id);
        let unavailable = |e: &dyn std::fmt::Display| CalaiError::StorageUnavailable {
            path: dir.display().to_string(),
            message: e.to_string(),
        };

        let mut line = serde_json::to_string(turn).map_err(|e| unavailable(&e))?;
        line.push('\n');

        let lock = self.lock_for(id);
        let written = {
            let _guard = lock.lock().await;
            write_line(&dir, &line).await
        };
        self.release(id, lock);
        written.map_err(|e| unavailable(&e))?;

        tracing::debug!(session = %id, turn = %turn.id, "Turn appended");
        Ok(())
    }

    /// Drop the per-id lock entry once nobody else holds or awaits it.
    fn release(&self, id: &SessionId, lock: Arc<tokio::sync::Mutex<()>>) {
        drop(lock);
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        if locks.get(id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(id);
        }
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

async fn write_line(dir: &Path, line: &str) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(TURNS_FILE))
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    file.sync_data().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Intent, TurnResult};

    fn turn(q: &str) -> Turn {
        Turn::new(Some(q), None, Intent::GeneralQuestion, TurnResult::answer("ok")).unwrap()
    }

    #[tokio::test]
    async fn test_load_unknown_session_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let id = SessionId::parse("fresh").unwrap();
        let session = store.load(&id).await;
        assert!(session.is_empty());
        // Loading does not create anything on disk.
        assert!(!store.session_dir(&id).exists());
    }

    #[tokio::test]
    async fn test_corrupt_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let id = SessionId::parse("s").unwrap();
        store.append(&id, &turn("first")).await.unwrap();

        let path = store.turns_path(&id);
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("{not json\n\n");
        std::fs::write(&path, content).unwrap();
        store.append(&id, &turn("second")).await.unwrap();

        let session = store.load(&id).await;
        assert_eq!(session.len(), 2);
        assert_eq!(session.turns[1].query.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_lock_entries_pruned_after_use() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SessionStore::new(dir.path()));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = SessionId::parse(&format!("s{}", i % 3)).unwrap();
                store.append(&id, &turn("q")).await.unwrap();
                store.load(&id).await.len()
            }));
        }
        for h in handles {
            assert!(h.await.unwrap() >= 1);
        }

        assert_eq!(store.tracked_locks(), 0);
        assert_eq!(store.load(&SessionId::parse("s0").unwrap()).await.len(), 3);
        assert_eq!(store.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn test_unwritable_root_is_storage_unavailable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = SessionStore::new(file.path());
        let id = SessionId::parse("s").unwrap();
        let err = store.append(&id, &turn("q")).await.unwrap_err();
        assert!(matches!(err, CalaiError::StorageUnavailable { .. }));
    }
}

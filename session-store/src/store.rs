//! File-backed session cache: one `<id>.json` per session under `cache_dir`.

use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use crate::error::SessionError;
use crate::id::SessionId;
use crate::turn::ChatTurn;

type LockMap = Arc<Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>>;

/// Maps session ids to cache files and serializes access per id.
///
/// A lock entry lives only while some [`Session`] holds or awaits it.
pub struct SessionStore {
    cache_dir: PathBuf,
    locks: LockMap,
}

impl SessionStore {
    /// Creates the store, creating `cache_dir` if missing.
    ///
    /// # Errors
    /// [`SessionError::CacheDir`] if the directory cannot be created.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).map_err(|source| SessionError::CacheDir {
            path: cache_dir.clone(),
            source,
        })?;
        info!(cache_dir = %cache_dir.display(), "session store ready");
        Ok(Self {
            cache_dir,
            locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn path_for(&self, id: &SessionId) -> PathBuf {
        self.cache_dir.join(format!("{id}.json"))
    }

    /// Opens a session for exclusive use and loads its cached turns.
    ///
    /// Waits while another caller holds the same id. An unreadable or
    /// malformed cache is logged and yields an empty session.
    pub async fn load(&self, id: &SessionId) -> Session {
        let guard = self.lock_for(id).lock_owned().await;
        let path = self.path_for(id);
        let turns = match read_turns(&path) {
            Ok(t) => t,
            Err(e) => {
                warn!(session = %id, error = %e, "session cache unreadable; starting empty");
                Vec::new()
            }
        };
        debug!(session = %id, turns = turns.len(), "session loaded");
        Session {
            id: id.clone(),
            path,
            turns,
            guard: Some(guard),
            locks: self.locks.clone(),
        }
    }

    /// Reads the cached turns without taking the session lock.
    ///
    /// Writes replace the file by rename, so a snapshot sees either the
    /// previous or the next full list. Unreadable caches read as empty.
    pub fn snapshot(&self, id: &SessionId) -> Vec<ChatTurn> {
        read_turns(&self.path_for(id)).unwrap_or_else(|e| {
            warn!(session = %id, error = %e, "session cache unreadable; showing empty");
            Vec::new()
        })
    }

    fn lock_for(&self, id: &SessionId) -> Arc<AsyncMutex<()>> {
        let mut map = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        map.entry(id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

/// A loaded conversation. Holds the per-id lock until dropped.
pub struct Session {
    id: SessionId,
    path: PathBuf,
    turns: Vec<ChatTurn>,
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockMap,
}

impl Drop for Session {
    fn drop(&mut self) {
        let mut map = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        drop(self.guard.take());
        // Only the map's own handle left: nobody holds or waits for this id.
        if map.get(&self.id).is_some_and(|m| Arc::strong_count(m) == 1) {
            map.remove(&self.id);
        }
    }
}

impl Session {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Turns in insertion order.
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Appends a turn and persists the full list.
    ///
    /// # Errors
    /// [`SessionError::CacheWrite`] if persisting fails; the turn stays in memory.
    pub fn append(&mut self, turn: ChatTurn) -> Result<(), SessionError> {
        self.turns.push(turn);
        write_turns(&self.path, &self.turns).map_err(|source| {
            error!(
                session = %self.id,
                path = %self.path.display(),
                error = %source,
                "failed to persist session"
            );
            SessionError::CacheWrite {
                path: self.path.clone(),
                source,
            }
        })
    }

    /// Empties the session and deletes its cache file (a missing file is fine).
    ///
    /// # Errors
    /// [`SessionError::CacheWrite`] if the file exists but cannot be removed.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.turns.clear();
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(session = %self.id, "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => {
                error!(session = %self.id, error = %source, "failed to remove session cache");
                Err(SessionError::CacheWrite {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }
}

fn read_turns(path: &Path) -> Result<Vec<ChatTurn>, SessionError> {
    let data = match fs::read(path) {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(SessionError::CacheRead {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };
    serde_json::from_slice(&data).map_err(|e| SessionError::CacheRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Full overwrite through a sibling temp file and rename.
fn write_turns(path: &Path, turns: &[ChatTurn]) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(turns).map_err(io::Error::other)?;
    let tmp = path.with_extension("json.tmp");
    let res = (|| {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(&bytes)?;
        f.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if res.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::Role;
    use std::time::Duration;

    fn id(s: &str) -> SessionId {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn turns_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SessionStore::new(dir.path()).unwrap();
            let mut s = store.load(&SessionId::default()).await;
            s.append(ChatTurn::user("Hạn nộp hồ sơ?")).unwrap();
            s.append(ChatTurn::assistant("Ngày 31/3.")).unwrap();
            s.append(ChatTurn::user("Cảm ơn")).unwrap();
        }

        let store = SessionStore::new(dir.path()).unwrap();
        let s = store.load(&SessionId::default()).await;
        let roles: Vec<Role> = s.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant, Role::User]);
        assert_eq!(s.turns()[1].content, "Ngày 31/3.");
        assert!(dir.path().join("current_chat.json").exists());
    }

    #[tokio::test]
    async fn clear_removes_file_and_turns() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let sid = id("abc");
        {
            let mut s = store.load(&sid).await;
            s.append(ChatTurn::user("q")).unwrap();
            s.clear().unwrap();
            assert!(s.turns().is_empty());
            // Clearing twice is fine.
            s.clear().unwrap();
        }
        assert!(!store.path_for(&sid).exists());
        assert!(store.load(&sid).await.turns().is_empty());
    }

    #[tokio::test]
    async fn malformed_cache_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        fs::write(store.path_for(&SessionId::default()), b"\x80not json").unwrap();

        let mut s = store.load(&SessionId::default()).await;
        assert!(s.turns().is_empty());
        // The next append replaces the broken file.
        s.append(ChatTurn::user("hi")).unwrap();
        drop(s);
        assert_eq!(store.load(&SessionId::default()).await.turns().len(), 1);
    }

    #[tokio::test]
    async fn write_failure_keeps_turn_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache");
        let store = SessionStore::new(&cache).unwrap();
        let mut s = store.load(&id("x")).await;
        fs::remove_dir_all(&cache).unwrap();

        let err = s.append(ChatTurn::user("q")).unwrap_err();
        assert!(matches!(err, SessionError::CacheWrite { .. }));
        assert_eq!(s.turns().len(), 1);
    }

    #[tokio::test]
    async fn same_id_is_exclusive_other_ids_are_not() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let held = store.load(&id("a")).await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), store.load(&id("a"))).await;
        assert!(blocked.is_err());
        let other = tokio::time::timeout(Duration::from_millis(50), store.load(&id("b"))).await;
        assert!(other.is_ok());

        drop(held);
        assert!(
            tokio::time::timeout(Duration::from_millis(50), store.load(&id("a")))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn lock_entries_go_away_with_their_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        for i in 0..1000 {
            let s = store.load(&id(&format!("s{i}"))).await;
            assert_eq!(store.tracked_locks(), 1);
            drop(s);
        }
        assert_eq!(store.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn waiter_keeps_lock_entry_alive() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SessionStore::new(dir.path()).unwrap());
        let mut held = store.load(&id("a")).await;

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut s = store.load(&id("a")).await;
                s.append(ChatTurn::assistant("second")).unwrap();
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        held.append(ChatTurn::user("first")).unwrap();
        drop(held);

        waiter.await.unwrap();
        assert_eq!(store.tracked_locks(), 0);
        let turns = store.snapshot(&id("a"));
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "first");
    }

    #[tokio::test]
    async fn snapshot_reads_while_session_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let mut held = store.load(&SessionId::default()).await;
        held.append(ChatTurn::user("q")).unwrap();

        let turns = store.snapshot(&SessionId::default());
        assert_eq!(turns.len(), 1);
        assert!(store.snapshot(&id("never_written")).is_empty());
        assert_eq!(store.tracked_locks(), 1);
    }
}

// Safeguard — Session Lifecycle
//
// Opens the record store once per session, on first use, and hands every
// caller the same connection. SQLite work runs on the blocking pool so async
// callers suspend instead of stalling the runtime.

use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::store::{
    Database, Record, RecordFields, RecordPatch, RecordStore, SqliteRecordStore, StoreError,
};

use super::StoreConfig;

/// A ready, schema-current connection to the record table.
///
/// Cheap to clone; all clones share one connection. rusqlite connections are
/// not `Sync`, so each operation holds the lock for its own duration only.
#[derive(Clone)]
pub struct StoreHandle {
    db: Arc<Mutex<Database>>,
}

impl StoreHandle {
    fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Run one store operation to completion on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteRecordStore<'_>) -> Result<T, StoreError> + Send + 'static,
    {
        let db = self.db.clone().lock_owned().await;
        tokio::task::spawn_blocking(move || op(&SqliteRecordStore::new(&db)))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    pub async fn add(&self, fields: RecordFields) -> Result<Record, StoreError> {
        self.run(move |store| store.add(fields)).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let id = id.to_string();
        self.run(move |store| store.get(&id)).await
    }

    pub async fn update(
        &self,
        id: &str,
        patch: impl Into<RecordPatch>,
    ) -> Result<Option<Record>, StoreError> {
        let id = id.to_string();
        let patch = patch.into();
        self.run(move |store| store.update(&id, patch)).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.run(move |store| store.delete(&id)).await
    }

    pub async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        self.run(|store| store.list_all()).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Record>, StoreError> {
        let query = query.to_string();
        self.run(move |store| store.search(&query)).await
    }
}

/// Owns the lazily opened store for one process or test.
pub struct Session {
    config: StoreConfig,
    handle: OnceCell<StoreHandle>,
}

impl Session {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            handle: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether the store has been opened successfully.
    pub fn is_ready(&self) -> bool {
        self.handle.initialized()
    }

    /// Open the store on first call and return the shared handle afterwards.
    ///
    /// A failed open leaves the session unopened, so a later call retries.
    pub async fn ensure_ready(&self) -> Result<StoreHandle, StoreError> {
        let handle = self
            .handle
            .get_or_try_init(|| async move {
                let config = self.config.clone();
                let db = tokio::task::spawn_blocking(move || config.open())
                    .await
                    .map_err(|e| StoreError::Task(e.to_string()))??;

                tracing::debug!(location = ?self.config.location, "Session ready");
                Ok::<_, StoreError>(StoreHandle::new(db))
            })
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Record store failed to open"))?;

        Ok(handle.clone())
    }

    pub async fn add(&self, fields: RecordFields) -> Result<Record, StoreError> {
        self.ensure_ready().await?.add(fields).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        self.ensure_ready().await?.get(id).await
    }

    pub async fn update(
        &self,
        id: &str,
        patch: impl Into<RecordPatch>,
    ) -> Result<Option<Record>, StoreError> {
        self.ensure_ready().await?.update(id, patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.ensure_ready().await?.delete(id).await
    }

    pub async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        self.ensure_ready().await?.list_all().await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Record>, StoreError> {
        self.ensure_ready().await?.search(query).await
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_session_opens_lazily() {
        let session = Session::new(StoreConfig::in_memory());
        assert!(!session.is_ready());

        session.ensure_ready().await.unwrap();
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_ensure_ready_reuses_one_connection() {
        let session = Session::new(StoreConfig::in_memory());

        let first = session.ensure_ready().await.unwrap();
        let second = session.ensure_ready().await.unwrap();
        assert!(Arc::ptr_eq(&first.db, &second.db));

        // A private in-memory table is only visible through the same connection.
        let added = first
            .add(RecordFields::new("GitHub", "alice", "s3cret"))
            .await
            .unwrap();
        let seen = second.list_all().await.unwrap();
        assert_eq!(seen, vec![added]);
    }

    #[tokio::test]
    async fn test_failed_open_can_be_retried() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let session = Session::new(StoreConfig::at(blocker.join("safeguard.db")));

        let err = session.ensure_ready().await.err().expect("open must fail");
        assert!(err.is_connection());
        assert!(!session.is_ready());

        std::fs::remove_file(&blocker).unwrap();
        session.ensure_ready().await.unwrap();
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_records_persist_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("safeguard.db");

        let added = {
            let session = Session::new(StoreConfig::at(&path));
            session
                .add(RecordFields::new("GitHub", "alice", "s3cret"))
                .await
                .unwrap()
        };

        let session = Session::new(StoreConfig::at(&path));
        let all = session.list_all().await.unwrap();
        assert_eq!(all, vec![added]);
    }

    #[tokio::test]
    async fn test_session_crud_scenario() {
        let session = Session::new(StoreConfig::in_memory());

        let s1 = session.add(RecordFields::new("S1", "u1", "p1")).await.unwrap();
        let s2 = session.add(RecordFields::new("S2", "u2", "p2")).await.unwrap();
        let s3 = session.add(RecordFields::new("S3", "u3", "p3")).await.unwrap();

        let order: Vec<_> = session
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(order, vec![s3.id.clone(), s2.id.clone(), s1.id.clone()]);

        let updated = session
            .update(&s1.id, RecordFields::new("S1", "u1-renamed", "p1"))
            .await
            .unwrap()
            .expect("s1 exists");
        assert_eq!(updated.username, "u1-renamed");

        let order: Vec<_> = session
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(order, vec![s1.id.clone(), s3.id.clone(), s2.id.clone()]);

        assert_eq!(session.search("renamed").await.unwrap(), vec![updated]);
        assert!(session.update("missing", RecordPatch::default()).await.unwrap().is_none());

        assert!(session.delete(&s2.id).await.unwrap());
        assert!(!session.delete(&s2.id).await.unwrap());
        assert!(session.get(&s2.id).await.unwrap().is_none());
        assert_eq!(session.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_the_store() {
        let session = Arc::new(Session::new(StoreConfig::in_memory()));

        let mut tasks = Vec::new();
        for i in 0..32 {
            let session = session.clone();
            tasks.push(tokio::spawn(async move {
                session
                    .add(RecordFields::new(format!("svc-{i}"), "user", "pw"))
                    .await
                    .unwrap()
            }));
        }

        let mut ids = HashSet::new();
        for task in tasks {
            ids.insert(task.await.unwrap().id);
        }
        assert_eq!(ids.len(), 32);

        let all = session.list_all().await.unwrap();
        assert_eq!(all.len(), 32);
        assert!(all.windows(2).all(|w| w[0].updated_at > w[1].updated_at));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_never_lose_the_record() {
        let session = Arc::new(Session::new(StoreConfig::in_memory()));
        let record = session
            .add(RecordFields::new("GitHub", "alice", "s3cret"))
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for i in 0..16 {
            let session = session.clone();
            let id = record.id.clone();
            tasks.push(tokio::spawn(async move {
                let patch = RecordPatch {
                    secret: Some(format!("secret-{i}")),
                    ..Default::default()
                };
                session.update(&id, patch).await.unwrap().unwrap()
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap());
        }

        let stored = session.get(&record.id).await.unwrap().unwrap();
        let last = results
            .iter()
            .max_by_key(|r| r.updated_at)
            .expect("at least one update");
        assert_eq!(&stored, last, "last committer wins");
        assert_eq!(stored.created_at, record.created_at);
        assert_eq!(session.list_all().await.unwrap().len(), 1);
    }
}

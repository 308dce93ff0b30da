use chrono::Utc;
use tasklist_core::protocol::messages;
use tasklist_core::{Task, TaskDraft, TaskId};
use tokio::sync::Mutex;

pub mod api;
pub mod storage;

pub use storage::{FileTaskStorage, StorageError, TaskStorage};

/// Error type for TaskStore operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskStoreError {
    /// A required field is missing or empty.
    #[error("{0}")]
    Validation(String),
    /// No task carries the requested id.
    #[error("Task not found")]
    NotFound(TaskId),
    /// The stored collection could not be read back before a change.
    #[error("Failed to load tasks")]
    Load(#[source] StorageError),
    /// The updated collection could not be persisted.
    #[error("Failed to save tasks")]
    Storage(#[from] StorageError),
}

impl TaskStoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        TaskStoreError::Validation(message.into())
    }
}

type DynTaskStorage = Box<dyn TaskStorage + Send + Sync>;

/// Authoritative holder of the task collection.
///
/// Every call loads the whole collection, applies its change in memory and
/// writes the whole collection back. Calls are serialized behind one lock, so
/// two writers never interleave their read-modify-write cycles. Changes are
/// refused while the stored collection cannot be read, so an unreadable file
/// is never overwritten.
pub struct TaskStore {
    storage: Mutex<DynTaskStorage>,
}

impl TaskStore {
    pub fn new(storage: impl TaskStorage + Send + Sync + 'static) -> Self {
        Self {
            storage: Mutex::new(Box::new(storage)),
        }
    }

    /// Returns every task in insertion order.
    ///
    /// Unreadable or corrupt storage yields an empty collection instead of an
    /// error; the failure is only logged.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Vec<Task> {
        let storage = self.storage.lock().await;
        load(&**storage).await.unwrap_or_else(|err| {
            tracing::warn!("Cannot load stored tasks, listing none: {}", err);
            Vec::new()
        })
    }

    /// Appends a new task and returns it as stored.
    ///
    /// The requested id, or a clock-derived one when none is given, is bumped by
    /// one until it no longer collides with an existing task.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, draft: TaskDraft) -> Result<Task, TaskStoreError> {
        if draft.text.trim().is_empty() {
            return Err(TaskStoreError::validation(messages::TASK_TEXT_EMPTY));
        }

        let storage = self.storage.lock().await;
        let mut tasks = load(&**storage).await.map_err(TaskStoreError::Load)?;

        let now = Utc::now();
        let mut id = draft.id.unwrap_or_else(|| TaskId::from_clock(now));
        while tasks.iter().any(|task| task.id == id) {
            id = id
                .successor()
                .ok_or_else(|| TaskStoreError::validation(messages::TASK_ID_OUT_OF_RANGE))?;
        }

        let task = Task {
            id,
            text: draft.text,
            completed: draft.completed,
            created_at: draft.created_at.unwrap_or(now),
        };
        tasks.push(task.clone());
        persist(&**storage, &tasks).await?;

        tracing::info!(id = %task.id, "Task created");
        Ok(task)
    }

    /// Replaces the first task with the given id by `replacement`.
    ///
    /// The replacement's own id is stored as given, even when it differs from
    /// the id used for the lookup.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: TaskId, replacement: Task) -> Result<Task, TaskStoreError> {
        let storage = self.storage.lock().await;
        let mut tasks = load(&**storage).await.map_err(TaskStoreError::Load)?;

        let slot = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(TaskStoreError::NotFound(id))?;
        *slot = replacement.clone();
        persist(&**storage, &tasks).await?;

        tracing::info!(%id, "Task updated");
        Ok(replacement)
    }

    /// Removes every task with the given id.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: TaskId) -> Result<(), TaskStoreError> {
        let storage = self.storage.lock().await;
        let mut tasks = load(&**storage).await.map_err(TaskStoreError::Load)?;

        let initial_count = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == initial_count {
            return Err(TaskStoreError::NotFound(id));
        }
        persist(&**storage, &tasks).await?;

        tracing::info!(%id, removed = initial_count - tasks.len(), "Task deleted");
        Ok(())
    }
}

async fn load(storage: &(dyn TaskStorage + Send + Sync)) -> Result<Vec<Task>, StorageError> {
    let Some(contents) = storage.read().await? else {
        return Ok(Vec::new());
    };
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&contents).map_err(StorageError::Decode)
}

async fn persist(
    storage: &(dyn TaskStorage + Send + Sync),
    tasks: &[Task],
) -> Result<(), StorageError> {
    let contents = serde_json::to_string_pretty(tasks)?;
    storage.write(&contents).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::storage::MockTaskStorage;
    use chrono::{DateTime, TimeZone};
    use std::sync::{Arc, Mutex as StdMutex};

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    fn task(id: i64, text: &str) -> Task {
        Task::new(TaskId::new(id), text, created_at())
    }

    /// Storage double that keeps the blob in memory and can be told to refuse writes.
    #[derive(Clone, Default)]
    struct MemoryStorage {
        contents: Arc<StdMutex<Option<String>>>,
        refuse_writes: bool,
    }

    impl MemoryStorage {
        fn with_tasks(tasks: &[Task]) -> Self {
            let storage = Self::default();
            *storage.contents.lock().unwrap() = Some(serde_json::to_string(tasks).unwrap());
            storage
        }

        fn stored_tasks(&self) -> Vec<Task> {
            let contents = self.contents.lock().unwrap();
            serde_json::from_str(contents.as_deref().unwrap_or("[]")).unwrap()
        }
    }

    #[async_trait::async_trait]
    impl TaskStorage for MemoryStorage {
        async fn read(&self) -> Result<Option<String>, StorageError> {
            Ok(self.contents.lock().unwrap().clone())
        }

        async fn write(&self, contents: &str) -> Result<(), StorageError> {
            if self.refuse_writes {
                return Err(StorageError::Io {
                    path: "memory".into(),
                    source: std::io::Error::other("disk full"),
                });
            }
            *self.contents.lock().unwrap() = Some(contents.to_string());
            Ok(())
        }
    }

    mod list_tests {
        use super::*;

        #[tokio::test]
        async fn can_list_tasks_in_insertion_order() {
            let storage = MemoryStorage::with_tasks(&[task(2, "second"), task(1, "first")]);
            let store = TaskStore::new(storage);

            let tasks = store.list().await;

            assert_eq!(tasks, vec![task(2, "second"), task(1, "first")]);
            assert_eq!(store.list().await, tasks);
        }

        #[tokio::test]
        async fn lists_nothing_before_first_write() {
            let store = TaskStore::new(MemoryStorage::default());

            assert!(store.list().await.is_empty());
        }

        #[tokio::test]
        async fn lists_nothing_when_storage_is_corrupt() {
            let mut storage = MockTaskStorage::new();
            storage
                .expect_read()
                .times(1)
                .returning(|| Ok(Some("{not json".to_string())));
            let store = TaskStore::new(storage);

            assert!(store.list().await.is_empty());
        }

        #[tokio::test]
        async fn lists_nothing_when_storage_is_unreadable() {
            let mut storage = MockTaskStorage::new();
            storage.expect_read().times(1).returning(|| {
                Err(StorageError::Io {
                    path: "tasks.json".into(),
                    source: std::io::Error::other("permission denied"),
                })
            });
            let store = TaskStore::new(storage);

            assert!(store.list().await.is_empty());
        }
    }

    mod create_tests {
        use super::*;

        #[tokio::test]
        async fn can_create_task_with_requested_id() {
            let storage = MemoryStorage::default();
            let store = TaskStore::new(storage.clone());

            let created = store
                .create(TaskDraft::new("Buy milk").with_id(TaskId::new(100)))
                .await
                .unwrap();

            assert_eq!(created.id, TaskId::new(100));
            assert_eq!(created.text, "Buy milk");
            assert!(!created.completed);
            assert_eq!(storage.stored_tasks(), vec![created]);
        }

        #[tokio::test]
        async fn probes_upward_past_colliding_ids() {
            let storage =
                MemoryStorage::with_tasks(&[task(100, "a"), task(101, "b"), task(103, "c")]);
            let store = TaskStore::new(storage.clone());

            let created = store
                .create(TaskDraft::new("d").with_id(TaskId::new(100)))
                .await
                .unwrap();

            assert_eq!(created.id, TaskId::new(102));
            let ids: Vec<i64> = storage.stored_tasks().iter().map(|t| t.id.value()).collect();
            assert_eq!(ids, vec![100, 101, 103, 102]);
        }

        #[tokio::test]
        async fn assigns_clock_id_when_none_requested() {
            let store = TaskStore::new(MemoryStorage::default());
            let before = TaskId::from_clock(Utc::now());

            let created = store.create(TaskDraft::new("No id")).await.unwrap();

            assert!(created.id >= before);
            assert_eq!(created.id, TaskId::from_clock(created.created_at));
        }

        #[tokio::test]
        async fn keeps_supplied_creation_time() {
            let store = TaskStore::new(MemoryStorage::default());
            let draft = TaskDraft::from(task(7, "Stamped"));

            let created = store.create(draft).await.unwrap();

            assert_eq!(created.created_at, created_at());
        }

        #[tokio::test]
        async fn rejects_empty_or_blank_text() {
            let storage = MemoryStorage::with_tasks(&[task(1, "existing")]);
            let store = TaskStore::new(storage.clone());

            for text in ["", " ", "\t\n"] {
                let result = store.create(TaskDraft::new(text)).await;
                match result {
                    Err(TaskStoreError::Validation(message)) => {
                        assert_eq!(message, messages::TASK_TEXT_EMPTY)
                    }
                    other => panic!("Expected a validation error, got {:?}", other),
                }
            }
            assert_eq!(storage.stored_tasks(), vec![task(1, "existing")]);
        }

        #[tokio::test]
        async fn keeps_text_as_submitted() {
            let storage = MemoryStorage::default();
            let store = TaskStore::new(storage.clone());

            let created = store.create(TaskDraft::new("  Buy milk ")).await.unwrap();

            assert_eq!(created.text, "  Buy milk ");
            assert_eq!(storage.stored_tasks()[0].text, "  Buy milk ");
        }

        #[tokio::test]
        async fn refuses_to_create_over_undecodable_storage() {
            let mut storage = MockTaskStorage::new();
            storage
                .expect_read()
                .times(1)
                .returning(|| Ok(Some(r#"[{"id": "one", "text": "kept"}]"#.to_string())));
            storage.expect_write().never();
            let store = TaskStore::new(storage);

            let result = store.create(TaskDraft::new("new")).await;

            assert!(matches!(
                result,
                Err(TaskStoreError::Load(StorageError::Decode(_)))
            ));
        }

        #[tokio::test]
        async fn refuses_to_create_over_unreadable_storage() {
            let mut storage = MockTaskStorage::new();
            storage.expect_read().times(1).returning(|| {
                Err(StorageError::Io {
                    path: "tasks.json".into(),
                    source: std::io::Error::other("permission denied"),
                })
            });
            storage.expect_write().never();
            let store = TaskStore::new(storage);

            let result = store.create(TaskDraft::new("new")).await;

            assert!(matches!(result, Err(TaskStoreError::Load(StorageError::Io { .. }))));
        }

        #[tokio::test]
        async fn discards_creation_when_write_fails() {
            let mut storage = MemoryStorage::with_tasks(&[task(1, "existing")]);
            storage.refuse_writes = true;
            let store = TaskStore::new(storage.clone());

            let result = store.create(TaskDraft::new("lost")).await;

            assert!(matches!(result, Err(TaskStoreError::Storage(_))));
            assert_eq!(store.list().await, vec![task(1, "existing")]);
        }

        #[tokio::test]
        async fn writes_pretty_json_with_unescaped_text() {
            let mut storage = MockTaskStorage::new();
            storage.expect_read().returning(|| Ok(None));
            storage
                .expect_write()
                .withf(|contents| contents.starts_with("[\n") && contents.contains("\"text\": \"Café ☕\""))
                .times(1)
                .returning(|_| Ok(()));
            let store = TaskStore::new(storage);

            let result = store.create(TaskDraft::new("Café ☕")).await;

            assert!(result.is_ok());
        }
    }

    mod update_tests {
        use super::*;

        #[tokio::test]
        async fn can_replace_task_wholesale() {
            let storage = MemoryStorage::with_tasks(&[task(1, "one"), task(2, "two")]);
            let store = TaskStore::new(storage.clone());
            let mut replacement = task(2, "two, edited");
            replacement.completed = true;

            let updated = store.update(TaskId::new(2), replacement.clone()).await.unwrap();

            assert_eq!(updated, replacement);
            assert_eq!(storage.stored_tasks(), vec![task(1, "one"), replacement]);
        }

        #[tokio::test]
        async fn stores_replacement_id_as_given() {
            let storage = MemoryStorage::with_tasks(&[task(1, "one")]);
            let store = TaskStore::new(storage.clone());

            store.update(TaskId::new(1), task(50, "moved")).await.unwrap();

            assert_eq!(storage.stored_tasks(), vec![task(50, "moved")]);
        }

        #[tokio::test]
        async fn replaces_only_first_match() {
            let storage = MemoryStorage::with_tasks(&[task(4, "first"), task(4, "duplicate")]);
            let store = TaskStore::new(storage.clone());

            store.update(TaskId::new(4), task(4, "changed")).await.unwrap();

            assert_eq!(
                storage.stored_tasks(),
                vec![task(4, "changed"), task(4, "duplicate")]
            );
        }

        #[tokio::test]
        async fn fails_for_unknown_id_without_writing() {
            let mut storage = MockTaskStorage::new();
            storage
                .expect_read()
                .returning(|| Ok(Some(serde_json::to_string(&[task(1, "one")]).unwrap())));
            storage.expect_write().never();
            let store = TaskStore::new(storage);

            let result = store.update(TaskId::new(9), task(9, "ghost")).await;

            assert!(matches!(result, Err(TaskStoreError::NotFound(id)) if id == TaskId::new(9)));
        }
    }

    mod delete_tests {
        use super::*;

        #[tokio::test]
        async fn removes_every_matching_task_and_keeps_order() {
            let storage = MemoryStorage::with_tasks(&[
                task(1, "a"),
                task(2, "b"),
                task(1, "c"),
                task(3, "d"),
            ]);
            let store = TaskStore::new(storage.clone());

            store.delete(TaskId::new(1)).await.unwrap();

            assert_eq!(storage.stored_tasks(), vec![task(2, "b"), task(3, "d")]);
        }

        #[tokio::test]
        async fn fails_for_unknown_id_and_leaves_collection() {
            let storage = MemoryStorage::with_tasks(&[task(1, "a")]);
            let store = TaskStore::new(storage.clone());

            let result = store.delete(TaskId::new(2)).await;

            assert!(matches!(result, Err(TaskStoreError::NotFound(_))));
            assert_eq!(storage.stored_tasks(), vec![task(1, "a")]);
        }

        #[tokio::test]
        async fn refuses_to_delete_from_corrupt_storage() {
            let storage = MemoryStorage::default();
            *storage.contents.lock().unwrap() = Some("{not json".to_string());
            let store = TaskStore::new(storage.clone());

            let result = store.delete(TaskId::new(1)).await;

            assert!(matches!(result, Err(TaskStoreError::Load(_))));
            assert_eq!(
                storage.contents.lock().unwrap().as_deref(),
                Some("{not json")
            );
        }

        #[tokio::test]
        async fn keeps_last_written_state_when_write_fails() {
            let mut storage = MemoryStorage::with_tasks(&[task(1, "a")]);
            storage.refuse_writes = true;
            let store = TaskStore::new(storage.clone());

            let result = store.delete(TaskId::new(1)).await;

            assert!(matches!(result, Err(TaskStoreError::Storage(_))));
            assert_eq!(storage.stored_tasks(), vec![task(1, "a")]);
        }
    }

    #[tokio::test]
    async fn list_reflects_cumulative_mutations() {
        let store = TaskStore::new(MemoryStorage::default());

        let first = store
            .create(TaskDraft::new("first").with_id(TaskId::new(1)))
            .await
            .unwrap();
        let second = store
            .create(TaskDraft::new("second").with_id(TaskId::new(1)))
            .await
            .unwrap();
        let mut done = second.clone();
        done.completed = true;
        store.update(second.id, done.clone()).await.unwrap();
        store.delete(first.id).await.unwrap();

        assert_eq!(second.id, TaskId::new(2));
        assert_eq!(store.list().await, vec![done]);
    }

    #[tokio::test]
    async fn serializes_concurrent_creates() {
        let store = Arc::new(TaskStore::new(MemoryStorage::default()));

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create(TaskDraft::new(format!("task {}", n)).with_id(TaskId::new(1)))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut ids: Vec<i64> = store.list().await.iter().map(|t| t.id.value()).collect();
        ids.sort();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }
}

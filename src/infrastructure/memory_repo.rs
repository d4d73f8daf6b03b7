use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;

use super::StorageError;
use crate::domain::{
    repository::TodoRepository,
    todo::{Todo, TodoId},
};

#[derive(Default)]
struct Store {
    last_id: i64,
    items: BTreeMap<TodoId, Todo>,
}

/// Process-local repository. Ids are assigned from a counter and `find_all`
/// returns todos in id order.
#[derive(Clone, Default)]
pub struct InMemoryTodoRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, StorageError> {
        self.store.lock().map_err(|_| StorageError::Poisoned)
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn init(&self) -> Result<()> { Ok(()) }

    async fn find_all(&self) -> Result<Vec<Todo>> {
        Ok(self.lock()?.items.values().cloned().collect())
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>> {
        Ok(self.lock()?.items.get(&id).cloned())
    }

    async fn save(&self, mut todo: Todo) -> Result<Todo> {
        let mut store = self.lock()?;
        let id = match todo.id {
            Some(id) => id,
            None => TodoId(store.last_id.checked_add(1).ok_or(StorageError::IdsExhausted)?),
        };
        store.last_id = store.last_id.max(id.0);
        todo.id = Some(id);
        store.items.insert(id, todo.clone());
        Ok(todo)
    }

    async fn update(&self, id: TodoId, mut todo: Todo) -> Result<Option<Todo>> {
        let mut store = self.lock()?;
        let Some(slot) = store.items.get_mut(&id) else { return Ok(None) };
        todo.id = Some(id);
        *slot = todo.clone();
        Ok(Some(todo))
    }

    async fn delete_by_id(&self, id: TodoId) -> Result<()> {
        self.lock()?.items.remove(&id);
        Ok(())
    }
}

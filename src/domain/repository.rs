use async_trait::async_trait;
use super::todo::{Todo, TodoId};

#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    async fn find_all(&self) -> anyhow::Result<Vec<Todo>>;
    async fn find_by_id(&self, id: TodoId) -> anyhow::Result<Option<Todo>>;
    /// Inserts when `todo.id` is `None`, otherwise replaces the stored todo with that id.
    async fn save(&self, todo: Todo) -> anyhow::Result<Todo>;
    /// Overwrites the stored todo with `id`; `None` when no such todo exists, nothing is inserted.
    async fn update(&self, id: TodoId, todo: Todo) -> anyhow::Result<Option<Todo>>;
    /// Removing an id that does not exist is not an error.
    async fn delete_by_id(&self, id: TodoId) -> anyhow::Result<()>;
}

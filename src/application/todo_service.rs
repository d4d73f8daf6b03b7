use crate::application::dto::TodoDto;
use crate::application::mapper::TodoMapper;
use crate::domain::repository::TodoRepository;
use crate::domain::todo::{Completion, TodoId};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn find_all_todos(&self) -> Result<Vec<TodoDto>>;
    async fn find_complete_todos(&self) -> Result<Vec<TodoDto>>;
    /// Open todos plus those whose completion was never set.
    async fn find_incomplete_todos(&self) -> Result<Vec<TodoDto>>;
    async fn find_by_id(&self, id: TodoId) -> Result<Option<TodoDto>>;
    async fn create_new_todo(&self, input: TodoDto) -> Result<TodoDto>;
    /// Replaces title and completion of an existing todo; `None` if `id` is unknown.
    /// Moving into `Done` stamps `completed_at`, moving out of it clears it.
    async fn update_todo(&self, id: TodoId, input: TodoDto) -> Result<Option<TodoDto>>;
    async fn delete_by_id(&self, id: TodoId) -> Result<()>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }

    async fn find_where(&self, keep: impl Fn(Completion) -> bool + Send) -> Result<Vec<TodoDto>> {
        let todos = self.repo.find_all().await?;
        Ok(todos
            .into_iter()
            .filter(|t| keep(t.completed))
            .map(TodoMapper::to_dto)
            .collect())
    }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn find_all_todos(&self) -> Result<Vec<TodoDto>> {
        let todos = self.find_where(|_| true).await?;
        debug!(count = todos.len(), "found all todos");
        Ok(todos)
    }

    async fn find_complete_todos(&self) -> Result<Vec<TodoDto>> {
        let todos = self.find_where(|c| match c {
            Completion::Done => true,
            Completion::Open | Completion::Unset => false,
        }).await?;
        debug!(count = todos.len(), "found complete todos");
        Ok(todos)
    }

    async fn find_incomplete_todos(&self) -> Result<Vec<TodoDto>> {
        let todos = self.find_where(|c| match c {
            Completion::Done => false,
            Completion::Open | Completion::Unset => true,
        }).await?;
        debug!(count = todos.len(), "found incomplete todos");
        Ok(todos)
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Option<TodoDto>> {
        let found = self.repo.find_by_id(id).await?;
        debug!(id = id.0, found = found.is_some(), "find todo by id");
        Ok(found.map(TodoMapper::to_dto))
    }

    async fn create_new_todo(&self, input: TodoDto) -> Result<TodoDto> {
        let mut todo = TodoMapper::to_entity(input);
        // every call creates a distinct todo
        todo.id = None;
        todo.completed_at = match todo.completed {
            Completion::Done => todo.completed_at.or_else(|| Some(Utc::now())),
            Completion::Open | Completion::Unset => None,
        };
        let saved = self.repo.save(todo).await?;
        info!(id = ?saved.id, "created todo");
        Ok(TodoMapper::to_dto(saved))
    }

    async fn update_todo(&self, id: TodoId, input: TodoDto) -> Result<Option<TodoDto>> {
        let Some(previous) = self.repo.find_by_id(id).await? else {
            debug!(id = id.0, "update of unknown todo");
            return Ok(None);
        };
        let mut todo = TodoMapper::to_entity(input);
        todo.completed_at = todo.completion_time(&previous, Utc::now());
        // a todo deleted since the lookup stays deleted
        let Some(updated) = self.repo.update(id, todo).await? else {
            debug!(id = id.0, "todo vanished before update");
            return Ok(None);
        };
        info!(id = id.0, completed = ?updated.completed, "updated todo");
        Ok(Some(TodoMapper::to_dto(updated)))
    }

    async fn delete_by_id(&self, id: TodoId) -> Result<()> {
        self.repo.delete_by_id(id).await?;
        info!(id = id.0, "deleted todo");
        Ok(())
    }
}

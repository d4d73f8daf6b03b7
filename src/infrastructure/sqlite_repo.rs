use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::{SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};
use tracing::info;

use super::StorageError;
use crate::domain::{
    repository::TodoRepository,
    todo::{Completion, Todo, TodoId},
};

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoRepository {
    pub async fn connect(database_url: &str) -> Result<Self> {
        // each connection to `sqlite::memory:` opens its own database
        let max_connections = if database_url.starts_with("sqlite::memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool: Arc::new(pool) })
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                completed INTEGER,
                completed_at TEXT
            )",
        )
        .execute(&*self.pool)
        .await?;
        info!("todos table ready");
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Todo>> {
        let rows = sqlx::query("SELECT id, title, completed, completed_at FROM todos ORDER BY id")
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter().map(row_to_todo).collect()
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>> {
        let row = sqlx::query("SELECT id, title, completed, completed_at FROM todos WHERE id = ?1")
            .bind(id.0)
            .fetch_optional(&*self.pool)
            .await?;
        row.map(row_to_todo).transpose()
    }

    async fn save(&self, mut todo: Todo) -> Result<Todo> {
        let completed = todo.completed.as_flag();
        match todo.id {
            Some(id) => {
                sqlx::query(
                    "INSERT INTO todos (id, title, completed, completed_at) VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET title = excluded.title, completed = excluded.completed,
                         completed_at = excluded.completed_at",
                )
                .bind(id.0)
                .bind(&todo.title)
                .bind(completed)
                .bind(todo.completed_at)
                .execute(&*self.pool)
                .await?;
            }
            None => {
                let result = sqlx::query("INSERT INTO todos (title, completed, completed_at) VALUES (?1, ?2, ?3)")
                    .bind(&todo.title)
                    .bind(completed)
                    .bind(todo.completed_at)
                    .execute(&*self.pool)
                    .await?;
                todo.id = Some(TodoId(result.last_insert_rowid()));
            }
        }
        Ok(todo)
    }

    async fn update(&self, id: TodoId, mut todo: Todo) -> Result<Option<Todo>> {
        let result = sqlx::query("UPDATE todos SET title = ?2, completed = ?3, completed_at = ?4 WHERE id = ?1")
            .bind(id.0)
            .bind(&todo.title)
            .bind(todo.completed.as_flag())
            .bind(todo.completed_at)
            .execute(&*self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        todo.id = Some(id);
        Ok(Some(todo))
    }

    async fn delete_by_id(&self, id: TodoId) -> Result<()> {
        sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id.0)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_todo(row: SqliteRow) -> Result<Todo> {
    let id: i64 = row.try_get("id")?;
    let title: String = row.try_get("title")?;
    let completed: Option<i64> = row.try_get("completed")?;
    let completed_at: Option<DateTime<Utc>> = row.try_get("completed_at")?;

    let completed = match completed {
        None => Completion::Unset,
        Some(0) => Completion::Open,
        Some(1) => Completion::Done,
        Some(value) => return Err(StorageError::InvalidColumn { column: "completed", value }.into()),
    };

    Ok(Todo { id: Some(TodoId(id)), title, completed, completed_at })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> SqliteTodoRepository {
        let repo = SqliteTodoRepository::connect("sqlite::memory:").await.unwrap();
        repo.init().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn stores_all_completion_states() {
        let repo = repo().await;
        for completed in [Completion::Done, Completion::Open, Completion::Unset] {
            repo.save(Todo::new("t", completed)).await.unwrap();
        }
        let all = repo.find_all().await.unwrap();
        let states: Vec<_> = all.iter().map(|t| t.completed).collect();
        assert_eq!(states, vec![Completion::Done, Completion::Open, Completion::Unset]);
        assert_eq!(all[0].id, Some(TodoId(1)));
    }

    #[tokio::test]
    async fn save_with_id_upserts() {
        let repo = repo().await;
        let created = repo.save(Todo::new("before", Completion::Open)).await.unwrap();
        let id = created.id.unwrap();
        repo.save(Todo { id: Some(id), title: "after".into(), completed: Completion::Done, completed_at: None }).await.unwrap();

        let got = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(got.title, "after");
        assert_eq!(got.completed, Completion::Done);
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn completion_time_survives_storage() {
        let repo = repo().await;
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:30:00Z").unwrap().with_timezone(&Utc);
        let saved = repo.save(Todo { completed_at: Some(at), ..Todo::new("done", Completion::Done) }).await.unwrap();
        let got = repo.find_by_id(saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(got.completed_at, Some(at));

        repo.save(Todo::new("open", Completion::Open)).await.unwrap();
        assert_eq!(repo.find_all().await.unwrap()[1].completed_at, None);
    }

    #[tokio::test]
    async fn update_of_deleted_todo_does_not_recreate_it() {
        let repo = repo().await;
        let saved = repo.save(Todo::new("gone", Completion::Open)).await.unwrap();
        let id = saved.id.unwrap();
        repo.delete_by_id(id).await.unwrap();

        assert!(repo.update(id, Todo::new("back?", Completion::Done)).await.unwrap().is_none());
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_overwrites_existing_row() {
        let repo = repo().await;
        let id = repo.save(Todo::new("before", Completion::Unset)).await.unwrap().id.unwrap();
        let updated = repo.update(id, Todo::new("after", Completion::Open)).await.unwrap().unwrap();
        assert_eq!(updated.id, Some(id));
        assert_eq!(repo.find_by_id(id).await.unwrap().unwrap().completed, Completion::Open);
    }

    #[tokio::test]
    async fn delete_missing_is_noop() {
        let repo = repo().await;
        repo.save(Todo::new("keep", Completion::Unset)).await.unwrap();
        repo.delete_by_id(TodoId(999)).await.unwrap();
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_unknown_completed_value() {
        let repo = repo().await;
        sqlx::query("INSERT INTO todos (title, completed) VALUES ('bad', 7)")
            .execute(&*repo.pool)
            .await
            .unwrap();
        let err = repo.find_all().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<StorageError>(), Some(StorageError::InvalidColumn { value: 7, .. })));
    }
}

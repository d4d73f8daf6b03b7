use axum::{extract::{Path, State}, routing::get, Router, Json};
use axum::http::StatusCode;

use crate::{
    application::{dto::TodoDto, todo_service::TodoService},
    domain::todo::TodoId,
    http::types::ApiError,
};

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/todos", get(list_todos::<S>).post(create_todo::<S>))
        .route("/todos/complete", get(list_complete::<S>))
        .route("/todos/incomplete", get(list_incomplete::<S>))
        .route("/todos/:id", get(get_todo::<S>).put(update_todo::<S>).delete(delete_todo::<S>))
        .with_state(state)
}

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<Json<Vec<TodoDto>>, ApiError> {
    let todos = state.service.find_all_todos().await.map_err(ApiError::internal)?;
    Ok(Json(todos))
}

async fn list_complete<S: TodoService>(State(state): State<AppState<S>>) -> Result<Json<Vec<TodoDto>>, ApiError> {
    let todos = state.service.find_complete_todos().await.map_err(ApiError::internal)?;
    Ok(Json(todos))
}

async fn list_incomplete<S: TodoService>(State(state): State<AppState<S>>) -> Result<Json<Vec<TodoDto>>, ApiError> {
    let todos = state.service.find_incomplete_todos().await.map_err(ApiError::internal)?;
    Ok(Json(todos))
}

async fn get_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<TodoDto>, ApiError> {
    let id = parse_id(&id)?;
    match state.service.find_by_id(id).await.map_err(ApiError::internal)? {
        Some(t) => Ok(Json(t)),
        None => Err(ApiError::not_found()),
    }
}

async fn create_todo<S: TodoService>(State(state): State<AppState<S>>, Json(payload): Json<TodoDto>) -> Result<(StatusCode, Json<TodoDto>), ApiError> {
    let todo = state.service.create_new_todo(payload).await.map_err(ApiError::internal)?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>, Json(payload): Json<TodoDto>) -> Result<Json<TodoDto>, ApiError> {
    let id = parse_id(&id)?;
    match state.service.update_todo(id, payload).await.map_err(ApiError::internal)? {
        Some(t) => Ok(Json(t)),
        None => Err(ApiError::not_found()),
    }
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.service.delete_by_id(id).await.map_err(ApiError::internal)?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(s: &str) -> Result<TodoId, ApiError> {
    s.parse::<i64>().map(TodoId).map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "invalid id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    #[derive(Clone)]
    struct BrokenService;

    #[async_trait]
    impl TodoService for BrokenService {
        async fn find_all_todos(&self) -> Result<Vec<TodoDto>> { Err(anyhow!("database unavailable")) }
        async fn find_complete_todos(&self) -> Result<Vec<TodoDto>> { Err(anyhow!("database unavailable")) }
        async fn find_incomplete_todos(&self) -> Result<Vec<TodoDto>> { Err(anyhow!("database unavailable")) }
        async fn find_by_id(&self, _id: TodoId) -> Result<Option<TodoDto>> { Err(anyhow!("database unavailable")) }
        async fn create_new_todo(&self, _input: TodoDto) -> Result<TodoDto> { Err(anyhow!("disk full")) }
        async fn update_todo(&self, _id: TodoId, _input: TodoDto) -> Result<Option<TodoDto>> { Err(anyhow!("disk full")) }
        async fn delete_by_id(&self, _id: TodoId) -> Result<()> { Err(anyhow!("database unavailable")) }
    }

    async fn send(method: &str, uri: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
        let app = router(AppState { service: BrokenService });
        let req = Request::builder().method(method).uri(uri).header("content-type", "application/json");
        let res = app.oneshot(req.body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty)).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn service_failures_become_500_with_message() {
        for (method, uri) in [("GET", "/todos"), ("GET", "/todos/complete"), ("GET", "/todos/incomplete"), ("GET", "/todos/1"), ("DELETE", "/todos/1")] {
            let (status, body) = send(method, uri, None).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{} {}", method, uri);
            assert_eq!(body["message"], "database unavailable");
        }

        let (status, body) = send("POST", "/todos", Some(r#"{"title":"x"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "disk full");
    }

    #[tokio::test]
    async fn bad_id_is_rejected_before_the_service() {
        let (status, body) = send("PUT", "/todos/x1", Some(r#"{"title":"x"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "invalid id");
    }
}

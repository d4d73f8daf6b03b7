use crate::application::dto::TodoDto;
use crate::domain::todo::{Completion, Todo, TodoId};

pub struct TodoMapper;

impl TodoMapper {
    pub fn to_dto(todo: Todo) -> TodoDto {
        TodoDto {
            id: todo.id.map(|id| id.0),
            title: todo.title,
            completed: todo.completed.as_flag(),
            completed_at: todo.completed_at,
        }
    }

    pub fn to_entity(dto: TodoDto) -> Todo {
        Todo {
            id: dto.id.map(TodoId),
            title: dto.title,
            completed: Completion::from_flag(dto.completed),
            completed_at: dto.completed_at,
        }
    }
}

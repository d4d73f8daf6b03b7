pub mod dto;
pub mod mapper;
pub mod todo_service;

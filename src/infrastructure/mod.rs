pub mod memory_repo;
pub mod sqlite_repo;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("column `{column}` holds unexpected value {value}")]
    InvalidColumn { column: &'static str, value: i64 },
    #[error("no todo ids left to assign")]
    IdsExhausted,
    #[error("todo store lock poisoned")]
    Poisoned,
}

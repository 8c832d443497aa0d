// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate delivery id: {0}")]
    DuplicateDelivery(String),
    #[error("invalid stored value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, StorageError>;

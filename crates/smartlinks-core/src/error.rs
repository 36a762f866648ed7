use crate::types::ObjectId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SmartlinkError>;

#[derive(Debug, Error)]
pub enum SmartlinkError {
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Storage operation error: {0}")]
    StorageOperation(#[from] redb::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Rendering was attempted with nothing registered.
    #[error("No smartlink configuration is registered")]
    NoConfiguration,

    #[error("Incorrectly configured smartlink: {0}")]
    IncorrectlyConfigured(String),

    #[error("Shortcut '{shortcut}' is already defined in the smartlinks configuration")]
    AlreadyRegistered { shortcut: String },

    #[error("Duplicate index entry: value={value}, content_type={content_type}, object_id={object_id}")]
    DuplicateEntry {
        value: String,
        content_type: String,
        object_id: ObjectId,
    },

    #[error("Embed '{attribute}' failed: {reason}")]
    Embed { attribute: String, reason: String },

    #[error("Object source error: {0}")]
    Source(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

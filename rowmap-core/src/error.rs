use thiserror::Error as ThisError;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;

/// Failures raised by the mapping layer before anything reaches the backend.
///
/// They travel inside [`Error`], use `downcast_ref::<MappingError>()` to tell them apart
/// from backend failures.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum MappingError {
    #[error("Entity `{0}` is not registered")]
    UnregisteredEntity(String),

    #[error("Entity `{entity}` has no column `{column}`")]
    UnknownColumn { entity: String, column: String },

    #[error("Invalid column specification: {0}")]
    InvalidColumnSpec(String),
}

impl MappingError {
    pub fn unregistered(entity: impl Into<String>) -> Error {
        MappingError::UnregisteredEntity(entity.into()).into()
    }

    pub fn unknown_column(entity: impl Into<String>, column: impl Into<String>) -> Error {
        MappingError::UnknownColumn {
            entity: entity.into(),
            column: column.into(),
        }
        .into()
    }

    pub fn invalid_spec(message: impl Into<String>) -> Error {
        MappingError::InvalidColumnSpec(message.into()).into()
    }
}

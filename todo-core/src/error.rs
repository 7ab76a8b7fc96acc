use thiserror::Error;

pub type TodoResult<T> = Result<T, TodoError>;

#[derive(Error, Debug)]
pub enum TodoError {
    /// Rejected before any statement is issued. The message is shown to clients.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl TodoError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True for failures caused by the caller rather than the backing store.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::NotFound)
    }
}

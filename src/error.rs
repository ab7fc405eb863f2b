use thiserror::Error;

/// Crate-wide error taxonomy.
///
/// The data-access layer reports every underlying engine failure as
/// [`Error::DataAccess`] without distinguishing constraint violations from
/// connectivity problems. Absence of a row is not an error anywhere in this
/// crate; it is `None`, and callers decide whether absence is worth reporting.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Data access error: {0}")]
    DataAccess(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn data_access(message: impl std::fmt::Display) -> Self {
        Error::DataAccess(message.to_string())
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::DataAccess(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("database type error")]
pub struct DatabaseTypeError;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database pool error")]
    PoolError(#[from] deadpool_postgres::PoolError),

    #[error(transparent)]
    ClientError(#[from] tokio_postgres::Error),

    #[error(transparent)]
    TypeError(#[from] DatabaseTypeError),

    #[error("{0} not found")]
    NotFound(&'static str), // object type

    #[error("{0} already exists")]
    AlreadyExists(&'static str), // object type
}

impl DatabaseError {
    pub fn type_error() -> Self {
        Self::from(DatabaseTypeError)
    }
}

/// Maps a unique constraint violation to `DatabaseError::AlreadyExists`
pub fn catch_unique_violation(
    object_type: &'static str,
) -> impl Fn(tokio_postgres::Error) -> DatabaseError {
    move |error| {
        if let Some(code) = error.code() {
            if *code == tokio_postgres::error::SqlState::UNIQUE_VIOLATION {
                return DatabaseError::AlreadyExists(object_type);
            };
        };
        error.into()
    }
}

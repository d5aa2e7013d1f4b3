use diesel_async::pooled_connection::PoolError;
use postgres_models::DbError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        StoreError::Db(DbError::Query(err))
    }
}

impl From<bb8::RunError<PoolError>> for StoreError {
    fn from(err: bb8::RunError<PoolError>) -> Self {
        StoreError::Db(DbError::Pool(err))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Session data unavailable for season {0}")]
    Unavailable(i32),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Discord rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Still rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },
}

/// Failures that end a scheduler tick before dispatch.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

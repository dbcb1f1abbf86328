use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider responded with {status} {status_text}")]
    Provider {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Invalid provider base URL: {0}")]
    BaseUrl(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The only failure callers ever see from the domain layer.
    #[error("{0}")]
    BadRequest(String),
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest(message.into())
    }

    pub fn is_bad_request(&self) -> bool {
        matches!(self, Error::BadRequest(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Md2NotionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unterminated $$ math block starting at line {line}")]
    UnterminatedMath { line: usize },

    #[error("Authentication failed (401): {message}")]
    Auth { message: String },

    #[error("Page not found (404): {message}\nConnect the integration to the page: ••• menu → Connections")]
    NotFound { message: String },

    #[error("Rate limited by the Notion API (429): {message}")]
    RateLimited { message: String },

    #[error("Notion server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Notion API rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Output directory error: {reason}")]
    OutputDirectory { reason: String },
}

impl Md2NotionError {
    /// Retry predicate for the upload driver: rate limits, server errors,
    /// and connection-level failures are worth another attempt; everything
    /// else aborts the document.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Md2NotionError::RateLimited { .. }
                | Md2NotionError::Server { .. }
                | Md2NotionError::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Md2NotionError>;

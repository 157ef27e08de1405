//! Error types for svsieve

use thiserror::Error;

/// Result type alias for svsieve operations
pub type Result<T> = std::result::Result<T, SvsieveError>;

/// Error types that can occur in svsieve
///
/// Every failure is fatal: the first error encountered during a filtering
/// run aborts the whole operation. Buffered-but-unflushed records are
/// abandoned; records already written before the failure stay written.
#[derive(Debug, Error)]
pub enum SvsieveError {
    /// I/O error (open, read, write, or close of a transport)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// BGZF compression/decompression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// Decode worker-pool construction rejected by the runtime
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Invalid filter configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

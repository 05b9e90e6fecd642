use thiserror::Error;

#[derive(Error, Debug)]
pub enum FarexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown vendor: {0}")]
    UnknownVendor(String),

    #[error("Unresolved location: {0}")]
    UnresolvedLocation(String),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, FarexError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid timestamp: {value:?}")]
    InvalidTimestamp { value: String },
}

pub type Result<T> = std::result::Result<T, Error>;

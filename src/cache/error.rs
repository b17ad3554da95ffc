use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    /// The backend's lock was poisoned by a panicking writer.
    #[error("{backend} cache is unavailable: {message}")]
    Unavailable {
        backend: &'static str,
        message: String,
    },

    #[error("cached response could not be (de)serialized: {0}")]
    Codec(#[from] serde_json::Error),
}

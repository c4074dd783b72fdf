/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum CampusCardError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code with the server's message (or raw body).
    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },
    /// Failure signaled by the service through the `error` field of an
    /// otherwise successful response body.
    #[error("api error: {0}")]
    Api(String),
    /// Response body was not the JSON shape the caller asked for.
    #[error("decode error: {0}")]
    Decode(String),
    /// Map image did not finish loading within the session's bound.
    #[error("image load timed out after {timeout_ms} ms")]
    LoadTimeout { timeout_ms: u64 },
    /// Map image load failed (the surface reported an error event).
    #[error("image load failed: {0}")]
    ImageLoad(String),
}

impl CampusCardError {
    /// Short human-readable reason, used for the exhausted-retries
    /// notification shown to the user.
    pub fn reason(&self) -> String {
        match self {
            Self::Transport(err) => err.to_string(),
            Self::Http { message, .. } => message.clone(),
            Self::Api(message) => message.clone(),
            Self::Decode(message) => message.clone(),
            Self::LoadTimeout { timeout_ms } => {
                format!("image load timed out after {timeout_ms} ms")
            }
            Self::ImageLoad(message) => message.clone(),
        }
    }
}

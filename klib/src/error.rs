use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

/// What can go wrong while checking a single key pair, plus the two
/// startup-time failures (log file, tunnel) that kill the whole run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("key generation failed: {0}")]
    Crypto(String),

    #[error("balance request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("balance service answered {status}")]
    Remote { status: StatusCode },

    #[error("unusable balance payload: {0}")]
    Parse(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tunnel error: {0}")]
    Tunnel(String),
}

// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("app not found: {0}")]
    NotFound(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    /// True when the backend confirmed the id does not resolve.
    /// Only this kind of failure is ever cached.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_not_found_is_classified() {
        assert!(Error::NotFound("abc".into()).is_not_found());
        assert!(!Error::Transport("connection reset".into()).is_not_found());
        assert!(!Error::Unauthorized("token expired".into()).is_not_found());
        assert!(!Error::InvalidId("???".into()).is_not_found());
    }
}

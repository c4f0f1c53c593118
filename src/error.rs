pub type LumicubeResult<T> = Result<T, LumicubeError>;

#[derive(thiserror::Error, Debug)]
pub enum LumicubeError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("transient: {0}")]
    Transient(String),

    #[error("invalid state: {0}")]
    State(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LumicubeError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }
}

impl From<std::io::Error> for LumicubeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            LumicubeError::invalid_config("x")
                .to_string()
                .contains("invalid config:")
        );
        assert!(
            LumicubeError::not_found("x")
                .to_string()
                .contains("not found:")
        );
        assert!(LumicubeError::io("x").to_string().contains("io error:"));
        assert!(
            LumicubeError::transient("x")
                .to_string()
                .contains("transient:")
        );
        assert!(
            LumicubeError::state("x")
                .to_string()
                .contains("invalid state:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = LumicubeError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn io_error_converts() {
        let err: LumicubeError = std::io::Error::other("spi write failed").into();
        assert!(matches!(err, LumicubeError::Io(_)));
    }
}

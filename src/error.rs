use thiserror::Error;

/// Failures the engine can report.
///
/// Normalization and selection recover locally and only use these variants for diagnostics;
/// surface registration and configuration loading return them to the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed graph payload: {0}")]
    MalformedPayload(String),

    #[error("link {link} references unknown node {missing}")]
    DanglingLink { link: String, missing: String },

    #[error("visualization unavailable: {0}")]
    RenderSurfaceExhausted(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

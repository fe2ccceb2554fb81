use thiserror::Error;

/// Errors reported before or instead of rendering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Invalid camera configuration: {0}")]
    InvalidConfig(String),

    #[error("Camera must be initialized before rendering")]
    NotInitialized,
}

pub type RenderResult<T> = Result<T, RenderError>;

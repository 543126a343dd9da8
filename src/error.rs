/// Convenience result type used across trackplot.
pub type TrackplotResult<T> = Result<T, TrackplotError>;

/// Top-level error taxonomy used by the pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum TrackplotError {
    /// Invalid user-provided configuration or degenerate input data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while reading or deserializing the trajectory table.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Errors while building or rasterizing a frame scene.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrackplotError {
    /// Build a [`TrackplotError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TrackplotError::Dataset`] value.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    /// Build a [`TrackplotError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

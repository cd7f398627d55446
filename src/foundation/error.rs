/// Convenience result type used across stillmotion.
pub type StillmotionResult<T> = Result<T, StillmotionError>;

/// Generic text shown to end users for any failed render.
pub const USER_FAILURE_MESSAGE: &str = "Could not produce a video. Please try again.";

/// Top-level error taxonomy returned by the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum StillmotionError {
    /// Render configuration is out of range or inconsistent.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The source image could not be interpreted.
    #[error("image decode failure: {0}")]
    ImageDecode(String),

    /// The encoder could not be started for the requested output.
    #[error("encoder init failure: {0}")]
    EncoderInit(String),

    /// The encoder failed mid-stream or while finalizing.
    #[error("encoding failure: {0}")]
    Encoding(String),

    /// Rasterizing a frame failed.
    #[error("render failure: {0}")]
    Render(String),

    /// The render was cancelled between frames.
    #[error("render cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Fieldless classification of [`StillmotionError`], for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`StillmotionError::InvalidConfig`].
    InvalidConfig,
    /// See [`StillmotionError::ImageDecode`].
    ImageDecode,
    /// See [`StillmotionError::EncoderInit`].
    EncoderInit,
    /// See [`StillmotionError::Encoding`].
    Encoding,
    /// See [`StillmotionError::Render`].
    Render,
    /// See [`StillmotionError::Cancelled`].
    Cancelled,
    /// Not yet classified.
    Other,
}

impl StillmotionError {
    /// Build a [`StillmotionError::InvalidConfig`] value.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Build a [`StillmotionError::ImageDecode`] value.
    pub fn image_decode(msg: impl Into<String>) -> Self {
        Self::ImageDecode(msg.into())
    }

    /// Build a [`StillmotionError::EncoderInit`] value.
    pub fn encoder_init(msg: impl Into<String>) -> Self {
        Self::EncoderInit(msg.into())
    }

    /// Build a [`StillmotionError::Encoding`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Build a [`StillmotionError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::ImageDecode(_) => ErrorKind::ImageDecode,
            Self::EncoderInit(_) => ErrorKind::EncoderInit,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Render(_) => ErrorKind::Render,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Generic message for presentation layers. Encoder diagnostics stay in `Display`.
    pub fn user_message(&self) -> &'static str {
        USER_FAILURE_MESSAGE
    }

    /// Fold an unclassified [`StillmotionError::Other`] into `kind`; classified errors pass
    /// through untouched.
    pub(crate) fn classify(self, kind: ErrorKind) -> Self {
        let Self::Other(e) = self else {
            return self;
        };
        let msg = format!("{e:#}");
        match kind {
            ErrorKind::InvalidConfig => Self::InvalidConfig(msg),
            ErrorKind::ImageDecode => Self::ImageDecode(msg),
            ErrorKind::EncoderInit => Self::EncoderInit(msg),
            ErrorKind::Encoding => Self::Encoding(msg),
            ErrorKind::Render => Self::Render(msg),
            ErrorKind::Cancelled => Self::Cancelled,
            ErrorKind::Other => Self::Other(e),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

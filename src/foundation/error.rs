/// Convenience result type used across the crate.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors produced by an export run.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    /// The source reports a zero width or height.
    #[error("invalid source dimensions: {width}x{height}")]
    InvalidSourceDimensions {
        /// Reported source width.
        width: u32,
        /// Reported source height.
        height: u32,
    },

    /// The trim range covers no time, or is not finite.
    #[error("empty trim range: [{start_secs}, {end_secs})")]
    EmptyTrimRange {
        /// Trim start in seconds.
        start_secs: f64,
        /// Trim end in seconds.
        end_secs: f64,
    },

    /// A seek did not land in time, or the decoder failed while seeking.
    #[error("frame render timeout at {timestamp_secs:.3}s: {detail}")]
    FrameRenderTimeout {
        /// Requested source time.
        timestamp_secs: f64,
        /// Timeout or decoder message.
        detail: String,
    },

    /// The encoder rejected its configuration or could not start.
    #[error("encoder init failure: {0}")]
    EncoderInitFailure(String),

    /// Appending a frame or finalizing the payload failed.
    #[error("encoder write failure: {0}")]
    EncoderWriteFailure(String),

    /// The run was cancelled through its [`crate::CancelHandle`].
    #[error("export cancelled")]
    Cancelled,

    /// Option values or trim bounds that do not fit the source.
    #[error("invalid export config: {0}")]
    InvalidConfig(String),

    /// Probe or decode tooling failed outside a seek.
    #[error("media error: {0}")]
    Media(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Fieldless error classification, used by the session state machine and UI mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ExportErrorKind {
    /// See [`ExportError::InvalidSourceDimensions`].
    InvalidSourceDimensions,
    /// See [`ExportError::EmptyTrimRange`].
    EmptyTrimRange,
    /// See [`ExportError::FrameRenderTimeout`].
    FrameRenderTimeout,
    /// See [`ExportError::EncoderInitFailure`].
    EncoderInitFailure,
    /// See [`ExportError::EncoderWriteFailure`].
    EncoderWriteFailure,
    /// See [`ExportError::Cancelled`].
    Cancelled,
    /// See [`ExportError::InvalidConfig`].
    InvalidConfig,
    /// See [`ExportError::Media`].
    Media,
    /// See [`ExportError::Other`].
    Other,
}

impl ExportError {
    /// Build a [`ExportError::FrameRenderTimeout`] value.
    pub fn render_timeout(timestamp_secs: f64, detail: impl Into<String>) -> Self {
        Self::FrameRenderTimeout {
            timestamp_secs,
            detail: detail.into(),
        }
    }

    /// Build a [`ExportError::EncoderInitFailure`] value.
    pub fn encoder_init(msg: impl Into<String>) -> Self {
        Self::EncoderInitFailure(msg.into())
    }

    /// Build a [`ExportError::EncoderWriteFailure`] value.
    pub fn encoder_write(msg: impl Into<String>) -> Self {
        Self::EncoderWriteFailure(msg.into())
    }

    /// Build a [`ExportError::InvalidConfig`] value.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Build a [`ExportError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Fieldless classification of this error.
    pub fn kind(&self) -> ExportErrorKind {
        match self {
            Self::InvalidSourceDimensions { .. } => ExportErrorKind::InvalidSourceDimensions,
            Self::EmptyTrimRange { .. } => ExportErrorKind::EmptyTrimRange,
            Self::FrameRenderTimeout { .. } => ExportErrorKind::FrameRenderTimeout,
            Self::EncoderInitFailure(_) => ExportErrorKind::EncoderInitFailure,
            Self::EncoderWriteFailure(_) => ExportErrorKind::EncoderWriteFailure,
            Self::Cancelled => ExportErrorKind::Cancelled,
            Self::InvalidConfig(_) => ExportErrorKind::InvalidConfig,
            Self::Media(_) => ExportErrorKind::Media,
            Self::Other(_) => ExportErrorKind::Other,
        }
    }

    /// Cancellation is reported separately from failure so callers can skip error toasts.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// One end-user sentence per error kind. Diagnostics stay in `Display` and logs.
    pub fn user_message(&self) -> &'static str {
        self.kind().user_message()
    }
}

impl ExportErrorKind {
    /// Short sentence suitable for an end-user toast.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::InvalidSourceDimensions => "The video has no usable picture size.",
            Self::EmptyTrimRange => "The selected range is empty. Adjust the trim handles.",
            Self::FrameRenderTimeout => "The video stopped responding while frames were captured.",
            Self::EncoderInitFailure => "The exporter could not be started.",
            Self::EncoderWriteFailure => "Writing the exported file failed.",
            Self::Cancelled => "Export cancelled.",
            Self::InvalidConfig => "The export settings are not valid for this video.",
            Self::Media => "The video could not be read.",
            Self::Other => "Export failed.",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

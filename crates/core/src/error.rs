use crate::StereoMode;

/// Result alias that carries the custom [`StereoError`] type.
pub type Result<T> = std::result::Result<T, StereoError>;

/// Common error type for the core crate.
///
/// The coordinator itself never surfaces these; they escape only from the
/// parsing helpers and from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum StereoError {
    /// A string or ordinal that does not name any stereo mode.
    #[error("unrecognised stereo mode `{0}`")]
    InvalidMode(String),
    /// A valid mode the active render backend cannot display.
    #[error("stereo mode `{0}` is not supported by the display")]
    UnsupportedMode(StereoMode),
    /// An ordinal that does not name a playback policy.
    #[error("unrecognised stereoscopic playback policy {0}")]
    InvalidPolicy(i32),
    /// Malformed configuration input.
    #[error("configuration error: {0}")]
    Config(String),
    /// Free-form message, mostly surfaced by the console binary.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl StereoError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for StereoError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for StereoError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<toml::de::Error> for StereoError {
    fn from(value: toml::de::Error) -> Self {
        Self::Config(value.to_string())
    }
}

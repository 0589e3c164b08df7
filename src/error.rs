use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Result type alias for plugin operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The `share` arguments were not a string-keyed map of optional strings.
    /// Carries a debug rendering of what was actually received.
    #[error("Arguments is not a dictionary [String: String]")]
    InvalidArguments(String),

    /// The reserved probe URL constant failed to parse. The constant is
    /// well-formed, so seeing this at runtime is a defect in the plugin
    /// itself, not a recoverable condition.
    #[error("Failed to build probe URL: {0}")]
    ProbeConstruction(String),

    /// The `whatsapp://send` deep link failed to build during share
    /// resolution. As with the probe, a defect rather than a runtime
    /// condition: the base is constant and the query is fully
    /// percent-encoded.
    #[error("Failed to build deep link: {0}")]
    DeepLinkConstruction(String),

    /// Mobile plugin invocation error.
    #[cfg(mobile)]
    #[error("Plugin invoke error: {0}")]
    PluginInvoke(String),
}

impl Error {
    /// Stable error code surfaced across the invoke boundary.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidArguments(_) | Error::DeepLinkConstruction(_) => "ERROR_SHARE",
            Error::ProbeConstruction(_) => "ERROR_INSTALLED",
            #[cfg(mobile)]
            Error::PluginInvoke(_) => "ERROR_PLUGIN",
        }
    }

    fn details(&self) -> Option<&str> {
        match self {
            Error::InvalidArguments(received) => Some(received),
            _ => None,
        }
    }
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("Error", 3)?;
        s.serialize_field("code", self.code())?;
        s.serialize_field("message", &self.to_string())?;
        s.serialize_field("details", &self.details())?;
        s.end()
    }
}

#[cfg(mobile)]
impl From<tauri::plugin::mobile::PluginInvokeError> for Error {
    fn from(err: tauri::plugin::mobile::PluginInvokeError) -> Self {
        Error::PluginInvoke(err.to_string())
    }
}

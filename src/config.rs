use std::num::IntErrorKind;
use std::path::PathBuf;

/// Port used when the preference value cannot be parsed.
pub const DEFAULT_PORT: u16 = 3000;

/// Settings captured when a preview server starts.
///
/// The session snapshots this value on the Stopped -> Running transition, so
/// preference edits made while the server runs only apply to the next fresh
/// start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// TCP port the preview server binds on localhost.
    pub port: u16,

    /// Directory holding the web bundle candidates (`web/`,
    /// `web_vite/dist/`).
    pub bundle_root: PathBuf,
}

impl ServerConfig {
    pub fn new(port: u16, bundle_root: impl Into<PathBuf>) -> Self {
        Self {
            port,
            bundle_root: bundle_root.into(),
        }
    }

    /// Builds a config from the raw preference string, sanitizing the port.
    pub fn from_preferences(port: &str, bundle_root: impl Into<PathBuf>) -> Self {
        Self::new(sanitize_port(port), bundle_root)
    }
}

/// Turns a raw port preference into a usable port number.
///
/// Non-numeric input falls back to [`DEFAULT_PORT`]; numeric input is
/// clamped into `1..=65535`, no matter how many digits it has.
pub fn sanitize_port(value: &str) -> u16 {
    match value.trim().parse::<i64>() {
        Ok(port) => port.clamp(1, 65535) as u16,
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => 65535,
            IntErrorKind::NegOverflow => 1,
            _ => DEFAULT_PORT,
        },
    }
}

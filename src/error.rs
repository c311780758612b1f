use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by preview and export operations.
///
/// Each variant names the step that failed; cleanup problems (removing
/// temporary directories) are never reported through this type, they are
/// logged and swallowed.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Neither web bundle candidate directory exists with content.
    #[error(
        "web bundle not found in expected locations: {} and {} (run 'npm run build' inside the web_vite directory to regenerate assets)",
        preferred.display(),
        fallback.display()
    )]
    BundleNotFound {
        preferred: PathBuf,
        fallback: PathBuf,
    },

    /// The preview server could not bind its TCP port.
    #[error("failed to bind preview server on port {port}: {source}")]
    PortBind { port: u16, source: io::Error },

    /// The scene exporter failed, after the minimal-options retry.
    #[error("scene export failed: {0}")]
    AssetExport(#[from] ExportError),

    /// A copy, create, write or rename step failed.
    #[error("{context}: {source}")]
    Filesystem { context: String, source: io::Error },

    /// Writing the export archive failed.
    #[error("failed to write export archive {}: {source}", path.display())]
    Archive { path: PathBuf, source: io::Error },
}

impl PreviewError {
    pub(crate) fn filesystem(context: impl Into<String>, source: io::Error) -> Self {
        PreviewError::Filesystem {
            context: context.into(),
            source,
        }
    }
}

/// Failures reported by a scene asset exporter.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The exporter does not understand the requested option set. Callers
    /// retry once with the minimal set before giving up.
    #[error("exporter rejected the requested options: {reason}")]
    UnsupportedOptions { reason: String },

    /// The exporter could not write the asset file.
    #[error("unable to write scene asset {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// Any other exporter failure.
    #[error("{reason}")]
    Failed { reason: String },
}

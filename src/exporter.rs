use std::path::Path;

use log::info;

use crate::error::ExportError;
use crate::scene::SceneSnapshot;

/// Which parts of the scene an export should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub include_selection: bool,
    pub include_animations: bool,
    pub include_cameras: bool,
    pub include_lights: bool,
}

impl ExportOptions {
    /// Everything the viewer can use: animations, cameras and lights.
    pub const fn full() -> Self {
        Self {
            include_selection: false,
            include_animations: true,
            include_cameras: true,
            include_lights: true,
        }
    }

    /// Reduced option set for exporters that reject the full one.
    pub const fn minimal() -> Self {
        Self {
            include_selection: false,
            include_animations: false,
            include_cameras: true,
            include_lights: true,
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::full()
    }
}

/// Writes a scene to a binary asset file the web viewer can load.
pub trait AssetExporter: Send + Sync {
    fn export(
        &self,
        scene: &SceneSnapshot,
        destination: &Path,
        options: &ExportOptions,
    ) -> Result<(), ExportError>;
}

/// Runs the exporter, falling back to [`ExportOptions::minimal`] when the
/// requested options are rejected. Any other failure is returned as-is.
pub fn export_with_fallback(
    exporter: &dyn AssetExporter,
    scene: &SceneSnapshot,
    destination: &Path,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    match exporter.export(scene, destination, options) {
        Err(ExportError::UnsupportedOptions { reason }) => {
            info!("retrying scene export with minimal options: {reason}");
            exporter.export(scene, destination, &ExportOptions::minimal())
        }
        other => other,
    }
}

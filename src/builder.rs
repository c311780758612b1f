use std::path::Path;
use std::sync::Arc;

use crate::bundle::{copy_bundle, BundleLocator};
use crate::error::PreviewError;
use crate::exporter::{export_with_fallback, AssetExporter, ExportOptions};
use crate::manifest::PreviewManifest;
use crate::scene::SceneSnapshot;

/// File name of the exported scene asset inside a preview directory.
pub const SCENE_ASSET_FILE: &str = "scene.glb";

/// Assembles a self-contained preview directory: viewer bundle, exported
/// scene asset and the manifest the viewer reads on load.
#[derive(Clone)]
pub struct PreviewBuilder {
    bundle: BundleLocator,
    exporter: Arc<dyn AssetExporter>,
}

impl PreviewBuilder {
    pub fn new(bundle: BundleLocator, exporter: Arc<dyn AssetExporter>) -> Self {
        Self { bundle, exporter }
    }

    /// Fills `target` with everything the web viewer needs for `scene`.
    ///
    /// Safe to call repeatedly on the same directory: bundle files are
    /// overwritten and the asset and manifest are regenerated.
    pub fn populate(
        &self,
        target: &Path,
        scene: &SceneSnapshot,
    ) -> Result<PreviewManifest, PreviewError> {
        let bundle_dir = self.bundle.resolve()?;
        copy_bundle(&bundle_dir, target)?;

        export_with_fallback(
            self.exporter.as_ref(),
            scene,
            &target.join(SCENE_ASSET_FILE),
            &ExportOptions::full(),
        )?;

        let manifest = PreviewManifest::from_scene(scene);
        manifest.write_to(target)?;
        Ok(manifest)
    }
}

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PreviewError;
use crate::scene::SceneSnapshot;

/// File name the viewer fetches for scene metadata.
pub const MANIFEST_FILE: &str = "scene_info.json";

/// Metadata sidecar consumed by the web viewer alongside the scene asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewManifest {
    pub title: String,
    pub objects: usize,
    pub has_animations: bool,
}

impl PreviewManifest {
    /// Summarizes a scene snapshot.
    pub fn from_scene(scene: &SceneSnapshot) -> Self {
        Self {
            title: scene.title(),
            objects: scene.objects.len(),
            has_animations: scene.has_animations(),
        }
    }

    /// Writes the manifest into `dir` by writing a temp file and renaming
    /// it, so a concurrent viewer fetch never sees a partial manifest.
    pub fn write_to(&self, dir: &Path) -> Result<(), PreviewError> {
        let bytes = serde_json::to_vec(self)
            .map_err(io::Error::from)
            .map_err(|source| {
                PreviewError::filesystem(format!("unable to encode {MANIFEST_FILE}"), source)
            })?;

        let staged = dir.join(format!("{MANIFEST_FILE}.tmp"));
        let target = dir.join(MANIFEST_FILE);
        fs::write(&staged, &bytes).map_err(|source| {
            PreviewError::filesystem(format!("unable to write {}", staged.display()), source)
        })?;
        fs::rename(&staged, &target).map_err(|source| {
            PreviewError::filesystem(format!("unable to move manifest to {}", target.display()), source)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneObjectInfo;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sample_scene() -> SceneSnapshot {
        SceneSnapshot {
            source: Some(PathBuf::from("/projects/robot.blend")),
            objects: vec![
                SceneObjectInfo::new("Body", "mesh"),
                SceneObjectInfo {
                    animated: true,
                    ..SceneObjectInfo::new("Arm", "mesh")
                },
            ],
        }
    }

    #[test]
    fn from_scene_summarizes_objects() {
        let manifest = PreviewManifest::from_scene(&sample_scene());
        assert_eq!(manifest.title, "robot.blend");
        assert_eq!(manifest.objects, 2);
        assert!(manifest.has_animations);
    }

    #[test]
    fn write_to_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let manifest = PreviewManifest::from_scene(&sample_scene());
        manifest.write_to(dir.path()).unwrap();

        let written = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let parsed: PreviewManifest = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, manifest);
        assert!(!dir.path().join(format!("{MANIFEST_FILE}.tmp")).exists());
    }

    #[test]
    fn write_to_missing_dir_is_filesystem_error() {
        let dir = TempDir::new().unwrap();
        let manifest = PreviewManifest::from_scene(&sample_scene());
        let missing = dir.path().join("nope");
        let err = manifest.write_to(&missing).unwrap_err();
        assert!(matches!(err, PreviewError::Filesystem { .. }));
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Manifest title used for scenes that were never saved.
pub const UNTITLED_SCENE: &str = "Untitled Scene";

/// Snapshot of the host editor's scene state at preview or export time.
///
/// The editor hands one of these to every populate and export call; the
/// CLI reads it from a JSON scene description instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SceneSnapshot {
    /// Path of the saved scene file, if any. Feeds the manifest title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub objects: Vec<SceneObjectInfo>,
}

/// One object as reported by the host editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObjectInfo {
    pub name: String,
    #[serde(rename = "type", default = "default_object_type")]
    pub object_type: String,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub selected: bool,
}

impl SceneObjectInfo {
    pub fn new(name: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_type: object_type.into(),
            animated: false,
            selected: false,
        }
    }
}

fn default_object_type() -> String {
    "mesh".to_string()
}

impl SceneSnapshot {
    /// Reads a snapshot from a JSON scene description.
    ///
    /// The file path becomes the snapshot source when the description does
    /// not carry one, so the manifest title matches the file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read scene description {}", path.display()))?;
        let mut snapshot: SceneSnapshot = serde_json::from_str(&text)
            .with_context(|| format!("invalid scene description {}", path.display()))?;
        if snapshot.source.is_none() {
            snapshot.source = Some(path.to_path_buf());
        }
        Ok(snapshot)
    }

    /// Title shown by the viewer: the scene file name, or the untitled
    /// fallback.
    pub fn title(&self) -> String {
        self.source
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNTITLED_SCENE.to_string())
    }

    /// True when any object carries animation data.
    pub fn has_animations(&self) -> bool {
        self.objects.iter().any(|object| object.animated)
    }
}

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::ExportError;
use crate::exporter::{AssetExporter, ExportOptions};
use crate::scene::{SceneObjectInfo, SceneSnapshot};

/// "glTF" in little-endian container order.
pub const GLB_MAGIC: u32 = 0x4654_6C67;
pub const GLB_VERSION: u32 = 2;
/// "JSON" chunk tag.
pub const CHUNK_JSON: u32 = 0x4E4F_534A;

/// Minimal glTF-binary exporter used when no richer backend is wired in.
///
/// The container carries a single JSON chunk naming the scene objects. Mesh
/// geometry stays with the host application's own exporter.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlbExporter;

impl AssetExporter for GlbExporter {
    fn export(
        &self,
        scene: &SceneSnapshot,
        destination: &Path,
        options: &ExportOptions,
    ) -> Result<(), ExportError> {
        let document = build_document(scene, options);
        let json = serde_json::to_vec(&document).map_err(|err| ExportError::Failed {
            reason: format!("unable to encode scene document: {err}"),
        })?;
        fs::write(destination, encode_container(&json)).map_err(|source| ExportError::Io {
            path: destination.to_path_buf(),
            source,
        })
    }
}

#[derive(Serialize)]
struct GltfDocument {
    asset: GltfAsset,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    nodes: Vec<GltfNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    scenes: Vec<GltfScene>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scene: Option<usize>,
}

#[derive(Serialize)]
struct GltfAsset {
    version: &'static str,
    generator: &'static str,
}

#[derive(Serialize)]
struct GltfNode {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    extras: Option<GltfNodeExtras>,
}

#[derive(Serialize)]
struct GltfNodeExtras {
    animated: bool,
}

#[derive(Serialize)]
struct GltfScene {
    nodes: Vec<usize>,
}

fn build_document(scene: &SceneSnapshot, options: &ExportOptions) -> GltfDocument {
    let nodes: Vec<GltfNode> = scene
        .objects
        .iter()
        .filter(|object| includes_object(object, options))
        .map(|object| GltfNode {
            name: object.name.clone(),
            extras: (options.include_animations && object.animated)
                .then_some(GltfNodeExtras { animated: true }),
        })
        .collect();
    let scenes = if nodes.is_empty() {
        Vec::new()
    } else {
        vec![GltfScene {
            nodes: (0..nodes.len()).collect(),
        }]
    };
    let scene_index = if nodes.is_empty() { None } else { Some(0) };
    GltfDocument {
        asset: GltfAsset {
            version: "2.0",
            generator: "blendxweb",
        },
        nodes,
        scenes,
        scene: scene_index,
    }
}

fn includes_object(object: &SceneObjectInfo, options: &ExportOptions) -> bool {
    if options.include_selection && !object.selected {
        return false;
    }
    match object.object_type.as_str() {
        "camera" => options.include_cameras,
        "light" => options.include_lights,
        _ => true,
    }
}

/// Wraps a JSON document in a glTF-binary container with a single chunk.
/// The chunk payload is space-padded to the required 4-byte alignment.
fn encode_container(json: &[u8]) -> Vec<u8> {
    let mut payload = json.to_vec();
    while payload.len() % 4 != 0 {
        payload.push(b' ');
    }
    let total = 12 + 8 + payload.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&payload);
    out
}

//! Core modules for the blendXweb preview pipeline.
//!
//! The crate exposes high level building blocks that can be composed to
//! preview a scene in the browser or pack it for deployment: a localhost
//! static file server, a preview directory builder and a zip packager.
//! Editor integration and UI are intentionally kept outside of the crate so
//! that the code remains testable and easy to embed in headless tools.

pub mod builder;
pub mod bundle;
pub mod config;
pub mod error;
pub mod exporter;
pub mod glb;
pub mod manifest;
pub mod package;
pub mod scene;
pub mod server;
pub mod session;

pub use builder::{PreviewBuilder, SCENE_ASSET_FILE};
pub use bundle::BundleLocator;
pub use config::{sanitize_port, ServerConfig, DEFAULT_PORT};
pub use error::{ExportError, PreviewError};
pub use exporter::{export_with_fallback, AssetExporter, ExportOptions};
pub use glb::GlbExporter;
pub use manifest::{PreviewManifest, MANIFEST_FILE};
pub use package::export_package;
pub use scene::{SceneObjectInfo, SceneSnapshot};
pub use server::StaticFileServer;
pub use session::{PreviewSession, SessionTransition};

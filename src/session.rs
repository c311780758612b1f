use std::path::Path;

use log::warn;
use tempfile::TempDir;

use crate::builder::PreviewBuilder;
use crate::config::ServerConfig;
use crate::error::PreviewError;
use crate::scene::SceneSnapshot;
use crate::server::StaticFileServer;

/// What [`PreviewSession::ensure_running`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTransition {
    /// A server was started and the first preview generated.
    Started,
    /// The already running server's files were regenerated in place.
    Refreshed,
}

/// Drives the preview lifecycle: one server and one generated directory,
/// either both present or neither.
pub struct PreviewSession {
    builder: PreviewBuilder,
    config: ServerConfig,
    active: Option<ActivePreview>,
}

struct ActivePreview {
    server: StaticFileServer,
    serving_dir: TempDir,
}

impl PreviewSession {
    pub fn new(config: ServerConfig, builder: PreviewBuilder) -> Self {
        Self {
            builder,
            config,
            active: None,
        }
    }

    /// Starts the preview, or regenerates its files when already running.
    ///
    /// A failure on first start tears the server down again; a failed
    /// refresh leaves the server running with the previous files.
    pub fn ensure_running(
        &mut self,
        scene: &SceneSnapshot,
    ) -> Result<SessionTransition, PreviewError> {
        if let Some(active) = &self.active {
            self.builder.populate(active.serving_dir.path(), scene)?;
            return Ok(SessionTransition::Refreshed);
        }

        let serving_dir = TempDir::new().map_err(|source| {
            PreviewError::filesystem("unable to create preview directory", source)
        })?;
        let mut server = StaticFileServer::start(self.config.port, serving_dir.path())?;
        if let Err(err) = self.builder.populate(serving_dir.path(), scene) {
            server.stop();
            close_serving_dir(serving_dir);
            return Err(err);
        }

        self.active = Some(ActivePreview {
            server,
            serving_dir,
        });
        Ok(SessionTransition::Started)
    }

    /// Stops the server and removes the generated directory. Does nothing
    /// when already stopped.
    pub fn stop(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        active.server.stop();
        close_serving_dir(active.serving_dir);
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Address of the running preview, if any.
    pub fn url(&self) -> Option<String> {
        self.active.as_ref().map(|active| active.server.url())
    }

    pub fn port(&self) -> Option<u16> {
        self.active.as_ref().map(|active| active.server.port())
    }

    /// Directory currently being served, if any.
    pub fn serving_dir(&self) -> Option<&Path> {
        self.active.as_ref().map(|active| active.serving_dir.path())
    }
}

impl Drop for PreviewSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn close_serving_dir(dir: TempDir) {
    if let Err(err) = dir.close() {
        warn!("Could not remove temp directory: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::BundleLocator;
    use crate::error::ExportError;
    use crate::exporter::{AssetExporter, ExportOptions};
    use crate::glb::GlbExporter;
    use crate::manifest::{PreviewManifest, MANIFEST_FILE};
    use crate::scene::SceneObjectInfo;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct ToggleExporter {
        inner: GlbExporter,
        fail: Arc<AtomicBool>,
    }

    impl AssetExporter for ToggleExporter {
        fn export(
            &self,
            scene: &SceneSnapshot,
            destination: &Path,
            options: &ExportOptions,
        ) -> Result<(), ExportError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ExportError::Failed {
                    reason: "backend offline".to_string(),
                });
            }
            self.inner.export(scene, destination, options)
        }
    }

    fn bundle_root() -> TempDir {
        let root = TempDir::new().unwrap();
        let web = root.path().join("web");
        fs::create_dir_all(&web).unwrap();
        fs::write(web.join("index.html"), "<html>viewer</html>").unwrap();
        root
    }

    fn scene_of(count: usize) -> SceneSnapshot {
        SceneSnapshot {
            source: None,
            objects: (0..count)
                .map(|index| SceneObjectInfo::new(format!("Object.{index:03}"), "mesh"))
                .collect(),
        }
    }

    fn session_for(root: &TempDir) -> PreviewSession {
        let builder = PreviewBuilder::new(BundleLocator::new(root.path()), Arc::new(GlbExporter));
        PreviewSession::new(ServerConfig::new(0, root.path()), builder)
    }

    fn read_manifest(dir: &Path) -> PreviewManifest {
        serde_json::from_str(&fs::read_to_string(dir.join(MANIFEST_FILE)).unwrap()).unwrap()
    }

    #[test]
    fn starts_then_refreshes_on_the_same_server() {
        let root = bundle_root();
        let mut session = session_for(&root);

        assert_eq!(
            session.ensure_running(&scene_of(1)).unwrap(),
            SessionTransition::Started
        );
        assert!(session.is_running());
        let port = session.port().unwrap();
        assert_eq!(session.url().unwrap(), format!("http://localhost:{port}"));

        let serving_dir = session.serving_dir().unwrap().to_path_buf();
        assert!(serving_dir.join("index.html").is_file());
        assert!(serving_dir.join("scene.glb").is_file());
        assert_eq!(read_manifest(&serving_dir).objects, 1);

        assert_eq!(
            session.ensure_running(&scene_of(3)).unwrap(),
            SessionTransition::Refreshed
        );
        assert_eq!(session.port().unwrap(), port);
        assert_eq!(session.serving_dir().unwrap(), serving_dir);
        assert_eq!(read_manifest(&serving_dir).objects, 3);
    }

    #[test]
    fn stop_removes_the_serving_directory() {
        let root = bundle_root();
        let mut session = session_for(&root);
        session.ensure_running(&scene_of(1)).unwrap();
        let serving_dir: PathBuf = session.serving_dir().unwrap().to_path_buf();

        session.stop();

        assert!(!session.is_running());
        assert!(session.url().is_none());
        assert!(!serving_dir.exists());
    }

    #[test]
    fn stop_when_stopped_is_a_noop() {
        let root = bundle_root();
        let mut session = session_for(&root);
        session.stop();
        session.stop();
        assert!(!session.is_running());
    }

    #[test]
    fn failed_first_start_reverts_to_stopped() {
        let empty_root = TempDir::new().unwrap();
        let mut session = session_for(&empty_root);

        let err = session.ensure_running(&scene_of(1)).unwrap_err();

        assert!(matches!(err, PreviewError::BundleNotFound { .. }));
        assert!(!session.is_running());
        assert!(session.url().is_none());
    }

    #[test]
    fn failed_refresh_keeps_the_preview_running() {
        let root = bundle_root();
        let fail = Arc::new(AtomicBool::new(false));
        let exporter = ToggleExporter {
            inner: GlbExporter,
            fail: Arc::clone(&fail),
        };
        let builder = PreviewBuilder::new(BundleLocator::new(root.path()), Arc::new(exporter));
        let mut session = PreviewSession::new(ServerConfig::new(0, root.path()), builder);

        session.ensure_running(&scene_of(2)).unwrap();
        let serving_dir = session.serving_dir().unwrap().to_path_buf();

        fail.store(true, Ordering::SeqCst);
        let err = session.ensure_running(&scene_of(5)).unwrap_err();

        assert!(matches!(err, PreviewError::AssetExport(_)));
        assert!(session.is_running());
        assert!(serving_dir.join("scene.glb").is_file());
        assert_eq!(read_manifest(&serving_dir).objects, 2);
    }
}

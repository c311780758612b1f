use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::PreviewError;

/// Preferred pre-deployed bundle directory under the bundle root.
pub const WEB_BUILD_DIR: &str = "web";

/// Legacy Vite build output, kept as a fallback.
pub const VITE_DIST_DIR: &str = "web_vite/dist";

/// Locates the built web viewer bundle under a configured root.
#[derive(Debug, Clone)]
pub struct BundleLocator {
    root: PathBuf,
}

impl BundleLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Candidate directories in preference order.
    pub fn candidates(&self) -> [PathBuf; 2] {
        [self.root.join(WEB_BUILD_DIR), self.root.join(VITE_DIST_DIR)]
    }

    /// First candidate that exists and contains at least one entry.
    pub fn resolve(&self) -> Result<PathBuf, PreviewError> {
        let [preferred, fallback] = self.candidates();
        for candidate in [&preferred, &fallback] {
            if dir_has_entries(candidate) {
                return Ok(candidate.clone());
            }
        }
        Err(PreviewError::BundleNotFound {
            preferred,
            fallback,
        })
    }
}

fn dir_has_entries(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Copies the bundle tree into `target`, merging over whatever is already
/// there: files are overwritten, unrelated entries stay untouched.
pub fn copy_bundle(source: &Path, target: &Path) -> Result<(), PreviewError> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|err| {
            PreviewError::filesystem(
                format!("unable to walk bundle {}", source.display()),
                io::Error::from(err),
            )
        })?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .expect("walkdir yields paths under the walk root");
        let dest = if rel.as_os_str().is_empty() {
            target.to_path_buf()
        } else {
            target.join(rel)
        };
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(|source| {
                PreviewError::filesystem(format!("unable to create {}", dest.display()), source)
            })?;
        } else {
            fs::copy(entry.path(), &dest).map_err(|source| {
                PreviewError::filesystem(
                    format!("unable to copy {} to {}", entry.path().display(), dest.display()),
                    source,
                )
            })?;
        }
    }
    Ok(())
}

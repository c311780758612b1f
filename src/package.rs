use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::builder::PreviewBuilder;
use crate::error::PreviewError;
use crate::scene::SceneSnapshot;

/// Builds a complete preview in a temporary staging directory and packs it
/// into `<destination>.zip`, returning the archive path.
///
/// The staging directory is removed afterwards; a failed removal is logged
/// and never fails the export.
pub fn export_package(
    builder: &PreviewBuilder,
    destination: &Path,
    scene: &SceneSnapshot,
) -> Result<PathBuf, PreviewError> {
    let staging = TempDir::new()
        .map_err(|source| PreviewError::filesystem("unable to create staging directory", source))?;
    builder.populate(staging.path(), scene)?;

    let archive_path = zip_destination(destination);
    write_archive(staging.path(), &archive_path)?;

    if let Err(err) = staging.close() {
        warn!("Could not remove temporary directory after export: {err}");
    }
    info!("Scene exported to {}", archive_path.display());
    Ok(archive_path)
}

fn zip_destination(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(".zip");
    PathBuf::from(name)
}

fn write_archive(staging: &Path, archive_path: &Path) -> Result<(), PreviewError> {
    let file = File::create(archive_path).map_err(|source| PreviewError::Archive {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(staging) {
        let entry = entry.map_err(|err| archive_error(archive_path, io::Error::from(err)))?;
        let rel = entry
            .path()
            .strip_prefix(staging)
            .expect("walkdir yields paths under the walk root");
        if rel.as_os_str().is_empty() {
            continue;
        }
        let name = rel.to_string_lossy().replace('\\', "/");

        if entry.file_type().is_dir() {
            writer
                .add_directory(name, options)
                .map_err(|err| archive_error(archive_path, io::Error::from(err)))?;
        } else {
            writer
                .start_file(name, options)
                .map_err(|err| archive_error(archive_path, io::Error::from(err)))?;
            let mut source =
                File::open(entry.path()).map_err(|err| archive_error(archive_path, err))?;
            io::copy(&mut source, &mut writer)
                .map_err(|err| archive_error(archive_path, err))?;
        }
    }

    writer
        .finish()
        .map_err(|err| archive_error(archive_path, io::Error::from(err)))?;
    Ok(())
}

fn archive_error(path: &Path, source: io::Error) -> PreviewError {
    PreviewError::Archive {
        path: path.to_path_buf(),
        source,
    }
}

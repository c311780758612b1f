use assert_cmd::prelude::*;
use predicates::str::contains;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use zip::ZipArchive;

fn write_fixture(dir: &Path) {
    let web = dir.join("web");
    fs::create_dir_all(web.join("assets")).expect("bundle dirs");
    fs::write(web.join("index.html"), "<html>viewer</html>").expect("index");
    fs::write(web.join("assets/app.js"), "console.log('app');").expect("app");

    let scene = r#"{
  "objects": [
    {"name": "Cube", "type": "mesh"},
    {"name": "Camera", "type": "camera"},
    {"name": "Key", "type": "light"},
    {"name": "Floor", "type": "mesh"},
    {"name": "Ball", "type": "mesh"}
  ]
}
"#;
    fs::write(dir.join("scene.json"), scene).expect("scene");
}

#[test]
fn cli_exports_scene_package() {
    let dir = TempDir::new().expect("temp dir");
    write_fixture(dir.path());
    let destination = dir.path().join("out/house_web");
    fs::create_dir_all(dir.path().join("out")).expect("out dir");

    let mut cmd = Command::cargo_bin("blendxweb").expect("binary exists");
    cmd.arg("export")
        .arg(dir.path().join("scene.json"))
        .arg(&destination)
        .arg("--bundle")
        .arg(dir.path());
    cmd.assert()
        .success()
        .stdout(contains("Scene exported to"))
        .stdout(contains("house_web.zip"));

    let archive_path = dir.path().join("out/house_web.zip");
    let mut archive = ZipArchive::new(File::open(&archive_path).expect("archive file"))
        .expect("readable archive");

    let mut manifest_json = String::new();
    archive
        .by_name("scene_info.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest_json)
        .expect("manifest text");
    assert!(manifest_json.contains("\"objects\":5"));
    assert!(manifest_json.contains("\"has_animations\":false"));
    assert!(manifest_json.contains("\"title\":\"scene.json\""));

    assert!(archive.by_name("scene.glb").is_ok());
    assert!(archive.by_name("index.html").is_ok());
    assert!(archive.by_name("assets/app.js").is_ok());
}

#[test]
fn cli_export_defaults_destination_next_to_scene() {
    let dir = TempDir::new().expect("temp dir");
    write_fixture(dir.path());

    let mut cmd = Command::cargo_bin("blendxweb").expect("binary exists");
    cmd.arg("export")
        .arg(dir.path().join("scene.json"))
        .arg("--bundle")
        .arg(dir.path());
    cmd.assert().success().stdout(contains("scene_web.zip"));

    assert!(dir.path().join("scene_web.zip").is_file());
}

#[test]
fn cli_without_arguments_prints_usage() {
    let mut cmd = Command::cargo_bin("blendxweb").expect("binary exists");
    cmd.assert().failure().stderr(contains("Usage"));
}

#[test]
fn cli_export_reports_missing_bundle() {
    let dir = TempDir::new().expect("temp dir");
    write_fixture(dir.path());
    let empty = TempDir::new().expect("empty bundle root");

    let mut cmd = Command::cargo_bin("blendxweb").expect("binary exists");
    cmd.arg("export")
        .arg(dir.path().join("scene.json"))
        .arg(dir.path().join("scene_web"))
        .arg("--bundle")
        .arg(empty.path());
    cmd.assert()
        .failure()
        .stderr(contains("web bundle not found"));
}

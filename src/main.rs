use std::env;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::warn;

use blendxweb::{
    export_package, sanitize_port, BundleLocator, GlbExporter, PreviewBuilder, PreviewSession,
    SceneSnapshot, ServerConfig, SessionTransition, DEFAULT_PORT,
};

const USAGE: &str = "Usage: blendxweb preview <scene.json> [--port <number>] [--bundle <dir>] [--no-open]\n       blendxweb export <scene.json> [destination] [--bundle <dir>]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    match CliOptions::parse()?.command {
        Command::Preview {
            scene,
            port,
            bundle_root,
            open_browser,
        } => run_preview(&scene, port, &bundle_root, open_browser),
        Command::Export {
            scene,
            destination,
            bundle_root,
        } => run_export(&scene, destination, &bundle_root),
    }
}

fn run_preview(scene_path: &Path, port: u16, bundle_root: &Path, open_browser: bool) -> Result<()> {
    let scene = SceneSnapshot::load(scene_path)?;
    let config = ServerConfig::new(port, bundle_root);
    let builder = PreviewBuilder::new(
        BundleLocator::new(&config.bundle_root),
        Arc::new(GlbExporter),
    );
    let mut session = PreviewSession::new(config, builder);

    let transition = session.ensure_running(&scene)?;
    let url = session.url().context("preview session reported no URL")?;
    println!("Preview running at {url}");
    if open_browser && transition == SessionTransition::Started {
        if let Err(err) = open::that(&url) {
            warn!("Could not open browser: {err}");
        }
    }

    println!("Press 'r' + Enter to refresh, 'q' + Enter to quit.");
    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read input")?;
        match line.trim() {
            "q" => break,
            "r" => match refresh(&mut session, scene_path) {
                Ok(()) => {
                    println!("Preview files updated. Refresh the browser tab to view changes.");
                }
                Err(err) => eprintln!("Refresh failed: {err:?}"),
            },
            "" => {}
            other => println!("Unknown command: {other}. Use 'r' to refresh or 'q' to quit."),
        }
    }

    session.stop();
    println!("Preview stopped.");
    Ok(())
}

fn refresh(session: &mut PreviewSession, scene_path: &Path) -> Result<()> {
    let scene = SceneSnapshot::load(scene_path)?;
    session.ensure_running(&scene)?;
    Ok(())
}

fn run_export(scene_path: &Path, destination: Option<PathBuf>, bundle_root: &Path) -> Result<()> {
    let scene = SceneSnapshot::load(scene_path)?;
    let destination = destination.unwrap_or_else(|| default_export_destination(scene_path));
    let builder = PreviewBuilder::new(BundleLocator::new(bundle_root), Arc::new(GlbExporter));
    let archive_path = export_package(&builder, &destination, &scene)?;
    println!("Scene exported to {}", archive_path.display());
    Ok(())
}

/// `<scene stem>_web` next to the scene file.
fn default_export_destination(scene_path: &Path) -> PathBuf {
    let stem = scene_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string());
    let name = format!("{stem}_web");
    match scene_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}

struct CliOptions {
    command: Command,
}

enum Command {
    Preview {
        scene: PathBuf,
        port: u16,
        bundle_root: PathBuf,
        open_browser: bool,
    },
    Export {
        scene: PathBuf,
        destination: Option<PathBuf>,
        bundle_root: PathBuf,
    },
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(command) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        match command.as_str() {
            "preview" => Self::parse_preview(args),
            "export" => Self::parse_export(args),
            other => Err(anyhow!("Unknown command: {other}\n{USAGE}")),
        }
    }

    fn parse_preview(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut scene = None;
        let mut port = DEFAULT_PORT;
        let mut bundle_root = PathBuf::from(".");
        let mut open_browser = true;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--port" => {
                    let value = args.next().ok_or_else(|| anyhow!("--port needs a value"))?;
                    port = sanitize_port(&value);
                }
                "--bundle" => {
                    let value = args.next().ok_or_else(|| anyhow!("--bundle needs a value"))?;
                    bundle_root = PathBuf::from(value);
                }
                "--no-open" => open_browser = false,
                other if other.starts_with('-') => {
                    return Err(anyhow!("Unknown argument: {other}\n{USAGE}"));
                }
                other if scene.is_none() => scene = Some(PathBuf::from(other)),
                other => return Err(anyhow!("Unexpected argument: {other}\n{USAGE}")),
            }
        }
        let scene = scene.ok_or_else(|| anyhow!(USAGE))?;
        Ok(Self {
            command: Command::Preview {
                scene,
                port,
                bundle_root,
                open_browser,
            },
        })
    }

    fn parse_export(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut scene = None;
        let mut destination = None;
        let mut bundle_root = PathBuf::from(".");
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bundle" => {
                    let value = args.next().ok_or_else(|| anyhow!("--bundle needs a value"))?;
                    bundle_root = PathBuf::from(value);
                }
                other if other.starts_with('-') => {
                    return Err(anyhow!("Unknown argument: {other}\n{USAGE}"));
                }
                other if scene.is_none() => scene = Some(PathBuf::from(other)),
                other if destination.is_none() => destination = Some(PathBuf::from(other)),
                other => return Err(anyhow!("Unexpected argument: {other}\n{USAGE}")),
            }
        }
        let scene = scene.ok_or_else(|| anyhow!(USAGE))?;
        Ok(Self {
            command: Command::Export {
                scene,
                destination,
                bundle_root,
            },
        })
    }
}

use std::fs::File;
use std::io;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use mime_guess::MimeGuess;
use tiny_http::{Header, Method, Request, Response, ResponseBox, Server};

use crate::error::PreviewError;

const INDEX_FILE: &str = "index.html";

/// Serves a preview directory over HTTP on localhost.
///
/// Requests are accepted on a dispatcher thread and answered on short-lived
/// per-request threads, so one slow download never blocks the next request.
pub struct StaticFileServer {
    server: Option<Arc<Server>>,
    port: u16,
    running: Arc<AtomicBool>,
    dispatcher: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for StaticFileServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticFileServer")
            .field("port", &self.port)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl StaticFileServer {
    /// Binds `127.0.0.1:port` and starts serving `root`. Port 0 asks the
    /// system for a free port; [`StaticFileServer::port`] reports the one
    /// actually bound.
    pub fn start(port: u16, root: impl Into<PathBuf>) -> Result<Self, PreviewError> {
        let root = root.into();
        let listener = TcpListener::bind(("127.0.0.1", port))
            .map_err(|source| PreviewError::PortBind { port, source })?;
        let bound_port = listener
            .local_addr()
            .map_err(|source| PreviewError::PortBind { port, source })?
            .port();
        let server = Server::from_listener(listener, None).map_err(|err| PreviewError::PortBind {
            port,
            source: io::Error::new(io::ErrorKind::Other, err),
        })?;

        let server = Arc::new(server);
        let running = Arc::new(AtomicBool::new(true));
        let dispatcher = {
            let server = Arc::clone(&server);
            let running = Arc::clone(&running);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    if !running.load(Ordering::Acquire) {
                        break;
                    }
                    let root = root.clone();
                    thread::spawn(move || handle_request(request, &root));
                }
            })
        };

        info!("Server started on port {bound_port}");
        Ok(Self {
            server: Some(server),
            port: bound_port,
            running,
            dispatcher: Some(dispatcher),
        })
    }

    /// Port the server is actually listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Address a browser should open.
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Stops accepting connections and waits for the dispatcher to exit.
    /// Calling this on an already stopped server does nothing.
    pub fn stop(&mut self) {
        let Some(server) = self.server.take() else {
            return;
        };
        self.running.store(false, Ordering::Release);
        server.unblock();
        if let Some(dispatcher) = self.dispatcher.take() {
            if dispatcher.join().is_err() {
                warn!("Server dispatcher thread panicked");
            }
        }
        // Last reference to the listener, dropping it closes the socket.
        drop(server);
        info!("Server stopped");
    }
}

impl Drop for StaticFileServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_request(request: Request, root: &Path) {
    let method = request.method().clone();
    let target = request.url().to_string();
    let status = respond(request, root);
    info!("HTTP: {} {} -> {}", method.as_str(), target, status);
}

fn respond(request: Request, root: &Path) -> u16 {
    let (status, response) = build_response(&request, root);
    if let Err(err) = request.respond(response) {
        warn!("Failed to send response: {err}");
    }
    status
}

fn build_response(request: &Request, root: &Path) -> (u16, ResponseBox) {
    if !matches!(request.method(), Method::Get | Method::Head) {
        return (405, text_response(405, "Method Not Allowed"));
    }

    let resolved = match safe_join(root, request.url()) {
        Ok(path) => path,
        Err(_) => return (403, text_response(403, "Forbidden")),
    };
    if resolved.is_dir() {
        return redirect_to_slashed(request.url());
    }
    if !resolved.is_file() {
        return (404, text_response(404, "Not Found"));
    }
    if !is_contained(root, &resolved) {
        return (403, text_response(403, "Forbidden"));
    }

    let mime = MimeGuess::from_path(&resolved).first_or_octet_stream();
    match File::open(&resolved) {
        Ok(file) => (
            200,
            with_preview_headers(Response::from_file(file).boxed(), Some(mime.essence_str())),
        ),
        Err(err) => {
            warn!("Failed to open {}: {err}", resolved.display());
            (500, text_response(500, "Failed to read file"))
        }
    }
}

fn text_response(status: u16, message: &str) -> ResponseBox {
    with_preview_headers(
        Response::from_string(message).with_status_code(status).boxed(),
        None,
    )
}

/// Sends a directory target without a trailing slash to its slashed form,
/// which then resolves to the directory's index file.
fn redirect_to_slashed(target: &str) -> (u16, ResponseBox) {
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };
    let location = match query {
        Some(query) => format!("{path}/?{query}"),
        None => format!("{path}/"),
    };
    let response = with_preview_headers(Response::empty(301).boxed(), None)
        .with_header(header("Location", &location));
    (301, response)
}

/// Adds the headers every preview response carries: permissive CORS so the
/// viewer can fetch assets from other local origins, and no caching so a
/// refresh always picks up regenerated files.
fn with_preview_headers(response: ResponseBox, content_type: Option<&str>) -> ResponseBox {
    let mut response = response;
    if let Some(content_type) = content_type {
        response = response.with_header(header("Content-Type", content_type));
    }
    response
        .with_header(header("Access-Control-Allow-Origin", "*"))
        .with_header(header("Access-Control-Allow-Methods", "GET"))
        .with_header(header("Cache-Control", "no-store, no-cache, must-revalidate"))
}

fn header(field: &str, value: &str) -> Header {
    Header::from_bytes(field.as_bytes(), value.as_bytes())
        .expect("static header values are valid")
}

/// Maps a request target onto a file under `root`.
///
/// Strips the query string, resolves empty and directory targets to
/// `index.html` and percent-decodes each segment. Any segment that decodes
/// to `..` or a path separator is rejected.
fn safe_join(root: &Path, target: &str) -> Result<PathBuf> {
    let path = target.split('?').next().unwrap_or(target);
    let trimmed = path.trim_start_matches('/');
    let relative = if trimmed.is_empty() || trimmed.ends_with('/') {
        format!("{trimmed}{INDEX_FILE}")
    } else {
        trimmed.to_string()
    };

    let mut resolved = root.to_path_buf();
    for segment in relative.split('/') {
        if segment.is_empty() {
            continue;
        }
        let decoded = percent_decode(segment)?;
        if decoded == ".." || decoded.contains('/') || decoded.contains('\\') {
            return Err(anyhow!("path segment escapes the preview root"));
        }
        resolved.push(decoded);
    }
    Ok(resolved)
}

fn percent_decode(segment: &str) -> Result<String> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).copied().and_then(hex_value);
            let lo = bytes.get(i + 2).copied().and_then(hex_value);
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    out.push(hi * 16 + lo);
                    i += 3;
                }
                _ => return Err(anyhow!("invalid percent escape in segment {segment}")),
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).context("request path is not valid UTF-8")
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn is_contained(root: &Path, resolved: &Path) -> bool {
    match (root.canonicalize(), resolved.canonicalize()) {
        (Ok(root), Ok(resolved)) => resolved.starts_with(&root),
        _ => false,
    }
}

use std::env;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use formats::{EMPTY_TILE, VECTOR_TILE_CONTENT_TYPE, parse_tile_path};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const INDEX_FILE: &str = "index.html";

#[derive(Clone)]
struct AppState {
    root: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let root = env::var("GLACIER_ROOT").unwrap_or_else(|_| ".".to_string());
    let addr = env::var("GLACIER_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
    let addr: SocketAddr = match addr.parse() {
        Ok(addr) => addr,
        Err(err) => {
            error!("invalid GLACIER_ADDR {addr:?}: {err}");
            return;
        }
    };

    let state = AppState {
        root: PathBuf::from(root),
    };
    let app = app(state.clone());

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(err) => {
            error!("bind {addr} failed: {err}");
            return;
        }
    };
    info!("serving {} on http://{addr}", state.root.display());
    if let Err(err) = axum::serve(listener, app).await {
        error!("server stopped: {err}");
    }
}

fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(healthz))
        .fallback(serve_static)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn serve_static(State(state): State<AppState>, uri: Uri) -> Response {
    serve_path(&state.root, uri.path()).await
}

/// Serves `request_path` from under `root`.
///
/// Missing vector tiles are answered with an empty tile so the map treats
/// them as "no features here" instead of an error.
async fn serve_path(root: &Path, request_path: &str) -> Response {
    let Some(relative) = sanitize(request_path) else {
        warn!("rejected path {request_path:?}");
        return (StatusCode::BAD_REQUEST, "bad path").into_response();
    };
    let path = root.join(&relative);

    match tokio::fs::read(&path).await {
        Ok(data) => with_content_type(StatusCode::OK, content_type(&path), Body::from(data)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            if parse_tile_path(request_path).is_some() {
                debug!("empty tile for {request_path}");
                return with_content_type(StatusCode::OK, VECTOR_TILE_CONTENT_TYPE, Body::from(EMPTY_TILE));
            }
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
        Err(err) => {
            error!("file read failed: {path:?} -> {err}");
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
    }
}

/// Maps a URL path to a relative file path, or `None` if it would leave the root.
fn sanitize(request_path: &str) -> Option<PathBuf> {
    if request_path.contains('\\') || request_path.contains('\0') {
        return None;
    }
    let trimmed = request_path.trim_start_matches('/');
    let mut out = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if trimmed.is_empty() || trimmed.ends_with('/') {
        out.push(INDEX_FILE);
    }
    Some(out)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js" | "mjs") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("geojson") => "application/geo+json",
        Some("pbf" | "mvt") => VECTOR_TILE_CONTENT_TYPE,
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn with_content_type(status: StatusCode, content_type: &str, body: Body) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    (status, headers, body).into_response()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::{sanitize, serve_path};
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::Response;

    async fn body(resp: Response) -> Vec<u8> {
        to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    fn content_type(resp: &Response) -> &str {
        resp.headers()[http::header::CONTENT_TYPE].to_str().unwrap()
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/1850.geojson"), "{}").unwrap();
        fs::create_dir_all(dir.path().join("tiles/glaciers_1850/6/33")).unwrap();
        fs::write(dir.path().join("tiles/glaciers_1850/6/33/22.pbf"), [0x1a, 0x02]).unwrap();
        dir
    }

    #[tokio::test]
    async fn root_serves_the_index_page() {
        let dir = site();
        let resp = serve_path(dir.path(), "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(content_type(&resp), "text/html; charset=utf-8");
        assert_eq!(body(resp).await, b"<html></html>");
    }

    #[tokio::test]
    async fn files_are_served_as_is() {
        let dir = site();
        let resp = serve_path(dir.path(), "/data/1850.geojson").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(content_type(&resp), "application/geo+json");

        let resp = serve_path(dir.path(), "/tiles/glaciers_1850/6/33/22.pbf").await;
        assert_eq!(content_type(&resp), "application/x-protobuf");
        assert_eq!(body(resp).await, vec![0x1a, 0x02]);
    }

    #[tokio::test]
    async fn missing_tiles_are_empty_not_errors() {
        let dir = site();
        let resp = serve_path(dir.path(), "/tiles/glaciers_1850/6/34/22.pbf").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(content_type(&resp), "application/x-protobuf");
        assert!(body(resp).await.is_empty());

        let resp = serve_path(dir.path(), "/tiles/glaciers_1931/7/1/1.mvt").await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn other_missing_files_are_404() {
        let dir = site();
        let resp = serve_path(dir.path(), "/data/2016.geojson").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = serve_path(dir.path(), "/tiles/glaciers_1850/6/33/22.png").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = site();
        let resp = serve_path(dir.path(), "/../etc/passwd").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = serve_path(dir.path(), "/data/..\\..\\secret").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn sanitize_keeps_paths_under_the_root() {
        assert_eq!(sanitize("/a/./b.json").as_deref(), Some(Path::new("a/b.json")));
        assert_eq!(sanitize("/docs/").as_deref(), Some(Path::new("docs/index.html")));
        assert_eq!(sanitize("//etc/passwd").as_deref(), Some(Path::new("etc/passwd")));
        assert_eq!(sanitize("/a/../../b"), None);
    }
}

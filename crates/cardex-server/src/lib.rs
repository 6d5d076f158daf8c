//! HTTP server for Cardex.
//!
//! Mounts the [`cardex_api`] router under `/api`, serves images stored by
//! the [`DiskUploader`] under `/images/{file}`, and wraps everything in a
//! request trace layer.

pub mod error;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{
  Router,
  extract::{Path as UrlPath, State},
  http::header,
  response::{IntoResponse, Response},
  routing::get,
};
use cardex_core::{CardRepository, store::BlobStore};
use cardex_extract::{
  AnyUploader, DiskUploader, Extractor, HttpUploader, Uploader, VisionConfig,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CARDEX_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// Where the disk uploader writes card photographs.
  #[serde(default = "default_image_dir")]
  pub image_dir:       PathBuf,
  /// Externally visible base URL of `/images`. Derived from `host` and
  /// `port` when unset, which a remote vision model usually cannot reach:
  /// set this (or `upload_endpoint`) for scanning to work.
  #[serde(default)]
  pub public_base_url: Option<String>,
  /// Remote upload service. When set, images are forwarded there instead of
  /// being written to `image_dir`.
  #[serde(default)]
  pub upload_endpoint: Option<String>,
  pub extractor:       VisionConfig,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/cardex/cards.db") }
fn default_image_dir() -> PathBuf { PathBuf::from("~/.local/share/cardex/images") }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Base URL under which uploaded images are reachable.
  pub fn image_base_url(&self) -> String {
    match &self.public_base_url {
      Some(url) => url.trim_end_matches('/').to_string(),
      None => format!("http://{}/images", self.address()),
    }
  }

  /// Whether uploaded images would be published under the bind address
  /// because neither `public_base_url` nor `upload_endpoint` is set.
  pub fn images_use_bind_address(&self) -> bool {
    self.public_base_url.is_none() && self.upload_endpoint.is_none()
  }

  /// Build the uploader selected by this configuration.
  pub fn uploader(&self) -> cardex_extract::Result<AnyUploader> {
    Ok(match &self.upload_endpoint {
      Some(endpoint) => AnyUploader::Http(HttpUploader::new(endpoint.clone())?),
      None => AnyUploader::Disk(DiskUploader::new(
        expand_tilde(&self.image_dir),
        self.image_base_url(),
      )),
    })
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server [`Router`].
pub fn router<B, E, U>(
  repo: Arc<CardRepository<B>>,
  extractor: Arc<E>,
  uploader: Arc<U>,
  image_dir: PathBuf,
) -> Router
where
  B: BlobStore + 'static,
  E: Extractor + 'static,
  U: Uploader + 'static,
{
  let images = Router::new()
    .route("/images/{file}", get(image_handler))
    .with_state(Arc::new(image_dir));

  Router::new()
    .nest("/api", cardex_api::api_router(repo, extractor, uploader))
    .merge(images)
    .layer(TraceLayer::new_for_http())
}

// ─── Images ───────────────────────────────────────────────────────────────────

/// Only plain file names as produced by the disk uploader are served.
fn is_safe_file_name(name: &str) -> bool {
  !name.is_empty()
    && !name.starts_with('.')
    && name
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn content_type(name: &str) -> &'static str {
  let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
  match ext.as_deref() {
    Some("jpg" | "jpeg") => "image/jpeg",
    Some("png") => "image/png",
    Some("webp") => "image/webp",
    _ => "application/octet-stream",
  }
}

async fn image_handler(
  State(dir): State<Arc<PathBuf>>,
  UrlPath(file): UrlPath<String>,
) -> Result<Response, Error> {
  if !is_safe_file_name(&file) {
    return Err(Error::BadRequest(format!("invalid image name {file:?}")));
  }
  let bytes = tokio::fs::read(dir.join(&file)).await?;
  Ok(([(header::CONTENT_TYPE, content_type(&file))], bytes).into_response())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use cardex_extract::VisionExtractor;
  use cardex_store_sqlite::SqliteBlobStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  const CONFIG: &str = r#"
    host = "0.0.0.0"
    port = 9000
    store_path = "/var/lib/cardex/cards.db"
    image_dir = "/var/lib/cardex/images"

    [extractor]
    endpoint = "https://vision.example.com/v1/chat/completions"
    model = "gpt-4o"
  "#;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  async fn app(image_dir: &Path) -> Router {
    let cfg = parse(CONFIG);
    let store = SqliteBlobStore::open_in_memory().await.unwrap();
    let repo = Arc::new(CardRepository::new(store));
    let extractor = Arc::new(VisionExtractor::new(cfg.extractor).unwrap());
    let uploader = Arc::new(DiskUploader::new(
      image_dir,
      "http://localhost:9000/images",
    ));
    router(repo, extractor, uploader, image_dir.to_path_buf())
  }

  async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
  }

  async fn body_bytes(resp: Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap()
      .to_vec()
  }

  // ── Configuration ───────────────────────────────────────────────────────────

  #[test]
  fn config_reads_toml_with_defaults() {
    let cfg = parse(CONFIG);
    assert_eq!(cfg.address(), "0.0.0.0:9000");
    assert_eq!(cfg.extractor.model, "gpt-4o");
    assert_eq!(cfg.extractor.timeout_secs, 60);
    assert!(cfg.extractor.api_key.is_empty());
    assert_eq!(cfg.image_base_url(), "http://0.0.0.0:9000/images");
    assert!(cfg.images_use_bind_address());
    assert!(matches!(cfg.uploader().unwrap(), AnyUploader::Disk(_)));

    let minimal = parse(
      r#"
      [extractor]
      endpoint = "http://localhost:1234/v1/chat/completions"
      model = "m"
      "#,
    );
    assert_eq!(minimal.port, 8080);
    assert_eq!(minimal.host, "127.0.0.1");
  }

  #[test]
  fn upload_endpoint_selects_http_uploader() {
    let mut cfg = parse(CONFIG);
    cfg.upload_endpoint = Some("https://upload.example.com/upload".into());
    cfg.public_base_url = Some("https://cards.example.com/images/".into());
    assert_eq!(cfg.image_base_url(), "https://cards.example.com/images");
    assert!(!cfg.images_use_bind_address());

    cfg.public_base_url = None;
    assert!(!cfg.images_use_bind_address());
    assert!(matches!(cfg.uploader().unwrap(), AnyUploader::Http(_)));
  }

  #[test]
  fn expand_tilde_leaves_absolute_paths() {
    let p = PathBuf::from("/tmp/cards.db");
    assert_eq!(expand_tilde(&p), p);
  }

  #[test]
  fn file_names_are_checked() {
    assert!(is_safe_file_name("card-0123abcd.jpg"));
    assert!(!is_safe_file_name(".."));
    assert!(!is_safe_file_name(".hidden"));
    assert!(!is_safe_file_name("a/b.jpg"));
    assert!(!is_safe_file_name("a\\b.jpg"));
    assert!(!is_safe_file_name(""));
    assert_eq!(content_type("x.JPG"), "image/jpeg");
    assert_eq!(content_type("x"), "application/octet-stream");
  }

  // ── Routes ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let req = Request::builder()
      .method("POST")
      .uri("/api/cards")
      .header("content-type", "application/json")
      .body(Body::from(json!({ "fullName": "Alice" }).to_string()))
      .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::CREATED);

    let req = Request::builder().uri("/api/cards").body(Body::empty()).unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let list: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(list[0]["fullName"], "Alice");

    let req = Request::builder().uri("/cards").body(Body::empty()).unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn uploaded_image_is_served_back() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let jpeg = b"\xff\xd8\xff\xe0fake jpeg".to_vec();

    let req = Request::builder()
      .method("POST")
      .uri("/api/upload")
      .header("content-type", "application/json")
      .body(Body::from(
        json!({ "base64Image": B64.encode(&jpeg) }).to_string(),
      ))
      .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    let url = body["imageUrl"].as_str().unwrap();
    let path = url.strip_prefix("http://localhost:9000").unwrap();
    assert!(path.starts_with("/images/card-"));

    let req = Request::builder().uri(path).body(Body::empty()).unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(body_bytes(resp).await, jpeg);
  }

  #[tokio::test]
  async fn missing_or_unsafe_images_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let req = Request::builder()
      .uri("/images/card-missing.jpg")
      .body(Body::empty())
      .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = Request::builder()
      .uri("/images/.secret")
      .body(Body::empty())
      .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::BAD_REQUEST);
  }
}

//! cardex-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `CARDEX_*` environment variables, opens the SQLite-backed card store, and
//! serves the JSON API over HTTP.
//!
//! Nested keys use a double underscore, e.g. `CARDEX_EXTRACTOR__API_KEY`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use cardex_core::CardRepository;
use cardex_extract::VisionExtractor;
use cardex_server::{ServerConfig, expand_tilde};
use cardex_store_sqlite::SqliteBlobStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Cardex business card server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("CARDEX")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open the SQLite blob store.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteBlobStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let repo = Arc::new(CardRepository::new(store));

  // Collaborators.
  let extractor = VisionExtractor::new(server_cfg.extractor.clone())
    .context("failed to build vision extractor")?;
  let uploader = server_cfg
    .uploader()
    .context("failed to build image uploader")?;

  if server_cfg.images_use_bind_address() {
    tracing::warn!(
      images = %server_cfg.image_base_url(),
      "neither public_base_url nor upload_endpoint is set; a remote vision \
       model may not be able to fetch uploaded images"
    );
  }

  let image_dir = expand_tilde(&server_cfg.image_dir);
  let app = cardex_server::router(
    repo,
    Arc::new(extractor),
    Arc::new(uploader),
    image_dir,
  );

  let address = server_cfg.address();
  tracing::info!(
    store = %store_path.display(),
    images = %server_cfg.image_base_url(),
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

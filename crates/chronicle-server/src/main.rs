//! chronicle-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, spawns the transition-job worker, and serves the
//! JSON API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chronicle_core::clock::SystemClock;
use chronicle_engine::{
  dedup::{DEFAULT_DEDUP_WINDOW_SECS, DedupGuard},
  directory::Directory,
  notify::LogNotifier,
  primary::PrimaryContactHandler,
  queue::{JobQueue, run_worker},
  recorder::ActivityRecorder,
};
use chronicle_store_sqlite::SqliteStore;
use clap::Parser;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Runtime server configuration, deserialised from `config.toml` with
/// `CHRONICLE_*` environment overrides.
#[derive(Deserialize, Clone)]
struct ServerConfig {
  host:       String,
  port:       u16,
  store_path: PathBuf,

  /// Trailing window for audit-write deduplication, one global knob.
  #[serde(default = "default_dedup_window_secs")]
  dedup_window_secs: i64,
}

fn default_dedup_window_secs() -> i64 { DEFAULT_DEDUP_WINDOW_SECS }

#[derive(Parser)]
#[command(author, version, about = "Chronicle back-office server")]
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
    .add_source(config::Environment::with_prefix("CHRONICLE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  // Guarded recorder over the system clock.
  let recorder = Arc::new(ActivityRecorder::new(
    store.clone(),
    DedupGuard::new(chrono::Duration::seconds(server_cfg.dedup_window_secs)),
    Arc::new(SystemClock),
  ));

  // Queue worker for primary-contact transitions.
  let (queue, receiver) = JobQueue::channel();
  let handler = PrimaryContactHandler::new(
    store.clone(),
    recorder.clone(),
    Arc::new(LogNotifier),
  );
  tokio::spawn(run_worker(receiver, handler));

  let directory = Arc::new(Directory::new(store, recorder, queue));
  let app = chronicle_api::api_router(directory).layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

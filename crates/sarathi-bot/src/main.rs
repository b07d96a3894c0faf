//! sarathi server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), loads the
//! bundled verse datasets, opens an in-process SQLite store, and serves the
//! chat webhook plus the REST API over HTTP.
//!
//! # Push secret generation
//!
//! To generate the argon2 PHC string for `push_secret_hash` in config.toml:
//!
//! ```
//! cargo run -p sarathi-bot --bin server -- --hash-secret
//! ```

use std::{
  collections::VecDeque,
  path::{Path, PathBuf},
  sync::{Arc, Mutex},
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use sarathi_bot::{AppState, ServerConfig, data};
use sarathi_core::{
  corpus::Corpus,
  guardrail::ContentPolicy,
  interpretation::InterpretationCache,
  resolve::Resolver,
  topics::QueryTopics,
};
use sarathi_gateway::{
  chat::TelegramClient,
  interpret::InterpretationGateway,
  semantic::SemanticClient,
};
use sarathi_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Sarathi guidance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a secret entered on stdin and exit.
  #[arg(long)]
  hash_secret: bool,
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

  // Helper mode: hash a push secret and exit.
  if cli.hash_secret {
    let secret = read_secret_from_stdin()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(secret.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SARATHI"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Load the bundled datasets.
  let data_dir = expand_tilde(&server_cfg.data_dir);
  let verses = data::load_verses(&data_dir)?;
  let chapter_names = data::load_chapter_names(&data_dir)?;
  let curated = data::load_topics(&data_dir)?;
  let topic_index = data::load_topic_index(&data_dir)?;
  let interpretations = data::load_interpretations(&data_dir)?;
  let embeddings = data::load_embeddings(&data_dir)?;

  let corpus =
    Arc::new(Corpus::new(verses, chapter_names).context("invalid corpus")?);
  curated.validate(&corpus).context("invalid topic table")?;
  tracing::info!(verses = corpus.len(), topics = curated.len(), "corpus loaded");

  // The semantic tier runs only with both a key and precomputed vectors.
  let semantic = match (&server_cfg.embedding.api_key, embeddings.is_empty()) {
    (Some(_), false) => {
      tracing::info!(vectors = embeddings.len(), "semantic tier enabled");
      Some(SemanticClient::new(server_cfg.embedding.clone(), embeddings)?)
    }
    _ => {
      tracing::info!("semantic tier disabled");
      None
    }
  };

  let resolver = Arc::new(Resolver::new(
    corpus,
    curated,
    QueryTopics::builtin(),
    topic_index,
    semantic,
  ));

  let cache = Arc::new(interpretations);
  let gateway =
    InterpretationGateway::new(server_cfg.interpret.clone(), Arc::clone(&cache))?;
  let chat = TelegramClient::new(&server_cfg.telegram_token)?;

  // Open SQLite store.
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Build application state.
  let state = AppState {
    store: Arc::new(store),
    chat: Arc::new(chat),
    resolver,
    gateway,
    cache,
    policy: Arc::new(ContentPolicy::builtin()),
    config: Arc::new(server_cfg.clone()),
    seen_updates: Arc::new(Mutex::new(VecDeque::new())),
  };

  let app = sarathi_bot::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a secret from stdin.
fn read_secret_from_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Secret: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
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

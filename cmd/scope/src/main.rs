use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use kiln_sync::store::KEY_SETTINGS;
use kiln_sync::{
  DataSource, FileBackend, HttpSource, LogTailer, MockSource, PaginatedCollection, StorageBridge,
  TailStatus,
};
use shared::log::LogEntry;
use shared::settings::UserSettings;
use shared::table::{usable_tables, Document};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  init_logging();

  info!("scope inspector engine starting");

  let env = std::env::var("SCOPE_ENV").unwrap_or_else(|_| "development".to_string());
  let cfg = shared::config::load_config(Path::new("config"), &env)?;
  info!(env = %env, deployment = %cfg.deployment.url, "configuration loaded");

  let source: Arc<dyn DataSource> = if std::env::var("SCOPE_MOCK").is_ok() {
    info!("using the built-in mock deployment");
    Arc::new(demo_source())
  } else {
    Arc::new(HttpSource::new(&cfg.deployment)?)
  };

  let storage = Arc::new(StorageBridge::new(
    Arc::new(FileBackend::new(&cfg.storage.data_dir)),
    cfg.storage.scope.clone(),
  ));

  let mut args = std::env::args().skip(1);
  match args.next().as_deref() {
    Some("tables") => list_tables(source).await,
    Some("browse") => {
      let table = args.next().ok_or_else(|| anyhow::anyhow!("usage: scope browse <table>"))?;
      browse(source, storage, &cfg, &table).await
    }
    _ => tail(source, storage, &cfg).await,
  }
}

/// Follow the deployment's log stream until interrupted.
async fn tail(
  source: Arc<dyn DataSource>,
  storage: Arc<StorageBridge>,
  cfg: &shared::config::ScopeConfig,
) -> anyhow::Result<()> {
  let settings: UserSettings = storage.get(KEY_SETTINGS, UserSettings::default()).await;
  let mut tailer = LogTailer::new(source, &cfg.tail);
  let mut ticker = tokio::time::interval(Duration::from_millis(settings.poll_interval_ms));
  let mut last_status = TailStatus::Waiting;

  info!(interval_ms = settings.poll_interval_ms, "tailing logs");
  loop {
    ticker.tick().await;
    let outcome = tailer.poll().await;

    if tailer.status() != &last_status {
      last_status = tailer.status().clone();
      eprintln!("-- {last_status}");
    }

    if let kiln_sync::PollOutcome::Polled { added } = outcome {
      // Entries are newest-first; replay the new ones oldest-first.
      for entry in tailer.entries().iter().take(added).rev() {
        print_entry(&settings, entry);
      }
    }

    if tailer.is_disabled() {
      eprintln!("-- {}", tailer.status());
      anyhow::bail!("log stream disabled after repeated failures");
    }
  }
}

/// List the tables the deployment reports as browsable.
async fn list_tables(source: Arc<dyn DataSource>) -> anyhow::Result<()> {
  let shapes = source.table_shapes().await?;
  for name in usable_tables(&shapes) {
    println!("{name}");
  }
  Ok(())
}

/// Print the first pages of one table.
async fn browse(
  source: Arc<dyn DataSource>,
  storage: Arc<StorageBridge>,
  cfg: &shared::config::ScopeConfig,
  table: &str,
) -> anyhow::Result<()> {
  let mut collection =
    PaginatedCollection::new(source, storage, &cfg.page, cfg.deployment.component_id.clone());

  collection.select_table(table).await;
  if let Some(err) = collection.last_error() {
    anyhow::bail!("failed to load '{table}': {err}");
  }
  while collection.has_more() {
    if !matches!(
      collection.load_more().await,
      kiln_sync::LoadOutcome::Loaded { .. }
    ) {
      break;
    }
  }

  for doc in collection.documents() {
    print_document(doc);
  }
  info!(table, count = collection.documents().len(), "table browsed");
  Ok(())
}

fn print_entry(settings: &UserSettings, entry: &LogEntry) {
  let path = entry
    .function
    .as_ref()
    .map(|f| f.path.as_str())
    .unwrap_or("-");
  if settings.show_timestamps {
    println!(
      "{} [{}] {} {}",
      entry.time().format("%H:%M:%S%.3f"),
      entry.log_level,
      path,
      entry.message
    );
  } else {
    println!("[{}] {} {}", entry.log_level, path, entry.message);
  }
}

fn print_document(doc: &Document) {
  match serde_json::to_string(doc) {
    Ok(json) => println!("{json}"),
    Err(_) => println!("{}", doc.id),
  }
}

/// A small seeded deployment for running without a server.
fn demo_source() -> MockSource {
  let source = MockSource::new();

  let mut docs = Vec::new();
  for (i, name) in ["Ada", "Grace", "Edsger"].iter().enumerate() {
    let mut doc = Document::new(format!("user_{i}"), 1_700_000_000_000.0 + i as f64);
    doc
      .fields
      .insert("name".to_string(), serde_json::json!(name));
    doc
      .fields
      .insert("logins".to_string(), serde_json::json!(i as i64 * 3));
    docs.push(doc);
  }
  source.insert_table("users", docs);

  source.push_log_chunk(
    vec![LogEntry {
      timestamp: 1_700_000_000_000.0,
      topic: "console".to_string(),
      function: None,
      log_level: shared::log::LogLevel::Info,
      message: "mock deployment ready".to_string(),
      execution_time_ms: None,
      status: None,
      error_message: None,
      raw: serde_json::Value::Null,
    }],
    "1",
  );

  source
}

fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .init();
}

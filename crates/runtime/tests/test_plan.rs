use std::{env, fs, fs::File, path::Path, time::Duration};

use anyhow::{Context, Result};
use societas_backend_runtime::{self, BackendServices};
use societas_config::{AppConfig, StoreBackend};
use societas_store::{CollectionPath, DocumentStore, Query};
use tempfile::TempDir;
use tokio::time::{sleep, timeout};

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.to_string_lossy())
}

fn build_config(database_url: String, max_connections: u32) -> AppConfig {
    let mut config = AppConfig::default();
    config.store.sqlite.url = database_url;
    config.store.sqlite.max_connections = max_connections;
    config.completion.api_key = Some("unit-test-key".into());
    config.completion.system_instruction = "Stay brief.".into();
    config
}

async fn initialise(config: &AppConfig) -> Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_opens_sqlite_store_and_copies_persona() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/init.db");
    let config = build_config(sqlite_url(&db_path), 4);

    let services = initialise(&config).await?;
    let sqlite = services
        .sqlite
        .as_ref()
        .context("sqlite backend should expose its store")?;

    assert!(sqlite.all_documents().await?.is_empty());
    assert_eq!(services.system_instruction, "Stay brief.");

    let users = services
        .store
        .list(&CollectionPath::root("users"), &Query::new())
        .await?;
    assert!(users.is_empty());

    drop(services);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_reports_firestore_configuration_failures() -> Result<()> {
    env::remove_var("GOOGLE_CLOUD_PROJECT");
    let mut config = build_config("sqlite://:memory:".into(), 1);
    config.store.backend = StoreBackend::Firestore;
    config.store.firestore.project_id = None;

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected firestore setup to fail without a project id"),
        Err(error) => error,
    };
    let message = format!("{error:?}");
    assert!(
        message.contains("failed to configure firestore document store"),
        "expected firestore configuration context, got {message}"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_uses_firestore_without_local_store() -> Result<()> {
    let mut config = build_config("sqlite://:memory:".into(), 1);
    config.store.backend = StoreBackend::Firestore;
    config.store.firestore.project_id = Some("societas-test".into());
    config.store.firestore.emulator_host = Some("127.0.0.1:1".into());

    let services = initialise(&config).await?;
    assert!(services.sqlite.is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_tolerates_missing_provider_keys() -> Result<()> {
    let mut config = build_config("sqlite://:memory:".into(), 1);
    config.identity.api_key = None;
    config.completion.api_key = None;

    let services = initialise(&config).await?;
    assert!(services.sqlite.is_some());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn prepare_store_creates_sqlite_directory_if_missing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_dir = temp_dir.path().join("nested");
    let db_path = db_dir.join("prepared.db");
    let config = build_config(sqlite_url(&db_path), 2);

    assert!(!db_dir.exists());

    let services = initialise(&config).await?;
    assert!(db_dir.exists(), "database directory should be created");
    assert!(db_path.exists(), "sqlite database file should be created");
    drop(services);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn prepare_store_applies_max_connections_setting() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/max_conn.db");
    let max_connections = 3;
    let config = build_config(sqlite_url(&db_path), max_connections);

    let services = initialise(&config).await?;
    let sqlite = services.sqlite.as_ref().context("sqlite store expected")?;
    assert_eq!(max_connections, sqlite.pool().options().get_max_connections());

    drop(services);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn prepare_store_ignores_non_sqlite_urls() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let target_dir = temp_dir.path().join("should_not_exist");
    let malformed_url = format!("postgres://{}/ignored.db", target_dir.to_string_lossy());
    let config = build_config(malformed_url, 1);

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected sqlite connection to fail for non-sqlite URL"),
        Err(error) => error,
    };
    assert!(
        !target_dir.exists(),
        "non-sqlite URLs must not create filesystem structures"
    );
    assert!(
        format!("{error:?}").contains("failed to open sqlite document store"),
        "expected store failure context, got {error:?}"
    );

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn prepare_store_propagates_read_only_failures() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("readonly.db");
    File::create(&db_path)?;

    let mut perms = fs::metadata(&db_path)?.permissions();
    perms.set_readonly(true);
    fs::set_permissions(&db_path, perms)?;

    let config = build_config(sqlite_url(&db_path), 1);
    let result = BackendServices::initialise(&config).await;

    // Root can write through read-only permissions; only assert when the open fails.
    if let Err(error) = result {
        assert!(format!("{error:?}").contains("failed to open sqlite document store"));
    }

    Ok(())
}

#[test]
fn telemetry_init_tracing_sets_global_subscriber() {
    societas_backend_runtime::telemetry::init_tracing()
        .expect("first initialisation should succeed");

    let second = societas_backend_runtime::telemetry::init_tracing();
    assert!(
        second.is_err(),
        "initialising telemetry twice should fail with global subscriber already set"
    );
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(unix), ignore = "requires Unix signal handling")]
async fn shutdown_signal_completes_on_ctrl_c_notification() -> Result<()> {
    let shutdown_task = tokio::spawn(async { societas_backend_runtime::shutdown_signal().await });

    sleep(Duration::from_millis(50)).await;
    #[cfg(unix)]
    unsafe {
        libc::raise(libc::SIGINT);
    }

    timeout(Duration::from_secs(2), shutdown_task).await??;
    Ok(())
}

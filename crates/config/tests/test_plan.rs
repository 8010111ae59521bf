//! Test plan for the `societas-config` crate.
//!
//! These tests exercise the configuration loader across default handling,
//! file discovery, environment overrides, and validation behaviour.

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use societas_config::{
    load, AppConfig, CompletionConfig, HttpConfig, IdentityConfig, StoreBackend,
    DEFAULT_SYSTEM_INSTRUCTION,
};

const ENV_VARS_TO_RESET: &[&str] = &[
    "SOCIETAS_CONFIG",
    "SOCIETAS__HTTP__ADDRESS",
    "SOCIETAS__HTTP__PORT",
    "SOCIETAS__STORE__BACKEND",
    "SOCIETAS__STORE__SQLITE__URL",
    "SOCIETAS__STORE__SQLITE__MAX_CONNECTIONS",
    "SOCIETAS__STORE__FIRESTORE__PROJECT_ID",
    "SOCIETAS__STORE__FIRESTORE__EMULATOR_HOST",
    "SOCIETAS__IDENTITY__API_KEY",
    "SOCIETAS__IDENTITY__EMULATOR_HOST",
    "SOCIETAS__COMPLETION__API_KEY",
    "SOCIETAS__COMPLETION__MODEL",
    "SOCIETAS__COMPLETION__REQUEST_TIMEOUT_SECONDS",
];

struct TestContext {
    vars: Vec<(String, Option<String>)>,
    original_dir: Option<PathBuf>,
}

impl TestContext {
    fn new() -> Self {
        Self {
            vars: Vec::new(),
            original_dir: None,
        }
    }

    fn reset_environment(&mut self) {
        for key in ENV_VARS_TO_RESET {
            self.remove_var(key);
        }
    }

    fn set_var(&mut self, key: &str, value: impl AsRef<str>) {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value.as_ref());
        self.vars.push((key.to_string(), previous));
    }

    fn remove_var(&mut self, key: &str) {
        let previous = std::env::var(key).ok();
        std::env::remove_var(key);
        self.vars.push((key.to_string(), previous));
    }

    fn set_current_dir(&mut self, dir: &Path) {
        if self.original_dir.is_none() {
            self.original_dir =
                Some(std::env::current_dir().expect("failed to capture current directory"));
        }
        std::env::set_current_dir(dir).expect("failed to set current directory");
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if let Some(original) = self.original_dir.take() {
            let _ = std::env::set_current_dir(original);
        }

        while let Some((key, value)) = self.vars.pop() {
            match value {
                Some(val) => std::env::set_var(&key, val),
                None => std::env::remove_var(&key),
            }
        }
    }
}

fn write_config_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create config directories");
    }
    fs::write(path, contents).expect("failed to write config file");
}

fn isolated() -> (TempDir, TestContext) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());
    (temp_dir, ctx)
}

#[test]
#[serial]
fn load_uses_default_values_when_no_files_found() {
    let (_temp_dir, _ctx) = isolated();

    let config = load().expect("configuration load should succeed without files");
    let defaults = AppConfig::default();

    assert_eq!(config.http.address, defaults.http.address);
    assert_eq!(config.http.port, defaults.http.port);
    assert_eq!(config.store.backend, StoreBackend::Sqlite);
    assert_eq!(config.store.sqlite.url, defaults.store.sqlite.url);
    assert_eq!(
        config.store.sqlite.max_connections,
        defaults.store.sqlite.max_connections
    );
    assert_eq!(config.store.firestore.database_id, "(default)");
    assert_eq!(config.completion.model, defaults.completion.model);
    assert_eq!(config.completion.system_instruction, DEFAULT_SYSTEM_INSTRUCTION);
    assert!(config.completion.request_timeout_seconds.is_none());
    assert!(config.identity.api_key.is_none());
}

#[test]
#[serial]
fn load_picks_first_available_file_in_search_order() {
    let (temp_dir, _ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "societas.toml",
        r#"
        [http]
        port = 4242
        "#,
    );
    write_config_file(
        temp_dir.path(),
        "config/societas.toml",
        r#"
        [http]
        port = 5151
        "#,
    );

    let config = load().expect("configuration load should pick the first file");
    assert_eq!(config.http.port, 4242);
}

#[test]
#[serial]
fn load_merges_partial_file_with_defaults() {
    let (temp_dir, _ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "societas.toml",
        r#"
        [store]
        backend = "firestore"

        [store.firestore]
        project_id = "societas-dev"
        emulator_host = "localhost:8085"

        [completion]
        model = "gemini-2.5-flash"
        "#,
    );

    let config = load().expect("configuration load should succeed");
    let defaults = AppConfig::default();

    assert_eq!(config.store.backend, StoreBackend::Firestore);
    assert_eq!(
        config.store.firestore.project_id.as_deref(),
        Some("societas-dev")
    );
    assert_eq!(
        config.store.firestore.emulator_host.as_deref(),
        Some("localhost:8085")
    );
    assert_eq!(config.store.firestore.base_url, defaults.store.firestore.base_url);
    assert_eq!(config.completion.model, "gemini-2.5-flash");
    assert_eq!(config.completion.base_url, defaults.completion.base_url);
    assert_eq!(config.http.address, defaults.http.address);
}

#[test]
#[serial]
fn load_applies_environment_overrides() {
    let (temp_dir, mut ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "societas.toml",
        r#"
        [http]
        port = 3030
        "#,
    );

    ctx.set_var("SOCIETAS__HTTP__PORT", "9090");
    ctx.set_var("SOCIETAS__COMPLETION__REQUEST_TIMEOUT_SECONDS", "45");

    let config = load().expect("configuration load should honour env overrides");
    assert_eq!(config.http.port, 9090);
    assert_eq!(config.completion.request_timeout_seconds, Some(45));
}

#[test]
#[serial]
fn load_reads_explicit_config_path() {
    let (temp_dir, mut ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "elsewhere/custom.toml",
        r#"
        [identity]
        api_key = "firebase-web-key"
        "#,
    );
    let path = temp_dir.path().join("elsewhere/custom.toml");
    ctx.set_var("SOCIETAS_CONFIG", path.display().to_string());

    let config = load().expect("configuration load should read SOCIETAS_CONFIG");
    assert_eq!(config.identity.api_key.as_deref(), Some("firebase-web-key"));
}

#[test]
#[serial]
fn load_errors_on_invalid_toml_contents() {
    let (temp_dir, _ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "societas.toml",
        r#"
        [http]
        port = "not-a-number
        "#,
    );

    let error = load().expect_err("invalid TOML should cause load to fail");
    let message = error.to_string();
    assert!(
        message.contains("invalid configuration")
            || message.contains("unable to build configuration"),
        "unexpected error message: {message}"
    );
}

#[test]
#[serial]
fn load_rejects_unknown_store_backend() {
    let (_temp_dir, mut ctx) = isolated();
    ctx.set_var("SOCIETAS__STORE__BACKEND", "mongodb");

    let error = load().expect_err("unknown backend should fail to deserialize");
    assert!(error.to_string().contains("invalid configuration"));
}

#[test]
fn identity_config_defaults_point_at_google_endpoints() {
    let defaults = IdentityConfig::default();
    assert!(defaults.api_key.is_none());
    assert_eq!(
        defaults.identity_base_url,
        "https://identitytoolkit.googleapis.com/v1"
    );
    assert_eq!(defaults.token_base_url, "https://securetoken.googleapis.com/v1");
    assert!(defaults.emulator_host.is_none());
}

#[test]
fn completion_config_defaults_use_gemini() {
    let defaults = CompletionConfig::default();
    assert_eq!(
        defaults.base_url,
        "https://generativelanguage.googleapis.com/v1beta"
    );
    assert_eq!(defaults.model, "gemini-1.5-flash");
}

#[test]
fn http_config_defaults_match_expected_host_and_port() {
    let defaults = HttpConfig::default();
    assert_eq!(defaults.address, "127.0.0.1");
    assert_eq!(defaults.port, 8080);
}

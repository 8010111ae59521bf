use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "societas.toml",
    "config/societas.toml",
    "crates/config/societas.toml",
    "../societas.toml",
    "../config/societas.toml",
];

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are an AI teammate inside the Societas workspace. \
Answer the user directly, keep replies concise and practical, and stay in character as the agent \
they are chatting with.";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Firestore,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub sqlite: SqliteStoreConfig,
    #[serde(default)]
    pub firestore: FirestoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://societas.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Connection settings for the Firestore REST backend.
///
/// ```
/// use societas_config::FirestoreConfig;
///
/// let firestore = FirestoreConfig::default();
/// assert_eq!(firestore.base_url, "https://firestore.googleapis.com/v1");
/// assert_eq!(firestore.database_id, "(default)");
/// assert!(firestore.project_id.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreConfig {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "FirestoreConfig::default_database_id")]
    pub database_id: String,
    #[serde(default = "FirestoreConfig::default_base_url")]
    pub base_url: String,
    /// `host:port` of a Firestore emulator. Overrides `base_url` when set.
    #[serde(default)]
    pub emulator_host: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl FirestoreConfig {
    fn default_database_id() -> String {
        "(default)".to_string()
    }

    fn default_base_url() -> String {
        "https://firestore.googleapis.com/v1".to_string()
    }
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            database_id: Self::default_database_id(),
            base_url: Self::default_base_url(),
            emulator_host: None,
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "IdentityConfig::default_identity_base_url")]
    pub identity_base_url: String,
    #[serde(default = "IdentityConfig::default_token_base_url")]
    pub token_base_url: String,
    /// `host:port` of a Firebase Auth emulator. Overrides both base URLs when set.
    #[serde(default)]
    pub emulator_host: Option<String>,
}

impl IdentityConfig {
    fn default_identity_base_url() -> String {
        "https://identitytoolkit.googleapis.com/v1".to_string()
    }

    fn default_token_base_url() -> String {
        "https://securetoken.googleapis.com/v1".to_string()
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            identity_base_url: Self::default_identity_base_url(),
            token_base_url: Self::default_token_base_url(),
            emulator_host: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "CompletionConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "CompletionConfig::default_model")]
    pub model: String,
    #[serde(default = "CompletionConfig::default_system_instruction")]
    pub system_instruction: String,
    /// No timeout is applied to completion calls unless this is set.
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
}

impl CompletionConfig {
    fn default_base_url() -> String {
        "https://generativelanguage.googleapis.com/v1beta".to_string()
    }

    fn default_model() -> String {
        "gemini-1.5-flash".to_string()
    }

    fn default_system_instruction() -> String {
        DEFAULT_SYSTEM_INSTRUCTION.to_string()
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::default_base_url(),
            model: Self::default_model(),
            system_instruction: Self::default_system_instruction(),
            request_timeout_seconds: None,
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use societas_config::load;
///
/// std::env::remove_var("SOCIETAS_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("store.backend", "sqlite")?
        .set_default("store.sqlite.url", defaults.store.sqlite.url.clone())?
        .set_default(
            "store.sqlite.max_connections",
            i64::from(defaults.store.sqlite.max_connections),
        )?
        .set_default(
            "store.firestore.database_id",
            defaults.store.firestore.database_id.clone(),
        )?
        .set_default(
            "store.firestore.base_url",
            defaults.store.firestore.base_url.clone(),
        )?
        .set_default(
            "identity.identity_base_url",
            defaults.identity.identity_base_url.clone(),
        )?
        .set_default(
            "identity.token_base_url",
            defaults.identity.token_base_url.clone(),
        )?
        .set_default("completion.base_url", defaults.completion.base_url.clone())?
        .set_default("completion.model", defaults.completion.model.clone())?
        .set_default(
            "completion.system_instruction",
            defaults.completion.system_instruction.clone(),
        )?;

    let environment_overrides = config::Environment::with_prefix("SOCIETAS").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("SOCIETAS_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via SOCIETAS_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(
        http = %format!("{}:{}", config.http.address, config.http.port),
        backend = ?config.store.backend,
        model = %config.completion.model,
        "loaded backend configuration"
    );
    Ok(config)
}

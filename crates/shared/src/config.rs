//! Application configuration management.

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Environment variable prefix for overrides, e.g. `KINDRED__UPLOAD__MAX_FILES=3`.
pub const ENV_PREFIX: &str = "KINDRED";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Upload pipeline settings.
    #[serde(default)]
    pub upload: UploadSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    3600 // 1 hour
}

/// Upload pipeline settings shared by the endpoints and the client.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Maximum size of a single file in bytes.
    #[serde(default = "default_max_size")]
    pub max_size: u64,
    /// Maximum number of files in one selection.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Logical folder used when a request names none.
    #[serde(default = "default_folder")]
    pub default_folder: String,
    /// Destroy already-ingested files when a batch fails.
    #[serde(default = "default_compensate")]
    pub compensate_on_failure: bool,
}

impl UploadSettings {
    /// Default max file size: 10 MiB.
    pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
    /// Default number of files per selection.
    pub const DEFAULT_MAX_FILES: usize = 5;
    /// Default logical folder.
    pub const DEFAULT_FOLDER: &'static str = "uploads";

    /// Largest request body the ingest endpoint has to accept.
    ///
    /// One megabyte of slack covers multipart boundaries and the folder field.
    #[must_use]
    pub fn request_body_limit(&self) -> usize {
        let max_size = usize::try_from(self.max_size).unwrap_or(usize::MAX);
        max_size
            .saturating_mul(self.max_files.max(1))
            .saturating_add(1024 * 1024)
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            max_files: default_max_files(),
            default_folder: default_folder(),
            compensate_on_failure: default_compensate(),
        }
    }
}

fn default_max_size() -> u64 {
    UploadSettings::DEFAULT_MAX_SIZE
}

fn default_max_files() -> usize {
    UploadSettings::DEFAULT_MAX_FILES
}

fn default_folder() -> String {
    UploadSettings::DEFAULT_FOLDER.to_string()
}

fn default_compensate() -> bool {
    true
}

/// Loads any deserializable settings type from the layered sources.
///
/// Order: `config/default`, `config/{RUN_MODE}`, then `KINDRED__*` environment
/// variables. Binaries use this to read their own sections next to [`AppConfig`].
///
/// # Errors
///
/// Returns an error if a source cannot be read or the result does not deserialize.
pub fn load_layered<T: DeserializeOwned>() -> Result<T, config::ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

    let config = config::Config::builder()
        .add_source(config::File::with_name("config/default").required(false))
        .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    config.try_deserialize()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        load_layered()
    }
}

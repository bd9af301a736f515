//! Configuration file handling.
//!
//! The configuration file is stored at `$SYNCLIFE_HOME/config.json` and
//! contains the record store URL and the model used for the conversational
//! assistant. Secrets (the record store service key and the language service
//! API key) live as plain files under `$SYNCLIFE_HOME/.secrets/`.

use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "synclife";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const CONFIG_JSON: &str = "config.json";
const SERVICE_KEY: &str = "service_key";
const GEMINI_KEY: &str = "gemini_key";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// The `Config` object represents the configuration of the app. You
/// instantiate it by providing the path to `$SYNCLIFE_HOME` and from there it
/// loads `$SYNCLIFE_HOME/config.json`. It provides paths to other items that
/// are expected in certain locations within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    project_ref: String,
}

impl Config {
    /// Creates the data directory and its subdirectories, writes an initial
    /// `config.json`, and moves the two secret files into their default
    /// locations.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the data directory,
    ///   e.g. `$HOME/synclife`
    /// - `service_key_file` - The record store service key. Moved to its
    ///   default location in the data directory.
    /// - `gemini_key_file` - The language service API key. Moved likewise.
    /// - `store_url` - The URL of the record store project, e.g.
    ///   `https://abcdefghij.supabase.co`
    pub async fn create(
        dir: impl Into<PathBuf>,
        service_key_file: &Path,
        gemini_key_file: &Path,
        store_url: &str,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the synclife home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;
        utils::rename(service_key_file, secrets_dir.join(SERVICE_KEY)).await?;
        utils::rename(gemini_key_file, secrets_dir.join(GEMINI_KEY)).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            store_url: store_url.to_string(),
            model: DEFAULT_MODEL.to_string(),
            service_key_path: None,
            gemini_key_path: None,
        };
        config_file.save(&config_path).await?;

        let project_ref = extract_project_ref(store_url)
            .context("Failed to extract the project ref from the store URL")?
            .to_string();

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            project_ref,
        })
    }

    /// Validates that the home directory, config file and secrets directory
    /// exist, then loads the configuration.
    pub async fn load(synclife_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = synclife_home.into();
        let root = utils::canonicalize(&maybe_relative).await?;

        let _ = utils::read_dir(&root)
            .await
            .context("SyncLife Home is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let project_ref = extract_project_ref(&config_file.store_url)
            .context("Failed to extract the project ref from the store URL")?
            .to_string();

        let config = Self {
            root: root.clone(),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            project_ref,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn store_url(&self) -> &str {
        &self.config_file.store_url
    }

    pub fn project_ref(&self) -> &str {
        &self.project_ref
    }

    /// The language service model identifier, e.g. `gemini-2.5-flash`.
    pub fn model(&self) -> &str {
        &self.config_file.model
    }

    /// Returns the stored `service_key_path` if it is absolute, otherwise
    /// resolves the relative path against the home directory.
    pub fn service_key_path(&self) -> PathBuf {
        self.resolve_secrets_file_path(self.config_file.service_key_path())
    }

    /// Returns the stored `gemini_key_path` if it is absolute, otherwise
    /// resolves the relative path against the home directory.
    pub fn gemini_key_path(&self) -> PathBuf {
        self.resolve_secrets_file_path(self.config_file.gemini_key_path())
    }

    /// Reads and trims the record store service key.
    pub async fn read_service_key(&self) -> Result<String> {
        let key = utils::read(&self.service_key_path()).await?;
        Ok(key.trim().to_string())
    }

    /// Reads and trims the language service API key.
    pub async fn read_gemini_key(&self) -> Result<String> {
        let key = utils::read(&self.gemini_key_path()).await?;
        Ok(key.trim().to_string())
    }

    fn resolve_secrets_file_path(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "synclife",
///   "config_version": 1,
///   "store_url": "https://abcdefghij.supabase.co",
///   "model": "gemini-2.5-flash"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "synclife"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL of the record store project
    store_url: String,

    /// Language service model identifier
    #[serde(default = "default_model")]
    model: String,

    /// Path to the record store service key (optional, relative to the home
    /// directory or absolute). Defaults to `.secrets/service_key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    service_key_path: Option<PathBuf>,

    /// Path to the language service API key (optional, relative to the home
    /// directory or absolute). Defaults to `.secrets/gemini_key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    gemini_key_path: Option<PathBuf>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl ConfigFile {
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;
        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path.as_ref(), data)
            .await
            .context("Unable to write config file")
    }

    fn service_key_path(&self) -> PathBuf {
        self.service_key_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(SERVICE_KEY))
    }

    fn gemini_key_path(&self) -> PathBuf {
        self.gemini_key_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(GEMINI_KEY))
    }
}

/// Extracts the project ref (the first host label) from a record store URL.
///
/// # Arguments
/// * `url` - e.g. "https://abcdefghij.supabase.co"
///
/// Returns an empty string if the URL is empty.
fn extract_project_ref(url: &str) -> Result<&str> {
    if url.is_empty() {
        return Ok(url);
    }
    let parsed = url::Url::parse(url).with_context(|| format!("Invalid store URL '{url}'"))?;
    let host = parsed
        .host_str()
        .with_context(|| format!("The store URL '{url}' has no host"))?;
    let label = host.split('.').next().unwrap_or(host);
    if label.is_empty() {
        bail!("The store URL '{url}' has no project ref");
    }
    // Borrow from the input, not the temporary parse.
    let start = url.find(label).context("host label not present in URL")?;
    Ok(&url[start..start + label.len()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write_secret(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        utils::write(&path, content).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("synclife_home");
        let service_key = write_secret(dir.path(), "sk.txt", "service-12345").await;
        let gemini_key = write_secret(dir.path(), "gk.txt", "gemini-67890").await;
        let store_url = "https://abcdefghij.supabase.co";

        let config = Config::create(&home_dir, &service_key, &gemini_key, store_url)
            .await
            .unwrap();

        assert_eq!(store_url, config.store_url());
        assert_eq!("abcdefghij", config.project_ref());
        assert_eq!("gemini-2.5-flash", config.model());
        assert_eq!("service-12345", config.read_service_key().await.unwrap());
        assert_eq!("gemini-67890", config.read_gemini_key().await.unwrap());
        assert!(config.secrets().is_dir());
    }

    #[tokio::test]
    async fn test_config_create_then_load() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("home");
        let service_key = write_secret(dir.path(), "sk.txt", "abc").await;
        let gemini_key = write_secret(dir.path(), "gk.txt", "def").await;
        let url = "https://myproject.supabase.co";

        let created = Config::create(&home_dir, &service_key, &gemini_key, url)
            .await
            .unwrap();
        let loaded = Config::load(&home_dir).await.unwrap();

        assert_eq!(created.store_url(), loaded.store_url());
        assert_eq!(created.project_ref(), loaded.project_ref());
        assert_eq!("abc", loaded.read_service_key().await.unwrap());
    }

    #[tokio::test]
    async fn test_load_missing_home_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(Config::load(&missing).await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");
        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1,
            "store_url": "https://x.supabase.co"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_defaults_model() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");
        let json = r#"{
            "app_name": "synclife",
            "config_version": 1,
            "store_url": "https://x.supabase.co"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(
            config.service_key_path(),
            PathBuf::from(SECRETS).join(SERVICE_KEY)
        );
        assert_eq!(
            config.gemini_key_path(),
            PathBuf::from(SECRETS).join(GEMINI_KEY)
        );
    }

    #[test]
    fn test_extract_project_ref() {
        assert_eq!(
            extract_project_ref("https://abcdefghij.supabase.co").unwrap(),
            "abcdefghij"
        );
        assert_eq!(
            extract_project_ref("https://myproject.supabase.co/rest/v1").unwrap(),
            "myproject"
        );
        assert_eq!(extract_project_ref("").unwrap(), "");
        assert!(extract_project_ref("not a url").is_err());
    }
}

use crate::credentials::{
    CredentialStore, EncryptedCredentialStore, FileCredentialStore, WEB_TOKEN_KEY,
};
use crate::utils::crypto;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BidiSettings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Origin of the Bidi REST backend
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub path: String,
    /// Key the token is stored under (`accessToken` for the console,
    /// `userToken` for the attendant app)
    pub key: String,
    pub encrypted: bool,
    /// Sealing secret for encrypted storage. Generated when empty.
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl ApiSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: "bidi-credentials.json".to_string(),
            key: WEB_TOKEN_KEY.to_string(),
            encrypted: false,
            secret: String::new(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Settings loading failures
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: basic_toml::Error,
    },
}

impl BidiSettings {
    /// Load settings from configuration files and environment variables,
    /// then initialise logging
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read or parsed
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Self::initialize_logging(&settings.logging);
        Self::ensure_storage_secret(&mut settings.storage);

        Ok(settings)
    }

    /// Initialise `env_logger`; `RUST_LOG` wins over the configured level.
    /// A logger installed earlier (tests, embedding hosts) is kept.
    fn initialize_logging(logging: &LoggingSettings) {
        let env = env_logger::Env::default().default_filter_or(logging.level.as_str());
        if env_logger::Builder::from_env(env).try_init().is_err() {
            log::debug!("Logger already initialised, keeping existing configuration");
        }
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `BIDI_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    fn load_base_settings() -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        let default_config_path = PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(&default_config_path)?;
        }

        if let Ok(secrets_dir) = std::env::var("BIDI_SECRETS_DIR") {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
            }
        }

        Ok(settings)
    }

    /// Parse one settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let toml_content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        basic_toml::from_str(&toml_content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_api_env_overrides(&mut settings.api);
        Self::apply_storage_env_overrides(&mut settings.storage);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_api_env_overrides(api: &mut ApiSettings) {
        if let Ok(base_url) = std::env::var("API_BASE_URL") {
            if !base_url.trim().is_empty() {
                api.base_url = base_url.trim().to_string();
            }
        }
        if let Ok(timeout) = std::env::var("API_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                api.timeout_seconds = timeout;
            }
        }
    }

    fn apply_storage_env_overrides(storage: &mut StorageSettings) {
        if let Ok(path) = std::env::var("TOKEN_STORE_PATH") {
            storage.path = path;
        }
        if let Ok(key) = std::env::var("TOKEN_STORE_KEY") {
            storage.key = key;
        }
        if let Ok(encrypted) = std::env::var("TOKEN_STORE_ENCRYPTED") {
            if let Ok(encrypted) = encrypted.parse::<bool>() {
                storage.encrypted = encrypted;
            }
        }
        if let Ok(secret) = std::env::var("TOKEN_STORE_SECRET") {
            if !secret.is_empty() {
                storage.secret = secret;
            }
        }
    }

    fn apply_logging_env_overrides(logging: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging.level = log_level;
        }
    }

    /// Generate a sealing secret for encrypted storage when none is configured
    pub fn ensure_storage_secret(storage: &mut StorageSettings) {
        if storage.encrypted && storage.secret.is_empty() {
            storage.secret = crypto::generate_secret();
            log::warn!("⚠️  Using auto-generated token store secret");
            log::warn!("🔒 Set TOKEN_STORE_SECRET so stored tokens survive a restart");
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Build the credential store described by the `[storage]` section
    #[must_use]
    pub fn credential_store(&self) -> Arc<dyn CredentialStore> {
        let file_store = FileCredentialStore::new(&self.storage.path, &self.storage.key);
        if self.storage.encrypted {
            Arc::new(EncryptedCredentialStore::new(
                file_store,
                self.storage.secret.as_bytes(),
            ))
        } else {
            Arc::new(file_store)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clean_env_vars() {
        for var in [
            "API_BASE_URL",
            "API_TIMEOUT_SECONDS",
            "TOKEN_STORE_PATH",
            "TOKEN_STORE_KEY",
            "TOKEN_STORE_ENCRYPTED",
            "TOKEN_STORE_SECRET",
            "BIDI_SECRETS_DIR",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = BidiSettings::default();
        assert_eq!(settings.api.base_url, "http://localhost:3000");
        assert_eq!(settings.api.timeout(), Duration::from_secs(30));
        assert_eq!(settings.storage.key, "accessToken");
        assert!(!settings.storage.encrypted);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    #[serial]
    fn test_api_env_override() {
        clean_env_vars();
        std::env::set_var("API_BASE_URL", "https://api.bidi.test");
        std::env::set_var("API_TIMEOUT_SECONDS", "5");

        let mut settings = BidiSettings::default();
        BidiSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.api.base_url, "https://api.bidi.test");
        assert_eq!(settings.api.timeout_seconds, 5);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_unparsable_numeric_override_is_ignored() {
        clean_env_vars();
        std::env::set_var("API_TIMEOUT_SECONDS", "soon");
        std::env::set_var("TOKEN_STORE_ENCRYPTED", "yes please");

        let mut settings = BidiSettings::default();
        BidiSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.api.timeout_seconds, 30);
        assert!(!settings.storage.encrypted);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_storage_env_override() {
        clean_env_vars();
        std::env::set_var("TOKEN_STORE_KEY", "userToken");
        std::env::set_var("TOKEN_STORE_ENCRYPTED", "true");
        std::env::set_var("TOKEN_STORE_SECRET", "device-secret");

        let mut settings = BidiSettings::default();
        BidiSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.storage.key, "userToken");
        assert!(settings.storage.encrypted);
        assert_eq!(settings.storage.secret, "device-secret");

        clean_env_vars();
    }

    #[test]
    fn test_secret_generated_only_when_encrypted() {
        let mut plain = StorageSettings::default();
        BidiSettings::ensure_storage_secret(&mut plain);
        assert!(plain.secret.is_empty());

        let mut sealed = StorageSettings {
            encrypted: true,
            ..StorageSettings::default()
        };
        BidiSettings::ensure_storage_secret(&mut sealed);
        assert!(sealed.secret.len() > 40);
    }

    #[test]
    fn test_from_file_with_partial_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Settings.toml");
        fs::write(
            &path,
            r#"
[api]
base_url = "https://bidi.example"
timeout_seconds = 10
"#,
        )
        .unwrap();

        let settings = BidiSettings::from_file(&path).unwrap();
        assert_eq!(settings.api.base_url, "https://bidi.example");
        assert_eq!(settings.storage.key, "accessToken");
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Settings.toml");
        fs::write(&path, "[api\nbase_url = ").unwrap();

        let err = BidiSettings::from_file(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_credential_store_follows_storage_section() {
        let dir = TempDir::new().unwrap();
        let mut settings = BidiSettings::default();
        settings.storage.path = dir.path().join("c.json").display().to_string();
        settings.storage.encrypted = true;
        settings.storage.secret = "s3cret".to_string();

        let store = settings.credential_store();
        store.set("tok").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("tok"));

        let raw = fs::read_to_string(dir.path().join("c.json")).unwrap();
        assert!(!raw.contains("\"tok\""));
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::remote::client::RemoteClient;
use crate::remote::RemoteSource;
use crate::services::pipeline::PipelineService;
use crate::store::DealStore;
use crate::types::Config;

/// Env var that points at an alternate config file.
pub const CONFIG_ENV_VAR: &str = "DEALFLOW_CONFIG";

/// Shared state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PipelineService>,
}

impl AppState {
    /// Wire the store, vocabulary and webhook client described by `config`.
    pub fn from_config(config: Config) -> Result<Self, String> {
        let remote = RemoteClient::from_config(&config.remote)
            .map_err(|e| format!("Failed to build remote client: {}", e))?
            .map(|client| Arc::new(client) as Arc<dyn RemoteSource>);
        Self::with_remote(config, remote)
    }

    /// Same as [`AppState::from_config`] with an explicit remote source.
    pub fn with_remote(
        config: Config,
        remote: Option<Arc<dyn RemoteSource>>,
    ) -> Result<Self, String> {
        let vocabulary = Arc::new(config.load_vocabulary()?);
        let store = if config.seed_sample_data {
            DealStore::seeded(&vocabulary)
        } else {
            DealStore::new()
        };

        match &remote {
            Some(_) => log::info!(
                "Pipeline using remote source with local fallback ({} retries, dashboard ttl {}s)",
                config.remote.fetch_retries,
                config.remote.dashboard_ttl_secs
            ),
            None => log::info!("Remote source disabled; serving local store only"),
        }

        let pipeline = PipelineService::new(
            store,
            remote,
            vocabulary,
            config.remote.fetch_retries,
        )
        .with_dashboard_ttl(Duration::from_secs(config.remote.dashboard_ttl_secs));
        Ok(Self {
            pipeline: Arc::new(pipeline),
        })
    }
}

/// Get the config file path: `$DEALFLOW_CONFIG`, else ~/.dealflow/config.json.
pub fn config_path() -> Result<PathBuf, String> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".dealflow").join("config.json"))
}

/// Load configuration from the default location.
pub fn load_config() -> Result<Config, String> {
    load_config_from(&config_path()?)
}

/// Load and validate configuration from `path`.
///
/// A missing file yields defaults. An unreadable or malformed file is an error.
pub fn load_config_from(path: &Path) -> Result<Config, String> {
    let config = if path.exists() {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;
        serde_json::from_str::<Config>(&content)
            .map_err(|e| format!("Failed to parse config {}: {}", path.display(), e))?
    } else {
        log::info!("No config at {}, using defaults", path.display());
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:5000");
        assert_eq!(config.vocabulary_version, "pt-br-v2");
    }

    #[test]
    fn test_config_file_is_parsed_and_validated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"bindAddr": "0.0.0.0:8080", "vocabularyVersion": "en-v1", "seedSampleData": false}}"#
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.vocabulary_version, "en-v1");
        assert!(!config.seed_sample_data);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = load_config_from(file.path()).unwrap_err();
        assert!(err.contains("Failed to parse config"));
    }

    #[test]
    fn test_enabled_remote_without_url_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"remote": {{"enabled": true}}}}"#).unwrap();
        assert!(load_config_from(file.path()).is_err());
    }

    #[test]
    fn test_state_seeds_when_configured() {
        let state = AppState::from_config(Config::default()).unwrap();
        assert_eq!(state.pipeline.local_deals().len(), 8);

        let empty = AppState::from_config(Config {
            seed_sample_data: false,
            ..Default::default()
        })
        .unwrap();
        assert!(empty.pipeline.local_deals().is_empty());
    }

    #[test]
    fn test_custom_vocabulary_path_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "id": "custom",
                "name": "Custom",
                "stages": [{{"value": "Open"}}, {{"value": "Closed"}}],
                "statuses": [
                    {{"value": "Active", "role": "open"}},
                    {{"value": "Won", "role": "won"}},
                    {{"value": "Lost", "role": "lost"}}
                ]
            }}"#
        )
        .unwrap();

        let config = Config {
            vocabulary_version: "does-not-exist".into(),
            vocabulary_path: Some(file.path().display().to_string()),
            seed_sample_data: false,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        let state = AppState::from_config(config).unwrap();
        assert_eq!(state.pipeline.vocabulary().id, "custom");
    }
}

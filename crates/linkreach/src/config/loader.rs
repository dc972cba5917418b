use std::path::{Path, PathBuf};

use crate::classify::markers::MarkerRule;
use crate::config::schema::{Config, CONFIG_VERSION};
use crate::error::ConfigError;
use crate::secrets::has_secret_source;

/// File name looked up in the working directory when no config is given.
pub const DEFAULT_CONFIG_FILE: &str = "linkreach.json";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Loads the explicit config if given, otherwise the first existing default
/// location, otherwise built-in defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return load_config(path);
    }

    match default_locations().into_iter().find(|p| p.is_file()) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Using config file");
            load_config(path)
        }
        None => {
            let config = Config::default();
            validate_config(&config)?;
            Ok(config)
        }
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("linkreach").join("config.json"));
    }
    locations
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.data_directory.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "data_directory must not be empty".to_string(),
        });
    }

    if url::Url::parse(&config.directory.base_url).is_err() {
        return Err(ConfigError::Validation {
            message: format!("directory.base_url is not a URL: {}", config.directory.base_url),
        });
    }

    if !config.directory.entity_path_prefix.starts_with('/')
        || !config.directory.entity_path_prefix.ends_with('/')
    {
        return Err(ConfigError::Validation {
            message: "directory.entity_path_prefix must start and end with '/'".to_string(),
        });
    }

    let harvest = &config.harvest;
    if harvest.max_scrolls == 0 {
        return Err(ConfigError::Validation {
            message: "harvest.max_scrolls must be at least 1".to_string(),
        });
    }
    if harvest.max_stalls == 0 {
        return Err(ConfigError::Validation {
            message: "harvest.max_stalls must be at least 1".to_string(),
        });
    }

    let batch = &config.batch;
    if batch.pacing_min_ms > batch.pacing_max_ms {
        return Err(ConfigError::Validation {
            message: format!(
                "batch.pacing_min_ms ({}) exceeds batch.pacing_max_ms ({})",
                batch.pacing_min_ms, batch.pacing_max_ms
            ),
        });
    }
    if batch.default_count == 0 {
        return Err(ConfigError::Validation {
            message: "batch.default_count must be at least 1".to_string(),
        });
    }

    let invitations = &config.invitations;
    if url::Url::parse(&invitations.url).is_err() {
        return Err(ConfigError::Validation {
            message: format!("invitations.url is not a URL: {}", invitations.url),
        });
    }
    if invitations.max_scrolls == 0 || invitations.max_stalls == 0 {
        return Err(ConfigError::Validation {
            message: "invitations.max_scrolls and invitations.max_stalls must be at least 1"
                .to_string(),
        });
    }

    validate_marker_rule("connect_markers", &config.profile.connect_markers)?;
    validate_marker_rule("pending_markers", &config.profile.pending_markers)?;

    if !has_secret_source(&config.credentials.email)
        || !has_secret_source(&config.credentials.password)
    {
        return Err(ConfigError::Validation {
            message: "credentials.email and credentials.password each need a source".to_string(),
        });
    }

    Ok(())
}

fn validate_marker_rule(name: &str, rule: &MarkerRule) -> Result<(), ConfigError> {
    if rule.required.is_empty() {
        return Err(ConfigError::InvalidMarkerRule {
            name: name.to_string(),
            reason: "at least one required class is needed".to_string(),
        });
    }

    if let Some(clash) = rule
        .excluded
        .iter()
        .find(|c| rule.required.contains(*c) || rule.any_of.contains(*c))
    {
        return Err(ConfigError::InvalidMarkerRule {
            name: name.to_string(),
            reason: format!("class '{}' is both expected and excluded", clash),
        });
    }

    Ok(())
}

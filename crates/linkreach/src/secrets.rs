//! Credential resolution from multiple sources.
//!
//! Each credential can come from, in priority order:
//!
//! 1. **Direct value** - for quick local runs (e.g., `"password": "hunter2"`)
//! 2. **File reference** - for mounted secrets (e.g., `"password_file": "/run/secrets/li"`)
//! 3. **Env var reference** - the default (`LINKEDIN_EMAIL` / `LINKEDIN_PASSWORD`),
//!    which also picks up values loaded from `.env` by the binary.

use secrecy::SecretString;
use std::fs;

use crate::config::schema::{CredentialsConfig, SecretSource};

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("Secret resolved to an empty value")]
    Empty,
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Login credentials for the networking site.
pub struct Credentials {
    pub email: SecretString,
    pub password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &"[redacted]")
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Resolves a secret from multiple sources in priority order:
/// 1. Direct value (if provided and non-empty)
/// 2. File contents (if path provided)
/// 3. Environment variable (if name provided)
///
/// Values are trimmed; a source that yields only whitespace is an error
/// rather than an empty credential.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct.filter(|v| !v.is_empty()) {
        return non_empty(value);
    }

    if let Some(path) = file_path.filter(|p| !p.is_empty()) {
        let expanded = expand_home(path);
        return match fs::read_to_string(&expanded) {
            Ok(content) => non_empty(&content),
            Err(e) => Err(SecretError::FileReadError {
                path: expanded,
                source: e,
            }),
        };
    }

    if let Some(var_name) = env_var.filter(|n| !n.is_empty()) {
        return match std::env::var(var_name) {
            Ok(value) => non_empty(&value),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: var_name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: var_name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Resolves one configured secret source.
pub fn resolve_source(source: &SecretSource) -> Result<SecretString> {
    resolve_secret(
        source.value.as_deref(),
        source.file.as_deref(),
        source.env_var.as_deref(),
    )
}

/// Checks if at least one secret source is configured (non-empty).
pub fn has_secret_source(source: &SecretSource) -> bool {
    source.value.as_deref().is_some_and(|s| !s.is_empty())
        || source.file.as_deref().is_some_and(|s| !s.is_empty())
        || source.env_var.as_deref().is_some_and(|s| !s.is_empty())
}

impl Credentials {
    /// Resolves both login credentials, reporting which one is missing.
    pub fn resolve(
        config: &CredentialsConfig,
    ) -> std::result::Result<Self, crate::error::AuthError> {
        use crate::error::AuthError;

        let email = resolve_source(&config.email).map_err(|source| {
            AuthError::MissingCredential {
                name: "email",
                source,
            }
        })?;
        let password = resolve_source(&config.password).map_err(|source| {
            AuthError::MissingCredential {
                name: "password",
                source,
            }
        })?;

        Ok(Self { email, password })
    }
}

fn non_empty(raw: &str) -> Result<SecretString> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SecretError::Empty);
    }
    Ok(SecretString::from(trimmed.to_string()))
}

/// Expands a leading `~` to the current user's home directory.
///
/// `~user/path` is not supported.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy();
            if path == "~" {
                return home.into_owned();
            }
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source(value: Option<&str>, file: Option<&str>, env_var: Option<&str>) -> SecretSource {
        SecretSource {
            value: value.map(String::from),
            file: file.map(String::from),
            env_var: env_var.map(String::from),
        }
    }

    // Tests that modify environment variables must run serially
    #[test]
    #[serial]
    fn test_direct_value_takes_priority() {
        std::env::set_var("LINKREACH_TEST_SECRET_1", "env_value");
        let result =
            resolve_secret(Some("direct_value"), None, Some("LINKREACH_TEST_SECRET_1")).unwrap();
        assert_eq!(result.expose_secret(), "direct_value");
        std::env::remove_var("LINKREACH_TEST_SECRET_1");
    }

    #[test]
    #[serial]
    fn test_file_takes_priority_over_env() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "file_value").unwrap();

        std::env::set_var("LINKREACH_TEST_SECRET_2", "env_value");
        let result = resolve_secret(
            None,
            Some(temp_file.path().to_str().unwrap()),
            Some("LINKREACH_TEST_SECRET_2"),
        )
        .unwrap();
        assert_eq!(result.expose_secret(), "file_value");
        std::env::remove_var("LINKREACH_TEST_SECRET_2");
    }

    #[test]
    #[serial]
    fn test_env_var_fallback() {
        std::env::set_var("LINKREACH_TEST_SECRET_3", "  env_value\n");
        let result = resolve_secret(None, None, Some("LINKREACH_TEST_SECRET_3")).unwrap();
        assert_eq!(result.expose_secret(), "env_value");
        std::env::remove_var("LINKREACH_TEST_SECRET_3");
    }

    #[test]
    fn test_no_source_error() {
        let result = resolve_secret(None, None, None);
        assert!(matches!(result, Err(SecretError::NoSourceProvided)));
    }

    #[test]
    fn test_whitespace_only_file_is_empty() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "   ").unwrap();

        let result = resolve_secret(None, Some(temp_file.path().to_str().unwrap()), None);
        assert!(matches!(result, Err(SecretError::Empty)));
    }

    #[test]
    fn test_file_not_found_error() {
        let result = resolve_secret(None, Some("/nonexistent/path/to/secret"), None);
        assert!(matches!(result, Err(SecretError::FileReadError { .. })));
    }

    #[test]
    fn test_env_var_not_set_error() {
        let result = resolve_secret(None, None, Some("LINKREACH_DEFINITELY_NOT_SET_12345"));
        assert!(matches!(result, Err(SecretError::EnvVarNotSet { .. })));
    }

    #[test]
    fn test_has_secret_source() {
        assert!(has_secret_source(&source(Some("value"), None, None)));
        assert!(has_secret_source(&source(None, Some("/path"), None)));
        assert!(has_secret_source(&source(None, None, Some("ENV_VAR"))));
        assert!(!has_secret_source(&source(None, None, None)));
        assert!(!has_secret_source(&source(Some(""), Some(""), Some(""))));
    }

    #[test]
    #[serial]
    fn test_credentials_report_missing_password() {
        std::env::set_var("LINKREACH_TEST_EMAIL", "me@example.com");
        std::env::remove_var("LINKREACH_TEST_PASSWORD");
        let config = CredentialsConfig {
            email: source(None, None, Some("LINKREACH_TEST_EMAIL")),
            password: source(None, None, Some("LINKREACH_TEST_PASSWORD")),
        };

        let err = Credentials::resolve(&config).unwrap_err();
        match err {
            crate::error::AuthError::MissingCredential { name, .. } => {
                assert_eq!(name, "password")
            }
            other => panic!("unexpected error: {other}"),
        }
        std::env::remove_var("LINKREACH_TEST_EMAIL");
    }

    #[test]
    #[serial]
    fn test_credentials_debug_is_redacted() {
        let config = CredentialsConfig {
            email: source(Some("me@example.com"), None, None),
            password: source(Some("hunter2"), None, None),
        };
        let creds = Credentials::resolve(&config).unwrap();
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("me@example.com"));
    }

    #[test]
    #[serial]
    fn test_expand_home() {
        assert_eq!(expand_home("/absolute/path"), "/absolute/path");
        assert_eq!(expand_home("relative/path"), "relative/path");

        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy().into_owned();
            assert_eq!(expand_home("~/test"), format!("{}/test", home));
            assert_eq!(expand_home("~"), home);
        }
    }
}

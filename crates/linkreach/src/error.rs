use std::path::PathBuf;
use thiserror::Error;

use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum LinkreachError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Browser driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid marker rule '{name}': {reason}")]
    InvalidMarkerRule { name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record store not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read record store '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse record store '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize records for '{path}': {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write record store '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to replace '{to}' with '{from}': {source}")]
    Replace {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Record store '{path}' is inconsistent: {reason}")]
    Inconsistent { path: PathBuf, reason: String },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error("No record with serial number {0}")]
    UnknownSerial(u32),
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("WebDriver request to '{endpoint}' failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("WebDriver command failed ({status}): {error}: {message}")]
    Command {
        status: u16,
        error: String,
        message: String,
    },

    #[error("Element is no longer attached to the page: {0}")]
    StaleElement(String),

    #[error("Unexpected WebDriver response: {0}")]
    InvalidResponse(String),

    #[error("Browser session has already been closed")]
    SessionClosed,

    #[error("Scripted failure: {0}")]
    Scripted(String),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing credential '{name}': {source}")]
    MissingCredential {
        name: &'static str,
        #[source]
        source: SecretError,
    },

    #[error("Login did not complete: {reason}")]
    LoginFailed { reason: String },

    #[error("Login form interaction failed: {0}")]
    Driver(#[from] DriverError),
}

pub type Result<T> = std::result::Result<T, LinkreachError>;

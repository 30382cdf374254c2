//! Environment variable parsing utilities for configuration.

use crate::errors::Error;
use std::path::PathBuf;

use super::paths;

/// Parse environment variable as a path, expanding tilde.
fn parse_env_path(name: &str, value: &str) -> Result<PathBuf, Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} cannot be empty")));
    }
    Ok(paths::expand_tilde_path(&PathBuf::from(value)))
}

/// Parse environment variable as a byte count.
fn parse_env_bytes(name: &str, value: &str) -> Result<usize, Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} cannot be empty")));
    }
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {name} value: {e}")))
}

/// Apply ORBIT_DATABASE_PATH environment variable override.
pub fn apply_database_path_override(database_path: &mut PathBuf) -> Result<(), Error> {
    if let Ok(val) = std::env::var("ORBIT_DATABASE_PATH") {
        *database_path = parse_env_path("ORBIT_DATABASE_PATH", &val)?;
    }
    Ok(())
}

/// Apply ORBIT_MODEL_CACHE environment variable override.
pub fn apply_model_cache_override(model_cache: &mut PathBuf) -> Result<(), Error> {
    if let Ok(val) = std::env::var("ORBIT_MODEL_CACHE") {
        *model_cache = parse_env_path("ORBIT_MODEL_CACHE", &val)?;
    }
    Ok(())
}

/// Apply ORBIT_STORAGE_QUOTA_BYTES environment variable override.
pub fn apply_storage_quota_override(storage_quota_bytes: &mut usize) -> Result<(), Error> {
    if let Ok(val) = std::env::var("ORBIT_STORAGE_QUOTA_BYTES") {
        *storage_quota_bytes = parse_env_bytes("ORBIT_STORAGE_QUOTA_BYTES", &val)?;
    }
    Ok(())
}

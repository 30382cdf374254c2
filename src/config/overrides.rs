//! Environment variable overrides for configuration.

use crate::errors::Error;
use std::path::PathBuf;

use super::env_parser;

/// Apply environment variable overrides to configuration.
pub fn apply_env_overrides(
    database_path: &mut PathBuf,
    model_cache: &mut PathBuf,
    storage_quota_bytes: &mut usize,
) -> Result<(), Error> {
    env_parser::apply_database_path_override(database_path)?;
    env_parser::apply_model_cache_override(model_cache)?;
    env_parser::apply_storage_quota_override(storage_quota_bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests_utils::{cleanup_env_vars, set_env_var, ENV_MUTEX};
    use super::*;

    const VARS: [&str; 3] = [
        "ORBIT_DATABASE_PATH",
        "ORBIT_MODEL_CACHE",
        "ORBIT_STORAGE_QUOTA_BYTES",
    ];

    fn defaults() -> (PathBuf, PathBuf, usize) {
        (PathBuf::from("/default/memory.db"), PathBuf::from("/default/cache"), 64)
    }

    #[test]
    fn test_env_var_overrides_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars(&VARS);

        set_env_var("ORBIT_DATABASE_PATH", "/custom/path/memory.db");
        set_env_var("ORBIT_MODEL_CACHE", "/custom/cache");
        set_env_var("ORBIT_STORAGE_QUOTA_BYTES", "0");

        let (mut database_path, mut model_cache, mut quota) = defaults();
        apply_env_overrides(&mut database_path, &mut model_cache, &mut quota).unwrap();

        assert_eq!(database_path, PathBuf::from("/custom/path/memory.db"));
        assert_eq!(model_cache, PathBuf::from("/custom/cache"));
        assert_eq!(quota, 0);

        cleanup_env_vars(&VARS);
    }

    #[test]
    fn test_unset_vars_leave_values_alone() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars(&VARS);

        let (mut database_path, mut model_cache, mut quota) = defaults();
        apply_env_overrides(&mut database_path, &mut model_cache, &mut quota).unwrap();

        assert_eq!((database_path, model_cache, quota), defaults());
    }

    #[test]
    fn test_invalid_quota_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars(&VARS);

        set_env_var("ORBIT_STORAGE_QUOTA_BYTES", "five megabytes");

        let (mut database_path, mut model_cache, mut quota) = defaults();
        let result = apply_env_overrides(&mut database_path, &mut model_cache, &mut quota);
        assert!(matches!(result, Err(Error::Config(_))));

        cleanup_env_vars(&VARS);
    }

    #[test]
    fn test_whitespace_env_var_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars(&VARS);

        set_env_var("ORBIT_MODEL_CACHE", "   ");

        let (mut database_path, mut model_cache, mut quota) = defaults();
        let result = apply_env_overrides(&mut database_path, &mut model_cache, &mut quota);
        assert!(matches!(result, Err(Error::Config(_))));

        cleanup_env_vars(&VARS);
    }
}

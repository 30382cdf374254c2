//! Configuration validation logic.

use crate::errors::Error;
use std::path::PathBuf;

/// Validates configuration values.
pub struct ConfigValidator {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,
    /// Directory for downloaded models.
    pub model_cache: PathBuf,
}

impl ConfigValidator {
    /// Validate all configuration values.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the database path or model cache is empty,
    /// or if the database path names a directory.
    pub fn validate(&self) -> Result<(), Error> {
        self.validate_database_path()?;
        self.validate_model_cache()?;

        Ok(())
    }

    fn validate_database_path(&self) -> Result<(), Error> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }
        if self.database_path.is_dir() {
            return Err(Error::Config(format!(
                "Database path {} is a directory",
                self.database_path.display()
            )));
        }

        Ok(())
    }

    fn validate_model_cache(&self) -> Result<(), Error> {
        if self.model_cache.as_os_str().is_empty() {
            return Err(Error::Config("Model cache cannot be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        let validator = ConfigValidator {
            database_path: PathBuf::from("/test/memory.db"),
            model_cache: PathBuf::from("/test/models"),
        };
        assert!(validator.validate().is_ok());
    }

    #[test]
    fn test_empty_database_path_rejected() {
        let validator = ConfigValidator {
            database_path: PathBuf::new(),
            model_cache: PathBuf::from("/test/models"),
        };
        assert!(matches!(validator.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_model_cache_rejected() {
        let validator = ConfigValidator {
            database_path: PathBuf::from("/test/memory.db"),
            model_cache: PathBuf::new(),
        };
        assert!(matches!(validator.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_directory_database_path_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let validator = ConfigValidator {
            database_path: dir.path().to_path_buf(),
            model_cache: PathBuf::from("/test/models"),
        };
        assert!(matches!(validator.validate(), Err(Error::Config(_))));
    }
}

use anyhow::{format_err, Error};
use derive_more::{Display, Error as DeriveError};
use stack_string::StackString;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_DB_PATH: &str = "app.db";
pub const DEFAULT_BACKUP_DIR: &str = "backups";
pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";

#[derive(Display, DeriveError, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[display("{name} environment variable is required.")]
    MissingVariable { name: &'static str },
    #[display("Database file '{}' not found.", path.display())]
    MissingSource { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub gcs_bucket: StackString,
    pub backup_dir: StackString,
    pub gcs_endpoint: Url,
    pub temp_dir: PathBuf,
}

impl Config {
    /// Precedence for the source path is argument, then `DB_PATH`, then `app.db`.
    ///
    /// # Errors
    /// Return error if `GCS_BUCKET` is unset or `GCS_ENDPOINT` is not a url
    pub fn from_lookup<F>(db_path: Option<PathBuf>, lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gcs_bucket: StackString = lookup("GCS_BUCKET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingVariable { name: "GCS_BUCKET" })?
            .into();
        let db_path = db_path
            .or_else(|| lookup("DB_PATH").filter(|s| !s.is_empty()).map(Into::into))
            .unwrap_or_else(|| DEFAULT_DB_PATH.into());
        let backup_dir = lookup("BACKUP_DIR")
            .map_or_else(|| DEFAULT_BACKUP_DIR.into(), Into::into);
        let endpoint = lookup("GCS_ENDPOINT").unwrap_or_else(|| DEFAULT_GCS_ENDPOINT.into());
        let gcs_endpoint: Url = endpoint
            .parse()
            .map_err(|e| format_err!("GCS_ENDPOINT {endpoint} is not a valid url: {e}"))?;
        let temp_dir = lookup("TMPDIR")
            .filter(|s| !s.is_empty())
            .map_or_else(std::env::temp_dir, Into::into);
        Ok(Self {
            db_path,
            gcs_bucket,
            backup_dir,
            gcs_endpoint,
            temp_dir,
        })
    }

    /// # Errors
    /// Return error if the source database does not exist
    pub fn check_source(&self) -> Result<(), ConfigError> {
        if self.db_path.exists() {
            Ok(())
        } else {
            Err(ConfigError::MissingSource {
                path: self.db_path.clone(),
            })
        }
    }
}

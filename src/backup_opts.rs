use anyhow::{Context, Error};
use clap::Parser;
use log::{debug, error, info};
use stack_string::StackString;
use std::{ffi::OsString, path::PathBuf};
use time::OffsetDateTime;
use tokio::task::spawn_blocking;

use crate::{
    backup_key,
    config::Config,
    s3_instance::{ObjectStore, S3Instance},
    sqlite_backup::snapshot_database,
};

const ENVIRONMENT_HELP: &str = "Environment:
  GCS_BUCKET             destination bucket (required)
  DB_PATH                database used when no path is given (default app.db)
  BACKUP_DIR             object key prefix (default backups)
  GCS_ENDPOINT           storage endpoint (default https://storage.googleapis.com)
  AWS_ACCESS_KEY_ID      GCS HMAC access id
  AWS_SECRET_ACCESS_KEY  GCS HMAC secret";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Snapshot a sqlite database and upload it to Google Cloud Storage",
    after_help = ENVIRONMENT_HELP
)]
pub struct BackupOpts {
    /// Database to back up, overrides `DB_PATH` (default app.db)
    #[arg(allow_hyphen_values = true)]
    pub db_path: Option<PathBuf>,
}

impl BackupOpts {
    /// Parse command line arguments; `--help` and `--version` print and exit 0,
    /// any other parse failure is returned.
    ///
    /// # Errors
    /// Return error if the arguments are invalid
    pub fn from_args<I, T>(args: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(opts) => Ok(opts),
            Err(e) if e.exit_code() == 0 => e.exit(),
            Err(e) => Err(e.into()),
        }
    }

    /// # Errors
    /// Return error if configuration is incomplete or the backup fails
    pub async fn process_args() -> Result<(), Error> {
        Self::process_args_from(std::env::args_os(), |key| std::env::var(key).ok()).await
    }

    /// # Errors
    /// Return error if configuration is incomplete or the backup fails
    pub async fn process_args_from<I, T, F>(args: I, lookup: F) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
        F: Fn(&str) -> Option<String>,
    {
        let opts = Self::from_args(args)?;
        let config = Config::from_lookup(opts.db_path, lookup)?;
        debug!("{config:?}");
        let s3 = S3Instance::new(&config.gcs_endpoint).await;
        run_backup(&config, &s3, OffsetDateTime::now_utc()).await?;
        Ok(())
    }
}

/// Log a failed run and map it to the process exit status.
#[must_use]
pub fn exit_code(result: &Result<(), Error>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{e:?}");
            1
        }
    }
}

/// Snapshot `config.db_path` and upload it under a key stamped with `now`.
///
/// Returns the key of the uploaded object. The local snapshot lives in a
/// temporary file that is removed on every return path.
///
/// # Errors
/// Return error if the source is missing, or the snapshot or upload fails
pub async fn run_backup(
    config: &Config,
    store: &impl ObjectStore,
    now: OffsetDateTime,
) -> Result<StackString, Error> {
    config.check_source()?;
    let key = backup_key(&config.backup_dir, now)?;
    info!("Starting backup of {}...", config.db_path.display());

    snapshot_and_upload(config, store, &key)
        .await
        .context("An unexpected error occurred during backup")?;

    info!("Upload complete.");
    Ok(key)
}

async fn snapshot_and_upload(
    config: &Config,
    store: &impl ObjectStore,
    key: &str,
) -> Result<(), Error> {
    let tempfile = tempfile::Builder::new()
        .prefix("app_")
        .suffix(".db")
        .tempfile_in(&config.temp_dir)?;
    let temp_path = tempfile.path().to_path_buf();

    let source = config.db_path.clone();
    let destination = temp_path.clone();
    spawn_blocking(move || snapshot_database(&source, &destination)).await??;
    info!("Local backup created at {}", temp_path.display());

    info!("Uploading to gs://{}/{key}...", config.gcs_bucket);
    store.upload(&config.gcs_bucket, key, &temp_path).await?;

    tempfile.close()?;
    Ok(())
}

#![allow(clippy::module_name_repetitions)]

pub mod backup_opts;
pub mod config;
pub mod s3_instance;
pub mod sqlite_backup;

use anyhow::Error;
use stack_string::{format_sstr, StackString};
use time::{macros::format_description, OffsetDateTime};

/// Join remote key segments with `/` regardless of the host path separator.
#[must_use]
pub fn posix_join(prefix: &str, name: &str) -> StackString {
    if prefix.is_empty() || name.starts_with('/') {
        name.into()
    } else if prefix.ends_with('/') {
        format_sstr!("{prefix}{name}")
    } else {
        format_sstr!("{prefix}/{name}")
    }
}

/// Remote object key for a backup started at `now`, e.g.
/// `backups/app_2024-03-01T12-00-00Z.db`.
///
/// # Errors
/// Return error if the timestamp cannot be formatted
pub fn backup_key(prefix: &str, now: OffsetDateTime) -> Result<StackString, Error> {
    let name = now.format(format_description!(
        "app_[year]-[month]-[day]T[hour]-[minute]-[second]Z.db"
    ))?;
    Ok(posix_join(prefix, &name))
}

//! Consistent copies of a live sqlite database using the online backup API.

use anyhow::Error;
use log::debug;
use rusqlite::{
    backup::{Backup, Progress},
    Connection, OpenFlags,
};
use std::{path::Path, time::Duration};

const PAGES_PER_STEP: i32 = 100;
const PAUSE_BETWEEN_STEPS: Duration = Duration::from_millis(10);

fn log_progress(progress: Progress) {
    debug!(
        "backup progress {}/{} pages remaining",
        progress.remaining, progress.pagecount
    );
}

/// Copy every page of `source` into `destination` while holding sqlite's
/// read consistency against concurrent writers.
///
/// The source is never created: a missing file is an error. Both connections
/// are closed before returning, and close failures are reported.
///
/// # Errors
/// Return error if either database cannot be opened, the backup fails, or a
/// connection fails to close
pub fn snapshot_database(source: &Path, destination: &Path) -> Result<(), Error> {
    let src = Connection::open_with_flags(
        source,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    let mut dst = Connection::open(destination)?;
    {
        let backup = Backup::new(&src, &mut dst)?;
        backup.run_to_completion(PAGES_PER_STEP, PAUSE_BETWEEN_STEPS, Some(log_progress))?;
    }
    dst.close().map_err(|(_, e)| e)?;
    src.close().map_err(|(_, e)| e)?;
    Ok(())
}

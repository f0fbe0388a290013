use env_logger::{Builder, Env};
use std::io::Write;

use sqlite_gcs_backup::backup_opts::{exit_code, BackupOpts};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    let result = BackupOpts::process_args().await;
    std::process::exit(exit_code(&result));
}

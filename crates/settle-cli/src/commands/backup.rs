use crate::commands::{print_json, Context};
use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use settle_store::error::StoreError;
use settle_store::paths;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Destination file (defaults to a timestamped file under the data dir)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct BackupReport {
    output: String,
    size_bytes: u64,
    schema_version: i64,
    bookings: i64,
    activities: i64,
}

pub fn backup(ctx: &Context<'_>, args: BackupArgs) -> Result<()> {
    let out = match args.out {
        Some(path) => path,
        None => paths::backup_path().with_context(|| "resolve backup path")?,
    };

    let summary = ctx.store.backup_to(&out).map_err(|err| {
        let message = match err {
            StoreError::InvalidBackupPath(_) => {
                format!("backup path points at the live database: {}", out.display())
            }
            _ => format!("backup database to {}", out.display()),
        };
        anyhow::Error::new(err).context(message)
    })?;

    if ctx.json {
        return print_json(&BackupReport {
            output: out.display().to_string(),
            size_bytes: summary.size_bytes,
            schema_version: summary.schema_version,
            bookings: summary.bookings,
            activities: summary.activities,
        });
    }

    println!(
        "Backup written to {} ({} bytes, {} bookings, {} activities)",
        out.display(),
        summary.size_bytes,
        summary.bookings,
        summary.activities
    );
    Ok(())
}

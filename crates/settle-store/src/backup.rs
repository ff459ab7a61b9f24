use crate::db;
use crate::error::{Result, StoreError};
use crate::migrate;
use crate::paths;
use rusqlite::backup::Backup;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PAGES_PER_STEP: i32 = 128;
const PAUSE_BETWEEN_STEPS: Duration = Duration::from_millis(20);

/// What a finished snapshot holds, read back from the snapshot itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSummary {
    pub path: PathBuf,
    pub schema_version: i64,
    pub bookings: i64,
    pub activities: i64,
    pub size_bytes: u64,
}

/// Online copy of the live database. Writers keep running; the backup
/// restarts its page walk if one commits mid-copy. The snapshot is then
/// reopened and checked before it is reported; a snapshot that fails the
/// check is removed.
pub fn backup_to(conn: &Connection, path: &Path) -> Result<BackupSummary> {
    paths::ensure_parent_dir(path)?;
    let target = absolute_target(path)?;
    if let Some(live) = live_db_file(conn)? {
        refuse_live_files(&target, &live, path)?;
    }

    let mut dest = Connection::open(&target)?;
    {
        let backup = Backup::new(conn, &mut dest)?;
        backup.run_to_completion(PAGES_PER_STEP, PAUSE_BETWEEN_STEPS, None)?;
    }
    let checked = verify_snapshot(conn, &dest);
    drop(dest);
    let (schema_version, bookings, activities) = match checked {
        Ok(counts) => counts,
        Err(err) => {
            tracing::warn!(path = %target.display(), error = %err, "discarding bad backup");
            fs::remove_file(&target)?;
            return Err(err);
        }
    };

    db::restrict_db_permissions(&target)?;
    let size_bytes = fs::metadata(&target)?.len();
    tracing::debug!(
        path = %target.display(),
        bookings,
        activities,
        "backup written"
    );
    Ok(BackupSummary {
        path: target,
        schema_version,
        bookings,
        activities,
        size_bytes,
    })
}

/// Integrity check plus schema match against the live database. Returns
/// the snapshot's schema version and its booking and activity counts.
fn verify_snapshot(live: &Connection, snapshot: &Connection) -> Result<(i64, i64, i64)> {
    let integrity: String =
        snapshot.query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;
    if integrity != "ok" {
        return Err(StoreError::InvalidData(format!(
            "backup failed integrity check: {}",
            integrity
        )));
    }

    let expected = migrate::schema_version(live)?;
    let found = migrate::schema_version(snapshot)?;
    if found != expected {
        return Err(StoreError::InvalidData(format!(
            "backup schema version {} does not match database version {}",
            found, expected
        )));
    }
    if found == 0 {
        return Ok((0, 0, 0));
    }

    let bookings = snapshot.query_row("SELECT COUNT(*) FROM bookings;", [], |row| row.get(0))?;
    let activities =
        snapshot.query_row("SELECT COUNT(*) FROM booking_activities;", [], |row| {
            row.get(0)
        })?;
    Ok((found, bookings, activities))
}

fn refuse_live_files(target: &Path, live: &Path, requested: &Path) -> Result<()> {
    let live = fs::canonicalize(live)?;
    let mut wal = live.as_os_str().to_owned();
    wal.push("-wal");
    let mut shm = live.as_os_str().to_owned();
    shm.push("-shm");

    let clashes = target == live
        || target == Path::new(&wal)
        || target == Path::new(&shm)
        || same_inode(target, &live)?;
    if clashes {
        return Err(StoreError::InvalidBackupPath(requested.to_path_buf()));
    }
    Ok(())
}

fn absolute_target(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(fs::canonicalize(path)?);
    }
    let file_name = path
        .file_name()
        .ok_or_else(|| StoreError::InvalidBackupPath(path.to_path_buf()))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(fs::canonicalize(parent)?.join(file_name))
}

fn live_db_file(conn: &Connection) -> Result<Option<PathBuf>> {
    let mut stmt = conn.prepare("PRAGMA database_list;")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        let file: String = row.get(2)?;
        if name == "main" && !file.is_empty() {
            return Ok(Some(PathBuf::from(file)));
        }
    }
    Ok(None)
}

#[cfg(unix)]
fn same_inode(a: &Path, b: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;
    if !a.exists() || !b.exists() {
        return Ok(false);
    }
    let (a, b) = (fs::metadata(a)?, fs::metadata(b)?);
    Ok(a.dev() == b.dev() && a.ino() == b.ino())
}

#[cfg(not(unix))]
fn same_inode(_a: &Path, _b: &Path) -> Result<bool> {
    Ok(false)
}

use crate::error::{Result, StoreError};
use crate::repo::{parse_booking_id, parse_evidence_kind, parse_upload_id};
use rusqlite::{params, Connection, OptionalExtension};
use settle_core::domain::{blob_path, BookingId, EvidenceKind, UploadId};
use tracing::debug;

/// A reserved blob path. Staged uploads become committed when a transition
/// that references them is written; the rest are orphans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub id: UploadId,
    pub booking_id: BookingId,
    pub kind: EvidenceKind,
    pub position: usize,
    pub blob_path: String,
    pub staged_at: i64,
    pub committed_at: Option<i64>,
}

impl Upload {
    pub fn is_committed(&self) -> bool {
        self.committed_at.is_some()
    }
}

pub struct UploadsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> UploadsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Reserves `count` deterministic blob paths for one evidence pair.
    /// Re-staging a path resets it to uncommitted.
    pub fn stage(
        &self,
        now_utc: i64,
        booking_id: BookingId,
        kind: EvidenceKind,
        count: usize,
        prefix: &str,
    ) -> Result<Vec<Upload>> {
        if self.conn.is_autocommit() {
            let tx = self.conn.unchecked_transaction()?;
            let staged = stage_inner(&tx, now_utc, booking_id, kind, count, prefix)?;
            tx.commit()?;
            Ok(staged)
        } else {
            stage_inner(self.conn, now_utc, booking_id, kind, count, prefix)
        }
    }

    pub fn get(&self, id: UploadId) -> Result<Option<Upload>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, booking_id, kind, position, blob_path, staged_at, committed_at
             FROM uploads WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(upload_from_row(row)?)),
            None => Ok(None),
        }
    }

    pub fn list_for_booking(&self, booking_id: BookingId) -> Result<Vec<Upload>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, booking_id, kind, position, blob_path, staged_at, committed_at
             FROM uploads
             WHERE booking_id = ?1
             ORDER BY kind ASC, position ASC;",
        )?;
        let mut rows = stmt.query([booking_id.to_string()])?;
        let mut uploads = Vec::new();
        while let Some(row) = rows.next()? {
            uploads.push(upload_from_row(row)?);
        }
        Ok(uploads)
    }

    /// Staged uploads never committed and staged at or before `older_than`.
    pub fn orphaned(&self, older_than: i64) -> Result<Vec<Upload>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, booking_id, kind, position, blob_path, staged_at, committed_at
             FROM uploads
             WHERE committed_at IS NULL AND staged_at <= ?1
             ORDER BY staged_at ASC, blob_path ASC;",
        )?;
        let mut rows = stmt.query([older_than])?;
        let mut uploads = Vec::new();
        while let Some(row) = rows.next()? {
            uploads.push(upload_from_row(row)?);
        }
        Ok(uploads)
    }

    pub fn discard(&self, id: UploadId) -> Result<Upload> {
        let upload = self
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if upload.is_committed() {
            return Err(StoreError::UploadCommitted(upload.blob_path));
        }
        self.conn.execute(
            "DELETE FROM uploads WHERE id = ?1 AND committed_at IS NULL;",
            [id.to_string()],
        )?;
        debug!(upload = %id, path = %upload.blob_path, "staged upload discarded");
        Ok(upload)
    }
}

fn stage_inner(
    conn: &Connection,
    now_utc: i64,
    booking_id: BookingId,
    kind: EvidenceKind,
    count: usize,
    prefix: &str,
) -> Result<Vec<Upload>> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM bookings WHERE id = ?1;",
            [booking_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(StoreError::NotFound(booking_id.to_string()));
    }

    let mut staged = Vec::with_capacity(count);
    for position in 0..count {
        let path = blob_path(prefix, kind, booking_id, position);
        conn.execute(
            "INSERT INTO uploads (id, booking_id, kind, position, blob_path, staged_at, committed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)
             ON CONFLICT (blob_path) DO UPDATE
             SET staged_at = excluded.staged_at, committed_at = NULL;",
            params![
                UploadId::new().to_string(),
                booking_id.to_string(),
                kind.as_str(),
                position as i64,
                path,
                now_utc,
            ],
        )?;
        let mut stmt = conn.prepare(
            "SELECT id, booking_id, kind, position, blob_path, staged_at, committed_at
             FROM uploads WHERE blob_path = ?1;",
        )?;
        let mut rows = stmt.query([path.as_str()])?;
        if let Some(row) = rows.next()? {
            staged.push(upload_from_row(row)?);
        }
    }
    debug!(booking = %booking_id, kind = %kind, count, "uploads staged");
    Ok(staged)
}

/// Marks the staged uploads behind `urls` as committed. A URL matches an
/// upload when it is the blob path or ends with `/<blob path>`.
pub(crate) fn commit_paths(
    conn: &Connection,
    booking_id: BookingId,
    urls: &[String],
    now_utc: i64,
) -> Result<usize> {
    let mut committed = 0;
    for url in urls {
        committed += conn.execute(
            "UPDATE uploads SET committed_at = ?3
             WHERE booking_id = ?1
               AND committed_at IS NULL
               AND (blob_path = ?2 OR substr(?2, -length(blob_path) - 1) = '/' || blob_path);",
            params![booking_id.to_string(), url, now_utc],
        )?;
    }
    Ok(committed)
}

fn upload_from_row(row: &rusqlite::Row<'_>) -> Result<Upload> {
    let id: String = row.get(0)?;
    let booking_id: String = row.get(1)?;
    let kind: String = row.get(2)?;
    let position: i64 = row.get(3)?;
    Ok(Upload {
        id: parse_upload_id(&id)?,
        booking_id: parse_booking_id(&booking_id)?,
        kind: parse_evidence_kind(&kind)?,
        position: usize::try_from(position)
            .map_err(|_| StoreError::InvalidData(format!("upload position {}", position)))?,
        blob_path: row.get(4)?,
        staged_at: row.get(5)?,
        committed_at: row.get(6)?,
    })
}

use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use crate::util::{parse_booking_id, parse_upload_id};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use settle_core::domain::{BookingId, EvidenceKind, UploadId};
use settle_core::time::{format_timestamp_datetime, now_utc};
use settle_store::repo::Upload;
use std::str::FromStr;

#[derive(Debug, Subcommand)]
pub enum UploadCommand {
    /// Reserve blob paths for an evidence pair
    Stage(StageArgs),
    /// Uploads recorded for a booking
    List(ListUploadsArgs),
    /// Staged uploads no transition has referenced
    Orphans(OrphansArgs),
    /// Drop a staged upload that was never committed
    Discard(DiscardArgs),
}

#[derive(Debug, Args)]
pub struct StageArgs {
    pub booking_id: String,
    /// settler-evidence, incompletion-report, cooldown-report, cancellation, ...
    #[arg(long)]
    pub kind: String,
    #[arg(long, default_value_t = 1)]
    pub count: usize,
}

#[derive(Debug, Args)]
pub struct ListUploadsArgs {
    pub booking_id: String,
}

#[derive(Debug, Args)]
pub struct OrphansArgs {
    /// Only uploads staged at least this many hours ago
    #[arg(long)]
    pub older_than_hours: Option<i64>,
}

#[derive(Debug, Args)]
pub struct DiscardArgs {
    pub id: String,
}

#[derive(Debug, Serialize)]
struct UploadDto {
    id: UploadId,
    booking_id: BookingId,
    kind: EvidenceKind,
    position: usize,
    blob_path: String,
    staged_at: i64,
    committed_at: Option<i64>,
}

impl From<Upload> for UploadDto {
    fn from(upload: Upload) -> Self {
        Self {
            id: upload.id,
            booking_id: upload.booking_id,
            kind: upload.kind,
            position: upload.position,
            blob_path: upload.blob_path,
            staged_at: upload.staged_at,
            committed_at: upload.committed_at,
        }
    }
}

pub fn run(ctx: &Context<'_>, cmd: UploadCommand) -> Result<()> {
    match cmd {
        UploadCommand::Stage(args) => stage(ctx, args),
        UploadCommand::List(args) => list(ctx, args),
        UploadCommand::Orphans(args) => orphans(ctx, args),
        UploadCommand::Discard(args) => discard(ctx, args),
    }
}

fn stage(ctx: &Context<'_>, args: StageArgs) -> Result<()> {
    let booking_id = parse_booking_id(&args.booking_id)?;
    let kind = EvidenceKind::from_str(args.kind.trim())
        .map_err(|_| invalid_input(format!("unknown evidence kind: {}", args.kind)))?;
    let max = ctx.config.lifecycle.max_evidence_images;
    if args.count == 0 || args.count > max {
        return Err(invalid_input(format!(
            "count must be between 1 and {}",
            max
        )));
    }

    let staged = ctx.store.uploads().stage(
        now_utc(),
        booking_id,
        kind,
        args.count,
        &ctx.config.uploads.blob_prefix,
    )?;
    print_uploads(ctx, staged)
}

fn list(ctx: &Context<'_>, args: ListUploadsArgs) -> Result<()> {
    let booking_id = parse_booking_id(&args.booking_id)?;
    ctx.store.bookings().require(booking_id)?;
    let uploads = ctx.store.uploads().list_for_booking(booking_id)?;
    print_uploads(ctx, uploads)
}

fn orphans(ctx: &Context<'_>, args: OrphansArgs) -> Result<()> {
    let after_secs = match args.older_than_hours {
        Some(hours) if hours < 0 => {
            return Err(invalid_input("--older-than-hours cannot be negative"));
        }
        Some(hours) => hours * 3_600,
        None => ctx.config.uploads.orphan_after_secs(),
    };
    let uploads = ctx
        .store
        .uploads()
        .orphaned(now_utc().saturating_sub(after_secs))?;
    print_uploads(ctx, uploads)
}

fn discard(ctx: &Context<'_>, args: DiscardArgs) -> Result<()> {
    let id = parse_upload_id(&args.id)?;
    let upload = ctx.store.uploads().discard(id)?;
    if ctx.json {
        return print_json(&UploadDto::from(upload));
    }
    println!("discarded {}", upload.blob_path);
    Ok(())
}

fn print_uploads(ctx: &Context<'_>, uploads: Vec<Upload>) -> Result<()> {
    if ctx.json {
        let dtos: Vec<UploadDto> = uploads.into_iter().map(UploadDto::from).collect();
        return print_json(&dtos);
    }
    for upload in uploads {
        let state = match upload.committed_at {
            Some(ts) => format!("committed {}", format_timestamp_datetime(ts)),
            None => format!("staged {}", format_timestamp_datetime(upload.staged_at)),
        };
        println!("{}  {}  {}", upload.id, upload.blob_path, state);
    }
    Ok(())
}

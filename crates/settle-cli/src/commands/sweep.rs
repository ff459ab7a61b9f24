use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use settle_core::domain::BookingId;
use settle_core::time::{now_utc, parse_local_timestamp};
use tracing::info;

#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Evaluate deadlines as of this earlier local time (`YYYY-MM-DD HH:MM`)
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Debug, Serialize)]
struct SweepReport {
    as_of: i64,
    completed: Vec<BookingId>,
}

pub fn sweep(ctx: &Context<'_>, args: SweepArgs) -> Result<()> {
    let now = now_utc();
    let as_of = match args.at {
        Some(value) => parse_local_timestamp(&value)?,
        None => now,
    };
    if as_of > now {
        return Err(invalid_input("--at cannot be in the future"));
    }
    let policy = ctx.config.lifecycle.policy();
    let completed = ctx.store.bookings().sweep_cooldowns(as_of, &policy)?;
    info!(count = completed.len(), "cooldown sweep finished");

    if ctx.json {
        return print_json(&SweepReport { as_of, completed });
    }
    if completed.is_empty() {
        println!("no cooldown windows have run out");
    }
    for id in completed {
        println!("completed {}", id);
    }
    Ok(())
}

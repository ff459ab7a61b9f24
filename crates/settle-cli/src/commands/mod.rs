use anyhow::Result;
use serde::Serialize;
use settle_config::AppConfig;
use settle_store::Store;
use std::io::{self, Write};

pub mod backup;
pub mod bookings;
pub mod completions;
pub mod lifecycle;
pub mod reviews;
pub mod sweep;
pub mod uploads;

pub struct Context<'a> {
    pub store: &'a Store,
    pub json: bool,
    pub config: &'a AppConfig,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

mod commands;
mod error;
mod util;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{
    backup, bookings, completions, lifecycle, reviews, sweep, uploads, Context,
};
use crate::error::{exit_code_for, report_error};
use settle_config as config;
use settle_store::{paths, Store};

#[derive(Debug, Parser)]
#[command(name = "settle", version, about = "settle booking lifecycle CLI")]
pub(crate) struct Cli {
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Backup(backup::BackupArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
    /// Create a booking in status 0 (new)
    Create(bookings::CreateArgs),
    Show(bookings::ShowArgs),
    List(bookings::ListArgs),
    Timeline(bookings::TimelineArgs),
    /// Actions the given actor may take right now
    Actions(bookings::ActionsArgs),
    /// Settler expresses interest while the booking is new
    Accept(lifecycle::AcceptArgs),
    /// Customer picks one acceptor (0 -> 1)
    Select(lifecycle::SelectArgs),
    /// Settler enters the service start code (1 -> 2)
    Start(lifecycle::StartArgs),
    /// Settler ends the service (2 -> 3)
    End(lifecycle::PlainArgs),
    /// Settler submits completion evidence (3 -> 4)
    Evidence(lifecycle::EvidenceArgs),
    /// Customer confirms completion (4 -> 5)
    Confirm(lifecycle::PlainArgs),
    #[command(name = "report-incomplete")]
    ReportIncomplete(lifecycle::EvidenceArgs),
    #[command(name = "update-incomplete")]
    UpdateIncomplete(lifecycle::EvidenceArgs),
    #[command(name = "resolve-incomplete")]
    ResolveIncomplete(lifecycle::PlainArgs),
    #[command(name = "reject-incomplete")]
    RejectIncomplete(lifecycle::RemarkArgs),
    #[command(name = "incomplete-evidence")]
    IncompleteEvidence(lifecycle::EvidenceArgs),
    /// Close an elapsed cooldown window (5 -> 6)
    Complete(lifecycle::PlainArgs),
    #[command(name = "report-cooldown")]
    ReportCooldown(lifecycle::EvidenceArgs),
    #[command(name = "update-cooldown")]
    UpdateCooldown(lifecycle::EvidenceArgs),
    #[command(name = "resolve-cooldown")]
    ResolveCooldown(lifecycle::PlainArgs),
    #[command(name = "reject-cooldown")]
    RejectCooldown(lifecycle::RemarkArgs),
    #[command(name = "cooldown-evidence")]
    CooldownEvidence(lifecycle::EvidenceArgs),
    Review(lifecycle::ReviewArgs),
    #[command(name = "propose-quote")]
    ProposeQuote(lifecycle::ProposeQuoteArgs),
    #[command(name = "accept-quote")]
    AcceptQuote(lifecycle::PlainArgs),
    #[command(name = "reject-quote")]
    RejectQuote(lifecycle::PlainArgs),
    Cancel(lifecycle::CancelArgs),
    /// Reviews and rating summary for a settler
    Reviews(reviews::ReviewsArgs),
    /// Complete bookings whose cooldown window has run out
    #[command(name = "sweep-cooldowns")]
    SweepCooldowns(sweep::SweepArgs),
    #[command(subcommand)]
    Uploads(uploads::UploadCommand),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        db_path,
        config: config_path,
        json,
        verbose,
        command,
    } = cli;

    let command = match command {
        Command::Completions(args) => return completions::emit(args),
        command => command,
    };

    let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) if path.exists() => debug!(path = %path.display(), "config resolved"),
            Ok(path) => debug!(path = %path.display(), "config missing, using defaults"),
            Err(err) => debug!(error = %err, "config unavailable"),
        }
    }

    let db_path = paths::resolve_db_path(db_path).with_context(|| "resolve database path")?;
    debug!(path = %db_path.display(), "database path resolved");

    let store =
        Store::open(&db_path).with_context(|| format!("open database {}", db_path.display()))?;
    store.migrate().with_context(|| "run migrations")?;

    let ctx = Context {
        store: &store,
        json,
        config: &app_config,
    };
    dispatch(&ctx, command)
}

fn dispatch(ctx: &Context<'_>, command: Command) -> Result<()> {
    match command {
        Command::Completions(args) => completions::emit(args),
        Command::Backup(args) => backup::backup(ctx, args),
        Command::Create(args) => bookings::create(ctx, args),
        Command::Show(args) => bookings::show(ctx, args),
        Command::List(args) => bookings::list(ctx, args),
        Command::Timeline(args) => bookings::timeline(ctx, args),
        Command::Actions(args) => bookings::actions(ctx, args),
        Command::Accept(args) => lifecycle::accept(ctx, args),
        Command::Select(args) => lifecycle::select(ctx, args),
        Command::Start(args) => lifecycle::start(ctx, args),
        Command::End(args) => lifecycle::end(ctx, args),
        Command::Evidence(args) => lifecycle::submit_evidence(ctx, args),
        Command::Confirm(args) => lifecycle::confirm(ctx, args),
        Command::ReportIncomplete(args) => lifecycle::report_incomplete(ctx, args),
        Command::UpdateIncomplete(args) => lifecycle::update_incomplete(ctx, args),
        Command::ResolveIncomplete(args) => lifecycle::resolve_incomplete(ctx, args),
        Command::RejectIncomplete(args) => lifecycle::reject_incomplete(ctx, args),
        Command::IncompleteEvidence(args) => lifecycle::incomplete_evidence(ctx, args),
        Command::Complete(args) => lifecycle::complete(ctx, args),
        Command::ReportCooldown(args) => lifecycle::report_cooldown(ctx, args),
        Command::UpdateCooldown(args) => lifecycle::update_cooldown(ctx, args),
        Command::ResolveCooldown(args) => lifecycle::resolve_cooldown(ctx, args),
        Command::RejectCooldown(args) => lifecycle::reject_cooldown(ctx, args),
        Command::CooldownEvidence(args) => lifecycle::cooldown_evidence(ctx, args),
        Command::Review(args) => lifecycle::review(ctx, args),
        Command::ProposeQuote(args) => lifecycle::propose_quote(ctx, args),
        Command::AcceptQuote(args) => lifecycle::accept_quote(ctx, args),
        Command::RejectQuote(args) => lifecycle::reject_quote(ctx, args),
        Command::Cancel(args) => lifecycle::cancel(ctx, args),
        Command::Reviews(args) => reviews::reviews(ctx, args),
        Command::SweepCooldowns(args) => sweep::sweep(ctx, args),
        Command::Uploads(cmd) => uploads::run(ctx, cmd),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use crate::util::{
    parse_actor, parse_addon, parse_booking_id, parse_expectation, parse_manual_quote,
    parse_user_id,
};
use anyhow::Result;
use clap::Args;
use settle_core::domain::Evidence;
use settle_core::dto::TransitionDto;
use settle_core::rules::{BookingEvent, TransitionRequest};
use settle_core::time::now_utc;

/// Flags shared by every lifecycle command.
#[derive(Debug, Args)]
pub struct TransitionArgs {
    pub id: String,
    /// `customer:<id>`, `settler:<id>` or `system`
    #[arg(long)]
    pub actor: String,
    /// Fail unless the booking is still at this status code
    #[arg(long)]
    pub expect_status: Option<String>,
    /// Fail unless the booking is still at this version
    #[arg(long)]
    pub expect_version: Option<i64>,
    /// Idempotency key; repeating it returns the committed result
    #[arg(long)]
    pub request_id: Option<String>,
}

#[derive(Debug, Args)]
pub struct PlainArgs {
    #[command(flatten)]
    pub target: TransitionArgs,
}

#[derive(Debug, Args)]
pub struct AcceptArgs {
    #[command(flatten)]
    pub target: TransitionArgs,
    /// Display name shown to the customer
    #[arg(long)]
    pub name: String,
}

#[derive(Debug, Args)]
pub struct SelectArgs {
    #[command(flatten)]
    pub target: TransitionArgs,
    #[arg(long)]
    pub settler: String,
}

#[derive(Debug, Args)]
pub struct StartArgs {
    #[command(flatten)]
    pub target: TransitionArgs,
    #[arg(long)]
    pub code: String,
}

#[derive(Debug, Args)]
pub struct EvidenceArgs {
    #[command(flatten)]
    pub target: TransitionArgs,
    /// Repeatable image URL or blob path
    #[arg(long = "image")]
    pub images: Vec<String>,
    #[arg(long)]
    pub remark: Option<String>,
}

impl EvidenceArgs {
    fn split(self) -> (TransitionArgs, Evidence) {
        let evidence = Evidence::new(self.images, self.remark.unwrap_or_default());
        (self.target, evidence)
    }
}

#[derive(Debug, Args)]
pub struct RemarkArgs {
    #[command(flatten)]
    pub target: TransitionArgs,
    #[arg(long)]
    pub remark: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReviewArgs {
    #[command(flatten)]
    pub target: TransitionArgs,
    /// 1 to 5
    #[arg(long)]
    pub rating: u8,
    #[arg(long, default_value = "")]
    pub comment: String,
}

#[derive(Debug, Args)]
pub struct ProposeQuoteArgs {
    #[command(flatten)]
    pub target: TransitionArgs,
    /// Repeatable `name=amount`
    #[arg(long = "addon")]
    pub addons: Vec<String>,
    #[arg(long)]
    pub quote_description: Option<String>,
    #[arg(long)]
    pub quote_price: Option<String>,
}

#[derive(Debug, Args)]
pub struct CancelArgs {
    #[command(flatten)]
    pub target: TransitionArgs,
    /// Repeatable; at least one is required
    #[arg(long = "reason")]
    pub reasons: Vec<String>,
    #[arg(long = "image")]
    pub images: Vec<String>,
    #[arg(long)]
    pub remark: Option<String>,
}

pub fn accept(ctx: &Context<'_>, args: AcceptArgs) -> Result<()> {
    let event = BookingEvent::ExpressInterest {
        display_name: args.name,
    };
    execute(ctx, args.target, event)
}

pub fn select(ctx: &Context<'_>, args: SelectArgs) -> Result<()> {
    let settler_id = parse_user_id(&args.settler)?;
    execute(ctx, args.target, BookingEvent::SelectSettler { settler_id })
}

pub fn start(ctx: &Context<'_>, args: StartArgs) -> Result<()> {
    let event = BookingEvent::StartService { code: args.code };
    execute(ctx, args.target, event)
}

pub fn end(ctx: &Context<'_>, args: PlainArgs) -> Result<()> {
    execute(ctx, args.target, BookingEvent::EndService)
}

pub fn submit_evidence(ctx: &Context<'_>, args: EvidenceArgs) -> Result<()> {
    let (target, evidence) = args.split();
    execute(ctx, target, BookingEvent::SubmitEvidence { evidence })
}

pub fn confirm(ctx: &Context<'_>, args: PlainArgs) -> Result<()> {
    execute(ctx, args.target, BookingEvent::ConfirmCompletion)
}

pub fn report_incomplete(ctx: &Context<'_>, args: EvidenceArgs) -> Result<()> {
    let (target, evidence) = args.split();
    execute(ctx, target, BookingEvent::ReportIncompletion { evidence })
}

pub fn update_incomplete(ctx: &Context<'_>, args: EvidenceArgs) -> Result<()> {
    let (target, evidence) = args.split();
    execute(ctx, target, BookingEvent::UpdateIncompletionReport { evidence })
}

pub fn resolve_incomplete(ctx: &Context<'_>, args: PlainArgs) -> Result<()> {
    execute(ctx, args.target, BookingEvent::ResolveIncompletion)
}

pub fn reject_incomplete(ctx: &Context<'_>, args: RemarkArgs) -> Result<()> {
    let event = BookingEvent::RejectIncompletion {
        remark: args.remark,
    };
    execute(ctx, args.target, event)
}

pub fn incomplete_evidence(ctx: &Context<'_>, args: EvidenceArgs) -> Result<()> {
    let (target, evidence) = args.split();
    execute(
        ctx,
        target,
        BookingEvent::SubmitIncompletionEvidence { evidence },
    )
}

pub fn complete(ctx: &Context<'_>, args: PlainArgs) -> Result<()> {
    execute(ctx, args.target, BookingEvent::CompleteCooldown)
}

pub fn report_cooldown(ctx: &Context<'_>, args: EvidenceArgs) -> Result<()> {
    let (target, evidence) = args.split();
    execute(ctx, target, BookingEvent::ReportCooldownIssue { evidence })
}

pub fn update_cooldown(ctx: &Context<'_>, args: EvidenceArgs) -> Result<()> {
    let (target, evidence) = args.split();
    execute(ctx, target, BookingEvent::UpdateCooldownReport { evidence })
}

pub fn resolve_cooldown(ctx: &Context<'_>, args: PlainArgs) -> Result<()> {
    execute(ctx, args.target, BookingEvent::ResolveCooldownReport)
}

pub fn reject_cooldown(ctx: &Context<'_>, args: RemarkArgs) -> Result<()> {
    let event = BookingEvent::RejectCooldownReport {
        remark: args.remark,
    };
    execute(ctx, args.target, event)
}

pub fn cooldown_evidence(ctx: &Context<'_>, args: EvidenceArgs) -> Result<()> {
    let (target, evidence) = args.split();
    execute(ctx, target, BookingEvent::SubmitCooldownEvidence { evidence })
}

pub fn review(ctx: &Context<'_>, args: ReviewArgs) -> Result<()> {
    let event = BookingEvent::SubmitReview {
        rating: args.rating,
        comment: args.comment,
    };
    execute(ctx, args.target, event)
}

pub fn propose_quote(ctx: &Context<'_>, args: ProposeQuoteArgs) -> Result<()> {
    let addons = args
        .addons
        .iter()
        .map(|raw| parse_addon(raw))
        .collect::<Result<Vec<_>>>()?;
    let manual_quote = parse_manual_quote(args.quote_description, args.quote_price.as_deref())?;
    execute(
        ctx,
        args.target,
        BookingEvent::ProposeQuote {
            addons,
            manual_quote,
        },
    )
}

pub fn accept_quote(ctx: &Context<'_>, args: PlainArgs) -> Result<()> {
    execute(ctx, args.target, BookingEvent::AcceptQuote)
}

pub fn reject_quote(ctx: &Context<'_>, args: PlainArgs) -> Result<()> {
    execute(ctx, args.target, BookingEvent::RejectQuote)
}

pub fn cancel(ctx: &Context<'_>, args: CancelArgs) -> Result<()> {
    let evidence = Evidence::new(args.images, args.remark.unwrap_or_default());
    let event = BookingEvent::Cancel {
        reasons: args.reasons,
        evidence,
    };
    execute(ctx, args.target, event)
}

fn execute(ctx: &Context<'_>, target: TransitionArgs, event: BookingEvent) -> Result<()> {
    let id = parse_booking_id(&target.id)?;
    let actor = parse_actor(&target.actor)?;
    let expected = parse_expectation(target.expect_status.as_deref(), target.expect_version)?;
    let action = event.action();

    let mut request = TransitionRequest::new(actor, event);
    if let Some(request_id) = target.request_id {
        let request_id = request_id.trim();
        if request_id.is_empty() {
            return Err(invalid_input("request id cannot be empty"));
        }
        request = request.with_request_id(request_id);
    }
    if let Some(expected) = expected {
        request = request.expecting(expected);
    }

    let policy = ctx.config.lifecycle.policy();
    let committed = ctx
        .store
        .bookings()
        .transition(now_utc(), id, request, &policy)?;

    let dto = TransitionDto {
        booking_id: committed.booking.id,
        action,
        from: committed.from,
        to: committed.activity.status,
        activity_id: committed.activity.id,
        activity: committed.activity.kind,
        version: committed.booking.version,
        replayed: committed.replayed,
    };
    if ctx.json {
        return print_json(&dto);
    }

    let suffix = if dto.replayed { " (already applied)" } else { "" };
    if dto.from == dto.to {
        println!(
            "{}: {} at {}{}",
            dto.booking_id,
            committed.activity.kind.label(),
            dto.to,
            suffix
        );
    } else {
        println!(
            "{}: {} -> {}{}",
            dto.booking_id,
            dto.from.code(),
            dto.to,
            suffix
        );
    }
    if let Some(review) = committed.review {
        println!("review {} recorded ({}/5)", review.id, review.rating);
    }
    Ok(())
}

use crate::commands::{print_json, Context};
use crate::error::not_found;
use crate::util::{
    parse_actor, parse_addon, parse_amount, parse_booking_id, parse_manual_quote, parse_status,
    parse_user_id,
};
use anyhow::Result;
use clap::Args;
use settle_core::domain::{Actor, Booking};
use settle_core::dto::{AllowedActionsDto, BookingListItemDto, TimelineEntryDto};
use settle_core::rules::{allowed_actions, cooldown_deadline, format_cents, timeline};
use settle_core::time::{format_duration_secs, format_timestamp_datetime, now_utc};
use settle_store::repo::{BookingNew, BookingQuery};

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub customer: String,
    /// Base price, e.g. `49.90`
    #[arg(long)]
    pub base_price: String,
    /// Repeatable `name=amount`
    #[arg(long = "addon")]
    pub addons: Vec<String>,
    #[arg(long)]
    pub quote_description: Option<String>,
    #[arg(long)]
    pub quote_price: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Status code, e.g. `2` or `8.1`
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub customer: Option<String>,
    #[arg(long)]
    pub settler: Option<String>,
}

#[derive(Debug, Args)]
pub struct TimelineArgs {
    pub id: String,
    #[arg(long)]
    pub newest_first: bool,
}

#[derive(Debug, Args)]
pub struct ActionsArgs {
    pub id: String,
    /// `customer:<id>`, `settler:<id>` or `system`
    #[arg(long)]
    pub actor: String,
}

pub fn create(ctx: &Context<'_>, args: CreateArgs) -> Result<()> {
    let customer_id = parse_user_id(&args.customer)?;
    let base_price_cents = parse_amount(&args.base_price)?;
    let addons = args
        .addons
        .iter()
        .map(|raw| parse_addon(raw))
        .collect::<Result<Vec<_>>>()?;
    let manual_quote = parse_manual_quote(args.quote_description, args.quote_price.as_deref())?;

    let booking = ctx.store.bookings().create(
        now_utc(),
        BookingNew {
            customer_id,
            base_price_cents,
            addons,
            manual_quote,
        },
    )?;

    if ctx.json {
        print_json(&BookingListItemDto::from(&booking))
    } else {
        println!(
            "created booking {} ({})",
            booking.id,
            format_cents(booking.pricing.total_cents)
        );
        Ok(())
    }
}

pub fn show(ctx: &Context<'_>, args: ShowArgs) -> Result<()> {
    let id = parse_booking_id(&args.id)?;
    let booking = ctx
        .store
        .bookings()
        .get(id)?
        .ok_or_else(|| not_found(format!("booking {}", id)))?;
    if ctx.json {
        return print_json(&booking);
    }
    print_booking(ctx, &booking);
    Ok(())
}

fn print_booking(ctx: &Context<'_>, booking: &Booking) {
    println!("id: {}", booking.id);
    println!("status: {}", booking.status);
    if let Some(role) = booking.status.awaiting() {
        println!("awaiting: {}", role);
    }
    println!("customer: {}", booking.customer_id);
    if let Some(settler) = &booking.settler_id {
        println!("settler: {}", settler);
    }
    if !booking.acceptors.is_empty() {
        let names: Vec<String> = booking
            .acceptors
            .iter()
            .map(|acceptor| format!("{} ({})", acceptor.display_name, acceptor.settler_id))
            .collect();
        println!("acceptors: {}", names.join(", "));
    }
    if let Some(code) = &booking.service_start_code {
        println!("start code: {}", code);
    }

    println!("base: {}", format_cents(booking.pricing.base_price_cents));
    for addon in &booking.pricing.addons {
        println!("  + {} {}", addon.name, format_cents(addon.price_cents));
    }
    if let Some(quote) = &booking.pricing.manual_quote {
        println!("  + {} {}", quote.description, format_cents(quote.price_cents));
    }
    println!("total: {}", format_cents(booking.pricing.total_cents));
    if let Some(proposal) = &booking.pending_quote {
        println!(
            "pending quote: {} (back to {} if rejected)",
            format_cents(proposal.total_cents),
            proposal.previous_status.code()
        );
    }

    let cooldown_secs = ctx.config.lifecycle.policy().cooldown_secs;
    if let Some(deadline) = cooldown_deadline(booking, cooldown_secs) {
        let remaining = deadline - now_utc();
        if remaining > 0 {
            println!(
                "cooldown ends: {} (in {})",
                format_timestamp_datetime(deadline),
                format_duration_secs(remaining)
            );
        } else {
            println!("cooldown ended: {}", format_timestamp_datetime(deadline));
        }
    }

    if let Some(cancellation) = &booking.cancellation {
        println!(
            "cancelled by {}: {}",
            cancellation.cancelled_by,
            cancellation.reasons.join("; ")
        );
    }
    println!("version: {}", booking.version);
    println!("updated: {}", format_timestamp_datetime(booking.updated_at));
}

pub fn list(ctx: &Context<'_>, args: ListArgs) -> Result<()> {
    let query = BookingQuery {
        status: args.status.as_deref().map(parse_status).transpose()?,
        customer_id: args.customer.as_deref().map(parse_user_id).transpose()?,
        settler_id: args.settler.as_deref().map(parse_user_id).transpose()?,
    };
    let bookings = ctx.store.bookings().list(&query)?;
    let items: Vec<BookingListItemDto> = bookings.iter().map(BookingListItemDto::from).collect();

    if ctx.json {
        return print_json(&items);
    }
    for item in items {
        let settler = item
            .settler_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<5} {:<28} {:>10}  customer={} settler={}",
            item.id,
            item.status.code(),
            item.status_label,
            format_cents(item.total_cents),
            item.customer_id,
            settler
        );
    }
    Ok(())
}

pub fn timeline(ctx: &Context<'_>, args: TimelineArgs) -> Result<()> {
    let id = parse_booking_id(&args.id)?;
    let booking = ctx.store.bookings().require(id)?;
    let entries: Vec<TimelineEntryDto> = if args.newest_first {
        timeline::newest_first(&booking.timeline)
            .map(TimelineEntryDto::from)
            .collect()
    } else {
        booking.timeline.iter().map(TimelineEntryDto::from).collect()
    };

    if ctx.json {
        return print_json(&entries);
    }
    for entry in entries {
        let actor = match &entry.actor_id {
            Some(id) => format!("{} {}", entry.actor, id),
            None => entry.actor.to_string(),
        };
        match &entry.note {
            Some(note) => println!(
                "{}  {:<5} {} [{}] {}",
                format_timestamp_datetime(entry.created_at),
                entry.status.code(),
                entry.label,
                actor,
                note
            ),
            None => println!(
                "{}  {:<5} {} [{}]",
                format_timestamp_datetime(entry.created_at),
                entry.status.code(),
                entry.label,
                actor
            ),
        }
    }
    Ok(())
}

pub fn actions(ctx: &Context<'_>, args: ActionsArgs) -> Result<()> {
    let id = parse_booking_id(&args.id)?;
    let actor = parse_actor(&args.actor)?;
    let booking = ctx.store.bookings().require(id)?;

    // Customers only act on their own bookings.
    let actions = match &actor {
        Actor::Customer(user) if !booking.is_owner(user) => Vec::new(),
        Actor::Settler(user) => {
            allowed_actions(booking.status, actor.role(), booking.is_assigned_settler(user))
        }
        _ => allowed_actions(booking.status, actor.role(), false),
    };

    let dto = AllowedActionsDto {
        booking_id: booking.id,
        status: booking.status,
        awaiting: booking.status.awaiting(),
        actions,
    };
    if ctx.json {
        return print_json(&dto);
    }
    if dto.actions.is_empty() {
        println!("no actions available for {} at {}", actor, dto.status);
        return Ok(());
    }
    for action in dto.actions {
        println!("{}", action);
    }
    Ok(())
}

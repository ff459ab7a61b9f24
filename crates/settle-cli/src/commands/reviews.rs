use crate::commands::{print_json, Context};
use crate::util::parse_user_id;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use settle_core::domain::Review;
use settle_core::time::format_timestamp_datetime;

#[derive(Debug, Args)]
pub struct ReviewsArgs {
    #[arg(long)]
    pub settler: String,
}

#[derive(Debug, Serialize)]
struct SettlerReviews {
    settler_id: String,
    count: i64,
    average: Option<f64>,
    reviews: Vec<Review>,
}

pub fn reviews(ctx: &Context<'_>, args: ReviewsArgs) -> Result<()> {
    let settler_id = parse_user_id(&args.settler)?;
    let repo = ctx.store.reviews();
    let summary = repo.summary_for_settler(&settler_id)?;
    let reviews = repo.list_for_settler(&settler_id)?;

    if ctx.json {
        return print_json(&SettlerReviews {
            settler_id: settler_id.to_string(),
            count: summary.map(|s| s.count).unwrap_or(0),
            average: summary.map(|s| s.average),
            reviews,
        });
    }

    match summary {
        Some(summary) => println!(
            "{}: {:.1}/5 from {} review(s)",
            settler_id, summary.average, summary.count
        ),
        None => {
            println!("{}: no reviews yet", settler_id);
            return Ok(());
        }
    }
    for review in reviews {
        if review.comment.is_empty() {
            println!(
                "  {}  {}/5  booking {}",
                format_timestamp_datetime(review.created_at),
                review.rating,
                review.booking_id
            );
        } else {
            println!(
                "  {}  {}/5  booking {}  {}",
                format_timestamp_datetime(review.created_at),
                review.rating,
                review.booking_id,
                review.comment
            );
        }
    }
    Ok(())
}

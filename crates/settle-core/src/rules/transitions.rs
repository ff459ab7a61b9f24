//! Booking lifecycle transitions.
//!
//! ```text
//!  0 new ──select──> 1 accepted ──start──> 2 in service ──end──> 3 ended
//!                      │  ▲                  │  ▲                  │
//!                      └─>7 quote update <───┘  └──────────────────┤
//!                                                                 evidence
//!                                                                  ▼
//!        8 / 8.1 incomplete <──report── 4 awaiting confirmation <──┘
//!          │ resolve -> 8.2 ──evidence──> 4        │ confirm
//!          └ reject ───────────────────────> 4     ▼
//!        9 / 9.1 report <──────report──── 5 cooldown ──elapsed──> 6 completed
//!          │ resolve -> 9.2 ──evidence──> 5
//!          └ reject ───────────────────────> 5
//!
//!  any non-terminal ──cancel──> 11 / 11.1 / 11.2
//! ```
//!
//! [`apply`] is pure: it validates the request against the current booking
//! and returns the next booking together with the appended activity. Callers
//! persist the result in one commit.

use crate::domain::{
    Acceptor, ActivityId, ActivityKind, Actor, Addon, Booking, BookingActivity, BookingStatus,
    Cancellation, DisputeStage, Evidence, ManualQuote, QuoteProposal, Review, ReviewId, UserId,
};
use crate::domain::review::validate_rating;
use crate::error::CoreError;
use crate::rules::actions::BookingAction;
use crate::rules::cooldown::{cooldown_ends_at, DEFAULT_COOLDOWN_HOURS};
use crate::rules::money::{compute_total, format_cents};
use crate::rules::timeline;
use uuid::Uuid;

pub const DEFAULT_MAX_EVIDENCE_IMAGES: usize = 6;
pub const MAX_EVIDENCE_IMAGES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub cooldown_secs: i64,
    pub max_evidence_images: usize,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_COOLDOWN_HOURS * 3_600,
            max_evidence_images: DEFAULT_MAX_EVIDENCE_IMAGES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingEvent {
    ExpressInterest { display_name: String },
    SelectSettler { settler_id: UserId },
    StartService { code: String },
    EndService,
    SubmitEvidence { evidence: Evidence },
    ConfirmCompletion,
    ReportIncompletion { evidence: Evidence },
    UpdateIncompletionReport { evidence: Evidence },
    ResolveIncompletion,
    RejectIncompletion { remark: Option<String> },
    SubmitIncompletionEvidence { evidence: Evidence },
    CompleteCooldown,
    ReportCooldownIssue { evidence: Evidence },
    UpdateCooldownReport { evidence: Evidence },
    ResolveCooldownReport,
    RejectCooldownReport { remark: Option<String> },
    SubmitCooldownEvidence { evidence: Evidence },
    SubmitReview { rating: u8, comment: String },
    ProposeQuote {
        addons: Vec<Addon>,
        manual_quote: Option<ManualQuote>,
    },
    AcceptQuote,
    RejectQuote,
    Cancel {
        reasons: Vec<String>,
        evidence: Evidence,
    },
}

impl BookingEvent {
    pub fn action(&self) -> BookingAction {
        match self {
            BookingEvent::ExpressInterest { .. } => BookingAction::ExpressInterest,
            BookingEvent::SelectSettler { .. } => BookingAction::SelectSettler,
            BookingEvent::StartService { .. } => BookingAction::StartService,
            BookingEvent::EndService => BookingAction::EndService,
            BookingEvent::SubmitEvidence { .. } => BookingAction::SubmitEvidence,
            BookingEvent::ConfirmCompletion => BookingAction::ConfirmCompletion,
            BookingEvent::ReportIncompletion { .. } => BookingAction::ReportIncompletion,
            BookingEvent::UpdateIncompletionReport { .. } => {
                BookingAction::UpdateIncompletionReport
            }
            BookingEvent::ResolveIncompletion => BookingAction::ResolveIncompletion,
            BookingEvent::RejectIncompletion { .. } => BookingAction::RejectIncompletion,
            BookingEvent::SubmitIncompletionEvidence { .. } => {
                BookingAction::SubmitIncompletionEvidence
            }
            BookingEvent::CompleteCooldown => BookingAction::CompleteCooldown,
            BookingEvent::ReportCooldownIssue { .. } => BookingAction::ReportCooldownIssue,
            BookingEvent::UpdateCooldownReport { .. } => BookingAction::UpdateCooldownReport,
            BookingEvent::ResolveCooldownReport => BookingAction::ResolveCooldownReport,
            BookingEvent::RejectCooldownReport { .. } => BookingAction::RejectCooldownReport,
            BookingEvent::SubmitCooldownEvidence { .. } => BookingAction::SubmitCooldownEvidence,
            BookingEvent::SubmitReview { .. } => BookingAction::SubmitReview,
            BookingEvent::ProposeQuote { .. } => BookingAction::ProposeQuote,
            BookingEvent::AcceptQuote => BookingAction::AcceptQuote,
            BookingEvent::RejectQuote => BookingAction::RejectQuote,
            BookingEvent::Cancel { .. } => BookingAction::Cancel,
        }
    }

    /// Image URLs carried by the event, used to commit staged uploads.
    pub fn image_urls(&self) -> &[String] {
        match self {
            BookingEvent::SubmitEvidence { evidence }
            | BookingEvent::ReportIncompletion { evidence }
            | BookingEvent::UpdateIncompletionReport { evidence }
            | BookingEvent::SubmitIncompletionEvidence { evidence }
            | BookingEvent::ReportCooldownIssue { evidence }
            | BookingEvent::UpdateCooldownReport { evidence }
            | BookingEvent::SubmitCooldownEvidence { evidence }
            | BookingEvent::Cancel { evidence, .. } => &evidence.image_urls,
            _ => &[],
        }
    }
}

/// What the caller believed about the booking when it issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    Status(BookingStatus),
    Version(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub actor: Actor,
    pub event: BookingEvent,
    pub request_id: Option<String>,
    pub expected: Option<Expectation>,
}

impl TransitionRequest {
    pub fn new(actor: Actor, event: BookingEvent) -> Self {
        Self {
            actor,
            event,
            request_id: None,
            expected: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn expecting(mut self, expected: Expectation) -> Self {
        self.expected = Some(expected);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: BookingStatus,
    pub booking: Booking,
    pub activity: BookingActivity,
    pub review: Option<Review>,
}

pub fn check_expectation(booking: &Booking, expected: Expectation) -> Result<(), CoreError> {
    match expected {
        Expectation::Status(status) if status != booking.status => {
            Err(CoreError::StaleTransition {
                expected: format!("status {}", status.code()),
                actual: format!("status {}", booking.status.code()),
            })
        }
        Expectation::Version(version) if version != booking.version => {
            Err(CoreError::StaleTransition {
                expected: format!("version {}", version),
                actual: format!("version {}", booking.version),
            })
        }
        _ => Ok(()),
    }
}

/// The entry already committed under `request`'s idempotency key. A key
/// reused by another caller or for another action is refused.
pub fn replay<'a>(
    booking: &'a Booking,
    request: &TransitionRequest,
) -> Result<Option<&'a BookingActivity>, CoreError> {
    let Some(activity) = timeline::find_replay(booking, request.request_id.as_deref()) else {
        return Ok(None);
    };
    let action = request.event.action();
    authorize(booking, &request.actor, action)?;
    let same_caller = activity.actor == request.actor.role()
        && activity.actor_id.as_ref() == request.actor.user_id();
    if !same_caller || !action.records(activity.kind) {
        let key = request.request_id.clone().unwrap_or_default();
        return Err(CoreError::RequestIdReused(key));
    }
    Ok(Some(activity))
}

pub fn apply(
    booking: &Booking,
    request: TransitionRequest,
    policy: &LifecyclePolicy,
    now_utc: i64,
) -> Result<Transition, CoreError> {
    let TransitionRequest {
        actor,
        event,
        request_id,
        expected,
    } = request;

    if let Some(expected) = expected {
        check_expectation(booking, expected)?;
    }

    let action = event.action();
    let from = booking.status;
    if !action.allowed_from(from) {
        return Err(CoreError::InvalidStateTransition {
            action,
            status: from,
        });
    }
    authorize(booking, &actor, action)?;

    let mut next = booking.clone();
    let mut review = None;
    let max_images = policy.max_evidence_images;

    let (kind, status, note) = match event {
        BookingEvent::ExpressInterest { display_name } => {
            let settler_id = acting_user(&actor, action)?.clone();
            if booking.acceptor(&settler_id).is_some() {
                return Err(CoreError::AlreadyAcceptor(settler_id.to_string()));
            }
            let display_name = match display_name.trim() {
                "" => settler_id.to_string(),
                name => name.to_string(),
            };
            next.acceptors.push(Acceptor {
                settler_id,
                display_name: display_name.clone(),
                accepted_at: now_utc,
            });
            (ActivityKind::SettlerAccept, BookingStatus::New, Some(display_name))
        }
        BookingEvent::SelectSettler { settler_id } => {
            if booking.acceptor(&settler_id).is_none() {
                return Err(CoreError::SettlerNotAcceptor(settler_id.to_string()));
            }
            let note = Some(settler_id.to_string());
            next.settler_id = Some(settler_id);
            next.service_start_code = Some(generate_start_code());
            (ActivityKind::SettlerSelected, BookingStatus::Accepted, note)
        }
        BookingEvent::StartService { code } => {
            if booking.service_start_code.as_deref() != Some(code.trim()) {
                return Err(CoreError::InvalidServiceStartCode);
            }
            (ActivityKind::SettlerServiceStart, BookingStatus::InService, None)
        }
        BookingEvent::EndService => (
            ActivityKind::SettlerServiceEnd,
            BookingStatus::ServiceEnded,
            None,
        ),
        BookingEvent::SubmitEvidence { evidence } => {
            evidence.require_images(max_images)?;
            let kind = if from == BookingStatus::ServiceEnded {
                ActivityKind::SettlerEvidenceSubmitted
            } else {
                ActivityKind::SettlerEvidenceUpdated
            };
            let note = remark_note(&evidence);
            next.settler_evidence = Some(evidence.stamped(now_utc));
            (kind, BookingStatus::AwaitingConfirmation, note)
        }
        BookingEvent::ConfirmCompletion => {
            next.cooldown_started_at = Some(now_utc);
            (
                ActivityKind::CustomerConfirmCompletion,
                BookingStatus::Cooldown,
                None,
            )
        }
        BookingEvent::ReportIncompletion { evidence } => {
            evidence.require_remark(max_images)?;
            let note = remark_note(&evidence);
            next.incompletion_report = Some(evidence.stamped(now_utc));
            next.incompletion_resolved = None;
            next.incompletion_status = Some(ActivityKind::JobIncomplete);
            (
                ActivityKind::JobIncomplete,
                BookingStatus::Incompletion(DisputeStage::Reported),
                note,
            )
        }
        BookingEvent::UpdateIncompletionReport { evidence } => {
            evidence.require_remark(max_images)?;
            let note = remark_note(&evidence);
            next.incompletion_report = Some(evidence.stamped(now_utc));
            next.incompletion_status = Some(ActivityKind::JobIncompleteUpdated);
            (
                ActivityKind::JobIncompleteUpdated,
                BookingStatus::Incompletion(DisputeStage::Amended),
                note,
            )
        }
        BookingEvent::ResolveIncompletion => {
            next.incompletion_status = Some(ActivityKind::SettlerResolveIncompletion);
            (
                ActivityKind::SettlerResolveIncompletion,
                BookingStatus::Incompletion(DisputeStage::Resolving),
                None,
            )
        }
        BookingEvent::RejectIncompletion { remark } => {
            next.incompletion_status = Some(ActivityKind::SettlerRejectIncompletion);
            (
                ActivityKind::SettlerRejectIncompletion,
                BookingStatus::AwaitingConfirmation,
                clean_note(remark),
            )
        }
        BookingEvent::SubmitIncompletionEvidence { evidence } => {
            evidence.require_images(max_images)?;
            let note = remark_note(&evidence);
            next.incompletion_resolved = Some(evidence.stamped(now_utc));
            next.incompletion_status = Some(ActivityKind::SettlerUpdateIncompletionEvidence);
            (
                ActivityKind::SettlerUpdateIncompletionEvidence,
                BookingStatus::AwaitingConfirmation,
                note,
            )
        }
        BookingEvent::CompleteCooldown => {
            let started = booking.cooldown_started_at.unwrap_or(booking.updated_at);
            let deadline = cooldown_ends_at(started, policy.cooldown_secs);
            if now_utc < deadline {
                return Err(CoreError::CooldownNotElapsed(deadline));
            }
            (ActivityKind::BookingCompleted, BookingStatus::Completed, None)
        }
        BookingEvent::ReportCooldownIssue { evidence } => {
            evidence.require_remark(max_images)?;
            let note = remark_note(&evidence);
            next.cooldown_report = Some(evidence.stamped(now_utc));
            next.cooldown_resolved = None;
            next.cooldown_status = Some(ActivityKind::CooldownReportSubmitted);
            (
                ActivityKind::CooldownReportSubmitted,
                BookingStatus::CooldownDispute(DisputeStage::Reported),
                note,
            )
        }
        BookingEvent::UpdateCooldownReport { evidence } => {
            evidence.require_remark(max_images)?;
            let note = remark_note(&evidence);
            next.cooldown_report = Some(evidence.stamped(now_utc));
            next.cooldown_status = Some(ActivityKind::CooldownReportUpdated);
            (
                ActivityKind::CooldownReportUpdated,
                BookingStatus::CooldownDispute(DisputeStage::Amended),
                note,
            )
        }
        BookingEvent::ResolveCooldownReport => {
            next.cooldown_status = Some(ActivityKind::SettlerResolveCooldownReport);
            (
                ActivityKind::SettlerResolveCooldownReport,
                BookingStatus::CooldownDispute(DisputeStage::Resolving),
                None,
            )
        }
        BookingEvent::RejectCooldownReport { remark } => {
            next.cooldown_status = Some(ActivityKind::SettlerRejectCooldownReport);
            next.cooldown_started_at = Some(now_utc);
            (
                ActivityKind::SettlerRejectCooldownReport,
                BookingStatus::Cooldown,
                clean_note(remark),
            )
        }
        BookingEvent::SubmitCooldownEvidence { evidence } => {
            evidence.require_images(max_images)?;
            let note = remark_note(&evidence);
            next.cooldown_resolved = Some(evidence.stamped(now_utc));
            next.cooldown_status = Some(ActivityKind::SettlerUpdateCooldownReportEvidence);
            next.cooldown_started_at = Some(now_utc);
            (
                ActivityKind::SettlerUpdateCooldownReportEvidence,
                BookingStatus::Cooldown,
                note,
            )
        }
        BookingEvent::SubmitReview { rating, comment } => {
            if booking.reviewed_at.is_some() {
                return Err(CoreError::AlreadyReviewed);
            }
            let rating = validate_rating(rating)?;
            let settler_id =
                booking
                    .settler_id
                    .clone()
                    .ok_or(CoreError::InvalidStateTransition {
                        action,
                        status: from,
                    })?;
            next.reviewed_at = Some(now_utc);
            review = Some(Review {
                id: ReviewId::new(),
                booking_id: booking.id,
                customer_id: booking.customer_id.clone(),
                settler_id,
                rating,
                comment: comment.trim().to_string(),
                created_at: now_utc,
            });
            (
                ActivityKind::CustomerReviewSubmitted,
                BookingStatus::Completed,
                Some(format!("{}/5", rating)),
            )
        }
        BookingEvent::ProposeQuote {
            addons,
            manual_quote,
        } => {
            let total_cents = compute_total(
                booking.pricing.base_price_cents,
                &addons,
                manual_quote.as_ref(),
            )?;
            next.pending_quote = Some(QuoteProposal {
                addons,
                manual_quote,
                total_cents,
                previous_status: from,
                proposed_at: now_utc,
            });
            (
                ActivityKind::SettlerQuoteUpdated,
                BookingStatus::QuoteUpdate,
                Some(format_cents(total_cents)),
            )
        }
        BookingEvent::AcceptQuote => {
            let proposal = pending_quote(booking, action)?;
            next.pricing = booking
                .pricing
                .with_quote(proposal.addons.clone(), proposal.manual_quote.clone())?;
            next.pending_quote = None;
            (
                ActivityKind::CustomerAcceptQuoteUpdate,
                proposal.previous_status,
                Some(format_cents(next.pricing.total_cents)),
            )
        }
        BookingEvent::RejectQuote => {
            let proposal = pending_quote(booking, action)?;
            next.pending_quote = None;
            (
                ActivityKind::CustomerRejectQuoteUpdate,
                proposal.previous_status,
                None,
            )
        }
        BookingEvent::Cancel { reasons, evidence } => {
            let reasons: Vec<String> = reasons
                .into_iter()
                .map(|reason| reason.trim().to_string())
                .filter(|reason| !reason.is_empty())
                .collect();
            if reasons.is_empty() {
                return Err(CoreError::MissingCancelReason);
            }
            evidence.limit_images(max_images)?;
            let role = actor.role();
            let note = Some(reasons.join("; "));
            next.pending_quote = None;
            next.cancellation = Some(Cancellation {
                cancelled_by: role,
                reasons,
                evidence: evidence.stamped(now_utc),
                cancelled_at: now_utc,
            });
            (
                ActivityKind::cancelled_by(role),
                BookingStatus::Cancelled(role),
                note,
            )
        }
    };

    debug_assert!(is_legal_edge(from, status), "{from} -> {status}");

    let activity = BookingActivity {
        id: ActivityId::new(),
        kind,
        actor: actor.role(),
        actor_id: actor.user_id().cloned(),
        status,
        note,
        request_id,
        created_at: now_utc,
    };
    timeline::append(&mut next.timeline, activity.clone())?;
    next.status = status;
    next.version += 1;
    next.updated_at = now_utc;

    Ok(Transition {
        from,
        booking: next,
        activity,
        review,
    })
}

/// Every edge the lifecycle may take, including self-loops.
pub fn is_legal_edge(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;
    use DisputeStage::*;
    match (from, to) {
        (New, New) | (New, Accepted) => true,
        (Accepted, InService) | (InService, ServiceEnded) => true,
        (ServiceEnded, AwaitingConfirmation) | (AwaitingConfirmation, AwaitingConfirmation) => {
            true
        }
        (AwaitingConfirmation, Cooldown) | (AwaitingConfirmation, Incompletion(Reported)) => true,
        (Incompletion(Reported | Amended), Incompletion(Amended | Resolving)) => true,
        (Incompletion(_), AwaitingConfirmation) => true,
        (Cooldown, Completed) | (Cooldown, CooldownDispute(Reported)) => true,
        (CooldownDispute(Reported | Amended), CooldownDispute(Amended | Resolving)) => true,
        (CooldownDispute(_), Cooldown) => true,
        (Completed, Completed) => true,
        (Accepted | InService | ServiceEnded, QuoteUpdate) => true,
        (QuoteUpdate, Accepted | InService | ServiceEnded) => true,
        (from, Cancelled(_)) => !from.is_terminal(),
        _ => false,
    }
}

/// Edges that move to a lower major phase: dispute rejections/resolutions
/// and a quote update returning to where it was raised.
pub fn is_back_edge(from: BookingStatus, to: BookingStatus) -> bool {
    is_legal_edge(from, to) && !to.is_cancelled() && to.phase_rank() < from.phase_rank()
}

fn authorize(booking: &Booking, actor: &Actor, action: BookingAction) -> Result<(), CoreError> {
    let is_assigned = match actor {
        Actor::Settler(id) => booking.is_assigned_settler(id),
        _ => false,
    };
    if !action.permits_actor(actor.role(), is_assigned) {
        return Err(CoreError::NotPermitted(action));
    }
    if let Actor::Customer(id) = actor {
        if !booking.is_owner(id) {
            return Err(CoreError::NotPermitted(action));
        }
    }
    Ok(())
}

fn acting_user(actor: &Actor, action: BookingAction) -> Result<&UserId, CoreError> {
    actor.user_id().ok_or(CoreError::NotPermitted(action))
}

fn pending_quote(booking: &Booking, action: BookingAction) -> Result<&QuoteProposal, CoreError> {
    booking
        .pending_quote
        .as_ref()
        .ok_or(CoreError::InvalidStateTransition {
            action,
            status: booking.status,
        })
}

fn remark_note(evidence: &Evidence) -> Option<String> {
    if evidence.remark.is_empty() {
        None
    } else {
        Some(evidence.remark.clone())
    }
}

fn clean_note(remark: Option<String>) -> Option<String> {
    remark
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Six-digit code the customer hands to the settler on arrival.
pub fn generate_start_code() -> String {
    let value = Uuid::new_v4().as_u128() % 1_000_000;
    format!("{:06}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActorRole, Pricing};
    use crate::rules::cooldown::cooldown_deadline;

    const NOW: i64 = 1_700_000_000;

    fn customer() -> Actor {
        Actor::Customer(UserId::new("c1").unwrap())
    }

    fn settler(id: &str) -> Actor {
        Actor::Settler(UserId::new(id).unwrap())
    }

    fn new_booking() -> Booking {
        let pricing = Pricing::new(5_000, Vec::new(), None).unwrap();
        Booking::new(
            crate::domain::BookingId::new(),
            UserId::new("c1").unwrap(),
            pricing,
            NOW,
        )
    }

    fn step(booking: &Booking, actor: Actor, event: BookingEvent, at: i64) -> Booking {
        apply(
            booking,
            TransitionRequest::new(actor, event),
            &LifecyclePolicy::default(),
            at,
        )
        .expect("transition")
        .booking
    }

    fn try_step(booking: &Booking, actor: Actor, event: BookingEvent) -> Result<Booking, CoreError> {
        apply(
            booking,
            TransitionRequest::new(actor, event),
            &LifecyclePolicy::default(),
            NOW,
        )
        .map(|t| t.booking)
    }

    fn evidence(images: &[&str], remark: &str) -> Evidence {
        Evidence::new(images.iter().map(|s| s.to_string()).collect(), remark)
    }

    fn assigned_to_a() -> Booking {
        let booking = new_booking();
        let booking = step(
            &booking,
            settler("A"),
            BookingEvent::ExpressInterest {
                display_name: "Alice".to_string(),
            },
            NOW,
        );
        step(
            &booking,
            Actor::System,
            BookingEvent::SelectSettler {
                settler_id: UserId::new("A").unwrap(),
            },
            NOW + 1,
        )
    }

    fn awaiting_confirmation() -> Booking {
        let booking = assigned_to_a();
        let code = booking.service_start_code.clone().unwrap();
        let booking = step(&booking, settler("A"), BookingEvent::StartService { code }, NOW + 2);
        let booking = step(&booking, settler("A"), BookingEvent::EndService, NOW + 3);
        step(
            &booking,
            settler("A"),
            BookingEvent::SubmitEvidence {
                evidence: evidence(&["img1"], "done"),
            },
            NOW + 4,
        )
    }

    #[test]
    fn happy_path_reaches_completed() {
        let booking = awaiting_confirmation();
        assert_eq!(booking.acceptors.len(), 1);
        let booking = step(&booking, customer(), BookingEvent::ConfirmCompletion, NOW + 5);
        assert_eq!(booking.status, BookingStatus::Cooldown);
        let deadline = cooldown_deadline(&booking, LifecyclePolicy::default().cooldown_secs)
            .expect("deadline");
        let booking = step(&booking, Actor::System, BookingEvent::CompleteCooldown, deadline);

        assert_eq!(booking.status, BookingStatus::Completed);
        assert_eq!(booking.settler_id, Some(UserId::new("A").unwrap()));
        assert_eq!(booking.pricing.total_cents, 5_000);
        assert_eq!(booking.version, 7);

        let path = timeline::status_path(&booking.timeline);
        assert_eq!(
            path,
            vec![
                BookingStatus::New,
                BookingStatus::Accepted,
                BookingStatus::InService,
                BookingStatus::ServiceEnded,
                BookingStatus::AwaitingConfirmation,
                BookingStatus::Cooldown,
                BookingStatus::Completed,
            ]
        );
        let status_changes = path.windows(2).filter(|pair| pair[0] != pair[1]).count();
        assert_eq!(status_changes, 6);
        assert_eq!(
            booking.timeline[4].kind,
            ActivityKind::SettlerEvidenceSubmitted
        );
    }

    #[test]
    fn selection_generates_six_digit_code() {
        let booking = assigned_to_a();
        let code = booking.service_start_code.unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|ch| ch.is_ascii_digit()));
    }

    #[test]
    fn start_requires_matching_code() {
        let booking = assigned_to_a();
        let err = try_step(
            &booking,
            settler("A"),
            BookingEvent::StartService {
                code: "not-it".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err, CoreError::InvalidServiceStartCode);
    }

    #[test]
    fn incompletion_cycle_returns_to_confirmation() {
        let booking = awaiting_confirmation();
        let booking = step(
            &booking,
            customer(),
            BookingEvent::ReportIncompletion {
                evidence: evidence(&["bad.jpg"], "leak"),
            },
            NOW + 5,
        );
        assert_eq!(
            booking.status,
            BookingStatus::Incompletion(DisputeStage::Reported)
        );
        assert!(booking.incompletion_resolved.is_none());

        let booking = step(&booking, settler("A"), BookingEvent::ResolveIncompletion, NOW + 6);
        assert_eq!(booking.status.code(), "8.2");

        let booking = step(
            &booking,
            settler("A"),
            BookingEvent::SubmitIncompletionEvidence {
                evidence: evidence(&["fixed.jpg"], "sealed"),
            },
            NOW + 7,
        );
        assert_eq!(booking.status, BookingStatus::AwaitingConfirmation);
        assert_eq!(
            booking.incompletion_status,
            Some(ActivityKind::SettlerUpdateIncompletionEvidence)
        );
        assert_eq!(
            booking.incompletion_resolved.as_ref().unwrap().image_urls,
            vec!["fixed.jpg".to_string()]
        );
        let settler_dispute_entries = booking
            .timeline
            .iter()
            .filter(|a| {
                matches!(
                    a.kind,
                    ActivityKind::SettlerResolveIncompletion
                        | ActivityKind::SettlerUpdateIncompletionEvidence
                )
            })
            .count();
        assert_eq!(settler_dispute_entries, 2);
    }

    #[test]
    fn new_incompletion_report_clears_previous_resolution() {
        let booking = awaiting_confirmation();
        let booking = step(
            &booking,
            customer(),
            BookingEvent::ReportIncompletion {
                evidence: evidence(&[], "leak"),
            },
            NOW + 5,
        );
        let booking = step(&booking, settler("A"), BookingEvent::ResolveIncompletion, NOW + 6);
        let booking = step(
            &booking,
            settler("A"),
            BookingEvent::SubmitIncompletionEvidence {
                evidence: evidence(&["fixed.jpg"], ""),
            },
            NOW + 7,
        );
        let booking = step(
            &booking,
            customer(),
            BookingEvent::ReportIncompletion {
                evidence: evidence(&[], "still leaking"),
            },
            NOW + 8,
        );
        assert!(booking.incompletion_resolved.is_none());
        assert_eq!(booking.incompletion_status, Some(ActivityKind::JobIncomplete));
    }

    #[test]
    fn settler_rejection_returns_to_evidence_phase() {
        let booking = awaiting_confirmation();
        let booking = step(
            &booking,
            customer(),
            BookingEvent::ReportIncompletion {
                evidence: evidence(&[], "leak"),
            },
            NOW + 5,
        );
        let booking = step(
            &booking,
            customer(),
            BookingEvent::UpdateIncompletionReport {
                evidence: evidence(&["photo.jpg"], "leak under sink"),
            },
            NOW + 6,
        );
        assert_eq!(booking.status.code(), "8.1");
        let booking = step(
            &booking,
            settler("A"),
            BookingEvent::RejectIncompletion {
                remark: Some("works as agreed".to_string()),
            },
            NOW + 7,
        );
        assert_eq!(booking.status, BookingStatus::AwaitingConfirmation);
        assert!(is_back_edge(
            BookingStatus::Incompletion(DisputeStage::Amended),
            booking.status
        ));
        let booking = step(
            &booking,
            settler("A"),
            BookingEvent::SubmitEvidence {
                evidence: evidence(&["img2"], "again"),
            },
            NOW + 8,
        );
        assert_eq!(
            booking.last_activity().unwrap().kind,
            ActivityKind::SettlerEvidenceUpdated
        );
    }

    #[test]
    fn cooldown_dispute_restarts_window() {
        let booking = awaiting_confirmation();
        let booking = step(&booking, customer(), BookingEvent::ConfirmCompletion, NOW + 5);
        let booking = step(
            &booking,
            customer(),
            BookingEvent::ReportCooldownIssue {
                evidence: evidence(&[], "stain"),
            },
            NOW + 6,
        );
        assert_eq!(booking.status.code(), "9");
        let booking = step(&booking, settler("A"), BookingEvent::ResolveCooldownReport, NOW + 7);
        let booking = step(
            &booking,
            settler("A"),
            BookingEvent::SubmitCooldownEvidence {
                evidence: evidence(&["clean.jpg"], ""),
            },
            NOW + 100,
        );
        assert_eq!(booking.status, BookingStatus::Cooldown);
        assert_eq!(booking.cooldown_started_at, Some(NOW + 100));
        assert_eq!(
            booking.cooldown_status,
            Some(ActivityKind::SettlerUpdateCooldownReportEvidence)
        );
    }

    #[test]
    fn cooldown_cannot_complete_early() {
        let booking = awaiting_confirmation();
        let booking = step(&booking, customer(), BookingEvent::ConfirmCompletion, NOW + 5);
        let err = apply(
            &booking,
            TransitionRequest::new(Actor::System, BookingEvent::CompleteCooldown),
            &LifecyclePolicy::default(),
            NOW + 6,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::CooldownNotElapsed(_)));
    }

    #[test]
    fn cancel_requires_reason() {
        let booking = new_booking();
        let err = try_step(
            &booking,
            customer(),
            BookingEvent::Cancel {
                reasons: vec!["  ".to_string()],
                evidence: Evidence::default(),
            },
        )
        .unwrap_err();
        assert_eq!(err, CoreError::MissingCancelReason);
    }

    #[test]
    fn cancel_by_each_party_uses_sub_phase() {
        let booking = assigned_to_a();
        let by_settler = step(
            &booking,
            settler("A"),
            BookingEvent::Cancel {
                reasons: vec!["sick".to_string()],
                evidence: Evidence::default(),
            },
            NOW + 2,
        );
        assert_eq!(by_settler.status.code(), "11.2");
        assert_eq!(
            by_settler.last_activity().unwrap().kind,
            ActivityKind::BookingCancelledBySettler
        );

        let by_customer = step(
            &booking,
            customer(),
            BookingEvent::Cancel {
                reasons: vec!["changed plans".to_string()],
                evidence: Evidence::default(),
            },
            NOW + 2,
        );
        assert_eq!(by_customer.status.code(), "11.1");

        let by_system = step(
            &booking,
            Actor::System,
            BookingEvent::Cancel {
                reasons: vec!["expired".to_string()],
                evidence: Evidence::default(),
            },
            NOW + 2,
        );
        assert_eq!(
            by_system.status,
            BookingStatus::Cancelled(ActorRole::System)
        );
        assert_eq!(by_system.last_activity().unwrap().actor_id, None);
    }

    #[test]
    fn cancelled_booking_rejects_further_actions() {
        let booking = assigned_to_a();
        let booking = step(
            &booking,
            customer(),
            BookingEvent::Cancel {
                reasons: vec!["changed plans".to_string()],
                evidence: Evidence::default(),
            },
            NOW + 2,
        );
        let err = try_step(&booking, settler("A"), BookingEvent::EndService).unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
    }

    #[test]
    fn wrong_actor_is_not_permitted() {
        let booking = assigned_to_a();
        let code = booking.service_start_code.clone().unwrap();
        let err = try_step(&booking, settler("B"), BookingEvent::StartService { code }).unwrap_err();
        assert_eq!(err, CoreError::NotPermitted(BookingAction::StartService));

        let other_customer = Actor::Customer(UserId::new("c2").unwrap());
        let err = try_step(
            &booking,
            other_customer,
            BookingEvent::Cancel {
                reasons: vec!["x".to_string()],
                evidence: Evidence::default(),
            },
        )
        .unwrap_err();
        assert_eq!(err, CoreError::NotPermitted(BookingAction::Cancel));
    }

    #[test]
    fn selection_requires_acceptor_and_freezes_acceptors() {
        let booking = new_booking();
        let err = try_step(
            &booking,
            customer(),
            BookingEvent::SelectSettler {
                settler_id: UserId::new("A").unwrap(),
            },
        )
        .unwrap_err();
        assert_eq!(err, CoreError::SettlerNotAcceptor("A".to_string()));

        let booking = assigned_to_a();
        let err = try_step(
            &booking,
            settler("B"),
            BookingEvent::ExpressInterest {
                display_name: "Bob".to_string(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
        assert_eq!(booking.acceptors.len(), 1);
    }

    #[test]
    fn duplicate_interest_is_rejected() {
        let booking = new_booking();
        let booking = step(
            &booking,
            settler("A"),
            BookingEvent::ExpressInterest {
                display_name: String::new(),
            },
            NOW,
        );
        assert_eq!(booking.acceptors[0].display_name, "A");
        let err = try_step(
            &booking,
            settler("A"),
            BookingEvent::ExpressInterest {
                display_name: String::new(),
            },
        )
        .unwrap_err();
        assert_eq!(err, CoreError::AlreadyAcceptor("A".to_string()));
    }

    #[test]
    fn quote_update_returns_to_prior_status() {
        let booking = assigned_to_a();
        let code = booking.service_start_code.clone().unwrap();
        let booking = step(&booking, settler("A"), BookingEvent::StartService { code }, NOW + 2);
        let booking = step(
            &booking,
            settler("A"),
            BookingEvent::ProposeQuote {
                addons: vec![Addon {
                    name: "valve".to_string(),
                    price_cents: 1_500,
                }],
                manual_quote: None,
            },
            NOW + 3,
        );
        assert_eq!(booking.status, BookingStatus::QuoteUpdate);
        assert_eq!(booking.pricing.total_cents, 5_000);

        let accepted = step(&booking, customer(), BookingEvent::AcceptQuote, NOW + 4);
        assert_eq!(accepted.status, BookingStatus::InService);
        assert_eq!(accepted.pricing.total_cents, 6_500);
        assert!(accepted.pending_quote.is_none());

        let rejected = step(&booking, customer(), BookingEvent::RejectQuote, NOW + 4);
        assert_eq!(rejected.status, BookingStatus::InService);
        assert_eq!(rejected.pricing.total_cents, 5_000);
    }

    #[test]
    fn review_only_once() {
        let booking = awaiting_confirmation();
        let booking = step(&booking, customer(), BookingEvent::ConfirmCompletion, NOW + 5);
        let booking = step(
            &booking,
            Actor::System,
            BookingEvent::CompleteCooldown,
            NOW + 5 + LifecyclePolicy::default().cooldown_secs,
        );
        let transition = apply(
            &booking,
            TransitionRequest::new(
                customer(),
                BookingEvent::SubmitReview {
                    rating: 5,
                    comment: " great ".to_string(),
                },
            ),
            &LifecyclePolicy::default(),
            NOW + 1_000_000,
        )
        .unwrap();
        let review = transition.review.expect("review");
        assert_eq!(review.rating, 5);
        assert_eq!(review.comment, "great");
        assert_eq!(review.settler_id.as_str(), "A");

        let err = try_step(
            &transition.booking,
            customer(),
            BookingEvent::SubmitReview {
                rating: 4,
                comment: String::new(),
            },
        )
        .unwrap_err();
        assert_eq!(err, CoreError::AlreadyReviewed);
    }

    #[test]
    fn stale_expectation_is_distinct_from_invalid_transition() {
        let booking = assigned_to_a();
        let request = TransitionRequest::new(settler("A"), BookingEvent::EndService)
            .expecting(Expectation::Status(BookingStatus::InService));
        let err = apply(&booking, request, &LifecyclePolicy::default(), NOW).unwrap_err();
        assert!(matches!(err, CoreError::StaleTransition { .. }));

        let request = TransitionRequest::new(settler("A"), BookingEvent::EndService)
            .expecting(Expectation::Version(booking.version));
        let err = apply(&booking, request, &LifecyclePolicy::default(), NOW).unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
    }

    #[test]
    fn failed_transition_leaves_input_untouched() {
        let booking = awaiting_confirmation();
        let before = booking.clone();
        let _ = try_step(
            &booking,
            settler("A"),
            BookingEvent::SubmitEvidence {
                evidence: evidence(&[], "no photos"),
            },
        )
        .unwrap_err();
        assert_eq!(booking, before);
    }

    #[test]
    fn evidence_image_limit_comes_from_policy() {
        let booking = awaiting_confirmation();
        let policy = LifecyclePolicy {
            max_evidence_images: 1,
            ..LifecyclePolicy::default()
        };
        let err = apply(
            &booking,
            TransitionRequest::new(
                settler("A"),
                BookingEvent::SubmitEvidence {
                    evidence: evidence(&["a", "b"], ""),
                },
            ),
            &policy,
            NOW,
        )
        .unwrap_err();
        assert_eq!(err, CoreError::TooManyEvidenceImages { count: 2, max: 1 });
    }

    #[test]
    fn edge_table_matches_action_sources() {
        assert!(is_legal_edge(BookingStatus::New, BookingStatus::Accepted));
        assert!(!is_legal_edge(BookingStatus::New, BookingStatus::InService));
        assert!(!is_legal_edge(
            BookingStatus::Completed,
            BookingStatus::Cancelled(ActorRole::Customer)
        ));
        assert!(is_back_edge(
            BookingStatus::CooldownDispute(DisputeStage::Reported),
            BookingStatus::Cooldown
        ));
        assert!(is_back_edge(BookingStatus::QuoteUpdate, BookingStatus::Accepted));
        assert!(!is_back_edge(BookingStatus::Cooldown, BookingStatus::Completed));
    }
}

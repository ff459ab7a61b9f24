use crate::domain::actor::ActorRole;
use crate::domain::evidence::EvidenceKind;
use crate::domain::ids::{ActivityId, UserId};
use crate::domain::status::BookingStatus;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    SettlerAccept,
    SettlerSelected,
    SettlerServiceStart,
    SettlerServiceEnd,
    SettlerEvidenceSubmitted,
    SettlerEvidenceUpdated,
    CustomerConfirmCompletion,
    JobIncomplete,
    JobIncompleteUpdated,
    SettlerResolveIncompletion,
    SettlerRejectIncompletion,
    SettlerUpdateIncompletionEvidence,
    BookingCompleted,
    CooldownReportSubmitted,
    CooldownReportUpdated,
    SettlerResolveCooldownReport,
    SettlerRejectCooldownReport,
    SettlerUpdateCooldownReportEvidence,
    CustomerReviewSubmitted,
    SettlerQuoteUpdated,
    CustomerAcceptQuoteUpdate,
    CustomerRejectQuoteUpdate,
    BookingCancelledByCustomer,
    BookingCancelledBySettler,
    BookingCancelledBySystem,
}

/// What a timeline renderer should pull from the booking for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    None,
    Acceptor,
    Evidence(EvidenceKind),
    Quote,
    Review,
    Cancellation,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 25] = [
        ActivityKind::SettlerAccept,
        ActivityKind::SettlerSelected,
        ActivityKind::SettlerServiceStart,
        ActivityKind::SettlerServiceEnd,
        ActivityKind::SettlerEvidenceSubmitted,
        ActivityKind::SettlerEvidenceUpdated,
        ActivityKind::CustomerConfirmCompletion,
        ActivityKind::JobIncomplete,
        ActivityKind::JobIncompleteUpdated,
        ActivityKind::SettlerResolveIncompletion,
        ActivityKind::SettlerRejectIncompletion,
        ActivityKind::SettlerUpdateIncompletionEvidence,
        ActivityKind::BookingCompleted,
        ActivityKind::CooldownReportSubmitted,
        ActivityKind::CooldownReportUpdated,
        ActivityKind::SettlerResolveCooldownReport,
        ActivityKind::SettlerRejectCooldownReport,
        ActivityKind::SettlerUpdateCooldownReportEvidence,
        ActivityKind::CustomerReviewSubmitted,
        ActivityKind::SettlerQuoteUpdated,
        ActivityKind::CustomerAcceptQuoteUpdate,
        ActivityKind::CustomerRejectQuoteUpdate,
        ActivityKind::BookingCancelledByCustomer,
        ActivityKind::BookingCancelledBySettler,
        ActivityKind::BookingCancelledBySystem,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::SettlerAccept => "SETTLER_ACCEPT",
            ActivityKind::SettlerSelected => "SETTLER_SELECTED",
            ActivityKind::SettlerServiceStart => "SETTLER_SERVICE_START",
            ActivityKind::SettlerServiceEnd => "SETTLER_SERVICE_END",
            ActivityKind::SettlerEvidenceSubmitted => "SETTLER_EVIDENCE_SUBMITTED",
            ActivityKind::SettlerEvidenceUpdated => "SETTLER_EVIDENCE_UPDATED",
            ActivityKind::CustomerConfirmCompletion => "CUSTOMER_CONFIRM_COMPLETION",
            ActivityKind::JobIncomplete => "JOB_INCOMPLETE",
            ActivityKind::JobIncompleteUpdated => "JOB_INCOMPLETE_UPDATED",
            ActivityKind::SettlerResolveIncompletion => "SETTLER_RESOLVE_INCOMPLETION",
            ActivityKind::SettlerRejectIncompletion => "SETTLER_REJECT_INCOMPLETION",
            ActivityKind::SettlerUpdateIncompletionEvidence => {
                "SETTLER_UPDATE_INCOMPLETION_EVIDENCE"
            }
            ActivityKind::BookingCompleted => "BOOKING_COMPLETED",
            ActivityKind::CooldownReportSubmitted => "COOLDOWN_REPORT_SUBMITTED",
            ActivityKind::CooldownReportUpdated => "COOLDOWN_REPORT_UPDATED",
            ActivityKind::SettlerResolveCooldownReport => "SETTLER_RESOLVE_COOLDOWN_REPORT",
            ActivityKind::SettlerRejectCooldownReport => "SETTLER_REJECT_COOLDOWN_REPORT",
            ActivityKind::SettlerUpdateCooldownReportEvidence => {
                "SETTLER_UPDATE_COOLDOWN_REPORT_EVIDENCE"
            }
            ActivityKind::CustomerReviewSubmitted => "CUSTOMER_REVIEW_SUBMITTED",
            ActivityKind::SettlerQuoteUpdated => "SETTLER_QUOTE_UPDATED",
            ActivityKind::CustomerAcceptQuoteUpdate => "CUSTOMER_ACCEPT_QUOTE_UPDATE",
            ActivityKind::CustomerRejectQuoteUpdate => "CUSTOMER_REJECT_QUOTE_UPDATE",
            ActivityKind::BookingCancelledByCustomer => "BOOKING_CANCELLED_BY_CUSTOMER",
            ActivityKind::BookingCancelledBySettler => "BOOKING_CANCELLED_BY_SETTLER",
            ActivityKind::BookingCancelledBySystem => "BOOKING_CANCELLED_BY_SYSTEM",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::SettlerAccept => "Settler offered to take the job",
            ActivityKind::SettlerSelected => "Settler assigned",
            ActivityKind::SettlerServiceStart => "Service started",
            ActivityKind::SettlerServiceEnd => "Service ended",
            ActivityKind::SettlerEvidenceSubmitted => "Completion evidence submitted",
            ActivityKind::SettlerEvidenceUpdated => "Completion evidence updated",
            ActivityKind::CustomerConfirmCompletion => "Customer confirmed completion",
            ActivityKind::JobIncomplete => "Customer reported the job incomplete",
            ActivityKind::JobIncompleteUpdated => "Incompletion report updated",
            ActivityKind::SettlerResolveIncompletion => "Settler is resolving the incompletion",
            ActivityKind::SettlerRejectIncompletion => "Settler rejected the incompletion report",
            ActivityKind::SettlerUpdateIncompletionEvidence => {
                "Settler submitted incompletion resolution evidence"
            }
            ActivityKind::BookingCompleted => "Booking completed",
            ActivityKind::CooldownReportSubmitted => "Customer reported an issue during cooldown",
            ActivityKind::CooldownReportUpdated => "Cooldown report updated",
            ActivityKind::SettlerResolveCooldownReport => "Settler is resolving the cooldown report",
            ActivityKind::SettlerRejectCooldownReport => "Settler rejected the cooldown report",
            ActivityKind::SettlerUpdateCooldownReportEvidence => {
                "Settler submitted cooldown resolution evidence"
            }
            ActivityKind::CustomerReviewSubmitted => "Customer left a review",
            ActivityKind::SettlerQuoteUpdated => "Settler proposed a new quote",
            ActivityKind::CustomerAcceptQuoteUpdate => "Customer accepted the new quote",
            ActivityKind::CustomerRejectQuoteUpdate => "Customer rejected the new quote",
            ActivityKind::BookingCancelledByCustomer => "Cancelled by customer",
            ActivityKind::BookingCancelledBySettler => "Cancelled by settler",
            ActivityKind::BookingCancelledBySystem => "Cancelled",
        }
    }

    pub fn payload(&self) -> PayloadShape {
        match self {
            ActivityKind::SettlerAccept => PayloadShape::Acceptor,
            ActivityKind::SettlerSelected
            | ActivityKind::SettlerServiceStart
            | ActivityKind::SettlerServiceEnd
            | ActivityKind::CustomerConfirmCompletion
            | ActivityKind::SettlerResolveIncompletion
            | ActivityKind::SettlerRejectIncompletion
            | ActivityKind::BookingCompleted
            | ActivityKind::SettlerResolveCooldownReport
            | ActivityKind::SettlerRejectCooldownReport => PayloadShape::None,
            ActivityKind::SettlerEvidenceSubmitted | ActivityKind::SettlerEvidenceUpdated => {
                PayloadShape::Evidence(EvidenceKind::SettlerEvidence)
            }
            ActivityKind::JobIncomplete | ActivityKind::JobIncompleteUpdated => {
                PayloadShape::Evidence(EvidenceKind::IncompletionReport)
            }
            ActivityKind::SettlerUpdateIncompletionEvidence => {
                PayloadShape::Evidence(EvidenceKind::IncompletionResolved)
            }
            ActivityKind::CooldownReportSubmitted | ActivityKind::CooldownReportUpdated => {
                PayloadShape::Evidence(EvidenceKind::CooldownReport)
            }
            ActivityKind::SettlerUpdateCooldownReportEvidence => {
                PayloadShape::Evidence(EvidenceKind::CooldownResolved)
            }
            ActivityKind::CustomerReviewSubmitted => PayloadShape::Review,
            ActivityKind::SettlerQuoteUpdated
            | ActivityKind::CustomerAcceptQuoteUpdate
            | ActivityKind::CustomerRejectQuoteUpdate => PayloadShape::Quote,
            ActivityKind::BookingCancelledByCustomer
            | ActivityKind::BookingCancelledBySettler
            | ActivityKind::BookingCancelledBySystem => PayloadShape::Cancellation,
        }
    }

    pub fn cancelled_by(role: ActorRole) -> Self {
        match role {
            ActorRole::Customer => ActivityKind::BookingCancelledByCustomer,
            ActorRole::Settler => ActivityKind::BookingCancelledBySettler,
            ActorRole::System => ActivityKind::BookingCancelledBySystem,
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::InvalidActivityKind(s.to_string()))
    }
}

/// One immutable timeline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingActivity {
    pub id: ActivityId,
    pub kind: ActivityKind,
    pub actor: ActorRole,
    pub actor_id: Option<UserId>,
    pub status: BookingStatus,
    pub note: Option<String>,
    pub request_id: Option<String>,
    pub created_at: i64,
}

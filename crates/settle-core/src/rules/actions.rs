use crate::domain::{ActivityKind, ActorRole, BookingStatus, DisputeStage};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingAction {
    ExpressInterest,
    SelectSettler,
    StartService,
    EndService,
    SubmitEvidence,
    ConfirmCompletion,
    ReportIncompletion,
    UpdateIncompletionReport,
    ResolveIncompletion,
    RejectIncompletion,
    SubmitIncompletionEvidence,
    CompleteCooldown,
    ReportCooldownIssue,
    UpdateCooldownReport,
    ResolveCooldownReport,
    RejectCooldownReport,
    SubmitCooldownEvidence,
    SubmitReview,
    ProposeQuote,
    AcceptQuote,
    RejectQuote,
    Cancel,
}

impl BookingAction {
    pub const ALL: [BookingAction; 22] = [
        BookingAction::ExpressInterest,
        BookingAction::SelectSettler,
        BookingAction::StartService,
        BookingAction::EndService,
        BookingAction::SubmitEvidence,
        BookingAction::ConfirmCompletion,
        BookingAction::ReportIncompletion,
        BookingAction::UpdateIncompletionReport,
        BookingAction::ResolveIncompletion,
        BookingAction::RejectIncompletion,
        BookingAction::SubmitIncompletionEvidence,
        BookingAction::CompleteCooldown,
        BookingAction::ReportCooldownIssue,
        BookingAction::UpdateCooldownReport,
        BookingAction::ResolveCooldownReport,
        BookingAction::RejectCooldownReport,
        BookingAction::SubmitCooldownEvidence,
        BookingAction::SubmitReview,
        BookingAction::ProposeQuote,
        BookingAction::AcceptQuote,
        BookingAction::RejectQuote,
        BookingAction::Cancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::ExpressInterest => "express-interest",
            BookingAction::SelectSettler => "select-settler",
            BookingAction::StartService => "start-service",
            BookingAction::EndService => "end-service",
            BookingAction::SubmitEvidence => "submit-evidence",
            BookingAction::ConfirmCompletion => "confirm-completion",
            BookingAction::ReportIncompletion => "report-incompletion",
            BookingAction::UpdateIncompletionReport => "update-incompletion-report",
            BookingAction::ResolveIncompletion => "resolve-incompletion",
            BookingAction::RejectIncompletion => "reject-incompletion",
            BookingAction::SubmitIncompletionEvidence => "submit-incompletion-evidence",
            BookingAction::CompleteCooldown => "complete-cooldown",
            BookingAction::ReportCooldownIssue => "report-cooldown-issue",
            BookingAction::UpdateCooldownReport => "update-cooldown-report",
            BookingAction::ResolveCooldownReport => "resolve-cooldown-report",
            BookingAction::RejectCooldownReport => "reject-cooldown-report",
            BookingAction::SubmitCooldownEvidence => "submit-cooldown-evidence",
            BookingAction::SubmitReview => "submit-review",
            BookingAction::ProposeQuote => "propose-quote",
            BookingAction::AcceptQuote => "accept-quote",
            BookingAction::RejectQuote => "reject-quote",
            BookingAction::Cancel => "cancel",
        }
    }

    /// Source states from which the action may fire.
    pub fn allowed_from(&self, status: BookingStatus) -> bool {
        use BookingStatus::*;
        let open_dispute = matches!(
            status.dispute_stage(),
            Some(DisputeStage::Reported | DisputeStage::Amended)
        );
        match self {
            BookingAction::ExpressInterest | BookingAction::SelectSettler => status == New,
            BookingAction::StartService => status == Accepted,
            BookingAction::EndService => status == InService,
            BookingAction::SubmitEvidence => {
                matches!(status, ServiceEnded | AwaitingConfirmation)
            }
            BookingAction::ConfirmCompletion | BookingAction::ReportIncompletion => {
                status == AwaitingConfirmation
            }
            BookingAction::UpdateIncompletionReport
            | BookingAction::ResolveIncompletion
            | BookingAction::RejectIncompletion => {
                matches!(status, Incompletion(_)) && open_dispute
            }
            BookingAction::SubmitIncompletionEvidence => {
                status == Incompletion(DisputeStage::Resolving)
            }
            BookingAction::CompleteCooldown | BookingAction::ReportCooldownIssue => {
                status == Cooldown
            }
            BookingAction::UpdateCooldownReport
            | BookingAction::ResolveCooldownReport
            | BookingAction::RejectCooldownReport => {
                matches!(status, CooldownDispute(_)) && open_dispute
            }
            BookingAction::SubmitCooldownEvidence => {
                status == CooldownDispute(DisputeStage::Resolving)
            }
            BookingAction::SubmitReview => status == Completed,
            BookingAction::ProposeQuote => matches!(status, Accepted | InService | ServiceEnded),
            BookingAction::AcceptQuote | BookingAction::RejectQuote => status == QuoteUpdate,
            BookingAction::Cancel => !status.is_terminal(),
        }
    }

    /// Whether a caller with `role` may perform the action. Settler-side
    /// actions after assignment need the assigned settler.
    pub fn permits_actor(&self, role: ActorRole, is_assigned_settler: bool) -> bool {
        let assigned = role == ActorRole::Settler && is_assigned_settler;
        match self {
            BookingAction::ExpressInterest => role == ActorRole::Settler,
            BookingAction::SelectSettler => {
                matches!(role, ActorRole::Customer | ActorRole::System)
            }
            BookingAction::StartService
            | BookingAction::EndService
            | BookingAction::SubmitEvidence
            | BookingAction::ResolveIncompletion
            | BookingAction::RejectIncompletion
            | BookingAction::SubmitIncompletionEvidence
            | BookingAction::ResolveCooldownReport
            | BookingAction::RejectCooldownReport
            | BookingAction::SubmitCooldownEvidence
            | BookingAction::ProposeQuote => assigned,
            BookingAction::ConfirmCompletion
            | BookingAction::ReportIncompletion
            | BookingAction::UpdateIncompletionReport
            | BookingAction::ReportCooldownIssue
            | BookingAction::UpdateCooldownReport
            | BookingAction::SubmitReview
            | BookingAction::AcceptQuote
            | BookingAction::RejectQuote => role == ActorRole::Customer,
            BookingAction::CompleteCooldown => role == ActorRole::System,
            BookingAction::Cancel => match role {
                ActorRole::Customer | ActorRole::System => true,
                ActorRole::Settler => assigned,
            },
        }
    }

    /// Whether a committed timeline entry of `kind` could have come from
    /// this action.
    pub fn records(&self, kind: ActivityKind) -> bool {
        use ActivityKind as K;
        match self {
            BookingAction::ExpressInterest => kind == K::SettlerAccept,
            BookingAction::SelectSettler => kind == K::SettlerSelected,
            BookingAction::StartService => kind == K::SettlerServiceStart,
            BookingAction::EndService => kind == K::SettlerServiceEnd,
            BookingAction::SubmitEvidence => {
                matches!(kind, K::SettlerEvidenceSubmitted | K::SettlerEvidenceUpdated)
            }
            BookingAction::ConfirmCompletion => kind == K::CustomerConfirmCompletion,
            BookingAction::ReportIncompletion => kind == K::JobIncomplete,
            BookingAction::UpdateIncompletionReport => kind == K::JobIncompleteUpdated,
            BookingAction::ResolveIncompletion => kind == K::SettlerResolveIncompletion,
            BookingAction::RejectIncompletion => kind == K::SettlerRejectIncompletion,
            BookingAction::SubmitIncompletionEvidence => {
                kind == K::SettlerUpdateIncompletionEvidence
            }
            BookingAction::CompleteCooldown => kind == K::BookingCompleted,
            BookingAction::ReportCooldownIssue => kind == K::CooldownReportSubmitted,
            BookingAction::UpdateCooldownReport => kind == K::CooldownReportUpdated,
            BookingAction::ResolveCooldownReport => kind == K::SettlerResolveCooldownReport,
            BookingAction::RejectCooldownReport => kind == K::SettlerRejectCooldownReport,
            BookingAction::SubmitCooldownEvidence => {
                kind == K::SettlerUpdateCooldownReportEvidence
            }
            BookingAction::SubmitReview => kind == K::CustomerReviewSubmitted,
            BookingAction::ProposeQuote => kind == K::SettlerQuoteUpdated,
            BookingAction::AcceptQuote => kind == K::CustomerAcceptQuoteUpdate,
            BookingAction::RejectQuote => kind == K::CustomerRejectQuoteUpdate,
            BookingAction::Cancel => matches!(
                kind,
                K::BookingCancelledByCustomer
                    | K::BookingCancelledBySettler
                    | K::BookingCancelledBySystem
            ),
        }
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the viewer can do right now. Depends only on its inputs.
pub fn allowed_actions(
    status: BookingStatus,
    role: ActorRole,
    is_assigned_settler: bool,
) -> Vec<BookingAction> {
    BookingAction::ALL
        .into_iter()
        .filter(|action| {
            action.allowed_from(status) && action.permits_actor(role, is_assigned_settler)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{allowed_actions, BookingAction};
    use crate::domain::{ActivityKind, ActorRole, BookingStatus, DisputeStage};

    #[test]
    fn every_activity_kind_belongs_to_exactly_one_action() {
        for kind in ActivityKind::ALL {
            let owners: Vec<_> = BookingAction::ALL
                .into_iter()
                .filter(|action| action.records(kind))
                .collect();
            assert_eq!(owners.len(), 1, "{kind} recorded by {owners:?}");
        }
        assert!(BookingAction::Cancel.records(ActivityKind::BookingCancelledBySystem));
        assert!(!BookingAction::Cancel.records(ActivityKind::SettlerSelected));
    }

    #[test]
    fn new_booking_actions_by_role() {
        assert_eq!(
            allowed_actions(BookingStatus::New, ActorRole::Settler, false),
            vec![BookingAction::ExpressInterest]
        );
        assert_eq!(
            allowed_actions(BookingStatus::New, ActorRole::Customer, false),
            vec![BookingAction::SelectSettler, BookingAction::Cancel]
        );
    }

    #[test]
    fn unassigned_settler_cannot_act_on_assigned_booking() {
        assert!(allowed_actions(BookingStatus::Accepted, ActorRole::Settler, false).is_empty());
        assert_eq!(
            allowed_actions(BookingStatus::Accepted, ActorRole::Settler, true),
            vec![
                BookingAction::StartService,
                BookingAction::ProposeQuote,
                BookingAction::Cancel
            ]
        );
    }

    #[test]
    fn dispute_sub_phase_changes_settler_options() {
        let reported = allowed_actions(
            BookingStatus::Incompletion(DisputeStage::Reported),
            ActorRole::Settler,
            true,
        );
        assert!(reported.contains(&BookingAction::ResolveIncompletion));
        assert!(reported.contains(&BookingAction::RejectIncompletion));
        assert!(!reported.contains(&BookingAction::SubmitIncompletionEvidence));

        let resolving = allowed_actions(
            BookingStatus::Incompletion(DisputeStage::Resolving),
            ActorRole::Settler,
            true,
        );
        assert_eq!(
            resolving,
            vec![
                BookingAction::SubmitIncompletionEvidence,
                BookingAction::Cancel
            ]
        );
    }

    #[test]
    fn terminal_states_offer_nothing_but_review() {
        assert!(allowed_actions(
            BookingStatus::Cancelled(ActorRole::Customer),
            ActorRole::Customer,
            false
        )
        .is_empty());
        assert_eq!(
            allowed_actions(BookingStatus::Completed, ActorRole::Customer, false),
            vec![BookingAction::SubmitReview]
        );
    }

    #[test]
    fn projection_is_pure() {
        for status in BookingStatus::ALL {
            for role in [ActorRole::Customer, ActorRole::Settler, ActorRole::System] {
                for assigned in [false, true] {
                    assert_eq!(
                        allowed_actions(status, role, assigned),
                        allowed_actions(status, role, assigned)
                    );
                }
            }
        }
    }

    #[test]
    fn cooldown_completion_is_system_only() {
        assert_eq!(
            allowed_actions(BookingStatus::Cooldown, ActorRole::System, false),
            vec![BookingAction::CompleteCooldown, BookingAction::Cancel]
        );
        assert!(!allowed_actions(BookingStatus::Cooldown, ActorRole::Customer, false)
            .contains(&BookingAction::CompleteCooldown));
    }
}

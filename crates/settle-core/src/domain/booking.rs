use crate::domain::activity::{ActivityKind, BookingActivity};
use crate::domain::actor::ActorRole;
use crate::domain::evidence::{Evidence, EvidenceKind};
use crate::domain::ids::{BookingId, UserId};
use crate::domain::pricing::{Addon, ManualQuote, Pricing};
use crate::domain::status::BookingStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acceptor {
    pub settler_id: UserId,
    pub display_name: String,
    pub accepted_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteProposal {
    pub addons: Vec<Addon>,
    pub manual_quote: Option<ManualQuote>,
    pub total_cents: i64,
    pub previous_status: BookingStatus,
    pub proposed_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    pub cancelled_by: ActorRole,
    pub reasons: Vec<String>,
    pub evidence: Evidence,
    pub cancelled_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub customer_id: UserId,
    pub settler_id: Option<UserId>,
    pub status: BookingStatus,
    pub version: i64,
    pub service_start_code: Option<String>,
    pub acceptors: Vec<Acceptor>,
    pub pricing: Pricing,
    pub pending_quote: Option<QuoteProposal>,
    pub settler_evidence: Option<Evidence>,
    pub incompletion_report: Option<Evidence>,
    pub incompletion_resolved: Option<Evidence>,
    pub incompletion_status: Option<ActivityKind>,
    pub cooldown_report: Option<Evidence>,
    pub cooldown_resolved: Option<Evidence>,
    pub cooldown_status: Option<ActivityKind>,
    pub cancellation: Option<Cancellation>,
    pub cooldown_started_at: Option<i64>,
    pub reviewed_at: Option<i64>,
    pub timeline: Vec<BookingActivity>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Booking {
    /// A freshly checked-out booking, before any settler has shown interest.
    pub fn new(id: BookingId, customer_id: UserId, pricing: Pricing, now: i64) -> Self {
        Self {
            id,
            customer_id,
            settler_id: None,
            status: BookingStatus::New,
            version: 0,
            service_start_code: None,
            acceptors: Vec::new(),
            pricing,
            pending_quote: None,
            settler_evidence: None,
            incompletion_report: None,
            incompletion_resolved: None,
            incompletion_status: None,
            cooldown_report: None,
            cooldown_resolved: None,
            cooldown_status: None,
            cancellation: None,
            cooldown_started_at: None,
            reviewed_at: None,
            timeline: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn evidence(&self, kind: EvidenceKind) -> Option<&Evidence> {
        match kind {
            EvidenceKind::SettlerEvidence => self.settler_evidence.as_ref(),
            EvidenceKind::IncompletionReport => self.incompletion_report.as_ref(),
            EvidenceKind::IncompletionResolved => self.incompletion_resolved.as_ref(),
            EvidenceKind::CooldownReport => self.cooldown_report.as_ref(),
            EvidenceKind::CooldownResolved => self.cooldown_resolved.as_ref(),
            EvidenceKind::Cancellation => self.cancellation.as_ref().map(|c| &c.evidence),
        }
    }

    pub fn evidence_mut(&mut self, kind: EvidenceKind) -> Option<&mut Option<Evidence>> {
        match kind {
            EvidenceKind::SettlerEvidence => Some(&mut self.settler_evidence),
            EvidenceKind::IncompletionReport => Some(&mut self.incompletion_report),
            EvidenceKind::IncompletionResolved => Some(&mut self.incompletion_resolved),
            EvidenceKind::CooldownReport => Some(&mut self.cooldown_report),
            EvidenceKind::CooldownResolved => Some(&mut self.cooldown_resolved),
            EvidenceKind::Cancellation => None,
        }
    }

    pub fn acceptor(&self, settler_id: &UserId) -> Option<&Acceptor> {
        self.acceptors
            .iter()
            .find(|acceptor| &acceptor.settler_id == settler_id)
    }

    pub fn is_owner(&self, user_id: &UserId) -> bool {
        &self.customer_id == user_id
    }

    pub fn is_assigned_settler(&self, user_id: &UserId) -> bool {
        self.settler_id.as_ref() == Some(user_id)
    }

    pub fn find_request(&self, request_id: &str) -> Option<&BookingActivity> {
        self.timeline
            .iter()
            .find(|activity| activity.request_id.as_deref() == Some(request_id))
    }

    pub fn last_activity(&self) -> Option<&BookingActivity> {
        self.timeline.last()
    }
}

//! Booking lifecycle position.
//!
//! Stored documents carry the status as a decimal code where the fraction
//! selects a sub-phase (`8.2`, `11.1`). In memory the same information is a
//! tagged union, and the decimal form only exists at the wire boundary.

use crate::domain::actor::ActorRole;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStage {
    /// Customer raised the claim; settler must respond.
    Reported,
    /// Customer revised the claim; settler must respond.
    Amended,
    /// Settler accepted the claim and owes resolution evidence.
    Resolving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BookingStatus {
    New,
    Accepted,
    InService,
    ServiceEnded,
    AwaitingConfirmation,
    Cooldown,
    Completed,
    QuoteUpdate,
    Incompletion(DisputeStage),
    CooldownDispute(DisputeStage),
    Cancelled(ActorRole),
}

const STATUS_TABLE: [(i32, BookingStatus); 17] = [
    (0, BookingStatus::New),
    (10, BookingStatus::Accepted),
    (20, BookingStatus::InService),
    (30, BookingStatus::ServiceEnded),
    (40, BookingStatus::AwaitingConfirmation),
    (50, BookingStatus::Cooldown),
    (60, BookingStatus::Completed),
    (70, BookingStatus::QuoteUpdate),
    (80, BookingStatus::Incompletion(DisputeStage::Reported)),
    (81, BookingStatus::Incompletion(DisputeStage::Amended)),
    (82, BookingStatus::Incompletion(DisputeStage::Resolving)),
    (90, BookingStatus::CooldownDispute(DisputeStage::Reported)),
    (91, BookingStatus::CooldownDispute(DisputeStage::Amended)),
    (92, BookingStatus::CooldownDispute(DisputeStage::Resolving)),
    (110, BookingStatus::Cancelled(ActorRole::System)),
    (111, BookingStatus::Cancelled(ActorRole::Customer)),
    (112, BookingStatus::Cancelled(ActorRole::Settler)),
];

impl BookingStatus {
    pub const ALL: [BookingStatus; 17] = {
        let mut out = [BookingStatus::New; 17];
        let mut i = 0;
        while i < STATUS_TABLE.len() {
            out[i] = STATUS_TABLE[i].1;
            i += 1;
        }
        out
    };

    /// Wire code expressed in tenths (`8.2` -> `82`).
    pub fn code_tenths(&self) -> i32 {
        match self {
            BookingStatus::New => 0,
            BookingStatus::Accepted => 10,
            BookingStatus::InService => 20,
            BookingStatus::ServiceEnded => 30,
            BookingStatus::AwaitingConfirmation => 40,
            BookingStatus::Cooldown => 50,
            BookingStatus::Completed => 60,
            BookingStatus::QuoteUpdate => 70,
            BookingStatus::Incompletion(stage) => 80 + stage_offset(*stage),
            BookingStatus::CooldownDispute(stage) => 90 + stage_offset(*stage),
            BookingStatus::Cancelled(ActorRole::System) => 110,
            BookingStatus::Cancelled(ActorRole::Customer) => 111,
            BookingStatus::Cancelled(ActorRole::Settler) => 112,
        }
    }

    pub fn from_tenths(tenths: i32) -> Option<Self> {
        STATUS_TABLE
            .iter()
            .find(|(code, _)| *code == tenths)
            .map(|(_, status)| *status)
    }

    pub fn code(&self) -> String {
        let tenths = self.code_tenths();
        if tenths % 10 == 0 {
            format!("{}", tenths / 10)
        } else {
            format!("{}.{}", tenths / 10, tenths % 10)
        }
    }

    pub fn from_code(raw: &str) -> Result<Self, CoreError> {
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidStatusCode(raw.to_string()))?;
        Self::from_number(value).ok_or_else(|| CoreError::InvalidStatusCode(raw.to_string()))
    }

    pub fn from_number(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = value * 10.0;
        let tenths = scaled.round();
        if (scaled - tenths).abs() > 1e-6 {
            return None;
        }
        Self::from_tenths(tenths as i32)
    }

    /// Major phase number, ignoring the sub-phase.
    pub fn phase_rank(&self) -> i32 {
        self.code_tenths() / 10
    }

    pub fn dispute_stage(&self) -> Option<DisputeStage> {
        match self {
            BookingStatus::Incompletion(stage) | BookingStatus::CooldownDispute(stage) => {
                Some(*stage)
            }
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BookingStatus::Cancelled(_))
    }

    /// Which party is expected to move the booking forward next.
    pub fn awaiting(&self) -> Option<ActorRole> {
        match self {
            BookingStatus::New => Some(ActorRole::Customer),
            BookingStatus::Accepted
            | BookingStatus::InService
            | BookingStatus::ServiceEnded
            | BookingStatus::Incompletion(_)
            | BookingStatus::CooldownDispute(_) => Some(ActorRole::Settler),
            BookingStatus::AwaitingConfirmation | BookingStatus::QuoteUpdate => {
                Some(ActorRole::Customer)
            }
            BookingStatus::Cooldown => Some(ActorRole::System),
            BookingStatus::Completed | BookingStatus::Cancelled(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::New => "new",
            BookingStatus::Accepted => "accepted",
            BookingStatus::InService => "in service",
            BookingStatus::ServiceEnded => "service ended",
            BookingStatus::AwaitingConfirmation => "awaiting confirmation",
            BookingStatus::Cooldown => "cooldown",
            BookingStatus::Completed => "completed",
            BookingStatus::QuoteUpdate => "quote update pending",
            BookingStatus::Incompletion(DisputeStage::Reported) => "incompletion reported",
            BookingStatus::Incompletion(DisputeStage::Amended) => "incompletion report updated",
            BookingStatus::Incompletion(DisputeStage::Resolving) => "resolving incompletion",
            BookingStatus::CooldownDispute(DisputeStage::Reported) => "cooldown report submitted",
            BookingStatus::CooldownDispute(DisputeStage::Amended) => "cooldown report updated",
            BookingStatus::CooldownDispute(DisputeStage::Resolving) => "resolving cooldown report",
            BookingStatus::Cancelled(ActorRole::System) => "cancelled",
            BookingStatus::Cancelled(ActorRole::Customer) => "cancelled by customer",
            BookingStatus::Cancelled(ActorRole::Settler) => "cancelled by settler",
        }
    }
}

fn stage_offset(stage: DisputeStage) -> i32 {
    match stage {
        DisputeStage::Reported => 0,
        DisputeStage::Amended => 1,
        DisputeStage::Resolving => 2,
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.label())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_code(&value)
    }
}

impl From<BookingStatus> for String {
    fn from(value: BookingStatus) -> Self {
        value.code()
    }
}

#[cfg(test)]
mod tests {
    use super::{BookingStatus, DisputeStage};
    use crate::domain::actor::ActorRole;

    #[test]
    fn codes_keep_wire_values() {
        assert_eq!(BookingStatus::New.code(), "0");
        assert_eq!(BookingStatus::Completed.code(), "6");
        assert_eq!(
            BookingStatus::Incompletion(DisputeStage::Resolving).code(),
            "8.2"
        );
        assert_eq!(
            BookingStatus::CooldownDispute(DisputeStage::Amended).code(),
            "9.1"
        );
        assert_eq!(
            BookingStatus::Cancelled(ActorRole::Settler).code(),
            "11.2"
        );
    }

    #[test]
    fn every_status_parses_back_from_its_code() {
        for status in BookingStatus::ALL {
            assert_eq!(BookingStatus::from_code(&status.code()).unwrap(), status);
        }
    }

    #[test]
    fn from_code_accepts_float_spellings() {
        assert_eq!(
            BookingStatus::from_code("8.20").unwrap(),
            BookingStatus::Incompletion(DisputeStage::Resolving)
        );
        assert_eq!(
            BookingStatus::from_number(11.1),
            Some(BookingStatus::Cancelled(ActorRole::Customer))
        );
        assert_eq!(BookingStatus::from_code("4.0").unwrap(), BookingStatus::AwaitingConfirmation);
    }

    #[test]
    fn from_code_rejects_unknown_codes() {
        assert!(BookingStatus::from_code("10").is_err());
        assert!(BookingStatus::from_code("8.3").is_err());
        assert!(BookingStatus::from_code("8.25").is_err());
        assert!(BookingStatus::from_code("new").is_err());
        assert!(BookingStatus::from_number(f64::NAN).is_none());
    }

    #[test]
    fn serializes_as_code_string() {
        let json = serde_json::to_string(&BookingStatus::CooldownDispute(DisputeStage::Resolving))
            .unwrap();
        assert_eq!(json, "\"9.2\"");
        let back: BookingStatus = serde_json::from_str("\"11.1\"").unwrap();
        assert_eq!(back, BookingStatus::Cancelled(ActorRole::Customer));
    }

    #[test]
    fn awaiting_actor_follows_sub_phase() {
        assert_eq!(
            BookingStatus::Incompletion(DisputeStage::Reported).awaiting(),
            Some(ActorRole::Settler)
        );
        assert_eq!(
            BookingStatus::AwaitingConfirmation.awaiting(),
            Some(ActorRole::Customer)
        );
        assert_eq!(BookingStatus::Completed.awaiting(), None);
    }
}

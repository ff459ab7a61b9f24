use crate::domain::ids::BookingId;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    SettlerEvidence,
    IncompletionReport,
    IncompletionResolved,
    CooldownReport,
    CooldownResolved,
    Cancellation,
}

impl EvidenceKind {
    pub const ALL: [EvidenceKind; 6] = [
        EvidenceKind::SettlerEvidence,
        EvidenceKind::IncompletionReport,
        EvidenceKind::IncompletionResolved,
        EvidenceKind::CooldownReport,
        EvidenceKind::CooldownResolved,
        EvidenceKind::Cancellation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::SettlerEvidence => "settler_evidence",
            EvidenceKind::IncompletionReport => "incompletion_report",
            EvidenceKind::IncompletionResolved => "incompletion_resolved",
            EvidenceKind::CooldownReport => "cooldown_report",
            EvidenceKind::CooldownResolved => "cooldown_resolved",
            EvidenceKind::Cancellation => "cancellation",
        }
    }
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvidenceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        EvidenceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidEvidenceKind(s.to_string()))
    }
}

/// An (images, remark) pair. Each pair on a booking may be overwritten until
/// the transition that governs it closes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub image_urls: Vec<String>,
    pub remark: String,
    pub updated_at: i64,
}

impl Evidence {
    pub fn new(image_urls: Vec<String>, remark: impl Into<String>) -> Self {
        Self {
            image_urls: image_urls
                .into_iter()
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
            remark: remark.into().trim().to_string(),
            updated_at: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.image_urls.is_empty() && self.remark.is_empty()
    }

    pub fn require_images(&self, max: usize) -> Result<(), CoreError> {
        if self.image_urls.is_empty() {
            return Err(CoreError::MissingEvidenceImages);
        }
        self.limit_images(max)
    }

    pub fn require_remark(&self, max: usize) -> Result<(), CoreError> {
        if self.remark.is_empty() {
            return Err(CoreError::MissingRemark);
        }
        self.limit_images(max)
    }

    pub fn limit_images(&self, max: usize) -> Result<(), CoreError> {
        if self.image_urls.len() > max {
            return Err(CoreError::TooManyEvidenceImages {
                count: self.image_urls.len(),
                max,
            });
        }
        Ok(())
    }

    pub(crate) fn stamped(mut self, now: i64) -> Self {
        self.updated_at = now;
        self
    }
}

/// Deterministic blob path for the `index`-th image of an evidence pair.
pub fn blob_path(prefix: &str, kind: EvidenceKind, booking_id: BookingId, index: usize) -> String {
    let prefix = prefix.trim_matches('/');
    format!("{}/{}_{}_{}.jpg", prefix, kind.as_str(), booking_id, index)
}

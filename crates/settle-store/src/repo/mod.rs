pub mod bookings;
pub mod reviews;
pub mod uploads;

pub use bookings::{BookingNew, BookingQuery, BookingsRepo, CommittedTransition};
pub use reviews::{RatingSummary, ReviewsRepo};
pub use uploads::{Upload, UploadsRepo};

use crate::error::{Result, StoreError};
use settle_core::domain::{
    ActivityKind, ActorRole, BookingId, BookingStatus, EvidenceKind, ReviewId, UploadId, UserId,
};
use std::str::FromStr;

pub(crate) fn parse_booking_id(raw: &str) -> Result<BookingId> {
    BookingId::from_str(raw).map_err(|_| StoreError::InvalidId(raw.to_string()))
}

pub(crate) fn parse_review_id(raw: &str) -> Result<ReviewId> {
    ReviewId::from_str(raw).map_err(|_| StoreError::InvalidId(raw.to_string()))
}

pub(crate) fn parse_upload_id(raw: &str) -> Result<UploadId> {
    UploadId::from_str(raw).map_err(|_| StoreError::InvalidId(raw.to_string()))
}

pub(crate) fn parse_user_id(raw: &str) -> Result<UserId> {
    UserId::new(raw).map_err(|_| StoreError::InvalidData(format!("user id {:?}", raw)))
}

pub(crate) fn parse_status(tenths: i32) -> Result<BookingStatus> {
    BookingStatus::from_tenths(tenths)
        .ok_or_else(|| StoreError::InvalidData(format!("status code {}", tenths)))
}

pub(crate) fn parse_activity_kind(raw: &str) -> Result<ActivityKind> {
    ActivityKind::from_str(raw)
        .map_err(|_| StoreError::InvalidData(format!("activity kind {:?}", raw)))
}

pub(crate) fn parse_role(raw: &str) -> Result<ActorRole> {
    ActorRole::from_str(raw).map_err(|_| StoreError::InvalidData(format!("actor role {:?}", raw)))
}

pub(crate) fn parse_evidence_kind(raw: &str) -> Result<EvidenceKind> {
    EvidenceKind::from_str(raw)
        .map_err(|_| StoreError::InvalidData(format!("evidence kind {:?}", raw)))
}

use crate::domain::{ActivityId, BookingStatus};
use crate::rules::BookingAction;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid user id")]
    InvalidUserId,
    #[error("invalid actor: {0} (expected customer:<id>, settler:<id> or system)")]
    InvalidActor(String),
    #[error("invalid status code: {0}")]
    InvalidStatusCode(String),
    #[error("invalid activity kind: {0}")]
    InvalidActivityKind(String),
    #[error("invalid evidence kind: {0}")]
    InvalidEvidenceKind(String),
    #[error("invalid price: {0}")]
    InvalidPrice(i64),
    #[error("invalid rating: {0} (expected 1-5)")]
    InvalidRating(u8),
    #[error("{action} is not allowed while booking is {status}")]
    InvalidStateTransition {
        action: BookingAction,
        status: BookingStatus,
    },
    #[error("stale transition: expected {expected}, booking is {actual}")]
    StaleTransition { expected: String, actual: String },
    #[error("{0} is not permitted for this actor")]
    NotPermitted(BookingAction),
    #[error("at least one cancel reason is required")]
    MissingCancelReason,
    #[error("at least one evidence image is required")]
    MissingEvidenceImages,
    #[error("too many evidence images: {count} (max {max})")]
    TooManyEvidenceImages { count: usize, max: usize },
    #[error("remark is required")]
    MissingRemark,
    #[error("settler {0} has not expressed interest in this booking")]
    SettlerNotAcceptor(String),
    #[error("settler {0} already expressed interest in this booking")]
    AlreadyAcceptor(String),
    #[error("service start code does not match")]
    InvalidServiceStartCode,
    #[error("cooldown window has not elapsed (ends at {0})")]
    CooldownNotElapsed(i64),
    #[error("booking has already been reviewed")]
    AlreadyReviewed,
    #[error("request id {0} was already used for a different request")]
    RequestIdReused(String),
    #[error("duplicate activity id: {0}")]
    DuplicateActivityId(ActivityId),
}

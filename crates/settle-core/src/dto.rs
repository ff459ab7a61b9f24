use crate::domain::{
    ActivityId, ActivityKind, ActorRole, Booking, BookingActivity, BookingId, BookingStatus,
    UserId,
};
use crate::rules::BookingAction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingListItemDto {
    pub id: BookingId,
    pub customer_id: UserId,
    pub settler_id: Option<UserId>,
    pub status: BookingStatus,
    pub status_label: String,
    pub total_cents: i64,
    pub acceptors: usize,
    pub updated_at: i64,
}

impl From<&Booking> for BookingListItemDto {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            customer_id: booking.customer_id.clone(),
            settler_id: booking.settler_id.clone(),
            status: booking.status,
            status_label: booking.status.label().to_string(),
            total_cents: booking.pricing.total_cents,
            acceptors: booking.acceptors.len(),
            updated_at: booking.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntryDto {
    pub id: ActivityId,
    pub kind: ActivityKind,
    pub label: String,
    pub actor: ActorRole,
    pub actor_id: Option<UserId>,
    pub status: BookingStatus,
    pub note: Option<String>,
    pub created_at: i64,
}

impl From<&BookingActivity> for TimelineEntryDto {
    fn from(activity: &BookingActivity) -> Self {
        Self {
            id: activity.id,
            kind: activity.kind,
            label: activity.kind.label().to_string(),
            actor: activity.actor,
            actor_id: activity.actor_id.clone(),
            status: activity.status,
            note: activity.note.clone(),
            created_at: activity.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedActionsDto {
    pub booking_id: BookingId,
    pub status: BookingStatus,
    pub awaiting: Option<ActorRole>,
    pub actions: Vec<BookingAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDto {
    pub booking_id: BookingId,
    pub action: BookingAction,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub activity_id: ActivityId,
    pub activity: ActivityKind,
    pub version: i64,
    pub replayed: bool,
}

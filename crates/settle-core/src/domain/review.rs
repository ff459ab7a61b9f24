use crate::domain::ids::{BookingId, ReviewId, UserId};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub booking_id: BookingId,
    pub customer_id: UserId,
    pub settler_id: UserId,
    pub rating: u8,
    pub comment: String,
    pub created_at: i64,
}

pub fn validate_rating(rating: u8) -> Result<u8, CoreError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(CoreError::InvalidRating(rating));
    }
    Ok(rating)
}

use crate::domain::{Booking, BookingStatus};

pub const DEFAULT_COOLDOWN_HOURS: i64 = 72;
pub const MAX_COOLDOWN_HOURS: i64 = 720;

pub fn cooldown_ends_at(started_at: i64, cooldown_secs: i64) -> i64 {
    started_at.saturating_add(cooldown_secs)
}

/// End of the current cooldown window, if the booking is in cooldown.
pub fn cooldown_deadline(booking: &Booking, cooldown_secs: i64) -> Option<i64> {
    if booking.status != BookingStatus::Cooldown {
        return None;
    }
    let started = booking.cooldown_started_at.unwrap_or(booking.updated_at);
    Some(cooldown_ends_at(started, cooldown_secs))
}

pub fn cooldown_elapsed(booking: &Booking, now_utc: i64, cooldown_secs: i64) -> bool {
    cooldown_deadline(booking, cooldown_secs).is_some_and(|deadline| now_utc >= deadline)
}

#[cfg(test)]
mod tests {
    use super::{cooldown_deadline, cooldown_elapsed};
    use crate::domain::{Booking, BookingId, BookingStatus, Pricing, UserId};

    fn cooling(started: i64) -> Booking {
        let pricing = Pricing::new(5_000, Vec::new(), None).unwrap();
        let mut booking = Booking::new(
            BookingId::new(),
            UserId::new("c1").unwrap(),
            pricing,
            started - 1_000,
        );
        booking.status = BookingStatus::Cooldown;
        booking.cooldown_started_at = Some(started);
        booking
    }

    #[test]
    fn elapsed_after_window() {
        let booking = cooling(1_700_000_000);
        assert!(!cooldown_elapsed(&booking, 1_700_000_000 + 3_599, 3_600));
        assert!(cooldown_elapsed(&booking, 1_700_000_000 + 3_600, 3_600));
    }

    #[test]
    fn no_deadline_outside_cooldown() {
        let mut booking = cooling(1_700_000_000);
        booking.status = BookingStatus::Completed;
        assert_eq!(cooldown_deadline(&booking, 3_600), None);
    }
}

use crate::domain::{Booking, BookingActivity, BookingStatus};
use crate::error::CoreError;

/// Appends `activity`; existing entries are never touched.
pub fn append(
    timeline: &mut Vec<BookingActivity>,
    activity: BookingActivity,
) -> Result<(), CoreError> {
    if timeline.iter().any(|existing| existing.id == activity.id) {
        return Err(CoreError::DuplicateActivityId(activity.id));
    }
    timeline.push(activity);
    Ok(())
}

pub fn newest_first(timeline: &[BookingActivity]) -> impl Iterator<Item = &BookingActivity> {
    timeline.iter().rev()
}

/// True when `after` keeps every entry of `before`, in order, as its prefix.
pub fn is_extension_of(before: &[BookingActivity], after: &[BookingActivity]) -> bool {
    after.len() >= before.len() && before.iter().zip(after).all(|(old, new)| old == new)
}

/// Status recorded by each entry, in insertion order.
pub fn status_path(timeline: &[BookingActivity]) -> Vec<BookingStatus> {
    timeline.iter().map(|activity| activity.status).collect()
}

/// A committed activity carrying the same idempotency key, if any.
pub fn find_replay<'a>(booking: &'a Booking, request_id: Option<&str>) -> Option<&'a BookingActivity> {
    request_id.and_then(|key| booking.find_request(key))
}

#[cfg(test)]
mod tests {
    use super::{append, is_extension_of, newest_first, status_path};
    use crate::domain::{ActivityId, ActivityKind, ActorRole, BookingActivity, BookingStatus};
    use crate::error::CoreError;

    fn entry(kind: ActivityKind, status: BookingStatus, at: i64) -> BookingActivity {
        BookingActivity {
            id: ActivityId::new(),
            kind,
            actor: ActorRole::Settler,
            actor_id: None,
            status,
            note: None,
            request_id: None,
            created_at: at,
        }
    }

    #[test]
    fn append_keeps_insertion_order() {
        let mut timeline = Vec::new();
        append(
            &mut timeline,
            entry(ActivityKind::SettlerServiceStart, BookingStatus::InService, 20),
        )
        .unwrap();
        append(
            &mut timeline,
            entry(ActivityKind::SettlerServiceEnd, BookingStatus::ServiceEnded, 10),
        )
        .unwrap();
        assert_eq!(
            status_path(&timeline),
            vec![BookingStatus::InService, BookingStatus::ServiceEnded]
        );
        let newest: Vec<_> = newest_first(&timeline).map(|a| a.kind).collect();
        assert_eq!(
            newest,
            vec![ActivityKind::SettlerServiceEnd, ActivityKind::SettlerServiceStart]
        );
        assert_eq!(timeline[0].kind, ActivityKind::SettlerServiceStart);
    }

    #[test]
    fn append_rejects_duplicate_id() {
        let mut timeline = Vec::new();
        let first = entry(ActivityKind::SettlerServiceStart, BookingStatus::InService, 1);
        append(&mut timeline, first.clone()).unwrap();
        let err = append(&mut timeline, first.clone()).unwrap_err();
        assert_eq!(err, CoreError::DuplicateActivityId(first.id));
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn extension_check_detects_rewrites() {
        let a = entry(ActivityKind::SettlerServiceStart, BookingStatus::InService, 1);
        let b = entry(ActivityKind::SettlerServiceEnd, BookingStatus::ServiceEnded, 2);
        let before = vec![a.clone()];
        assert!(is_extension_of(&before, &[a.clone(), b.clone()]));
        assert!(!is_extension_of(&before, &[b.clone()]));
        assert!(!is_extension_of(&[a.clone(), b.clone()], &[a]));
    }
}

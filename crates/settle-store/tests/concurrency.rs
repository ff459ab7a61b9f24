use settle_core::domain::{Actor, BookingStatus, UserId};
use settle_core::rules::{BookingEvent, LifecyclePolicy, TransitionRequest};
use settle_store::repo::BookingNew;
use settle_store::Store;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

const NOW: i64 = 1_700_000_000;

fn user(id: &str) -> UserId {
    UserId::new(id).expect("user id")
}

#[test]
fn racing_selections_assign_exactly_one_settler() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("settle.sqlite3");

    let setup = Store::open(&db_path).expect("open store");
    setup.migrate().expect("migrate");
    let booking = setup
        .bookings()
        .create(
            NOW,
            BookingNew {
                customer_id: user("c1"),
                base_price_cents: 5_000,
                addons: Vec::new(),
                manual_quote: None,
            },
        )
        .expect("create booking");
    for (offset, settler) in [(1, "A"), (2, "B")] {
        setup
            .bookings()
            .transition(
                NOW + offset,
                booking.id,
                TransitionRequest::new(
                    Actor::Settler(user(settler)),
                    BookingEvent::ExpressInterest {
                        display_name: settler.to_string(),
                    },
                ),
                &LifecyclePolicy::default(),
            )
            .expect("express interest");
    }

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["A", "B"]
        .into_iter()
        .map(|settler| {
            let store = Store::open(&db_path).expect("open racer");
            let barrier = Arc::clone(&barrier);
            let id = booking.id;
            thread::spawn(move || {
                barrier.wait();
                let result = store.bookings().transition(
                    NOW + 10,
                    id,
                    TransitionRequest::new(
                        Actor::Customer(user("c1")),
                        BookingEvent::SelectSettler {
                            settler_id: user(settler),
                        },
                    ),
                    &LifecyclePolicy::default(),
                );
                (settler, result)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("racer thread"))
        .collect();
    let winners: Vec<_> = results
        .iter()
        .filter(|(_, result)| result.is_ok())
        .map(|(settler, _)| *settler)
        .collect();
    assert_eq!(winners.len(), 1, "results: {:?}", results);
    for (_, result) in &results {
        if let Err(err) = result {
            assert!(err.is_conflict(), "loser error: {}", err);
        }
    }

    let stored = setup.bookings().require(booking.id).expect("load");
    assert_eq!(stored.status, BookingStatus::Accepted);
    assert_eq!(stored.settler_id, Some(user(winners[0])));
    assert_eq!(stored.version, 3);
    let selections = stored
        .timeline
        .iter()
        .filter(|entry| entry.status == BookingStatus::Accepted)
        .count();
    assert_eq!(selections, 1);
}

use settle_core::domain::{Actor, Booking, BookingStatus, Evidence, UserId};
use settle_core::rules::{BookingEvent, LifecyclePolicy, TransitionRequest};
use settle_store::repo::BookingNew;
use settle_store::Store;

const NOW: i64 = 1_700_000_000;

fn user(id: &str) -> UserId {
    UserId::new(id).expect("user id")
}

fn step(store: &Store, booking: &Booking, actor: Actor, event: BookingEvent, at: i64) -> Booking {
    store
        .bookings()
        .transition(
            at,
            booking.id,
            TransitionRequest::new(actor, event),
            &LifecyclePolicy::default(),
        )
        .expect("transition")
        .booking
}

fn in_cooldown(store: &Store, confirmed_at: i64) -> Booking {
    let booking = store
        .bookings()
        .create(
            NOW,
            BookingNew {
                customer_id: user("c1"),
                base_price_cents: 8_000,
                addons: Vec::new(),
                manual_quote: None,
            },
        )
        .expect("create");
    let settler = Actor::Settler(user("A"));
    let customer = Actor::Customer(user("c1"));
    step(
        store,
        &booking,
        settler.clone(),
        BookingEvent::ExpressInterest {
            display_name: String::new(),
        },
        NOW,
    );
    let selected = step(
        store,
        &booking,
        customer.clone(),
        BookingEvent::SelectSettler {
            settler_id: user("A"),
        },
        NOW,
    );
    let code = selected.service_start_code.expect("code");
    step(store, &booking, settler.clone(), BookingEvent::StartService { code }, NOW);
    step(store, &booking, settler.clone(), BookingEvent::EndService, NOW);
    step(
        store,
        &booking,
        settler,
        BookingEvent::SubmitEvidence {
            evidence: Evidence::new(vec!["after.jpg".to_string()], ""),
        },
        NOW,
    );
    step(store, &booking, customer, BookingEvent::ConfirmCompletion, confirmed_at)
}

#[test]
fn sweep_completes_only_elapsed_windows() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    let policy = LifecyclePolicy {
        cooldown_secs: 3_600,
        ..LifecyclePolicy::default()
    };

    let early = in_cooldown(&store, NOW + 10);
    let late = in_cooldown(&store, NOW + 3_000);

    let completed = store
        .bookings()
        .sweep_cooldowns(NOW + 10 + 3_600, &policy)
        .expect("sweep");
    assert_eq!(completed, vec![early.id]);

    let early = store.bookings().require(early.id).expect("load");
    assert_eq!(early.status, BookingStatus::Completed);
    let last = early.last_activity().expect("activity");
    assert_eq!(last.actor_id, None);

    let late = store.bookings().require(late.id).expect("load");
    assert_eq!(late.status, BookingStatus::Cooldown);

    let again = store
        .bookings()
        .sweep_cooldowns(NOW + 10 + 3_600, &policy)
        .expect("sweep again");
    assert!(again.is_empty());
}

#[test]
fn dispute_pauses_the_sweep() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    let policy = LifecyclePolicy::default();
    let booking = in_cooldown(&store, NOW + 10);
    step(
        &store,
        &booking,
        Actor::Customer(user("c1")),
        BookingEvent::ReportCooldownIssue {
            evidence: Evidence::new(Vec::new(), "paint is chipped"),
        },
        NOW + 20,
    );

    let completed = store
        .bookings()
        .sweep_cooldowns(NOW + 10 + policy.cooldown_secs * 2, &policy)
        .expect("sweep");
    assert!(completed.is_empty());
    let stored = store.bookings().require(booking.id).expect("load");
    assert_eq!(stored.status.code(), "9");
}

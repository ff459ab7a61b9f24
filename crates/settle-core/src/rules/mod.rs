pub mod actions;
pub mod cooldown;
pub mod money;
pub mod timeline;
pub mod transitions;

pub use actions::{allowed_actions, BookingAction};
pub use cooldown::{cooldown_deadline, cooldown_elapsed, cooldown_ends_at};
pub use money::{compute_total, format_cents, parse_amount_cents};
pub use transitions::{
    apply, check_expectation, is_back_edge, is_legal_edge, replay, BookingEvent, Expectation,
    LifecyclePolicy, Transition, TransitionRequest,
};

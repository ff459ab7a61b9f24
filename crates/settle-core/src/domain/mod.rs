pub mod activity;
pub mod actor;
pub mod booking;
pub mod evidence;
pub mod ids;
pub mod pricing;
pub mod review;
pub mod status;

pub use activity::{ActivityKind, BookingActivity, PayloadShape};
pub use actor::{Actor, ActorRole};
pub use booking::{Acceptor, Booking, Cancellation, QuoteProposal};
pub use evidence::{blob_path, Evidence, EvidenceKind};
pub use ids::{ActivityId, BookingId, ReviewId, UploadId, UserId};
pub use pricing::{Addon, ManualQuote, Pricing};
pub use review::{validate_rating, Review, MAX_RATING, MIN_RATING};
pub use status::{BookingStatus, DisputeStage};

pub mod collector;
pub mod prompt;
pub mod providers;
pub mod recommender;
pub mod throttle;

pub use collector::{Collected, Collector, ListingSelectors};
pub use recommender::Recommender;

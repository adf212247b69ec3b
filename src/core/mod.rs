//! Core business types and the seams between them

pub mod cache;
pub mod config;
pub mod entity;
pub mod log;
pub mod position;
pub mod price;
pub mod profile;

// Re-export main types for cleaner imports
pub use cache::{Cache, SharedCache};
pub use entity::EntityStore;
pub use position::{Position, TradeDirection, TradeError, UserId};
pub use price::{FetchOutcome, PriceProvider, PriceSource, Quote, ResolvedPrice};
pub use profile::CompanyProfile;

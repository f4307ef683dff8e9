//! Core traits for the as3 prefix crawler.
//!
//! - [`ListingClient`] - Trait for paginated, delimiter-aware listing backends

pub mod listing;

pub use listing::*;

//! Core types for the as3 prefix crawler.
//!
//! - [`ObjectRecord`] - One object found by a listing call
//! - [`ListPage`] - One page returned by a listing backend

pub mod page;
pub mod record;

pub use page::*;
pub use record::*;

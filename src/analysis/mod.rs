//! Analysis modules.
//!
//! `decode` turns the stored payload into typed entries and
//! `aggregator` derives the dashboard view from them.

pub mod aggregator;
pub mod decode;

pub use aggregator::*;
pub use decode::{decode_entries, DecodeError};

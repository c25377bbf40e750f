//! Database entities.

pub mod exchanges;

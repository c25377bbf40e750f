#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Durable conversation history backed by `sea-orm`.
//!
//! Exchanges are appended once per successful turn and read back as a
//! token-bounded [`HistoryWindow`](kefu_core::HistoryWindow).

mod convert;
mod manager;

pub use kefu_core::HistoryStore;
pub use manager::HistoryManager;

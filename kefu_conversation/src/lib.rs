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

//! Multi-turn customer-service conversations.
//!
//! One [`ConversationManager`] serves one (user, platform) session per
//! process. Each turn asks the retrieval backend for context, generates a
//! reply and appends the exchange to the history store.
//!
//! # Key Features
//! - Identity taken from the first message, or from configured defaults
//! - Recent history replayed into the first prompt only
//! - Typed errors for every condition that aborts a turn

mod error;
mod history;
mod identity;
mod manager;
mod session;

pub use error::ConversationError;
pub use history::{HistoryConfig, PromptStats, build_llm_messages, frame_retrieval};
pub use identity::{Identity, InboundMessage};
pub use manager::{ConversationConfig, ConversationManager, TurnResult, TurnUsage};
pub use session::{ConversationSession, SessionState};

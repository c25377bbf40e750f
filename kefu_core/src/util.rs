//! Shared defaults.

/// System instruction sent at the head of every prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the following information to respond to the user's query.\nPlease keep your response within 500 tokens.\nAnswer in Chinese.";

/// User id bound to a session whose first message carries no `user_id:` marker.
pub const DEFAULT_USER_ID: &str = "user_123";

/// Platform bound to a session whose first message carries no `platform:` marker.
pub const DEFAULT_PLATFORM: &str = "taobao";

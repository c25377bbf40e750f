//! Identity markers embedded in raw chat text.
//!
//! Upstream channels sometimes prefix a message with `user_id: <id>` and
//! `platform: <name>`. [`InboundMessage::parse`] turns such text into a
//! structured message; everything past this module works on the structured
//! form only.

use kefu_core::{DEFAULT_PLATFORM, DEFAULT_USER_ID};
use once_cell::sync::OnceCell;
use regex::{Captures, Regex};

static USER_ID_PATTERN: OnceCell<Regex> = OnceCell::new();
static PLATFORM_PATTERN: OnceCell<Regex> = OnceCell::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn user_id_pattern() -> &'static Regex {
    USER_ID_PATTERN.get_or_init(|| {
        Regex::new(r"user_id:\s*(\w+)").expect("Static regex pattern is guaranteed to be valid")
    })
}

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn platform_pattern() -> &'static Regex {
    PLATFORM_PATTERN.get_or_init(|| {
        Regex::new(r"platform:\s*(\w+)").expect("Static regex pattern is guaranteed to be valid")
    })
}

/// The (user, platform) pair a session is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub user_id: String,
    pub platform: String,
}

impl Identity {
    #[must_use]
    pub fn new(user_id: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            platform: platform.into(),
        }
    }

    /// Find the identity markers in `raw`, substituting the defaults for
    /// any marker that is absent.
    #[must_use]
    pub fn extract(raw: &str) -> Self {
        Self::extract_with(raw, &Self::default())
    }

    /// Like [`Identity::extract`] with caller-supplied fallbacks.
    #[must_use]
    pub fn extract_with(raw: &str, fallback: &Self) -> Self {
        let capture = |re: &Regex| {
            re.captures(raw)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };

        Self {
            user_id: capture(user_id_pattern()).unwrap_or_else(|| fallback.user_id.clone()),
            platform: capture(platform_pattern()).unwrap_or_else(|| fallback.platform.clone()),
        }
    }

    /// Remove this identity's markers from `raw` and trim the result.
    ///
    /// Only `user_id:<id>` and `platform:<platform>` markers for the bound
    /// values are removed (with any whitespace after the colon, as accepted
    /// by extraction), so markers naming someone else stay.
    #[must_use]
    pub fn strip_markers(&self, raw: &str) -> String {
        let text = remove_marker(raw, "user_id", &self.user_id);
        remove_marker(&text, "platform", &self.platform)
            .trim()
            .to_string()
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new(DEFAULT_USER_ID, DEFAULT_PLATFORM)
    }
}

/// Remove every `<key>:<value>` marker for exactly `value`. A match followed
/// by more word characters is kept (`user_id: u1` must not eat the prefix of
/// `user_id: u10`).
fn remove_marker(text: &str, key: &str, value: &str) -> String {
    let pattern = format!(r"{key}:\s*{}(\w*)", regex::escape(value));
    let Ok(re) = Regex::new(&pattern) else {
        return text.to_string();
    };

    re.replace_all(text, |caps: &Captures| {
        if caps[1].is_empty() {
            String::new()
        } else {
            caps[0].to_string()
        }
    })
    .into_owned()
}

/// A chat message with its sender identity already separated out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub identity: Identity,
    pub text: String,
}

impl InboundMessage {
    #[must_use]
    pub fn new(user_id: impl Into<String>, platform: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identity: Identity::new(user_id, platform),
            text: text.into(),
        }
    }

    /// Split raw marker-prefixed text into identity and sanitized message.
    #[must_use]
    pub fn parse(raw: &str, fallback: &Identity) -> Self {
        let identity = Identity::extract_with(raw, fallback);
        let text = identity.strip_markers(raw);
        Self { identity, text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_both_markers() {
        let id = Identity::extract("user_id: u1 platform: jd hello there");
        assert_eq!(id, Identity::new("u1", "jd"));
    }

    #[test]
    fn test_extract_without_space_after_colon() {
        let id = Identity::extract("platform:jd user_id:abc_9 where is my order");
        assert_eq!(id.user_id, "abc_9");
        assert_eq!(id.platform, "jd");
    }

    #[test]
    fn test_extract_defaults_when_absent() {
        assert_eq!(
            Identity::extract("where is my order"),
            Identity::new("user_123", "taobao")
        );
        assert_eq!(
            Identity::extract("user_id: u7 hi"),
            Identity::new("u7", "taobao")
        );
        assert_eq!(
            Identity::extract("platform: pdd hi"),
            Identity::new("user_123", "pdd")
        );
    }

    #[test]
    fn test_extract_token_stops_at_non_word_char() {
        let id = Identity::extract("user_id: u1-extra platform: jd.com");
        assert_eq!(id, Identity::new("u1", "jd"));
    }

    #[test]
    fn test_extract_with_custom_fallback() {
        let fallback = Identity::new("guest", "web");
        assert_eq!(Identity::extract_with("hi", &fallback), fallback);
    }

    #[test]
    fn test_strip_markers() {
        let id = Identity::new("u1", "jd");
        assert_eq!(id.strip_markers("user_id: u1 platform: jd hello there"), "hello there");
        assert_eq!(id.strip_markers("  hello  "), "hello");
    }

    #[test]
    fn test_strip_markers_without_space() {
        let id = Identity::new("u1", "jd");
        assert_eq!(id.strip_markers("user_id:u1 platform:jd hello"), "hello");
        assert_eq!(id.strip_markers("user_id:   u1\tplatform:jd  hello"), "hello");
    }

    #[test]
    fn test_strip_escapes_bound_values() {
        let id = Identity::new("a.b", "jd");
        assert_eq!(id.strip_markers("user_id: a.b hi user_id: axb"), "hi user_id: axb");
    }

    #[test]
    fn test_strip_leaves_other_identities() {
        let id = Identity::new("u1", "jd");
        assert_eq!(
            id.strip_markers("user_id: u1 tell user_id: u2 about platform: taobao"),
            "tell user_id: u2 about platform: taobao"
        );
    }

    #[test]
    fn test_strip_does_not_cut_longer_tokens() {
        let id = Identity::new("u1", "jd");
        assert_eq!(
            id.strip_markers("user_id: u1 ask user_id: u10 on platform: jdx"),
            "ask user_id: u10 on platform: jdx"
        );
    }

    #[test]
    fn test_parse_inbound() {
        let msg = InboundMessage::parse("user_id: u1 platform: jd hello there", &Identity::default());
        assert_eq!(msg, InboundMessage::new("u1", "jd", "hello there"));

        let msg = InboundMessage::parse("user_id:u1 platform:jd hello", &Identity::default());
        assert_eq!(msg, InboundMessage::new("u1", "jd", "hello"));
    }
}

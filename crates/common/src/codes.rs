//! Code generation and format validation.
//!
//! Events carry three opaque identifiers: a URL slug chosen by the host,
//! an 8-character short code attendees can type in, and a `host_`-prefixed
//! bearer code granting administrative control. Anonymous attendees are
//! keyed by a 32-character session token.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use uuid::Uuid;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[a-z0-9-]{3,50}$").unwrap()
});

static HOST_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^host_[a-z0-9]{12}$").unwrap()
});

static CUSTOM_HOST_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[A-Za-z0-9_-]{3,30}$").unwrap()
});

/// Check slug format: 3-50 chars, lowercase alphanumeric and hyphens.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

/// Check generated host code format (`host_` + 12 lowercase alphanumerics).
#[must_use]
pub fn is_valid_host_code(code: &str) -> bool {
    HOST_CODE_RE.is_match(code)
}

/// Check a host-supplied custom code before prefixing.
#[must_use]
pub fn is_valid_custom_host_code(code: &str) -> bool {
    CUSTOM_HOST_CODE_RE.is_match(code)
}

const SHORT_CODE_LEN: usize = 8;
const HOST_CODE_RANDOM_LEN: usize = 12;

/// Generator for access codes and session tokens.
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    _private: (),
}

impl CodeGenerator {
    /// Create a new code generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a 32-character session token for anonymous attendees.
    ///
    /// Tokens are random (no time component) so they carry no ordering
    /// information about when an attendee first joined.
    #[must_use]
    pub fn generate_session_token(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Generate an 8-character uppercase alphanumeric short code.
    #[must_use]
    pub fn generate_short_code(&self) -> String {
        const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let mut rng = rand::thread_rng();
        (0..SHORT_CODE_LEN)
            .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
            .collect()
    }

    /// Generate a host authentication code: `host_` + 12 lowercase alphanumerics.
    #[must_use]
    pub fn generate_host_code(&self) -> String {
        const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::thread_rng();
        let random: String = (0..HOST_CODE_RANDOM_LEN)
            .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
            .collect();
        format!("host_{random}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_shape() {
        let codes = CodeGenerator::new();
        let token = codes.generate_session_token();
        assert_eq!(token.len(), 32);
        assert_ne!(token, codes.generate_session_token());
    }

    #[test]
    fn test_short_code_shape() {
        let codes = CodeGenerator::new();
        let code = codes.generate_short_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_host_code_shape() {
        let codes = CodeGenerator::new();
        let code = codes.generate_host_code();
        assert!(is_valid_host_code(&code), "bad host code: {code}");
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("rust-meetup-2026"));
        assert!(!is_valid_slug("ab"));
        assert!(!is_valid_slug("Has-Uppercase"));
        assert!(!is_valid_slug("spaces here"));
        assert!(!is_valid_slug(&"x".repeat(51)));
    }

    #[test]
    fn test_custom_host_code_validation() {
        assert!(is_valid_custom_host_code("my-team_42"));
        assert!(!is_valid_custom_host_code("ab"));
        assert!(!is_valid_custom_host_code("has spaces"));
    }
}

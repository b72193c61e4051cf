//! Secrets redaction to keep stamped credentials out of the logs

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Placeholder for redacted content
pub const REDACTED: &str = "[REDACTED]";

static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
static SECRET_KEY: OnceLock<Regex> = OnceLock::new();

fn secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        vec![
            // Bearer tokens
            Regex::new(r"(?i)bearer\s+[a-zA-Z0-9_\-\.]{20,}").expect("invalid bearer regex"),
            // AWS access keys
            Regex::new(r"AKIA[A-Z0-9]{16}").expect("invalid aws regex"),
            // GitHub tokens
            Regex::new(r"(ghp_[a-zA-Z0-9]{36}|github_pat_[a-zA-Z0-9_]{22,})")
                .expect("invalid github regex"),
            // Passwords inside connection strings
            Regex::new(r"(?i)(password|passwd|pwd)\s*=\s*[^;\s]+").expect("invalid password regex"),
            // Credentials in URLs
            Regex::new(r"(?i)(mongodb|postgres|postgresql|mysql|redis|amqp)://[^\s:@/]+:[^\s@/]+@")
                .expect("invalid url credential regex"),
            // JWT tokens (basic pattern)
            Regex::new(r"eyJ[a-zA-Z0-9_-]*\.eyJ[a-zA-Z0-9_-]*\.[a-zA-Z0-9_-]*")
                .expect("invalid jwt regex"),
        ]
    })
}

/// Last path segment names that mark the whole value as sensitive.
fn secret_key() -> &'static Regex {
    SECRET_KEY.get_or_init(|| {
        Regex::new(
            r"(?i)(password|passwd|pwd|secret|token|apikey|api_key|accesskey|privatekey|credential|connectionstring)",
        )
        .expect("invalid secret key regex")
    })
}

/// Redact secret-looking fragments from a string
pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    let mut result = Cow::Borrowed(input);

    for pattern in secret_patterns() {
        if pattern.is_match(&result) {
            result = Cow::Owned(pattern.replace_all(&result, REDACTED).into_owned());
        }
    }

    result
}

/// Whether a variable key addresses a sensitive setting.
pub fn is_secret_key(key: &str) -> bool {
    let last = key.rsplit('.').next().unwrap_or(key);
    secret_key().is_match(last)
}

/// The form of a replacement value that is safe to log.
pub fn loggable_value<'a>(key: &str, value: &'a str) -> Cow<'a, str> {
    if is_secret_key(key) {
        Cow::Borrowed(REDACTED)
    } else {
        redact_secrets(value)
    }
}

//! Secret detection, masking sentinel, and redaction utilities.
//!
//! Two rules live here:
//! - config fields are secret when their key contains `api_key` (the rule the
//!   config API uses when it masks values), and
//! - log/diagnostic keys are redacted by a broader name heuristic.

/// Literal value the config API returns in place of a withheld secret.
///
/// It must never be treated as, or submitted as, a real value.
pub const MASK_SENTINEL: &str = "****";

/// The redacted placeholder string used in logs.
pub const REDACTED: &str = "[REDACTED]";

const SECRET_FIELD_TOKEN: &str = "api_key";

/// Returns true when a config field key names a secret.
///
/// # Examples
///
/// ```
/// use config_console_shared::is_secret_field_key;
///
/// assert!(is_secret_field_key("api_key"));
/// assert!(is_secret_field_key("OPENAI_API_KEY"));
/// assert!(!is_secret_field_key("base_url"));
/// ```
pub fn is_secret_field_key(key: &str) -> bool {
    key.to_ascii_lowercase().contains(SECRET_FIELD_TOKEN)
}

/// Returns true when a text value means "keep the stored secret".
///
/// Blank input and the mask sentinel both qualify.
pub fn is_withheld_secret_text(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == MASK_SENTINEL
}

/// Checks if a log/diagnostic key likely refers to a secret.
///
/// # Examples
///
/// ```
/// use config_console_shared::is_secret_key;
///
/// assert!(is_secret_key("api_key"));
/// assert!(is_secret_key("Authorization"));
/// assert!(!is_secret_key("section"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("KEY")
        || key.contains("TOKEN")
        || key.contains("SECRET")
        || key.contains("PASSWORD")
        || key.contains("CREDENTIAL")
        || key.contains("AUTH")
}

/// Redacts a value if the key is likely a secret.
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

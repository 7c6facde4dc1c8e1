//! Masking-aware merge rules for outgoing patches.
//!
//! A key is secret when it contains `api_key` (case-insensitive). A secret whose
//! value is blank, `null`, or the mask sentinel is dropped from the patch so a
//! displayed mask is never written back over the real credential. The rule only
//! looks at top-level keys and ignores the schema's `writeOnly`.

use config_console_shared::{is_secret_field_key, is_withheld_secret_text};
use serde_json::{Map, Value};

/// Result of reconciling one outgoing section body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    /// Fields to submit.
    pub body: Map<String, Value>,
    /// Secret keys that were dropped because they carried no new value.
    pub withheld: Vec<String>,
}

/// Applies the secret merge rule to outgoing section bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretReconciler;

impl SecretReconciler {
    /// Returns true when `(key, value)` belongs in an outgoing patch.
    #[must_use]
    pub fn should_submit(key: &str, value: &Value) -> bool {
        if !is_secret_field_key(key) {
            return true;
        }
        match value {
            Value::Null => false,
            Value::String(text) => !is_withheld_secret_text(text),
            _ => true,
        }
    }

    /// Strip withheld secrets from a section body.
    #[must_use]
    pub fn reconcile(body: Map<String, Value>) -> Reconciled {
        let mut reconciled = Reconciled::default();
        for (key, value) in body {
            if Self::should_submit(&key, &value) {
                reconciled.body.insert(key, value);
            } else {
                reconciled.withheld.push(key);
            }
        }
        reconciled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_console_shared::MASK_SENTINEL;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn sentinel_and_blank_secrets_are_withheld() {
        let reconciled = SecretReconciler::reconcile(body(json!({
            "api_key": MASK_SENTINEL,
            "EMBED_API_KEY": "  ",
            "backup_api_key": null,
            "model": "m",
        })));

        assert_eq!(reconciled.body, body(json!({"model": "m"})));
        assert_eq!(
            reconciled.withheld,
            vec!["api_key", "EMBED_API_KEY", "backup_api_key"]
        );
    }

    #[test]
    fn new_secret_values_pass_through() {
        let reconciled = SecretReconciler::reconcile(body(json!({
            "api_key": "sk-new",
            "timeout": 30,
        })));

        assert_eq!(
            reconciled.body,
            body(json!({"api_key": "sk-new", "timeout": 30}))
        );
        assert!(reconciled.withheld.is_empty());
    }

    #[test]
    fn non_secret_blank_values_are_kept() {
        assert!(SecretReconciler::should_submit("model", &json!("")));
        assert!(SecretReconciler::should_submit("password", &json!(MASK_SENTINEL)));
        assert!(SecretReconciler::should_submit("dimensions", &Value::Null));
    }

    #[test]
    fn nested_keys_are_not_scanned() {
        let reconciled = SecretReconciler::reconcile(body(json!({
            "providers": {"api_key": MASK_SENTINEL},
        })));
        assert!(reconciled.body.contains_key("providers"));
    }
}

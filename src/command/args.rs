// src/command/args.rs

//! Free-form argument strings.

use serde_json::Value;

/// Placeholder argument replaced by the configured secret.
pub const SECRET_PLACEHOLDER: &str = "SECRET";

/// Parse a string as JSON, passing it through unchanged as a JSON string when
/// it is not valid JSON.
///
/// `'["-i", "in.mp4"]'` becomes an array; `"-version"` stays a string (and is
/// later rejected by `validate_args`).
pub fn json_or_passthrough(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

/// Replace the first [`SECRET_PLACEHOLDER`] argument with `secret`.
///
/// Returns true if a substitution happened.
pub fn substitute_secret(args: &mut [String], secret: &str) -> bool {
    match args.iter_mut().find(|a| a.as_str() == SECRET_PLACEHOLDER) {
        Some(slot) => {
            *slot = secret.to_string();
            true
        }
        None => false,
    }
}

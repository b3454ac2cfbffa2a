//! Log-safe message formatting.

use std::error::Error;

use serde::Serialize;

/// Renders `value` as JSON after `prefix`.
///
/// Never fails: a value that cannot be serialized is rendered as
/// `[unserializable: <reason>]`.
pub fn describe<T: Serialize + ?Sized>(prefix: &str, value: &T) -> String {
    let body = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => format!("[unserializable: {e}]"),
    };

    if prefix.is_empty() {
        body
    } else {
        format!("{prefix} {body}")
    }
}

/// Formats an error with its whole `source()` chain, joined by `": "`.
pub fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // thiserror messages often embed their source already.
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

//! Observer errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid page snapshot: {0}")]
    InvalidPage(#[from] serde_json::Error),
}

impl ObserverError {
    pub(crate) fn selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_selector_error() {
        let err = ObserverError::selector("[role=", "unterminated attribute");
        let msg = err.to_string();
        assert!(msg.contains("[role="));
        assert!(msg.contains("unterminated attribute"));
    }

    #[test]
    fn test_invalid_page_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ObserverError::from(json_err);
        assert!(err.to_string().contains("Invalid page snapshot"));
    }
}

//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a `ConfigError`, if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_backend(config, &mut result);
        Self::validate_timing(config, &mut result);
        Self::validate_observer(config, &mut result);
        Self::validate_panel(config, &mut result);

        Ok(result)
    }

    fn validate_backend(config: &Config, result: &mut ValidationResult) {
        let url = &config.backend.base_url;
        if url.is_empty() {
            result.add_error(ValidationError::new(
                "backend.base_url",
                "base_url cannot be empty",
            ));
        } else if !url.starts_with("http://") && !url.starts_with("https://") {
            result.add_error(ValidationError::new(
                "backend.base_url",
                "base_url must start with http:// or https://",
            ));
        }

        if config.backend.request_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "backend.request_timeout_secs",
                "request_timeout_secs must be greater than 0",
            ));
        }
    }

    fn validate_timing(config: &Config, result: &mut ValidationResult) {
        let timing = &config.timing;
        let windows = [
            ("timing.focus_debounce_ms", timing.focus_debounce_ms),
            ("timing.focus_cooldown_ms", timing.focus_cooldown_ms),
            ("timing.intent_cooldown_ms", timing.intent_cooldown_ms),
            ("timing.context_idle_ms", timing.context_idle_ms),
            ("timing.settle_delay_ms", timing.settle_delay_ms),
            ("timing.snippet_timeout_ms", timing.snippet_timeout_ms),
            ("timing.auth_poll_interval_ms", timing.auth_poll_interval_ms),
        ];
        for (path, value) in windows {
            if value == 0 {
                result.add_error(ValidationError::new(path, "must be greater than 0"));
            }
        }

        if timing.focus_debounce_ms >= timing.focus_cooldown_ms {
            result.add_warning(ValidationWarning::new(
                "timing.focus_debounce_ms",
                "debounce is not shorter than the focus cooldown, repeated focus will rarely be suppressed",
            ));
        }

        if timing.context_idle_ms < timing.intent_cooldown_ms {
            result.add_warning(ValidationWarning::new(
                "timing.context_idle_ms",
                "context idle window is shorter than the intent cooldown",
            ));
        }

        if timing.snippet_timeout_ms > 10_000 {
            result.add_warning(ValidationWarning::new(
                "timing.snippet_timeout_ms",
                "snippet timeout above 10s delays every backend request",
            ));
        }
    }

    fn validate_observer(config: &Config, result: &mut ValidationResult) {
        let observer = &config.observer;
        if observer.connectors.is_empty() {
            result.add_warning(ValidationWarning::new(
                "observer.connectors",
                "No connectors configured, connector detection is disabled",
            ));
        }

        if observer.title_selectors.is_empty() {
            result.add_warning(ValidationWarning::new(
                "observer.title_selectors",
                "No title selectors configured, context updates will never fire",
            ));
        }

        if observer.max_label_len == 0 {
            result.add_error(ValidationError::new(
                "observer.max_label_len",
                "max_label_len must be greater than 0",
            ));
        }

        if observer.snippet_max_chars == 0 {
            result.add_error(ValidationError::new(
                "observer.snippet_max_chars",
                "snippet_max_chars must be greater than 0",
            ));
        }
    }

    fn validate_panel(config: &Config, result: &mut ValidationResult) {
        for (index, rule) in config.panel.dynamic_fields.iter().enumerate() {
            if rule.class.is_empty() {
                result.add_error(ValidationError::new(
                    format!("panel.dynamic_fields[{}].class", index),
                    "class cannot be empty",
                ));
            }
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                result.add_warning(ValidationWarning::new(
                    format!("panel.dynamic_fields[{}].keywords", index),
                    format!("Dynamic field class '{}' has no keywords", rule.class),
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

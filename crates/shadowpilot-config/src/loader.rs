//! Configuration loader.

use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::error::ConfigError;
use crate::schema::Config;

/// Loads TOML configuration with `${VAR}` substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&expanded)?;
        if let Some(dir) = config.logging.directory.take() {
            let expanded = Self::expand_path(&dir.to_string_lossy());
            config.logging.directory = Some(expanded.into());
        }
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::InvalidValue {
            field: "pattern".to_string(),
            message: e.to_string(),
        })?;

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.shadowpilot`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.timing.focus_debounce_ms, 800);
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn test_load_backend_section() {
        let content = r#"
            [backend]
            base_url = "https://assist.example.com"
            request_timeout_secs = 30
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.backend.base_url, "https://assist.example.com");
        assert_eq!(config.backend.request_timeout_secs, 30);
    }

    #[test]
    fn test_load_observer_vocabulary() {
        let content = r#"
            [observer]
            connectors = ["Jira", "Box"]
            generic_titles = ["Home"]
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.observer.connectors, vec!["Jira", "Box"]);
        assert_eq!(config.observer.max_label_len, 80);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[timing]").unwrap();
        writeln!(file, "intent_cooldown_ms = 3000").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.timing.intent_cooldown_ms, 3000);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            ConfigLoader::load_or_default(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config.timing.context_idle_ms, 5000);
    }

    #[test]
    fn test_load_or_default_existing_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "level = \"debug\"").unwrap();

        let config = ConfigLoader::load_or_default(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_log_directory_tilde_expanded() {
        let content = r#"
            [logging]
            directory = "~/.shadowpilot/logs"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        let dir = config.logging.directory.unwrap();
        assert!(!dir.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_expand_path() {
        let expanded = ConfigLoader::expand_path("~/.shadowpilot");
        assert!(!expanded.starts_with('~'));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: unique test-only variable
        unsafe {
            std::env::set_var("SHADOWPILOT_TEST_BACKEND", "http://10.0.0.5:8000");
        }
        let content = "[backend]\nbase_url = \"${SHADOWPILOT_TEST_BACKEND}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.backend.base_url, "http://10.0.0.5:8000");
        unsafe {
            std::env::remove_var("SHADOWPILOT_TEST_BACKEND");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${SHADOWPILOT_MISSING_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(name)) if name == "SHADOWPILOT_MISSING_VAR_12345"));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }
}

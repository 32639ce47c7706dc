// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express, such
//! as a usable bind address, a known log level, and an http(s) provider URL.

use crate::diagnostic::ConfigError;
use crate::model::VivaConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns all collected validation errors (does not fail fast).
pub fn validate_config(config: &VivaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "server.log_level `{}` must be one of: {}",
                config.server.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let base_url = &config.elevenlabs.base_url;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(ConfigError::Validation {
            message: format!("elevenlabs.base_url `{base_url}` must start with http:// or https://"),
        });
    }

    if config.elevenlabs.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "elevenlabs.timeout_secs must be greater than 0".to_string(),
        });
    }

    if let Some(secret) = &config.webhook.secret
        && secret.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "webhook.secret must not be blank when set".to_string(),
        });
    }

    if config.webhook.signature_header.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "webhook.signature_header must not be empty".to_string(),
        });
    }

    if config.webhook.placeholder_owner.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "webhook.placeholder_owner must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&VivaConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = VivaConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = VivaConfig::default();
        config.server.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "log_level"));
    }

    #[test]
    fn non_http_base_url_fails_validation() {
        let mut config = VivaConfig::default();
        config.elevenlabs.base_url = "api.elevenlabs.io".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "base_url"));
    }

    #[test]
    fn blank_secret_fails_validation() {
        let mut config = VivaConfig::default();
        config.webhook.secret = Some(" ".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "webhook.secret"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = VivaConfig::default();
        config.server.host = String::new();
        config.elevenlabs.timeout_secs = 0;
        config.webhook.placeholder_owner = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = VivaConfig::default();
        config.server.host = "0.0.0.0".to_string();
        config.storage.database_path = "/tmp/viva.db".to_string();
        config.elevenlabs.base_url = "http://127.0.0.1:9000".to_string();
        config.webhook.secret = Some("wsec_test".to_string());
        assert!(validate_config(&config).is_ok());
    }
}

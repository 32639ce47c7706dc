// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator commands: `check-config` and `sign`.

use std::path::Path;

use viva_config::VivaConfig;
use viva_core::VivaError;
use viva_webhook::signature;

const REDACTED: &str = "[redacted]";

/// Renders the effective configuration as TOML with every secret masked.
pub fn redacted_toml(config: &VivaConfig) -> Result<String, VivaError> {
    let mut shown = config.clone();
    for secret in [
        &mut shown.server.api_token,
        &mut shown.elevenlabs.api_key,
        &mut shown.webhook.secret,
    ] {
        if secret.is_some() {
            *secret = Some(REDACTED.to_string());
        }
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| VivaError::Internal(format!("failed to render config: {e}")))
}

/// Signs the exact bytes of `path`, as the provider would.
pub fn sign_file(path: &Path, secret: &[u8]) -> Result<String, VivaError> {
    let body = std::fs::read(path).map_err(|e| {
        VivaError::Internal(format!("failed to read {}: {e}", path.display()))
    })?;
    Ok(signature::sign(&body, secret))
}

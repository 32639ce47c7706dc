// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./viva.toml` > `~/.config/viva/viva.toml` > `/etc/viva/viva.toml`
//! with environment variable overrides via `VIVA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::VivaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/viva/viva.toml` (system-wide)
/// 3. `~/.config/viva/viva.toml` (user XDG config)
/// 4. `./viva.toml` (local directory)
/// 5. `VIVA_*` environment variables
pub fn load_config() -> Result<VivaConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<VivaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VivaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VivaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VivaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(VivaConfig::default()))
        .merge(Toml::file("/etc/viva/viva.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("viva/viva.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("viva.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `VIVA_WEBHOOK_PLACEHOLDER_OWNER` must map to
/// `webhook.placeholder_owner`, not `webhook.placeholder.owner`.
fn env_provider() -> Env {
    Env::prefixed("VIVA_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("elevenlabs_", "elevenlabs.", 1)
            .replacen("webhook_", "webhook.", 1);
        mapped.into()
    })
}

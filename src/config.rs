//! # CORS Configuration Module
//!
//! Startup-time configuration for the CORS policy, loadable from a YAML file
//! or from environment variables.
//!
//! ## Overview
//!
//! [`CorsConfig`] mirrors the policy fields of
//! [`CorsMiddleware`](crate::middleware::CorsMiddleware) as plain data so a
//! deployment can keep its CORS policy next to the rest of its service
//! configuration. Convert it with [`CorsConfig::into_middleware`] once at
//! startup; the middleware is immutable from then on.
//!
//! ## YAML
//!
//! ```yaml
//! allowed_origins:
//!   - https://app.example
//! allowed_methods:
//!   - GET
//!   - POST
//! max_age: 3600
//! supports_credentials: true
//! ```
//!
//! Absent keys fall back to the defaults: wildcard origins, methods, and
//! headers; no exposed headers; no max age; no credentials.
//!
//! ## Environment Variables
//!
//! | Variable | Format | Default |
//! |---|---|---|
//! | `CORSGATE_ALLOWED_ORIGINS` | comma-separated | `*` |
//! | `CORSGATE_ALLOWED_METHODS` | comma-separated | `*` |
//! | `CORSGATE_ALLOWED_HEADERS` | comma-separated | `*` |
//! | `CORSGATE_EXPOSED_HEADERS` | comma-separated | empty |
//! | `CORSGATE_MAX_AGE` | integer seconds | `0` |
//! | `CORSGATE_SUPPORTS_CREDENTIALS` | `true`/`1` | `false` |
//!
//! Unset or unparseable values fall back to their defaults rather than
//! failing startup.

use std::env;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::middleware::CorsMiddleware;

/// Declarative CORS policy, one field per policy knob.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins permitted; `*` as first element allows any origin
    pub allowed_origins: Vec<String>,
    /// Methods advertised in `Access-Control-Allow-Methods`
    pub allowed_methods: Vec<String>,
    /// Headers advertised in `Access-Control-Allow-Headers`
    pub allowed_headers: Vec<String>,
    /// Headers advertised in `Access-Control-Expose-Headers`; omitted if empty
    pub exposed_headers: Vec<String>,
    /// `Access-Control-Max-Age` seconds; omitted if ≤ 0
    pub max_age: i64,
    /// Emit `Access-Control-Allow-Credentials: true`
    pub supports_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".into()],
            allowed_methods: vec!["*".into()],
            allowed_headers: vec!["*".into()],
            exposed_headers: vec![],
            max_age: 0,
            supports_credentials: false,
        }
    }
}

impl CorsConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read CORS config {}", path.display()))?;
        let config = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse CORS config {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration from `CORSGATE_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            allowed_origins: env_list("CORSGATE_ALLOWED_ORIGINS")
                .unwrap_or(defaults.allowed_origins),
            allowed_methods: env_list("CORSGATE_ALLOWED_METHODS")
                .unwrap_or(defaults.allowed_methods),
            allowed_headers: env_list("CORSGATE_ALLOWED_HEADERS")
                .unwrap_or(defaults.allowed_headers),
            exposed_headers: env_list("CORSGATE_EXPOSED_HEADERS").unwrap_or_default(),
            max_age: env::var("CORSGATE_MAX_AGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_age),
            supports_credentials: env::var("CORSGATE_SUPPORTS_CREDENTIALS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.supports_credentials),
        }
    }

    /// Convert into a ready-to-serve middleware.
    #[must_use]
    pub fn into_middleware(self) -> CorsMiddleware {
        CorsMiddleware::new()
            .allowed_origins(self.allowed_origins)
            .allowed_methods(self.allowed_methods)
            .allowed_headers(self.allowed_headers)
            .exposed_headers(self.exposed_headers)
            .max_age(self.max_age)
            .supports_credentials(self.supports_credentials)
    }
}

/// Parse a comma-separated env var into a trimmed list; empty entries are
/// dropped and an empty result counts as unset.
fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = env::var(key).ok()?;
    let values: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

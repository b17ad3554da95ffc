//! Server-side secrets.
//!
//! Secrets never live in [`Settings`](crate::config::Settings). Each edge
//! function looks up what it needs through a [`SecretSource`] at request
//! time, so rotating a value in the environment takes effect on the next
//! request and a missing value fails only the functions that need it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use subtle::ConstantTimeEq;

use crate::error::{AppError, AppResult};

/// Names of the secrets read by the edge functions.
pub mod names {
    pub const PRICE_API_KEY: &str = "PRICE_API_KEY";
    pub const HELIUS_RPC_URL: &str = "HELIUS_RPC_URL";
    pub const TWITTER_BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";
    pub const VANITY_SECRET: &str = "VANITY_SECRET";
    pub const SUPABASE_URL: &str = "SUPABASE_URL";
    pub const SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
    pub const SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
    pub const DB_WEBHOOK_SECRET: &str = "DB_WEBHOOK_SECRET";
}

/// Where secret values come from.
pub trait SecretSource: Send + Sync + 'static {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads the process environment on every lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed values, used by tests and by embedders that resolve secrets themselves.
#[derive(Clone, Default)]
pub struct StaticSecrets {
    values: HashMap<String, String>,
}

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl SecretSource for StaticSecrets {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Cloneable handle over a [`SecretSource`].
#[derive(Clone)]
pub struct Secrets {
    source: Arc<dyn SecretSource>,
}

impl Secrets {
    pub fn new(source: impl SecretSource) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub fn from_env() -> Self {
        Self::new(EnvSecrets)
    }

    /// Look up a secret; blank values count as unset.
    pub fn get(&self, name: &str) -> Option<String> {
        self.source
            .get(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Look up a secret the current function cannot run without.
    pub fn require(&self, name: &str) -> AppResult<String> {
        self.get(name).ok_or_else(|| {
            tracing::error!(secret = name, "required secret is not configured");
            AppError::configuration(name)
        })
    }

    /// Compare a caller-supplied credential against a required secret.
    ///
    /// Fails with `Configuration` when the secret itself is missing, so an
    /// unset secret is a 500 rather than a blanket 401.
    pub fn verify(&self, name: &str, candidate: &str) -> AppResult<bool> {
        let expected = self.require(name)?;
        Ok(expected.as_bytes().ct_eq(candidate.as_bytes()).into())
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets").finish_non_exhaustive()
    }
}

impl Default for Secrets {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> Secrets {
        Secrets::new(
            StaticSecrets::new()
                .with(names::VANITY_SECRET, "s3cret")
                .with(names::PRICE_API_KEY, "   "),
        )
    }

    #[test]
    fn test_require_missing_is_configuration_error() {
        match secrets().require(names::HELIUS_RPC_URL) {
            Err(AppError::Configuration { key }) => assert_eq!(key, "HELIUS_RPC_URL"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_blank_secret_counts_as_unset() {
        assert!(secrets().get(names::PRICE_API_KEY).is_none());
    }

    #[test]
    fn test_verify() {
        let secrets = secrets();
        assert!(secrets.verify(names::VANITY_SECRET, "s3cret").unwrap());
        assert!(!secrets.verify(names::VANITY_SECRET, "wrong").unwrap());
        assert!(!secrets.verify(names::VANITY_SECRET, "").unwrap());
        assert!(secrets.verify(names::DB_WEBHOOK_SECRET, "x").is_err());
    }

    #[test]
    fn test_verify_rejects_prefix_and_extension() {
        let secrets = secrets();
        assert!(!secrets.verify(names::VANITY_SECRET, "s3cre").unwrap());
        assert!(!secrets.verify(names::VANITY_SECRET, "s3cret!").unwrap());
        assert!(!secrets.verify(names::VANITY_SECRET, "S3CRET").unwrap());
    }
}

//! One-time capability probe results.
//!
//! Every adapter runs its probe exactly once while being constructed. A
//! failed probe is never fatal: it logs a warning and leaves the provider
//! permanently unavailable for the process lifetime.

use crate::error::{Result, UltimaError};

/// Outcome of a capability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    available: bool,
    reason: Option<String>,
}

impl Probe {
    /// Probe succeeded.
    #[must_use]
    pub const fn ready() -> Self {
        Self {
            available: true,
            reason: None,
        }
    }

    /// Probe failed; logs the reason once.
    #[must_use]
    pub fn failed(provider: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::warn!(provider, "Integration unavailable: {reason}");
        Self {
            available: false,
            reason: Some(reason),
        }
    }

    /// Provider disabled in configuration; logged at debug only.
    #[must_use]
    pub fn disabled(provider: &str) -> Self {
        tracing::debug!(provider, "Integration disabled in config");
        Self {
            available: false,
            reason: Some("disabled in config".to_string()),
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Guard used at the top of every backend call.
    ///
    /// # Errors
    ///
    /// Returns `ProviderUnavailable` when the probe failed.
    pub fn require(&self, provider: &str) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(UltimaError::ProviderUnavailable {
                provider: provider.to_string(),
                reason: self
                    .reason
                    .clone()
                    .unwrap_or_else(|| "capability probe failed".to_string()),
            })
        }
    }
}

//! The process-wide shared registry.
//!
//! Backs futures that belong to no particular API object: synchronously
//! resolved results and the cached invalid-state sentinel. Long-lived
//! operations must use a registry scoped to their owner; slots here are never
//! reclaimed.

use super::CompletionRegistry;
use crate::config::{self, RegistryConfig};
use crate::tracing_compat::{debug, warn};
use std::sync::OnceLock;

static SHARED: OnceLock<CompletionRegistry> = OnceLock::new();

/// Returns the shared default registry, creating it on first use.
///
/// Built from [`RegistryConfig::shared()`] with `SETTLE_*` environment
/// overrides; unusable overrides are logged and ignored.
pub fn shared_registry() -> &'static CompletionRegistry {
    SHARED.get_or_init(|| {
        let config = shared_config_from(|name| std::env::var(name).ok());
        let registry = CompletionRegistry::new(config);
        debug!(registry = %registry.id(), "shared registry initialized");
        registry
    })
}

/// Shared registry settings with overrides read through `lookup`.
///
/// Falls back to [`RegistryConfig::shared()`] as a whole if any override is
/// unusable, so a bad variable never prevents the shared registry from
/// being built.
pub(crate) fn shared_config_from<F>(lookup: F) -> RegistryConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = RegistryConfig::shared();
    match config::apply_overrides_from(&mut config, lookup) {
        Ok(()) => config,
        Err(_err) => {
            warn!(error = %_err, "ignoring invalid shared registry overrides");
            RegistryConfig::shared()
        }
    }
}

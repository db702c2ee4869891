//! Registry configuration.
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic**: values set via builder methods (`label("api")`)
//! 2. **Environment variables**: values from `SETTLE_*` env vars
//! 3. **Config file**: values loaded from a TOML file (requires `config-file` feature)
//! 4. **Defaults**: built-in defaults from [`RegistryConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `SETTLE_REGISTRY_LABEL` | `String` | `label` |
//! | `SETTLE_INITIAL_CAPACITY` | `usize`, at most [`MAX_INITIAL_CAPACITY`] | `initial_capacity` |
//! | `SETTLE_LAST_RESULT_COUNT` | `usize`, at most [`MAX_LAST_RESULT_COUNT`] | `last_result_count` |
//!
//! Out-of-range numbers from the environment or a config file are rejected
//! with [`ConfigError::InvalidValue`] rather than reaching the allocator.
//!
//! The shared default registry is built from [`RegistryConfig::shared()`]
//! with environment overrides applied.

/// Environment variable name for the registry label.
pub const ENV_REGISTRY_LABEL: &str = "SETTLE_REGISTRY_LABEL";
/// Environment variable name for the initial slot capacity.
pub const ENV_INITIAL_CAPACITY: &str = "SETTLE_INITIAL_CAPACITY";
/// Environment variable name for the number of tracked API-function indices.
pub const ENV_LAST_RESULT_COUNT: &str = "SETTLE_LAST_RESULT_COUNT";

/// Largest `initial_capacity` accepted from the environment or a config file.
pub const MAX_INITIAL_CAPACITY: usize = 1 << 20;
/// Largest `last_result_count` accepted from the environment or a config file.
pub const MAX_LAST_RESULT_COUNT: usize = 1024;

/// Label used by [`RegistryConfig::default()`].
pub const DEFAULT_LABEL: &str = "registry";
/// Label used by the shared default registry.
pub const SHARED_LABEL: &str = "shared";

/// Error raised while building a [`RegistryConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable or config entry held an unusable value.
    #[error("invalid value for {var}: expected {expected}, got {value:?}")]
    InvalidValue {
        /// Variable or key name.
        var: &'static str,
        /// What the value should have looked like.
        expected: &'static str,
        /// The rejected value.
        value: String,
    },
    /// The TOML document could not be parsed.
    #[error("failed to parse registry config: {0}")]
    Parse(String),
    /// The config file could not be read.
    #[error("failed to read registry config {path}: {source}")]
    Io {
        /// Path that was read.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for a [`CompletionRegistry`](crate::registry::CompletionRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Human-readable label attached to log events.
    pub label: String,
    /// Number of slots to reserve up front. The arena grows past this on demand.
    pub initial_capacity: usize,
    /// Number of API-function indices whose most recent future is tracked.
    pub last_result_count: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            initial_capacity: 0,
            last_result_count: 0,
        }
    }
}

impl RegistryConfig {
    /// Configuration for the shared default registry.
    #[must_use]
    pub fn shared() -> Self {
        Self {
            label: SHARED_LABEL.to_string(),
            initial_capacity: 64,
            last_result_count: 0,
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the initial slot capacity.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets the number of tracked API-function indices.
    #[must_use]
    pub fn last_result_count(mut self, count: usize) -> Self {
        self.last_result_count = count;
        self
    }

    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        apply_env_overrides(&mut config)?;
        Ok(config)
    }
}

/// Apply `SETTLE_*` environment variable overrides to `config`.
///
/// Only variables that are set are applied. Returns an error if a variable is
/// set but unparseable; in that case `config` may be partially updated.
pub fn apply_env_overrides(config: &mut RegistryConfig) -> Result<(), ConfigError> {
    apply_overrides_from(config, |name| std::env::var(name).ok())
}

/// Apply overrides using `lookup` in place of the process environment.
pub fn apply_overrides_from<F>(config: &mut RegistryConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_REGISTRY_LABEL) {
        config.label = val;
    }
    if let Some(val) = lookup(ENV_INITIAL_CAPACITY) {
        config.initial_capacity =
            parse_usize(ENV_INITIAL_CAPACITY, &val, MAX_INITIAL_CAPACITY)?;
    }
    if let Some(val) = lookup(ENV_LAST_RESULT_COUNT) {
        config.last_result_count =
            parse_usize(ENV_LAST_RESULT_COUNT, &val, MAX_LAST_RESULT_COUNT)?;
    }
    Ok(())
}

fn parse_usize(var: &'static str, val: &str, max: usize) -> Result<usize, ConfigError> {
    let parsed = val
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidValue {
            var,
            expected: "unsigned integer",
            value: val.to_string(),
        })?;
    check_bound(var, parsed, max)
}

fn check_bound(var: &'static str, value: usize, max: usize) -> Result<usize, ConfigError> {
    if value > max {
        return Err(ConfigError::InvalidValue {
            var,
            expected: "integer within the configured maximum",
            value: format!("{value} (max {max})"),
        });
    }
    Ok(value)
}

// =========================================================================
// TOML config file support (feature-gated)
// =========================================================================

/// TOML-deserializable registry configuration.
///
/// ```toml
/// [registry]
/// label = "firestore"
/// initial_capacity = 256
/// last_result_count = 12
/// ```
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct RegistryTomlConfig {
    /// Registry settings.
    #[serde(default)]
    pub registry: RegistryToml,
}

/// Registry section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct RegistryToml {
    /// Label attached to log events.
    pub label: Option<String>,
    /// Slots reserved up front.
    pub initial_capacity: Option<usize>,
    /// Tracked API-function indices.
    pub last_result_count: Option<usize>,
}

/// Apply a parsed TOML config to a [`RegistryConfig`].
///
/// Only fields that are `Some` in the TOML struct override the config.
/// Numbers above [`MAX_INITIAL_CAPACITY`] or [`MAX_LAST_RESULT_COUNT`] are
/// rejected; `config` may be partially updated in that case.
#[cfg(feature = "config-file")]
pub fn apply_toml_config(
    config: &mut RegistryConfig,
    toml: &RegistryTomlConfig,
) -> Result<(), ConfigError> {
    if let Some(ref v) = toml.registry.label {
        config.label.clone_from(v);
    }
    if let Some(v) = toml.registry.initial_capacity {
        config.initial_capacity = check_bound("initial_capacity", v, MAX_INITIAL_CAPACITY)?;
    }
    if let Some(v) = toml.registry.last_result_count {
        config.last_result_count = check_bound("last_result_count", v, MAX_LAST_RESULT_COUNT)?;
    }
    Ok(())
}

#[cfg(feature = "config-file")]
impl RegistryConfig {
    /// Parses a TOML document on top of the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let parsed: RegistryTomlConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();
        apply_toml_config(&mut config, &parsed)?;
        Ok(config)
    }

    /// Loads a TOML file, then applies environment overrides.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        apply_env_overrides(&mut config)?;
        Ok(config)
    }
}

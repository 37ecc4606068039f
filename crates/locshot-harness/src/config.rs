#![forbid(unsafe_code)]

//! Harness configuration.
//!
//! Defaults are suitable for a single test process. Every field can be
//! overridden from the environment so CI jobs can tune retention without
//! touching test code:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LOCSHOT_STORE_CAPACITY` | [`StoreConfig::capacity`] |
//! | `LOCSHOT_EXPIRE_PASSES` | [`StoreConfig::expire_after_passes`] (`0` or `never` disables) |
//! | `LOCSHOT_LAYERING` | [`InterceptionConfig::layering`] (`reject` / `layer`) |
//! | `LOCSHOT_SYSTEM_TABLES` | comma-separated system tables |
//! | `LOCSHOT_SYSTEM_MODULES` | comma-separated system modules |
//! | `LOCSHOT_LOG_JSON` | JSON log output (`1` / `true`) |

use locshot_core::{InterceptionConfig, LayeringPolicy};
use locshot_i18n::StoreConfig;

use crate::error::{HarnessError, Result};

/// Selector of the localization lookup the producer wraps.
pub const DEFAULT_LOOKUP_METHOD: &str = "localizedStringForKey:value:table:";

pub const ENV_STORE_CAPACITY: &str = "LOCSHOT_STORE_CAPACITY";
pub const ENV_EXPIRE_PASSES: &str = "LOCSHOT_EXPIRE_PASSES";
pub const ENV_LAYERING: &str = "LOCSHOT_LAYERING";
pub const ENV_SYSTEM_TABLES: &str = "LOCSHOT_SYSTEM_TABLES";
pub const ENV_SYSTEM_MODULES: &str = "LOCSHOT_SYSTEM_MODULES";
pub const ENV_LOG_JSON: &str = "LOCSHOT_LOG_JSON";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub store: StoreConfig,
    pub interception: InterceptionConfig,
    pub lookup_method: String,
    /// Records from these tables are framework chrome and never matched.
    pub system_tables: Vec<String>,
    /// Lookups on receivers from these modules are treated the same way.
    pub system_modules: Vec<String>,
    pub log_json: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            interception: InterceptionConfig::default(),
            lookup_method: DEFAULT_LOOKUP_METHOD.to_string(),
            system_tables: Vec::new(),
            system_modules: Vec::new(),
            log_json: false,
        }
    }
}

impl HarnessConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_STORE_CAPACITY) {
            let capacity: usize = raw
                .trim()
                .parse()
                .map_err(|_| HarnessError::config(ENV_STORE_CAPACITY, format!("not a count: {raw:?}")))?;
            if capacity == 0 {
                return Err(HarnessError::config(ENV_STORE_CAPACITY, "must be at least 1"));
            }
            config.store.capacity = capacity;
        }

        if let Some(raw) = lookup(ENV_EXPIRE_PASSES) {
            config.store.expire_after_passes = match raw.trim() {
                "" | "0" | "never" => None,
                n => Some(n.parse().map_err(|_| {
                    HarnessError::config(ENV_EXPIRE_PASSES, format!("not a pass count: {raw:?}"))
                })?),
            };
        }

        if let Some(raw) = lookup(ENV_LAYERING) {
            config.interception.layering = LayeringPolicy::parse(&raw).ok_or_else(|| {
                HarnessError::config(ENV_LAYERING, format!("expected `reject` or `layer`, got {raw:?}"))
            })?;
        }

        if let Some(raw) = lookup(ENV_SYSTEM_TABLES) {
            config.system_tables = split_list(&raw);
        }
        if let Some(raw) = lookup(ENV_SYSTEM_MODULES) {
            config.system_modules = split_list(&raw);
        }
        if let Some(raw) = lookup(ENV_LOG_JSON) {
            config.log_json = matches!(raw.trim(), "1" | "true" | "TRUE");
        }

        Ok(config)
    }

    #[must_use]
    pub fn store_capacity(mut self, capacity: usize) -> Self {
        self.store.capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn expire_after_passes(mut self, passes: Option<u32>) -> Self {
        self.store.expire_after_passes = passes;
        self
    }

    #[must_use]
    pub fn layering(mut self, policy: LayeringPolicy) -> Self {
        self.interception.layering = policy;
        self
    }

    #[must_use]
    pub fn lookup_method(mut self, selector: impl Into<String>) -> Self {
        self.lookup_method = selector.into();
        self
    }

    #[must_use]
    pub fn system_table(mut self, table: impl Into<String>) -> Self {
        self.system_tables.push(table.into());
        self
    }

    #[must_use]
    pub fn system_module(mut self, module: impl Into<String>) -> Self {
        self.system_modules.push(module.into());
        self
    }

    #[must_use]
    pub fn log_json(mut self, enabled: bool) -> Self {
        self.log_json = enabled;
        self
    }

    pub fn is_system_table(&self, table: &str) -> bool {
        self.system_tables.iter().any(|t| t == table)
    }

    pub fn is_system_module(&self, module: &str) -> bool {
        self.system_modules.iter().any(|m| m == module)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

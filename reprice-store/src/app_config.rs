use serde::Deserialize;
use std::env;

use reprice_catalog::GuardrailSettings;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub guardrail: GuardrailSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot backing the file store
    pub snapshot_path: String,
    pub product_table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "data/catalog.json".to_string(),
            product_table: "Products".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BatchConfig {
    /// Pause after this many rows to stay under the store's quota
    pub pause_every_rows: usize,
    pub pause_ms: u64,
    /// How long a finished job stays visible
    pub retention_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pause_every_rows: 10,
            pause_ms: 250,
            retention_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Every key has a default, so the base file is optional too
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `REPRICE__BATCH__PAUSE_MS=0`
            .add_source(config::Environment::with_prefix("REPRICE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        let config: Config = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.batch.pause_every_rows, 10);
        assert_eq!(config.guardrail.min_margin_pct, 45.0);
        assert_eq!(config.guardrail.epsilon, 0.01);
        assert_eq!(config.guardrail.max_iterations, 5);
        assert_eq!(config.store.product_table, "Products");
    }

    #[test]
    fn test_partial_override() {
        let config: Config = config::Config::builder()
            .set_override("guardrail.min_margin_pct", 40.0)
            .unwrap()
            .set_override("batch.pause_ms", 0)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.guardrail.min_margin_pct, 40.0);
        assert_eq!(config.guardrail.epsilon, 0.01);
        assert_eq!(config.batch.pause_ms, 0);
        assert_eq!(config.batch.retention_secs, 3600);
    }
}

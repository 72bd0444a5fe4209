// src/config/mod.rs
// Environment-driven settings; every value except the Airtable credentials has a default

use chrono::Duration;
use std::str::FromStr;
use std::time::Duration as StdDuration;
use tracing::{debug, warn};

use crate::error::{Result, SerenissimaError};
use crate::problems::{DetectionSettings, ServiceSettings};
use crate::store::{AirtableConfig, MAX_BATCH_SIZE, airtable::DEFAULT_API_URL};

#[derive(Debug, Clone)]
pub struct SerenissimaConfig {
    // ── Airtable
    pub airtable_api_key: Option<String>,
    pub airtable_base_id: Option<String>,
    pub airtable_api_url: String,
    pub airtable_timeout_secs: u64,

    // ── Server
    pub host: String,
    pub port: u16,

    // ── Tables
    pub problems_table: String,
    pub citizens_table: String,
    pub buildings_table: String,
    pub contracts_table: String,

    // ── Reconciliation
    pub reconcile_batch_size: usize,
    pub reconcile_concurrency: usize,

    // ── Detection
    pub hunger_threshold_hours: i64,
    pub workless_exempt_classes: Vec<String>,
}

/// Read `key` through `lookup`, falling back to `default` when it is
/// missing or does not parse. Trailing `# comments` are ignored.
fn env_var_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
{
    let Some(val) = lookup(key) else {
        return default;
    };
    let clean_val = val.split('#').next().unwrap_or("").trim();
    match clean_val.parse::<T>() {
        Ok(parsed) => {
            debug!("Config: {} = {} (from environment)", key, clean_val);
            parsed
        }
        Err(_) => {
            warn!("Config: {} = '{}' (parse failed, using default)", key, val);
            default
        }
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SerenissimaConfig {
    /// Settings from the process environment. Call `dotenvy::dotenv()` first
    /// to pick up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let exempt: String = env_var_or(&lookup, "WORKLESS_EXEMPT_CLASSES", "Nobili".to_string());

        Self {
            airtable_api_key: non_empty(&lookup, "AIRTABLE_API_KEY"),
            airtable_base_id: non_empty(&lookup, "AIRTABLE_BASE_ID"),
            airtable_api_url: env_var_or(&lookup, "AIRTABLE_API_URL", DEFAULT_API_URL.to_string()),
            airtable_timeout_secs: env_var_or(&lookup, "AIRTABLE_TIMEOUT_SECS", 30),
            host: env_var_or(&lookup, "SERENISSIMA_HOST", "0.0.0.0".to_string()),
            port: env_var_or(&lookup, "SERENISSIMA_PORT", 3000),
            problems_table: env_var_or(&lookup, "PROBLEMS_TABLE", "PROBLEMS".to_string()),
            citizens_table: env_var_or(&lookup, "CITIZENS_TABLE", "CITIZENS".to_string()),
            buildings_table: env_var_or(&lookup, "BUILDINGS_TABLE", "BUILDINGS".to_string()),
            contracts_table: env_var_or(&lookup, "CONTRACTS_TABLE", "CONTRACTS".to_string()),
            reconcile_batch_size: env_var_or(&lookup, "RECONCILE_BATCH_SIZE", MAX_BATCH_SIZE)
                .clamp(1, MAX_BATCH_SIZE),
            reconcile_concurrency: env_var_or(&lookup, "RECONCILE_CONCURRENCY", 4).max(1),
            hunger_threshold_hours: env_var_or(&lookup, "HUNGER_THRESHOLD_HOURS", 24),
            workless_exempt_classes: exempt
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Airtable credentials; both keys are required for the remote backend
    pub fn airtable(&self) -> Result<AirtableConfig> {
        let api_key = self
            .airtable_api_key
            .clone()
            .ok_or_else(|| SerenissimaError::Config("AIRTABLE_API_KEY is not set".to_string()))?;
        let base_id = self
            .airtable_base_id
            .clone()
            .ok_or_else(|| SerenissimaError::Config("AIRTABLE_BASE_ID is not set".to_string()))?;

        let mut config = AirtableConfig::new(api_key, base_id).with_api_url(self.airtable_api_url.clone());
        config.timeout = StdDuration::from_secs(self.airtable_timeout_secs);
        Ok(config)
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            problems_table: self.problems_table.clone(),
            citizens_table: self.citizens_table.clone(),
            buildings_table: self.buildings_table.clone(),
            contracts_table: self.contracts_table.clone(),
            batch_size: self.reconcile_batch_size,
            max_concurrency: self.reconcile_concurrency,
            detection: DetectionSettings {
                hunger_threshold: Duration::hours(self.hunger_threshold_hours.max(1)),
                workless_exempt_classes: self.workless_exempt_classes.clone(),
            },
        }
    }
}

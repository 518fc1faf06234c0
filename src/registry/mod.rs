//! 驱动注册表：按 provider id 选择适配器
//!
//! Driver registry. Maps provider ids to driver instances; the gateway resolves one per call.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::MinimaxConfig;
use crate::drivers::{MinimaxDriver, ProviderDriver};
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn ProviderDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in driver.
    pub fn with_defaults(minimax: MinimaxConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(MinimaxDriver::new(minimax)?));
        Ok(registry)
    }

    /// Register a driver under its own provider id, replacing any previous one.
    pub fn register(&mut self, driver: Arc<dyn ProviderDriver>) -> Option<Arc<dyn ProviderDriver>> {
        self.drivers.insert(driver.provider_id().to_string(), driver)
    }

    pub fn get(&self, provider: &str) -> Result<Arc<dyn ProviderDriver>> {
        self.drivers
            .get(provider)
            .cloned()
            .ok_or_else(|| Error::bad_request(format!("unknown provider: {}", provider)))
    }

    pub fn contains(&self, provider: &str) -> bool {
        self.drivers.contains_key(provider)
    }

    /// Registered provider ids, sorted.
    pub fn provider_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

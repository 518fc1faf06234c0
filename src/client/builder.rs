use crate::client::core::Gateway;
use crate::config::GatewayConfig;
use crate::drivers::ProviderDriver;
use crate::registry::DriverRegistry;
use crate::transport::{HttpTransport, Transport};
use crate::Result;
use std::sync::Arc;

/// Builder for creating gateways with custom configuration.
///
/// Without further setup the gateway uses default configuration, the built-in drivers and an
/// [`HttpTransport`].
pub struct GatewayBuilder {
    config: GatewayConfig,
    transport: Option<Arc<dyn Transport>>,
    drivers: Vec<Arc<dyn ProviderDriver>>,
}

impl GatewayBuilder {
    pub fn new() -> Self {
        Self {
            config: GatewayConfig::default(),
            transport: None,
            drivers: Vec::new(),
        }
    }

    /// Start from defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::new().config(GatewayConfig::from_env())
    }

    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the MiniMax API origin (primarily for testing with mock servers).
    pub fn minimax_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.minimax.base_url = base_url.into();
        self
    }

    /// Inject a transport instead of the default HTTP one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Register an additional driver; it replaces a built-in one with the same provider id.
    pub fn driver(mut self, driver: Arc<dyn ProviderDriver>) -> Self {
        self.drivers.push(driver);
        self
    }

    pub fn build(self) -> Result<Gateway> {
        let mut registry = DriverRegistry::with_defaults(self.config.minimax)?;
        for driver in self.drivers {
            registry.register(driver);
        }

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(self.config.transport)?),
        };

        Ok(Gateway {
            registry,
            transport,
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

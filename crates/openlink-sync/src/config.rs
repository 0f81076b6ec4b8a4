//! Controller configuration for the periodic sync manager.

use openlink_errors::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};

/// Largest supported sync set pool.
pub const POOL_CAPACITY_MAX: u16 = 32;

/// Periodic sync manager configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Number of sync set contexts in the fixed pool.
    pub pool_capacity: u16,
    /// Local sleep-clock accuracy in ppm, fed into window widening.
    pub local_sca_ppm: u16,
    /// Whether discovery also runs on the coded PHY, requiring the second
    /// pending-target slot.
    pub coded_phy: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 4,
            local_sca_ppm: 50,
            coded_phy: false,
        }
    }
}

impl SyncConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> SyncResult<()> {
        if self.pool_capacity == 0 {
            return Err(SyncError::InvalidConfig(
                "pool_capacity must be greater than 0",
            ));
        }
        if self.pool_capacity > POOL_CAPACITY_MAX {
            return Err(SyncError::InvalidConfig("pool_capacity exceeds maximum"));
        }
        if self.local_sca_ppm == 0 || self.local_sca_ppm > 500 {
            return Err(SyncError::InvalidConfig(
                "local_sca_ppm must be in 1..=500",
            ));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }
}

/// Builder for [`SyncConfig`].
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    /// Set the sync set pool capacity.
    #[must_use]
    pub fn pool_capacity(mut self, capacity: u16) -> Self {
        self.config.pool_capacity = capacity;
        self
    }

    /// Set the local sleep-clock accuracy in ppm.
    #[must_use]
    pub fn local_sca_ppm(mut self, ppm: u16) -> Self {
        self.config.local_sca_ppm = ppm;
        self
    }

    /// Enable or disable coded PHY discovery.
    #[must_use]
    pub fn coded_phy(mut self, enabled: bool) -> Self {
        self.config.coded_phy = enabled;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> SyncResult<SyncConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SyncConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SyncConfig::builder()
            .pool_capacity(8)
            .local_sca_ppm(250)
            .coded_phy(true)
            .build()
            .unwrap();
        assert_eq!(config.pool_capacity, 8);
        assert_eq!(config.local_sca_ppm, 250);
        assert!(config.coded_phy);
    }

    #[test]
    fn test_validation_rejects_zero_capacity() {
        let result = SyncConfig::builder().pool_capacity(0).build();
        assert!(matches!(result, Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn test_validation_rejects_oversized_pool() {
        let result = SyncConfig::builder()
            .pool_capacity(POOL_CAPACITY_MAX + 1)
            .build();
        assert!(matches!(result, Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn test_validation_rejects_bad_sca() {
        assert!(SyncConfig::builder().local_sca_ppm(0).build().is_err());
        assert!(SyncConfig::builder().local_sca_ppm(501).build().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let config = SyncConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SyncConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}

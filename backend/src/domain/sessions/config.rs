//! Time windows governing session expiry and calibration freshness.

use std::time::Duration;

/// Session lifecycle windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Age after which a pending session expires.
    pub expiry: Duration,
    /// Age of the last login after which calibration is required again.
    pub calibration_freshness: Duration,
    /// Interval between scheduled expiry sweeps.
    pub sweep_interval: Duration,
}

impl SessionConfig {
    /// One hour.
    pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(60 * 60);
    /// One day.
    pub const DEFAULT_CALIBRATION_FRESHNESS: Duration = Duration::from_secs(24 * 60 * 60);
    /// Five minutes.
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiry: Self::DEFAULT_EXPIRY,
            calibration_freshness: Self::DEFAULT_CALIBRATION_FRESHNESS,
            sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
        }
    }
}

use super::error::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lowest supported system frequency in Hz.
pub const MIN_FREQUENCY: f64 = 0.005;
/// Highest supported system frequency in Hz.
pub const MAX_FREQUENCY: f64 = 0.5e12;

/// Configuration of a [System](super::System).
///
/// # Example
/// ```
/// # use synclogic::{System, SystemConfig};
/// let config = SystemConfig::default()
///     .frequency(1e6)
///     .settle_rounds(None);
///
/// let system = System::with_config(config).unwrap();
/// assert_eq!(system.config().frequency, 1e6);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SystemConfig {
    /// Clock frequency in Hz, only used for the VCD timescale.
    pub frequency: f64,
    /// Limit of module evaluations per settle, multiplied by the number of modules.
    ///
    /// [None] means a non settling circuit loops forever.
    pub settle_rounds: Option<usize>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            frequency: 1.0,
            settle_rounds: Some(1000),
        }
    }
}

impl SystemConfig {
    pub fn frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn settle_rounds(mut self, rounds: Option<usize>) -> Self {
        self.settle_rounds = rounds;
        self
    }

    /// Returns an error if the frequency is outside of [MIN_FREQUENCY]..=[MAX_FREQUENCY].
    pub fn validate(&self) -> Result<()> {
        // Also rejects NaN.
        if !(MIN_FREQUENCY..=MAX_FREQUENCY).contains(&self.frequency) {
            return Err(Error::SystemFrequencyOutOfRange {
                frequency: self.frequency,
            });
        }
        Ok(())
    }

    /// Maximum number of evaluations of one settle for a system with `modules` modules.
    pub(super) fn settle_limit(&self, modules: usize) -> Option<usize> {
        self.settle_rounds
            .map(|rounds| rounds.saturating_mul(modules.max(1)))
    }
}

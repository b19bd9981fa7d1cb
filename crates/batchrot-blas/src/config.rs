//! Handle configuration.
//!
//! Settings can be built in code, deserialized with serde or read from the
//! environment:
//!
//! | Variable                  | Meaning                                   |
//! |---------------------------|-------------------------------------------|
//! | `BATCHROT_LAYER`          | [`LayerMode`] bits, decimal or `0x` hex    |
//! | `BATCHROT_CHECK_NUMERICS` | [`CheckNumericsMode`] bits                |
//! | `BATCHROT_DEVICE`         | `parallel` or `serial`                    |

use crate::handle::{CheckNumericsMode, LayerMode};
use batchrot_gpu::DeviceKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the logging layer bits.
pub const ENV_LAYER: &str = "BATCHROT_LAYER";
/// Environment variable holding the numeric checking bits.
pub const ENV_CHECK_NUMERICS: &str = "BATCHROT_CHECK_NUMERICS";
/// Environment variable selecting the device kind.
pub const ENV_DEVICE: &str = "BATCHROT_DEVICE";

/// Errors raised while reading configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable does not hold an integer.
    #[error("{var}: '{value}' is not an integer")]
    NotAnInteger {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },

    /// A variable sets bits with no meaning.
    #[error("{var}: unknown flag bits {bits:#x}")]
    UnknownBits {
        /// Variable name.
        var: &'static str,
        /// The bits that are not defined.
        bits: u32,
    },

    /// The device kind is not recognized.
    #[error("{var}: unknown device kind '{value}'")]
    UnknownDevice {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Settings a [`Handle`](crate::Handle) is created with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleConfig {
    /// Logging layers.
    #[serde(default)]
    pub layer_mode: LayerMode,

    /// Numeric checking behavior.
    #[serde(default)]
    pub check_numerics: CheckNumericsMode,

    /// Which host device kernels run on.
    #[serde(default)]
    pub device: DeviceKind,
}

impl HandleConfig {
    /// Read settings from the process environment. Unset variables keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a malformed variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a malformed variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_LAYER) {
            let bits = parse_bits(ENV_LAYER, &value)?;
            config.layer_mode = LayerMode::from_bits(bits).ok_or(ConfigError::UnknownBits {
                var: ENV_LAYER,
                bits: bits & !LayerMode::all().bits(),
            })?;
        }

        if let Some(value) = lookup(ENV_CHECK_NUMERICS) {
            let bits = parse_bits(ENV_CHECK_NUMERICS, &value)?;
            config.check_numerics =
                CheckNumericsMode::from_bits(bits).ok_or(ConfigError::UnknownBits {
                    var: ENV_CHECK_NUMERICS,
                    bits: bits & !CheckNumericsMode::all().bits(),
                })?;
        }

        if let Some(value) = lookup(ENV_DEVICE) {
            config.device = match value.trim().to_ascii_lowercase().as_str() {
                "parallel" => DeviceKind::Parallel,
                "serial" => DeviceKind::Serial,
                _ => {
                    return Err(ConfigError::UnknownDevice {
                        var: ENV_DEVICE,
                        value,
                    })
                }
            };
        }

        Ok(config)
    }
}

fn parse_bits(var: &'static str, value: &str) -> Result<u32, ConfigError> {
    let trimmed = value.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => trimmed.parse::<u32>(),
    };
    parsed.map_err(|_| ConfigError::NotAnInteger {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: FxHashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = HandleConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, HandleConfig::default());
    }

    #[test]
    fn test_decimal_and_hex_bits() {
        let config = HandleConfig::from_lookup(lookup_from(&[
            (ENV_LAYER, "3"),
            (ENV_CHECK_NUMERICS, "0x4"),
            (ENV_DEVICE, "Serial"),
        ]))
        .unwrap();
        assert_eq!(config.layer_mode, LayerMode::LOG_TRACE | LayerMode::LOG_BENCH);
        assert_eq!(config.check_numerics, CheckNumericsMode::FAIL);
        assert_eq!(config.device, DeviceKind::Serial);
    }

    #[test]
    fn test_malformed_values() {
        let err = HandleConfig::from_lookup(lookup_from(&[(ENV_LAYER, "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::NotAnInteger { .. }));

        let err =
            HandleConfig::from_lookup(lookup_from(&[(ENV_CHECK_NUMERICS, "9")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownBits {
                var: ENV_CHECK_NUMERICS,
                bits: 8
            }
        );

        let err = HandleConfig::from_lookup(lookup_from(&[(ENV_DEVICE, "gpu")])).unwrap_err();
        assert!(err.to_string().contains("gpu"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: HandleConfig = serde_json::from_str(r#"{"device":"serial"}"#).unwrap();
        assert_eq!(config.device, DeviceKind::Serial);
        assert!(config.layer_mode.is_empty());
        assert!(!config.check_numerics.is_enabled());
    }
}

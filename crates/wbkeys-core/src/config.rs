//! Tunable parameters for derivation and key protection.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WbError};

/// Work-factor knob passed to password derivation (memory cost is `2^strength` KiB).
pub const DEFAULT_DERIVATION_STRENGTH: u32 = 14;

/// Argon2id passes over memory.
pub const DEFAULT_KDF_ITERATIONS: u32 = 3;

/// Argon2id lanes.
pub const DEFAULT_KDF_PARALLELISM: u32 = 1;

/// scrypt `log2(N)` used to protect the armored private key.
pub const DEFAULT_KEY_PROTECTION_WORK_FACTOR: u8 = 18;

/// Label the session's own identity is registered under in the key ring.
pub const DEFAULT_OWNER_LABEL: &str = "whistleblower";

/// Accepted range for `derivation_strength`.
pub const STRENGTH_RANGE: std::ops::RangeInclusive<u32> = 3..=24;

/// Accepted range for `key_protection_work_factor`. age will not open
/// scrypt stanzas far above its calibrated target.
pub const WORK_FACTOR_RANGE: std::ops::RangeInclusive<u8> = 1..=22;

/// Crypto configuration shared by the session and the shipped primitives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    pub derivation_strength: u32,
    pub kdf_iterations: u32,
    pub kdf_parallelism: u32,
    pub key_protection_work_factor: u8,
    pub owner_label: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            derivation_strength: DEFAULT_DERIVATION_STRENGTH,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            kdf_parallelism: DEFAULT_KDF_PARALLELISM,
            key_protection_work_factor: DEFAULT_KEY_PROTECTION_WORK_FACTOR,
            owner_label: DEFAULT_OWNER_LABEL.to_string(),
        }
    }
}

impl CryptoConfig {
    /// Check every field is inside the range the primitives accept.
    pub fn validate(&self) -> Result<()> {
        if !STRENGTH_RANGE.contains(&self.derivation_strength) {
            return Err(WbError::Configuration(format!(
                "derivation_strength must be between {} and {} (got {})",
                STRENGTH_RANGE.start(),
                STRENGTH_RANGE.end(),
                self.derivation_strength
            )));
        }
        if self.kdf_iterations == 0 {
            return Err(WbError::Configuration(
                "kdf_iterations must be at least 1".to_string(),
            ));
        }
        if self.kdf_parallelism == 0 {
            return Err(WbError::Configuration(
                "kdf_parallelism must be at least 1".to_string(),
            ));
        }
        if !WORK_FACTOR_RANGE.contains(&self.key_protection_work_factor) {
            return Err(WbError::Configuration(format!(
                "key_protection_work_factor must be between {} and {} (got {})",
                WORK_FACTOR_RANGE.start(),
                WORK_FACTOR_RANGE.end(),
                self.key_protection_work_factor
            )));
        }
        if self.owner_label.trim().is_empty() {
            return Err(WbError::Configuration(
                "owner_label cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CryptoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.derivation_strength, 14);
        assert_eq!(config.owner_label, "whistleblower");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CryptoConfig =
            serde_json::from_str(r#"{"derivation_strength": 10}"#).unwrap();
        assert_eq!(config.derivation_strength, 10);
        assert_eq!(config.kdf_iterations, DEFAULT_KDF_ITERATIONS);
        assert_eq!(config.owner_label, DEFAULT_OWNER_LABEL);
    }

    #[test]
    fn test_out_of_range_strength_rejected() {
        let config = CryptoConfig {
            derivation_strength: 2,
            ..CryptoConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, WbError::Configuration(_)));
        assert!(err.to_string().contains("derivation_strength"));
    }

    #[test]
    fn test_work_factor_upper_bound() {
        let at_limit = CryptoConfig {
            key_protection_work_factor: 22,
            ..CryptoConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        let too_slow = CryptoConfig {
            key_protection_work_factor: 23,
            ..CryptoConfig::default()
        };
        let err = too_slow.validate().unwrap_err();
        assert!(matches!(err, WbError::Configuration(_)));
        assert!(err.to_string().contains("key_protection_work_factor"));
    }

    #[test]
    fn test_empty_owner_label_rejected() {
        let config = CryptoConfig {
            owner_label: "  ".to_string(),
            ..CryptoConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

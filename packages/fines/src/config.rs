//! Layered pipeline configuration.
//!
//! Values are resolved in order of precedence: command-line flags, then
//! environment variables, then an optional TOML file, then built-in
//! defaults. The as-of date has no built-in default; the caller supplies
//! the fallback (typically today's date, chosen by the binary).
//!
//! ```toml
//! as_of = "2025-04-22"
//! judgement_age_days = 75
//! tow_threshold = "350.00"
//! ```

use std::path::Path;

use chrono::NaiveDate;
use scofftow_fines_models::{
    DEFAULT_JUDGEMENT_AGE_DAYS, DEFAULT_TOW_THRESHOLD, Money, PipelineConfig,
};
use serde::Deserialize;

use crate::FinesError;

/// Environment variable overriding the as-of date (`YYYY-MM-DD`).
pub const AS_OF_ENV: &str = "SCOFFTOW_AS_OF";
/// Environment variable overriding the judgement age in days.
pub const JUDGEMENT_AGE_DAYS_ENV: &str = "SCOFFTOW_JUDGEMENT_AGE_DAYS";
/// Environment variable overriding the tow threshold in dollars.
pub const TOW_THRESHOLD_ENV: &str = "SCOFFTOW_TOW_THRESHOLD";

/// One layer of optional configuration values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub as_of: Option<NaiveDate>,
    pub judgement_age_days: Option<i64>,
    pub tow_threshold: Option<Money>,
}

impl ConfigLayer {
    /// Parses a layer from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`FinesError::Toml`] if the text is not valid TOML or has
    /// unknown keys.
    pub fn from_toml(s: &str) -> Result<Self, FinesError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads a layer from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`FinesError::Io`] if the file cannot be read, or
    /// [`FinesError::Toml`] if it cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, FinesError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Reads a layer from the `SCOFFTOW_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`FinesError::Config`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self, FinesError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FinesError> {
        let invalid = |name: &str, value: &str| FinesError::Config {
            message: format!("{name} has invalid value {value:?}"),
        };

        let as_of = lookup(AS_OF_ENV)
            .map(|v| {
                NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                    .map_err(|_| invalid(AS_OF_ENV, v.as_str()))
            })
            .transpose()?;
        let judgement_age_days = lookup(JUDGEMENT_AGE_DAYS_ENV)
            .map(|v| {
                v.trim()
                    .parse::<i64>()
                    .map_err(|_| invalid(JUDGEMENT_AGE_DAYS_ENV, v.as_str()))
            })
            .transpose()?;
        let tow_threshold = lookup(TOW_THRESHOLD_ENV)
            .map(|v| {
                v.parse::<Money>()
                    .map_err(|_| invalid(TOW_THRESHOLD_ENV, v.as_str()))
            })
            .transpose()?;

        Ok(Self {
            as_of,
            judgement_age_days,
            tow_threshold,
        })
    }

    /// Fills values missing from `self` with those from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            as_of: self.as_of.or(fallback.as_of),
            judgement_age_days: self.judgement_age_days.or(fallback.judgement_age_days),
            tow_threshold: self.tow_threshold.or(fallback.tow_threshold),
        }
    }

    /// Resolves this layer into a complete config.
    ///
    /// # Errors
    ///
    /// Returns [`FinesError::Config`] if the judgement age or tow threshold
    /// is negative.
    pub fn resolve(self, default_as_of: NaiveDate) -> Result<PipelineConfig, FinesError> {
        let config = PipelineConfig {
            as_of: self.as_of.unwrap_or(default_as_of),
            judgement_age_days: self.judgement_age_days.unwrap_or(DEFAULT_JUDGEMENT_AGE_DAYS),
            tow_threshold: self.tow_threshold.unwrap_or(DEFAULT_TOW_THRESHOLD),
        };

        if config.judgement_age_days < 0 {
            return Err(FinesError::Config {
                message: format!(
                    "judgement_age_days must not be negative (got {})",
                    config.judgement_age_days
                ),
            });
        }
        if config.tow_threshold < Money::ZERO {
            return Err(FinesError::Config {
                message: format!(
                    "tow_threshold must not be negative (got {})",
                    config.tow_threshold
                ),
            });
        }

        Ok(config)
    }
}

/// Loads the pipeline config from CLI overrides, the environment, and an
/// optional TOML file.
///
/// # Errors
///
/// Returns [`FinesError`] if any layer cannot be read or the resolved
/// values are invalid.
pub fn load_config(
    path: Option<&Path>,
    cli: ConfigLayer,
    default_as_of: NaiveDate,
) -> Result<PipelineConfig, FinesError> {
    let file = match path {
        Some(path) => {
            log::debug!("Reading config from {}", path.display());
            ConfigLayer::from_file(path)?
        }
        None => ConfigLayer::default(),
    };

    let config = cli
        .or(ConfigLayer::from_env()?)
        .or(file)
        .resolve(default_as_of)?;

    log::info!(
        "As of {}: judgement after {} days, tow threshold ${}",
        config.as_of,
        config.judgement_age_days,
        config.tow_threshold
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ConfigLayer::default().resolve(date(2025, 4, 22)).unwrap();
        assert_eq!(config, PipelineConfig::new(date(2025, 4, 22)));
    }

    #[test]
    fn parses_toml_layer() {
        let layer =
            ConfigLayer::from_toml("judgement_age_days = 60\ntow_threshold = \"500\"").unwrap();
        assert_eq!(layer.judgement_age_days, Some(60));
        assert_eq!(layer.tow_threshold, Some(Money::from_dollars(500)));
        assert_eq!(layer.as_of, None);
    }

    #[test]
    fn rejects_unknown_toml_keys() {
        assert!(ConfigLayer::from_toml("threshold = 1").is_err());
    }

    #[test]
    fn earlier_layers_take_precedence() {
        let cli = ConfigLayer {
            tow_threshold: Some(Money::from_dollars(100)),
            ..ConfigLayer::default()
        };
        let file = ConfigLayer {
            as_of: Some(date(2024, 12, 31)),
            tow_threshold: Some(Money::from_dollars(900)),
            judgement_age_days: Some(30),
        };
        let config = cli.or(file).resolve(date(2025, 1, 1)).unwrap();
        assert_eq!(config.tow_threshold, Money::from_dollars(100));
        assert_eq!(config.as_of, date(2024, 12, 31));
        assert_eq!(config.judgement_age_days, 30);
    }

    #[test]
    fn reads_env_lookup() {
        let layer = ConfigLayer::from_lookup(|name| match name {
            AS_OF_ENV => Some("2025-04-22".to_owned()),
            TOW_THRESHOLD_ENV => Some("275.50".to_owned()),
            _ => None,
        })
        .unwrap();
        assert_eq!(layer.as_of, Some(date(2025, 4, 22)));
        assert_eq!(layer.tow_threshold, Some(Money::from_cents(27_550)));
        assert_eq!(layer.judgement_age_days, None);
    }

    #[test]
    fn malformed_env_value_is_error() {
        let result = ConfigLayer::from_lookup(|name| {
            (name == JUDGEMENT_AGE_DAYS_ENV).then(|| "soon".to_owned())
        });
        assert!(matches!(result, Err(FinesError::Config { .. })));
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let layer = ConfigLayer {
            tow_threshold: Some(Money::from_dollars(-1)),
            ..ConfigLayer::default()
        };
        assert!(layer.resolve(date(2025, 1, 1)).is_err());
    }
}

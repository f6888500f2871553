use crate::tier::Tier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Free parking window, in hours.
pub const DEFAULT_GRACE_HOURS: f64 = 0.25;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("invalid rate for {field}: {value} (must be finite and >= 0)")]
    InvalidRate { field: String, value: f64 },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GarageConfig {
    #[serde(default)]
    pub capacity: CapacitySection,
    #[serde(default)]
    pub rates: RateTable,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CapacitySection {
    #[serde(default)]
    pub small: u32,
    #[serde(default)]
    pub medium: u32,
    #[serde(default)]
    pub large: u32,
}

impl CapacitySection {
    pub fn new(small: u32, medium: u32, large: u32) -> Self {
        Self {
            small,
            medium,
            large,
        }
    }

    pub fn get(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Small => self.small,
            Tier::Medium => self.medium,
            Tier::Large => self.large,
        }
    }

    pub fn total(&self) -> u64 {
        u64::from(self.small) + u64::from(self.medium) + u64::from(self.large)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Rate {
    pub hourly_rate: f64,
    pub daily_cap: f64,
}

impl Rate {
    pub const fn new(hourly_rate: f64, daily_cap: f64) -> Self {
        Self {
            hourly_rate,
            daily_cap,
        }
    }
}

/// Per-size pricing plus the shared grace period.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RateTable {
    #[serde(default = "default_grace_hours")]
    pub grace_hours: f64,
    #[serde(default = "default_small")]
    pub small: Rate,
    #[serde(default = "default_medium")]
    pub medium: Rate,
    #[serde(default = "default_large")]
    pub large: Rate,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            grace_hours: default_grace_hours(),
            small: default_small(),
            medium: default_medium(),
            large: default_large(),
        }
    }
}

impl RateTable {
    pub fn rate(&self, size: Tier) -> Rate {
        match size {
            Tier::Small => self.small,
            Tier::Medium => self.medium,
            Tier::Large => self.large,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("rates.grace_hours", self.grace_hours)?;
        for tier in Tier::ALL {
            let rate = self.rate(tier);
            check_rate(&format!("rates.{tier}.hourly_rate"), rate.hourly_rate)?;
            check_rate(&format!("rates.{tier}.daily_cap"), rate.daily_cap)?;
        }
        Ok(())
    }
}

fn check_rate(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate {
            field: field.to_owned(),
            value,
        })
    }
}

fn default_grace_hours() -> f64 {
    DEFAULT_GRACE_HOURS
}

fn default_small() -> Rate {
    Rate::new(2.0, 20.0)
}

fn default_medium() -> Rate {
    Rate::new(3.0, 30.0)
}

fn default_large() -> Rate {
    Rate::new(5.0, 50.0)
}

pub fn parse_config_str(input: &str) -> Result<GarageConfig, ConfigError> {
    let config: GarageConfig = toml::from_str(input)?;
    config.rates.validate()?;
    Ok(config)
}

pub fn parse_config_file(path: impl AsRef<Path>) -> Result<GarageConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config_str(&content)
}

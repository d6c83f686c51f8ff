//! Application configuration handling.

use std::{fs, path::{Path, PathBuf}};

use anyhow::{bail, Context, Result};
use config::Config;
use serde::{Deserialize, Serialize};

/// Default total pollution ceiling, in kg.
pub const DEFAULT_MARKET_CAP: u32 = 200_000;
/// Smallest configurable market cap.
pub const MIN_MARKET_CAP: u32 = 100_000;
/// Largest configurable market cap.
pub const MAX_MARKET_CAP: u32 = 500_000;
/// Adjustment step used by the setup screen.
pub const MARKET_CAP_STEP: u32 = 10_000;

/// Default permit floor price.
pub const DEFAULT_PERMIT_PRICE: f64 = 5.0;
/// Smallest configurable permit price.
pub const MIN_PERMIT_PRICE: f64 = 1.0;
/// Largest configurable permit price.
pub const MAX_PERMIT_PRICE: f64 = 20.0;
/// Adjustment step used by the setup screen.
pub const PERMIT_PRICE_STEP: f64 = 0.5;

const DEFAULT_CONFIG: &str = r#"# etsim configuration.
# Values here pre-fill the setup screen; everything can still be adjusted
# in the app before a game starts.

# Total market cap in kg (100000-500000).
market_cap = 200000

# Permit floor price in rupees (1.0-20.0).
permit_price = 5.0

# Industry display names.
industry_a = "Industry A"
industry_b = "Industry B"
"#;

/// User-tunable settings, loaded from `config.toml` under the platform
/// config directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Total pollution ceiling for the game, in kg.
    #[serde(default = "default_market_cap")]
    pub market_cap: u32,
    /// Floor price per permit.
    #[serde(default = "default_permit_price")]
    pub permit_price: f64,
    /// Display name of the first industry.
    #[serde(default = "default_industry_a")]
    pub industry_a: String,
    /// Display name of the second industry.
    #[serde(default = "default_industry_b")]
    pub industry_b: String,
}

fn default_market_cap() -> u32 {
    DEFAULT_MARKET_CAP
}

fn default_permit_price() -> f64 {
    DEFAULT_PERMIT_PRICE
}

fn default_industry_a() -> String {
    "Industry A".to_string()
}

fn default_industry_b() -> String {
    "Industry B".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            market_cap: DEFAULT_MARKET_CAP,
            permit_price: DEFAULT_PERMIT_PRICE,
            industry_a: default_industry_a(),
            industry_b: default_industry_b(),
        }
    }
}

impl AppConfig {
    /// Load from the default config path; missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from an explicit path; missing file yields defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .build()
            .with_context(|| format!("failed to read {}", path.as_ref().display()))?;
        let parsed: Self = settings
            .try_deserialize()
            .with_context(|| format!("failed to parse {}", path.as_ref().display()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject values outside the supported ranges.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_MARKET_CAP..=MAX_MARKET_CAP).contains(&self.market_cap) {
            bail!(
                "market_cap {} outside {MIN_MARKET_CAP}..={MAX_MARKET_CAP}",
                self.market_cap
            );
        }
        if !(MIN_PERMIT_PRICE..=MAX_PERMIT_PRICE).contains(&self.permit_price) {
            bail!(
                "permit_price {} outside {MIN_PERMIT_PRICE}..={MAX_PERMIT_PRICE}",
                self.permit_price
            );
        }
        Ok(())
    }
}

/// Path of the config file under the platform config directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("etsim")
        .join("config.toml")
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(config_path())
}

fn write_default_config(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG).with_context(|| format!("failed to write {}", path.display()))
}

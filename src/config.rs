use std::{path::Path, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::domain::CalculatorSettings;

pub const DEFAULT_CONFIG_FILE: &str = "screenprint.toml";
const ENV_PREFIX: &str = "SCREENPRINT";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub pricing: CalculatorSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub cache_ttl_seconds: u64,
    pub max_attempts: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://caspio-pricing-proxy-ab30a049961a.herokuapp.com/".to_string(),
            timeout_seconds: 15,
            cache_ttl_seconds: 60 * 60,
            max_attempts: 2,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Load the optional TOML file, then `SCREENPRINT__SECTION__KEY` environment overrides.
pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let config = config::Config::builder()
        .add_source(config::File::from(path.to_path_buf()).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let cfg: AppConfig = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &AppConfig) -> anyhow::Result<()> {
    if let Err(err) = url::Url::parse(&cfg.api.base_url) {
        anyhow::bail!("api.base_url '{}' is not a valid URL: {}", cfg.api.base_url, err);
    }
    if cfg.api.max_attempts == 0 {
        anyhow::bail!("api.max_attempts must be at least 1");
    }
    if cfg.api.timeout_seconds == 0 {
        anyhow::bail!("api.timeout_seconds must be greater than zero");
    }

    let pricing = &cfg.pricing;
    for (name, value) in [
        ("pricing.setup_fee_per_color", pricing.setup_fee_per_color),
        ("pricing.safety_stripe_surcharge", pricing.safety_stripe_surcharge),
    ] {
        if !value.is_finite() || value < 0.0 {
            anyhow::bail!("{} must be a non-negative amount, got {}", name, value);
        }
    }
    if pricing.default_quantity < pricing.minimum_quantity {
        anyhow::bail!(
            "pricing.default_quantity ({}) is below pricing.minimum_quantity ({})",
            pricing.default_quantity,
            pricing.minimum_quantity
        );
    }

    if log::LevelFilter::from_str(&cfg.logging.level).is_err() {
        anyhow::bail!("logging.level '{}' is not a log level", cfg.logging.level);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg.api.max_attempts, 2);
        assert_eq!(cfg.api.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(cfg.pricing.setup_fee_per_color, 30.0);
        assert_eq!(cfg.pricing.safety_stripe_surcharge, 2.0);
        assert_eq!(cfg.pricing.default_quantity, 37);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn file_values_override_defaults_per_key() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"http://localhost:8080/\"\n\n[pricing]\nsetup_fee_per_color = 25.0\n"
        )
        .unwrap();

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.api.base_url, "http://localhost:8080/");
        assert_eq!(cfg.api.timeout_seconds, 15);
        assert_eq!(cfg.pricing.setup_fee_per_color, 25.0);
        assert_eq!(cfg.pricing.safety_stripe_surcharge, 2.0);
    }

    #[test]
    fn validation_rejects_nonsense() {
        let mut cfg = AppConfig::default();
        cfg.api.max_attempts = 0;
        assert!(validate_config(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.pricing.safety_stripe_surcharge = -1.0;
        assert!(validate_config(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.logging.level = "loud".to_string();
        assert!(validate_config(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.api.base_url = "not a url".to_string();
        assert!(validate_config(&cfg).is_err());

        assert!(validate_config(&AppConfig::default()).is_ok());
    }
}

use serde::Deserialize;
use std::{env, path::PathBuf};
use validator::{Validate, ValidationError};

pub const DEFAULT_ADMIN_AUTH: &str = "admin:changeme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_sample_bounds"))]
pub struct Config {
    pub questions_path: PathBuf,
    pub bind_addr: String,
    #[validate(range(min = 1))]
    pub default_sample_size: usize,
    #[validate(range(min = 1))]
    pub max_sample_size: usize,
    /// `user:password` for HTTP Basic auth on /metrics and /api/admin.
    #[validate(custom(function = "validate_credentials"))]
    pub admin_auth: String,
    pub static_dir: Option<PathBuf>,
    pub otlp_endpoint: Option<String>,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            questions_path: PathBuf::from("questions.json"),
            bind_addr: "0.0.0.0:5000".to_string(),
            default_sample_size: 20,
            max_sample_size: 200,
            admin_auth: DEFAULT_ADMIN_AUTH.to_string(),
            static_dir: None,
            otlp_endpoint: None,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Local .env is optional; real environment variables win over it
        dotenvy::dotenv().ok();

        let env = Self::app_env();
        let defaults = Config::default();

        // Build configuration from defaults + config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .set_default(
                "questions_path",
                defaults.questions_path.to_string_lossy().to_string(),
            )?
            .set_default("bind_addr", defaults.bind_addr)?
            .set_default("default_sample_size", defaults.default_sample_size as u64)?
            .set_default("max_sample_size", defaults.max_sample_size as u64)?
            .set_default("admin_auth", defaults.admin_auth)?
            .set_default("log_format", "text")?
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;

        config
            .validate()
            .map_err(|e| config::ConfigError::Message(format!("Invalid configuration: {}", e)))?;

        if env == "prod" && config.uses_default_credentials() {
            return Err(config::ConfigError::Message(
                "APP_ADMIN_AUTH must be set in production".to_string(),
            ));
        }

        Ok(config)
    }

    /// Deployment environment name, `dev` unless APP_ENV says otherwise.
    pub fn app_env() -> String {
        env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
    }

    pub fn uses_default_credentials(&self) -> bool {
        self.admin_auth == DEFAULT_ADMIN_AUTH
    }

    /// Clamps a requested sample size into `[1, max_sample_size]`.
    pub fn clamp_sample_size(&self, requested: Option<i64>) -> usize {
        let requested = requested.unwrap_or(self.default_sample_size as i64);
        let max = i64::try_from(self.max_sample_size).unwrap_or(i64::MAX);
        // max_sample_size >= 1 is guaranteed by validation
        requested.clamp(1, max.max(1)) as usize
    }
}

fn validate_sample_bounds(config: &Config) -> Result<(), ValidationError> {
    if config.default_sample_size > config.max_sample_size {
        return Err(ValidationError::new("default_sample_size_exceeds_max"));
    }
    Ok(())
}

fn validate_credentials(value: &str) -> Result<(), ValidationError> {
    match value.split_once(':') {
        Some((user, _)) if !user.is_empty() => Ok(()),
        _ => Err(ValidationError::new("admin_auth_format")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_larger_than_max_is_rejected() {
        let config = Config {
            default_sample_size: 50,
            max_sample_size: 10,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn credentials_need_user_and_separator() {
        for bad in ["admin", ":secret", ""] {
            let config = Config {
                admin_auth: bad.to_string(),
                ..Config::default()
            };
            assert!(config.validate().is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn sample_size_is_clamped() {
        let config = Config {
            default_sample_size: 20,
            max_sample_size: 200,
            ..Config::default()
        };
        assert_eq!(config.clamp_sample_size(None), 20);
        assert_eq!(config.clamp_sample_size(Some(5)), 5);
        assert_eq!(config.clamp_sample_size(Some(0)), 1);
        assert_eq!(config.clamp_sample_size(Some(-4)), 1);
        assert_eq!(config.clamp_sample_size(Some(1_000)), 200);
    }
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::delivery::DeliveryPolicy;
use crate::cpq::pricing::PricingPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub pricing: PricingConfig,
    pub catalog: CatalogConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricingConfig {
    pub margin: Decimal,
    pub print_color_rate: Decimal,
    pub quantity_floor: u32,
    pub display_cny_rate: Decimal,
    pub large_order_threshold: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Alternate TOML catalog; the builtin catalog is used when unset.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    pub admin_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub margin: Option<Decimal>,
    pub port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_CONFIG_FILE: &str = "packquote.toml";

impl Default for PricingConfig {
    fn default() -> Self {
        let policy = PricingPolicy::default();
        Self {
            margin: policy.margin,
            print_color_rate: policy.print_color_rate,
            quantity_floor: policy.quantity_floor,
            display_cny_rate: Decimal::new(72, 1),
            large_order_threshold: DeliveryPolicy::default().large_order_threshold,
        }
    }
}

impl PricingConfig {
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            margin: self.margin,
            print_color_rate: self.print_color_rate,
            quantity_floor: self.quantity_floor,
            ..PricingPolicy::default()
        }
    }

    pub fn delivery_policy(&self) -> DeliveryPolicy {
        DeliveryPolicy {
            large_order_threshold: self.large_order_threshold,
            ..DeliveryPolicy::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            catalog: CatalogConfig::default(),
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
                admin_token: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(pricing) = patch.pricing {
            if let Some(margin) = pricing.margin {
                self.pricing.margin = margin;
            }
            if let Some(print_color_rate) = pricing.print_color_rate {
                self.pricing.print_color_rate = print_color_rate;
            }
            if let Some(quantity_floor) = pricing.quantity_floor {
                self.pricing.quantity_floor = quantity_floor;
            }
            if let Some(display_cny_rate) = pricing.display_cny_rate {
                self.pricing.display_cny_rate = display_cny_rate;
            }
            if let Some(large_order_threshold) = pricing.large_order_threshold {
                self.pricing.large_order_threshold = large_order_threshold;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(admin_token) = server.admin_token {
                self.server.admin_token = Some(admin_token.into());
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PACKQUOTE_PRICING_MARGIN") {
            self.pricing.margin = parse_env("PACKQUOTE_PRICING_MARGIN", &value)?;
        }
        if let Some(value) = read_env("PACKQUOTE_PRICING_PRINT_COLOR_RATE") {
            self.pricing.print_color_rate =
                parse_env("PACKQUOTE_PRICING_PRINT_COLOR_RATE", &value)?;
        }
        if let Some(value) = read_env("PACKQUOTE_PRICING_QUANTITY_FLOOR") {
            self.pricing.quantity_floor = parse_env("PACKQUOTE_PRICING_QUANTITY_FLOOR", &value)?;
        }
        if let Some(value) = read_env("PACKQUOTE_PRICING_DISPLAY_CNY_RATE") {
            self.pricing.display_cny_rate =
                parse_env("PACKQUOTE_PRICING_DISPLAY_CNY_RATE", &value)?;
        }
        if let Some(value) = read_env("PACKQUOTE_PRICING_LARGE_ORDER_THRESHOLD") {
            self.pricing.large_order_threshold =
                parse_env("PACKQUOTE_PRICING_LARGE_ORDER_THRESHOLD", &value)?;
        }

        if let Some(value) = read_env("PACKQUOTE_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("PACKQUOTE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PACKQUOTE_SERVER_PORT") {
            self.server.port = parse_env("PACKQUOTE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("PACKQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_env("PACKQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("PACKQUOTE_SERVER_ADMIN_TOKEN") {
            self.server.admin_token = Some(value.into());
        }

        let log_level =
            read_env("PACKQUOTE_LOGGING_LEVEL").or_else(|| read_env("PACKQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PACKQUOTE_LOGGING_FORMAT").or_else(|| read_env("PACKQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = Some(catalog_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(margin) = overrides.margin {
            self.pricing.margin = margin;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pricing(&self.pricing)?;
        validate_catalog(&self.catalog)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    if pricing.margin < Decimal::ZERO {
        return Err(ConfigError::Validation("pricing.margin must not be negative".to_string()));
    }
    if pricing.print_color_rate < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.print_color_rate must not be negative".to_string(),
        ));
    }
    if pricing.quantity_floor == 0 {
        return Err(ConfigError::Validation(
            "pricing.quantity_floor must be greater than zero".to_string(),
        ));
    }
    if pricing.display_cny_rate <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.display_cny_rate must be greater than zero".to_string(),
        ));
    }
    if pricing.large_order_threshold == 0 {
        return Err(ConfigError::Validation(
            "pricing.large_order_threshold must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if let Some(path) = &catalog.path {
        if !path.is_file() {
            return Err(ConfigError::Validation(format!(
                "catalog.path `{}` does not point to a readable file",
                path.display()
            )));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    if let Some(token) = &server.admin_token {
        if token.expose_secret().trim().len() < 16 {
            return Err(ConfigError::Validation(
                "server.admin_token must be at least 16 characters when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    pricing: Option<PricingPatch>,
    catalog: Option<CatalogPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    margin: Option<Decimal>,
    print_color_rate: Option<Decimal>,
    quantity_floor: Option<u32>,
    display_cny_rate: Option<Decimal>,
    large_order_threshold: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    admin_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

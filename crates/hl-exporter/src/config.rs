//! Exporter configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

/// Hyperliquid mainnet `info` endpoint.
pub const MAINNET_API_URL: &str = "https://api.hyperliquid.xyz/info";

/// Hyperliquid testnet `info` endpoint.
pub const TESTNET_API_URL: &str = "https://api.hyperliquid-testnet.xyz/info";

const DEFAULT_CHAIN: &str = "mainnet";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ERROR_CHANNEL_CAPACITY: usize = 16;
const DEFAULT_PORT: u16 = 8086;

/// The chain whose validators are monitored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }

    /// The `info` endpoint serving validator summaries for this chain.
    pub fn api_url(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_API_URL,
            Network::Testnet => TESTNET_API_URL,
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            _ => Err(ConfigError::UnknownNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct ExporterConfig {
    /// Chain to monitor (env: HL_CHAIN, default: mainnet)
    pub network: Network,
    /// Validator summaries endpoint (env: HL_API_URL, default: per network)
    pub api_url: String,
    /// Delay between polls (env: HL_VALIDATOR_POLL_INTERVAL_SECS, default: 300)
    pub poll_interval: Duration,
    /// Per-request timeout (env: HL_REQUEST_TIMEOUT_SECS, default: 10)
    pub request_timeout: Duration,
    /// Capacity of the monitor error channel (env: HL_ERROR_CHANNEL_CAPACITY, default: 16)
    pub error_channel_capacity: usize,
    /// Scrape server port (env: PORT, default: 8086)
    pub port: u16,
    /// Bearer token required for /metrics (None = public)
    pub metrics_token: Option<String>,
}

impl fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("network", &self.network)
            .field("api_url", &self.api_url)
            .field("poll_interval", &self.poll_interval)
            .field("request_timeout", &self.request_timeout)
            .field("error_channel_capacity", &self.error_channel_capacity)
            .field("port", &self.port)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ExporterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let network: Network = get("HL_CHAIN")
            .unwrap_or_else(|| DEFAULT_CHAIN.to_string())
            .parse()?;

        let api_url = get("HL_API_URL").unwrap_or_else(|| network.api_url().to_string());
        Url::parse(&api_url).map_err(|_| ConfigError::InvalidUrl(api_url.clone()))?;

        let poll_interval_secs = parse_positive(
            "HL_VALIDATOR_POLL_INTERVAL_SECS",
            get("HL_VALIDATOR_POLL_INTERVAL_SECS"),
            DEFAULT_POLL_INTERVAL_SECS,
        )?;

        let request_timeout_secs = parse_positive(
            "HL_REQUEST_TIMEOUT_SECS",
            get("HL_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        let error_channel_capacity = parse_positive(
            "HL_ERROR_CHANNEL_CAPACITY",
            get("HL_ERROR_CHANNEL_CAPACITY"),
            DEFAULT_ERROR_CHANNEL_CAPACITY,
        )?;

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let metrics_token = get("METRICS_TOKEN");
        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set — /metrics endpoint is publicly accessible");
        }

        Ok(Self {
            network,
            api_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            error_channel_capacity,
            port,
            metrics_token,
        })
    }
}

fn parse_positive<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::InvalidValue { name, value: raw }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown network {0:?} (expected \"mainnet\" or \"testnet\")")]
    UnknownNetwork(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

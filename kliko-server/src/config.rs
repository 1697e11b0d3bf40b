//! Server settings read from the environment.

use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use kliko_core::{DEFAULT_RADIUS_KM, SNAPSHOT_TTL_SECS};
use kliko_provider_spaarnelanden::BASE_URL;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(thiserror::Error, Debug)]
pub(crate) enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) server_host: IpAddr,
    pub(crate) server_port: u16,
    pub(crate) upstream_url: String,
    pub(crate) upstream_timeout: StdDuration,
    pub(crate) snapshot_ttl: Duration,
    pub(crate) default_radius_km: f64,
}

impl Config {
    /// Load settings from the process environment, after reading `.env` if present.
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let snapshot_ttl_secs = parsed(&lookup, "KLIKO_SNAPSHOT_TTL_SECS", SNAPSHOT_TTL_SECS)?;
        let default_radius_km = parsed(&lookup, "KLIKO_DEFAULT_RADIUS_KM", DEFAULT_RADIUS_KM)?;

        if snapshot_ttl_secs < 0 {
            return Err(invalid("KLIKO_SNAPSHOT_TTL_SECS", snapshot_ttl_secs));
        }
        if !default_radius_km.is_finite() || default_radius_km < 0.0 {
            return Err(invalid("KLIKO_DEFAULT_RADIUS_KM", default_radius_km));
        }

        Ok(Self {
            server_host: parsed(&lookup, "SERVER_HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            server_port: parsed(&lookup, "SERVER_PORT", DEFAULT_PORT)?,
            upstream_url: lookup("KLIKO_UPSTREAM_URL").unwrap_or_else(|| BASE_URL.to_owned()),
            upstream_timeout: StdDuration::from_secs(parsed(
                &lookup,
                "KLIKO_UPSTREAM_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            snapshot_ttl: Duration::seconds(snapshot_ttl_secs),
            default_radius_km,
        })
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_err| ConfigError::Invalid { name, value }),
    }
}

fn invalid(name: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
    }
}

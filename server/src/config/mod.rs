use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use crate::services::GeoParamPolicy;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Populate the store with demo events at start-up.
    pub seed_sample_events: bool,
    pub geo_param_policy: GeoParamPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            seed_sample_events: true,
            geo_param_policy: GeoParamPolicy::Reject,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset keys keep their
    /// defaults; unparseable ones are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: parse_or("HOST", &lookup, defaults.host),
            port: parse_or("PORT", &lookup, defaults.port),
            seed_sample_events: lookup("SEED_SAMPLE_EVENTS")
                .map(|v| parse_flag("SEED_SAMPLE_EVENTS", &v, defaults.seed_sample_events))
                .unwrap_or(defaults.seed_sample_events),
            geo_param_policy: parse_or("GEO_PARAM_POLICY", &lookup, defaults.geo_param_policy),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Config: ignoring invalid {}='{}': {}", key, raw, e);
            default
        }),
    }
}

fn parse_flag(key: &str, raw: &str, default: bool) -> bool {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            tracing::warn!("Config: ignoring invalid {}='{}'", key, raw);
            default
        }
    }
}

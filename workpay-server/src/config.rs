//! Environment-driven service configuration.
//!
//! # Environment Variables
//!
//! - `WORKPAY_NETWORK` - settlement network name (default: `base-sepolia`)
//! - `WORKPAY_RPC_URL` - chain RPC endpoint (default: the network's public RPC)
//! - `WORKPAY_FACILITATOR_URL` - receipt verification service
//! - `HOST` - bind address (default: `0.0.0.0`)
//! - `PORT` - bind port (default: `4022`)
//! - `RUST_LOG` - log level filter (default: `info`)
//!
//! A `.env` file in the working directory is loaded before reading these.

use std::net::IpAddr;
use std::str::FromStr;

use url::Url;
use workpay::networks::Network;

const DEFAULT_FACILITATOR_URL: &str = "https://x402.org/facilitator";
const DEFAULT_PORT: u16 = 4022;

/// A configuration variable failed to parse.
#[derive(Debug, thiserror::Error)]
#[error("{var}: {message}")]
pub struct ConfigError {
    /// The offending environment variable.
    pub var: &'static str,
    /// What was wrong with it.
    pub message: String,
}

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub host: IpAddr,
    /// Bind port.
    pub port: u16,
    /// Settlement network challenges are issued for.
    pub network: Network,
    /// Chain RPC endpoint for receipt lookups.
    pub rpc_url: Url,
    /// Facilitator endpoint for receipt verification.
    pub facilitator_url: Url,
}

impl ServerConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for any variable that fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for any variable that fails to parse.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let network = match get("WORKPAY_NETWORK") {
            Some(raw) => Network::from_str(&raw).map_err(|e| ConfigError {
                var: "WORKPAY_NETWORK",
                message: e.to_string(),
            })?,
            None => Network::BaseSepolia,
        };

        let rpc_url = get("WORKPAY_RPC_URL")
            .unwrap_or_else(|| network.default_rpc_url().to_owned());
        let rpc_url = Url::parse(&rpc_url).map_err(|e| ConfigError {
            var: "WORKPAY_RPC_URL",
            message: e.to_string(),
        })?;

        let facilitator_url = get("WORKPAY_FACILITATOR_URL")
            .unwrap_or_else(|| DEFAULT_FACILITATOR_URL.to_owned());
        let facilitator_url = Url::parse(&facilitator_url).map_err(|e| ConfigError {
            var: "WORKPAY_FACILITATOR_URL",
            message: e.to_string(),
        })?;

        let host = match get("HOST") {
            Some(raw) => raw.parse::<IpAddr>().map_err(|e| ConfigError {
                var: "HOST",
                message: e.to_string(),
            })?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError {
                var: "PORT",
                message: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host,
            port,
            network,
            rpc_url,
            facilitator_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.network, Network::BaseSepolia);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(
            config.rpc_url,
            Url::parse(Network::BaseSepolia.default_rpc_url()).unwrap()
        );
    }

    #[test]
    fn variables_override_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("WORKPAY_NETWORK", "base"),
            ("WORKPAY_RPC_URL", "https://rpc.example.test/"),
            ("PORT", "9000"),
        ]);
        let config =
            ServerConfig::from_lookup(|name| vars.get(name).map(|v| (*v).to_owned())).unwrap();
        assert_eq!(config.network, Network::Base);
        assert_eq!(config.rpc_url.as_str(), "https://rpc.example.test/");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn bad_network_name_is_rejected() {
        let err = ServerConfig::from_lookup(|name| {
            (name == "WORKPAY_NETWORK").then(|| "dogecoin".to_owned())
        })
        .unwrap_err();
        assert_eq!(err.var, "WORKPAY_NETWORK");
    }
}

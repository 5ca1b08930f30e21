//! Persisted client configuration.
//!
//! The paying client keeps a small JSON config file: which network to pay
//! on, where the marketplace API lives, the agent's payout address, and
//! which wallet variant signs transfers. Secrets are referenced by
//! environment variable name, never stored in the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::networks::Network;

/// Errors while loading or saving client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written.
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),

    /// File contents were not valid config JSON.
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),

    /// A referenced environment variable is unset.
    #[error("environment variable {0} is not set")]
    MissingEnv(String),
}

/// Wallet variant selection and its credentials references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "camelCase")]
pub enum WalletConfig {
    /// Local private-key wallet, talking directly to a chain RPC endpoint.
    #[serde(rename_all = "camelCase")]
    Local {
        /// Environment variable holding the raw private key.
        private_key_env: String,
        /// RPC endpoint override; the network default is used when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rpc_url: Option<String>,
    },
    /// Remote custodial signing service.
    #[serde(rename_all = "camelCase")]
    Custodial {
        /// Base URL of the signing service.
        service_url: String,
        /// API key identifier.
        api_key_id: String,
        /// Environment variable holding the API key secret.
        api_key_secret_env: String,
        /// Previously provisioned wallet id, if any. Absent means the
        /// provider provisions a new wallet on first init.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wallet_id: Option<String>,
    },
}

/// Persisted client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Marketplace API base URL.
    pub api_url: String,

    /// Settlement network.
    pub network: Network,

    /// This agent's payout address, once registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_address: Option<String>,

    /// Wallet variant used to pay.
    pub wallet: WalletConfig,
}

impl ClientConfig {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on read or parse failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Writes configuration to a JSON file, pretty-printed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on serialization or write failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Resolves a secret referenced by environment variable name.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnv`] if the variable is unset.
pub fn resolve_secret(env_name: &str) -> Result<String, ConfigError> {
    std::env::var(env_name).map_err(|_| ConfigError::MissingEnv(env_name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_local_wallet_config() {
        let config = ClientConfig {
            api_url: "https://api.example.test".to_owned(),
            network: Network::BaseSepolia,
            payout_address: Some("0x1111111111111111111111111111111111111111".to_owned()),
            wallet: WalletConfig::Local {
                private_key_env: "WORKPAY_PRIVATE_KEY".to_owned(),
                rpc_url: None,
            },
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"provider\":\"local\""));
        assert!(json.contains("\"network\":\"base-sepolia\""));
        let back: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn custodial_wallet_id_is_optional() {
        let json = serde_json::json!({
            "apiUrl": "https://api.example.test",
            "network": "base",
            "wallet": {
                "provider": "custodial",
                "serviceUrl": "https://signer.example.test",
                "apiKeyId": "key-1",
                "apiKeySecretEnv": "SIGNER_SECRET",
            },
        });
        let config: ClientConfig = serde_json::from_value(json).unwrap();
        match config.wallet {
            WalletConfig::Custodial { wallet_id, .. } => assert!(wallet_id.is_none()),
            WalletConfig::Local { .. } => panic!("expected custodial"),
        }
    }
}

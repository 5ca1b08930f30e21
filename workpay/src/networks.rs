//! The closed set of supported networks.
//!
//! Payments settle on Base: mainnet in production, Base Sepolia for testing.
//! Each network is bound 1:1 to a chain id and a USDC contract deployment;
//! adding a network means adding one more fixed binding here.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, address};
use serde::{Deserialize, Serialize};

/// Base Mainnet chain ID.
pub const BASE_MAINNET: u64 = 8453;

/// Base Sepolia (testnet) chain ID.
pub const BASE_SEPOLIA: u64 = 84532;

/// USDC contract address on Base Mainnet.
pub const USDC_BASE: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

/// USDC contract address on Base Sepolia.
pub const USDC_BASE_SEPOLIA: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

/// A supported settlement network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    /// Base Mainnet (production).
    Base,
    /// Base Sepolia (test).
    BaseSepolia,
}

impl Network {
    /// The numeric EIP-155 chain id.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        match self {
            Self::Base => BASE_MAINNET,
            Self::BaseSepolia => BASE_SEPOLIA,
        }
    }

    /// The USDC token contract deployed on this network.
    #[must_use]
    pub const fn usdc_address(&self) -> Address {
        match self {
            Self::Base => USDC_BASE,
            Self::BaseSepolia => USDC_BASE_SEPOLIA,
        }
    }

    /// Wire name, e.g. `"base-sepolia"`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::BaseSepolia => "base-sepolia",
        }
    }

    /// Human-readable display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Base => "Base",
            Self::BaseSepolia => "Base Sepolia",
        }
    }

    /// Block explorer base URL.
    #[must_use]
    pub const fn explorer_url(&self) -> &'static str {
        match self {
            Self::Base => "https://basescan.org",
            Self::BaseSepolia => "https://sepolia.basescan.org",
        }
    }

    /// Explorer URL for a transaction hash.
    #[must_use]
    pub fn explorer_tx_url(&self, tx_hash: impl fmt::Display) -> String {
        format!("{}/tx/{tx_hash}", self.explorer_url())
    }

    /// Native-token faucet for testnets, if one exists.
    #[must_use]
    pub const fn eth_faucet(&self) -> Option<&'static str> {
        match self {
            Self::Base => None,
            Self::BaseSepolia => Some("https://www.alchemy.com/faucets/base-sepolia"),
        }
    }

    /// USDC faucet for testnets, if one exists.
    #[must_use]
    pub const fn usdc_faucet(&self) -> Option<&'static str> {
        match self {
            Self::Base => None,
            Self::BaseSepolia => Some("https://faucet.circle.com/"),
        }
    }

    /// Default public RPC endpoint.
    #[must_use]
    pub const fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::Base => "https://mainnet.base.org",
            Self::BaseSepolia => "https://sepolia.base.org",
        }
    }

    /// Resolves a network from its numeric chain id.
    #[must_use]
    pub const fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            BASE_MAINNET => Some(Self::Base),
            BASE_SEPOLIA => Some(Self::BaseSepolia),
            _ => None,
        }
    }

    /// Display name for a chain id, falling back to `Chain {id}` for
    /// networks outside the supported set.
    #[must_use]
    pub fn name_for_chain_id(chain_id: u64) -> String {
        match Self::from_chain_id(chain_id) {
            Some(network) => network.display_name().to_owned(),
            None => format!("Chain {chain_id}"),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Self::Base),
            "base-sepolia" => Ok(Self::BaseSepolia),
            other => Err(UnknownNetwork(other.to_owned())),
        }
    }
}

/// Error returned when parsing an unsupported network name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network: {0}")]
pub struct UnknownNetwork(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_are_fixed() {
        assert_eq!(Network::Base.chain_id(), 8453);
        assert_eq!(Network::BaseSepolia.chain_id(), 84532);
        assert_eq!(Network::Base.usdc_address(), USDC_BASE);
        assert_eq!(Network::BaseSepolia.usdc_address(), USDC_BASE_SEPOLIA);
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("base".parse::<Network>().unwrap(), Network::Base);
        assert_eq!(
            "base-sepolia".parse::<Network>().unwrap(),
            Network::BaseSepolia
        );
        assert!("solana".parse::<Network>().is_err());
    }

    #[test]
    fn serde_uses_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Network::BaseSepolia).unwrap(),
            "\"base-sepolia\""
        );
    }

    #[test]
    fn chain_id_lookup() {
        assert_eq!(Network::from_chain_id(8453), Some(Network::Base));
        assert_eq!(Network::from_chain_id(1), None);
        assert_eq!(Network::name_for_chain_id(84532), "Base Sepolia");
        assert_eq!(Network::name_for_chain_id(1), "Chain 1");
    }
}

//! Payment requirements carried by 402 responses.
//!
//! A requirement is the canonical description of what must be paid: payee,
//! amount in base units, asset contract, chain binding, and the job id the
//! payment settles. It is immutable once issued; a client echoes it
//! unmodified when executing the transfer.

use std::str::FromStr;
use std::sync::LazyLock;

use alloy_primitives::{Address, U256};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::amount::{AmountError, UsdcAmount};
use crate::networks::Network;

/// Matches a 20-byte EVM address: `0x` plus 40 hex digits.
static EVM_ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^0x[a-fA-F0-9]{40}$").expect("valid address regex"));

/// Returns `true` if `value` is a well-formed `0x`-prefixed EVM address.
#[must_use]
pub fn is_evm_address(value: &str) -> bool {
    EVM_ADDRESS_RE.is_match(value)
}

/// Errors found while validating a received requirement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequirementError {
    /// The payee is not a well-formed EVM address.
    #[error("invalid payment requirement: invalid payTo address `{0}`")]
    InvalidPayee(String),

    /// The amount is not a base-unit integer.
    #[error("invalid payment requirement: invalid amount `{0}`")]
    InvalidAmount(String),

    /// The chain id is absent.
    #[error("invalid payment requirement: missing chainId")]
    MissingChainId,
}

/// Correlation metadata attached to a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementMetadata {
    /// The job this payment settles.
    #[serde(rename = "jobId")]
    pub job_id: String,
}

/// What must be paid to pass the payment gate.
///
/// Amounts travel as base-unit decimal strings, never as floats. Addresses
/// travel as hex strings so a receiving client can report malformed values
/// as validation errors rather than opaque decode failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirement {
    /// Recipient wallet address.
    pub pay_to: String,

    /// Amount in USDC base units, as a decimal string (e.g. `"25500000"`).
    pub amount: String,

    /// USDC contract address on the settlement chain.
    pub asset: String,

    /// Settlement network name.
    pub chain: Network,

    /// Numeric EIP-155 chain id.
    #[serde(default)]
    pub chain_id: Option<u64>,

    /// Free-text description shown to the payer.
    pub description: String,

    /// Correlation metadata.
    pub metadata: RequirementMetadata,
}

impl PaymentRequirement {
    /// Builds the requirement for paying `amount` USDC to `pay_to` on
    /// `network`, settling job `job_id`.
    ///
    /// Pure: the asset contract and chain id are resolved from the fixed
    /// network binding.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::OutOfRange`] if `amount` does not fit the
    /// base-unit range.
    pub fn build(
        network: Network,
        pay_to: Address,
        amount: &UsdcAmount,
        job_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, AmountError> {
        Ok(Self {
            pay_to: format!("{pay_to:?}"),
            amount: amount.to_base_units()?.to_string(),
            asset: format!("{:?}", network.usdc_address()),
            chain: network,
            chain_id: Some(network.chain_id()),
            description: description.into(),
            metadata: RequirementMetadata {
                job_id: job_id.into(),
            },
        })
    }

    /// Validates a requirement received from a server.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: malformed payee, non-numeric
    /// amount, or missing chain id.
    pub fn validate(&self) -> Result<(), RequirementError> {
        if !is_evm_address(&self.pay_to) {
            return Err(RequirementError::InvalidPayee(self.pay_to.clone()));
        }
        if self.required_units().is_err() {
            return Err(RequirementError::InvalidAmount(self.amount.clone()));
        }
        if self.chain_id.is_none() {
            return Err(RequirementError::MissingChainId);
        }
        Ok(())
    }

    /// The payee parsed as an [`Address`].
    ///
    /// # Errors
    ///
    /// Returns [`RequirementError::InvalidPayee`] if the field is malformed.
    pub fn pay_to_address(&self) -> Result<Address, RequirementError> {
        Address::from_str(&self.pay_to)
            .map_err(|_| RequirementError::InvalidPayee(self.pay_to.clone()))
    }

    /// The required amount in base units.
    ///
    /// # Errors
    ///
    /// Returns [`RequirementError::InvalidAmount`] if the field is not a
    /// decimal integer.
    pub fn required_units(&self) -> Result<U256, RequirementError> {
        U256::from_str_radix(self.amount.trim(), 10)
            .map_err(|_| RequirementError::InvalidAmount(self.amount.clone()))
    }

    /// The required amount in display units.
    #[must_use]
    pub fn display_amount(&self) -> UsdcAmount {
        self.required_units()
            .ok()
            .and_then(|units| UsdcAmount::from_base_units(units).ok())
            .unwrap_or(UsdcAmount::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const PAYEE: Address = address!("1111111111111111111111111111111111111111");

    fn requirement() -> PaymentRequirement {
        PaymentRequirement::build(
            Network::BaseSepolia,
            PAYEE,
            &"25.5".parse().unwrap(),
            "J1",
            "Payment for job: fix the parser",
        )
        .unwrap()
    }

    #[test]
    fn builds_base_unit_amount_and_correlation() {
        let req = requirement();
        assert_eq!(req.amount, "25500000");
        assert_eq!(req.metadata.job_id, "J1");
        assert_eq!(req.chain_id, Some(84532));
        assert_eq!(req.asset, format!("{:?}", Network::BaseSepolia.usdc_address()));
        req.validate().unwrap();
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(requirement()).unwrap();
        assert_eq!(value["amount"], "25500000");
        assert_eq!(value["metadata"]["jobId"], "J1");
        assert_eq!(value["chain"], "base-sepolia");
        assert_eq!(value["chainId"], 84532);
        assert!(value["payTo"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn rejects_malformed_payee() {
        let mut req = requirement();
        req.pay_to = "0x1234".to_owned();
        assert!(matches!(
            req.validate(),
            Err(RequirementError::InvalidPayee(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_amount() {
        let mut req = requirement();
        req.amount = "25.5".to_owned();
        assert!(matches!(
            req.validate(),
            Err(RequirementError::InvalidAmount(_))
        ));
    }

    #[test]
    fn rejects_missing_chain_id() {
        let mut req = requirement();
        req.chain_id = None;
        assert_eq!(req.validate(), Err(RequirementError::MissingChainId));
    }

    #[test]
    fn display_amount_round_trips() {
        assert_eq!(requirement().display_amount().to_string(), "25.50");
    }
}

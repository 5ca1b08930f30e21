//! Solidity interface definitions for on-chain interactions.
//!
//! Only the ERC-20 surface the payment core actually touches is declared:
//! `transfer` and `balanceOf` for the wallet provider, and the `Transfer`
//! event for receipt verification.

use alloy_sol_types::sol;

sol! {
    /// Minimal ERC-20 interface for USDC-style tokens.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
        function transfer(address to, uint256 value) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolEvent;

    #[test]
    fn transfer_event_signature_matches_canonical_hash() {
        // keccak256("Transfer(address,address,uint256)")
        assert_eq!(
            format!("{:?}", IERC20::Transfer::SIGNATURE_HASH),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }
}

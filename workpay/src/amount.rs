//! USDC amount codec.
//!
//! Converts between human-readable decimal amounts and the 6-decimal
//! fixed-point integer ("base units") representation used on-chain. Amounts
//! are kept as [`Decimal`] values internally and as decimal strings on the
//! wire; a binary float never carries a settlement amount.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimals in the USDC token contract.
pub const USDC_DECIMALS: u32 = 6;

/// Multiplier between display units and base units (`10^6`).
const UNIT_SCALE: u32 = 1_000_000;

/// Errors produced by amount parsing and conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The amount was negative.
    #[error("amount must not be negative: {0}")]
    Negative(Decimal),

    /// The amount does not fit the base-unit integer range.
    #[error("amount out of range: {0}")]
    OutOfRange(Decimal),

    /// The input string was not a decimal number.
    #[error("invalid amount: {0}")]
    Parse(String),
}

/// A non-negative USDC amount.
///
/// Display formatting uses two decimal places; settlement math always goes
/// through [`UsdcAmount::to_base_units`].
///
/// # Example
///
/// ```rust
/// use workpay::amount::UsdcAmount;
///
/// let amount: UsdcAmount = "10.50".parse().unwrap();
/// assert_eq!(amount.to_base_units().unwrap().to_string(), "10500000");
/// assert_eq!(amount.to_string(), "10.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsdcAmount(Decimal);

impl UsdcAmount {
    /// Zero USDC.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates an amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Negative`] for negative input.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(value));
        }
        Ok(Self(value))
    }

    /// Converts to base units, rounding half-up to the nearest unit.
    ///
    /// `10.50` becomes `10500000`; `0.01` becomes `10000`.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::OutOfRange`] if scaling by `10^6` overflows
    /// the decimal range.
    pub fn to_base_units(&self) -> Result<U256, AmountError> {
        // Non-negative by construction, so away-from-zero is half-up.
        let scaled = self
            .0
            .checked_mul(Decimal::from(UNIT_SCALE))
            .ok_or(AmountError::OutOfRange(self.0))?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let units = scaled.to_u128().ok_or(AmountError::OutOfRange(self.0))?;
        Ok(U256::from(units))
    }

    /// Reconstructs an amount from base units.
    ///
    /// Left inverse of [`UsdcAmount::to_base_units`] up to rounding: the
    /// round trip stays within `1e-6` of the original.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::OutOfRange`] if `units` exceeds the decimal
    /// range (USDC supply never does).
    pub fn from_base_units(units: U256) -> Result<Self, AmountError> {
        let raw = u128::try_from(units)
            .map_err(|_| AmountError::OutOfRange(Decimal::MAX))?;
        let raw = i128::try_from(raw).map_err(|_| AmountError::OutOfRange(Decimal::MAX))?;
        Ok(Self(Decimal::from_i128_with_scale(raw, USDC_DECIMALS)))
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns `true` for a zero amount.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for UsdcAmount {
    /// Fixed two-decimal display form, e.g. `10.50`. Display only; never
    /// used for settlement math.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for UsdcAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| AmountError::Parse(s.to_owned()))?;
        Self::new(value)
    }
}

impl TryFrom<Decimal> for UsdcAmount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc(s: &str) -> UsdcAmount {
        s.parse().unwrap()
    }

    #[test]
    fn converts_to_base_units() {
        assert_eq!(usdc("10.50").to_base_units().unwrap(), U256::from(10_500_000u64));
        assert_eq!(usdc("0.01").to_base_units().unwrap(), U256::from(10_000u64));
        assert_eq!(usdc("0").to_base_units().unwrap(), U256::ZERO);
        assert_eq!(usdc("25.5").to_base_units().unwrap(), U256::from(25_500_000u64));
    }

    #[test]
    fn rounds_half_up_past_six_decimals() {
        assert_eq!(usdc("0.0000005").to_base_units().unwrap(), U256::from(1u64));
        assert_eq!(usdc("0.0000004").to_base_units().unwrap(), U256::ZERO);
    }

    #[test]
    fn rejects_negative() {
        assert!(matches!(
            "-1.00".parse::<UsdcAmount>(),
            Err(AmountError::Negative(_))
        ));
        assert!(matches!(
            "abc".parse::<UsdcAmount>(),
            Err(AmountError::Parse(_))
        ));
    }

    #[test]
    fn scaling_overflow_is_out_of_range() {
        let huge = UsdcAmount::new(Decimal::MAX).unwrap();
        assert!(matches!(
            huge.to_base_units(),
            Err(AmountError::OutOfRange(_))
        ));
    }

    #[test]
    fn round_trips_within_tolerance() {
        for s in ["0", "0.01", "1", "10.50", "123456.789012", "0.000001"] {
            let original = usdc(s);
            let back = UsdcAmount::from_base_units(original.to_base_units().unwrap()).unwrap();
            let diff = (original.value() - back.value()).abs();
            assert!(
                diff < Decimal::from_i128_with_scale(1, 6),
                "round trip drifted for {s}: {diff}"
            );
        }
    }

    #[test]
    fn formats_with_two_decimals() {
        assert_eq!(usdc("10.5").to_string(), "10.50");
        assert_eq!(usdc("3").to_string(), "3.00");
        assert_eq!(
            UsdcAmount::from_base_units(U256::from(10_500_000u64))
                .unwrap()
                .to_string(),
            "10.50"
        );
    }
}

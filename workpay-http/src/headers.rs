//! JSON encoding and decoding for challenge headers.
//!
//! The payment requirement travels in the `x-payment-required` header as
//! plain JSON, mirroring the copy in the 402 response body. Clients that
//! cannot read the body (some middleware strips it) fall back to the
//! header.

use workpay::requirement::PaymentRequirement;

use crate::error::HttpError;

/// Encodes a [`PaymentRequirement`] for the `x-payment-required` header.
///
/// # Errors
///
/// Returns [`HttpError::Serialize`] if JSON serialization fails.
pub fn encode_payment_required(requirement: &PaymentRequirement) -> Result<String, HttpError> {
    Ok(serde_json::to_string(requirement)?)
}

/// Decodes an `x-payment-required` header value.
///
/// # Errors
///
/// Returns [`HttpError::Serialize`] on JSON decode failure.
pub fn decode_payment_required(header_value: &str) -> Result<PaymentRequirement, HttpError> {
    Ok(serde_json::from_str(header_value.trim())?)
}

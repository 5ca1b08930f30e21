//! HTTP constants for the payment protocol.

/// Header carrying the JSON payment requirement on a 402 response
/// (server to client). The same requirement also appears in the body.
pub const PAYMENT_REQUIRED_HEADER: &str = "x-payment-required";

/// Header carrying the payment proof on a resubmitted request
/// (client to server): a transaction hash or a facilitator receipt.
pub const PAYMENT_HEADER: &str = "x-payment";

/// Header reserved for facilitator settlement receipts returned to the
/// client after a verified payment. Not populated yet.
pub const RECEIPT_HEADER: &str = "x-receipt";

/// Header naming the calling agent. Authentication happens upstream;
/// this identifies which authenticated agent is acting.
pub const AGENT_ID_HEADER: &str = "x-agent-id";

/// HTTP 402 Payment Required status code.
pub const HTTP_STATUS_PAYMENT_REQUIRED: u16 = 402;

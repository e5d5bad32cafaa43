//! # QR Payload Codec
//!
//! Encodes and decodes the short text strings printed into QR labels.
//!
//! ## Payload Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        QR Payload Convention                            │
//! │                                                                         │
//! │  product:<id>                      identifies a Product                 │
//! │  borrow:<transaction_number>       identifies a BorrowTransaction       │
//! │                                                                         │
//! │  Decoding splits on the FIRST ':' only; the value part may itself       │
//! │  contain ':' characters.                                                │
//! │                                                                         │
//! │  Deployed labels already encode this format, so it must stay            │
//! │  decodable forever.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Round-Trip Law
//! `QrPayload::decode(&p.encode()) == Ok(p)` for every valid payload `p`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CodecError;

/// Prefix identifying a product payload.
pub const PRODUCT_PREFIX: &str = "product";

/// Prefix identifying a borrow-transaction payload.
pub const BORROW_PREFIX: &str = "borrow";

/// A decoded QR payload.
///
/// Pure value type: encoding and decoding have no side effects and touch
/// no storage. The payload string is always derivable from the entity it
/// names, never stored independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QrPayload {
    /// `product:<id>` - a product label.
    Product(String),
    /// `borrow:<transaction_number>` - a borrow slip label.
    Borrow(String),
}

impl QrPayload {
    /// Encodes this payload to its printed string form.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::codec::QrPayload;
    ///
    /// let p = QrPayload::Borrow("BOR-20250122-001".to_string());
    /// assert_eq!(p.encode(), "borrow:BOR-20250122-001");
    /// ```
    pub fn encode(&self) -> String {
        match self {
            QrPayload::Product(id) => format!("{}:{}", PRODUCT_PREFIX, id),
            QrPayload::Borrow(number) => format!("{}:{}", BORROW_PREFIX, number),
        }
    }

    /// Decodes a scanned payload string.
    ///
    /// Splits on the first `:`; an unrecognized prefix, a missing separator,
    /// or an empty value fails with [`CodecError::MalformedPayload`].
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::codec::QrPayload;
    ///
    /// let decoded = QrPayload::decode("product:42").unwrap();
    /// assert_eq!(decoded, QrPayload::Product("42".to_string()));
    ///
    /// assert!(QrPayload::decode("not-a-valid-payload").is_err());
    /// ```
    pub fn decode(payload: &str) -> Result<Self, CodecError> {
        let malformed = || CodecError::MalformedPayload {
            payload: payload.to_string(),
        };

        let (prefix, value) = payload.split_once(':').ok_or_else(malformed)?;

        if value.is_empty() {
            return Err(malformed());
        }

        match prefix {
            PRODUCT_PREFIX => Ok(QrPayload::Product(value.to_string())),
            BORROW_PREFIX => Ok(QrPayload::Borrow(value.to_string())),
            _ => Err(malformed()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_product() {
        let p = QrPayload::Product("42".to_string());
        assert_eq!(p.encode(), "product:42");
    }

    #[test]
    fn test_encode_borrow() {
        let p = QrPayload::Borrow("BOR-20250122-001".to_string());
        assert_eq!(p.encode(), "borrow:BOR-20250122-001");
    }

    #[test]
    fn test_round_trip() {
        let payloads = [
            QrPayload::Product("42".to_string()),
            QrPayload::Product("550e8400-e29b-41d4-a716-446655440000".to_string()),
            QrPayload::Borrow("BOR-20250122-001".to_string()),
            QrPayload::Borrow("BOR-20251231-1000".to_string()),
        ];

        for p in payloads {
            assert_eq!(QrPayload::decode(&p.encode()).unwrap(), p);
        }
    }

    #[test]
    fn test_decode_splits_on_first_colon_only() {
        // The value part keeps any further colons intact.
        let decoded = QrPayload::decode("product:a:b:c").unwrap();
        assert_eq!(decoded, QrPayload::Product("a:b:c".to_string()));
    }

    #[test]
    fn test_decode_malformed() {
        // No separator at all
        assert!(QrPayload::decode("not-a-valid-payload").is_err());
        // Empty string
        assert!(QrPayload::decode("").is_err());
        // Unknown prefix
        assert!(QrPayload::decode("user:7").is_err());
        // Empty value
        assert!(QrPayload::decode("product:").is_err());
        assert!(QrPayload::decode("borrow:").is_err());
        // Prefixes are case-sensitive, matching the printed labels
        assert!(QrPayload::decode("Product:42").is_err());
    }
}

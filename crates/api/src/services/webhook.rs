//! Provider webhook signature verification and event decoding.
//!
//! The provider signs each delivery with a `t=<unix>,v1=<hex>` header
//! where `v1` is HMAC-SHA256 over `"{t}.{raw_body}"` keyed with the
//! shared webhook secret. Verification happens on the raw bytes before
//! any JSON parsing, and the timestamp is checked against a tolerance
//! to blunt replay.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age of a delivery, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Webhook verification and decoding errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    /// The signature header is missing or not in `t=...,v1=...` form.
    #[error("malformed signature header")]
    MalformedHeader,

    /// The timestamp is outside the accepted tolerance.
    #[error("timestamp outside tolerance")]
    StaleTimestamp,

    /// No candidate signature matched the payload.
    #[error("signature mismatch")]
    BadSignature,

    /// The payload is not a well-formed event.
    #[error("unparseable event payload: {0}")]
    BadPayload(String),
}

/// A decoded webhook event. Local to the request that carried it.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Provider event id (`evt_...`).
    pub id: String,
    /// Event type, e.g. `charge.succeeded`.
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: WebhookObject,
}

/// The charge or payment-intent object inside the event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookObject {
    /// Provider transaction id (`ch_...` / `pi_...`).
    pub id: String,
}

/// Parsed form of the signature header.
struct SignatureHeader {
    timestamp: i64,
    /// All `v1` candidates; any match accepts (supports secret rolls).
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    match (timestamp, signatures.is_empty()) {
        (Some(timestamp), false) => Ok(SignatureHeader { timestamp, signatures }),
        _ => Err(WebhookError::MalformedHeader),
    }
}

/// Verify the signature over the raw body and decode the event.
///
/// `now` is the current unix time, passed in so verification is
/// deterministic under test.
///
/// # Errors
///
/// Returns a [`WebhookError`] describing the first check that failed;
/// callers must treat every variant as a rejected delivery.
pub fn verify_and_parse(
    raw_body: &[u8],
    signature_header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<WebhookEvent, WebhookError> {
    let header = parse_header(signature_header)?;

    if (now - header.timestamp).abs() > tolerance_secs {
        return Err(WebhookError::StaleTimestamp);
    }

    let mut signed_payload = header.timestamp.to_string().into_bytes();
    signed_payload.push(b'.');
    signed_payload.extend_from_slice(raw_body);

    let verified = header.signatures.iter().any(|candidate| {
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(&signed_payload);
        mac.verify_slice(candidate).is_ok()
    });

    if !verified {
        return Err(WebhookError::BadSignature);
    }

    serde_json::from_slice(raw_body).map_err(|e| WebhookError::BadPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn sign(body: &[u8], timestamp: i64, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(body);
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={signature}")
    }

    fn event_body() -> Vec<u8> {
        br#"{
            "id": "evt_1",
            "type": "charge.succeeded",
            "data": {"object": {"id": "ch_123", "amount": 1999}}
        }"#
        .to_vec()
    }

    #[test]
    fn accepts_a_correctly_signed_event() {
        let body = event_body();
        let header = sign(&body, 1_700_000_000, SECRET);
        let event =
            verify_and_parse(&body, &header, SECRET, 1_700_000_010, DEFAULT_TOLERANCE_SECS)
                .unwrap();
        assert_eq!(event.event_type, "charge.succeeded");
        assert_eq!(event.data.object.id, "ch_123");
    }

    #[test]
    fn rejects_a_tampered_body() {
        let body = event_body();
        let header = sign(&body, 1_700_000_000, SECRET);
        let tampered = String::from_utf8(body).unwrap().replace("1999", "1");
        let result = verify_and_parse(
            tampered.as_bytes(),
            &header,
            SECRET,
            1_700_000_010,
            DEFAULT_TOLERANCE_SECS,
        );
        assert_eq!(result.unwrap_err(), WebhookError::BadSignature);
    }

    #[test]
    fn rejects_a_wrong_secret() {
        let body = event_body();
        let header = sign(&body, 1_700_000_000, "whsec_other");
        let result =
            verify_and_parse(&body, &header, SECRET, 1_700_000_010, DEFAULT_TOLERANCE_SECS);
        assert_eq!(result.unwrap_err(), WebhookError::BadSignature);
    }

    #[test]
    fn rejects_a_stale_timestamp() {
        let body = event_body();
        let header = sign(&body, 1_700_000_000, SECRET);
        let result = verify_and_parse(
            &body,
            &header,
            SECRET,
            1_700_000_000 + DEFAULT_TOLERANCE_SECS + 1,
            DEFAULT_TOLERANCE_SECS,
        );
        assert_eq!(result.unwrap_err(), WebhookError::StaleTimestamp);
    }

    #[test]
    fn rejects_a_malformed_header() {
        let body = event_body();
        for header in ["", "t=abc,v1=zz", "v1=00ff", "t=123"] {
            let result =
                verify_and_parse(&body, header, SECRET, 123, DEFAULT_TOLERANCE_SECS);
            assert_eq!(result.unwrap_err(), WebhookError::MalformedHeader, "{header}");
        }
    }

    #[test]
    fn accepts_any_matching_v1_candidate() {
        let body = event_body();
        let timestamp = 1_700_000_000;
        let good = sign(&body, timestamp, SECRET);
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t={timestamp},v1={},v1={good_sig}", "00".repeat(32));
        let event =
            verify_and_parse(&body, &header, SECRET, timestamp, DEFAULT_TOLERANCE_SECS).unwrap();
        assert_eq!(event.id, "evt_1");
    }

    #[test]
    fn rejects_an_unparseable_payload() {
        let body = b"not json";
        let header = sign(body, 1_700_000_000, SECRET);
        let result =
            verify_and_parse(body, &header, SECRET, 1_700_000_000, DEFAULT_TOLERANCE_SECS);
        assert!(matches!(result.unwrap_err(), WebhookError::BadPayload(_)));
    }
}

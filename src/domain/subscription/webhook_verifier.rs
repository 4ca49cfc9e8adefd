//! Payment webhook signature verification.
//!
//! Deliveries carry an HMAC-SHA256 signature over `<timestamp>.<payload>`
//! in a `t=...,v1=...` header. Verification checks the timestamp window
//! before the signature so stale replays fail fast.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::payment_event::PaymentEvent;
use super::webhook_errors::WebhookError;

/// Oldest delivery accepted (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Tolerated clock skew for timestamps from the future (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components of the signature header.
///
/// Format: `t=<unix timestamp>,v1=<hex hmac>`. Unknown key/value pairs are
/// ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signature: Vec<u8>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("malformed signature header".to_string()))?;

            match key.trim() {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp in header".to_string())
                    })?);
                }
                "v1" => {
                    signature = Some(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("signature is not valid hex".to_string())
                    })?);
                }
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        let signature =
            signature.ok_or_else(|| WebhookError::ParseError("missing v1 signature".to_string()))?;

        Ok(SignatureHeader {
            timestamp,
            signature,
        })
    }
}

/// Verifies webhook deliveries against the shared signing secret.
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verifies the delivery and parses the event payload.
    ///
    /// # Errors
    ///
    /// - `ParseError` for a malformed header or payload
    /// - `TimestampOutOfRange` / `InvalidTimestamp` for stale or future events
    /// - `InvalidSignature` when the HMAC does not match
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<PaymentEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.validate_timestamp(header.timestamp)?;

        let expected = self.compute_signature(header.timestamp, payload);
        if !constant_time_compare(&expected, &header.signature) {
            return Err(WebhookError::InvalidSignature);
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }

    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let age = chrono::Utc::now().timestamp() - timestamp;

        if age > MAX_EVENT_AGE_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }

        Ok(())
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(signed_payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Signs a payload the way the provider does, for test fixtures.
#[cfg(test)]
pub fn sign_test_payload(secret: &str, timestamp: i64, payload: &str) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(signed_payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

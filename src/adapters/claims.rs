use crate::core::{AccountSlot, CredentialValidityChecker};
use crate::utils::error::{Result, SyncError};
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: i64,
}

/// Reads the `exp` claim from the payload segment of a signed-claims token.
///
/// The signature is not verified; the remote API remains the authority on
/// whether a token is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtExpiryChecker;

impl JwtExpiryChecker {
    pub fn new() -> Self {
        Self
    }

    fn decode_segment(segment: &str) -> Option<Vec<u8>> {
        let engines = [&URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD];
        engines
            .iter()
            .find_map(|engine| engine.decode(segment).ok())
    }
}

impl CredentialValidityChecker for JwtExpiryChecker {
    fn expires_at(&self, slot: AccountSlot, token: &str) -> Result<DateTime<Utc>> {
        let invalid = || SyncError::CredentialInvalid {
            slot,
            reason: "Invalid token format".to_string(),
        };

        let payload = token.split('.').nth(1).ok_or_else(invalid)?;
        let bytes = Self::decode_segment(payload).ok_or_else(invalid)?;
        let claims: ExpiryClaims = serde_json::from_slice(&bytes).map_err(|_| invalid())?;

        DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or_else(invalid)
    }
}

//! Signed identity tokens
//!
//! A token is a JSON claims object signed with ed25519. On the wire it is
//! `<hex(claims json)>.<hex(signature)>`; the signature covers the exact
//! claim bytes that were transmitted.

use crate::error::{AuthError, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Seconds since the Unix epoch
#[must_use]
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Registered claims plus any custom ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub iss: String,
    pub aud: String,
    /// Issued at, Unix seconds
    pub iat: u64,
    /// Expiry, Unix seconds (0 = unset)
    pub exp: u64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl IdentityClaims {
    /// Create new claims issued now
    #[must_use]
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            iss: issuer.into(),
            aud: audience.into(),
            iat: now_secs(),
            exp: 0,
            extra: BTreeMap::new(),
        }
    }

    /// Expire `ttl_secs` after issue
    #[inline]
    #[must_use]
    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.exp = self.iat.saturating_add(ttl_secs);
        self
    }

    /// Add a custom claim
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// String value of a custom claim
    #[must_use]
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(Value::as_str)
    }

    /// Check if the claims are expired at `now`
    #[inline]
    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.exp != 0 && now > self.exp
    }
}

/// Claims together with their signature
#[derive(Debug, Clone)]
pub struct IdentityToken {
    claims: IdentityClaims,
    payload: Vec<u8>,
    signature: Signature,
}

impl IdentityToken {
    /// Sign claims with the issuer key
    pub fn sign(claims: IdentityClaims, signing_key: &SigningKey) -> Result<Self> {
        let payload =
            serde_json::to_vec(&claims).map_err(|e| AuthError::Malformed(e.to_string()))?;
        let signature = signing_key.sign(&payload);
        Ok(Self {
            claims,
            payload,
            signature,
        })
    }

    /// Parse the compact wire form without checking the signature
    pub fn decode(compact: &str) -> Result<Self> {
        let (payload_hex, signature_hex) = compact
            .split_once('.')
            .ok_or_else(|| AuthError::Malformed("expected '<claims>.<signature>'".to_string()))?;

        let payload =
            hex::decode(payload_hex).map_err(|e| AuthError::Malformed(format!("claims: {e}")))?;
        let signature_bytes: [u8; Signature::BYTE_SIZE] = hex::decode(signature_hex)
            .map_err(|e| AuthError::Malformed(format!("signature: {e}")))?
            .try_into()
            .map_err(|_| AuthError::Malformed("signature has wrong length".to_string()))?;
        let claims: IdentityClaims = serde_json::from_slice(&payload)
            .map_err(|e| AuthError::Malformed(format!("claims: {e}")))?;

        Ok(Self {
            claims,
            payload,
            signature: Signature::from_bytes(&signature_bytes),
        })
    }

    /// Compact wire form
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}.{}",
            hex::encode(&self.payload),
            hex::encode(self.signature.to_bytes())
        )
    }

    /// Check the signature against the issuer's public key
    #[must_use]
    pub fn verify(&self, verifying_key: &VerifyingKey) -> bool {
        verifying_key.verify(&self.payload, &self.signature).is_ok()
    }

    #[inline]
    #[must_use]
    pub fn claims(&self) -> &IdentityClaims {
        &self.claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn claims() -> IdentityClaims {
        IdentityClaims::new("https://auth.example/", "identifire-api")
            .with_claim("https://identifire/email", "a@x.com")
    }

    #[test]
    fn test_sign_and_verify() {
        let key = SigningKey::generate(&mut OsRng);
        let token = IdentityToken::sign(claims(), &key).unwrap();
        assert!(token.verify(&key.verifying_key()));

        let other = SigningKey::generate(&mut OsRng);
        assert!(!token.verify(&other.verifying_key()));
    }

    #[test]
    fn test_compact_form_survives_transport() {
        let key = SigningKey::generate(&mut OsRng);
        let token = IdentityToken::sign(claims(), &key).unwrap();

        let decoded = IdentityToken::decode(&token.encode()).unwrap();
        assert!(decoded.verify(&key.verifying_key()));
        assert_eq!(decoded.claims(), token.claims());
        assert_eq!(
            decoded.claims().claim_str("https://identifire/email"),
            Some("a@x.com")
        );
    }

    #[test]
    fn test_tampered_claims_fail_verification() {
        let key = SigningKey::generate(&mut OsRng);
        let token = IdentityToken::sign(claims(), &key).unwrap();
        let compact = token.encode();
        let (_, signature) = compact.split_once('.').unwrap();

        let forged_claims = claims().with_claim("https://identifire/email", "b@x.com");
        let forged = format!(
            "{}.{signature}",
            hex::encode(serde_json::to_vec(&forged_claims).unwrap())
        );
        let decoded = IdentityToken::decode(&forged).unwrap();
        assert!(!decoded.verify(&key.verifying_key()));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            IdentityToken::decode("no-dot"),
            Err(AuthError::Malformed(_))
        ));
        assert!(IdentityToken::decode("zz.zz").is_err());
        assert!(IdentityToken::decode(&format!("{}.00", hex::encode(b"{}"))).is_err());
    }

    #[test]
    fn test_expiry() {
        let mut c = claims();
        assert!(!c.is_expired_at(u64::MAX));

        c.exp = 100;
        assert!(!c.is_expired_at(100));
        assert!(c.is_expired_at(101));
    }
}

//! Token issuing and key material
//!
//! Production tokens come from the identity provider; this issuer exists for
//! local development and tests, and signs exactly what the verifier accepts.

use crate::error::{AuthError, Result};
use crate::token::{IdentityClaims, IdentityToken};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;

/// Generate a fresh signing key
#[must_use]
pub fn generate_signing_key() -> SigningKey {
    SigningKey::generate(&mut OsRng)
}

/// Read a signing key from 64 hex characters
pub fn signing_key_from_hex(input: &str) -> Result<SigningKey> {
    let bytes: [u8; 32] = decode_key(input)?;
    Ok(SigningKey::from_bytes(&bytes))
}

/// Read a verifying key from 64 hex characters
pub fn verifying_key_from_hex(input: &str) -> Result<VerifyingKey> {
    let bytes: [u8; 32] = decode_key(input)?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| AuthError::InvalidKey(e.to_string()))
}

fn decode_key(input: &str) -> Result<[u8; 32]> {
    hex::decode(input.trim())
        .map_err(|e| AuthError::InvalidKey(e.to_string()))?
        .try_into()
        .map_err(|_| AuthError::InvalidKey("expected 32 bytes".to_string()))
}

/// Issues identity tokens for a fixed issuer and audience
pub struct TokenIssuer {
    signing_key: SigningKey,
    issuer: String,
    audience: String,
    email_claim: String,
    default_expiry_secs: u64,
}

impl TokenIssuer {
    /// Create new issuer; tokens expire after one hour
    #[must_use]
    pub fn new(
        signing_key: SigningKey,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            signing_key,
            issuer: issuer.into(),
            audience: audience.into(),
            email_claim: String::from("email"),
            default_expiry_secs: 3600,
        }
    }

    /// Put the email under `<namespace>/email`
    #[must_use]
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.email_claim = crate::verifier::email_claim_name(Some(namespace));
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry_secs: u64) -> Self {
        self.default_expiry_secs = expiry_secs;
        self
    }

    /// Public half of the signing key
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Issue a token naming `email`
    pub fn issue(&self, email: &str) -> Result<IdentityToken> {
        let claims = IdentityClaims::new(&self.issuer, &self.audience)
            .with_ttl(self.default_expiry_secs)
            .with_claim(self.email_claim.clone(), email);
        IdentityToken::sign(claims, &self.signing_key)
    }

    /// Issue a token with caller-supplied claims
    pub fn issue_claims(&self, claims: IdentityClaims) -> Result<IdentityToken> {
        IdentityToken::sign(claims, &self.signing_key)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("email_claim", &self.email_claim)
            .field("default_expiry_secs", &self.default_expiry_secs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_hex_round_trip() {
        let key = generate_signing_key();
        let restored = signing_key_from_hex(&hex::encode(key.to_bytes())).unwrap();
        assert_eq!(restored.to_bytes(), key.to_bytes());

        let public = verifying_key_from_hex(&hex::encode(key.verifying_key().as_bytes())).unwrap();
        assert_eq!(public, key.verifying_key());
    }

    #[test]
    fn test_bad_key_material() {
        assert!(matches!(
            verifying_key_from_hex("abcd"),
            Err(AuthError::InvalidKey(_))
        ));
        assert!(signing_key_from_hex("not hex").is_err());
    }

    #[test]
    fn test_issued_tokens_carry_email_and_expiry() {
        let issuer = TokenIssuer::new(generate_signing_key(), "iss", "aud")
            .with_namespace("https://identifire")
            .with_expiry(60);
        let token = issuer.issue("a@x.com").unwrap();

        let claims = token.claims();
        assert_eq!(claims.claim_str("https://identifire/email"), Some("a@x.com"));
        assert_eq!(claims.exp, claims.iat + 60);
        assert!(token.verify(&issuer.verifying_key()));
    }

    #[test]
    fn test_debug_hides_key() {
        let issuer = TokenIssuer::new(generate_signing_key(), "iss", "aud");
        let debug = format!("{issuer:?}");
        assert!(!debug.contains("signing_key"));
    }
}

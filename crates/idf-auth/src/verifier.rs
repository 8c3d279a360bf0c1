//! Turning an `Authorization` header into a [`Principal`]

use crate::error::{AuthError, Result};
use crate::token::{now_secs, IdentityToken};
use ed25519_dalek::VerifyingKey;
use idf_model::Principal;
use tracing::debug;

/// Name of the claim carrying the email address
///
/// Providers that reserve unqualified claim names expect custom claims under
/// a namespace, so the email lives at `<namespace>/email`.
#[must_use]
pub fn email_claim_name(namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}/email", ns.trim_end_matches('/')),
        _ => String::from("email"),
    }
}

/// Extract the token from `Bearer <token>`
pub fn bearer_token(header: Option<&str>) -> Result<&str> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| AuthError::Malformed("expected 'Bearer <token>'".to_string()))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Malformed(format!("unsupported scheme '{scheme}'")));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Malformed("empty bearer token".to_string()));
    }
    Ok(token)
}

/// Resolves the caller from a compact token
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Principal>;
}

/// Verifies ed25519 identity tokens against one issuer key
#[derive(Debug, Clone)]
pub struct SignedTokenVerifier {
    verifying_key: VerifyingKey,
    issuer: String,
    audience: String,
    email_claim: String,
    leeway_secs: u64,
}

impl SignedTokenVerifier {
    /// Create new verifier for tokens from `issuer` meant for `audience`
    #[must_use]
    pub fn new(
        verifying_key: VerifyingKey,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            verifying_key,
            issuer: issuer.into(),
            audience: audience.into(),
            email_claim: email_claim_name(None),
            leeway_secs: 0,
        }
    }

    /// Read the email from `<namespace>/email`
    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<&str>) -> Self {
        self.email_claim = email_claim_name(namespace);
        self
    }

    /// Accept tokens up to `secs` past their expiry
    #[must_use]
    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.leeway_secs = secs;
        self
    }

    fn check(&self, token: &IdentityToken, now: u64) -> Result<Principal> {
        if !token.verify(&self.verifying_key) {
            return Err(AuthError::BadSignature);
        }
        let claims = token.claims();
        if claims.exp == 0 {
            return Err(AuthError::MissingExpiry);
        }
        if claims.is_expired_at(now.saturating_sub(self.leeway_secs)) {
            return Err(AuthError::Expired {
                expired_at: claims.exp,
            });
        }
        if claims.iss != self.issuer {
            return Err(AuthError::WrongIssuer(claims.iss.clone()));
        }
        if claims.aud != self.audience {
            return Err(AuthError::WrongAudience(claims.aud.clone()));
        }
        let email = claims
            .claim_str(&self.email_claim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AuthError::MissingEmail(self.email_claim.clone()))?;

        Ok(Principal::new(email))
    }
}

impl IdentityVerifier for SignedTokenVerifier {
    fn verify(&self, token: &str) -> Result<Principal> {
        let token = IdentityToken::decode(token)?;
        let principal = self.check(&token, now_secs())?;
        debug!(principal = %principal, "identity verified");
        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::{generate_signing_key, TokenIssuer};
    use crate::token::IdentityClaims;
    use pretty_assertions::assert_eq;

    const NS: &str = "https://identifire";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(generate_signing_key(), "https://auth.example/", "identifire-api")
            .with_namespace(NS)
    }

    fn verifier_for(issuer: &TokenIssuer) -> SignedTokenVerifier {
        SignedTokenVerifier::new(issuer.verifying_key(), "https://auth.example/", "identifire-api")
            .with_namespace(Some(NS))
    }

    #[test]
    fn test_claim_names() {
        assert_eq!(email_claim_name(None), "email");
        assert_eq!(email_claim_name(Some("")), "email");
        assert_eq!(email_claim_name(Some("https://ns/")), "https://ns/email");
    }

    #[test]
    fn test_bearer_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def")), Ok("abc.def"));
        assert_eq!(bearer_token(Some("bearer  abc")), Ok("abc"));
        assert_eq!(bearer_token(None), Err(AuthError::MissingToken));
        assert!(matches!(
            bearer_token(Some("Basic dXNlcg==")),
            Err(AuthError::Malformed(_))
        ));
        assert!(bearer_token(Some("Bearer")).is_err());
    }

    #[test]
    fn test_valid_token_yields_principal() {
        let issuer = issuer();
        let token = issuer.issue("a@x.com").unwrap().encode();

        let principal = verifier_for(&issuer).verify(&token).unwrap();
        assert_eq!(principal.email(), "a@x.com");
    }

    #[test]
    fn test_foreign_key_rejected() {
        let token = issuer().issue("a@x.com").unwrap().encode();
        let result = verifier_for(&issuer()).verify(&token);
        assert_eq!(result, Err(AuthError::BadSignature));
    }

    #[test]
    fn test_issuer_and_audience_checked() {
        let issuer = issuer();
        let verifier = verifier_for(&issuer);

        let claims = IdentityClaims::new("https://evil.example/", "identifire-api")
            .with_ttl(60)
            .with_claim(email_claim_name(Some(NS)), "a@x.com");
        let token = issuer.issue_claims(claims).unwrap().encode();
        assert_eq!(
            verifier.verify(&token),
            Err(AuthError::WrongIssuer("https://evil.example/".to_string()))
        );

        let claims = IdentityClaims::new("https://auth.example/", "some-other-api")
            .with_ttl(60)
            .with_claim(email_claim_name(Some(NS)), "a@x.com");
        let token = issuer.issue_claims(claims).unwrap().encode();
        assert_eq!(
            verifier.verify(&token),
            Err(AuthError::WrongAudience("some-other-api".to_string()))
        );
    }

    #[test]
    fn test_token_without_expiry_rejected() {
        let issuer = issuer();
        let claims = IdentityClaims::new("https://auth.example/", "identifire-api")
            .with_claim(email_claim_name(Some(NS)), "a@x.com");
        assert_eq!(claims.exp, 0);
        let token = issuer.issue_claims(claims).unwrap().encode();

        assert_eq!(
            verifier_for(&issuer).verify(&token),
            Err(AuthError::MissingExpiry)
        );
    }

    #[test]
    fn test_foreign_issuer_without_expiry_rejected() {
        let issuer = issuer();
        let claims = IdentityClaims::new("https://evil.example/", "some-other-api")
            .with_claim(email_claim_name(Some(NS)), "a@x.com");
        let token = issuer.issue_claims(claims).unwrap().encode();

        assert!(verifier_for(&issuer).verify(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let issuer = issuer();
        let mut claims = IdentityClaims::new("https://auth.example/", "identifire-api")
            .with_claim(email_claim_name(Some(NS)), "a@x.com");
        claims.exp = 10;
        let token = issuer.issue_claims(claims).unwrap();

        let verifier = verifier_for(&issuer);
        assert_eq!(
            verifier.check(&token, 11),
            Err(AuthError::Expired { expired_at: 10 })
        );
        assert!(verifier.clone().with_leeway(5).check(&token, 11).is_ok());
    }

    #[test]
    fn test_email_claim_required() {
        let issuer = issuer();
        let claims = IdentityClaims::new("https://auth.example/", "identifire-api")
            .with_ttl(60)
            .with_claim("email", "a@x.com");
        let token = issuer.issue_claims(claims).unwrap().encode();

        // un-namespaced email does not count when a namespace is configured
        assert_eq!(
            verifier_for(&issuer).verify(&token),
            Err(AuthError::MissingEmail("https://identifire/email".to_string()))
        );
    }
}

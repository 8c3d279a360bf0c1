//! Identifire identity verification
//!
//! Every API request carries `Authorization: Bearer <token>`. The token is a
//! set of claims signed with ed25519; verifying it yields the [`Principal`]
//! the ownership checks compare against.
//!
//! # Flow
//!
//! 1. [`bearer_token`] pulls the compact token out of the header
//! 2. [`IdentityVerifier::verify`] checks signature, expiry, issuer and
//!    audience
//! 3. the email claim (`<namespace>/email`) becomes the principal
//!
//! [`TokenIssuer`] produces tokens the verifier accepts, for development and
//! tests.
//!
//! [`Principal`]: idf_model::Principal

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod issuer;
pub mod token;
pub mod verifier;

pub use error::{AuthError, Result};
pub use issuer::{generate_signing_key, signing_key_from_hex, verifying_key_from_hex, TokenIssuer};
pub use token::{IdentityClaims, IdentityToken};
pub use verifier::{bearer_token, email_claim_name, IdentityVerifier, SignedTokenVerifier};

pub use ed25519_dalek::{SigningKey, VerifyingKey};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_header_to_principal() {
        let issuer = TokenIssuer::new(generate_signing_key(), "iss", "aud");
        let verifier = SignedTokenVerifier::new(issuer.verifying_key(), "iss", "aud");

        let header = format!("Bearer {}", issuer.issue("a@x.com").unwrap().encode());
        let token = bearer_token(Some(&header)).unwrap();
        let principal = verifier.verify(token).unwrap();

        assert!(principal.owns("a@x.com"));
        assert!(!principal.owns("b@x.com"));
    }
}

use idf_auth::{
    generate_signing_key, AuthError, IdentityClaims, IdentityToken, IdentityVerifier,
    SignedTokenVerifier, TokenIssuer,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn test_verifier_without_namespace_reads_plain_email() {
    let issuer = TokenIssuer::new(generate_signing_key(), "iss", "aud");
    let verifier = SignedTokenVerifier::new(issuer.verifying_key(), "iss", "aud")
        .with_namespace(None);

    let token = issuer.issue("plain@x.com").unwrap().encode();
    assert_eq!(verifier.verify(&token).unwrap().email(), "plain@x.com");
}

#[test]
fn test_verifier_rejects_tokens_without_expiry() {
    let key = generate_signing_key();
    let claims = IdentityClaims::new("iss", "aud").with_claim("email", "a@x.com");
    let token = IdentityToken::sign(claims, &key).unwrap().encode();

    let verifier = SignedTokenVerifier::new(key.verifying_key(), "iss", "aud");
    assert_eq!(verifier.verify(&token), Err(AuthError::MissingExpiry));
}

proptest! {
    #[test]
    fn prop_decode_never_panics(input in ".{0,200}") {
        let _ = IdentityToken::decode(&input);
    }

    #[test]
    fn prop_any_email_survives_signing(local in "[a-z0-9.]{1,20}", domain in "[a-z]{1,10}\\.[a-z]{2,3}") {
        let email = format!("{local}@{domain}");
        let issuer = TokenIssuer::new(generate_signing_key(), "iss", "aud");
        let verifier = SignedTokenVerifier::new(issuer.verifying_key(), "iss", "aud");

        let token = issuer.issue(&email).unwrap().encode();
        let verified = verifier.verify(&token).unwrap();
        prop_assert_eq!(verified.email(), email.as_str());
    }

    #[test]
    fn prop_flipping_a_signature_byte_fails(index in 0usize..64) {
        let key = generate_signing_key();
        let claims = IdentityClaims::new("iss", "aud").with_claim("email", "a@x.com");
        let token = IdentityToken::sign(claims, &key).unwrap().encode();

        let (payload, signature) = token.split_once('.').unwrap();
        let mut sig = hex::decode(signature).unwrap();
        sig[index] ^= 0x01;
        let forged = format!("{payload}.{}", hex::encode(sig));

        let verifier = SignedTokenVerifier::new(key.verifying_key(), "iss", "aud");
        prop_assert!(verifier.verify(&forged).is_err());
    }
}

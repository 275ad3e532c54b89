// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password key-derivation engine.
//!
//! Maps input keying material plus an email address to a [`DerivedKeys`]
//! bundle. The ikm is the password bytes, or the OPRF output standing in
//! for them when the flow ran the blinded exchange; the email contributes
//! no entropy and acts purely as a domain-separation salt, normalized so
//! case and whitespace variants reach the same account.

use hkdf::Hkdf;
use sha2::Sha256;

use super::{labels, normalize_email, DerivationError, DerivedKeys, KEY_LEN};

/// Versioned domain string mixed into the HKDF salt.
const DOMAIN: &str = "cloakboard-password-v1";

/// Derive an account key bundle from input keying material and an email.
///
/// Deterministic: identical `(ikm, email)` pairs always produce identical
/// bundles, including across email case/whitespace variants.
///
/// # Errors
///
/// Returns [`DerivationError::Expand`] if HKDF expansion fails.
pub fn derive(ikm: &[u8], email: &str) -> Result<DerivedKeys, DerivationError> {
    let salt = format!("{DOMAIN}:{}", normalize_email(email));
    let hk = Hkdf::<Sha256>::new(Some(salt.as_bytes()), ikm);

    let mut secret_key = [0u8; KEY_LEN];
    let mut signing_key = [0u8; KEY_LEN];
    let mut key_salt = [0u8; KEY_LEN];

    hk.expand(labels::SECRET_KEY, &mut secret_key)
        .map_err(|e| DerivationError::Expand(e.to_string()))?;
    hk.expand(labels::SIGNING_KEY, &mut signing_key)
        .map_err(|e| DerivationError::Expand(e.to_string()))?;
    hk.expand(labels::SALT, &mut key_salt)
        .map_err(|e| DerivationError::Expand(e.to_string()))?;

    Ok(DerivedKeys {
        secret_key,
        signing_key,
        salt: key_salt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &[u8] = b"correct horse battery staple";

    #[test]
    fn derivation_is_deterministic() {
        let a = derive(PASSWORD, "user@example.com").unwrap();
        let b = derive(PASSWORD, "user@example.com").unwrap();
        assert_eq!(a.secret_key, b.secret_key);
        assert_eq!(a.signing_key, b.signing_key);
        assert_eq!(a.salt, b.salt);
    }

    #[test]
    fn email_variants_reach_the_same_account() {
        let a = derive(PASSWORD, "A@x.com").unwrap();
        let b = derive(PASSWORD, "a@x.com ").unwrap();
        assert_eq!(a.secret_key, b.secret_key);
        assert_eq!(a.signing_key, b.signing_key);
        assert_eq!(a.salt, b.salt);
    }

    #[test]
    fn different_passwords_yield_different_keys() {
        let a = derive(PASSWORD, "user@example.com").unwrap();
        let b = derive(b"tr0ub4dor&3", "user@example.com").unwrap();
        assert_ne!(a.secret_key, b.secret_key);
    }

    #[test]
    fn different_emails_yield_different_keys() {
        let a = derive(PASSWORD, "a@x.com").unwrap();
        let b = derive(PASSWORD, "b@x.com").unwrap();
        assert_ne!(a.secret_key, b.secret_key);
    }

    #[test]
    fn outputs_are_pairwise_distinct() {
        let keys = derive(PASSWORD, "user@example.com").unwrap();
        assert_ne!(keys.secret_key, keys.signing_key);
        assert_ne!(keys.secret_key, keys.salt);
        assert_ne!(keys.signing_key, keys.salt);
    }
}

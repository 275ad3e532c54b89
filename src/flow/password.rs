// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password authentication flow.
//!
//! ## States
//!
//! ```text
//! Idle --begin--> CollectingCredentials --derive--> DerivingKeys --> Complete
//! ```
//!
//! The password never leaves the flow: it is blinded before the OPRF
//! exchange, the server evaluates without learning it, and the unblinded
//! output replaces the raw password as key-derivation input. An observer
//! of the exchange cannot mount an offline dictionary attack, and the
//! server cannot recompute the derived keys.
//!
//! The exchange is gated by a session token from a completed
//! email-ownership step; the session claim must match the email the
//! credentials are for.

use zeroize::Zeroize;

use crate::keys::{email_hash, normalize_email, password, DerivedKeys};
use crate::oprf::{client, server::OprfServer};
use crate::session::SessionCodec;

use super::FlowError;

/// Observable state of a password flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordState {
    Idle,
    CollectingCredentials,
    DerivingKeys,
    Complete,
}

/// Client-side password flow state machine.
pub struct PasswordFlow {
    state: PasswordState,
    email: Option<String>,
    password: Option<String>,
}

impl PasswordFlow {
    pub fn new() -> Self {
        Self {
            state: PasswordState::Idle,
            email: None,
            password: None,
        }
    }

    pub fn state(&self) -> PasswordState {
        self.state
    }

    /// Start collecting credentials.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidState`] unless the flow is `Idle`.
    pub fn begin(&mut self) -> Result<(), FlowError> {
        if self.state != PasswordState::Idle {
            return Err(FlowError::InvalidState("begin requires Idle"));
        }
        self.state = PasswordState::CollectingCredentials;
        Ok(())
    }

    /// Record the credentials entered by the user.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidState`] outside `CollectingCredentials`.
    pub fn set_credentials(&mut self, email: &str, password: &str) -> Result<(), FlowError> {
        if self.state != PasswordState::CollectingCredentials {
            return Err(FlowError::InvalidState(
                "set_credentials requires CollectingCredentials",
            ));
        }
        self.email = Some(normalize_email(email));
        self.password = Some(password.to_string());
        Ok(())
    }

    /// Run the OPRF exchange and derive the account key bundle.
    ///
    /// Retriable: a failed attempt (e.g. expired session) leaves the flow
    /// in `DerivingKeys` and a later call with a fresh session token may
    /// succeed. The password is wiped once derivation completes.
    ///
    /// # Errors
    ///
    /// [`FlowError::InvalidSession`] for a bad or expired session token,
    /// [`FlowError::EmailMismatch`] if the session was minted for a
    /// different address, OPRF/derivation errors otherwise.
    pub fn derive(
        &mut self,
        sessions: &SessionCodec,
        oprf: &OprfServer,
        session_token: &str,
    ) -> Result<DerivedKeys, FlowError> {
        if !matches!(
            self.state,
            PasswordState::CollectingCredentials | PasswordState::DerivingKeys
        ) {
            return Err(FlowError::InvalidState("derive requires credentials"));
        }
        let (Some(email), Some(password)) = (self.email.as_deref(), self.password.as_deref())
        else {
            return Err(FlowError::InvalidState("credentials not set"));
        };
        self.state = PasswordState::DerivingKeys;

        // The session must prove ownership of the same address the
        // credentials claim.
        let claim = sessions
            .verify(session_token)
            .map_err(|_| FlowError::InvalidSession)?;
        if claim != email_hash(email) {
            return Err(FlowError::EmailMismatch);
        }

        let input = password.as_bytes().to_vec();
        let blinding = client::blind(&input);
        let evaluated = oprf.evaluate(&blinding.blinded_point)?;
        let element = blinding.unblind(&evaluated)?;
        let output = client::finalize(&input, &element);

        let keys = password::derive(&output, email)?;

        if let Some(mut secret) = self.password.take() {
            secret.zeroize();
        }
        self.state = PasswordState::Complete;
        Ok(keys)
    }

    /// Abandon the flow, wiping the password.
    pub fn cancel(&mut self) {
        if let Some(mut secret) = self.password.take() {
            secret.zeroize();
        }
        *self = Self::new();
    }
}

impl Default for PasswordFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const EMAIL: &str = "user@example.com";
    const PASSWORD: &str = "correct horse battery staple";

    fn fixtures() -> (SessionCodec, OprfServer) {
        (
            SessionCodec::new(b"test-session-secret", Duration::from_secs(300)),
            OprfServer::from_hex("06").unwrap(),
        )
    }

    fn run_flow(sessions: &SessionCodec, oprf: &OprfServer, password: &str) -> DerivedKeys {
        let session = sessions.create(&email_hash(EMAIL));
        let mut flow = PasswordFlow::new();
        flow.begin().unwrap();
        flow.set_credentials(EMAIL, password).unwrap();
        let keys = flow.derive(sessions, oprf, &session).unwrap();
        assert_eq!(flow.state(), PasswordState::Complete);
        keys
    }

    #[test]
    fn repeated_logins_reach_the_same_account() {
        let (sessions, oprf) = fixtures();
        let first = run_flow(&sessions, &oprf, PASSWORD);
        let second = run_flow(&sessions, &oprf, PASSWORD);

        assert_eq!(first.secret_key, second.secret_key);
        assert_eq!(first.signing_key, second.signing_key);
        assert_eq!(first.salt, second.salt);
    }

    #[test]
    fn different_passwords_reach_different_accounts() {
        let (sessions, oprf) = fixtures();
        let a = run_flow(&sessions, &oprf, PASSWORD);
        let b = run_flow(&sessions, &oprf, "hunter2hunter2");
        assert_ne!(a.secret_key, b.secret_key);
    }

    #[test]
    fn server_key_is_part_of_the_derivation() {
        let (sessions, oprf) = fixtures();
        let rotated = OprfServer::from_hex("0a").unwrap();
        let a = run_flow(&sessions, &oprf, PASSWORD);
        let b = run_flow(&sessions, &rotated, PASSWORD);
        // Rotating the server scalar invalidates password-derived keys.
        assert_ne!(a.secret_key, b.secret_key);
    }

    #[test]
    fn bad_session_is_rejected() {
        let (sessions, oprf) = fixtures();
        let mut flow = PasswordFlow::new();
        flow.begin().unwrap();
        flow.set_credentials(EMAIL, PASSWORD).unwrap();

        assert!(matches!(
            flow.derive(&sessions, &oprf, "garbage"),
            Err(FlowError::InvalidSession)
        ));
        assert_eq!(flow.state(), PasswordState::DerivingKeys);
    }

    #[test]
    fn session_for_another_email_is_rejected() {
        let (sessions, oprf) = fixtures();
        let session = sessions.create(&email_hash("other@example.com"));

        let mut flow = PasswordFlow::new();
        flow.begin().unwrap();
        flow.set_credentials(EMAIL, PASSWORD).unwrap();

        assert!(matches!(
            flow.derive(&sessions, &oprf, &session),
            Err(FlowError::EmailMismatch)
        ));
    }

    #[test]
    fn retry_with_fresh_session_succeeds() {
        let (sessions, oprf) = fixtures();
        let mut flow = PasswordFlow::new();
        flow.begin().unwrap();
        flow.set_credentials(EMAIL, PASSWORD).unwrap();

        assert!(flow.derive(&sessions, &oprf, "garbage").is_err());

        let session = sessions.create(&email_hash(EMAIL));
        let keys = flow.derive(&sessions, &oprf, &session).unwrap();
        assert_eq!(flow.state(), PasswordState::Complete);
        assert_ne!(keys.secret_key, [0u8; 32]);
    }

    #[test]
    fn cancel_wipes_and_resets() {
        let mut flow = PasswordFlow::new();
        flow.begin().unwrap();
        flow.set_credentials(EMAIL, PASSWORD).unwrap();
        flow.cancel();

        assert_eq!(flow.state(), PasswordState::Idle);
        assert!(flow.password.is_none());
        assert!(flow.email.is_none());
    }

    #[test]
    fn steps_out_of_order_are_rejected() {
        let (sessions, oprf) = fixtures();
        let mut flow = PasswordFlow::new();

        assert!(matches!(
            flow.set_credentials(EMAIL, PASSWORD),
            Err(FlowError::InvalidState(_))
        ));
        assert!(matches!(
            flow.derive(&sessions, &oprf, "any"),
            Err(FlowError::InvalidState(_))
        ));
    }
}

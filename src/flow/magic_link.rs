// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Magic-link authentication flow.
//!
//! ## States
//!
//! ```text
//! Idle --request_link--> LinkSent --verify--> Authenticating --authenticate--> Complete
//!                                    |                ^
//!                                    v                | supply_email
//!                                 NeedEmail ----------+
//! ```
//!
//! `NeedEmail` covers the cross-device case: the link is opened on a device
//! that never requested it, so no email is cached locally. The consumed
//! token proves *some* email was verified (the flow holds only its hash);
//! the user must type the address, which is checked against that hash
//! before any keys are derived.
//!
//! Verification is idempotent once it has succeeded: a retried `verify`
//! call reuses the locally cached claim instead of re-consuming the token,
//! which would fail because tokens are single-use.

use crate::keys::{email_hash, normalize_email, password, DerivedKeys};
use crate::mailer::LinkMailer;
use crate::oprf::{client, server::OprfServer};
use crate::session::SessionCodec;
use crate::token_store::TokenStore;

use super::FlowError;

/// Observable state of a magic-link flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicLinkState {
    Idle,
    LinkSent,
    NeedEmail,
    Authenticating,
    Complete,
}

/// Client-side magic-link flow state machine.
pub struct MagicLinkFlow {
    state: MagicLinkState,
    /// Email remembered on the device that requested the link.
    cached_email: Option<String>,
    /// Authoritative email once established (cached or user-supplied).
    email: Option<String>,
    /// Session token issued at verification time.
    session: Option<String>,
    /// Hash of the verified identity claim.
    claim_hash: Option<String>,
}

impl MagicLinkFlow {
    pub fn new() -> Self {
        Self {
            state: MagicLinkState::Idle,
            cached_email: None,
            email: None,
            session: None,
            claim_hash: None,
        }
    }

    pub fn state(&self) -> MagicLinkState {
        self.state
    }

    /// Request a magic link for the given email.
    ///
    /// Issues a single-use token and hands it to the mailer; the token
    /// never flows back through this API. With `remember_email` the address
    /// is cached locally so verification on this device can skip the
    /// `NeedEmail` step.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidState`] unless the flow is `Idle`.
    pub fn request_link(
        &mut self,
        store: &TokenStore,
        mailer: &dyn LinkMailer,
        email: &str,
        remember_email: bool,
    ) -> Result<(), FlowError> {
        if self.state != MagicLinkState::Idle {
            return Err(FlowError::InvalidState("request_link requires Idle"));
        }

        let normalized = normalize_email(email);
        let token = store.issue(&normalized);
        mailer.send(&normalized, &token);

        if remember_email {
            self.cached_email = Some(normalized);
        }
        self.state = MagicLinkState::LinkSent;
        Ok(())
    }

    /// Verify a magic-link token, consuming it.
    ///
    /// Legal from `Idle` (cross-device: this flow never requested the link)
    /// and `LinkSent`. On success a short-lived session token is minted
    /// whose claim is the email hash, and the flow moves to
    /// `Authenticating` (email cached locally) or `NeedEmail`.
    ///
    /// Calling `verify` again after it has succeeded is a no-op: the claim
    /// is already cached and the token is already consumed.
    ///
    /// # Errors
    ///
    /// [`FlowError::InvalidToken`] for unknown/expired/consumed tokens;
    /// [`FlowError::InvalidState`] from `Complete`.
    pub fn verify(
        &mut self,
        store: &TokenStore,
        sessions: &SessionCodec,
        token: &str,
    ) -> Result<(), FlowError> {
        match self.state {
            // Retried verification: the token was already consumed, the
            // claim is known locally.
            MagicLinkState::NeedEmail | MagicLinkState::Authenticating => return Ok(()),
            MagicLinkState::Idle | MagicLinkState::LinkSent => {}
            MagicLinkState::Complete => {
                return Err(FlowError::InvalidState("verify after Complete"));
            }
        }

        let claim = store.consume(token).ok_or(FlowError::InvalidToken)?;
        let claim_hash = email_hash(&claim);
        self.session = Some(sessions.create(&claim_hash));
        self.claim_hash = Some(claim_hash);

        // Only the verified *status* carries over to the resumed context;
        // the address itself must come from the local cache or the user.
        match self.cached_email.take() {
            Some(cached) => {
                self.email = Some(cached);
                self.state = MagicLinkState::Authenticating;
            }
            None => self.state = MagicLinkState::NeedEmail,
        }
        Ok(())
    }

    /// Supply the email on a device that has none cached.
    ///
    /// # Errors
    ///
    /// [`FlowError::EmailMismatch`] if the address does not hash to the
    /// verified claim; [`FlowError::InvalidState`] outside `NeedEmail`.
    pub fn supply_email(&mut self, email: &str) -> Result<(), FlowError> {
        if self.state != MagicLinkState::NeedEmail {
            return Err(FlowError::InvalidState("supply_email requires NeedEmail"));
        }

        let supplied_hash = email_hash(email);
        if Some(supplied_hash.as_str()) != self.claim_hash.as_deref() {
            return Err(FlowError::EmailMismatch);
        }

        self.email = Some(normalize_email(email));
        self.state = MagicLinkState::Authenticating;
        Ok(())
    }

    /// Derive the account key bundle via the session-gated OPRF exchange.
    ///
    /// # Errors
    ///
    /// [`FlowError::InvalidSession`] if the session expired since
    /// verification; OPRF/derivation errors otherwise.
    pub fn authenticate(
        &mut self,
        sessions: &SessionCodec,
        oprf: &OprfServer,
    ) -> Result<DerivedKeys, FlowError> {
        if self.state != MagicLinkState::Authenticating {
            return Err(FlowError::InvalidState("authenticate requires Authenticating"));
        }
        let email = self
            .email
            .as_deref()
            .ok_or(FlowError::InvalidState("Authenticating without an email"))?;
        let session = self.session.as_deref().ok_or(FlowError::InvalidSession)?;

        // The evaluator acts only for holders of a live session.
        sessions.verify(session).map_err(|_| FlowError::InvalidSession)?;

        let input = normalize_email(email).into_bytes();
        let blinding = client::blind(&input);
        let evaluated = oprf.evaluate(&blinding.blinded_point)?;
        let element = blinding.unblind(&evaluated)?;
        let output = client::finalize(&input, &element);

        let keys = password::derive(&output, email)?;
        self.state = MagicLinkState::Complete;
        Ok(keys)
    }

    /// Abandon the flow, discarding all local state.
    pub fn cancel(&mut self) {
        *self = Self::new();
    }
}

impl Default for MagicLinkFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mailer::testing::CapturingMailer;

    const EMAIL: &str = "user@example.com";

    fn fixtures() -> (TokenStore, SessionCodec, OprfServer) {
        (
            TokenStore::new(Duration::from_secs(60)),
            SessionCodec::new(b"test-session-secret", Duration::from_secs(300)),
            OprfServer::from_hex("06").unwrap(),
        )
    }

    fn sent_token(mailer: &CapturingMailer) -> String {
        mailer.sent.lock().unwrap().last().unwrap().1.clone()
    }

    #[test]
    fn same_device_flow_completes() {
        let (store, sessions, oprf) = fixtures();
        let mailer = CapturingMailer::default();

        let mut flow = MagicLinkFlow::new();
        flow.request_link(&store, &mailer, EMAIL, true).unwrap();
        assert_eq!(flow.state(), MagicLinkState::LinkSent);

        let token = sent_token(&mailer);
        flow.verify(&store, &sessions, &token).unwrap();
        assert_eq!(flow.state(), MagicLinkState::Authenticating);

        let keys = flow.authenticate(&sessions, &oprf).unwrap();
        assert_eq!(flow.state(), MagicLinkState::Complete);
        assert_ne!(keys.secret_key, [0u8; 32]);

        // The link is spent.
        assert_eq!(store.consume(&token), None);
    }

    #[test]
    fn cross_device_flow_requires_the_email() {
        let (store, sessions, oprf) = fixtures();
        let mailer = CapturingMailer::default();

        // Device 1 requests the link.
        let mut requester = MagicLinkFlow::new();
        requester.request_link(&store, &mailer, EMAIL, true).unwrap();
        let token = sent_token(&mailer);

        // Device 2 opens it with no cached email.
        let mut verifier = MagicLinkFlow::new();
        verifier.verify(&store, &sessions, &token).unwrap();
        assert_eq!(verifier.state(), MagicLinkState::NeedEmail);

        // A wrong address fails closed.
        assert!(matches!(
            verifier.supply_email("mallory@example.com"),
            Err(FlowError::EmailMismatch)
        ));
        assert_eq!(verifier.state(), MagicLinkState::NeedEmail);

        verifier.supply_email(EMAIL).unwrap();
        assert_eq!(verifier.state(), MagicLinkState::Authenticating);

        let keys = verifier.authenticate(&sessions, &oprf).unwrap();
        assert_eq!(verifier.state(), MagicLinkState::Complete);
        assert_ne!(keys.secret_key, [0u8; 32]);
    }

    #[test]
    fn both_devices_derive_the_same_account() {
        let (store, sessions, oprf) = fixtures();
        let mailer = CapturingMailer::default();

        let mut same_device = MagicLinkFlow::new();
        same_device.request_link(&store, &mailer, EMAIL, true).unwrap();
        same_device
            .verify(&store, &sessions, &sent_token(&mailer))
            .unwrap();
        let keys_a = same_device.authenticate(&sessions, &oprf).unwrap();

        let mut requester = MagicLinkFlow::new();
        requester.request_link(&store, &mailer, EMAIL, false).unwrap();
        let mut other_device = MagicLinkFlow::new();
        other_device
            .verify(&store, &sessions, &sent_token(&mailer))
            .unwrap();
        other_device.supply_email(EMAIL).unwrap();
        let keys_b = other_device.authenticate(&sessions, &oprf).unwrap();

        assert_eq!(keys_a.secret_key, keys_b.secret_key);
        assert_eq!(keys_a.signing_key, keys_b.signing_key);
        assert_eq!(keys_a.salt, keys_b.salt);
    }

    #[test]
    fn verify_is_idempotent_after_success() {
        let (store, sessions, _oprf) = fixtures();
        let mailer = CapturingMailer::default();

        let mut flow = MagicLinkFlow::new();
        flow.request_link(&store, &mailer, EMAIL, true).unwrap();
        let token = sent_token(&mailer);

        flow.verify(&store, &sessions, &token).unwrap();
        // The token is consumed, but the retry succeeds from local state.
        flow.verify(&store, &sessions, &token).unwrap();
        assert_eq!(flow.state(), MagicLinkState::Authenticating);
    }

    #[test]
    fn bad_token_fails_verification() {
        let (store, sessions, _oprf) = fixtures();
        let mut flow = MagicLinkFlow::new();
        assert!(matches!(
            flow.verify(&store, &sessions, "no-such-token"),
            Err(FlowError::InvalidToken)
        ));
        assert_eq!(flow.state(), MagicLinkState::Idle);
    }

    #[test]
    fn expired_session_blocks_authentication() {
        let (store, _, oprf) = fixtures();
        // Sessions that are already expired at creation time.
        let sessions = SessionCodec::new(b"test-session-secret", Duration::ZERO);
        let mailer = CapturingMailer::default();

        let mut flow = MagicLinkFlow::new();
        flow.request_link(&store, &mailer, EMAIL, true).unwrap();
        flow.verify(&store, &sessions, &sent_token(&mailer)).unwrap();

        assert!(matches!(
            flow.authenticate(&sessions, &oprf),
            Err(FlowError::InvalidSession)
        ));
    }

    #[test]
    fn cancel_resets_to_idle() {
        let (store, sessions, _oprf) = fixtures();
        let mailer = CapturingMailer::default();

        let mut flow = MagicLinkFlow::new();
        flow.request_link(&store, &mailer, EMAIL, true).unwrap();
        flow.verify(&store, &sessions, &sent_token(&mailer)).unwrap();

        flow.cancel();
        assert_eq!(flow.state(), MagicLinkState::Idle);

        // A cancelled flow can start over.
        flow.request_link(&store, &mailer, EMAIL, false).unwrap();
        assert_eq!(flow.state(), MagicLinkState::LinkSent);
    }

    #[test]
    fn steps_out_of_order_are_rejected() {
        let (store, sessions, oprf) = fixtures();
        let mailer = CapturingMailer::default();
        let mut flow = MagicLinkFlow::new();

        assert!(matches!(
            flow.supply_email(EMAIL),
            Err(FlowError::InvalidState(_))
        ));
        assert!(matches!(
            flow.authenticate(&sessions, &oprf),
            Err(FlowError::InvalidState(_))
        ));

        flow.request_link(&store, &mailer, EMAIL, true).unwrap();
        assert!(matches!(
            flow.request_link(&store, &mailer, EMAIL, true),
            Err(FlowError::InvalidState(_))
        ));
    }
}

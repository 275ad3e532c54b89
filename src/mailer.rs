// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Magic-link delivery seam.
//!
//! Actual email transport is an external collaborator; this module only
//! defines the boundary the request handler hands tokens to. Deployments
//! plug in a real sender; the default [`LogMailer`] records issuance in the
//! logs (email hash only, never the address or the token).

use tracing::info;

use crate::keys::email_hash;

/// Outbound delivery boundary for magic-link tokens.
pub trait LinkMailer: Send + Sync {
    /// Deliver the token to the address that requested it.
    fn send(&self, email: &str, token: &str);
}

/// Default mailer: logs that a link was issued without any transport.
///
/// The token itself is intentionally not logged; in a deployment without a
/// real mailer the token is unreachable, which fails closed.
pub struct LogMailer;

impl LinkMailer for LogMailer {
    fn send(&self, email: &str, _token: &str) {
        info!(email_hash = %email_hash(email), "Magic link issued");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::LinkMailer;

    /// Test mailer capturing every (email, token) pair handed to it.
    #[derive(Default)]
    pub struct CapturingMailer {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    impl LinkMailer for CapturingMailer {
        fn send(&self, email: &str, token: &str) {
            self.sent
                .lock()
                .expect("mailer lock")
                .push((email.to_string(), token.to_string()));
        }
    }
}

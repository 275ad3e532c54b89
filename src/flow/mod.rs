// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Flows
//!
//! Per-flow state machines coordinating the token store, session codec,
//! OPRF exchange, and key-derivation engines into complete authentication
//! flows. Each flow owns its local state; there is no shared global state,
//! and abandoning a flow at any non-terminal point needs no server-side
//! cleanup because tokens are single-use and self-expire.
//!
//! ## Flows
//!
//! - [`magic_link`] - email link signup/login, including cross-device
//!   verification
//! - [`password`] - password login hardened by the blinded OPRF exchange
//! - [`signature`] - wallet-signature login, fully local derivation
//!
//! Every flow terminates by yielding a [`crate::keys::DerivedKeys`] bundle,
//! handed to account construction (external collaborator).

use thiserror::Error;

use crate::keys::DerivationError;
use crate::oprf::OprfError;

pub mod magic_link;
pub mod password;
pub mod signature;

/// Orchestrator-level failures.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The magic-link token is unknown, expired, or already consumed.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The session token failed verification or expired.
    #[error("invalid or expired session")]
    InvalidSession,

    /// The supplied email does not match the verified identity claim.
    #[error("email does not match the verified identity")]
    EmailMismatch,

    /// The requested step is not legal in the flow's current state.
    #[error("operation not valid in the current flow state: {0}")]
    InvalidState(&'static str),

    /// OPRF exchange failure.
    #[error(transparent)]
    Oprf(#[from] OprfError),

    /// Key-derivation failure.
    #[error(transparent)]
    Derivation(#[from] DerivationError),
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures for the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation.
//!
//! Wire field names are camelCase, matching the clients that consume this
//! API (`sessionToken`, `blindedPoint`, `evaluatedPoint`).

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// =============================================================================
// Magic-Link Models
// =============================================================================

/// Request a magic link for an email address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MagicLinkRequest {
    /// Address to send the link to.
    pub email: String,
}

/// Acknowledgement that a link was issued.
///
/// Deliberately carries no token: the only road to the token is the email
/// inbox it was sent to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MagicLinkSent {
    /// Always `"sent"`.
    pub status: String,
}

/// Non-consuming token check, e.g. from a verify page confirming a link
/// before the user commits.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PeekTokenQuery {
    /// The token from the magic link.
    pub token: Option<String>,
}

/// Result of a non-consuming token check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeekTokenResponse {
    /// Whether the token is currently valid.
    pub valid: bool,
    /// The verified email claim.
    pub email: String,
}

/// Consume a magic-link token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTokenRequest {
    /// The token from the magic link.
    #[serde(default)]
    pub token: String,
}

/// Successful token consumption.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTokenResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// The verified email claim.
    pub email: String,
    /// Short-lived session token gating the OPRF exchange. Its claim is
    /// the email hash, not the address.
    pub session_token: String,
}

// =============================================================================
// OPRF Models
// =============================================================================

/// Blind evaluation request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OprfEvaluateRequest {
    /// Hex-encoded compressed SEC1 point, blinded client-side.
    #[serde(default)]
    pub blinded_point: String,
    /// Session token proving a completed email-ownership step.
    #[serde(default)]
    pub session_token: String,
}

/// Blind evaluation result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OprfEvaluateResponse {
    /// Always `true` on the success path.
    pub ok: bool,
    /// Hex-encoded compressed SEC1 point `k · BlindedPoint`.
    pub evaluated_point: String,
}

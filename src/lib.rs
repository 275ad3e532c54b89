// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cloakboard Auth - Passwordless Authentication / Key-Derivation Service
//!
//! This crate provides the multi-method identity core of the Cloakboard
//! platform: magic-link email tokens, password+OPRF, and wallet-signature
//! derived keys, all yielding a deterministic account key bundle while
//! secrets stay client-side.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `config` - environment configuration
//! - `flow` - authentication flow state machines
//! - `keys` - deterministic key-derivation engines
//! - `mailer` - magic-link delivery seam
//! - `oprf` - blinded OPRF evaluation over secp256k1
//! - `session` - stateless HMAC session tokens
//! - `token_store` - single-use magic-link token store

pub mod api;
pub mod config;
pub mod error;
pub mod flow;
pub mod keys;
pub mod mailer;
pub mod models;
pub mod oprf;
pub mod session;
pub mod state;
pub mod token_store;

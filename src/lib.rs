// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Magic-Link Gateway
//!
//! Stateless HTTP service that issues passwordless "magic link" sign-in
//! tokens to a restricted set of pre-approved email addresses and delivers
//! them by email.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Shared-secret bearer authentication for calling clients
//! - `providers` - Allow-list store, identity provider, and email provider clients

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod providers;
pub mod state;

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Downstream provider clients.
//!
//! Each client wraps one external dependency behind a small typed surface:
//! the allow-list store, the identity provider, and the transactional email
//! provider. All three share the pooled HTTP client built at startup.

pub mod allowlist;
pub mod email;
pub mod identity;

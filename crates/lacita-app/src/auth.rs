// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::OwnerId;

/// Authentication failure interrupts the flow instead of folding into a
/// fetch outcome: an invalid session makes every scoped read and write
/// meaningless, so the host propagates it to its sign-in boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    NotSignedIn,
    SessionExpired,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSignedIn => f.write_str("no authenticated user"),
            Self::SessionExpired => f.write_str("session expired"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Stable owner identity for every read and write against the store.
pub trait IdentityProvider {
    fn owner_id(&self) -> Result<OwnerId, AuthError>;
}

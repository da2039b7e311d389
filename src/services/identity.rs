// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider boundary.
//!
//! Interactive OAuth flows live outside this crate; the session only needs
//! to ask "who is signed in" and to drop the stored identity on sign-out.
//! `StoredIdentity` is the kv-backed implementation, with guest sign-in
//! for users who skip authentication entirely.

use chrono::Utc;

use crate::models::{Provider, UserIdentity};
use crate::store::{keys, KvStore};
use crate::time_utils::format_utc_rfc3339;

/// External identity collaborator contract.
pub trait IdentityProvider {
    fn current_user(&self) -> Option<UserIdentity>;
    fn sign_out(&self);
}

/// Identity provider over the shared key-value store.
#[derive(Clone)]
pub struct StoredIdentity {
    kv: KvStore,
}

impl StoredIdentity {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Persist an identity delivered by an external sign-in flow.
    pub fn sign_in(&self, user: &UserIdentity) -> bool {
        self.kv.set_json(keys::USER, user)
    }

    /// Mint and persist an anonymous guest identity.
    pub fn sign_in_as_guest(&self) -> UserIdentity {
        let user = UserIdentity {
            display_name: "Guest User".to_string(),
            email: None,
            avatar_url: None,
            provider: Provider::Guest,
            created_at: format_utc_rfc3339(Utc::now()),
            subject: None,
            numeric_id: None,
        };
        self.kv.set_json(keys::USER, &user);
        user
    }
}

impl IdentityProvider for StoredIdentity {
    fn current_user(&self) -> Option<UserIdentity> {
        self.kv.get_json(keys::USER)
    }

    /// Sign-out drops the identity record only; the user's aggregate stays
    /// so history survives a later sign-in.
    fn sign_out(&self) {
        self.kv.remove(keys::USER);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_sign_in_round_trips() {
        let kv = KvStore::in_memory();
        let identity = StoredIdentity::new(kv);

        assert!(identity.current_user().is_none());
        let guest = identity.sign_in_as_guest();
        assert!(guest.is_guest());

        let current = identity.current_user().expect("guest should be stored");
        assert_eq!(current.provider, Provider::Guest);

        identity.sign_out();
        assert!(identity.current_user().is_none());
    }
}

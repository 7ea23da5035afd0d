// 8.0: access control. a single admin plus a mutable authorized-caller set.
// admin rights gate every administrative mutation (pause, receiver
// registration, reserve funding, caller management); authorized-caller
// membership only grants the right to push risk assessment updates, nothing
// more. the pause flag gates admission and borrow dispatch only; existing
// positions stay readable and liquidatable while paused.

use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessController {
    admin: Address,
    authorized: HashSet<Address>,
    paused: bool,
}

impl AccessController {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            authorized: HashSet::new(),
            paused: false,
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn is_admin(&self, caller: Address) -> bool {
        caller == self.admin
    }

    pub fn is_authorized(&self, caller: Address) -> bool {
        self.authorized.contains(&caller)
    }

    /// Risk updates are allowed for the position owner, the admin, and any
    /// authorized caller (the risk-oracle relayer in practice).
    pub fn may_update_risk(&self, caller: Address, owner: Address) -> bool {
        caller == owner || self.is_admin(caller) || self.is_authorized(caller)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // mutations are unguarded here; the engine checks is_admin first so the
    // error surfaces in the unified ledger taxonomy.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }

    pub fn authorize(&mut self, caller: Address) -> bool {
        self.authorized.insert(caller)
    }

    pub fn revoke(&mut self, caller: Address) -> bool {
        self.authorized.remove(&caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Address = Address(1);
    const OWNER: Address = Address(2);
    const RELAYER: Address = Address(3);
    const STRANGER: Address = Address(4);

    #[test]
    fn admin_identity() {
        let access = AccessController::new(ADMIN);
        assert!(access.is_admin(ADMIN));
        assert!(!access.is_admin(STRANGER));
    }

    #[test]
    fn risk_update_rights() {
        let mut access = AccessController::new(ADMIN);
        access.authorize(RELAYER);

        assert!(access.may_update_risk(OWNER, OWNER)); // owner
        assert!(access.may_update_risk(ADMIN, OWNER)); // admin
        assert!(access.may_update_risk(RELAYER, OWNER)); // authorized
        assert!(!access.may_update_risk(STRANGER, OWNER));

        access.revoke(RELAYER);
        assert!(!access.may_update_risk(RELAYER, OWNER));
    }

    #[test]
    fn authorization_does_not_grant_admin() {
        let mut access = AccessController::new(ADMIN);
        access.authorize(RELAYER);
        assert!(!access.is_admin(RELAYER));
    }

    #[test]
    fn pause_toggles() {
        let mut access = AccessController::new(ADMIN);
        assert!(!access.is_paused());
        access.pause();
        assert!(access.is_paused());
        access.unpause();
        assert!(!access.is_paused());
    }
}

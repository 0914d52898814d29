//! Point-in-time view of a group's membership for diffing.

use std::collections::HashSet;

use crate::recipients::Recipient;

/// Member ids and addresses captured once per run.
#[derive(Debug, Default, Clone)]
pub struct MembershipSnapshot {
    ids: HashSet<String>,
    addresses: HashSet<String>,
}

impl MembershipSnapshot {
    #[must_use]
    pub fn from_members(members: &[Recipient]) -> Self {
        let mut snapshot = Self::default();
        for member in members {
            snapshot.insert(member);
        }
        snapshot
    }

    /// Records a member, e.g. after a successful add.
    pub fn insert(&mut self, member: &Recipient) {
        self.ids.insert(member.id.to_ascii_lowercase());
        self.addresses.extend(member.addresses());
    }

    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(&id.to_ascii_lowercase())
    }

    /// Case-insensitive match against mail, UPN and SMTP proxies.
    #[must_use]
    pub fn contains_address(&self, address: &str) -> bool {
        self.addresses.contains(&address.to_ascii_lowercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

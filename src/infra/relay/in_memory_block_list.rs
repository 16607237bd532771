// In-memory implementation of BlockList.
//
// State lives for the process lifetime only; a restart forgets every block.

use crate::core::relay::{BlockList, UserId};
use dashmap::DashSet;

/// Block list backed by a concurrent set.
pub struct InMemoryBlockList {
    users: DashSet<UserId>,
}

impl InMemoryBlockList {
    pub fn new() -> Self {
        Self {
            users: DashSet::new(),
        }
    }
}

impl Default for InMemoryBlockList {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockList for InMemoryBlockList {
    fn block(&self, user: UserId) {
        self.users.insert(user);
    }

    fn unblock(&self, user: UserId) -> bool {
        self.users.remove(&user).is_some()
    }

    fn is_blocked(&self, user: UserId) -> bool {
        self.users.contains(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_then_unblock() {
        let list = InMemoryBlockList::new();

        list.block(UserId(42));
        assert!(list.is_blocked(UserId(42)));

        assert!(list.unblock(UserId(42)));
        assert!(!list.is_blocked(UserId(42)));
    }

    #[test]
    fn test_block_is_idempotent() {
        let list = InMemoryBlockList::new();
        list.block(UserId(42));
        list.block(UserId(42));

        assert!(list.unblock(UserId(42)));
        assert!(!list.unblock(UserId(42)));
    }

    #[test]
    fn test_unblock_unknown_user_reports_absent() {
        let list = InMemoryBlockList::new();
        assert!(!list.unblock(UserId(7)));
        assert!(!list.is_blocked(UserId(7)));
    }

    #[test]
    fn test_blocks_are_per_user() {
        let list = InMemoryBlockList::new();
        list.block(UserId(1));
        assert!(!list.is_blocked(UserId(2)));
    }
}

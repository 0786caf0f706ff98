//! Command authorization for SendNews.
//!
//! Admin-only commands are guarded with [`AdminList::is_authorized`] before
//! their handler runs.

use std::collections::BTreeSet;

/// Permission level a command requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    /// Anyone who can talk to the bot.
    Anyone,
    /// Listed administrators.
    Admin,
}

/// Fixed allow-list of administrator user IDs, loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminList {
    ids: BTreeSet<i64>,
}

impl AdminList {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Whether `user_id` may run a command that requires `required`.
    pub fn is_authorized(&self, user_id: i64, required: Role) -> bool {
        match required {
            Role::Anyone => true,
            Role::Admin => self.ids.contains(&user_id),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

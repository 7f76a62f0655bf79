//! Stream topic names for user events.

use core_config::env_or_default;

use crate::events::EventKind;

/// Catch-all stream carrying every user event
pub const TOPIC_USER_EVENTS: &str = "user-events";
pub const TOPIC_USER_CREATED: &str = "user-created";
pub const TOPIC_USER_UPDATED: &str = "user-updated";
pub const TOPIC_USER_DELETED: &str = "user-deleted";

/// Resolved topic names; every type-specific publish also mirrors into `all`.
#[derive(Debug, Clone)]
pub struct EventTopics {
    pub all: String,
    pub created: String,
    pub updated: String,
    pub deleted: String,
}

impl EventTopics {
    /// Load topic names from `EVENT_TOPIC_*` env vars, with defaults.
    pub fn from_env() -> Self {
        Self {
            all: env_or_default("EVENT_TOPIC_ALL", TOPIC_USER_EVENTS),
            created: env_or_default("EVENT_TOPIC_CREATED", TOPIC_USER_CREATED),
            updated: env_or_default("EVENT_TOPIC_UPDATED", TOPIC_USER_UPDATED),
            deleted: env_or_default("EVENT_TOPIC_DELETED", TOPIC_USER_DELETED),
        }
    }

    /// Type-specific topic for an event kind.
    pub fn for_kind(&self, kind: EventKind) -> &str {
        match kind {
            EventKind::Created => &self.created,
            EventKind::Updated => &self.updated,
            EventKind::Deleted => &self.deleted,
        }
    }
}

impl Default for EventTopics {
    fn default() -> Self {
        Self {
            all: TOPIC_USER_EVENTS.to_string(),
            created: TOPIC_USER_CREATED.to_string(),
            updated: TOPIC_USER_UPDATED.to_string(),
            deleted: TOPIC_USER_DELETED.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_kind_mapping() {
        let topics = EventTopics::default();

        assert_eq!(topics.for_kind(EventKind::Created), "user-created");
        assert_eq!(topics.for_kind(EventKind::Updated), "user-updated");
        assert_eq!(topics.for_kind(EventKind::Deleted), "user-deleted");
        assert_eq!(topics.all, "user-events");
    }
}

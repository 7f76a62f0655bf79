//! User change-notification events and their Redis Streams publisher.

use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stream_worker::StreamProducer;
use strum::{Display, EnumString};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::models::{Role, User};
use crate::streams::EventTopics;

/// Attribution string for actions performed by the service itself
pub const PERFORMED_BY_SYSTEM: &str = "SYSTEM";

/// Kind of change a user record went through
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

/// Event published after every successful mutation.
///
/// Carries a snapshot of the user as of publication. Built once per
/// mutation and never mutated afterwards; consumers must tolerate
/// duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserEvent {
    pub user_id: i64,
    pub event_type: EventKind,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub active: bool,
    pub timestamp: DateTime<Utc>,
    /// Who performed the action (for audit)
    pub performed_by: String,
}

impl UserEvent {
    /// Build an event from the post-mutation state of a user.
    pub fn from_user(user: &User, event_type: EventKind) -> Self {
        Self {
            user_id: user.id,
            event_type,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            active: user.active,
            timestamp: Utc::now(),
            performed_by: PERFORMED_BY_SYSTEM.to_string(),
        }
    }
}

/// Publisher seam for user events.
///
/// `publish` is fire-and-forget: it must not block the caller and all
/// failures stay inside the implementation.
pub trait UserEventPublisher: Send + Sync {
    fn publish(&self, event: UserEvent);
}

impl<P: UserEventPublisher> UserEventPublisher for Arc<P> {
    fn publish(&self, event: UserEvent) {
        (**self).publish(event);
    }
}

/// Publishes each event to two Redis streams: the type-specific topic
/// and the catch-all topic. The stringified user id rides along as the
/// routing key.
#[derive(Clone)]
pub struct RedisEventPublisher {
    redis: Arc<ConnectionManager>,
    topics: Arc<EventTopics>,
}

impl RedisEventPublisher {
    pub fn new(redis: ConnectionManager, topics: EventTopics) -> Self {
        Self {
            redis: Arc::new(redis),
            topics: Arc::new(topics),
        }
    }

    fn spawn_publish(&self, topic: String, event: UserEvent) {
        let producer = StreamProducer::from_arc(self.redis.clone(), topic);

        tokio::spawn(async move {
            let key = event.user_id.to_string();
            match producer.send_keyed(&key, &event).await {
                Ok(stream_id) => {
                    info!(
                        topic = %producer.stream_name(),
                        key = %key,
                        event_type = %event.event_type,
                        stream_id = %stream_id,
                        "Published user event"
                    );
                }
                Err(e) => {
                    error!(
                        topic = %producer.stream_name(),
                        key = %key,
                        event_type = %event.event_type,
                        error = %e,
                        "Failed to publish user event"
                    );
                }
            }
        });
    }
}

/// Pair the event with its two destinations: the type-specific topic
/// first, then the catch-all.
fn fan_out(topics: &EventTopics, event: UserEvent) -> [(String, UserEvent); 2] {
    let specific = topics.for_kind(event.event_type).to_string();
    let all = topics.all.clone();
    [(specific, event.clone()), (all, event)]
}

impl UserEventPublisher for RedisEventPublisher {
    fn publish(&self, event: UserEvent) {
        // Two independent publishes; one failing must not stop the other
        for (topic, event) in fan_out(&self.topics, event) {
            self.spawn_publish(topic, event);
        }
    }
}

/// Test double collecting published events.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingPublisher {
    events: std::sync::Mutex<Vec<UserEvent>>,
}

#[cfg(test)]
impl RecordingPublisher {
    pub(crate) fn events(&self) -> Vec<UserEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl UserEventPublisher for RecordingPublisher {
    fn publish(&self, event: UserEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 42,
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+14155552671".to_string(),
            role: Role::Admin,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_event_kind_wire_format() {
        assert_eq!(
            serde_json::to_string(&EventKind::Created).unwrap(),
            "\"CREATED\""
        );
        assert_eq!(
            serde_json::to_string(&EventKind::Deleted).unwrap(),
            "\"DELETED\""
        );

        let kind: EventKind = serde_json::from_str("\"UPDATED\"").unwrap();
        assert_eq!(kind, EventKind::Updated);
    }

    #[test]
    fn test_event_snapshot() {
        let user = sample_user();
        let event = UserEvent::from_user(&user, EventKind::Created);

        assert_eq!(event.user_id, 42);
        assert_eq!(event.event_type, EventKind::Created);
        assert_eq!(event.email, "jane@example.com");
        assert_eq!(event.role, Role::Admin);
        assert_eq!(event.performed_by, PERFORMED_BY_SYSTEM);
    }

    #[test]
    fn test_fan_out_mirrors_payload_to_both_topics() {
        let topics = EventTopics::default();
        let event = UserEvent::from_user(&sample_user(), EventKind::Updated);

        let [(specific_topic, specific_event), (all_topic, all_event)] =
            fan_out(&topics, event.clone());

        assert_eq!(specific_topic, "user-updated");
        assert_eq!(all_topic, "user-events");
        assert_eq!(specific_event, event);
        assert_eq!(all_event, event);
    }

    #[test]
    fn test_event_wire_shape() {
        let event = UserEvent::from_user(&sample_user(), EventKind::Deleted);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["userId"], 42);
        assert_eq!(json["eventType"], "DELETED");
        assert_eq!(json["performedBy"], "SYSTEM");
        assert_eq!(json["role"], "ADMIN");
        assert!(json.get("timestamp").is_some());
    }
}

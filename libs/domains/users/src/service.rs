use std::sync::Arc;

use crate::error::{UserError, UserResult};
use crate::events::{EventKind, UserEvent, UserEventPublisher};
use crate::models::{
    CreateUserRequest, NewUser, UpdateUserRequest, UserListResponse, UserQuery, UserResponse,
};
use crate::repository::UserRepository;

/// Service layer owning the mutate -> map -> publish sequence.
///
/// Event publication is fire-and-forget: it happens strictly after the
/// store mutation returns, and a broker failure can never fail or roll
/// back the operation.
#[derive(Clone)]
pub struct UserService<R: UserRepository, P: UserEventPublisher> {
    repository: Arc<R>,
    publisher: Arc<P>,
}

impl<R: UserRepository, P: UserEventPublisher> UserService<R, P> {
    pub fn new(repository: R, publisher: P) -> Self {
        Self {
            repository: Arc::new(repository),
            publisher: Arc::new(publisher),
        }
    }

    /// Create a new user and publish a CREATED event.
    pub async fn create_user(&self, input: CreateUserRequest) -> UserResult<UserResponse> {
        tracing::info!(email = %input.email, "Creating new user");

        // Pre-check; the store's unique index settles concurrent races
        if self.repository.email_exists(&input.email).await? {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let new_user = NewUser {
            name: input.name,
            email: input.email,
            phone: input.phone,
            role: input.role.unwrap_or_default(),
            active: true,
        };

        let created = self.repository.create(new_user).await?;

        self.publisher
            .publish(UserEvent::from_user(&created, EventKind::Created));

        Ok(created.into())
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: i64) -> UserResult<UserResponse> {
        let user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        Ok(user.into())
    }

    /// List users with pagination, sorting and filtering.
    pub async fn list_users(&self, query: UserQuery) -> UserResult<UserListResponse> {
        Self::validate_pagination(&query)?;

        let total = self.repository.count(query.clone()).await?;
        let users = self.repository.list(query.clone()).await?;

        Ok(UserListResponse {
            users: users.into_iter().map(|u| u.into()).collect(),
            total_elements: total,
            total_pages: total.div_ceil(query.size as u64),
            current_page: query.page,
            page_size: query.size,
        })
    }

    /// Apply a partial update and publish an UPDATED event.
    pub async fn update_user(&self, id: i64, input: UpdateUserRequest) -> UserResult<UserResponse> {
        tracing::info!(user_id = %id, "Updating user");

        let mut user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        // Re-check uniqueness only when the email actually changes
        if let Some(ref new_email) = input.email {
            if !new_email.eq_ignore_ascii_case(&user.email)
                && self.repository.email_exists(new_email).await?
            {
                return Err(UserError::DuplicateEmail(new_email.clone()));
            }
        }

        user.apply_update(input);

        let updated = self.repository.update(user).await?;

        self.publisher
            .publish(UserEvent::from_user(&updated, EventKind::Updated));

        Ok(updated.into())
    }

    /// Delete a user and publish a DELETED event built from the state
    /// before deletion.
    pub async fn delete_user(&self, id: i64) -> UserResult<()> {
        tracing::info!(user_id = %id, "Deleting user");

        let user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        // Snapshot before the row disappears
        let event = UserEvent::from_user(&user, EventKind::Deleted);

        let deleted = self.repository.delete(id).await?;
        if !deleted {
            return Err(UserError::NotFound(id));
        }

        self.publisher.publish(event);

        Ok(())
    }

    fn validate_pagination(query: &UserQuery) -> UserResult<()> {
        if query.page < 0 {
            return Err(UserError::Validation(
                "Page index must not be negative".to_string(),
            ));
        }
        if query.size <= 0 {
            return Err(UserError::Validation(
                "Page size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingPublisher;
    use crate::models::Role;
    use crate::repository::InMemoryUserRepository;

    fn service() -> UserService<InMemoryUserRepository, RecordingPublisher> {
        UserService::new(InMemoryUserRepository::new(), RecordingPublisher::default())
    }

    fn create_request(name: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: name.to_string(),
            email: email.to_string(),
            phone: "+14155552671".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_and_event() {
        let service = service();

        let response = service
            .create_user(create_request("Jane", "jane@example.com"))
            .await
            .unwrap();

        assert_eq!(response.role, Role::User);
        assert!(response.active);

        let events = service.publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventKind::Created);
        assert_eq!(events[0].user_id, response.id);
        assert_eq!(events[0].email, "jane@example.com");
        assert_eq!(events[0].performed_by, "SYSTEM");
    }

    #[tokio::test]
    async fn test_create_with_explicit_role() {
        let service = service();

        let response = service
            .create_user(CreateUserRequest {
                role: Some(Role::Admin),
                ..create_request("Admin", "admin@example.com")
            })
            .await
            .unwrap();

        assert_eq!(response.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_duplicate_create_no_event_no_mutation() {
        let service = service();

        service
            .create_user(create_request("Jane", "jane@example.com"))
            .await
            .unwrap();

        let result = service
            .create_user(create_request("Other", "jane@example.com"))
            .await;
        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));

        // exactly the one event from the first create
        assert_eq!(service.publisher.events().len(), 1);

        let list = service.list_users(UserQuery::default()).await.unwrap();
        assert_eq!(list.total_elements, 1);
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let service = service();
        let result = service.get_user(404).await;
        assert!(matches!(result, Err(UserError::NotFound(404))));
    }

    #[tokio::test]
    async fn test_partial_update_preserves_fields() {
        let service = service();

        let created = service
            .create_user(create_request("Jane", "jane@example.com"))
            .await
            .unwrap();

        let updated = service
            .update_user(
                created.id,
                UpdateUserRequest {
                    name: Some("Jane Smith".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Jane Smith");
        assert_eq!(updated.email, "jane@example.com");
        assert_eq!(updated.phone, created.phone);

        let events = service.publisher.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, EventKind::Updated);
        assert_eq!(events[1].name, "Jane Smith");
    }

    #[tokio::test]
    async fn test_update_to_taken_email_conflicts() {
        let service = service();

        service
            .create_user(create_request("A", "a@example.com"))
            .await
            .unwrap();
        let second = service
            .create_user(create_request("B", "b@example.com"))
            .await
            .unwrap();

        let result = service
            .update_user(
                second.id,
                UpdateUserRequest {
                    email: Some("a@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
        // no UPDATED event
        assert_eq!(service.publisher.events().len(), 2);
    }

    #[tokio::test]
    async fn test_update_keeping_own_email_is_fine() {
        let service = service();

        let created = service
            .create_user(create_request("Jane", "jane@example.com"))
            .await
            .unwrap();

        let updated = service
            .update_user(
                created.id,
                UpdateUserRequest {
                    email: Some("JANE@EXAMPLE.COM".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "JANE@EXAMPLE.COM");
    }

    #[tokio::test]
    async fn test_delete_publishes_snapshot() {
        let service = service();

        let created = service
            .create_user(create_request("Jane", "jane@example.com"))
            .await
            .unwrap();

        service.delete_user(created.id).await.unwrap();

        let events = service.publisher.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, EventKind::Deleted);
        assert_eq!(events[1].user_id, created.id);
        assert_eq!(events[1].email, "jane@example.com");

        let result = service.get_user(created.id).await;
        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_no_event() {
        let service = service();

        let result = service.delete_user(999).await;
        assert!(matches!(result, Err(UserError::NotFound(999))));
        assert!(service.publisher.events().is_empty());
    }

    #[tokio::test]
    async fn test_list_pagination_metadata() {
        let service = service();

        for i in 0..5 {
            service
                .create_user(create_request(
                    &format!("User {}", i),
                    &format!("user{}@example.com", i),
                ))
                .await
                .unwrap();
        }

        let page = service
            .list_users(UserQuery {
                page: 1,
                size: 2,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.page_size, 2);
        assert_eq!(page.users.len(), 2);
    }

    #[tokio::test]
    async fn test_active_filter() {
        let service = service();

        let first = service
            .create_user(create_request("Active", "active@example.com"))
            .await
            .unwrap();
        let second = service
            .create_user(create_request("Inactive", "inactive@example.com"))
            .await
            .unwrap();
        service
            .update_user(
                second.id,
                UpdateUserRequest {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let page = service
            .list_users(UserQuery {
                active: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_elements, 1);
        assert_eq!(page.users[0].id, first.id);
    }

    #[tokio::test]
    async fn test_invalid_pagination_rejected() {
        let service = service();

        let result = service
            .list_users(UserQuery {
                page: -1,
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(UserError::Validation(_))));

        let result = service
            .list_users(UserQuery {
                size: 0,
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(UserError::Validation(_))));
    }
}

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, User, UserQuery};

/// Repository trait for User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user; the store assigns id and timestamps
    async fn create(&self, input: NewUser) -> UserResult<User>;

    /// Get a user by ID
    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>>;

    /// List users for one page of the query
    async fn list(&self, query: UserQuery) -> UserResult<Vec<User>>;

    /// Count users matching the query's filter (for pagination)
    async fn count(&self, query: UserQuery) -> UserResult<u64>;

    /// Update an existing user
    async fn update(&self, user: User) -> UserResult<User>;

    /// Delete a user by ID
    async fn delete(&self, id: i64) -> UserResult<bool>;

    /// Check if an email already exists (case-insensitive)
    async fn email_exists(&self, email: &str) -> UserResult<bool>;
}

/// Keep the filter precedence in one place: at most one of role, active
/// and name_filter applies.
fn matches_filter(user: &User, query: &UserQuery) -> bool {
    if let Some(role) = query.role {
        user.role == role
    } else if let Some(active) = query.active {
        user.active == active
    } else if let Some(ref name) = query.name_filter {
        user.name.to_lowercase().contains(&name.to_lowercase())
    } else {
        true
    }
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<i64, User>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(0)),
        }
    }

    fn sort(users: &mut [User], query: &UserQuery) {
        match query.sort_by.as_str() {
            "name" => users.sort_by(|a, b| a.name.cmp(&b.name)),
            "email" => users.sort_by(|a, b| a.email.cmp(&b.email)),
            "phone" => users.sort_by(|a, b| a.phone.cmp(&b.phone)),
            "role" => users.sort_by(|a, b| a.role.to_string().cmp(&b.role.to_string())),
            "active" => users.sort_by(|a, b| a.active.cmp(&b.active)),
            "createdAt" => users.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            "updatedAt" => users.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
            // unknown sort fields fall back to id
            _ => users.sort_by_key(|u| u.id),
        }

        if query.descending() {
            users.reverse();
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, input: NewUser) -> UserResult<User> {
        let mut users = self.users.write().await;

        let email_taken = users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&input.email));
        if email_taken {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let user = User {
            id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            role: input.role,
            active: input.active,
            created_at: now,
            updated_at: now,
        };

        users.insert(id, user.clone());

        tracing::info!(user_id = %id, email = %user.email, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn list(&self, query: UserQuery) -> UserResult<Vec<User>> {
        let users = self.users.read().await;

        let mut result: Vec<User> = users
            .values()
            .filter(|u| matches_filter(u, &query))
            .cloned()
            .collect();

        Self::sort(&mut result, &query);

        let result: Vec<User> = result
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.size as usize)
            .collect();

        Ok(result)
    }

    async fn count(&self, query: UserQuery) -> UserResult<u64> {
        let users = self.users.read().await;
        let count = users.values().filter(|u| matches_filter(u, &query)).count();
        Ok(count as u64)
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id));
        }

        let email_taken = users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email));
        if email_taken {
            return Err(UserError::DuplicateEmail(user.email));
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, "Updated user");
        Ok(user)
    }

    async fn delete(&self, id: i64) -> UserResult<bool> {
        let mut users = self.users.write().await;

        if users.remove(&id).is_some() {
            tracing::info!(user_id = %id, "Deleted user");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        let users = self.users.read().await;
        let exists = users.values().any(|u| u.email.eq_ignore_ascii_case(email));
        Ok(exists)
    }
}

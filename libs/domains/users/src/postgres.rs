use async_trait::async_trait;
use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};

use crate::{
    entity,
    error::{UserError, UserResult},
    models::{NewUser, User, UserQuery},
    repository::UserRepository,
};

/// PostgreSQL implementation of UserRepository using SeaORM.
///
/// The unique index on email is the final arbiter for concurrent creates;
/// its violation is translated to `DuplicateEmail`.
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Apply at most one filter, precedence role > active > name_filter.
    fn apply_filter(query: &UserQuery, select: Select<entity::Entity>) -> Select<entity::Entity> {
        if let Some(role) = query.role {
            select.filter(entity::Column::Role.eq(role))
        } else if let Some(active) = query.active {
            select.filter(entity::Column::Active.eq(active))
        } else if let Some(ref name) = query.name_filter {
            select.filter(
                Expr::expr(Func::lower(Expr::col(entity::Column::Name)))
                    .like(format!("%{}%", name.to_lowercase())),
            )
        } else {
            select
        }
    }

    fn apply_order(query: &UserQuery, select: Select<entity::Entity>) -> Select<entity::Entity> {
        let column = match query.sort_by.as_str() {
            "name" => entity::Column::Name,
            "email" => entity::Column::Email,
            "phone" => entity::Column::Phone,
            "role" => entity::Column::Role,
            "active" => entity::Column::Active,
            "createdAt" => entity::Column::CreatedAt,
            "updatedAt" => entity::Column::UpdatedAt,
            // unknown sort fields fall back to id
            _ => entity::Column::Id,
        };

        if query.descending() {
            select.order_by_desc(column)
        } else {
            select.order_by_asc(column)
        }
    }
}

fn internal(e: DbErr) -> UserError {
    UserError::Internal(format!("Database error: {}", e))
}

fn is_unique_violation(e: &DbErr) -> bool {
    let msg = e.to_string();
    msg.contains("duplicate key") || msg.contains("unique constraint")
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, input: NewUser) -> UserResult<User> {
        let email = input.email.clone();
        let active_model: entity::ActiveModel = input.into();

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                UserError::DuplicateEmail(email.clone())
            } else {
                internal(e)
            }
        })?;

        tracing::info!(user_id = %model.id, email = %model.email, "Created user");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let model = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(internal)?;

        Ok(model.map(|m| m.into()))
    }

    async fn list(&self, query: UserQuery) -> UserResult<Vec<User>> {
        let mut select = entity::Entity::find();
        select = Self::apply_filter(&query, select);
        select = Self::apply_order(&query, select);
        select = select.limit(query.size as u64).offset(query.offset());

        let models = select.all(&self.db).await.map_err(internal)?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn count(&self, query: UserQuery) -> UserResult<u64> {
        let select = Self::apply_filter(&query, entity::Entity::find());

        let count = select.count(&self.db).await.map_err(internal)?;

        Ok(count)
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let id = user.id;
        let email = user.email.clone();
        let active_model: entity::ActiveModel = user.into();

        let model = active_model.update(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                UserError::DuplicateEmail(email.clone())
            } else if matches!(e, DbErr::RecordNotUpdated) {
                UserError::NotFound(id)
            } else {
                internal(e)
            }
        })?;

        tracing::info!(user_id = %id, "Updated user");
        Ok(model.into())
    }

    async fn delete(&self, id: i64) -> UserResult<bool> {
        let result = entity::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(internal)?;

        if result.rows_affected > 0 {
            tracing::info!(user_id = %id, "Deleted user");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        let count = entity::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(entity::Column::Email)))
                    .eq(email.to_lowercase()),
            )
            .count(&self.db)
            .await
            .map_err(internal)?;

        Ok(count > 0)
    }
}

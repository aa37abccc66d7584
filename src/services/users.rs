use crate::{
    auth::password::hash_password,
    entities::{
        order,
        user::{self, Entity as UserEntity, UserRole},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::common::{search_pattern, Page},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Public view of an account; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserProfile {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
            is_active: model.is_active,
            last_login_at: model.last_login_at,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Matches name or email
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
}

#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn find(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        UserEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        query: &UserListQuery,
        page: Page,
    ) -> Result<(Vec<UserProfile>, u64), ServiceError> {
        let mut select = UserEntity::find();

        if let Some(pattern) = search_pattern(query.search.as_deref()) {
            let lower = |col: user::Column| Expr::expr(Func::lower(Expr::col(col)));
            select = select.filter(
                Condition::any()
                    .add(lower(user::Column::Name).like(pattern.clone()))
                    .add(lower(user::Column::Email).like(pattern)),
            );
        }
        if let Some(role) = query.role {
            select = select.filter(user::Column::Role.eq(role));
        }
        if let Some(is_active) = query.is_active {
            select = select.filter(user::Column::IsActive.eq(is_active));
        }

        let total = select.clone().count(&*self.db).await?;
        let users = select
            .order_by_desc(user::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit)
            .all(&*self.db)
            .await?;

        Ok((users.into_iter().map(UserProfile::from).collect(), total))
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<UserProfile, ServiceError> {
        Ok(self.find(id).await?.into())
    }

    /// Changes a user's role. Admins cannot demote themselves.
    #[instrument(skip(self))]
    pub async fn change_role(
        &self,
        actor_id: Uuid,
        id: Uuid,
        role: UserRole,
    ) -> Result<UserProfile, ServiceError> {
        if actor_id == id && role != UserRole::Admin {
            return Err(ServiceError::InvalidOperation(
                "Admins cannot demote themselves".to_string(),
            ));
        }

        let existing = self.find(id).await?;
        let mut active: user::ActiveModel = existing.into();
        active.role = Set(role);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::UserRoleChanged {
                user_id: id,
                role: role.as_str().to_string(),
            })
            .await;
        info!(user_id = %id, role = %role, "User role changed");
        Ok(updated.into())
    }

    /// Activates or deactivates an account. Admins cannot deactivate themselves.
    #[instrument(skip(self))]
    pub async fn set_active(
        &self,
        actor_id: Uuid,
        id: Uuid,
        is_active: bool,
    ) -> Result<UserProfile, ServiceError> {
        if actor_id == id && !is_active {
            return Err(ServiceError::InvalidOperation(
                "Admins cannot deactivate themselves".to_string(),
            ));
        }

        let existing = self.find(id).await?;
        let mut active: user::ActiveModel = existing.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::UserStatusChanged {
                user_id: id,
                is_active,
            })
            .await;
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn update_profile(
        &self,
        id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, ServiceError> {
        let existing = self.find(id).await?;
        let mut active: user::ActiveModel = existing.into();
        active.name = Set(request.name.trim().to_string());
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?.into())
    }

    /// Number of orders a user has placed, used for audience targeting.
    pub async fn order_count(&self, id: Uuid) -> Result<u64, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::UserId.eq(id))
            .count(&*self.db)
            .await?)
    }

    /// Creates an admin account, or promotes the existing account with that email.
    ///
    /// Returns the account and whether it was newly created.
    #[instrument(skip(self, password))]
    pub async fn ensure_admin(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<(UserProfile, bool), ServiceError> {
        let email = email.trim().to_lowercase();
        let now = Utc::now();

        let existing = UserEntity::find()
            .filter(user::Column::Email.eq(email.clone()))
            .one(&*self.db)
            .await?;

        if let Some(found) = existing {
            if found.role == UserRole::Admin && found.is_active {
                return Ok((found.into(), false));
            }
            let mut active: user::ActiveModel = found.into();
            active.role = Set(UserRole::Admin);
            active.is_active = Set(true);
            active.updated_at = Set(now);
            let promoted = active.update(&*self.db).await?;
            info!(user_id = %promoted.id, "Existing user promoted to admin");
            return Ok((promoted.into(), false));
        }

        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            name: Set(name.trim().to_string()),
            password_hash: Set(hash_password(password)?),
            role: Set(UserRole::Admin),
            is_active: Set(true),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(user_id = %created.id, "Admin account created");
        self.event_sender
            .send_or_log(Event::UserRegistered(created.id))
            .await;
        Ok((created.into(), true))
    }
}

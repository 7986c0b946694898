use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::entities::user::{self, UserRole};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 120, message = "Display name is required"))]
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user: user::Model,
}

/// Account registration and credential checks.
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    auth: Arc<AuthService>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, auth: Arc<AuthService>) -> Self {
        Self {
            db_pool,
            event_sender,
            auth,
        }
    }

    /// Self-service registration always yields a customer account. Vendor and
    /// admin accounts are provisioned through [`Self::create_staff_user`].
    #[instrument(skip(self, input))]
    pub async fn register(&self, input: RegisterInput) -> Result<user::Model, ServiceError> {
        input.validate()?;
        self.insert_user(input, UserRole::Customer, None).await
    }

    /// Admin-provisioned vendor or admin account.
    #[instrument(skip(self, input))]
    pub async fn create_staff_user(
        &self,
        input: RegisterInput,
        role: UserRole,
        vendor_id: Option<Uuid>,
    ) -> Result<user::Model, ServiceError> {
        input.validate()?;
        if role == UserRole::Vendor && vendor_id.is_none() {
            return Err(ServiceError::ValidationError(
                "Vendor accounts must be linked to a vendor".to_string(),
            ));
        }
        self.insert_user(input, role, vendor_id).await
    }

    async fn insert_user(
        &self,
        input: RegisterInput,
        role: UserRole,
        vendor_id: Option<Uuid>,
    ) -> Result<user::Model, ServiceError> {
        let email = input.email.trim().to_lowercase();
        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(email.clone()))
            .count(&*self.db_pool)
            .await?;
        if existing > 0 {
            return Err(ServiceError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = self.auth.hash_password(&input.password)?;
        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(password_hash),
            display_name: Set(input.display_name.trim().to_string()),
            role: Set(role),
            vendor_id: Set(vendor_id),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(user_id = %created.id, role = role.as_str(), "user registered");
        self.event_sender
            .send_or_log(Event::UserRegistered(created.id))
            .await;
        Ok(created)
    }

    /// Credential check. The same error is returned for a missing account and
    /// a wrong password.
    #[instrument(skip(self, input))]
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutcome, ServiceError> {
        let email = input.email.trim().to_lowercase();
        let user = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid credentials".to_string()))?;

        if !user.is_active {
            return Err(ServiceError::Unauthorized("Account is disabled".to_string()));
        }
        if !self.auth.verify_password(&input.password, &user.password_hash)? {
            return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
        }

        let token = self.auth.generate_token(&user)?;
        Ok(LoginOutcome { token, user })
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(user_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))
    }
}

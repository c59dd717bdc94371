//! Template repository implementation.
//!
//! Templates are always scoped to their owning user; there is no
//! cross-tenant lookup. Soft-deleted (inactive) templates stay in the table
//! and are returned by reads so they can be reactivated. The unique index
//! on (user_id, name) enforces name-uniqueness-per-user at the storage
//! level.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::entities::template::{self, ActiveModel, Entity as TemplateEntity};
use crate::domain::Template;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Template repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Find a template by ID, scoped to its owning user
    async fn find_for_user(&self, user_id: i64, id: i64) -> AppResult<Option<Template>>;

    /// Find a user's template by name (names are unique per user)
    async fn find_by_name(&self, user_id: i64, name: &str) -> AppResult<Option<Template>>;

    /// List all of a user's templates, active and inactive
    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Template>>;

    /// Insert a new template and return it with its assigned ID
    async fn insert(&self, template: &Template) -> AppResult<Template>;

    /// Persist the current field values of an already-saved template
    async fn save(&self, template: &Template) -> AppResult<Template>;
}

/// Concrete implementation of TemplateRepository
pub struct TemplateStore {
    db: DatabaseConnection,
}

impl TemplateStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TemplateRepository for TemplateStore {
    async fn find_for_user(&self, user_id: i64, id: i64) -> AppResult<Option<Template>> {
        let result = TemplateEntity::find_by_id(id)
            .filter(template::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Template::from))
    }

    async fn find_by_name(&self, user_id: i64, name: &str) -> AppResult<Option<Template>> {
        let result = TemplateEntity::find()
            .filter(template::Column::UserId.eq(user_id))
            .filter(template::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Template::from))
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Template>> {
        let models = TemplateEntity::find()
            .filter(template::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Template::from).collect())
    }

    async fn insert(&self, entity: &Template) -> AppResult<Template> {
        let active_model = ActiveModel {
            id: NotSet,
            user_id: Set(entity.user_id),
            name: Set(entity.name.clone()),
            channel: Set(entity.channel.as_str().to_string()),
            subject: Set(entity.subject.clone()),
            body: Set(entity.body.clone()),
            variables: Set(encode_variables(entity)?),
            is_active: Set(entity.is_active),
            created_at: Set(entity.created_at),
            updated_at: Set(entity.updated_at),
        };

        let model = active_model.insert(&self.db).await.map_err(AppError::from)?;
        Ok(Template::from(model))
    }

    async fn save(&self, entity: &Template) -> AppResult<Template> {
        let id = entity
            .id
            .ok_or_else(|| AppError::internal("Cannot save a template without an id"))?;

        let existing = TemplateEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.name = Set(entity.name.clone());
        active.channel = Set(entity.channel.as_str().to_string());
        active.subject = Set(entity.subject.clone());
        active.body = Set(entity.body.clone());
        active.variables = Set(encode_variables(entity)?);
        active.is_active = Set(entity.is_active);
        active.updated_at = Set(entity.updated_at);

        let model = active.update(&self.db).await.map_err(AppError::from)?;
        Ok(Template::from(model))
    }
}

fn encode_variables(entity: &Template) -> AppResult<serde_json::Value> {
    serde_json::to_value(&entity.variables)
        .map_err(|e| AppError::internal(format!("Failed to encode template variables: {}", e)))
}

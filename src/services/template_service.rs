//! Template service - Use cases around the template domain entity.
//!
//! Orchestrates the pure `Template` entity against the repository layer:
//! construction and updates go through the entity so its business rules are
//! always enforced, while name-uniqueness-per-user is enforced here with
//! the persistence layer.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{RenderedTemplate, Template, TemplateChannel, TemplateUpdate};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

/// Input for creating a template; `user_id` comes from the caller's token
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub channel: TemplateChannel,
    pub subject: Option<String>,
    pub body: String,
    pub variables: Option<BTreeMap<String, String>>,
}

/// Template service trait for dependency injection.
///
/// Every operation is scoped to the owning user; a template belonging to
/// someone else behaves as if it did not exist.
#[async_trait]
pub trait TemplateService: Send + Sync {
    /// Create and persist a new template
    async fn create_template(&self, user_id: i64, input: NewTemplate) -> AppResult<Template>;

    /// Get one of the user's templates by ID
    async fn get_template(&self, user_id: i64, id: i64) -> AppResult<Template>;

    /// List the user's templates, active and inactive
    async fn list_templates(&self, user_id: i64) -> AppResult<Vec<Template>>;

    /// Apply a partial update and persist the result
    async fn update_template(
        &self,
        user_id: i64,
        id: i64,
        patch: TemplateUpdate,
    ) -> AppResult<Template>;

    /// Render a template with caller-supplied variables
    async fn render_template(
        &self,
        user_id: i64,
        id: i64,
        variables: serde_json::Map<String, serde_json::Value>,
    ) -> AppResult<RenderedTemplate>;

    /// Soft delete: mark a template inactive
    async fn deactivate_template(&self, user_id: i64, id: i64) -> AppResult<()>;

    /// Reactivate a deactivated template
    async fn activate_template(&self, user_id: i64, id: i64) -> AppResult<Template>;
}

/// Concrete implementation of TemplateService using Unit of Work.
pub struct TemplateManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> TemplateManager<U> {
    /// Create new template service instance with Unit of Work
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn load(&self, user_id: i64, id: i64) -> AppResult<Template> {
        self.uow
            .templates()
            .find_for_user(user_id, id)
            .await?
            .ok_or_not_found()
    }
}

#[async_trait]
impl<U: UnitOfWork> TemplateService for TemplateManager<U> {
    async fn create_template(&self, user_id: i64, input: NewTemplate) -> AppResult<Template> {
        // Entity construction enforces the template business rules
        let template = Template::new(
            input.name,
            input.channel,
            input.body,
            user_id,
            input.subject,
            input.variables,
        )?;

        // Names are unique per user; the unique index guards the race
        // between this check and the insert
        if self
            .uow
            .templates()
            .find_by_name(template.user_id, &template.name)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Template"));
        }

        self.uow.templates().insert(&template).await
    }

    async fn get_template(&self, user_id: i64, id: i64) -> AppResult<Template> {
        self.load(user_id, id).await
    }

    async fn list_templates(&self, user_id: i64) -> AppResult<Vec<Template>> {
        self.uow.templates().list_for_user(user_id).await
    }

    async fn update_template(
        &self,
        user_id: i64,
        id: i64,
        patch: TemplateUpdate,
    ) -> AppResult<Template> {
        let mut template = self.load(user_id, id).await?;
        let renamed = patch
            .name
            .as_deref()
            .is_some_and(|name| name != template.name);

        // The entity validates the patched state before committing it
        template.update(patch)?;

        if renamed
            && self
                .uow
                .templates()
                .find_by_name(template.user_id, &template.name)
                .await?
                .is_some()
        {
            return Err(AppError::conflict("Template"));
        }

        self.uow.templates().save(&template).await
    }

    async fn render_template(
        &self,
        user_id: i64,
        id: i64,
        variables: serde_json::Map<String, serde_json::Value>,
    ) -> AppResult<RenderedTemplate> {
        let template = self.load(user_id, id).await?;
        Ok(template.render(&variables)?)
    }

    async fn deactivate_template(&self, user_id: i64, id: i64) -> AppResult<()> {
        let mut template = self.load(user_id, id).await?;
        template.deactivate();
        self.uow.templates().save(&template).await?;
        Ok(())
    }

    async fn activate_template(&self, user_id: i64, id: i64) -> AppResult<Template> {
        let mut template = self.load(user_id, id).await?;
        template.activate();
        self.uow.templates().save(&template).await
    }
}

//! Template service unit tests.
//!
//! The repository is mocked, so these cover the service orchestration and
//! the domain rules it surfaces; persistence-side uniqueness is exercised
//! in integration environments.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::eq;
use serde_json::json;

use notify_api::domain::{Template, TemplateChannel, TemplateUpdate, User};
use notify_api::errors::{AppError, AppResult};
use notify_api::infra::{TemplateRepository, UnitOfWork, UserRepository};
use notify_api::services::{NewTemplate, TemplateManager, TemplateService};

mock! {
    pub UserRepo {}

    #[async_trait]
    impl UserRepository for UserRepo {
        async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;
        async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;
        async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
        async fn create(
            &self,
            username: String,
            email: String,
            password_hash: String,
        ) -> AppResult<User>;
        async fn list(&self) -> AppResult<Vec<User>>;
    }
}

mock! {
    pub TemplateRepo {}

    #[async_trait]
    impl TemplateRepository for TemplateRepo {
        async fn find_for_user(&self, user_id: i64, id: i64) -> AppResult<Option<Template>>;
        async fn find_by_name(&self, user_id: i64, name: &str) -> AppResult<Option<Template>>;
        async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Template>>;
        async fn insert(&self, template: &Template) -> AppResult<Template>;
        async fn save(&self, template: &Template) -> AppResult<Template>;
    }
}

/// Test mock for UnitOfWork that wraps mocked repositories
struct TestUnitOfWork {
    user_repo: Arc<MockUserRepo>,
    template_repo: Arc<MockTemplateRepo>,
}

impl TestUnitOfWork {
    fn new(template_repo: MockTemplateRepo) -> Self {
        Self {
            user_repo: Arc::new(MockUserRepo::new()),
            template_repo: Arc::new(template_repo),
        }
    }
}

impl UnitOfWork for TestUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn templates(&self) -> Arc<dyn TemplateRepository> {
        self.template_repo.clone()
    }
}

fn service_with(repo: MockTemplateRepo) -> TemplateManager<TestUnitOfWork> {
    TemplateManager::new(Arc::new(TestUnitOfWork::new(repo)))
}

fn saved_template(id: i64, user_id: i64) -> Template {
    let mut template = Template::new(
        "welcome",
        TemplateChannel::Email,
        "Hello {{name}}, balance {{amount}}",
        user_id,
        Some("Welcome {{name}}".to_string()),
        None,
    )
    .unwrap();
    template.id = Some(id);
    template
}

#[tokio::test]
async fn test_get_template_success() {
    let mut repo = MockTemplateRepo::new();
    repo.expect_find_for_user()
        .with(eq(1), eq(10))
        .returning(|user_id, id| Ok(Some(saved_template(id, user_id))));

    let service = service_with(repo);
    let template = service.get_template(1, 10).await.unwrap();

    assert_eq!(template.id, Some(10));
    assert_eq!(template.user_id, 1);
}

#[tokio::test]
async fn test_get_template_not_found() {
    let mut repo = MockTemplateRepo::new();
    repo.expect_find_for_user().returning(|_, _| Ok(None));

    let service = service_with(repo);
    let result = service.get_template(1, 10).await;

    assert!(matches!(result.unwrap_err(), AppError::NotFound));
}

#[tokio::test]
async fn test_foreign_template_behaves_as_missing() {
    // The repository scopes by user, so a foreign id simply yields None
    let mut repo = MockTemplateRepo::new();
    repo.expect_find_for_user()
        .with(eq(2), eq(10))
        .returning(|_, _| Ok(None));

    let service = service_with(repo);
    let result = service.get_template(2, 10).await;

    assert!(matches!(result.unwrap_err(), AppError::NotFound));
}

#[tokio::test]
async fn test_list_templates() {
    let mut repo = MockTemplateRepo::new();
    repo.expect_list_for_user()
        .with(eq(1))
        .returning(|user_id| {
            let mut inactive = saved_template(11, user_id);
            inactive.deactivate();
            Ok(vec![saved_template(10, user_id), inactive])
        });

    let service = service_with(repo);
    let templates = service.list_templates(1).await.unwrap();

    // Inactive templates stay visible so they can be reactivated
    assert_eq!(templates.len(), 2);
    assert!(templates.iter().any(|t| !t.is_active));
}

#[tokio::test]
async fn test_create_template_success() {
    let mut repo = MockTemplateRepo::new();
    repo.expect_find_by_name()
        .withf(|user_id, name| *user_id == 1 && name == "welcome")
        .returning(|_, _| Ok(None));
    repo.expect_insert().returning(|template| {
        let mut saved = template.clone();
        saved.id = Some(42);
        Ok(saved)
    });

    let service = service_with(repo);
    let template = service
        .create_template(
            1,
            NewTemplate {
                name: "welcome".to_string(),
                channel: TemplateChannel::Email,
                subject: Some("Hi {{name}}".to_string()),
                body: "Hello {{name}}".to_string(),
                variables: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(template.id, Some(42));
    assert_eq!(template.user_id, 1);
    assert!(template.is_active);
}

#[tokio::test]
async fn test_create_template_name_conflict() {
    let mut repo = MockTemplateRepo::new();
    repo.expect_find_by_name()
        .returning(|user_id, _| Ok(Some(saved_template(99, user_id))));

    let service = service_with(repo);
    let result = service
        .create_template(
            1,
            NewTemplate {
                name: "welcome".to_string(),
                channel: TemplateChannel::Sms,
                subject: None,
                body: "Hello".to_string(),
                variables: None,
            },
        )
        .await;

    assert!(matches!(result.unwrap_err(), AppError::Conflict(_)));
}

#[tokio::test]
async fn test_update_template_success() {
    let mut repo = MockTemplateRepo::new();
    repo.expect_find_for_user()
        .returning(|user_id, id| Ok(Some(saved_template(id, user_id))));
    repo.expect_find_by_name()
        .withf(|user_id, name| *user_id == 1 && name == "renamed")
        .returning(|_, _| Ok(None));
    repo.expect_save().returning(|template| Ok(template.clone()));

    let service = service_with(repo);
    let template = service
        .update_template(
            1,
            10,
            TemplateUpdate {
                name: Some("renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(template.name, "renamed");
    assert!(template.updated_at >= template.created_at);
}

#[tokio::test]
async fn test_update_template_rename_conflict() {
    let mut repo = MockTemplateRepo::new();
    repo.expect_find_for_user()
        .returning(|user_id, id| Ok(Some(saved_template(id, user_id))));
    repo.expect_find_by_name()
        .withf(|user_id, name| *user_id == 1 && name == "taken")
        .returning(|user_id, _| Ok(Some(saved_template(99, user_id))));

    let service = service_with(repo);
    let result = service
        .update_template(
            1,
            10,
            TemplateUpdate {
                name: Some("taken".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result.unwrap_err(), AppError::Conflict(_)));
}

#[tokio::test]
async fn test_create_template_rejects_invalid_input() {
    // Construction fails before any repository call
    let service = service_with(MockTemplateRepo::new());

    let result = service
        .create_template(
            1,
            NewTemplate {
                name: "welcome".to_string(),
                channel: TemplateChannel::Email,
                subject: None,
                body: "Hello".to_string(),
                variables: None,
            },
        )
        .await;

    match result.unwrap_err() {
        AppError::Validation(msg) => assert_eq!(msg, "Email templates must have a subject"),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_update_template_rejects_invalid_patch() {
    let mut repo = MockTemplateRepo::new();
    repo.expect_find_for_user()
        .returning(|user_id, id| Ok(Some(saved_template(id, user_id))));

    let service = service_with(repo);
    let result = service
        .update_template(
            1,
            10,
            TemplateUpdate {
                body: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .await;

    match result.unwrap_err() {
        AppError::Validation(msg) => assert_eq!(msg, "Template body cannot be empty"),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_render_template_success() {
    let mut repo = MockTemplateRepo::new();
    repo.expect_find_for_user()
        .returning(|user_id, id| Ok(Some(saved_template(id, user_id))));

    let service = service_with(repo);
    let rendered = service
        .render_template(
            1,
            10,
            json!({"name": "Josh", "amount": "100"})
                .as_object()
                .unwrap()
                .clone(),
        )
        .await
        .unwrap();

    assert_eq!(rendered.body, "Hello Josh, balance 100");
    assert_eq!(rendered.subject.as_deref(), Some("Welcome Josh"));
}

#[tokio::test]
async fn test_render_template_missing_variables() {
    let mut repo = MockTemplateRepo::new();
    repo.expect_find_for_user()
        .returning(|user_id, id| Ok(Some(saved_template(id, user_id))));

    let service = service_with(repo);
    let result = service
        .render_template(1, 10, json!({"name": "Josh"}).as_object().unwrap().clone())
        .await;

    match result.unwrap_err() {
        AppError::Validation(msg) => {
            assert!(msg.contains("Missing required variables"));
            assert!(msg.contains("amount"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_deactivate_template_persists_inactive_state() {
    let mut repo = MockTemplateRepo::new();
    repo.expect_find_for_user()
        .returning(|user_id, id| Ok(Some(saved_template(id, user_id))));
    repo.expect_save()
        .withf(|template: &Template| !template.is_active)
        .returning(|template| Ok(template.clone()));

    let service = service_with(repo);
    assert!(service.deactivate_template(1, 10).await.is_ok());
}

#[tokio::test]
async fn test_activate_template_persists_active_state() {
    let mut repo = MockTemplateRepo::new();
    repo.expect_find_for_user().returning(|user_id, id| {
        let mut template = saved_template(id, user_id);
        template.deactivate();
        Ok(Some(template))
    });
    repo.expect_save()
        .withf(|template: &Template| template.is_active)
        .returning(|template| Ok(template.clone()));

    let service = service_with(repo);
    let template = service.activate_template(1, 10).await.unwrap();

    assert!(template.is_active);
}

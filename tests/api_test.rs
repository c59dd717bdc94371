//! Integration tests for API-facing types.
//!
//! These tests use mock services to exercise the service traits without
//! requiring a database connection, plus checks on error mapping and the
//! JSON shapes the handlers rely on.

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

use notify_api::domain::{
    RenderedTemplate, Template, TemplateChannel, TemplateUpdate, User, ValidationError,
};
use notify_api::errors::{AppError, AppResult};
use notify_api::services::{
    AuthService, Claims, NewTemplate, TemplateService, TokenResponse, UserService,
};

// =============================================================================
// Mock Services for Testing
// =============================================================================

/// Mock auth service that returns predefined responses
struct MockAuthService;

#[async_trait]
impl AuthService for MockAuthService {
    async fn register(
        &self,
        username: String,
        email: String,
        _password: String,
    ) -> AppResult<User> {
        Ok(User {
            id: 1,
            username,
            email,
            password_hash: "hashed".to_string(),
            is_active: true,
            is_superuser: false,
            is_verified: false,
            created_at: Utc::now(),
        })
    }

    async fn login(&self, _username: String, _password: String) -> AppResult<TokenResponse> {
        Ok(TokenResponse {
            access_token: "mock-token".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 900,
        })
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        if token == "valid-test-token" {
            Ok(Claims {
                sub: 1,
                username: "testuser".to_string(),
                email: "test@example.com".to_string(),
                exp: Utc::now().timestamp() + 3600,
                iat: Utc::now().timestamp(),
            })
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

/// Mock user service for testing
struct MockUserService;

#[async_trait]
impl UserService for MockUserService {
    async fn get_user(&self, id: i64) -> AppResult<User> {
        Ok(User {
            id,
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "hashed".to_string(),
            is_active: true,
            is_superuser: false,
            is_verified: false,
            created_at: Utc::now(),
        })
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(vec![
            User {
                id: 1,
                username: "userone".to_string(),
                email: "user1@example.com".to_string(),
                password_hash: "hashed".to_string(),
                is_active: true,
                is_superuser: false,
                is_verified: false,
                created_at: Utc::now(),
            },
            User {
                id: 2,
                username: "usertwo".to_string(),
                email: "user2@example.com".to_string(),
                password_hash: "hashed".to_string(),
                is_active: true,
                is_superuser: true,
                is_verified: true,
                created_at: Utc::now(),
            },
        ])
    }
}

/// Mock template service backed by a single in-memory template
struct MockTemplateService;

impl MockTemplateService {
    fn template(user_id: i64, id: i64) -> Template {
        let mut template = Template::new(
            "welcome",
            TemplateChannel::Email,
            "Hello {{name}}",
            user_id,
            Some("Welcome".to_string()),
            None,
        )
        .unwrap();
        template.id = Some(id);
        template
    }
}

#[async_trait]
impl TemplateService for MockTemplateService {
    async fn create_template(&self, user_id: i64, input: NewTemplate) -> AppResult<Template> {
        let template = Template::new(
            input.name,
            input.channel,
            input.body,
            user_id,
            input.subject,
            input.variables,
        )?;
        Ok(template)
    }

    async fn get_template(&self, user_id: i64, id: i64) -> AppResult<Template> {
        Ok(Self::template(user_id, id))
    }

    async fn list_templates(&self, user_id: i64) -> AppResult<Vec<Template>> {
        Ok(vec![Self::template(user_id, 1)])
    }

    async fn update_template(
        &self,
        user_id: i64,
        id: i64,
        patch: TemplateUpdate,
    ) -> AppResult<Template> {
        let mut template = Self::template(user_id, id);
        template.update(patch)?;
        Ok(template)
    }

    async fn render_template(
        &self,
        user_id: i64,
        id: i64,
        variables: serde_json::Map<String, serde_json::Value>,
    ) -> AppResult<RenderedTemplate> {
        Ok(Self::template(user_id, id).render(&variables)?)
    }

    async fn deactivate_template(&self, _user_id: i64, _id: i64) -> AppResult<()> {
        Ok(())
    }

    async fn activate_template(&self, user_id: i64, id: i64) -> AppResult<Template> {
        Ok(Self::template(user_id, id))
    }
}

// =============================================================================
// Error Type Tests
// =============================================================================

#[tokio::test]
async fn test_app_error_status_codes() {
    use axum::response::IntoResponse;

    let response = AppError::NotFound.into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = AppError::Unauthorized.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = AppError::InvalidCredentials.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = AppError::validation("bad input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = AppError::conflict("Template").into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_domain_validation_error_maps_to_bad_request() {
    // A domain rule violation must surface as a 400-class validation error
    let err = Template::new("", TemplateChannel::Sms, "body", 1, None, None).unwrap_err();
    let app_err = AppError::from(err);

    match &app_err {
        AppError::Validation(msg) => assert_eq!(msg, "Template name cannot be empty"),
        other => panic!("expected validation error, got {:?}", other),
    }

    use axum::response::IntoResponse;
    assert_eq!(app_err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validation_error_display() {
    let err = Template::new("name", TemplateChannel::Email, "body", 1, None, None).unwrap_err();
    let err: ValidationError = err;
    assert_eq!(err.to_string(), "Email templates must have a subject");
}

// =============================================================================
// JWT Claims Tests
// =============================================================================

#[tokio::test]
async fn test_claims_structure() {
    let claims = Claims {
        sub: 1,
        username: "testuser".to_string(),
        email: "test@example.com".to_string(),
        exp: Utc::now().timestamp() + 3600,
        iat: Utc::now().timestamp(),
    };

    assert!(!claims.email.is_empty());
    assert!(claims.exp > claims.iat);
}

// =============================================================================
// Password Hashing Tests
// =============================================================================

#[tokio::test]
async fn test_password_hashing() {
    use notify_api::domain::Password;

    let plain_password = "secure_password_123";
    let password = Password::new(plain_password).expect("Hashing should succeed");
    let hash = password.into_string();

    // Hash should be different from original
    assert_ne!(hash.as_str(), plain_password);

    // Hash should be verifiable
    let stored = Password::from_hash(hash);
    assert!(stored.verify(plain_password));

    // Wrong password should not verify
    assert!(!stored.verify("wrong_password"));
}

// =============================================================================
// Mock Service Tests
// =============================================================================

#[tokio::test]
async fn test_mock_auth_service_register() {
    let service = MockAuthService;
    let result = service
        .register(
            "newuser".to_string(),
            "new@example.com".to_string(),
            "password123".to_string(),
        )
        .await;

    assert!(result.is_ok());
    let user = result.unwrap();
    assert_eq!(user.username, "newuser");
    assert_eq!(user.email, "new@example.com");
}

#[tokio::test]
async fn test_mock_auth_service_login() {
    let service = MockAuthService;
    let result = service
        .login("testuser".to_string(), "password123".to_string())
        .await;

    assert!(result.is_ok());
    let token = result.unwrap();
    assert_eq!(token.token_type, "Bearer");
    assert!(!token.access_token.is_empty());
}

#[tokio::test]
async fn test_mock_auth_service_verify_valid_token() {
    let service = MockAuthService;
    let result = service.verify_token("valid-test-token");

    assert!(result.is_ok());
    assert_eq!(result.unwrap().email, "test@example.com");
}

#[tokio::test]
async fn test_mock_auth_service_verify_invalid_token() {
    let service = MockAuthService;
    let result = service.verify_token("invalid-token");

    assert!(result.is_err());
    assert!(matches!(result.unwrap_err(), AppError::Unauthorized));
}

#[tokio::test]
async fn test_mock_user_service_list_users() {
    let service = MockUserService;
    let result = service.list_users().await;

    assert!(result.is_ok());
    assert_eq!(result.unwrap().len(), 2);
}

#[tokio::test]
async fn test_mock_template_service_create_enforces_domain_rules() {
    let service = MockTemplateService;

    let result = service
        .create_template(
            1,
            NewTemplate {
                name: "broken".to_string(),
                channel: TemplateChannel::Email,
                subject: None,
                body: "body".to_string(),
                variables: None,
            },
        )
        .await;

    assert!(matches!(result.unwrap_err(), AppError::Validation(_)));
}

#[tokio::test]
async fn test_mock_template_service_render() {
    let service = MockTemplateService;

    let rendered = service
        .render_template(1, 1, json!({"name": "Josh"}).as_object().unwrap().clone())
        .await
        .unwrap();

    assert_eq!(rendered.body, "Hello Josh");
    assert_eq!(rendered.subject.as_deref(), Some("Welcome"));
}

// =============================================================================
// JSON Shape Tests
// =============================================================================

#[tokio::test]
async fn test_channel_serde_round_trip() {
    assert_eq!(serde_json::to_string(&TemplateChannel::Email).unwrap(), "\"email\"");
    assert_eq!(serde_json::to_string(&TemplateChannel::Sms).unwrap(), "\"sms\"");
    assert_eq!(serde_json::to_string(&TemplateChannel::Push).unwrap(), "\"push\"");

    let channel: TemplateChannel = serde_json::from_str("\"push\"").unwrap();
    assert_eq!(channel, TemplateChannel::Push);
}

#[tokio::test]
async fn test_rendered_template_serialization() {
    let rendered = RenderedTemplate {
        subject: None,
        body: "Hello Josh".to_string(),
    };

    let value = serde_json::to_value(&rendered).unwrap();
    assert_eq!(value, json!({"subject": null, "body": "Hello Josh"}));
}

#[tokio::test]
async fn test_user_response_hides_password_hash() {
    let user = User {
        id: 1,
        username: "testuser".to_string(),
        email: "test@example.com".to_string(),
        password_hash: "super-secret".to_string(),
        is_active: true,
        is_superuser: false,
        is_verified: false,
        created_at: Utc::now(),
    };

    let value = serde_json::to_value(&user).unwrap();
    assert!(value.get("password_hash").is_none());
}

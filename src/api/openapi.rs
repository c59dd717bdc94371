//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{auth_handler, template_handler, user_handler};
use crate::domain::{RenderedTemplate, TemplateChannel, UserResponse};
use crate::services::TokenResponse;

/// OpenAPI documentation for the Notify API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Notify API",
        version = "0.1.0",
        description = "Notification template service with user accounts and JWT authentication",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Authentication endpoints
        auth_handler::register,
        auth_handler::login,
        // User endpoints
        user_handler::list_users,
        user_handler::get_current_user,
        // Template endpoints
        template_handler::create_template,
        template_handler::list_templates,
        template_handler::get_template,
        template_handler::update_template,
        template_handler::render_template,
        template_handler::delete_template,
        template_handler::activate_template,
    ),
    components(
        schemas(
            // Domain types
            TemplateChannel,
            RenderedTemplate,
            UserResponse,
            // Auth types
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            TokenResponse,
            // Template handler types
            template_handler::CreateTemplateRequest,
            template_handler::UpdateTemplateRequest,
            template_handler::RenderTemplateRequest,
            template_handler::TemplateResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "User registration and login"),
        (name = "Users", description = "User listing and profile"),
        (name = "Templates", description = "Notification template management and rendering")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}

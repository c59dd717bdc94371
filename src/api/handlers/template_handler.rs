//! Template handlers.
//!
//! The request types here stay deliberately thin: the template business
//! rules (name/body/subject invariants) live in the domain entity, so its
//! error messages surface unchanged as 400 responses.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{RenderedTemplate, Template, TemplateChannel, TemplateUpdate};
use crate::errors::AppResult;
use crate::services::NewTemplate;

/// Template creation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTemplateRequest {
    /// Template name, unique per user
    #[schema(example = "welcome_email")]
    pub name: String,
    /// Delivery channel
    pub channel: TemplateChannel,
    /// Subject line, required for email templates
    #[schema(example = "Welcome {{username}}!")]
    pub subject: Option<String>,
    /// Body text with `{{variable}}` placeholders
    #[schema(example = "Hello {{username}}, your balance is {{amount}}")]
    pub body: String,
    /// Declared placeholder defaults/documentation
    #[schema(value_type = Object)]
    pub variables: Option<BTreeMap<String, String>>,
}

/// Partial template update request; omitted fields are left unchanged
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTemplateRequest {
    /// New template name
    #[schema(example = "welcome_email_v2")]
    pub name: Option<String>,
    /// New subject line
    pub subject: Option<String>,
    /// New body text
    pub body: Option<String>,
    /// New declared placeholder defaults
    #[schema(value_type = Object)]
    pub variables: Option<BTreeMap<String, String>>,
    /// New active flag
    pub is_active: Option<bool>,
}

impl From<UpdateTemplateRequest> for TemplateUpdate {
    fn from(req: UpdateTemplateRequest) -> Self {
        TemplateUpdate {
            name: req.name,
            subject: req.subject,
            body: req.body,
            variables: req.variables,
            is_active: req.is_active,
        }
    }
}

/// Template render request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RenderTemplateRequest {
    /// Variable values to substitute, keyed by placeholder name
    #[serde(default)]
    #[schema(value_type = Object, example = json!({"username": "Josh", "amount": "100"}))]
    pub variables: serde_json::Map<String, serde_json::Value>,
}

/// Template response
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct TemplateResponse {
    /// Unique template identifier
    #[schema(example = 1)]
    pub id: i64,
    /// Template name
    #[schema(example = "welcome_email")]
    pub name: String,
    /// Delivery channel
    pub channel: TemplateChannel,
    /// Subject line (email templates)
    pub subject: Option<String>,
    /// Body text
    pub body: String,
    /// Declared placeholder defaults
    #[schema(value_type = Object)]
    pub variables: BTreeMap<String, String>,
    /// Whether the template is active
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<Template> for TemplateResponse {
    fn from(template: Template) -> Self {
        Self {
            // Persisted templates always carry an id
            id: template.id.unwrap_or_default(),
            name: template.name,
            channel: template.channel,
            subject: template.subject,
            body: template.body,
            variables: template.variables,
            is_active: template.is_active,
            created_at: template.created_at,
            updated_at: template.updated_at,
        }
    }
}

/// Create template routes
pub fn template_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route(
            "/:id",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/:id/render", post(render_template))
        .route("/:id/activate", post(activate_template))
}

/// Create a new template
#[utoipa::path(
    post,
    path = "/templates",
    tag = "Templates",
    security(("bearer_auth" = [])),
    request_body = CreateTemplateRequest,
    responses(
        (status = 201, description = "Template created successfully", body = TemplateResponse),
        (status = 400, description = "Business rule violation"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Template name already in use")
    )
)]
pub async fn create_template(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<CreateTemplateRequest>,
) -> AppResult<(StatusCode, Json<TemplateResponse>)> {
    let template = state
        .template_service
        .create_template(
            current_user.id,
            NewTemplate {
                name: payload.name,
                channel: payload.channel,
                subject: payload.subject,
                body: payload.body,
                variables: payload.variables,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TemplateResponse::from(template))))
}

/// List the caller's templates
#[utoipa::path(
    get,
    path = "/templates",
    tag = "Templates",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of templates, active and inactive", body = Vec<TemplateResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_templates(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<TemplateResponse>>> {
    let templates = state.template_service.list_templates(current_user.id).await?;
    Ok(Json(
        templates.into_iter().map(TemplateResponse::from).collect(),
    ))
}

/// Get a template by ID
#[utoipa::path(
    get,
    path = "/templates/{id}",
    tag = "Templates",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Template ID")
    ),
    responses(
        (status = 200, description = "Template", body = TemplateResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Template not found")
    )
)]
pub async fn get_template(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TemplateResponse>> {
    let template = state
        .template_service
        .get_template(current_user.id, id)
        .await?;
    Ok(Json(TemplateResponse::from(template)))
}

/// Update a template (partial update)
#[utoipa::path(
    put,
    path = "/templates/{id}",
    tag = "Templates",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Template ID")
    ),
    request_body = UpdateTemplateRequest,
    responses(
        (status = 200, description = "Template updated successfully", body = TemplateResponse),
        (status = 400, description = "Business rule violation"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Template not found"),
        (status = 409, description = "Template name already in use")
    )
)]
pub async fn update_template(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTemplateRequest>,
) -> AppResult<Json<TemplateResponse>> {
    let template = state
        .template_service
        .update_template(current_user.id, id, payload.into())
        .await?;
    Ok(Json(TemplateResponse::from(template)))
}

/// Render a template with caller-supplied variables
#[utoipa::path(
    post,
    path = "/templates/{id}/render",
    tag = "Templates",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Template ID")
    ),
    request_body = RenderTemplateRequest,
    responses(
        (status = 200, description = "Rendered subject and body", body = RenderedTemplate),
        (status = 400, description = "Missing required variables"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Template not found")
    )
)]
pub async fn render_template(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RenderTemplateRequest>,
) -> AppResult<Json<RenderedTemplate>> {
    let rendered = state
        .template_service
        .render_template(current_user.id, id, payload.variables)
        .await?;
    Ok(Json(rendered))
}

/// Soft delete a template (mark inactive)
#[utoipa::path(
    delete,
    path = "/templates/{id}",
    tag = "Templates",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Template ID")
    ),
    responses(
        (status = 204, description = "Template deactivated"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Template not found")
    )
)]
pub async fn delete_template(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state
        .template_service
        .deactivate_template(current_user.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reactivate a deactivated template
#[utoipa::path(
    post,
    path = "/templates/{id}/activate",
    tag = "Templates",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Template ID")
    ),
    responses(
        (status = 200, description = "Template reactivated", body = TemplateResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Template not found")
    )
)]
pub async fn activate_template(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TemplateResponse>> {
    let template = state
        .template_service
        .activate_template(current_user.id, id)
        .await?;
    Ok(Json(TemplateResponse::from(template)))
}

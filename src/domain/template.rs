//! Notification template domain entity.
//!
//! A pure in-memory entity: it validates its own business rules, extracts
//! the `{{variable}}` placeholders its content requires, and renders final
//! text by substitution. It knows nothing about persistence or HTTP.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::TEMPLATE_NAME_MAX_LENGTH;

/// Placeholder pattern: `{{identifier}}`, identifier = word characters only.
/// No whitespace inside the braces, no nesting, no escaping.
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("valid placeholder regex"));

/// Business-rule violation raised by construction, update, or render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The human-readable rule that was violated.
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Delivery channels a template can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TemplateChannel {
    Email,
    Sms,
    Push,
}

impl TemplateChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateChannel::Email => "email",
            TemplateChannel::Sms => "sms",
            TemplateChannel::Push => "push",
        }
    }
}

impl From<&str> for TemplateChannel {
    fn from(s: &str) -> Self {
        match s {
            "email" => TemplateChannel::Email,
            "push" => TemplateChannel::Push,
            _ => TemplateChannel::Sms,
        }
    }
}

impl std::fmt::Display for TemplateChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification template domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Assigned by the persistence layer on first save; None while unsaved
    pub id: Option<i64>,
    pub name: String,
    pub channel: TemplateChannel,
    /// Required for email templates
    pub subject: Option<String>,
    pub body: String,
    pub user_id: i64,
    /// Declared placeholder defaults/documentation, not necessarily exhaustive
    pub variables: BTreeMap<String, String>,
    /// Soft-delete flag (false = deactivated, never physically removed here)
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a template; omitted fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub variables: Option<BTreeMap<String, String>>,
    pub is_active: Option<bool>,
}

/// Result of rendering a template with concrete variable values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RenderedTemplate {
    /// Present iff the template has a subject
    pub subject: Option<String>,
    pub body: String,
}

impl Template {
    /// Create a new unsaved template, validating business rules immediately.
    ///
    /// Defaults: empty variable map, active, timestamps set to now (UTC).
    /// On failure no instance is returned, so an invalid entity never escapes.
    pub fn new(
        name: impl Into<String>,
        channel: TemplateChannel,
        body: impl Into<String>,
        user_id: i64,
        subject: Option<String>,
        variables: Option<BTreeMap<String, String>>,
    ) -> Result<Self, ValidationError> {
        let now = Utc::now();
        let template = Self {
            id: None,
            name: name.into(),
            channel,
            subject,
            body: body.into(),
            user_id,
            variables: variables.unwrap_or_default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        template.validate()?;
        Ok(template)
    }

    /// Enforce business rules. Checks run in a fixed order and the first
    /// failure wins; violations are never aggregated.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("Template name cannot be empty"));
        }

        if self.body.trim().is_empty() {
            return Err(ValidationError::new("Template body cannot be empty"));
        }

        // An empty subject counts as absent; a whitespace-only one does not
        if self.channel == TemplateChannel::Email
            && self.subject.as_deref().map_or(true, str::is_empty)
        {
            return Err(ValidationError::new("Email templates must have a subject"));
        }

        if self.name.chars().count() > TEMPLATE_NAME_MAX_LENGTH {
            return Err(ValidationError::new(format!(
                "Template name cannot exceed {} characters",
                TEMPLATE_NAME_MAX_LENGTH
            )));
        }

        Ok(())
    }

    /// Distinct placeholder identifiers referenced by body and subject.
    pub fn required_variables(&self) -> BTreeSet<String> {
        let mut text = self.body.clone();
        if let Some(subject) = &self.subject {
            text.push(' ');
            text.push_str(subject);
        }

        PLACEHOLDER_RE
            .captures_iter(&text)
            .map(|cap| cap[1].to_string())
            .collect()
    }

    /// Required variables not covered by the provided map, in lexicographic
    /// order. Callers should treat the result as a set.
    fn missing_variables(&self, provided: &serde_json::Map<String, serde_json::Value>) -> Vec<String> {
        self.required_variables()
            .into_iter()
            .filter(|name| !provided.contains_key(name))
            .collect()
    }

    /// Render the template by substituting the provided variables.
    ///
    /// Every `{{key}}` occurrence is replaced by the stringified value for
    /// every provided pair, not just the required ones; unused provided
    /// variables are silently ignored. Fails when a referenced placeholder
    /// has no provided value. Substitution is a plain literal replace with
    /// no escaping or recursive expansion.
    pub fn render(
        &self,
        variables: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<RenderedTemplate, ValidationError> {
        let missing = self.missing_variables(variables);
        if !missing.is_empty() {
            return Err(ValidationError::new(format!(
                "Missing required variables: {}",
                missing.join(", ")
            )));
        }

        let body = substitute(&self.body, variables);
        let subject = self.subject.as_deref().map(|s| substitute(s, variables));

        Ok(RenderedTemplate { subject, body })
    }

    /// Apply a partial update and re-validate the whole entity.
    ///
    /// The patch is applied to a staged copy which is validated atomically;
    /// on failure the entity is left untouched. `updated_at` is refreshed on
    /// success.
    pub fn update(&mut self, patch: TemplateUpdate) -> Result<(), ValidationError> {
        let mut staged = self.clone();

        if let Some(name) = patch.name {
            staged.name = name;
        }
        if let Some(subject) = patch.subject {
            staged.subject = Some(subject);
        }
        if let Some(body) = patch.body {
            staged.body = body;
        }
        if let Some(variables) = patch.variables {
            staged.variables = variables;
        }
        if let Some(is_active) = patch.is_active {
            staged.is_active = is_active;
        }

        staged.updated_at = Utc::now();
        staged.validate()?;

        *self = staged;
        Ok(())
    }

    /// Soft delete: mark the template inactive. Never re-validates.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    /// Reactivate a deactivated template.
    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }
}

/// Replace every `{{key}}` occurrence with the stringified value.
fn substitute(text: &str, variables: &serde_json::Map<String, serde_json::Value>) -> String {
    let mut result = text.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{{}}}}}", key);
        let replacement = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Null => String::new(),
            // Arrays and objects fall back to their JSON representation
            other => other.to_string(),
        };
        result = result.replace(&placeholder, &replacement);
    }

    result
}

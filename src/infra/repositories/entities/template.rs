//! Template database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{Template, TemplateChannel};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "templates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub channel: String,
    pub subject: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    /// Declared placeholder defaults, stored as a JSON object
    pub variables: Json,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity.
///
/// Rows are only ever written from validated entities, so this mapping does
/// not re-run validation.
impl From<Model> for Template {
    fn from(model: Model) -> Self {
        Template {
            id: Some(model.id),
            name: model.name,
            channel: TemplateChannel::from(model.channel.as_str()),
            subject: model.subject,
            body: model.body,
            user_id: model.user_id,
            variables: serde_json::from_value(model.variables).unwrap_or_default(),
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

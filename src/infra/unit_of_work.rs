//! Unit of Work pattern implementation.
//!
//! Centralizes access to all repositories behind one seam so services
//! depend on a single abstraction. Cross-row consistency (name uniqueness)
//! is guarded by the unique indexes the migrations create.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::repositories::{TemplateRepository, TemplateStore, UserRepository, UserStore};

/// Unit of Work trait for dependency injection.
///
/// Provides centralized access to all repositories.
pub trait UnitOfWork: Send + Sync {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get template repository
    fn templates(&self) -> Arc<dyn TemplateRepository>;
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    user_repo: Arc<UserStore>,
    template_repo: Arc<TemplateStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        let user_repo = Arc::new(UserStore::new(db.clone()));
        let template_repo = Arc::new(TemplateStore::new(db));
        Self {
            user_repo,
            template_repo,
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn templates(&self) -> Arc<dyn TemplateRepository> {
        self.template_repo.clone()
    }
}

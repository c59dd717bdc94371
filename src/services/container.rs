//! Service Container - Centralized service access.
//!
//! Manages service construction and provides thread-safe shared access to
//! all application services via `Arc`.

use std::sync::Arc;

use super::{AuthService, TemplateService, UserService};
use crate::config::Config;
use crate::infra::Persistence;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
///
/// Provides centralized access to all application services.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    /// Get authentication service
    fn auth(&self) -> Arc<dyn AuthService>;

    /// Get user service
    fn users(&self) -> Arc<dyn UserService>;

    /// Get template service
    fn templates(&self) -> Arc<dyn TemplateService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    template_service: Arc<dyn TemplateService>,
}

impl Services {
    /// Create a new service container with all services initialized
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        template_service: Arc<dyn TemplateService>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            template_service,
        }
    }

    /// Create service container from database connection and config
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: Config) -> Self {
        use super::{Authenticator, TemplateManager, UserManager};

        let uow = Arc::new(Persistence::new(db));
        let auth_service = Arc::new(Authenticator::new(uow.clone(), config));
        let user_service = Arc::new(UserManager::new(uow.clone()));
        let template_service = Arc::new(TemplateManager::new(uow));

        Self {
            auth_service,
            user_service,
            template_service,
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn templates(&self) -> Arc<dyn TemplateService> {
        self.template_service.clone()
    }
}

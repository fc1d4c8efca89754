//! Business logic services

pub mod auth;
pub mod borrowers;
pub mod catalog;
pub mod circulation;
pub mod email;
pub mod fines;
pub mod stats;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub borrowers: borrowers::BorrowersService,
    pub circulation: circulation::CirculationService,
    pub stats: stats::StatsService,
    pub email: email::EmailService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let email = email::EmailService::new(config.email.clone());
        let auth = auth::AuthService::new(repository.clone(), config.auth.clone());
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            borrowers: borrowers::BorrowersService::new(repository.clone(), auth.clone()),
            circulation: circulation::CirculationService::new(
                repository.clone(),
                &config.policy,
                email.clone(),
            ),
            stats: stats::StatsService::new(repository.clone()),
            auth,
            email,
            repository,
        }
    }
}

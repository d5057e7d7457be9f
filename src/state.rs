use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::health::services::{HealthService, Pingable};
use crate::users::repo::{PgUsersRepo, UsersRepo};
use crate::users::services::{UsersService, UsersServiceImpl};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UsersService>,
    pub health: Arc<HealthService>,
}

impl AppState {
    /// Wires the Postgres-backed repo into the users and health services.
    /// The pool connects lazily, so an unreachable database shows up on
    /// `/health` instead of failing startup.
    pub fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect_lazy(&config.database.url)
            .context("configure database pool")?;

        let repo = Arc::new(PgUsersRepo::new(db));
        let users = Arc::new(UsersServiceImpl::new(repo.clone() as Arc<dyn UsersRepo>));
        let health = Arc::new(HealthService::new(
            vec![repo as Arc<dyn Pingable>],
            config.health_timeout,
        ));

        Ok(Self::from_parts(users, health))
    }

    pub fn from_parts(users: Arc<dyn UsersService>, health: Arc<HealthService>) -> Self {
        Self { users, health }
    }
}

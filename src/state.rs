//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::services::geodistance_service::{GeodistanceResolver, MapboxGeodistance};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub geodistance: Arc<dyn GeodistanceResolver>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let token = config.mapbox_token.clone().unwrap_or_else(|| {
            log::warn!(
                "⚠️ MAPBOX_TOKEN no configurado; las distancias degradarán a gran círculo"
            );
            String::new()
        });
        let geodistance: Arc<dyn GeodistanceResolver> = Arc::new(MapboxGeodistance::new(token));

        Self {
            pool,
            config,
            geodistance,
        }
    }

    /// Construir el estado con un resolver concreto (tests).
    pub fn with_resolver(
        pool: PgPool,
        config: EnvironmentConfig,
        geodistance: Arc<dyn GeodistanceResolver>,
    ) -> Self {
        Self {
            pool,
            config,
            geodistance,
        }
    }
}

pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::repository::QuizStore;
use crate::services::{analytics_service::AnalyticsService, session_service::SessionService};

pub use routes::create_router;

#[derive(Clone)]
pub struct AppState {
    pub session_service: SessionService,
    pub analytics_service: AnalyticsService,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn QuizStore>, config: &Config) -> Self {
        Self::with_services(
            SessionService::new(store.clone()),
            AnalyticsService::new(store, config.passing_score_percent),
            &config.jwt_secret,
        )
    }

    pub fn with_services(
        session_service: SessionService,
        analytics_service: AnalyticsService,
        jwt_secret: &str,
    ) -> Self {
        Self {
            session_service,
            analytics_service,
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}

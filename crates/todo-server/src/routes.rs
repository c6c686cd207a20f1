//! Route definitions for the Todo API.

use axum::{routing::get, Router};
use todo_config::{AppConfig, Environment};

use crate::{
    docs,
    error::ServerError,
    handlers,
    middleware::{apply_pipeline, CorsPolicy, Middleware, RequestTracing},
    state::AppState,
};

/// Router settings derived from the application configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Request span settings
    pub tracing: RequestTracing,
    /// CORS policy, `None` outside local
    pub cors: Option<CorsPolicy>,
    /// Whether Swagger UI and the OpenAPI document are served
    pub docs_enabled: bool,
}

impl RouterConfig {
    /// Derive router settings; CORS and docs are enabled only in `local`
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ServerError> {
        let local = config.environment.is_local();
        let cors = if local {
            Some(CorsPolicy::new(&config.cors_allowed_origin)?)
        } else {
            None
        };

        Ok(Self {
            environment: config.environment.clone(),
            tracing: RequestTracing::new(config.service_name()),
            cors,
            docs_enabled: local,
        })
    }

    /// Middleware stages, outermost first
    #[must_use]
    pub fn middleware(&self) -> Vec<Middleware> {
        let mut pipeline = vec![
            Middleware::Tracing(self.tracing.clone()),
            Middleware::PanicRecovery,
        ];
        if let Some(cors) = &self.cors {
            pipeline.push(Middleware::Cors(cors.clone()));
        }
        pipeline
    }
}

/// Create the main API router
pub fn create_router(state: AppState, config: &RouterConfig) -> Router {
    let mut router = Router::new()
        .route("/api/ping", get(handlers::ping))
        .route("/api/todos", get(handlers::get_todo));

    if config.docs_enabled {
        router = router.merge(docs::swagger_ui());
    }

    let router = router.fallback(handlers::not_found).with_state(state);

    apply_pipeline(router, config.middleware())
}

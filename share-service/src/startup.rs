use crate::config::ShareServiceConfig;
use crate::handlers;
use crate::services::{
    AccessOrchestrator, AccessRecorder, DocumentStore, GrantStore, IssuePolicy, LabStore,
    LinkIssuer, LinkValidator, MedicationStore, MongoDb, MongoDocumentStore, MongoGrantStore,
    MongoLabStore, MongoMedicationStore, MongoProfileStore, MongoVitalStore, NoopNotifier,
    Notifier, ProfileStore, ProjectionCaps, RevocationHandler, ScopedDataProjector, SmtpNotifier,
    VitalStore,
};
use axum::{
    Router,
    routing::{delete, get, post},
};
use service_core::error::AppError;
use service_core::middleware::{
    create_ip_rate_limiter, ip_rate_limit_middleware, metrics_middleware, request_id_middleware,
    security_headers_middleware,
};
use axum::http::Method;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: ShareServiceConfig,
    pub grants: Arc<dyn GrantStore>,
    pub issuer: Arc<LinkIssuer>,
    pub access: Arc<AccessOrchestrator>,
    pub revocation: Arc<RevocationHandler>,
}

impl AppState {
    /// Wire the sharing components from their stores. Every component gets
    /// exactly the repositories it needs, nothing more.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        config: ShareServiceConfig,
        grants: Arc<dyn GrantStore>,
        profiles: Arc<dyn ProfileStore>,
        documents: Arc<dyn DocumentStore>,
        vitals: Arc<dyn VitalStore>,
        medications: Arc<dyn MedicationStore>,
        labs: Arc<dyn LabStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let policy = IssuePolicy {
            base_url: config.share.base_url.clone(),
            max_ttl_hours: config.share.max_ttl_hours,
        };
        let caps = ProjectionCaps {
            documents: config.share.max_documents,
            lab_results: config.share.max_lab_results,
            vitals: config.share.max_vitals,
        };

        let issuer = LinkIssuer::new(
            grants.clone(),
            profiles.clone(),
            documents.clone(),
            labs.clone(),
            notifier,
            policy,
        );

        let validator = LinkValidator::new(grants.clone());
        let projector =
            ScopedDataProjector::new(profiles.clone(), documents, vitals, medications, labs, caps);
        let recorder = AccessRecorder::new(grants.clone());
        let access = AccessOrchestrator::new(validator, projector, recorder, profiles);

        let revocation = RevocationHandler::new(grants.clone());

        Self {
            config,
            grants,
            issuer: Arc::new(issuer),
            access: Arc::new(access),
            revocation: Arc::new(revocation),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // The public endpoint is an enumeration target; it gets its own per-IP
    // budget that the owner endpoints do not share.
    let access_limiter = create_ip_rate_limiter(state.config.share.access_rate_per_min, 60);

    let public_routes = Router::new()
        .route("/share/:token", get(handlers::access_share))
        .layer(axum::middleware::from_fn_with_state(
            access_limiter,
            ip_rate_limit_middleware,
        ))
        // Recipients open share links from arbitrary origins; reads only.
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET])
                .allow_origin(Any),
        );

    let owner_routes = Router::new()
        .route(
            "/shares",
            post(handlers::create_share).get(handlers::list_shares),
        )
        .route("/shares/:grant_id", delete(handlers::revoke_share))
        .route("/shares/:grant_id/events", get(handlers::list_share_events));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(public_routes)
        .merge(owner_routes)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    /// Production wiring: MongoDB-backed stores, SMTP notifier when
    /// configured.
    pub async fn build(config: ShareServiceConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let notifier: Arc<dyn Notifier> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpNotifier::new(smtp).map_err(AppError::from)?),
            None => Arc::new(NoopNotifier),
        };

        let state = AppState::assemble(
            config,
            Arc::new(MongoGrantStore::new(db.clone())),
            Arc::new(MongoProfileStore::new(db.clone())),
            Arc::new(MongoDocumentStore::new(db.clone())),
            Arc::new(MongoVitalStore::new(db.clone())),
            Arc::new(MongoMedicationStore::new(db.clone())),
            Arc::new(MongoLabStore::new(db)),
            notifier,
        );

        Self::serve(state).await
    }

    /// Bind and serve an already-assembled state. Integration tests use
    /// this directly with in-memory stores.
    pub async fn serve(state: AppState) -> Result<Self, AppError> {
        let app = build_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        );

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
